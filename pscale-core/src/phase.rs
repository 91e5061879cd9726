/// Defines session phases and behavior
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn runs_trials(&self) -> bool;
    fn next(&self) -> Option<Self>;

    fn is_practice(&self) -> bool {
        false
    }
    fn is_experiment(&self) -> bool {
        false
    }

    fn is_welcome(&self) -> bool {
        false
    }

    fn is_finished(&self) -> bool {
        false
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Default)]
pub enum SessionPhase {
    #[default]
    Welcome,
    Practice,
    Intermission,
    Experiment,
    Goodbye,
}

impl Phase for SessionPhase {
    fn runs_trials(&self) -> bool {
        matches!(self, Self::Practice | Self::Experiment)
    }
    fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Welcome => Practice,
            Practice => Intermission,
            Intermission => Experiment,
            Experiment => Goodbye,
            Goodbye => return None,
        })
    }

    fn is_practice(&self) -> bool {
        matches!(self, SessionPhase::Practice)
    }

    fn is_experiment(&self) -> bool {
        matches!(self, SessionPhase::Experiment)
    }

    fn is_welcome(&self) -> bool {
        matches!(self, SessionPhase::Welcome)
    }

    fn is_finished(&self) -> bool {
        matches!(self, SessionPhase::Goodbye)
    }
}
