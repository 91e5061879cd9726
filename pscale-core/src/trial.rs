use serde::{Deserialize, Serialize};

/// Interaction states of a running task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    WaitingForClick,
    PlayingStimulus,
    WaitingForResponse,
}

/// Yes/no answer to a single trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    No,
    Yes,
}

impl Response {
    pub fn as_u8(self) -> u8 {
        match self {
            Response::No => 0,
            Response::Yes => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Response::No),
            1 => Some(Response::Yes),
            _ => None,
        }
    }
}

/// Recorded result per trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub stimulus: f64,
    pub response: Response,
    pub criterion: f64,
}
