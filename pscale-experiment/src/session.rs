use super::config::ExperimentConfig;
use super::export;
use super::state::{TrialInput, TrialStateMachine};
use super::task::{CompletedTask, Task};
use anyhow::{Result, bail};
use pscale_core::{Phase, SessionPhase, StimulusSink, SurfaceCommand, Viewport};
use pscale_timing::Timer;
use rand::Rng;
use std::path::{Path, PathBuf};

/// Sequences the practice task and the experiment tasks of one participant.
///
/// Practice data is discarded. Each experiment task is frozen into the
/// completed list when the participant moves on; once the configured number
/// of tasks is complete the session says goodbye.
pub struct Session<P, T, R, S>
where
    P: Phase,
    T: Timer,
    R: Rng,
    S: StimulusSink,
{
    pub phase: P,
    pub machine: TrialStateMachine<T, R, S>,
    pub config: ExperimentConfig,
    completed: Vec<CompletedTask>,
}

impl<T, R, S> Session<SessionPhase, T, R, S>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
    S: StimulusSink,
{
    pub fn new(config: ExperimentConfig, viewport: Viewport, timer: T, rng: R, sink: S) -> Self {
        let machine = TrialStateMachine::new(&config, viewport, timer, rng, sink);
        Self {
            phase: SessionPhase::default(),
            machine,
            config,
            completed: Vec::new(),
        }
    }

    /// Moves to the next screen. The experiment phase only ends through
    /// [`next_task`](Self::next_task).
    pub fn advance_phase(&mut self) -> bool {
        if self.phase.is_experiment() || self.phase.is_finished() {
            return false;
        }
        let Some(next) = self.phase.next() else {
            return false;
        };

        if self.phase.is_practice() {
            if let Some(practice) = self.machine.dispose() {
                tracing::info!(trials = practice.current_index(), "practice finished");
            }
        }

        self.phase = next;
        tracing::info!(phase = ?self.phase, "phase changed");

        if self.phase.runs_trials() {
            self.begin_task();
        }
        true
    }

    /// Freezes the running experiment task. Returns `true` once the session
    /// has all of its tasks.
    pub fn next_task(&mut self) -> bool {
        if !self.phase.is_experiment() {
            return false;
        }
        if let Some(task) = self.machine.dispose() {
            let done = task.finish();
            tracing::info!(
                task = self.completed.len(),
                trials = done.len(),
                "task completed"
            );
            self.completed.push(done);
        }

        if self.completed.len() >= self.config.tasks_per_session {
            self.phase = SessionPhase::Goodbye;
            tracing::info!(tasks = self.completed.len(), "session complete");
            return true;
        }

        self.begin_task();
        false
    }

    fn begin_task(&mut self) {
        let task = Task::draw(&self.config, &mut self.machine.rng);
        self.machine.start_task(task);
    }

    pub fn handle_input(&mut self, input: TrialInput) -> Vec<SurfaceCommand> {
        if !self.phase.runs_trials() {
            return Vec::new();
        }
        self.machine.handle_input(input)
    }

    /// Polls timers and applies whatever fired.
    pub fn update(&mut self) -> Vec<SurfaceCommand> {
        if !self.phase.runs_trials() {
            return Vec::new();
        }
        let mut commands = Vec::new();
        for input in self.machine.update() {
            commands.extend(self.machine.handle_input(input));
        }
        commands
    }

    pub fn completed(&self) -> &[CompletedTask] {
        &self.completed
    }

    /// `(1-based task number, tasks per session)` during the experiment.
    pub fn task_progress(&self) -> Option<(usize, usize)> {
        self.phase
            .is_experiment()
            .then(|| (self.completed.len() + 1, self.config.tasks_per_session))
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_finished()
    }

    /// Writes the completed tasks to a freshly named file in `dir`.
    pub fn write_data(&mut self, dir: &Path) -> Result<PathBuf> {
        if !self.is_finished() {
            bail!("session is still in the {:?} phase", self.phase);
        }
        let id = export::random_id(&mut self.machine.rng);
        export::save(dir, &export::data_file_name(id), &self.completed)
    }
}
