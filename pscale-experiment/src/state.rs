use super::config::ExperimentConfig;
use super::criterion::CriterionTracker;
use super::task::Task;
use pscale_core::{
    CatchTrial, Cursor, InteractionState, Response, StimulusSink, SurfaceCommand, Viewport,
};
use pscale_timing::{CancelToken, OneShot, Timer, TimerToken};
use rand::Rng;
use std::time::Duration;

/// Everything the trial machine reacts to. Pointer coordinates are local to
/// the drawable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrialInput {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    TimerFired(TimerToken),
    ResponseChosen(Response),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Criterion,
}

/// Drives one task from click to stimulus to response and back.
///
/// Rendering changes come back from [`handle_input`](Self::handle_input) as
/// [`SurfaceCommand`]s. Stimuli go out synchronously through the sink,
/// before the response timer is scheduled.
pub struct TrialStateMachine<T, R, S>
where
    T: Timer,
    R: Rng,
    S: StimulusSink,
{
    pub state: InteractionState,
    pub timer: T,
    pub rng: R,
    pub sink: S,
    pub viewport: Viewport,
    pub criterion: CriterionTracker,
    task: Option<Task>,
    catch_trial: CatchTrial,
    response_delay: Duration,
    grab_tolerance_px: f64,
    criterion_initial_y_px: f64,
    pointer_down: bool,
    dragging: bool,
    drag_target: Option<DragTarget>,
    hovering: bool,
    pending: Option<OneShot>,
    click_at: Option<(f64, f64)>,
    next_token: u64,
    cancel: CancelToken,
}

impl<T, R, S> TrialStateMachine<T, R, S>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
    S: StimulusSink,
{
    pub fn new(config: &ExperimentConfig, viewport: Viewport, timer: T, rng: R, sink: S) -> Self {
        Self {
            state: InteractionState::WaitingForClick,
            timer,
            rng,
            sink,
            viewport,
            criterion: CriterionTracker::new(config.criterion_initial_y_px),
            task: None,
            catch_trial: config.catch_trial(),
            response_delay: config.response_delay(),
            grab_tolerance_px: config.criterion_grab_tolerance_px,
            criterion_initial_y_px: config.criterion_initial_y_px,
            pointer_down: false,
            dragging: false,
            drag_target: None,
            hovering: false,
            pending: None,
            click_at: None,
            next_token: 0,
            cancel: CancelToken::new(),
        }
    }

    /// Installs `task` and resets the interaction, returning the task that
    /// was running. Timers scheduled for the old task are cancelled.
    pub fn start_task(&mut self, task: Task) -> Option<Task> {
        let previous = self.dispose();
        tracing::info!(
            lambda_px = task.params().lambda_px,
            beta = task.params().beta,
            max_val = task.params().max_val,
            "task started"
        );
        self.task = Some(task);
        previous
    }

    /// Detaches the running task. Afterwards every input, including a
    /// pending timer, is ignored until the next [`start_task`](Self::start_task).
    pub fn dispose(&mut self) -> Option<Task> {
        self.cancel.cancel();
        self.cancel = CancelToken::new();
        self.pending = None;
        self.click_at = None;
        self.state = InteractionState::WaitingForClick;
        self.pointer_down = false;
        self.dragging = false;
        self.drag_target = None;
        self.hovering = false;
        self.criterion = CriterionTracker::new(self.criterion_initial_y_px);
        let task = self.task.take();
        if let Some(task) = &task {
            tracing::debug!(trials = task.current_index(), "task detached");
        }
        task
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Polls the response timer. Feed the returned inputs back through
    /// [`handle_input`](Self::handle_input).
    pub fn update(&mut self) -> Vec<TrialInput> {
        let now_ns = self.timer.now();
        self.pending
            .as_mut()
            .and_then(|shot| shot.poll(now_ns))
            .map(TrialInput::TimerFired)
            .into_iter()
            .collect()
    }

    /// Time until the pending response timer is due.
    pub fn time_until_due(&self) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|shot| shot.remaining(self.timer.now()))
    }

    pub fn handle_input(&mut self, input: TrialInput) -> Vec<SurfaceCommand> {
        let mut commands = Vec::new();
        if self.task.is_none() {
            return commands;
        }

        match (self.state, input) {
            (InteractionState::WaitingForClick, TrialInput::PointerDown { y, .. }) => {
                self.pointer_down = true;
                if self.criterion.hit(y, self.grab_tolerance_px) {
                    self.drag_target = Some(DragTarget::Criterion);
                    commands.push(SurfaceCommand::SetCursor(Cursor::Grabbing));
                }
            }

            (InteractionState::WaitingForClick, TrialInput::PointerMove { y, .. }) => {
                if self.pointer_down {
                    self.dragging = true;
                }

                if self.dragging {
                    if self.drag_target == Some(DragTarget::Criterion) {
                        self.criterion.move_to(y);
                        commands.push(SurfaceCommand::MoveCriterion { y });
                    }
                } else {
                    let over = self.criterion.hit(y, self.grab_tolerance_px);
                    if over != self.hovering {
                        self.hovering = over;
                        let cursor = if over { Cursor::Grab } else { Cursor::Default };
                        commands.push(SurfaceCommand::SetCursor(cursor));
                    }
                }
            }

            (InteractionState::WaitingForClick, TrialInput::PointerUp { x, y }) => {
                if self.dragging {
                    self.save_criterion();
                } else {
                    self.present_stimulus(x, y, &mut commands);
                }

                self.pointer_down = false;
                self.dragging = false;
                self.drag_target = None;
                self.hovering = false;
                commands.push(SurfaceCommand::SetCursor(Cursor::Default));
            }

            (InteractionState::PlayingStimulus, TrialInput::TimerFired(token)) => {
                let ours = self
                    .pending
                    .as_ref()
                    .is_some_and(|shot| shot.token() == token && !shot.is_cancelled());
                if !ours {
                    tracing::debug!(?token, "stale timer ignored");
                    return commands;
                }
                self.pending = None;
                self.state = InteractionState::WaitingForResponse;
                if let Some((x, y)) = self.click_at {
                    commands.push(SurfaceCommand::ShowResponseBox { x, y });
                }
                tracing::debug!(trial = self.current_trial(), "response window opened");
            }

            (InteractionState::WaitingForResponse, TrialInput::ResponseChosen(response)) => {
                self.state = InteractionState::WaitingForClick;
                self.save_criterion();
                self.click_at = None;
                if let Some(task) = self.task.as_mut() {
                    match task.close_trial(response) {
                        Ok(record) => tracing::info!(
                            trial = task.current_index() - 1,
                            stimulus = record.stimulus,
                            response = record.response.as_u8(),
                            criterion = record.criterion,
                            "trial recorded"
                        ),
                        Err(err) => tracing::error!("{err:#}"),
                    }
                }
                commands.push(SurfaceCommand::HideResponseBox);
            }

            (state, input) => {
                tracing::trace!(?state, ?input, "input ignored");
            }
        }

        commands
    }

    fn present_stimulus(&mut self, x: f64, y: f64, commands: &mut Vec<SurfaceCommand>) {
        self.state = InteractionState::PlayingStimulus;

        let Some(task) = self.task.as_mut() else {
            return;
        };
        let raw = task.params().intensity(y, self.viewport.height);
        let stimulus = self.catch_trial.apply(raw, &mut self.rng);
        task.record_stimulus(stimulus);
        tracing::debug!(trial = task.current_index(), y, raw, stimulus, "stimulus computed");

        if let Err(err) = self.sink.dispatch(stimulus) {
            tracing::error!("stimulus playback failed: {err:#}");
        }

        commands.push(SurfaceCommand::PlaceDot { x, y });
        self.click_at = Some((x, y));

        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.pending = Some(OneShot::schedule(
            token,
            self.timer.now(),
            self.response_delay,
            self.cancel.clone(),
        ));
    }

    /// Maps the criterion line onto the stimulus scale for the current trial.
    fn save_criterion(&mut self) {
        let height = self.viewport.height;
        if let Some(task) = self.task.as_mut() {
            let value = self.criterion.value(task.params(), height);
            task.record_criterion(value);
            tracing::debug!(trial = task.current_index(), criterion = value, "criterion saved");
        }
    }

    pub fn current_state(&self) -> InteractionState {
        self.state
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    /// Index of the trial in progress, 0 when no task is running.
    pub fn current_trial(&self) -> usize {
        self.task.as_ref().map_or(0, Task::current_index)
    }

    /// Stimulus recorded for the trial in progress, if clicked.
    pub fn last_stimulus(&self) -> Option<f64> {
        self.task.as_ref().and_then(Task::pending_stimulus)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.state == InteractionState::WaitingForResponse
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pscale_core::{NullSink, Transducer};
    use pscale_timing::ManualTimer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn machine() -> (TrialStateMachine<ManualTimer, StdRng, NullSink>, ManualTimer) {
        let config = ExperimentConfig {
            p_catch_trial: 0.0,
            ..ExperimentConfig::default()
        };
        let timer = ManualTimer::new();
        let mut m = TrialStateMachine::new(
            &config,
            Viewport::new(800.0, 500.0),
            timer.clone(),
            StdRng::seed_from_u64(0),
            NullSink,
        );
        m.start_task(Task::new(Transducer::new(100.0, 1.0, 10.0)));
        (m, timer)
    }

    #[test]
    fn inputs_without_a_task_are_ignored() {
        let config = ExperimentConfig::default();
        let mut m = TrialStateMachine::new(
            &config,
            Viewport::new(800.0, 500.0),
            ManualTimer::new(),
            StdRng::seed_from_u64(0),
            NullSink,
        );
        assert!(m.handle_input(TrialInput::PointerUp { x: 1.0, y: 1.0 }).is_empty());
        assert_eq!(m.current_state(), InteractionState::WaitingForClick);
    }

    #[test]
    fn hover_toggles_grab_cursor() {
        let (mut m, _) = machine();
        let cmds = m.handle_input(TrialInput::PointerMove { x: 10.0, y: 102.0 });
        assert_eq!(cmds, vec![SurfaceCommand::SetCursor(Cursor::Grab)]);
        assert!(m.handle_input(TrialInput::PointerMove { x: 11.0, y: 101.0 }).is_empty());
        let cmds = m.handle_input(TrialInput::PointerMove { x: 10.0, y: 200.0 });
        assert_eq!(cmds, vec![SurfaceCommand::SetCursor(Cursor::Default)]);
    }

    #[test]
    fn drag_without_target_consumes_no_trial() {
        let (mut m, _) = machine();
        m.handle_input(TrialInput::PointerDown { x: 10.0, y: 300.0 });
        let cmds = m.handle_input(TrialInput::PointerMove { x: 12.0, y: 305.0 });
        assert!(cmds.is_empty());
        assert!(m.is_dragging());
        m.handle_input(TrialInput::PointerUp { x: 12.0, y: 305.0 });
        assert_eq!(m.current_state(), InteractionState::WaitingForClick);
        assert_eq!(m.criterion.position(), 100.0);
        assert_eq!(m.task().unwrap().pending_stimulus(), None);
    }

    #[test]
    fn stale_token_does_not_open_the_response_window() {
        let (mut m, timer) = machine();
        m.handle_input(TrialInput::PointerDown { x: 10.0, y: 300.0 });
        m.handle_input(TrialInput::PointerUp { x: 10.0, y: 300.0 });
        assert!(m.handle_input(TrialInput::TimerFired(TimerToken(99))).is_empty());
        assert_eq!(m.current_state(), InteractionState::PlayingStimulus);

        timer.advance(Duration::from_millis(400));
        let fired = m.update();
        assert_eq!(fired, vec![TrialInput::TimerFired(TimerToken(0))]);
    }
}
