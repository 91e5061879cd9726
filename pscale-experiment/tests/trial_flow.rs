use anyhow::Result;
use pscale_core::{
    Cursor, InteractionState, Response, StimulusSink, SurfaceCommand, Transducer, Viewport,
};
use pscale_experiment::{ExperimentConfig, Task, TrialInput, TrialStateMachine};
use pscale_synth::{RecordingOutput, StimulusPlayer};
use pscale_timing::{ManualTimer, Timer, TimerToken};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Remembers every dispatched intensity together with the clock at dispatch.
#[derive(Clone)]
struct Intensities {
    timer: ManualTimer,
    seen: Rc<RefCell<Vec<(f64, u64)>>>,
}

impl StimulusSink for Intensities {
    fn dispatch(&mut self, intensity: f64) -> Result<()> {
        self.seen.borrow_mut().push((intensity, self.timer.now()));
        Ok(())
    }
}

type Machine = TrialStateMachine<ManualTimer, StdRng, Intensities>;

fn no_catch() -> ExperimentConfig {
    ExperimentConfig {
        p_catch_trial: 0.0,
        ..ExperimentConfig::default()
    }
}

fn setup(config: &ExperimentConfig) -> (Machine, ManualTimer, Intensities) {
    let timer = ManualTimer::new();
    let sink = Intensities {
        timer: timer.clone(),
        seen: Rc::new(RefCell::new(Vec::new())),
    };
    let mut machine = TrialStateMachine::new(
        config,
        Viewport::new(800.0, 500.0),
        timer.clone(),
        StdRng::seed_from_u64(1234),
        sink.clone(),
    );
    machine.start_task(Task::new(Transducer::new(100.0, 1.0, 10.0)));
    (machine, timer, sink)
}

fn click(m: &mut Machine, x: f64, y: f64) -> Vec<SurfaceCommand> {
    let mut cmds = m.handle_input(TrialInput::PointerDown { x, y });
    cmds.extend(m.handle_input(TrialInput::PointerUp { x, y }));
    cmds
}

fn fire_due(m: &mut Machine) -> Vec<SurfaceCommand> {
    let mut cmds = Vec::new();
    for input in m.update() {
        cmds.extend(m.handle_input(input));
    }
    cmds
}

fn drag_criterion(m: &mut Machine, from: f64, to: f64) -> Vec<SurfaceCommand> {
    let mut cmds = m.handle_input(TrialInput::PointerDown { x: 5.0, y: from });
    cmds.extend(m.handle_input(TrialInput::PointerMove { x: 5.0, y: (from + to) / 2.0 }));
    cmds.extend(m.handle_input(TrialInput::PointerMove { x: 5.0, y: to }));
    cmds.extend(m.handle_input(TrialInput::PointerUp { x: 5.0, y: to }));
    cmds
}

#[test]
fn click_to_response_scenario() {
    let (mut m, timer, sink) = setup(&no_catch());

    let cmds = click(&mut m, 400.0, 300.0);
    assert_eq!(
        cmds,
        vec![
            SurfaceCommand::PlaceDot { x: 400.0, y: 300.0 },
            SurfaceCommand::SetCursor(Cursor::Default),
        ]
    );
    assert_eq!(m.current_state(), InteractionState::PlayingStimulus);
    assert_eq!(sink.seen.borrow().as_slice(), &[(2.5, 0)]);
    assert_eq!(m.last_stimulus(), Some(2.5));

    timer.advance(Duration::from_millis(400));
    let cmds = fire_due(&mut m);
    assert_eq!(cmds, vec![SurfaceCommand::ShowResponseBox { x: 400.0, y: 300.0 }]);
    assert!(m.is_awaiting_response());

    let cmds = m.handle_input(TrialInput::ResponseChosen(Response::Yes));
    assert_eq!(cmds, vec![SurfaceCommand::HideResponseBox]);
    assert_eq!(m.current_state(), InteractionState::WaitingForClick);

    let task = m.task().unwrap();
    assert_eq!(task.current_index(), 1);
    let record = task.trials()[0];
    assert_eq!(record.stimulus, 2.5);
    assert_eq!(record.response, Response::Yes);
    // line untouched at y = 100: y_coord 400 -> p = 300/400
    assert!((record.criterion - 7.5).abs() < 1e-12);
}

#[test]
fn response_box_waits_exactly_twice_the_stimulus_length() {
    let (mut m, timer, _) = setup(&no_catch());
    click(&mut m, 10.0, 250.0);

    timer.advance(Duration::from_millis(399));
    assert!(fire_due(&mut m).is_empty());
    assert_eq!(m.time_until_due(), Some(Duration::from_millis(1)));
    assert_eq!(m.current_state(), InteractionState::PlayingStimulus);

    timer.advance(Duration::from_millis(1));
    assert_eq!(fire_due(&mut m).len(), 1);
    assert_eq!(m.time_until_due(), None);
}

#[test]
fn longer_stimuli_stretch_the_delay() {
    let config = ExperimentConfig {
        stim_length_ms: 350,
        ..no_catch()
    };
    let (mut m, timer, _) = setup(&config);
    click(&mut m, 10.0, 250.0);
    timer.advance(Duration::from_millis(699));
    assert!(fire_due(&mut m).is_empty());
    timer.advance(Duration::from_millis(1));
    assert!(!fire_due(&mut m).is_empty());
}

#[test]
fn inputs_outside_their_state_are_ignored() {
    let (mut m, timer, sink) = setup(&no_catch());

    // answering before any click
    assert!(m.handle_input(TrialInput::ResponseChosen(Response::Yes)).is_empty());
    assert_eq!(m.current_trial(), 0);

    click(&mut m, 10.0, 300.0);
    // clicking and dragging while the stimulus plays
    assert!(click(&mut m, 20.0, 100.0).is_empty());
    assert!(drag_criterion(&mut m, 100.0, 400.0).is_empty());
    assert!(m.handle_input(TrialInput::ResponseChosen(Response::No)).is_empty());
    assert_eq!(sink.seen.borrow().len(), 1);
    assert_eq!(m.criterion.position(), 100.0);

    timer.advance(Duration::from_millis(400));
    fire_due(&mut m);
    // clicking while the response box is up
    assert!(click(&mut m, 30.0, 30.0).is_empty());
    assert!(m.is_awaiting_response());
    assert_eq!(sink.seen.borrow().len(), 1);
}

#[test]
fn dragging_the_criterion_moves_it_without_a_trial() {
    let (mut m, _, sink) = setup(&no_catch());

    let cmds = drag_criterion(&mut m, 102.0, 300.0);
    assert_eq!(
        cmds,
        vec![
            SurfaceCommand::SetCursor(Cursor::Grabbing),
            SurfaceCommand::MoveCriterion { y: 201.0 },
            SurfaceCommand::MoveCriterion { y: 300.0 },
            SurfaceCommand::SetCursor(Cursor::Default),
        ]
    );
    assert_eq!(m.current_state(), InteractionState::WaitingForClick);
    assert!(sink.seen.borrow().is_empty());
    assert_eq!(m.criterion.position(), 300.0);
    assert_eq!(m.current_trial(), 0);
    assert!((m.task().unwrap().pending_criterion().unwrap() - 2.5).abs() < 1e-12);
}

#[test]
fn only_the_last_criterion_before_the_response_counts() {
    let (mut m, timer, _) = setup(&no_catch());

    drag_criterion(&mut m, 100.0, 200.0);
    drag_criterion(&mut m, 200.0, 450.0);
    click(&mut m, 10.0, 300.0);
    timer.advance(Duration::from_millis(400));
    fire_due(&mut m);
    m.handle_input(TrialInput::ResponseChosen(Response::No));

    // 450 is below lambda: criterion collapses to zero
    assert_eq!(m.task().unwrap().trials()[0].criterion, 0.0);
}

#[test]
fn criterion_carries_over_between_trials() {
    let (mut m, timer, _) = setup(&no_catch());
    drag_criterion(&mut m, 100.0, 200.0);

    for y in [300.0, 150.0, 420.0] {
        click(&mut m, 10.0, y);
        timer.advance(Duration::from_millis(400));
        fire_due(&mut m);
        m.handle_input(TrialInput::ResponseChosen(Response::Yes));
    }

    let trials = m.task().unwrap().trials();
    assert_eq!(trials.len(), 3);
    assert!(trials.iter().all(|t| (t.criterion - 5.0).abs() < 1e-12));
    assert_eq!(trials[2].stimulus, 0.0);
}

#[test]
fn catch_trials_only_ever_attenuate() {
    let config = ExperimentConfig {
        p_catch_trial: 1.0,
        ..ExperimentConfig::default()
    };
    let (mut m, timer, sink) = setup(&config);
    for _ in 0..50 {
        click(&mut m, 10.0, 0.0);
        timer.advance(Duration::from_millis(400));
        fire_due(&mut m);
        m.handle_input(TrialInput::ResponseChosen(Response::No));
    }
    let seen = sink.seen.borrow();
    assert_eq!(seen.len(), 50);
    assert!(seen.iter().all(|&(s, _)| (0.0..10.0).contains(&s)));
    let stored: Vec<f64> = m.task().unwrap().trials().iter().map(|t| t.stimulus).collect();
    let sent: Vec<f64> = seen.iter().map(|&(s, _)| s).collect();
    assert_eq!(stored, sent);
}

#[test]
fn disposing_mid_trial_cancels_the_timer() {
    let (mut m, timer, _) = setup(&no_catch());
    let cancel = m.cancel_token();
    click(&mut m, 10.0, 300.0);

    let task = m.dispose().unwrap();
    assert!(cancel.is_cancelled());
    assert_eq!(task.current_index(), 0);
    assert_eq!(task.pending_stimulus(), Some(2.5));

    timer.advance(Duration::from_secs(1));
    assert!(m.update().is_empty());
    assert!(m.handle_input(TrialInput::TimerFired(TimerToken(0))).is_empty());
    assert_eq!(m.current_state(), InteractionState::WaitingForClick);
    assert!(m.task().is_none());
}

#[test]
fn old_timers_cannot_touch_a_new_task() {
    let (mut m, timer, _) = setup(&no_catch());
    click(&mut m, 10.0, 300.0);
    m.start_task(Task::new(Transducer::new(50.0, 2.0, 8.0)));

    click(&mut m, 10.0, 300.0);
    // token 0 belonged to the discarded task
    assert!(m.handle_input(TrialInput::TimerFired(TimerToken(0))).is_empty());
    assert_eq!(m.current_state(), InteractionState::PlayingStimulus);

    timer.advance(Duration::from_millis(400));
    assert_eq!(m.update(), vec![TrialInput::TimerFired(TimerToken(1))]);
}

#[test]
fn synthesized_stimulus_reaches_the_audio_output() {
    let config = no_catch();
    let timer = ManualTimer::new();
    let audio = RecordingOutput::new(48_000);
    let player = StimulusPlayer::new(config.synth_params(), audio.clone()).unwrap();
    let mut m = TrialStateMachine::new(
        &config,
        Viewport::new(800.0, 500.0),
        timer.clone(),
        StdRng::seed_from_u64(9),
        player,
    );
    m.start_task(Task::new(Transducer::new(100.0, 1.0, 10.0)));

    m.handle_input(TrialInput::PointerDown { x: 1.0, y: 300.0 });
    m.handle_input(TrialInput::PointerUp { x: 1.0, y: 300.0 });
    assert_eq!(audio.count(), 1);
    assert_eq!(audio.buffers()[0].len(), 2 * 9_600);
    assert_eq!(m.sink.played(), 1);
}

#[test]
fn config_that_rounds_badly_at_the_device_rate_fails_at_startup() {
    let config = ExperimentConfig {
        stim_length_ms: 10,
        ramp_length_ms: 5,
        ..no_catch()
    };
    config.validate().unwrap();

    let audio = RecordingOutput::new(44_100);
    let err = StimulusPlayer::new(config.synth_params(), audio.clone())
        .err()
        .unwrap();
    assert!(format!("{err:#}").contains("44100 Hz"));
    assert_eq!(audio.count(), 0);
}

#[test]
fn failed_playback_still_runs_the_trial() {
    struct Broken;
    impl StimulusSink for Broken {
        fn dispatch(&mut self, _intensity: f64) -> Result<()> {
            anyhow::bail!("device gone")
        }
    }

    let config = no_catch();
    let timer = ManualTimer::new();
    let mut m = TrialStateMachine::new(
        &config,
        Viewport::new(800.0, 500.0),
        timer.clone(),
        StdRng::seed_from_u64(9),
        Broken,
    );
    m.start_task(Task::new(Transducer::new(100.0, 1.0, 10.0)));

    m.handle_input(TrialInput::PointerDown { x: 1.0, y: 300.0 });
    let cmds = m.handle_input(TrialInput::PointerUp { x: 1.0, y: 300.0 });
    assert!(cmds.contains(&SurfaceCommand::PlaceDot { x: 1.0, y: 300.0 }));
    assert_eq!(m.current_state(), InteractionState::PlayingStimulus);
    assert_eq!(m.task().unwrap().pending_stimulus(), Some(2.5));
    timer.advance(Duration::from_millis(400));
    assert_eq!(m.update().len(), 1);
}
