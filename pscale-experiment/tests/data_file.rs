use pretty_assertions::assert_eq;
use pscale_core::{NullSink, SessionPhase, Viewport};
use pscale_experiment::export::{self, DataRow};
use pscale_experiment::task::sham_tasks;
use pscale_experiment::{ExperimentConfig, Session, SimulatedObserver};
use pscale_timing::ManualTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::path::PathBuf;

fn unique_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!(
        "pscale_data_test_{}_{}",
        name,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    p
}

#[test]
fn five_tasks_of_twenty_trials_make_101_lines() {
    let mut rng = StdRng::seed_from_u64(2024);
    let tasks = sham_tasks(&ExperimentConfig::default(), 5, 20, &mut rng);
    let text = export::to_string(&tasks);

    assert_eq!(text.lines().count(), 101);
    assert!(text.ends_with('\n'));
    assert_eq!(text.lines().next(), Some(export::HEADER));
    let task_ids: Vec<&str> = text
        .lines()
        .skip(1)
        .map(|l| l.split(' ').next().unwrap())
        .collect();
    assert_eq!(task_ids[0], "0");
    assert_eq!(task_ids[19], "0");
    assert_eq!(task_ids[20], "1");
    assert_eq!(task_ids[99], "4");
}

#[test]
fn written_data_parses_back_to_the_same_rows() {
    let mut rng = StdRng::seed_from_u64(77);
    let tasks = sham_tasks(&ExperimentConfig::default(), 3, 7, &mut rng);
    let expected: Vec<DataRow> = export::rows(&tasks).collect();

    let mut bytes = Vec::new();
    export::write_data(&mut bytes, &tasks).unwrap();
    let parsed = export::parse_data(std::str::from_utf8(&bytes).unwrap()).unwrap();

    assert_eq!(parsed, expected);
    assert_eq!(parsed.len(), 21);
}

#[test]
fn simulated_session_writes_a_complete_file() {
    let config = ExperimentConfig {
        tasks_per_session: 5,
        ..ExperimentConfig::default()
    };
    let mut session: Session<SessionPhase, _, _, _> = Session::new(
        config,
        Viewport::new(1024.0, 700.0),
        ManualTimer::new(),
        StdRng::seed_from_u64(8),
        NullSink,
    );
    let observer = SimulatedObserver::default();
    let mut rng = StdRng::seed_from_u64(80);

    session.advance_phase();
    observer.run_trials(&mut session.machine, 3, &mut rng).unwrap();
    session.advance_phase();
    session.advance_phase();
    loop {
        observer.run_trials(&mut session.machine, 20, &mut rng).unwrap();
        if session.next_task() {
            break;
        }
    }

    let dir = unique_dir("session");
    let path = session.write_data(&dir).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("expData") && name.ends_with(".txt"), "{name}");

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 101);
    let rows = export::parse_data(&text).unwrap();
    for (i, task) in session.completed().iter().enumerate() {
        let task_rows: Vec<&DataRow> = rows.iter().filter(|r| r.task_index == i).collect();
        assert_eq!(task_rows.len(), 20);
        for (row, trial) in task_rows.iter().zip(task.trials()) {
            assert_eq!(row.stimulus, trial.stimulus);
            assert_eq!(row.criterion, trial.criterion);
            assert_eq!(row.response, trial.response);
            assert_eq!(row.lambda_px, task.params().lambda_px);
            assert!(row.stimulus >= 0.0 && row.stimulus <= task.params().max_val);
        }
    }

    let _ = fs::remove_dir_all(&dir);
}
