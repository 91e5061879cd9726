pub mod config;
pub mod criterion;
pub mod export;
pub mod observer;
pub mod session;
pub mod state;
pub mod task;
pub use config::ExperimentConfig;
pub use criterion::CriterionTracker;
pub use export::{DataRow, HEADER};
pub use observer::SimulatedObserver;
pub use session::Session;
pub use state::{TrialInput, TrialStateMachine};
pub use task::{CompletedTask, Task};
