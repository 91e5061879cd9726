pub mod catch_trial;
pub mod phase;
pub mod stimulus;
pub mod surface;
pub mod transducer;
pub mod trial;

pub use catch_trial::CatchTrial;
pub use phase::{Phase, SessionPhase};
pub use stimulus::{NullSink, StimulusSink};
pub use surface::{Cursor, SurfaceCommand, Viewport};
pub use transducer::Transducer;
pub use trial::{InteractionState, Response, TrialRecord};
