pub mod calc;
pub mod config;
pub mod context;
pub mod csvout;
pub mod orchestrator;
pub mod progress;
pub mod registry;
pub mod step;
pub mod steps;

pub use config::{RoiNameChange, RunConfig, SubgroupFilter};
pub use context::{BatchContext, CacheValue, PatientContext, ValueCache};
pub use orchestrator::{BatchOrchestrator, BatchRun, RunStatus};
pub use progress::{NullProgress, ProgressSink, RecordingProgress};
pub use registry::{StepHandler, StepRegistry};
pub use step::{BatchStep, ProcessStep};
