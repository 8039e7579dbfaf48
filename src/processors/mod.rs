pub mod messages;
pub mod orchestrator;
pub mod store;

pub use messages::{DiagnosticLog, OrchestrationMessage};
pub use orchestrator::{AggregationReport, Orchestrator};
pub use store::AggregationStore;
