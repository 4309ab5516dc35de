pub mod environment;
pub mod stats;
pub mod trace;

pub use environment::EnvironmentService;
pub use stats::StatsService;
pub use trace::{TraceError, TraceService};
