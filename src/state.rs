use crate::services::{EnvironmentService, StatsService, TraceService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub environment: Arc<EnvironmentService>,
    pub trace: Arc<TraceService>,
    pub stats: Arc<StatsService>,
}
