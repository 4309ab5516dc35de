pub mod environment;
pub mod health;
pub mod stats;
pub mod trace;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(environment::router())
                .merge(trace::router())
                .merge(stats::router()),
        )
        .with_state(state)
}
