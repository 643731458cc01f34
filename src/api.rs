pub(crate) mod analysis;
pub(crate) mod health;
pub(crate) mod metrics;

use axum::{Router, routing::get};

use crate::app::AppState;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(metrics::exporter))
        .route(
            "/v1/analysis",
            get(analysis::current)
                .post(analysis::upload)
                .delete(analysis::clear),
        )
        .route("/v1/analysis/warnings", get(analysis::warnings))
        .route("/v1/analysis/errors", get(analysis::errors))
        .route("/v1/analysis/trends", get(analysis::trends))
        .with_state(state)
}
