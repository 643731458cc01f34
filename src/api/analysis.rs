use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    app::AppState,
    error::AnalysisError,
    ingest::{SchemaWarning, read_log_csv},
    model::{AnalysisResult, Issue},
    session::{SessionEntry, UploadFingerprint},
    trends::{IssueFilter, TrendReport, priority_options},
};

#[derive(Debug, Serialize)]
struct AnalysisResponse<'a> {
    fingerprint: String,
    cached: bool,
    analyzed_at: DateTime<Utc>,
    rows: usize,
    unparsed_timestamps: usize,
    schema_warnings: &'a [SchemaWarning],
    result: &'a AnalysisResult,
}

impl<'a> AnalysisResponse<'a> {
    fn from_entry(entry: &'a SessionEntry, cached: bool) -> Self {
        Self {
            fingerprint: entry.fingerprint.to_string(),
            cached,
            analyzed_at: entry.analyzed_at,
            rows: entry.table.records.len(),
            unparsed_timestamps: entry.table.unparsed_timestamps,
            schema_warnings: &entry.table.warnings,
            result: &entry.result,
        }
    }
}

#[derive(Debug, Serialize)]
struct WarningsResponse<'a> {
    warnings: &'a [Issue],
}

#[derive(Debug, Serialize)]
struct ErrorsResponse<'a> {
    priority_options: Vec<String>,
    total: usize,
    errors: Vec<&'a Issue>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

fn status_for(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        AnalysisError::Transport(_) => StatusCode::BAD_GATEWAY,
        AnalysisError::MalformedInput(_) => StatusCode::BAD_REQUEST,
    }
}

fn analysis_error(error: &AnalysisError) -> Response {
    let body = Json(ErrorResponse {
        error: error.to_string(),
        code: error.code(),
    });
    (status_for(error), body).into_response()
}

fn no_analysis() -> Response {
    let body = Json(ErrorResponse {
        error: "no analysis available, upload a log file first".into(),
        code: "not_found",
    });
    (StatusCode::NOT_FOUND, body).into_response()
}

async fn current_entry(state: &AppState) -> Option<SessionEntry> {
    state.session().read().await.current().cloned()
}

/// POST /v1/analysis
/// Analyzes an uploaded CSV, reusing the stored result when the same file
/// is uploaded again. A different file clears the stored result before it
/// is read, so a failed upload leaves nothing behind.
pub(crate) async fn upload(State(state): State<AppState>, body: Bytes) -> Response {
    let fingerprint = UploadFingerprint::of(&body);

    let cached = state.session().read().await.lookup(fingerprint).cloned();
    if let Some(entry) = cached {
        state.telemetry().metrics().analysis_cache_hits.inc();
        info!(%fingerprint, "returning cached analysis");
        return Json(AnalysisResponse::from_entry(&entry, true)).into_response();
    }

    if let Some(previous) = state.session().write().await.invalidate() {
        info!(
            %fingerprint,
            previous = %previous.fingerprint,
            "new upload replaces stored analysis"
        );
    }

    let table = match read_log_csv(body.as_ref()) {
        Ok(table) => table,
        Err(error) => {
            let error = AnalysisError::from(error);
            warn!(%fingerprint, error = %error, "rejected upload");
            return analysis_error(&error);
        }
    };
    for warning in &table.warnings {
        warn!(%fingerprint, "{warning}");
    }

    let result = match state.analyzer().analyze(&table.records).await {
        Ok(result) => result,
        Err(error) => return analysis_error(&error),
    };

    let entry = SessionEntry::new(fingerprint, table, result);
    let response = Json(AnalysisResponse::from_entry(&entry, false)).into_response();
    state.session().write().await.store(entry);
    response
}

/// GET /v1/analysis
pub(crate) async fn current(State(state): State<AppState>) -> Response {
    match current_entry(&state).await {
        Some(entry) => Json(AnalysisResponse::from_entry(&entry, true)).into_response(),
        None => no_analysis(),
    }
}

/// DELETE /v1/analysis
pub(crate) async fn clear(State(state): State<AppState>) -> StatusCode {
    if let Some(previous) = state.session().write().await.invalidate() {
        info!(fingerprint = %previous.fingerprint, "analysis session cleared");
    }
    StatusCode::NO_CONTENT
}

/// GET /v1/analysis/warnings
pub(crate) async fn warnings(State(state): State<AppState>) -> Response {
    let Some(entry) = current_entry(&state).await else {
        return no_analysis();
    };
    Json(WarningsResponse {
        warnings: &entry.result.warnings,
    })
    .into_response()
}

/// GET /v1/analysis/errors?priority=High&q=database
pub(crate) async fn errors(
    State(state): State<AppState>,
    Query(filter): Query<IssueFilter>,
) -> Response {
    let Some(entry) = current_entry(&state).await else {
        return no_analysis();
    };
    let all = &entry.result.errors;
    Json(ErrorsResponse {
        priority_options: priority_options(all),
        total: all.len(),
        errors: filter.apply(all),
    })
    .into_response()
}

/// GET /v1/analysis/trends
pub(crate) async fn trends(State(state): State<AppState>) -> Response {
    let Some(entry) = current_entry(&state).await else {
        return no_analysis();
    };
    Json(TrendReport::build(&entry.table)).into_response()
}
