//! Markdown export endpoint

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;

use crate::error::Result;
use crate::export::{export_file_name, render_report};
use crate::state::AppState;

/// Create the export router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(export_markdown))
}

async fn export_markdown(State(state): State<AppState>) -> Result<Response> {
    let records = state.store().list_all().await?;
    let now = Utc::now();
    tracing::info!(count = records.len(), "Exporting annotations");

    let disposition = format!("attachment; filename=\"{}\"", export_file_name(now));
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        render_report(&records, now),
    )
        .into_response())
}
