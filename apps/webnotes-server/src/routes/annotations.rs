//! Annotation API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::annotations::AnnotationRecord;
use crate::browse::{visible, AnnotationStats, ListScope};
use crate::error::Result;
use crate::state::AppState;

/// Create the annotations router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_annotations).delete(clear_annotations))
        .route("/stats", get(annotation_stats))
        .route("/:id", delete(delete_annotation))
}

/// Query parameters for listing annotations
#[derive(Debug, Deserialize)]
pub struct ListParams {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// List annotations newest first, optionally for one page
async fn list_annotations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AnnotationRecord>>> {
    let records = state.store().list_all().await?;
    let scope = match params.url {
        Some(url) => ListScope::Page(url),
        None => ListScope::All,
    };
    Ok(Json(visible(&records, &scope)))
}

async fn annotation_stats(State(state): State<AppState>) -> Result<Json<AnnotationStats>> {
    let records = state.store().list_all().await?;
    Ok(Json(AnnotationStats::collect(&records)))
}

/// Delete one annotation; unknown ids succeed too
async fn delete_annotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.store().delete_by_id(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_annotations(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let removed = state.store().clear_all().await?;
    Ok(Json(ClearResponse { removed }))
}
