//! Message protocol endpoint
//!
//! Accepts either an envelope `{ requestId, message }` or a bare message.
//! Enveloped requests get `{ requestId, response }` back; an envelope
//! without an id is a notification and gets 204. Service failures are part
//! of the protocol (`{ success: false, error }`), so they still return 200.
//! A body that is not a known message is a 400.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::service::{Request, RequestEnvelope, ResponseEnvelope};
use crate::state::AppState;

/// Create the messages router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(handle_message))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Incoming {
    Envelope(RequestEnvelope),
    Bare(Request),
}

async fn handle_message(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Incoming>, JsonRejection>,
) -> Result<Response> {
    let Json(incoming) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected message body");
        AppError::BadRequest(rejection.body_text())
    })?;

    let response = match incoming {
        Incoming::Envelope(RequestEnvelope {
            request_id: Some(request_id),
            message,
        }) => {
            let response = state.service().handle(message).await;
            Json(ResponseEnvelope {
                request_id,
                response,
            })
            .into_response()
        }
        Incoming::Envelope(RequestEnvelope {
            request_id: None,
            message,
        }) => {
            state.service().handle(message).await;
            StatusCode::NO_CONTENT.into_response()
        }
        Incoming::Bare(message) => Json(state.service().handle(message).await).into_response(),
    };
    Ok(response)
}
