//! Annotation message service
//!
//! Capture surfaces and the popup never touch storage directly. They send
//! `action`-tagged JSON messages to the process that owns the store and get
//! a JSON response back:
//!
//! ```json
//! { "action": "saveAnnotation", "data": { "type": "highlight", ... } }
//! { "success": true, "id": "..." }
//! ```
//!
//! Messages travel in envelopes carrying a request id, and responses are
//! matched back to their request by that id (see [`bus`]).

pub mod bus;

use serde::{Deserialize, Serialize};

use crate::annotations::{AnnotationRecord, AnnotationStore, NewAnnotation};

/// A request to the annotation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    SaveAnnotation { data: NewAnnotation },
    GetAnnotations { url: String },
    GetAllAnnotations,
    DeleteAnnotation { id: String },
    ClearAnnotations,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::SaveAnnotation { .. } => "saveAnnotation",
            Request::GetAnnotations { .. } => "getAnnotations",
            Request::GetAllAnnotations => "getAllAnnotations",
            Request::DeleteAnnotation { .. } => "deleteAnnotation",
            Request::ClearAnnotations => "clearAnnotations",
        }
    }
}

/// The service's answer. Variant order matters for untagged decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Saved { success: bool, id: String },
    Annotations(Vec<AnnotationRecord>),
    Failure { success: bool, error: String },
    Ack { success: bool },
}

impl Response {
    pub fn saved(id: String) -> Self {
        Response::Saved { success: true, id }
    }

    pub fn ack() -> Self {
        Response::Ack { success: true }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Response::Failure {
            success: false,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            Response::Saved { success, .. } | Response::Ack { success } => *success,
            Response::Annotations(_) => true,
            Response::Failure { .. } => false,
        }
    }

    /// Records carried by the response; anything else reads as none
    pub fn into_annotations(self) -> Vec<AnnotationRecord> {
        match self {
            Response::Annotations(records) => records,
            _ => Vec::new(),
        }
    }

    /// Id of a saved record
    pub fn saved_id(&self) -> Option<&str> {
        match self {
            Response::Saved { success: true, id } => Some(id),
            _ => None,
        }
    }
}

/// A request with the id its response will carry.
/// Without an id the request is a notification and gets no response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
    pub message: Request,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "requestId")]
    pub request_id: u64,
    pub response: Response,
}

/// Handles protocol messages against the store
#[derive(Clone)]
pub struct AnnotationService {
    store: AnnotationStore,
}

impl AnnotationService {
    pub fn new(store: AnnotationStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Answer one message. Never fails: errors become `{success: false}`.
    pub async fn handle(&self, request: Request) -> Response {
        let action = request.action();
        tracing::debug!(action, "Handling annotation message");

        let result = match request {
            Request::SaveAnnotation { data } => self.store.append(data).await.map(Response::saved),
            Request::GetAnnotations { url } => {
                self.store.list_by_url(&url).await.map(Response::Annotations)
            }
            Request::GetAllAnnotations => self.store.list_all().await.map(Response::Annotations),
            Request::DeleteAnnotation { id } => {
                self.store.delete_by_id(&id).await.map(|_| Response::ack())
            }
            Request::ClearAnnotations => self.store.clear_all().await.map(|_| Response::ack()),
        };

        result.unwrap_or_else(|e| {
            if e.is_validation() {
                tracing::debug!(action, error = %e, "Rejected annotation message");
            } else {
                tracing::error!(action, error = %e, "Annotation message failed");
            }
            Response::failure(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{MemoryKv, PageInfo};
    use crate::highlight::Color;
    use serde_json::json;
    use std::sync::Arc;

    fn setup_service() -> AnnotationService {
        AnnotationService::new(AnnotationStore::new(Arc::new(MemoryKv::new())))
    }

    fn save(text: &str, url: &str) -> Request {
        Request::SaveAnnotation {
            data: NewAnnotation::highlight(text, Color::Yellow, None, &PageInfo::new(url, "T")),
        }
    }

    #[test]
    fn test_request_wire_format() {
        let request: Request = serde_json::from_value(json!({
            "action": "getAnnotations",
            "url": "https://example.com/"
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::GetAnnotations {
                url: "https://example.com/".to_string()
            }
        );

        let all: Request = serde_json::from_value(json!({ "action": "getAllAnnotations" })).unwrap();
        assert_eq!(all, Request::GetAllAnnotations);

        let delete = serde_json::to_value(Request::DeleteAnnotation { id: "x".to_string() }).unwrap();
        assert_eq!(delete, json!({ "action": "deleteAnnotation", "id": "x" }));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result = serde_json::from_value::<Request>(json!({ "action": "updateAnnotation" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_wire_format() {
        assert_eq!(
            serde_json::to_value(Response::saved("abc".to_string())).unwrap(),
            json!({ "success": true, "id": "abc" })
        );
        assert_eq!(
            serde_json::to_value(Response::ack()).unwrap(),
            json!({ "success": true })
        );
        assert_eq!(
            serde_json::to_value(Response::failure("boom")).unwrap(),
            json!({ "success": false, "error": "boom" })
        );
        assert_eq!(
            serde_json::to_value(Response::Annotations(Vec::new())).unwrap(),
            json!([])
        );

        let failure: Response =
            serde_json::from_value(json!({ "success": false, "error": "boom" })).unwrap();
        assert_eq!(failure, Response::failure("boom"));
        let ack: Response = serde_json::from_value(json!({ "success": true })).unwrap();
        assert_eq!(ack, Response::ack());
    }

    #[test]
    fn test_envelope_without_id_is_notification() {
        let envelope: RequestEnvelope =
            serde_json::from_value(json!({ "message": { "action": "clearAnnotations" } })).unwrap();
        assert_eq!(envelope.request_id, None);

        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "requestId": 7,
            "message": { "action": "clearAnnotations" }
        }))
        .unwrap();
        assert_eq!(envelope.request_id, Some(7));
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let service = setup_service();

        let saved = service.handle(save("hello", "https://a.example/")).await;
        let id = saved.saved_id().unwrap().to_string();

        let response = service
            .handle(Request::GetAnnotations {
                url: "https://a.example/".to_string(),
            })
            .await;
        let records = response.into_annotations();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
    }

    #[tokio::test]
    async fn test_save_invalid_reports_failure() {
        let service = setup_service();

        let response = service.handle(save("   ", "https://a.example/")).await;

        assert!(!response.is_success());
        assert!(matches!(response, Response::Failure { .. }));
    }

    #[tokio::test]
    async fn test_delete_unknown_id_succeeds() {
        let service = setup_service();
        service.handle(save("keep", "https://a.example/")).await;

        let response = service
            .handle(Request::DeleteAnnotation {
                id: "missing".to_string(),
            })
            .await;

        assert_eq!(response, Response::ack());
        let all = service.handle(Request::GetAllAnnotations).await.into_annotations();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let service = setup_service();
        service.handle(save("a", "https://a.example/")).await;
        service.handle(save("b", "https://b.example/")).await;

        assert_eq!(service.handle(Request::ClearAnnotations).await, Response::ack());
        assert!(service
            .handle(Request::GetAllAnnotations)
            .await
            .into_annotations()
            .is_empty());
    }
}
