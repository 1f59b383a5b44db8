//! In-process message bus between capture surfaces and the service
//!
//! [`channel`] returns a [`ServiceClient`] and a [`ServiceEndpoint`]. The
//! client tags every request with a fresh id and parks a oneshot sender in
//! its pending table; a dispatcher task routes each response envelope to the
//! sender registered under its id. The endpoint handles each request on its
//! own task, so responses may come back out of order.
//!
//! When the endpoint is gone, requests resolve to `None`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::annotations::{AnnotationRecord, NewAnnotation};

use super::{AnnotationService, Request, RequestEnvelope, Response, ResponseEnvelope};

type PendingTable = Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>>;

/// Create a connected client/endpoint pair.
///
/// Spawns the response dispatcher, so this must run inside a Tokio runtime.
pub fn channel(capacity: usize) -> (ServiceClient, ServiceEndpoint) {
    let (request_tx, request_rx) = mpsc::channel(capacity.max(1));
    let (response_tx, response_rx) = mpsc::channel(capacity.max(1));
    let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));

    tokio::spawn(dispatch(response_rx, pending.clone()));

    let client = ServiceClient {
        request_tx,
        pending,
        next_id: Arc::new(AtomicU64::new(1)),
    };
    let endpoint = ServiceEndpoint {
        request_rx,
        response_tx,
    };
    (client, endpoint)
}

/// Connect a client to `service` and start serving
pub fn connect(service: AnnotationService, capacity: usize) -> ServiceClient {
    let (client, endpoint) = channel(capacity);
    tokio::spawn(endpoint.serve(service));
    client
}

async fn dispatch(mut response_rx: mpsc::Receiver<ResponseEnvelope>, pending: PendingTable) {
    while let Some(envelope) = response_rx.recv().await {
        let waiter = pending.lock().remove(&envelope.request_id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(envelope.response);
            }
            None => {
                tracing::warn!(request_id = envelope.request_id, "Response for unknown request");
            }
        }
    }

    // Endpoint gone: wake everyone still waiting.
    let abandoned = std::mem::take(&mut *pending.lock());
    if !abandoned.is_empty() {
        tracing::debug!(count = abandoned.len(), "Dropping requests without a service");
    }
}

/// Sending side used by pages and the popup
#[derive(Clone)]
pub struct ServiceClient {
    request_tx: mpsc::Sender<RequestEnvelope>,
    pending: PendingTable,
    next_id: Arc<AtomicU64>,
}

impl ServiceClient {
    /// Send a request and wait for its response.
    /// `None` when the service is unavailable.
    pub async fn request(&self, message: Request) -> Option<Response> {
        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(request_id, tx);

        let envelope = RequestEnvelope {
            request_id: Some(request_id),
            message,
        };
        if self.request_tx.send(envelope).await.is_err() {
            self.pending.lock().remove(&request_id);
            tracing::debug!(request_id, "Annotation service unavailable");
            return None;
        }

        rx.await.ok()
    }

    /// Fire-and-forget: no response is produced or awaited
    pub async fn notify(&self, message: Request) {
        let envelope = RequestEnvelope {
            request_id: None,
            message,
        };
        if self.request_tx.send(envelope).await.is_err() {
            tracing::debug!("Annotation service unavailable, notification dropped");
        }
    }

    /// Save a draft, returning the assigned id on success
    pub async fn save(&self, draft: NewAnnotation) -> Option<String> {
        let response = self.request(Request::SaveAnnotation { data: draft }).await?;
        response.saved_id().map(str::to_string)
    }

    /// Annotations for one page; empty when the service is unavailable
    pub async fn annotations_for(&self, url: &str) -> Vec<AnnotationRecord> {
        self.request(Request::GetAnnotations {
            url: url.to_string(),
        })
        .await
        .map(Response::into_annotations)
        .unwrap_or_default()
    }

    /// Every annotation; empty when the service is unavailable
    pub async fn all_annotations(&self) -> Vec<AnnotationRecord> {
        self.request(Request::GetAllAnnotations)
            .await
            .map(Response::into_annotations)
            .unwrap_or_default()
    }

    pub async fn delete(&self, id: &str) -> bool {
        self.request(Request::DeleteAnnotation { id: id.to_string() })
            .await
            .is_some_and(|r| r.is_success())
    }

    pub async fn clear(&self) -> bool {
        self.request(Request::ClearAnnotations)
            .await
            .is_some_and(|r| r.is_success())
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }
}

/// Receiving side, owned by the process holding the store
pub struct ServiceEndpoint {
    request_rx: mpsc::Receiver<RequestEnvelope>,
    response_tx: mpsc::Sender<ResponseEnvelope>,
}

impl ServiceEndpoint {
    /// Serve until every client is dropped
    pub async fn serve(mut self, service: AnnotationService) {
        while let Some(envelope) = self.request_rx.recv().await {
            let service = service.clone();
            let response_tx = self.response_tx.clone();

            tokio::spawn(async move {
                let response = service.handle(envelope.message).await;
                if let Some(request_id) = envelope.request_id {
                    let reply = ResponseEnvelope {
                        request_id,
                        response,
                    };
                    if response_tx.send(reply).await.is_err() {
                        tracing::debug!(request_id, "Client gone before response");
                    }
                }
            });
        }
        tracing::debug!("Annotation service endpoint stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{AnnotationStore, MemoryKv, PageInfo};
    use crate::highlight::Color;

    fn setup_client() -> ServiceClient {
        let store = AnnotationStore::new(Arc::new(MemoryKv::new()));
        connect(AnnotationService::new(store), 16)
    }

    fn draft(text: &str, url: &str) -> NewAnnotation {
        NewAnnotation::highlight(text, Color::Blue, None, &PageInfo::new(url, "T"))
    }

    #[tokio::test]
    async fn test_request_round_trip() {
        let client = setup_client();

        let id = client.save(draft("hello", "https://a.example/")).await.unwrap();

        let records = client.annotations_for("https://a.example/").await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(client.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_get_their_own_responses() {
        let client = setup_client();
        client.save(draft("on a", "https://a.example/")).await.unwrap();
        client.save(draft("on b", "https://b.example/")).await.unwrap();

        let (a, b, all) = tokio::join!(
            client.annotations_for("https://a.example/"),
            client.annotations_for("https://b.example/"),
            client.all_annotations(),
        );

        assert_eq!(a.len(), 1);
        assert_eq!(a[0].text, "on a");
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].text, "on b");
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_notify_has_no_response() {
        let client = setup_client();

        client
            .notify(Request::SaveAnnotation {
                data: draft("fire and forget", "https://a.example/"),
            })
            .await;
        assert_eq!(client.pending_len(), 0);

        let mut seen = Vec::new();
        for _ in 0..50 {
            seen = client.all_annotations().await;
            if !seen.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].text, "fire and forget");
        assert_eq!(client.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_service_gone_means_no_results() {
        let (client, endpoint) = channel(4);
        drop(endpoint);

        assert!(client.request(Request::GetAllAnnotations).await.is_none());
        assert!(client.all_annotations().await.is_empty());
        assert!(client.save(draft("lost", "https://a.example/")).await.is_none());
        assert!(!client.delete("anything").await);
        assert_eq!(client.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let client = setup_client();
        let id = client.save(draft("one", "https://a.example/")).await.unwrap();
        client.save(draft("two", "https://a.example/")).await.unwrap();

        assert!(client.delete(&id).await);
        assert!(client.delete("unknown").await);
        assert_eq!(client.all_annotations().await.len(), 1);

        assert!(client.clear().await);
        assert!(client.all_annotations().await.is_empty());
    }
}
