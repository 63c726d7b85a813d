//! Form submission relay.
//!
//! `GET /` serves the submission form and `POST /submit` turns the submitted
//! fields into one chat message. A submission produces at most one outbound
//! send; failures are reported to the submitter and never queued.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, ConnectInfo, FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::DeliveryError;
use crate::message::{Message, MAX_TEXT_LEN};
use crate::platform::MessageSender;

// The form page is embedded at compile time.
const INDEX_HTML: &str = include_str!("../templates/index.html");

// ── Shared state ───────────────────────────────────────────────────────────────

pub struct RelayState {
    sender: Arc<dyn MessageSender>,
    chat_id: String,
}

impl RelayState {
    pub fn new(sender: Arc<dyn MessageSender>, chat_id: impl Into<String>) -> Self {
        Self {
            sender,
            chat_id: chat_id.into(),
        }
    }
}

// ── Request types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Best-effort client address: first `X-Forwarded-For` hop, else the socket peer.
pub struct ClientAddr(pub Option<String>);

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let peer = || {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        };

        Ok(ClientAddr(forwarded.or_else(peer)))
    }
}

// ── Errors ─────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum RelayError {
    /// Body is not a readable url-encoded form
    InvalidForm(FormRejection),
    MissingField(&'static str),
    TextTooLong(usize),
    Delivery(DeliveryError),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::InvalidForm(rejection) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid form submission: {}", rejection.body_text()),
            )
                .into_response(),
            RelayError::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                format!("Missing required field: {field}"),
            )
                .into_response(),
            RelayError::TextTooLong(len) => (
                StatusCode::BAD_REQUEST,
                format!("Message is too long ({len} > {MAX_TEXT_LEN} characters)"),
            )
                .into_response(),
            RelayError::Delivery(_) => {
                (StatusCode::BAD_GATEWAY, "Failed to deliver message").into_response()
            }
        }
    }
}

// ── Message formatting ─────────────────────────────────────────────────────────

/// `"{label}: {text}"`, where the label is the submitter's name, their address,
/// or `anonymous`, in that order.
pub fn format_submission(name: Option<&str>, client: Option<&str>, text: &str) -> String {
    let label = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or(client)
        .unwrap_or("anonymous");
    format!("{label}: {text}")
}

// ── Handlers ───────────────────────────────────────────────────────────────────

async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn submit(
    State(state): State<Arc<RelayState>>,
    ClientAddr(client): ClientAddr,
    form: Result<Form<SubmitForm>, FormRejection>,
) -> Result<&'static str, RelayError> {
    let Form(form) = form.map_err(|rejection| {
        warn!("Rejected unreadable submission: {}", rejection.body_text());
        RelayError::InvalidForm(rejection)
    })?;

    let text = form
        .text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            warn!("Rejected submission without text from {:?}", client);
            RelayError::MissingField("text")
        })?;

    // The limit applies to what is actually sent, label included.
    let body = format_submission(form.name.as_deref(), client.as_deref(), text);
    let len = body.chars().count();
    if len > MAX_TEXT_LEN {
        warn!("Rejected submission of {} characters", len);
        return Err(RelayError::TextTooLong(len));
    }

    let message = Message::new(state.chat_id.as_str(), body).map_err(RelayError::Delivery)?;

    state.sender.send(&message).await.map_err(|e| {
        error!("Failed to relay submission: {}", e);
        RelayError::Delivery(e)
    })?;

    info!("Relayed submission from {}", client.as_deref().unwrap_or("unknown"));
    Ok("OK")
}

pub fn router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/submit", post(submit))
        .with_state(state)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::RecordingSender;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(sender: Arc<RecordingSender>) -> Router {
        router(Arc::new(RelayState::new(sender, "42")))
    }

    fn form_request(body: impl Into<String>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/submit")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.into()))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_format_prefers_name() {
        assert_eq!(
            format_submission(Some("Alice"), Some("10.0.0.1"), "hello"),
            "Alice: hello"
        );
    }

    #[test]
    fn test_format_falls_back_to_client_then_anonymous() {
        assert_eq!(
            format_submission(Some("  "), Some("10.0.0.1"), "hi"),
            "10.0.0.1: hi"
        );
        assert_eq!(format_submission(None, None, "hi"), "anonymous: hi");
    }

    #[tokio::test]
    async fn test_valid_submission_sends_exactly_once() {
        let sender = Arc::new(RecordingSender::default());
        let response = app(sender.clone())
            .oneshot(form_request("name=Alice&text=hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");

        let sent = sender.attempts();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id(), "42");
        assert_eq!(sent[0].text(), "Alice: hello");
    }

    #[tokio::test]
    async fn test_missing_text_is_400_without_send() {
        let sender = Arc::new(RecordingSender::default());
        let response = app(sender.clone())
            .oneshot(form_request("name=Alice"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("text"));
        assert!(sender.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_blank_text_is_400_without_send() {
        let sender = Arc::new(RecordingSender::default());
        let response = app(sender.clone())
            .oneshot(form_request("name=Alice&text=+++"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(sender.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_text_is_400_without_send() {
        let sender = Arc::new(RecordingSender::default());
        let body = format!("text={}", "a".repeat(MAX_TEXT_LEN + 1));
        let response = app(sender.clone())
            .oneshot(form_request(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(sender.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_label_counts_towards_length_limit() {
        let sender = Arc::new(RecordingSender::default());
        let body = format!("name=Alice&text={}", "a".repeat(MAX_TEXT_LEN));
        let response = app(sender.clone())
            .oneshot(form_request(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("too long"));
        assert!(sender.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_body_at_limit_is_sent() {
        let sender = Arc::new(RecordingSender::default());
        // "Al: " is four characters
        let body = format!("name=Al&text={}", "a".repeat(MAX_TEXT_LEN - 4));
        let response = app(sender.clone())
            .oneshot(form_request(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let sent = sender.attempts();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text().chars().count(), MAX_TEXT_LEN);
    }

    #[tokio::test]
    async fn test_post_without_content_type_is_400_without_send() {
        let sender = Arc::new(RecordingSender::default());
        let request = Request::builder()
            .method("POST")
            .uri("/submit")
            .body(Body::empty())
            .unwrap();
        let response = app(sender.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(sender.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_text_field_is_400_without_send() {
        let sender = Arc::new(RecordingSender::default());
        let response = app(sender.clone())
            .oneshot(form_request("text=a&text=b"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(sender.attempts().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_is_502() {
        let sender = Arc::new(RecordingSender::failing());
        let response = app(sender.clone())
            .oneshot(form_request("text=hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(sender.attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_forwarded_for_labels_anonymous_submission() {
        let sender = Arc::new(RecordingSender::default());
        let request = Request::builder()
            .method("POST")
            .uri("/submit")
            .header("content-type", "application/x-www-form-urlencoded")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.2")
            .body(Body::from("text=hi"))
            .unwrap();
        let response = app(sender.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sender.attempts()[0].text(), "203.0.113.9: hi");
    }

    #[tokio::test]
    async fn test_index_serves_form() {
        let sender = Arc::new(RecordingSender::default());
        let response = app(sender)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains(r#"action="/submit""#));
    }
}
