//! # API REST
//!
//! Webhook HTTP surface for symbot.
//!
//! Handles:
//! - The Messenger webhook handshake and event deliveries
//! - The account-linking authorisation page
//! - Health and OpenAPI endpoints
//!
//! Uses `api-shared` for signature checks and `symbot-core` for the conversation itself.

#![warn(rust_2018_idioms)]

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

use api_shared::auth::{check_signature, SIGNATURE_256_HEADER, SIGNATURE_HEADER};
use api_shared::{HealthRes, HealthService};
use messenger::Webhook;
use symbot_core::{BotConfig, BotService};

/// Application state for the REST API server
///
/// Holds the resolved configuration and the bot service that handles deliveries.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<BotConfig>,
    bot: BotService,
}

impl AppState {
    pub fn new(cfg: Arc<BotConfig>, bot: BotService) -> Self {
        Self { cfg, bot }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, verify_webhook, receive_webhook, authorize),
    components(schemas(HealthRes))
)]
pub struct ApiDoc;

/// Default listen address when neither `SYMBOT_REST_ADDR` nor `PORT` is set.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:5000";

/// Resolve the listen address from the `SYMBOT_REST_ADDR` and `PORT` values.
///
/// An explicit address wins; a bare port binds all interfaces.
pub fn listen_addr_from_env_values(rest_addr: Option<String>, port: Option<String>) -> String {
    rest_addr
        .filter(|a| !a.trim().is_empty())
        .or_else(|| {
            port.filter(|p| !p.trim().is_empty())
                .map(|p| format!("0.0.0.0:{}", p.trim()))
        })
        .unwrap_or_else(|| DEFAULT_REST_ADDR.into())
}

/// Build the webhook router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/authorize", get(authorize))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[derive(Debug, Deserialize)]
struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

#[utoipa::path(
    get,
    path = "/webhook",
    params(
        ("hub.mode" = String, Query, description = "Must be `subscribe`"),
        ("hub.verify_token" = String, Query, description = "Configured validation token"),
        ("hub.challenge" = String, Query, description = "Value echoed back on success")
    ),
    responses(
        (status = 200, description = "Challenge echoed", body = String),
        (status = 403, description = "Validation failed")
    )
)]
/// Webhook subscription handshake
///
/// # Returns
/// * `Ok(String)` - The `hub.challenge` value when the mode and token match
///
/// # Errors
/// Returns `403 Forbidden` if the mode is not `subscribe` or the token does not match.
#[axum::debug_handler]
async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<String, StatusCode> {
    let token_matches = params.verify_token.as_deref() == Some(state.cfg.validation_token());
    if params.mode.as_deref() == Some("subscribe") && token_matches {
        tracing::info!("webhook validated");
        Ok(params.challenge.unwrap_or_default())
    } else {
        tracing::warn!("failed webhook validation, make sure the validation tokens match");
        Err(StatusCode::FORBIDDEN)
    }
}

#[utoipa::path(
    post,
    path = "/webhook",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Delivery accepted"),
        (status = 400, description = "Body is not a webhook delivery"),
        (status = 403, description = "Signature missing or invalid"),
        (status = 404, description = "Delivery is not for a page subscription")
    )
)]
/// Receive a webhook delivery
///
/// The signature is checked against the raw body before anything is parsed. Accepted
/// deliveries are handled on a spawned task so the platform gets its 200 immediately.
///
/// # Errors
/// Returns `403 Forbidden` for signature failures, `400 Bad Request` for an unreadable
/// envelope and `404 Not Found` when `object` is not `page`.
#[axum::debug_handler]
async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(SIGNATURE_256_HEADER)
        .or_else(|| headers.get(SIGNATURE_HEADER))
        .and_then(|v| v.to_str().ok());

    if let Err(e) = check_signature(&body, signature, state.cfg.app_secret()) {
        tracing::warn!("rejected webhook delivery: {}", e);
        return StatusCode::FORBIDDEN;
    }

    let delivery = match Webhook::parse(&body) {
        Ok(delivery) => delivery,
        Err(e) => {
            tracing::warn!("unreadable webhook delivery: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    if delivery.object != "page" {
        tracing::debug!("ignoring delivery for object {:?}", delivery.object);
        return StatusCode::NOT_FOUND;
    }

    for reason in &delivery.rejected {
        tracing::warn!("skipped messaging event: {}", reason);
    }

    let bot = state.bot.clone();
    tokio::spawn(async move {
        bot.handle_delivery(delivery.events).await;
    });

    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct AuthorizeParams {
    account_linking_token: Option<String>,
    redirect_uri: Option<String>,
}

#[utoipa::path(
    get,
    path = "/authorize",
    params(
        ("account_linking_token" = String, Query, description = "Token issued by the platform"),
        ("redirect_uri" = String, Query, description = "Where to send the user afterwards")
    ),
    responses(
        (status = 200, description = "Account linking page", body = String, content_type = "text/html"),
        (status = 400, description = "redirect_uri missing")
    )
)]
/// Account-linking authorisation page
///
/// Issues a fresh authorisation code and links back to `redirect_uri` with it appended.
///
/// # Errors
/// Returns `400 Bad Request` if `redirect_uri` is absent.
#[axum::debug_handler]
async fn authorize(Query(params): Query<AuthorizeParams>) -> Result<Html<String>, StatusCode> {
    let redirect_uri = params.redirect_uri.ok_or(StatusCode::BAD_REQUEST)?;
    let auth_code = uuid::Uuid::new_v4();
    let success_uri = format!("{redirect_uri}&authorization_code={auth_code}");

    tracing::debug!(
        "account linking page for token {:?}",
        params.account_linking_token
    );

    Ok(Html(authorize_page(&redirect_uri, &success_uri)))
}

fn authorize_page(cancel_uri: &str, success_uri: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Authorize</title></head>\n<body>\n\
         <h1>Link your account</h1>\n\
         <p><a href=\"{}\">Complete Account Linking</a></p>\n\
         <p><a href=\"{}\">Cancel</a></p>\n\
         </body>\n</html>\n",
        escape_attr(success_uri),
        escape_attr(cancel_uri)
    )
}

/// Escapes a value for use inside a double-quoted HTML attribute.
fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_shared::{sign, SignatureMethod};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use messenger::OutboundMessage;
    use std::sync::Mutex;
    use std::time::Duration;
    use symbot_core::{
        DiagnosisLookupClient, Dispatcher, HttpError, HttpFetch, LookupConfig, MessageSender,
        SendError, SendReceipt,
    };
    use tower::ServiceExt;

    const SECRET: &str = "app-secret";

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn send(&self, message: &OutboundMessage) -> Result<SendReceipt, SendError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(SendReceipt {
                recipient_id: message.recipient_id.clone(),
                message_id: None,
            })
        }
    }

    struct OfflineChecker;

    #[async_trait]
    impl HttpFetch for OfflineChecker {
        async fn get(&self, _url: &str) -> Result<String, HttpError> {
            Err(HttpError::Transport("offline".into()))
        }
    }

    fn app(sender: Arc<RecordingSender>) -> Router {
        let lookup = LookupConfig::new("http://checker.test/diagnosis", "user", "pass");
        let cfg = BotConfig::new(
            SECRET.into(),
            "verify-me".into(),
            "page-token".into(),
            "https://bot.example.com".into(),
            "https://graph.example.com/v2.6".into(),
            lookup.clone(),
        )
        .unwrap();
        let bot = BotService::new(
            Dispatcher::new(
                cfg.server_url(),
                DiagnosisLookupClient::new(lookup, Arc::new(OfflineChecker)),
            ),
            sender,
        );
        router(AppState::new(Arc::new(cfg), bot))
    }

    fn delivery(object: &str, text: &str) -> String {
        serde_json::json!({
            "object": object,
            "entry": [{
                "id": "PAGE",
                "time": 1,
                "messaging": [{
                    "sender": { "id": "USER_1" },
                    "recipient": { "id": "PAGE" },
                    "timestamp": 1,
                    "message": { "mid": "m1", "text": text }
                }]
            }]
        })
        .to_string()
    }

    fn post(body: String, header: Option<(&str, String)>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn handshake_echoes_challenge_only_for_matching_token() {
        let ok = app(Arc::default())
            .oneshot(
                Request::get("/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(body_text(ok).await, "42");

        let bad = app(Arc::default())
            .oneshot(
                Request::get("/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn signed_delivery_is_answered() {
        let sender = Arc::new(RecordingSender::default());
        let body = delivery("page", "hello");
        let signature = sign(SignatureMethod::Sha256, body.as_bytes(), SECRET).unwrap();

        let response = app(sender.clone())
            .oneshot(post(body, Some((SIGNATURE_256_HEADER, signature))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut texts = Vec::new();
        for _ in 0..50 {
            texts = sender
                .sent
                .lock()
                .unwrap()
                .iter()
                .filter_map(|m| m.text().map(str::to_owned))
                .collect();
            if !texts.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(texts, vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn legacy_sha1_signature_is_accepted() {
        let body = delivery("page", "hi");
        let signature = sign(SignatureMethod::Sha1, body.as_bytes(), SECRET).unwrap();

        let response = app(Arc::default())
            .oneshot(post(body, Some((SIGNATURE_HEADER, signature))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unsigned_or_forged_delivery_is_forbidden() {
        let sender = Arc::new(RecordingSender::default());

        let response = app(sender.clone())
            .oneshot(post(delivery("page", "hello"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let forged = sign(SignatureMethod::Sha256, b"other body", SECRET).unwrap();
        let response = app(sender.clone())
            .oneshot(post(
                delivery("page", "hello"),
                Some((SIGNATURE_256_HEADER, forged)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_page_object_is_not_found() {
        let body = delivery("user", "hello");
        let signature = sign(SignatureMethod::Sha256, body.as_bytes(), SECRET).unwrap();

        let response = app(Arc::default())
            .oneshot(post(body, Some((SIGNATURE_256_HEADER, signature))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn authorize_page_links_back_with_code() {
        let response = app(Arc::default())
            .oneshot(
                Request::get("/authorize?account_linking_token=abc&redirect_uri=https://example.com/cb?x=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("https://example.com/cb?x=1&amp;authorization_code="));
        assert!(html.contains("Complete Account Linking"));

        let missing = app(Arc::default())
            .oneshot(Request::get("/authorize").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn authorize_page_escapes_redirect_uri() {
        let response = app(Arc::default())
            .oneshot(
                Request::get("/authorize?redirect_uri=https://example.com/cb?q=%22%3Cx%3E")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("https://example.com/cb?q=&quot;&lt;x&gt;&amp;authorization_code="));
        assert!(!html.contains("\"<x>"));
    }

    #[test]
    fn listen_addr_prefers_explicit_address_then_port() {
        assert_eq!(
            listen_addr_from_env_values(Some("127.0.0.1:8080".into()), Some("9000".into())),
            "127.0.0.1:8080"
        );
        assert_eq!(
            listen_addr_from_env_values(None, Some("9000".into())),
            "0.0.0.0:9000"
        );
        assert_eq!(listen_addr_from_env_values(None, None), DEFAULT_REST_ADDR);
    }

    #[tokio::test]
    async fn health_and_openapi_are_served() {
        let response = app(Arc::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let health: HealthRes = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(health.ok);

        let response = app(Arc::default())
            .oneshot(
                Request::get("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(doc["paths"]["/webhook"].is_object());
    }
}
