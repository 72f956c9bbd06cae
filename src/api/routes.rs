//! REST endpoints for the email assistant.
//!
//! Every endpoint assembles agents and a task list, hands them to the crew
//! run primitive (plus the workflow orchestrator for sends), and returns
//! the result. Failures surface as 500 with the raw error message; there is
//! no partial-success shape.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::agents::{Crew, CrewProfiles, MailToolset, Task};
use crate::crypto::SecureDataHandler;
use crate::error::Error;
use crate::mail::TokenStore;
use crate::telemetry::Telemetry;
use crate::workflow::{InboundEmail, MessageIndex, Orchestrator};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub crew: Arc<Crew>,
    pub profiles: Arc<CrewProfiles>,
    pub toolset: Arc<MailToolset>,
    pub index: Arc<MessageIndex>,
    pub tokens: Arc<TokenStore>,
    pub secure: Arc<SecureDataHandler>,
    pub telemetry: Arc<Telemetry>,
    /// Base URL the OAuth callback is reachable at.
    pub redirect_base: String,
}

impl AppState {
    fn callback_uri(&self) -> String {
        format!("{}/auth/callback", self.redirect_base)
    }
}

/// Build the API router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/read-emails", post(read_emails))
        .route("/send-email", post(send_email))
        .route("/analyze-conversation", post(analyze_conversation))
        .route("/auth/login", get(auth_login))
        .route("/auth/callback", get(auth_callback))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Request shapes ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default)]
    pub query: Option<String>,
}

fn default_max_results() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ── Error mapping ───────────────────────────────────────────────────

/// Any service error becomes a 500 with the raw message.
pub struct ApiError(pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "detail": self.0.to_string() })),
        )
            .into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<Error>,
{
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

// ── Handlers ────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mail-assist"
    }))
}

/// POST /read-emails — read and analyze emails.
async fn read_emails(
    State(state): State<AppState>,
    Json(query): Json<EmailQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let messages = state
        .toolset
        .read_emails(query.max_results, query.query.as_deref())
        .await?;
    state.index.index_summaries(&messages).await;

    state.telemetry.log_interaction(
        "read_emails",
        &serde_json::json!({ "count": messages.len(), "query": query.query }),
    );

    let listing = serde_json::to_string_pretty(&messages).unwrap_or_default();
    let result = state
        .crew
        .kickoff(&[
            Task::new(
                format!(
                    "Read {} emails matching query {:?}:\n{listing}",
                    query.max_results, query.query
                ),
                &state.profiles.reader,
            ),
            Task::new(
                "Analyze the emails and provide insights",
                &state.profiles.analyzer,
            ),
        ])
        .await?;

    Ok(Json(serde_json::json!({ "result": result })))
}

/// POST /send-email — run the workflow, then compose and send.
async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Log the interaction without exposing the body: only sealed bytes.
    if let Ok(sealed) = state.secure.encrypt(&request.body) {
        state.telemetry.log_interaction(
            "send_email",
            &serde_json::json!({ "to": request.to, "sealed_bytes": sealed.len() }),
        );
    }

    let email = InboundEmail {
        to: request.to.clone(),
        subject: request.subject.clone(),
        content: request.body.clone(),
    };
    let workflow = state.orchestrator.process_incoming_email(&email).await?;

    let composed = state
        .crew
        .kickoff(&[Task::new(
            format!(
                "Compose the final version of an email to {} with subject: {}.\n\
                 Start from this draft and keep its intent:\n{}",
                request.to, request.subject, workflow.response.body
            ),
            &state.profiles.composer,
        )])
        .await?;

    let receipt = state
        .toolset
        .send_email(&request.to, &request.subject, &composed)
        .await?;

    Ok(Json(serde_json::json!({
        "result": { "message_id": receipt.message_id, "body": composed },
        "workflow": workflow,
    })))
}

/// POST /analyze-conversation — analysis-only path.
async fn analyze_conversation(
    State(state): State<AppState>,
    Json(query): Json<EmailQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let messages = state
        .toolset
        .read_emails(query.max_results, query.query.as_deref())
        .await?;
    state.index.index_summaries(&messages).await;

    state.telemetry.log_interaction(
        "analyze_conversation",
        &serde_json::json!({ "count": messages.len(), "query": query.query }),
    );

    let listing = serde_json::to_string_pretty(&messages).unwrap_or_default();
    let result = state
        .crew
        .kickoff(&[
            Task::new(
                format!(
                    "Read this email conversation thread (query {:?}):\n{listing}",
                    query.query
                ),
                &state.profiles.reader,
            ),
            Task::new(
                "Analyze the conversation and provide comprehensive insights",
                &state.profiles.analyzer,
            ),
        ])
        .await?;

    Ok(Json(serde_json::json!({ "result": result })))
}

/// GET /auth/login — redirect to the provider's consent URL.
async fn auth_login(State(state): State<AppState>) -> Redirect {
    let url = state.tokens.authorize_url(&state.callback_uri());
    Redirect::temporary(&url)
}

/// GET /auth/callback — exchange the authorization code, persist the token.
async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = params.error {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "detail": format!("authorization denied: {error}") })),
        )
            .into_response();
    }
    let Some(code) = params.code else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "detail": "missing authorization code" })),
        )
            .into_response();
    };

    match state.tokens.exchange_code(&code, &state.callback_uri()).await {
        Ok(()) => {
            info!("OAuth callback completed");
            Json(serde_json::json!({ "message": "Successfully authenticated with Google!" }))
                .into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "detail": e.to_string() })),
        )
            .into_response(),
    }
}
