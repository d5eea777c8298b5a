//! Thread routes for the dialogue runtime.
//!
//! - `POST /v1/threads/{thread_id}/messages` - run one dialogue turn
//! - `GET  /v1/threads/{thread_id}`          - read the stored conversation
//! - `POST /v1/threads/{thread_id}/invoices` - attach an uploaded invoice
//!
//! Every response carries a correlation id, taken from the
//! `x-correlation-id` request header when present.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use freightdesk_agent::{AgentRuntime, RuntimeError, TurnReply};
use freightdesk_core::domain::conversation::{ConversationState, ThreadId, UserId};
use freightdesk_core::domain::shipment::ShipmentData;
use freightdesk_core::errors::{ApplicationError, InterfaceError};
use freightdesk_core::flows::DialogueStep;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct ThreadsState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub thread_id: String,
    pub current_step: DialogueStep,
    pub reply: Option<String>,
    pub generate_quote: bool,
    pub shipment: ShipmentData,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub current_step: DialogueStep,
    #[serde(flatten)]
    pub conversation: ConversationState,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceRequest {
    pub invoice_id: String,
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub thread_id: String,
    pub invoice_ids: Vec<String>,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: Option<String>,
    pub correlation_id: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/v1/threads/{thread_id}", get(get_thread))
        .route("/v1/threads/{thread_id}/messages", post(post_message))
        .route("/v1/threads/{thread_id}/invoices", post(post_invoice))
        .with_state(ThreadsState { runtime })
}

pub async fn post_message(
    Path(thread_id): Path<String>,
    State(state): State<ThreadsState>,
    headers: HeaderMap,
    Json(body): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let user_id = body.user_id.trim();
    if user_id.is_empty() || thread_id.trim().is_empty() {
        return Err(bad_request("user_id and thread_id are required", &correlation_id));
    }

    let result = state
        .runtime
        .handle_thread_message(
            &UserId(user_id.to_string()),
            &ThreadId(thread_id.clone()),
            &body.text,
            &correlation_id,
        )
        .await
        .map_err(|error| runtime_error(error, &correlation_id))?;

    let (reply, generate_quote) = match result.reply {
        TurnReply::Message(text) => (Some(text), false),
        TurnReply::GenerateQuote => (None, true),
        TurnReply::Silent => (None, false),
    };

    Ok(Json(MessageResponse {
        thread_id,
        current_step: result.state.current_step(),
        reply,
        generate_quote,
        shipment: result.state.shipment,
        correlation_id,
    }))
}

pub async fn get_thread(
    Path(thread_id): Path<String>,
    State(state): State<ThreadsState>,
    headers: HeaderMap,
) -> Result<Json<ThreadResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let conversation = state
        .runtime
        .conversation(&ThreadId(thread_id))
        .await
        .map_err(|error| runtime_error(error, &correlation_id))?;

    Ok(Json(ThreadResponse { current_step: conversation.current_step(), conversation }))
}

pub async fn post_invoice(
    Path(thread_id): Path<String>,
    State(state): State<ThreadsState>,
    headers: HeaderMap,
    Json(body): Json<InvoiceRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let invoice_id = body.invoice_id.trim();
    let file_name = body.file_name.trim();
    if invoice_id.is_empty() || file_name.is_empty() {
        return Err(bad_request("invoice_id and file_name are required", &correlation_id));
    }

    let conversation = state
        .runtime
        .record_invoice_upload(&ThreadId(thread_id.clone()), invoice_id, file_name, &correlation_id)
        .await
        .map_err(|error| runtime_error(error, &correlation_id))?;

    Ok(Json(InvoiceResponse { thread_id, invoice_ids: conversation.invoice_ids, correlation_id }))
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn bad_request(detail: &str, correlation_id: &str) -> ApiError {
    interface_error(
        InterfaceError::BadRequest {
            message: detail.to_string(),
            correlation_id: correlation_id.to_string(),
        },
        Some(detail.to_string()),
    )
}

fn runtime_error(error: RuntimeError, correlation_id: &str) -> ApiError {
    let detail = match &error {
        RuntimeError::NotFound(_) | RuntimeError::ThreadOwnedByAnotherUser { .. } => {
            Some(error.to_string())
        }
        RuntimeError::Store(_) | RuntimeError::Domain(_) => None,
    };
    interface_error(ApplicationError::from(error).into_interface(correlation_id), detail)
}

fn interface_error(error: InterfaceError, detail: Option<String>) -> ApiError {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(
            event_name = "http.threads.failed",
            correlation_id = error.correlation_id(),
            error = %error,
            "thread request failed"
        );
    } else {
        warn!(
            event_name = "http.threads.rejected",
            correlation_id = error.correlation_id(),
            error = %error,
            "thread request rejected"
        );
    }

    (
        status,
        Json(ErrorResponse {
            error: error.user_message().to_string(),
            detail,
            correlation_id: error.correlation_id().to_string(),
        }),
    )
}
