//! HTTP API
//!
//! Thin JSON mapping over [`TicketRepository`]. Store calls may block on a
//! flush, so every handler runs them on the blocking pool. Errors map to
//! status codes through [`ErrorKind::http_status`], except that a transition
//! out of a terminal status answers 409.

use crate::core::{NewTicket, Status, Ticket, TicketId};
use crate::error::{ErrorKind, LostFoundError};
use crate::notify::LocatorBuilder;
use crate::storage::TicketRepository;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state for all handlers
#[derive(Clone)]
pub struct ApiState {
    pub repository: Arc<dyn TicketRepository>,
    pub locator: LocatorBuilder,
}

/// Error wrapper that renders as a JSON error response
#[derive(Debug)]
pub struct ApiError(pub LostFoundError);

impl From<LostFoundError> for ApiError {
    fn from(err: LostFoundError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        if matches!(self.0, LostFoundError::ForbiddenTransition { .. }) {
            return StatusCode::CONFLICT;
        }
        StatusCode::from_u16(self.0.kind().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.kind();
        if matches!(kind, ErrorKind::Persistence | ErrorKind::CorruptState) {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }
        let body = Json(serde_json::json!({
            "error": kind.as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedResponse {
    ticket: Ticket,
    tracking_url: String,
    tracking_code: String,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: String,
}

#[derive(Debug, Deserialize)]
struct CommentRequest {
    text: String,
    /// Zero-based item index; absent for a ticket-level comment
    #[serde(default)]
    item: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ReopenRequest {
    #[serde(default)]
    status: Option<String>,
}

/// Public tracking view: no contact details
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackingView {
    reference: String,
    status: Status,
    items: Vec<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

/// Build the router
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/track/:id", get(track))
        .route("/api/tickets", post(create_ticket).get(list_tickets))
        .route("/api/tickets/:id", get(get_ticket).delete(delete_ticket))
        .route("/api/tickets/:id/status", post(update_status))
        .route("/api/tickets/:id/comments", post(add_comment))
        .route("/api/tickets/:id/reopen", post(reopen_ticket))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is interrupted
pub async fn serve(addr: SocketAddr, state: ApiState) -> crate::error::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "could not listen for shutdown signal");
            }
            tracing::info!("shutting down HTTP API");
        })
        .await?;
    Ok(())
}

/// Run a repository call on the blocking pool
async fn with_repository<T, F>(state: &ApiState, call: F) -> ApiResult<T>
where
    F: FnOnce(&dyn TicketRepository) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let repository = Arc::clone(&state.repository);
    tokio::task::spawn_blocking(move || call(repository.as_ref()))
        .await
        .map_err(|e| ApiError(LostFoundError::custom(format!("request worker failed: {e}"))))?
        .map_err(ApiError)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_ticket(
    State(state): State<ApiState>,
    Json(request): Json<NewTicket>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let ticket = with_repository(&state, move |repo| repo.create(request)).await?;
    let locator = state.locator.locate(&ticket);
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            ticket,
            tracking_url: locator.url,
            tracking_code: locator.code,
        }),
    ))
}

async fn list_tickets(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Ticket>>> {
    let status = query.status.as_deref().map(str::parse::<Status>).transpose()?;
    let tickets = with_repository(&state, |repo| Ok(repo.list())).await?;
    Ok(Json(
        tickets
            .into_iter()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .collect(),
    ))
}

async fn get_ticket(
    State(state): State<ApiState>,
    Path(reference): Path<String>,
) -> ApiResult<Json<Ticket>> {
    let ticket = with_repository(&state, move |repo| repo.resolve(&reference)).await?;
    Ok(Json(ticket))
}

/// Only the UUID from the notification link resolves here; display numbers
/// are guessable.
async fn track(
    State(state): State<ApiState>,
    Path(reference): Path<String>,
) -> ApiResult<Json<TrackingView>> {
    let id = TicketId::parse_str(&reference)
        .map_err(|_| LostFoundError::not_found(&reference))?;
    let ticket = with_repository(&state, move |repo| repo.get(&id)).await?;
    Ok(Json(TrackingView {
        reference: ticket.display_ref(),
        status: ticket.status,
        items: ticket.items.into_iter().map(|item| item.name).collect(),
        created_at: ticket.created_at,
    }))
}

async fn update_status(
    State(state): State<ApiState>,
    Path(reference): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<Ticket>> {
    let ticket = with_repository(&state, move |repo| {
        let ticket = repo.resolve(&reference)?;
        repo.update_status(&ticket.id, &request.status)
    })
    .await?;
    Ok(Json(ticket))
}

async fn add_comment(
    State(state): State<ApiState>,
    Path(reference): Path<String>,
    Json(request): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let ticket = with_repository(&state, move |repo| {
        let ticket = repo.resolve(&reference)?;
        repo.add_comment(&ticket.id, &request.text, request.item)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn reopen_ticket(
    State(state): State<ApiState>,
    Path(reference): Path<String>,
    request: Option<Json<ReopenRequest>>,
) -> ApiResult<Json<Ticket>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let status = match request.status.as_deref() {
        Some(label) => label.parse::<Status>()?,
        None => Status::Searching,
    };
    let ticket = with_repository(&state, move |repo| {
        let ticket = repo.resolve(&reference)?;
        repo.reopen(&ticket.id, status)
    })
    .await?;
    Ok(Json(ticket))
}

async fn delete_ticket(
    State(state): State<ApiState>,
    Path(reference): Path<String>,
) -> ApiResult<StatusCode> {
    with_repository(&state, move |repo| {
        let ticket = repo.resolve(&reference)?;
        repo.delete(&ticket.id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
