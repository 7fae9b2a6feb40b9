use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    dao::models::SessionKind,
    dto::{
        play::PollResponse,
        session::{
            CreateSessionRequest, JoinSessionRequest, JoinedSession, SessionCreated,
            SessionListItem,
        },
        validation::validate_join_code,
    },
    error::AppError,
    services::{poll_service, session_service},
    state::SharedState,
};

/// Routes handling session lifecycle and the polling read path.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{code}/join", post(join_session))
        .route("/sessions/{code}/poll", get(poll_session))
}

/// Query parameters for the joinable-session listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Restrict the listing to one session kind.
    #[serde(default)]
    pub kind: Option<SessionKind>,
}

/// Query parameters identifying the polling participant.
#[derive(Debug, Deserialize)]
pub struct PollQuery {
    /// The polling participant's identity.
    pub participant: Uuid,
}

/// Create a fresh session and hand back its join code.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "session",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = SessionCreated)
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateSessionRequest>>,
) -> Result<Json<SessionCreated>, AppError> {
    let created = session_service::create_session(&state, payload).await?;
    Ok(Json(created))
}

/// List sessions that still accept players.
#[utoipa::path(
    get,
    path = "/sessions",
    tag = "session",
    params(("kind" = Option<SessionKind>, Query, description = "Restrict to one session kind")),
    responses(
        (status = 200, description = "Joinable sessions", body = [SessionListItem])
    )
)]
pub async fn list_sessions(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SessionListItem>>, AppError> {
    let sessions = session_service::list_joinable(&state, query.kind).await?;
    Ok(Json(sessions))
}

/// Join an existing session by code.
#[utoipa::path(
    post,
    path = "/sessions/{code}/join",
    tag = "session",
    params(("code" = String, Path, description = "Join code of the session")),
    request_body = JoinSessionRequest,
    responses(
        (status = 200, description = "Joined the session", body = JoinedSession),
        (status = 404, description = "No session with that code"),
        (status = 409, description = "Session already full")
    )
)]
pub async fn join_session(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Valid(Json(payload)): Valid<Json<JoinSessionRequest>>,
) -> Result<Json<JoinedSession>, AppError> {
    validate_join_code(&code)
        .map_err(|err| AppError::BadRequest(format!("invalid join code: {err}")))?;
    let joined = session_service::join_session(&state, &code, payload).await?;
    Ok(Json(joined))
}

/// One poll tick: fetch the latest session state, apply any due time-gated
/// transition this poller is allowed to trigger, and return the view.
#[utoipa::path(
    get,
    path = "/sessions/{code}/poll",
    tag = "session",
    params(
        ("code" = String, Path, description = "Join code of the session"),
        ("participant" = Uuid, Query, description = "Polling participant identity")
    ),
    responses(
        (status = 200, description = "Latest session state", body = PollResponse),
        (status = 404, description = "No session with that code")
    )
)]
pub async fn poll_session(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(query): Query<PollQuery>,
) -> Result<Json<PollResponse>, AppError> {
    let tick = poll_service::poll(&state, &code, query.participant).await?;
    Ok(Json(tick))
}
