use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};

use crate::{
    dto::play::{AnswerRequest, CompletionRequest, PlayOutcome, ProgressRequest, StartRequest},
    error::AppError,
    services::play_service,
    state::SharedState,
};

/// Routes for participant play operations. All of them return 200 with
/// `applied: false` when a guard abandons the write; only join-time and
/// input errors surface as HTTP failures.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions/{code}/start", post(start_session))
        .route("/sessions/{code}/answers", post(submit_answer))
        .route("/sessions/{code}/progress", post(record_progress))
        .route("/sessions/{code}/completion", post(report_completion))
}

/// Start a tournament (host only) or open a room race (any participant).
#[utoipa::path(
    post,
    path = "/sessions/{code}/start",
    tag = "play",
    params(("code" = String, Path, description = "Join code of the session")),
    request_body = StartRequest,
    responses(
        (status = 200, description = "Start attempt outcome", body = PlayOutcome)
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<StartRequest>,
) -> Result<Json<PlayOutcome>, AppError> {
    let outcome = play_service::start_session(&state, &code, payload).await?;
    Ok(Json(outcome))
}

/// Submit a tournament round answer. First answer per round wins.
#[utoipa::path(
    post,
    path = "/sessions/{code}/answers",
    tag = "play",
    params(("code" = String, Path, description = "Join code of the session")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer attempt outcome", body = PlayOutcome)
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<PlayOutcome>, AppError> {
    let outcome = play_service::submit_answer(&state, &code, payload).await?;
    Ok(Json(outcome))
}

/// Record a duel per-question progress write.
#[utoipa::path(
    post,
    path = "/sessions/{code}/progress",
    tag = "play",
    params(("code" = String, Path, description = "Join code of the session")),
    request_body = ProgressRequest,
    responses(
        (status = 200, description = "Progress write outcome", body = PlayOutcome)
    )
)]
pub async fn record_progress(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<ProgressRequest>,
) -> Result<Json<PlayOutcome>, AppError> {
    let outcome = play_service::record_progress(&state, &code, payload).await?;
    Ok(Json(outcome))
}

/// Record a room player's single completion write.
#[utoipa::path(
    post,
    path = "/sessions/{code}/completion",
    tag = "play",
    params(("code" = String, Path, description = "Join code of the session")),
    request_body = CompletionRequest,
    responses(
        (status = 200, description = "Completion write outcome", body = PlayOutcome)
    )
)]
pub async fn report_completion(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Json(payload): Json<CompletionRequest>,
) -> Result<Json<PlayOutcome>, AppError> {
    let outcome = play_service::report_completion(&state, &code, payload).await?;
    Ok(Json(outcome))
}
