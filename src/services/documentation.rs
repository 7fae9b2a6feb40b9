use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the quiz session backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::create_session,
        crate::routes::session::list_sessions,
        crate::routes::session::join_session,
        crate::routes::session::poll_session,
        crate::routes::play::start_session,
        crate::routes::play::submit_answer,
        crate::routes::play::record_progress,
        crate::routes::play::report_completion,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::common::ParticipantView,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::QuestionInput,
            crate::dto::session::JoinSessionRequest,
            crate::dto::session::SessionCreated,
            crate::dto::session::JoinedSession,
            crate::dto::session::SessionListItem,
            crate::dto::session::SessionView,
            crate::dto::session::QuestionView,
            crate::dto::session::RoundOutcomeView,
            crate::dto::session::RoundAnswerView,
            crate::dto::session::RankingView,
            crate::dto::play::StartRequest,
            crate::dto::play::AnswerRequest,
            crate::dto::play::ProgressRequest,
            crate::dto::play::CompletionRequest,
            crate::dto::play::PlayOutcome,
            crate::dto::play::PollResponse,
            crate::dao::models::SessionKind,
            crate::dao::models::SessionStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Session lifecycle and polling"),
        (name = "play", description = "Participant play operations"),
    )
)]
pub struct ApiDoc;
