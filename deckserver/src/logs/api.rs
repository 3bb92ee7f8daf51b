//! Routes HTTP de consultation et de réglage des logs

use super::{LogState, parse_level};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::{Level, info};
use utoipa::{OpenApi, ToSchema};

const LEVELS: [Level; 5] = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE];

/// Filtres optionnels de `/log-dump`
#[derive(Debug, Default, Deserialize)]
pub struct DumpQuery {
    /// Niveau minimum (`warn` garde WARN et ERROR)
    pub level: Option<String>,
    /// Nombre maximum d'entrées, les plus récentes
    pub limit: Option<usize>,
}

/// GET /log-dump - Contenu du buffer en JSON
pub async fn log_dump(State(state): State<LogState>, Query(query): Query<DumpQuery>) -> Response {
    let min_level = match query.level.as_deref().map(parse_level) {
        Some(None) => return invalid_level(),
        Some(level) => level,
        None => None,
    };
    Json(state.tail(min_level, query.limit)).into_response()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LogSetupRequest {
    pub level: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogSetupResponse {
    pub current_level: String,
    pub available_levels: Vec<String>,
}

impl From<Level> for LogSetupResponse {
    fn from(level: Level) -> Self {
        Self {
            current_level: level.as_str().to_string(),
            available_levels: LEVELS.iter().map(|l| l.as_str().to_string()).collect(),
        }
    }
}

fn invalid_level() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "error": "Invalid log level. Must be one of: ERROR, WARN, INFO, DEBUG, TRACE"
        })),
    )
        .into_response()
}

/// GET /api/log_setup - Niveau courant
#[utoipa::path(
    get,
    path = "/api/log_setup",
    responses(
        (status = 200, description = "Niveau courant", body = LogSetupResponse)
    ),
    tag = "logs"
)]
pub async fn log_setup_get(State(state): State<LogState>) -> Json<LogSetupResponse> {
    Json(state.get_max_level().into())
}

/// POST /api/log_setup - Change le niveau à chaud
#[utoipa::path(
    post,
    path = "/api/log_setup",
    request_body = LogSetupRequest,
    responses(
        (status = 200, description = "Niveau modifié", body = LogSetupResponse),
        (status = 400, description = "Niveau inconnu")
    ),
    tag = "logs"
)]
pub async fn log_setup_post(
    State(state): State<LogState>,
    Json(payload): Json<LogSetupRequest>,
) -> Response {
    let Some(level) = parse_level(&payload.level) else {
        return invalid_level();
    };

    state.set_max_level(level);
    info!("🔧 Log level set to {}", level);
    Json(LogSetupResponse::from(level)).into_response()
}

/// Router monté sous `/api`
pub fn create_logs_router(state: LogState) -> Router {
    Router::new()
        .route("/log_setup", get(log_setup_get).post(log_setup_post))
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(log_setup_get, log_setup_post),
    components(schemas(LogSetupRequest, LogSetupResponse)),
    tags((name = "logs", description = "Niveau de journalisation"))
)]
pub struct LogsApiDoc;
