//! Extension deckserver pour le Stream Deck
//!
//! Ce module expose les images rendues et les commandes des cadrans sur
//! l'API HTTP locale interrogée par le plugin.

use crate::actions::ActionCoalescer;
use crate::config_ext::ControlSettings;
use crate::errors::DeckError;
use crate::openapi::{
    ActionRequest, ActionResponse, DeckStates, DeviceSummary, ErrorResponse, WorkerStats,
};
use crate::poller::PollLoop;
use crate::session::DeckSession;
use crate::worker::Worker;
use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use deckrender::{AlbumArtCache, ImageKind, RenderEngine};
use deckspotify::PlaybackApi;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use utoipa::OpenApi;

/// État partagé pour l'API du Stream Deck
#[derive(Clone)]
pub struct DeckApiState {
    coalescer: Arc<ActionCoalescer>,
}

impl DeckApiState {
    pub fn new(coalescer: Arc<ActionCoalescer>) -> Self {
        Self { coalescer }
    }

    fn session(&self) -> &DeckSession {
        self.coalescer.session()
    }

    /// Une session refusée pendant une commande repasse l'affichage en
    /// attente de connexion
    fn reply(&self, result: crate::Result<ActionResponse>) -> Result<Json<ActionResponse>, ApiError> {
        result.map(Json).map_err(|err| {
            if matches!(err, DeckError::AuthFailure(_)) {
                self.session().state().with(|s| s.needs_login = true);
            }
            error_response(err)
        })
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: DeckError) -> ApiError {
    let status = err.status_code();
    if status.is_server_error() {
        warn!("Action failed: {}", err);
    } else {
        debug!("Action rejected ({}): {}", status, err);
    }
    (status, Json(ErrorResponse::new(err.to_string())))
}

/// Le corps est décodé à la main : un JSON invalide donne le même 400
/// `{"status": "error"}` que les autres refus
fn parse_action(body: &Bytes) -> Result<ActionRequest, ApiError> {
    serde_json::from_slice::<ActionRequest>(body)
        .map_err(|_| error_response(DeckError::malformed("Invalid action data")))
}

// ============================================================================
// HANDLERS - IMAGES
// ============================================================================

fn serve_image(state: &DeckApiState, kind: ImageKind) -> Response {
    match state.session().images().get(kind) {
        Some(bytes) => ([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "Image '{}' not rendered yet",
                kind.as_str()
            ))),
        )
            .into_response(),
    }
}

/// GET /left - Moitié gauche de l'écran (pochette)
#[utoipa::path(
    get,
    path = "/left",
    responses(
        (status = 200, description = "Image JPEG 200×100", content_type = "image/jpeg"),
        (status = 404, description = "Rien n'a encore été rendu", body = ErrorResponse)
    ),
    tag = "deck"
)]
pub async fn get_left(State(state): State<DeckApiState>) -> Response {
    serve_image(&state, ImageKind::Left)
}

/// GET /right - Moitié droite de l'écran (titre, artiste, progression)
#[utoipa::path(
    get,
    path = "/right",
    responses(
        (status = 200, description = "Image JPEG 200×100", content_type = "image/jpeg"),
        (status = 404, description = "Rien n'a encore été rendu", body = ErrorResponse)
    ),
    tag = "deck"
)]
pub async fn get_right(State(state): State<DeckApiState>) -> Response {
    serve_image(&state, ImageKind::Right)
}

/// GET /all - Écran complet
#[utoipa::path(
    get,
    path = "/all",
    responses(
        (status = 200, description = "Image JPEG 400×100", content_type = "image/jpeg"),
        (status = 404, description = "Rien n'a encore été rendu", body = ErrorResponse)
    ),
    tag = "deck"
)]
pub async fn get_all(State(state): State<DeckApiState>) -> Response {
    serve_image(&state, ImageKind::Full)
}

/// GET /single - Disposition compacte pour un seul cadran
#[utoipa::path(
    get,
    path = "/single",
    responses(
        (status = 200, description = "Image JPEG 200×100", content_type = "image/jpeg"),
        (status = 404, description = "Rien n'a encore été rendu", body = ErrorResponse)
    ),
    tag = "deck"
)]
pub async fn get_single(State(state): State<DeckApiState>) -> Response {
    serve_image(&state, ImageKind::Single)
}

// ============================================================================
// HANDLERS - COMMANDES
// ============================================================================

/// POST /left - Appui (lecture/pause) ou rotation (morceau suivant/précédent)
#[utoipa::path(
    post,
    path = "/left",
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Commande exécutée ou ignorée", body = ActionResponse),
        (status = 400, description = "Commande invalide", body = ErrorResponse),
        (status = 500, description = "Erreur Spotify", body = ErrorResponse)
    ),
    tag = "deck"
)]
pub async fn post_left(
    State(state): State<DeckApiState>,
    body: Bytes,
) -> Result<Json<ActionResponse>, ApiError> {
    let request = parse_action(&body)?;
    let result = state.coalescer.handle_left(&request).await;
    state.reply(result)
}

/// POST /right - Appui (j'aime) ou rotation (volume)
#[utoipa::path(
    post,
    path = "/right",
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Commande exécutée ou ignorée", body = ActionResponse),
        (status = 400, description = "Commande invalide ou aucun morceau", body = ErrorResponse),
        (status = 500, description = "Erreur Spotify", body = ErrorResponse)
    ),
    tag = "deck"
)]
pub async fn post_right(
    State(state): State<DeckApiState>,
    body: Bytes,
) -> Result<Json<ActionResponse>, ApiError> {
    let request = parse_action(&body)?;
    let result = state.coalescer.handle_right(&request).await;
    state.reply(result)
}

/// POST /player - Commandes nommées
#[utoipa::path(
    post,
    path = "/player",
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Commande exécutée ou ignorée", body = ActionResponse),
        (status = 400, description = "Commande invalide", body = ErrorResponse),
        (status = 403, description = "Spotify Premium requis", body = ErrorResponse),
        (status = 500, description = "Erreur Spotify", body = ErrorResponse)
    ),
    tag = "deck"
)]
pub async fn post_player(
    State(state): State<DeckApiState>,
    body: Bytes,
) -> Result<Json<ActionResponse>, ApiError> {
    let request = parse_action(&body)?;
    let result = state.coalescer.handle_player(&request).await;
    state.reply(result)
}

// ============================================================================
// HANDLERS - ÉTATS
// ============================================================================

/// GET /states - Indicateurs en cache, sans appel à Spotify
#[utoipa::path(
    get,
    path = "/states",
    responses(
        (status = 200, description = "États courants", body = DeckStates)
    ),
    tag = "deck"
)]
pub async fn get_states(State(state): State<DeckApiState>) -> Json<DeckStates> {
    Json(state.session().state().states())
}

/// GET /devices - Appareils Spotify Connect
#[utoipa::path(
    get,
    path = "/devices",
    responses(
        (status = 200, description = "Appareils disponibles", body = Vec<DeviceSummary>),
        (status = 500, description = "Erreur Spotify", body = ErrorResponse)
    ),
    tag = "deck"
)]
pub async fn get_devices(
    State(state): State<DeckApiState>,
) -> Result<Json<Vec<DeviceSummary>>, ApiError> {
    let devices = state
        .session()
        .api()
        .devices()
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(devices.into_iter().map(DeviceSummary::from).collect()))
}

/// GET /api/worker - Compteurs des tâches asynchrones
#[utoipa::path(
    get,
    path = "/api/worker",
    responses(
        (status = 200, description = "Compteurs", body = WorkerStats)
    ),
    tag = "deck"
)]
pub async fn get_worker_stats(State(state): State<DeckApiState>) -> Json<WorkerStats> {
    Json(state.coalescer.worker().stats())
}

/// Crée le router de l'API du Stream Deck
pub fn create_router(state: DeckApiState) -> Router {
    Router::new()
        .route("/left", get(get_left).post(post_left))
        .route("/right", get(get_right).post(post_right))
        .route("/all", get(get_all))
        .route("/single", get(get_single))
        .route("/player", axum::routing::post(post_player))
        .route("/states", get(get_states))
        .route("/devices", get(get_devices))
        .route("/api/worker", get(get_worker_stats))
        .with_state(state)
}

/// Trait d'extension pour brancher le Stream Deck sur un `deckserver::Server`
#[async_trait]
pub trait DeckApiExt {
    /// Assemble la session, démarre le worker et la boucle de polling,
    /// puis enregistre les routes
    ///
    /// # Routes créées
    ///
    /// - `GET /left`, `/right`, `/all`, `/single` : images JPEG
    /// - `POST /left`, `/right`, `/player` : commandes
    /// - `GET /states`, `/devices`, `/api/worker`
    /// - Swagger : `/swagger-ui/deck`
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use deckcontrol::DeckApiExt;
    ///
    /// let mut server = deckserver::ServerBuilder::new_configured().build();
    /// let api = Arc::new(SpotifyClient::from_config()?);
    /// let session = server
    ///     .register_deck(api, RenderEngine::from_config(), art, settings)
    ///     .await;
    /// server.start().await?;
    /// ```
    async fn register_deck(
        &mut self,
        api: Arc<dyn PlaybackApi>,
        engine: RenderEngine,
        art: AlbumArtCache,
        settings: ControlSettings,
    ) -> Arc<DeckSession>;

    /// Enregistre uniquement les routes (bas niveau)
    async fn init_deck_api(&mut self, coalescer: Arc<ActionCoalescer>);
}

#[async_trait]
impl DeckApiExt for deckserver::Server {
    async fn register_deck(
        &mut self,
        api: Arc<dyn PlaybackApi>,
        engine: RenderEngine,
        art: AlbumArtCache,
        settings: ControlSettings,
    ) -> Arc<DeckSession> {
        info!("🎛️  Initializing Stream Deck session...");

        let session = Arc::new(DeckSession::new(api, engine, art, settings));
        let worker = Worker::start();
        let coalescer = Arc::new(ActionCoalescer::new(session.clone(), worker));

        self.init_deck_api(coalescer).await;
        let poll_loop = PollLoop::new(session.clone()).spawn();
        tokio::spawn(async move {
            match poll_loop.await {
                Ok(()) => warn!("Poll loop stopped"),
                Err(e) => error!("💥 Poll loop died: {}", e),
            }
        });

        info!("✅ Stream Deck API registered:");
        info!("   - Images: /left /right /all /single");
        info!("   - Actions: /left /right /player");
        info!("   - OpenAPI docs: /swagger-ui/deck");

        session
    }

    async fn init_deck_api(&mut self, coalescer: Arc<ActionCoalescer>) {
        let router = create_router(DeckApiState::new(coalescer));
        self.add_router("/", router).await;
        self.add_openapi(crate::openapi::ApiDoc::openapi(), "deck")
            .await;
    }
}
