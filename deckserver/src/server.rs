//! # Module Server - API de haut niveau pour Axum
//!
//! Ce module cache la configuration du routage et du cycle de vie d'un
//! serveur Axum derrière quelques méthodes :
//!
//! - `add_router()` : monte un sous-router (merge à la racine ou nest)
//! - `add_handler_with_state()` : ajoute un handler GET avec état
//! - `add_openapi()` : publie une spécification OpenAPI et sa Swagger UI
//! - `start()` / `wait()` : démarrage et arrêt gracieux sur Ctrl+C

use crate::logs::{self, LogState, LoggingOptions};
use anyhow::Result;
use axum::Router;
use axum::handler::Handler;
use axum::routing::get;
use deckconfig::get_config;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::RwLock, task::JoinHandle};
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Info serveur sérialisable
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct ServerInfo {
    pub name: String,
    pub bind_address: String,
    pub http_port: u16,
}

/// Serveur principal
pub struct Server {
    name: String,
    bind_address: String,
    http_port: u16,
    router: Arc<RwLock<Router>>,
    join_handle: Option<JoinHandle<()>>,
    log_state: Option<LogState>,
}

impl Server {
    /// Crée une nouvelle instance de serveur
    ///
    /// # Arguments
    ///
    /// * `name` - Nom du serveur (pour les logs)
    /// * `bind_address` - Adresse d'écoute (ex: "127.0.0.1")
    /// * `http_port` - Port HTTP à écouter
    pub fn new(name: impl Into<String>, bind_address: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            bind_address: bind_address.into(),
            http_port,
            router: Arc::new(RwLock::new(Router::new())),
            join_handle: None,
            log_state: None,
        }
    }

    pub fn new_configured() -> Self {
        let config = get_config();
        Self::new("NowDeck", config.get_bind_address(), config.get_http_port())
    }

    /// Ajoute un sous-router au serveur
    ///
    /// - Si `path` est "/", merge directement au router principal
    /// - Sinon, nest le router sous le chemin donné
    pub async fn add_router(&mut self, path: &str, sub_router: Router) {
        let mut r = self.router.write().await;

        *r = if path == "/" {
            std::mem::take(&mut *r).merge(sub_router)
        } else {
            let normalized = format!("/{}", path.trim_start_matches('/'));
            std::mem::take(&mut *r).nest(&normalized, sub_router)
        };
    }

    /// Ajoute un handler GET avec état
    pub async fn add_handler_with_state<H, T, S>(&mut self, path: &str, handler: H, state: S)
    where
        H: Handler<T, S> + Clone + 'static,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        let route = Router::new().route(path, get(handler)).with_state(state);

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(route);
    }

    /// Publie une spécification OpenAPI et sa Swagger UI
    ///
    /// Les routes documentées doivent avoir été ajoutées séparément ; cette
    /// méthode expose :
    ///
    /// - `/swagger-ui/{name}` : la documentation interactive
    /// - `/api-docs/{name}.json` : la spécification brute
    pub async fn add_openapi(&mut self, openapi: utoipa::openapi::OpenApi, name: &str) {
        let swagger_path = format!("/swagger-ui/{}", name);
        let openapi_json_path = format!("/api-docs/{}.json", name);

        let swagger = SwaggerUi::new(swagger_path).url(openapi_json_path, openapi);

        let mut r = self.router.write().await;
        *r = std::mem::take(&mut *r).merge(swagger);
    }

    /// Copie du router courant (utile pour les tests avec `tower::ServiceExt`)
    pub async fn router(&self) -> Router {
        self.router.read().await.clone()
    }

    /// Démarre le serveur HTTP
    ///
    /// Le socket est ouvert avant de rendre la main : une erreur de bind
    /// remonte à l'appelant. Le service tourne ensuite en tâche de fond
    /// jusqu'à Ctrl+C.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let addr: SocketAddr = format!("{}:{}", self.bind_address, self.http_port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!(
            "Server {} running at http://{}",
            self.name, local_addr
        );

        let router = self.router.read().await.clone();
        let server_task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router.into_make_service()).await {
                error!("❌ HTTP server stopped: {}", e);
            }
        });

        let shutdown_task = tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => info!("Ctrl+C reçu, arrêt gracieux"),
                Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
            }
        });

        self.join_handle = Some(tokio::spawn(async move {
            tokio::select! {
                _ = server_task => {},
                _ = shutdown_task => {},
            }
        }));

        Ok(local_addr)
    }

    /// Attend la fin du serveur
    pub async fn wait(&mut self) {
        if let Some(h) = self.join_handle.take() {
            let _ = h.await;
        }
    }

    /// Récupère les infos du serveur
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            name: self.name.clone(),
            bind_address: self.bind_address.clone(),
            http_port: self.http_port,
        }
    }

    /// Initialise le système de logging et enregistre les routes de logs
    ///
    /// Routes ajoutées : `/log-dump`, `/api/log_setup` et `/swagger-ui/logs`.
    pub async fn init_logging(&mut self, options: LoggingOptions) -> LogState {
        let log_state = logs::init_logging(options);

        self.add_handler_with_state("/log-dump", logs::log_dump, log_state.clone())
            .await;
        self.add_router("/api", logs::create_logs_router(log_state.clone()))
            .await;
        self.add_openapi(logs::LogsApiDoc::openapi(), "logs").await;

        self.log_state = Some(log_state.clone());
        log_state
    }

    pub fn log_state(&self) -> Option<&LogState> {
        self.log_state.as_ref()
    }
}

/// Builder pattern
pub struct ServerBuilder {
    name: String,
    bind_address: String,
    http_port: u16,
}

impl ServerBuilder {
    pub fn new(name: impl Into<String>, bind_address: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            bind_address: bind_address.into(),
            http_port,
        }
    }

    pub fn new_configured() -> Self {
        let config = get_config();
        Self {
            name: "NowDeck".to_string(),
            bind_address: config.get_bind_address(),
            http_port: config.get_http_port(),
        }
    }

    /// Construit le serveur
    pub fn build(self) -> Server {
        Server::new(self.name, self.bind_address, self.http_port)
    }
}
