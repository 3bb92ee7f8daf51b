//! # deckserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit une abstraction simple pour exposer les routes HTTP
//! de NowDeck (images rendues, actions du Stream Deck) avec Axum.
//!
//! ## Fonctionnalités
//!
//! - **API de haut niveau** : composition de routers et handlers avec état
//! - **Logs en mémoire** : buffer circulaire consultable via `/log-dump`
//! - **Niveau de log dynamique** : `GET/POST /api/log_setup`
//! - **Documentation OpenAPI** : Swagger UI par API enregistrée
//! - **Arrêt gracieux** : gestion propre de Ctrl+C
//!
//! ## Exemple d'utilisation
//!
//! ```rust,no_run
//! use deckserver::ServerBuilder;
//! use axum::{Router, routing::get};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = ServerBuilder::new("NowDeck", "127.0.0.1", 8491).build();
//!     server.add_router("/", Router::new().route("/ping", get(|| async { "pong" }))).await;
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogEntry, LogState, LoggingOptions, log_dump};
pub use server::{Server, ServerBuilder, ServerInfo};
