use anyhow::Context;
use deckconfig::get_config;
use deckcontrol::{ControlConfigExt, DeckApiExt};
use deckrender::{AlbumArtCache, RenderEngine};
use deckserver::{LoggingOptions, ServerBuilder};
use deckspotify::{SpotifyClient, SpotifyConfigExt};
use std::sync::Arc;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Les identifiants Spotify peuvent venir d'un fichier .env
    let dotenv = dotenvy::dotenv().ok();

    // ========== PHASE 1 : Configuration et logs ==========

    let config = get_config();
    let mut server = ServerBuilder::new_configured().build();
    server.init_logging(LoggingOptions::from_config()).await;

    info!("📁 Configuration loaded from {}", config.dir());
    if let Some(path) = dotenv {
        debug!("Environment loaded from {}", path.display());
    }

    // ========== PHASE 2 : Spotify, rendu et pilotage ==========

    let spotify = config.get_spotify_settings();
    let art_timeout = spotify.request_timeout;
    let api = Arc::new(SpotifyClient::new(spotify).context("Cannot build Spotify client")?);

    info!("🖼️  Loading fonts and icons...");
    let engine = RenderEngine::from_config();
    let art = AlbumArtCache::new(art_timeout).context("Cannot build album art client")?;

    server
        .register_deck(api, engine, art, config.get_control_settings())
        .await;

    // ========== PHASE 3 : Démarrage du serveur ==========

    info!("🌐 Starting HTTP server...");
    let addr = server.start().await.context("Cannot start HTTP server")?;

    info!("✅ NowDeck is ready at http://{}", addr);
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
