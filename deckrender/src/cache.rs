//! Cache de pochettes à une seule entrée
//!
//! Seule la dernière URL est conservée : tant que le morceau ne change pas,
//! chaque rendu réutilise l'image décodée sans nouveau téléchargement.
//! Un échec est mémorisé de la même façon : la même URL n'est pas
//! retéléchargée à chaque rendu.

use crate::error::{RenderError, Result};
use image::RgbaImage;
use parking_lot::Mutex;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

struct Entry {
    url: String,
    /// `None` : le téléchargement a échoué, placeholder
    image: Option<Arc<RgbaImage>>,
}

pub struct AlbumArtCache {
    http: Client,
    entry: Mutex<Option<Entry>>,
}

impl AlbumArtCache {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http))
    }

    pub fn with_client(http: Client) -> Self {
        Self {
            http,
            entry: Mutex::new(None),
        }
    }

    /// Image en cache pour cette URL, sans téléchargement
    pub fn cached(&self, url: &str) -> Option<Arc<RgbaImage>> {
        self.entry
            .lock()
            .as_ref()
            .filter(|e| e.url == url)
            .and_then(|e| e.image.clone())
    }

    fn remember(&self, url: &str, image: Option<Arc<RgbaImage>>) {
        *self.entry.lock() = Some(Entry {
            url: url.to_string(),
            image,
        });
    }

    /// Retourne la pochette, en la téléchargeant si l'URL a changé
    ///
    /// Le verrou n'est jamais tenu pendant le téléchargement.
    pub async fn fetch(&self, url: &str) -> Result<Arc<RgbaImage>> {
        if let Some(image) = self.cached(url) {
            debug!("Using cached album art");
            return Ok(image);
        }

        debug!("Downloading album art from {}", url);
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(RenderError::HttpStatus(response.status().as_u16()));
        }
        let bytes = response.bytes().await?;

        // Le décodage est synchrone
        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await??
            .to_rgba8();
        let image = Arc::new(image);

        self.remember(url, Some(image.clone()));
        Ok(image)
    }

    /// Comme `fetch`, mais un échec donne `None` (placeholder au rendu)
    ///
    /// L'échec reste en cache jusqu'au changement d'URL.
    pub async fn fetch_or_placeholder(&self, url: Option<&str>) -> Option<Arc<RgbaImage>> {
        let url = url?;
        let known = self
            .entry
            .lock()
            .as_ref()
            .filter(|e| e.url == url)
            .map(|e| e.image.clone());
        if let Some(image) = known {
            return image;
        }

        match self.fetch(url).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Error loading album cover: {}", e);
                self.remember(url, None);
                None
            }
        }
    }
}
