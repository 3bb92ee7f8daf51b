//! Erreurs du moteur de rendu

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    /// Décodage ou encodage d'image
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// Téléchargement de pochette
    #[error("Album art download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Album art download failed with HTTP {0}")]
    HttpStatus(u16),

    /// Icône absente ou illisible
    #[error("Icon load failed: {0}")]
    Icon(String),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
