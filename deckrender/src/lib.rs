//! # deckrender - Rendu des images du Stream Deck
//!
//! Produit les images JPEG affichées sur les cadrans :
//!
//! - `engine` : les variantes (lecture, pause, aucun morceau, connexion,
//!   erreur, quota dépassé) en 400×100 et 200×100
//! - `fonts` / `text` : polices, mesure, troncature et retour à la ligne
//! - `icons` : cœurs "j'aime"
//! - `cache` : dernière pochette téléchargée
//! - `images` : jeu d'images encodées et stockage partagé

pub mod cache;
pub mod config_ext;
pub mod draw;
pub mod engine;
pub mod error;
pub mod fonts;
pub mod icons;
pub mod images;
pub mod text;

pub use cache::AlbumArtCache;
pub use config_ext::RenderConfigExt;
pub use engine::{NowPlaying, RenderEngine};
pub use error::{RenderError, Result};
pub use fonts::FontBook;
pub use images::{ImageKind, ImageStore, RenderedImageSet};
pub use text::{format_retry_time, truncate_text, wrap_text};
