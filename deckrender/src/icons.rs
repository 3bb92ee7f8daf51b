//! Icônes "j'aime"
//!
//! `liked.png` et `like.png` sont lues dans le répertoire d'assets et
//! redimensionnées. En leur absence, un cœur est dessiné à la volée.

use crate::draw::{GREEN, GREY};
use crate::error::{RenderError, Result};
use image::{RgbaImage, imageops::FilterType};
use std::path::Path;
use tracing::{debug, warn};

pub const LIKED_ICON: &str = "liked.png";
pub const UNLIKED_ICON: &str = "like.png";

/// Les deux variantes d'une icône à une taille donnée
#[derive(Clone)]
pub struct LikeIcons {
    liked: RgbaImage,
    unliked: RgbaImage,
}

impl LikeIcons {
    /// Charge les icônes depuis `assets_dir`, ou les dessine
    pub fn load(assets_dir: Option<&Path>, size: u32) -> Self {
        let load_one = |name: &str, fallback: fn(u32) -> RgbaImage| match assets_dir {
            Some(dir) => match load_icon(&dir.join(name), size) {
                Ok(icon) => icon,
                Err(e) => {
                    debug!("{}, drawing heart instead", e);
                    fallback(size)
                }
            },
            None => fallback(size),
        };

        Self {
            liked: load_one(LIKED_ICON, |s| heart(s, true)),
            unliked: load_one(UNLIKED_ICON, |s| heart(s, false)),
        }
    }

    pub fn get(&self, liked: bool) -> &RgbaImage {
        if liked { &self.liked } else { &self.unliked }
    }
}

fn load_icon(path: &Path, size: u32) -> Result<RgbaImage> {
    if !path.exists() {
        return Err(RenderError::Icon(format!("{} not found", path.display())));
    }
    let img = image::open(path).map_err(|e| {
        warn!("Error loading icon {}: {}", path.display(), e);
        RenderError::Icon(e.to_string())
    })?;
    Ok(img.resize_exact(size, size, FilterType::Lanczos3).to_rgba8())
}

/// Cœur plein dessiné par l'équation implicite (x² + y² - 1)³ - x²y³ <= 0
pub fn heart(size: u32, liked: bool) -> RgbaImage {
    let color = if liked { GREEN } else { GREY };
    let mut icon = RgbaImage::new(size, size);
    let half = size as f32 / 2.0;

    for py in 0..size {
        for px in 0..size {
            // repère centré, y vers le haut, marge de 10 %
            let x = (px as f32 + 0.5 - half) / half * 1.3;
            let y = -((py as f32 + 0.5 - half) / half * 1.3) + 0.2;
            let v = (x * x + y * y - 1.0).powi(3) - x * x * y.powi(3);
            if v <= 0.0 {
                icon.put_pixel(px, py, color);
            }
        }
    }
    icon
}
