//! Buffers d'images rendues, servis par HTTP

use crate::error::Result;
use image::{RgbImage, RgbaImage, codecs::jpeg::JpegEncoder, imageops};
use parking_lot::Mutex;
use std::sync::Arc;

pub const JPEG_QUALITY: u8 = 100;

/// Les quatre vues produites par une passe de rendu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Full,
    Left,
    Right,
    Single,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Full => "all",
            ImageKind::Left => "left",
            ImageKind::Right => "right",
            ImageKind::Single => "single",
        }
    }
}

/// Images JPEG issues d'une même passe de rendu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImageSet {
    pub full: Vec<u8>,
    pub left: Vec<u8>,
    pub right: Vec<u8>,
    pub single: Vec<u8>,
}

impl RenderedImageSet {
    /// Encode le canevas complet (découpé en deux moitiés) et le canevas single
    pub fn encode(full: &RgbaImage, single: &RgbaImage) -> Result<Self> {
        let half = full.width() / 2;
        let left = imageops::crop_imm(full, 0, 0, half, full.height()).to_image();
        let right = imageops::crop_imm(full, half, 0, full.width() - half, full.height()).to_image();

        Ok(Self {
            full: encode_jpeg(full)?,
            left: encode_jpeg(&left)?,
            right: encode_jpeg(&right)?,
            single: encode_jpeg(single)?,
        })
    }

    pub fn get(&self, kind: ImageKind) -> &[u8] {
        match kind {
            ImageKind::Full => &self.full,
            ImageKind::Left => &self.left,
            ImageKind::Right => &self.right,
            ImageKind::Single => &self.single,
        }
    }
}

/// Encode en JPEG qualité 100 (le JPEG n'a pas de canal alpha)
pub fn encode_jpeg(image: &RgbaImage) -> Result<Vec<u8>> {
    let rgb: RgbImage = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(buf)
}

/// Dernier jeu d'images rendu, remplacé d'un bloc
#[derive(Default)]
pub struct ImageStore {
    current: Mutex<Option<Arc<RenderedImageSet>>>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, set: RenderedImageSet) {
        *self.current.lock() = Some(Arc::new(set));
    }

    /// Copie des octets d'une vue ; `None` tant que rien n'a été rendu
    pub fn get(&self, kind: ImageKind) -> Option<Vec<u8>> {
        let snapshot = self.current.lock().clone()?;
        Some(snapshot.get(kind).to_vec())
    }

    pub fn snapshot(&self) -> Option<Arc<RenderedImageSet>> {
        self.current.lock().clone()
    }
}
