//! Résolution des polices
//!
//! On cherche d'abord la police configurée, puis une liste de polices
//! système couvrant l'Unicode (japonais, chinois...). Si rien ne se charge,
//! le rendu bascule sur une police bitmap embarquée choisie selon la taille.

use ab_glyph::{Font, FontArc, FontVec, GlyphId, PxScale, ScaleFont, point};
use embedded_graphics::{
    mono_font::{
        MonoFont, MonoTextStyle,
        iso_8859_1::{FONT_6X10, FONT_8X13, FONT_9X15, FONT_10X20},
    },
    pixelcolor::Rgb888,
    prelude::*,
    text::{Baseline, Text},
};
use image::{Rgba, RgbaImage};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::draw::blend_pixel;

#[cfg(target_os = "windows")]
const SYSTEM_FONTS: &[&str] = &[
    "C:/Windows/Fonts/yugothm.ttc",
    "C:/Windows/Fonts/NotoSans-Regular.ttf",
    "C:/Windows/Fonts/meiryo.ttc",
    "C:/Windows/Fonts/msgothic.ttc",
    "C:/Windows/Fonts/arial.ttf",
];

#[cfg(target_os = "macos")]
const SYSTEM_FONTS: &[&str] = &[
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/Library/Fonts/Arial Unicode MS.ttf",
    "/System/Library/Fonts/Arial.ttf",
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/arial.ttf",
];

/// Police chargée une fois pour toutes, déclinée ensuite par taille
pub struct FontBook {
    truetype: Option<FontArc>,
}

impl FontBook {
    /// Charge la police configurée ou la première police système lisible
    pub fn load(configured: Option<&str>) -> Self {
        let candidates = configured.into_iter().chain(SYSTEM_FONTS.iter().copied());

        for path in candidates {
            match load_font_file(Path::new(path)) {
                Some(font) => {
                    info!("🔤 Using font {}", path);
                    return Self {
                        truetype: Some(font),
                    };
                }
                None => debug!("Font {} unavailable", path),
            }
        }

        warn!("No TrueType font found, falling back to bitmap font");
        Self::bitmap_only()
    }

    /// Police bitmap uniquement (rendu identique sur toutes les machines)
    pub fn bitmap_only() -> Self {
        Self { truetype: None }
    }

    pub fn has_truetype(&self) -> bool {
        self.truetype.is_some()
    }

    /// Police à la taille demandée (taille en pixels par em)
    pub fn face(&self, size: f32) -> FontFace<'_> {
        match &self.truetype {
            Some(font) => {
                let units = font.units_per_em().unwrap_or(1000.0);
                let scale = PxScale::from(size * font.height_unscaled() / units);
                FontFace::TrueType { font, scale }
            }
            None => FontFace::Bitmap(bitmap_for_size(size)),
        }
    }
}

fn load_font_file(path: &Path) -> Option<FontArc> {
    let data = std::fs::read(path).ok()?;
    // index 0 : première face des collections .ttc
    match FontVec::try_from_vec_and_index(data, 0) {
        Ok(font) => Some(FontArc::new(font)),
        Err(e) => {
            warn!("Failed to load font {}: {}", path.display(), e);
            None
        }
    }
}

fn bitmap_for_size(size: f32) -> &'static MonoFont<'static> {
    if size >= 20.0 {
        &FONT_10X20
    } else if size >= 16.0 {
        &FONT_9X15
    } else if size >= 14.0 {
        &FONT_8X13
    } else {
        &FONT_6X10
    }
}

/// Une police à une taille donnée
pub enum FontFace<'a> {
    TrueType { font: &'a FontArc, scale: PxScale },
    Bitmap(&'static MonoFont<'static>),
}

impl FontFace<'_> {
    /// Largeur en pixels du texte rendu
    pub fn measure(&self, text: &str) -> f32 {
        match self {
            FontFace::TrueType { font, scale } => {
                let scaled = font.as_scaled(*scale);
                let mut width = 0.0;
                let mut prev: Option<GlyphId> = None;
                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(p) = prev {
                        width += scaled.kern(p, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                width
            }
            FontFace::Bitmap(font) => {
                let advance = font.character_size.width + font.character_spacing;
                (text.chars().count() as u32 * advance) as f32
            }
        }
    }

    /// Dessine le texte, (x, y) étant le coin haut-gauche de la ligne
    pub fn draw(&self, canvas: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>) {
        match self {
            FontFace::TrueType { font, scale } => {
                let scaled = font.as_scaled(*scale);
                let baseline = y as f32 + scaled.ascent();
                let mut caret = x as f32;
                let mut prev: Option<GlyphId> = None;

                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(p) = prev {
                        caret += scaled.kern(p, id);
                    }
                    let glyph = id.with_scale_and_position(*scale, point(caret, baseline));
                    caret += scaled.h_advance(id);
                    prev = Some(id);

                    if let Some(outlined) = font.outline_glyph(glyph) {
                        let bounds = outlined.px_bounds();
                        outlined.draw(|gx, gy, coverage| {
                            blend_pixel(
                                canvas,
                                bounds.min.x as i32 + gx as i32,
                                bounds.min.y as i32 + gy as i32,
                                color,
                                coverage,
                            );
                        });
                    }
                }
            }
            FontFace::Bitmap(font) => {
                let style = MonoTextStyle::new(font, Rgb888::new(color.0[0], color.0[1], color.0[2]));
                let mut target = CanvasTarget { canvas };
                let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top)
                    .draw(&mut target);
            }
        }
    }
}

/// Adaptateur `DrawTarget` d'embedded-graphics sur un `RgbaImage`
struct CanvasTarget<'a> {
    canvas: &'a mut RgbaImage,
}

impl OriginDimensions for CanvasTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.canvas.width(), self.canvas.height())
    }
}

impl DrawTarget for CanvasTarget<'_> {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(pt, color) in pixels {
            let rgba = Rgba([color.r(), color.g(), color.b(), 255]);
            blend_pixel(self.canvas, pt.x, pt.y, rgba, 1.0);
        }
        Ok(())
    }
}
