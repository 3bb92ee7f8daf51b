//! Moteur de rendu
//!
//! Fonctions pures : une vue de lecture (morceau, état, progression,
//! pochette déjà décodée) donne toujours les mêmes octets. Aucun appel
//! réseau ici ; la pochette est fournie par l'appelant via
//! [`AlbumArtCache`](crate::AlbumArtCache).
//!
//! Deux canevas par passe :
//! - **full** 400×100, découpé en `left` (x 0..200) et `right` (x 200..400)
//! - **single** 200×100 pour un seul cadran

use crate::config_ext::RenderConfigExt;
use crate::draw::{
    self, BLACK, GREEN, GREY, LIGHT_GREY, PLACEHOLDER, RED, WHITE, fill_rect, rounded_rect,
    shade_rect,
};
use crate::error::Result;
use crate::fonts::FontBook;
use crate::icons::LikeIcons;
use crate::images::RenderedImageSet;
use crate::text::{format_retry_time, truncate_text, wrap_text};
use deckconfig::get_config;
use deckspotify::TrackSnapshot;
use image::{Rgba, RgbaImage, imageops::FilterType};
use std::path::Path;

// Canevas complet
const FULL_W: u32 = 400;
const FULL_H: u32 = 100;
const ART_SIZE: u32 = 100;
const TITLE_POS: (i32, i32) = (120, 15);
const ARTIST_POS: (i32, i32) = (120, 45);
const TEXT_MAX_W: f32 = 260.0;
const BAR: (i32, i32, i32, i32) = (120, 75, 340, 80);
const BAR_LEN: f64 = 220.0;
const HEART_POS: (i64, i64) = (360, 65);
const HEART_SIZE: u32 = 20;

// Cadran unique
const SINGLE_W: u32 = 200;
const SINGLE_H: u32 = 100;
const SINGLE_ART_SIZE: u32 = 50;
const SINGLE_ART_X: i64 = 150;
const SINGLE_TITLE_W: f32 = 140.0;
const SINGLE_ARTIST_W: f32 = 180.0;
const SINGLE_BAR: (i32, i32, i32, i32) = (10, 80, 175, 83);
const SINGLE_BAR_LEN: f64 = 165.0;
const SINGLE_HEART_POS: (i64, i64) = (180, 75);
const SINGLE_HEART_SIZE: u32 = 14;

/// Ce qui est affiché pour un morceau en cours
pub struct NowPlaying<'a> {
    pub track: &'a TrackSnapshot,
    pub is_playing: bool,
    pub is_liked: bool,
    /// Progression 0.0..=1.0, `None` si inconnue
    pub progress: Option<f64>,
    pub art: Option<&'a RgbaImage>,
}

pub struct RenderEngine {
    fonts: FontBook,
    icons: LikeIcons,
    single_icons: LikeIcons,
}

impl RenderEngine {
    pub fn new(fonts: FontBook, assets_dir: Option<&Path>) -> Self {
        Self {
            fonts,
            icons: LikeIcons::load(assets_dir, HEART_SIZE),
            single_icons: LikeIcons::load(assets_dir, SINGLE_HEART_SIZE),
        }
    }

    /// Polices et icônes selon la section `render` de la configuration
    pub fn from_config() -> Self {
        let config = get_config();
        let fonts = FontBook::load(config.get_render_font_path().as_deref());
        let assets = config.get_render_assets_dir();
        Self::new(fonts, Some(assets.as_path()))
    }

    fn text(&self, canvas: &mut RgbaImage, pos: (i32, i32), size: f32, s: &str, color: Rgba<u8>) {
        self.fonts.face(size).draw(canvas, pos.0, pos.1, s, color);
    }

    fn fit(&self, s: &str, size: f32, max_width: f32) -> String {
        let face = self.fonts.face(size);
        truncate_text(s, max_width, |t| face.measure(t))
    }

    fn wrap(&self, s: &str, size: f32, max_width: f32, max_lines: usize) -> Vec<String> {
        let face = self.fonts.face(size);
        wrap_text(s, max_width, max_lines, |t| face.measure(t))
    }

    /// Pochette, titre, artistes, progression et cœur
    pub fn render_now_playing(&self, view: &NowPlaying<'_>) -> Result<RenderedImageSet> {
        let progress = view.progress.map(|p| p.clamp(0.0, 1.0));

        // Canevas complet
        let mut full = blank(FULL_W, FULL_H);
        paste_art(&mut full, view.art, ART_SIZE, 0);
        if !view.is_playing {
            pause_overlay(&mut full);
        }
        let title = self.fit(&view.track.name, 20.0, TEXT_MAX_W);
        self.text(&mut full, TITLE_POS, 20.0, &title, WHITE);
        let artists = self.fit(&view.track.artists, 16.0, TEXT_MAX_W);
        self.text(&mut full, ARTIST_POS, 16.0, &artists, LIGHT_GREY);
        progress_bar(&mut full, BAR, BAR_LEN, progress);
        draw::paste(&mut full, self.icons.get(view.is_liked), HEART_POS.0, HEART_POS.1);

        // Cadran unique
        let mut single = blank(SINGLE_W, SINGLE_H);
        paste_art(&mut single, view.art, SINGLE_ART_SIZE, SINGLE_ART_X);
        for (i, line) in self
            .wrap(&view.track.name, 16.0, SINGLE_TITLE_W, 2)
            .iter()
            .enumerate()
        {
            self.text(&mut single, (10, 8 + i as i32 * 20), 16.0, line, WHITE);
        }
        let artists = self.fit(&view.track.artists, 14.0, SINGLE_ARTIST_W);
        self.text(&mut single, (10, 55), 14.0, &artists, LIGHT_GREY);
        progress_bar(&mut single, SINGLE_BAR, SINGLE_BAR_LEN, progress);
        draw::paste(
            &mut single,
            self.single_icons.get(view.is_liked),
            SINGLE_HEART_POS.0,
            SINGLE_HEART_POS.1,
        );
        if !view.is_playing {
            single_pause_overlay(&mut single);
        }

        RenderedImageSet::encode(&full, &single)
    }

    /// Rien en lecture
    pub fn render_no_track(&self) -> Result<RenderedImageSet> {
        let mut full = blank(FULL_W, FULL_H);
        paste_art(&mut full, None, ART_SIZE, 0);
        pause_overlay(&mut full);
        self.text(&mut full, TITLE_POS, 20.0, "No track playing", WHITE);
        self.text(&mut full, ARTIST_POS, 16.0, "Start Spotify", LIGHT_GREY);
        progress_bar(&mut full, BAR, BAR_LEN, None);
        draw::paste(&mut full, self.icons.get(false), HEART_POS.0, HEART_POS.1);

        let mut single = blank(SINGLE_W, SINGLE_H);
        paste_art(&mut single, None, SINGLE_ART_SIZE, SINGLE_ART_X);
        self.text(&mut single, (10, 15), 16.0, "No track", WHITE);
        self.text(&mut single, (10, 35), 16.0, "playing", WHITE);
        self.text(&mut single, (10, 60), 14.0, "Start Spotify", LIGHT_GREY);
        progress_bar(&mut single, SINGLE_BAR, SINGLE_BAR_LEN, None);
        single_pause_overlay(&mut single);
        draw::paste(
            &mut single,
            self.single_icons.get(false),
            SINGLE_HEART_POS.0,
            SINGLE_HEART_POS.1,
        );

        RenderedImageSet::encode(&full, &single)
    }

    /// Invitation à se connecter
    pub fn render_login(&self) -> Result<RenderedImageSet> {
        let mut full = blank(FULL_W, FULL_H);
        self.text(&mut full, (20, 25), 20.0, "Please Login", WHITE);
        self.text(&mut full, (20, 55), 20.0, "to Spotify", WHITE);

        let mut single = blank(SINGLE_W, SINGLE_H);
        self.text(&mut single, (10, 20), 16.0, "Please Login", WHITE);
        self.text(&mut single, (10, 45), 16.0, "to Spotify", WHITE);

        RenderedImageSet::encode(&full, &single)
    }

    /// Erreur générique, message sur deux lignes au plus
    pub fn render_error(&self, message: &str) -> Result<RenderedImageSet> {
        let mut full = blank(FULL_W, FULL_H);
        self.text(&mut full, (20, 15), 20.0, "Error", RED);
        for (i, line) in self.wrap(message, 16.0, 360.0, 2).iter().enumerate() {
            self.text(&mut full, (20, 45 + i as i32 * 22), 16.0, line, WHITE);
        }

        let mut single = blank(SINGLE_W, SINGLE_H);
        self.text(&mut single, (10, 20), 16.0, "Error", RED);
        for (i, line) in self.wrap(message, 14.0, SINGLE_ARTIST_W, 2).iter().enumerate() {
            self.text(&mut single, (10, 50 + i as i32 * 18), 14.0, line, WHITE);
        }

        RenderedImageSet::encode(&full, &single)
    }

    /// Quota dépassé, avec le délai avant nouvel essai
    pub fn render_rate_limit(&self, retry_after: u64) -> Result<RenderedImageSet> {
        let retry = format!("Retry after: {}", format_retry_time(retry_after));

        let mut full = blank(FULL_W, FULL_H);
        self.text(&mut full, (20, 25), 20.0, "Too Many Requests", WHITE);
        self.text(&mut full, (20, 50), 20.0, &retry, WHITE);

        let mut single = blank(SINGLE_W, SINGLE_H);
        self.text(&mut single, (10, 25), 16.0, "Too Many Requests", WHITE);
        let retry = self.fit(&retry, 14.0, SINGLE_ARTIST_W);
        self.text(&mut single, (10, 55), 14.0, &retry, WHITE);

        RenderedImageSet::encode(&full, &single)
    }
}

fn blank(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, BLACK)
}

/// Pochette redimensionnée, ou carré sombre si absente
fn paste_art(canvas: &mut RgbaImage, art: Option<&RgbaImage>, size: u32, x: i64) {
    match art {
        Some(art) => {
            let resized = image::imageops::resize(art, size, size, FilterType::Lanczos3);
            draw::paste(canvas, &resized, x, 0);
        }
        None => fill_rect(
            canvas,
            x as i32,
            0,
            x as i32 + size as i32 - 1,
            size as i32 - 1,
            PLACEHOLDER,
        ),
    }
}

fn progress_bar(
    canvas: &mut RgbaImage,
    (x0, y0, x1, y1): (i32, i32, i32, i32),
    length: f64,
    progress: Option<f64>,
) {
    rounded_rect(canvas, x0, y0, x1, y1, GREY);
    if let Some(p) = progress {
        let width = (length * p) as i32;
        rounded_rect(canvas, x0, y0, x0 + width, y1, GREEN);
    }
}

/// Voile à 50 % sur la pochette et deux barres blanches centrées
fn pause_overlay(canvas: &mut RgbaImage) {
    let size = ART_SIZE as i32;
    shade_rect(canvas, 0, 0, size - 1, size - 1, Rgba([0, 0, 0, 128]));
    pause_bars(canvas, (size - (2 * 10 + 10)) / 2, (size - 30) / 2, 10, 30, 10);
}

/// Voile à 25 % sur tout le cadran, barres centrées dans la zone de texte
fn single_pause_overlay(canvas: &mut RgbaImage) {
    shade_rect(
        canvas,
        0,
        0,
        SINGLE_W as i32 - 1,
        SINGLE_H as i32 - 1,
        Rgba([0, 0, 0, 64]),
    );
    let start_x = (140 - (2 * 6 + 6)) / 2 + 10;
    pause_bars(canvas, start_x, (SINGLE_H as i32 - 20) / 2, 6, 20, 6);
}

fn pause_bars(canvas: &mut RgbaImage, start_x: i32, start_y: i32, w: i32, h: i32, spacing: i32) {
    for x in [start_x, start_x + w + spacing] {
        fill_rect(canvas, x, start_y, x + w, start_y + h, WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> TrackSnapshot {
        TrackSnapshot {
            id: "t1".into(),
            name: "A Very Long Track Title That Will Not Fit".into(),
            artists: "Artist One, Artist Two".into(),
            art_url: None,
            progress_ms: 50_000,
            duration_ms: 200_000,
            is_playing: true,
        }
    }

    fn engine() -> RenderEngine {
        RenderEngine::new(FontBook::bitmap_only(), None)
    }

    fn decode(bytes: &[u8]) -> RgbaImage {
        image::load_from_memory(bytes).unwrap().to_rgba8()
    }

    #[test]
    fn test_progress_bar_width() {
        let mut canvas = blank(FULL_W, FULL_H);
        progress_bar(&mut canvas, BAR, BAR_LEN, Some(0.5));
        assert_eq!(*canvas.get_pixel(125, 77), GREEN);
        assert_eq!(*canvas.get_pixel(230, 77), GREEN);
        assert_eq!(*canvas.get_pixel(231, 77), GREY);
    }

    #[test]
    fn test_pause_overlay_darkens_art() {
        let art = RgbaImage::from_pixel(10, 10, WHITE);
        let track = track();
        let (track, art) = (&track, &art);
        let view = move |playing| NowPlaying {
            track,
            is_playing: playing,
            is_liked: false,
            progress: Some(0.25),
            art: Some(art),
        };

        let engine = engine();
        let playing = decode(&engine.render_now_playing(&view(true)).unwrap().full);
        let paused = decode(&engine.render_now_playing(&view(false)).unwrap().full);

        // Coin de pochette hors des barres de pause
        assert!(playing.get_pixel(5, 5).0[0] > 240);
        assert!(paused.get_pixel(5, 5).0[0] < 150);
    }

    #[test]
    fn test_every_variant_renders_all_views() {
        let engine = engine();
        let sets = [
            engine.render_no_track().unwrap(),
            engine.render_login().unwrap(),
            engine.render_error("No active device found on this account").unwrap(),
            engine.render_rate_limit(3661).unwrap(),
        ];
        for set in &sets {
            assert_eq!(decode(&set.full).dimensions(), (400, 100));
            assert_eq!(decode(&set.left).dimensions(), (200, 100));
            assert_eq!(decode(&set.right).dimensions(), (200, 100));
            assert_eq!(decode(&set.single).dimensions(), (200, 100));
        }
    }
}
