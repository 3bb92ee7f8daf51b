//! Primitives de dessin sur `RgbaImage`
//!
//! Les rectangles sont inclusifs sur leurs deux bornes, comme les
//! coordonnées `[x0, y0, x1, y1]` utilisées par la mise en page.

use image::{Rgba, RgbaImage, imageops};

pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const GREEN: Rgba<u8> = Rgba([0x1D, 0xB9, 0x54, 255]);
pub const GREY: Rgba<u8> = Rgba([0x40, 0x40, 0x40, 255]);
pub const LIGHT_GREY: Rgba<u8> = Rgba([0xB3, 0xB3, 0xB3, 255]);
pub const PLACEHOLDER: Rgba<u8> = Rgba([0x1A, 0x1A, 0x1A, 255]);
pub const RED: Rgba<u8> = Rgba([0xFF, 0x00, 0x00, 255]);

/// Mélange `color` sur le pixel (x, y) avec une couverture 0.0..=1.0
pub fn blend_pixel(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    let alpha = (coverage.clamp(0.0, 1.0) * color.0[3] as f32 / 255.0).clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }

    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for i in 0..3 {
        let mixed = color.0[i] as f32 * alpha + dst.0[i] as f32 * (1.0 - alpha);
        dst.0[i] = mixed.round() as u8;
    }
    dst.0[3] = 255;
}

pub fn fill_rect(canvas: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            blend_pixel(canvas, x, y, color, 1.0);
        }
    }
}

/// Rectangle aux coins arrondis d'un pixel (barres de progression)
pub fn rounded_rect(canvas: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    if x1 - x0 < 2 || y1 - y0 < 2 {
        fill_rect(canvas, x0, y0, x1, y1, color);
        return;
    }
    for y in y0..=y1 {
        for x in x0..=x1 {
            let corner = (x == x0 || x == x1) && (y == y0 || y == y1);
            if !corner {
                blend_pixel(canvas, x, y, color, 1.0);
            }
        }
    }
}

/// Voile semi-transparent sur une zone
pub fn shade_rect(canvas: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, shade: Rgba<u8>) {
    let coverage = shade.0[3] as f32 / 255.0;
    let opaque = Rgba([shade.0[0], shade.0[1], shade.0[2], 255]);
    for y in y0..=y1 {
        for x in x0..=x1 {
            blend_pixel(canvas, x, y, opaque, coverage);
        }
    }
}

/// Colle une image (avec son canal alpha) en (x, y)
pub fn paste(canvas: &mut RgbaImage, image: &RgbaImage, x: i64, y: i64) {
    imageops::overlay(canvas, image, x, y);
}
