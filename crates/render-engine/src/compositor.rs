//! Per-tick layer compositing.
//!
//! Layers are drawn in fixed order (background, frame, overlay) with
//! the clip mask applied to the background only, so a frame with
//! internal transparency can visually surround the cut background.

use tokenforge_token_model::{Layer, LayerId, LayerRegistry, MaskRegion, TokenSettings};

use crate::surface::RenderSurface;

/// Composite every layer onto the surface for one tick.
///
/// The mask region is re-derived from the settings each call so a
/// settings change takes effect on the next tick.
pub fn composite(surface: &mut RenderSurface, registry: &LayerRegistry, settings: &TokenSettings) {
    surface.clear();
    let mask = MaskRegion::from_settings(settings);

    for id in LayerId::DRAW_ORDER {
        let clip = if id == LayerId::Background {
            Some(&mask)
        } else {
            None
        };
        draw_layer(surface, registry.get(id), settings, clip);
    }
}

/// Draw one layer onto the surface.
///
/// Skips silently when the layer is empty, the media is not ready, or
/// its dimensions are zero; the next tick retries. The clip is scoped
/// to this single draw, so early skips cannot leak it into later
/// layers.
fn draw_layer(
    surface: &mut RenderSurface,
    layer: &Layer,
    settings: &TokenSettings,
    clip: Option<&MaskRegion>,
) {
    let Some(media) = layer.media() else {
        return;
    };
    if !media.is_ready() {
        return;
    }

    let natural_w = media.natural_width();
    let natural_h = media.natural_height();
    if natural_w == 0 || natural_h == 0 {
        return;
    }
    let Some(frame) = media.frame() else {
        return;
    };

    let canvas = settings.canvas_size as f64;
    let transform = layer.transform();
    let aspect = natural_w as f64 / natural_h as f64;

    // Width-fit normalization: width always fills the canvas at
    // scale = 1, height derives from the aspect ratio.
    let draw_w = canvas * transform.scale;
    let draw_h = (canvas / aspect) * transform.scale;
    let origin_x = (canvas - draw_w) / 2.0 + transform.offset_x;
    let origin_y = (canvas - draw_h) / 2.0 + transform.offset_y;

    // Destination bounds clamped to the surface.
    let x0 = origin_x.max(0.0).floor() as u32;
    let y0 = origin_y.max(0.0).floor() as u32;
    let x1 = (origin_x + draw_w).min(canvas).ceil() as u32;
    let y1 = (origin_y + draw_h).min(canvas).ceil() as u32;
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for dy in y0..y1 {
        for dx in x0..x1 {
            let px = dx as f64 + 0.5;
            let py = dy as f64 + 0.5;
            if let Some(mask) = clip {
                if !mask.contains(px, py) {
                    continue;
                }
            }

            // Nearest-neighbor sample from the source frame.
            let u = (px - origin_x) / draw_w * natural_w as f64;
            let v = (py - origin_y) / draw_h * natural_h as f64;
            if u < 0.0 || v < 0.0 {
                continue;
            }
            let sx = (u as u32).min(natural_w - 1);
            let sy = (v as u32).min(natural_h - 1);
            surface.blend_pixel(dx, dy, *frame.get_pixel(sx, sy));
        }
    }
}
