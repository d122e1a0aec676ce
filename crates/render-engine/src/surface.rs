//! The fixed-size render surface.

use image::{Rgba, RgbaImage};

/// A square RGBA pixel surface that is the single source of truth for
/// both the live preview and every export path. Its dimensions never
/// change during a session.
#[derive(Debug)]
pub struct RenderSurface {
    pixels: RgbaImage,
    size: u32,
}

impl RenderSurface {
    pub fn new(size: u32) -> Self {
        Self {
            pixels: RgbaImage::new(size, size),
            size,
        }
    }

    /// Logical size in pixels (width == height).
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    /// Source-over blend of `src` onto the pixel at `(x, y)`.
    pub fn blend_pixel(&mut self, x: u32, y: u32, src: Rgba<u8>) {
        let dst = self.pixels.get_pixel_mut(x, y);
        *dst = blend_over(src, *dst);
    }

    /// Copy of the current frame, used by exports and frame sinks.
    pub fn snapshot(&self) -> RgbaImage {
        self.pixels.clone()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Standard source-over alpha compositing in 8-bit space.
fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src.0[3] as u32;
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let da = dst.0[3] as u32;
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let sc = src.0[c] as u32;
        let dc = dst.0[c] as u32;
        // premultiply-free source-over, normalized by the output alpha
        out[c] = ((sc * sa + dc * da * (255 - sa) / 255) / out_a) as u8;
    }
    out[3] = out_a as u8;
    Rgba(out)
}
