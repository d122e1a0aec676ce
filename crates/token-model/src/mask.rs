//! Clip-mask geometry for the background layer.

use crate::settings::TokenSettings;

/// The region the background layer is clipped to while drawing.
///
/// Derived purely from the token settings; no clamping is performed
/// here, so an out-of-range mask scale yields an oversized or
/// undersized region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaskRegion {
    /// Centered circle.
    Circle { cx: f64, cy: f64, radius: f64 },
    /// Centered square.
    Square { x: f64, y: f64, side: f64 },
}

impl MaskRegion {
    /// Derive the mask region from the session settings.
    pub fn from_settings(settings: &TokenSettings) -> Self {
        let canvas = settings.canvas_size as f64;
        if settings.is_circular {
            MaskRegion::Circle {
                cx: canvas / 2.0,
                cy: canvas / 2.0,
                radius: (canvas / 2.0) * settings.mask_scale,
            }
        } else {
            let side = canvas * settings.mask_scale;
            let offset = (canvas - side) / 2.0;
            MaskRegion::Square {
                x: offset,
                y: offset,
                side,
            }
        }
    }

    /// Per-pixel containment test applied by the compositor.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        match *self {
            MaskRegion::Circle { cx, cy, radius } => {
                let dx = px - cx;
                let dy = py - cy;
                dx * dx + dy * dy <= radius * radius
            }
            MaskRegion::Square { x, y, side } => {
                px >= x && px < x + side && py >= y && py < y + side
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(is_circular: bool, mask_scale: f64) -> TokenSettings {
        TokenSettings {
            canvas_size: 1024,
            is_circular,
            mask_scale,
        }
    }

    #[test]
    fn test_circle_radius() {
        let region = MaskRegion::from_settings(&settings(true, 0.98));
        match region {
            MaskRegion::Circle { cx, cy, radius } => {
                assert!((cx - 512.0).abs() < 1e-9);
                assert!((cy - 512.0).abs() < 1e-9);
                assert!((radius - 501.76).abs() < 1e-9);
            }
            _ => panic!("expected circle"),
        }
    }

    #[test]
    fn test_square_side_and_offset() {
        let region = MaskRegion::from_settings(&settings(false, 0.98));
        match region {
            MaskRegion::Square { x, y, side } => {
                assert!((side - 1003.52).abs() < 1e-9);
                assert!((x - 10.24).abs() < 1e-9);
                assert!((y - 10.24).abs() < 1e-9);
            }
            _ => panic!("expected square"),
        }
    }

    #[test]
    fn test_circle_containment() {
        let region = MaskRegion::from_settings(&settings(true, 0.98));
        assert!(region.contains(512.0, 512.0));
        assert!(region.contains(512.0, 512.0 + 501.0));
        assert!(!region.contains(0.0, 0.0));
        assert!(!region.contains(512.0, 512.0 + 502.0));
    }

    #[test]
    fn test_square_containment() {
        let region = MaskRegion::from_settings(&settings(false, 0.5));
        // side 512, offset 256
        assert!(region.contains(256.0, 256.0));
        assert!(region.contains(500.0, 700.0));
        assert!(!region.contains(255.0, 512.0));
        assert!(!region.contains(768.0, 512.0));
    }

    #[test]
    fn test_out_of_range_scale_is_accepted() {
        let region = MaskRegion::from_settings(&settings(true, 1.5));
        match region {
            MaskRegion::Circle { radius, .. } => assert!((radius - 768.0).abs() < 1e-9),
            _ => panic!("expected circle"),
        }
        // corner of the canvas now falls inside the oversized mask
        assert!(region.contains(10.0, 10.0));
    }
}
