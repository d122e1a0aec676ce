//! Per-layer pan/zoom transform state.
//!
//! Offsets are in canvas pixel units (pre display scaling) and are
//! unbounded; only the scale is clamped.

use serde::{Deserialize, Serialize};

/// Lower clamp for the layer scale.
pub const MIN_SCALE: f64 = 0.01;
/// Upper clamp for the layer scale.
pub const MAX_SCALE: f64 = 20.0;

/// Pan/zoom state applied when drawing a layer onto the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Zoom factor, clamped to `[MIN_SCALE, MAX_SCALE]`.
    pub scale: f64,
    /// Horizontal displacement in canvas pixels.
    pub offset_x: f64,
    /// Vertical displacement in canvas pixels.
    pub offset_y: f64,
}

impl Transform {
    /// The identity transform every layer starts from.
    pub const IDENTITY: Transform = Transform {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// Add the deltas to the offsets unconditionally.
    ///
    /// Inputs are unchecked for NaN/Infinity; that is the caller's
    /// responsibility.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Adjust the scale by `delta`, clamping to the valid range.
    pub fn zoom(&mut self, delta: f64) {
        self.scale = (self.scale + delta).clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Whether this transform is the identity.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identity() {
        let t = Transform::default();
        assert!(t.is_identity());
        assert_eq!(t.scale, 1.0);
    }

    #[test]
    fn test_pan_accumulates() {
        let mut t = Transform::IDENTITY;
        t.pan(10.0, -4.0);
        t.pan(2.5, 1.0);
        assert!((t.offset_x - 12.5).abs() < 1e-9);
        assert!((t.offset_y - -3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamps_at_bounds() {
        let mut t = Transform::IDENTITY;
        t.zoom(100.0);
        assert_eq!(t.scale, MAX_SCALE);
        t.zoom(5.0);
        assert_eq!(t.scale, MAX_SCALE);
        t.zoom(-100.0);
        assert_eq!(t.scale, MIN_SCALE);
        t.zoom(-1.0);
        assert_eq!(t.scale, MIN_SCALE);
    }

    proptest! {
        #[test]
        fn prop_zoom_never_escapes_bounds(deltas in proptest::collection::vec(-50.0f64..50.0, 0..64)) {
            let mut t = Transform::IDENTITY;
            for d in deltas {
                t.zoom(d);
                prop_assert!(t.scale >= MIN_SCALE);
                prop_assert!(t.scale <= MAX_SCALE);
            }
        }

        #[test]
        fn prop_pan_is_additive(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let mut t = Transform::IDENTITY;
            t.pan(a, b);
            t.pan(-a, -b);
            prop_assert!(t.offset_x.abs() < 1e-6);
            prop_assert!(t.offset_y.abs() < 1e-6);
        }
    }
}
