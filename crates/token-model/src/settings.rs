//! Session-wide token settings.

use serde::{Deserialize, Serialize};

/// Configuration for the whole composite, shared by every layer.
///
/// The settings are passed by reference into the compositor and the
/// mask calculator each tick rather than read from a global. They are
/// mutated only by explicit user configuration, never by the render
/// or export paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenSettings {
    /// Logical render surface size in pixels (square, fixed per session).
    pub canvas_size: u32,

    /// Circular mask when true, centered square when false.
    pub is_circular: bool,

    /// Mask scale relative to the canvas. Expected in `[0.5, 1.1]`;
    /// values outside simply yield an oversized or undersized mask,
    /// never an error.
    pub mask_scale: f64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            canvas_size: 1024,
            is_circular: true,
            mask_scale: 0.98,
        }
    }
}
