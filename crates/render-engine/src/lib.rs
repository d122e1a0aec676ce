//! TokenForge Render Engine
//!
//! Continuous compositing of the three token layers onto a fixed-size
//! RGBA surface.
//!
//! # Architecture
//!
//! ```text
//! CompositeState (registry + settings) ──┐
//!                                        ├── composite() per tick
//! RenderSurface (1024x1024 RGBA) ────────┘         │
//!                                                  ├── preview (surface handle)
//!                                                  └── frame sink (capture sampling)
//! ```
//!
//! The preview loop is the only writer of surface pixels. Attached
//! sinks receive per-tick frame copies, so the export engine can
//! sample the live composite without racing the renderer.

pub mod compositor;
pub mod preview;
pub mod surface;

pub use compositor::composite;
pub use preview::{CancelHandle, CapturedFrame, FrameSink, PreviewLoop, RenderStats, SinkSlot};
pub use surface::RenderSurface;
