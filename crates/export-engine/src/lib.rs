//! TokenForge Export Engine
//!
//! Two independent export paths sharing the render surface as their
//! data source:
//!
//! - **Still export**: snapshot the current surface and encode it as a
//!   lossless transparent PNG.
//! - **Animated export**: attach a frame sink to the live preview
//!   loop, feed sampled frames through an ffmpeg VP9/WebM encoder,
//!   accumulate encoded chunks, and finalize a single container file
//!   when the deadline fires.
//!
//! Both paths run under a global export lock that also gates the input
//! controller, so layer transforms cannot change mid-capture.

pub mod ffmpeg;
pub mod lock;
pub mod session;
pub mod still;

pub use lock::{ExportGuard, ExportLock};
pub use session::{
    capped_clip_duration, infer_clip_duration, CaptureSession, CaptureState, CAPTURE_FPS,
    DEFAULT_CLIP_SECS, MAX_CLIP_SECS,
};
pub use still::export_still;
