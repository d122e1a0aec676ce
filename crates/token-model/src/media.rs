//! Decoded media handles bound to layers.
//!
//! The still-vs-motion distinction is a tagged variant with a shared
//! capability surface (`is_ready`, `natural_width`, `natural_height`,
//! `frame`) so the compositor never inspects the concrete type at the
//! call site. The core never parses container bytes itself; it is
//! handed already-decoded frames.

use image::RgbaImage;
use std::path::PathBuf;

/// Media kind tag for a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Still,
    Motion,
}

/// A still image layer source.
///
/// `pending()` models a decode still in flight: the compositor skips
/// the layer until the pixels arrive, retrying on the next tick.
#[derive(Debug, Clone)]
pub struct StillImage {
    pixels: Option<RgbaImage>,
}

impl StillImage {
    /// A fully decoded still.
    pub fn decoded(pixels: RgbaImage) -> Self {
        Self {
            pixels: Some(pixels),
        }
    }

    /// A still whose decode has not completed yet.
    pub fn pending() -> Self {
        Self { pixels: None }
    }

    /// Complete a pending decode.
    pub fn complete(&mut self, pixels: RgbaImage) {
        self.pixels = Some(pixels);
    }

    pub fn is_ready(&self) -> bool {
        self.pixels.is_some()
    }

    pub fn pixels(&self) -> Option<&RgbaImage> {
        self.pixels.as_ref()
    }
}

/// A motion clip layer source: decoded frames plus a looping playhead.
///
/// Ready only once enough frames are buffered to report natural
/// dimensions. The reported duration may exceed the buffered frame
/// span (streaming decode); playback loops over whatever is buffered.
#[derive(Debug, Clone)]
pub struct MotionClip {
    frames: Vec<RgbaImage>,
    fps: f64,
    duration_secs: f64,
    playhead_secs: f64,
}

impl MotionClip {
    /// A clip whose duration is derived from the buffered frames.
    pub fn new(frames: Vec<RgbaImage>, fps: f64) -> Self {
        let duration_secs = if fps > 0.0 {
            frames.len() as f64 / fps
        } else {
            0.0
        };
        Self::with_duration(frames, fps, duration_secs)
    }

    /// A clip with an explicitly reported source duration.
    pub fn with_duration(frames: Vec<RgbaImage>, fps: f64, duration_secs: f64) -> Self {
        Self {
            frames,
            fps,
            duration_secs,
            playhead_secs: 0.0,
        }
    }

    /// A clip still buffering: no frames decoded yet.
    pub fn pending() -> Self {
        Self {
            frames: Vec::new(),
            fps: 0.0,
            duration_secs: 0.0,
            playhead_secs: 0.0,
        }
    }

    pub fn is_ready(&self) -> bool {
        !self.frames.is_empty() && self.fps > 0.0
    }

    /// Source duration in seconds as reported by the decoder.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Current playhead position in seconds.
    pub fn playhead_secs(&self) -> f64 {
        self.playhead_secs
    }

    /// Reset the playhead to the start of the clip.
    pub fn rewind(&mut self) {
        self.playhead_secs = 0.0;
    }

    /// Advance the playhead, looping at the end of the buffered span.
    pub fn advance(&mut self, dt_secs: f64) {
        if !self.is_ready() {
            return;
        }
        let span = self.frames.len() as f64 / self.fps;
        self.playhead_secs = (self.playhead_secs + dt_secs) % span.max(f64::EPSILON);
    }

    /// The frame under the playhead.
    pub fn current_frame(&self) -> Option<&RgbaImage> {
        if !self.is_ready() {
            return None;
        }
        let index = (self.playhead_secs * self.fps) as usize;
        self.frames.get(index.min(self.frames.len() - 1))
    }
}

/// A layer's media: still image or motion clip.
#[derive(Debug, Clone)]
pub enum Media {
    Still(StillImage),
    Motion(MotionClip),
}

impl Media {
    pub fn kind(&self) -> MediaKind {
        match self {
            Media::Still(_) => MediaKind::Still,
            Media::Motion(_) => MediaKind::Motion,
        }
    }

    /// Whether the media can be drawn this tick. A false result is a
    /// defensive no-op for the compositor, not an error.
    pub fn is_ready(&self) -> bool {
        match self {
            Media::Still(still) => still.is_ready(),
            Media::Motion(clip) => clip.is_ready(),
        }
    }

    pub fn natural_width(&self) -> u32 {
        self.frame().map(|f| f.width()).unwrap_or(0)
    }

    pub fn natural_height(&self) -> u32 {
        self.frame().map(|f| f.height()).unwrap_or(0)
    }

    /// The pixels to draw this tick: the still image, or the motion
    /// frame under the playhead.
    pub fn frame(&self) -> Option<&RgbaImage> {
        match self {
            Media::Still(still) => still.pixels(),
            Media::Motion(clip) => clip.current_frame(),
        }
    }

    pub fn as_motion(&self) -> Option<&MotionClip> {
        match self {
            Media::Motion(clip) => Some(clip),
            Media::Still(_) => None,
        }
    }

    pub fn as_motion_mut(&mut self) -> Option<&mut MotionClip> {
        match self {
            Media::Motion(clip) => Some(clip),
            Media::Still(_) => None,
        }
    }
}

/// A transient backing resource for assigned media (e.g. a scratch
/// file materialized during upload).
///
/// Ownership is an explicit flag set at assignment time, never
/// inferred from the path's encoding: resources served from a durable
/// cache are externally owned and must not be released by the
/// registry.
#[derive(Debug)]
pub struct ScratchResource {
    path: PathBuf,
    owned: bool,
    released: bool,
}

impl ScratchResource {
    /// A resource the registry owns and must release on replacement.
    pub fn owned(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: true,
            released: false,
        }
    }

    /// A resource owned elsewhere (durable cache, user file); the
    /// registry never releases it.
    pub fn external(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
            released: false,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Release the backing resource. Best-effort and idempotent-safe:
    /// only owned, not-yet-released resources are touched, and
    /// failures are logged rather than propagated. Returns whether a
    /// release actually happened.
    pub fn release(&mut self) -> bool {
        if !self.owned || self.released {
            return false;
        }
        self.released = true;
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "Scratch resource cleanup failed");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn frame(w: u32, h: u32) -> RgbaImage {
        RgbaImage::new(w, h)
    }

    #[test]
    fn test_pending_still_is_not_ready() {
        let mut still = StillImage::pending();
        assert!(!still.is_ready());
        still.complete(frame(4, 4));
        assert!(still.is_ready());
    }

    #[test]
    fn test_media_dimensions() {
        let media = Media::Still(StillImage::decoded(frame(640, 480)));
        assert!(media.is_ready());
        assert_eq!(media.natural_width(), 640);
        assert_eq!(media.natural_height(), 480);
    }

    #[test]
    fn test_pending_clip_reports_zero_dimensions() {
        let media = Media::Motion(MotionClip::pending());
        assert!(!media.is_ready());
        assert_eq!(media.natural_width(), 0);
        assert_eq!(media.natural_height(), 0);
    }

    #[test]
    fn test_playhead_advance_and_loop() {
        let frames = vec![frame(2, 2), frame(2, 2), frame(2, 2)];
        let mut clip = MotionClip::new(frames, 1.0); // 3 second span
        clip.advance(1.5);
        assert_eq!(
            clip.current_frame().map(|f| f.width()),
            Some(2),
        );
        clip.advance(2.0); // 3.5 wraps to 0.5
        let index = (0.5 * 1.0) as usize;
        assert_eq!(index, 0);
        clip.rewind();
        clip.advance(0.0);
        assert!(clip.current_frame().is_some());
    }

    #[test]
    fn test_reported_duration_can_exceed_buffered_span() {
        let clip = MotionClip::with_duration(vec![frame(2, 2)], 30.0, 7.0);
        assert!((clip.duration_secs() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_scratch_release_is_idempotent() {
        let mut res = ScratchResource::owned("/nonexistent/tokenforge-test-scratch");
        assert!(res.release());
        assert!(!res.release());
        assert!(res.is_released());
    }

    #[test]
    fn test_external_resource_never_releases() {
        let mut res = ScratchResource::external("/nonexistent/cached-border");
        assert!(!res.release());
        assert!(!res.is_released());
    }
}
