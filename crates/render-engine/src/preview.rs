//! The continuous preview loop.
//!
//! A single task redraws the surface every display refresh for the
//! lifetime of the session. The loop is the only writer of surface
//! pixels; the export engine observes it either by snapshotting the
//! shared surface (still export) or by attaching a frame sink that
//! receives per-tick copies (animated capture).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::RgbaImage;
use tokenforge_common::clock::SessionClock;
use tokenforge_token_model::{LayerId, StateHandle};

use crate::compositor::composite;
use crate::surface::RenderSurface;

/// One sampled frame delivered to an attached sink.
#[derive(Debug)]
pub struct CapturedFrame {
    pub pixels: RgbaImage,
    pub elapsed_secs: f64,
}

/// Sending half of a capture sink channel.
pub type FrameSink = tokio::sync::mpsc::Sender<CapturedFrame>;

/// Shared attachment point for a capture sink.
///
/// The capture session attaches a sender here; the loop picks it up
/// on the next tick and detaches it itself once the receiver is gone.
#[derive(Debug, Clone, Default)]
pub struct SinkSlot(Arc<Mutex<Option<FrameSink>>>);

impl SinkSlot {
    pub fn attach(&self, sink: FrameSink) {
        *self.0.lock().expect("sink slot poisoned") = Some(sink);
    }

    pub fn detach(&self) {
        *self.0.lock().expect("sink slot poisoned") = None;
    }

    pub fn is_attached(&self) -> bool {
        self.0.lock().expect("sink slot poisoned").is_some()
    }

    fn current(&self) -> Option<FrameSink> {
        self.0.lock().expect("sink slot poisoned").clone()
    }
}

/// Counters for loop health logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderStats {
    pub ticks: u64,
    pub frames_sent: u64,
    pub frames_dropped: u64,
}

/// The continuous render loop with an explicit start/cancel lifecycle.
pub struct PreviewLoop {
    state: StateHandle,
    surface: Arc<Mutex<RenderSurface>>,
    sink: SinkSlot,
    stop_flag: Arc<AtomicBool>,
    clock: SessionClock,
    fps: u32,
    stats: RenderStats,
}

impl PreviewLoop {
    pub fn new(state: StateHandle, canvas_size: u32, fps: u32) -> Self {
        Self {
            state,
            surface: Arc::new(Mutex::new(RenderSurface::new(canvas_size))),
            sink: SinkSlot::default(),
            stop_flag: Arc::new(AtomicBool::new(false)),
            clock: SessionClock::start(),
            fps,
            stats: RenderStats::default(),
        }
    }

    /// Shared handle to the surface this loop paints.
    pub fn surface_handle(&self) -> Arc<Mutex<RenderSurface>> {
        Arc::clone(&self.surface)
    }

    /// The capture sink attachment point.
    pub fn sink_slot(&self) -> SinkSlot {
        self.sink.clone()
    }

    /// Handle used to cancel the loop from outside the running task.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            stop_flag: Arc::clone(&self.stop_flag),
        }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Run until cancelled, redrawing once per display refresh.
    pub async fn run(mut self) -> RenderStats {
        tracing::info!(fps = self.fps, "Preview loop started");
        let tick = Duration::from_secs_f64(1.0 / self.fps.max(1) as f64);
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let dt_secs = tick.as_secs_f64();

        while !self.stop_flag.load(Ordering::Relaxed) {
            interval.tick().await;
            self.render_tick(dt_secs);
        }

        tracing::info!(
            ticks = self.stats.ticks,
            frames_sent = self.stats.frames_sent,
            frames_dropped = self.stats.frames_dropped,
            "Preview loop stopped"
        );
        self.stats
    }

    /// Produce one frame: advance motion playheads, composite, and
    /// feed the attached sink if any.
    pub fn render_tick(&mut self, dt_secs: f64) {
        {
            let mut state = self.state.lock().expect("composite state poisoned");
            for id in LayerId::DRAW_ORDER {
                if let Some(media) = state.registry.get_mut(id).media_mut() {
                    if let Some(clip) = media.as_motion_mut() {
                        clip.advance(dt_secs);
                    }
                }
            }

            let mut surface = self.surface.lock().expect("render surface poisoned");
            let settings = state.settings;
            composite(&mut surface, &state.registry, &settings);
        }
        self.stats.ticks += 1;

        if let Some(sink) = self.sink.current() {
            let frame = CapturedFrame {
                pixels: self.surface.lock().expect("render surface poisoned").snapshot(),
                elapsed_secs: self.clock.elapsed_secs(),
            };
            match sink.try_send(frame) {
                Ok(()) => self.stats.frames_sent += 1,
                Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => {
                    // encoder backpressure; drop the sample
                    self.stats.frames_dropped += 1;
                }
                Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => {
                    self.sink.detach();
                }
            }
        }
    }
}

/// Cancels the preview loop exactly once.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    stop_flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request the loop to stop. Only the first call has an effect;
    /// a dangling second cancel is a no-op.
    pub fn cancel(&self) {
        if !self.stop_flag.swap(true, Ordering::SeqCst) {
            tracing::info!("Preview loop cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tokenforge_token_model::{
        shared_state, CompositeState, Media, StillImage, TokenSettings,
    };

    fn state_with_background() -> StateHandle {
        let state = shared_state(CompositeState::new(TokenSettings {
            canvas_size: 32,
            is_circular: false,
            mask_scale: 1.0,
        }));
        state.lock().unwrap().registry.assign(
            LayerId::Background,
            Media::Still(StillImage::decoded(RgbaImage::from_pixel(
                16,
                16,
                Rgba([5, 5, 5, 255]),
            ))),
            None,
        );
        state
    }

    #[test]
    fn test_render_tick_paints_surface() {
        let mut preview = PreviewLoop::new(state_with_background(), 32, 60);
        preview.render_tick(1.0 / 60.0);
        let surface = preview.surface_handle();
        let surface = surface.lock().unwrap();
        assert_eq!(surface.pixel(16, 16), Rgba([5, 5, 5, 255]));
    }

    #[test]
    fn test_sink_receives_frame_copies() {
        let mut preview = PreviewLoop::new(state_with_background(), 32, 60);
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        preview.sink_slot().attach(tx);

        preview.render_tick(1.0 / 60.0);
        preview.render_tick(1.0 / 60.0);

        let first = rx.try_recv().expect("first frame");
        assert_eq!(first.pixels.width(), 32);
        assert!(rx.try_recv().is_ok());
        assert_eq!(preview.stats().frames_sent, 2);
    }

    #[test]
    fn test_closed_sink_detaches() {
        let mut preview = PreviewLoop::new(state_with_background(), 32, 60);
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        preview.sink_slot().attach(tx);
        drop(rx);

        preview.render_tick(1.0 / 60.0);
        assert!(!preview.sink_slot().is_attached());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let preview = PreviewLoop::new(state_with_background(), 32, 60);
        let cancel = preview.cancel_handle();
        assert!(!cancel.is_cancelled());
        cancel.cancel();
        cancel.cancel();
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_stops_after_cancel() {
        let preview = PreviewLoop::new(state_with_background(), 32, 240);
        let cancel = preview.cancel_handle();
        let task = tokio::spawn(preview.run());
        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();
        let stats = task.await.expect("loop task");
        assert!(stats.ticks > 0);
    }
}
