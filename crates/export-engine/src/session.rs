//! Animated capture sessions.
//!
//! A session attaches a frame sink to the live preview loop, streams
//! sampled frames into an ffmpeg encoder, buffers the encoded chunks
//! as they arrive, and finalizes one WebM container when the deadline
//! fires. Stopping an already-stopped session is always a no-op.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use tokenforge_common::clock::SessionClock;
use tokenforge_common::error::{TokenForgeError, TokenForgeResult};
use tokenforge_render_engine::{CapturedFrame, SinkSlot};
use tokenforge_token_model::{LayerId, LayerRegistry, StateHandle};

use crate::ffmpeg;
use crate::lock::{ExportGuard, ExportLock};

/// Clip duration when no motion media supplies one (seconds).
pub const DEFAULT_CLIP_SECS: f64 = 5.0;
/// Hard cap on clip duration, bounding output size (seconds).
pub const MAX_CLIP_SECS: f64 = 15.0;
/// Surface sample rate during capture.
pub const CAPTURE_FPS: u32 = 60;

/// Determine the clip duration from whichever layer holds motion
/// media, checking background first, then frame, in that fixed
/// priority order. The first motion layer found decides: if its
/// reported duration is unusable the default applies, and the other
/// layer is never consulted.
pub fn infer_clip_duration(registry: &LayerRegistry) -> f64 {
    let clip = [LayerId::Background, LayerId::Frame]
        .into_iter()
        .find_map(|id| registry.get(id).media().and_then(|m| m.as_motion()));
    match clip {
        Some(clip) => {
            let duration = clip.duration_secs();
            if duration.is_finite() && duration > 0.0 {
                duration
            } else {
                DEFAULT_CLIP_SECS
            }
        }
        None => DEFAULT_CLIP_SECS,
    }
}

/// The inferred duration with the output-size cap applied.
pub fn capped_clip_duration(registry: &LayerRegistry) -> f64 {
    infer_clip_duration(registry).min(MAX_CLIP_SECS)
}

/// Rewind the motion layers consulted for duration inference so the
/// capture starts from the top of the source media.
pub fn rewind_motion_layers(registry: &mut LayerRegistry) {
    for id in [LayerId::Background, LayerId::Frame] {
        if let Some(clip) = registry
            .get_mut(id)
            .media_mut()
            .and_then(|m| m.as_motion_mut())
        {
            clip.rewind();
        }
    }
}

/// State of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Session created but not started.
    Idle,
    /// Sampling and encoding in progress.
    Recording,
    /// Capture finalized, output written.
    Stopped,
    /// The encoder failed.
    Failed,
}

/// A time-bounded capture of the live render surface.
pub struct CaptureSession {
    output_dir: PathBuf,
    canvas_size: u32,
    state: CaptureState,
    duration_secs: f64,
    clock: Option<SessionClock>,
    guard: Option<ExportGuard>,
    sink_slot: Option<SinkSlot>,
    child: Option<Child>,
    feed_thread: Option<JoinHandle<u64>>,
    chunk_thread: Option<JoinHandle<Vec<Vec<u8>>>>,
    stderr_thread: Option<JoinHandle<String>>,
}

impl CaptureSession {
    pub fn new(output_dir: impl Into<PathBuf>, canvas_size: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            canvas_size,
            state: CaptureState::Idle,
            duration_secs: 0.0,
            clock: None,
            guard: None,
            sink_slot: None,
            child: None,
            feed_thread: None,
            chunk_thread: None,
            stderr_thread: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// The capped target duration, valid once recording has started.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Start capturing.
    ///
    /// Acquires the export lock, infers and caps the clip duration,
    /// rewinds motion layers, spawns the encoder, and attaches the
    /// frame sink to the preview loop.
    pub fn start(
        &mut self,
        state: &StateHandle,
        slot: &SinkSlot,
        lock: &ExportLock,
    ) -> TokenForgeResult<()> {
        if self.state != CaptureState::Idle {
            return Err(TokenForgeError::export("Capture session already started"));
        }
        if !ffmpeg::command_exists("ffmpeg") {
            return Err(TokenForgeError::unsupported(
                "No supported encoder found (expected ffmpeg in PATH)",
            ));
        }

        let guard = lock
            .try_acquire()
            .ok_or_else(|| TokenForgeError::export("Another export is in progress"))?;

        let duration_secs = {
            let mut st = state.lock().expect("composite state poisoned");
            let duration = capped_clip_duration(&st.registry);
            rewind_motion_layers(&mut st.registry);
            duration
        };

        let mut child = Command::new("ffmpeg")
            .args(ffmpeg::encode_args(self.canvas_size, CAPTURE_FPS))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TokenForgeError::export(format!("Failed to start encoder: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TokenForgeError::export("Failed to open encoder stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TokenForgeError::export("Failed to open encoder stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TokenForgeError::export("Failed to open encoder stderr"))?;

        // Drain stderr concurrently so the encoder cannot block on a
        // full pipe.
        let stderr_thread = std::thread::spawn(move || -> String {
            let mut output = String::new();
            let mut stderr = stderr;
            match stderr.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read encoder stderr: {err}>"),
            }
        });

        // Buffer encoded chunks as the encoder emits them.
        let chunk_thread = std::thread::spawn(move || -> Vec<Vec<u8>> {
            let mut stdout = stdout;
            let mut chunks = Vec::new();
            let mut buf = [0u8; 64 * 1024];
            loop {
                match stdout.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => chunks.push(buf[..n].to_vec()),
                    Err(_) => break,
                }
            }
            chunks
        });

        // Feed sampled frames to the encoder until the sink detaches.
        let (tx, mut rx) = tokio::sync::mpsc::channel::<CapturedFrame>(CAPTURE_FPS as usize * 2);
        let feed_thread = std::thread::spawn(move || -> u64 {
            let mut frames_written = 0u64;
            while let Some(frame) = rx.blocking_recv() {
                if stdin.write_all(frame.pixels.as_raw()).is_err() {
                    break;
                }
                frames_written += 1;
            }
            // stdin drops here, closing the pipe and finalizing the
            // encoder output
            frames_written
        });

        slot.attach(tx);

        self.duration_secs = duration_secs;
        self.clock = Some(SessionClock::start());
        self.guard = Some(guard);
        self.sink_slot = Some(slot.clone());
        self.child = Some(child);
        self.feed_thread = Some(feed_thread);
        self.chunk_thread = Some(chunk_thread);
        self.stderr_thread = Some(stderr_thread);
        self.state = CaptureState::Recording;

        tracing::info!(
            duration_secs = self.duration_secs,
            fps = CAPTURE_FPS,
            "Capture session started"
        );
        Ok(())
    }

    /// Sleep until the capture deadline, then stop and finalize.
    ///
    /// The deadline timer is the sole automatic stop mechanism: the
    /// session ends after `min(duration, cap)` elapsed, or earlier if
    /// `stop` was called explicitly (in which case the deadline's stop
    /// is skipped).
    pub async fn finish(&mut self) -> TokenForgeResult<Option<PathBuf>> {
        if self.state != CaptureState::Recording {
            return Ok(None);
        }

        let elapsed = self.clock.as_ref().map(|c| c.elapsed_secs()).unwrap_or(0.0);
        let remaining = (self.duration_secs - elapsed).max(0.0);
        tokio::time::sleep(Duration::from_secs_f64(remaining)).await;

        if self.state != CaptureState::Recording {
            // stopped while we slept
            return Ok(None);
        }
        self.stop()
    }

    /// Stop capturing and finalize the container file.
    ///
    /// Stopping a session that is not recording is a no-op, never an
    /// error. On success the accumulated chunks are concatenated into
    /// one file and the export lock is released.
    pub fn stop(&mut self) -> TokenForgeResult<Option<PathBuf>> {
        if self.state != CaptureState::Recording {
            return Ok(None);
        }

        tracing::info!("Stopping capture session");
        if let Some(slot) = self.sink_slot.take() {
            slot.detach();
        }

        let frames_sampled = match self.feed_thread.take() {
            Some(handle) => handle.join().unwrap_or(0),
            None => 0,
        };

        let status = match self.child.take() {
            Some(mut child) => child
                .wait()
                .map_err(|e| self.fail(format!("Failed to wait on encoder: {e}")))?,
            None => return Err(self.fail("Capture session lost its encoder process")),
        };

        let chunks = match self.chunk_thread.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => Vec::new(),
        };
        let stderr_output = match self.stderr_thread.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| "<failed to join stderr reader>".to_string()),
            None => String::new(),
        };

        if !status.success() {
            return Err(self.fail(format!(
                "Encoder failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        let data = concat_chunks(&chunks);
        if data.is_empty() {
            return Err(self.fail("Capture produced no encoded output"));
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("token-animated-{}.webm", chrono::Utc::now().timestamp()));
        std::fs::write(&path, &data)?;

        let elapsed = self.clock.as_ref().map(|c| c.elapsed_secs()).unwrap_or(0.0);
        self.write_capture_report(&path, frames_sampled, chunks.len(), data.len(), elapsed);

        self.state = CaptureState::Stopped;
        self.guard.take(); // export lock released

        tracing::info!(
            path = %path.display(),
            frames_sampled,
            bytes = data.len(),
            elapsed_secs = elapsed,
            "Capture session finalized"
        );
        Ok(Some(path))
    }

    fn fail(&mut self, message: impl Into<String>) -> TokenForgeError {
        self.state = CaptureState::Failed;
        self.guard.take();
        TokenForgeError::export(message)
    }

    fn write_capture_report(
        &self,
        output: &Path,
        frames_sampled: u64,
        chunk_count: usize,
        bytes: usize,
        elapsed_secs: f64,
    ) {
        let report_path = output.with_extension("capture.json");
        let report = serde_json::json!({
            "output": output,
            "started_at": self.clock.as_ref().map(SessionClock::epoch_wall),
            "target_duration_secs": self.duration_secs,
            "elapsed_secs": elapsed_secs,
            "frames_sampled": frames_sampled,
            "chunks": chunk_count,
            "bytes": bytes,
            "fps": CAPTURE_FPS,
        });
        match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&report_path, json) {
                    tracing::warn!(error = %e, "Failed to write capture report");
                } else {
                    tracing::info!(report = %report_path.display(), "Wrote capture report");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize capture report"),
        }
    }
}

/// Concatenate buffered encoder chunks into one container payload.
pub fn concat_chunks(chunks: &[Vec<u8>]) -> Vec<u8> {
    let total = chunks.iter().map(Vec::len).sum();
    let mut data = Vec::with_capacity(total);
    for chunk in chunks {
        data.extend_from_slice(chunk);
    }
    data
}
