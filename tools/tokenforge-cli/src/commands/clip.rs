//! Composite layers and capture an animated WebM.

use std::path::PathBuf;

use tokenforge_common::config::AppConfig;
use tokenforge_export_engine::{CaptureSession, ExportLock};
use tokenforge_render_engine::PreviewLoop;
use tokenforge_token_model::shared_state;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    background: Option<PathBuf>,
    frame: Option<PathBuf>,
    overlay: Option<PathBuf>,
    output: Option<PathBuf>,
    size: Option<u32>,
    square: bool,
    mask_scale: Option<f64>,
    transforms: Vec<String>,
) -> anyhow::Result<()> {
    let config = AppConfig::load();
    let args = super::resolve_args(&config, output, size, square, mask_scale);
    println!("Capturing {0}x{0} animated token", args.size);

    let state = super::build_state(background, frame, overlay, &args, &transforms)?;
    let state = shared_state(state);

    let preview = PreviewLoop::new(
        state.clone(),
        args.size,
        tokenforge_export_engine::CAPTURE_FPS,
    );
    let slot = preview.sink_slot();
    let cancel = preview.cancel_handle();
    let loop_task = tokio::spawn(preview.run());

    let lock = ExportLock::new();
    let mut session = CaptureSession::new(args.output, args.size);
    session
        .start(&state, &slot, &lock)
        .map_err(|e| anyhow::anyhow!("Capture failed to start: {e}"))?;

    println!("  Duration: {:.1}s", session.duration_secs());

    let result = session.finish().await;

    cancel.cancel();
    let stats = loop_task.await?;
    tracing::debug!(
        ticks = stats.ticks,
        frames_sent = stats.frames_sent,
        frames_dropped = stats.frames_dropped,
        "Preview loop finished"
    );

    match result {
        Ok(Some(path)) => {
            println!("Animated export complete: {}", path.display());
            Ok(())
        }
        Ok(None) => Err(anyhow::anyhow!("Capture finished without an output file")),
        Err(e) => Err(anyhow::anyhow!("Capture failed: {e}")),
    }
}
