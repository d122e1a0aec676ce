//! Composite layers and export a still PNG.

use std::path::PathBuf;

use tokenforge_common::config::AppConfig;
use tokenforge_export_engine::{export_still, ExportLock};
use tokenforge_render_engine::PreviewLoop;
use tokenforge_token_model::shared_state;

#[allow(clippy::too_many_arguments)]
pub fn run(
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
    println!("Composing {0}x{0} token", args.size);

    let state = super::build_state(background, frame, overlay, &args, &transforms)?;
    let state = shared_state(state);

    // One tick is enough for a still: paint the surface, then snapshot.
    let mut preview = PreviewLoop::new(state, args.size, 60);
    preview.render_tick(0.0);

    let surface = preview.surface_handle();
    let lock = ExportLock::new();
    let path = export_still(Some(&surface), &lock, &args.output)
        .map_err(|e| anyhow::anyhow!("Still export failed: {e}"))?
        .ok_or_else(|| anyhow::anyhow!("Still export produced no output"))?;

    println!("Still export complete: {}", path.display());
    Ok(())
}
