//! Show media information.

use std::path::PathBuf;

use tokenforge_export_engine::ffmpeg;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    if !path.exists() {
        return Err(anyhow::anyhow!("No such file: {}", path.display()));
    }

    println!("Media: {}", path.display());

    if super::is_still_path(&path) {
        let image = image::open(&path)
            .map_err(|e| anyhow::anyhow!("Failed to decode {}: {e}", path.display()))?;
        println!("  Kind: still");
        println!("  Dimensions: {}x{}", image.width(), image.height());
        return Ok(());
    }

    println!("  Kind: motion");
    match ffmpeg::probe_video_dimensions(&path) {
        Some((w, h)) => println!("  Dimensions: {w}x{h}"),
        None => println!("  Dimensions: unknown"),
    }
    match ffmpeg::probe_video_duration(&path) {
        Some(duration) => println!("  Duration: {duration:.2}s"),
        None => println!("  Duration: unknown (default clip length applies on export)"),
    }

    Ok(())
}
