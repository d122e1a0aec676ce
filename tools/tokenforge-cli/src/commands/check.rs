//! Check system capabilities.

use tokenforge_common::config::AppConfig;
use tokenforge_export_engine::ffmpeg::command_exists;

pub fn run() -> anyhow::Result<()> {
    println!("TokenForge System Check");
    println!("{}", "=".repeat(50));

    let have_ffmpeg = command_exists("ffmpeg");
    let have_ffprobe = command_exists("ffprobe");

    if have_ffmpeg {
        println!("[OK] ffmpeg found (animated export available)");
    } else {
        println!("[WARN] ffmpeg not found: animated export is unavailable");
    }
    if have_ffprobe {
        println!("[OK] ffprobe found (motion media probing available)");
    } else {
        println!("[WARN] ffprobe not found: motion media cannot be probed");
    }

    let config = AppConfig::load();
    println!("[OK] Output directory: {}", config.output_dir.display());
    println!(
        "[OK] Defaults: {}px canvas, {} mask, {} fps capture",
        config.token.canvas_size,
        if config.token.is_circular {
            "circular"
        } else {
            "square"
        },
        config.export.capture_fps,
    );

    println!();
    if have_ffmpeg && have_ffprobe {
        println!("All capabilities are available. TokenForge is ready.");
    } else {
        println!("Still export works without ffmpeg; install it for animated capture.");
    }

    Ok(())
}
