//! Still-frame export: lossless transparent PNG of the current surface.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokenforge_common::error::{TokenForgeError, TokenForgeResult};
use tokenforge_render_engine::RenderSurface;

use crate::lock::ExportLock;

/// Encode the current surface contents as a PNG and write it to the
/// output directory with a timestamp-based filename.
///
/// A missing surface reference is a silent no-op (`Ok(None)`), not an
/// error. A busy export lock is surfaced to the caller.
pub fn export_still(
    surface: Option<&Arc<Mutex<RenderSurface>>>,
    lock: &ExportLock,
    output_dir: &Path,
) -> TokenForgeResult<Option<PathBuf>> {
    let _guard = lock
        .try_acquire()
        .ok_or_else(|| TokenForgeError::export("Another export is in progress"))?;

    let Some(surface) = surface else {
        tracing::debug!("Still export skipped: no render surface");
        return Ok(None);
    };

    let snapshot = surface.lock().expect("render surface poisoned").snapshot();

    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("token-{}.png", chrono::Utc::now().timestamp()));
    snapshot
        .save_with_format(&path, image::ImageFormat::Png)
        .map_err(|e| TokenForgeError::export(format!("Failed to encode still: {e}")))?;

    tracing::info!(path = %path.display(), "Still export complete");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn temp_output_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tokenforge-still-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn surface_handle() -> Arc<Mutex<RenderSurface>> {
        let mut surface = RenderSurface::new(8);
        surface.blend_pixel(4, 4, Rgba([255, 0, 0, 255]));
        Arc::new(Mutex::new(surface))
    }

    #[test]
    fn test_still_export_writes_decodable_png() {
        let dir = temp_output_dir("ok");
        let lock = ExportLock::new();
        let surface = surface_handle();

        let path = export_still(Some(&surface), &lock, &dir)
            .expect("export")
            .expect("path");

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("token-"));
        assert!(name.ends_with(".png"));

        let decoded = image::open(&path).expect("decodable png").to_rgba8();
        assert_eq!(decoded.width(), 8);
        assert_eq!(*decoded.get_pixel(4, 4), Rgba([255, 0, 0, 255]));
        // untouched pixels keep zero alpha
        assert_eq!(decoded.get_pixel(0, 0).0[3], 0);

        // lock released after completion
        assert!(!lock.is_busy());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_surface_is_silent_noop() {
        let dir = temp_output_dir("noop");
        let lock = ExportLock::new();
        let result = export_still(None, &lock, &dir).expect("export");
        assert!(result.is_none());
        assert!(!lock.is_busy());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_busy_lock_is_surfaced() {
        let dir = temp_output_dir("busy");
        let lock = ExportLock::new();
        let _guard = lock.try_acquire().unwrap();
        let surface = surface_handle();
        assert!(export_still(Some(&surface), &lock, &dir).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
