//! ffmpeg/ffprobe subprocess plumbing.
//!
//! The engine shells out for everything codec-related: probing clip
//! dimensions and duration, decoding clips into RGBA frames for the
//! compositor, and encoding sampled frames into a WebM container.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

use image::RgbaImage;
use tokenforge_common::error::{TokenForgeError, TokenForgeResult};
use tokenforge_token_model::MotionClip;

/// Check whether a binary is resolvable on PATH.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Encoder arguments: raw RGBA frames on stdin, VP9/WebM with alpha
/// streamed to stdout so the session can buffer chunks as they arrive.
pub fn encode_args(canvas_size: u32, fps: u32) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgba".to_string(),
        "-s".to_string(),
        format!("{canvas_size}x{canvas_size}"),
        "-r".to_string(),
        fps.to_string(),
        "-i".to_string(),
        "pipe:0".to_string(),
        "-c:v".to_string(),
        "libvpx-vp9".to_string(),
        "-pix_fmt".to_string(),
        "yuva420p".to_string(),
        "-b:v".to_string(),
        "0".to_string(),
        "-crf".to_string(),
        "30".to_string(),
        "-f".to_string(),
        "webm".to_string(),
        "pipe:1".to_string(),
    ]
}

/// Probe a clip's pixel dimensions via ffprobe.
pub fn probe_video_dimensions(path: &Path) -> Option<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=p=0:s=x",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let raw = String::from_utf8(output.stdout).ok()?;
    let line = raw.lines().next()?.trim();
    let (w, h) = line.split_once('x')?;
    let width = w.parse::<u32>().ok()?;
    let height = h.parse::<u32>().ok()?;
    Some((width, height))
}

/// Probe a clip's duration in seconds via ffprobe.
pub fn probe_video_duration(path: &Path) -> Option<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let raw = String::from_utf8(output.stdout).ok()?;
    let duration = raw.trim().parse::<f64>().ok()?;
    if duration.is_finite() && duration > 0.0 {
        Some(duration)
    } else {
        None
    }
}

/// Shrink `(width, height)` so neither side exceeds `max_dim`,
/// preserving the aspect ratio. Dimensions already within the bound
/// are returned unchanged.
pub fn fit_dimensions(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let largest = width.max(height);
    if largest <= max_dim || largest == 0 {
        return (width, height);
    }
    let ratio = max_dim as f64 / largest as f64;
    let w = ((width as f64 * ratio).round() as u32).max(1);
    let h = ((height as f64 * ratio).round() as u32).max(1);
    (w, h)
}

/// Decode a clip into buffered RGBA frames at the given sample rate.
///
/// The decoder scales down to `max_dim` (the compositor resamples per
/// tick anyway) and `max_secs` bounds the buffered span, so a
/// high-resolution or pathological input cannot exhaust memory.
/// Frames are read off the pipe one at a time rather than buffering
/// the whole decode. The reported source duration is preserved on the
/// returned clip for export duration inference.
pub fn decode_clip(
    path: &Path,
    fps: u32,
    max_secs: f64,
    max_dim: u32,
) -> TokenForgeResult<MotionClip> {
    if !path.exists() {
        return Err(TokenForgeError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if !command_exists("ffmpeg") || !command_exists("ffprobe") {
        return Err(TokenForgeError::unsupported(
            "ffmpeg/ffprobe are required to decode motion clips",
        ));
    }

    let (src_w, src_h) = probe_video_dimensions(path)
        .ok_or_else(|| TokenForgeError::media("Failed to probe clip dimensions"))?;
    let (width, height) = fit_dimensions(src_w, src_h, max_dim);
    let reported_duration = probe_video_duration(path);

    let mut child = Command::new("ffmpeg")
        .args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
        ])
        .arg(path)
        .args([
            "-t",
            &format!("{max_secs:.3}"),
            "-vf",
            &format!("fps={fps},scale={width}:{height}"),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| TokenForgeError::media(format!("Failed to start ffmpeg decode: {e}")))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| TokenForgeError::media("Failed to capture ffmpeg stdout"))?;

    let frame_bytes = (width * height * 4) as usize;
    if frame_bytes == 0 {
        return Err(TokenForgeError::media("Clip has zero-area frames"));
    }

    let mut frames = Vec::new();
    loop {
        let mut buf = vec![0u8; frame_bytes];
        if !read_frame(&mut stdout, &mut buf)? {
            break;
        }
        if let Some(frame) = RgbaImage::from_raw(width, height, buf) {
            frames.push(frame);
        }
    }

    let status = child
        .wait()
        .map_err(|e| TokenForgeError::media(format!("Failed to wait on ffmpeg: {e}")))?;
    if !status.success() {
        return Err(TokenForgeError::media(format!(
            "ffmpeg decode failed (status {status})"
        )));
    }
    if frames.is_empty() {
        return Err(TokenForgeError::media("Clip produced no decodable frames"));
    }

    tracing::debug!(
        path = %path.display(),
        width,
        height,
        frames = frames.len(),
        "Clip decoded"
    );

    let clip = match reported_duration {
        Some(duration) => MotionClip::with_duration(frames, fps as f64, duration),
        None => MotionClip::new(frames, fps as f64),
    };
    Ok(clip)
}

/// Fill `buf` with exactly one frame from the pipe. Returns false on
/// clean EOF; a partial trailing frame is discarded.
fn read_frame(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_args_shape() {
        let args = encode_args(1024, 60);
        assert!(args.contains(&"1024x1024".to_string()));
        assert!(args.contains(&"libvpx-vp9".to_string()));
        assert!(args.contains(&"webm".to_string()));
        // alpha-capable pixel format for the encoded stream
        assert!(args.contains(&"yuva420p".to_string()));
    }

    #[test]
    fn test_missing_clip_is_file_not_found() {
        let err = decode_clip(Path::new("/nonexistent/clip.webm"), 30, 15.0, 1024).unwrap_err();
        assert!(matches!(err, TokenForgeError::FileNotFound { .. }));
    }

    #[test]
    fn test_fit_dimensions_caps_the_larger_side() {
        assert_eq!(fit_dimensions(1920, 1080, 1024), (1024, 576));
        assert_eq!(fit_dimensions(1080, 1920, 1024), (576, 1024));
        assert_eq!(fit_dimensions(640, 480, 1024), (640, 480));
        assert_eq!(fit_dimensions(0, 0, 1024), (0, 0));
        // extreme aspect never collapses to zero
        assert_eq!(fit_dimensions(100_000, 10, 1024).1, 1);
    }

    #[test]
    fn test_read_frame_discards_partial_tail() {
        let data = vec![7u8; 10];
        let mut reader = &data[..];
        let mut buf = [0u8; 4];
        assert!(read_frame(&mut reader, &mut buf).unwrap());
        assert!(read_frame(&mut reader, &mut buf).unwrap());
        // 2 trailing bytes: not a whole frame
        assert!(!read_frame(&mut reader, &mut buf).unwrap());
    }
}
