//! CLI subcommands plus the media-loading helpers they share.

pub mod check;
pub mod clip;
pub mod compose;
pub mod probe;

use std::path::{Path, PathBuf};

use tokenforge_common::config::AppConfig;
use tokenforge_export_engine::{ffmpeg, CAPTURE_FPS, MAX_CLIP_SECS};
use tokenforge_token_model::{
    CompositeState, LayerId, Media, ScratchResource, StillImage, TokenSettings, Transform,
};

/// Session parameters after merging command-line flags over the
/// configured defaults. Flags win; anything unset comes from
/// `AppConfig`.
pub struct SessionArgs {
    pub output: PathBuf,
    pub size: u32,
    pub is_circular: bool,
    pub mask_scale: f64,
}

pub fn resolve_args(
    config: &AppConfig,
    output: Option<PathBuf>,
    size: Option<u32>,
    square: bool,
    mask_scale: Option<f64>,
) -> SessionArgs {
    SessionArgs {
        output: output.unwrap_or_else(|| config.output_dir.clone()),
        size: size.unwrap_or(config.token.canvas_size),
        is_circular: if square { false } else { config.token.is_circular },
        mask_scale: mask_scale.unwrap_or(config.token.mask_scale),
    }
}

/// Extensions decoded as still images; everything else goes through
/// the clip decoder.
const STILL_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "bmp", "tiff"];

pub fn is_still_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            STILL_EXTENSIONS.iter().any(|s| *s == e)
        })
        .unwrap_or(false)
}

/// Decode a user-supplied media file into a layer binding. Clips are
/// scaled down to the canvas size at decode time.
///
/// User files are externally owned; the registry must never delete
/// them on replacement.
pub fn load_media(path: &Path, canvas_size: u32) -> anyhow::Result<(Media, ScratchResource)> {
    let resource = ScratchResource::external(path);
    if is_still_path(path) {
        let pixels = image::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to decode {}: {e}", path.display()))?
            .to_rgba8();
        Ok((Media::Still(StillImage::decoded(pixels)), resource))
    } else {
        let clip = ffmpeg::decode_clip(path, CAPTURE_FPS, MAX_CLIP_SECS, canvas_size)?;
        Ok((Media::Motion(clip), resource))
    }
}

/// Parse a `--transform` spec of the form `<layer>=<scale>,<dx>,<dy>`.
pub fn parse_transform(spec: &str) -> anyhow::Result<(LayerId, Transform)> {
    let (layer, rest) = spec
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid transform spec: {spec} (expected layer=scale,dx,dy)"))?;

    let id = match layer {
        "background" => LayerId::Background,
        "frame" => LayerId::Frame,
        "overlay" => LayerId::Overlay,
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown layer: {layer}. Use: background, frame, overlay"
            ))
        }
    };

    let parts: Vec<&str> = rest.split(',').collect();
    if parts.len() != 3 {
        return Err(anyhow::anyhow!(
            "Invalid transform spec: {spec} (expected layer=scale,dx,dy)"
        ));
    }
    let scale: f64 = parts[0].trim().parse()?;
    let dx: f64 = parts[1].trim().parse()?;
    let dy: f64 = parts[2].trim().parse()?;

    // zoom applies a delta from identity, so the spec value is absolute
    let mut transform = Transform::IDENTITY;
    transform.zoom(scale - 1.0);
    transform.pan(dx, dy);
    Ok((id, transform))
}

/// Build the composite state shared by `compose` and `clip`: load each
/// supplied layer, then apply the requested transforms.
pub fn build_state(
    background: Option<PathBuf>,
    frame: Option<PathBuf>,
    overlay: Option<PathBuf>,
    args: &SessionArgs,
    transforms: &[String],
) -> anyhow::Result<CompositeState> {
    let mut state = CompositeState::new(TokenSettings {
        canvas_size: args.size,
        is_circular: args.is_circular,
        mask_scale: args.mask_scale,
    });

    let slots = [
        (LayerId::Background, background),
        (LayerId::Frame, frame),
        (LayerId::Overlay, overlay),
    ];
    for (id, path) in slots {
        if let Some(path) = path {
            println!("  Loading {}: {}", id.as_str(), path.display());
            let (media, resource) = load_media(&path, args.size)?;
            state.registry.assign(id, media, Some(resource));
        }
    }

    for spec in transforms {
        let (id, transform) = parse_transform(spec)?;
        *state.registry.get_mut(id).transform_mut() = transform;
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_still_extension_classification() {
        assert!(is_still_path(Path::new("avatar.PNG")));
        assert!(is_still_path(Path::new("/a/b/border.jpeg")));
        assert!(!is_still_path(Path::new("loop.webm")));
        assert!(!is_still_path(Path::new("clip.mp4")));
        assert!(!is_still_path(Path::new("no-extension")));
    }

    #[test]
    fn test_parse_transform_spec() {
        let (id, t) = parse_transform("background=2.0,30,-10").unwrap();
        assert_eq!(id, LayerId::Background);
        assert!((t.scale - 2.0).abs() < 1e-9);
        assert!((t.offset_x - 30.0).abs() < 1e-9);
        assert!((t.offset_y + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_transform_clamps_scale() {
        let (_, t) = parse_transform("frame=100.0,0,0").unwrap();
        assert!((t.scale - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_transform_rejects_bad_specs() {
        assert!(parse_transform("background").is_err());
        assert!(parse_transform("sky=1.0,0,0").is_err());
        assert!(parse_transform("frame=1.0,0").is_err());
        assert!(parse_transform("frame=abc,0,0").is_err());
    }

    #[test]
    fn test_unset_flags_fall_back_to_config() {
        let config = AppConfig::default();
        let args = resolve_args(&config, None, None, false, None);
        assert_eq!(args.output, config.output_dir);
        assert_eq!(args.size, 1024);
        assert!(args.is_circular);
        assert!((args.mask_scale - 0.98).abs() < 1e-9);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = AppConfig::default();
        config.token.canvas_size = 512;
        let args = resolve_args(
            &config,
            Some(PathBuf::from("/out")),
            Some(64),
            true,
            Some(0.5),
        );
        assert_eq!(args.output, PathBuf::from("/out"));
        assert_eq!(args.size, 64);
        assert!(!args.is_circular);
        assert!((args.mask_scale - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_square_config_default_applies_without_flag() {
        let mut config = AppConfig::default();
        config.token.is_circular = false;
        let args = resolve_args(&config, None, None, false, None);
        assert!(!args.is_circular);
    }
}
