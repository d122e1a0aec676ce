//! The three composite layers and the registry that owns them.

use crate::media::{Media, MediaKind, ScratchResource};
use crate::transform::Transform;

/// One of the three fixed composite slots, drawn in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerId {
    Background,
    Frame,
    Overlay,
}

impl LayerId {
    /// All layers in draw order: background first, overlay last.
    pub const DRAW_ORDER: [LayerId; 3] = [LayerId::Background, LayerId::Frame, LayerId::Overlay];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerId::Background => "background",
            LayerId::Frame => "frame",
            LayerId::Overlay => "overlay",
        }
    }
}

/// Media bound to a layer, together with the transient resource that
/// backs it (if any).
#[derive(Debug)]
pub struct MediaBinding {
    pub media: Media,
    pub resource: Option<ScratchResource>,
}

/// A single composite layer: optional media plus one transform.
///
/// A layer with no binding is empty and contributes nothing to the
/// composite.
#[derive(Debug, Default)]
pub struct Layer {
    binding: Option<MediaBinding>,
    transform: Transform,
}

impl Layer {
    pub fn is_empty(&self) -> bool {
        self.binding.is_none()
    }

    pub fn media(&self) -> Option<&Media> {
        self.binding.as_ref().map(|b| &b.media)
    }

    pub fn media_mut(&mut self) -> Option<&mut Media> {
        self.binding.as_mut().map(|b| &mut b.media)
    }

    pub fn kind(&self) -> Option<MediaKind> {
        self.media().map(Media::kind)
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}

/// Owns the three layers and their media handles.
///
/// The registry is the exclusive owner of each binding's transient
/// resource: replacement releases the previous owned resource exactly
/// once and never touches externally-owned ones.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    background: Layer,
    frame: Layer,
    overlay: Layer,
    resources_released: u64,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure read of a layer.
    pub fn get(&self, id: LayerId) -> &Layer {
        match id {
            LayerId::Background => &self.background,
            LayerId::Frame => &self.frame,
            LayerId::Overlay => &self.overlay,
        }
    }

    pub fn get_mut(&mut self, id: LayerId) -> &mut Layer {
        match id {
            LayerId::Background => &mut self.background,
            LayerId::Frame => &mut self.frame,
            LayerId::Overlay => &mut self.overlay,
        }
    }

    /// Bind new media to a layer.
    ///
    /// Releases the previously held transient resource (if owned),
    /// stores the new binding, and resets the transform to identity.
    pub fn assign(&mut self, id: LayerId, media: Media, resource: Option<ScratchResource>) {
        self.release_current(id);
        let layer = self.get_mut(id);
        layer.binding = Some(MediaBinding { media, resource });
        layer.transform = Transform::IDENTITY;
        tracing::debug!(layer = id.as_str(), "Layer media assigned");
    }

    /// Empty a layer, releasing its owned resource and leaving the
    /// transform reset.
    pub fn clear(&mut self, id: LayerId) {
        self.release_current(id);
        let layer = self.get_mut(id);
        layer.binding = None;
        layer.transform = Transform::IDENTITY;
        tracing::debug!(layer = id.as_str(), "Layer cleared");
    }

    /// Number of transient resources released so far.
    pub fn resources_released(&self) -> u64 {
        self.resources_released
    }

    fn release_current(&mut self, id: LayerId) {
        let layer = self.get_mut(id);
        if let Some(binding) = layer.binding.as_mut() {
            if let Some(resource) = binding.resource.as_mut() {
                if resource.release() {
                    self.resources_released += 1;
                }
            }
        }
    }
}
