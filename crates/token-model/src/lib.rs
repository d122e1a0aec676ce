//! TokenForge Token Model
//!
//! The data model for a token composite: three fixed layers
//! (background, frame, overlay), each binding decoded media and a
//! pan/zoom transform, plus the session-wide token settings and the
//! circular/square mask geometry derived from them.
//!
//! Everything here is pure state and arithmetic; the render engine
//! reads it every tick, the input controller mutates the active
//! layer's transform, and the export engine inspects it for duration
//! inference.

pub mod layer;
pub mod mask;
pub mod media;
pub mod settings;
pub mod transform;

use std::sync::{Arc, Mutex};

pub use layer::{Layer, LayerId, LayerRegistry, MediaBinding};
pub use mask::MaskRegion;
pub use media::{Media, MediaKind, MotionClip, ScratchResource, StillImage};
pub use settings::TokenSettings;
pub use transform::Transform;

/// The mutable state shared between the render loop, the input
/// controller, and the export engine. All access goes through the
/// handle's mutex with short critical sections.
#[derive(Debug)]
pub struct CompositeState {
    pub registry: LayerRegistry,
    pub settings: TokenSettings,
    pub active_layer: LayerId,
}

impl CompositeState {
    pub fn new(settings: TokenSettings) -> Self {
        Self {
            registry: LayerRegistry::new(),
            settings,
            active_layer: LayerId::Background,
        }
    }
}

/// Shared handle to the composite state.
pub type StateHandle = Arc<Mutex<CompositeState>>;

/// Wrap a state value into a shared handle.
pub fn shared_state(state: CompositeState) -> StateHandle {
    Arc::new(Mutex::new(state))
}
