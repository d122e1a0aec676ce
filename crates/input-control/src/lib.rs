//! TokenForge Input Control
//!
//! Converts pointer drags and wheel deltas into transform mutations on
//! the currently active layer. Drag deltas arrive in screen pixels and
//! are corrected to canvas space by the ratio between the fixed
//! logical surface size and the on-screen rendered width.
//!
//! While an export is in progress every gesture is refused, so a
//! transform mutation can never land mid-capture.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokenforge_token_model::StateHandle;

/// Wheel-to-zoom sensitivity, a tuned product constant.
pub const ZOOM_SENSITIVITY: f64 = 0.0002;

/// Pointer buttons the controller distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Pointer events fed in by the host surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press { button: PointerButton, x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Release { button: PointerButton },
    Leave,
}

/// Drag state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Dragging { last_x: f64, last_y: f64 },
}

/// Pointer/wheel controller for the active layer.
pub struct InputController {
    state: StateHandle,
    export_lock: Arc<AtomicBool>,
    drag: DragState,
    /// Current on-screen rendered width of the preview, in CSS/screen
    /// pixels. Updated by the host on resize.
    displayed_width: f64,
}

impl InputController {
    pub fn new(state: StateHandle, export_lock: Arc<AtomicBool>, displayed_width: f64) -> Self {
        Self {
            state,
            export_lock,
            drag: DragState::Idle,
            displayed_width,
        }
    }

    /// Update the on-screen preview width used for scale correction.
    pub fn set_displayed_width(&mut self, width: f64) {
        self.displayed_width = width;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Feed a pointer event. Returns whether the event mutated state.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        if self.export_lock.load(Ordering::Relaxed) {
            // gestures are refused wholesale during export; also drop
            // any drag that was in flight when the lock engaged
            if self.is_dragging() {
                tracing::debug!("Dropping in-flight drag: export in progress");
            }
            self.drag = DragState::Idle;
            return false;
        }

        match event {
            PointerEvent::Press {
                button: PointerButton::Primary,
                x,
                y,
            } => {
                self.drag = DragState::Dragging { last_x: x, last_y: y };
                false
            }
            PointerEvent::Press { .. } => false,
            PointerEvent::Move { x, y } => {
                let DragState::Dragging { last_x, last_y } = self.drag else {
                    return false;
                };
                let factor = self.scale_factor();
                let dx = (x - last_x) * factor;
                let dy = (y - last_y) * factor;
                self.drag = DragState::Dragging { last_x: x, last_y: y };

                let mut state = self.state.lock().expect("composite state poisoned");
                let active = state.active_layer;
                state.registry.get_mut(active).transform_mut().pan(dx, dy);
                true
            }
            PointerEvent::Release {
                button: PointerButton::Primary,
            }
            | PointerEvent::Leave => {
                self.drag = DragState::Idle;
                false
            }
            PointerEvent::Release { .. } => false,
        }
    }

    /// Feed a wheel delta (positive = scroll down). Returns whether
    /// the event was consumed, in which case the host must suppress
    /// its default scroll behavior.
    pub fn handle_wheel(&mut self, delta_y: f64) -> bool {
        if self.export_lock.load(Ordering::Relaxed) {
            return false;
        }

        let delta = -delta_y * ZOOM_SENSITIVITY;
        let mut state = self.state.lock().expect("composite state poisoned");
        let active = state.active_layer;
        state.registry.get_mut(active).transform_mut().zoom(delta);
        true
    }

    /// Screen-to-canvas correction: the fixed logical surface size
    /// divided by the current rendered width.
    fn scale_factor(&self) -> f64 {
        let state = self.state.lock().expect("composite state poisoned");
        state.settings.canvas_size as f64 / self.displayed_width.max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenforge_token_model::{
        shared_state, CompositeState, LayerId, Media, StillImage, TokenSettings,
    };

    fn setup() -> (StateHandle, Arc<AtomicBool>) {
        let state = shared_state(CompositeState::new(TokenSettings::default()));
        {
            let mut st = state.lock().unwrap();
            st.registry.assign(
                LayerId::Background,
                Media::Still(StillImage::decoded(image::RgbaImage::new(4, 4))),
                None,
            );
            st.active_layer = LayerId::Background;
        }
        (state, Arc::new(AtomicBool::new(false)))
    }

    fn active_transform(state: &StateHandle) -> tokenforge_token_model::Transform {
        let st = state.lock().unwrap();
        *st.registry.get(st.active_layer).transform()
    }

    #[test]
    fn test_drag_pans_with_scale_correction() {
        let (state, lock) = setup();
        // canvas 1024 displayed at 512 -> factor 2
        let mut ctrl = InputController::new(Arc::clone(&state), lock, 512.0);

        ctrl.handle_pointer(PointerEvent::Press {
            button: PointerButton::Primary,
            x: 100.0,
            y: 100.0,
        });
        assert!(ctrl.is_dragging());
        ctrl.handle_pointer(PointerEvent::Move { x: 110.0, y: 95.0 });

        let t = active_transform(&state);
        assert!((t.offset_x - 20.0).abs() < 1e-9);
        assert!((t.offset_y - -10.0).abs() < 1e-9);
    }

    #[test]
    fn test_move_without_press_is_ignored() {
        let (state, lock) = setup();
        let mut ctrl = InputController::new(Arc::clone(&state), lock, 1024.0);
        assert!(!ctrl.handle_pointer(PointerEvent::Move { x: 50.0, y: 50.0 }));
        assert!(active_transform(&state).is_identity());
    }

    #[test]
    fn test_release_and_leave_end_drag() {
        let (state, lock) = setup();
        let mut ctrl = InputController::new(Arc::clone(&state), lock, 1024.0);

        ctrl.handle_pointer(PointerEvent::Press {
            button: PointerButton::Primary,
            x: 0.0,
            y: 0.0,
        });
        ctrl.handle_pointer(PointerEvent::Release {
            button: PointerButton::Primary,
        });
        assert!(!ctrl.is_dragging());

        ctrl.handle_pointer(PointerEvent::Press {
            button: PointerButton::Primary,
            x: 0.0,
            y: 0.0,
        });
        ctrl.handle_pointer(PointerEvent::Leave);
        assert!(!ctrl.is_dragging());
    }

    #[test]
    fn test_secondary_button_does_not_start_drag() {
        let (state, lock) = setup();
        let mut ctrl = InputController::new(Arc::clone(&state), lock, 1024.0);
        ctrl.handle_pointer(PointerEvent::Press {
            button: PointerButton::Secondary,
            x: 0.0,
            y: 0.0,
        });
        assert!(!ctrl.is_dragging());
    }

    #[test]
    fn test_wheel_zooms_active_layer() {
        let (state, lock) = setup();
        let mut ctrl = InputController::new(Arc::clone(&state), lock, 1024.0);
        assert!(ctrl.handle_wheel(-500.0));
        let t = active_transform(&state);
        assert!((t.scale - (1.0 + 500.0 * ZOOM_SENSITIVITY)).abs() < 1e-9);
    }

    #[test]
    fn test_export_lock_blocks_all_gestures() {
        let (state, lock) = setup();
        let mut ctrl = InputController::new(Arc::clone(&state), Arc::clone(&lock), 1024.0);

        lock.store(true, Ordering::SeqCst);
        ctrl.handle_pointer(PointerEvent::Press {
            button: PointerButton::Primary,
            x: 0.0,
            y: 0.0,
        });
        assert!(!ctrl.is_dragging());
        assert!(!ctrl.handle_pointer(PointerEvent::Move { x: 30.0, y: 30.0 }));
        assert!(!ctrl.handle_wheel(-500.0));
        assert!(active_transform(&state).is_identity());

        // lock released: mutation succeeds again
        lock.store(false, Ordering::SeqCst);
        assert!(ctrl.handle_wheel(-500.0));
        assert!(!active_transform(&state).is_identity());
    }

    #[test]
    fn test_drag_in_flight_is_dropped_when_lock_engages() {
        let (state, lock) = setup();
        let mut ctrl = InputController::new(Arc::clone(&state), Arc::clone(&lock), 1024.0);

        ctrl.handle_pointer(PointerEvent::Press {
            button: PointerButton::Primary,
            x: 0.0,
            y: 0.0,
        });
        lock.store(true, Ordering::SeqCst);
        assert!(!ctrl.handle_pointer(PointerEvent::Move { x: 10.0, y: 10.0 }));
        assert!(!ctrl.is_dragging());
    }
}
