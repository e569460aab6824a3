//! # Pointer Interaction
//!
//! Hit-testing against the current frame's layout boxes and the drag state
//! machine that turns pointer positions back into normalized anchors.
//!
//! ## State Machine
//!
//! ```text
//! Idle ──down (hits a box)──▶ Dragging { pointer, layer }
//! Dragging ──move (same pointer)──▶ Dragging   (anchor updated)
//! Dragging ──up/leave (same pointer)──▶ Idle
//! ```
//!
//! Events from any other pointer while dragging are ignored, so only one
//! drag is ever active.

use crate::geometry::{Rect, clamp01};
use crate::layers::LayerId;
use crate::layout::LayoutBox;

/// Identifier of a pointer (mouse, pen or touch contact).
pub type PointerId = i64;

/// First box, in layer order, containing the point.
pub fn hit_test(boxes: &[LayoutBox], px: f64, py: f64) -> Option<LayerId> {
    boxes
        .iter()
        .find(|b| b.rect.contains(px, py))
        .map(|b| b.layer_id)
}

/// Anchor that centers a block of the given size on the pointer.
///
/// This inverts the placement in [`crate::layout::layout_layer`]:
/// `top = y_norm * max(1, canvas_h - block_h)`, so
/// `y_norm = (py - block_h / 2) / max(1, canvas_h - block_h)`, and the same
/// on the horizontal axis.
pub fn anchor_for_pointer(
    block: &Rect,
    canvas_width: f64,
    canvas_height: f64,
    px: f64,
    py: f64,
) -> (f64, f64) {
    let available_width = (canvas_width - block.width).max(1.0);
    let available_height = (canvas_height - block.height).max(1.0);
    (
        clamp01((px - block.width / 2.0) / available_width),
        clamp01((py - block.height / 2.0) / available_height),
    )
}

/// Current drag state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        pointer_id: PointerId,
        layer_id: LayerId,
        /// Block bounds recorded when the drag started.
        block: Rect,
    },
}

/// Anchor change produced by a pointer move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragUpdate {
    pub layer_id: LayerId,
    pub x_norm: f64,
    pub y_norm: f64,
}

/// Drives [`DragState`] from pointer events.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Layer being dragged, if any.
    pub fn active_layer(&self) -> Option<LayerId> {
        match self.state {
            DragState::Dragging { layer_id, .. } => Some(layer_id),
            DragState::Idle => None,
        }
    }

    /// Start a drag if the point hits a box and no drag is active.
    ///
    /// Returns the captured layer.
    pub fn pointer_down(
        &mut self,
        pointer_id: PointerId,
        px: f64,
        py: f64,
        boxes: &[LayoutBox],
    ) -> Option<LayerId> {
        if self.is_dragging() {
            return None;
        }

        let hit = boxes.iter().find(|b| b.rect.contains(px, py))?;
        self.state = DragState::Dragging {
            pointer_id,
            layer_id: hit.layer_id,
            block: hit.rect,
        };
        tracing::debug!(pointer_id, layer = %hit.layer_id, "drag started");
        Some(hit.layer_id)
    }

    /// Compute the new anchor for the dragged layer.
    ///
    /// Moves from a pointer other than the captured one are no-ops.
    pub fn pointer_move(
        &self,
        pointer_id: PointerId,
        px: f64,
        py: f64,
        canvas_width: f64,
        canvas_height: f64,
    ) -> Option<DragUpdate> {
        let DragState::Dragging {
            pointer_id: active,
            layer_id,
            block,
        } = &self.state
        else {
            return None;
        };
        if *active != pointer_id {
            return None;
        }

        let (x_norm, y_norm) = anchor_for_pointer(block, canvas_width, canvas_height, px, py);
        Some(DragUpdate {
            layer_id: *layer_id,
            x_norm,
            y_norm,
        })
    }

    /// End the drag on pointer-up or pointer-leave. Returns whether the
    /// pointer was the captured one.
    pub fn pointer_up(&mut self, pointer_id: PointerId) -> bool {
        match self.state {
            DragState::Dragging {
                pointer_id: active,
                ..
            } if active == pointer_id => {
                self.state = DragState::Idle;
                tracing::debug!(pointer_id, "drag released");
                true
            }
            _ => false,
        }
    }

    /// Drop any active drag without an event, e.g. when its layer is removed.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}
