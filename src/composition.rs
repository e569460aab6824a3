//! # Composition
//!
//! The complete editable state of one meme: selected template, crop,
//! text layers, shared style, caption and output format, plus the layout
//! boxes of the last rendered frame and the active drag.
//!
//! Layout and crop math are pure functions over this state; the
//! composition only owns it and keeps derived values (the crop) in sync.

use crate::crop::{self, CropMode, CropRect};
use crate::error::MememeError;
use crate::interaction::{self, DragController, PointerId};
use crate::layers::{AnchorField, LayerId, LayerSet};
use crate::layout::{self, LayoutBox, Surface};
use crate::payload::{self, Payload};
use crate::style::{OutputFormat, StyleSettings};
use crate::template::Template;

/// Editable meme state.
#[derive(Debug, Clone, Default)]
pub struct Composition {
    template: Option<Template>,
    crop_mode: CropMode,
    crop: Option<CropRect>,
    layers: LayerSet,
    /// Style shared by all layers.
    pub style: StyleSettings,
    pub caption: String,
    pub format: OutputFormat,
    boxes: Vec<LayoutBox>,
    /// Pixel size of the surface the boxes were recorded on.
    frame: Option<(u32, u32)>,
    drag: DragController,
}

impl Composition {
    /// Empty composition with the default top/bottom layers.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// Select a template and recompute the crop for it.
    ///
    /// Boxes from the previous frame are discarded; render again before
    /// hit-testing.
    pub fn set_template(&mut self, template: Template) {
        tracing::info!(id = %template.id, name = %template.name, "template selected");
        self.template = Some(template);
        self.clear_frame();
        self.recompute_crop();
    }

    pub fn crop_mode(&self) -> CropMode {
        self.crop_mode
    }

    /// Change the crop preset and recompute the crop.
    pub fn set_crop_mode(&mut self, mode: CropMode) {
        self.crop_mode = mode;
        self.clear_frame();
        self.recompute_crop();
    }

    /// Active crop, `None` meaning the full template.
    pub fn crop(&self) -> Option<CropRect> {
        self.crop
    }

    fn recompute_crop(&mut self) {
        self.crop = self
            .template
            .as_ref()
            .and_then(|t| crop::resolve_crop(t.width, t.height, self.crop_mode));
        tracing::debug!(mode = self.crop_mode.name(), crop = ?self.crop, "crop recomputed");
    }

    /// Canvas size in pixels, once a template is selected.
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        self.template
            .as_ref()
            .map(|t| crop::canvas_size(t.width, t.height, self.crop))
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    /// Replace every layer, e.g. when restoring from the command line.
    pub fn set_layers(&mut self, layers: LayerSet) {
        self.layers = layers;
        self.clear_frame();
    }

    pub fn add_layer(&mut self) -> Result<LayerId, MememeError> {
        self.layers.add()
    }

    /// Remove a layer; cancels the drag if it was the dragged one.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<(), MememeError> {
        self.layers.remove(id)?;
        self.boxes.retain(|b| b.layer_id != id);
        if self.drag.active_layer() == Some(id) {
            self.drag.cancel();
        }
        Ok(())
    }

    pub fn update_layer_text(&mut self, id: LayerId, text: &str) -> Result<(), MememeError> {
        self.layers.update_text(id, text)
    }

    pub fn update_layer_anchor(
        &mut self,
        id: LayerId,
        field: AnchorField,
        value: f64,
    ) -> Result<(), MememeError> {
        self.layers.update_anchor(id, field, value)
    }

    /// Lay out and draw all layers onto `surface`, recording the boxes for
    /// hit-testing.
    ///
    /// Boxes, hit tests and drags share the surface's pixel space, so a
    /// scaled preview works as long as pointers are given in its pixels.
    pub fn render<S: Surface + ?Sized>(&mut self, surface: &mut S) -> &[LayoutBox] {
        self.boxes = layout::render(&self.layers, &self.style, surface);
        self.frame = Some(surface.size());
        &self.boxes
    }

    /// Surface size of the last [`Composition::render`].
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame
    }

    fn clear_frame(&mut self) {
        self.boxes.clear();
        self.frame = None;
        self.drag.cancel();
    }

    /// Boxes recorded by the last [`Composition::render`].
    pub fn layout_boxes(&self) -> &[LayoutBox] {
        &self.boxes
    }

    /// Layer under the point in the last rendered frame.
    pub fn hit_test(&self, px: f64, py: f64) -> Option<LayerId> {
        interaction::hit_test(&self.boxes, px, py)
    }

    /// Re-anchor a layer so its recorded block is centered on the pointer.
    pub fn drag_to(&mut self, id: LayerId, px: f64, py: f64) -> Result<(), MememeError> {
        let (width, height) = self
            .rendered_frame()
            .ok_or_else(|| MememeError::UserInput("Render the meme first.".to_string()))?;
        let block = self
            .boxes
            .iter()
            .find(|b| b.layer_id == id)
            .map(|b| b.rect)
            .ok_or_else(|| {
                MememeError::UserInput("That layer has no text to move yet.".to_string())
            })?;
        let (x_norm, y_norm) = interaction::anchor_for_pointer(&block, width, height, px, py);
        self.layers.set_anchor(id, x_norm, y_norm)
    }

    /// Pointer pressed on the canvas. Returns the layer captured for dragging.
    pub fn pointer_down(&mut self, pointer_id: PointerId, px: f64, py: f64) -> Option<LayerId> {
        self.drag.pointer_down(pointer_id, px, py, &self.boxes)
    }

    /// Pointer moved. Returns whether an anchor changed and the canvas
    /// needs re-rendering.
    pub fn pointer_move(&mut self, pointer_id: PointerId, px: f64, py: f64) -> bool {
        let Some((width, height)) = self.rendered_frame() else {
            return false;
        };
        let Some(update) = self.drag.pointer_move(pointer_id, px, py, width, height) else {
            return false;
        };
        match self.layers.set_anchor(update.layer_id, update.x_norm, update.y_norm) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "dragged layer vanished; releasing drag");
                self.drag.cancel();
                false
            }
        }
    }

    /// Pointer released or left the canvas.
    pub fn pointer_up(&mut self, pointer_id: PointerId) -> bool {
        self.drag.pointer_up(pointer_id)
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Build the payload for the delivery channel.
    pub fn payload(&self) -> Result<Payload, MememeError> {
        payload::serialize(self)
    }

    fn rendered_frame(&self) -> Option<(f64, f64)> {
        self.frame.map(|(w, h)| (f64::from(w), f64::from(h)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tests::RecordingSurface;

    fn composition() -> (Composition, LayerId) {
        let mut comp = Composition::new();
        comp.set_template(Template::new("t", "Wide", "wide.jpg", 1000, 500));
        let id = comp.layers().layers()[0].id;
        comp.update_layer_text(id, "hello").unwrap();
        (comp, id)
    }

    fn surface_for(comp: &Composition) -> RecordingSurface {
        let (w, h) = comp.canvas_size().unwrap();
        RecordingSurface::new(w, h)
    }

    #[test]
    fn test_crop_follows_template_and_mode() {
        let (mut comp, _) = composition();
        assert_eq!(comp.crop(), None);
        assert_eq!(comp.canvas_size(), Some((1000, 500)));

        comp.set_crop_mode(CropMode::Square);
        assert_eq!(comp.crop().unwrap().x, 0.25);
        assert_eq!(comp.canvas_size(), Some((500, 500)));

        comp.set_template(Template::new("s", "Square", "sq.jpg", 800, 800));
        assert_eq!(comp.crop().unwrap().width, 1.0);
    }

    #[test]
    fn test_no_template_no_canvas() {
        let comp = Composition::new();
        assert_eq!(comp.canvas_size(), None);
        assert_eq!(comp.crop(), None);
    }

    #[test]
    fn test_render_records_boxes_for_hit_test() {
        let (mut comp, id) = composition();
        let mut surface = surface_for(&comp);
        let boxes = comp.render(&mut surface).to_vec();
        assert_eq!(boxes.len(), 1);

        let (cx, cy) = boxes[0].rect.center();
        assert_eq!(comp.hit_test(cx, cy), Some(id));
        assert_eq!(comp.hit_test(-5.0, -5.0), None);
    }

    #[test]
    fn test_drag_round_trip() {
        let (mut comp, id) = composition();
        let mut surface = surface_for(&comp);
        comp.render(&mut surface);

        let target = (620.0, 310.0);
        comp.drag_to(id, target.0, target.1).unwrap();
        comp.render(&mut surface);

        let (cx, cy) = comp.layout_boxes()[0].rect.center();
        assert!((cx - target.0).abs() <= 1.0);
        assert!((cy - target.1).abs() <= 1.0);
    }

    #[test]
    fn test_drag_round_trip_on_scaled_preview() {
        let (mut comp, id) = composition();
        comp.set_crop_mode(CropMode::Square);
        // canvas is 500x500, preview at half scale
        let mut preview = RecordingSurface::new(250, 250);
        comp.render(&mut preview);
        assert_eq!(comp.frame_size(), Some((250, 250)));

        comp.drag_to(id, 125.0, 125.0).unwrap();
        comp.render(&mut preview);

        let (cx, cy) = comp.layout_boxes()[0].rect.center();
        assert!((cx - 125.0).abs() <= 1.0, "center x {}", cx);
        assert!((cy - 125.0).abs() <= 1.0, "center y {}", cy);
    }

    #[test]
    fn test_drag_needs_a_rendered_frame() {
        let (mut comp, id) = composition();
        let mut surface = surface_for(&comp);
        comp.render(&mut surface);
        comp.set_crop_mode(CropMode::Square);
        assert_eq!(comp.frame_size(), None);
        assert!(comp.drag_to(id, 10.0, 10.0).is_err());
        assert!(!comp.pointer_move(1, 10.0, 10.0));
    }

    #[test]
    fn test_drag_to_blank_layer_fails() {
        let (mut comp, _) = composition();
        let blank = comp.layers().layers()[1].id;
        let mut surface = surface_for(&comp);
        comp.render(&mut surface);
        assert!(comp.drag_to(blank, 10.0, 10.0).is_err());
    }

    #[test]
    fn test_pointer_drag_updates_anchor() {
        let (mut comp, id) = composition();
        let mut surface = surface_for(&comp);
        comp.render(&mut surface);

        let (cx, cy) = comp.layout_boxes()[0].rect.center();
        assert_eq!(comp.pointer_down(1, cx, cy), Some(id));
        assert!(!comp.pointer_move(2, 900.0, 400.0));
        assert!(comp.pointer_move(1, 900.0, 400.0));
        assert!(comp.pointer_up(1));
        assert!(!comp.pointer_move(1, 10.0, 10.0));

        comp.render(&mut surface);
        let (cx, cy) = comp.layout_boxes()[0].rect.center();
        assert!((cx - 900.0).abs() <= 1.0);
        assert!((cy - 400.0).abs() <= 1.0);
    }

    #[test]
    fn test_removing_dragged_layer_cancels_drag() {
        let (mut comp, id) = composition();
        let mut surface = surface_for(&comp);
        comp.render(&mut surface);
        let (cx, cy) = comp.layout_boxes()[0].rect.center();
        comp.pointer_down(1, cx, cy);
        comp.remove_layer(id).unwrap();
        assert!(!comp.drag().is_dragging());
        assert!(comp.layout_boxes().is_empty());
    }
}
