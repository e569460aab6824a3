//! # Layer Model
//!
//! The ordered list of text layers in a composition.
//!
//! ## Invariants
//!
//! - There is always at least one layer. Removing the last layer swaps in a
//!   fresh blank one.
//! - There are never more than [`MAX_LAYERS`] layers. Adding beyond that is
//!   rejected without touching the list.
//! - Anchors are clamped to `[0,1]` on every write.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::MememeError;
use crate::geometry::clamp01;

/// Maximum number of text layers in a composition.
pub const MAX_LAYERS: usize = 3;

/// Opaque layer identifier, unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    pub fn new() -> Self {
        LayerId(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which coordinate of an anchor to update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorField {
    X,
    Y,
}

/// One independently positioned piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    pub id: LayerId,
    /// Raw text as typed; may contain newlines, which wrap like spaces.
    pub text: String,
    pub x_norm: f64,
    pub y_norm: f64,
}

impl TextLayer {
    /// A blank layer at the given anchor.
    pub fn new(x_norm: f64, y_norm: f64) -> Self {
        Self {
            id: LayerId::new(),
            text: String::new(),
            x_norm: clamp01(x_norm),
            y_norm: clamp01(y_norm),
        }
    }

    /// Whether the layer has nothing to draw.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Anchor clamped to `[0,1]²`.
    pub fn anchor(&self) -> (f64, f64) {
        (clamp01(self.x_norm), clamp01(self.y_norm))
    }
}

/// Ordered, never-empty set of at most [`MAX_LAYERS`] layers.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSet {
    layers: Vec<TextLayer>,
}

impl Default for LayerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerSet {
    /// The classic two-layer meme: top text and bottom text.
    pub fn new() -> Self {
        Self {
            layers: vec![TextLayer::new(0.5, 0.12), TextLayer::new(0.5, 0.85)],
        }
    }

    /// A set holding one blank, centered layer.
    pub fn single() -> Self {
        Self {
            layers: vec![TextLayer::new(0.5, 0.5)],
        }
    }

    /// Build a set from existing layers, keeping the first [`MAX_LAYERS`].
    ///
    /// An empty input yields [`LayerSet::single`].
    pub fn from_layers(layers: Vec<TextLayer>) -> Self {
        if layers.is_empty() {
            return Self::single();
        }
        let layers = layers
            .into_iter()
            .take(MAX_LAYERS)
            .map(|mut layer| {
                layer.x_norm = clamp01(layer.x_norm);
                layer.y_norm = clamp01(layer.y_norm);
                layer
            })
            .collect();
        Self { layers }
    }

    pub fn layers(&self) -> &[TextLayer] {
        &self.layers
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextLayer> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, id: LayerId) -> Option<&TextLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    fn get_mut(&mut self, id: LayerId) -> Result<&mut TextLayer, MememeError> {
        self.layers
            .iter_mut()
            .find(|layer| layer.id == id)
            .ok_or_else(|| MememeError::UserInput(format!("Unknown text layer {}", id)))
    }

    /// Whether any layer has text to draw.
    pub fn has_text(&self) -> bool {
        self.layers.iter().any(|layer| !layer.is_blank())
    }

    /// Append a blank layer.
    ///
    /// With a single existing layer the new one goes near the top; otherwise
    /// it is centered so it does not sit on the top/bottom pair.
    pub fn add(&mut self) -> Result<LayerId, MememeError> {
        if self.layers.len() >= MAX_LAYERS {
            tracing::warn!(count = self.layers.len(), "layer limit reached");
            return Err(MememeError::UserInput(
                "Maximum of three layers for now.".to_string(),
            ));
        }

        let y_norm = if self.layers.len() == 1 { 0.15 } else { 0.5 };
        let layer = TextLayer::new(0.5, y_norm);
        let id = layer.id;
        self.layers.push(layer);
        Ok(id)
    }

    /// Remove a layer, substituting a fresh blank one if it was the last.
    pub fn remove(&mut self, id: LayerId) -> Result<(), MememeError> {
        let index = self
            .layers
            .iter()
            .position(|layer| layer.id == id)
            .ok_or_else(|| MememeError::UserInput(format!("Unknown text layer {}", id)))?;

        self.layers.remove(index);
        if self.layers.is_empty() {
            self.layers.push(TextLayer::new(0.5, 0.5));
        }
        Ok(())
    }

    pub fn update_text(&mut self, id: LayerId, text: &str) -> Result<(), MememeError> {
        self.get_mut(id)?.text = text.to_string();
        Ok(())
    }

    /// Set one anchor coordinate, clamped to `[0,1]`.
    pub fn update_anchor(
        &mut self,
        id: LayerId,
        field: AnchorField,
        value: f64,
    ) -> Result<(), MememeError> {
        let layer = self.get_mut(id)?;
        match field {
            AnchorField::X => layer.x_norm = clamp01(value),
            AnchorField::Y => layer.y_norm = clamp01(value),
        }
        Ok(())
    }

    /// Set both anchor coordinates, clamped to `[0,1]`.
    pub fn set_anchor(&mut self, id: LayerId, x_norm: f64, y_norm: f64) -> Result<(), MememeError> {
        let layer = self.get_mut(id)?;
        layer.x_norm = clamp01(x_norm);
        layer.y_norm = clamp01(y_norm);
        Ok(())
    }
}
