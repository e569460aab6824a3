//! # Text Layout Engine
//!
//! Word-wraps a layer's text to the canvas width, stacks the lines and
//! places the resulting block on the canvas from the layer's normalized
//! anchor.
//!
//! ## Placement
//!
//! ```text
//! font_size   = max(18, round((canvas_w + canvas_h) * size_pct / 200))
//! line_height = font_size * 1.1
//! total_h     = lines * line_height
//!
//! origin_y    = y_norm * max(1, canvas_h - total_h) + font_size   (first baseline)
//! center_x    = x_norm * max(1, canvas_w - max_line_w) + max_line_w / 2
//! ```
//!
//! Anchors are fractions of the *remaining* travel on each axis, so a block
//! anchored at 0 touches the top/left edge and one anchored at 1 touches the
//! bottom/right edge without leaving the canvas.
//!
//! Measurement and painting go through the [`TextMeasure`] and [`Surface`]
//! traits, which keeps the math testable without fonts or pixels.

use serde::Serialize;

use crate::geometry::{Rect, clamp01};
use crate::layers::{LayerId, LayerSet, TextLayer};
use crate::style::{FontKey, Rgb, StyleSettings};

/// Smallest font size in pixels, regardless of canvas size.
pub const MIN_FONT_SIZE: f64 = 18.0;

/// Line advance as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.1;

/// Fraction of the canvas width a wrapped line may occupy.
pub const WRAP_WIDTH_FRACTION: f64 = 0.9;

/// Measures the advance width of a run of text.
pub trait TextMeasure {
    /// Width in pixels of `text` set at `font_size` pixels.
    fn measure(&self, text: &str, font_size: f64) -> f64;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn measure(&self, text: &str, font_size: f64) -> f64 {
        (**self).measure(text, font_size)
    }
}

/// Paint parameters for one line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePaint {
    pub font: FontKey,
    pub font_size: f64,
    pub fill: Rgb,
    pub outline: Rgb,
    /// Outline stroke width in pixels, centered on the glyph edges.
    pub stroke_width: f64,
}

/// A canvas that text can be measured against and drawn onto.
pub trait Surface: TextMeasure {
    /// Canvas size in pixels.
    fn size(&self) -> (u32, u32);

    /// Draw one line horizontally centered at `center_x` with its baseline
    /// at `baseline_y`: outline stroke first, then fill.
    fn draw_line(&mut self, line: &str, center_x: f64, baseline_y: f64, paint: &LinePaint);
}

/// Font size for a canvas: proportional to `width + height` so portrait and
/// landscape canvases of similar area get similar text.
pub fn font_size(canvas_width: f64, canvas_height: f64, size_pct: f64) -> f64 {
    ((canvas_width + canvas_height) * size_pct / 200.0)
        .round()
        .max(MIN_FONT_SIZE)
}

/// Outline stroke width for a font size.
pub fn stroke_width(font_size: f64) -> f64 {
    (font_size * 0.12).round().max(4.0)
}

/// Greedily pack whitespace-separated words into lines no wider than
/// `max_width`.
///
/// A word that alone exceeds the limit gets a line of its own and is never
/// broken. Input without words yields a single empty line.
pub fn wrap_text<M: TextMeasure + ?Sized>(
    text: &str,
    max_width: f64,
    font_size: f64,
    measure: &M,
) -> Vec<String> {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return vec![String::new()];
    };

    let mut lines = Vec::new();
    let mut current = first.to_string();

    for word in words {
        let candidate = format!("{} {}", current, word);
        if measure.measure(&candidate, font_size) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    lines
}

/// Result of laying out one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<String>,
    pub font_size: f64,
    pub line_height: f64,
    pub total_height: f64,
    /// Horizontal center of every line.
    pub origin_x: f64,
    /// Baseline of the first line.
    pub origin_y: f64,
    pub max_line_width: f64,
}

impl TextLayout {
    /// Bounding box of the block in canvas pixels.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.origin_x - self.max_line_width / 2.0,
            self.origin_y - self.font_size,
            self.max_line_width,
            self.total_height,
        )
    }

    /// Baselines of each line, top to bottom.
    pub fn baselines(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.lines.len()).map(move |i| self.origin_y + i as f64 * self.line_height)
    }
}

/// Lay out a single layer on a canvas of the given size.
pub fn layout_layer<M: TextMeasure + ?Sized>(
    layer: &TextLayer,
    style: &StyleSettings,
    canvas_width: f64,
    canvas_height: f64,
    measure: &M,
) -> TextLayout {
    let text = style.transform_text(&layer.text);
    let font_size = font_size(canvas_width, canvas_height, style.size_pct);

    let lines = wrap_text(&text, canvas_width * WRAP_WIDTH_FRACTION, font_size, measure);
    let line_height = font_size * LINE_HEIGHT_FACTOR;
    let total_height = lines.len() as f64 * line_height;

    let max_line_width = lines
        .iter()
        .map(|line| measure.measure(line, font_size))
        .fold(0.0, f64::max);

    let available_height = (canvas_height - total_height).max(1.0);
    let origin_y = clamp01(layer.y_norm) * available_height + font_size;

    let available_width = (canvas_width - max_line_width).max(1.0);
    let origin_x = clamp01(layer.x_norm) * available_width + max_line_width / 2.0;

    TextLayout {
        lines,
        font_size,
        line_height,
        total_height,
        origin_x,
        origin_y,
        max_line_width,
    }
}

/// Pixel bounding box actually drawn for a layer in the current frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBox {
    pub layer_id: LayerId,
    #[serde(flatten)]
    pub rect: Rect,
}

/// Lay out and draw every non-empty layer, in layer order.
///
/// Returns one [`LayoutBox`] per drawn layer; layers whose trimmed text is
/// empty are skipped and get no box.
pub fn render<S: Surface + ?Sized>(
    layers: &LayerSet,
    style: &StyleSettings,
    surface: &mut S,
) -> Vec<LayoutBox> {
    let (width, height) = surface.size();
    let (canvas_width, canvas_height) = (f64::from(width), f64::from(height));
    let mut boxes = Vec::new();

    for layer in layers.iter() {
        if layer.is_blank() {
            continue;
        }

        let layout = layout_layer(layer, style, canvas_width, canvas_height, &*surface);
        let paint = LinePaint {
            font: style.font,
            font_size: layout.font_size,
            fill: style.fill,
            outline: style.outline,
            stroke_width: stroke_width(layout.font_size),
        };

        for (line, baseline) in layout.lines.iter().zip(layout.baselines()) {
            surface.draw_line(line, layout.origin_x, baseline, &paint);
        }

        boxes.push(LayoutBox {
            layer_id: layer.id,
            rect: layout.bounds(),
        });
    }

    tracing::debug!(drawn = boxes.len(), width, height, "rendered text layers");
    boxes
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Every character advances `font_size * 0.5` pixels.
    pub(crate) struct HalfEm;

    impl TextMeasure for HalfEm {
        fn measure(&self, text: &str, font_size: f64) -> f64 {
            text.chars().count() as f64 * font_size * 0.5
        }
    }

    /// Records draw calls instead of painting pixels.
    pub(crate) struct RecordingSurface {
        pub width: u32,
        pub height: u32,
        pub drawn: Vec<(String, f64, f64, LinePaint)>,
    }

    impl RecordingSurface {
        pub(crate) fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                drawn: Vec::new(),
            }
        }
    }

    impl TextMeasure for RecordingSurface {
        fn measure(&self, text: &str, font_size: f64) -> f64 {
            HalfEm.measure(text, font_size)
        }
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn draw_line(&mut self, line: &str, center_x: f64, baseline_y: f64, paint: &LinePaint) {
            self.drawn
                .push((line.to_string(), center_x, baseline_y, paint.clone()));
        }
    }

    fn layer(text: &str, x: f64, y: f64) -> TextLayer {
        let mut layer = TextLayer::new(x, y);
        layer.text = text.to_string();
        layer
    }

    #[test]
    fn test_font_size_floor_and_rounding() {
        assert_eq!(font_size(100.0, 100.0, 10.0), 18.0);
        assert_eq!(font_size(1000.0, 500.0, 10.0), 75.0);
        // 1230 * 10 / 200 = 61.5 rounds up
        assert_eq!(font_size(730.0, 500.0, 10.0), 62.0);
    }

    #[test]
    fn test_stroke_width() {
        assert_eq!(stroke_width(18.0), 4.0);
        assert_eq!(stroke_width(75.0), 9.0);
    }

    #[test]
    fn test_wrap_empty_is_one_empty_line() {
        assert_eq!(wrap_text("", 100.0, 10.0, &HalfEm), vec![String::new()]);
        assert_eq!(wrap_text("  \n\t ", 100.0, 10.0, &HalfEm), vec![String::new()]);
    }

    #[test]
    fn test_wrap_packs_greedily() {
        // 5px per char, limit 50px → at most 10 chars per line
        let lines = wrap_text("one two three four", 50.0, 10.0, &HalfEm);
        assert_eq!(lines, vec!["one two", "three four"]);
    }

    #[test]
    fn test_wrap_collapses_whitespace_runs() {
        let lines = wrap_text("  a \n  b\t\tc  ", 1000.0, 10.0, &HalfEm);
        assert_eq!(lines, vec!["a b c"]);
    }

    #[test]
    fn test_wrap_keeps_long_word_whole() {
        let lines = wrap_text("hi supercalifragilistic yo", 50.0, 10.0, &HalfEm);
        assert_eq!(lines, vec!["hi", "supercalifragilistic", "yo"]);
    }

    #[test]
    fn test_wrap_never_exceeds_limit_except_single_words() {
        let text = "the quick brown fox jumps over the lazy dog while a \
                    particularlyverboseword sits alone on its own line";
        let limit = 60.0;
        for line in wrap_text(text, limit, 10.0, &HalfEm) {
            let width = HalfEm.measure(&line, 10.0);
            assert!(width <= limit || !line.contains(' '), "line too wide: {line:?}");
        }
    }

    #[test]
    fn test_layout_top_left_anchor() {
        let style = StyleSettings::default();
        let layout = layout_layer(&layer("hi", 0.0, 0.0), &style, 1000.0, 500.0, &HalfEm);
        assert_eq!(layout.lines, vec!["HI"]);
        assert_eq!(layout.font_size, 75.0);
        assert_eq!(layout.max_line_width, 75.0);
        let bounds = layout.bounds();
        assert_eq!(bounds.x, 0.0);
        assert_eq!(bounds.y, 0.0);
        assert!((bounds.height - 82.5).abs() < 1e-9);
    }

    #[test]
    fn test_layout_bottom_right_anchor_stays_on_canvas() {
        let style = StyleSettings::default();
        let layout = layout_layer(&layer("hi", 1.0, 1.0), &style, 1000.0, 500.0, &HalfEm);
        let bounds = layout.bounds();
        assert!((bounds.right() - 1000.0).abs() < 1e-9);
        assert!((bounds.bottom() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_layout_clamps_out_of_range_anchor() {
        let style = StyleSettings::default();
        let wild = layout_layer(&layer("hi", -3.0, 9.0), &style, 1000.0, 500.0, &HalfEm);
        let tame = layout_layer(&layer("hi", 0.0, 1.0), &style, 1000.0, 500.0, &HalfEm);
        assert_eq!(wild, tame);
    }

    #[test]
    fn test_layout_oversized_block_uses_minimum_travel() {
        let style = StyleSettings {
            size_pct: 100.0,
            ..StyleSettings::default()
        };
        // font 100px, 4 lines of 110px on a 100px-tall canvas
        let text = "aaaa bbbb cccc dddd";
        let layout = layout_layer(&layer(text, 0.5, 1.0), &style, 100.0, 100.0, &HalfEm);
        assert_eq!(layout.lines.len(), 4);
        assert_eq!(layout.origin_y, 1.0 + layout.font_size);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let style = StyleSettings::default();
        let l = layer("one does not simply walk into mordor", 0.3, 0.7);
        let a = layout_layer(&l, &style, 640.0, 480.0, &HalfEm);
        let b = layout_layer(&l, &style, 640.0, 480.0, &HalfEm);
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_skips_blank_layers_and_draws_in_order() {
        let mut layers = LayerSet::new();
        let top = layers.layers()[0].id;
        let bottom = layers.layers()[1].id;
        layers.update_text(bottom, "bottom text").unwrap();
        layers.update_text(top, "   ").unwrap();

        let mut surface = RecordingSurface::new(1000, 500);
        let boxes = render(&layers, &StyleSettings::default(), &mut surface);

        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].layer_id, bottom);
        assert_eq!(surface.drawn.len(), 1);
        let (line, center_x, _, paint) = &surface.drawn[0];
        assert_eq!(line, "BOTTOM TEXT");
        assert_eq!(*center_x, boxes[0].rect.center().0);
        assert_eq!(paint.stroke_width, 9.0);
    }

    #[test]
    fn test_render_advances_baseline_per_line() {
        let mut layers = LayerSet::new();
        let id = layers.layers()[0].id;
        layers.update_text(id, "aaaa bbbb").unwrap();
        // 18px font → 9px/char, canvas limit 0.9 * 100 = 90px, "AAAA BBBB" is 81px
        let mut surface = RecordingSurface::new(100, 100);
        render(&layers, &StyleSettings::default(), &mut surface);
        assert_eq!(surface.drawn.len(), 1);

        let mut narrow = RecordingSurface::new(60, 200);
        render(&layers, &StyleSettings::default(), &mut narrow);
        assert_eq!(narrow.drawn.len(), 2);
        let step = narrow.drawn[1].2 - narrow.drawn[0].2;
        assert!((step - 18.0 * LINE_HEIGHT_FACTOR).abs() < 1e-9);
    }
}
