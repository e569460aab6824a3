//! # Crop Resolver
//!
//! Derives a centered, normalized crop rectangle for a template from a
//! target aspect ratio.
//!
//! ## Algorithm
//!
//! ```text
//! current = template_w / template_h
//! current > target  → keep height, crop_w = template_h * target, center horizontally
//! otherwise         → keep width,  crop_h = template_w / target, center vertically
//! ```
//!
//! The result is divided by the template dimensions, so it is always fully
//! contained in `[0,1]²`. There is no configurable offset.

use serde::{Deserialize, Serialize};

use crate::geometry::clamp01;

/// Aspect-ratio crop presets offered by the studio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CropMode {
    /// Full template, no crop.
    #[default]
    Original,
    /// 1:1
    Square,
    /// 4:5 portrait
    FourFive,
    /// 16:9 landscape
    SixteenNine,
}

impl CropMode {
    /// Parse a crop mode name. Unknown names fall back to `Original`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "square" | "1:1" => CropMode::Square,
            "fourfive" | "four-five" | "four_five" | "4:5" => CropMode::FourFive,
            "sixteennine" | "sixteen-nine" | "sixteen_nine" | "16:9" => CropMode::SixteenNine,
            _ => CropMode::Original,
        }
    }

    /// Name of this mode as used on the wire and in the CLI.
    pub fn name(self) -> &'static str {
        match self {
            CropMode::Original => "original",
            CropMode::Square => "square",
            CropMode::FourFive => "four-five",
            CropMode::SixteenNine => "sixteen-nine",
        }
    }

    /// Target width/height ratio, `None` for `Original`.
    pub fn target_ratio(self) -> Option<f64> {
        match self {
            CropMode::Original => None,
            CropMode::Square => Some(1.0),
            CropMode::FourFive => Some(4.0 / 5.0),
            CropMode::SixteenNine => Some(16.0 / 9.0),
        }
    }

    /// All modes, in menu order.
    pub fn all() -> &'static [CropMode] {
        &[
            CropMode::Original,
            CropMode::Square,
            CropMode::FourFive,
            CropMode::SixteenNine,
        ]
    }
}

/// Normalized crop rectangle; each field is a fraction of the template size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// The identity crop covering the whole template.
    pub const FULL: CropRect = CropRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Clamp every field into `[0,1]` and shrink the size so the rectangle
    /// stays inside the template.
    pub fn clamp(self) -> CropRect {
        let x = clamp01(self.x);
        let y = clamp01(self.y);
        let mut width = clamp01(self.width);
        let mut height = clamp01(self.height);
        if x + width > 1.0 {
            width = 1.0 - x;
        }
        if y + height > 1.0 {
            height = 1.0 - y;
        }
        CropRect {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle covers a non-empty area.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Source rectangle `(x, y, width, height)` in pixels of an image of the
    /// given size. Always at least 1×1 and inside the image.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> (u32, u32, u32, u32) {
        let crop = self.clamp();
        let w = f64::from(image_width);
        let h = f64::from(image_height);

        let x0 = ((crop.x * w) as u32).min(image_width.saturating_sub(1));
        let y0 = ((crop.y * h) as u32).min(image_height.saturating_sub(1));
        let x1 = (((crop.x + crop.width) * w) as u32).min(image_width).max(x0 + 1);
        let y1 = (((crop.y + crop.height) * h) as u32).min(image_height).max(y0 + 1);

        (x0, y0, x1 - x0, y1 - y0)
    }
}

/// Compute the crop for a template of the given pixel size.
///
/// Returns `None` for [`CropMode::Original`] and for degenerate templates.
pub fn resolve_crop(template_width: u32, template_height: u32, mode: CropMode) -> Option<CropRect> {
    let target = mode.target_ratio()?;
    if template_width == 0 || template_height == 0 {
        return None;
    }

    let tw = f64::from(template_width);
    let th = f64::from(template_height);
    let current = tw / th;

    let (crop_width, crop_height, offset_x, offset_y) = if current > target {
        let crop_width = th * target;
        (crop_width, th, (tw - crop_width) / 2.0, 0.0)
    } else {
        let crop_height = tw / target;
        (tw, crop_height, 0.0, (th - crop_height) / 2.0)
    };

    Some(CropRect {
        x: offset_x / tw,
        y: offset_y / th,
        width: crop_width / tw,
        height: crop_height / th,
    })
}

/// Canvas size in pixels for a template and optional crop.
///
/// Fractional sizes truncate, and each side is at least one pixel.
pub fn canvas_size(
    template_width: u32,
    template_height: u32,
    crop: Option<CropRect>,
) -> (u32, u32) {
    let crop = crop.map(CropRect::clamp).unwrap_or(CropRect::FULL);
    let width = (crop.width * f64::from(template_width)) as u32;
    let height = (crop.height * f64::from(template_height)) as u32;
    (width.max(1), height.max(1))
}

/// Same as [`resolve_crop`] but takes a mode name; unknown names mean no crop.
pub fn resolve_crop_named(
    template_width: u32,
    template_height: u32,
    mode: &str,
) -> Option<CropRect> {
    resolve_crop(template_width, template_height, CropMode::from_name(mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_centered(crop: CropRect) {
        assert!(crop.x >= 0.0 && crop.y >= 0.0);
        assert!(crop.x + crop.width <= 1.0 + EPS);
        assert!(crop.y + crop.height <= 1.0 + EPS);
        assert!((crop.x - (1.0 - crop.width) / 2.0).abs() < EPS);
        assert!((crop.y - (1.0 - crop.height) / 2.0).abs() < EPS);
    }

    #[test]
    fn test_original_is_no_crop() {
        assert_eq!(resolve_crop(1000, 500, CropMode::Original), None);
    }

    #[test]
    fn test_unknown_mode_is_no_crop() {
        assert_eq!(resolve_crop_named(1000, 500, "panorama"), None);
        assert_eq!(resolve_crop_named(1000, 500, ""), None);
    }

    #[test]
    fn test_square_on_wide_template() {
        let crop = resolve_crop(1000, 500, CropMode::Square).unwrap();
        assert_eq!(
            crop,
            CropRect {
                x: 0.25,
                y: 0.0,
                width: 0.5,
                height: 1.0
            }
        );
    }

    #[test]
    fn test_square_on_tall_template() {
        let crop = resolve_crop(600, 908, CropMode::Square).unwrap();
        assert_eq!(crop.x, 0.0);
        assert_eq!(crop.width, 1.0);
        assert!((crop.height - 600.0 / 908.0).abs() < EPS);
        assert_centered(crop);
    }

    #[test]
    fn test_sixteen_nine_on_square_template() {
        let crop = resolve_crop(1200, 1200, CropMode::SixteenNine).unwrap();
        assert_eq!(crop.width, 1.0);
        assert!((crop.height - 9.0 / 16.0).abs() < EPS);
        assert_centered(crop);
    }

    #[test]
    fn test_matching_ratio_is_full_frame() {
        let crop = resolve_crop(800, 1000, CropMode::FourFive).unwrap();
        assert!((crop.width - 1.0).abs() < EPS);
        assert!((crop.height - 1.0).abs() < EPS);
    }

    #[test]
    fn test_crop_always_contained() {
        let sizes = [(1, 1), (1, 4000), (4000, 1), (1200, 800), (600, 908), (333, 777)];
        for &(w, h) in &sizes {
            for &mode in CropMode::all() {
                if let Some(crop) = resolve_crop(w, h, mode) {
                    assert_centered(crop);
                }
            }
        }
    }

    #[test]
    fn test_mode_names_round_trip() {
        for &mode in CropMode::all() {
            assert_eq!(CropMode::from_name(mode.name()), mode);
        }
        assert_eq!(CropMode::from_name("fourFive"), CropMode::FourFive);
        assert_eq!(CropMode::from_name("sixteenNine"), CropMode::SixteenNine);
    }

    #[test]
    fn test_clamp_shrinks_overflow() {
        let crop = CropRect {
            x: 0.6,
            y: -0.2,
            width: 0.7,
            height: 1.5,
        }
        .clamp();
        assert_eq!(crop.x, 0.6);
        assert_eq!(crop.y, 0.0);
        assert!((crop.width - 0.4).abs() < EPS);
        assert_eq!(crop.height, 1.0);
    }

    #[test]
    fn test_to_pixels_min_size() {
        let crop = CropRect {
            x: 0.999,
            y: 0.5,
            width: 0.0,
            height: 0.0,
        };
        let (x, y, w, h) = crop.to_pixels(100, 100);
        assert_eq!((x, y, w, h), (99, 50, 1, 1));
    }

    #[test]
    fn test_canvas_size() {
        assert_eq!(canvas_size(1000, 500, None), (1000, 500));
        let square = resolve_crop(1000, 500, CropMode::Square);
        assert_eq!(canvas_size(1000, 500, square), (500, 500));
        let wide = resolve_crop(600, 908, CropMode::SixteenNine);
        assert_eq!(canvas_size(600, 908, wide), (600, 337));
    }

    #[test]
    fn test_to_pixels_square() {
        let crop = resolve_crop(1000, 500, CropMode::Square).unwrap();
        assert_eq!(crop.to_pixels(1000, 500), (250, 0, 500, 500));
    }
}
