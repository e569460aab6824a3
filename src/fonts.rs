//! TTF font lookup and measurement.
//!
//! Fonts are located by file name: first as a path on their own, then
//! under each configured search directory. The requested font is tried
//! before the configured default.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use std::path::{Path, PathBuf};

use crate::config::MememeConfig;
use crate::error::MememeError;
use crate::layout::TextMeasure;

/// Finds and loads font files.
#[derive(Debug, Clone)]
pub struct FontResolver {
    search_paths: Vec<PathBuf>,
    default_font: String,
}

impl FontResolver {
    pub fn new(search_paths: Vec<PathBuf>, default_font: impl Into<String>) -> Self {
        Self {
            search_paths,
            default_font: default_font.into(),
        }
    }

    pub fn from_config(config: &MememeConfig) -> Self {
        Self::new(config.font_search_paths.clone(), config.default_font.clone())
    }

    /// Path of the first existing candidate for `font_name`.
    pub fn locate(&self, font_name: &str) -> Option<PathBuf> {
        [font_name, self.default_font.as_str()]
            .into_iter()
            .filter(|name| !name.is_empty())
            .find_map(|name| {
                let direct = Path::new(name);
                if direct.is_file() {
                    return Some(direct.to_path_buf());
                }
                self.search_paths
                    .iter()
                    .map(|base| base.join(name))
                    .find(|candidate| candidate.is_file())
            })
    }

    /// Load `font_name`, falling back to the default font.
    pub fn load(&self, font_name: &str) -> Result<FontArc, MememeError> {
        let path = self.locate(font_name).ok_or_else(|| {
            MememeError::Font(format!(
                "'{}' not found (default '{}', searched {:?}); set MEMEME_FONT_PATHS",
                font_name, self.default_font, self.search_paths
            ))
        })?;
        let bytes = std::fs::read(&path)?;
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| MememeError::Font(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(font = font_name, path = %path.display(), "font loaded");
        Ok(font)
    }
}

/// Pixel scale at which glyphs are one `font_size` em tall, matching how
/// CSS and canvas APIs interpret a font size.
pub fn em_scale(font: &FontArc, font_size: f64) -> PxScale {
    let size = font_size as f32;
    match font.units_per_em() {
        Some(units) if units > 0.0 => PxScale::from(size * font.height_unscaled() / units),
        _ => PxScale::from(size),
    }
}

/// Measures text with a loaded font, including kerning.
#[derive(Clone)]
pub struct GlyphMeasure {
    font: FontArc,
}

impl GlyphMeasure {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }
}

impl TextMeasure for GlyphMeasure {
    fn measure(&self, text: &str, font_size: f64) -> f64 {
        let scaled = self.font.as_scaled(em_scale(&self.font, font_size));
        let mut width = 0.0f32;
        let mut previous = None;
        for ch in text.chars() {
            let glyph_id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, glyph_id);
            }
            width += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
        f64::from(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_in_search_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Anton-Regular.ttf"), b"not really a font").unwrap();

        let resolver = FontResolver::new(
            vec![PathBuf::from("/nonexistent"), dir.path().into()],
            "Impact.ttf",
        );
        assert_eq!(
            resolver.locate("Anton-Regular.ttf"),
            Some(dir.path().join("Anton-Regular.ttf"))
        );
    }

    #[test]
    fn test_locate_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Impact.ttf"), b"x").unwrap();

        let resolver = FontResolver::new(vec![dir.path().into()], "Impact.ttf");
        assert_eq!(
            resolver.locate("Missing.ttf"),
            Some(dir.path().join("Impact.ttf"))
        );
    }

    #[test]
    fn test_missing_font_is_font_error() {
        let resolver = FontResolver::new(vec![PathBuf::from("/nonexistent")], "Nope.ttf");
        assert!(matches!(resolver.load("Missing.ttf"), Err(MememeError::Font(_))));
    }

    #[test]
    fn test_invalid_font_data_is_font_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Broken.ttf"), b"garbage").unwrap();
        let resolver = FontResolver::new(vec![dir.path().into()], "Broken.ttf");
        assert!(matches!(resolver.load("Broken.ttf"), Err(MememeError::Font(_))));
    }
}
