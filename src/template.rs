//! Template records.

use serde::{Deserialize, Serialize};

/// A meme template as listed by the catalog.
///
/// `width`/`height` are the authoritative pixel dimensions used for all
/// normalized math, even if the fetched thumbnail differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(rename = "thumb", alias = "thumbUrl", alias = "url")]
    pub thumb_url: String,
    pub width: u32,
    pub height: u32,
}

impl Template {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        thumb_url: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            thumb_url: thumb_url.into(),
            width,
            height,
        }
    }

    /// Width over height; 1.0 for a degenerate template.
    pub fn ratio(&self) -> f64 {
        if self.height == 0 {
            return 1.0;
        }
        f64::from(self.width) / f64::from(self.height)
    }
}
