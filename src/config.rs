//! # Configuration
//!
//! Runtime settings read from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `MEMEME_TEMPLATE_ENDPOINT` | `https://api.imgflip.com/get_memes` |
//! | `MEMEME_TEMPLATE_LIMIT` | `70` |
//! | `MEMEME_FONT_PATHS` | `fonts,/usr/share/fonts,/usr/local/share/fonts` |
//! | `MEMEME_DEFAULT_FONT` | `Impact.ttf` |
//! | `MEMEME_HTTP_TIMEOUT_SECS` | `15` |

use std::path::PathBuf;

pub const DEFAULT_TEMPLATE_ENDPOINT: &str = "https://api.imgflip.com/get_memes";
pub const DEFAULT_TEMPLATE_LIMIT: usize = 70;
pub const DEFAULT_FONT: &str = "Impact.ttf";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Settings for catalog refresh, font lookup and downloads.
#[derive(Debug, Clone, PartialEq)]
pub struct MememeConfig {
    /// Imgflip-compatible listing endpoint.
    pub templates_endpoint: String,
    /// Maximum number of templates kept after a refresh.
    pub max_templates: usize,
    /// Directories searched for font files.
    pub font_search_paths: Vec<PathBuf>,
    /// Font file used when the requested one is missing.
    pub default_font: String,
    pub request_timeout_secs: u64,
}

impl Default for MememeConfig {
    fn default() -> Self {
        Self {
            templates_endpoint: DEFAULT_TEMPLATE_ENDPOINT.to_string(),
            max_templates: DEFAULT_TEMPLATE_LIMIT,
            font_search_paths: default_font_paths(),
            default_font: DEFAULT_FONT.to_string(),
            request_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl MememeConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; missing, blank or unparsable values
    /// fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let templates_endpoint = non_blank("MEMEME_TEMPLATE_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_TEMPLATE_ENDPOINT.to_string());
        let max_templates = non_blank("MEMEME_TEMPLATE_LIMIT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TEMPLATE_LIMIT);
        let default_font =
            non_blank("MEMEME_DEFAULT_FONT").unwrap_or_else(|| DEFAULT_FONT.to_string());
        let request_timeout_secs = non_blank("MEMEME_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        let font_search_paths = match non_blank("MEMEME_FONT_PATHS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(PathBuf::from)
                .collect(),
            None => default_font_paths(),
        };

        Self {
            templates_endpoint,
            max_templates,
            font_search_paths,
            default_font,
            request_timeout_secs,
        }
    }
}

fn default_font_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("fonts"),
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
    ]
}
