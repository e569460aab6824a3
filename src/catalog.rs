//! # Template Catalog
//!
//! The list of templates the studio offers. Starts from a small built-in
//! seed, can be replaced by a `templates.json` file, and can be refreshed
//! from an imgflip-style listing endpoint.
//!
//! ## Listing Format
//!
//! ```json
//! { "success": true,
//!   "data": { "memes": [ { "id": "181913649", "name": "Drake Hotline Bling",
//!                          "url": "https://i.imgflip.com/30b1gx.jpg",
//!                          "width": 1200, "height": 1200 } ] } }
//! ```
//!
//! A refresh that fails or returns no usable entries keeps the current list.

use serde_json::Value;
use std::path::Path;

use crate::config::MememeConfig;
use crate::error::MememeError;
use crate::fetch;
use crate::template::Template;

/// Dimension assumed when a listing entry omits width or height.
const FALLBACK_DIMENSION: u32 = 512;

fn seed_templates() -> Vec<Template> {
    vec![
        Template::new(
            "181913649",
            "Drake Hotline Bling",
            "https://i.imgflip.com/30b1gx.jpg",
            1200,
            1200,
        ),
        Template::new(
            "112126428",
            "Distracted Boyfriend",
            "https://i.imgflip.com/1ur9b0.jpg",
            1200,
            800,
        ),
        Template::new(
            "87743020",
            "Two Buttons",
            "https://i.imgflip.com/1g8my4.jpg",
            600,
            908,
        ),
    ]
}

/// Ordered collection of templates.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    endpoint: String,
    max_templates: usize,
    templates: Vec<Template>,
}

impl TemplateCatalog {
    /// A catalog holding the built-in seed templates.
    pub fn new(endpoint: impl Into<String>, max_templates: usize) -> Self {
        Self {
            endpoint: endpoint.into(),
            max_templates,
            templates: seed_templates(),
        }
    }

    pub fn from_config(config: &MememeConfig) -> Self {
        Self::new(config.templates_endpoint.clone(), config.max_templates)
    }

    /// Replace the templates with the contents of a `templates.json` file
    /// (an array of `{id, name, thumb, width, height}`).
    pub fn load_file(&mut self, path: &Path) -> Result<usize, MememeError> {
        let raw = std::fs::read_to_string(path)?;
        let templates: Vec<Template> = serde_json::from_str(&raw).map_err(|e| {
            MememeError::ResourceLoad(format!("Invalid catalog {}: {}", path.display(), e))
        })?;
        if templates.is_empty() {
            return Err(MememeError::ResourceLoad(format!(
                "Catalog {} has no templates",
                path.display()
            )));
        }
        self.templates = templates;
        tracing::info!(
            count = self.templates.len(),
            path = %path.display(),
            "loaded template catalog"
        );
        Ok(self.templates.len())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn list(&self) -> &[Template] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Swap in a parsed listing unless it is empty. Returns the number of
    /// templates now held.
    pub fn apply_listing(&mut self, listing: Vec<Template>) -> usize {
        if listing.is_empty() {
            tracing::warn!("template refresh returned no entries; keeping existing cache");
        } else {
            self.templates = listing;
            tracing::info!(count = self.templates.len(), "template catalog refreshed");
        }
        self.templates.len()
    }

    /// Fetch the listing endpoint and replace the catalog with its entries.
    ///
    /// On failure the current templates are kept and the error returned.
    pub async fn refresh(&mut self, client: &reqwest::Client) -> Result<usize, MememeError> {
        let bytes = match fetch::fetch_bytes(client, &self.endpoint).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to refresh templates");
                return Err(e);
            }
        };
        let listing = parse_listing(&bytes, self.max_templates)?;
        Ok(self.apply_listing(listing))
    }

    /// Look a template up, refreshing once if it is not known yet.
    pub async fn ensure(
        &mut self,
        client: &reqwest::Client,
        id: &str,
    ) -> Result<Template, MememeError> {
        if let Some(template) = self.get(id) {
            return Ok(template.clone());
        }
        self.refresh(client).await?;
        self.get(id).cloned().ok_or_else(|| {
            MememeError::UserInput(format!("Template {} not found after refresh.", id))
        })
    }
}

/// Parse an imgflip-style listing, keeping at most `limit` entries.
///
/// Entries without an id or url are skipped; missing dimensions default to
/// 512 pixels.
pub fn parse_listing(raw: &[u8], limit: usize) -> Result<Vec<Template>, MememeError> {
    let data: Value = serde_json::from_slice(raw)
        .map_err(|e| MememeError::ResourceLoad(format!("Invalid template listing: {}", e)))?;

    let memes = data
        .pointer("/data/memes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    Ok(memes
        .iter()
        .take(limit)
        .filter_map(parse_listing_entry)
        .collect())
}

fn parse_listing_entry(meme: &Value) -> Option<Template> {
    let id = match meme.get("id")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let url = meme.get("url")?.as_str()?.to_string();
    let name = meme
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Template {}", id));
    let dimension = |key: &str| {
        meme.get(key)
            .and_then(Value::as_u64)
            .filter(|&v| v > 0)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(FALLBACK_DIMENSION)
    };

    Some(Template {
        width: dimension("width"),
        height: dimension("height"),
        id,
        name,
        thumb_url: url,
    })
}
