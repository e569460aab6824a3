//! # Mememe - Meme Composition Engine
//!
//! Mememe turns a meme template plus a few lines of text into a finished
//! image and a JSON payload for a delivery channel. It provides:
//!
//! - **Crop resolution**: centered aspect-ratio crops, normalized to the template
//! - **Text layout**: font sizing, greedy word wrap, anchor-based placement
//! - **Interaction**: hit testing and pointer-captured dragging of text blocks
//! - **Export**: raster rendering with outlined text, PNG/JPEG encoding
//! - **Payload**: the wire contract sent to (and parsed by) the bot backend
//!
//! ## Quick Start
//!
//! ```no_run
//! use mememe::{
//!     config::MememeConfig,
//!     crop::CropMode,
//!     fonts::FontResolver,
//!     studio::Studio,
//!     template::Template,
//! };
//!
//! # async fn demo() -> Result<(), mememe::MememeError> {
//! let config = MememeConfig::from_env();
//! let client = mememe::fetch::http_client(config.request_timeout_secs)?;
//! let mut studio = Studio::new(FontResolver::from_config(&config));
//!
//! let template = Template::new(
//!     "181913649",
//!     "Drake Hotline Bling",
//!     "https://i.imgflip.com/30b1gx.jpg",
//!     1200,
//!     1200,
//! );
//! studio.load_template(&client, template).await?;
//!
//! let comp = studio.composition_mut();
//! comp.set_crop_mode(CropMode::Square);
//! let top = comp.layers().layers()[0].id;
//! comp.update_layer_text(top, "writing tests")?;
//!
//! let jpeg = studio.export()?;
//! let payload = studio.payload_json()?;
//! # let _ = (jpeg, payload);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`geometry`] | Clamping, slider helpers, pixel rectangles |
//! | [`crop`] | Crop presets and normalized crop rectangles |
//! | [`style`] | Fonts, colors, output formats |
//! | [`layout`] | Text measurement, wrapping and placement |
//! | [`layers`] | Text layers (one to three) |
//! | [`interaction`] | Hit testing and drag state |
//! | [`composition`] | Editable meme state |
//! | [`studio`] | Composition plus loaded image and load tracking |
//! | [`catalog`] | Template list, file loading, remote refresh |
//! | [`fonts`] | Font lookup and glyph measurement |
//! | [`raster`] | Pixel canvas and image encoding |
//! | [`payload`] | Delivery payload serialization and parsing |
//! | [`config`] | Environment configuration |
//! | [`error`] | Error types |

pub mod catalog;
pub mod composition;
pub mod config;
pub mod crop;
pub mod error;
pub mod fetch;
pub mod fonts;
pub mod geometry;
pub mod interaction;
pub mod layers;
pub mod layout;
pub mod payload;
pub mod raster;
pub mod style;
pub mod studio;
pub mod template;

// Re-exports for convenience
pub use composition::Composition;
pub use config::MememeConfig;
pub use error::MememeError;
pub use payload::Payload;
pub use studio::Studio;
pub use template::Template;
