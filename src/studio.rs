//! # Studio
//!
//! A [`Composition`] together with the decoded template image it draws on.
//!
//! Selecting a template is the one asynchronous step: the image has to be
//! fetched before the selection takes effect. Each request gets a
//! [`LoadTicket`] with a new generation number, and only the ticket of the
//! latest request is applied when its load finishes:
//!
//! ```text
//! request A (gen 1) ──┐
//! request B (gen 2) ──┼── B finishes → applied
//!                     └── A finishes → Superseded, discarded
//! ```
//!
//! Until a load is applied the previous template and image stay in place,
//! and a failed load leaves them untouched.

use ab_glyph::FontArc;
use image::DynamicImage;
use std::path::Path;

use crate::composition::Composition;
use crate::error::MememeError;
use crate::fetch;
use crate::fonts::FontResolver;
use crate::layout::LayoutBox;
use crate::raster::RasterSurface;
use crate::style::FontKey;
use crate::template::Template;

/// Handle for one template load request.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    template: Template,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

/// What happened to a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The template and image are now current.
    Applied,
    /// A newer request was made; this load was discarded.
    Superseded,
}

/// Editing session: composition, loaded image and fonts.
pub struct Studio {
    composition: Composition,
    image: Option<DynamicImage>,
    latest_generation: u64,
    fonts: FontResolver,
    font: Option<(FontKey, FontArc)>,
}

impl Studio {
    pub fn new(fonts: FontResolver) -> Self {
        Self {
            composition: Composition::new(),
            image: None,
            latest_generation: 0,
            fonts,
            font: None,
        }
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn composition_mut(&mut self) -> &mut Composition {
        &mut self.composition
    }

    /// Decoded image of the current template.
    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    /// Start loading `template`. Any earlier ticket becomes stale.
    pub fn request_template(&mut self, template: Template) -> LoadTicket {
        self.latest_generation += 1;
        tracing::debug!(
            id = %template.id,
            generation = self.latest_generation,
            "template requested"
        );
        LoadTicket {
            generation: self.latest_generation,
            template,
        }
    }

    /// Whether `ticket` belongs to the most recent request.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.latest_generation
    }

    /// Complete a load started with [`Studio::request_template`].
    ///
    /// Stale tickets are discarded whether they succeeded or not. A failure
    /// of the latest ticket keeps the previous template and image and is
    /// returned as a `ResourceLoad` error.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<DynamicImage, MememeError>,
    ) -> Result<LoadOutcome, MememeError> {
        if !self.is_current(&ticket) {
            tracing::debug!(
                id = %ticket.template.id,
                generation = ticket.generation,
                latest = self.latest_generation,
                "discarding superseded template load"
            );
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(image) => {
                self.composition.set_template(ticket.template);
                self.image = Some(image);
                Ok(LoadOutcome::Applied)
            }
            Err(e) => {
                tracing::warn!(id = %ticket.template.id, error = %e, "template load failed");
                Err(match e {
                    MememeError::ResourceLoad(_) => e,
                    other => MememeError::ResourceLoad(other.to_string()),
                })
            }
        }
    }

    /// Request, fetch and apply a template in one step.
    pub async fn load_template(
        &mut self,
        client: &reqwest::Client,
        template: Template,
    ) -> Result<LoadOutcome, MememeError> {
        let ticket = self.request_template(template);
        let result = fetch::fetch_template_image(client, ticket.template()).await;
        self.finish_load(ticket, result)
    }

    /// Font for the current style, loaded once per font key.
    fn font(&mut self) -> Result<FontArc, MememeError> {
        let key = self.composition.style.font;
        if let Some((cached, font)) = &self.font
            && *cached == key
        {
            return Ok(font.clone());
        }
        let font = self.fonts.load(key.file_name())?;
        self.font = Some((key, font.clone()));
        Ok(font)
    }

    /// Draw the composition onto a fresh canvas.
    pub fn compose(&mut self) -> Result<RasterSurface, MememeError> {
        if self.image.is_none() || self.composition.template().is_none() {
            return Err(no_template());
        }
        let font = self.font()?;
        let (Some(image), Some(template)) = (&self.image, self.composition.template()) else {
            return Err(no_template());
        };
        let mut surface =
            RasterSurface::from_template(image, template, self.composition.crop(), font);
        self.composition.render(&mut surface);
        Ok(surface)
    }

    /// Compose and encode in the composition's output format.
    pub fn export(&mut self) -> Result<Vec<u8>, MememeError> {
        let format = self.composition.format;
        self.compose()?.encode(format)
    }

    /// Compose and write the result to `path`.
    pub fn save(&mut self, path: &Path) -> Result<(), MememeError> {
        let format = self.composition.format;
        self.compose()?.save(path, format)
    }

    /// Boxes from the last compose, for hit-testing.
    pub fn layout_boxes(&self) -> &[LayoutBox] {
        self.composition.layout_boxes()
    }

    /// Payload JSON for the delivery channel.
    pub fn payload_json(&self) -> Result<String, MememeError> {
        self.composition.payload()?.to_json()
    }
}

fn no_template() -> MememeError {
    MememeError::RenderingPrecondition("Pick a template first.".to_string())
}
