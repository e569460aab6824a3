//! # Payload
//!
//! The wire contract between the studio and the delivery channel (a bot
//! backend). The studio serializes its final state into a [`Payload`];
//! the consumer parses and normalizes it with [`Payload::parse`].
//!
//! ## Wire Format
//!
//! ```json
//! { "source": "template", "templateId": "181913649",
//!   "layers": [ { "text": "Hi", "position": "custom", "alignment": "center",
//!                 "uppercase": false, "font": "Impact.ttf",
//!                 "color": "#ffffff", "outline": "#000000",
//!                 "sizePct": 10.0, "maxWidthPct": 0.95,
//!                 "anchor": { "x": 0.5, "y": 0.1 } } ],
//!   "crop": { "x": 0.25, "y": 0.0, "width": 0.5, "height": 1.0 },
//!   "caption": "", "format": "JPEG" }
//! ```
//!
//! The serializer performs no rendering.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::composition::Composition;
use crate::crop::CropRect;
use crate::error::MememeError;
use crate::geometry::{clamp, clamp01};
use crate::style::{OutputFormat, Rgb};

/// Width fraction the consumer may use for wrapping studio layers.
pub const STUDIO_MAX_WIDTH_PCT: f64 = 0.95;

/// Caption used by the consumer when none is given.
pub const DEFAULT_CAPTION: &str = "memeME";

/// Longest caption the delivery channel accepts.
pub const MAX_CAPTION_CHARS: usize = 1024;

/// Where the base image comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    #[default]
    Template,
    Telegram,
    Url,
}

/// Vertical placement preset of a layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerPosition {
    #[default]
    Top,
    Bottom,
    Center,
    /// Placed by the layer's anchor.
    Custom,
}

impl LayerPosition {
    fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "top" => LayerPosition::Top,
            "bottom" => LayerPosition::Bottom,
            "center" => LayerPosition::Center,
            _ => LayerPosition::Custom,
        }
    }
}

/// Horizontal alignment of a layer's lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "left" => Alignment::Left,
            "right" => Alignment::Right,
            _ => Alignment::Center,
        }
    }
}

/// Normalized anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

/// One text layer on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadLayer {
    pub text: String,
    pub position: LayerPosition,
    pub alignment: Alignment,
    pub uppercase: bool,
    /// Font file name.
    pub font: String,
    pub color: Rgb,
    pub outline: Rgb,
    pub size_pct: f64,
    pub max_width_pct: f64,
    pub anchor: Anchor,
}

/// Everything the delivery channel needs to produce the meme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub source: ImageSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub layers: Vec<PayloadLayer>,
    pub crop: Option<CropRect>,
    pub caption: String,
    pub format: OutputFormat,
}

/// Convert a composition into its payload.
///
/// Fails without a selected template, or when every layer is blank. Blank
/// layers are left out; text is trimmed.
pub fn serialize(composition: &Composition) -> Result<Payload, MememeError> {
    let template = composition
        .template()
        .ok_or_else(|| MememeError::UserInput("Pick a template first.".to_string()))?;

    let style = &composition.style;
    let layers: Vec<PayloadLayer> = composition
        .layers()
        .iter()
        .filter(|layer| !layer.is_blank())
        .map(|layer| {
            let (x, y) = layer.anchor();
            PayloadLayer {
                text: layer.text.trim().to_string(),
                position: LayerPosition::Custom,
                alignment: Alignment::Center,
                uppercase: style.uppercase,
                font: style.font.file_name().to_string(),
                color: style.fill,
                outline: style.outline,
                size_pct: style.size_pct,
                max_width_pct: STUDIO_MAX_WIDTH_PCT,
                anchor: Anchor { x, y },
            }
        })
        .collect();

    if layers.is_empty() {
        return Err(MememeError::UserInput("Add some text first.".to_string()));
    }

    Ok(Payload {
        source: ImageSource::Template,
        template_id: Some(template.id.clone()),
        telegram_file_id: None,
        image_url: None,
        layers,
        crop: composition.crop(),
        caption: composition.caption.clone(),
        format: composition.format,
    })
}

impl Payload {
    /// Encode as compact JSON for sending.
    pub fn to_json(&self) -> Result<String, MememeError> {
        serde_json::to_string(self).map_err(|e| MememeError::Payload(e.to_string()))
    }

    /// Caption to post with the image: the given one, or the default when
    /// blank, cut to the channel limit.
    pub fn caption_or_default(&self) -> String {
        let caption = self.caption.trim();
        let caption = if caption.is_empty() {
            DEFAULT_CAPTION
        } else {
            caption
        };
        caption.chars().take(MAX_CAPTION_CHARS).collect()
    }

    /// Parse and normalize a payload received from a studio.
    ///
    /// Lenient about missing fields, strict about having something to draw:
    /// blank layers are dropped and at least one must remain, and the chosen
    /// source must carry its identifier.
    pub fn parse(raw: &str) -> Result<Payload, MememeError> {
        let data: RawPayload =
            serde_json::from_str(raw).map_err(|e| MememeError::Payload(e.to_string()))?;

        let template_id = data.template_id.as_ref().and_then(clean_string);
        let telegram_file_id = data.telegram_file_id.as_ref().and_then(clean_string);
        let image_url = data.image_url.as_ref().and_then(clean_string);

        let source = match data.source.as_deref().map(str::trim) {
            Some("telegram") if telegram_file_id.is_some() => ImageSource::Telegram,
            Some("url") if image_url.is_some() => ImageSource::Url,
            _ => ImageSource::Template,
        };

        let layers: Vec<PayloadLayer> = data.layers.iter().filter_map(normalize_layer).collect();
        if layers.is_empty() {
            return Err(MememeError::UserInput("No text layers supplied.".to_string()));
        }

        let payload = Payload {
            source,
            template_id: template_id.filter(|_| source == ImageSource::Template),
            telegram_file_id: telegram_file_id.filter(|_| source == ImageSource::Telegram),
            image_url: image_url.filter(|_| source == ImageSource::Url),
            layers,
            crop: data.crop.as_ref().and_then(RawCrop::normalize),
            caption: data
                .caption
                .as_ref()
                .and_then(clean_string)
                .unwrap_or_default(),
            format: data
                .format
                .as_deref()
                .and_then(OutputFormat::from_name)
                .unwrap_or(OutputFormat::Jpeg),
        };
        payload.validate()?;
        Ok(payload)
    }

    /// Check that the payload names its image and has text to draw.
    pub fn validate(&self) -> Result<(), MememeError> {
        if self.layers.is_empty() {
            return Err(MememeError::UserInput(
                "At least one text layer is required.".to_string(),
            ));
        }
        match self.source {
            ImageSource::Template if self.template_id.is_none() => Err(MememeError::UserInput(
                "Template source selected without template_id.".to_string(),
            )),
            ImageSource::Telegram if self.telegram_file_id.is_none() => Err(
                MememeError::UserInput("Telegram source selected without file id.".to_string()),
            ),
            ImageSource::Url if self.image_url.is_none() => Err(MememeError::UserInput(
                "Remote URL source selected without image_url.".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawPayload {
    source: Option<String>,
    template_id: Option<Value>,
    telegram_file_id: Option<Value>,
    image_url: Option<Value>,
    layers: Vec<RawLayer>,
    crop: Option<RawCrop>,
    caption: Option<Value>,
    format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawLayer {
    text: Option<Value>,
    color: Option<String>,
    outline: Option<String>,
    size_pct: Option<Value>,
    position: Option<String>,
    alignment: Option<String>,
    uppercase: Option<Value>,
    anchor: Option<RawAnchor>,
    max_width_pct: Option<Value>,
    font: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAnchor {
    x: Option<Value>,
    y: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCrop {
    x: Option<Value>,
    y: Option<Value>,
    width: Option<Value>,
    height: Option<Value>,
}

impl RawCrop {
    fn normalize(&self) -> Option<CropRect> {
        let crop = CropRect {
            x: self.x.as_ref().and_then(number)?,
            y: self.y.as_ref().and_then(number)?,
            width: self.width.as_ref().and_then(number)?,
            height: self.height.as_ref().and_then(number)?,
        }
        .clamp();
        crop.has_area().then_some(crop)
    }
}

fn normalize_layer(raw: &RawLayer) -> Option<PayloadLayer> {
    let text = raw.text.as_ref().and_then(clean_string)?;
    let anchor = raw.anchor.as_ref();

    Some(PayloadLayer {
        text,
        position: raw
            .position
            .as_deref()
            .map(LayerPosition::from_name)
            .unwrap_or_default(),
        alignment: raw
            .alignment
            .as_deref()
            .map(Alignment::from_name)
            .unwrap_or_default(),
        uppercase: raw.uppercase.as_ref().and_then(flag).unwrap_or(true),
        font: raw
            .font
            .as_ref()
            .and_then(clean_string)
            .unwrap_or_else(|| "Impact.ttf".to_string()),
        color: raw
            .color
            .as_deref()
            .map_or(Rgb::WHITE, |c| Rgb::parse_or(c, Rgb::WHITE)),
        outline: raw
            .outline
            .as_deref()
            .map_or(Rgb::BLACK, |c| Rgb::parse_or(c, Rgb::WHITE)),
        size_pct: raw.size_pct.as_ref().and_then(number).unwrap_or(8.0),
        max_width_pct: clamp(
            raw.max_width_pct.as_ref().and_then(number).unwrap_or(0.9),
            0.2,
            1.0,
        ),
        anchor: Anchor {
            x: clamp01(anchor.and_then(|a| a.x.as_ref()).and_then(number).unwrap_or(0.5)),
            y: clamp01(anchor.and_then(|a| a.y.as_ref()).and_then(number).unwrap_or(0.5)),
        },
    })
}

/// Trimmed string form of a JSON scalar; `None` for null or blank.
fn clean_string(value: &Value) -> Option<String> {
    let raw = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Finite number from a JSON number or numeric string.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Boolean from a JSON bool, number or `"true"`/`"false"` style string.
fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::CropMode;
    use crate::layers::AnchorField;
    use crate::template::Template;
    use pretty_assertions::assert_eq;

    fn studio_composition() -> Composition {
        let mut comp = Composition::new();
        comp.set_template(Template::new("61579", "One Does Not Simply", "t.jpg", 1000, 500));
        comp.set_crop_mode(CropMode::Square);
        comp.style.uppercase = false;
        let id = comp.layers().layers()[0].id;
        comp.update_layer_text(id, "  Hi  ").unwrap();
        comp.update_layer_anchor(id, AnchorField::X, 0.5).unwrap();
        comp.update_layer_anchor(id, AnchorField::Y, 0.1).unwrap();
        comp
    }

    #[test]
    fn test_serialize_square_crop() {
        let payload = serialize(&studio_composition()).unwrap();
        assert_eq!(payload.template_id.as_deref(), Some("61579"));
        assert_eq!(
            payload.crop,
            Some(CropRect {
                x: 0.25,
                y: 0.0,
                width: 0.5,
                height: 1.0
            })
        );
        assert_eq!(payload.layers.len(), 1);
        let layer = &payload.layers[0];
        assert_eq!(layer.text, "Hi");
        assert_eq!(layer.anchor, Anchor { x: 0.5, y: 0.1 });
        assert_eq!(layer.alignment, Alignment::Center);
        assert_eq!(layer.max_width_pct, 0.95);
        assert!(!layer.uppercase);
    }

    #[test]
    fn test_serialize_without_template_fails() {
        let mut comp = Composition::new();
        let id = comp.layers().layers()[0].id;
        comp.update_layer_text(id, "text").unwrap();
        let err = serialize(&comp).unwrap_err();
        assert!(matches!(err, MememeError::UserInput(ref m) if m == "Pick a template first."));
    }

    #[test]
    fn test_serialize_blank_layers_fails() {
        let mut comp = Composition::new();
        comp.set_template(Template::new("1", "x", "x.jpg", 10, 10));
        let id = comp.layers().layers()[0].id;
        comp.update_layer_text(id, " \n\t ").unwrap();
        let err = serialize(&comp).unwrap_err();
        assert!(matches!(err, MememeError::UserInput(ref m) if m == "Add some text first."));
    }

    #[test]
    fn test_wire_field_names() {
        let json = serialize(&studio_composition()).unwrap().to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "template");
        assert_eq!(value["templateId"], "61579");
        assert_eq!(value["format"], "JPEG");
        assert_eq!(value["layers"][0]["sizePct"], 10.0);
        assert_eq!(value["layers"][0]["maxWidthPct"], 0.95);
        assert_eq!(value["layers"][0]["position"], "custom");
        assert_eq!(value["layers"][0]["color"], "#ffffff");
        assert!(value.get("telegramFileId").is_none());
    }

    #[test]
    fn test_original_crop_is_null() {
        let mut comp = studio_composition();
        comp.set_crop_mode(CropMode::Original);
        let json = serialize(&comp).unwrap().to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert!(value["crop"].is_null());
    }

    #[test]
    fn test_parse_applies_defaults_and_clamps() {
        let raw = r##"{
            "templateId": 181913649,
            "layers": [
                {"text": "  top  ", "anchor": {"x": 3.0, "y": -1}, "maxWidthPct": 0.01,
                 "color": "#F00", "outline": "nonsense"},
                {"text": "   "},
                {"sizePct": 12}
            ],
            "crop": {"x": 0.5, "y": 0.0, "width": 0.9, "height": 1.0},
            "format": "png"
        }"##;
        let payload = Payload::parse(raw).unwrap();
        assert_eq!(payload.source, ImageSource::Template);
        assert_eq!(payload.template_id.as_deref(), Some("181913649"));
        assert_eq!(payload.layers.len(), 1);

        let layer = &payload.layers[0];
        assert_eq!(layer.text, "top");
        assert_eq!(layer.anchor, Anchor { x: 1.0, y: 0.0 });
        assert_eq!(layer.max_width_pct, 0.2);
        assert_eq!(layer.color, Rgb(255, 0, 0));
        assert_eq!(layer.outline, Rgb::WHITE);
        assert_eq!(layer.position, LayerPosition::Top);
        assert!(layer.uppercase);
        assert_eq!(layer.font, "Impact.ttf");
        assert_eq!(layer.size_pct, 8.0);

        assert_eq!(payload.crop.unwrap().width, 0.5);
        assert_eq!(payload.format, OutputFormat::Png);
    }

    #[test]
    fn test_parse_drops_degenerate_crop() {
        let raw = r#"{"templateId":"1","layers":[{"text":"a"}],
                      "crop":{"x":1.0,"y":0.0,"width":0.5,"height":1.0}}"#;
        assert_eq!(Payload::parse(raw).unwrap().crop, None);
        let partial = r#"{"templateId":"1","layers":[{"text":"a"}],"crop":{"x":0.1}}"#;
        assert_eq!(Payload::parse(partial).unwrap().crop, None);
    }

    #[test]
    fn test_parse_requires_text() {
        let err = Payload::parse(r#"{"templateId":"1","layers":[{"text":""}]}"#).unwrap_err();
        assert!(matches!(err, MememeError::UserInput(_)));
    }

    #[test]
    fn test_parse_requires_source_id() {
        let err = Payload::parse(r#"{"layers":[{"text":"a"}]}"#).unwrap_err();
        assert_eq!(err.to_string(), "Template source selected without template_id.");
    }

    #[test]
    fn test_parse_other_sources() {
        let url = Payload::parse(
            r#"{"source":"url","imageUrl":"https://x/y.png","templateId":"9",
                "layers":[{"text":"a"}]}"#,
        )
        .unwrap();
        assert_eq!(url.source, ImageSource::Url);
        assert_eq!(url.template_id, None);

        // telegram without a file id falls back to the template source
        let fallback = Payload::parse(
            r#"{"source":"telegram","templateId":"9","layers":[{"text":"a"}]}"#,
        )
        .unwrap();
        assert_eq!(fallback.source, ImageSource::Template);
    }

    #[test]
    fn test_parse_accepts_numeric_strings() {
        let payload = Payload::parse(
            r#"{"templateId":"1","layers":[{"text":"a","sizePct":"12","uppercase":"false",
                "maxWidthPct":" 0.5 ","anchor":{"x":"0.25","y":2}}],
                "crop":{"x":"0.1","y":0,"width":"0.5","height":"1"}}"#,
        )
        .unwrap();
        let layer = &payload.layers[0];
        assert_eq!(layer.size_pct, 12.0);
        assert!(!layer.uppercase);
        assert_eq!(layer.max_width_pct, 0.5);
        assert_eq!(layer.anchor, Anchor { x: 0.25, y: 1.0 });
        assert_eq!(payload.crop.unwrap().width, 0.5);
    }

    #[test]
    fn test_parse_unreadable_numbers_use_defaults() {
        let payload = Payload::parse(
            r#"{"templateId":"1","layers":[{"text":"a","sizePct":"huge","uppercase":[],
                "anchor":{"x":null}}],"crop":{"x":"?","y":0,"width":1,"height":1}}"#,
        )
        .unwrap();
        let layer = &payload.layers[0];
        assert_eq!(layer.size_pct, 8.0);
        assert!(layer.uppercase);
        assert_eq!(layer.anchor, Anchor { x: 0.5, y: 0.5 });
        assert_eq!(payload.crop, None);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = Payload::parse("{not json").unwrap_err();
        assert!(matches!(err, MememeError::Payload(_)));
    }

    #[test]
    fn test_studio_payload_parses_back() {
        let sent = serialize(&studio_composition()).unwrap();
        let received = Payload::parse(&sent.to_json().unwrap()).unwrap();
        assert_eq!(received, sent);
    }

    #[test]
    fn test_caption_or_default() {
        let mut payload = serialize(&studio_composition()).unwrap();
        assert_eq!(payload.caption_or_default(), "memeME");
        payload.caption = "x".repeat(2000);
        assert_eq!(payload.caption_or_default().chars().count(), MAX_CAPTION_CHARS);
    }
}
