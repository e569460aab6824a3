//! # Mememe CLI
//!
//! Command-line interface for composing memes from templates.
//!
//! ## Usage
//!
//! ```bash
//! # List the built-in templates
//! mememe templates
//!
//! # Refresh the list from imgflip first
//! mememe templates --refresh
//!
//! # Fonts accepted by --font
//! mememe fonts
//!
//! # Classic top/bottom meme
//! mememe compose --template 181913649 --text "writing code" --text "writing tests"
//!
//! # Square crop, custom anchor, PNG output and the bot payload
//! mememe compose --template 112126428 --crop square \
//!     --text "me" --anchor 0.3,0.6 --format png --out meme.png --payload meme.json
//!
//! # Check a payload as the bot would read it
//! mememe inspect meme.json
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use mememe::{
    MememeConfig, MememeError, Payload, Studio,
    catalog::TemplateCatalog,
    crop::CropMode,
    fetch,
    fonts::FontResolver,
    geometry::percent,
    layers::{LayerSet, MAX_LAYERS, TextLayer},
    raster,
    style::{FontKey, OutputFormat, Rgb, SIZE_PCT_RANGE},
};

/// Anchors for layers given without `--anchor`, by position.
const DEFAULT_ANCHORS: [(f64, f64); MAX_LAYERS] = [(0.5, 0.12), (0.5, 0.85), (0.5, 0.5)];

/// Mememe - meme composition utility
#[derive(Parser, Debug)]
#[command(name = "mememe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available templates
    Templates {
        /// Load templates from a JSON file instead of the built-in list
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// Refresh the list from the template endpoint
        #[arg(long)]
        refresh: bool,
    },

    /// List available fonts
    Fonts,

    /// Compose a meme and export it
    Compose {
        /// Template id
        #[arg(long)]
        template: String,

        /// Load templates from a JSON file instead of the built-in list
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// Use a local image instead of downloading the template
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,

        /// Layer text, up to three times
        #[arg(long = "text", required = true)]
        texts: Vec<String>,

        /// Layer anchor as X,Y fractions, matched to --text by position
        #[arg(long = "anchor", value_name = "X,Y", value_parser = parse_anchor)]
        anchors: Vec<(f64, f64)>,

        /// Crop preset: original, square, four-five, sixteen-nine
        #[arg(long, default_value = "original")]
        crop: String,

        /// Font: impact, anton, bebas, poppins
        #[arg(long, default_value = "impact", value_parser = parse_font)]
        font: FontKey,

        /// Fill color
        #[arg(long, default_value = "#ffffff")]
        color: String,

        /// Outline color
        #[arg(long, default_value = "#000000")]
        outline: String,

        /// Text size percentage, 4 to 30
        #[arg(long, default_value = "10", value_parser = parse_size_pct)]
        size: f64,

        /// Upper-case all text
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        uppercase: bool,

        /// Caption sent with the image
        #[arg(long, default_value = "")]
        caption: String,

        /// Output format: png or jpeg
        #[arg(long, default_value = "jpeg")]
        format: String,

        /// Output image path (defaults to mememe-<millis>.<ext>)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Also write the delivery payload JSON
        #[arg(long, value_name = "FILE")]
        payload: Option<PathBuf>,
    },

    /// Parse a payload file and print what it describes
    Inspect {
        /// Payload JSON file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mememe=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), MememeError> {
    let cli = Cli::parse();
    let config = MememeConfig::from_env();

    match cli.command {
        Commands::Templates { catalog, refresh } => {
            let mut templates = open_catalog(&config, catalog.as_deref())?;
            if refresh {
                let client = fetch::http_client(config.request_timeout_secs)?;
                if let Err(e) = templates.refresh(&client).await {
                    eprintln!(
                        "Refresh from {} failed, showing cached templates: {}",
                        templates.endpoint(),
                        e
                    );
                }
            }

            println!("Available templates:");
            for template in templates.list() {
                println!(
                    "  {:<12} {:<32} {}x{}",
                    template.id, template.name, template.width, template.height
                );
            }
            Ok(())
        }

        Commands::Fonts => {
            println!("Available fonts:");
            for font in FontKey::all() {
                println!(
                    "  {:<8} {:<24} {}",
                    font.name(),
                    font.file_name(),
                    font.family()
                );
            }
            Ok(())
        }

        Commands::Compose {
            template,
            catalog,
            image,
            texts,
            anchors,
            crop,
            font,
            color,
            outline,
            size,
            uppercase,
            caption,
            format,
            out,
            payload,
        } => {
            if texts.len() > MAX_LAYERS {
                return Err(MememeError::UserInput(
                    "Maximum of three layers for now.".to_string(),
                ));
            }
            let format = OutputFormat::from_name(&format).ok_or_else(|| {
                MememeError::UserInput(format!("Unknown format '{}'. Use png or jpeg.", format))
            })?;
            let fill = parse_color(&color)?;
            let outline = parse_color(&outline)?;

            let client = fetch::http_client(config.request_timeout_secs)?;
            let mut templates = open_catalog(&config, catalog.as_deref())?;
            let template = templates.ensure(&client, &template).await?;

            let mut studio = Studio::new(FontResolver::from_config(&config));
            match image {
                Some(path) => {
                    let ticket = studio.request_template(template);
                    let result = std::fs::read(&path)
                        .map_err(MememeError::from)
                        .and_then(|bytes| fetch::decode_image(&bytes));
                    studio.finish_load(ticket, result)?;
                }
                None => {
                    println!("Downloading {}...", template.name);
                    studio.load_template(&client, template).await?;
                }
            }

            let comp = studio.composition_mut();
            comp.set_crop_mode(CropMode::from_name(&crop));
            comp.set_layers(build_layers(&texts, &anchors));
            comp.style.font = font;
            comp.style.fill = fill;
            comp.style.outline = outline;
            comp.style.size_pct = size;
            comp.style.uppercase = uppercase;
            comp.caption = caption;
            comp.format = format;

            let out = out.unwrap_or_else(|| PathBuf::from(raster::default_file_name(format)));
            studio.save(&out)?;
            println!(
                "Saved {} ({} text block(s))",
                out.display(),
                studio.layout_boxes().len()
            );

            if let Some(path) = payload {
                std::fs::write(&path, studio.payload_json()?)?;
                println!("Wrote payload to {}", path.display());
            }
            Ok(())
        }

        Commands::Inspect { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let payload = Payload::parse(&raw)?;
            print_payload(&payload);
            Ok(())
        }
    }
}

fn open_catalog(
    config: &MememeConfig,
    path: Option<&Path>,
) -> Result<TemplateCatalog, MememeError> {
    let mut catalog = TemplateCatalog::from_config(config);
    if let Some(path) = path {
        catalog.load_file(path)?;
    }
    Ok(catalog)
}

fn build_layers(texts: &[String], anchors: &[(f64, f64)]) -> LayerSet {
    let layers = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let (x, y) = anchors
                .get(i)
                .or_else(|| DEFAULT_ANCHORS.get(i))
                .copied()
                .unwrap_or((0.5, 0.5));
            let mut layer = TextLayer::new(x, y);
            layer.text = text.clone();
            layer
        })
        .collect();
    LayerSet::from_layers(layers)
}

fn parse_anchor(value: &str) -> Result<(f64, f64), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", value))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid anchor component '{}': {}", part, e))
    };
    Ok((parse(x)?, parse(y)?))
}

fn parse_font(value: &str) -> Result<FontKey, String> {
    let wanted = value.trim().to_lowercase();
    FontKey::all()
        .iter()
        .copied()
        .find(|font| font.name() == wanted)
        .ok_or_else(|| {
            let names: Vec<_> = FontKey::all().iter().map(|f| f.name()).collect();
            format!("unknown font '{}', expected one of: {}", value, names.join(", "))
        })
}

fn parse_size_pct(value: &str) -> Result<f64, String> {
    let size: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{}': {}", value, e))?;
    if !SIZE_PCT_RANGE.contains(&size) {
        return Err(format!(
            "size must be between {} and {}",
            SIZE_PCT_RANGE.start(),
            SIZE_PCT_RANGE.end()
        ));
    }
    Ok(size)
}

fn parse_color(value: &str) -> Result<Rgb, MememeError> {
    Rgb::parse_hex(value).ok_or_else(|| {
        MememeError::UserInput(format!("Invalid color '{}'. Use #rgb or #rrggbb.", value))
    })
}

fn print_payload(payload: &Payload) {
    let image = payload
        .template_id
        .as_deref()
        .or(payload.telegram_file_id.as_deref())
        .or(payload.image_url.as_deref())
        .unwrap_or("-");
    println!("Source:  {:?} ({})", payload.source, image);
    match payload.crop {
        Some(crop) => println!(
            "Crop:    x={} y={} w={} h={}",
            percent(crop.x),
            percent(crop.y),
            percent(crop.width),
            percent(crop.height)
        ),
        None => println!("Crop:    none"),
    }
    println!("Format:  {:?}", payload.format);
    println!("Caption: {}", payload.caption_or_default());
    println!("Layers:");
    for layer in &payload.layers {
        println!(
            "  \"{}\" at ({}, {}) {} {} on {} size {}%",
            layer.text,
            percent(layer.anchor.x),
            percent(layer.anchor.y),
            layer.font,
            layer.color,
            layer.outline,
            layer.size_pct
        );
    }
}
