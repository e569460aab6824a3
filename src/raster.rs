//! # Raster Surface
//!
//! Pixel canvas used for export: the cropped template image with text
//! drawn on top using `ab_glyph`.
//!
//! Each line is rasterized into a coverage mask. The outline is the mask
//! dilated by half the stroke width (a stroke centered on the glyph edge),
//! painted first; the fill is the plain mask painted over it.

use ab_glyph::{Font, FontArc, Glyph, ScaleFont, point};
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use std::io::Cursor;
use std::path::Path;

use crate::crop::{self, CropRect};
use crate::error::MememeError;
use crate::fonts::{GlyphMeasure, em_scale};
use crate::layout::{LinePaint, Surface, TextMeasure};
use crate::style::{OutputFormat, Rgb};
use crate::template::Template;

/// RGBA canvas that implements [`Surface`].
pub struct RasterSurface {
    canvas: RgbaImage,
    measure: GlyphMeasure,
}

impl RasterSurface {
    /// Canvas with the template's crop drawn into it.
    ///
    /// Canvas size comes from the template's listed dimensions; the source
    /// image is cropped by the same fractions and resampled if its actual
    /// size differs.
    pub fn from_template(
        image: &DynamicImage,
        template: &Template,
        crop: Option<CropRect>,
        font: FontArc,
    ) -> Self {
        let (width, height) = crop::canvas_size(template.width, template.height, crop);
        let (sx, sy, sw, sh) = crop
            .unwrap_or(CropRect::FULL)
            .to_pixels(image.width(), image.height());

        let mut region = image.crop_imm(sx, sy, sw, sh);
        if region.width() != width || region.height() != height {
            region = region.resize_exact(width, height, FilterType::Lanczos3);
        }

        Self {
            canvas: region.to_rgba8(),
            measure: GlyphMeasure::new(font),
        }
    }

    /// Encode the canvas as PNG or JPEG.
    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>, MememeError> {
        encode_image(&self.canvas, format)
    }

    /// Encode and write the canvas to `path`.
    pub fn save(&self, path: &Path, format: OutputFormat) -> Result<(), MememeError> {
        let bytes = self.encode(format)?;
        std::fs::write(path, bytes)?;
        tracing::info!(path = %path.display(), ?format, "meme exported");
        Ok(())
    }
}

/// Encode an RGBA image. JPEG drops the alpha channel.
pub fn encode_image(canvas: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>, MememeError> {
    let image = match format {
        OutputFormat::Png => DynamicImage::ImageRgba8(canvas.clone()),
        OutputFormat::Jpeg => {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas.clone()).to_rgb8())
        }
    };
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format.image_format())
        .map_err(|e| MememeError::Image(format!("Failed to encode {:?}: {}", format, e)))?;
    Ok(bytes)
}

/// Default export file name, e.g. `mememe-1718000000000.png`.
pub fn default_file_name(format: OutputFormat) -> String {
    format!(
        "mememe-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        format.extension()
    )
}

impl TextMeasure for RasterSurface {
    fn measure(&self, text: &str, font_size: f64) -> f64 {
        self.measure.measure(text, font_size)
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    fn draw_line(&mut self, line: &str, center_x: f64, baseline_y: f64, paint: &LinePaint) {
        let width = self.measure.measure(line, paint.font_size);
        let mask = rasterize_line(
            self.measure.font(),
            line,
            (center_x - width / 2.0) as f32,
            baseline_y as f32,
            paint.font_size,
            (paint.stroke_width / 2.0).ceil() as i32,
        );
        if let Some(mask) = mask {
            paint_line(&mut self.canvas, &mask, paint);
        }
    }
}

/// Paint one rasterized line: the dilated outline first, the fill on top.
fn paint_line(canvas: &mut RgbaImage, mask: &CoverageMask, paint: &LinePaint) {
    let outline = mask.dilated();
    blend_mask(canvas, &outline, paint.outline);
    blend_mask(canvas, mask, paint.fill);
}

/// Coverage values for a rectangle of canvas pixels.
struct CoverageMask {
    /// Canvas position of the mask's top-left pixel.
    left: i32,
    top: i32,
    width: usize,
    height: usize,
    /// Padding reserved around the glyphs for the outline.
    radius: i32,
    data: Vec<f32>,
}

impl CoverageMask {
    fn get(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0.0;
        }
        self.data[y as usize * self.width + x as usize]
    }

    /// Max coverage within a disc of `radius` around each pixel.
    ///
    /// The disc is split into rows: each source row contributes a
    /// horizontal running max whose half-width depends on its distance.
    fn dilated(&self) -> CoverageMask {
        let r = self.radius.max(0);
        let half_widths: Vec<usize> = (-r..=r)
            .map(|dy| f64::from(r * r - dy * dy).sqrt().floor() as usize)
            .collect();

        let mut data = vec![0.0f32; self.data.len()];
        for y in 0..self.height as i32 {
            let out = &mut data[y as usize * self.width..(y as usize + 1) * self.width];
            for (dy, &half) in (-r..=r).zip(&half_widths) {
                let sy = y + dy;
                if sy < 0 || sy >= self.height as i32 {
                    continue;
                }
                let row = &self.data[sy as usize * self.width..(sy as usize + 1) * self.width];
                for (o, v) in out.iter_mut().zip(running_max(row, half)) {
                    *o = o.max(v);
                }
            }
        }

        CoverageMask {
            data,
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
            radius: self.radius,
        }
    }
}

/// Max over `[x - half, x + half]` for every `x`, treating samples outside
/// the row as zero. Linear in the row length regardless of `half`.
fn running_max(row: &[f32], half: usize) -> Vec<f32> {
    if half == 0 || row.is_empty() {
        return row.to_vec();
    }
    let window = 2 * half + 1;
    let len = (row.len() + 2 * half).div_ceil(window) * window;
    let mut padded = vec![0.0f32; len];
    padded[half..half + row.len()].copy_from_slice(row);

    // prefix and suffix maxima within fixed blocks of `window` samples
    let mut prefix = padded.clone();
    let mut suffix = padded;
    for i in 1..len {
        if i % window != 0 {
            prefix[i] = prefix[i].max(prefix[i - 1]);
        }
    }
    for i in (0..len - 1).rev() {
        if (i + 1) % window != 0 {
            suffix[i] = suffix[i].max(suffix[i + 1]);
        }
    }

    (0..row.len())
        .map(|x| suffix[x].max(prefix[x + window - 1]))
        .collect()
}

/// Rasterize a line of text starting at `(x, baseline)`.
///
/// Returns `None` when the line has no visible glyphs.
fn rasterize_line(
    font: &FontArc,
    line: &str,
    x: f32,
    baseline: f32,
    font_size: f64,
    radius: i32,
) -> Option<CoverageMask> {
    let scale = em_scale(font, font_size);
    let scaled = font.as_scaled(scale);

    let mut glyphs: Vec<Glyph> = Vec::new();
    let mut caret = x;
    let mut previous = None;
    for ch in line.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push(id.with_scale_and_position(scale, point(caret, baseline)));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }

    let outlined: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    if outlined.is_empty() {
        return None;
    }

    let min_x = outlined.iter().map(|g| g.px_bounds().min.x).fold(f32::MAX, f32::min);
    let min_y = outlined.iter().map(|g| g.px_bounds().min.y).fold(f32::MAX, f32::min);
    let max_x = outlined.iter().map(|g| g.px_bounds().max.x).fold(f32::MIN, f32::max);
    let max_y = outlined.iter().map(|g| g.px_bounds().max.y).fold(f32::MIN, f32::max);

    let left = min_x.floor() as i32 - radius;
    let top = min_y.floor() as i32 - radius;
    let width = (max_x.ceil() as i32 - left + radius).max(1) as usize;
    let height = (max_y.ceil() as i32 - top + radius).max(1) as usize;
    let mut data = vec![0.0f32; width * height];

    for glyph in &outlined {
        let bounds = glyph.px_bounds();
        let ox = bounds.min.x as i32 - left;
        let oy = bounds.min.y as i32 - top;
        glyph.draw(|gx, gy, coverage| {
            let px = ox + gx as i32;
            let py = oy + gy as i32;
            if px >= 0 && py >= 0 && (px as usize) < width && (py as usize) < height {
                let idx = py as usize * width + px as usize;
                data[idx] = (data[idx] + coverage).min(1.0);
            }
        });
    }

    Some(CoverageMask {
        left,
        top,
        width,
        height,
        radius,
        data,
    })
}

/// Source-over blend of a solid color through a coverage mask.
fn blend_mask(canvas: &mut RgbaImage, mask: &CoverageMask, color: Rgb) {
    let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);
    let src = [color.0, color.1, color.2];

    for my in 0..mask.height as i32 {
        let y = mask.top + my;
        if y < 0 || y >= ch {
            continue;
        }
        for mx in 0..mask.width as i32 {
            let x = mask.left + mx;
            if x < 0 || x >= cw {
                continue;
            }
            let alpha = mask.get(mx, my);
            if alpha <= 0.0 {
                continue;
            }
            let pixel = canvas.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                let blended = f32::from(src[c]) * alpha + f32::from(pixel[c]) * (1.0 - alpha);
                pixel[c] = blended.round().clamp(0.0, 255.0) as u8;
            }
            let a = f32::from(pixel[3]) / 255.0;
            pixel[3] = ((alpha + a * (1.0 - alpha)) * 255.0).round() as u8;
        }
    }
}
