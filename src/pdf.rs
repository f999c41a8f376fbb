//! PDF output sink. Rasterizes layout pages into a PDF file with printpdf.
//!
//! Text and lines are assumed infallible once the document is open; any
//! write failure aborts the whole generation and the partial file is
//! removed. Missing decorative images (logo, stamp) are logged and skipped.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, IndirectFontRef, Line,
    Mm, PdfDocument, PdfLayerReference, Point, Px,
};
use thiserror::Error;

use crate::layout::{DrawCmd, FontStyle, ImageSlot, Page, PAGE_HEIGHT, PAGE_WIDTH};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to build PDF: {0}")]
    Pdf(String),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Decorative images resolved from the assets directory. Either may be
/// absent; the document renders without them.
pub struct AssetStore {
    logo: Option<DynamicImage>,
    stamp: Option<DynamicImage>,
}

impl AssetStore {
    /// Looks for `logo.png` and `stamp.png` under `assets_dir`. A missing
    /// or undecodable file is a per-asset warning, never an error.
    pub fn load(assets_dir: &Path) -> Self {
        AssetStore {
            logo: load_asset(&assets_dir.join("logo.png")),
            stamp: load_asset(&assets_dir.join("stamp.png")),
        }
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        AssetStore {
            logo: None,
            stamp: None,
        }
    }

    fn get(&self, slot: ImageSlot) -> Option<&DynamicImage> {
        match slot {
            ImageSlot::Logo => self.logo.as_ref(),
            ImageSlot::Stamp => self.stamp.as_ref(),
        }
    }
}

fn load_asset(path: &Path) -> Option<DynamicImage> {
    match image::open(path) {
        Ok(img) => Some(img),
        Err(e) => {
            log::warn!("skipping asset {}: {e}", path.display());
            None
        }
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn pick(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

/// Layout coordinates are top-down; PDF space is bottom-up.
fn flip(y: f64) -> Mm {
    Mm((PAGE_HEIGHT - y) as f32)
}

/// Write the laid-out pages to `path`. Fatal on any filesystem or PDF
/// error; no partial artifact is left behind.
pub fn render_pdf(pages: &[Page], assets: &AssetStore, path: &Path) -> Result<(), RenderError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        "Quotation",
        Mm(PAGE_WIDTH as f32),
        Mm(PAGE_HEIGHT as f32),
        "Layer 1",
    );
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(e.to_string()))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Pdf(e.to_string()))?,
        italic: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(|e| RenderError::Pdf(e.to_string()))?,
    };

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) = doc.add_page(
                Mm(PAGE_WIDTH as f32),
                Mm(PAGE_HEIGHT as f32),
                "Layer 1",
            );
            doc.get_page(page_ref).get_layer(layer_ref)
        };
        draw_page(&layer, page, &fonts, assets);
    }

    let file = File::create(path).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    if let Err(e) = doc.save(&mut writer) {
        // Do not leave a half-written artifact on disk.
        drop(writer);
        let _ = std::fs::remove_file(path);
        return Err(RenderError::Pdf(e.to_string()));
    }
    Ok(())
}

fn draw_page(layer: &PdfLayerReference, page: &Page, fonts: &Fonts, assets: &AssetStore) {
    for cmd in &page.commands {
        match cmd {
            DrawCmd::Text { text, x, y, size, style } => {
                layer.use_text(text, *size as f32, Mm(*x as f32), flip(*y), fonts.pick(*style));
            }
            DrawCmd::Line { x1, y1, x2, y2 } => {
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x1 as f32), flip(*y1)), false),
                        (Point::new(Mm(*x2 as f32), flip(*y2)), false),
                    ],
                    is_closed: false,
                });
            }
            DrawCmd::Image { slot, x, y, width, height } => {
                match assets.get(*slot) {
                    Some(img) => embed_image(layer, img, *x, *y, *width, *height),
                    None => log::warn!("no image for {slot:?}, leaving blank"),
                }
            }
        }
    }
}

/// Embed a decoded image scaled to the requested millimetre box. Transparent
/// pixels are composited against white first; the builtin RGB color space
/// has no alpha channel.
fn embed_image(layer: &PdfLayerReference, img: &DynamicImage, x: f64, y: f64, w: f64, h: f64) {
    let rgba = img.to_rgba8();
    let (width_px, height_px) = rgba.dimensions();

    let mut rgb = image::RgbImage::new(width_px, height_px);
    for (px, py, pixel) in rgba.enumerate_pixels() {
        let image::Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)) as u8;
        rgb.put_pixel(px, py, image::Rgb([blend(r), blend(g), blend(b)]));
    }

    let xobject = ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb.into_raw(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    };

    // DPI chosen so the pixel dimensions land on the requested physical box.
    let dpi_x = width_px as f32 / (w as f32 / 25.4);
    let dpi_y = height_px as f32 / (h as f32 / 25.4);

    Image::from(xobject).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x as f32)),
            // The box is addressed by its top edge in layout space; printpdf
            // anchors images at the bottom-left corner.
            translate_y: Some(Mm((PAGE_HEIGHT - y - h) as f32)),
            dpi: Some(dpi_x.max(dpi_y)),
            ..Default::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::paginate;
    use crate::model::QuotationForm;
    use crate::pricing::compute_totals;

    #[test]
    fn renders_without_assets() {
        let form = QuotationForm {
            quotation_number: "QTN-20260830-0001".into(),
            quotation_date: "30/08/2026".into(),
            ..Default::default()
        };
        let totals = compute_totals(&form);
        let pages = paginate(&form, &totals);

        let dir = std::env::temp_dir();
        let path = dir.join("quotation-maker-render-test.pdf");
        render_pdf(&pages, &AssetStore::empty(), &path).unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.len() > 0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_asset_dir_is_not_fatal() {
        let assets = AssetStore::load(Path::new("/nonexistent/assets"));
        assert!(assets.get(ImageSlot::Logo).is_none());
        assert!(assets.get(ImageSlot::Stamp).is_none());
    }
}
