// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watermark compositor — stamps the agency logo faintly onto every page.
//
// The opacity is baked into the XObject pixels here (pre-composited against
// the white page) rather than set through graphics state, so later drawing
// operations cannot inherit it. A missing or undecodable logo disables the
// watermark entirely; it never aborts page generation.

use image::imageops::FilterType;
use printpdf::{
    Mm, Op, PdfDocument, Pt, RawImage, RawImageData, RawImageFormat, XObjectId, XObjectTransform,
};
use tracing::{debug, instrument, warn};

use crate::layout::PageLayout;

/// Default watermark opacity.
pub const DEFAULT_OPACITY: f32 = 0.12;

/// The logo's longer side is normalised to this length on the page.
const MAX_SIDE_MM: f64 = 75.0;

/// Pixel cap for the embedded watermark bitmap.
const MAX_SIDE_PX: u32 = 600;

/// A prepared watermark: pre-composited pixels plus the page placement,
/// registered once per document and drawn on every page before any content.
#[derive(Debug, Clone)]
pub struct WatermarkStamp {
    pixels: Vec<u8>,
    px_width: u32,
    px_height: u32,
    width_mm: f64,
    height_mm: f64,
    translate_x_pt: f32,
    translate_y_pt: f32,
    dpi: f32,
    xobject: Option<XObjectId>,
}

impl WatermarkStamp {
    /// Build the stamp from raw logo bytes.
    ///
    /// `None` out means no watermark stage at all: no logo configured, or the
    /// bytes would not decode (logged, never fatal).
    #[instrument(skip(logo_bytes, layout), fields(logo_len = logo_bytes.map(<[u8]>::len)))]
    pub fn prepare(logo_bytes: Option<&[u8]>, layout: &PageLayout, opacity: f32) -> Option<Self> {
        let bytes = logo_bytes?;
        let decoded = match image::load_from_memory(bytes) {
            Ok(img) => img,
            Err(err) => {
                warn!(error = %err, "Agency logo failed to decode; watermark disabled");
                return None;
            }
        };
        if decoded.width() == 0 || decoded.height() == 0 {
            warn!("Agency logo has zero extent; watermark disabled");
            return None;
        }

        // Keep the embedded bitmap small; it renders at 75 mm regardless.
        let decoded = if decoded.width().max(decoded.height()) > MAX_SIDE_PX {
            decoded.resize(MAX_SIDE_PX, MAX_SIDE_PX, FilterType::Lanczos3)
        } else {
            decoded
        };

        let (px_width, px_height) = (decoded.width(), decoded.height());
        let scale_mm_per_px = MAX_SIDE_MM / px_width.max(px_height) as f64;
        let width_mm = px_width as f64 * scale_mm_per_px;
        let height_mm = px_height as f64 * scale_mm_per_px;

        // Centred on the full page.
        let x_mm = (layout.page_width_mm - width_mm) / 2.0;
        let y_top_mm = (layout.page_height_mm - height_mm) / 2.0;

        let opacity = opacity.clamp(0.0, 1.0);
        let rgba = decoded.to_rgba8();
        let mut pixels = Vec::with_capacity((px_width * px_height * 3) as usize);
        for pixel in rgba.pixels() {
            let image::Rgba([r, g, b, a]) = *pixel;
            let effective_alpha = (a as f32 / 255.0) * opacity;
            for channel in [r, g, b] {
                let faded =
                    channel as f32 * effective_alpha + 255.0 * (1.0 - effective_alpha);
                pixels.push(faded.round() as u8);
            }
        }

        let dpi = (px_width as f64 * 25.4 / width_mm) as f32;
        let translate_x_pt = Mm(x_mm as f32).into_pt().0;
        let translate_y_pt = Mm((layout.page_height_mm - y_top_mm - height_mm) as f32)
            .into_pt()
            .0;

        debug!(
            px_width,
            px_height, width_mm, height_mm, opacity, "Watermark prepared"
        );

        Some(Self {
            pixels,
            px_width,
            px_height,
            width_mm,
            height_mm,
            translate_x_pt,
            translate_y_pt,
            dpi,
            xobject: None,
        })
    }

    /// Add the watermark bitmap to the document. Call once before drawing.
    pub fn register(&mut self, doc: &mut PdfDocument) {
        let raw = RawImage {
            pixels: RawImageData::U8(self.pixels.clone()),
            width: self.px_width as usize,
            height: self.px_height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        self.xobject = Some(doc.add_image(&raw));
    }

    /// The per-page draw, scoped so the transform cannot leak into content
    /// drawn after it. Empty until `register` has run.
    pub fn ops(&self) -> Vec<Op> {
        let Some(id) = &self.xobject else {
            return Vec::new();
        };
        vec![
            Op::SaveGraphicsState,
            Op::UseXobject {
                id: id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(self.translate_x_pt)),
                    translate_y: Some(Pt(self.translate_y_pt)),
                    scale_x: None,
                    scale_y: None,
                    dpi: Some(self.dpi),
                    rotate: None,
                },
            },
            Op::RestoreGraphicsState,
        ]
    }

    /// Rendered size on the page.
    pub fn size_mm(&self) -> (f64, f64) {
        (self.width_mm, self.height_mm)
    }

    pub fn xobject_id(&self) -> Option<&XObjectId> {
        self.xobject.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_logo(width: u32, height: u32, pixel: image::Rgba<u8>) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, pixel);
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode test logo");
        bytes
    }

    #[test]
    fn absent_logo_means_no_stamp() {
        assert!(WatermarkStamp::prepare(None, &PageLayout::a4(), DEFAULT_OPACITY).is_none());
    }

    #[test]
    fn undecodable_logo_means_no_stamp() {
        let garbage = [0u8, 1, 2, 3, 4];
        assert!(
            WatermarkStamp::prepare(Some(&garbage), &PageLayout::a4(), DEFAULT_OPACITY)
                .is_none()
        );
    }

    #[test]
    fn longer_side_is_normalised_to_75mm() {
        let logo = png_logo(100, 50, image::Rgba([0, 0, 0, 255]));
        let stamp = WatermarkStamp::prepare(Some(&logo), &PageLayout::a4(), DEFAULT_OPACITY)
            .expect("stamp");
        let (w, h) = stamp.size_mm();
        assert!((w - 75.0).abs() < 1e-9);
        assert!((h - 37.5).abs() < 1e-9);
    }

    #[test]
    fn opacity_is_baked_into_the_pixels() {
        // Opaque black at 0.12 opacity over white: 255 * 0.88 ≈ 224.
        let logo = png_logo(4, 4, image::Rgba([0, 0, 0, 255]));
        let stamp =
            WatermarkStamp::prepare(Some(&logo), &PageLayout::a4(), 0.12).expect("stamp");
        let first = stamp.pixels[0];
        assert!((223..=226).contains(&first), "faded channel was {first}");
    }

    #[test]
    fn ops_are_empty_until_registered_then_scoped() {
        let logo = png_logo(10, 10, image::Rgba([20, 40, 60, 255]));
        let mut stamp = WatermarkStamp::prepare(Some(&logo), &PageLayout::a4(), DEFAULT_OPACITY)
            .expect("stamp");
        assert!(stamp.ops().is_empty());

        let mut doc = PdfDocument::new("test");
        stamp.register(&mut doc);

        let ops = stamp.ops();
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], Op::SaveGraphicsState));
        assert!(matches!(ops[2], Op::RestoreGraphicsState));
        assert!(matches!(ops[1], Op::UseXobject { .. }));
    }
}
