// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembly — the single driver both rendering paths feed into.
//
// A producer hands back one op list per page; the driver prepends the
// watermark and appends the footer to each, then serialises the document.
// Watermark and footer logic therefore exist exactly once, regardless of
// which path produced the content.

use countersign_core::error::Result;
use image::RgbImage;
use image::imageops::{self, FilterType};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

use crate::footer::{FooterSpec, footer_ops};
use crate::layout::PageLayout;
use crate::paginate::{PageSegment, slice};
use crate::preview::CapturedPreview;
use crate::watermark::WatermarkStamp;

/// Raw RGB budget per embedded page segment. Segments above this are
/// silently downscaled before embedding.
pub const DEFAULT_EMBED_BUDGET_BYTES: usize = 24 * 1024 * 1024;

/// One rendering path: produces the foreground op list for each page.
/// Implementations register any images they need on `doc` as they go.
pub trait PageContentProducer {
    fn produce(&mut self, doc: &mut PdfDocument, layout: &PageLayout) -> Result<Vec<Vec<Op>>>;
}

/// Compose the full document: watermark (if any), per-page content, footer.
/// Returns the serialised PDF bytes.
#[instrument(skip_all, fields(title = %title))]
pub fn compose_document(
    title: &str,
    producer: &mut dyn PageContentProducer,
    layout: &PageLayout,
    watermark: Option<WatermarkStamp>,
    footer: &FooterSpec,
) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::new(title);
    let pages = assemble_pages(&mut doc, producer, layout, watermark, footer)?;
    let page_count = pages.len();
    doc.with_pages(pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);

    info!(pages = page_count, bytes = bytes.len(), "Document composed");
    Ok(bytes)
}

/// Page assembly without serialisation, for op-level inspection.
fn assemble_pages(
    doc: &mut PdfDocument,
    producer: &mut dyn PageContentProducer,
    layout: &PageLayout,
    mut watermark: Option<WatermarkStamp>,
    footer: &FooterSpec,
) -> Result<Vec<PdfPage>> {
    if let Some(stamp) = watermark.as_mut() {
        stamp.register(doc);
    }

    let mut content = producer.produce(doc, layout)?;
    if content.is_empty() {
        debug!("Producer yielded no pages; emitting a single blank page");
        content.push(Vec::new());
    }

    let page_w = Mm(layout.page_width_mm as f32);
    let page_h = Mm(layout.page_height_mm as f32);

    let mut pages = Vec::with_capacity(content.len());
    for (index, page_content) in content.into_iter().enumerate() {
        let mut ops = Vec::new();
        if let Some(stamp) = &watermark {
            ops.extend(stamp.ops());
        }
        ops.extend(page_content);
        ops.extend(footer_ops(footer, layout, index + 1));
        pages.push(PdfPage::new(page_w, page_h, ops));
    }
    Ok(pages)
}

// -- Raster path --------------------------------------------------------------

/// Content producer for the raster path: slices the captured preview and
/// embeds one segment bitmap per page.
pub struct RasterProducer {
    preview: CapturedPreview,
    embed_budget_bytes: usize,
}

impl RasterProducer {
    pub fn new(preview: CapturedPreview) -> Self {
        Self {
            preview,
            embed_budget_bytes: DEFAULT_EMBED_BUDGET_BYTES,
        }
    }

    pub fn with_embed_budget(preview: CapturedPreview, embed_budget_bytes: usize) -> Self {
        Self {
            preview,
            embed_budget_bytes,
        }
    }
}

impl PageContentProducer for RasterProducer {
    #[instrument(skip_all, fields(
        canvas_w = self.preview.image.width(),
        canvas_h = self.preview.image.height()
    ))]
    fn produce(&mut self, doc: &mut PdfDocument, layout: &PageLayout) -> Result<Vec<Vec<Op>>> {
        let segments = slice(&self.preview.image, layout);
        let mut pages = Vec::with_capacity(segments.len());

        for segment in segments {
            let PageSegment { image, rect, plan } = segment;
            let image = shrink_to_budget(image, self.embed_budget_bytes);
            let (px_w, px_h) = image.dimensions();

            let raw = RawImage {
                pixels: RawImageData::U8(image.into_raw()),
                width: px_w as usize,
                height: px_h as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let id = doc.add_image(&raw);

            // Size the image through its dpi so the pixel width lands exactly
            // on the content width; squeeze vertically only if the clamp to
            // the footer band requires it.
            let natural_height_mm = px_h as f64 * rect.width_mm / px_w as f64;
            let placed_height_mm = natural_height_mm.min(rect.height_mm);
            let scale_y = (placed_height_mm / natural_height_mm) as f32;
            let dpi = (px_w as f64 * 25.4 / rect.width_mm) as f32;

            debug!(
                page = plan.index + 1,
                px_w, px_h, placed_height_mm, "Segment embedded"
            );

            pages.push(vec![Op::UseXobject {
                id,
                transform: XObjectTransform {
                    translate_x: Some(Mm(rect.x_mm as f32).into_pt()),
                    translate_y: Some(
                        Mm((layout.page_height_mm - rect.y_mm - placed_height_mm) as f32)
                            .into_pt(),
                    ),
                    scale_x: Some(1.0),
                    scale_y: Some(scale_y),
                    dpi: Some(dpi),
                    rotate: None,
                },
            }]);
        }

        Ok(pages)
    }
}

/// Downscale a segment whose raw RGB bytes exceed the budget, preserving
/// aspect ratio. Quality degrades silently; generation never fails for size.
fn shrink_to_budget(image: RgbImage, budget_bytes: usize) -> RgbImage {
    let raw_len = image.as_raw().len();
    if raw_len <= budget_bytes {
        return image;
    }

    let factor = (budget_bytes as f64 / raw_len as f64).sqrt();
    let (w, h) = image.dimensions();
    let new_w = ((w as f64 * factor) as u32).max(1);
    let new_h = ((h as f64 * factor) as u32).max(1);

    debug!(
        from_bytes = raw_len,
        budget_bytes, new_w, new_h, "Downscaling oversized page segment"
    );
    imageops::resize(&image, new_w, new_h, FilterType::Lanczos3)
}
