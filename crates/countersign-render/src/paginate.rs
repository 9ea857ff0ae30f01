// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paginator — splits a captured preview canvas into page-height segments.
//
// Planning is pure arithmetic over millimetres; slicing then maps each plan
// back onto canvas pixel rows. Identical inputs always produce identical
// plans.

use image::RgbImage;
use image::imageops;
use tracing::{debug, instrument, warn};

use crate::layout::PageLayout;

/// One planned page segment, in canvas millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPlan {
    pub index: usize,
    /// Top edge within the canvas.
    pub start_mm: f64,
    /// Bottom edge within the canvas (exclusive).
    pub end_mm: f64,
    /// How far this segment reaches back into the previous page's content.
    /// Zero for the first segment.
    pub leading_overlap_mm: f64,
}

impl SegmentPlan {
    pub fn height_mm(&self) -> f64 {
        self.end_mm - self.start_mm
    }
}

/// Where a sliced segment lands on its page, in page millimetres from the
/// top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRect {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// A cropped segment bitmap together with its page placement.
#[derive(Debug, Clone)]
pub struct PageSegment {
    pub image: RgbImage,
    pub rect: PlacementRect,
    pub plan: SegmentPlan,
}

/// Height of the canvas once scaled to the content width, preserving the
/// pixel aspect ratio. The capture scale cancels out of this mapping: both
/// axes carry it, so only the ratio matters.
pub fn scaled_height_mm(px_width: u32, px_height: u32, content_width_mm: f64) -> f64 {
    if px_width == 0 {
        return 0.0;
    }
    px_height as f64 * content_width_mm / px_width as f64
}

/// Plan the segment boundaries for a canvas of the given scaled height.
///
/// `pages = ceil(height / usable)`. The first segment starts at the canvas
/// top with no leading overlap; every later segment reaches `overlap_mm`
/// back into the previous page so content cut by the break reappears. Every
/// segment ends at `min(start + usable + leading_overlap, height)`.
///
/// A zero-height canvas yields no segments; the compose driver turns that
/// into a single blank page.
#[instrument(skip(layout))]
pub fn plan_segments(img_height_mm: f64, layout: &PageLayout) -> Vec<SegmentPlan> {
    let usable = layout.usable_height_mm();
    if img_height_mm <= 0.0 || usable <= 0.0 {
        return Vec::new();
    }

    let pages = (img_height_mm / usable).ceil() as usize;
    let mut plans = Vec::with_capacity(pages);

    for index in 0..pages {
        let leading_overlap_mm = if index == 0 { 0.0 } else { layout.overlap_mm };
        let start_mm = (index as f64 * usable - leading_overlap_mm).max(0.0);
        let end_mm = (start_mm + usable + leading_overlap_mm).min(img_height_mm);
        let height = end_mm - start_mm;

        if height <= 0.0 {
            warn!(index, start_mm, end_mm, "Skipping degenerate page segment");
            continue;
        }

        plans.push(SegmentPlan {
            index,
            start_mm,
            end_mm,
            leading_overlap_mm,
        });
    }

    debug!(
        img_height_mm,
        usable, segments = plans.len(),
        "Pagination planned"
    );
    plans
}

/// Crop the canvas into per-page bitmaps according to the plan, attaching
/// each segment's placement rectangle.
///
/// Pixel rows map linearly: `canvas_y = mm_y / img_mm * canvas_px`. Placed
/// heights are clamped to `max_segment_height_mm` so a segment can never
/// intrude on the footer band.
#[instrument(skip(canvas, layout), fields(canvas_w = canvas.width(), canvas_h = canvas.height()))]
pub fn slice(canvas: &RgbImage, layout: &PageLayout) -> Vec<PageSegment> {
    let (px_w, px_h) = canvas.dimensions();
    let img_mm = scaled_height_mm(px_w, px_h, layout.content_width_mm());
    let plans = plan_segments(img_mm, layout);
    if plans.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::with_capacity(plans.len());
    for plan in plans {
        let y0 = ((plan.start_mm / img_mm) * px_h as f64).round() as u32;
        let y1 = (((plan.end_mm / img_mm) * px_h as f64).round() as u32).min(px_h);
        if y1 <= y0 {
            warn!(index = plan.index, y0, y1, "Skipping empty pixel slice");
            continue;
        }

        let image = imageops::crop_imm(canvas, 0, y0, px_w, y1 - y0).to_image();
        let height_mm = plan.height_mm().min(layout.max_segment_height_mm());
        segments.push(PageSegment {
            image,
            rect: PlacementRect {
                x_mm: layout.margin_left_mm,
                y_mm: layout.margin_top_mm,
                width_mm: layout.content_width_mm(),
                height_mm,
            },
            plan,
        });
    }

    debug!(segments = segments.len(), "Canvas sliced");
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn layout() -> PageLayout {
        PageLayout::a4()
    }

    #[test]
    fn page_count_follows_ceiling_formula() {
        let l = layout();
        let usable = l.usable_height_mm();

        assert!(plan_segments(0.0, &l).is_empty());
        assert_eq!(plan_segments(usable, &l).len(), 1);
        assert_eq!(plan_segments(usable + 0.1, &l).len(), 2);
        assert_eq!(plan_segments(2.5 * usable, &l).len(), 3);
    }

    #[test]
    fn planning_is_deterministic() {
        let l = layout();
        let a = plan_segments(1234.5, &l);
        let b = plan_segments(1234.5, &l);
        assert_eq!(a, b);
    }

    #[test]
    fn first_segment_has_no_leading_overlap() {
        let l = layout();
        let plans = plan_segments(700.0, &l);
        assert!(plans[0].leading_overlap_mm.abs() < EPS);
        assert!(plans[0].start_mm.abs() < EPS);
        for plan in &plans[1..] {
            assert!((plan.leading_overlap_mm - l.overlap_mm).abs() < EPS);
        }
    }

    #[test]
    fn segments_tile_the_canvas_with_junction_overlap_only() {
        let l = layout();
        for img in [100.0, 260.0, 300.0, 650.0, 2000.0] {
            let plans = plan_segments(img, &l);
            let n = plans.len();

            // Consecutive segments meet exactly overlap_mm before the
            // previous end.
            for pair in plans.windows(2) {
                assert!((pair[1].start_mm - (pair[0].end_mm - l.overlap_mm)).abs() < EPS);
            }

            let total_height: f64 = plans.iter().map(SegmentPlan::height_mm).sum();
            let total_overlap = (n.saturating_sub(1)) as f64 * l.overlap_mm;
            assert!(
                (total_height - total_overlap - img).abs() < EPS,
                "coverage broken for img={img}: heights {total_height}, overlap {total_overlap}"
            );

            assert!((plans[n - 1].end_mm - img).abs() < EPS);
        }
    }

    #[test]
    fn placed_segments_never_reach_the_footer_band() {
        let l = layout();
        let canvas = RgbImage::from_pixel(800, 4000, image::Rgb([250, 250, 250]));
        let segments = slice(&canvas, &l);
        assert!(!segments.is_empty());

        for segment in &segments {
            let bottom = l.margin_top_mm + segment.rect.height_mm;
            assert!(
                bottom < l.page_height_mm - l.margin_bottom_mm,
                "segment {} bottom {bottom} collides with footer band",
                segment.plan.index
            );
        }
    }

    #[test]
    fn slice_pixel_rows_cover_the_canvas() {
        let l = layout();
        // 1000 px wide, 3100 px tall: 651 mm scaled, 3 pages.
        let canvas = RgbImage::from_pixel(1000, 3100, image::Rgb([200, 200, 200]));
        let segments = slice(&canvas, &l);
        assert_eq!(segments.len(), 3);

        assert_eq!(segments[0].image.width(), 1000);
        // First slice starts at row 0; last slice ends at the canvas bottom.
        let px_per_mm = 3100.0 / scaled_height_mm(1000, 3100, l.content_width_mm());
        let last = &segments[2];
        let expected_last_rows =
            ((last.plan.end_mm - last.plan.start_mm) * px_per_mm).round() as u32;
        assert!(
            (last.image.height() as i64 - expected_last_rows as i64).abs() <= 1,
            "last segment rows {} vs expected {expected_last_rows}",
            last.image.height()
        );
    }

    #[test]
    fn short_canvas_is_a_single_full_segment() {
        let l = layout();
        let canvas = RgbImage::from_pixel(400, 200, image::Rgb([255, 255, 255]));
        let segments = slice(&canvas, &l);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].image.height(), 200);
        let expected_mm = scaled_height_mm(400, 200, l.content_width_mm());
        assert!((segments[0].rect.height_mm - expected_mm).abs() < EPS);
    }

    #[test]
    fn zero_width_canvas_yields_nothing() {
        assert!((scaled_height_mm(0, 500, 210.0)).abs() < EPS);
    }
}
