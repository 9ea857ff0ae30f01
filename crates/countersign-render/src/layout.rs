// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared page geometry for both rendering paths.
//
// All lengths are millimetres measured from the top-left page corner;
// conversion into printpdf's bottom-left Pt space happens at the assembly
// edge, nowhere else.

use countersign_core::PaperSize;

/// Page geometry consumed by the paginator, the compose driver and the text
/// renderer alike. Keeping one struct for both pipelines is what guarantees
/// their pages line up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    /// Top whitespace above content on every page.
    pub margin_top_mm: f64,
    /// Reserved band at the page bottom; the footer lives inside it.
    pub margin_bottom_mm: f64,
    pub margin_left_mm: f64,
    pub margin_right_mm: f64,
    /// Extra clearance subtracted from the per-page content quota so a
    /// segment never runs flush against the footer band.
    pub break_buffer_mm: f64,
    /// Vertical strip repeated at the top of every continuation segment,
    /// hiding content cut mid-line by the page break.
    pub overlap_mm: f64,
    /// Horizontal inset of the footer rule and texts.
    pub footer_inset_mm: f64,
}

impl PageLayout {
    /// A4 portrait with the production margins.
    pub fn a4() -> Self {
        Self::for_paper(PaperSize::A4)
    }

    pub fn for_paper(paper: PaperSize) -> Self {
        let (w, h) = paper.dimensions_mm();
        Self {
            page_width_mm: w,
            page_height_mm: h,
            margin_top_mm: 15.0,
            margin_bottom_mm: 17.0,
            // Preview captures span the full page width.
            margin_left_mm: 0.0,
            margin_right_mm: 0.0,
            break_buffer_mm: 5.0,
            overlap_mm: 3.0,
            footer_inset_mm: 12.0,
        }
    }

    /// Horizontal space available to content.
    pub fn content_width_mm(&self) -> f64 {
        self.page_width_mm - self.margin_left_mm - self.margin_right_mm
    }

    /// Lowest y (from the top) content may reach on any page.
    pub fn content_floor_mm(&self) -> f64 {
        self.page_height_mm - self.margin_bottom_mm - self.break_buffer_mm
    }

    /// Content quota per page; the paginator's segment stride.
    pub fn usable_height_mm(&self) -> f64 {
        self.content_floor_mm() - self.margin_top_mm
    }

    /// Hard cap on a placed segment. Anything taller would run into the
    /// footer band.
    pub fn max_segment_height_mm(&self) -> f64 {
        self.page_height_mm - self.margin_top_mm - self.margin_bottom_mm
    }

    /// Y of the footer separator rule, from the page top.
    pub fn footer_separator_y_mm(&self) -> f64 {
        self.page_height_mm - self.margin_bottom_mm + 3.0
    }

    /// Baseline of the footer text row, from the page top.
    pub fn footer_baseline_y_mm(&self) -> f64 {
        self.page_height_mm - self.margin_bottom_mm + 7.0
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::a4()
    }
}

/// Estimated rendered width of `text` in Helvetica at `font_size_pt`.
///
/// Average glyph width is roughly 0.50 * font size in pt, converted to mm
/// (1 pt = 0.3528 mm). Good enough for footer alignment and wrap limits;
/// exact metrics would need font tables.
pub fn approx_text_width_mm(text: &str, font_size_pt: f32) -> f64 {
    let avg_char_width_mm = 0.50 * font_size_pt as f64 * 0.3528;
    text.chars().count() as f64 * avg_char_width_mm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_defaults() {
        let layout = PageLayout::a4();
        assert!((layout.page_width_mm - 210.0).abs() < 1e-9);
        assert!((layout.page_height_mm - 297.0).abs() < 1e-9);
        assert!((layout.usable_height_mm() - 260.0).abs() < 1e-9);
        assert!((layout.content_width_mm() - 210.0).abs() < 1e-9);
    }

    #[test]
    fn footer_lives_inside_bottom_margin() {
        let layout = PageLayout::a4();
        let band_top = layout.page_height_mm - layout.margin_bottom_mm;
        assert!(layout.footer_separator_y_mm() > band_top);
        assert!(layout.footer_baseline_y_mm() > layout.footer_separator_y_mm());
        assert!(layout.footer_baseline_y_mm() < layout.page_height_mm);
    }

    #[test]
    fn segment_cap_clears_the_footer_band() {
        let layout = PageLayout::a4();
        assert!(
            layout.margin_top_mm + layout.max_segment_height_mm()
                <= layout.page_height_mm - layout.margin_bottom_mm + 1e-9
        );
    }

    #[test]
    fn text_width_scales_with_length() {
        let short = approx_text_width_mm("Page 1", 8.0);
        let long = approx_text_width_mm("Page 1 of many", 8.0);
        assert!(long > short);
        assert!(short > 0.0);
    }
}
