// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page footer — separator rule, generator name, generation date, page number.
//
// Everything here is drawn inside the reserved bottom margin band, which is
// why content and footer can never collide. The date is injected by the
// caller rather than sampled here, keeping composition deterministic.

use printpdf::{BuiltinFont, Color, Line, LinePoint, Mm, Op, Point, Pt, Rgb, TextItem};

use crate::layout::{PageLayout, approx_text_width_mm};

const FOOTER_FONT_SIZE_PT: f32 = 8.0;
const FOOTER_GRAY: f32 = 0.45;
const SEPARATOR_THICKNESS_PT: f32 = 0.4;

/// Static footer inputs shared by every page of a document.
#[derive(Debug, Clone)]
pub struct FooterSpec {
    /// Left-aligned generator or agency name.
    pub generator: String,
    /// Centred generation date, already formatted for display.
    pub date_label: String,
}

impl FooterSpec {
    pub fn new(generator: impl Into<String>, date_label: impl Into<String>) -> Self {
        Self {
            generator: generator.into(),
            date_label: date_label.into(),
        }
    }
}

/// Build the footer op list for one page. `page_number` is 1-based.
pub fn footer_ops(spec: &FooterSpec, layout: &PageLayout, page_number: usize) -> Vec<Op> {
    let mut ops = Vec::with_capacity(19);

    let gray = Color::Rgb(Rgb {
        r: FOOTER_GRAY,
        g: FOOTER_GRAY,
        b: FOOTER_GRAY,
        icc_profile: None,
    });

    // Separator rule across the footer band.
    let sep_y = pt_from_top(layout, layout.footer_separator_y_mm());
    ops.push(Op::SetOutlineColor { col: gray.clone() });
    ops.push(Op::SetOutlineThickness {
        pt: Pt(SEPARATOR_THICKNESS_PT),
    });
    ops.push(Op::DrawLine {
        line: Line {
            points: vec![
                LinePoint {
                    p: Point {
                        x: Mm(layout.footer_inset_mm as f32).into_pt(),
                        y: sep_y,
                    },
                    bezier: false,
                },
                LinePoint {
                    p: Point {
                        x: Mm((layout.page_width_mm - layout.footer_inset_mm) as f32).into_pt(),
                        y: sep_y,
                    },
                    bezier: false,
                },
            ],
            is_closed: false,
        },
    });

    ops.push(Op::SetFillColor { col: gray });

    let baseline_mm = layout.footer_baseline_y_mm();
    let page_text = format!("Page {page_number}");

    // Left: generator name.
    push_text(
        &mut ops,
        &spec.generator,
        layout.footer_inset_mm,
        baseline_mm,
        layout,
    );

    // Centre: generation date.
    let date_width = approx_text_width_mm(&spec.date_label, FOOTER_FONT_SIZE_PT);
    let date_x = (layout.page_width_mm - date_width) / 2.0;
    push_text(&mut ops, &spec.date_label, date_x, baseline_mm, layout);

    // Right: page number.
    let page_width = approx_text_width_mm(&page_text, FOOTER_FONT_SIZE_PT);
    let page_x = layout.page_width_mm - layout.footer_inset_mm - page_width;
    push_text(&mut ops, &page_text, page_x, baseline_mm, layout);

    ops
}

fn push_text(
    ops: &mut Vec<Op>,
    text: &str,
    x_mm: f64,
    baseline_from_top_mm: f64,
    layout: &PageLayout,
) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point {
            x: Mm(x_mm as f32).into_pt(),
            y: pt_from_top(layout, baseline_from_top_mm),
        },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(FOOTER_FONT_SIZE_PT),
        font: BuiltinFont::Helvetica,
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(text.to_string())],
        font: BuiltinFont::Helvetica,
    });
    ops.push(Op::EndTextSection);
}

/// Convert a y measured downward from the page top into printpdf's
/// bottom-left Pt space.
fn pt_from_top(layout: &PageLayout, y_from_top_mm: f64) -> Pt {
    Mm((layout.page_height_mm - y_from_top_mm) as f32).into_pt()
}
