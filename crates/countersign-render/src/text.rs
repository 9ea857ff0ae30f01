// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fallback text renderer — lays the contract out directly from its fields.
//
// Used when no preview capture is available (or the engine profile forbids
// the raster path). A top-down millimetre cursor walks the contract sections;
// before every line or image the cursor is checked against the content floor
// and the page is closed when crossing it, so a line or image is never split
// across pages. Watermark and footer are not applied here; the compose
// driver stamps them onto every page of either path.

use countersign_core::error::Result;
use countersign_core::{Agency, Contract, Signature};
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, Point, Pt, RawImage, RawImageData, RawImageFormat,
    TextItem, XObjectTransform,
};
use tracing::{debug, instrument, warn};

use crate::compose::PageContentProducer;
use crate::layout::PageLayout;
use crate::preview::flatten_onto_white;

const PT_TO_MM: f64 = 0.3528;
/// Horizontal text inset on both sides, independent of the raster margins.
const SIDE_INSET_MM: f64 = 18.0;
const LINE_SPACING: f64 = 1.4;

const NAME_SIZE_PT: f32 = 16.0;
const TITLE_SIZE_PT: f32 = 13.0;
const HEADING_SIZE_PT: f32 = 11.0;
const BODY_SIZE_PT: f32 = 10.0;
const CAPTION_SIZE_PT: f32 = 8.5;

const SIGNATURE_MAX_W_MM: f64 = 55.0;
const SIGNATURE_MAX_H_MM: f64 = 22.0;

/// Content producer for the text path.
pub struct TextProducer<'a> {
    contract: &'a Contract,
    agency: &'a Agency,
}

impl<'a> TextProducer<'a> {
    pub fn new(contract: &'a Contract, agency: &'a Agency) -> Self {
        Self { contract, agency }
    }
}

impl PageContentProducer for TextProducer<'_> {
    #[instrument(skip_all, fields(kind = ?self.contract.kind))]
    fn produce(&mut self, doc: &mut PdfDocument, layout: &PageLayout) -> Result<Vec<Vec<Op>>> {
        let contract = self.contract;
        let agency = self.agency;
        let mut flow = TextFlow::new(layout);

        // Branding header.
        let agency_name = contract.agency_name_or(agency);
        if !agency_name.trim().is_empty() {
            flow.line(agency_name, BuiltinFont::HelveticaBold, NAME_SIZE_PT, 0.0);
        }
        let contact = contact_line(contract, agency);
        if !contact.is_empty() {
            flow.line(&contact, BuiltinFont::Helvetica, CAPTION_SIZE_PT, 0.0);
        }
        flow.gap(4.0);

        let title = if contract.title.trim().is_empty() {
            "Untitled Contract"
        } else {
            &contract.title
        };
        flow.wrapped(title, BuiltinFont::HelveticaBold, TITLE_SIZE_PT, 0.0);

        // Parties.
        flow.section("Parties");
        flow.wrapped(
            &party_line("Agency", agency_name, contract.agency_email_or(agency)),
            BuiltinFont::Helvetica,
            BODY_SIZE_PT,
            3.0,
        );
        flow.wrapped(
            &party_line(
                contract.kind.counterparty_label(),
                &contract.counterparty.name,
                &contract.counterparty.email,
            ),
            BuiltinFont::Helvetica,
            BODY_SIZE_PT,
            3.0,
        );

        // Work description, labelled per contract kind.
        if !contract.description.trim().is_empty() {
            flow.section(contract.kind.work_label());
            flow.wrapped(
                &contract.description,
                BuiltinFont::Helvetica,
                BODY_SIZE_PT,
                3.0,
            );
        }

        if !contract.scope.is_empty() {
            flow.section("Scope of Work");
            for (i, item) in contract.scope.iter().enumerate() {
                flow.wrapped(
                    &format!("{}. {item}", i + 1),
                    BuiltinFont::Helvetica,
                    BODY_SIZE_PT,
                    3.0,
                );
            }
        }

        // Payment.
        flow.section("Payment");
        flow.line(
            &format!("Amount: {:.2}", contract.payment.amount),
            BuiltinFont::Helvetica,
            BODY_SIZE_PT,
            3.0,
        );
        if !contract.payment.schedule.trim().is_empty() {
            flow.line(
                &format!("Schedule: {}", contract.payment.schedule),
                BuiltinFont::Helvetica,
                BODY_SIZE_PT,
                3.0,
            );
        }

        if contract.dates.start.is_some() || contract.dates.end.is_some() {
            flow.section("Dates");
            if let Some(start) = contract.dates.start {
                flow.line(
                    &format!("Start: {}", start.format("%-d %B %Y")),
                    BuiltinFont::Helvetica,
                    BODY_SIZE_PT,
                    3.0,
                );
            }
            if let Some(end) = contract.dates.end {
                flow.line(
                    &format!("End: {}", end.format("%-d %B %Y")),
                    BuiltinFont::Helvetica,
                    BODY_SIZE_PT,
                    3.0,
                );
            }
        }

        if !contract.clauses.is_empty() {
            flow.section("Terms and Conditions");
            for (i, clause) in contract.clauses.iter().enumerate() {
                flow.wrapped(
                    &format!("{}. {}", i + 1, clause.title),
                    BuiltinFont::HelveticaBold,
                    BODY_SIZE_PT,
                    3.0,
                );
                if !clause.body.trim().is_empty() {
                    flow.wrapped(&clause.body, BuiltinFont::Helvetica, BODY_SIZE_PT, 6.0);
                }
                flow.gap(1.5);
            }
        }

        // Signature blocks.
        flow.gap(6.0);
        signature_block(
            &mut flow,
            doc,
            &format!("For {agency_name}"),
            contract.signatures.agency.as_ref(),
        );
        let counterparty_label = if contract.counterparty.name.trim().is_empty() {
            contract.kind.counterparty_label().to_string()
        } else {
            contract.counterparty.name.clone()
        };
        signature_block(
            &mut flow,
            doc,
            &format!("For {counterparty_label}"),
            contract.signatures.counterparty.as_ref(),
        );

        let pages = flow.finish();
        debug!(pages = pages.len(), "Text layout complete");
        Ok(pages)
    }
}

fn contact_line(contract: &Contract, agency: &Agency) -> String {
    let email = contract.agency_email_or(agency);
    [email, &agency.phone, &agency.website]
        .iter()
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.trim())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn party_line(label: &str, name: &str, email: &str) -> String {
    let name = if name.trim().is_empty() {
        "(unnamed)"
    } else {
        name
    };
    if email.trim().is_empty() {
        format!("{label}: {name}")
    } else {
        format!("{label}: {name} ({email})")
    }
}

fn signature_block(
    flow: &mut TextFlow<'_>,
    doc: &mut PdfDocument,
    label: &str,
    signature: Option<&Signature>,
) {
    // Keep the label, image and caption together on one page.
    flow.ensure_room(SIGNATURE_MAX_H_MM + 14.0);
    flow.line(label, BuiltinFont::HelveticaBold, BODY_SIZE_PT, 0.0);

    match signature {
        Some(sig) => {
            let drawn =
                flow.image(doc, &sig.image_png, SIGNATURE_MAX_W_MM, SIGNATURE_MAX_H_MM, 0.0);
            if !drawn {
                flow.line("____________________", BuiltinFont::Helvetica, BODY_SIZE_PT, 0.0);
            }
            flow.line(
                &format!("Signed {}", sig.signed_at.format("%-d %B %Y")),
                BuiltinFont::Helvetica,
                CAPTION_SIZE_PT,
                0.0,
            );
        }
        None => {
            flow.gap(10.0);
            flow.line("____________________", BuiltinFont::Helvetica, BODY_SIZE_PT, 0.0);
            flow.line("Signature", BuiltinFont::Helvetica, CAPTION_SIZE_PT, 0.0);
        }
    }
    flow.gap(4.0);
}

// -- Cursor-driven page flow --------------------------------------------------

struct TextFlow<'l> {
    layout: &'l PageLayout,
    pages: Vec<Vec<Op>>,
    ops: Vec<Op>,
    cursor_mm: f64,
}

impl<'l> TextFlow<'l> {
    fn new(layout: &'l PageLayout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
            ops: Vec::new(),
            cursor_mm: layout.margin_top_mm,
        }
    }

    /// Close the page early if fewer than `needed_mm` remain above the floor.
    fn ensure_room(&mut self, needed_mm: f64) {
        if self.cursor_mm + needed_mm > self.layout.content_floor_mm() {
            self.break_page();
        }
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.cursor_mm = self.layout.margin_top_mm;
    }

    fn gap(&mut self, mm: f64) {
        self.cursor_mm += mm;
    }

    /// Write one already-wrapped line and advance the cursor.
    fn line(&mut self, text: &str, font: BuiltinFont, size_pt: f32, indent_mm: f64) {
        let line_height_mm = size_pt as f64 * LINE_SPACING * PT_TO_MM;
        self.ensure_room(line_height_mm);
        self.cursor_mm += line_height_mm;

        if text.is_empty() {
            return;
        }

        let x = SIDE_INSET_MM + indent_mm;
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor {
            pos: Point {
                x: Mm(x as f32).into_pt(),
                y: self.pt_from_top(self.cursor_mm),
            },
        });
        self.ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(size_pt),
            font,
        });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_string())],
            font,
        });
        self.ops.push(Op::EndTextSection);
    }

    /// Word-wrap at the estimated character width, then emit line by line.
    fn wrapped(&mut self, text: &str, font: BuiltinFont, size_pt: f32, indent_mm: f64) {
        let width_mm = self.layout.page_width_mm - 2.0 * SIDE_INSET_MM - indent_mm;
        let avg_char_width_mm = 0.50 * size_pt as f64 * PT_TO_MM;
        let max_chars = (width_mm / avg_char_width_mm) as usize;
        for line in wrap(text, max_chars) {
            self.line(&line, font, size_pt, indent_mm);
        }
    }

    /// Section heading with some breathing room, kept with its first line.
    fn section(&mut self, title: &str) {
        self.ensure_room(14.0);
        self.gap(4.0);
        self.line(title, BuiltinFont::HelveticaBold, HEADING_SIZE_PT, 0.0);
        self.gap(1.0);
    }

    /// Embed an image at the cursor, scaled into the given box. Returns
    /// false (and draws nothing) when the bytes do not decode.
    fn image(
        &mut self,
        doc: &mut PdfDocument,
        bytes: &[u8],
        max_w_mm: f64,
        max_h_mm: f64,
        indent_mm: f64,
    ) -> bool {
        let decoded = match image::load_from_memory(bytes) {
            Ok(img) => img,
            Err(err) => {
                warn!(error = %err, "Embedded image failed to decode; skipping");
                return false;
            }
        };
        if decoded.width() == 0 || decoded.height() == 0 {
            return false;
        }

        let rgb = flatten_onto_white(&decoded);
        let (px_w, px_h) = rgb.dimensions();
        let aspect = px_h as f64 / px_w as f64;
        let mut width_mm = max_w_mm;
        let mut height_mm = width_mm * aspect;
        if height_mm > max_h_mm {
            height_mm = max_h_mm;
            width_mm = height_mm / aspect;
        }

        self.ensure_room(height_mm + 2.0);

        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: px_w as usize,
            height: px_h as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let id = doc.add_image(&raw);

        let top_mm = self.cursor_mm;
        self.ops.push(Op::UseXobject {
            id,
            transform: XObjectTransform {
                translate_x: Some(Mm((SIDE_INSET_MM + indent_mm) as f32).into_pt()),
                translate_y: Some(
                    Mm((self.layout.page_height_mm - top_mm - height_mm) as f32).into_pt(),
                ),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some((px_w as f64 * 25.4 / width_mm) as f32),
                rotate: None,
            },
        });
        self.cursor_mm += height_mm + 2.0;
        true
    }

    fn pt_from_top(&self, y_from_top_mm: f64) -> Pt {
        Mm((self.layout.page_height_mm - y_from_top_mm) as f32).into_pt()
    }

    fn finish(mut self) -> Vec<Vec<Op>> {
        if !self.ops.is_empty() {
            self.pages.push(self.ops);
        }
        self.pages
    }
}

// -- Word wrap ----------------------------------------------------------------

/// Wrap on whitespace so no line exceeds `max_chars` characters; oversized
/// words are force-broken at character boundaries. Paragraph breaks survive
/// as empty lines.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_chars = 0usize;

        for word in paragraph.split_whitespace() {
            let mut word = word;
            let mut word_chars = word.chars().count();

            while word_chars > max_chars {
                if current_chars > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_chars = 0;
                }
                let (head, tail) = split_at_chars(word, max_chars);
                lines.push(head.to_string());
                word = tail;
                word_chars -= max_chars;
            }

            if current_chars == 0 {
                current.push_str(word);
                current_chars = word_chars;
            } else if current_chars + 1 + word_chars <= max_chars {
                current.push(' ');
                current.push_str(word);
                current_chars += 1 + word_chars;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_chars = word_chars;
            }
        }

        lines.push(current);
    }

    lines
}

fn split_at_chars(s: &str, n: usize) -> (&str, &str) {
    match s.char_indices().nth(n) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, ""),
    }
}
