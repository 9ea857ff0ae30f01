// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Countersign — PDF rendering pipeline.
//
// Two paths produce the same document shape: the raster path slices a captured
// preview bitmap into page-height segments, the text path lays the contract
// out directly from its fields. Both feed the shared compose driver, which
// stamps the watermark and footer onto every page and serialises the result
// with `printpdf`.

pub mod compose;
pub mod filename;
pub mod footer;
pub mod layout;
pub mod paginate;
pub mod preview;
pub mod signature;
pub mod text;
pub mod watermark;

pub use compose::{PageContentProducer, RasterProducer, compose_document};
pub use filename::pdf_filename;
pub use footer::FooterSpec;
pub use layout::PageLayout;
pub use paginate::{PageSegment, SegmentPlan, plan_segments, scaled_height_mm, slice};
pub use preview::{CapturedPreview, PreviewSource, StaticPreview, capture_preview};
pub use signature::prepare_signature;
pub use text::TextProducer;
pub use watermark::WatermarkStamp;
