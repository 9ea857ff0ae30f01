// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Countersign — Service layer: editing sessions, signing, PDF generation
// orchestration, and document delivery.

pub mod delivery;
pub mod editing;
pub mod generate;
pub mod signing;
pub mod stores;
pub mod telemetry;

pub use delivery::Delivery;
pub use editing::EditingSession;
pub use generate::{EngineProfile, GeneratedPdf, PdfGenerator, RenderMode};
pub use signing::{apply_signature, mark_completed};
pub use stores::Stores;
pub use telemetry::init_tracing;
