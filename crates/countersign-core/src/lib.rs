// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Countersign — Core types and error definitions shared across all crates.

pub mod config;
pub mod de;
pub mod error;
pub mod notice;
pub mod types;

pub use config::AppConfig;
pub use error::CountersignError;
pub use types::*;
