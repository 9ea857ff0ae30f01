// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Countersign.

use thiserror::Error;

/// Top-level error type for all Countersign operations.
#[derive(Debug, Error)]
pub enum CountersignError {
    // -- Rendering errors --
    #[error("preview capture failed: {0}")]
    Capture(String),

    #[error("preview surface not found: {0}")]
    PreviewMissing(String),

    #[error("pagination failed: {0}")]
    Pagination(String),

    #[error("PDF assembly failed: {0}")]
    PdfAssembly(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Contract state errors --
    #[error("contract not found: {0}")]
    ContractNotFound(String),

    #[error("agency profile not found: {0}")]
    AgencyNotFound(String),

    #[error("contract is read-only in status {0}")]
    NotEditable(String),

    #[error("invalid contract data: {0}")]
    InvalidContract(String),

    #[error("PDF generation already running for contract {0}")]
    GenerationInProgress(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Delivery --
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CountersignError>;
