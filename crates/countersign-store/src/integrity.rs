// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document fingerprints — SHA-256 hashing of generated PDFs.

use countersign_core::CountersignError;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex
/// string.
///
/// Every generated PDF is fingerprinted before its signing event is
/// written, so the event log can tie a signature to the exact document
/// bytes the counterparty saw.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Verify that `data` matches the expected SHA-256 hex digest.
///
/// Returns `Err(CountersignError::IntegrityMismatch)` carrying both
/// digests when the document has been altered since it was fingerprinted.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<(), CountersignError> {
    let actual = hash_bytes(data);
    if actual == expected_hex {
        Ok(())
    } else {
        Err(CountersignError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}
