// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Download filename derivation.

use countersign_core::ContractId;

/// Derive the download filename for a generated contract document.
///
/// The title is slugged by replacing every non-alphanumeric character,
/// one for one, with an underscore. A blank title falls back to the
/// contract id, and an unsaved contract falls back to `draft`.
pub fn pdf_filename(title: &str, id: Option<&ContractId>) -> String {
    let trimmed = title.trim();
    if !trimmed.is_empty() {
        let slug: String = trimmed
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        return format!("contract-{slug}.pdf");
    }

    match id {
        Some(id) => format!("contract-{id}.pdf"),
        None => "contract-draft.pdf".to_string(),
    }
}
