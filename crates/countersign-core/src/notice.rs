// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User-facing notices for contract operations.
//
// The service layer never surfaces a raw error to the host UI. Every failure
// is mapped to a single plain-English notice with a suggestion, so the person
// downloading a contract sees one message, not a stack of causes.

use crate::error::CountersignError;

/// Severity of a failure from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Momentary problem, trying again will usually work.
    Transient,
    /// The user must change something before retrying.
    ActionRequired,
    /// Retrying will not help.
    Permanent,
}

/// A plain-English notice with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct UserNotice {
    /// Summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the host may offer a one-tap retry.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `CountersignError` into the single notice the host displays.
pub fn user_notice(err: &CountersignError) -> UserNotice {
    match err {
        // -- Rendering --
        CountersignError::Capture(_) => UserNotice {
            message: "We couldn't capture the contract preview.".into(),
            suggestion: "Try downloading again. If it keeps failing, the text-only version will be used instead.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        CountersignError::PreviewMissing(_) => UserNotice {
            message: "The contract preview isn't ready yet.".into(),
            suggestion: "Open the contract preview first, then download.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        CountersignError::Pagination(_) => UserNotice {
            message: "We couldn't split the contract into pages.".into(),
            suggestion: "Try downloading again, or use the text-only version.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        CountersignError::PdfAssembly(_) => UserNotice {
            message: "Building the PDF failed.".into(),
            suggestion: "Try downloading again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        CountersignError::ImageError(_) => UserNotice {
            message: "An image in this contract couldn't be processed.".into(),
            suggestion: "Check the agency logo and any signatures are valid PNG images, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Contract state --
        CountersignError::ContractNotFound(_) => UserNotice {
            message: "That contract no longer exists.".into(),
            suggestion: "It may have been deleted. Go back to the contract list and refresh.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        CountersignError::AgencyNotFound(_) => UserNotice {
            message: "Your agency profile is missing.".into(),
            suggestion: "Fill in your agency details in Settings before generating contracts.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        CountersignError::NotEditable(status) => UserNotice {
            message: "This contract can no longer be edited.".into(),
            suggestion: format!(
                "It has moved to {status}. Duplicate it as a new draft if you need changes."
            ),
            retriable: false,
            severity: Severity::Permanent,
        },

        CountersignError::InvalidContract(detail) => UserNotice {
            message: "Some contract details need fixing.".into(),
            suggestion: format!("Please review the highlighted fields. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        CountersignError::GenerationInProgress(_) => UserNotice {
            message: "This contract is already being generated.".into(),
            suggestion: "Wait a moment for the current download to finish, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Storage --
        CountersignError::Database(_) => UserNotice {
            message: "The contract storage had a problem.".into(),
            suggestion: "Try again. Your saved contracts should still be there.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        CountersignError::IntegrityMismatch { .. } => UserNotice {
            message: "This document doesn't match the signed version.".into(),
            suggestion: "The stored copy differs from the one that was signed. Regenerate the document from the contract record.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        CountersignError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                UserNotice {
                    message: "We couldn't write to that folder.".into(),
                    suggestion: "Choose a different download location, or the file will open in a viewer instead.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                UserNotice {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        CountersignError::Serialization(_) => UserNotice {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Delivery --
        CountersignError::Delivery(_) => UserNotice {
            message: "The PDF was generated but couldn't be saved.".into(),
            suggestion: "Check the download folder exists and has space, then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },
    }
}
