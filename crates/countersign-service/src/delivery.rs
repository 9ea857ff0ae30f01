// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document delivery.
//
// A generated PDF is written straight into the requested directory.  When
// that write is refused (sandboxed download folder, revoked permission, full
// volume) the bytes are kept in a temporary file instead, so a successfully
// generated document is never thrown away.

use std::io::Write;
use std::path::{Path, PathBuf};

use countersign_core::error::{CountersignError, Result};
use tracing::{info, instrument, warn};

/// Where the generated PDF ended up.
#[derive(Debug)]
pub enum Delivery {
    /// Written to the requested directory.
    Saved { path: PathBuf },
    /// The requested directory refused the write; the bytes were kept in a
    /// temporary file for the host to open in a viewer.
    TempViewer { path: PathBuf },
}

impl Delivery {
    /// Filesystem location of the delivered document.
    pub fn path(&self) -> &Path {
        match self {
            Self::Saved { path } | Self::TempViewer { path } => path,
        }
    }
}

/// Write `bytes` into `dir` under `filename`, falling back to a kept
/// temporary file when the direct write is refused.
#[instrument(skip(bytes), fields(%filename, dir = %dir.display()))]
pub fn deliver(bytes: &[u8], dir: &Path, filename: &str) -> Result<Delivery> {
    let target = dir.join(filename);
    match std::fs::write(&target, bytes) {
        Ok(()) => {
            info!(path = %target.display(), "document saved");
            Ok(Delivery::Saved { path: target })
        }
        Err(e) => {
            warn!(error = %e, "direct save refused; keeping a temporary copy");
            let mut tmp = tempfile::Builder::new()
                .prefix("countersign-")
                .suffix(".pdf")
                .tempfile()
                .map_err(CountersignError::Io)?;
            tmp.write_all(bytes).map_err(CountersignError::Io)?;
            let (_file, path) = tmp
                .keep()
                .map_err(|e| CountersignError::Delivery(format!("keep temp file: {e}")))?;

            info!(path = %path.display(), "document kept for viewer hand-off");
            Ok(Delivery::TempViewer { path })
        }
    }
}
