// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Persistent engine settings, stored as JSON next to the databases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL that signing links are derived from.
    pub share_base_url: String,
    /// Name printed in the footer of generated documents.
    pub generator_label: String,
    /// Device-pixel multiplier for preview capture (must be >= 1).
    pub capture_scale: f32,
    /// Paper size for generated documents.
    pub paper_size: crate::PaperSize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            share_base_url: "https://app.countersign.example".into(),
            generator_label: "Countersign".into(),
            capture_scale: 2.0,
            paper_size: crate::PaperSize::A4,
        }
    }
}

impl AppConfig {
    /// Load from `path`, falling back to defaults when the file does not
    /// exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::load_or_default(&dir.path().join("config.json"))
            .expect("load defaults");
        assert_eq!(config.generator_label, "Countersign");
        assert!((config.capture_scale - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.generator_label = "Acme Contracts".into();
        config.share_base_url = "https://contracts.acme.example".into();
        config.save(&path).expect("save");

        let loaded = AppConfig::load_or_default(&path).expect("load");
        assert_eq!(loaded.generator_label, "Acme Contracts");
        assert_eq!(loaded.share_base_url, "https://contracts.acme.example");
    }
}
