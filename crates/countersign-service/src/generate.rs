// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF generation orchestration.
//
// One generator instance serialises generation per contract: a per-contract
// advisory lock refuses overlapping runs instead of queueing them. The
// pipeline snapshots the contract and agency, captures the preview on the
// calling task, then moves composition onto the blocking pool. Failures
// surface as a single `UserNotice`, never a raw error.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{error, info, instrument};

use countersign_core::config::AppConfig;
use countersign_core::error::{CountersignError, Result};
use countersign_core::notice::{UserNotice, user_notice};
use countersign_core::types::{AgencyId, ContractId};
use countersign_render::watermark::DEFAULT_OPACITY;
use countersign_render::{
    FooterSpec, PageLayout, PreviewSource, RasterProducer, TextProducer, WatermarkStamp,
    capture_preview, compose_document, pdf_filename,
};
use countersign_store::{EventKind, hash_bytes};

use crate::delivery::{self, Delivery};
use crate::stores::Stores;

/// Which rendering path produces the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Slice a captured preview bitmap into pages. Requires a live
    /// `PreviewSource`.
    Raster,
    /// Lay the contract out directly from its fields.
    Text,
    /// Raster when a preview is available and the engine allows it,
    /// text otherwise.
    Auto,
}

/// Capabilities of the embedding host's rendering engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineProfile {
    /// The host cannot produce reliable large captures; `Auto` resolves to
    /// the text path.
    pub constrained_raster: bool,
}

/// A successfully generated document.
#[derive(Debug)]
pub struct GeneratedPdf {
    pub delivery: Delivery,
    /// SHA-256 of the PDF bytes, also recorded in the event log.
    pub document_hash: String,
    /// The path that actually rendered it (never `Auto`).
    pub mode: RenderMode,
}

/// Orchestrates the snapshot, capture, compose, and deliver steps.
#[derive(Clone)]
pub struct PdfGenerator {
    stores: Stores,
    config: AppConfig,
    profile: EngineProfile,
    in_flight: Arc<Mutex<HashSet<ContractId>>>,
}

/// Releases the per-contract generation slot on drop, on every exit path.
#[derive(Debug)]
struct InFlightGuard {
    set: Arc<Mutex<HashSet<ContractId>>>,
    id: ContractId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.id);
        }
    }
}

impl PdfGenerator {
    pub fn new(stores: Stores, config: AppConfig, profile: EngineProfile) -> Self {
        Self {
            stores,
            config,
            profile,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Generate the contract as a PDF and deliver it into `output_dir`.
    ///
    /// On failure the caller receives one displayable notice; the underlying
    /// error has already been logged here. A second call for a contract whose
    /// generation is still running is refused rather than queued.
    #[instrument(skip(self, preview), fields(contract_id = %contract_id, mode = ?mode))]
    pub async fn generate(
        &self,
        contract_id: &ContractId,
        agency_id: &AgencyId,
        mode: RenderMode,
        preview: Option<&mut dyn PreviewSource>,
        output_dir: &Path,
    ) -> std::result::Result<GeneratedPdf, UserNotice> {
        match self
            .generate_inner(contract_id, agency_id, mode, preview, output_dir)
            .await
        {
            Ok(pdf) => Ok(pdf),
            Err(e) => {
                error!(error = %e, "PDF generation failed");
                Err(user_notice(&e))
            }
        }
    }

    async fn generate_inner(
        &self,
        contract_id: &ContractId,
        agency_id: &AgencyId,
        mode: RenderMode,
        preview: Option<&mut dyn PreviewSource>,
        output_dir: &Path,
    ) -> Result<GeneratedPdf> {
        let _guard = self.acquire(*contract_id)?;

        let contract = self
            .stores
            .contracts
            .lock()
            .expect("contract store lock poisoned")
            .load(contract_id)?
            .ok_or_else(|| CountersignError::ContractNotFound(contract_id.to_string()))?;
        let agency = self
            .stores
            .agencies
            .lock()
            .expect("agency store lock poisoned")
            .load(agency_id)?
            .ok_or_else(|| CountersignError::AgencyNotFound(agency_id.to_string()))?;

        let resolved = self.resolve_mode(mode, preview.is_some());

        // The preview reference must not cross an await; capture happens
        // here, before composition moves to the blocking pool.
        let captured = match (resolved, preview) {
            (RenderMode::Raster, Some(source)) => {
                Some(capture_preview(source, self.config.capture_scale)?)
            }
            (RenderMode::Raster, None) => {
                return Err(CountersignError::PreviewMissing(
                    "raster rendering requires a live preview".into(),
                ));
            }
            _ => None,
        };

        let layout = PageLayout::for_paper(self.config.paper_size);
        let generator = {
            let name = contract.agency_name_or(&agency).trim();
            if name.is_empty() {
                self.config.generator_label.clone()
            } else {
                name.to_string()
            }
        };
        let footer = FooterSpec::new(generator, Utc::now().format("%-d %B %Y").to_string());
        let filename = pdf_filename(&contract.title, contract.id.as_ref());
        let title = if contract.title.trim().is_empty() {
            "Untitled Contract".to_string()
        } else {
            contract.title.clone()
        };
        let logo = agency.logo_png.clone();

        let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let stamp = WatermarkStamp::prepare(logo.as_deref(), &layout, DEFAULT_OPACITY);
            match captured {
                Some(preview) => {
                    let mut producer = RasterProducer::new(preview);
                    compose_document(&title, &mut producer, &layout, stamp, &footer)
                }
                None => {
                    let mut producer = TextProducer::new(&contract, &agency);
                    compose_document(&title, &mut producer, &layout, stamp, &footer)
                }
            }
        })
        .await
        .map_err(|e| CountersignError::PdfAssembly(format!("compose task failed: {e}")))??;

        let document_hash = hash_bytes(&bytes);
        let delivery = delivery::deliver(&bytes, output_dir, &filename)?;

        self.record_generated(contract_id, &document_hash, &filename);
        info!(
            mode = ?resolved,
            hash = %document_hash,
            size = bytes.len(),
            "PDF generated"
        );

        Ok(GeneratedPdf {
            delivery,
            document_hash,
            mode: resolved,
        })
    }

    fn resolve_mode(&self, requested: RenderMode, preview_available: bool) -> RenderMode {
        match requested {
            RenderMode::Auto => {
                if self.profile.constrained_raster || !preview_available {
                    RenderMode::Text
                } else {
                    RenderMode::Raster
                }
            }
            explicit => explicit,
        }
    }

    /// Claim the generation slot for `id`, refusing when a run is in flight.
    fn acquire(&self, id: ContractId) -> Result<InFlightGuard> {
        let mut set = self.in_flight.lock().expect("in-flight set lock poisoned");
        if !set.insert(id) {
            return Err(CountersignError::GenerationInProgress(id.to_string()));
        }
        drop(set);

        Ok(InFlightGuard {
            set: Arc::clone(&self.in_flight),
            id,
        })
    }

    /// Record the generation event, logging rather than propagating failures;
    /// the document has already been delivered.
    fn record_generated(&self, id: &ContractId, document_hash: &str, filename: &str) {
        if let Ok(log) = self.stores.events.lock()
            && let Err(e) = log.record(
                id,
                EventKind::PdfGenerated,
                Some(document_hash),
                Some(filename),
            )
        {
            error!(error = %e, "failed to record generation event");
        }
    }
}
