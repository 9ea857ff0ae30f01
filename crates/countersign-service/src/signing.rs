// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signature capture and contract completion.

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};

use countersign_core::error::{CountersignError, Result};
use countersign_core::types::{ContractId, ContractStatus, SignatureRole};
use countersign_render::prepare_signature;
use countersign_store::EventKind;

use crate::stores::Stores;

/// Attach a drawn signature to a stored contract.
///
/// The raw PNG is conditioned first (white background flattened away,
/// strokes normalised to opaque black) so the stored image embeds cleanly
/// into generated documents.  A counterparty signature moves the contract
/// to Signed; the store enforces that transition.
#[instrument(skip(stores, image_png), fields(contract_id = %id, role = ?role))]
pub fn apply_signature(
    stores: &Stores,
    id: &ContractId,
    role: SignatureRole,
    image_png: &[u8],
    signed_at: DateTime<Utc>,
) -> Result<()> {
    let conditioned = prepare_signature(image_png);

    stores
        .contracts
        .lock()
        .expect("contract store lock poisoned")
        .record_signature(id, role, &conditioned, signed_at)?;

    record_event(stores, id, EventKind::Signed, Some(&format!("{role:?}")));
    info!("signature recorded");
    Ok(())
}

/// Close out a fully signed contract.
///
/// Only a contract in Signed status can complete; anything earlier still
/// has signatures outstanding.
#[instrument(skip(stores), fields(contract_id = %id))]
pub fn mark_completed(stores: &Stores, id: &ContractId) -> Result<()> {
    {
        let mut store = stores
            .contracts
            .lock()
            .expect("contract store lock poisoned");
        let mut contract = store
            .load(id)?
            .ok_or_else(|| CountersignError::ContractNotFound(id.to_string()))?;

        if contract.status != ContractStatus::Signed {
            return Err(CountersignError::InvalidContract(format!(
                "cannot complete a contract in status {:?}",
                contract.status
            )));
        }

        contract.status = ContractStatus::Completed;
        store.save(&mut contract)?;
    }

    record_event(stores, id, EventKind::Completed, None);
    info!("contract completed");
    Ok(())
}

/// Record a signing event, logging rather than propagating failures; the
/// state change itself has already been persisted.
fn record_event(stores: &Stores, id: &ContractId, kind: EventKind, detail: Option<&str>) {
    if let Ok(log) = stores.events.lock()
        && let Err(e) = log.record(id, kind, None, detail)
    {
        error!(error = %e, "failed to record signing event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countersign_core::types::{Contract, ContractKind};

    // A 1x1 opaque red pixel, PNG-encoded.
    fn tiny_png() -> Vec<u8> {
        let mut bytes = Vec::new();
        let image = image::RgbaImage::from_pixel(1, 1, image::Rgba([200, 30, 30, 255]));
        image::DynamicImage::ImageRgba8(image)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .expect("encode png");
        bytes
    }

    fn saved_contract(stores: &Stores) -> ContractId {
        let mut contract = Contract::new(ContractKind::Client);
        contract.title = "Signable".into();
        stores
            .contracts
            .lock()
            .expect("contract store lock poisoned")
            .save(&mut contract)
            .expect("save")
    }

    #[test]
    fn counterparty_signature_completes_the_signing_flow() {
        let stores = Stores::open_in_memory().expect("open stores");
        let id = saved_contract(&stores);

        apply_signature(
            &stores,
            &id,
            SignatureRole::Counterparty,
            &tiny_png(),
            Utc::now(),
        )
        .expect("apply signature");

        let stored = stores
            .contracts
            .lock()
            .expect("contract store lock poisoned")
            .load(&id)
            .expect("load")
            .expect("found");
        assert_eq!(stored.status, ContractStatus::Signed);
        assert!(stored.signatures.counterparty.is_some());

        let events = stores
            .events
            .lock()
            .expect("events lock poisoned")
            .for_contract(&id)
            .expect("events");
        let signed = events
            .iter()
            .find(|e| e.kind == EventKind::Signed)
            .expect("signed event");
        assert_eq!(signed.detail.as_deref(), Some("Counterparty"));
    }

    #[test]
    fn completion_requires_a_signed_contract() {
        let stores = Stores::open_in_memory().expect("open stores");
        let id = saved_contract(&stores);

        let premature = mark_completed(&stores, &id);
        assert!(matches!(
            premature,
            Err(CountersignError::InvalidContract(_))
        ));

        apply_signature(
            &stores,
            &id,
            SignatureRole::Counterparty,
            &tiny_png(),
            Utc::now(),
        )
        .expect("apply signature");
        mark_completed(&stores, &id).expect("complete");

        let stored = stores
            .contracts
            .lock()
            .expect("contract store lock poisoned")
            .load(&id)
            .expect("load")
            .expect("found");
        assert_eq!(stored.status, ContractStatus::Completed);

        let kinds: Vec<EventKind> = stores
            .events
            .lock()
            .expect("events lock poisoned")
            .for_contract(&id)
            .expect("events")
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![EventKind::Signed, EventKind::Completed]);
    }

    #[test]
    fn completing_an_unknown_contract_fails() {
        let stores = Stores::open_in_memory().expect("open stores");
        let result = mark_completed(&stores, &ContractId::new());
        assert!(matches!(result, Err(CountersignError::ContractNotFound(_))));
    }
}
