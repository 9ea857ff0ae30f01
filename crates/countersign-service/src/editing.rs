// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editing session — the explicit current-contract context for the authoring
// flow.
//
// One session wraps one contract from `start_new`/`resume` until the host
// leaves the flow and drops it.  Every mutator re-checks that the contract
// is still a draft, so a contract that has moved on (shared, signed) cannot
// be altered through a stale editor screen.

use chrono::NaiveDate;
use tracing::{error, info, instrument};

use countersign_core::error::{CountersignError, Result};
use countersign_core::types::{Clause, Contract, ContractId, ContractKind, ContractStatus};
use countersign_store::EventKind;

use crate::stores::Stores;

/// A contract being authored, together with the store handles it persists
/// through.
pub struct EditingSession {
    stores: Stores,
    contract: Contract,
}

impl EditingSession {
    /// Begin a new draft of the given kind.  Nothing is persisted until the
    /// first `save`.
    pub fn start_new(stores: Stores, kind: ContractKind) -> Self {
        Self {
            stores,
            contract: Contract::new(kind),
        }
    }

    /// Reopen a stored contract for editing.
    #[instrument(skip(stores), fields(contract_id = %id))]
    pub fn resume(stores: Stores, id: &ContractId) -> Result<Self> {
        let contract = stores
            .contracts
            .lock()
            .expect("contract store lock poisoned")
            .load(id)?
            .ok_or_else(|| CountersignError::ContractNotFound(id.to_string()))?;

        Ok(Self { stores, contract })
    }

    /// Read-only view of the contract being edited.
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    // -- Wizard-step mutators ------------------------------------------------

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<()> {
        self.ensure_editable()?;
        self.contract.title = title.into();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<()> {
        self.ensure_editable()?;
        self.contract.description = description.into();
        Ok(())
    }

    /// Contract-level agency contact details.  Blank fields fall back to
    /// the agency profile at render time.
    pub fn set_agency_contact(
        &mut self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<()> {
        self.ensure_editable()?;
        self.contract.agency.name = name.into();
        self.contract.agency.email = email.into();
        Ok(())
    }

    pub fn set_counterparty(
        &mut self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<()> {
        self.ensure_editable()?;
        self.contract.counterparty.name = name.into();
        self.contract.counterparty.email = email.into();
        Ok(())
    }

    /// Payment amount and schedule.  The amount is validated (non-negative)
    /// by the store on save.
    pub fn set_payment(&mut self, amount: f64, schedule: impl Into<String>) -> Result<()> {
        self.ensure_editable()?;
        self.contract.payment.amount = amount;
        self.contract.payment.schedule = schedule.into();
        Ok(())
    }

    pub fn set_dates(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
        self.ensure_editable()?;
        self.contract.dates.start = start;
        self.contract.dates.end = end;
        Ok(())
    }

    pub fn set_scope(&mut self, items: Vec<String>) -> Result<()> {
        self.ensure_editable()?;
        self.contract.scope = items;
        Ok(())
    }

    pub fn set_clauses(&mut self, clauses: Vec<Clause>) -> Result<()> {
        self.ensure_editable()?;
        self.contract.clauses = clauses;
        Ok(())
    }

    // -- Lifecycle -----------------------------------------------------------

    /// Persist the draft.  The first save assigns the contract id and is
    /// logged as Created; later saves log Saved.
    #[instrument(skip(self), fields(title = %self.contract.title))]
    pub fn save(&mut self) -> Result<ContractId> {
        let first_save = self.contract.id.is_none();
        let id = self
            .stores
            .contracts
            .lock()
            .expect("contract store lock poisoned")
            .save(&mut self.contract)?;

        let kind = if first_save {
            EventKind::Created
        } else {
            EventKind::Saved
        };
        self.record_event(kind, None);

        info!(contract_id = %id, "draft saved");
        Ok(id)
    }

    /// Move the draft to Review and persist.  After this the session
    /// refuses further edits.
    #[instrument(skip(self), fields(title = %self.contract.title))]
    pub fn submit_for_review(&mut self) -> Result<ContractId> {
        self.ensure_editable()?;
        self.contract.status = ContractStatus::Review;
        let id = self
            .stores
            .contracts
            .lock()
            .expect("contract store lock poisoned")
            .save(&mut self.contract)?;

        self.record_event(EventKind::Shared, None);
        info!(contract_id = %id, "contract submitted for review");
        Ok(id)
    }

    /// Signing URL for the contract, derived from the host's base URL.
    /// `None` until the contract has been saved at least once.
    pub fn share_link(&self, base_url: &str) -> Option<String> {
        self.contract.share_link(base_url)
    }

    /// Delete the contract and end the session.  A never-saved draft simply
    /// evaporates.
    pub fn delete(self) -> Result<()> {
        let Some(id) = self.contract.id else {
            return Ok(());
        };

        self.stores
            .contracts
            .lock()
            .expect("contract store lock poisoned")
            .delete(&id)?;
        self.record_event(EventKind::Deleted, None);

        info!(contract_id = %id, "contract deleted");
        Ok(())
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.contract.status.is_editable() {
            Ok(())
        } else {
            Err(CountersignError::NotEditable(format!(
                "{:?}",
                self.contract.status
            )))
        }
    }

    /// Record a lifecycle event, logging rather than propagating failures;
    /// the edit itself has already succeeded.
    fn record_event(&self, kind: EventKind, detail: Option<&str>) {
        let Some(id) = self.contract.id else { return };
        if let Ok(log) = self.stores.events.lock()
            && let Err(e) = log.record(&id, kind, None, detail)
        {
            error!(error = %e, "failed to record contract event");
        }
    }
}
