// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Countersign — SQLite persistence: contract storage, the agency profile,
// and the append-only signing-event log.

pub mod agencies;
pub mod contracts;
pub mod events;
pub mod integrity;

pub use agencies::AgencyStore;
pub use contracts::ContractStore;
pub use events::{ContractEvent, EventKind, EventLog};
pub use integrity::{hash_bytes, verify_hash};
