// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signing-event log — append-only SQLite record of every contract-lifecycle
// operation.
//
// Schema:
//   contract_events(
//     id            INTEGER PRIMARY KEY AUTOINCREMENT,
//     occurred_at   TEXT    NOT NULL,   -- RFC 3339
//     contract_id   TEXT    NOT NULL,
//     kind          TEXT    NOT NULL,   -- e.g. "Saved", "PdfGenerated"
//     document_hash TEXT,               -- SHA-256 hex digest, when a PDF is involved
//     detail        TEXT                -- optional free-form context
//   )

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use countersign_core::error::{CountersignError, Result};
use countersign_core::types::ContractId;

/// Convert a `rusqlite::Error` into a `CountersignError::Database`.
fn db_err(e: rusqlite::Error) -> CountersignError {
    CountersignError::Database(e.to_string())
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Lifecycle operations recorded in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Created,
    Saved,
    PdfGenerated,
    Shared,
    Signed,
    Completed,
    Deleted,
}

/// A single entry in the event log, used for queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractEvent {
    pub id: i64,
    pub occurred_at: String,
    pub contract_id: String,
    pub kind: EventKind,
    /// SHA-256 hex digest of the document the event refers to, when one
    /// exists (`PdfGenerated`, `Signed`).
    pub document_hash: Option<String>,
    pub detail: Option<String>,
}

/// Append-only event log backed by a SQLite database.
///
/// The log is the signing evidence record: every save, share, PDF
/// generation, and signature lands here with a timestamp, and generated
/// documents are tied to their exact bytes through the SHA-256 fingerprint
/// column.
pub struct EventLog {
    conn: Connection,
}

impl EventLog {
    /// Open (or create) the event database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err)?;

        // WAL for concurrent readers.
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS contract_events (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                occurred_at   TEXT    NOT NULL,
                contract_id   TEXT    NOT NULL,
                kind          TEXT    NOT NULL,
                document_hash TEXT,
                detail        TEXT
            );",
        )
        .map_err(db_err)?;

        debug!("event log opened");
        Ok(Self { conn })
    }

    /// Open an in-memory event database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS contract_events (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                occurred_at   TEXT    NOT NULL,
                contract_id   TEXT    NOT NULL,
                kind          TEXT    NOT NULL,
                document_hash TEXT,
                detail        TEXT
            );",
        )
        .map_err(db_err)?;

        debug!("in-memory event log opened");
        Ok(Self { conn })
    }

    /// Record a new event.
    ///
    /// `document_hash` should be the SHA-256 hex digest of the PDF bytes
    /// for events that refer to a generated document, `None` otherwise.
    #[instrument(skip(self, detail), fields(contract_id = %contract_id, kind = ?kind))]
    pub fn record(
        &self,
        contract_id: &ContractId,
        kind: EventKind,
        document_hash: Option<&str>,
        detail: Option<&str>,
    ) -> Result<()> {
        let occurred_at = Utc::now().to_rfc3339();
        let kind_json = serde_json::to_string(&kind)
            .map_err(|e| CountersignError::Database(format!("serialize kind: {e}")))?;

        self.conn
            .execute(
                "INSERT INTO contract_events (occurred_at, contract_id, kind, document_hash, detail)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    occurred_at,
                    contract_id.to_string(),
                    kind_json,
                    document_hash,
                    detail
                ],
            )
            .map_err(db_err)?;

        debug!("event recorded");
        Ok(())
    }

    /// Retrieve all events for a contract in the order they were recorded.
    pub fn for_contract(&self, contract_id: &ContractId) -> Result<Vec<ContractEvent>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, occurred_at, contract_id, kind, document_hash, detail
                 FROM contract_events
                 WHERE contract_id = ?1
                 ORDER BY id ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![contract_id.to_string()], row_to_event)
            .map_err(db_err)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row.map_err(db_err)?);
        }
        Ok(events)
    }

    /// Retrieve the most recent `limit` events across all contracts,
    /// newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<ContractEvent>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, occurred_at, contract_id, kind, document_hash, detail
                 FROM contract_events
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(db_err)?;

        let rows = stmt.query_map(params![limit], row_to_event).map_err(db_err)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row.map_err(db_err)?);
        }
        Ok(events)
    }

    /// Return the total number of recorded events.
    pub fn count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM contract_events", [], |row| row.get(0))
            .map_err(db_err)
    }
}

/// Map a SQLite row to a `ContractEvent`.
fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContractEvent> {
    let kind_json: String = row.get(3)?;
    let kind: EventKind = serde_json::from_str(&kind_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ContractEvent {
        id: row.get(0)?,
        occurred_at: row.get(1)?,
        contract_id: row.get(2)?,
        kind,
        document_hash: row.get(4)?,
        detail: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::hash_bytes;

    fn make_log() -> EventLog {
        EventLog::open_in_memory().expect("open in-memory event log")
    }

    #[test]
    fn record_and_count() {
        let log = make_log();
        assert_eq!(log.count().expect("count"), 0);

        let id = ContractId::new();
        log.record(&id, EventKind::Created, None, None).expect("record");
        log.record(&id, EventKind::Saved, None, Some("draft autosave"))
            .expect("record");

        assert_eq!(log.count().expect("count"), 2);
    }

    #[test]
    fn for_contract_filters_and_orders() {
        let log = make_log();
        let ours = ContractId::new();
        let theirs = ContractId::new();

        log.record(&ours, EventKind::Created, None, None).expect("record");
        log.record(&theirs, EventKind::Created, None, None).expect("record");
        log.record(&ours, EventKind::Saved, None, None).expect("record");
        log.record(&ours, EventKind::Shared, None, None).expect("record");

        let events = log.for_contract(&ours).expect("for_contract");
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, EventKind::Created);
        assert_eq!(events[1].kind, EventKind::Saved);
        assert_eq!(events[2].kind, EventKind::Shared);
        assert!(events.iter().all(|e| e.contract_id == ours.to_string()));
    }

    #[test]
    fn recent_returns_newest_first() {
        let log = make_log();
        let id = ContractId::new();
        for detail in ["one", "two", "three", "four"] {
            log.record(&id, EventKind::Saved, None, Some(detail))
                .expect("record");
        }

        let recent = log.recent(2).expect("recent");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].detail.as_deref(), Some("four"));
        assert_eq!(recent[1].detail.as_deref(), Some("three"));
    }

    #[test]
    fn document_hash_round_trips() {
        let log = make_log();
        let id = ContractId::new();
        let hash = hash_bytes(b"%PDF-1.7 fake document");

        log.record(&id, EventKind::PdfGenerated, Some(&hash), None)
            .expect("record");

        let events = log.for_contract(&id).expect("for_contract");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::PdfGenerated);
        assert_eq!(events[0].document_hash.as_deref(), Some(hash.as_str()));
    }
}
