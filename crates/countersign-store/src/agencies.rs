// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Agency profile persistence.
//
// One row per agency, logo bytes included.  The profile supplies the
// fallback branding and the watermark source for every generated document.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, info, instrument};

use countersign_core::error::{CountersignError, Result};
use countersign_core::types::{Agency, AgencyId};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS agencies (
        id         TEXT PRIMARY KEY,
        name       TEXT NOT NULL,
        email      TEXT NOT NULL,
        phone      TEXT NOT NULL,
        website    TEXT NOT NULL,
        address    TEXT NOT NULL,
        logo       BLOB,
        updated_at TEXT NOT NULL
    )
"#;

/// Convert a `rusqlite::Error` into a `CountersignError::Database`.
fn db_err(e: rusqlite::Error) -> CountersignError {
    CountersignError::Database(e.to_string())
}

/// Agency profile storage backed by a SQLite database.
pub struct AgencyStore {
    conn: Connection,
}

impl AgencyStore {
    /// Open (or create) the agency database at the given path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| CountersignError::Database(format!("open: {e}")))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| CountersignError::Database(format!("WAL pragma: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| CountersignError::Database(format!("create table: {e}")))?;

        info!("agency store opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CountersignError::Database(format!("open in-memory: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| CountersignError::Database(format!("create table: {e}")))?;

        debug!("in-memory agency store opened");
        Ok(Self { conn })
    }

    /// Insert or replace the agency profile.
    #[instrument(skip(self, agency), fields(agency_id = %agency.id))]
    pub fn upsert(&self, agency: &Agency) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO agencies (id, name, email, phone, website,
                 address, logo, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    agency.id.to_string(),
                    agency.name,
                    agency.email,
                    agency.phone,
                    agency.website,
                    agency.address,
                    agency.logo_png,
                    agency.updated_at.to_rfc3339(),
                ],
            )
            .map_err(db_err)?;

        info!(agency_id = %agency.id, "agency profile saved");
        Ok(())
    }

    /// Retrieve an agency profile by id.
    ///
    /// Returns `None` if no profile has been saved under that id.
    #[instrument(skip(self), fields(agency_id = %id))]
    pub fn load(&self, id: &AgencyId) -> Result<Option<Agency>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, email, phone, website, address, logo, updated_at
                 FROM agencies WHERE id = ?1",
            )
            .map_err(db_err)?;

        let mut rows = stmt
            .query_map(params![id.to_string()], row_to_agency)
            .map_err(db_err)?;

        match rows.next() {
            Some(Ok(agency)) => Ok(Some(agency)),
            Some(Err(e)) => Err(CountersignError::Database(format!("row parse: {e}"))),
            None => Ok(None),
        }
    }

    /// Replace the stored logo, or clear it with `None`.  Bumps `updated_at`.
    #[instrument(skip(self, logo_png), fields(agency_id = %id))]
    pub fn set_logo(&self, id: &AgencyId, logo_png: Option<&[u8]>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let rows = self
            .conn
            .execute(
                "UPDATE agencies SET logo = ?1, updated_at = ?2 WHERE id = ?3",
                params![logo_png, now, id.to_string()],
            )
            .map_err(db_err)?;

        if rows == 0 {
            return Err(CountersignError::AgencyNotFound(id.to_string()));
        }

        debug!(agency_id = %id, "logo updated");
        Ok(())
    }
}

/// Map a SQLite row to an `Agency`.
fn row_to_agency(row: &rusqlite::Row<'_>) -> rusqlite::Result<Agency> {
    let id_str: String = row.get(0)?;
    let updated_at_str: String = row.get(7)?;

    let uuid = uuid::Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Agency {
        id: AgencyId(uuid),
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        website: row.get(4)?,
        address: row.get(5)?,
        logo_png: row.get(6)?,
        updated_at,
    })
}
