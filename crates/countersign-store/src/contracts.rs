// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contract persistence backed by SQLite.
//
// A contract row holds the scalar fields; the ordered collections (scope
// items, clauses) and the signature slots live in child tables keyed by
// contract id and are rewritten on every save.  Save, delete, and signature
// recording each run inside a single transaction, so a half-written
// contract can never be observed by a concurrent reader.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, info, instrument};

use countersign_core::error::{CountersignError, Result};
use countersign_core::types::{
    Clause, Contract, ContractDates, ContractId, ContractStatus, Party, PaymentTerms, Signature,
    SignatureRole, Signatures,
};

/// SQLite schema for the contract tables.
const CREATE_TABLES_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS contracts (
        id                 TEXT PRIMARY KEY,
        kind               TEXT NOT NULL,
        status             TEXT NOT NULL,
        agency_name        TEXT NOT NULL,
        agency_email       TEXT NOT NULL,
        counterparty_name  TEXT NOT NULL,
        counterparty_email TEXT NOT NULL,
        title              TEXT NOT NULL,
        description        TEXT NOT NULL,
        payment_amount     REAL NOT NULL,
        payment_schedule   TEXT NOT NULL,
        start_date         TEXT,
        end_date           TEXT,
        created_at         TEXT NOT NULL,
        updated_at         TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS scope_items (
        contract_id TEXT    NOT NULL,
        position    INTEGER NOT NULL,
        item        TEXT    NOT NULL,
        PRIMARY KEY (contract_id, position)
    );

    CREATE TABLE IF NOT EXISTS clauses (
        contract_id TEXT    NOT NULL,
        position    INTEGER NOT NULL,
        title       TEXT    NOT NULL,
        body        TEXT    NOT NULL,
        PRIMARY KEY (contract_id, position)
    );

    CREATE TABLE IF NOT EXISTS signatures (
        contract_id TEXT NOT NULL,
        role        TEXT NOT NULL,
        image       BLOB NOT NULL,
        signed_at   TEXT NOT NULL,
        PRIMARY KEY (contract_id, role)
    );
"#;

/// Scalar contract columns in SELECT order, shared by `load` and `list`.
const CONTRACT_COLUMNS: &str = "id, kind, status, agency_name, agency_email,
        counterparty_name, counterparty_email, title, description,
        payment_amount, payment_schedule, start_date, end_date,
        created_at, updated_at";

/// Convert a `rusqlite::Error` into a `CountersignError::Database`.
fn db_err(e: rusqlite::Error) -> CountersignError {
    CountersignError::Database(e.to_string())
}

/// Contract storage backed by a SQLite database.
///
/// All methods are synchronous because `rusqlite` does not support async
/// natively.  In an async context, wrap calls in `tokio::task::spawn_blocking`.
pub struct ContractStore {
    conn: Connection,
}

impl ContractStore {
    /// Open (or create) the contract database at the given path.
    ///
    /// Applies WAL journal mode for better concurrent-read performance and
    /// creates the contract tables if they do not exist.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| CountersignError::Database(format!("open: {e}")))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| CountersignError::Database(format!("WAL pragma: {e}")))?;

        conn.execute_batch(CREATE_TABLES_SQL)
            .map_err(|e| CountersignError::Database(format!("create tables: {e}")))?;

        info!("contract store opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CountersignError::Database(format!("open in-memory: {e}")))?;

        conn.execute_batch(CREATE_TABLES_SQL)
            .map_err(|e| CountersignError::Database(format!("create tables: {e}")))?;

        debug!("in-memory contract store opened");
        Ok(Self { conn })
    }

    /// Save a contract, inserting or replacing as needed.
    ///
    /// There is no create/update distinction: the first save assigns the id
    /// and every save rewrites the row together with its child collections.
    /// The whole write happens in one transaction.  Bumps `updated_at`.
    #[instrument(skip(self, contract), fields(title = %contract.title))]
    pub fn save(&mut self, contract: &mut Contract) -> Result<ContractId> {
        if contract.payment.amount < 0.0 {
            return Err(CountersignError::InvalidContract(format!(
                "payment amount cannot be negative ({})",
                contract.payment.amount
            )));
        }

        let id = *contract.id.get_or_insert_with(ContractId::new);
        contract.touch();

        let kind_json = serde_json::to_string(&contract.kind)
            .map_err(|e| CountersignError::Database(format!("serialize kind: {e}")))?;
        let status_json = serde_json::to_string(&contract.status)
            .map_err(|e| CountersignError::Database(format!("serialize status: {e}")))?;

        let key = id.to_string();
        let tx = self.conn.transaction().map_err(db_err)?;

        tx.execute(
            "INSERT OR REPLACE INTO contracts (id, kind, status, agency_name,
             agency_email, counterparty_name, counterparty_email, title,
             description, payment_amount, payment_schedule, start_date,
             end_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                key,
                kind_json,
                status_json,
                contract.agency.name,
                contract.agency.email,
                contract.counterparty.name,
                contract.counterparty.email,
                contract.title,
                contract.description,
                contract.payment.amount,
                contract.payment.schedule,
                contract.dates.start.map(|d| d.to_string()),
                contract.dates.end.map(|d| d.to_string()),
                contract.created_at.to_rfc3339(),
                contract.updated_at.to_rfc3339(),
            ],
        )
        .map_err(db_err)?;

        // Child rows carry no identity of their own; a save rewrites them
        // wholesale in position order.
        tx.execute("DELETE FROM scope_items WHERE contract_id = ?1", params![key])
            .map_err(db_err)?;
        tx.execute("DELETE FROM clauses WHERE contract_id = ?1", params![key])
            .map_err(db_err)?;
        tx.execute("DELETE FROM signatures WHERE contract_id = ?1", params![key])
            .map_err(db_err)?;

        for (position, item) in contract.scope.iter().enumerate() {
            tx.execute(
                "INSERT INTO scope_items (contract_id, position, item)
                 VALUES (?1, ?2, ?3)",
                params![key, position as i64, item],
            )
            .map_err(db_err)?;
        }

        for (position, clause) in contract.clauses.iter().enumerate() {
            tx.execute(
                "INSERT INTO clauses (contract_id, position, title, body)
                 VALUES (?1, ?2, ?3, ?4)",
                params![key, position as i64, clause.title, clause.body],
            )
            .map_err(db_err)?;
        }

        let slots = [
            (SignatureRole::Agency, contract.signatures.agency.as_ref()),
            (
                SignatureRole::Counterparty,
                contract.signatures.counterparty.as_ref(),
            ),
        ];
        for (role, signature) in slots {
            let Some(signature) = signature else { continue };
            let role_json = serde_json::to_string(&role)
                .map_err(|e| CountersignError::Database(format!("serialize role: {e}")))?;
            tx.execute(
                "INSERT INTO signatures (contract_id, role, image, signed_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![key, role_json, signature.image_png, signature.signed_at.to_rfc3339()],
            )
            .map_err(db_err)?;
        }

        tx.commit().map_err(db_err)?;
        info!(contract_id = %id, "contract saved");
        Ok(id)
    }

    /// Retrieve a single contract by id, children reassembled in position
    /// order.  Returns `None` if the contract does not exist.
    #[instrument(skip(self), fields(contract_id = %id))]
    pub fn load(&self, id: &ContractId) -> Result<Option<Contract>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = ?1"
            ))
            .map_err(|e| CountersignError::Database(format!("prepare load: {e}")))?;

        let mut rows = stmt
            .query_map(params![id.to_string()], row_to_contract)
            .map_err(|e| CountersignError::Database(format!("query load: {e}")))?;

        let mut contract = match rows.next() {
            Some(Ok(contract)) => contract,
            Some(Err(e)) => return Err(CountersignError::Database(format!("row parse: {e}"))),
            None => return Ok(None),
        };

        self.attach_children(&mut contract)?;
        Ok(Some(contract))
    }

    /// Retrieve all contracts, ordered by creation time (newest first).
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<Contract>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {CONTRACT_COLUMNS} FROM contracts ORDER BY created_at DESC"
            ))
            .map_err(|e| CountersignError::Database(format!("prepare list: {e}")))?;

        let mut contracts = stmt
            .query_map([], row_to_contract)
            .map_err(|e| CountersignError::Database(format!("query list: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| CountersignError::Database(format!("collect rows: {e}")))?;

        for contract in &mut contracts {
            self.attach_children(contract)?;
        }

        debug!(count = contracts.len(), "contracts listed");
        Ok(contracts)
    }

    /// Delete a contract and all of its child rows in one transaction.
    ///
    /// Returns `Ok(())` even if the contract did not exist (idempotent).
    #[instrument(skip(self), fields(contract_id = %id))]
    pub fn delete(&mut self, id: &ContractId) -> Result<()> {
        let key = id.to_string();
        let tx = self.conn.transaction().map_err(db_err)?;

        tx.execute("DELETE FROM signatures WHERE contract_id = ?1", params![key])
            .map_err(db_err)?;
        tx.execute("DELETE FROM clauses WHERE contract_id = ?1", params![key])
            .map_err(db_err)?;
        tx.execute("DELETE FROM scope_items WHERE contract_id = ?1", params![key])
            .map_err(db_err)?;
        tx.execute("DELETE FROM contracts WHERE id = ?1", params![key])
            .map_err(db_err)?;

        tx.commit().map_err(db_err)?;
        info!(contract_id = %id, "contract deleted");
        Ok(())
    }

    /// Record a signature for a stored contract.
    ///
    /// Upserts the signature row and bumps `updated_at`.  A counterparty
    /// signature also moves the stored status to Signed, mirroring the
    /// in-memory model rule.
    #[instrument(skip(self, image_png), fields(contract_id = %id, role = ?role))]
    pub fn record_signature(
        &mut self,
        id: &ContractId,
        role: SignatureRole,
        image_png: &[u8],
        signed_at: DateTime<Utc>,
    ) -> Result<()> {
        let role_json = serde_json::to_string(&role)
            .map_err(|e| CountersignError::Database(format!("serialize role: {e}")))?;

        let key = id.to_string();
        let tx = self.conn.transaction().map_err(db_err)?;

        let known: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM contracts WHERE id = ?1",
                params![key],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        if known == 0 {
            return Err(CountersignError::ContractNotFound(key));
        }

        tx.execute(
            "INSERT OR REPLACE INTO signatures (contract_id, role, image, signed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, role_json, image_png, signed_at.to_rfc3339()],
        )
        .map_err(db_err)?;

        let now = Utc::now().to_rfc3339();
        if role == SignatureRole::Counterparty {
            let status_json = serde_json::to_string(&ContractStatus::Signed)
                .map_err(|e| CountersignError::Database(format!("serialize status: {e}")))?;
            tx.execute(
                "UPDATE contracts SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status_json, now, key],
            )
            .map_err(db_err)?;
        } else {
            tx.execute(
                "UPDATE contracts SET updated_at = ?1 WHERE id = ?2",
                params![now, key],
            )
            .map_err(db_err)?;
        }

        tx.commit().map_err(db_err)?;
        info!(contract_id = %id, "signature recorded");
        Ok(())
    }

    /// Parse a contract payload fetched from a hosted backend.
    ///
    /// This is the single entry point for remote JSON; drifted payloads
    /// (scalar scope, string clauses, null collections) are normalized by
    /// the domain deserializers on the way in.
    pub fn import_json(json: &str) -> Result<Contract> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load the child collections for a contract in position order.
    fn attach_children(&self, contract: &mut Contract) -> Result<()> {
        let key = match contract.id {
            Some(id) => id.to_string(),
            None => return Ok(()),
        };

        let mut stmt = self
            .conn
            .prepare("SELECT item FROM scope_items WHERE contract_id = ?1 ORDER BY position ASC")
            .map_err(db_err)?;
        contract.scope = stmt
            .query_map(params![key], |row| row.get(0))
            .map_err(db_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)?;

        let mut stmt = self
            .conn
            .prepare(
                "SELECT title, body FROM clauses WHERE contract_id = ?1 ORDER BY position ASC",
            )
            .map_err(db_err)?;
        contract.clauses = stmt
            .query_map(params![key], |row| {
                Ok(Clause {
                    title: row.get(0)?,
                    body: row.get(1)?,
                })
            })
            .map_err(db_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)?;

        let mut stmt = self
            .conn
            .prepare("SELECT role, image, signed_at FROM signatures WHERE contract_id = ?1")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![key], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(db_err)?;

        contract.signatures = Signatures::default();
        for row in rows {
            let (role_json, image_png, signed_at_str) = row.map_err(db_err)?;
            let role: SignatureRole = serde_json::from_str(&role_json)
                .map_err(|e| CountersignError::Database(format!("parse role: {e}")))?;
            let signed_at = DateTime::parse_from_rfc3339(&signed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| CountersignError::Database(format!("parse signed_at: {e}")))?;
            let signature = Signature {
                image_png,
                signed_at,
            };
            match role {
                SignatureRole::Agency => contract.signatures.agency = Some(signature),
                SignatureRole::Counterparty => contract.signatures.counterparty = Some(signature),
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Map a SQLite row to a `Contract` with empty child collections.
///
/// Column indices must match `CONTRACT_COLUMNS`.
fn row_to_contract(row: &rusqlite::Row<'_>) -> rusqlite::Result<Contract> {
    let id_str: String = row.get(0)?;
    let kind_json: String = row.get(1)?;
    let status_json: String = row.get(2)?;
    let agency_name: String = row.get(3)?;
    let agency_email: String = row.get(4)?;
    let counterparty_name: String = row.get(5)?;
    let counterparty_email: String = row.get(6)?;
    let title: String = row.get(7)?;
    let description: String = row.get(8)?;
    let payment_amount: f64 = row.get(9)?;
    let payment_schedule: String = row.get(10)?;
    let start_date: Option<String> = row.get(11)?;
    let end_date: Option<String> = row.get(12)?;
    let created_at_str: String = row.get(13)?;
    let updated_at_str: String = row.get(14)?;

    // Malformed stored values surface as a conversion error rather than a
    // panic.
    let uuid = uuid::Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let kind = serde_json::from_str(&kind_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let status = serde_json::from_str(&status_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let start = parse_stored_date(start_date, 11)?;
    let end = parse_stored_date(end_date, 12)?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(13, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(14, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Contract {
        id: Some(ContractId(uuid)),
        kind,
        status,
        agency: Party {
            name: agency_name,
            email: agency_email,
        },
        counterparty: Party {
            name: counterparty_name,
            email: counterparty_email,
        },
        title,
        description,
        scope: Vec::new(),
        payment: PaymentTerms {
            amount: payment_amount,
            schedule: payment_schedule,
        },
        dates: ContractDates { start, end },
        clauses: Vec::new(),
        signatures: Signatures::default(),
        created_at,
        updated_at,
    })
}

/// Parse an optional ISO date column.
fn parse_stored_date(
    value: Option<String>,
    column: usize,
) -> rusqlite::Result<Option<NaiveDate>> {
    match value {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    column,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countersign_core::ContractKind;

    /// Helper: a filled-in client contract with ordered children.
    fn sample_contract() -> Contract {
        let mut contract = Contract::new(ContractKind::Client);
        contract.title = "Website Redesign".into();
        contract.description = "Full redesign of the marketing site.".into();
        contract.agency.name = "Studio North".into();
        contract.agency.email = "hello@studionorth.example".into();
        contract.counterparty.name = "Acme Ltd".into();
        contract.counterparty.email = "ops@acme.example".into();
        contract.scope = vec![
            "Discovery workshop".into(),
            "Design system".into(),
            "Implementation".into(),
        ];
        contract.payment.amount = 12_500.0;
        contract.payment.schedule = "50% upfront, 50% on completion".into();
        contract.dates.start = NaiveDate::from_ymd_opt(2026, 9, 1);
        contract.dates.end = NaiveDate::from_ymd_opt(2026, 12, 18);
        contract.clauses = vec![
            Clause {
                title: "Confidentiality".into(),
                body: "Both parties keep project material confidential.".into(),
            },
            Clause {
                title: "Liability".into(),
                body: "Limited to fees paid.".into(),
            },
        ];
        contract
    }

    #[test]
    fn save_assigns_id_and_round_trips() {
        let mut store = ContractStore::open_in_memory().expect("open in-memory db");
        let mut contract = sample_contract();
        assert!(contract.id.is_none());

        let id = store.save(&mut contract).expect("save");
        assert_eq!(contract.id, Some(id));

        let loaded = store.load(&id).expect("load").expect("found");
        assert_eq!(loaded, contract);
        // Child ordering is position order, not insertion accident.
        assert_eq!(loaded.scope[0], "Discovery workshop");
        assert_eq!(loaded.scope[2], "Implementation");
        assert_eq!(loaded.clauses[0].title, "Confidentiality");
        assert_eq!(loaded.clauses[1].body, "Limited to fees paid.");
    }

    #[test]
    fn save_twice_reuses_id() {
        let mut store = ContractStore::open_in_memory().expect("open in-memory db");
        let mut contract = sample_contract();

        let first = store.save(&mut contract).expect("first save");
        contract.title = "Website Redesign v2".into();
        contract.scope.push("Launch support".into());
        let second = store.save(&mut contract).expect("second save");

        assert_eq!(first, second);
        let all = store.list().expect("list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Website Redesign v2");
        assert_eq!(all[0].scope.len(), 4);
    }

    #[test]
    fn save_rejects_negative_amount() {
        let mut store = ContractStore::open_in_memory().expect("open in-memory db");
        let mut contract = sample_contract();
        contract.payment.amount = -250.0;

        let result = store.save(&mut contract);
        assert!(matches!(result, Err(CountersignError::InvalidContract(_))));
        assert!(contract.id.is_none());
        assert!(store.list().expect("list").is_empty());
    }

    #[test]
    fn list_returns_newest_first() {
        let mut store = ContractStore::open_in_memory().expect("open in-memory db");

        let mut older = sample_contract();
        older.created_at = Utc::now() - chrono::Duration::hours(2);
        let mut newer = sample_contract();
        newer.title = "Brand Refresh".into();

        store.save(&mut older).expect("save older");
        store.save(&mut newer).expect("save newer");

        let all = store.list().expect("list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Brand Refresh");
        assert_eq!(all[1].title, "Website Redesign");
    }

    #[test]
    fn delete_removes_children_and_is_idempotent() {
        let mut store = ContractStore::open_in_memory().expect("open in-memory db");
        let mut contract = sample_contract();
        contract.signatures.agency = Some(Signature {
            image_png: vec![9, 9, 9],
            signed_at: Utc::now(),
        });
        let id = store.save(&mut contract).expect("save");

        store.delete(&id).expect("delete first time");
        store.delete(&id).expect("delete second time (idempotent)");

        assert!(store.load(&id).expect("load").is_none());
        for table in ["scope_items", "clauses", "signatures"] {
            let count: i64 = store
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })
                .expect("count");
            assert_eq!(count, 0, "{table} not emptied");
        }
    }

    #[test]
    fn counterparty_signature_flips_stored_status() {
        let mut store = ContractStore::open_in_memory().expect("open in-memory db");
        let mut contract = sample_contract();
        let id = store.save(&mut contract).expect("save");

        store
            .record_signature(&id, SignatureRole::Counterparty, &[1, 2, 3], Utc::now())
            .expect("record signature");

        let loaded = store.load(&id).expect("load").expect("found");
        assert_eq!(loaded.status, ContractStatus::Signed);
        let signature = loaded
            .signatures
            .counterparty
            .expect("counterparty signature");
        assert_eq!(signature.image_png, vec![1, 2, 3]);
        assert!(loaded.signatures.agency.is_none());
    }

    #[test]
    fn agency_signature_keeps_status() {
        let mut store = ContractStore::open_in_memory().expect("open in-memory db");
        let mut contract = sample_contract();
        let id = store.save(&mut contract).expect("save");

        store
            .record_signature(&id, SignatureRole::Agency, &[7, 7], Utc::now())
            .expect("record signature");

        let loaded = store.load(&id).expect("load").expect("found");
        assert_eq!(loaded.status, ContractStatus::Draft);
        assert!(loaded.signatures.agency.is_some());
        assert!(loaded.signatures.counterparty.is_none());
    }

    #[test]
    fn record_signature_unknown_contract() {
        let mut store = ContractStore::open_in_memory().expect("open in-memory db");
        let result =
            store.record_signature(&ContractId::new(), SignatureRole::Agency, &[1], Utc::now());
        assert!(matches!(result, Err(CountersignError::ContractNotFound(_))));
    }

    #[test]
    fn contracts_survive_reopen() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("contracts.db");

        let id = {
            let mut store = ContractStore::open(&path).expect("open");
            let mut contract = sample_contract();
            store.save(&mut contract).expect("save")
        };

        let store = ContractStore::open(&path).expect("reopen");
        let loaded = store.load(&id).expect("load").expect("found");
        assert_eq!(loaded.title, "Website Redesign");
        assert_eq!(loaded.scope.len(), 3);
    }

    #[test]
    fn import_json_normalizes_drifted_payloads() {
        let payload = r#"{
            "kind": "Client",
            "status": "Draft",
            "agency": {"name": "Studio North", "email": ""},
            "counterparty": {"name": "Acme Ltd", "email": "ops@acme.example"},
            "title": "Imported Engagement",
            "description": "",
            "scope": "Design and build the marketing site",
            "payment": {"amount": 4500.0, "schedule": "On completion"},
            "dates": {"start": null, "end": null},
            "clauses": ["Payment terms", {"title": "Liability", "body": "Limited to fees paid."}],
            "created_at": "2026-08-01T09:00:00Z",
            "updated_at": "2026-08-01T09:00:00Z"
        }"#;

        let contract = ContractStore::import_json(payload).expect("import");
        assert!(contract.id.is_none());
        assert_eq!(
            contract.scope,
            vec!["Design and build the marketing site".to_string()]
        );
        assert_eq!(contract.clauses.len(), 2);
        assert_eq!(contract.clauses[0].title, "Payment terms");
        assert_eq!(contract.clauses[0].body, "");
        assert_eq!(contract.clauses[1].body, "Limited to fees paid.");
        assert!(contract.signatures.agency.is_none());
    }

    #[test]
    fn import_json_rejects_malformed_payload() {
        let result = ContractStore::import_json("{ not json");
        assert!(matches!(result, Err(CountersignError::Serialization(_))));
    }
}
