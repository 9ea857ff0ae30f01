// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Countersign contract engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::de;

/// Unique identifier for a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(pub Uuid);

impl ContractId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short form (last 8 characters of the canonical representation),
    /// used where a full UUID is unwieldy, e.g. filename fallbacks.
    pub fn short(&self) -> String {
        let s = self.0.to_string();
        s[s.len() - 8..].to_string()
    }
}

impl Default for ContractId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an agency profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgencyId(pub Uuid);

impl AgencyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgencyId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgencyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two contract families the engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractKind {
    /// Agency engages an external client for project work.
    Client,
    /// Agency hires an individual into a position.
    Hiring,
}

impl ContractKind {
    /// Label for the work section heading ("Project" vs "Position").
    pub fn work_label(&self) -> &'static str {
        match self {
            Self::Client => "Project",
            Self::Hiring => "Position",
        }
    }

    /// Label for the non-agency party.
    pub fn counterparty_label(&self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Hiring => "Employee",
        }
    }

    /// Payment schedule options offered for this contract family.
    pub fn schedule_options(&self) -> &'static [&'static str] {
        match self {
            Self::Client => &[
                "On completion",
                "50% upfront, 50% on completion",
                "Monthly invoice",
                "Per milestone",
            ],
            Self::Hiring => &[
                "Monthly salary",
                "Bi-weekly salary",
                "Weekly salary",
                "Hourly rate",
            ],
        }
    }
}

/// Lifecycle states of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    /// Being authored, fully mutable.
    Draft,
    /// Shared with the counterparty, awaiting signature.
    Review,
    /// Counterparty has signed.
    Signed,
    /// Both sides signed and the engagement concluded.
    Completed,
}

impl ContractStatus {
    /// Only drafts accept field edits; the editing session enforces this.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

/// One side of a contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub email: String,
}

/// Payment amount and schedule. The amount is validated as non-negative
/// on save, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentTerms {
    pub amount: f64,
    pub schedule: String,
}

/// Optional engagement window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractDates {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// A numbered contract clause.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub title: String,
    pub body: String,
}

impl Clause {
    /// Body text, falling back to the title for clauses entered as a
    /// bare heading.
    pub fn body_or_title(&self) -> &str {
        if self.body.trim().is_empty() {
            &self.title
        } else {
            &self.body
        }
    }
}

/// Which side a signature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureRole {
    Agency,
    Counterparty,
}

/// A captured signature image with its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// PNG bytes from the signing canvas.
    pub image_png: Vec<u8>,
    pub signed_at: DateTime<Utc>,
}

/// Both signature slots of a contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signatures {
    pub agency: Option<Signature>,
    pub counterparty: Option<Signature>,
}

impl Signatures {
    pub fn is_fully_signed(&self) -> bool {
        self.agency.is_some() && self.counterparty.is_some()
    }
}

/// A complete contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Unset until first persisted; the store assigns it.
    pub id: Option<ContractId>,
    pub kind: ContractKind,
    pub status: ContractStatus,
    /// Contract-level copy of the agency details; blank fields fall back
    /// to the agency profile at render time.
    pub agency: Party,
    pub counterparty: Party,
    pub title: String,
    pub description: String,
    /// Ordered scope-of-work items.
    #[serde(default, deserialize_with = "de::string_list")]
    pub scope: Vec<String>,
    pub payment: PaymentTerms,
    pub dates: ContractDates,
    #[serde(default, deserialize_with = "de::clause_list")]
    pub clauses: Vec<Clause>,
    #[serde(default)]
    pub signatures: Signatures,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn new(kind: ContractKind) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            kind,
            status: ContractStatus::Draft,
            agency: Party::default(),
            counterparty: Party::default(),
            title: String::new(),
            description: String::new(),
            scope: Vec::new(),
            payment: PaymentTerms::default(),
            dates: ContractDates::default(),
            clauses: Vec::new(),
            signatures: Signatures::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a signature. A counterparty signature moves the contract
    /// to Signed.
    pub fn apply_signature(&mut self, role: SignatureRole, signature: Signature) {
        match role {
            SignatureRole::Agency => self.signatures.agency = Some(signature),
            SignatureRole::Counterparty => {
                self.signatures.counterparty = Some(signature);
                self.status = ContractStatus::Signed;
            }
        }
        self.updated_at = Utc::now();
    }

    /// Signing URL for this contract, derived (never stored) from the
    /// host's base URL. `None` until the contract has been persisted.
    pub fn share_link(&self, base_url: &str) -> Option<String> {
        let id = self.id?;
        Some(format!("{}/sign/{}", base_url.trim_end_matches('/'), id))
    }

    /// Agency name for rendering: the contract-level copy, or the agency
    /// profile value when the copy is blank.
    pub fn agency_name_or<'a>(&'a self, agency: &'a Agency) -> &'a str {
        if self.agency.name.trim().is_empty() {
            &agency.name
        } else {
            &self.agency.name
        }
    }

    /// Agency email for rendering, with the same fallback rule.
    pub fn agency_email_or<'a>(&'a self, agency: &'a Agency) -> &'a str {
        if self.agency.email.trim().is_empty() {
            &agency.email
        } else {
            &self.agency.email
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// The agency profile: branding and contact details shared by all of an
/// agency's contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    pub id: AgencyId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub address: String,
    /// Logo PNG bytes, watermarked onto generated documents.
    pub logo_png: Option<Vec<u8>>,
    pub updated_at: DateTime<Utc>,
}

impl Agency {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: AgencyId::new(),
            name: name.into(),
            email: String::new(),
            phone: String::new(),
            website: String::new(),
            address: String::new(),
            logo_png: None,
            updated_at: Utc::now(),
        }
    }
}

/// Standard paper sizes for generated documents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    Letter,
    Legal,
    Custom { width_mm: f64, height_mm: f64 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Letter => (215.9, 279.4),
            Self::Legal => (215.9, 355.6),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_is_last_eight_chars() {
        let id = ContractId::new();
        let short = id.short();
        assert_eq!(short.len(), 8);
        assert!(id.to_string().ends_with(&short));
    }

    #[test]
    fn counterparty_signature_flips_status() {
        let mut contract = Contract::new(ContractKind::Client);
        contract.apply_signature(
            SignatureRole::Agency,
            Signature {
                image_png: vec![1, 2, 3],
                signed_at: Utc::now(),
            },
        );
        assert_eq!(contract.status, ContractStatus::Draft);

        contract.apply_signature(
            SignatureRole::Counterparty,
            Signature {
                image_png: vec![4, 5, 6],
                signed_at: Utc::now(),
            },
        );
        assert_eq!(contract.status, ContractStatus::Signed);
        assert!(contract.signatures.is_fully_signed());
    }

    #[test]
    fn share_link_requires_persisted_id() {
        let mut contract = Contract::new(ContractKind::Hiring);
        assert!(contract.share_link("https://example.com").is_none());

        let id = ContractId::new();
        contract.id = Some(id);
        assert_eq!(
            contract.share_link("https://example.com/"),
            Some(format!("https://example.com/sign/{id}"))
        );
    }

    #[test]
    fn kind_labels() {
        assert_eq!(ContractKind::Client.work_label(), "Project");
        assert_eq!(ContractKind::Hiring.counterparty_label(), "Employee");
        assert!(!ContractKind::Hiring.schedule_options().is_empty());
    }

    #[test]
    fn blank_agency_fields_fall_back_to_profile() {
        let mut agency = Agency::new("Studio North");
        agency.email = "hello@studionorth.example".into();

        let mut contract = Contract::new(ContractKind::Client);
        assert_eq!(contract.agency_name_or(&agency), "Studio North");

        contract.agency.name = "Studio North Ltd".into();
        assert_eq!(contract.agency_name_or(&agency), "Studio North Ltd");
        assert_eq!(contract.agency_email_or(&agency), "hello@studionorth.example");
    }
}
