// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tolerant deserialization for contract payloads.
//
// Remote backends have historically returned scope and clause fields as an
// array, a bare scalar, or null depending on version. Normalization happens
// here, at the deserialization boundary, so the rest of the codebase only
// ever sees a `Vec`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::Clause;

/// Accept a JSON array, a bare scalar, or null; always produce a `Vec<String>`.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().filter_map(scalar_to_string).collect(),
        scalar => scalar_to_string(scalar).into_iter().collect(),
    })
}

/// Accept a JSON array of clauses, a single clause, or null. A clause may be
/// a bare string (treated as a title) or a `{title, body}` object.
pub fn clause_list<'de, D>(deserializer: D) -> Result<Vec<Clause>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().filter_map(coerce_clause).collect(),
        single => coerce_clause(single).into_iter().collect(),
    })
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Null entries and nested structures carry no scope text.
        _ => None,
    }
}

fn coerce_clause(value: Value) -> Option<Clause> {
    match value {
        Value::String(title) => Some(Clause {
            title,
            body: String::new(),
        }),
        Value::Object(map) => {
            let title = map
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let body = map
                .get("body")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if title.is_empty() && body.is_empty() {
                None
            } else {
                Some(Clause { title, body })
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct ScopeOnly {
        #[serde(default, deserialize_with = "string_list")]
        scope: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    struct ClausesOnly {
        #[serde(default, deserialize_with = "clause_list")]
        clauses: Vec<Clause>,
    }

    #[test]
    fn scope_array_passes_through() {
        let parsed: ScopeOnly = serde_json::from_str(r#"{"scope": ["design", "build"]}"#)
            .expect("array scope");
        assert_eq!(parsed.scope, vec!["design", "build"]);
    }

    #[test]
    fn scope_scalar_becomes_single_item() {
        let parsed: ScopeOnly =
            serde_json::from_str(r#"{"scope": "full rebrand"}"#).expect("scalar scope");
        assert_eq!(parsed.scope, vec!["full rebrand"]);
    }

    #[test]
    fn scope_null_and_missing_become_empty() {
        let null: ScopeOnly = serde_json::from_str(r#"{"scope": null}"#).expect("null scope");
        assert!(null.scope.is_empty());

        let missing: ScopeOnly = serde_json::from_str(r#"{}"#).expect("missing scope");
        assert!(missing.scope.is_empty());
    }

    #[test]
    fn scope_numbers_are_stringified() {
        let parsed: ScopeOnly =
            serde_json::from_str(r#"{"scope": [1, "two", null]}"#).expect("mixed scope");
        assert_eq!(parsed.scope, vec!["1", "two"]);
    }

    #[test]
    fn clause_strings_become_titles() {
        let parsed: ClausesOnly =
            serde_json::from_str(r#"{"clauses": ["Confidentiality"]}"#).expect("string clause");
        assert_eq!(parsed.clauses.len(), 1);
        assert_eq!(parsed.clauses[0].title, "Confidentiality");
        assert!(parsed.clauses[0].body.is_empty());
    }

    #[test]
    fn clause_objects_keep_both_fields() {
        let parsed: ClausesOnly = serde_json::from_str(
            r#"{"clauses": [{"title": "Term", "body": "12 months"}, {"title": "IP"}]}"#,
        )
        .expect("object clauses");
        assert_eq!(parsed.clauses[0].body, "12 months");
        assert_eq!(parsed.clauses[1].title, "IP");
        assert!(parsed.clauses[1].body.is_empty());
    }

    #[test]
    fn single_clause_object_becomes_list() {
        let parsed: ClausesOnly =
            serde_json::from_str(r#"{"clauses": {"title": "Term", "body": "12 months"}}"#)
                .expect("single clause");
        assert_eq!(parsed.clauses.len(), 1);
    }

    #[test]
    fn empty_and_null_clauses_are_dropped() {
        let parsed: ClausesOnly =
            serde_json::from_str(r#"{"clauses": [{}, null, "Payment"]}"#).expect("sparse clauses");
        assert_eq!(parsed.clauses.len(), 1);
        assert_eq!(parsed.clauses[0].title, "Payment");
    }
}
