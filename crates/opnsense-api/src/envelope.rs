// Response envelopes shared by every OPNsense controller.
//
// Mutations answer `{ result, uuid, validations }`, deletes answer
// `{ result }`, and apply/reconfigure answer `{ status }`. These helpers
// turn a raw body into a domain-level outcome.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::client::decode;
use crate::error::Error;

// ── Validation messages ──────────────────────────────────────────────

/// Field-level validation messages keyed by model path (e.g. `alias.name`).
///
/// OPNsense emits each entry as a string or an array of strings; other
/// shapes are kept as their JSON text. An empty key holds messages that
/// are not tied to a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Validations(BTreeMap<String, Vec<String>>);

impl Validations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Field paths that carry at least one message, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn messages(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    fn from_value(value: Value) -> Self {
        let map = match value {
            Value::Null => BTreeMap::new(),
            Value::Object(fields) => fields
                .into_iter()
                .map(|(field, msgs)| (field, messages_from(msgs)))
                .filter(|(_, msgs)| !msgs.is_empty())
                .collect(),
            other => {
                let msgs = messages_from(other);
                if msgs.is_empty() {
                    BTreeMap::new()
                } else {
                    BTreeMap::from([(String::new(), msgs)])
                }
            }
        };
        Self(map)
    }
}

fn messages_from(value: Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s],
        Value::Array(items) => items.into_iter().flat_map(messages_from).collect(),
        other => vec![other.to_string()],
    }
}

impl<'de> Deserialize<'de> for Validations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

impl FromIterator<(String, String)> for Validations {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (field, msg) in iter {
            map.entry(field).or_default().push(msg);
        }
        Self(map)
    }
}

/// One line per message: `field: message`.
impl fmt::Display for Validations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, msgs) in &self.0 {
            for msg in msgs {
                if !first {
                    writeln!(f)?;
                }
                first = false;
                if field.is_empty() {
                    write!(f, "{msg}")?;
                } else {
                    write!(f, "{field}: {msg}")?;
                }
            }
        }
        Ok(())
    }
}

// ── Envelopes ────────────────────────────────────────────────────────

/// Response of `add*` / `set*` commands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MutationResult {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub validations: Validations,
}

impl MutationResult {
    pub fn is_failed(&self) -> bool {
        self.result.eq_ignore_ascii_case("failed")
    }

    /// The new object's uuid, or the validation failure.
    pub fn into_uuid(self) -> Result<String, Error> {
        if self.is_failed() {
            Err(Error::Validation(self.validations))
        } else {
            Ok(self.uuid)
        }
    }
}

/// Response of `del*` commands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteResult {
    #[serde(default)]
    pub result: String,
}

/// Response of `apply` / `reconfigure` commands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplyResult {
    #[serde(default)]
    pub status: String,
}

// ── Interpretation ───────────────────────────────────────────────────

/// Decode an add/set response, returning the uuid (empty for set).
pub fn interpret_add_or_set(body: &[u8]) -> Result<String, Error> {
    decode::<MutationResult>(body)?.into_uuid()
}

/// Decode a delete response. `deleted` and `not found` both succeed.
pub fn interpret_delete(body: &[u8]) -> Result<(), Error> {
    let outcome: DeleteResult = decode(body)?;
    check_delete(&outcome)
}

pub(crate) fn check_delete(outcome: &DeleteResult) -> Result<(), Error> {
    let result = outcome.result.trim();
    if result.eq_ignore_ascii_case("deleted") || result.eq_ignore_ascii_case("not found") {
        Ok(())
    } else {
        Err(Error::UnexpectedResult {
            result: outcome.result.clone(),
        })
    }
}

/// Decode an apply/reconfigure response; `status` must be `ok`.
pub fn interpret_apply(body: &[u8]) -> Result<(), Error> {
    let outcome: ApplyResult = decode(body)?;
    check_apply(&outcome)
}

pub(crate) fn check_apply(outcome: &ApplyResult) -> Result<(), Error> {
    if outcome.status.trim().eq_ignore_ascii_case("ok") {
        Ok(())
    } else {
        Err(Error::ApplyConfig {
            status: outcome.status.trim().to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn saved_returns_uuid() {
        let uuid = interpret_add_or_set(
            br#"{"result":"saved","uuid":"2f1a5c9e-8c44-4a59-9f59-5e1f1ab3c0de"}"#,
        )
        .unwrap();
        assert_eq!(uuid, "2f1a5c9e-8c44-4a59-9f59-5e1f1ab3c0de");
    }

    #[test]
    fn set_without_uuid_is_ok() {
        assert_eq!(interpret_add_or_set(br#"{"result":"saved"}"#).unwrap(), "");
    }

    #[test]
    fn failed_carries_validations() {
        let err = interpret_add_or_set(
            br#"{"result":"failed","uuid":"","validations":{"alias.name":"required"}}"#,
        )
        .unwrap_err();
        let validations = match err {
            Error::Validation(v) => v,
            other => panic!("expected Validation, got {other:?}"),
        };
        assert_eq!(validations.messages("alias.name").unwrap(), ["required"]);
        assert!(validations.to_string().contains("alias.name"));
    }

    #[test]
    fn failed_is_case_insensitive() {
        let err = interpret_add_or_set(br#"{"result":"FAILED"}"#).unwrap_err();
        assert!(matches!(err, Error::Validation(ref v) if v.is_empty()));
    }

    #[test]
    fn validations_accept_arrays_and_php_empty_list() {
        let v: Validations = serde_json::from_str(
            r#"{"rule.source_net":["invalid network","must not be empty"],"rule.sequence":"out of range"}"#,
        )
        .unwrap();
        assert_eq!(
            v.to_string(),
            "rule.sequence: out of range\nrule.source_net: invalid network\nrule.source_net: must not be empty"
        );

        let empty: Validations = serde_json::from_str("[]").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn unkeyed_messages_render_bare() {
        let v: Validations = serde_json::from_str(r#"["template too large"]"#).unwrap();
        assert_eq!(v.to_string(), "template too large");
    }

    #[test]
    fn delete_is_idempotent() {
        interpret_delete(br#"{"result":"deleted"}"#).unwrap();
        interpret_delete(br#"{"result":"not found"}"#).unwrap();
        interpret_delete(br#"{"result":"Not Found"}"#).unwrap();
    }

    #[test]
    fn delete_rejects_other_results() {
        let bodies: [&[u8]; 3] = [br#"{"result":"failed"}"#, br#"{"result":""}"#, br"{}"];
        for body in bodies {
            let err = interpret_delete(body).unwrap_err();
            assert!(matches!(err, Error::UnexpectedResult { .. }), "got {err:?}");
        }
    }

    #[test]
    fn apply_accepts_padded_ok() {
        interpret_apply(br#"{"status":"ok"}"#).unwrap();
        interpret_apply(br#"{"status":" OK\n\n"}"#).unwrap();
    }

    #[test]
    fn apply_rejects_other_status() {
        let err = interpret_apply(br#"{"status":"failed"}"#).unwrap_err();
        assert!(matches!(err, Error::ApplyConfig { ref status } if status == "failed"));
    }

    #[test]
    fn malformed_body_is_deserialization_error() {
        let err = interpret_apply(b"<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }
}
