// Wire-format conversions.
//
// OPNsense transports booleans as "0"/"1", numbers as strings (empty meaning
// unset), and lists as delimited strings on write. These helpers keep the
// resource modules free of ad-hoc parsing.

use std::fmt::Display;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ── Booleans ─────────────────────────────────────────────────────────

/// `true` -> `"1"`, `false` -> `"0"`.
pub fn bool_to_flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_owned()
}

/// Interpret a textual flag. Anything but `1`/`true`/`yes`/`on` is false.
pub fn flag_to_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Deserialize a flag given as string, integer, or boolean.
pub fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => Ok(flag_to_bool(&s)),
        other => Err(D::Error::custom(format!("expected a flag, got {other}"))),
    }
}

// ── Numbers ──────────────────────────────────────────────────────────

/// Deserialize an optional number given as string or JSON number.
/// Empty strings and `null` decode to `None`.
pub fn de_opt_num<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let text = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        other => return Err(D::Error::custom(format!("expected a number, got {other}"))),
    };
    parse_opt_num(&text).map_err(D::Error::custom)
}

/// Parse an optional number from text; blank is `None`.
pub fn parse_opt_num<T>(text: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: Display,
{
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse()
        .map(Some)
        .map_err(|e| format!("invalid number '{text}': {e}"))
}

/// `Some(5)` -> `"5"`, `None` -> `""`.
pub fn opt_num_to_string<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ── Strings ──────────────────────────────────────────────────────────

/// Deserialize a string that may arrive as a number, bool, or `null`.
pub fn de_lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(bool_to_flag(b)),
        other => Err(D::Error::custom(format!("expected a string, got {other}"))),
    }
}

/// `Some("x")` for non-blank text.
pub fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

// ── Lists ────────────────────────────────────────────────────────────

/// Newline-joined list (alias content).
pub fn join_lines(items: &[String]) -> String {
    items.join("\n")
}

/// Comma-joined list (categories, interfaces, members).
pub fn join_csv(items: &[String]) -> String {
    items.join(",")
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Split newline-separated content, trimming entries and dropping blanks.
pub fn split_lines(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
