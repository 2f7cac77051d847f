// Selected-option fields.
//
// OPNsense renders every select and multi-select form field as a map from
// option key to `{ value, selected }`. Writes take the plain key (or a
// comma/newline-joined list of keys); reads return the whole option map.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::convert::{de_flag, de_lenient_string};
use crate::error::Error;

/// One candidate in a selectable field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub value: String,
    #[serde(default, deserialize_with = "de_flag")]
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            selected,
        }
    }
}

/// An option map keyed by option key.
///
/// Keys are held in sorted order, so "first selected" and multi-select
/// output are deterministic regardless of the order OPNsense emitted them.
/// The empty key is OPNsense's "none" entry and never counts as a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectField(BTreeMap<String, SelectOption>);

impl SelectField {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All candidate options, sorted by key.
    pub fn options(&self) -> impl Iterator<Item = (&str, &SelectOption)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn selected_keys(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(key, opt)| opt.selected && !key.is_empty())
            .map(|(key, _)| key.as_str())
    }

    /// The selected key of a single-select field, if any.
    pub fn single(&self) -> Option<&str> {
        self.selected_keys().next()
    }

    /// Every selected key, sorted lexicographically.
    pub fn multi(&self) -> Vec<String> {
        self.selected_keys().map(str::to_owned).collect()
    }

    /// Display label of the selected option.
    pub fn selected_label(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, opt)| opt.selected && !key.is_empty())
            .map(|(_, opt)| opt.value.as_str())
    }

    /// Parse the selected key of a single-select field.
    pub fn single_as<T>(&self, field: &str) -> Result<Option<T>, Error>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.single().map(|key| parse_key(field, key)).transpose()
    }

    /// Parse every selected key, sorted by the parsed value.
    pub fn multi_as<T>(&self, field: &str) -> Result<Vec<T>, Error>
    where
        T: FromStr + Ord,
        T::Err: Display,
    {
        let mut out = self
            .selected_keys()
            .map(|key| parse_key(field, key))
            .collect::<Result<Vec<T>, _>>()?;
        out.sort();
        Ok(out)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        let entries: Vec<(String, Value)> = match value {
            Value::Null => Vec::new(),
            Value::Object(map) => map.into_iter().collect(),
            // PHP serializes an empty or zero-indexed array as a JSON list.
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(idx, v)| (idx.to_string(), v))
                .collect(),
            // Some controllers return the bare key when nothing else is offered.
            Value::String(s) if s.is_empty() => Vec::new(),
            Value::String(s) => {
                return Ok(Self(BTreeMap::from([(
                    s.clone(),
                    SelectOption::new(s, true),
                )])));
            }
            other => return Err(format!("expected an option map, got {other}")),
        };

        let mut map = BTreeMap::new();
        for (key, raw) in entries {
            let option = match raw {
                Value::Object(_) => {
                    serde_json::from_value::<SelectOption>(raw).map_err(|e| e.to_string())?
                }
                // Plain-string entries appear in informational maps; never selected.
                Value::String(s) => SelectOption::new(s, false),
                other => return Err(format!("invalid option '{key}': {other}")),
            };
            map.insert(key, option);
        }
        Ok(Self(map))
    }
}

fn parse_key<T>(field: &str, key: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    key.parse().map_err(|e: T::Err| Error::InvalidValue {
        field: field.to_owned(),
        reason: format!("unknown option '{key}': {e}"),
    })
}

impl<'de> Deserialize<'de> for SelectField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

impl<K: Into<String>> FromIterator<(K, SelectOption)> for SelectField {
    fn from_iter<I: IntoIterator<Item = (K, SelectOption)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl SelectField {
    /// Build a field from `(key, selected)` pairs, labelling each option with
    /// its key. Mirrors what OPNsense returns for a given selection.
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        keys.into_iter()
            .map(|(k, selected)| (k, SelectOption::new(k, selected)))
            .collect()
    }

    /// A field where exactly the given keys are selected.
    pub fn selecting<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self::from_keys(keys.into_iter().map(|k| (k, true)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use strum::EnumString;

    use super::*;

    #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, EnumString)]
    #[strum(serialize_all = "lowercase")]
    enum Action {
        Pass,
        Block,
    }

    fn parse(json: &str) -> SelectField {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn single_select_picks_selected_key() {
        let field = parse(
            r#"{"pass":{"value":"Pass","selected":0},"block":{"value":"Block","selected":1}}"#,
        );
        assert_eq!(field.single(), Some("block"));
        assert_eq!(field.selected_label(), Some("Block"));
        assert_eq!(field.single_as::<Action>("action").unwrap(), Some(Action::Block));
    }

    #[test]
    fn nothing_selected_is_none() {
        let field = parse(r#"{"a":{"value":"A","selected":0}}"#);
        assert_eq!(field.single(), None);
        assert!(field.multi().is_empty());
    }

    #[test]
    fn none_entry_is_not_a_selection() {
        let field = parse(
            r#"{"":{"value":"none","selected":1},"wan_gw":{"value":"WAN_GW","selected":0}}"#,
        );
        assert_eq!(field.single(), None);
    }

    #[test]
    fn multi_select_is_sorted_regardless_of_input_order() {
        let a = parse(
            r#"{"wan":{"value":"WAN","selected":1},"lan":{"value":"LAN","selected":1},"opt1":{"value":"OPT1","selected":0}}"#,
        );
        let b = parse(
            r#"{"opt1":{"value":"OPT1","selected":0},"lan":{"value":"LAN","selected":"1"},"wan":{"value":"WAN","selected":true}}"#,
        );
        assert_eq!(a.multi(), ["lan", "wan"]);
        assert_eq!(a.multi(), b.multi());
    }

    #[test]
    fn php_empty_array_is_empty_field() {
        let field = parse("[]");
        assert!(field.is_empty());
        assert_eq!(field.single(), None);
    }

    #[test]
    fn php_list_uses_indices_as_keys() {
        let field = parse(r#"[{"value":"zero","selected":0},{"value":"one","selected":1}]"#);
        assert_eq!(field.single(), Some("1"));
    }

    #[test]
    fn unknown_option_is_invalid_value() {
        let field = parse(r#"{"reject":{"value":"Reject","selected":1}}"#);
        let err = field.single_as::<Action>("rule.action").unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref field, .. } if field == "rule.action"));
    }

    #[test]
    fn multi_as_parses_and_sorts() {
        let field = SelectField::selecting(["block", "pass"]);
        assert_eq!(
            field.multi_as::<Action>("x").unwrap(),
            vec![Action::Pass, Action::Block]
        );
    }
}
