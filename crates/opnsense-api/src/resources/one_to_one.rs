// One-to-one NAT rules (`firewall/one_to_one`).

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::filter::{endpoint, yes};
use super::{Commands, ModelItem, RuleEndpoint};
use crate::convert::{bool_to_flag, de_flag, de_lenient_string, de_opt_num, join_csv, opt_num_to_string};
use crate::error::Error;
use crate::select::SelectField;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OneToOneType {
    #[default]
    Binat,
    Nat,
}

/// Reflection override; `Default` follows the system-wide setting.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NatReflection {
    #[default]
    #[strum(to_string = "", serialize = "default")]
    Default,
    Enable,
    Disable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneToOneRule {
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default)]
    pub log: bool,
    #[serde(default)]
    pub sequence: Option<u32>,
    pub interface: String,
    #[serde(rename = "type", default)]
    pub nat_type: OneToOneType,
    /// Internal address or network.
    pub source: RuleEndpoint,
    #[serde(default = "RuleEndpoint::any")]
    pub destination: RuleEndpoint,
    /// External address the source maps to.
    pub external: String,
    #[serde(default)]
    pub nat_reflection: NatReflection,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl Default for OneToOneRule {
    fn default() -> Self {
        Self {
            enabled: true,
            log: false,
            sequence: None,
            interface: "wan".to_owned(),
            nat_type: OneToOneType::Binat,
            source: RuleEndpoint::any(),
            destination: RuleEndpoint::any(),
            external: String::new(),
            nat_reflection: NatReflection::Default,
            categories: Vec::new(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OneToOneRequest {
    pub enabled: String,
    pub log: String,
    pub sequence: String,
    pub interface: String,
    #[serde(rename = "type")]
    pub nat_type: String,
    pub source_net: String,
    pub source_not: String,
    pub destination_net: String,
    pub destination_not: String,
    pub external: String,
    pub natreflection: String,
    pub categories: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OneToOneResponse {
    #[serde(default, deserialize_with = "de_flag")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub log: bool,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub sequence: Option<u32>,
    #[serde(default)]
    pub interface: SelectField,
    #[serde(rename = "type", default)]
    pub nat_type: SelectField,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub source_net: String,
    #[serde(default, deserialize_with = "de_flag")]
    pub source_not: bool,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub destination_net: String,
    #[serde(default, deserialize_with = "de_flag")]
    pub destination_not: bool,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub external: String,
    #[serde(default)]
    pub natreflection: SelectField,
    #[serde(default)]
    pub categories: SelectField,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub description: String,
}

impl ModelItem for OneToOneRule {
    const KIND: &'static str = "one-to-one NAT rule";
    const BASE: &'static str = "firewall/one_to_one";
    const WRAPPER: &'static str = "rule";
    const COMMANDS: Commands = Commands::RULE;
    const APPLY: Option<&'static str> = Some("apply");

    type Request = OneToOneRequest;
    type Response = OneToOneResponse;

    fn to_request(&self) -> OneToOneRequest {
        OneToOneRequest {
            enabled: bool_to_flag(self.enabled),
            log: bool_to_flag(self.log),
            sequence: opt_num_to_string(self.sequence),
            interface: self.interface.clone(),
            nat_type: self.nat_type.to_string(),
            source_net: self.source.net.clone(),
            source_not: bool_to_flag(self.source.invert),
            destination_net: self.destination.net.clone(),
            destination_not: bool_to_flag(self.destination.invert),
            external: self.external.clone(),
            natreflection: self.nat_reflection.to_string(),
            categories: join_csv(&self.categories),
            description: self.description.clone(),
        }
    }

    fn from_response(r: OneToOneResponse) -> Result<Self, Error> {
        Ok(Self {
            enabled: r.enabled,
            log: r.log,
            sequence: r.sequence,
            interface: r.interface.single().unwrap_or_default().to_owned(),
            nat_type: r.nat_type.single_as("rule.type")?.unwrap_or_default(),
            source: endpoint(r.source_net, r.source_not, String::new()),
            destination: endpoint(r.destination_net, r.destination_not, String::new()),
            external: r.external,
            // The "default" choice is the empty key, which never counts as selected.
            nat_reflection: r
                .natreflection
                .single_as("rule.natreflection")?
                .unwrap_or_default(),
            categories: r.categories.multi(),
            description: r.description,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reflection_default_is_empty_on_the_wire() {
        assert_eq!(NatReflection::Default.to_string(), "");
        assert_eq!("default".parse::<NatReflection>().unwrap(), NatReflection::Default);
        assert_eq!(NatReflection::Enable.to_string(), "enable");
    }

    #[test]
    fn round_trips_through_wire_shapes() {
        let rule = OneToOneRule {
            sequence: Some(3),
            nat_type: OneToOneType::Nat,
            source: RuleEndpoint {
                net: "192.168.1.10".into(),
                invert: false,
                port: String::new(),
            },
            external: "203.0.113.5".into(),
            nat_reflection: NatReflection::Disable,
            description: "mail".into(),
            ..OneToOneRule::default()
        };
        let req = rule.to_request();
        assert_eq!(req.nat_type, "nat");
        assert_eq!(req.natreflection, "disable");

        let raw = json!({
            "enabled": req.enabled,
            "log": req.log,
            "sequence": req.sequence,
            "interface": {"wan": {"value": "WAN", "selected": 1}},
            "type": {"binat": {"value": "BINAT", "selected": 0}, "nat": {"value": "NAT", "selected": 1}},
            "source_net": req.source_net,
            "source_not": req.source_not,
            "destination_net": req.destination_net,
            "destination_not": req.destination_not,
            "external": req.external,
            "natreflection": {
                "": {"value": "Default", "selected": 0},
                "enable": {"value": "Enable", "selected": 0},
                "disable": {"value": "Disable", "selected": 1}
            },
            "categories": [],
            "description": req.description
        });
        let back = OneToOneRule::from_response(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(back, rule);
    }
}
