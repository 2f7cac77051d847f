// Firewall aliases (`firewall/alias`).

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::{Commands, ModelItem};
use crate::convert::{
    bool_to_flag, de_flag, de_lenient_string, join_csv, join_lines, parse_opt_num, split_lines,
};
use crate::error::Error;
use crate::select::SelectField;

/// Alias kinds known to OPNsense.
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
pub enum AliasType {
    #[default]
    Host,
    Network,
    Port,
    Url,
    UrlTable,
    GeoIp,
    NetworkGroup,
    Mac,
    Asn,
    DynIpv6Host,
    AuthGroup,
    Internal,
    External,
}

/// A named set of hosts, networks, ports, or URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    pub name: String,
    #[serde(rename = "type", default)]
    pub alias_type: AliasType,
    /// Address families (`IPv4`, `IPv6`) for GeoIP/ASN aliases.
    #[serde(default)]
    pub protocols: Vec<String>,
    /// Interface for dynamic IPv6 host aliases.
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub counters: bool,
    /// Refresh interval in days for URL table aliases.
    #[serde(default)]
    pub update_freq: Option<f64>,
    #[serde(default)]
    pub content: Vec<String>,
    /// Category uuids.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: String,
}

fn enabled_default() -> bool {
    true
}

impl Alias {
    pub fn new(name: impl Into<String>, alias_type: AliasType) -> Self {
        Self {
            enabled: true,
            name: name.into(),
            alias_type,
            protocols: Vec::new(),
            interface: None,
            counters: false,
            update_freq: None,
            content: Vec::new(),
            categories: Vec::new(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AliasRequest {
    pub enabled: String,
    pub name: String,
    #[serde(rename = "type")]
    pub alias_type: String,
    pub proto: String,
    pub interface: String,
    pub counters: String,
    pub updatefreq: String,
    pub content: String,
    pub categories: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AliasResponse {
    #[serde(default, deserialize_with = "de_flag")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub alias_type: SelectField,
    #[serde(default)]
    pub proto: SelectField,
    #[serde(default)]
    pub interface: SelectField,
    #[serde(default, deserialize_with = "de_flag")]
    pub counters: bool,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub updatefreq: String,
    /// Newer firmware returns content as an option map, older as text.
    #[serde(default)]
    pub content: AliasContent,
    #[serde(default)]
    pub categories: SelectField,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub description: String,
}

/// `content` as returned by `getItem`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AliasContent {
    Text(String),
    Options(SelectField),
}

impl Default for AliasContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl AliasContent {
    fn into_entries(self) -> Vec<String> {
        match self {
            Self::Text(text) => split_lines(&text),
            Self::Options(field) => field.multi(),
        }
    }
}

impl ModelItem for Alias {
    const KIND: &'static str = "alias";
    const BASE: &'static str = "firewall/alias";
    const WRAPPER: &'static str = "alias";
    const COMMANDS: Commands = Commands::ITEM;
    const APPLY: Option<&'static str> = Some("reconfigure");
    const LOOKUP: Option<&'static str> = Some("getAliasUUID");

    type Request = AliasRequest;
    type Response = AliasResponse;

    fn to_request(&self) -> AliasRequest {
        AliasRequest {
            enabled: bool_to_flag(self.enabled),
            name: self.name.clone(),
            alias_type: self.alias_type.to_string(),
            proto: join_csv(&self.protocols),
            interface: self.interface.clone().unwrap_or_default(),
            counters: bool_to_flag(self.counters),
            updatefreq: self.update_freq.map(|f| f.to_string()).unwrap_or_default(),
            content: join_lines(&self.content),
            categories: join_csv(&self.categories),
            description: self.description.clone(),
        }
    }

    fn from_response(r: AliasResponse) -> Result<Self, Error> {
        let update_freq = parse_opt_num(&r.updatefreq).map_err(|reason| {
            Error::InvalidValue {
                field: "alias.updatefreq".into(),
                reason,
            }
        })?;

        Ok(Self {
            enabled: r.enabled,
            name: r.name,
            alias_type: r.alias_type.single_as("alias.type")?.unwrap_or_default(),
            protocols: r.proto.multi(),
            interface: r.interface.single().map(str::to_owned),
            counters: r.counters,
            update_freq,
            content: r.content.into_entries(),
            categories: r.categories.multi(),
            description: r.description,
        })
    }

    fn lookup_key(&self) -> Option<&str> {
        Some(&self.name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn request_joins_lists() {
        let mut alias = Alias::new("web_servers", AliasType::Host);
        alias.content = vec!["10.0.0.1".into(), "10.0.0.2".into()];
        alias.categories = vec!["c1".into(), "c2".into()];

        let body = serde_json::to_value(alias.to_request()).unwrap();
        assert_eq!(body["type"], "host");
        assert_eq!(body["enabled"], "1");
        assert_eq!(body["content"], "10.0.0.1\n10.0.0.2");
        assert_eq!(body["categories"], "c1,c2");
        assert_eq!(body["updatefreq"], "");
    }

    #[test]
    fn response_decodes_option_maps() {
        let raw = json!({
            "enabled": "1",
            "name": "geo",
            "type": {
                "host": {"value": "Host(s)", "selected": 0},
                "geoip": {"value": "GeoIP", "selected": 1}
            },
            "proto": {
                "IPv6": {"value": "IPv6", "selected": 1},
                "IPv4": {"value": "IPv4", "selected": 1}
            },
            "interface": {"": {"value": "None", "selected": 1}},
            "counters": "0",
            "updatefreq": "0.5",
            "content": {
                "NL": {"value": "Netherlands", "selected": 1},
                "DE": {"value": "Germany", "selected": 1}
            },
            "categories": [],
            "description": "countries"
        });
        let response: AliasResponse = serde_json::from_value(raw).unwrap();
        let alias = Alias::from_response(response).unwrap();

        assert_eq!(alias.alias_type, AliasType::GeoIp);
        assert_eq!(alias.protocols, ["IPv4", "IPv6"]);
        assert_eq!(alias.interface, None);
        assert_eq!(alias.update_freq, Some(0.5));
        assert_eq!(alias.content, ["DE", "NL"]);
        assert!(alias.categories.is_empty());
    }

    #[test]
    fn text_content_is_split_on_newlines() {
        let raw = json!({"name": "ports", "type": "port", "content": "80\n443\n"});
        let response: AliasResponse = serde_json::from_value(raw).unwrap();
        let alias = Alias::from_response(response).unwrap();
        assert_eq!(alias.alias_type, AliasType::Port);
        assert_eq!(alias.content, ["80", "443"]);
    }

    #[test]
    fn alias_type_names_match_wire_keys() {
        assert_eq!(AliasType::UrlTable.to_string(), "urltable");
        assert_eq!("dynipv6host".parse::<AliasType>().unwrap(), AliasType::DynIpv6Host);
    }
}
