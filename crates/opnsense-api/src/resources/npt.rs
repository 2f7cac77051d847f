// NPTv6 prefix translation rules (`firewall/npt`).

use serde::{Deserialize, Serialize};

use super::filter::yes;
use super::{Commands, ModelItem};
use crate::convert::{bool_to_flag, de_flag, de_lenient_string, de_opt_num, join_csv, opt_num_to_string};
use crate::error::Error;
use crate::select::SelectField;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NptRule {
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default)]
    pub log: bool,
    #[serde(default)]
    pub sequence: Option<u32>,
    pub interface: String,
    /// Internal IPv6 prefix.
    pub source_net: String,
    /// External IPv6 prefix; empty when tracking an interface.
    #[serde(default)]
    pub destination_net: String,
    /// Interface whose delegated prefix is tracked.
    #[serde(default)]
    pub track_interface: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NptRequest {
    pub enabled: String,
    pub log: String,
    pub sequence: String,
    pub interface: String,
    pub source_net: String,
    pub destination_net: String,
    pub trackif: String,
    pub categories: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NptResponse {
    #[serde(default, deserialize_with = "de_flag")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub log: bool,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub sequence: Option<u32>,
    #[serde(default)]
    pub interface: SelectField,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub source_net: String,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub destination_net: String,
    #[serde(default)]
    pub trackif: SelectField,
    #[serde(default)]
    pub categories: SelectField,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub description: String,
}

impl ModelItem for NptRule {
    const KIND: &'static str = "NPTv6 rule";
    const BASE: &'static str = "firewall/npt";
    const WRAPPER: &'static str = "rule";
    const COMMANDS: Commands = Commands::RULE;
    const APPLY: Option<&'static str> = Some("apply");

    type Request = NptRequest;
    type Response = NptResponse;

    fn to_request(&self) -> NptRequest {
        NptRequest {
            enabled: bool_to_flag(self.enabled),
            log: bool_to_flag(self.log),
            sequence: opt_num_to_string(self.sequence),
            interface: self.interface.clone(),
            source_net: self.source_net.clone(),
            destination_net: self.destination_net.clone(),
            trackif: self.track_interface.clone().unwrap_or_default(),
            categories: join_csv(&self.categories),
            description: self.description.clone(),
        }
    }

    fn from_response(r: NptResponse) -> Result<Self, Error> {
        Ok(Self {
            enabled: r.enabled,
            log: r.log,
            sequence: r.sequence,
            interface: r.interface.single().unwrap_or_default().to_owned(),
            source_net: r.source_net,
            destination_net: r.destination_net,
            track_interface: r.trackif.single().map(str::to_owned),
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
    fn tracked_prefix_decodes() {
        let raw = json!({
            "enabled": "1",
            "interface": {"wan": {"value": "WAN", "selected": 1}},
            "source_net": "fd00:1::/64",
            "destination_net": "",
            "trackif": {"": {"value": "none", "selected": 0}, "lan": {"value": "LAN", "selected": 1}},
            "categories": []
        });
        let rule = NptRule::from_response(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(rule.interface, "wan");
        assert_eq!(rule.track_interface.as_deref(), Some("lan"));
        assert!(rule.destination_net.is_empty());
        assert_eq!(rule.to_request().trackif, "lan");
    }
}
