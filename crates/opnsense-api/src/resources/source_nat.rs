// Source NAT (outbound) rules (`firewall/source_nat`).

use serde::{Deserialize, Serialize};

use super::filter::{IpProtocol, any_protocol, endpoint, yes};
use super::{Commands, ModelItem, RuleEndpoint};
use crate::convert::{bool_to_flag, de_flag, de_lenient_string, de_opt_num, join_csv, opt_num_to_string};
use crate::error::Error;
use crate::select::SelectField;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceNatRule {
    #[serde(default = "yes")]
    pub enabled: bool,
    /// Exclude matching traffic from translation.
    #[serde(default)]
    pub no_nat: bool,
    #[serde(default)]
    pub sequence: Option<u32>,
    pub interface: String,
    #[serde(default)]
    pub ip_protocol: IpProtocol,
    #[serde(default = "any_protocol")]
    pub protocol: String,
    #[serde(default = "RuleEndpoint::any")]
    pub source: RuleEndpoint,
    #[serde(default = "RuleEndpoint::any")]
    pub destination: RuleEndpoint,
    /// Translation address (or `wanip`-style keyword).
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub target_port: String,
    #[serde(default)]
    pub log: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl Default for SourceNatRule {
    fn default() -> Self {
        Self {
            enabled: true,
            no_nat: false,
            sequence: None,
            interface: "wan".to_owned(),
            ip_protocol: IpProtocol::Inet,
            protocol: any_protocol(),
            source: RuleEndpoint::any(),
            destination: RuleEndpoint::any(),
            target: String::new(),
            target_port: String::new(),
            log: false,
            categories: Vec::new(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceNatRequest {
    pub enabled: String,
    pub nonat: String,
    pub sequence: String,
    pub interface: String,
    pub ipprotocol: String,
    pub protocol: String,
    pub source_net: String,
    pub source_not: String,
    pub source_port: String,
    pub destination_net: String,
    pub destination_not: String,
    pub destination_port: String,
    pub target: String,
    pub target_port: String,
    pub log: String,
    pub categories: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceNatResponse {
    #[serde(default, deserialize_with = "de_flag")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "de_flag")]
    pub nonat: bool,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub sequence: Option<u32>,
    #[serde(default)]
    pub interface: SelectField,
    #[serde(default)]
    pub ipprotocol: SelectField,
    #[serde(default)]
    pub protocol: SelectField,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub source_net: String,
    #[serde(default, deserialize_with = "de_flag")]
    pub source_not: bool,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub source_port: String,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub destination_net: String,
    #[serde(default, deserialize_with = "de_flag")]
    pub destination_not: bool,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub destination_port: String,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub target: String,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub target_port: String,
    #[serde(default, deserialize_with = "de_flag")]
    pub log: bool,
    #[serde(default)]
    pub categories: SelectField,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub description: String,
}

impl ModelItem for SourceNatRule {
    const KIND: &'static str = "source NAT rule";
    const BASE: &'static str = "firewall/source_nat";
    const WRAPPER: &'static str = "rule";
    const COMMANDS: Commands = Commands::RULE;
    const APPLY: Option<&'static str> = Some("apply");

    type Request = SourceNatRequest;
    type Response = SourceNatResponse;

    fn to_request(&self) -> SourceNatRequest {
        SourceNatRequest {
            enabled: bool_to_flag(self.enabled),
            nonat: bool_to_flag(self.no_nat),
            sequence: opt_num_to_string(self.sequence),
            interface: self.interface.clone(),
            ipprotocol: self.ip_protocol.to_string(),
            protocol: self.protocol.clone(),
            source_net: self.source.net.clone(),
            source_not: bool_to_flag(self.source.invert),
            source_port: self.source.port.clone(),
            destination_net: self.destination.net.clone(),
            destination_not: bool_to_flag(self.destination.invert),
            destination_port: self.destination.port.clone(),
            target: self.target.clone(),
            target_port: self.target_port.clone(),
            log: bool_to_flag(self.log),
            categories: join_csv(&self.categories),
            description: self.description.clone(),
        }
    }

    fn from_response(r: SourceNatResponse) -> Result<Self, Error> {
        Ok(Self {
            enabled: r.enabled,
            no_nat: r.nonat,
            sequence: r.sequence,
            interface: r.interface.single().unwrap_or_default().to_owned(),
            ip_protocol: r.ipprotocol.single_as("rule.ipprotocol")?.unwrap_or_default(),
            protocol: r.protocol.single().unwrap_or("any").to_owned(),
            source: endpoint(r.source_net, r.source_not, r.source_port),
            destination: endpoint(r.destination_net, r.destination_not, r.destination_port),
            target: r.target,
            target_port: r.target_port,
            log: r.log,
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
    fn no_nat_and_target_travel_as_strings() {
        let rule = SourceNatRule {
            no_nat: true,
            sequence: Some(100),
            source: RuleEndpoint {
                net: "lan".into(),
                invert: false,
                port: String::new(),
            },
            target: "203.0.113.10".into(),
            ..SourceNatRule::default()
        };
        let body = serde_json::to_value(rule.to_request()).unwrap();
        assert_eq!(body["nonat"], "1");
        assert_eq!(body["interface"], "wan");
        assert_eq!(body["target"], "203.0.113.10");
        assert_eq!(body["sequence"], "100");
    }

    #[test]
    fn response_uses_single_interface() {
        let raw = json!({
            "enabled": "1",
            "nonat": "0",
            "sequence": "",
            "interface": {"lan": {"value": "LAN", "selected": 0}, "wan": {"value": "WAN", "selected": 1}},
            "ipprotocol": {"inet": {"value": "IPv4", "selected": 1}},
            "protocol": {"any": {"value": "any", "selected": 1}},
            "source_net": "10.0.0.0/24",
            "target": "wanip",
            "target_port": "",
            "categories": []
        });
        let rule = SourceNatRule::from_response(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(rule.interface, "wan");
        assert_eq!(rule.sequence, None);
        assert_eq!(rule.source.net, "10.0.0.0/24");
        assert_eq!(rule.destination, RuleEndpoint::any());
        assert_eq!(rule.target, "wanip");
    }
}
