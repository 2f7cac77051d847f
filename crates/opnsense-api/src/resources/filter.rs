// Automation filter rules (`firewall/filter`).

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::{Commands, ModelItem, RuleEndpoint};
use crate::convert::{bool_to_flag, de_flag, de_lenient_string, de_opt_num, join_csv, opt_num_to_string};
use crate::error::Error;
use crate::select::SelectField;

/// Protocol names offered by the rule editors.
pub const PROTOCOLS: &[&str] = &[
    "any", "ICMP", "IGMP", "GGP", "IPENCAP", "ST2", "TCP", "CBT", "EGP", "IGP", "BBN-RCC",
    "NVP", "PUP", "ARGUS", "EMCON", "XNET", "CHAOS", "UDP", "MUX", "DCN", "HMP", "PRM",
    "XNS-IDP", "TRUNK-1", "TRUNK-2", "LEAF-1", "LEAF-2", "RDP", "IRTP", "ISO-TP4", "NETBLT",
    "MFE-NSP", "MERIT-INP", "DCCP", "3PC", "IDPR", "XTP", "DDP", "IDPR-CMTP", "TP++", "IL",
    "IPV6", "SDRP", "IDRP", "RSVP", "GRE", "DSR", "BNA", "ESP", "AH", "I-NLSP", "SWIPE",
    "NARP", "MOBILE", "TLSP", "SKIP", "IPV6-ICMP", "CFTP", "SAT-EXPAK", "KRYPTOLAN", "RVD",
    "IPPC", "SAT-MON", "VISA", "IPCV", "CPNX", "CPHB", "WSN", "PVP", "BR-SAT-MON",
    "SUN-ND", "WB-MON", "WB-EXPAK", "ISO-IP", "VMTP", "SECURE-VMTP", "VINES", "TTP",
    "NSFNET-IGP", "DGP", "TCF", "EIGRP", "OSPF", "SPRITE-RPC", "LARP", "MTP", "AX.25",
    "IPIP", "MICP", "SCC-SP", "ETHERIP", "ENCAP", "GMTP", "IFMP", "PNNI", "PIM", "ARIS",
    "SCPS", "QNX", "A/N", "IPCOMP", "SNP", "COMPAQ-PEER", "IPX-IN-IP", "CARP", "PGM",
    "L2TP", "DDX", "IATP", "STP", "SRP", "UTI", "SMP", "SM", "PTP", "ISIS", "CRTP", "CRUDP",
    "SPS", "PIPE", "SCTP", "FC", "RSVP-E2E-IGNORE", "UDPLITE", "MPLS-IN-IP", "MANET",
    "HIP", "SHIM6", "WESP", "ROHC", "PFSYNC", "DIVERT",
];

/// `true` if `name` is one of [`PROTOCOLS`] (case-insensitive).
pub fn is_known_protocol(name: &str) -> bool {
    PROTOCOLS.iter().any(|p| p.eq_ignore_ascii_case(name))
}

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
pub enum FilterAction {
    #[default]
    Pass,
    Block,
    Reject,
}

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
pub enum Direction {
    #[default]
    In,
    Out,
}

/// Address family a rule applies to.
///
/// Wire keys are `inet`/`inet6`/`inet46`; the UI labels (`IPv4`, `IPv6`,
/// `IPv4+IPv6`) are accepted when parsing as well.
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
pub enum IpProtocol {
    #[default]
    #[strum(to_string = "inet", serialize = "IPv4")]
    Inet,
    #[strum(to_string = "inet6", serialize = "IPv6")]
    Inet6,
    #[strum(to_string = "inet46", serialize = "IPv4+IPv6")]
    Inet46,
}

impl IpProtocol {
    /// Label shown in the OPNsense UI.
    pub fn label(self) -> &'static str {
        match self {
            Self::Inet => "IPv4",
            Self::Inet6 => "IPv6",
            Self::Inet46 => "IPv4+IPv6",
        }
    }
}

/// A firewall rule managed through the automation (MVC) filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default)]
    pub sequence: Option<u32>,
    #[serde(default)]
    pub action: FilterAction,
    #[serde(default = "yes")]
    pub quick: bool,
    /// Interface keys (`lan`, `opt1`, ...), sorted.
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub ip_protocol: IpProtocol,
    #[serde(default = "any_protocol")]
    pub protocol: String,
    #[serde(default = "RuleEndpoint::any")]
    pub source: RuleEndpoint,
    #[serde(default = "RuleEndpoint::any")]
    pub destination: RuleEndpoint,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub log: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: String,
}

pub(crate) fn yes() -> bool {
    true
}

pub(crate) fn any_protocol() -> String {
    "any".to_owned()
}

impl Default for FilterRule {
    fn default() -> Self {
        Self {
            enabled: true,
            sequence: None,
            action: FilterAction::Pass,
            quick: true,
            interfaces: Vec::new(),
            direction: Direction::In,
            ip_protocol: IpProtocol::Inet,
            protocol: any_protocol(),
            source: RuleEndpoint::any(),
            destination: RuleEndpoint::any(),
            gateway: None,
            log: false,
            categories: Vec::new(),
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterRuleRequest {
    pub enabled: String,
    pub sequence: String,
    pub action: String,
    pub quick: String,
    pub interface: String,
    pub direction: String,
    pub ipprotocol: String,
    pub protocol: String,
    pub source_net: String,
    pub source_not: String,
    pub source_port: String,
    pub destination_net: String,
    pub destination_not: String,
    pub destination_port: String,
    pub gateway: String,
    pub log: String,
    pub categories: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterRuleResponse {
    #[serde(default, deserialize_with = "de_flag")]
    pub enabled: bool,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub sequence: Option<u32>,
    #[serde(default)]
    pub action: SelectField,
    #[serde(default, deserialize_with = "de_flag")]
    pub quick: bool,
    #[serde(default)]
    pub interface: SelectField,
    #[serde(default)]
    pub direction: SelectField,
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
    #[serde(default)]
    pub gateway: SelectField,
    #[serde(default, deserialize_with = "de_flag")]
    pub log: bool,
    #[serde(default)]
    pub categories: SelectField,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub description: String,
}

/// Wire `*_net` value back to the domain form (`any` when blank).
pub(crate) fn endpoint(net: String, invert: bool, port: String) -> RuleEndpoint {
    RuleEndpoint {
        net: if net.trim().is_empty() { "any".to_owned() } else { net },
        invert,
        port,
    }
}

impl ModelItem for FilterRule {
    const KIND: &'static str = "filter rule";
    const BASE: &'static str = "firewall/filter";
    const WRAPPER: &'static str = "rule";
    const COMMANDS: Commands = Commands::RULE;
    const APPLY: Option<&'static str> = Some("apply");

    type Request = FilterRuleRequest;
    type Response = FilterRuleResponse;

    fn to_request(&self) -> FilterRuleRequest {
        FilterRuleRequest {
            enabled: bool_to_flag(self.enabled),
            sequence: opt_num_to_string(self.sequence),
            action: self.action.to_string(),
            quick: bool_to_flag(self.quick),
            interface: join_csv(&self.interfaces),
            direction: self.direction.to_string(),
            ipprotocol: self.ip_protocol.to_string(),
            protocol: self.protocol.clone(),
            source_net: self.source.net.clone(),
            source_not: bool_to_flag(self.source.invert),
            source_port: self.source.port.clone(),
            destination_net: self.destination.net.clone(),
            destination_not: bool_to_flag(self.destination.invert),
            destination_port: self.destination.port.clone(),
            gateway: self.gateway.clone().unwrap_or_default(),
            log: bool_to_flag(self.log),
            categories: join_csv(&self.categories),
            description: self.description.clone(),
        }
    }

    fn from_response(r: FilterRuleResponse) -> Result<Self, Error> {
        Ok(Self {
            enabled: r.enabled,
            sequence: r.sequence,
            action: r.action.single_as("rule.action")?.unwrap_or_default(),
            quick: r.quick,
            interfaces: r.interface.multi(),
            direction: r.direction.single_as("rule.direction")?.unwrap_or_default(),
            ip_protocol: r.ipprotocol.single_as("rule.ipprotocol")?.unwrap_or_default(),
            protocol: r.protocol.single().unwrap_or("any").to_owned(),
            source: endpoint(r.source_net, r.source_not, r.source_port),
            destination: endpoint(r.destination_net, r.destination_not, r.destination_port),
            gateway: r.gateway.single().map(str::to_owned),
            log: r.log,
            categories: r.categories.multi(),
            description: r.description,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn ip_protocol_accepts_keys_and_labels() {
        assert_eq!("inet6".parse::<IpProtocol>().unwrap(), IpProtocol::Inet6);
        assert_eq!("IPv4+IPv6".parse::<IpProtocol>().unwrap(), IpProtocol::Inet46);
        assert_eq!(IpProtocol::Inet46.to_string(), "inet46");
        assert_eq!(IpProtocol::Inet.label(), "IPv4");
    }

    #[test]
    fn known_protocols() {
        assert!(is_known_protocol("tcp"));
        assert!(is_known_protocol("IPV6-ICMP"));
        assert!(!is_known_protocol("QUIC"));
    }

    #[test]
    fn request_flattens_endpoints() {
        let rule = FilterRule {
            sequence: Some(10),
            action: FilterAction::Block,
            interfaces: vec!["lan".into(), "wan".into()],
            protocol: "TCP".into(),
            destination: RuleEndpoint {
                net: "web_servers".into(),
                invert: true,
                port: "443".into(),
            },
            ..FilterRule::default()
        };
        let body = serde_json::to_value(rule.to_request()).unwrap();
        assert_eq!(body["sequence"], "10");
        assert_eq!(body["action"], "block");
        assert_eq!(body["interface"], "lan,wan");
        assert_eq!(body["ipprotocol"], "inet");
        assert_eq!(body["source_net"], "any");
        assert_eq!(body["destination_not"], "1");
        assert_eq!(body["destination_port"], "443");
    }

    #[test]
    fn response_decodes_selected_options() {
        let raw = json!({
            "enabled": "1",
            "sequence": "5",
            "action": {"pass": {"value": "Pass", "selected": 0}, "reject": {"value": "Reject", "selected": 1}},
            "quick": "0",
            "interface": {"wan": {"value": "WAN", "selected": 1}, "lan": {"value": "LAN", "selected": 1}},
            "direction": {"in": {"value": "In", "selected": 0}, "out": {"value": "Out", "selected": 1}},
            "ipprotocol": {"inet": {"value": "IPv4", "selected": 0}, "inet6": {"value": "IPv6", "selected": 1}},
            "protocol": {"any": {"value": "any", "selected": 0}, "UDP": {"value": "UDP", "selected": 1}},
            "source_net": "",
            "source_not": "0",
            "destination_net": "2001:db8::/64",
            "destination_port": "53",
            "gateway": {"": {"value": "default", "selected": 1}},
            "log": "1",
            "categories": {"c2": {"value": "b", "selected": 1}, "c1": {"value": "a", "selected": 1}},
            "description": "dns"
        });
        let rule = FilterRule::from_response(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(
            rule,
            FilterRule {
                enabled: true,
                sequence: Some(5),
                action: FilterAction::Reject,
                quick: false,
                interfaces: vec!["lan".into(), "wan".into()],
                direction: Direction::Out,
                ip_protocol: IpProtocol::Inet6,
                protocol: "UDP".into(),
                source: RuleEndpoint::any(),
                destination: RuleEndpoint {
                    net: "2001:db8::/64".into(),
                    invert: false,
                    port: "53".into(),
                },
                gateway: None,
                log: true,
                categories: vec!["c1".into(), "c2".into()],
                description: "dns".into(),
            }
        );
    }
}
