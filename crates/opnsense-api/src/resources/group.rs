// Interface groups (`firewall/group`).

use serde::{Deserialize, Serialize};

use super::{Commands, ModelItem};
use crate::convert::{bool_to_flag, de_flag, de_lenient_string, de_opt_num, join_csv, opt_num_to_string};
use crate::error::Error;
use crate::select::SelectField;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceGroup {
    /// Group name; doubles as the interface name in rules.
    pub name: String,
    /// Member interface keys, sorted.
    #[serde(default)]
    pub members: Vec<String>,
    /// Hide the group from the interface menu.
    #[serde(default)]
    pub no_group: bool,
    #[serde(default)]
    pub sequence: Option<u32>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupRequest {
    pub ifname: String,
    pub members: String,
    pub nogroup: String,
    pub sequence: String,
    pub descr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupResponse {
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub ifname: String,
    #[serde(default)]
    pub members: SelectField,
    #[serde(default, deserialize_with = "de_flag")]
    pub nogroup: bool,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub sequence: Option<u32>,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub descr: String,
}

impl ModelItem for InterfaceGroup {
    const KIND: &'static str = "interface group";
    const BASE: &'static str = "firewall/group";
    const WRAPPER: &'static str = "group";
    const COMMANDS: Commands = Commands::ITEM;
    const APPLY: Option<&'static str> = Some("reconfigure");

    type Request = GroupRequest;
    type Response = GroupResponse;

    fn to_request(&self) -> GroupRequest {
        GroupRequest {
            ifname: self.name.clone(),
            members: join_csv(&self.members),
            nogroup: bool_to_flag(self.no_group),
            sequence: opt_num_to_string(self.sequence),
            descr: self.description.clone(),
        }
    }

    fn from_response(r: GroupResponse) -> Result<Self, Error> {
        Ok(Self {
            name: r.ifname,
            members: r.members.multi(),
            no_group: r.nogroup,
            sequence: r.sequence,
            description: r.descr,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn members_are_sorted_on_read() {
        let raw = json!({
            "ifname": "dmz_hosts",
            "members": {
                "opt2": {"value": "DMZ2", "selected": 1},
                "lan": {"value": "LAN", "selected": 0},
                "opt1": {"value": "DMZ1", "selected": 1}
            },
            "nogroup": "1",
            "sequence": "0",
            "descr": ""
        });
        let group = InterfaceGroup::from_response(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(group.members, ["opt1", "opt2"]);
        assert!(group.no_group);
        assert_eq!(group.sequence, Some(0));
        assert_eq!(group.to_request().members, "opt1,opt2");
    }
}
