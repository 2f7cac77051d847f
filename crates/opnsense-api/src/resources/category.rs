// Firewall categories (`firewall/category`). Categories take effect without
// a reconfigure step.

use serde::{Deserialize, Serialize};

use super::{Commands, ModelItem};
use crate::convert::{bool_to_flag, de_flag, de_lenient_string};
use crate::error::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Created automatically by another subsystem.
    #[serde(default)]
    pub auto: bool,
    /// Hex RGB without the leading `#`, or empty.
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRequest {
    pub name: String,
    pub auto: String,
    pub color: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryResponse {
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "de_flag")]
    pub auto: bool,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub color: String,
}

impl ModelItem for Category {
    const KIND: &'static str = "category";
    const BASE: &'static str = "firewall/category";
    const WRAPPER: &'static str = "category";
    const COMMANDS: Commands = Commands::ITEM;
    const APPLY: Option<&'static str> = None;

    type Request = CategoryRequest;
    type Response = CategoryResponse;

    fn to_request(&self) -> CategoryRequest {
        CategoryRequest {
            name: self.name.clone(),
            auto: bool_to_flag(self.auto),
            color: self.color.trim_start_matches('#').to_owned(),
        }
    }

    fn from_response(r: CategoryResponse) -> Result<Self, Error> {
        Ok(Self {
            name: r.name,
            auto: r.auto,
            color: r.color,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn color_hash_is_stripped() {
        let cat = Category {
            name: "web".into(),
            auto: false,
            color: "#ff8800".into(),
        };
        let req = cat.to_request();
        assert_eq!(req.color, "ff8800");
        assert_eq!(req.auto, "0");
    }
}
