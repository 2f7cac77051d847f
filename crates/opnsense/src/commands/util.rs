//! Shared helpers for command handlers.

use std::io::{self, IsTerminal};
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` is required.
pub fn confirm(action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(format!("Really {action}?"))
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(io::Error::other(e)))
}

/// Read an object from a JSON or YAML file for `--from-file` flags.
///
/// `-` reads stdin. Files ending in `.json` are parsed as JSON, anything
/// else as YAML.
pub fn read_payload<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = if path == Path::new("-") {
        io::read_to_string(io::stdin())?
    } else {
        std::fs::read_to_string(path)?
    };

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&contents)?)
    } else {
        Ok(serde_yaml::from_str(&contents)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use opnsense_core::{Category, FilterAction, FilterRule};

    use super::*;

    #[test]
    fn yes_flag_skips_the_prompt() {
        assert!(confirm("delete alias x", true).unwrap());
    }

    #[test]
    fn reads_json_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"name": "web", "color": "00ff00"}}"#).unwrap();

        let category: Category = read_payload(file.path()).unwrap();
        assert_eq!(category.name, "web");
        assert!(!category.auto);
    }

    #[test]
    fn reads_yaml_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "action: block\ninterfaces: [lan]\ndescription: drop lan").unwrap();

        let rule: FilterRule = read_payload(file.path()).unwrap();
        assert_eq!(rule.action, FilterAction::Block);
        assert_eq!(rule.interfaces, ["lan"]);
        assert_eq!(rule.protocol, "any");
        assert!(rule.enabled);
    }

    #[test]
    fn malformed_payload_is_reported() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{not json").unwrap();

        let err = read_payload::<Category>(file.path()).unwrap_err();
        assert!(matches!(err, CliError::Json(_)), "{err:?}");
    }
}
