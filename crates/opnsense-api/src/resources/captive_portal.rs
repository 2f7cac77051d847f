// Captive-portal templates (`captiveportal/service`).
//
// Templates are zip archives stored outside the regular model controllers:
// `saveTemplate` answers with the template name instead of a uuid, and
// `getTemplate` streams the raw archive addressed by its file id.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::Client;
use crate::convert::de_lenient_string;
use crate::envelope::{ApplyResult, DeleteResult, Validations, check_apply, check_delete};
use crate::error::Error;

use super::{command_path, is_addressable};

const BASE: &str = "captiveportal/service";
const KIND: &str = "captive portal template";

/// A portal template and its archive, base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub content: String,
}

/// One row of `searchTemplates`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub uuid: String,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub fileid: String,
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TemplateSearch {
    #[serde(default)]
    rows: Vec<TemplateSummary>,
}

impl Client {
    /// Upload a template, creating it or replacing the one with `uuid`.
    /// Returns the uuid OPNsense assigned.
    pub async fn save_template(
        &self,
        template: &Template,
        uuid: Option<&str>,
    ) -> Result<String, Error> {
        if template.name.trim().is_empty() {
            return Err(Error::InvalidValue {
                field: "template.name".into(),
                reason: "must not be empty".into(),
            });
        }
        STANDARD
            .decode(template.content.trim())
            .map_err(|e| Error::InvalidValue {
                field: "template.content".into(),
                reason: format!("not valid base64: {e}"),
            })?;

        let mut body = json!({
            "name": template.name,
            "content": template.content.trim(),
        });
        if let Some(uuid) = uuid.filter(|u| !u.is_empty()) {
            body["uuid"] = Value::String(uuid.to_owned());
        }

        let value: Value = self
            .post_json(&format!("{BASE}/saveTemplate"), &body)
            .await?;
        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return Err(Error::Validation(
                [(String::new(), message.to_owned())].into_iter().collect::<Validations>(),
            ));
        }

        debug!(name = %template.name, "template saved, resolving uuid");
        self.search_templates(None)
            .await?
            .into_iter()
            .find(|row| row.name == template.name)
            .map(|row| row.uuid)
            .ok_or_else(|| Error::UnexpectedResult {
                result: value.to_string(),
            })
    }

    /// List uploaded templates.
    pub async fn search_templates(
        &self,
        phrase: Option<&str>,
    ) -> Result<Vec<TemplateSummary>, Error> {
        let body = json!({
            "current": 1,
            "rowCount": -1,
            "searchPhrase": phrase.unwrap_or_default(),
        });
        let search: TemplateSearch = self
            .post_json(&format!("{BASE}/searchTemplates"), &body)
            .await?;
        Ok(search.rows)
    }

    /// Fetch a template's metadata and archive.
    pub async fn get_template(&self, uuid: &str) -> Result<(TemplateSummary, Template), Error> {
        let not_found = || Error::NotFound {
            kind: KIND,
            id: uuid.to_owned(),
        };
        if !is_addressable(uuid) {
            return Err(not_found());
        }

        let summary = self
            .search_templates(None)
            .await?
            .into_iter()
            .find(|row| row.uuid == uuid)
            .ok_or_else(not_found)?;
        // A bare `getTemplate` answers with the built-in default archive.
        if !is_addressable(&summary.fileid) {
            return Err(not_found());
        }

        let path = command_path(BASE, "getTemplate", Some(&summary.fileid));
        let resp = self.request(Method::GET, &path, None).await?;
        if resp.status == StatusCode::INTERNAL_SERVER_ERROR {
            return Err(not_found());
        }
        let resp = resp.ensure_ok()?;

        let template = Template {
            name: summary.name.clone(),
            content: STANDARD.encode(&resp.body),
        };
        Ok((summary, template))
    }

    /// Delete a template. Deleting a missing template succeeds.
    pub async fn delete_template(&self, uuid: &str) -> Result<(), Error> {
        if !is_addressable(uuid) {
            return Err(Error::NotFound {
                kind: KIND,
                id: uuid.to_owned(),
            });
        }
        let outcome: DeleteResult = self
            .post_empty(&command_path(BASE, "delTemplate", Some(uuid)))
            .await?;
        check_delete(&outcome)
    }

    /// Reload the captive portal so template changes go live.
    pub async fn apply_templates(&self) -> Result<(), Error> {
        let outcome: ApplyResult = self.post_empty(&format!("{BASE}/reconfigure")).await?;
        check_apply(&outcome)
    }
}
