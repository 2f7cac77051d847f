// Typed CRUD over OPNsense model controllers.
//
// Every MVC-backed object type follows the same shape: an add/get/set/del
// command quartet under `<module>/<controller>/`, a `search*` listing, a
// request body wrapped in a single model key, and an optional
// apply/reconfigure command. `ModelItem` captures those constants; the
// generic operations below drive any implementor.

pub mod alias;
pub mod captive_portal;
pub mod category;
pub mod filter;
pub mod group;
pub mod npt;
pub mod one_to_one;
pub mod source_nat;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::client::{Client, decode};
use crate::convert::{de_lenient_string, de_opt_num};
use crate::envelope::{ApplyResult, DeleteResult, MutationResult, check_apply, check_delete};
use crate::error::Error;

// ── Command sets ─────────────────────────────────────────────────────

/// Controller action names for one object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commands {
    pub add: &'static str,
    pub get: &'static str,
    pub set: &'static str,
    pub delete: &'static str,
    pub search: &'static str,
}

impl Commands {
    /// `ApiMutableModelControllerBase` naming (aliases, categories, groups).
    pub const ITEM: Self = Self {
        add: "addItem",
        get: "getItem",
        set: "setItem",
        delete: "delItem",
        search: "searchItem",
    };

    /// Rule controllers under `firewall/` (filter, NAT, NPTv6).
    pub const RULE: Self = Self {
        add: "addRule",
        get: "getRule",
        set: "setRule",
        delete: "delRule",
        search: "searchRule",
    };
}

// ── Model trait ──────────────────────────────────────────────────────

/// One OPNsense object type reachable through a model controller.
pub trait ModelItem: Sized {
    /// Human-readable object kind used in errors and diagnostics.
    const KIND: &'static str;
    /// `<module>/<controller>` path relative to `/api/`.
    const BASE: &'static str;
    /// Key the request and response payloads are wrapped in.
    const WRAPPER: &'static str;
    const COMMANDS: Commands;
    /// Command that commits staged changes, if the controller has one.
    const APPLY: Option<&'static str>;
    /// GET command resolving a name to a uuid, if the controller has one.
    const LOOKUP: Option<&'static str> = None;

    type Request: Serialize;
    type Response: DeserializeOwned;

    fn to_request(&self) -> Self::Request;
    fn from_response(response: Self::Response) -> Result<Self, Error>;

    /// Key passed to [`Self::LOOKUP`] when an add returns no uuid.
    fn lookup_key(&self) -> Option<&str> {
        None
    }
}

/// `<base>/<command>[/<id>]`. The id always stays a single path segment:
/// `/`, `?`, `#` and `%` are percent-encoded.
pub(crate) fn command_path(base: &str, command: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{base}/{command}/{}", urlencoding::encode(id)),
        None => format!("{base}/{command}"),
    }
}

/// Whether `id` can address an object. Blank ids and the dot segments
/// (which URL parsing would resolve away) never can.
pub(crate) fn is_addressable(id: &str) -> bool {
    !id.trim().is_empty() && id != "." && id != ".."
}

pub(crate) fn require_id(kind: &'static str, id: &str) -> Result<(), Error> {
    if is_addressable(id) {
        Ok(())
    } else {
        Err(Error::NotFound {
            kind,
            id: id.to_owned(),
        })
    }
}

// ── Shared wire shapes ───────────────────────────────────────────────

/// Source or destination match of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEndpoint {
    /// Address, network, alias name, or `any`.
    #[serde(default = "any")]
    pub net: String,
    /// Match everything except `net`.
    #[serde(default)]
    pub invert: bool,
    /// Port, port range, or port alias; empty for any.
    #[serde(default)]
    pub port: String,
}

fn any() -> String {
    "any".to_owned()
}

impl RuleEndpoint {
    pub fn any() -> Self {
        Self {
            net: any(),
            invert: false,
            port: String::new(),
        }
    }
}

/// One row of a `search*` listing. Column sets differ per controller, so
/// everything but the uuid is kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRow {
    #[serde(default, deserialize_with = "de_lenient_string")]
    pub uuid: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SearchRow {
    /// Column value rendered as text (empty when absent).
    pub fn field(&self, name: &str) -> String {
        match self.fields.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn enabled(&self) -> bool {
        matches!(self.field("enabled").trim(), "1" | "true")
    }
}

/// Envelope of a `search*` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub rows: Vec<SearchRow>,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub row_count: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_num")]
    pub current: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    #[serde(default, deserialize_with = "de_lenient_string")]
    uuid: String,
}

// ── Generic operations ───────────────────────────────────────────────

impl Client {
    /// Create an object and return its uuid.
    ///
    /// When the add response carries no uuid, the object is re-resolved via
    /// the type's lookup command.
    pub async fn add<T: ModelItem>(&self, item: &T) -> Result<String, Error> {
        let path = command_path(T::BASE, T::COMMANDS.add, None);
        let body = wrap(T::WRAPPER, &item.to_request())?;

        let resp = self
            .request(Method::POST, &path, Some(&body))
            .await?
            .ensure_ok()?;
        let outcome: MutationResult = decode(&resp.body)?;
        let result = outcome.result.clone();
        let uuid = outcome.into_uuid()?;
        if !uuid.is_empty() {
            return Ok(uuid);
        }

        if let Some(key) = item.lookup_key() {
            debug!(kind = T::KIND, key, "add returned no uuid, resolving by lookup");
            if let Some(uuid) = self.lookup::<T>(key).await? {
                return Ok(uuid);
            }
        }
        Err(Error::UnexpectedResult { result })
    }

    /// Fetch one object by uuid.
    pub async fn get<T: ModelItem>(&self, id: &str) -> Result<T, Error> {
        require_id(T::KIND, id)?;
        let path = command_path(T::BASE, T::COMMANDS.get, Some(id));
        let resp = self.request(Method::GET, &path, None).await?;

        // Some controllers fail internally on an unknown uuid.
        if resp.status == StatusCode::INTERNAL_SERVER_ERROR {
            return Err(Error::NotFound {
                kind: T::KIND,
                id: id.to_owned(),
            });
        }
        let resp = resp.ensure_ok()?;
        let value: Value = decode(&resp.body)?;

        let inner = unwrap_model(value, T::WRAPPER).ok_or_else(|| Error::NotFound {
            kind: T::KIND,
            id: id.to_owned(),
        })?;
        let response: T::Response =
            serde_json::from_value(inner).map_err(|e| Error::Deserialization {
                message: format!("{} '{id}': {e}", T::KIND),
                body: resp.text(),
            })?;
        T::from_response(response)
    }

    /// Overwrite an existing object.
    pub async fn set<T: ModelItem>(&self, id: &str, item: &T) -> Result<(), Error> {
        require_id(T::KIND, id)?;
        let path = command_path(T::BASE, T::COMMANDS.set, Some(id));
        let body = wrap(T::WRAPPER, &item.to_request())?;
        let outcome: MutationResult = self
            .request(Method::POST, &path, Some(&body))
            .await?
            .ensure_ok()?
            .json()?;
        outcome.into_uuid().map(drop)
    }

    /// Delete an object. Deleting a missing object succeeds.
    pub async fn delete<T: ModelItem>(&self, id: &str) -> Result<(), Error> {
        require_id(T::KIND, id)?;
        let path = command_path(T::BASE, T::COMMANDS.delete, Some(id));
        let outcome: DeleteResult = self.post_empty(&path).await?;
        check_delete(&outcome)
    }

    /// Commit staged changes. Types without an apply command succeed
    /// without I/O.
    pub async fn apply<T: ModelItem>(&self) -> Result<(), Error> {
        let Some(command) = T::APPLY else {
            return Ok(());
        };
        let outcome: ApplyResult = self
            .post_empty(&command_path(T::BASE, command, None))
            .await?;
        check_apply(&outcome)
    }

    /// List objects, optionally filtered by a search phrase.
    pub async fn search<T: ModelItem>(&self, phrase: Option<&str>) -> Result<Vec<SearchRow>, Error> {
        let path = command_path(T::BASE, T::COMMANDS.search, None);
        let body = json!({
            "current": 1,
            "rowCount": -1,
            "searchPhrase": phrase.unwrap_or_default(),
        });
        let result: SearchResult = self.post_json(&path, &body).await?;
        Ok(result.rows)
    }

    /// Resolve a name to a uuid via the type's lookup command.
    ///
    /// Returns `Ok(None)` when nothing matches or the type has no lookup.
    pub async fn lookup<T: ModelItem>(&self, key: &str) -> Result<Option<String>, Error> {
        let Some(command) = T::LOOKUP else {
            return Ok(None);
        };
        if !is_addressable(key) {
            return Ok(None);
        }
        let path = command_path(T::BASE, command, Some(key));
        let value: Value = self.get_json(&path).await?;
        // An unknown name comes back as `[]`.
        if !value.is_object() {
            return Ok(None);
        }
        let found: LookupResult = serde_json::from_value(value)?;
        Ok(Some(found.uuid).filter(|u| !u.is_empty()))
    }
}

fn wrap<R: Serialize>(wrapper: &str, request: &R) -> Result<Value, Error> {
    let mut map = Map::new();
    map.insert(wrapper.to_owned(), serde_json::to_value(request)?);
    Ok(Value::Object(map))
}

/// Extract the wrapped model object. Every "missing object" shape OPNsense
/// produces maps to `None`: a bare JSON array, a missing wrapper key, or a
/// wrapper that is not a non-empty object.
fn unwrap_model(value: Value, wrapper: &str) -> Option<Value> {
    let Value::Object(mut outer) = value else {
        return None;
    };
    match outer.remove(wrapper)? {
        Value::Object(inner) if !inner.is_empty() => Some(Value::Object(inner)),
        _ => None,
    }
}
