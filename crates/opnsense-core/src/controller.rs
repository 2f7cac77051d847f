// ── Controller abstraction ──
//
// Resource lifecycle for one OPNsense firewall. Each mutation follows the
// same sequence: stage the change, apply it, then read the object back so
// the returned state reflects what OPNsense stored. Apply failures are
// downgraded to warnings because the staged change already succeeded.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use opnsense_api::resources::category::Category;
use opnsense_api::{BiMap, Client, Error as ApiError, ModelItem, SearchRow, Template, TemplateSummary};

use crate::config::ControllerConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{CoreError, ErrorContext, Operation};

const TEMPLATE_KIND: &str = "captive portal template";

// ── Results ──────────────────────────────────────────────────────

/// An object together with its OPNsense uuid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Managed<T> {
    pub id: String,
    #[serde(flatten)]
    pub item: T,
}

/// Result of a mutation plus any non-fatal findings.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Outcome<T> {
    fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Calls are issued one at a
/// time and never retried; the only shared state is the category index.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    client: Client,
    /// Category name -> uuid, filled on demand.
    categories: BiMap<String, String>,
}

impl Controller {
    /// Validate the configuration and build the API client. No request is
    /// made until the first operation.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        let client = Client::new(&config.client_config()).map_err(|e| match e {
            ApiError::Configuration { message } => CoreError::Config { message },
            ApiError::Tls(msg) => CoreError::Config {
                message: format!("TLS setup failed: {msg}"),
            },
            other => CoreError::Config {
                message: other.to_string(),
            },
        })?;
        debug!(base_url = %client.base_url(), "controller ready");

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                categories: BiMap::new(),
            }),
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// The underlying API client, for calls not covered here.
    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    fn api_err<'a>(
        &'a self,
        operation: Operation,
        entity_type: &'a str,
    ) -> impl FnOnce(ApiError) -> CoreError + 'a {
        move |err| {
            CoreError::from_api(
                ErrorContext {
                    operation,
                    entity_type,
                    timeout: self.inner.config.timeout,
                },
                err,
            )
        }
    }

    // ── Generic lifecycle ────────────────────────────────────────

    /// Create an object, apply, and return the stored state.
    pub async fn create<T>(&self, item: &T) -> Result<Outcome<Managed<T>>, CoreError>
    where
        T: ModelItem + Clone,
    {
        let id = self
            .inner
            .client
            .add(item)
            .await
            .map_err(self.api_err(Operation::Create, T::KIND))?;
        info!(kind = T::KIND, %id, "created");

        let mut diagnostics = Diagnostics::new();
        let applied = self.inner.client.apply::<T>().await;
        downgrade_apply(T::KIND, Operation::Create, applied, &mut diagnostics);

        let value = self.read_back(id, item, Operation::Create, &mut diagnostics).await;
        Ok(Outcome::new(value, diagnostics))
    }

    /// Fetch an object. A missing object yields `Ok(None)`.
    pub async fn read<T: ModelItem>(&self, id: &str) -> Result<Option<Managed<T>>, CoreError> {
        match self.inner.client.get::<T>(id).await {
            Ok(item) => Ok(Some(Managed {
                id: id.to_owned(),
                item,
            })),
            Err(e) if e.is_not_found() => {
                debug!(kind = T::KIND, id, "object missing");
                Ok(None)
            }
            Err(e) => Err(self.api_err(Operation::Read, T::KIND)(e)),
        }
    }

    /// Overwrite an object, apply, and return the stored state.
    pub async fn update<T>(&self, id: &str, item: &T) -> Result<Outcome<Managed<T>>, CoreError>
    where
        T: ModelItem + Clone,
    {
        self.inner
            .client
            .set(id, item)
            .await
            .map_err(self.api_err(Operation::Update, T::KIND))?;
        info!(kind = T::KIND, id, "updated");

        let mut diagnostics = Diagnostics::new();
        let applied = self.inner.client.apply::<T>().await;
        downgrade_apply(T::KIND, Operation::Update, applied, &mut diagnostics);

        let value = self
            .read_back(id.to_owned(), item, Operation::Update, &mut diagnostics)
            .await;
        Ok(Outcome::new(value, diagnostics))
    }

    /// Delete an object and apply. Deleting a missing object succeeds.
    pub async fn delete<T: ModelItem>(&self, id: &str) -> Result<Outcome<()>, CoreError> {
        self.inner
            .client
            .delete::<T>(id)
            .await
            .map_err(self.api_err(Operation::Delete, T::KIND))?;
        info!(kind = T::KIND, id, "deleted");

        let mut diagnostics = Diagnostics::new();
        let applied = self.inner.client.apply::<T>().await;
        downgrade_apply(T::KIND, Operation::Delete, applied, &mut diagnostics);
        Ok(Outcome::new((), diagnostics))
    }

    /// List objects, optionally filtered by a search phrase.
    pub async fn list<T: ModelItem>(&self, search: Option<&str>) -> Result<Vec<SearchRow>, CoreError> {
        self.inner
            .client
            .search::<T>(search)
            .await
            .map_err(self.api_err(Operation::List, T::KIND))
    }

    /// Apply staged changes explicitly. Unlike the implicit apply after a
    /// mutation, failure here is an error.
    pub async fn apply<T: ModelItem>(&self) -> Result<(), CoreError> {
        self.inner
            .client
            .apply::<T>()
            .await
            .map_err(self.api_err(Operation::Apply, T::KIND))
    }

    /// Resolve a name to a uuid for types with a lookup command.
    pub async fn lookup<T: ModelItem>(&self, key: &str) -> Result<Option<String>, CoreError> {
        self.inner
            .client
            .lookup::<T>(key)
            .await
            .map_err(self.api_err(Operation::Lookup, T::KIND))
    }

    async fn read_back<T>(
        &self,
        id: String,
        submitted: &T,
        operation: Operation,
        diagnostics: &mut Diagnostics,
    ) -> Managed<T>
    where
        T: ModelItem + Clone,
    {
        match self.inner.client.get::<T>(&id).await {
            Ok(item) => Managed { id, item },
            Err(e) => {
                warn!(kind = T::KIND, %id, error = %e, "read-back failed");
                diagnostics.add_warning(
                    format!("Could not read {} back after {operation}", T::KIND),
                    format!("{e}; returning the submitted values"),
                );
                Managed {
                    id,
                    item: submitted.clone(),
                }
            }
        }
    }

    // ── Captive portal templates ─────────────────────────────────

    pub async fn create_template(
        &self,
        template: &Template,
    ) -> Result<Outcome<Managed<Template>>, CoreError> {
        let id = self
            .inner
            .client
            .save_template(template, None)
            .await
            .map_err(self.api_err(Operation::Create, TEMPLATE_KIND))?;
        info!(%id, name = %template.name, "template uploaded");
        self.finish_template(id, template, Operation::Create).await
    }

    pub async fn read_template(&self, id: &str) -> Result<Option<Managed<Template>>, CoreError> {
        match self.inner.client.get_template(id).await {
            Ok((summary, item)) => Ok(Some(Managed {
                id: summary.uuid,
                item,
            })),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(self.api_err(Operation::Read, TEMPLATE_KIND)(e)),
        }
    }

    pub async fn update_template(
        &self,
        id: &str,
        template: &Template,
    ) -> Result<Outcome<Managed<Template>>, CoreError> {
        let id = self
            .inner
            .client
            .save_template(template, Some(id))
            .await
            .map_err(self.api_err(Operation::Update, TEMPLATE_KIND))?;
        self.finish_template(id, template, Operation::Update).await
    }

    pub async fn delete_template(&self, id: &str) -> Result<Outcome<()>, CoreError> {
        self.inner
            .client
            .delete_template(id)
            .await
            .map_err(self.api_err(Operation::Delete, TEMPLATE_KIND))?;

        let mut diagnostics = Diagnostics::new();
        let applied = self.inner.client.apply_templates().await;
        downgrade_apply(TEMPLATE_KIND, Operation::Delete, applied, &mut diagnostics);
        Ok(Outcome::new((), diagnostics))
    }

    pub async fn list_templates(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<TemplateSummary>, CoreError> {
        self.inner
            .client
            .search_templates(search)
            .await
            .map_err(self.api_err(Operation::List, TEMPLATE_KIND))
    }

    pub async fn apply_templates(&self) -> Result<(), CoreError> {
        self.inner
            .client
            .apply_templates()
            .await
            .map_err(self.api_err(Operation::Apply, TEMPLATE_KIND))
    }

    async fn finish_template(
        &self,
        id: String,
        submitted: &Template,
        operation: Operation,
    ) -> Result<Outcome<Managed<Template>>, CoreError> {
        let mut diagnostics = Diagnostics::new();
        let applied = self.inner.client.apply_templates().await;
        downgrade_apply(TEMPLATE_KIND, operation, applied, &mut diagnostics);

        let item = match self.inner.client.get_template(&id).await {
            Ok((_, item)) => item,
            Err(e) => {
                warn!(%id, error = %e, "template read-back failed");
                diagnostics.add_warning(
                    format!("Could not read {TEMPLATE_KIND} back after {operation}"),
                    format!("{e}; returning the submitted values"),
                );
                submitted.clone()
            }
        };
        Ok(Outcome::new(Managed { id, item }, diagnostics))
    }

    // ── Category index ───────────────────────────────────────────

    /// Reload the category name/uuid index. Returns the number of entries.
    pub async fn refresh_categories(&self) -> Result<usize, CoreError> {
        let rows = self.list::<Category>(None).await?;
        self.inner.categories.replace_all(
            rows.into_iter()
                .filter(|row| !row.uuid.is_empty())
                .map(|row| (row.field("name"), row.uuid)),
        );
        Ok(self.inner.categories.len())
    }

    /// Map category names (or uuids) to sorted uuids, refreshing the index
    /// once if an entry is unknown.
    pub async fn resolve_categories(&self, entries: &[String]) -> Result<Vec<String>, CoreError> {
        let mut refreshed = false;
        let mut uuids = Vec::with_capacity(entries.len());

        for entry in entries {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            loop {
                if self.inner.categories.get_by_right(entry).is_some() {
                    uuids.push(entry.to_owned());
                    break;
                }
                if let Some(uuid) = self.inner.categories.get_by_left(entry) {
                    uuids.push(uuid);
                    break;
                }
                if refreshed {
                    return Err(CoreError::NotFound {
                        entity_type: "category".into(),
                        identifier: entry.to_owned(),
                    });
                }
                self.refresh_categories().await?;
                refreshed = true;
            }
        }

        uuids.sort();
        uuids.dedup();
        Ok(uuids)
    }

    /// Category names for display; unknown uuids are returned unchanged.
    pub fn category_names(&self, uuids: &[String]) -> Vec<String> {
        uuids
            .iter()
            .map(|uuid| {
                self.inner
                    .categories
                    .get_by_right(uuid.as_str())
                    .unwrap_or_else(|| uuid.clone())
            })
            .collect()
    }
}

/// Record an apply failure as a warning instead of failing the operation.
fn downgrade_apply(
    kind: &str,
    operation: Operation,
    applied: Result<(), ApiError>,
    diagnostics: &mut Diagnostics,
) {
    if let Err(e) = applied {
        warn!(kind, %operation, error = %e, "change saved but not applied");
        diagnostics.add_warning(
            format!("Failed to apply {kind} configuration after {operation}"),
            format!(
                "The {kind} was changed but the running configuration was not reloaded: {e}"
            ),
        );
    }
}
