//! Alias command handlers.
//!
//! Aliases can be built from flags as well as files, and categories may be
//! given by name; they are resolved to uuids before anything is sent.

use opnsense_core::{Alias, AliasType, Controller, Managed};

use crate::cli::{AliasSpec, AliasesArgs, AliasesCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Column, col};

use super::{resource, util};

const LIST_COMMAND: &str = "aliases list";

const COLUMNS: &[Column] = &[
    col("Name", "name"),
    col("Type", "type"),
    col("On", "enabled"),
    col("Content", "content"),
    col("Description", "description"),
];

pub async fn handle(
    controller: &Controller,
    args: AliasesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AliasesCommand::List(list) => {
            let rows = controller.list::<Alias>(list.search.as_deref()).await?;
            let out = output::render_rows(global.output, &rows, COLUMNS)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AliasesCommand::Get { id } => {
            let mut found = controller
                .read::<Alias>(&id)
                .await?
                .ok_or_else(|| CliError::not_found("alias", &id, LIST_COMMAND))?;
            if global.output == OutputFormat::Table {
                show_category_names(controller, &mut found).await?;
            }
            resource::print_managed(&found, global)
        }

        AliasesCommand::Create(spec) => {
            let alias = build_alias(controller, spec).await?;
            let outcome = controller.create(&alias).await?;
            resource::finish(outcome, global, "Created alias")
        }

        AliasesCommand::Update { id, spec } => {
            let alias = build_alias(controller, spec).await?;
            let outcome = controller.update(&id, &alias).await?;
            resource::finish(outcome, global, "Updated alias")
        }

        AliasesCommand::Delete { id } => {
            if !util::confirm(&format!("delete alias {id}"), global.yes)? {
                return Ok(());
            }
            let outcome = controller.delete::<Alias>(&id).await?;
            output::print_diagnostics(&outcome.diagnostics, global.color);
            output::print_success(&format!("Deleted alias {id}"), global.color, global.quiet);
            Ok(())
        }

        AliasesCommand::Apply => {
            controller.apply::<Alias>().await?;
            output::print_success("Reloaded aliases", global.color, global.quiet);
            Ok(())
        }

        AliasesCommand::Lookup { name } => {
            let uuid = controller
                .lookup::<Alias>(&name)
                .await?
                .ok_or_else(|| CliError::not_found("alias", &name, LIST_COMMAND))?;
            output::print_output(&uuid, global.quiet);
            Ok(())
        }
    }
}

/// Turn flags (or a file) into an alias with category uuids.
async fn build_alias(controller: &Controller, spec: AliasSpec) -> Result<Alias, CliError> {
    let mut alias = if let Some(ref path) = spec.from_file {
        util::read_payload::<Alias>(path)?
    } else {
        let alias_type: AliasType =
            spec.alias_type
                .to_ascii_lowercase()
                .parse()
                .map_err(|_| CliError::Validation {
                    field: "type".into(),
                    reason: format!("unknown alias type '{}'", spec.alias_type),
                })?;
        let mut alias = Alias::new(spec.name.unwrap_or_default(), alias_type);
        alias.content = spec.content;
        alias.enabled = !spec.disabled;
        alias
    };

    if !spec.categories.is_empty() {
        alias.categories = spec.categories;
    }
    if let Some(description) = spec.description {
        alias.description = description;
    }
    if !alias.categories.is_empty() {
        alias.categories = controller.resolve_categories(&alias.categories).await?;
    }
    Ok(alias)
}

async fn show_category_names(
    controller: &Controller,
    alias: &mut Managed<Alias>,
) -> Result<(), CliError> {
    if alias.item.categories.is_empty() {
        return Ok(());
    }
    controller.refresh_categories().await?;
    alias.item.categories = controller.category_names(&alias.item.categories);
    Ok(())
}
