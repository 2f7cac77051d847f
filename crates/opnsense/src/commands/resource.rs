//! Generic handlers for objects edited as whole JSON/YAML documents
//! (filter and NAT rules, categories, interface groups).

use serde::Serialize;
use serde::de::DeserializeOwned;

use opnsense_core::{Controller, Managed, ModelItem, Outcome};

use crate::cli::{GlobalOpts, ResourceArgs, ResourceCommand};
use crate::error::CliError;
use crate::output::{self, Column};

use super::util;

/// How a resource is presented: its list columns and the command that
/// lists it (for not-found hints).
pub struct View {
    pub list_command: &'static str,
    pub columns: &'static [Column],
}

pub async fn handle<T>(
    controller: &Controller,
    args: ResourceArgs,
    global: &GlobalOpts,
    view: &View,
) -> Result<(), CliError>
where
    T: ModelItem + Clone + Serialize + DeserializeOwned,
{
    match args.command {
        ResourceCommand::List(list) => {
            let rows = controller.list::<T>(list.search.as_deref()).await?;
            let out = output::render_rows(global.output, &rows, view.columns)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ResourceCommand::Get { id } => {
            let found = controller
                .read::<T>(&id)
                .await?
                .ok_or_else(|| CliError::not_found(T::KIND, &id, view.list_command))?;
            print_managed(&found, global)
        }

        ResourceCommand::Create { from_file } => {
            let item: T = util::read_payload(&from_file)?;
            let outcome = controller.create(&item).await?;
            finish(outcome, global, &format!("Created {}", T::KIND))
        }

        ResourceCommand::Update { id, from_file } => {
            let item: T = util::read_payload(&from_file)?;
            let outcome = controller.update(&id, &item).await?;
            finish(outcome, global, &format!("Updated {}", T::KIND))
        }

        ResourceCommand::Delete { id } => {
            if !util::confirm(&format!("delete {} {id}", T::KIND), global.yes)? {
                return Ok(());
            }
            let outcome = controller.delete::<T>(&id).await?;
            output::print_diagnostics(&outcome.diagnostics, global.color);
            output::print_success(&format!("Deleted {} {id}", T::KIND), global.color, global.quiet);
            Ok(())
        }

        ResourceCommand::Apply => {
            controller.apply::<T>().await?;
            output::print_success(
                &format!("Applied {} configuration", T::KIND),
                global.color,
                global.quiet,
            );
            Ok(())
        }
    }
}

/// Report diagnostics, then print the stored object.
pub fn finish<T: Serialize>(
    outcome: Outcome<Managed<T>>,
    global: &GlobalOpts,
    message: &str,
) -> Result<(), CliError> {
    output::print_diagnostics(&outcome.diagnostics, global.color);
    output::print_success(
        &format!("{message} {}", outcome.value.id),
        global.color,
        global.quiet,
    );
    print_managed(&outcome.value, global)
}

pub fn print_managed<T: Serialize>(managed: &Managed<T>, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(global.output, managed, output::detail, |m| m.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
