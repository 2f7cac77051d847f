//! Captive portal template handlers.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tabled::Tabled;

use opnsense_core::{Controller, Managed, Template, TemplateSummary};

use crate::cli::{GlobalOpts, TemplatesArgs, TemplatesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

const KIND: &str = "captive portal template";
const LIST_COMMAND: &str = "templates list";

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "File ID")]
    fileid: String,
}

impl From<&TemplateSummary> for TemplateRow {
    fn from(t: &TemplateSummary) -> Self {
        Self {
            uuid: t.uuid.clone(),
            name: t.name.clone(),
            fileid: t.fileid.clone(),
        }
    }
}

/// What `get` shows: the archive itself is only written with `--save`.
#[derive(Serialize)]
struct TemplateInfo<'a> {
    id: &'a str,
    name: &'a str,
    size: usize,
}

pub async fn handle(
    controller: &Controller,
    args: TemplatesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TemplatesCommand::List(list) => {
            let templates = controller.list_templates(list.search.as_deref()).await?;
            let out = output::render_list(
                global.output,
                &templates,
                |t| TemplateRow::from(t),
                |t| t.uuid.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TemplatesCommand::Get { id, save } => {
            let found = controller
                .read_template(&id)
                .await?
                .ok_or_else(|| CliError::not_found(KIND, &id, LIST_COMMAND))?;
            let archive = decode(&found)?;

            if let Some(ref path) = save {
                std::fs::write(path, &archive)?;
                output::print_success(
                    &format!("Saved {} bytes to {}", archive.len(), path.display()),
                    global.color,
                    global.quiet,
                );
            }

            let info = TemplateInfo {
                id: &found.id,
                name: &found.item.name,
                size: archive.len(),
            };
            let out = output::render_single(global.output, &info, output::detail, |i| {
                i.id.to_owned()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TemplatesCommand::Create { name, file } => {
            let template = Template {
                name,
                content: STANDARD.encode(std::fs::read(&file)?),
            };
            let outcome = controller.create_template(&template).await?;
            output::print_diagnostics(&outcome.diagnostics, global.color);
            output::print_success(
                &format!("Uploaded template {}", outcome.value.id),
                global.color,
                global.quiet,
            );
            output::print_output(&outcome.value.id, global.quiet);
            Ok(())
        }

        TemplatesCommand::Update { id, name, file } => {
            let template = Template {
                name,
                content: STANDARD.encode(std::fs::read(&file)?),
            };
            let outcome = controller.update_template(&id, &template).await?;
            output::print_diagnostics(&outcome.diagnostics, global.color);
            output::print_success(
                &format!("Updated template {}", outcome.value.id),
                global.color,
                global.quiet,
            );
            Ok(())
        }

        TemplatesCommand::Delete { id } => {
            if !util::confirm(&format!("delete template {id}"), global.yes)? {
                return Ok(());
            }
            let outcome = controller.delete_template(&id).await?;
            output::print_diagnostics(&outcome.diagnostics, global.color);
            output::print_success(&format!("Deleted template {id}"), global.color, global.quiet);
            Ok(())
        }

        TemplatesCommand::Apply => {
            controller.apply_templates().await?;
            output::print_success("Reloaded captive portal", global.color, global.quiet);
            Ok(())
        }
    }
}

fn decode(template: &Managed<Template>) -> Result<Vec<u8>, CliError> {
    STANDARD
        .decode(template.item.content.trim())
        .map_err(|e| CliError::ApiError {
            message: format!("template {} has an invalid archive: {e}", template.id),
        })
}
