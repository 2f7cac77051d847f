//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables are built
//! with `tabled`, structured formats use serde, plain emits one uuid per
//! line. Diagnostics always go to stderr.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

use opnsense_core::{Diagnostics, SearchRow, Severity};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color ────────────────────────────────────────────────────────────

/// Whether stderr decorations should be colored.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// A table column: header plus the search-row field it shows.
pub struct Column {
    pub header: &'static str,
    pub field: &'static str,
}

pub const fn col(header: &'static str, field: &'static str) -> Column {
    Column { header, field }
}

/// Render search rows: a table of `columns`, the raw rows for structured
/// formats, or one uuid per line.
pub fn render_rows(
    format: OutputFormat,
    rows: &[SearchRow],
    columns: &[Column],
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(
                std::iter::once("UUID".to_owned())
                    .chain(columns.iter().map(|c| c.header.to_owned()))
                    .collect::<Vec<_>>(),
            );
            for row in rows {
                builder.push_record(
                    std::iter::once(row.uuid.clone())
                        .chain(columns.iter().map(|c| row.field(c.field)))
                        .collect::<Vec<_>>(),
                );
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            Ok(table.to_string())
        }
        OutputFormat::Plain => Ok(rows
            .iter()
            .map(|r| r.uuid.as_str())
            .collect::<Vec<_>>()
            .join("\n")),
        structured => render_structured(structured, rows),
    }
}

/// Render a list of typed rows. Table uses the `Tabled` derive of `R`.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Plain => Ok(data.iter().map(id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render a single item. Table format uses `detail_fn`, plain uses `id_fn`.
pub fn render_single<T: Serialize>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> Result<String, CliError>,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Plain => Ok(id_fn(data)),
        structured => render_structured(structured, data),
    }
}

fn render_structured<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        _ => serde_json::to_string_pretty(data)?,
    })
}

/// `Key:  value` lines for any serializable object. Nested objects are
/// flattened with dotted keys, lists are comma-joined.
pub fn detail<T: Serialize>(data: &T) -> Result<String, CliError> {
    let mut pairs = Vec::new();
    flatten("", &serde_json::to_value(data)?, &mut pairs);

    let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 1;
    Ok(pairs
        .into_iter()
        .map(|(key, value)| format!("{:<width$} {value}", format!("{key}:")))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&key, inner, out);
            }
        }
        leaf => out.push((prefix.to_owned(), scalar(leaf))),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".into(),
        Value::String(s) if s.is_empty() => "-".into(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.is_empty() => "-".into(),
        Value::Array(items) => items.iter().map(scalar).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Print a confirmation line to stderr.
pub fn print_success(message: &str, global_color: ColorMode, quiet: bool) {
    if quiet {
        return;
    }
    if should_color(global_color) {
        eprintln!("{} {message}", "✓".green());
    } else {
        eprintln!("✓ {message}");
    }
}

/// Print non-fatal diagnostics to stderr. Never affects the exit code.
pub fn print_diagnostics(diagnostics: &Diagnostics, color: ColorMode) {
    let color = should_color(color);
    for diag in diagnostics.iter() {
        let label = diag.severity.to_string();
        let label = match (color, diag.severity) {
            (false, _) => label,
            (true, Severity::Warning) => label.yellow().bold().to_string(),
            (true, Severity::Error) => label.red().bold().to_string(),
        };
        if diag.detail.is_empty() {
            eprintln!("{label}: {}", diag.summary);
        } else {
            eprintln!("{label}: {}\n  {}", diag.summary, diag.detail);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(uuid: &str, name: &str) -> SearchRow {
        serde_json::from_value(json!({"uuid": uuid, "name": name, "enabled": "1"})).unwrap()
    }

    #[test]
    fn table_has_uuid_and_requested_columns() {
        let rows = [row("u-1", "web"), row("u-2", "mail")];
        let out = render_rows(
            OutputFormat::Table,
            &rows,
            &[col("Name", "name"), col("Enabled", "enabled")],
        )
        .unwrap();
        assert!(out.contains("UUID"));
        assert!(out.contains("Name"));
        assert!(out.contains("u-2"));
        assert!(out.contains("mail"));
    }

    #[test]
    fn plain_prints_one_uuid_per_line() {
        let rows = [row("u-1", "web"), row("u-2", "mail")];
        let out = render_rows(OutputFormat::Plain, &rows, &[]).unwrap();
        assert_eq!(out, "u-1\nu-2");
    }

    #[test]
    fn detail_flattens_nested_objects() {
        let value = json!({
            "id": "r-1",
            "source": {"net": "lan", "port": ""},
            "interfaces": ["lan", "opt1"]
        });
        let out = detail(&value).unwrap();
        assert!(out.contains("source.net:"), "{out}");
        assert!(out.contains("lan, opt1"), "{out}");
        assert!(out.lines().any(|l| l.starts_with("source.port:") && l.ends_with('-')));
    }
}
