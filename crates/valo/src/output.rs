//! Output formatting: table, JSON, YAML, plain.
//!
//! Table uses `tabled`; structured formats serialize the same
//! `{status: ...}` envelope a route layer would return; plain emits one
//! identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use valo_core::{ApiResponse, CoreError, LightState};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// "on" / "off", green or dimmed when color is enabled.
pub fn power_label(on: bool, color: bool) -> String {
    match (on, color) {
        (true, true) => "on".green().to_string(),
        (false, true) => "off".dimmed().to_string(),
        (true, false) => "on".into(),
        (false, false) => "off".into(),
    }
}

/// `#rrggbb` swatch text for a light state.
pub fn color_label(state: &LightState) -> String {
    format!(
        "#{}",
        valo_core::codec::color_hex(state.red, state.green, state.blue)
    )
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact` / `yaml`: serializes `ApiResponse::Ok(payload)`
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, P, R>(
    format: &OutputFormat,
    data: &[T],
    payload: &P,
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    P: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Plain => Ok(data.iter().map(id_fn).collect::<Vec<_>>().join("\n")),
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            render_structured(format, &ApiResponse::ok(payload))
        }
    }
}

/// Render a single item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views don't use
/// the `Tabled` derive.
pub fn render_single<T, P>(
    format: &OutputFormat,
    data: &T,
    payload: &P,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    P: Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Plain => Ok(id_fn(data)),
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            render_structured(format, &ApiResponse::ok(payload))
        }
    }
}

/// Serialize any value in a structured format. Table and plain fall back
/// to pretty JSON.
pub fn render_structured<T: Serialize + ?Sized>(
    format: &OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Json | OutputFormat::Table | OutputFormat::Plain => {
            serde_json::to_string_pretty(data)?
        }
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Pass a core result through; on failure, emit the error envelope when
/// a structured format was requested, then convert for exit handling.
pub fn checked<T>(global: &GlobalOpts, result: Result<T, CoreError>) -> Result<T, CliError> {
    result.map_err(|err| {
        if global.output.is_structured() {
            let body = ApiResponse::<()>::from_error(&err);
            if let Ok(out) = render_structured(&global.output, &body) {
                print_output(&out, global.quiet);
            }
        }
        CliError::from(err)
    })
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}
