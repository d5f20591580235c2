//! Rendering of processed commands

use anidb_udp_core::{Command, DomainOutcome, Payload};
use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output format
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

/// Everything worth showing about one processed command
#[derive(Debug, Serialize)]
pub struct CommandReport<'a> {
    pub command: String,
    pub outcome: Option<DomainOutcome>,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<&'a Payload>,
}

impl<'a> CommandReport<'a> {
    pub fn from_command(command: &'a Command) -> Self {
        Self {
            command: command.key(),
            outcome: command.outcome(),
            code: command.response_code(),
            error: command.error_message(),
            payload: command.payload(),
        }
    }

    /// Check if the server accepted the command
    pub fn is_success(&self) -> bool {
        self.outcome.is_some_and(|o| o.is_success())
    }
}

/// Render a report in the requested format
pub fn render(report: &CommandReport<'_>, format: OutputFormat, color: bool) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => render_text(report, color),
    }
}

fn render_text(report: &CommandReport<'_>, color: bool) -> Result<String> {
    let outcome = report
        .outcome
        .map(|o| o.to_string())
        .unwrap_or_else(|| "NotProcessed".to_string());
    let headline = format!("{outcome} ({})", report.code);
    let headline = match (color, report.is_success()) {
        (false, _) => headline,
        (true, true) => headline.green().bold().to_string(),
        (true, false) => headline.red().bold().to_string(),
    };

    let mut lines = vec![headline];
    if let Some(error) = report.error {
        lines.push(format!("error: {error}"));
    }
    if let Some(payload) = report.payload {
        // Payloads serialize as {"kind": ..., "data": ...}
        let value = serde_json::to_value(payload)?;
        flatten(value.get("data").unwrap_or(&Value::Null), "", &mut lines);
    }
    Ok(lines.join("\n"))
}

/// One `key: value` line per scalar, nested keys joined with dots
fn flatten(value: &Value, prefix: &str, lines: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(child, &path, lines);
            }
        }
        Value::Array(items) if items.iter().all(|i| !i.is_object()) => {
            let joined: Vec<String> = items.iter().map(scalar).collect();
            lines.push(format!("{prefix}: {}", joined.join(", ")));
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten(child, &format!("{prefix}[{index}]"), lines);
            }
        }
        Value::Null => {}
        scalar_value if prefix.is_empty() => lines.push(scalar(scalar_value)),
        scalar_value => lines.push(format!("{prefix}: {}", scalar(scalar_value))),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
