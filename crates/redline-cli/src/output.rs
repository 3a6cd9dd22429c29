//! Output formatting for the CLI.

use crate::error::{CliError, Result};
use colored::*;
use redline_domain::{ContractChangeResult, ProcessingResult, ProgressUpdate};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    /// Serialize the envelope, pretty unless `compact`.
    pub fn envelope_json(&self, envelope: &ProcessingResult, compact: bool) -> Result<String> {
        if compact {
            Ok(serde_json::to_string(envelope)?)
        } else {
            Ok(serde_json::to_string_pretty(envelope)?)
        }
    }

    /// Summary table of a successful comparison.
    pub fn change_table(
        &self,
        envelope: &ProcessingResult,
        result: &ContractChangeResult,
    ) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);

        let sections = result.sections_changed.join("\n");
        let topics = result.topics_touched.join(", ");
        let elapsed = format!("{} ms", envelope.processing_time_ms);
        let trace_id = envelope.trace_id.as_deref().unwrap_or("-");

        builder.push_record(["Contract ID", envelope.contract_id.as_str()]);
        builder.push_record(["Sections changed", sections.as_str()]);
        builder.push_record(["Topics touched", topics.as_str()]);
        builder.push_record(["Summary", wrap(&result.summary_of_the_change, 72).as_str()]);
        builder.push_record(["Processing time", elapsed.as_str()]);
        builder.push_record(["Trace ID", trace_id]);

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// One line per progress update.
    pub fn progress_line(&self, update: &ProgressUpdate) -> String {
        let label = format!("[{:>3}%] {}", update.progress, update.step);
        format!("{} {}", self.colorize(&label, "cyan"), update.message)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a command failure; the only place a failed run is reported.
    pub fn failure(&self, error: &CliError) -> String {
        self.error(&error.to_string())
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Break long text on word boundaries so the table stays readable.
fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}
