//! Output formatting for CLI commands.

use colored::Colorize;
use serde::Serialize;

use moveflow_ops::{StreamScan, WalletBalance};
use moveflow_types::NormalizedStream;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Human,
    /// Pretty JSON.
    Json,
}

/// Render a command result in the requested format.
pub trait Render: Serialize {
    /// Human-readable rendering.
    fn render_human(&self) -> String;

    fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Human => self.render_human(),
            OutputFormat::Json => serde_json::to_string_pretty(self)
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
        }
    }
}

fn stream_line(stream: &NormalizedStream) -> String {
    let status = stream
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "  #{} {} {} -> {}  {}  [{}]{}",
        stream.stream_id.bold(),
        stream.name.as_deref().unwrap_or(""),
        stream.sender.as_deref().unwrap_or("?"),
        stream.recipient.as_deref().unwrap_or("?"),
        stream.amounts.total.as_deref().unwrap_or("-"),
        status,
        stream
            .progress
            .as_deref()
            .map(|p| format!(" {}", p))
            .unwrap_or_default(),
    )
}

impl Render for StreamScan {
    fn render_human(&self) -> String {
        let mut out = vec![
            format!("{} {}", "Stream scan for".bold(), self.address.cyan()),
            format!("Contract: {}", self.contract),
            String::new(),
            "Sources:".bold().to_string(),
        ];

        for report in &self.sources {
            let line = if report.ok {
                format!(
                    "  {} {:<24} {} records",
                    "✓".green(),
                    report.source.as_str(),
                    report.records
                )
            } else {
                format!(
                    "  {} {:<24} {}",
                    "✗".red(),
                    report.source.as_str(),
                    report.error.as_deref().unwrap_or("failed")
                )
            };
            out.push(line);
        }

        out.push(String::new());
        if self.stream_ids.is_empty() {
            out.push("No stream ids found.".yellow().to_string());
        } else {
            out.push(format!(
                "{} {}",
                "Stream ids:".bold(),
                self.stream_ids.join(", ")
            ));
            if self.skipped_ids > 0 {
                out.push(format!("  ({} not looked up)", self.skipped_ids));
            }
        }

        if !self.details.is_empty() {
            out.push(String::new());
            out.push("Details:".bold().to_string());
            out.extend(self.details.iter().map(stream_line));
        }

        if !self.table_resources.is_empty() {
            out.push(String::new());
            out.push("Stream table resources:".bold().to_string());
            out.extend(self.table_resources.iter().map(|t| format!("  {}", t)));
        }

        if !self.sample_events.is_empty() {
            out.push(String::new());
            out.push("Sample events:".bold().to_string());
            for event in &self.sample_events {
                out.push(format!("  {}", event));
            }
        }

        out.join("\n")
    }
}

impl Render for WalletBalance {
    fn render_human(&self) -> String {
        [
            format!("{} {}", "Balance:".bold(), self.balance.green()),
            format!("Address: {}", self.address),
            format!("Token:   {}", self.token_type),
            format!("Raw:     {}", self.raw_balance),
        ]
        .join("\n")
    }
}
