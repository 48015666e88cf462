//! Console summaries of a generated report.

use std::fmt::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::aggregator::Aggregation;
use crate::domain::CategoryPercentage;
use crate::error::ReportError;
use crate::projector::format_percentage;

/// Overview figures for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    /// Category label.
    pub category: String,
    /// Number of recommendations.
    pub rows: usize,
    /// High impact share, 0-100.
    pub high: f64,
    /// Medium impact share, 0-100.
    pub medium: f64,
    /// Low impact share, 0-100.
    pub low: f64,
}

/// What a report run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Location of the written workbook.
    pub path: PathBuf,
    /// Rows written across all category sheets.
    pub total_rows: usize,
    /// Categories in first-seen order.
    pub categories: Vec<CategorySummary>,
    /// Messages for records left out of the report.
    pub skipped: Vec<String>,
}

impl ReportSummary {
    /// Assemble a summary from the finished pipeline stages.
    pub fn new(
        path: PathBuf,
        aggregation: &Aggregation,
        percentages: &[CategoryPercentage],
        skipped: &[ReportError],
    ) -> Self {
        let categories = percentages
            .iter()
            .map(|entry| CategorySummary {
                category: entry.category.clone(),
                rows: aggregation
                    .bucket(&entry.category)
                    .map(|bucket| bucket.rows.len())
                    .unwrap_or(0),
                high: entry.high,
                medium: entry.medium,
                low: entry.low,
            })
            .collect();
        Self {
            path,
            total_rows: aggregation.total_rows(),
            categories,
            skipped: skipped.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Render a summary as plain text.
pub fn render_overview_text(summary: &ReportSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Report: {}", summary.path.display());
    let _ = writeln!(output, "Recommendations: {}", summary.total_rows);
    if summary.categories.is_empty() {
        let _ = writeln!(output, "Categories: none");
    } else {
        let _ = writeln!(output, "Categories:");
        for entry in &summary.categories {
            let _ = writeln!(
                output,
                "- {} ({}): high {}, medium {}, low {}",
                entry.category,
                entry.rows,
                format_percentage(entry.high),
                format_percentage(entry.medium),
                format_percentage(entry.low)
            );
        }
    }
    if !summary.skipped.is_empty() {
        let _ = writeln!(output, "Skipped records:");
        for message in &summary.skipped {
            let _ = writeln!(output, "- {message}");
        }
    }
    output
}

/// Render a summary as Markdown.
pub fn render_overview_markdown(summary: &ReportSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Azure Advisor Report\n");
    let _ = writeln!(output, "- Workbook: `{}`", summary.path.display());
    let _ = writeln!(output, "- Recommendations: {}\n", summary.total_rows);

    let _ = writeln!(output, "## Overview");
    if summary.categories.is_empty() {
        let _ = writeln!(output, "No recommendations found.\n");
    } else {
        let _ = writeln!(output, "| Category | Count | High | Medium | Low |");
        let _ = writeln!(output, "| --- | ---: | ---: | ---: | ---: |");
        for entry in &summary.categories {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} |",
                entry.category,
                entry.rows,
                format_percentage(entry.high),
                format_percentage(entry.medium),
                format_percentage(entry.low)
            );
        }
        let _ = writeln!(output);
    }

    if !summary.skipped.is_empty() {
        let _ = writeln!(output, "## Skipped records");
        for message in &summary.skipped {
            let _ = writeln!(output, "- {message}");
        }
        let _ = writeln!(output);
    }
    output
}

/// Render any serializable payload as pretty JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}
