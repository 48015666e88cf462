//! End-to-end report generation: fetch, aggregate, project, render, write.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use log::{debug, error, info, warn};

use crate::aggregator::{Aggregation, Aggregator, MalformedRecordPolicy};
use crate::domain::CategoryPercentage;
use crate::error::{ReportError, Result};
use crate::fs::FileSystem;
use crate::projector::project;
use crate::renderer::{DEFAULT_REPORT_PREFIX, ReportLayout, ReportRenderer, report_file_name};
use crate::source::RecommendationSource;
use crate::summary::ReportSummary;

/// Outcome of a successful run.
#[derive(Debug)]
pub struct GeneratedReport {
    /// Path of the written workbook.
    pub path: PathBuf,
    /// Finished aggregation.
    pub aggregation: Aggregation,
    /// Percentages per category, in first-seen order.
    pub percentages: Vec<CategoryPercentage>,
    /// Malformed records left out of the report.
    pub skipped: Vec<ReportError>,
}

impl GeneratedReport {
    /// Summary suitable for console output.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary::new(
            self.path.clone(),
            &self.aggregation,
            &self.percentages,
            &self.skipped,
        )
    }
}

/// Drives one report run against a filesystem sink.
pub struct ReportPipeline<F: FileSystem> {
    fs: F,
    output_dir: PathBuf,
    prefix: String,
    policy: MalformedRecordPolicy,
    renderer: ReportRenderer,
}

impl<F: FileSystem> ReportPipeline<F> {
    /// Create a pipeline writing to the working directory.
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            output_dir: PathBuf::from("."),
            prefix: DEFAULT_REPORT_PREFIX.to_string(),
            policy: MalformedRecordPolicy::default(),
            renderer: ReportRenderer::new(),
        }
    }

    /// Directory the workbook is written to.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// File name prefix of the workbook.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Handling of records with an unknown impact.
    pub fn with_policy(mut self, policy: MalformedRecordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Generate a report stamped with the current local time.
    pub fn run<S: RecommendationSource + ?Sized>(&self, source: &S) -> Result<GeneratedReport> {
        self.run_at(source, Local::now().naive_local())
    }

    /// Generate a report stamped with `timestamp`.
    pub fn run_at<S: RecommendationSource + ?Sized>(
        &self,
        source: &S,
        timestamp: NaiveDateTime,
    ) -> Result<GeneratedReport> {
        let records = match source.list() {
            Ok(records) => records,
            Err(err) => {
                warn!("fetch failed, continuing with no recommendations: {err}");
                Vec::new()
            }
        };
        info!("fetched {} recommendations", records.len());

        let mut aggregator = Aggregator::new();
        let outcome = aggregator.ingest_all(&records, self.policy).inspect_err(|err| {
            error!("aggregate failed: {err}");
        })?;
        let aggregation = aggregator.finish();
        info!(
            "aggregated {} rows into {} categories ({} skipped)",
            outcome.ingested,
            aggregation.buckets().len(),
            outcome.skipped.len()
        );

        let percentages = project(aggregation.buckets());

        let layout = ReportLayout::plan(&aggregation, &percentages).inspect_err(|err| {
            error!("render failed: {err}");
        })?;
        let bytes = self.renderer.render(&layout).inspect_err(|err| {
            error!("render failed: {err}");
        })?;

        let path = self.output_dir.join(report_file_name(&self.prefix, timestamp));
        if let Err(err) = self.fs.write_file(&path, &bytes) {
            error!("write failed for {}: {err}", path.display());
            if let Err(cleanup) = self.fs.remove_file(&path) {
                debug!("no partial file removed at {}: {cleanup}", path.display());
            }
            return Err(ReportError::Render(format!(
                "failed to write {}: {err}",
                path.display()
            )));
        }
        info!("wrote {}", path.display());

        Ok(GeneratedReport {
            path,
            aggregation,
            percentages,
            skipped: outcome.skipped,
        })
    }
}
