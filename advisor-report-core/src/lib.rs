#![deny(missing_docs)]
//! Advisor report core library.
//!
//! Groups Azure Advisor recommendations by category, projects severity
//! percentages and renders them into an xlsx workbook with an overview
//! sheet and one detail sheet per category.

pub mod aggregator;
pub mod domain;
pub mod error;
pub mod fs;
pub mod identity;
pub mod pipeline;
pub mod projector;
pub mod renderer;
pub mod source;
pub mod summary;

pub use aggregator::{Aggregation, Aggregator, IngestOutcome, MalformedRecordPolicy};
pub use domain::{
    CategoryBucket, CategoryPercentage, Impact, ParsedIdentity, RecommendationRecord, RenderRow,
    SeverityCounts,
};
pub use error::{ReportError, Result};
pub use fs::{FileSystem, StdFileSystem};
pub use identity::{parse_identity, remediation_link};
pub use pipeline::{GeneratedReport, ReportPipeline};
pub use projector::{format_percentage, project};
pub use renderer::{
    DEFAULT_REPORT_PREFIX, ReportLayout, ReportRenderer, SheetName, report_file_name,
};
pub use source::{
    JsonFileSource, RecommendationPage, RecommendationSource, parse_recommendation_page,
    parse_recommendations,
};
pub use summary::{
    CategorySummary, ReportSummary, render_json, render_overview_markdown, render_overview_text,
};
