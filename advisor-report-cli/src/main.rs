#![deny(missing_docs)]
//! Advisor report command-line interface.
//!
//! Fetches Azure Advisor recommendations, live or from a JSON export, and
//! writes them to an xlsx workbook.

mod azure;

use advisor_report_core::{
    DEFAULT_REPORT_PREFIX, JsonFileSource, MalformedRecordPolicy, RecommendationSource,
    ReportPipeline, ReportSummary, StdFileSystem, render_json, render_overview_markdown,
    render_overview_text,
};
use azure::AzureArgs;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "advisor-report", version, about = "Azure Advisor workbook reporter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct OutputArgs {
    /// Directory the workbook is written to.
    #[arg(short, long, env = "ADVISOR_REPORT_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,
    /// File name prefix of the workbook.
    #[arg(long, env = "ADVISOR_REPORT_PREFIX", default_value = DEFAULT_REPORT_PREFIX)]
    prefix: String,
    /// Abort on a recommendation with an unknown impact instead of skipping it.
    #[arg(long)]
    strict: bool,
    /// Format of the summary printed after the workbook is written.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch recommendations from the Azure Advisor API and build the report.
    Fetch {
        #[command(flatten)]
        azure: AzureArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Build the report from an Advisor JSON export.
    Import {
        /// REST page or `az advisor recommendation list -o json` output.
        #[arg(short, long)]
        input: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch { azure, output } => {
            let records = azure::fetch_recommendations(&azure).await?;
            run_report(&records, &output)?
        }
        Commands::Import { input, output } => {
            let records = load_export(input)?;
            run_report(&records, &output)?
        }
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

fn load_export(input: PathBuf) -> CliResult<Vec<advisor_report_core::RecommendationRecord>> {
    info!("reading recommendations from {}", input.display());
    let source = JsonFileSource::new(StdFileSystem::new(), input);
    Ok(source.list()?)
}

#[cfg_attr(test, allow(dead_code))]
fn run_report<S: RecommendationSource + ?Sized>(source: &S, output: &OutputArgs) -> CliResult<()> {
    let contents = build_report(source, output)?;
    print!("{contents}");
    Ok(())
}

fn build_report<S: RecommendationSource + ?Sized>(
    source: &S,
    output: &OutputArgs,
) -> CliResult<String> {
    let prefix = output.prefix.trim();
    if prefix.is_empty() {
        return Err("prefix cannot be empty".into());
    }
    let policy = if output.strict {
        MalformedRecordPolicy::Abort
    } else {
        MalformedRecordPolicy::Skip
    };
    let report = ReportPipeline::new(StdFileSystem::new())
        .with_output_dir(&output.output_dir)
        .with_prefix(prefix)
        .with_policy(policy)
        .run(source)?;
    render_summary(&report.summary(), output.format)
}

fn render_summary(summary: &ReportSummary, format: OutputFormat) -> CliResult<String> {
    Ok(match format {
        OutputFormat::Text => render_overview_text(summary),
        OutputFormat::Markdown => render_overview_markdown(summary),
        OutputFormat::Json => render_json(summary)?,
    })
}
