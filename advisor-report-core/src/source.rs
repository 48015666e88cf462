//! Recommendation sources and Advisor JSON decoding.

use std::path::{Path, PathBuf};

use log::warn;
use serde::Deserialize;

use crate::domain::RecommendationRecord;
use crate::error::Result;
use crate::fs::FileSystem;

/// Upstream provider of recommendation records.
#[cfg_attr(test, mockall::automock)]
pub trait RecommendationSource {
    /// Return every recommendation available to this run.
    fn list(&self) -> Result<Vec<RecommendationRecord>>;
}

impl RecommendationSource for Vec<RecommendationRecord> {
    fn list(&self) -> Result<Vec<RecommendationRecord>> {
        Ok(self.clone())
    }
}

/// Reads an Advisor JSON export from disk.
pub struct JsonFileSource<F: FileSystem> {
    fs: F,
    path: PathBuf,
}

impl<F: FileSystem> JsonFileSource<F> {
    /// Create a source for the export at `path`.
    pub fn new(fs: F, path: impl AsRef<Path>) -> Self {
        Self {
            fs,
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl<F: FileSystem> RecommendationSource for JsonFileSource<F> {
    fn list(&self) -> Result<Vec<RecommendationRecord>> {
        let contents = self.fs.read_to_string(&self.path)?;
        parse_recommendations(&contents)
    }
}

/// One decoded page of recommendations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendationPage {
    /// Records in payload order.
    pub records: Vec<RecommendationRecord>,
    /// Continuation link, when the service reported more results.
    pub next_link: Option<String>,
}

/// Decode recommendations from a REST page or an Azure CLI array.
pub fn parse_recommendations(json: &str) -> Result<Vec<RecommendationRecord>> {
    Ok(parse_recommendation_page(json)?.records)
}

/// Decode recommendations and the continuation link, if any.
///
/// Items without an `id` or `category` are skipped with a warning.
pub fn parse_recommendation_page(json: &str) -> Result<RecommendationPage> {
    let (items, next_link) = match serde_json::from_str::<WirePayload>(json)? {
        WirePayload::Page { value, next_link } => (value, next_link),
        WirePayload::List(items) => (items, None),
    };
    let records = items
        .into_iter()
        .filter_map(WireRecommendation::into_record)
        .collect();
    Ok(RecommendationPage {
        records,
        next_link: next_link.filter(|link| !link.trim().is_empty()),
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WirePayload {
    Page {
        value: Vec<WireRecommendation>,
        #[serde(default, rename = "nextLink")]
        next_link: Option<String>,
    },
    List(Vec<WireRecommendation>),
}

#[derive(Debug, Deserialize)]
struct WireRecommendation {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    properties: Option<WireFields>,
    #[serde(flatten)]
    fields: WireFields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFields {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    impact: Option<String>,
    #[serde(default)]
    short_description: Option<WireShortDescription>,
}

#[derive(Debug, Deserialize)]
struct WireShortDescription {
    #[serde(default)]
    problem: Option<String>,
}

impl WireRecommendation {
    fn into_record(self) -> Option<RecommendationRecord> {
        let Some(id) = self.id.filter(|id| !id.is_empty()) else {
            warn!("skipping recommendation without id");
            return None;
        };
        let properties = self.properties.unwrap_or_default();
        let top = self.fields;
        let Some(category) = properties.category.or(top.category) else {
            warn!("skipping recommendation {id}: missing category");
            return None;
        };
        let impact = properties.impact.or(top.impact).unwrap_or_default();
        let problem = properties
            .short_description
            .or(top.short_description)
            .and_then(|description| description.problem)
            .unwrap_or_default();
        Some(RecommendationRecord {
            id,
            category,
            impact,
            problem_description: problem,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::fs::MockFileSystem;

    const REST_PAGE: &str = r#"{
        "value": [
            {
                "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm/providers/Microsoft.Advisor/recommendations/1",
                "name": "1",
                "properties": {
                    "category": "Cost",
                    "impact": "High",
                    "shortDescription": { "problem": "Right-size VM", "solution": "Resize" }
                }
            }
        ],
        "nextLink": "https://management.azure.com/next"
    }"#;

    const CLI_ARRAY: &str = r#"[
        {
            "id": "/subscriptions/s/providers/Microsoft.Advisor/recommendations/2",
            "category": "Security",
            "impact": "Low",
            "shortDescription": { "problem": "Enable MFA" }
        },
        { "category": "Security", "impact": "Low" },
        { "id": "/subscriptions/s/providers/Microsoft.Advisor/recommendations/3" }
    ]"#;

    #[test]
    fn parses_rest_page_with_nested_properties() {
        let page = parse_recommendation_page(REST_PAGE).expect("parse");
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].category, "Cost");
        assert_eq!(page.records[0].impact, "High");
        assert_eq!(page.records[0].problem_description, "Right-size VM");
        assert_eq!(
            page.next_link.as_deref(),
            Some("https://management.azure.com/next")
        );
    }

    #[test]
    fn parses_cli_array_and_skips_incomplete_items() {
        let records = parse_recommendations(CLI_ARRAY).expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "Security");
        assert_eq!(records[0].problem_description, "Enable MFA");
    }

    #[test]
    fn missing_impact_is_kept_for_aggregation_to_reject() {
        let records = parse_recommendations(r#"[{ "id": "x", "category": "Cost" }]"#)
            .expect("parse");
        assert_eq!(records[0].impact, "");
        assert_eq!(records[0].problem_description, "");
    }

    #[test]
    fn rejects_invalid_json() {
        let err = parse_recommendations("{ not json").expect_err("invalid");
        assert!(matches!(err, ReportError::Source(_)));
    }

    #[test]
    fn json_file_source_reads_through_filesystem() {
        let mut fs = MockFileSystem::new();
        fs.expect_read_to_string()
            .withf(|path| path == Path::new("advisor.json"))
            .returning(|_| Ok(CLI_ARRAY.to_string()));

        let source = JsonFileSource::new(fs, "advisor.json");
        let records = source.list().expect("list");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn in_memory_source_returns_records() {
        let records = vec![RecommendationRecord::new("id", "Cost", "Low", "p")];
        assert_eq!(records.list().expect("list"), records);
    }
}
