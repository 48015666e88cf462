//! Domain entities for advisor reports.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Column headers of every category sheet, in write order.
pub const CATEGORY_COLUMNS: [&str; 7] = [
    "Impact",
    "Subscription_ID",
    "Resource_Group",
    "Type",
    "Resource_name",
    "Description",
    "Links",
];

/// Column headers of the overview sheet, in write order.
pub const OVERVIEW_COLUMNS: [&str; 4] = ["Category", "High", "Medium", "Low"];

/// Severity attached to a single recommendation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Impact {
    /// High impact.
    High,
    /// Medium impact.
    Medium,
    /// Low impact.
    Low,
}

impl Impact {
    /// All severities in report column order.
    pub const ALL: [Impact; 3] = [Impact::High, Impact::Medium, Impact::Low];

    /// Label used in sheets and by the upstream API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::High => "High",
            Impact::Medium => "Medium",
            Impact::Low => "Low",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Impact {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "High" => Ok(Impact::High),
            "Medium" => Ok(Impact::Medium),
            "Low" => Ok(Impact::Low),
            other => Err(other.to_string()),
        }
    }
}

/// A single recommendation as delivered by the upstream source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRecord {
    /// Hierarchical resource path plus recommendation suffix.
    pub id: String,
    /// Advisory dimension, e.g. `Cost` or `Security`.
    pub category: String,
    /// Raw impact label; validated during aggregation.
    pub impact: String,
    /// Short problem statement.
    pub problem_description: String,
}

impl RecommendationRecord {
    /// Build a record from its parts.
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        impact: impl Into<String>,
        problem_description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            impact: impact.into(),
            problem_description: problem_description.into(),
        }
    }
}

/// Resource identity extracted from a recommendation id.
///
/// `None` marks a field the id was too short to carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIdentity {
    /// Subscription GUID.
    pub subscription_id: Option<String>,
    /// Resource group name.
    pub resource_group: Option<String>,
    /// Provider namespace and resource type, e.g. `Microsoft.Compute/virtualMachines`.
    pub resource_type: Option<String>,
    /// Resource name.
    pub resource_name: Option<String>,
}

impl ParsedIdentity {
    /// Whether every identity field was present.
    pub fn is_complete(&self) -> bool {
        self.subscription_id.is_some()
            && self.resource_group.is_some()
            && self.resource_type.is_some()
            && self.resource_name.is_some()
    }
}

/// Running severity tally for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// High impact count.
    pub high: u64,
    /// Medium impact count.
    pub medium: u64,
    /// Low impact count.
    pub low: u64,
}

impl SeverityCounts {
    /// Add one to the tally of `impact`.
    pub fn increment(&mut self, impact: Impact) {
        match impact {
            Impact::High => self.high += 1,
            Impact::Medium => self.medium += 1,
            Impact::Low => self.low += 1,
        }
    }

    /// Count for `impact`.
    pub fn get(&self, impact: Impact) -> u64 {
        match impact {
            Impact::High => self.high,
            Impact::Medium => self.medium,
            Impact::Low => self.low,
        }
    }

    /// Sum over all severities.
    pub fn total(&self) -> u64 {
        self.high + self.medium + self.low
    }
}

/// One row of a category sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRow {
    /// Row severity; drives the row fill color.
    pub impact: Impact,
    /// Subscription GUID, if present.
    pub subscription_id: Option<String>,
    /// Resource group, if present.
    pub resource_group: Option<String>,
    /// Resource type, if present.
    pub resource_type: Option<String>,
    /// Resource name, if present.
    pub resource_name: Option<String>,
    /// Problem description.
    pub description: String,
    /// `HYPERLINK` formula pointing at remediation docs.
    pub link_formula: String,
}

/// Rows and tallies accumulated for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBucket {
    /// Category label.
    pub category: String,
    /// Rows in arrival order.
    pub rows: Vec<RenderRow>,
    /// Severity tallies; their total equals `rows.len()`.
    pub counts: SeverityCounts,
}

impl CategoryBucket {
    /// Create an empty bucket for `category`.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            rows: Vec::new(),
            counts: SeverityCounts::default(),
        }
    }

    /// Append a row and tally its impact.
    pub fn push(&mut self, row: RenderRow) {
        self.counts.increment(row.impact);
        self.rows.push(row);
    }

    /// Whether the bucket holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Percentage split of severities for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPercentage {
    /// Category label.
    pub category: String,
    /// Share of high impact rows, 0-100.
    pub high: f64,
    /// Share of medium impact rows, 0-100.
    pub medium: f64,
    /// Share of low impact rows, 0-100.
    pub low: f64,
}

impl CategoryPercentage {
    /// Percentage for `impact`.
    pub fn get(&self, impact: Impact) -> f64 {
        match impact {
            Impact::High => self.high,
            Impact::Medium => self.medium,
            Impact::Low => self.low,
        }
    }

    /// Sum of the three shares; 100 for populated categories, 0 otherwise.
    pub fn sum(&self) -> f64 {
        self.high + self.medium + self.low
    }
}
