//! Single-pass grouping of recommendations into category buckets.

use indexmap::IndexMap;
use log::{debug, warn};

use crate::domain::{CategoryBucket, Impact, RecommendationRecord, RenderRow};
use crate::error::{ReportError, Result};
use crate::identity::{parse_identity, remediation_link};

/// What to do with a record whose impact is outside the fixed set.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum MalformedRecordPolicy {
    /// Log the record and keep going.
    #[default]
    Skip,
    /// Stop at the first malformed record.
    Abort,
}

/// Result of ingesting a batch of records.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Records that produced a row.
    pub ingested: usize,
    /// Malformed records left out under [`MalformedRecordPolicy::Skip`].
    pub skipped: Vec<ReportError>,
}

/// Accumulates category buckets in first-seen order.
#[derive(Debug, Default)]
pub struct Aggregator {
    buckets: IndexMap<String, CategoryBucket>,
}

impl Aggregator {
    /// Create an aggregator with no buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record to the bucket of its category.
    ///
    /// The impact is validated before any bucket is touched, so a rejected
    /// record never creates an empty category.
    pub fn ingest(&mut self, record: &RecommendationRecord) -> Result<()> {
        let impact: Impact = record
            .impact
            .parse()
            .map_err(|impact| ReportError::MalformedRecord {
                id: record.id.clone(),
                impact,
            })?;

        let identity = parse_identity(&record.id);
        if !identity.is_complete() {
            debug!("identifier shorter than expected: {}", record.id);
        }

        let row = RenderRow {
            impact,
            subscription_id: identity.subscription_id,
            resource_group: identity.resource_group,
            resource_type: identity.resource_type,
            resource_name: identity.resource_name,
            description: record.problem_description.clone(),
            link_formula: remediation_link(&record.problem_description),
        };
        self.buckets
            .entry(record.category.clone())
            .or_insert_with(|| CategoryBucket::new(&record.category))
            .push(row);
        Ok(())
    }

    /// Ingest every record in order, applying `policy` to malformed ones.
    pub fn ingest_all<'a, I>(
        &mut self,
        records: I,
        policy: MalformedRecordPolicy,
    ) -> Result<IngestOutcome>
    where
        I: IntoIterator<Item = &'a RecommendationRecord>,
    {
        let mut outcome = IngestOutcome::default();
        for record in records {
            match self.ingest(record) {
                Ok(()) => outcome.ingested += 1,
                Err(err) if policy == MalformedRecordPolicy::Skip => {
                    warn!("skipping record: {err}");
                    outcome.skipped.push(err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(outcome)
    }

    /// Freeze the accumulated state.
    pub fn finish(self) -> Aggregation {
        Aggregation {
            buckets: self.buckets,
        }
    }
}

/// Finished aggregation, buckets in first-seen category order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    buckets: IndexMap<String, CategoryBucket>,
}

impl Aggregation {
    /// Build an aggregation from pre-assembled buckets.
    ///
    /// A repeated category keeps its first position and the last bucket.
    pub fn from_buckets(buckets: Vec<CategoryBucket>) -> Self {
        Self {
            buckets: buckets
                .into_iter()
                .map(|bucket| (bucket.category.clone(), bucket))
                .collect(),
        }
    }

    /// Buckets in first-seen order.
    pub fn buckets(&self) -> impl ExactSizeIterator<Item = &CategoryBucket> {
        self.buckets.values()
    }

    /// Category labels in first-seen order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Bucket for `category`, if it was seen.
    pub fn bucket(&self, category: &str) -> Option<&CategoryBucket> {
        self.buckets.get(category)
    }

    /// Rows across all buckets.
    pub fn total_rows(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.rows.len()).sum()
    }

    /// Whether no category was seen.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, category: &str, impact: &str) -> RecommendationRecord {
        RecommendationRecord::new(id, category, impact, "Right-size underused VMs")
    }

    #[test]
    fn groups_rows_by_category_in_first_seen_order() {
        let records = vec![
            record("/subscriptions/a", "Security", "High"),
            record("/subscriptions/b", "Cost", "Low"),
            record("/subscriptions/c", "Security", "Medium"),
            record("/subscriptions/d", "Performance", "Low"),
        ];
        let mut aggregator = Aggregator::new();
        let outcome = aggregator
            .ingest_all(&records, MalformedRecordPolicy::Abort)
            .expect("ingest");
        let aggregation = aggregator.finish();

        assert_eq!(outcome.ingested, 4);
        assert_eq!(
            aggregation.categories().collect::<Vec<_>>(),
            vec!["Security", "Cost", "Performance"]
        );
        assert_eq!(aggregation.bucket("Security").expect("bucket").rows.len(), 2);
        assert_eq!(aggregation.total_rows(), 4);
    }

    #[test]
    fn counts_match_rows_for_every_bucket() {
        let impacts = ["High", "Medium", "Low"];
        let categories = ["Cost", "Security", "Reliability", "OperationalExcellence"];
        let mut aggregator = Aggregator::new();
        for i in 0..97 {
            let rec = record(
                &format!("/subscriptions/{i}"),
                categories[i % categories.len()],
                impacts[(i * 7) % impacts.len()],
            );
            aggregator.ingest(&rec).expect("ingest");
        }
        let aggregation = aggregator.finish();
        for bucket in aggregation.buckets() {
            assert_eq!(bucket.counts.total() as usize, bucket.rows.len());
        }
        assert_eq!(aggregation.total_rows(), 97);
    }

    #[test]
    fn rows_keep_arrival_order_and_identity() {
        let mut aggregator = Aggregator::new();
        aggregator
            .ingest(&record(
                "/subscriptions/s1/resourceGroups/rg/providers/Microsoft.Web/sites/app/providers/Microsoft.Advisor/recommendations/1",
                "Cost",
                "High",
            ))
            .expect("first");
        aggregator
            .ingest(&record("no-slashes-at-all", "Cost", "Low"))
            .expect("second");
        let aggregation = aggregator.finish();
        let rows = &aggregation.bucket("Cost").expect("bucket").rows;

        assert_eq!(rows[0].impact, Impact::High);
        assert_eq!(rows[0].resource_type.as_deref(), Some("Microsoft.Web/sites"));
        assert_eq!(rows[0].resource_name.as_deref(), Some("app"));
        assert_eq!(rows[1].impact, Impact::Low);
        assert_eq!(rows[1].subscription_id, None);
        assert!(rows[1].link_formula.starts_with("=HYPERLINK("));
    }

    #[test]
    fn malformed_impact_names_record_and_creates_no_bucket() {
        let mut aggregator = Aggregator::new();
        let err = aggregator
            .ingest(&record("/subscriptions/x", "Security", "Critical"))
            .expect_err("malformed");

        match err {
            ReportError::MalformedRecord { id, impact } => {
                assert_eq!(id, "/subscriptions/x");
                assert_eq!(impact, "Critical");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(aggregator.finish().is_empty());
    }

    #[test]
    fn padded_impact_is_rejected_not_coerced() {
        let mut aggregator = Aggregator::new();
        let err = aggregator
            .ingest(&record("/subscriptions/padded", "Cost", " High "))
            .expect_err("padded impact");

        match err {
            ReportError::MalformedRecord { id, impact } => {
                assert_eq!(id, "/subscriptions/padded");
                assert_eq!(impact, " High ");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(aggregator.finish().is_empty());
    }

    #[test]
    fn skip_policy_keeps_valid_records() {
        let records = vec![
            record("/subscriptions/a", "Cost", "High"),
            record("/subscriptions/bad", "Cost", "Critical"),
            record("/subscriptions/c", "Cost", "Low"),
        ];
        let mut aggregator = Aggregator::new();
        let outcome = aggregator
            .ingest_all(&records, MalformedRecordPolicy::Skip)
            .expect("skip policy");

        assert_eq!(outcome.ingested, 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(outcome.skipped[0].to_string().contains("/subscriptions/bad"));
        assert_eq!(aggregator.finish().total_rows(), 2);
    }

    #[test]
    fn abort_policy_stops_at_first_malformed_record() {
        let records = vec![
            record("/subscriptions/a", "Cost", "High"),
            record("/subscriptions/bad", "Cost", "Severe"),
            record("/subscriptions/c", "Cost", "Low"),
        ];
        let mut aggregator = Aggregator::new();
        let err = aggregator
            .ingest_all(&records, MalformedRecordPolicy::Abort)
            .expect_err("abort policy");
        assert!(matches!(err, ReportError::MalformedRecord { .. }));
    }

    #[test]
    fn lookup_by_category_after_finish() {
        let mut aggregator = Aggregator::new();
        for i in 0..50 {
            let rec = record(&format!("/subscriptions/{i}"), &format!("Category{i}"), "Low");
            aggregator.ingest(&rec).expect("ingest");
        }
        aggregator
            .ingest(&record("/subscriptions/again", "Category7", "High"))
            .expect("ingest");
        let aggregation = aggregator.finish();

        assert_eq!(aggregation.buckets().len(), 50);
        let bucket = aggregation.bucket("Category7").expect("bucket");
        assert_eq!(bucket.rows.len(), 2);
        assert_eq!(bucket.counts.high, 1);
        assert_eq!(aggregation.categories().nth(7), Some("Category7"));
        assert!(aggregation.bucket("category7").is_none());
    }

    #[test]
    fn from_buckets_keeps_first_position_of_repeated_category() {
        let mut replacement = CategoryBucket::new("Cost");
        replacement.counts.low = 3;
        let aggregation = Aggregation::from_buckets(vec![
            CategoryBucket::new("Cost"),
            CategoryBucket::new("Security"),
            replacement,
        ]);

        assert_eq!(
            aggregation.categories().collect::<Vec<_>>(),
            vec!["Cost", "Security"]
        );
        assert_eq!(aggregation.bucket("Cost").expect("bucket").counts.low, 3);
    }

    #[test]
    fn empty_input_has_no_buckets() {
        let mut aggregator = Aggregator::new();
        let outcome = aggregator
            .ingest_all(&Vec::<RecommendationRecord>::new(), MalformedRecordPolicy::Skip)
            .expect("empty");
        assert_eq!(outcome.ingested, 0);
        assert!(aggregator.finish().is_empty());
    }
}
