//! Severity percentages per category.

use crate::domain::{CategoryBucket, CategoryPercentage, Impact, SeverityCounts};

/// Convert finished bucket tallies into percentages, one entry per bucket.
///
/// Buckets without rows project to all zeros.
pub fn project<'a, I>(buckets: I) -> Vec<CategoryPercentage>
where
    I: IntoIterator<Item = &'a CategoryBucket>,
{
    buckets
        .into_iter()
        .map(|bucket| project_counts(&bucket.category, &bucket.counts))
        .collect()
}

/// Percentages for a single tally.
pub fn project_counts(category: &str, counts: &SeverityCounts) -> CategoryPercentage {
    let total = counts.total();
    let share = |impact: Impact| {
        if total == 0 {
            0.0
        } else {
            (counts.get(impact) as f64 / total as f64) * 100.0
        }
    };
    CategoryPercentage {
        category: category.to_string(),
        high: share(Impact::High),
        medium: share(Impact::Medium),
        low: share(Impact::Low),
    }
}

/// Two-decimal display form, e.g. `66.67%`.
pub fn format_percentage(value: f64) -> String {
    format!("{value:.2}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(high: u64, medium: u64, low: u64) -> SeverityCounts {
        SeverityCounts { high, medium, low }
    }

    #[test]
    fn splits_cost_scenario() {
        let projected = project_counts("Cost", &counts(2, 0, 1));
        assert_eq!(format_percentage(projected.high), "66.67%");
        assert_eq!(format_percentage(projected.medium), "0.00%");
        assert_eq!(format_percentage(projected.low), "33.33%");
    }

    #[test]
    fn populated_categories_sum_to_one_hundred() {
        for (high, medium, low) in [(1, 1, 1), (7, 3, 0), (0, 0, 5), (13, 29, 101)] {
            let projected = project_counts("x", &counts(high, medium, low));
            assert!((projected.sum() - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_category_projects_to_zeros() {
        let projected = project_counts("Empty", &SeverityCounts::default());
        assert_eq!(projected.high, 0.0);
        assert_eq!(projected.medium, 0.0);
        assert_eq!(projected.low, 0.0);
        assert_eq!(projected.sum(), 0.0);
    }

    #[test]
    fn projection_is_idempotent_and_ordered() {
        let mut cost = CategoryBucket::new("Cost");
        cost.counts = counts(1, 2, 3);
        let empty = CategoryBucket::new("Security");
        let buckets = vec![cost, empty];

        let first = project(&buckets);
        let second = project(&buckets);

        assert_eq!(first, second);
        assert_eq!(first[0].category, "Cost");
        assert_eq!(first[1].category, "Security");
        assert_eq!(first[0].get(Impact::Low), 50.0);
    }
}
