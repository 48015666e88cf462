//! Resource identity extraction from recommendation ids.

use crate::domain::ParsedIdentity;

/// Separates the resource path from the recommendation suffix in an id.
pub const RECOMMENDATION_DELIMITER: &str = "/providers/Microsoft.Advisor/recommendations/";

/// Search endpoint used for remediation links.
pub const SEARCH_URL: &str = "https://learn.microsoft.com/en-us/search/?terms=";

/// Longest string literal a spreadsheet formula accepts.
pub const MAX_FORMULA_STRING_LEN: usize = 255;

/// Extract subscription, resource group, type and name from `id`.
///
/// A resource path has the shape
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/{ns}/{type}/{name}`,
/// so the leading empty segment puts the subscription at index 2. Missing
/// segments yield `None`.
pub fn parse_identity(id: &str) -> ParsedIdentity {
    let resource_uri = id
        .split(RECOMMENDATION_DELIMITER)
        .next()
        .unwrap_or_default();
    let parts: Vec<&str> = resource_uri.split('/').collect();

    ParsedIdentity {
        subscription_id: parts.get(2).map(|part| part.to_string()),
        resource_group: parts.get(4).map(|part| part.to_string()),
        resource_type: parts.get(6..8).map(|pair| pair.join("/")),
        resource_name: parts.get(8).map(|part| part.to_string()),
    }
}

/// Build the `HYPERLINK` formula for a problem description.
///
/// Search terms are cut so the URL literal stays within
/// [`MAX_FORMULA_STRING_LEN`] characters.
pub fn remediation_link(description: &str) -> String {
    let budget = MAX_FORMULA_STRING_LEN - SEARCH_URL.chars().count();
    let terms: String = description
        .chars()
        .map(|ch| if ch.is_whitespace() { '+' } else { ch })
        .take(budget)
        .collect();
    let url = format!("{SEARCH_URL}{}", terms.trim_end_matches('+')).replace('"', "\"\"");
    format!("=HYPERLINK(\"{url}\", \"How To\")")
}
