use crate::types::{Resource, SourceType};

/// Results returned when the caller does not ask for a limit
pub const DEFAULT_LIMIT: usize = 10;

/// Upper bound on results, whatever the caller asks for
pub const MAX_LIMIT: usize = 25;

/// Search the resource catalog.
///
/// Every whitespace-separated term of `query` must appear (case-insensitive)
/// in the title, subject, level or description. An empty query matches
/// everything. Results keep catalog order and are capped at [`MAX_LIMIT`].
pub fn search<'a>(
    catalog: &'a [Resource],
    query: &str,
    resource_type: Option<SourceType>,
    limit: Option<usize>,
) -> Vec<&'a Resource> {
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    catalog
        .iter()
        .filter(|r| resource_type.map_or(true, |t| r.resource_type == t))
        .filter(|r| {
            let haystack =
                format!("{} {} {} {}", r.title, r.subject, r.level, r.description).to_lowercase();
            terms.iter().all(|term| haystack.contains(term))
        })
        .take(limit)
        .collect()
}
