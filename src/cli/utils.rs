//! Shared argument helpers

/// Split a comma-separated flag value, trimming items and dropping empty ones.
/// Returns `None` when the flag was absent or held nothing usable.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    let items: Vec<String> = value
        .as_deref()?
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
