//! Text matching helpers shared by every store implementation.

/// Case-insensitive substring test. An empty needle matches everything.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Dropdown value meaning "no constraint".
pub const ALL: &str = "All";

/// Normalize a presentation-layer dropdown selection.
///
/// Blank input and the `All` sentinel (any case) mean "no constraint".
pub fn selection(raw: Option<&str>) -> Option<&str> {
    free_text(raw).filter(|value| !value.eq_ignore_ascii_case(ALL))
}

/// Normalize typed text. Only blank input means "no constraint"; words
/// such as `all` are ordinary search text.
pub fn free_text(raw: Option<&str>) -> Option<&str> {
    let value = raw?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
