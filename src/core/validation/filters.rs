//! Reusable field filters
//!
//! These filters normalize field values before validation

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(String) -> String + Send + Sync + Clone {
    |value: String| {
        let trimmed = value.trim();
        if trimmed.len() == value.len() {
            value
        } else {
            trimmed.to_string()
        }
    }
}

/// Filter: trim, mapping blank strings to `None`
pub fn trim_to_none() -> impl Fn(Option<String>) -> Option<String> + Send + Sync + Clone {
    |value: Option<String>| value.map(trim()).filter(|s| !s.is_empty())
}
