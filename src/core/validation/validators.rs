//! Reusable field validators
//!
//! Each validator receives the field name (for the message) and the value
//! to check, and returns a human-readable message on failure.

use regex::Regex;
use std::sync::OnceLock;

static DIGITS_REGEX: OnceLock<Regex> = OnceLock::new();

fn digits_regex() -> &'static Regex {
    DIGITS_REGEX.get_or_init(|| Regex::new(r"^[0-9]+$").expect("static regex"))
}

/// Validator: value is present
pub fn required<T>() -> impl Fn(&str, Option<&T>) -> Result<(), String> + Send + Sync + Clone {
    |label: &str, value: Option<&T>| match value {
        Some(_) => Ok(()),
        None => Err(format!("{} is required", label)),
    }
}

/// Validator: string length (in characters) must be within range
pub fn string_length(
    min: usize,
    max: usize,
) -> impl Fn(&str, &str) -> Result<(), String> + Send + Sync + Clone {
    move |label: &str, value: &str| {
        let len = value.chars().count();
        if len < min {
            Err(format!("{} must be at least {} characters", label, min))
        } else if len > max {
            Err(format!("{} cannot exceed {} characters", label, max))
        } else {
            Ok(())
        }
    }
}

/// Validator: number must be at least `min`
pub fn min_value(min: i64) -> impl Fn(&str, i64) -> Result<(), String> + Send + Sync + Clone {
    move |label: &str, value: i64| {
        if value < min {
            Err(format!("{} must be at least {}", label, min))
        } else {
            Ok(())
        }
    }
}

/// Validator: number must lie within `[min, max]`
pub fn in_range(
    min: i64,
    max: i64,
    message: &'static str,
) -> impl Fn(&str, i64) -> Result<(), String> + Send + Sync + Clone {
    move |_: &str, value: i64| {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }
}

/// Validator: string consists of exactly `count` ASCII digits
pub fn digits(count: usize) -> impl Fn(&str, &str) -> Result<(), String> + Send + Sync + Clone {
    move |label: &str, value: &str| {
        if value.len() == count && digits_regex().is_match(value) {
            Ok(())
        } else {
            Err(format!("{} must be {} digits", label, count))
        }
    }
}

/// Validator: list holds at least one non-blank entry, and no blank ones
pub fn non_empty_list(
    item: &'static str,
) -> impl Fn(&str, &[String]) -> Result<(), String> + Send + Sync + Clone {
    move |_: &str, values: &[String]| {
        if values.is_empty() {
            Err(format!("At least one {} is required", item))
        } else if values.iter().any(|v| v.trim().is_empty()) {
            Err(format!("Every {} reference must be non-empty", item))
        } else {
            Ok(())
        }
    }
}
