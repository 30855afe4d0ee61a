//! Validation rules for donation submissions and admin decisions

use serde_json::Value;
use uuid::Uuid;

use super::FieldChecks;
use super::filters::{trim, trim_to_none};
use super::validators::{digits, in_range, min_value, non_empty_list, required, string_length};
use crate::core::donation::{DonationDraft, NewDonationRequest};
use crate::core::error::ValidationError;

pub const ORGAN_NAME_MIN: usize = 2;
pub const ORGAN_NAME_MAX: usize = 100;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 1000;
pub const PIN_CODE_MIN: i64 = 100_000;
pub const PIN_CODE_MAX: i64 = 999_999;
pub const QUANTITY_MAX: i64 = i32::MAX as i64;
pub const REJECTION_REASON_MIN: usize = 10;
pub const NOTES_MAX: usize = 500;

const PIN_CODE_MESSAGE: &str = "Pin code must be 6 digits";
const QUANTITY_MESSAGE: &str = "Quantity must be a whole number";

/// Validate and normalize a submission
///
/// Strings are trimmed before their length is checked and quantity defaults
/// to 1. Every offending field is reported, not only the first one.
/// The category is only checked for shape here; whether it exists is the
/// workflow's concern.
pub fn validate_draft(draft: DonationDraft) -> Result<NewDonationRequest, ValidationError> {
    let mut checks = FieldChecks::new();

    let organ_name = draft.organ_name.map(trim());
    if checks.check("organName", required()("Organ name", organ_name.as_ref())) {
        if let Some(name) = &organ_name {
            checks.check(
                "organName",
                string_length(ORGAN_NAME_MIN, ORGAN_NAME_MAX)("Organ name", name),
            );
        }
    }

    let category = draft.category.map(trim());
    let mut category_id = None;
    if checks.check("category", required()("Category", category.as_ref())) {
        if let Some(raw) = &category {
            match Uuid::parse_str(raw) {
                Ok(id) => category_id = Some(id),
                Err(_) => checks.fail("category", "Invalid category selected"),
            }
        }
    }

    let images = draft.images.unwrap_or_default();
    checks.check("images", non_empty_list("image")("images", &images));

    let pin_code = match draft.pin_code {
        None | Some(Value::Null) => {
            checks.fail("pinCode", "Pin code is required");
            None
        }
        Some(value) => match parse_pin_code(&value) {
            Ok(pin) => Some(pin),
            Err(message) => {
                checks.fail("pinCode", message);
                None
            }
        },
    };

    let description = draft.description.map(trim());
    if checks.check("description", required()("Description", description.as_ref())) {
        if let Some(text) = &description {
            checks.check(
                "description",
                string_length(DESCRIPTION_MIN, DESCRIPTION_MAX)("Description", text),
            );
        }
    }

    let quantity = match draft.quantity {
        None | Some(Value::Null) => Some(1),
        Some(value) => match parse_quantity(&value) {
            Ok(quantity) => Some(quantity),
            Err(message) => {
                checks.fail("quantity", message);
                None
            }
        },
    };

    checks.finish()?;

    match (organ_name, category_id, pin_code, description, quantity) {
        (Some(organ_name), Some(category), Some(pin_code), Some(description), Some(quantity)) => {
            Ok(NewDonationRequest {
                organ_name,
                category,
                images: images.into_iter().map(trim()).collect(),
                pin_code,
                description,
                quantity,
            })
        }
        _ => Err(ValidationError::single("body", "Validation failed")),
    }
}

/// Accept the pin code as a JSON number or a string of digits
fn parse_pin_code(value: &Value) -> Result<u32, String> {
    let number = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| PIN_CODE_MESSAGE.to_string())?,
        Value::String(s) => {
            let s = s.trim();
            digits(6)("Pin code", s)?;
            s.parse::<i64>().map_err(|_| PIN_CODE_MESSAGE.to_string())?
        }
        _ => return Err(PIN_CODE_MESSAGE.to_string()),
    };
    in_range(PIN_CODE_MIN, PIN_CODE_MAX, PIN_CODE_MESSAGE)("pinCode", number)?;
    Ok(number as u32)
}

/// Accept the quantity as a JSON number or a string of digits; a blank
/// string means the default of 1
fn parse_quantity(value: &Value) -> Result<u32, String> {
    let number = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e18).map(|f| f as i64))
            .ok_or_else(|| QUANTITY_MESSAGE.to_string())?,
        Value::String(s) if s.trim().is_empty() => return Ok(1),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| QUANTITY_MESSAGE.to_string())?,
        _ => return Err(QUANTITY_MESSAGE.to_string()),
    };
    min_value(1)("Quantity", number)?;
    if number > QUANTITY_MAX {
        return Err(format!("Quantity must be at most {}", QUANTITY_MAX));
    }
    Ok(number as u32)
}

/// Validate the reason given for a rejection; returns it trimmed
pub fn validate_rejection_reason(reason: Option<String>) -> Result<String, ValidationError> {
    const MESSAGE: &str = "Rejection reason is required and must be at least 10 characters";

    let reason = reason.map(trim()).unwrap_or_default();
    let mut checks = FieldChecks::new();
    if reason.chars().count() < REJECTION_REASON_MIN {
        checks.fail("rejectionReason", MESSAGE);
    } else {
        checks.check(
            "rejectionReason",
            string_length(REJECTION_REASON_MIN, NOTES_MAX)("Rejection reason", &reason),
        );
    }
    checks.finish()?;
    Ok(reason)
}

/// Validate optional admin notes; blank notes are treated as absent
pub fn validate_admin_notes(notes: Option<String>) -> Result<Option<String>, ValidationError> {
    let notes = trim_to_none()(notes);
    if let Some(text) = &notes {
        let mut checks = FieldChecks::new();
        checks.check("adminNotes", string_length(0, NOTES_MAX)("Admin notes", text));
        checks.finish()?;
    }
    Ok(notes)
}
