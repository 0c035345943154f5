// Request payload validation and field-level error reporting

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::model::{RoomRequest, StayRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

// Rejected before any search runs; never a per-contract outcome
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Validation failed: {}", describe(.errors))]
pub struct ValidationFailure {
    pub errors: Vec<FieldError>,
}

impl ValidationFailure {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, message)])
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ValidationErrors> for ValidationFailure {
    fn from(errors: ValidationErrors) -> Self {
        let mut flat = Vec::new();
        flatten_errors("", &errors, &mut flat);
        flat.sort_by(|a, b| a.field.cmp(&b.field));
        Self::new(flat)
    }
}

// Walks nested struct/list errors into `parent.child[index].field` paths
fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let field = camel_case(&field.to_string());
        let path = if prefix.is_empty() {
            field
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push(FieldError::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_errors(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

// Error paths use the wire (camelCase) field names
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

// Missing counts default to zero and fail the same range rule
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequestPayload {
    #[validate(required(message = "Check-in date is required"))]
    pub check_in_date: Option<NaiveDate>,

    #[serde(default)]
    #[validate(range(min = 1, message = "Number of nights must be greater than 0"))]
    pub number_of_nights: i64,

    #[serde(default)]
    #[validate(length(min = 1, message = "At least one room request is required"), nested)]
    pub room_requests: Vec<RoomRequestPayload>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequestPayload {
    #[serde(default)]
    #[validate(range(min = 1, message = "Number of rooms must be greater than 0"))]
    pub number_of_rooms: i64,

    #[serde(default)]
    #[validate(range(min = 1, message = "Number of adults must be greater than 0"))]
    pub number_of_adults: i64,
}

impl SearchRequestPayload {
    pub fn into_stay_request(self) -> Result<StayRequest, ValidationFailure> {
        self.validate()?;

        let check_in = self
            .check_in_date
            .ok_or_else(|| ValidationFailure::single("checkInDate", "Check-in date is required"))?;
        let nights = to_count(self.number_of_nights, "numberOfNights")?;

        let mut room_requests = Vec::with_capacity(self.room_requests.len());
        for (index, room) in self.room_requests.iter().enumerate() {
            room_requests.push(RoomRequest::new(
                to_count(room.number_of_rooms, &format!("roomRequests[{index}].numberOfRooms"))?,
                to_count(room.number_of_adults, &format!("roomRequests[{index}].numberOfAdults"))?,
            ));
        }

        StayRequest::new(check_in, nights, room_requests)
    }
}

fn to_count(value: i64, field: &str) -> Result<u32, ValidationFailure> {
    u32::try_from(value).map_err(|_| ValidationFailure::single(field, "Value is out of range"))
}

// Applied by the search service, which owns the notion of "today"
pub fn check_in_not_in_past(
    request: &StayRequest,
    today: NaiveDate,
) -> Result<(), ValidationFailure> {
    if request.check_in() < today {
        return Err(ValidationFailure::single(
            "checkInDate",
            "Check-in date must be today or in the future",
        ));
    }
    Ok(())
}
