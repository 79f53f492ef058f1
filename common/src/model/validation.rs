use serde::{Deserialize, Serialize};
use std::fmt;

/// Row-level error classes. These are collected, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    MissingField,
    InvalidNumber,
    UnresolvedCategory,
    InvalidSku,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValidationErrorKind::MissingField => "missing_field",
            ValidationErrorKind::InvalidNumber => "invalid_number",
            ValidationErrorKind::UnresolvedCategory => "unresolved_category",
            ValidationErrorKind::InvalidSku => "invalid_sku",
        };
        f.write_str(label)
    }
}

/// A validation failure attributable to one row of the uploaded file.
///
/// `row` uses the same numbering as the spreadsheet the seller sees, so the
/// first data row is row 2. Several errors may point at the same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row: usize,
    pub field: String,
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(row: usize, field: &str, kind: ValidationErrorKind, message: String) -> Self {
        Self {
            row,
            field: field.to_string(),
            kind,
            message,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}, column '{}': {}", self.row, self.field, self.message)
    }
}
