use crate::model::category::CategoryRef;
use serde::{Deserialize, Serialize};

/// A single product row as it was read from the uploaded spreadsheet.
///
/// Every cell arrives as text. Required columns are kept as (possibly empty)
/// strings so the validator can report them as missing; optional columns are
/// `None` when the cell was blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedProductRow {
    /// Line of the row in the uploaded file: data row index + 2 (1-based
    /// numbering plus the header row).
    pub row_number: usize,
    pub title: String,
    pub sku: Option<String>,
    /// Raw category value: a code, a name or free text.
    pub category: String,
    pub brand: Option<String>,
    pub price: String,
    pub discount_price: Option<String>,
    pub stock_quantity: String,
    pub description: Option<String>,
    /// Image URLs separated by `|`, `,` or `;`.
    pub image_urls: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// A row that passed every validation rule, with its values converted to
/// their target types. Only these are handed to the product store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedProduct {
    pub row_number: usize,
    pub title: String,
    pub sku: Option<String>,
    pub category: CategoryRef,
    pub brand: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub stock_quantity: u32,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}
