use serde::{Deserialize, Serialize};

/// One entry of the category reference table bundled with the bulk upload
/// validator.
///
/// Sellers may fill the `Category_ID` column with the `code`, the `name`, or a
/// close-enough free-text value that the resolver matches against `name` and
/// `examples`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMapping {
    /// Short identifier sellers type into the sheet (e.g. `"1"`).
    pub code: String,
    /// Canonical category name stored with the product.
    pub name: String,
    /// Comma-separated example product kinds, shown in the template and used
    /// for fuzzy matching.
    pub examples: String,
}

impl CategoryMapping {
    pub fn new(code: &str, name: &str, examples: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            examples: examples.to_string(),
        }
    }
}

/// The category a validated product was resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub code: String,
    pub name: String,
}

impl From<&CategoryMapping> for CategoryRef {
    fn from(mapping: &CategoryMapping) -> Self {
        Self {
            code: mapping.code.clone(),
            name: mapping.name.clone(),
        }
    }
}
