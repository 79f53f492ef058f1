//! Column definitions and the per-type cell parsers used by the validator.
//!
//! Parsers return `Result` with a [`FieldIssue`] instead of failing hard, so
//! the validator can keep evaluating every rule of a row.

use common::model::validation::ValidationErrorKind;
use regex::Regex;
use std::sync::OnceLock;

/// A column of the bulk upload sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductField {
    Title,
    Sku,
    Category,
    Brand,
    Price,
    DiscountPrice,
    StockQuantity,
    Description,
    ImageUrls,
    Size,
    Color,
}

impl ProductField {
    /// Columns in template order.
    pub const ALL: [ProductField; 11] = [
        ProductField::Title,
        ProductField::Sku,
        ProductField::Category,
        ProductField::Brand,
        ProductField::Price,
        ProductField::DiscountPrice,
        ProductField::StockQuantity,
        ProductField::Description,
        ProductField::ImageUrls,
        ProductField::Size,
        ProductField::Color,
    ];

    /// Header written to the templates.
    pub fn header(&self) -> &'static str {
        match self {
            ProductField::Title => "Product_Name",
            ProductField::Sku => "SKU",
            ProductField::Category => "Category_ID",
            ProductField::Brand => "Brand",
            ProductField::Price => "Base_Price",
            ProductField::DiscountPrice => "Discount_Price",
            ProductField::StockQuantity => "Stock",
            ProductField::Description => "Description",
            ProductField::ImageUrls => "Image_URLs",
            ProductField::Size => "Size",
            ProductField::Color => "Color",
        }
    }

    /// Field name used in validation errors.
    pub fn name(&self) -> &'static str {
        match self {
            ProductField::Title => "title",
            ProductField::Sku => "sku",
            ProductField::Category => "category",
            ProductField::Brand => "brand",
            ProductField::Price => "price",
            ProductField::DiscountPrice => "discount_price",
            ProductField::StockQuantity => "stock_quantity",
            ProductField::Description => "description",
            ProductField::ImageUrls => "image_urls",
            ProductField::Size => "size",
            ProductField::Color => "color",
        }
    }

    pub fn required(&self) -> bool {
        matches!(
            self,
            ProductField::Title
                | ProductField::Category
                | ProductField::Price
                | ProductField::StockQuantity
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProductField::Title => "Product title as shown to customers",
            ProductField::Sku => "Your stock keeping unit; letters, digits, '-' and '_' only",
            ProductField::Category => "Category code, name or a close match (see the category reference)",
            ProductField::Brand => "Brand name",
            ProductField::Price => "Selling price, a number greater than 0",
            ProductField::DiscountPrice => "Sale price, not higher than Base_Price",
            ProductField::StockQuantity => "Units in stock, a whole number of 0 or more",
            ProductField::Description => "Long product description",
            ProductField::ImageUrls => "Image links separated by '|'",
            ProductField::Size => "Variant size (e.g. M, 42, 1L)",
            ProductField::Color => "Variant colour",
        }
    }

    /// Maps a header cell to a column. Case, spaces, underscores and hyphens
    /// are ignored and common aliases are accepted.
    pub fn from_header(header: &str) -> Option<ProductField> {
        let key: String = header
            .trim()
            .trim_start_matches('\u{FEFF}')
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        let field = match key.as_str() {
            "productname" | "title" | "name" | "producttitle" => ProductField::Title,
            "sku" | "productsku" => ProductField::Sku,
            "categoryid" | "category" | "categorycode" => ProductField::Category,
            "brand" => ProductField::Brand,
            "baseprice" | "price" => ProductField::Price,
            "discountprice" | "saleprice" | "discount" => ProductField::DiscountPrice,
            "stock" | "stockquantity" | "quantity" | "qty" => ProductField::StockQuantity,
            "description" => ProductField::Description,
            "imageurls" | "imageurl" | "images" => ProductField::ImageUrls,
            "size" => ProductField::Size,
            "color" | "colour" => ProductField::Color,
            _ => return None,
        };
        Some(field)
    }
}

/// Why a single cell was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl FieldIssue {
    fn invalid_number(message: String) -> Self {
        Self {
            kind: ValidationErrorKind::InvalidNumber,
            message,
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Price must be a number strictly greater than zero.
pub fn parse_price(raw: &str) -> Result<f64, FieldIssue> {
    match parse_number(raw) {
        Some(v) if v > 0.0 => Ok(v),
        Some(_) => Err(FieldIssue::invalid_number(format!(
            "price must be greater than 0, got '{}'",
            raw.trim()
        ))),
        None => Err(FieldIssue::invalid_number(format!(
            "'{}' is not a valid price",
            raw.trim()
        ))),
    }
}

/// Discount price is optional; when present it must be a non-negative number
/// no higher than `price` (if the price itself is known).
pub fn parse_optional_price(raw: Option<&str>, price: Option<f64>) -> Result<Option<f64>, FieldIssue> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    let value = match parse_number(raw) {
        Some(v) if v >= 0.0 => v,
        _ => {
            return Err(FieldIssue::invalid_number(format!(
                "'{}' is not a valid discount price",
                raw
            )))
        }
    };
    match price {
        Some(p) if value > p => Err(FieldIssue::invalid_number(format!(
            "discount price {} is higher than price {}",
            raw, p
        ))),
        _ => Ok(Some(value)),
    }
}

/// Stock must be a whole number, zero or more.
pub fn parse_stock(raw: &str) -> Result<u32, FieldIssue> {
    let raw = raw.trim();
    raw.parse::<u32>().map_err(|_| {
        let message = if raw.parse::<i64>().is_ok_and(|v| v < 0) {
            format!("stock quantity cannot be negative, got '{}'", raw)
        } else {
            format!("'{}' is not a whole number", raw)
        };
        FieldIssue::invalid_number(message)
    })
}

fn sku_pattern() -> &'static Regex {
    static SKU_RE: OnceLock<Regex> = OnceLock::new();
    SKU_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static SKU pattern"))
}

pub fn check_sku(raw: &str) -> Result<(), FieldIssue> {
    if sku_pattern().is_match(raw.trim()) {
        Ok(())
    } else {
        Err(FieldIssue {
            kind: ValidationErrorKind::InvalidSku,
            message: format!(
                "SKU '{}' may only contain letters, digits, '-' and '_'",
                raw.trim()
            ),
        })
    }
}

/// Splits the image column on `|`, `,` or `;`.
pub fn split_image_urls(raw: Option<&str>) -> Vec<String> {
    raw.map(|r| {
        r.split(['|', ',', ';'])
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
