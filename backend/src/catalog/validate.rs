//! Per-row validation.
//!
//! Every rule of every row is evaluated and all problems are returned
//! together, so the seller can fix the whole sheet in one pass. Rows are
//! independent of each other, which lets [`validate_rows`] fan out over rayon.

use crate::catalog::category::CategoryTable;
use crate::catalog::fields::{
    check_sku, parse_optional_price, parse_price, parse_stock, split_image_urls, FieldIssue,
    ProductField,
};
use common::model::category::CategoryRef;
use common::model::product::{ParsedProductRow, ValidatedProduct};
use common::model::validation::{ValidationError, ValidationErrorKind};
use rayon::prelude::*;
use serde::Serialize;

/// Rows paired with every error found in them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub rows: Vec<ParsedProductRow>,
    pub errors: Vec<ValidationError>,
    /// Typed products, filled only when `errors` is empty.
    #[serde(skip)]
    pub products: Vec<ValidatedProduct>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_rows(rows: Vec<ParsedProductRow>, categories: &CategoryTable) -> ValidationReport {
    let outcomes: Vec<Result<ValidatedProduct, Vec<ValidationError>>> = rows
        .par_iter()
        .map(|row| validate_row(row, categories))
        .collect();

    let mut errors = Vec::new();
    let mut products = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(product) => products.push(product),
            Err(row_errors) => errors.extend(row_errors),
        }
    }
    if !errors.is_empty() {
        products.clear();
    }

    ValidationReport {
        rows,
        errors,
        products,
    }
}

/// Checks one row. Identical input always gives identical output.
pub fn validate_row(
    row: &ParsedProductRow,
    categories: &CategoryTable,
) -> Result<ValidatedProduct, Vec<ValidationError>> {
    let line = row.row_number;
    let mut errors = Vec::new();
    let mut reject = |field: ProductField, issue: FieldIssue| {
        errors.push(ValidationError::new(line, field.name(), issue.kind, issue.message));
    };

    let title = row.title.trim();
    if title.is_empty() {
        reject(ProductField::Title, missing(ProductField::Title));
    }

    let category = if row.category.trim().is_empty() {
        reject(ProductField::Category, missing(ProductField::Category));
        None
    } else {
        let resolved = categories.resolve(&row.category);
        if resolved.is_none() {
            reject(
                ProductField::Category,
                FieldIssue {
                    kind: ValidationErrorKind::UnresolvedCategory,
                    message: format!(
                        "category '{}' is not recognised; use a code or name from the category reference",
                        row.category.trim()
                    ),
                },
            );
        }
        resolved
    };

    let price = if row.price.trim().is_empty() {
        reject(ProductField::Price, missing(ProductField::Price));
        None
    } else {
        parse_price(&row.price)
            .map_err(|issue| reject(ProductField::Price, issue))
            .ok()
    };

    let discount_price = parse_optional_price(row.discount_price.as_deref(), price)
        .map_err(|issue| reject(ProductField::DiscountPrice, issue))
        .ok()
        .flatten();

    let stock = if row.stock_quantity.trim().is_empty() {
        reject(ProductField::StockQuantity, missing(ProductField::StockQuantity));
        None
    } else {
        parse_stock(&row.stock_quantity)
            .map_err(|issue| reject(ProductField::StockQuantity, issue))
            .ok()
    };

    let sku = clean(row.sku.as_deref());
    if let Some(sku) = &sku {
        if let Err(issue) = check_sku(sku) {
            reject(ProductField::Sku, issue);
        }
    }

    match (category, price, stock) {
        (Some(category), Some(price), Some(stock_quantity)) if errors.is_empty() => {
            Ok(ValidatedProduct {
                row_number: line,
                title: title.to_string(),
                sku,
                category: CategoryRef::from(category),
                brand: clean(row.brand.as_deref()),
                price,
                discount_price,
                stock_quantity,
                description: clean(row.description.as_deref()),
                image_urls: split_image_urls(row.image_urls.as_deref()),
                size: clean(row.size.as_deref()),
                color: clean(row.color.as_deref()),
            })
        }
        _ => Err(errors),
    }
}

fn missing(field: ProductField) -> FieldIssue {
    FieldIssue {
        kind: ValidationErrorKind::MissingField,
        message: format!("{} is required", field.header()),
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ingest::parse_file;

    fn valid_row(row_number: usize) -> ParsedProductRow {
        ParsedProductRow {
            row_number,
            title: "Wireless Mouse".to_string(),
            sku: Some("MOUSE-01".to_string()),
            category: "Electronics".to_string(),
            price: "1200".to_string(),
            discount_price: Some("999".to_string()),
            stock_quantity: "15".to_string(),
            image_urls: Some("https://cdn.example.com/m1.jpg|https://cdn.example.com/m2.jpg".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_row_has_no_errors() {
        let product = validate_row(&valid_row(2), &CategoryTable::standard()).unwrap();
        assert_eq!(product.category.code, "1");
        assert_eq!(product.price, 1200.0);
        assert_eq!(product.discount_price, Some(999.0));
        assert_eq!(product.stock_quantity, 15);
        assert_eq!(product.image_urls.len(), 2);
    }

    #[test]
    fn each_missing_required_field_is_reported_once() {
        let table = CategoryTable::standard();
        let blank = |row: &mut ParsedProductRow, field: ProductField| match field {
            ProductField::Title => row.title.clear(),
            ProductField::Category => row.category.clear(),
            ProductField::Price => row.price.clear(),
            ProductField::StockQuantity => row.stock_quantity.clear(),
            _ => unreachable!(),
        };

        for (index, field) in ProductField::ALL.into_iter().filter(|f| f.required()).enumerate() {
            let mut row = valid_row(index + 2);
            row.discount_price = None;
            blank(&mut row, field);

            let errors = validate_row(&row, &table).unwrap_err();
            assert_eq!(errors.len(), 1, "{:?}", errors);
            assert_eq!(errors[0].kind, ValidationErrorKind::MissingField);
            assert_eq!(errors[0].field, field.name());
            assert_eq!(errors[0].row, index + 2);
        }
    }

    #[test]
    fn discount_above_price_is_one_error() {
        let mut row = valid_row(7);
        row.discount_price = Some("1500".to_string());
        let errors = validate_row(&row, &CategoryTable::standard()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "discount_price");
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidNumber);
        assert_eq!(errors[0].row, 7);
    }

    #[test]
    fn all_problems_in_a_row_are_collected() {
        let row = ParsedProductRow {
            row_number: 5,
            title: "Thing".to_string(),
            sku: Some("bad sku!".to_string()),
            category: "Spaceships".to_string(),
            price: "free".to_string(),
            stock_quantity: "-1".to_string(),
            ..Default::default()
        };
        let errors = validate_row(&row, &CategoryTable::standard()).unwrap_err();
        let mut fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        fields.sort();
        assert_eq!(fields, vec!["category", "price", "sku", "stock_quantity"]);
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::UnresolvedCategory
            && e.message.contains("Spaceships")));
        assert!(errors.iter().any(|e| e.kind == ValidationErrorKind::InvalidSku));
    }

    #[test]
    fn validation_is_deterministic() {
        let mut row = valid_row(3);
        row.price = "-2".to_string();
        let table = CategoryTable::standard();
        assert_eq!(validate_row(&row, &table), validate_row(&row, &table));
    }

    #[test]
    fn three_row_file_reports_exactly_the_broken_cells() {
        let text = "Product_Name,SKU,Category_ID,Base_Price,Stock\n\
                    Desk Lamp,LAMP-1,3,25.00,10\n\
                    ,MUG-2,Home & Kitchen,8.50,4\n\
                    Yoga Mat,MAT-3,5,19.99,-5\n";
        let parsed = parse_file("products.csv", text.as_bytes(), 1000).unwrap();
        let report = validate_rows(parsed.rows, &CategoryTable::standard());

        assert!(!report.is_clean());
        assert!(report.products.is_empty());
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().all(|e| e.row != 2));

        assert_eq!(report.errors[0].row, 3);
        assert_eq!(report.errors[0].field, "title");
        assert_eq!(report.errors[0].kind, ValidationErrorKind::MissingField);
        assert_eq!(report.errors[1].row, 4);
        assert_eq!(report.errors[1].field, "stock_quantity");
        assert_eq!(report.errors[1].kind, ValidationErrorKind::InvalidNumber);
    }

    #[test]
    fn clean_report_keeps_products_in_file_order() {
        let rows: Vec<ParsedProductRow> = (2..40).map(valid_row).collect();
        let report = validate_rows(rows, &CategoryTable::standard());
        assert!(report.is_clean());
        let numbers: Vec<usize> = report.products.iter().map(|p| p.row_number).collect();
        assert_eq!(numbers, (2..40).collect::<Vec<_>>());
    }
}
