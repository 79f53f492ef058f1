//! Downloadable templates: CSV and XLSX product sheets, a plain-text
//! instructions document and the category reference table.
//!
//! Everything here is derived from [`ProductField::ALL`], [`EXAMPLE_ROWS`] and
//! the injected [`CategoryTable`]; the example rows are kept valid against the
//! standard table so a seller can upload the template untouched.

use crate::catalog::category::CategoryTable;
use crate::catalog::fields::ProductField;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

/// Example products, one value per [`ProductField::ALL`] column.
pub const EXAMPLE_ROWS: [[&str; 11]; 3] = [
    [
        "Wireless Bluetooth Headphones",
        "ELEC-WBH-001",
        "1",
        "SoundMax",
        "2499",
        "1999",
        "50",
        "Over-ear headphones with 30 hour battery life",
        "https://cdn.fanzon.example/img/wbh-001-front.jpg|https://cdn.fanzon.example/img/wbh-001-side.jpg",
        "",
        "Black",
    ],
    [
        "Cotton Casual T-Shirt",
        "FASH-TS-002",
        "Fashion",
        "UrbanWear",
        "799",
        "",
        "120",
        "Regular fit, 100% cotton",
        "https://cdn.fanzon.example/img/ts-002.jpg",
        "M",
        "Navy Blue",
    ],
    [
        "Non-Stick Frying Pan 28cm",
        "HOME-FP-003",
        "3",
        "ChefPro",
        "1299.50",
        "999",
        "35",
        "",
        "",
        "28cm",
        "",
    ],
];

fn is_numeric_column(field: ProductField) -> bool {
    matches!(
        field,
        ProductField::Price | ProductField::DiscountPrice | ProductField::StockQuantity
    )
}

pub fn csv_template() -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(ProductField::ALL.iter().map(|f| f.header()))?;
    for row in EXAMPLE_ROWS {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

pub fn category_reference_csv(categories: &CategoryTable) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["id", "name", "examples"])?;
    for category in categories.entries() {
        writer.write_record([&category.code, &category.name, &category.examples])?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Workbook with `Products`, `Categories` and `Instructions` sheets. The
/// products sheet comes first so it is the one read back on upload.
pub fn xlsx_template(categories: &CategoryTable, max_rows: usize) -> Result<Vec<u8>, XlsxError> {
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();

    let mut products = Worksheet::new();
    products.set_name("Products")?;
    for (col, field) in ProductField::ALL.iter().enumerate() {
        let col = col as u16;
        products.write_string_with_format(0, col, field.header(), &bold)?;
        products.set_column_width(col, 22)?;
    }
    for (row_idx, row) in EXAMPLE_ROWS.iter().enumerate() {
        let excel_row = row_idx as u32 + 1;
        for (col, (field, value)) in ProductField::ALL.iter().zip(row.iter()).enumerate() {
            let col = col as u16;
            if value.is_empty() {
                continue;
            }
            match value.parse::<f64>() {
                Ok(number) if is_numeric_column(*field) => {
                    products.write_number(excel_row, col, number)?;
                }
                _ => {
                    products.write_string(excel_row, col, *value)?;
                }
            }
        }
    }
    workbook.push_worksheet(products);

    let mut reference = Worksheet::new();
    reference.set_name("Categories")?;
    for (col, header) in ["id", "name", "examples"].iter().enumerate() {
        reference.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    reference.set_column_width(1, 30)?;
    reference.set_column_width(2, 70)?;
    for (row_idx, category) in categories.entries().iter().enumerate() {
        let excel_row = row_idx as u32 + 1;
        reference.write_string(excel_row, 0, category.code.as_str())?;
        reference.write_string(excel_row, 1, category.name.as_str())?;
        reference.write_string(excel_row, 2, category.examples.as_str())?;
    }
    workbook.push_worksheet(reference);

    let mut instructions_sheet = Worksheet::new();
    instructions_sheet.set_name("Instructions")?;
    instructions_sheet.set_column_width(0, 110)?;
    for (row_idx, line) in instructions(categories, max_rows).lines().enumerate() {
        if !line.is_empty() {
            instructions_sheet.write_string(row_idx as u32, 0, line)?;
        }
    }
    workbook.push_worksheet(instructions_sheet);

    workbook.save_to_buffer()
}

/// Plain-text guide shipped next to the templates. `max_rows` is the row cap
/// the server enforces.
pub fn instructions(categories: &CategoryTable, max_rows: usize) -> String {
    let mut text = String::new();
    text.push_str("FANZON BULK PRODUCT UPLOAD\n");
    text.push_str("==========================\n\n");
    text.push_str("1. Download the CSV or Excel template.\n");
    text.push_str("2. Keep the header row and replace the example rows with your products.\n");
    text.push_str("3. Upload the file. Every row is checked and all problems are listed at once.\n");
    text.push_str("4. Fix the listed rows (or upload a corrected file) until no errors remain, then submit.\n\n");
    text.push_str(&format!(
        "Accepted formats: .csv (UTF-8), .xlsx, .xls. At most {} products per file.\n\n",
        max_rows
    ));

    text.push_str("COLUMNS\n-------\n");
    for field in ProductField::ALL {
        let requirement = if field.required() { "required" } else { "optional" };
        text.push_str(&format!(
            "{:<16} {:<9} {}\n",
            field.header(),
            requirement,
            field.description()
        ));
    }

    text.push_str("\nCATEGORIES\n----------\n");
    text.push_str("Use the id, the exact name, or a close match such as one of the examples.\n");
    for category in categories.entries() {
        text.push_str(&format!(
            "{:>3}  {:<28} e.g. {}\n",
            category.code, category.name, category.examples
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ingest::parse_file;
    use crate::catalog::validate::validate_rows;
    use crate::config::DEFAULT_MAX_ROWS;

    #[test]
    fn csv_template_validates_cleanly() {
        let table = CategoryTable::standard();
        let bytes = csv_template().unwrap();
        let parsed = parse_file("fanzon_template.csv", &bytes, DEFAULT_MAX_ROWS).unwrap();
        assert_eq!(parsed.rows.len(), EXAMPLE_ROWS.len());
        assert!(parsed.ignored_columns.is_empty());

        let report = validate_rows(parsed.rows, &table);
        assert!(report.is_clean(), "{:?}", report.errors);
        assert_eq!(report.products.len(), EXAMPLE_ROWS.len());
    }

    #[test]
    fn xlsx_template_validates_cleanly() {
        let table = CategoryTable::standard();
        let bytes = xlsx_template(&table, DEFAULT_MAX_ROWS).unwrap();
        let parsed = parse_file("fanzon_template.xlsx", &bytes, DEFAULT_MAX_ROWS).unwrap();
        assert_eq!(parsed.rows.len(), EXAMPLE_ROWS.len());
        assert_eq!(parsed.rows[0].price, "2499");

        let report = validate_rows(parsed.rows, &table);
        assert!(report.is_clean(), "{:?}", report.errors);
        assert_eq!(report.products[2].price, 1299.5);
    }

    #[test]
    fn instructions_cover_every_column_and_category() {
        let table = CategoryTable::standard();
        let text = instructions(&table, 250);
        assert!(text.contains("At most 250 products per file."));
        for field in ProductField::ALL {
            assert!(text.contains(field.header()));
        }
        for category in table.entries() {
            assert!(text.contains(&category.name));
        }
    }

    #[test]
    fn category_reference_lists_the_table() {
        let table = CategoryTable::standard();
        let bytes = category_reference_csv(&table).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), table.entries().len() + 1);
        assert!(text.starts_with("id,name,examples"));
    }
}
