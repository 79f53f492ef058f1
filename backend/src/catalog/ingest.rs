//! Turns an uploaded CSV / XLSX / XLS file into [`ParsedProductRow`]s.
//!
//! The whole file is read eagerly; the row cap keeps that bounded. Parsing has
//! no side effects, so a rejected file can simply be uploaded again.
//!
//! Row numbers are the line (CSV) or sheet row (Excel) the seller sees, so
//! they stay right across blank lines and multi-line quoted cells.

use crate::catalog::fields::ProductField;
use calamine::{open_workbook_auto_from_rs, Reader};
use common::model::product::ParsedProductRow;
use log::{debug, info};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

const XLSX_MAGIC: &[u8] = b"PK\x03\x04";
const XLS_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// File-level failures. Any of these rejects the upload as a whole.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file '{0}': upload a .csv, .xlsx or .xls file")]
    UnsupportedFormat(String),
    #[error("the file contains no product rows below the header")]
    EmptyFile,
    #[error("the file contains {found} product rows, at most {limit} are allowed per upload")]
    RowLimitExceeded { limit: usize, found: usize },
    #[error("could not read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    /// Picks the format from the extension, or from the leading bytes when the
    /// name carries no known extension.
    pub fn detect(file_name: &str, bytes: &[u8]) -> Result<Self, IngestError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("xlsx") => Ok(FileFormat::Xlsx),
            Some("xls") => Ok(FileFormat::Xls),
            _ if bytes.starts_with(XLSX_MAGIC) => Ok(FileFormat::Xlsx),
            _ if bytes.starts_with(XLS_MAGIC) => Ok(FileFormat::Xls),
            _ => Err(IngestError::UnsupportedFormat(file_name.to_string())),
        }
    }
}

/// Cells of one record with the 1-based line it starts on.
type Table = Vec<(usize, Vec<String>)>;

/// Result of reading one file.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ParsedFile {
    pub file_name: String,
    pub format: FileFormat,
    /// Header cells that did not map to a product column (or repeated one).
    pub ignored_columns: Vec<String>,
    pub rows: Vec<ParsedProductRow>,
}

pub fn parse_file(file_name: &str, bytes: &[u8], max_rows: usize) -> Result<ParsedFile, IngestError> {
    let format = FileFormat::detect(file_name, bytes)?;
    let table = match format {
        FileFormat::Csv => read_csv_table(bytes)?,
        FileFormat::Xlsx | FileFormat::Xls => read_spreadsheet_table(bytes)?,
    };

    let mut table = table.into_iter();
    let headers: Vec<String> = match table.next() {
        Some((_, h)) if h.iter().any(|c| !c.trim().is_empty()) => {
            h.iter().map(|c| normalize_cell(c)).collect()
        }
        _ => return Err(IngestError::EmptyFile),
    };

    let mut columns: HashMap<ProductField, usize> = HashMap::new();
    let mut ignored_columns = Vec::new();
    for (idx, header) in headers.into_iter().enumerate() {
        match ProductField::from_header(&header) {
            Some(field) if !columns.contains_key(&field) => {
                columns.insert(field, idx);
            }
            _ => {
                debug!("ignoring column '{}' in '{}'", header, file_name);
                ignored_columns.push(header);
            }
        }
    }

    let mut rows = Vec::new();
    for (line, cells) in table {
        if cells.iter().all(|c| c.trim().is_empty()) {
            debug!("skipping blank row {} in '{}'", line, file_name);
            continue;
        }
        rows.push(build_row(line, &cells, &columns));
    }

    if rows.is_empty() {
        return Err(IngestError::EmptyFile);
    }
    if rows.len() > max_rows {
        return Err(IngestError::RowLimitExceeded {
            limit: max_rows,
            found: rows.len(),
        });
    }

    info!(
        "parsed {} product rows from '{}' ({:?})",
        rows.len(),
        file_name,
        format
    );

    Ok(ParsedFile {
        file_name: file_name.to_string(),
        format,
        ignored_columns,
        rows,
    })
}

fn build_row(
    row_number: usize,
    cells: &[String],
    columns: &HashMap<ProductField, usize>,
) -> ParsedProductRow {
    let text = |field: ProductField| -> String {
        columns
            .get(&field)
            .and_then(|&idx| cells.get(idx))
            .map(|c| normalize_cell(c))
            .unwrap_or_default()
    };
    let optional = |field: ProductField| -> Option<String> { Some(text(field)).filter(|v| !v.is_empty()) };

    ParsedProductRow {
        row_number,
        title: text(ProductField::Title),
        sku: optional(ProductField::Sku),
        category: text(ProductField::Category),
        brand: optional(ProductField::Brand),
        price: text(ProductField::Price),
        discount_price: optional(ProductField::DiscountPrice),
        stock_quantity: text(ProductField::StockQuantity),
        description: optional(ProductField::Description),
        image_urls: optional(ProductField::ImageUrls),
        size: optional(ProductField::Size),
        color: optional(ProductField::Color),
    }
}

fn normalize_cell(cell: &str) -> String {
    cell.replace('\u{00A0}', " ").trim().to_string()
}

/// Picks whichever of `,` `;` `\t` `|` occurs most in the header line.
pub fn detect_delimiter(header_line: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .iter()
        .copied()
        .max_by_key(|&d| header_line.matches(d as char).count())
        .filter(|&d| header_line.contains(d as char))
        .unwrap_or(b',')
}

fn read_csv_table(bytes: &[u8]) -> Result<Table, IngestError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let first_line = bytes.split(|&b| b == b'\n').next().unwrap_or_default();
    let delimiter = detect_delimiter(&String::from_utf8_lossy(first_line));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut table = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map_or(index + 1, |p| p.line() as usize);
        table.push((line, record.iter().map(str::to_string).collect()));
    }
    Ok(table)
}

fn read_spreadsheet_table(bytes: &[u8]) -> Result<Table, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Err(IngestError::EmptyFile),
    };
    // the range starts at the first used cell, not necessarily row 1
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    Ok(range
        .rows()
        .enumerate()
        .map(|(i, row)| {
            (
                first_row + i + 1,
                row.iter().map(|cell| cell.to_string()).collect(),
            )
        })
        .collect())
}
