//! Template downloads. Generated on request from the static column list and
//! the injected category table.

use crate::catalog::category::CategoryTable;
use crate::catalog::template;
use crate::config::Config;
use crate::services::bulk_upload::error::ApiError;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn attachment(file_name: &str) -> ContentDisposition {
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(file_name.to_string())],
    }
}

pub(crate) async fn csv_template() -> Result<HttpResponse, ApiError> {
    let bytes = template::csv_template().map_err(ApiError::internal)?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(attachment("fanzon_bulk_upload_template.csv"))
        .body(bytes))
}

pub(crate) async fn xlsx_template(
    categories: web::Data<CategoryTable>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let table = categories.get_ref().clone();
    let max_rows = config.max_rows;
    let bytes = web::block(move || template::xlsx_template(&table, max_rows))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;
    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header(attachment("fanzon_bulk_upload_template.xlsx"))
        .body(bytes))
}

pub(crate) async fn instructions(
    categories: web::Data<CategoryTable>,
    config: web::Data<Config>,
) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header(attachment("fanzon_bulk_upload_instructions.txt"))
        .body(template::instructions(&categories, config.max_rows))
}

pub(crate) async fn categories(
    categories: web::Data<CategoryTable>,
) -> Result<HttpResponse, ApiError> {
    let bytes = template::category_reference_csv(&categories).map_err(ApiError::internal)?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(attachment("fanzon_categories.csv"))
        .body(bytes))
}
