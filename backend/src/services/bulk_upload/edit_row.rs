use crate::catalog::category::CategoryTable;
use crate::job_controller::state::UploadsState;
use crate::services::bulk_upload::error::ApiError;
use crate::services::bulk_upload::session::{find_session, revalidate};
use actix_web::{web, HttpResponse};
use common::model::product::ParsedProductRow;

/// `PUT /api/bulk_upload/{upload_id}/rows/{row_number}`
///
/// Replaces one row with the edited values and validates the upload again.
/// The row number in the path wins over the one in the body.
pub(crate) async fn process(
    path: web::Path<(String, usize)>,
    row: web::Json<ParsedProductRow>,
    categories: web::Data<CategoryTable>,
    uploads: web::Data<UploadsState>,
) -> Result<HttpResponse, ApiError> {
    let (upload_id, row_number) = path.into_inner();
    let mut row = row.into_inner();
    row.row_number = row_number;

    {
        let mut sessions = uploads.sessions.write().await;
        find_session(&mut sessions, &upload_id, None)?
            .state
            .edit_row(row)?;
    }

    let view = revalidate(&uploads, &categories, &upload_id).await?;
    Ok(HttpResponse::Ok().json(view))
}
