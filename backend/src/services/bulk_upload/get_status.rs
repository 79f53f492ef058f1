use crate::job_controller::state::JobsState;
use crate::services::bulk_upload::error::ApiError;
use actix_web::{web, HttpResponse};

pub(crate) async fn process(
    job_id: web::Path<String>,
    state: web::Data<JobsState>,
) -> Result<HttpResponse, ApiError> {
    let jobs = state.jobs.read().await;
    match jobs.get(job_id.as_str()) {
        Some(status) => Ok(HttpResponse::Ok().json(status)),
        None => Err(ApiError::JobNotFound(job_id.into_inner())),
    }
}
