use actix_web::{get, web, HttpResponse};
use palmistry_api_schema::v1::upload_stats::V1UploadStatsResponse;
use palmistry_image_store::{GetStatsRequest, ImageStoreTrait};

use crate::error::ApiError;
use crate::state::ApiState;

#[get("/api/upload")]
pub async fn v1_upload_stats(state: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    let stats = state
        .image_store
        .get_stats(GetStatsRequest {})
        .map_err(ApiError::Internal)?;

    Ok(HttpResponse::Ok().json(V1UploadStatsResponse {
        stored: stats.stored,
        total_bytes: stats.total_bytes,
    }))
}
