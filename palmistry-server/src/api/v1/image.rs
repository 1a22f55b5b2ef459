use actix_web::{get, http::header, web, HttpResponse};
use palmistry_common::sha256::calc_sha256_from_slice;
use palmistry_image_store::{GetImageRequest, GetImageResponse, ImageStoreTrait};

use crate::error::ApiError;
use crate::state::ApiState;

#[get("/api/image/{image_id}")]
pub async fn v1_get_image(
    state: web::Data<ApiState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let request = GetImageRequest {
        image_id: path.into_inner(),
    };

    let res = state
        .image_store
        .get_image(request)
        .map_err(ApiError::Internal)?;

    match res {
        GetImageResponse::Found {
            data, content_type, ..
        } => Ok(HttpResponse::Ok()
            .content_type(content_type)
            .insert_header((header::CACHE_CONTROL, "no-store, max-age=0"))
            .insert_header((header::ETAG, format!("\"{}\"", calc_sha256_from_slice(&data))))
            .body(data)),
        GetImageResponse::NotFound => Err(ApiError::ImageNotFound),
    }
}
