use std::io::{Cursor, Read};

use actix_web::{http::header, post, web, HttpRequest, HttpResponse};
use log::{info, warn};
use multipart::server::Multipart;
use palmistry_api_schema::v1::upload::{V1UploadResponse, V1_UPLOAD_FIELD};
use palmistry_image_store::{ImageStoreTrait, PutImageRequest};

use crate::error::ApiError;
use crate::state::ApiState;

/// Used when the part carries no usable content type.
const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug)]
struct UploadedFile {
    file_name: Option<String>,
    content_type: String,
    data: Vec<u8>,
}

fn multipart_boundary(content_type: &str) -> Option<String> {
    let mime: mime::Mime = content_type.parse().ok()?;
    if mime.type_() != mime::MULTIPART {
        return None;
    }
    mime.get_param(mime::BOUNDARY)
        .map(|boundary| boundary.as_str().to_string())
}

fn read_file_field(req: &HttpRequest, body: &[u8]) -> Result<UploadedFile, ApiError> {
    let boundary = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(multipart_boundary)
        .ok_or(ApiError::NoFile)?;

    let mut multipart = Multipart::with_body(Cursor::new(body), boundary);
    loop {
        let entry = multipart.read_entry().map_err(|e| {
            warn!("malformed multipart body: {}", e);
            ApiError::NoFile
        })?;
        let Some(mut field) = entry else {
            return Err(ApiError::NoFile);
        };
        if &*field.headers.name != V1_UPLOAD_FIELD {
            continue;
        }

        let mut data = Vec::new();
        field.data.read_to_end(&mut data).map_err(|e| {
            warn!("failed to read multipart field: {}", e);
            ApiError::NoFile
        })?;
        if data.is_empty() {
            return Err(ApiError::NoFile);
        }

        let content_type = field
            .headers
            .content_type
            .as_ref()
            .filter(|m| **m != mime::APPLICATION_OCTET_STREAM)
            .map(|m| m.to_string())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        return Ok(UploadedFile {
            file_name: field.headers.filename.clone(),
            content_type,
            data,
        });
    }
}

#[post("/api/upload")]
pub async fn v1_upload(
    state: web::Data<ApiState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let file = read_file_field(&req, &body)?;
    let size = file.data.len();

    let res = state
        .image_store
        .put_image(PutImageRequest {
            data: file.data,
            content_type: file.content_type,
        })
        .map_err(ApiError::from_upload_error)?;

    info!(
        "uploaded {} as {} ({} bytes)",
        file.file_name.as_deref().unwrap_or("<unnamed>"),
        res.image_id,
        size
    );

    Ok(HttpResponse::Ok().json(V1UploadResponse {
        image_url: state.image_url(&req, &res.image_id),
    }))
}
