use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use palmistry_api_schema::v1::error::V1ErrorResponse;
use palmistry_image_store::ImageStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No file provided")]
    NoFile,

    #[error("Image not found")]
    ImageNotFound,

    #[error("Image is {size} bytes, limit is {limit} bytes")]
    ImageTooLarge { size: u64, limit: u64 },

    #[error("Upload failed")]
    UploadFailed(#[source] ImageStoreError),

    #[error("Internal error")]
    Internal(#[source] ImageStoreError),
}

impl ApiError {
    pub fn from_upload_error(e: ImageStoreError) -> Self {
        match e {
            ImageStoreError::EmptyImage => ApiError::NoFile,
            ImageStoreError::ImageTooLarge { size, limit } => ApiError::ImageTooLarge { size, limit },
            e => ApiError::UploadFailed(e),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoFile => StatusCode::BAD_REQUEST,
            ApiError::ImageNotFound => StatusCode::NOT_FOUND,
            ApiError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UploadFailed(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::UploadFailed(e) => error!("upload error: {}", e),
            ApiError::Internal(e) => error!("internal error: {}", e),
            _ => {}
        }
        HttpResponse::build(self.status_code()).json(V1ErrorResponse {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_error_mapping() {
        assert!(matches!(
            ApiError::from_upload_error(ImageStoreError::EmptyImage),
            ApiError::NoFile
        ));
        let too_large = ApiError::from_upload_error(ImageStoreError::ImageTooLarge {
            size: 11,
            limit: 10,
        });
        assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        let io = ApiError::from_upload_error(ImageStoreError::IOError(std::io::Error::other(
            "disk full",
        )));
        assert_eq!(io.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(io.to_string(), "Upload failed");
    }
}
