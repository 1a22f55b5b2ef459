use std::io::{Cursor, Read};

use multipart::client::lazy::Multipart;
use palmistry_api_schema::v1::{
    upload::{V1UploadResponse, V1_UPLOAD_FIELD},
    upload_stats::V1UploadStatsResponse,
};

use crate::{trim_base_url, ApiClientError};

/// Largest image body `v1_get_image` reads.
const MAX_IMAGE_READ_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Client of the upload proxy.
#[derive(Debug, Clone)]
pub struct PalmistryApiClient {
    pub base_url: String,
}

impl PalmistryApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: trim_base_url(base_url),
        }
    }

    pub fn v1_upload(
        &self,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<V1UploadResponse, ApiClientError> {
        let url = format!("{}/api/upload", self.base_url);

        let mut multipart = Multipart::new();
        multipart.add_stream(
            V1_UPLOAD_FIELD,
            Cursor::new(data),
            Some(file_name),
            content_type.parse::<mime::Mime>().ok(),
        );
        let prepared = multipart
            .prepare()
            .map_err(|e| ApiClientError::IO(Box::new(e.error)))?;
        let request_content_type = format!("multipart/form-data; boundary={}", prepared.boundary());

        let upload_res: V1UploadResponse = ureq::post(&url)
            .set("Content-Type", &request_content_type)
            .send(prepared)
            .map_err(|e| ApiClientError::Ureq(Box::new(e)))?
            .into_json()
            .map_err(|e| ApiClientError::IO(Box::new(e)))?;
        Ok(upload_res)
    }

    pub fn v1_upload_stats(&self) -> Result<V1UploadStatsResponse, ApiClientError> {
        let url = format!("{}/api/upload", self.base_url);
        let stats_res: V1UploadStatsResponse = ureq::get(&url)
            .call()
            .map_err(|e| ApiClientError::Ureq(Box::new(e)))?
            .into_json()
            .map_err(|e| ApiClientError::IO(Box::new(e)))?;
        Ok(stats_res)
    }

    /// Accepts the `imageUrl` returned by an upload or a bare image id.
    pub fn v1_get_image(&self, image_url_or_id: &str) -> Result<FetchedImage, ApiClientError> {
        let url = self.image_url(image_url_or_id);
        let res = ureq::get(&url)
            .call()
            .map_err(|e| ApiClientError::Ureq(Box::new(e)))?;
        let content_type = res.content_type().to_string();
        let mut data = Vec::new();
        res.into_reader()
            .take(MAX_IMAGE_READ_BYTES)
            .read_to_end(&mut data)
            .map_err(|e| ApiClientError::IO(Box::new(e)))?;
        Ok(FetchedImage { content_type, data })
    }

    fn image_url(&self, image_url_or_id: &str) -> String {
        if image_url_or_id.starts_with("http://") || image_url_or_id.starts_with("https://") {
            image_url_or_id.to_string()
        } else {
            format!("{}/api/image/{}", self.base_url, image_url_or_id)
        }
    }
}
