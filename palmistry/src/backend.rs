use log::warn;
use palmistry_api_client::{analysis::AnalysisApiClient, upload::PalmistryApiClient, ApiClientError};
use palmistry_api_schema::analyze::{AnalyzeRequest, AnalyzeResponse};
use palmistry_page::{error::PageError, session::AnalysisBackend, state::SelectedImage};

/// [`AnalysisBackend`] over the blocking HTTP clients.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    pub upload_client: PalmistryApiClient,
    pub analysis_client: AnalysisApiClient,
}

impl AnalysisBackend for HttpBackend {
    fn upload(&self, image: &SelectedImage) -> Result<String, PageError> {
        let upload_res = self
            .upload_client
            .v1_upload(&image.file_name, &image.content_type, &image.data)
            .map_err(|e| {
                warn!("upload to {} failed: {}", self.upload_client.base_url, e);
                page_error(e, |_| PageError::UploadFailed)
            })?;
        Ok(upload_res.image_url)
    }

    fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse, PageError> {
        self.analysis_client.analyze(request).map_err(|e| {
            warn!("analysis at {} failed: {}", self.analysis_client.base_url, e);
            page_error(e, |status| PageError::AnalysisFailed { status })
        })
    }
}

/// Non-OK statuses go through `on_status`; transport failures keep their
/// message; unreadable bodies are `InvalidResponse`.
fn page_error<F>(e: ApiClientError, on_status: F) -> PageError
where
    F: FnOnce(u16) -> PageError,
{
    if let Some(status) = e.status() {
        on_status(status)
    } else if e.is_transport() {
        PageError::Network(e.to_string())
    } else {
        PageError::InvalidResponse(e.to_string())
    }
}
