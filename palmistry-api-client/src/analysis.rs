use std::io::Read;
use std::time::Duration;

use log::debug;
use palmistry_api_schema::analyze::{AnalyzeRequest, AnalyzeResponse};

use crate::{trim_base_url, ApiClientError};

/// Client of the external analysis backend.
#[derive(Debug, Clone)]
pub struct AnalysisApiClient {
    pub base_url: String,
    agent: ureq::Agent,
}

impl AnalysisApiClient {
    pub fn new(base_url: String) -> Self {
        Self::with_timeout(base_url, None)
    }

    /// `None` waits for the backend indefinitely.
    pub fn with_timeout(base_url: String, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            base_url: trim_base_url(base_url),
            agent: builder.build(),
        }
    }

    /// Any JSON body but `null` is accepted on a 2xx status.
    pub fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse, ApiClientError> {
        let url = format!("{}/analyze", self.base_url);
        debug!("POST {}", url);
        let res = self
            .agent
            .post(&url)
            .send_json(request)
            .map_err(|e| ApiClientError::Ureq(Box::new(e)))?;
        let mut body = Vec::new();
        res.into_reader()
            .read_to_end(&mut body)
            .map_err(|e| ApiClientError::IO(Box::new(e)))?;
        AnalyzeResponse::from_json_slice(&body)
            .map_err(|e| ApiClientError::IO(Box::new(std::io::Error::from(e))))
    }
}
