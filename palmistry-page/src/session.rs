use log::info;
use palmistry_api_schema::analyze::{AnalyzeRequest, AnalyzeResponse};

use crate::{
    error::PageError,
    prepare::{prepare_or_original, PrepareOptions},
    result::AnalysisResult,
    state::{InvalidTransition, PageEffect, PageEvent, PageState, SelectedImage},
};

/// How the image reaches the analysis backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitMode {
    /// Upload to the proxy and send the returned URL.
    #[default]
    UploadProxy,
    /// Send the image itself as a base64 `data:` URL.
    InlineDataUrl,
}

/// The two remote calls a submission may need.
pub trait AnalysisBackend {
    /// Stores the image and returns a URL the analysis backend can fetch.
    fn upload(&self, image: &SelectedImage) -> Result<String, PageError>;

    /// Implementations return `PageError::AnalysisFailed` for any non-OK
    /// status, whatever the body.
    fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse, PageError>;
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub mode: SubmitMode,
    /// `None` sends the selected bytes as they are.
    pub prepare: Option<PrepareOptions>,
}

/// Drives a [`PageState`] with blocking calls to a backend.
pub struct AnalysisSession<B> {
    backend: B,
    options: SessionOptions,
    state: PageState,
}

impl<B: AnalysisBackend> AnalysisSession<B> {
    pub fn new(backend: B, options: SessionOptions) -> Self {
        Self {
            backend,
            options,
            state: PageState::Idle,
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn select_file(&mut self, image: SelectedImage) -> Result<(), InvalidTransition> {
        self.state.handle(PageEvent::SelectFile(image))?;
        Ok(())
    }

    /// Runs one analysis to completion. Ends in `Result` or `Error`.
    pub fn submit(&mut self) -> Result<&PageState, InvalidTransition> {
        if let Some(PageEffect::StartAnalysis(image)) = self.state.handle(PageEvent::Submit)? {
            let event = match self.run_analysis(&image) {
                Ok(result) => PageEvent::AnalysisSucceeded(result),
                Err(e) => PageEvent::AnalysisFailed(e),
            };
            self.state.handle(event)?;
        }
        Ok(&self.state)
    }

    pub fn reset(&mut self) -> Result<(), InvalidTransition> {
        self.state.handle(PageEvent::Reset)?;
        Ok(())
    }

    fn run_analysis(&self, image: &SelectedImage) -> Result<AnalysisResult, PageError> {
        let image = match &self.options.prepare {
            Some(options) => prepare_or_original(image, options),
            None => image.clone(),
        };
        let image_url = match self.options.mode {
            SubmitMode::UploadProxy => self.backend.upload(&image)?,
            SubmitMode::InlineDataUrl => image.data_url(),
        };
        info!(
            "analyzing {} ({} bytes, {:?})",
            image.file_name,
            image.data.len(),
            self.options.mode
        );
        let analyze_res = self.backend.analyze(AnalyzeRequest { image_url })?;
        Ok(AnalysisResult::from(analyze_res))
    }
}
