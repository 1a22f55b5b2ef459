use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;

use crate::{error::PageError, result::AnalysisResult};

const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl SelectedImage {
    /// The content type is sniffed from the bytes, then from the file
    /// extension, and falls back to `image/jpeg`.
    pub fn new(file_name: String, data: Vec<u8>) -> Self {
        let content_type = image::guess_format(&data)
            .ok()
            .or_else(|| image::ImageFormat::from_path(&file_name).ok())
            .map(|format| format.to_mime_type().to_string())
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
        Self {
            file_name,
            content_type,
            data,
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.data))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PageState {
    #[default]
    Idle,
    Selected {
        image: SelectedImage,
    },
    Loading {
        image: SelectedImage,
    },
    Result {
        image: SelectedImage,
        result: Box<AnalysisResult>,
    },
    Error {
        image: Option<SelectedImage>,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    SelectFile(SelectedImage),
    Submit,
    AnalysisSucceeded(AnalysisResult),
    AnalysisFailed(PageError),
    Reset,
}

impl PageEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PageEvent::SelectFile(_) => "SelectFile",
            PageEvent::Submit => "Submit",
            PageEvent::AnalysisSucceeded(_) => "AnalysisSucceeded",
            PageEvent::AnalysisFailed(_) => "AnalysisFailed",
            PageEvent::Reset => "Reset",
        }
    }
}

/// Work the caller has to start after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEffect {
    StartAnalysis(SelectedImage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub state: &'static str,
    pub event: &'static str,
}

impl std::fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is not allowed in state {}", self.event, self.state)
    }
}

impl std::error::Error for InvalidTransition {}

impl PageState {
    pub fn name(&self) -> &'static str {
        match self {
            PageState::Idle => "Idle",
            PageState::Selected { .. } => "Selected",
            PageState::Loading { .. } => "Loading",
            PageState::Result { .. } => "Result",
            PageState::Error { .. } => "Error",
        }
    }

    /// Applies `event`. On an invalid transition the state is left as it was.
    pub fn handle(&mut self, event: PageEvent) -> Result<Option<PageEffect>, InvalidTransition> {
        let invalid = InvalidTransition {
            state: self.name(),
            event: event.name(),
        };
        let current = std::mem::take(self);
        let (next, effect) = match (current, event) {
            (
                PageState::Idle
                | PageState::Selected { .. }
                | PageState::Result { .. }
                | PageState::Error { .. },
                PageEvent::SelectFile(image),
            ) => (PageState::Selected { image }, None),
            (PageState::Selected { image }, PageEvent::Submit)
            | (
                PageState::Error {
                    image: Some(image), ..
                },
                PageEvent::Submit,
            ) => (
                PageState::Loading {
                    image: image.clone(),
                },
                Some(PageEffect::StartAnalysis(image)),
            ),
            (PageState::Loading { image }, PageEvent::AnalysisSucceeded(result)) => (
                PageState::Result {
                    image,
                    result: Box::new(result),
                },
                None,
            ),
            (PageState::Loading { image }, PageEvent::AnalysisFailed(error)) => {
                debug!("analysis failed: {}", error);
                (
                    PageState::Error {
                        image: Some(image),
                        message: error.user_message(),
                    },
                    None,
                )
            }
            (PageState::Result { .. } | PageState::Error { .. }, PageEvent::Reset) => {
                (PageState::Idle, None)
            }
            (current, _) => {
                *self = current;
                return Err(invalid);
            }
        };
        *self = next;
        Ok(effect)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PageState::Loading { .. })
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        match self {
            PageState::Idle => None,
            PageState::Selected { image }
            | PageState::Loading { image }
            | PageState::Result { image, .. } => Some(image),
            PageState::Error { image, .. } => image.as_ref(),
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            PageState::Result { result, .. } => Some(result.as_ref()),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            PageState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        matches!(
            self,
            PageState::Selected { .. } | PageState::Error { image: Some(_), .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
        0x52,
    ];

    fn image(name: &str) -> SelectedImage {
        SelectedImage {
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            data: vec![1, 2, 3],
        }
    }

    fn loading() -> PageState {
        let mut state = PageState::Selected {
            image: image("palm.jpg"),
        };
        state.handle(PageEvent::Submit).unwrap();
        state
    }

    #[test]
    fn test_selected_image_content_type() {
        let png = SelectedImage::new("palm".to_string(), PNG_HEADER.to_vec());
        assert_eq!(png.content_type, "image/png");

        let by_extension = SelectedImage::new("palm.webp".to_string(), vec![0, 0, 0]);
        assert_eq!(by_extension.content_type, "image/webp");

        let unknown = SelectedImage::new("palm.heic".to_string(), vec![0, 0, 0]);
        assert_eq!(unknown.content_type, "image/jpeg");
    }

    #[test]
    fn test_data_url() {
        assert_eq!(image("a.jpg").data_url(), "data:image/jpeg;base64,AQID");
    }

    #[test]
    fn test_happy_path() {
        let mut state = PageState::default();
        assert_eq!(state.name(), "Idle");

        let effect = state.handle(PageEvent::SelectFile(image("palm.jpg"))).unwrap();
        assert_eq!(effect, None);
        assert_eq!(state.name(), "Selected");
        assert!(state.can_submit());

        let effect = state.handle(PageEvent::Submit).unwrap();
        assert_eq!(effect, Some(PageEffect::StartAnalysis(image("palm.jpg"))));
        assert!(state.is_loading());

        let result = AnalysisResult {
            run_id: "run-1".to_string(),
            ..Default::default()
        };
        state.handle(PageEvent::AnalysisSucceeded(result)).unwrap();
        assert_eq!(state.name(), "Result");
        assert_eq!(state.result().map(|r| r.run_id.as_str()), Some("run-1"));
        assert_eq!(state.image(), Some(&image("palm.jpg")));

        state.handle(PageEvent::Reset).unwrap();
        assert_eq!(state, PageState::Idle);
    }

    #[test]
    fn test_failure_keeps_image_and_allows_retry() {
        let mut state = loading();
        state
            .handle(PageEvent::AnalysisFailed(PageError::AnalysisFailed { status: 500 }))
            .unwrap();
        assert_eq!(state.error_message(), Some("Analysis failed"));
        assert!(state.can_submit());

        let effect = state.handle(PageEvent::Submit).unwrap();
        assert_eq!(effect, Some(PageEffect::StartAnalysis(image("palm.jpg"))));
        assert!(state.is_loading());
    }

    #[test]
    fn test_loading_ignores_submit() {
        let mut state = loading();
        let err = state.handle(PageEvent::Submit).unwrap_err();
        assert_eq!(
            err,
            InvalidTransition {
                state: "Loading",
                event: "Submit"
            }
        );
        assert!(state.is_loading());
    }

    #[test]
    fn test_invalid_transitions_leave_state_unchanged() {
        let mut idle = PageState::Idle;
        assert!(idle.handle(PageEvent::Submit).is_err());
        assert!(idle.handle(PageEvent::Reset).is_err());
        assert!(idle
            .handle(PageEvent::AnalysisSucceeded(AnalysisResult::default()))
            .is_err());
        assert_eq!(idle, PageState::Idle);

        let mut selected = PageState::Selected {
            image: image("palm.jpg"),
        };
        assert!(selected.handle(PageEvent::Reset).is_err());
        assert_eq!(selected.image(), Some(&image("palm.jpg")));

        let mut loading = loading();
        assert!(loading.handle(PageEvent::SelectFile(image("other.jpg"))).is_err());
        assert_eq!(loading.image(), Some(&image("palm.jpg")));

        let mut error_without_image = PageState::Error {
            image: None,
            message: "An error occurred".to_string(),
        };
        assert!(!error_without_image.can_submit());
        assert!(error_without_image.handle(PageEvent::Submit).is_err());
    }

    #[test]
    fn test_select_file_replaces_previous_image() {
        let mut state = loading();
        state
            .handle(PageEvent::AnalysisSucceeded(AnalysisResult::default()))
            .unwrap();
        state.handle(PageEvent::SelectFile(image("second.jpg"))).unwrap();
        assert_eq!(
            state,
            PageState::Selected {
                image: image("second.jpg")
            }
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = InvalidTransition {
            state: "Idle",
            event: "Reset",
        };
        insta::assert_snapshot!(err.to_string(), @"Reset is not allowed in state Idle");
    }
}
