const GENERIC_MESSAGE: &str = "An error occurred";

/// Why an analysis did not produce a result. The page only ever shows
/// [`PageError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    UploadFailed,
    AnalysisFailed { status: u16 },
    Network(String),
    InvalidResponse(String),
}

impl PageError {
    pub fn user_message(&self) -> String {
        match self {
            PageError::UploadFailed => "Failed to upload image".to_string(),
            PageError::AnalysisFailed { .. } => "Analysis failed".to_string(),
            PageError::Network(message) if !message.is_empty() => message.clone(),
            PageError::Network(_) | PageError::InvalidResponse(_) => GENERIC_MESSAGE.to_string(),
        }
    }
}

impl std::fmt::Display for PageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageError::UploadFailed => write!(f, "upload failed"),
            PageError::AnalysisFailed { status } => write!(f, "analysis failed with status {status}"),
            PageError::Network(message) => write!(f, "network error: {message}"),
            PageError::InvalidResponse(message) => write!(f, "invalid response: {message}"),
        }
    }
}

impl std::error::Error for PageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(PageError::UploadFailed.user_message(), "Failed to upload image");
        assert_eq!(
            PageError::AnalysisFailed { status: 502 }.user_message(),
            "Analysis failed"
        );
        assert_eq!(
            PageError::Network("Connection refused".to_string()).user_message(),
            "Connection refused"
        );
        assert_eq!(PageError::Network(String::new()).user_message(), "An error occurred");
        assert_eq!(
            PageError::InvalidResponse("expected value at line 1".to_string()).user_message(),
            "An error occurred"
        );
    }
}
