pub mod analysis;
pub mod upload;

#[derive(Debug)]
pub enum ApiClientError {
    /// Transport failure or a non-2xx status.
    Ureq(Box<ureq::Error>),
    /// The body could not be read or decoded.
    IO(Box<std::io::Error>),
}

impl ApiClientError {
    /// HTTP status when the server answered with a non-2xx code.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiClientError::Ureq(e) => match e.as_ref() {
                ureq::Error::Status(code, _) => Some(*code),
                ureq::Error::Transport(_) => None,
            },
            ApiClientError::IO(_) => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiClientError::Ureq(e) if matches!(e.as_ref(), ureq::Error::Transport(_)))
    }
}

impl std::fmt::Display for ApiClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiClientError::Ureq(e) => write!(f, "{e}"),
            ApiClientError::IO(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ApiClientError {}

fn trim_base_url(base_url: String) -> String {
    let mut base_url = base_url;
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_base_url() {
        assert_eq!(
            trim_base_url("http://localhost:8000/".to_string()),
            "http://localhost:8000"
        );
        assert_eq!(
            trim_base_url("http://localhost:8000".to_string()),
            "http://localhost:8000"
        );
    }

    #[test]
    fn test_io_error_has_no_status() {
        let e = ApiClientError::IO(Box::new(std::io::Error::other("bad json")));
        assert_eq!(e.status(), None);
        assert!(!e.is_transport());
    }
}
