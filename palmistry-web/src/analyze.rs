use gloo_net::http::Request;
use palmistry_api_schema::analyze::{AnalyzeRequest, AnalyzeResponse};
use palmistry_config_file::DEFAULT_API_URL;
use palmistry_page::{
    error::PageError,
    prepare::{prepare_or_original, PrepareOptions},
    result::AnalysisResult,
    state::SelectedImage,
};

/// Backend origin, fixed when the bundle is built.
pub fn api_url() -> &'static str {
    resolve_api_url(
        option_env!("PALMISTRY_API_URL"),
        option_env!("NEXT_PUBLIC_API_URL"),
    )
}

fn resolve_api_url(api_url: Option<&'static str>, fallback: Option<&'static str>) -> &'static str {
    api_url.or(fallback).unwrap_or(DEFAULT_API_URL)
}

/// Sends `image` inline as a data URL. Any non-OK status is a failure,
/// whatever the body says.
pub async fn analyze_inline(image: &SelectedImage) -> Result<AnalysisResult, PageError> {
    let image = prepare_or_original(image, &PrepareOptions::default());
    let url = format!("{}/analyze", api_url().trim_end_matches('/'));
    log::info!("POST {} ({} bytes)", url, image.data.len());

    let res = Request::post(&url)
        .json(&AnalyzeRequest {
            image_url: image.data_url(),
        })
        .map_err(|e| PageError::InvalidResponse(e.to_string()))?
        .send()
        .await
        .map_err(|e| PageError::Network(e.to_string()))?;
    if !res.ok() {
        return Err(PageError::AnalysisFailed {
            status: res.status(),
        });
    }
    let body = res
        .binary()
        .await
        .map_err(|e| PageError::InvalidResponse(e.to_string()))?;
    let analyze_res = AnalyzeResponse::from_json_slice(&body)
        .map_err(|e| PageError::InvalidResponse(e.to_string()))?;
    Ok(AnalysisResult::from(analyze_res))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_url() {
        assert_eq!(resolve_api_url(None, None), DEFAULT_API_URL);
        assert_eq!(
            resolve_api_url(None, Some("http://next:8000")),
            "http://next:8000"
        );
        assert_eq!(
            resolve_api_url(Some("http://palm:8000"), Some("http://next:8000")),
            "http://palm:8000"
        );
    }
}
