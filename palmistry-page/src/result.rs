use palmistry_api_schema::analysis::Analysis;
use palmistry_api_schema::analyze::AnalyzeResponse;
use serde_json::{Map, Value};

/// A backend response with every missing field replaced by its empty value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    pub analysis: Analysis,
    pub lines: Vec<Value>,
    pub image_meta: Map<String, Value>,
    pub image_base64: String,
    pub run_id: String,
    pub processing_steps: Vec<Value>,
}

impl From<AnalyzeResponse> for AnalysisResult {
    fn from(res: AnalyzeResponse) -> Self {
        Self {
            analysis: res.analysis.unwrap_or_default(),
            lines: res.lines.unwrap_or_default(),
            image_meta: res.image_meta.unwrap_or_default(),
            image_base64: res.image_base64.unwrap_or_default(),
            run_id: res.run_id.unwrap_or_default(),
            processing_steps: res.processing_steps.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_response() {
        let result = AnalysisResult::from(AnalyzeResponse::default());
        assert!(result.analysis.is_empty());
        assert!(result.lines.is_empty());
        assert_eq!(result.run_id, "");
    }
}
