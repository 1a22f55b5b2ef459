//! Wire types of the external analysis backend (`POST {api_url}/analyze`).
//!
//! The backend owns this schema. Every response field is optional and a
//! field with an unexpected shape is treated as absent instead of failing
//! the whole response. An OK body that is not an object carries no fields.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::analysis::Analysis;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Either an `http(s)` URL the backend can fetch or a `data:` URL.
    pub image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub analysis: Option<Analysis>,
    #[serde(default, deserialize_with = "lenient")]
    pub lines: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub image_meta: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient")]
    pub image_base64: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub run_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub processing_steps: Option<Vec<Value>>,
}

impl AnalyzeResponse {
    /// Reads the body of an OK response. Only `null` is rejected; any other
    /// non-object value is an empty response.
    pub fn from_json_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Null => Err(serde::de::Error::custom("response body is null")),
            Value::Object(_) => serde_json::from_value(value),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_json_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        Self::from_json_value(serde_json::from_slice(body)?)
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
