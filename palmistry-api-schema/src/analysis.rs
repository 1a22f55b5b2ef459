//! Lenient views over the `analysis` object returned by the backend.
//!
//! Sections are parsed on access. A section that is missing, malformed or
//! not flagged `success` is `None`, and never affects its siblings.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MOUNT_TEXTURES_KEY: &str = "mount_textures";
pub const GIRDLES_KEY: &str = "girdles";
pub const QUADRANGLE_KEY: &str = "quadrangle";
pub const BRACELETS_KEY: &str = "bracelets";

const TYPED_SECTION_KEYS: [&str; 4] = [
    MOUNT_TEXTURES_KEY,
    GIRDLES_KEY,
    QUADRANGLE_KEY,
    BRACELETS_KEY,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Analysis(pub Map<String, Value>);

pub trait AnalysisSection: DeserializeOwned {
    fn success(&self) -> bool;
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn section<T: AnalysisSection>(&self, key: &str) -> Option<T> {
        let value = self.0.get(key)?;
        let section: T = serde_json::from_value(value.clone()).ok()?;
        section.success().then_some(section)
    }

    pub fn mount_textures(&self) -> Option<MountTextures> {
        self.section(MOUNT_TEXTURES_KEY)
    }

    pub fn girdles(&self) -> Option<Girdles> {
        self.section(GIRDLES_KEY)
    }

    /// Only returned when the quadrangle was also `detected`.
    pub fn quadrangle(&self) -> Option<Quadrangle> {
        self.section::<Quadrangle>(QUADRANGLE_KEY)
            .filter(|quadrangle| quadrangle.detected)
    }

    /// Only returned when at least one bracelet was counted.
    pub fn bracelets(&self) -> Option<Bracelets> {
        self.section::<Bracelets>(BRACELETS_KEY)
            .filter(|bracelets| bracelets.count > 0)
    }

    /// Successful sections without a dedicated type (moles, finger geometry, ...),
    /// in key order.
    pub fn generic_sections(&self) -> Vec<(&str, &Map<String, Value>)> {
        self.0
            .iter()
            .filter(|(key, _)| !TYPED_SECTION_KEYS.contains(&key.as_str()))
            .filter_map(|(key, value)| {
                let section = value.as_object()?;
                let success = section.get("success")?.as_bool()?;
                success.then_some((key.as_str(), section))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountTextures {
    pub success: bool,
    pub overall_analysis: String,
    pub detection_method: String,
    pub mounts: BTreeMap<String, MountTexture>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountTexture {
    pub primary_pattern: String,
    pub patterns: Vec<String>,
    pub clarity: String,
    pub description: String,
    pub traditional_meaning: String,
    pub confidence: f64,
}

impl AnalysisSection for MountTextures {
    fn success(&self) -> bool {
        self.success
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Girdles {
    pub success: bool,
    pub summary: String,
    pub detection_method: String,
    pub girdles: BTreeMap<String, Girdle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Girdle {
    pub detected: bool,
    pub completeness: String,
    pub description: String,
    pub traditional_meaning: Option<String>,
    pub confidence: f64,
}

impl AnalysisSection for Girdles {
    fn success(&self) -> bool {
        self.success
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quadrangle {
    pub success: bool,
    pub detected: bool,
    pub description: String,
    pub shape: String,
    pub width: String,
    pub area_classification: String,
    pub markings_inside: Vec<String>,
    pub traditional_meaning: String,
    pub confidence: f64,
    pub detection_method: String,
}

impl AnalysisSection for Quadrangle {
    fn success(&self) -> bool {
        self.success
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bracelets {
    pub success: bool,
    pub count: u64,
    pub summary: String,
    pub overall_quality: String,
    pub detection_method: String,
    pub bracelets: Vec<Bracelet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bracelet {
    pub number: u32,
    pub position: String,
    pub continuity: String,
    pub clarity: String,
    pub description: String,
    pub traditional_meaning: String,
    pub confidence: f64,
}

impl AnalysisSection for Bracelets {
    fn success(&self) -> bool {
        self.success
    }
}

/// One intermediate image produced by the backend pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingStep {
    #[serde(alias = "title", alias = "step")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "imageBase64", alias = "image")]
    pub image_base64: Option<String>,
}
