//! What the result page shows, computed from an [`AnalysisResult`].
//!
//! Renderers (terminal, web) only lay these values out.

use palmistry_api_schema::analysis::{
    Bracelet, Bracelets, Girdle, Girdles, MountTexture, MountTextures, ProcessingStep, Quadrangle,
};
use serde_json::{Map, Value};

use crate::result::AnalysisResult;

pub const DEFAULT_IMAGE_SIZE: &str = "1024×1024";
pub const BRACELET_PALETTE_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Green,
    Emerald,
    Blue,
    Yellow,
    Amber,
    Orange,
    Gray,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineCard {
    pub title: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingStepView {
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub run_id: String,
    pub lines_detected: usize,
    pub image_size: String,
    /// Annotated image as returned by the backend, usually a `data:` URL.
    pub result_image: Option<String>,
    pub analysis_json: Option<String>,
    pub lines: Vec<LineCard>,
    pub image_meta: Vec<Field>,
    pub processing_steps: Vec<ProcessingStepView>,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionView {
    MountTextures(MountTexturesView),
    Girdles(GirdlesView),
    Quadrangle(QuadrangleView),
    Bracelets(BraceletsView),
    Generic(GenericSectionView),
}

impl SectionView {
    pub fn title(&self) -> String {
        match self {
            SectionView::MountTextures(_) => "Mount Texture Patterns".to_string(),
            SectionView::Girdles(_) => "Girdles (Ring-like Curves)".to_string(),
            SectionView::Quadrangle(_) => "Quadrangle Region (Plain of Mars)".to_string(),
            SectionView::Bracelets(_) => "Wrist Bracelets (Rascettes)".to_string(),
            SectionView::Generic(section) => section.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MountTexturesView {
    pub overall_analysis: String,
    pub detection_method: String,
    pub mounts: Vec<MountView>,
    /// Every mount was plain.
    pub all_clear: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MountView {
    pub name: String,
    pub clarity: Badge,
    pub primary_pattern: String,
    /// Patterns beyond the first, shown as "+n more".
    pub extra_patterns: usize,
    pub description: String,
    pub traditional_meaning: String,
    pub confidence: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GirdlesView {
    pub summary: String,
    pub detection_method: String,
    pub girdles: Vec<GirdleView>,
    pub all_clear: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GirdleView {
    pub name: String,
    pub completeness: Badge,
    pub description: String,
    pub traditional_meaning: Option<String>,
    pub confidence: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuadrangleView {
    pub description: String,
    pub shape: String,
    pub width: String,
    pub area_classification: String,
    pub markings_inside: Vec<String>,
    pub traditional_meaning: String,
    pub confidence: u32,
    pub detection_method: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BraceletsView {
    pub count: u64,
    pub summary: String,
    pub overall_quality: Badge,
    pub detection_method: String,
    pub bracelets: Vec<BraceletView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BraceletView {
    pub number: u32,
    pub position: String,
    /// Index into a fixed list of [`BRACELET_PALETTE_COUNT`] colour palettes.
    pub palette: usize,
    pub continuity: Badge,
    pub clarity: Badge,
    pub description: String,
    pub traditional_meaning: String,
    pub confidence: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericSectionView {
    pub key: String,
    pub title: String,
    pub fields: Vec<Field>,
}

impl ResultView {
    pub fn new(result: &AnalysisResult) -> Self {
        let analysis = &result.analysis;

        let mut sections = Vec::new();
        if let Some(section) = analysis.mount_textures() {
            sections.push(SectionView::MountTextures(mount_textures_view(section)));
        }
        if let Some(section) = analysis.girdles() {
            sections.push(SectionView::Girdles(girdles_view(section)));
        }
        if let Some(section) = analysis.quadrangle() {
            sections.push(SectionView::Quadrangle(quadrangle_view(section)));
        }
        if let Some(section) = analysis.bracelets() {
            sections.push(SectionView::Bracelets(bracelets_view(section)));
        }
        for (key, section) in analysis.generic_sections() {
            sections.push(SectionView::Generic(generic_section_view(key, section)));
        }

        let image_size = result
            .image_meta
            .get("size")
            .filter(|size| is_truthy(size))
            .map(display_value)
            .unwrap_or_else(|| DEFAULT_IMAGE_SIZE.to_string());

        Self {
            run_id: result.run_id.clone(),
            lines_detected: result.lines.len(),
            image_size,
            result_image: Some(result.image_base64.clone()).filter(|s| !s.is_empty()),
            analysis_json: if analysis.is_empty() {
                None
            } else {
                serde_json::to_string_pretty(&analysis.0).ok()
            },
            lines: result
                .lines
                .iter()
                .enumerate()
                .map(|(i, line)| LineCard {
                    title: format!("Line {}", i + 1),
                    fields: fields_of(line),
                })
                .collect(),
            image_meta: result
                .image_meta
                .iter()
                .map(|(key, value)| Field {
                    key: key.clone(),
                    value: display_value(value),
                })
                .collect(),
            processing_steps: result
                .processing_steps
                .iter()
                .enumerate()
                .map(|(i, step)| processing_step_view(i, step))
                .collect(),
            sections,
        }
    }
}

/// `0.873` -> `87`.
pub fn confidence_percent(confidence: f64) -> u32 {
    if confidence.is_finite() && confidence > 0.0 {
        (confidence * 100.0).round() as u32
    } else {
        0
    }
}

/// Strings as they are, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `finger_geometry` -> `Finger Geometry`.
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn fields_of(value: &Value) -> Vec<Field> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| Field {
                key: key.clone(),
                value: display_value(value),
            })
            .collect(),
        other => vec![Field {
            key: "value".to_string(),
            value: display_value(other),
        }],
    }
}

fn processing_step_view(index: usize, step: &Value) -> ProcessingStepView {
    let step: ProcessingStep = serde_json::from_value(step.clone()).unwrap_or_default();
    ProcessingStepView {
        title: step
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Step {}", index + 1)),
        description: step.description.filter(|s| !s.is_empty()),
        image: step.image_base64.filter(|s| !s.is_empty()),
    }
}

fn clarity_tone(clarity: &str) -> Tone {
    match clarity {
        "clear" => Tone::Green,
        "moderate" => Tone::Yellow,
        _ => Tone::Gray,
    }
}

fn mount_view(name: &str, mount: &MountTexture) -> MountView {
    MountView {
        name: name.to_string(),
        clarity: Badge {
            label: mount.clarity.clone(),
            tone: clarity_tone(&mount.clarity),
        },
        primary_pattern: mount.primary_pattern.clone(),
        extra_patterns: mount.patterns.len().saturating_sub(1),
        description: mount.description.clone(),
        traditional_meaning: mount.traditional_meaning.clone(),
        confidence: confidence_percent(mount.confidence),
    }
}

fn mount_textures_view(section: MountTextures) -> MountTexturesView {
    let all_clear = section
        .mounts
        .values()
        .all(|mount| mount.primary_pattern == "none");
    MountTexturesView {
        overall_analysis: section.overall_analysis,
        detection_method: section.detection_method,
        mounts: section
            .mounts
            .iter()
            .filter(|(_, mount)| mount.primary_pattern != "none")
            .map(|(name, mount)| mount_view(name, mount))
            .collect(),
        all_clear,
    }
}

fn girdle_view(name: &str, girdle: &Girdle) -> GirdleView {
    let tone = match girdle.completeness.as_str() {
        "complete_circle" => Tone::Green,
        "partial_arc" => Tone::Yellow,
        _ => Tone::Orange,
    };
    GirdleView {
        name: name.to_string(),
        completeness: Badge {
            label: girdle.completeness.replacen('_', " ", 1),
            tone,
        },
        description: girdle.description.clone(),
        traditional_meaning: girdle.traditional_meaning.clone(),
        confidence: confidence_percent(girdle.confidence),
    }
}

fn girdles_view(section: Girdles) -> GirdlesView {
    let all_clear = section.girdles.values().all(|girdle| !girdle.detected);
    GirdlesView {
        summary: section.summary,
        detection_method: section.detection_method,
        girdles: section
            .girdles
            .iter()
            .filter(|(_, girdle)| girdle.detected)
            .map(|(name, girdle)| girdle_view(name, girdle))
            .collect(),
        all_clear,
    }
}

fn quadrangle_view(section: Quadrangle) -> QuadrangleView {
    QuadrangleView {
        description: section.description,
        shape: section.shape,
        width: section.width,
        area_classification: section.area_classification,
        markings_inside: section.markings_inside,
        traditional_meaning: section.traditional_meaning,
        confidence: confidence_percent(section.confidence),
        detection_method: section.detection_method,
    }
}

fn bracelet_view(index: usize, bracelet: &Bracelet) -> BraceletView {
    let continuity_tone = match bracelet.continuity.as_str() {
        "continuous" => Tone::Green,
        "mostly_continuous" => Tone::Blue,
        "broken" => Tone::Yellow,
        _ => Tone::Orange,
    };
    let clarity_tone = match bracelet.clarity.as_str() {
        "clear" => Tone::Emerald,
        "moderate" => Tone::Amber,
        _ => Tone::Gray,
    };
    BraceletView {
        number: bracelet.number,
        position: bracelet.position.clone(),
        palette: index % BRACELET_PALETTE_COUNT,
        continuity: Badge {
            label: bracelet.continuity.replace('_', " "),
            tone: continuity_tone,
        },
        clarity: Badge {
            label: bracelet.clarity.clone(),
            tone: clarity_tone,
        },
        description: bracelet.description.clone(),
        traditional_meaning: bracelet.traditional_meaning.clone(),
        confidence: confidence_percent(bracelet.confidence),
    }
}

fn bracelets_view(section: Bracelets) -> BraceletsView {
    let tone = match section.overall_quality.as_str() {
        "Excellent" => Tone::Green,
        "Good" => Tone::Blue,
        _ => Tone::Yellow,
    };
    BraceletsView {
        count: section.count,
        summary: section.summary,
        overall_quality: Badge {
            label: section.overall_quality,
            tone,
        },
        detection_method: section.detection_method,
        bracelets: section
            .bracelets
            .iter()
            .enumerate()
            .map(|(i, bracelet)| bracelet_view(i, bracelet))
            .collect(),
    }
}

fn generic_section_view(key: &str, section: &Map<String, Value>) -> GenericSectionView {
    GenericSectionView {
        key: key.to_string(),
        title: humanize_key(key),
        fields: section
            .iter()
            .filter(|(key, _)| key.as_str() != "success")
            .map(|(key, value)| Field {
                key: humanize_key(key),
                value: display_value(value),
            })
            .collect(),
    }
}
