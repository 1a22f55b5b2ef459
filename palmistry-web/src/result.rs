use dioxus::prelude::*;
use palmistry_page::{
    state::{PageEvent, PageState, SelectedImage},
    view::{
        Badge, BraceletView, BraceletsView, GenericSectionView, GirdlesView, MountTexturesView,
        QuadrangleView, ResultView, SectionView, Tone,
    },
};

use crate::dispatch;

const BRACELET_PALETTES: [&str; 4] = [
    "from-indigo-50 to-indigo-100 border-indigo-200",
    "from-purple-50 to-purple-100 border-purple-200",
    "from-pink-50 to-pink-100 border-pink-200",
    "from-blue-50 to-blue-100 border-blue-200",
];

fn tone_class(tone: Tone) -> &'static str {
    match tone {
        Tone::Green => "bg-green-100 text-green-800",
        Tone::Emerald => "bg-emerald-100 text-emerald-800",
        Tone::Blue => "bg-blue-100 text-blue-800",
        Tone::Yellow => "bg-yellow-100 text-yellow-800",
        Tone::Amber => "bg-amber-100 text-amber-800",
        Tone::Orange => "bg-orange-100 text-orange-800",
        Tone::Gray => "bg-gray-100 text-gray-800",
    }
}

#[component]
fn BadgeSpan(badge: Badge) -> Element {
    let class = tone_class(badge.tone);
    rsx! {
        span { class: "px-2 py-1 rounded-full text-xs font-semibold {class}", "{badge.label}" }
    }
}

#[component]
fn ConfidenceBar(confidence: u32) -> Element {
    let width = confidence.min(100);
    rsx! {
        div { class: "flex items-center gap-2 text-xs text-gray-600",
            div { class: "flex-1 bg-gray-200 rounded-full h-2",
                div { class: "bg-blue-600 h-2 rounded-full", style: "width: {width}%" }
            }
            span { "{confidence}%" }
        }
    }
}

#[component]
pub fn ResultPage(state: Signal<PageState>) -> Element {
    let current = state.read();
    let result = current.result()?;
    let original = current.image().map(SelectedImage::data_url).unwrap_or_default();
    let view = ResultView::new(result);
    drop(current);

    rsx! {
        div { class: "space-y-8",
            div { class: "flex justify-center",
                button {
                    class: "bg-white px-6 py-3 rounded-xl shadow-md hover:shadow-lg transition-shadow font-semibold text-gray-700",
                    onclick: move |_| {
                        dispatch(state, PageEvent::Reset);
                    },
                    "← Analyze Another Image"
                }
            }
            div { class: "bg-white rounded-2xl shadow-lg p-8",
                h2 { class: "text-3xl font-bold text-green-600 mb-6", "✅ Analysis Complete!" }
                div { class: "mb-6 text-sm text-gray-600",
                    "Run ID: "
                    code { class: "bg-gray-100 px-2 py-1 rounded", "{view.run_id}" }
                }
                div { class: "grid grid-cols-1 md:grid-cols-3 gap-4 mb-8",
                    Stat {
                        value: view.lines_detected.to_string(),
                        label: "Lines Detected",
                        background: "from-blue-50 to-blue-100",
                        text: "text-blue-600"
                    }
                    Stat {
                        value: view.image_size.clone(),
                        label: "Image Size",
                        background: "from-purple-50 to-purple-100",
                        text: "text-purple-600"
                    }
                    Stat {
                        value: "AI".to_string(),
                        label: "Powered",
                        background: "from-green-50 to-green-100",
                        text: "text-green-600"
                    }
                }
                div { class: "grid grid-cols-1 lg:grid-cols-2 gap-8 mb-8",
                    div {
                        h3 { class: "text-xl font-bold text-gray-900 mb-4", "📥 Original Image" }
                        img { src: "{original}", alt: "Original", class: "w-full rounded-xl shadow-md" }
                    }
                    div {
                        h3 { class: "text-xl font-bold text-gray-900 mb-4", "✨ Analyzed Result" }
                        if let Some(result_image) = view.result_image.clone() {
                            img { src: "{result_image}", alt: "Result", class: "w-full rounded-xl shadow-md" }
                        }
                    }
                }
                for section in view.sections.iter().cloned() {
                    Section { section: section }
                }
                if let Some(analysis_json) = view.analysis_json.clone() {
                    div { class: "mb-8",
                        h3 { class: "text-2xl font-bold text-gray-900 mb-4", "📊 Analysis Data" }
                        div { class: "bg-gray-50 p-6 rounded-xl overflow-auto",
                            pre { class: "text-sm text-gray-800 whitespace-pre-wrap", "{analysis_json}" }
                        }
                    }
                }
                if !view.lines.is_empty() {
                    div { class: "mb-8",
                        h3 { class: "text-2xl font-bold text-gray-900 mb-4", "🖐️ Detected Lines" }
                        div { class: "grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-4",
                            for line in view.lines.iter() {
                                div { class: "bg-gradient-to-br from-blue-50 to-purple-50 p-6 rounded-xl border border-gray-200",
                                    div { class: "text-lg font-bold text-gray-900 mb-3", "{line.title}" }
                                    div { class: "text-sm text-gray-700 space-y-2",
                                        for field in line.fields.iter() {
                                            div {
                                                span { class: "font-semibold", "{field.key}: " }
                                                span { class: "text-gray-600", "{field.value}" }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                if !view.image_meta.is_empty() {
                    div { class: "mb-8",
                        h3 { class: "text-2xl font-bold text-gray-900 mb-4", "🖼️ Image Metadata" }
                        div { class: "bg-gray-50 p-6 rounded-xl grid grid-cols-1 md:grid-cols-2 gap-4",
                            for field in view.image_meta.iter() {
                                div { class: "flex items-center gap-2",
                                    span { class: "font-semibold text-gray-700", "{field.key}:" }
                                    span { class: "text-gray-600", "{field.value}" }
                                }
                            }
                        }
                    }
                }
                if !view.processing_steps.is_empty() {
                    div { class: "mb-8",
                        h3 { class: "text-2xl font-bold text-gray-900 mb-4", "🔬 Processing Steps" }
                        div { class: "grid grid-cols-1 md:grid-cols-2 gap-4",
                            for step in view.processing_steps.iter() {
                                div { class: "bg-gray-50 p-4 rounded-xl",
                                    div { class: "font-semibold text-gray-900 mb-2", "{step.title}" }
                                    if let Some(description) = step.description.clone() {
                                        p { class: "text-sm text-gray-600 mb-2", "{description}" }
                                    }
                                    if let Some(image) = step.image.clone() {
                                        img { src: "{image}", alt: "{step.title}", class: "w-full rounded-lg" }
                                    }
                                }
                            }
                        }
                    }
                }
                if let Some(result_image) = view.result_image.clone() {
                    div { class: "mt-8",
                        a {
                            href: "{result_image}",
                            download: "palmistry-result.png",
                            class: "inline-block bg-green-600 text-white px-8 py-4 rounded-xl font-semibold hover:bg-green-700 transition-colors",
                            "📥 Download Result"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn Stat(value: String, label: &'static str, background: &'static str, text: &'static str) -> Element {
    rsx! {
        div { class: "bg-gradient-to-br {background} p-6 rounded-xl",
            div { class: "text-3xl font-bold {text}", "{value}" }
            div { class: "text-gray-700 font-medium", "{label}" }
        }
    }
}

#[component]
fn Section(section: SectionView) -> Element {
    let title = section.title();
    rsx! {
        div { class: "mb-8",
            h3 { class: "text-2xl font-bold text-gray-900 mb-4", "{title}" }
            match section {
                SectionView::MountTextures(view) => rsx! { Mounts { view: view } },
                SectionView::Girdles(view) => rsx! { GirdlesSection { view: view } },
                SectionView::Quadrangle(view) => rsx! { QuadrangleSection { view: view } },
                SectionView::Bracelets(view) => rsx! { BraceletsSection { view: view } },
                SectionView::Generic(view) => rsx! { GenericSection { view: view } },
            }
        }
    }
}

#[component]
fn DetectionMethod(method: String) -> Element {
    if method.is_empty() {
        return None;
    }
    rsx! {
        p { class: "mt-4 text-xs text-gray-500", "Detection: {method}" }
    }
}

#[component]
fn Mounts(view: MountTexturesView) -> Element {
    rsx! {
        if !view.overall_analysis.is_empty() {
            p { class: "text-gray-700 mb-4", "{view.overall_analysis}" }
        }
        div { class: "grid grid-cols-1 md:grid-cols-2 gap-4",
            for mount in view.mounts.iter().cloned() {
                div { class: "bg-gradient-to-br from-amber-50 to-orange-50 p-5 rounded-xl border border-amber-200",
                    div { class: "flex justify-between items-center mb-2",
                        span { class: "font-bold text-gray-900 capitalize", "{mount.name}" }
                        BadgeSpan { badge: mount.clarity.clone() }
                    }
                    div { class: "text-sm text-gray-800 mb-1",
                        "Pattern: {mount.primary_pattern}"
                        if mount.extra_patterns > 0 {
                            " (+{mount.extra_patterns} more)"
                        }
                    }
                    p { class: "text-sm text-gray-600 mb-1", "{mount.description}" }
                    p { class: "text-sm italic text-gray-600 mb-2", "{mount.traditional_meaning}" }
                    ConfidenceBar { confidence: mount.confidence }
                }
            }
        }
        if view.all_clear {
            p { class: "text-gray-600 italic", "No distinctive texture patterns on any mount." }
        }
        DetectionMethod { method: view.detection_method.clone() }
    }
}

#[component]
fn GirdlesSection(view: GirdlesView) -> Element {
    rsx! {
        if !view.summary.is_empty() {
            p { class: "text-gray-700 mb-4", "{view.summary}" }
        }
        div { class: "grid grid-cols-1 md:grid-cols-2 gap-4",
            for girdle in view.girdles.iter().cloned() {
                div { class: "bg-gradient-to-br from-violet-50 to-fuchsia-50 p-5 rounded-xl border border-violet-200",
                    div { class: "flex justify-between items-center mb-2",
                        span { class: "font-bold text-gray-900 capitalize", "{girdle.name}" }
                        BadgeSpan { badge: girdle.completeness.clone() }
                    }
                    p { class: "text-sm text-gray-600 mb-1", "{girdle.description}" }
                    if let Some(meaning) = girdle.traditional_meaning.clone() {
                        p { class: "text-sm italic text-gray-600 mb-2", "{meaning}" }
                    }
                    ConfidenceBar { confidence: girdle.confidence }
                }
            }
        }
        if view.all_clear {
            p { class: "text-gray-600 italic", "No girdles detected." }
        }
        DetectionMethod { method: view.detection_method.clone() }
    }
}

#[component]
fn QuadrangleSection(view: QuadrangleView) -> Element {
    let markings = view.markings_inside.join(", ");
    rsx! {
        div { class: "bg-gradient-to-br from-teal-50 to-cyan-50 p-6 rounded-xl border border-teal-200",
            p { class: "text-gray-700 mb-4", "{view.description}" }
            div { class: "grid grid-cols-1 md:grid-cols-3 gap-4 mb-4 text-sm",
                div { span { class: "font-semibold", "Shape: " } "{view.shape}" }
                div { span { class: "font-semibold", "Width: " } "{view.width}" }
                div { span { class: "font-semibold", "Area: " } "{view.area_classification}" }
            }
            if !markings.is_empty() {
                p { class: "text-sm text-gray-700 mb-2", "Markings inside: {markings}" }
            }
            p { class: "text-sm italic text-gray-600 mb-2", "{view.traditional_meaning}" }
            ConfidenceBar { confidence: view.confidence }
        }
        DetectionMethod { method: view.detection_method.clone() }
    }
}

#[component]
fn BraceletsSection(view: BraceletsView) -> Element {
    rsx! {
        div { class: "flex items-center gap-3 mb-4",
            span { class: "text-gray-700", "{view.count} detected" }
            BadgeSpan { badge: view.overall_quality.clone() }
        }
        if !view.summary.is_empty() {
            p { class: "text-gray-700 mb-4", "{view.summary}" }
        }
        div { class: "space-y-4",
            for bracelet in view.bracelets.iter().cloned() {
                BraceletCard { bracelet: bracelet }
            }
        }
        DetectionMethod { method: view.detection_method.clone() }
    }
}

#[component]
fn BraceletCard(bracelet: BraceletView) -> Element {
    let palette = BRACELET_PALETTES[bracelet.palette % BRACELET_PALETTES.len()];
    rsx! {
        div { class: "bg-gradient-to-br {palette} p-5 rounded-xl border",
            div { class: "flex justify-between items-center mb-2",
                span { class: "font-bold text-gray-900", "Bracelet #{bracelet.number} ({bracelet.position})" }
                div { class: "flex gap-2",
                    BadgeSpan { badge: bracelet.continuity.clone() }
                    BadgeSpan { badge: bracelet.clarity.clone() }
                }
            }
            p { class: "text-sm text-gray-600 mb-1", "{bracelet.description}" }
            p { class: "text-sm italic text-gray-600 mb-2", "{bracelet.traditional_meaning}" }
            ConfidenceBar { confidence: bracelet.confidence }
        }
    }
}

#[component]
fn GenericSection(view: GenericSectionView) -> Element {
    rsx! {
        div { class: "bg-gray-50 p-6 rounded-xl grid grid-cols-1 md:grid-cols-2 gap-4",
            for field in view.fields.iter() {
                div { class: "text-sm",
                    span { class: "font-semibold text-gray-700", "{field.key}: " }
                    span { class: "text-gray-600", "{field.value}" }
                }
            }
        }
    }
}
