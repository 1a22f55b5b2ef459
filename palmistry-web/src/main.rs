#![allow(non_snake_case)]

mod analyze;
mod result;

use dioxus::html::FileEngine;
use dioxus::prelude::*;
use palmistry_page::state::{PageEffect, PageEvent, PageState, SelectedImage};
use tracing::Level;

use crate::result::ResultPage;

#[derive(Clone, Routable, Debug, PartialEq)]
enum Route {
    #[route("/")]
    Home {},
}

fn main() {
    // Init logger
    dioxus_logger::init(Level::INFO).expect("failed to init logger");
    launch(App);
}

fn App() -> Element {
    rsx! {
        Router::<Route> {}
    }
}

pub(crate) fn dispatch(mut state: Signal<PageState>, event: PageEvent) -> Option<PageEffect> {
    match state.write().handle(event) {
        Ok(effect) => effect,
        Err(e) => {
            log::warn!("ignored: {}", e);
            None
        }
    }
}

fn submit(state: Signal<PageState>) {
    if let Some(PageEffect::StartAnalysis(image)) = dispatch(state, PageEvent::Submit) {
        spawn(async move {
            let event = match analyze::analyze_inline(&image).await {
                Ok(result) => PageEvent::AnalysisSucceeded(result),
                Err(e) => {
                    log::error!("analysis failed: {}", e);
                    PageEvent::AnalysisFailed(e)
                }
            };
            dispatch(state, event);
        });
    }
}

#[component]
fn Home() -> Element {
    let state = use_signal(PageState::default);
    let has_result = state.read().result().is_some();

    rsx! {
        main { class: "min-h-screen bg-gradient-to-br from-blue-50 via-white to-purple-50",
            header { class: "bg-white shadow-sm",
                div { class: "container mx-auto px-4 py-6",
                    h1 { class: "text-4xl font-bold text-gray-900", "Palmistry AI Analysis" }
                    p { class: "text-gray-600 mt-2",
                        "Advanced palm reading powered by deep learning and computer vision"
                    }
                }
            }
            div { class: "container mx-auto px-4 py-12",
                if has_result {
                    ResultPage { state: state }
                } else {
                    UploadCard { state: state }
                }
            }
            footer { class: "bg-white border-t mt-16",
                div { class: "container mx-auto px-4 py-6 text-center text-gray-600",
                    "🖐️ Palmistry AI • Powered by Deep Learning & Computer Vision"
                }
            }
        }
    }
}

#[component]
fn UploadCard(state: Signal<PageState>) -> Element {
    let current = state.read();
    let preview = current.image().map(SelectedImage::data_url);
    let loading = current.is_loading();
    let can_submit = current.can_submit();
    let error = current.error_message().map(str::to_string);
    drop(current);

    rsx! {
        div { class: "max-w-2xl mx-auto",
            div { class: "bg-white rounded-2xl shadow-lg p-8",
                h2 { class: "text-2xl font-bold text-gray-900 mb-6", "Upload Palm Image" }
                div { class: "border-2 border-dashed border-gray-300 rounded-xl p-8 text-center hover:border-blue-500 transition-colors",
                    input {
                        r#type: "file",
                        accept: "image/*",
                        class: "hidden",
                        id: "file-upload",
                        disabled: loading,
                        onchange: move |evt: FormEvent| async move {
                            let Some(file_engine) = evt.files() else {
                                return;
                            };
                            let Some(file_name) = file_engine.files().into_iter().next() else {
                                return;
                            };
                            match file_engine.read_file(&file_name).await {
                                Some(data) => {
                                    dispatch(state, PageEvent::SelectFile(SelectedImage::new(file_name, data)));
                                }
                                None => log::warn!("could not read {}", file_name),
                            }
                        }
                    }
                    label { r#for: "file-upload", class: "cursor-pointer",
                        if let Some(preview) = preview.clone() {
                            div { class: "space-y-4",
                                img { src: "{preview}", alt: "Preview", class: "max-w-md mx-auto rounded-lg shadow-md" }
                                p { class: "text-sm text-gray-600", "Click to change image" }
                            }
                        } else {
                            div { class: "space-y-4",
                                div { class: "text-6xl", "📸" }
                                p { class: "text-lg font-medium text-gray-900", "Click to upload" }
                                p { class: "text-sm text-gray-500 mt-1", "PNG, JPG, WEBP up to 10MB" }
                            }
                        }
                    }
                }
                if preview.is_some() {
                    button {
                        class: "mt-6 w-full bg-blue-600 text-white py-4 px-6 rounded-xl font-semibold hover:bg-blue-700 disabled:bg-gray-400 disabled:cursor-not-allowed transition-colors text-lg",
                        disabled: loading || !can_submit,
                        onclick: move |_| submit(state),
                        if loading {
                            "Analyzing... (10-30 seconds)"
                        } else {
                            "🔍 Analyze Palm"
                        }
                    }
                }
                if let Some(error) = error {
                    div { class: "mt-4 p-4 bg-red-50 border border-red-200 rounded-lg text-red-700",
                        "❌ {error}"
                    }
                }
                Tips {}
            }
        }
    }
}

#[component]
fn Tips() -> Element {
    let tips = [
        "Use good lighting",
        "Keep hand flat",
        "Spread fingers slightly",
        "Use plain background",
        "Ensure palm faces camera",
    ];
    rsx! {
        div { class: "mt-8 p-6 bg-blue-50 rounded-xl",
            h3 { class: "font-semibold text-gray-900 mb-3", "💡 Tips for Best Results" }
            ul { class: "space-y-2 text-sm text-gray-700",
                for tip in tips {
                    li { "• {tip}" }
                }
            }
        }
    }
}
