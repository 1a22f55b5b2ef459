use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::info;
use palmistry_api_client::{analysis::AnalysisApiClient, upload::PalmistryApiClient, ApiClientError};
use palmistry_config_file::{ConfigError, PalmistryConfigToml, SubmitModeToml};
use palmistry_page::{
    prepare::PrepareOptions,
    result::AnalysisResult,
    session::{AnalysisSession, SessionOptions, SubmitMode},
    state::{InvalidTransition, PageState, SelectedImage},
    view::ResultView,
};

use crate::{
    args::{AnalyzeArgs, Args, Commands},
    backend::HttpBackend,
    report::render_report,
};

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    IO(std::io::Error),
    Api(ApiClientError),
    Transition(InvalidTransition),
    Json(serde_json::Error),
    Report(std::fmt::Error),
    InvalidResultImage,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "{e}"),
            CliError::IO(e) => write!(f, "{e}"),
            CliError::Api(e) => write!(f, "{e}"),
            CliError::Transition(e) => write!(f, "{e}"),
            CliError::Json(e) => write!(f, "{e}"),
            CliError::Report(e) => write!(f, "{e}"),
            CliError::InvalidResultImage => write!(f, "the result image is not a base64 data URL"),
        }
    }
}

impl std::error::Error for CliError {}

pub fn run(args: Args) -> Result<ExitCode, CliError> {
    let config = PalmistryConfigToml::load(args.config.as_deref()).map_err(CliError::Config)?;
    match args.subcommand {
        Commands::Analyze(analyze_args) => run_analyze(&config, analyze_args),
        Commands::Stats { server } => run_stats(&config, server),
    }
}

/// Where the upload proxy is expected when `--server` is not given.
pub fn default_server_url(config: &PalmistryConfigToml) -> String {
    config
        .server
        .public_base_url
        .clone()
        .unwrap_or_else(|| format!("http://localhost:{}", config.server.port))
}

pub fn session_options(config: &PalmistryConfigToml, args: &AnalyzeArgs) -> SessionOptions {
    let mode = match (args.inline, config.analysis.submit_mode) {
        (true, _) | (false, SubmitModeToml::InlineDataUrl) => SubmitMode::InlineDataUrl,
        (false, SubmitModeToml::UploadProxy) => SubmitMode::UploadProxy,
    };
    let prepare = (config.analysis.prepare && !args.no_prepare).then_some(PrepareOptions {
        max_dimension: config.analysis.max_dimension,
        jpeg_quality: config.analysis.jpeg_quality,
    });
    SessionOptions { mode, prepare }
}

fn run_analyze(config: &PalmistryConfigToml, args: AnalyzeArgs) -> Result<ExitCode, CliError> {
    let data = std::fs::read(&args.image).map_err(CliError::IO)?;
    let file_name = args
        .image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let image = SelectedImage::new(file_name, data);

    let server_url = args
        .server
        .clone()
        .unwrap_or_else(|| default_server_url(config));
    let api_url = args
        .api_url
        .clone()
        .unwrap_or_else(|| config.analysis.api_url.clone());
    let backend = HttpBackend {
        upload_client: PalmistryApiClient::new(server_url),
        analysis_client: AnalysisApiClient::with_timeout(
            api_url,
            config.analysis.timeout_secs.map(Duration::from_secs),
        ),
    };

    let mut session = AnalysisSession::new(backend, session_options(config, &args));
    session.select_file(image).map_err(CliError::Transition)?;
    match session.submit().map_err(CliError::Transition)? {
        PageState::Result { result, .. } => {
            if args.json {
                println!("{}", result_json(result).map_err(CliError::Json)?);
            } else {
                let report = render_report(&ResultView::new(result)).map_err(CliError::Report)?;
                print!("{}", report);
            }
            if let Some(path) = &args.save_image {
                save_result_image(result, path)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        PageState::Error { message, .. } => {
            eprintln!("{}", message);
            Ok(ExitCode::FAILURE)
        }
        state => {
            eprintln!("analysis ended in state {}", state.name());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_stats(config: &PalmistryConfigToml, server: Option<String>) -> Result<ExitCode, CliError> {
    let server_url = server.unwrap_or_else(|| default_server_url(config));
    let client = PalmistryApiClient::new(server_url);
    let stats = client.v1_upload_stats().map_err(CliError::Api)?;
    println!("stored: {}", stats.stored);
    println!("total bytes: {}", stats.total_bytes);
    Ok(ExitCode::SUCCESS)
}

/// The response without the annotated image, which is usually megabytes of
/// base64.
fn result_json(result: &AnalysisResult) -> Result<String, serde_json::Error> {
    let value = serde_json::json!({
        "runId": result.run_id,
        "analysis": result.analysis,
        "lines": result.lines,
        "imageMeta": result.image_meta,
        "processingSteps": result.processing_steps,
    });
    serde_json::to_string_pretty(&value)
}

pub fn decode_data_url(data_url: &str) -> Option<Vec<u8>> {
    let (header, payload) = data_url.strip_prefix("data:")?.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    STANDARD.decode(payload).ok()
}

fn save_result_image(result: &AnalysisResult, path: &Path) -> Result<(), CliError> {
    // The backend may also send bare base64.
    let data = decode_data_url(&result.image_base64)
        .or_else(|| STANDARD.decode(&result.image_base64).ok())
        .filter(|data| !data.is_empty())
        .ok_or(CliError::InvalidResultImage)?;
    std::fs::write(path, &data).map_err(CliError::IO)?;
    info!("wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}
