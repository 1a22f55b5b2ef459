use std::time::{Duration, SystemTime};

use actix_web::{post, web, App, HttpResponse, HttpServer};
use palmistry::backend::HttpBackend;
use palmistry_api_client::{analysis::AnalysisApiClient, upload::PalmistryApiClient};
use palmistry_api_schema::analyze::AnalyzeRequest;
use palmistry_common::clock::Clock;
use palmistry_config_file::{PalmistryConfigToml, StoreBackend};
use palmistry_page::{
    session::{AnalysisSession, SessionOptions, SubmitMode},
    state::{PageState, SelectedImage},
};
use palmistry_server::api::{run_server, ServerConfig};
use serde_json::json;
use serial_test::serial;
use tempfile::tempdir;
use tokio::runtime::{Builder, Runtime};

const JPEG_BYTES: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

fn fixed_clock() -> Clock {
    let fixed_system_time = SystemTime::UNIX_EPOCH + Duration::from_secs(40 * 365 * 24 * 60 * 60);
    Clock::new_with_fixed_time(fixed_system_time)
}

fn runtime() -> Runtime {
    Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

fn server_config(port: u16, clock: Clock) -> ServerConfig {
    let mut config = PalmistryConfigToml::default();
    config.server.bind = "127.0.0.1".to_string();
    config.server.port = port;
    config.server.public_base_url = Some(format!("http://localhost:{}", port));
    ServerConfig::from_config_toml(&config, clock)
}

fn start_server(runtime: &Runtime, config: ServerConfig) {
    runtime.spawn(async {
        run_server(config).await.unwrap();
    });
}

/// Fetches `imageUrl` like the real backend does and describes what it got.
#[post("/ok/analyze")]
async fn ok_analyze(req: web::Json<AnalyzeRequest>) -> actix_web::Result<HttpResponse> {
    let image_url = req.into_inner().image_url;
    let fetched = web::block(move || {
        PalmistryApiClient::new(String::new())
            .v1_get_image(&image_url)
            .map_err(|e| e.to_string())
    })
    .await
    .map_err(actix_web::error::ErrorInternalServerError)?
    .map_err(actix_web::error::ErrorBadGateway)?;

    Ok(HttpResponse::Ok().json(json!({
        "runId": format!("run-{}", fetched.data.len()),
        "lines": [{ "type": "heart" }, { "type": "head" }],
        "imageMeta": { "contentType": fetched.content_type },
        "analysis": {
            "quadrangle": { "success": true, "detected": true, "shape": "rectangular" },
            "moles": "unavailable"
        }
    })))
}

#[post("/shapeless/analyze")]
async fn shapeless_analyze() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/json")
        .body("42")
}

#[post("/fail/analyze")]
async fn fail_analyze() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({ "runId": "run-0", "lines": [] }))
}

fn start_fake_backend(runtime: &Runtime, port: u16) {
    runtime.spawn(async move {
        HttpServer::new(|| {
            App::new()
                .service(ok_analyze)
                .service(shapeless_analyze)
                .service(fail_analyze)
        })
            .bind(("127.0.0.1", port))
            .unwrap()
            .run()
            .await
            .unwrap();
    });
}

fn wait_for_servers() {
    std::thread::sleep(Duration::from_secs(1));
}

#[test]
#[serial]
fn test_upload_and_get_image() {
    let runtime = runtime();
    start_server(&runtime, server_config(18521, fixed_clock()));
    wait_for_servers();

    let client = PalmistryApiClient::new("http://localhost:18521".to_string());
    let upload_res = client.v1_upload("palm.jpg", "image/jpeg", JPEG_BYTES).unwrap();
    assert!(upload_res
        .image_url
        .starts_with("http://localhost:18521/api/image/"));

    let fetched = client.v1_get_image(&upload_res.image_url).unwrap();
    assert_eq!(fetched.data, JPEG_BYTES);
    assert_eq!(fetched.content_type, "image/jpeg");

    // readable more than once
    let fetched = client.v1_get_image(&upload_res.image_url).unwrap();
    assert_eq!(fetched.data, JPEG_BYTES);

    let stats = client.v1_upload_stats().unwrap();
    insta::assert_debug_snapshot!(stats, @r###"
    V1UploadStatsResponse {
        stored: 1,
        total_bytes: 11,
    }
    "###);
}

#[test]
#[serial]
fn test_unknown_image_is_not_found() {
    let runtime = runtime();
    start_server(&runtime, server_config(18522, fixed_clock()));
    wait_for_servers();

    let client = PalmistryApiClient::new("http://localhost:18522".to_string());
    let unknown_id = "A".repeat(43);
    let err = client.v1_get_image(&unknown_id).unwrap_err();
    assert_eq!(err.status(), Some(404));

    let err = client.v1_get_image("not-an-id").unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[test]
#[serial]
fn test_image_expires_after_ttl() {
    let runtime = runtime();
    let clock = fixed_clock();
    start_server(&runtime, server_config(18523, clock.clone()));
    wait_for_servers();

    let client = PalmistryApiClient::new("http://localhost:18523".to_string());
    let upload_res = client.v1_upload("palm.png", "image/png", b"png bytes").unwrap();

    clock.advance(Duration::from_secs(299));
    let fetched = client.v1_get_image(&upload_res.image_url).unwrap();
    assert_eq!(fetched.content_type, "image/png");

    clock.advance(Duration::from_secs(1));
    let err = client.v1_get_image(&upload_res.image_url).unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(client.v1_upload_stats().unwrap().stored, 0);
}

#[test]
#[serial]
fn test_sqlite_store() {
    let runtime = runtime();
    let tempdir = tempdir().unwrap();
    let mut config = server_config(18524, fixed_clock());
    config.store_backend = StoreBackend::Sqlite;
    config.store_path = tempdir.path().to_path_buf();
    start_server(&runtime, config);
    wait_for_servers();

    let client = PalmistryApiClient::new("http://localhost:18524".to_string());
    let upload_res = client.v1_upload("palm.jpg", "image/jpeg", JPEG_BYTES).unwrap();
    let fetched = client.v1_get_image(&upload_res.image_url).unwrap();
    assert_eq!(fetched.data, JPEG_BYTES);
    assert!(tempdir.path().join("images.sqlite").exists());
}

fn count_files(dir: &std::path::Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

#[test]
#[serial]
fn test_sweeper_purges_expired_images() {
    let runtime = runtime();
    let tempdir = tempdir().unwrap();
    let clock = fixed_clock();
    let mut config = server_config(18527, clock.clone());
    config.store_backend = StoreBackend::Sqlite;
    config.store_path = tempdir.path().to_path_buf();
    config.sweep_interval = Duration::from_millis(100);
    start_server(&runtime, config);
    wait_for_servers();

    let client = PalmistryApiClient::new("http://localhost:18527".to_string());
    client.v1_upload("palm.jpg", "image/jpeg", JPEG_BYTES).unwrap();
    let objects_dir = tempdir.path().join("objects");
    assert_eq!(count_files(&objects_dir), 1);

    clock.advance(Duration::from_secs(300));
    std::thread::sleep(Duration::from_millis(500));

    // nothing read the image, so only the sweeper can have removed it
    assert_eq!(count_files(&objects_dir), 0);
    assert_eq!(client.v1_upload_stats().unwrap().stored, 0);
}

fn session(server_port: u16, api_url: String, mode: SubmitMode) -> AnalysisSession<HttpBackend> {
    let backend = HttpBackend {
        upload_client: PalmistryApiClient::new(format!("http://localhost:{}", server_port)),
        analysis_client: AnalysisApiClient::with_timeout(api_url, Some(Duration::from_secs(10))),
    };
    AnalysisSession::new(
        backend,
        SessionOptions {
            mode,
            prepare: None,
        },
    )
}

fn selected_image() -> SelectedImage {
    SelectedImage::new("palm.jpg".to_string(), JPEG_BYTES.to_vec())
}

#[test]
#[serial]
fn test_analysis_through_upload_proxy() {
    let runtime = runtime();
    start_server(&runtime, server_config(18525, fixed_clock()));
    start_fake_backend(&runtime, 18625);
    wait_for_servers();

    let mut session = session(
        18525,
        "http://localhost:18625/ok".to_string(),
        SubmitMode::UploadProxy,
    );
    session.select_file(selected_image()).unwrap();
    let state = session.submit().unwrap();
    let PageState::Result { result, .. } = state else {
        panic!("expected a result, got {:?}", state);
    };
    assert_eq!(result.run_id, format!("run-{}", JPEG_BYTES.len()));
    assert_eq!(result.lines.len(), 2);
    assert_eq!(result.image_meta.get("contentType"), Some(&json!("image/jpeg")));
    assert!(result.analysis.quadrangle().is_some());
    assert!(result.analysis.generic_sections().is_empty());
}

#[test]
#[serial]
fn test_non_object_ok_body_reaches_result() {
    let runtime = runtime();
    start_server(&runtime, server_config(18528, fixed_clock()));
    start_fake_backend(&runtime, 18628);
    wait_for_servers();

    let mut session = session(
        18528,
        "http://localhost:18628/shapeless".to_string(),
        SubmitMode::UploadProxy,
    );
    session.select_file(selected_image()).unwrap();
    let state = session.submit().unwrap();
    assert_eq!(state.name(), "Result");
    assert_eq!(state.result().unwrap().run_id, "");
}

#[test]
#[serial]
fn test_non_ok_backend_status_is_error() {
    let runtime = runtime();
    start_server(&runtime, server_config(18526, fixed_clock()));
    start_fake_backend(&runtime, 18626);
    wait_for_servers();

    for mode in [SubmitMode::UploadProxy, SubmitMode::InlineDataUrl] {
        let mut session = session(18526, "http://localhost:18626/fail".to_string(), mode);
        session.select_file(selected_image()).unwrap();
        let state = session.submit().unwrap();
        assert_eq!(state.error_message(), Some("Analysis failed"));

        // the image stays selected for a retry
        assert!(state.can_submit());
    }
}

#[test]
#[serial]
fn test_unreachable_proxy_and_backend() {
    let mut session = session(
        18599,
        "http://localhost:18699".to_string(),
        SubmitMode::UploadProxy,
    );
    session.select_file(selected_image()).unwrap();
    let state = session.submit().unwrap();
    let message = state.error_message().unwrap();
    assert_ne!(message, "Failed to upload image");
    assert!(!message.is_empty());
}
