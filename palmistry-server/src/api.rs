use std::path::PathBuf;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{get, middleware, web, App, HttpServer, Responder};
use log::{error, info};
use palmistry_common::clock::Clock;
use palmistry_config_file::{PalmistryConfigToml, StoreBackend};
use palmistry_image_store::{
    store::ImageStore, ImageStoreTrait, PurgeExpiredRequest, StoreLimits,
};

use crate::state::ApiState;

use self::v1::image::v1_get_image;
use self::v1::upload::v1_upload;
use self::v1::upload_stats::v1_upload_stats;

pub mod v1;

/// Room left in the request body for multipart framing around the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub public_base_url: Option<String>,
    pub store_backend: StoreBackend,
    pub store_path: PathBuf,
    pub limits: StoreLimits,
    pub sweep_interval: Duration,
    pub clock: Clock,
}

impl ServerConfig {
    pub fn from_config_toml(config: &PalmistryConfigToml, clock: Clock) -> Self {
        Self {
            bind: config.server.bind.clone(),
            port: config.server.port,
            public_base_url: config.server.public_base_url.clone(),
            store_backend: config.store.backend,
            store_path: config.store.path.clone(),
            limits: StoreLimits {
                ttl: Duration::from_secs(config.store.ttl_secs),
                max_items: config.store.max_items,
                max_total_bytes: config.store.max_total_bytes,
                max_image_bytes: config.store.max_image_bytes,
            },
            sweep_interval: Duration::from_secs(config.store.sweep_interval_secs.max(1)),
            clock,
        }
    }
}

#[get("/healthz")]
pub async fn healthz() -> impl Responder {
    "ok"
}

fn open_image_store(config: &ServerConfig) -> std::io::Result<ImageStore> {
    let store = match config.store_backend {
        StoreBackend::Memory => ImageStore::new_memory(config.clock.clone(), config.limits),
        StoreBackend::Sqlite => {
            ImageStore::new_sqlite(&config.store_path, config.clock.clone(), config.limits)
        }
    };
    store.map_err(std::io::Error::other)
}

fn spawn_sweeper(store: ImageStore, sweep_interval: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let store = store.clone();
            let res =
                tokio::task::spawn_blocking(move || store.purge_expired(PurgeExpiredRequest {}))
                    .await;
            match res {
                Ok(Ok(res)) if res.purged > 0 => info!("purged {} expired images", res.purged),
                Ok(Ok(_)) => {}
                Ok(Err(e)) => error!("purge failed: {}", e),
                Err(e) => error!("purge task failed: {}", e),
            }
        }
    });
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let image_store = open_image_store(&config)?;
    let payload_limit = usize::try_from(config.limits.image_size_limit())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let state = ApiState::new(image_store.clone(), config.public_base_url.clone());

    spawn_sweeper(image_store, config.sweep_interval);

    info!(
        "listening on {}:{} ({:?} store, ttl {}s)",
        config.bind,
        config.port,
        config.store_backend,
        config.limits.ttl.as_secs()
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::PayloadConfig::new(payload_limit))
            .service(v1_upload)
            .service(v1_upload_stats)
            .service(v1_get_image)
            .service(healthz)
    })
    .bind((config.bind.as_str(), config.port))?
    .run();
    server.await
}
