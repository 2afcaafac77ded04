mod config;
mod errors;
mod llm_client;
mod models;
mod pdf;
mod platform;
mod review;
mod routes;
mod state;
mod util;
mod view;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pdf::MupdfRasterizer;
use crate::platform::ai::LlmAiService;
use crate::platform::auth::RedisSessionStore;
use crate::platform::fs::S3BlobStore;
use crate::platform::kv::RedisKvStore;
use crate::platform::Platform;
use crate::routes::build_router;
use crate::state::AppState;

const READINESS_RETRY: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ResumeIQ API v{}", env!("CARGO_PKG_VERSION"));

    // Redis backs both sessions and resume records
    let redis = redis::Client::open(config.redis_url.clone())?;
    let sessions = Arc::new(RedisSessionStore::new(redis.clone(), config.session_ttl_secs));
    let kv = Arc::new(RedisKvStore::new(redis));
    info!("Redis client initialized");

    let s3 = build_s3_client(&config).await;
    let fs = Arc::new(S3BlobStore::new(s3, config.s3_bucket.clone()));
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    let ai = Arc::new(LlmAiService::new(llm, fs.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let platform = Platform::new(sessions, fs, kv, ai);
    let mut readiness = platform.subscribe();
    tokio::spawn(async move {
        while readiness.changed().await.is_ok() {
            let state = readiness.borrow().clone();
            info!(?state, "Platform readiness changed");
        }
    });
    // Not fatal: protected routes answer 503 and /health shows the reason
    // until a later probe succeeds.
    platform.initialize().await;
    let probe = platform.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(READINESS_RETRY);
        loop {
            interval.tick().await;
            probe.ensure_ready().await;
        }
    });

    let state = AppState {
        platform,
        pdf: Arc::new(MupdfRasterizer),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resumeiq-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
