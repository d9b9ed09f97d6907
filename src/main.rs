use clap::Parser;
use dotenvy::dotenv;
use media_gallery::config::GalleryConfig;
use media_gallery::infrastructure::{staging, storage};
use media_gallery::services::transcoder::FfmpegTranscoder;
use media_gallery::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about = "Media gallery backend")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_gallery=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Media Gallery...");

    let config = GalleryConfig::from_env();
    info!(
        "🛡️  Gallery Config: Cache={}MB, TTL={}s, Max Files={}, Rollback={}",
        config.max_cache_bytes / 1024 / 1024,
        config.cache_ttl_secs,
        config.max_files_per_upload,
        config.rollback_failed_batches
    );
    if config.auth_password.is_none() {
        warn!("⚠️  AUTH_PASSWORD is not set, gallery and upload routes are unauthenticated");
    }

    // Setup Infrastructure
    staging::setup_staging_dir(&config.staging_dir).await?;
    let storage_service = storage::setup_storage().await?;
    let transcoder = Arc::new(FfmpegTranscoder::from_config(&config));

    let state = AppState::new(config, storage_service, transcoder);
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
