//! Video relay API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vrelay_api::{create_router, metrics, ApiConfig, AppState};
use vrelay_source::HttpSourceFetcher;
use vrelay_worker::{Notifier, RelayConfig, UploadExecutor, UploadPipeline, WebhookNotifier};
use vrelay_youtube::{Credentials, YouTubeClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    let config = ApiConfig::from_env();

    init_tracing(&config)?;

    info!("Starting vrelay-api");
    info!(
        "API config: host={}, port={}, environment={}",
        config.host, config.port, config.environment
    );

    let relay_config = RelayConfig::from_env();
    info!(
        "Relay config: visibility={}, webhook={}",
        relay_config.visibility,
        if relay_config.webhook_url.is_some() { "configured" } else { "disabled" }
    );

    let executor = match build_executor(relay_config) {
        Ok(executor) => executor,
        Err(e) => {
            error!("Failed to initialize upload pipeline: {:#}", e);
            std::process::exit(1);
        }
    };

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("Failed to install Prometheus recorder")?)
    } else {
        None
    };

    let state = AppState::new(config.clone(), executor);
    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Colored output for dev, JSON in production or when `LOG_FORMAT=json`.
fn init_tracing(config: &ApiConfig) -> anyhow::Result<()> {
    let use_json = config.json_logs(std::env::var("LOG_FORMAT").ok().as_deref());

    let env_filter = EnvFilter::from_default_env().add_directive("vrelay=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    Ok(())
}

/// Wire the fetcher, platform client and optional notifier into one executor.
fn build_executor(relay_config: RelayConfig) -> anyhow::Result<UploadExecutor> {
    let credentials = Credentials::from_env().context("Platform credentials")?;
    info!("Platform credentials: {}", credentials.kind());

    let fetcher = HttpSourceFetcher::from_env().context("Source fetcher")?;
    let platform = YouTubeClient::from_env(credentials).context("YouTube client")?;

    let notifier: Option<Arc<dyn Notifier>> = match &relay_config.webhook_url {
        Some(url) => Some(Arc::new(
            WebhookNotifier::new(url.clone(), relay_config.webhook_timeout)
                .context("Webhook notifier")?,
        )),
        None => None,
    };

    let pipeline = UploadPipeline::new(Arc::new(fetcher), Arc::new(platform), notifier, relay_config);
    Ok(UploadExecutor::new(Arc::new(pipeline)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
