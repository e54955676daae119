//! Pen2PDF 后端服务：加载配置、装配各 provider，并在 axum 上提供路由
//!
//! Usage:
//!   pen2pdf-server                 Serve with pen2pdf.yaml (or defaults)
//!
//! ENVIRONMENT:
//!   PEN2PDF_CONFIG        Config file path (default pen2pdf.yaml)
//!   PEN2PDF_PORT / PORT   Listen port override
//!   PEN2PDF_LOG_FORMAT    `json` for JSON log lines
//!   RUST_LOG              Log filter (default info)

use anyhow::Context;
use pen2pdf_ai::catalog::Backend;
use pen2pdf_ai::server::{self, AppState};
use pen2pdf_ai::{SuiteClient, SuiteConfig};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("PEN2PDF_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SuiteConfig::load().context("failed to load configuration")?;
    let client = SuiteClient::from_config(&config).context("failed to build suite client")?;

    for backend in Backend::ALL {
        info!(
            backend = backend.as_str(),
            configured = client.is_backend_configured(backend),
            models = client.catalog().model_ids(backend).len(),
            "backend ready"
        );
    }

    if config.server.discover_models {
        for backend in Backend::ALL {
            if !client.is_backend_configured(backend) {
                continue;
            }
            match client.refresh_models(backend).await {
                Ok(changed) => info!(backend = backend.as_str(), changed, "model discovery finished"),
                Err(e) => warn!(backend = backend.as_str(), error = %e, "model discovery failed, keeping static list"),
            }
        }
    }

    let app = server::router_with_limit(AppState::in_memory(client), config.server.body_limit_bytes);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
