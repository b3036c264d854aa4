use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ragdocs_core::config::Config;
use ragdocs_qa::Rag;
use ragdocs_server::{app, ApiState};

/// Serve question answering over HTTP.
#[derive(Debug, Parser)]
#[command(name = "ragdocs-server", version)]
struct ServerArgs {
    /// Overrides the configured bind address
    #[arg(long)]
    host: Option<String>,

    /// Overrides the configured port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .ok();

    let args = ServerArgs::parse();
    let settings = Config::load().context("loading configuration")?.settings()?;
    let host = args.host.unwrap_or_else(|| settings.host.clone());
    let port = args.port.unwrap_or(settings.port);

    let rag = Rag::from_settings(&settings).await?;
    let state = ApiState::new(rag, settings.default_top_k);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("binding {host}:{port}"))?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
