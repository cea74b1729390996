//! Sahayak CLI
//!
//! Loads configuration, connects the model providers once and serves the
//! gateway HTTP API until Ctrl+C.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use sahayak_gateway::{create_router, AppState, Config, GenerationProvider};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Sahayak - AI teaching assistant gateway
///
/// Serves localized content, worksheets, visual aids and reading assessments
/// backed by a local model server with a cloud model as fallback.
#[derive(Parser, Debug)]
#[command(name = "sahayak")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: sahayak.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Address to bind (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Values already in the environment win over .env
    let dotenv = dotenvy::dotenv();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) => tracing::debug!(error = %e, "No .env loaded"),
    }
    tracing::info!("Sahayak gateway starting");
    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads configuration, builds providers and serves until Ctrl+C.
async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    config.apply_env();

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);

    tokio::fs::create_dir_all(&config.visual.upload_dir)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to create upload directory '{}': {e}\n\nSuggestion: Check permissions or set visual.uploadDir",
                config.visual.upload_dir
            )
        })?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            anyhow::anyhow!(
                "Invalid listen address '{}:{}': {e}\n\nSuggestion: Use an IP address such as 0.0.0.0 for --host",
                config.server.host,
                config.server.port
            )
        })?;

    println!();
    println!("Connecting providers...");
    let state = AppState::connect(config).await;
    print_providers(&state).await;

    let router = create_router(state);
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!();
    println!("Sahayak gateway running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("Sahayak gateway stopped");
    Ok(())
}

/// Resolves when Ctrl+C is received.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    tracing::info!("Received Ctrl+C, shutting down");
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Prints the loaded configuration. Keys are reported only as present or absent.
fn print_config(config: &Config) {
    let key_status = |present: bool| if present { "set" } else { "not set" };

    println!("Configuration loaded:");
    println!("  Listen: {}:{}", config.server.host, config.server.port);
    println!("  Static files: {}", config.server.static_dir);
    println!("  Local model: {} at {}", config.local_model.preferred_model, config.local_model.base_url);
    println!("  Cloud model: {} (API key {})", config.cloud_model.model, key_status(config.cloud_model.api_key().is_some()));
    println!("  Image generation key: {}", key_status(config.visual.stability_key().is_some()));
    println!(
        "  Routing: content={} knowledge={} lessons={} worksheets={} assessment={} visuals={}",
        config.routing.content,
        config.routing.knowledge,
        config.routing.lessons,
        config.routing.worksheets,
        config.routing.assessment,
        config.routing.visuals
    );
}

/// Prints provider availability after startup probing.
async fn print_providers(state: &AppState) {
    for provider in [&state.local, &state.cloud] {
        let snapshot = provider.state().await;
        match snapshot.model {
            Some(model) if snapshot.available => {
                println!("  {} provider: available ({model})", provider.kind());
            }
            _ => println!("  {} provider: unavailable, fallback text will be served", provider.kind()),
        }
    }
    for strategy in state.visuals.strategies() {
        let status = if strategy.configured { "ready" } else { "not configured" };
        println!("  visual strategy {}: {status}", strategy.strategy);
    }
}
