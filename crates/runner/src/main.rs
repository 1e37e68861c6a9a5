//! Binary entry point. Loads configuration, wires every crate into one
//! running process, and dispatches to a CLI subcommand.

mod cli;
mod commands;
mod wiring;

use clap::Parser;
use cli::{Args, Command};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use vox_config::ConfigWatcher;
use vox_core::request::InputSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&args.config).await,
        Command::CheckDeps => std::process::exit(commands::check_deps(&args.config)),
        Command::ValidateConfig => std::process::exit(commands::validate_config(&args.config)),
        Command::ValidateDonations => std::process::exit(commands::validate_donations(&args.config)),
    }
}

async fn run(config_path: &std::path::Path) -> anyhow::Result<()> {
    let config = Arc::new(ConfigWatcher::new(config_path).map_err(anyhow::Error::from)?);
    let settings = config.snapshot();

    init_tracing(&settings.logging);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), config_path = %config_path.display(), "starting");

    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    let wired = wiring::build(&settings)?;
    tracing::info!(
        asr = settings.providers.get("asr").map(|m| m.len()).unwrap_or(0),
        tts = settings.providers.get("tts").map(|m| m.len()).unwrap_or(0),
        audio = settings.providers.get("audio").map(|m| m.len()).unwrap_or(0),
        llm = settings.providers.get("llm").map(|m| m.len()).unwrap_or(0),
        "provider registry built"
    );

    let wake_word = vox_wakeword::WakeWordDetector::load(settings.wake_word.clone());
    tracing::info!(
        enabled = wake_word.is_enabled(),
        load_error = ?wake_word.load_error(),
        "wake-word detector loaded (no physical audio driver wired in this core; integration is via callback per the audio-ingestion layer)"
    );

    config.clone().spawn_polling(std::time::Duration::from_secs(5));

    let state = vox_server::AppState::new(
        config.clone(),
        wired.registry.clone(),
        wired.asr.clone(),
        wired.tts.clone(),
        wired.audio.clone(),
        wired.llm.clone(),
        wired.donations.clone(),
        prometheus,
    );
    let app = vox_server::create_router(state);

    let addr = std::net::SocketAddr::from((
        settings
            .webapi
            .bind_address
            .parse::<std::net::IpAddr>()
            .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)),
        settings.webapi.port,
    ));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    let engine = Arc::new(wired.engine);
    let repl_engine = engine.clone();
    tokio::spawn(async move { run_text_repl(repl_engine).await });

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("shutdown complete");
    Ok(())
}

/// Reads newline-delimited text commands from stdin and drives them through
/// the same `run_text` workflow the HTTP surface would use for a text
/// client, matching `InputSource::Cli` existing specifically for this path.
async fn run_text_repl(engine: Arc<vox_pipeline::PipelineEngine>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "failed reading stdin command");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match engine.run_text(InputSource::Cli, "en", None, line).await {
            Ok(response) => println!("{}", response.text),
            Err(err) => tracing::warn!(error = %err, "text command failed"),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

fn init_tracing(logging: &vox_config::LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("vox={},tower_http=info", logging.level).into());
    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if logging.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}

