// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `courier-agent`: run inside the interactive session.

use std::ffi::OsStr;

use anyhow::{Context, Result};
use clap::Parser;
use courier_adapters::NativeSystem;
use courier_agent::lifecycle::signal_or_pending;
use courier_agent::{platform_policy, startup, Config, Dispatcher, ListenerConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "courier-agent", version, about = "User-session agent for the courier service")]
struct Args {
    /// Also log to stderr
    #[arg(long)]
    foreground: bool,

    /// Endpoint name (overrides COURIER_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(name) = args.endpoint {
        config.endpoint = courier_wire::Endpoint::new(name);
    }
    std::fs::create_dir_all(&config.state_dir)
        .with_context(|| format!("creating {}", config.state_dir.display()))?;
    let _guard = init_tracing(&config, args.foreground);

    let policy = platform_policy()?;
    let (lock, listener) = startup(
        &config,
        policy.as_ref(),
        Dispatcher::new(NativeSystem::new()),
        ListenerConfig::default(),
    )?;

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    info!(pid = std::process::id(), endpoint = %config.endpoint, "agent ready");
    listener.run(shutdown).await;
    lock.release();
    Ok(())
}

/// File log at `<state_dir>/agent.log`, plus stderr in the foreground.
fn init_tracing(config: &Config, foreground: bool) -> WorkerGuard {
    let dir = config.log_path.parent().unwrap_or(&config.state_dir);
    let file_name = config.log_path.file_name().unwrap_or(OsStr::new("agent.log"));
    let (file, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = foreground.then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(file).with_ansi(false))
        .with(stderr)
        .init();
    guard
}

async fn watch_signals(shutdown: CancellationToken) {
    tokio::select! {
        _ = signal_or_pending("ctrl-c", tokio::signal::ctrl_c()) => {}
        _ = terminate() => {}
    }
    info!("shutdown requested");
    shutdown.cancel();
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    signal_or_pending("SIGTERM", async {
        signal(SignalKind::terminate())?.recv().await;
        Ok::<(), std::io::Error>(())
    })
    .await
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await
}
