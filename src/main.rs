mod config;
mod history;
mod http;
mod metrics;
mod panels;
mod poller;
mod severity;
mod snapshot;
mod state;
mod surface;

use axum::serve;
use clap::Parser;
use config::{Config, RefreshHint};
use metrics::Metrics;
use poller::{HttpSource, Poller};
use std::net::SocketAddr;
use std::sync::Arc;
use surface::Board;
use tokio::net::TcpListener;
use tokio::sync::{watch, RwLock};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dashpoll")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "./config.yaml")]
    config: String,
    #[arg(long)]
    print_default_config: bool,
    /// Overrides `endpoint` from the config file.
    #[arg(long)]
    endpoint: Option<String>,
    /// Overrides `refresh_rate` (seconds).
    #[arg(long)]
    refresh_rate: Option<String>,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let mut cfg = match Config::load_from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "failed to load config");
            std::process::exit(1);
        }
    };
    if let Some(endpoint) = cli.endpoint {
        cfg.endpoint = endpoint;
    }
    if let Some(hint) = cli.refresh_rate {
        cfg.refresh_rate = Some(RefreshHint::Text(hint));
    }
    if let Err(err) = cfg.validate() {
        error!(error = %err, "invalid command line override");
        std::process::exit(1);
    }

    let refresh = cfg.refresh_interval();
    info!(
        listen = %cfg.listen,
        endpoint = %cfg.endpoint,
        refresh = %humantime::format_duration(refresh),
        timeout = %humantime::format_duration(cfg.timeout()),
        "starting dashpoll"
    );

    let board = Arc::new(RwLock::new(Board::new()));
    let metrics = match Metrics::new() {
        Ok(m) => m,
        Err(err) => {
            error!(error = %err, "failed to initialise metrics");
            std::process::exit(1);
        }
    };
    let source = match HttpSource::new(cfg.endpoint.clone(), &cfg.user_agent) {
        Ok(source) => source,
        Err(err) => {
            error!(error = %err, "failed to build HTTP client");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_task = {
        let cfg = cfg.clone();
        let metrics = metrics.clone();
        let board = board.clone();
        let mut shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            let app = http::build_router(metrics, board);
            let addr: SocketAddr = match cfg.listen.parse() {
                Ok(addr) => addr,
                Err(err) => {
                    error!(error = %err, listen = %cfg.listen, "invalid listen address");
                    return;
                }
            };

            let listener = match TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(err) => {
                    error!(error = %err, "failed to bind HTTP server");
                    return;
                }
            };

            let server = serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            });

            if let Err(err) = server.await {
                error!(error = %err, "HTTP server error");
            }
        })
    };

    let poller_task = {
        let poller = Poller::new(source, board.clone(), metrics.clone(), cfg.timeout());
        tokio::spawn(poller.run(
            refresh,
            cfg.watchdog_interval(),
            cfg.recent_success_window(),
            shutdown_rx.clone(),
        ))
    };

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to wait for Ctrl+C");
    }
    info!("Ctrl+C received, shutting down");

    let _ = shutdown_tx.send(true);

    let _ = poller_task.await;
    let _ = http_task.await;
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
