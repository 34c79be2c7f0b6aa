use crate::metrics::Metrics;
use crate::snapshot::Snapshot;
use crate::state::{CycleReport, Dashboard};
use crate::surface::Board;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("backend answered with status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payload is not a valid snapshot: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no response within {0:?}")]
    Cancelled(Duration),
}

impl FetchError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::Cancelled(_) => "timeout",
        }
    }
}

/// Where raw snapshot bodies come from.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<String, FetchError>> + Send;
}

pub struct HttpSource {
    client: Client,
    endpoint: String,
}

impl HttpSource {
    pub fn new(endpoint: impl Into<String>, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl SnapshotSource for HttpSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

pub struct Poller<S> {
    source: S,
    dashboard: Dashboard,
    board: Arc<RwLock<Board>>,
    metrics: Arc<Metrics>,
    timeout: Duration,
}

impl<S: SnapshotSource> Poller<S> {
    pub fn new(
        source: S,
        board: Arc<RwLock<Board>>,
        metrics: Arc<Metrics>,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            dashboard: Dashboard::new(),
            board,
            metrics,
            timeout,
        }
    }

    #[cfg(test)]
    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Fetch under a fresh timeout guard. On expiry the request future is
    /// dropped.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot, FetchError> {
        let text = match time::timeout(self.timeout, self.source.fetch()).await {
            Ok(result) => result?,
            Err(_elapsed) => return Err(FetchError::Cancelled(self.timeout)),
        };
        Ok(Snapshot::from_json(&text)?)
    }

    pub async fn poll(&mut self) -> Result<CycleReport, FetchError> {
        match self.fetch_snapshot().await {
            Ok(snapshot) => {
                let report = {
                    let mut board = self.board.write().await;
                    self.dashboard
                        .apply_snapshot(&snapshot, &mut *board, Instant::now())
                };
                self.record_success(&report);
                debug!(timestamp = snapshot.timestamp, "poll succeeded");
                Ok(report)
            }
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "poll failed");
                {
                    let mut board = self.board.write().await;
                    self.dashboard.apply_failure(&mut *board);
                }
                self.metrics.record_poll(err.kind());
                self.metrics.set_connection(self.dashboard.connection());
                Err(err)
            }
        }
    }

    pub async fn check_watchdog(&mut self, window: Duration) {
        let forced = {
            let mut board = self.board.write().await;
            self.dashboard.watchdog(Instant::now(), window, &mut *board)
        };
        if forced {
            info!("recent snapshot seen, connection indicator restored");
            self.metrics.set_connection(self.dashboard.connection());
        }
    }

    /// Single-flight loop: a poll runs inside the select arm, so ticks that
    /// fall due while it is pending are skipped. Shutdown abandons an
    /// in-flight poll.
    pub async fn run(
        mut self,
        refresh: Duration,
        watchdog_every: Duration,
        window: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = time::interval(refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut watchdog = time::interval_at(Instant::now() + watchdog_every, watchdog_every);
        watchdog.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("shutdown signal received, stopping poller");
                    break;
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = shutdown.changed() => {
                            info!("shutdown signal received, abandoning in-flight poll");
                            break;
                        }
                        _ = self.poll() => {}
                    }
                }
                _ = watchdog.tick() => {
                    self.check_watchdog(window).await;
                }
            }
        }
    }

    fn record_success(&self, report: &CycleReport) {
        self.metrics.record_poll("success");
        self.metrics.mark_success();
        self.metrics.set_connection(self.dashboard.connection());
        self.metrics.set_full_access(self.dashboard.full_access());
        for panel in &report.failed_panels {
            self.metrics.inc_panel_error(panel);
        }
        if let Some(usage) = report.cpu_usage {
            self.metrics.cpu_usage_percent.set(usage);
        }
        if let Some(usage) = report.memory_usage {
            self.metrics.memory_usage_percent.set(usage);
        }
    }
}
