use crate::history::{HistorySeries, TrendSink, UpdateMode};
use crate::panels::cpu::CpuPanel;
use crate::panels::disks::DisksPanel;
use crate::panels::gpus::GpusPanel;
use crate::panels::memory::MemoryPanel;
use crate::panels::network::NetworkPanel;
use crate::panels::processes::ProcessesPanel;
use crate::panels::system::SystemPanel;
use crate::panels::temperature::TemperaturePanel;
use crate::panels::{dispatch, Panel};
use crate::snapshot::Snapshot;
use crate::surface::{ChartSurface, PanelSink, SurfaceId};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Idle,
    Connected,
    Error,
}

impl ConnectionState {
    pub const fn gauge_value(self) -> f64 {
        match self {
            Self::Idle => 0.0,
            Self::Connected => 1.0,
            Self::Error => 2.0,
        }
    }
}

/// Elevated-capability flag. Once observed it stays set for the process
/// lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilityLatch(bool);

impl CapabilityLatch {
    pub fn observe(&mut self, flag: bool) {
        self.0 |= flag;
    }

    pub fn is_set(self) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub failed_panels: Vec<&'static str>,
    pub cpu_usage: Option<f64>,
    pub memory_usage: Option<f64>,
}

#[derive(Debug, Default)]
pub struct Dashboard {
    connection: ConnectionState,
    capability: CapabilityLatch,
    cpu_history: HistorySeries,
    memory_history: HistorySeries,
    last_success: Option<Instant>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn full_access(&self) -> bool {
        self.capability.is_set()
    }

    #[cfg(test)]
    pub fn cpu_history(&self) -> &HistorySeries {
        &self.cpu_history
    }

    #[cfg(test)]
    pub fn memory_history(&self) -> &HistorySeries {
        &self.memory_history
    }

    pub fn apply_snapshot(
        &mut self,
        snapshot: &Snapshot,
        sink: &mut dyn PanelSink,
        now: Instant,
    ) -> CycleReport {
        self.last_success = Some(now);
        self.set_connection(ConnectionState::Connected, sink);
        self.capability.observe(snapshot.running_with_sudo());

        let mut failed = Vec::new();
        let system = SystemPanel {
            full_access: self.capability.is_set(),
        };
        run_panel(&system, Some(&snapshot.system), sink, &mut failed);
        let cpu = run_panel(&CpuPanel, snapshot.cpu.as_ref(), sink, &mut failed);
        let memory = run_panel(&MemoryPanel, snapshot.memory.as_ref(), sink, &mut failed);
        run_panel(&ProcessesPanel, snapshot.processes.as_ref(), sink, &mut failed);
        run_panel(&DisksPanel, snapshot.disks.as_ref(), sink, &mut failed);
        run_panel(&GpusPanel, snapshot.gpus.as_ref(), sink, &mut failed);
        run_panel(&NetworkPanel, snapshot.network.as_ref(), sink, &mut failed);
        run_panel(&TemperaturePanel, snapshot.temperature.as_ref(), sink, &mut failed);

        let cpu_usage = cpu.map(|v| v.usage);
        let memory_usage = memory.map(|v| v.usage);
        if let Some(usage) = cpu_usage {
            self.cpu_history.push(usage);
            ChartSurface::new(sink, SurfaceId::CpuChart)
                .redraw(&self.cpu_history.snapshot(), UpdateMode::NoAnimation);
        }
        if let Some(usage) = memory_usage {
            self.memory_history.push(usage);
            ChartSurface::new(sink, SurfaceId::MemoryChart)
                .redraw(&self.memory_history.snapshot(), UpdateMode::NoAnimation);
        }

        debug!(
            timestamp = snapshot.timestamp,
            failed = failed.len(),
            "snapshot applied"
        );
        CycleReport {
            failed_panels: failed,
            cpu_usage,
            memory_usage,
        }
    }

    /// Poll-level failure: only the connection indicator changes.
    pub fn apply_failure(&mut self, sink: &mut dyn PanelSink) {
        self.set_connection(ConnectionState::Error, sink);
    }

    /// Returns true when the indicator was forced back to connected.
    pub fn watchdog(&mut self, now: Instant, window: Duration, sink: &mut dyn PanelSink) -> bool {
        let recent = self
            .last_success
            .map(|at| now.saturating_duration_since(at) <= window)
            .unwrap_or(false);
        if recent && self.connection != ConnectionState::Connected {
            self.set_connection(ConnectionState::Connected, sink);
            return true;
        }
        false
    }

    fn set_connection(&mut self, state: ConnectionState, sink: &mut dyn PanelSink) {
        self.connection = state;
        match state {
            ConnectionState::Connected => {
                sink.replace(SurfaceId::ConnectionStatus, "Connected".to_string());
                sink.remove_class(SurfaceId::ConnectionStatus, "text-danger");
                sink.add_class(SurfaceId::ConnectionStatus, "text-success");
            }
            ConnectionState::Error => {
                sink.replace(SurfaceId::ConnectionStatus, "Connection Error".to_string());
                sink.remove_class(SurfaceId::ConnectionStatus, "text-success");
                sink.add_class(SurfaceId::ConnectionStatus, "text-danger");
            }
            ConnectionState::Idle => {}
        }
    }
}

fn run_panel<P: Panel>(
    panel: &P,
    raw: Option<&Value>,
    sink: &mut dyn PanelSink,
    failed: &mut Vec<&'static str>,
) -> Option<P::View> {
    match dispatch(panel, raw, sink) {
        Ok(view) => view,
        Err(err) => {
            warn!(panel = P::NAME, error = %err, "panel render failed");
            failed.push(P::NAME);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::ERROR_CLASS;
    use crate::surface::Board;

    fn snapshot(gpus: &str, sudo: bool) -> Snapshot {
        let text = format!(
            r#"{{
                "system": {{ "timestamp": 1700000000000, "os": "Linux", "refreshRate": 2, "runningWithSudo": {sudo} }},
                "cpu": {{ "usage": 42.5, "usageFormatted": "42.50%", "cores": 8 }},
                "memory": {{ "usage": 71.0, "totalFormatted": "16 GB", "usedFormatted": "11 GB", "availableFormatted": "5 GB" }},
                "processes": [{{ "pid": 1, "name": "init", "memory": 100, "cpu": 0.1 }}],
                "disks": [{{ "name": "sda", "partitions": [{{ "name": "root", "mountPoint": "/", "totalSpace": 1000, "usedPercent": 55.0 }}] }}],
                "gpus": {gpus},
                "network": {{ "hostname": "box", "interfaces": [] }},
                "temperature": {{ "cpu": {{ "temperature": 48.0, "model": "Intel" }} }}
            }}"#
        );
        Snapshot::from_json(&text).expect("fixture snapshot")
    }

    #[test]
    fn malformed_gpu_block_only_fails_its_panel() {
        let mut dashboard = Dashboard::new();
        let mut board = Board::new();
        let report = dashboard.apply_snapshot(
            &snapshot(r#"[{ "usage": "broken" }]"#, false),
            &mut board,
            Instant::now(),
        );

        assert_eq!(report.failed_panels, vec!["gpus"]);
        assert_eq!(dashboard.connection(), ConnectionState::Connected);
        assert!(board.has_class(SurfaceId::Gpus, ERROR_CLASS));
        assert!(board.content(SurfaceId::Gpus).contains("Failed to load gpus data"));
        assert_eq!(board.content(SurfaceId::CpuUsage), "42.50%");
        assert!(board.content(SurfaceId::MemoryDetails).contains("Total: 16 GB"));
        assert!(board.content(SurfaceId::Disks).contains("sda"));
        assert!(!board.has_class(SurfaceId::CpuUsage, ERROR_CLASS));
        assert_eq!(dashboard.cpu_history().latest(), 42.5);
    }

    #[test]
    fn identical_snapshots_render_identical_pages() {
        let snap = snapshot("[]", false);
        let now = Instant::now();

        let mut first = Board::new();
        Dashboard::new().apply_snapshot(&snap, &mut first, now);
        let mut second = Board::new();
        Dashboard::new().apply_snapshot(&snap, &mut second, now);
        assert_eq!(first.render_page(), second.render_page());

        let mut dashboard = Dashboard::new();
        let mut board = Board::new();
        dashboard.apply_snapshot(&snap, &mut board, now);
        let once = board.content(SurfaceId::Gpus).to_string();
        dashboard.apply_snapshot(&snap, &mut board, now);
        assert_eq!(board.content(SurfaceId::Gpus), once);
    }

    #[test]
    fn history_tracks_cpu_and_memory() {
        let mut dashboard = Dashboard::new();
        let mut board = Board::new();
        dashboard.apply_snapshot(&snapshot("[]", false), &mut board, Instant::now());

        let cpu = dashboard.cpu_history().snapshot();
        assert_eq!(cpu.len(), 30);
        assert_eq!(cpu[29], 42.5);
        assert_eq!(cpu[28], 0.0);
        assert_eq!(dashboard.memory_history().latest(), 71.0);
        let chart = board.get(SurfaceId::CpuChart).expect("cpu chart");
        assert_eq!(chart.attrs.get("data-animation").map(String::as_str), Some("none"));
    }

    #[test]
    fn capability_latch_never_resets() {
        let mut latch = CapabilityLatch::default();
        latch.observe(false);
        assert!(!latch.is_set());
        latch.observe(true);
        latch.observe(false);
        assert!(latch.is_set());

        let mut dashboard = Dashboard::new();
        let mut board = Board::new();
        dashboard.apply_snapshot(&snapshot("[]", true), &mut board, Instant::now());
        dashboard.apply_snapshot(&snapshot("[]", false), &mut board, Instant::now());
        assert!(dashboard.full_access());
        assert_eq!(board.content(SurfaceId::CapabilityBadge), "Full access");
    }

    #[test]
    fn failure_only_touches_connection_status() {
        let mut dashboard = Dashboard::new();
        let mut board = Board::new();
        dashboard.apply_snapshot(&snapshot("[]", false), &mut board, Instant::now());
        let cpu_before = board.content(SurfaceId::CpuUsage).to_string();
        let history_before = dashboard.cpu_history().snapshot();

        dashboard.apply_failure(&mut board);

        assert_eq!(dashboard.connection(), ConnectionState::Error);
        assert_eq!(board.content(SurfaceId::ConnectionStatus), "Connection Error");
        assert!(board.has_class(SurfaceId::ConnectionStatus, "text-danger"));
        assert!(!board.has_class(SurfaceId::ConnectionStatus, "text-success"));
        assert_eq!(board.content(SurfaceId::CpuUsage), cpu_before);
        assert_eq!(dashboard.cpu_history().snapshot(), history_before);
    }

    #[test]
    fn watchdog_restores_connected_after_recent_success() {
        let window = Duration::from_millis(10_000);
        let start = Instant::now();
        let mut dashboard = Dashboard::new();
        let mut board = Board::new();

        assert!(!dashboard.watchdog(start, window, &mut board));
        assert_eq!(dashboard.connection(), ConnectionState::Idle);

        dashboard.apply_snapshot(&snapshot("[]", false), &mut board, start);
        dashboard.apply_failure(&mut board);
        assert!(dashboard.watchdog(start + Duration::from_millis(4_000), window, &mut board));
        assert_eq!(dashboard.connection(), ConnectionState::Connected);
        assert_eq!(board.content(SurfaceId::ConnectionStatus), "Connected");

        dashboard.apply_failure(&mut board);
        assert!(!dashboard.watchdog(start + Duration::from_millis(15_000), window, &mut board));
        assert_eq!(dashboard.connection(), ConnectionState::Error);
    }

    #[test]
    fn malformed_system_block_keeps_capability_badge() {
        let mut dashboard = Dashboard::new();
        let mut board = Board::new();
        dashboard.apply_snapshot(&snapshot("[]", true), &mut board, Instant::now());

        let broken = Snapshot::from_json(
            r#"{"system":{"timestamp":1700000000000,"os":42},"cpu":{"usage":10.0}}"#,
        )
        .expect("envelope decodes");
        let report = dashboard.apply_snapshot(&broken, &mut board, Instant::now());

        assert_eq!(report.failed_panels, vec!["system"]);
        assert!(dashboard.full_access());
        assert_eq!(board.content(SurfaceId::CapabilityBadge), "Full access");
        assert!(board.has_class(SurfaceId::CapabilityBadge, "bg-success"));
        assert!(!board.has_class(SurfaceId::CapabilityBadge, ERROR_CLASS));
        assert!(board.has_class(SurfaceId::SystemInfo, ERROR_CLASS));
        assert_eq!(board.content(SurfaceId::CpuUsage), "10.00%");
    }
}
