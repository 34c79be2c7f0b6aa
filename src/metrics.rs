use crate::state::ConnectionState;
use prometheus::core::Collector;
use prometheus::{opts, Counter, CounterVec, Encoder, Gauge, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub polls_total: CounterVec,
    pub panel_errors_total: CounterVec,
    pub connection_state: Gauge,
    pub capability_full_access: Gauge,
    pub last_success_timestamp_seconds: Gauge,
    pub cpu_usage_percent: Gauge,
    pub memory_usage_percent: Gauge,
    pub scrape_count_total: Counter,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let polls_total = CounterVec::new(
            opts!("dashpoll_polls_total", "Snapshot polls by outcome"),
            &["outcome"],
        )?;
        let panel_errors_total = CounterVec::new(
            opts!(
                "dashpoll_panel_errors_total",
                "Panels that failed to decode their subsystem block"
            ),
            &["panel"],
        )?;
        let connection_state = Gauge::with_opts(opts!(
            "dashpoll_connection_state",
            "Connection indicator: 0 idle, 1 connected, 2 error"
        ))?;
        let capability_full_access = Gauge::with_opts(opts!(
            "dashpoll_capability_full_access",
            "1 once the backend has reported elevated access"
        ))?;
        let last_success_timestamp_seconds = Gauge::with_opts(opts!(
            "dashpoll_last_success_timestamp_seconds",
            "Unix time of the last successfully applied snapshot"
        ))?;
        let cpu_usage_percent = Gauge::with_opts(opts!(
            "dashpoll_cpu_usage_percent",
            "Latest CPU usage sample in percent"
        ))?;
        let memory_usage_percent = Gauge::with_opts(opts!(
            "dashpoll_memory_usage_percent",
            "Latest memory usage sample in percent"
        ))?;
        let scrape_count_total = Counter::with_opts(opts!(
            "dashpoll_scrape_count_total",
            "Number of /metrics scrapes"
        ))?;

        register(&registry, &polls_total)?;
        register(&registry, &panel_errors_total)?;
        register(&registry, &connection_state)?;
        register(&registry, &capability_full_access)?;
        register(&registry, &last_success_timestamp_seconds)?;
        register(&registry, &cpu_usage_percent)?;
        register(&registry, &memory_usage_percent)?;
        register(&registry, &scrape_count_total)?;

        Ok(Arc::new(Self {
            registry,
            polls_total,
            panel_errors_total,
            connection_state,
            capability_full_access,
            last_success_timestamp_seconds,
            cpu_usage_percent,
            memory_usage_percent,
            scrape_count_total,
        }))
    }

    pub fn record_poll(&self, outcome: &str) {
        self.polls_total.with_label_values(&[outcome]).inc();
    }

    pub fn inc_panel_error(&self, panel: &str) {
        self.panel_errors_total.with_label_values(&[panel]).inc();
    }

    pub fn set_connection(&self, state: ConnectionState) {
        self.connection_state.set(state.gauge_value());
    }

    pub fn set_full_access(&self, full_access: bool) {
        self.capability_full_access
            .set(if full_access { 1.0 } else { 0.0 });
    }

    pub fn mark_success(&self) {
        self.last_success_timestamp_seconds.set(now_unix() as f64);
    }

    pub fn inc_scrape_count(&self) {
        self.scrape_count_total.inc();
    }

    pub fn encode_metrics(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf)?;
        Ok(buf)
    }
}

fn register<T: Collector + Clone + 'static>(
    registry: &Registry,
    collector: &T,
) -> Result<(), prometheus::Error> {
    registry.register(Box::new(collector.clone()))
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
