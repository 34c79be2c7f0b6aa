use super::{decode, or_na, placeholder, render_error_on, Panel, PanelError, NO_DATA};
use crate::surface::{escape, PanelSink, SurfaceId};
use chrono::{Local, TimeZone};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SystemRecord {
    os: Option<String>,
    refresh_rate: Option<u64>,
    timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemView {
    pub os_label: String,
    pub refresh_rate_secs: Option<u64>,
    pub last_refresh: String,
    pub full_access: bool,
}

/// Built per cycle with the already-latched capability state.
pub struct SystemPanel {
    pub full_access: bool,
}

impl Panel for SystemPanel {
    type View = SystemView;

    const NAME: &'static str = "system";
    const SURFACES: &'static [SurfaceId] = &[
        SurfaceId::SystemInfo,
        SurfaceId::RefreshRate,
        SurfaceId::LastRefresh,
        SurfaceId::CapabilityBadge,
    ];

    fn map(&self, raw: &Value) -> Result<SystemView, PanelError> {
        let record: SystemRecord = decode(Self::NAME, raw)?;
        Ok(SystemView {
            os_label: or_na(record.os.as_deref()),
            refresh_rate_secs: record.refresh_rate,
            last_refresh: record
                .timestamp
                .and_then(local_time)
                .unwrap_or_else(|| "N/A".to_string()),
            full_access: self.full_access,
        })
    }

    fn render(&self, view: &SystemView, sink: &mut dyn PanelSink) {
        sink.replace(SurfaceId::SystemInfo, escape(&view.os_label));
        sink.remove_class(SurfaceId::SystemInfo, "text-danger");
        sink.replace(
            SurfaceId::RefreshRate,
            view.refresh_rate_secs
                .map(|s| format!("{}s", s))
                .unwrap_or_default(),
        );
        sink.replace(SurfaceId::LastRefresh, escape(&view.last_refresh));
        render_capability(sink, view.full_access);
    }

    fn render_empty(&self, sink: &mut dyn PanelSink) {
        sink.replace(SurfaceId::SystemInfo, placeholder(NO_DATA));
        sink.replace(SurfaceId::RefreshRate, String::new());
        sink.replace(SurfaceId::LastRefresh, String::new());
        render_capability(sink, self.full_access);
    }

    /// The capability badge follows the latch and is left out of the error state.
    fn render_error(&self, sink: &mut dyn PanelSink) {
        render_error_on(
            Self::NAME,
            &[
                SurfaceId::SystemInfo,
                SurfaceId::RefreshRate,
                SurfaceId::LastRefresh,
            ],
            sink,
        );
        render_capability(sink, self.full_access);
    }
}

fn render_capability(sink: &mut dyn PanelSink, full_access: bool) {
    if full_access {
        sink.replace(SurfaceId::CapabilityBadge, "Full access".to_string());
        sink.remove_class(SurfaceId::CapabilityBadge, "d-none");
        sink.add_class(SurfaceId::CapabilityBadge, "bg-success");
    } else {
        sink.replace(SurfaceId::CapabilityBadge, String::new());
        sink.remove_class(SurfaceId::CapabilityBadge, "bg-success");
        sink.add_class(SurfaceId::CapabilityBadge, "d-none");
    }
}

fn local_time(timestamp_ms: i64) -> Option<String> {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%H:%M:%S").to_string())
}
