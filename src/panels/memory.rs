use super::cpu::render_progress;
use super::{
    decode, or_na, percent_text, placeholder, render_error_on, Panel, PanelError, NO_DATA,
};
use crate::severity::{classify, MetricKind, Tier};
use crate::surface::{escape, PanelSink, SurfaceId};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MemoryRecord {
    usage: Option<f64>,
    usage_formatted: Option<String>,
    total_formatted: Option<String>,
    used_formatted: Option<String>,
    available_formatted: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryView {
    pub usage: f64,
    pub usage_text: String,
    pub details: String,
    pub tier: Tier,
}

pub struct MemoryPanel;

impl Panel for MemoryPanel {
    type View = MemoryView;

    const NAME: &'static str = "memory";
    const SURFACES: &'static [SurfaceId] = &[
        SurfaceId::MemoryUsage,
        SurfaceId::MemoryDetails,
        SurfaceId::MemoryProgress,
    ];

    fn map(&self, raw: &Value) -> Result<MemoryView, PanelError> {
        let record: MemoryRecord = decode(Self::NAME, raw)?;
        let usage = record.usage.unwrap_or(0.0);
        Ok(MemoryView {
            usage,
            usage_text: percent_text(record.usage_formatted.as_deref(), usage),
            details: format!(
                "Total: {} | Used: {} | Available: {}",
                or_na(record.total_formatted.as_deref()),
                or_na(record.used_formatted.as_deref()),
                or_na(record.available_formatted.as_deref()),
            ),
            tier: classify(usage, MetricKind::MemoryUsage),
        })
    }

    fn render(&self, view: &MemoryView, sink: &mut dyn PanelSink) {
        sink.replace(SurfaceId::MemoryUsage, escape(&view.usage_text));
        sink.replace(SurfaceId::MemoryDetails, escape(&view.details));
        render_progress(sink, SurfaceId::MemoryProgress, view.usage, Some(view.tier));
    }

    fn render_empty(&self, sink: &mut dyn PanelSink) {
        sink.replace(SurfaceId::MemoryUsage, placeholder(NO_DATA));
        sink.replace(SurfaceId::MemoryDetails, String::new());
        render_progress(sink, SurfaceId::MemoryProgress, 0.0, None);
    }

    fn render_error(&self, sink: &mut dyn PanelSink) {
        render_error_on(Self::NAME, Self::SURFACES, sink);
        render_progress(sink, SurfaceId::MemoryProgress, 0.0, None);
    }
}
