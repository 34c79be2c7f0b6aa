use super::{
    decode, estimated_badge, or_na, percent_text, placeholder, temperature_text, Gauge, Panel,
    PanelError,
};
use crate::severity::MetricKind;
use crate::surface::{escape, PanelSink, SurfaceId};
use serde::Deserialize;
use serde_json::Value;

const NO_GPUS: &str = "No GPU information available";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GpuRecord {
    name: Option<String>,
    vendor: Option<String>,
    usage: Option<f64>,
    usage_formatted: Option<String>,
    memory_usage: Option<f64>,
    memory_usage_formatted: Option<String>,
    used_memory_formatted: Option<String>,
    total_memory_formatted: Option<String>,
    temperature: Option<f64>,
    temperature_formatted: Option<String>,
    is_simulated: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuView {
    pub name: String,
    pub vendor: String,
    pub usage: Gauge,
    pub memory: Gauge,
    pub memory_detail: String,
    pub temperature: Gauge,
    pub estimated: bool,
}

pub struct GpusPanel;

impl Panel for GpusPanel {
    type View = Vec<GpuView>;

    const NAME: &'static str = "gpus";
    const SURFACES: &'static [SurfaceId] = &[SurfaceId::Gpus];

    fn map(&self, raw: &Value) -> Result<Vec<GpuView>, PanelError> {
        let records: Vec<GpuRecord> = decode(Self::NAME, raw)?;
        Ok(records
            .into_iter()
            .map(|g| {
                let usage = g.usage.unwrap_or(0.0);
                let memory = g.memory_usage.unwrap_or(0.0);
                let temperature = g.temperature.unwrap_or(0.0);
                GpuView {
                    name: or_na(g.name.as_deref()),
                    vendor: or_na(g.vendor.as_deref()),
                    usage: Gauge::new(
                        usage,
                        percent_text(g.usage_formatted.as_deref(), usage),
                        MetricKind::GpuUsage,
                    ),
                    memory: Gauge::new(
                        memory,
                        percent_text(g.memory_usage_formatted.as_deref(), memory),
                        MetricKind::GpuMemory,
                    ),
                    memory_detail: format!(
                        "{} / {}",
                        or_na(g.used_memory_formatted.as_deref()),
                        or_na(g.total_memory_formatted.as_deref())
                    ),
                    temperature: Gauge::new(
                        temperature,
                        temperature_text(g.temperature_formatted.as_deref(), temperature),
                        MetricKind::Temperature,
                    ),
                    estimated: g.is_simulated.unwrap_or(false),
                }
            })
            .collect())
    }

    fn render(&self, gpus: &Vec<GpuView>, sink: &mut dyn PanelSink) {
        if gpus.is_empty() {
            sink.replace(SurfaceId::Gpus, placeholder(NO_GPUS));
            return;
        }
        let html = gpus
            .iter()
            .map(|g| {
                format!(
                    "<div class=\"gpu\"><h6>{} {}{}</h6><div class=\"small\">Vendor: {}</div>{}{}<div class=\"small\">Memory: {}</div></div>",
                    escape(&g.name),
                    g.temperature.badge_html(),
                    if g.estimated { estimated_badge() } else { "" },
                    escape(&g.vendor),
                    g.usage.bar_html("Usage"),
                    g.memory.bar_html("Memory usage"),
                    escape(&g.memory_detail)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        sink.replace(SurfaceId::Gpus, html);
    }

    fn render_empty(&self, sink: &mut dyn PanelSink) {
        sink.replace(SurfaceId::Gpus, placeholder(NO_GPUS));
    }
}
