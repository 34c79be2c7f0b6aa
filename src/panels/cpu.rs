use super::{decode, percent_text, placeholder, render_error_on, Panel, PanelError, NO_DATA};
use crate::severity::{classify, MetricKind, Tier, Treatment};
use crate::surface::{escape, PanelSink, SurfaceId};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CpuRecord {
    usage: Option<f64>,
    usage_formatted: Option<String>,
    cores: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CpuView {
    pub usage: f64,
    pub usage_text: String,
    pub cores_text: String,
    pub tier: Tier,
}

pub struct CpuPanel;

impl Panel for CpuPanel {
    type View = CpuView;

    const NAME: &'static str = "cpu";
    const SURFACES: &'static [SurfaceId] =
        &[SurfaceId::CpuUsage, SurfaceId::CpuCores, SurfaceId::CpuProgress];

    fn map(&self, raw: &Value) -> Result<CpuView, PanelError> {
        let record: CpuRecord = decode(Self::NAME, raw)?;
        let usage = record.usage.unwrap_or(0.0);
        Ok(CpuView {
            usage,
            usage_text: percent_text(record.usage_formatted.as_deref(), usage),
            cores_text: record
                .cores
                .map(|c| format!("{} cores", c))
                .unwrap_or_else(|| "N/A".to_string()),
            tier: classify(usage, MetricKind::CpuUsage),
        })
    }

    fn render(&self, view: &CpuView, sink: &mut dyn PanelSink) {
        sink.replace(SurfaceId::CpuUsage, escape(&view.usage_text));
        sink.replace(SurfaceId::CpuCores, escape(&view.cores_text));
        render_progress(sink, SurfaceId::CpuProgress, view.usage, Some(view.tier));
    }

    fn render_empty(&self, sink: &mut dyn PanelSink) {
        sink.replace(SurfaceId::CpuUsage, placeholder(NO_DATA));
        sink.replace(SurfaceId::CpuCores, String::new());
        render_progress(sink, SurfaceId::CpuProgress, 0.0, None);
    }

    fn render_error(&self, sink: &mut dyn PanelSink) {
        render_error_on(Self::NAME, Self::SURFACES, sink);
        render_progress(sink, SurfaceId::CpuProgress, 0.0, None);
    }
}

/// Shared by the CPU and memory bars.
pub(crate) fn render_progress(
    sink: &mut dyn PanelSink,
    id: SurfaceId,
    value: f64,
    tier: Option<Tier>,
) {
    sink.replace(id, String::new());
    sink.add_class(id, "progress-bar");
    sink.set_attr(id, "style", format!("width: {:.2}%", value.clamp(0.0, 100.0)));
    match tier {
        Some(tier) => sink.apply_tier(id, tier, Treatment::Bar),
        None => sink.clear_tier(id, Treatment::Bar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::{dispatch, ERROR_CLASS};
    use crate::surface::Board;
    use serde_json::json;

    #[test]
    fn maps_usage_and_cores() {
        let view = CpuPanel
            .map(&json!({ "usage": 55.5, "usageFormatted": "55.50%", "cores": 8 }))
            .unwrap();
        assert_eq!(view.usage_text, "55.50%");
        assert_eq!(view.cores_text, "8 cores");
        assert_eq!(view.tier, Tier::Warning);
    }

    #[test]
    fn falls_back_to_two_decimals() {
        let view = CpuPanel.map(&json!({ "usage": 12.347 })).unwrap();
        assert_eq!(view.usage_text, "12.35%");
        assert_eq!(view.cores_text, "N/A");
    }

    #[test]
    fn tier_switch_clears_previous_marker() {
        let mut board = Board::new();
        let hot = CpuPanel.map(&json!({ "usage": 95.0 })).unwrap();
        CpuPanel.render(&hot, &mut board);
        assert!(board.has_class(SurfaceId::CpuProgress, "bg-danger"));

        let calm = CpuPanel.map(&json!({ "usage": 5.0 })).unwrap();
        CpuPanel.render(&calm, &mut board);
        assert!(board.has_class(SurfaceId::CpuProgress, "bg-success"));
        assert!(!board.has_class(SurfaceId::CpuProgress, "bg-danger"));
        let style = board.get(SurfaceId::CpuProgress).unwrap().attrs.get("style").cloned();
        assert_eq!(style.as_deref(), Some("width: 5.00%"));
    }

    #[test]
    fn error_after_critical_sample_drops_severity() {
        let mut board = Board::new();
        dispatch(&CpuPanel, Some(&json!({ "usage": 95.0 })), &mut board).unwrap();
        assert!(board.has_class(SurfaceId::CpuProgress, "bg-danger"));

        assert!(dispatch(&CpuPanel, Some(&json!({ "usage": "x" })), &mut board).is_err());
        for class in Tier::all_classes(Treatment::Bar) {
            assert!(!board.has_class(SurfaceId::CpuProgress, class), "{class} left behind");
        }
        assert!(board.has_class(SurfaceId::CpuProgress, ERROR_CLASS));
        let style = board.get(SurfaceId::CpuProgress).unwrap().attrs.get("style").cloned();
        assert_eq!(style.as_deref(), Some("width: 0.00%"));
        assert!(board.content(SurfaceId::CpuUsage).contains("Failed to load cpu data"));
    }
}
