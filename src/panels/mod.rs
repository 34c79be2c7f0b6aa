pub mod cpu;
pub mod disks;
pub mod gpus;
pub mod memory;
pub mod network;
pub mod processes;
pub mod system;
pub mod temperature;

use crate::severity::{classify, MetricKind, Tier, Treatment};
use crate::surface::{escape, PanelSink, SurfaceId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

pub const NO_DATA: &str = "No data available";
pub const ERROR_CLASS: &str = "panel-error";

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("malformed {panel} payload: {source}")]
    Malformed {
        panel: &'static str,
        source: serde_json::Error,
    },
}

/// A dashboard panel: a mapper from a raw subsystem record to a view model
/// plus a renderer that owns a fixed set of surfaces.
pub trait Panel {
    type View;

    const NAME: &'static str;
    const SURFACES: &'static [SurfaceId];

    fn map(&self, raw: &Value) -> Result<Self::View, PanelError>;

    fn render(&self, view: &Self::View, sink: &mut dyn PanelSink);

    fn render_empty(&self, sink: &mut dyn PanelSink) {
        for (i, id) in Self::SURFACES.iter().enumerate() {
            let content = if i == 0 {
                placeholder(NO_DATA)
            } else {
                String::new()
            };
            sink.replace(*id, content);
        }
    }

    fn render_error(&self, sink: &mut dyn PanelSink) {
        render_error_on(Self::NAME, Self::SURFACES, sink);
    }
}

/// Error placeholder on the first surface, the rest blanked, all marked.
pub(crate) fn render_error_on(panel: &str, surfaces: &[SurfaceId], sink: &mut dyn PanelSink) {
    for (i, id) in surfaces.iter().enumerate() {
        let content = if i == 0 {
            format!(
                "<div class=\"text-danger\">Failed to load {} data</div>",
                panel
            )
        } else {
            String::new()
        };
        sink.replace(*id, content);
        sink.add_class(*id, ERROR_CLASS);
    }
}

/// Maps and renders one subsystem. Returns the view on success so the caller
/// can feed history buffers; absent input renders the empty placeholder.
pub fn dispatch<P: Panel>(
    panel: &P,
    raw: Option<&Value>,
    sink: &mut dyn PanelSink,
) -> Result<Option<P::View>, PanelError> {
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        clear_error(P::SURFACES, sink);
        panel.render_empty(sink);
        return Ok(None);
    };

    match panel.map(raw) {
        Ok(view) => {
            clear_error(P::SURFACES, sink);
            panel.render(&view, sink);
            Ok(Some(view))
        }
        Err(err) => {
            panel.render_error(sink);
            Err(err)
        }
    }
}

fn clear_error(surfaces: &[SurfaceId], sink: &mut dyn PanelSink) {
    for id in surfaces {
        sink.remove_class(*id, ERROR_CLASS);
    }
}

pub(crate) fn decode<T: DeserializeOwned>(panel: &'static str, raw: &Value) -> Result<T, PanelError> {
    T::deserialize(raw).map_err(|source| PanelError::Malformed { panel, source })
}

/// Treats an explicit `null` the same as a missing field.
pub(crate) fn nullable<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

pub(crate) fn placeholder(text: &str) -> String {
    format!("<div class=\"text-muted\">{}</div>", escape(text))
}

pub(crate) fn warning_note(text: &str) -> String {
    format!("<div class=\"alert alert-warning\">{}</div>", escape(text))
}

pub(crate) fn percent_text(formatted: Option<&str>, value: f64) -> String {
    match formatted.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => text.to_string(),
        None => format!("{:.2}%", value),
    }
}

pub(crate) fn or_na(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("N/A")
        .to_string()
}

pub(crate) fn temperature_text(formatted: Option<&str>, celsius: f64) -> String {
    if celsius <= 0.0 {
        return "N/A".to_string();
    }
    match formatted.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => text.to_string(),
        None => format!("{:.1}°C", celsius),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub value: f64,
    pub text: String,
    pub tier: Tier,
}

impl Gauge {
    pub fn new(value: f64, text: String, kind: MetricKind) -> Self {
        Self {
            value,
            text,
            tier: classify(value, kind),
        }
    }

    pub fn bar_html(&self, label: &str) -> String {
        format!(
            "<div class=\"small\">{}: {}</div><div class=\"progress\"><div class=\"progress-bar {}\" style=\"width: {:.2}%\"></div></div>",
            escape(label),
            escape(&self.text),
            self.tier.class(Treatment::Bar),
            self.value.clamp(0.0, 100.0)
        )
    }

    pub fn badge_html(&self) -> String {
        format!(
            "<span class=\"badge {}\">{}</span>",
            self.tier.class(Treatment::Badge),
            escape(&self.text)
        )
    }
}

/// Marker for readings derived from a simulated sensor source.
pub(crate) const ESTIMATED_SOURCE_MARKERS: &[&str] = &["Apple"];

pub(crate) fn is_estimated(source_name: &str, value: f64) -> bool {
    value > 0.0
        && ESTIMATED_SOURCE_MARKERS
            .iter()
            .any(|m| source_name.contains(m))
}

pub(crate) fn estimated_badge() -> &'static str {
    "<span class=\"badge bg-secondary\" title=\"Estimated value, not a sensor reading\">estimated</span>"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Board;

    #[test]
    fn percent_text_prefers_preformatted() {
        assert_eq!(percent_text(Some("12.34%"), 99.0), "12.34%");
        assert_eq!(percent_text(Some("  "), 7.5), "7.50%");
        assert_eq!(percent_text(None, 7.456), "7.46%");
    }

    #[test]
    fn temperature_text_treats_non_positive_as_missing() {
        assert_eq!(temperature_text(Some("55.0°C"), 0.0), "N/A");
        assert_eq!(temperature_text(None, 61.27), "61.3°C");
    }

    #[test]
    fn estimated_requires_marker_and_positive_value() {
        assert!(is_estimated("Apple M2 Pro", 48.0));
        assert!(!is_estimated("Apple M2 Pro", 0.0));
        assert!(!is_estimated("Intel Core i7", 48.0));
    }

    #[test]
    fn dispatch_absent_input_renders_placeholder() {
        let mut board = Board::new();
        let result = dispatch(&cpu::CpuPanel, None, &mut board).expect("absent is not an error");
        assert!(result.is_none());
        assert!(board.content(SurfaceId::CpuUsage).contains(NO_DATA));
    }

    #[test]
    fn dispatch_failure_marks_only_own_surfaces() {
        let mut board = Board::new();
        let raw = serde_json::json!({ "usage": "lots" });
        let err = dispatch(&cpu::CpuPanel, Some(&raw), &mut board).unwrap_err();
        assert!(err.to_string().contains("cpu"));
        assert!(board.has_class(SurfaceId::CpuUsage, ERROR_CLASS));
        assert!(!board.has_class(SurfaceId::MemoryUsage, ERROR_CLASS));

        let good = serde_json::json!({ "usage": 10.0, "cores": 4 });
        dispatch(&cpu::CpuPanel, Some(&good), &mut board).expect("recovers");
        assert!(!board.has_class(SurfaceId::CpuUsage, ERROR_CLASS));
    }
}
