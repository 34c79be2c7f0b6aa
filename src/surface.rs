use crate::history::{sparkline, TrendSink, UpdateMode};
use crate::severity::{Tier, Treatment};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SurfaceId {
    ConnectionStatus,
    SystemInfo,
    RefreshRate,
    LastRefresh,
    CapabilityBadge,
    CpuUsage,
    CpuCores,
    CpuProgress,
    CpuChart,
    MemoryUsage,
    MemoryProgress,
    MemoryDetails,
    MemoryChart,
    ProcessTable,
    Disks,
    Gpus,
    Network,
    Temperature,
}

impl SurfaceId {
    pub const ALL: [SurfaceId; 18] = [
        Self::ConnectionStatus,
        Self::SystemInfo,
        Self::RefreshRate,
        Self::LastRefresh,
        Self::CapabilityBadge,
        Self::CpuUsage,
        Self::CpuCores,
        Self::CpuProgress,
        Self::CpuChart,
        Self::MemoryUsage,
        Self::MemoryProgress,
        Self::MemoryDetails,
        Self::MemoryChart,
        Self::ProcessTable,
        Self::Disks,
        Self::Gpus,
        Self::Network,
        Self::Temperature,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::ConnectionStatus => "connectionStatus",
            Self::SystemInfo => "systemInfo",
            Self::RefreshRate => "refreshRate",
            Self::LastRefresh => "lastRefresh",
            Self::CapabilityBadge => "capabilityBadge",
            Self::CpuUsage => "cpuUsage",
            Self::CpuCores => "cpuCores",
            Self::CpuProgress => "cpuProgressBar",
            Self::CpuChart => "cpuChart",
            Self::MemoryUsage => "memoryUsage",
            Self::MemoryProgress => "memoryProgressBar",
            Self::MemoryDetails => "memoryDetails",
            Self::MemoryChart => "memoryChart",
            Self::ProcessTable => "processTable",
            Self::Disks => "diskContainer",
            Self::Gpus => "gpuContainer",
            Self::Network => "networkContainer",
            Self::Temperature => "temperatureContainer",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Surface {
    pub content: String,
    pub classes: BTreeSet<String>,
    pub attrs: BTreeMap<String, String>,
}

/// Write access to the named UI surfaces. Renderers only ever go through
/// this trait and never look surfaces up by themselves.
pub trait PanelSink {
    fn replace(&mut self, id: SurfaceId, content: String);
    fn add_class(&mut self, id: SurfaceId, class: &str);
    fn remove_class(&mut self, id: SurfaceId, class: &str);
    fn set_attr(&mut self, id: SurfaceId, name: &str, value: String);

    fn apply_tier(&mut self, id: SurfaceId, tier: Tier, treatment: Treatment) {
        for class in Tier::all_classes(treatment) {
            self.remove_class(id, class);
        }
        self.add_class(id, tier.class(treatment));
    }

    fn clear_tier(&mut self, id: SurfaceId, treatment: Treatment) {
        for class in Tier::all_classes(treatment) {
            self.remove_class(id, class);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    surfaces: BTreeMap<SurfaceId, Surface>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    #[cfg(test)]
    pub fn content(&self, id: SurfaceId) -> &str {
        self.surfaces
            .get(&id)
            .map(|s| s.content.as_str())
            .unwrap_or("")
    }

    #[cfg(test)]
    pub fn has_class(&self, id: SurfaceId, class: &str) -> bool {
        self.surfaces
            .get(&id)
            .map(|s| s.classes.contains(class))
            .unwrap_or(false)
    }

    pub fn to_named(&self) -> BTreeMap<&'static str, Surface> {
        self.surfaces
            .iter()
            .map(|(id, s)| (id.name(), s.clone()))
            .collect()
    }

    pub fn render_page(&self) -> String {
        let mut out = String::from(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>dashpoll</title></head>\n<body>\n",
        );
        for id in SurfaceId::ALL {
            let surface = self.get(id).cloned().unwrap_or_default();
            let classes = surface
                .classes
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            let attrs = surface
                .attrs
                .iter()
                .map(|(k, v)| format!(" {}=\"{}\"", k, escape(v)))
                .collect::<String>();
            out.push_str(&format!(
                "<div id=\"{}\" class=\"{}\"{}>{}</div>\n",
                id.name(),
                classes,
                attrs,
                surface.content
            ));
        }
        out.push_str("</body>\n</html>\n");
        out
    }

    fn entry(&mut self, id: SurfaceId) -> &mut Surface {
        self.surfaces.entry(id).or_default()
    }
}

impl PanelSink for Board {
    fn replace(&mut self, id: SurfaceId, content: String) {
        self.entry(id).content = content;
    }

    fn add_class(&mut self, id: SurfaceId, class: &str) {
        self.entry(id).classes.insert(class.to_string());
    }

    fn remove_class(&mut self, id: SurfaceId, class: &str) {
        if let Some(surface) = self.surfaces.get_mut(&id) {
            surface.classes.remove(class);
        }
    }

    fn set_attr(&mut self, id: SurfaceId, name: &str, value: String) {
        self.entry(id).attrs.insert(name.to_string(), value);
    }
}

/// Trend chart drawn into a surface as a sparkline.
pub struct ChartSurface<'a> {
    sink: &'a mut dyn PanelSink,
    id: SurfaceId,
}

impl<'a> ChartSurface<'a> {
    pub fn new(sink: &'a mut dyn PanelSink, id: SurfaceId) -> Self {
        Self { sink, id }
    }
}

impl TrendSink for ChartSurface<'_> {
    fn redraw(&mut self, series: &[f64], mode: UpdateMode) {
        let points = series
            .iter()
            .map(|v| format!("{:.2}", v))
            .collect::<Vec<_>>()
            .join(",");
        self.sink
            .set_attr(self.id, "data-animation", mode.as_str().to_string());
        self.sink.set_attr(self.id, "data-points", points);
        self.sink.replace(self.id, sparkline(series));
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_tier_leaves_exactly_one_marker() {
        let mut board = Board::new();
        board.add_class(SurfaceId::CpuProgress, "progress-bar");
        board.apply_tier(SurfaceId::CpuProgress, Tier::Critical, Treatment::Bar);
        board.apply_tier(SurfaceId::CpuProgress, Tier::Warning, Treatment::Bar);

        assert!(board.has_class(SurfaceId::CpuProgress, "bg-warning"));
        assert!(!board.has_class(SurfaceId::CpuProgress, "bg-danger"));
        assert!(!board.has_class(SurfaceId::CpuProgress, "bg-success"));
        assert!(board.has_class(SurfaceId::CpuProgress, "progress-bar"));
    }

    #[test]
    fn chart_surface_records_no_animation() {
        let mut board = Board::new();
        {
            let mut chart = ChartSurface::new(&mut board, SurfaceId::CpuChart);
            chart.redraw(&[0.0, 50.0], UpdateMode::NoAnimation);
        }
        let surface = board.get(SurfaceId::CpuChart).expect("chart surface");
        assert_eq!(surface.attrs.get("data-animation").map(String::as_str), Some("none"));
        assert_eq!(surface.attrs.get("data-points").map(String::as_str), Some("0.00,50.00"));
        assert_eq!(surface.content.chars().count(), 2);
    }

    #[test]
    fn escape_handles_markup() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn page_lists_every_surface_in_order() {
        let mut board = Board::new();
        board.replace(SurfaceId::Gpus, "gpu".to_string());
        let page = board.render_page();
        let status = page.find("id=\"connectionStatus\"").expect("status div");
        let gpus = page.find("id=\"gpuContainer\"").expect("gpu div");
        assert!(status < gpus);
        assert!(page.contains(">gpu</div>"));
    }
}
