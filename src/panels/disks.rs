use super::{decode, nullable, or_na, percent_text, placeholder, Gauge, Panel, PanelError};
use crate::severity::MetricKind;
use crate::surface::{escape, PanelSink, SurfaceId};
use serde::Deserialize;
use serde_json::Value;

const NO_DISKS: &str = "No disk information available";
const NO_MOUNTABLE: &str = "No mountable partitions";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DiskRecord {
    name: Option<String>,
    model: Option<String>,
    size_formatted: Option<String>,
    read_rate_formatted: Option<String>,
    write_rate_formatted: Option<String>,
    #[serde(deserialize_with = "nullable")]
    partitions: Vec<PartitionRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PartitionRecord {
    name: Option<String>,
    #[serde(rename = "type")]
    fs_type: Option<String>,
    mount_point: Option<String>,
    total_space: Option<u64>,
    total_space_formatted: Option<String>,
    usable_space_formatted: Option<String>,
    used_percent: Option<f64>,
    used_percent_formatted: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Partitions {
    None,
    NoMountable,
    Shown(Vec<PartitionView>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionView {
    pub mount_point: String,
    pub label: String,
    pub used: Gauge,
    pub free: String,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiskView {
    pub name: String,
    pub model: String,
    pub size: String,
    pub read_rate: String,
    pub write_rate: String,
    pub partitions: Partitions,
}

fn is_mountable(p: &PartitionRecord) -> bool {
    let has_mount = p
        .mount_point
        .as_deref()
        .map(|m| !m.trim().is_empty())
        .unwrap_or(false);
    has_mount && p.total_space.unwrap_or(0) > 0
}

fn map_partitions(records: Vec<PartitionRecord>) -> Partitions {
    if records.is_empty() {
        return Partitions::None;
    }
    let shown = records
        .into_iter()
        .filter(is_mountable)
        .map(|p| {
            let used = p.used_percent.unwrap_or(0.0);
            let label = match (p.name.as_deref(), p.fs_type.as_deref()) {
                (Some(name), Some(fs)) if !fs.is_empty() => format!("{} ({})", name, fs),
                (Some(name), _) => name.to_string(),
                (None, Some(fs)) => fs.to_string(),
                (None, None) => String::new(),
            };
            PartitionView {
                mount_point: p.mount_point.unwrap_or_default(),
                label,
                used: Gauge::new(
                    used,
                    percent_text(p.used_percent_formatted.as_deref(), used),
                    MetricKind::DiskPartitionUsed,
                ),
                free: or_na(p.usable_space_formatted.as_deref()),
                total: or_na(p.total_space_formatted.as_deref()),
            }
        })
        .collect::<Vec<_>>();
    if shown.is_empty() {
        Partitions::NoMountable
    } else {
        Partitions::Shown(shown)
    }
}

pub struct DisksPanel;

impl Panel for DisksPanel {
    type View = Vec<DiskView>;

    const NAME: &'static str = "disks";
    const SURFACES: &'static [SurfaceId] = &[SurfaceId::Disks];

    fn map(&self, raw: &Value) -> Result<Vec<DiskView>, PanelError> {
        let records: Vec<DiskRecord> = decode(Self::NAME, raw)?;
        Ok(records
            .into_iter()
            .map(|d| DiskView {
                name: or_na(d.name.as_deref()),
                model: or_na(d.model.as_deref()),
                size: or_na(d.size_formatted.as_deref()),
                read_rate: or_na(d.read_rate_formatted.as_deref()),
                write_rate: or_na(d.write_rate_formatted.as_deref()),
                partitions: map_partitions(d.partitions),
            })
            .collect())
    }

    fn render(&self, disks: &Vec<DiskView>, sink: &mut dyn PanelSink) {
        if disks.is_empty() {
            sink.replace(SurfaceId::Disks, placeholder(NO_DISKS));
            return;
        }
        let html = disks
            .iter()
            .map(render_disk)
            .collect::<Vec<_>>()
            .join("\n");
        sink.replace(SurfaceId::Disks, html);
    }
}

fn render_disk(disk: &DiskView) -> String {
    let partitions = match &disk.partitions {
        Partitions::None => String::new(),
        Partitions::NoMountable => placeholder(NO_MOUNTABLE),
        Partitions::Shown(list) => list
            .iter()
            .map(|p| {
                format!(
                    "<div class=\"partition\"><div>{} <span class=\"text-muted\">{}</span></div>{}<div class=\"small\">Free: {} / {}</div></div>",
                    escape(&p.mount_point),
                    escape(&p.label),
                    p.used.bar_html("Used"),
                    escape(&p.free),
                    escape(&p.total)
                )
            })
            .collect::<String>(),
    };
    format!(
        "<div class=\"disk\"><h6>{}</h6><div class=\"small\">Model: {} | Size: {}</div><div class=\"small\">Read: {} | Write: {}</div>{}</div>",
        escape(&disk.name),
        escape(&disk.model),
        escape(&disk.size),
        escape(&disk.read_rate),
        escape(&disk.write_rate),
        partitions
    )
}
