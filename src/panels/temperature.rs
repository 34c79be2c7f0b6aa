use super::{
    decode, estimated_badge, is_estimated, nullable, or_na, placeholder, temperature_text, Gauge,
    Panel, PanelError, NO_DATA,
};
use crate::severity::MetricKind;
use crate::surface::{escape, PanelSink, SurfaceId};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TemperatureRecord {
    cpu: Option<CpuTempRecord>,
    #[serde(deserialize_with = "nullable")]
    fans: Vec<FanRecord>,
    #[serde(deserialize_with = "nullable")]
    gpus: Vec<GpuTempRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CpuTempRecord {
    temperature: Option<f64>,
    temperature_formatted: Option<String>,
    model: Option<String>,
    vendor: Option<String>,
    voltage: Option<f64>,
    voltage_formatted: Option<String>,
    physical_cores: Option<u32>,
    logical_cores: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FanRecord {
    id: Option<u32>,
    rpm: Option<u64>,
    rpm_formatted: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GpuTempRecord {
    name: Option<String>,
    temperature: Option<f64>,
    temperature_formatted: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CpuTempView {
    pub model: String,
    pub vendor: String,
    pub temperature: Gauge,
    pub estimated: bool,
    pub voltage: Option<String>,
    pub physical_cores: String,
    pub logical_cores: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FanView {
    pub id: String,
    pub rpm: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuTempView {
    pub name: String,
    pub temperature: Gauge,
    pub estimated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureView {
    pub cpu: Option<CpuTempView>,
    pub fans: Vec<FanView>,
    pub gpus: Vec<GpuTempView>,
}

fn temperature_gauge(value: Option<f64>, formatted: Option<&str>) -> Gauge {
    let celsius = value.unwrap_or(0.0);
    Gauge::new(
        celsius,
        temperature_text(formatted, celsius),
        MetricKind::Temperature,
    )
}

fn map_cpu(cpu: CpuTempRecord) -> CpuTempView {
    let temperature = temperature_gauge(cpu.temperature, cpu.temperature_formatted.as_deref());
    let model = or_na(cpu.model.as_deref());
    let voltage = cpu.voltage.filter(|v| *v > 0.0).map(|v| {
        cpu.voltage_formatted
            .clone()
            .unwrap_or_else(|| format!("{:.2} V", v))
    });
    CpuTempView {
        estimated: is_estimated(&model, temperature.value),
        model,
        vendor: or_na(cpu.vendor.as_deref()),
        temperature,
        voltage,
        physical_cores: cpu
            .physical_cores
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        logical_cores: cpu
            .logical_cores
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    }
}

pub struct TemperaturePanel;

impl Panel for TemperaturePanel {
    type View = TemperatureView;

    const NAME: &'static str = "temperature";
    const SURFACES: &'static [SurfaceId] = &[SurfaceId::Temperature];

    fn map(&self, raw: &Value) -> Result<TemperatureView, PanelError> {
        let record: TemperatureRecord = decode(Self::NAME, raw)?;
        Ok(TemperatureView {
            cpu: record.cpu.map(map_cpu),
            fans: record
                .fans
                .into_iter()
                .enumerate()
                .map(|(i, f)| FanView {
                    id: f.id.unwrap_or(i as u32 + 1).to_string(),
                    rpm: f
                        .rpm_formatted
                        .unwrap_or_else(|| format!("{} RPM", f.rpm.unwrap_or(0))),
                })
                .collect(),
            gpus: record
                .gpus
                .into_iter()
                .map(|g| {
                    let temperature =
                        temperature_gauge(g.temperature, g.temperature_formatted.as_deref());
                    let name = or_na(g.name.as_deref());
                    GpuTempView {
                        estimated: is_estimated(&name, temperature.value),
                        name,
                        temperature,
                    }
                })
                .collect(),
        })
    }

    fn render(&self, view: &TemperatureView, sink: &mut dyn PanelSink) {
        if view.cpu.is_none() && view.fans.is_empty() && view.gpus.is_empty() {
            self.render_empty(sink);
            return;
        }
        let mut out = Vec::new();
        if let Some(cpu) = &view.cpu {
            let voltage = cpu
                .voltage
                .as_ref()
                .map(|v| format!("<div class=\"small\">Voltage: {}</div>", escape(v)))
                .unwrap_or_default();
            out.push(format!(
                "<div class=\"cpu-temp\"><h6>CPU {}{}</h6><div class=\"small\">{} ({})</div>{}<div class=\"small\">Physical cores: {} | Logical cores: {}</div></div>",
                cpu.temperature.badge_html(),
                if cpu.estimated { estimated_badge() } else { "" },
                escape(&cpu.model),
                escape(&cpu.vendor),
                voltage,
                escape(&cpu.physical_cores),
                escape(&cpu.logical_cores)
            ));
        }
        if !view.fans.is_empty() {
            let fans = view
                .fans
                .iter()
                .map(|f| format!("<div class=\"small\">Fan #{}: {}</div>", escape(&f.id), escape(&f.rpm)))
                .collect::<String>();
            out.push(format!("<div class=\"fans\"><h6>Fans</h6>{}</div>", fans));
        }
        if !view.gpus.is_empty() {
            let gpus = view
                .gpus
                .iter()
                .map(|g| {
                    format!(
                        "<div class=\"small\">{}: {}{}</div>",
                        escape(&g.name),
                        g.temperature.badge_html(),
                        if g.estimated { estimated_badge() } else { "" }
                    )
                })
                .collect::<String>();
            out.push(format!("<div class=\"gpu-temps\"><h6>GPUs</h6>{}</div>", gpus));
        }
        sink.replace(SurfaceId::Temperature, out.join("\n"));
    }

    fn render_empty(&self, sink: &mut dyn PanelSink) {
        sink.replace(SurfaceId::Temperature, placeholder(NO_DATA));
    }
}
