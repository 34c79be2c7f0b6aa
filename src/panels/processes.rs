use super::{decode, or_na, percent_text, Panel, PanelError, NO_DATA};
use crate::surface::{escape, PanelSink, SurfaceId};
use serde::Deserialize;
use serde_json::Value;

const CPU_FLAG_PERCENT: f64 = 80.0;
const MEMORY_FLAG_BYTES: u64 = 1_000_000_000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProcessRecord {
    pid: Option<i64>,
    name: Option<String>,
    memory: Option<u64>,
    memory_formatted: Option<String>,
    cpu: Option<f64>,
    cpu_formatted: Option<String>,
    threads: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRow {
    pub pid: String,
    pub name: String,
    pub memory: String,
    pub cpu: String,
    pub threads: String,
    pub flagged: bool,
}

pub fn is_flagged(cpu_percent: f64, memory_bytes: u64) -> bool {
    cpu_percent > CPU_FLAG_PERCENT || memory_bytes > MEMORY_FLAG_BYTES
}

pub struct ProcessesPanel;

impl Panel for ProcessesPanel {
    type View = Vec<ProcessRow>;

    const NAME: &'static str = "processes";
    const SURFACES: &'static [SurfaceId] = &[SurfaceId::ProcessTable];

    fn map(&self, raw: &Value) -> Result<Vec<ProcessRow>, PanelError> {
        let records: Vec<ProcessRecord> = decode(Self::NAME, raw)?;
        Ok(records
            .into_iter()
            .map(|p| {
                let cpu = p.cpu.unwrap_or(0.0);
                let memory = p.memory.unwrap_or(0);
                ProcessRow {
                    pid: p.pid.map(|v| v.to_string()).unwrap_or_default(),
                    name: or_na(p.name.as_deref()),
                    memory: or_na(p.memory_formatted.as_deref()),
                    cpu: percent_text(p.cpu_formatted.as_deref(), cpu),
                    threads: p.threads.map(|v| v.to_string()).unwrap_or_default(),
                    flagged: is_flagged(cpu, memory),
                }
            })
            .collect())
    }

    fn render(&self, rows: &Vec<ProcessRow>, sink: &mut dyn PanelSink) {
        if rows.is_empty() {
            self.render_empty(sink);
            return;
        }
        let body = rows
            .iter()
            .map(|row| {
                let class = if row.flagged {
                    " class=\"table-warning\""
                } else {
                    ""
                };
                format!(
                    "<tr{}><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    class,
                    escape(&row.pid),
                    escape(&row.name),
                    escape(&row.memory),
                    escape(&row.cpu),
                    escape(&row.threads)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        sink.replace(SurfaceId::ProcessTable, body);
    }

    fn render_empty(&self, sink: &mut dyn PanelSink) {
        sink.replace(
            SurfaceId::ProcessTable,
            format!("<tr><td colspan=\"5\" class=\"text-muted\">{}</td></tr>", NO_DATA),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Board;
    use serde_json::json;

    #[test]
    fn flagging_is_cpu_or_memory() {
        assert!(is_flagged(85.0, 500_000_000));
        assert!(is_flagged(50.0, 2_000_000_000));
        assert!(!is_flagged(10.0, 10));
        assert!(!is_flagged(80.0, 1_000_000_000));
    }

    #[test]
    fn renders_rows_in_order_with_highlight() {
        let rows = ProcessesPanel
            .map(&json!([
                { "pid": 1, "name": "init", "memory": 10, "memoryFormatted": "10 B",
                  "cpu": 0.5, "cpuFormatted": "0.50%", "threads": 1 },
                { "pid": 42, "name": "<java>", "memory": 2000000000u64,
                  "memoryFormatted": "1.86 GB", "cpu": 12.0, "cpuFormatted": "12.00%", "threads": 80 }
            ]))
            .unwrap();
        assert!(!rows[0].flagged);
        assert!(rows[1].flagged);

        let mut board = Board::new();
        ProcessesPanel.render(&rows, &mut board);
        let html = board.content(SurfaceId::ProcessTable);
        assert!(html.find("init").unwrap() < html.find("&lt;java&gt;").unwrap());
        assert_eq!(html.matches("table-warning").count(), 1);
    }

    #[test]
    fn empty_list_renders_placeholder() {
        let mut board = Board::new();
        let rows = ProcessesPanel.map(&json!([])).unwrap();
        ProcessesPanel.render(&rows, &mut board);
        assert!(board.content(SurfaceId::ProcessTable).contains(NO_DATA));
    }

    #[test]
    fn blank_cpu_text_falls_back_to_value() {
        let rows = ProcessesPanel
            .map(&json!([
                { "pid": 7, "name": "worker", "cpu": 12.0, "cpuFormatted": "  " },
                { "pid": 8, "name": "idle", "cpu": 3.25 }
            ]))
            .unwrap();
        assert_eq!(rows[0].cpu, "12.00%");
        assert_eq!(rows[1].cpu, "3.25%");
    }

    #[test]
    fn non_list_payload_is_malformed() {
        assert!(ProcessesPanel.map(&json!({ "pid": 1 })).is_err());
    }
}
