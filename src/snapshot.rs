use serde::Deserialize;
use serde_json::Value;

/// One decoded poll payload. Subsystem records stay raw so that each panel
/// decodes (and may fail on) only its own block.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub timestamp: i64,
    pub system: Value,
    pub cpu: Option<Value>,
    pub memory: Option<Value>,
    pub processes: Option<Value>,
    pub disks: Option<Value>,
    pub gpus: Option<Value>,
    pub network: Option<Value>,
    pub temperature: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    system: Value,
    #[serde(default)]
    cpu: Option<Value>,
    #[serde(default)]
    memory: Option<Value>,
    #[serde(default)]
    processes: Option<Value>,
    #[serde(default)]
    disks: Option<Value>,
    #[serde(default)]
    gpus: Option<Value>,
    #[serde(default)]
    network: Option<Value>,
    #[serde(default)]
    temperature: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Stamp {
    timestamp: i64,
}

impl Snapshot {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let stamp = Stamp::deserialize(&envelope.system)?;
        Ok(Self {
            timestamp: stamp.timestamp,
            system: envelope.system,
            cpu: envelope.cpu,
            memory: envelope.memory,
            processes: envelope.processes,
            disks: envelope.disks,
            gpus: envelope.gpus,
            network: envelope.network,
            temperature: envelope.temperature,
        })
    }

    pub fn running_with_sudo(&self) -> bool {
        self.system
            .get("runningWithSudo")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
