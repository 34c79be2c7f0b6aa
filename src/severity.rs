use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    CpuUsage,
    MemoryUsage,
    DiskPartitionUsed,
    GpuUsage,
    GpuMemory,
    Temperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    Bar,
    Badge,
}

impl MetricKind {
    pub const fn thresholds(self) -> (f64, f64) {
        match self {
            Self::CpuUsage => (50.0, 80.0),
            Self::MemoryUsage => (60.0, 80.0),
            Self::DiskPartitionUsed => (70.0, 85.0),
            Self::GpuUsage => (60.0, 80.0),
            Self::GpuMemory => (60.0, 80.0),
            Self::Temperature => (70.0, 85.0),
        }
    }
}

pub fn classify(value: f64, kind: MetricKind) -> Tier {
    let (warning, critical) = kind.thresholds();
    if value > critical {
        Tier::Critical
    } else if value > warning {
        Tier::Warning
    } else {
        Tier::Normal
    }
}

impl Tier {
    pub const fn class(self, treatment: Treatment) -> &'static str {
        match (treatment, self) {
            (Treatment::Bar, Self::Normal) => "bg-success",
            (Treatment::Bar, Self::Warning) => "bg-warning",
            (Treatment::Bar, Self::Critical) => "bg-danger",
            (Treatment::Badge, Self::Normal) => "text-success",
            (Treatment::Badge, Self::Warning) => "text-warning",
            (Treatment::Badge, Self::Critical) => "text-danger",
        }
    }

    /// Every class a treatment can apply; used to clear stale markers.
    pub const fn all_classes(treatment: Treatment) -> [&'static str; 3] {
        [
            Self::Normal.class(treatment),
            Self::Warning.class(treatment),
            Self::Critical.class(treatment),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_thresholds_are_strict() {
        assert_eq!(classify(50.0, MetricKind::CpuUsage), Tier::Normal);
        assert_eq!(classify(50.0001, MetricKind::CpuUsage), Tier::Warning);
        assert_eq!(classify(80.0, MetricKind::CpuUsage), Tier::Warning);
        assert_eq!(classify(80.0001, MetricKind::CpuUsage), Tier::Critical);
    }

    #[test]
    fn memory_thresholds_are_strict() {
        assert_eq!(classify(60.0, MetricKind::MemoryUsage), Tier::Normal);
        assert_eq!(classify(60.0001, MetricKind::MemoryUsage), Tier::Warning);
        assert_eq!(classify(95.0, MetricKind::MemoryUsage), Tier::Critical);
    }

    #[test]
    fn disk_gpu_and_temperature_tables() {
        assert_eq!(classify(70.0, MetricKind::DiskPartitionUsed), Tier::Normal);
        assert_eq!(classify(85.5, MetricKind::DiskPartitionUsed), Tier::Critical);
        assert_eq!(classify(61.0, MetricKind::GpuUsage), Tier::Warning);
        assert_eq!(classify(81.0, MetricKind::GpuMemory), Tier::Critical);
        assert_eq!(classify(85.0, MetricKind::Temperature), Tier::Warning);
        assert_eq!(classify(-5.0, MetricKind::Temperature), Tier::Normal);
    }

    #[test]
    fn tier_classes_are_distinct_per_treatment() {
        let bars = Tier::all_classes(Treatment::Bar);
        assert_eq!(bars, ["bg-success", "bg-warning", "bg-danger"]);
        assert_eq!(Tier::Critical.class(Treatment::Badge), "text-danger");
    }
}
