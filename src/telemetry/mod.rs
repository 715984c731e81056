// Normalized telemetry snapshot handed to the report renderer.
// Plain data: construction never fails and values are kept as given,
// out of range numbers included.

// Which GPU engine a process is using
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessKind {
    Compute,
    Graphics,
}

impl ProcessKind {
    // Single letter tag shown in the process table
    pub fn tag(&self) -> char {
        match self {
            ProcessKind::Compute => 'C',
            ProcessKind::Graphics => 'G',
        }
    }
}

// Summary of one physical GPU
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRecord {
    // 0-based ordinal, stable for one report
    pub index: u32,
    pub name: String,

    // PCI bus id as reported by the driver, normalized at render time
    pub bus_id: String,

    pub fan_percent: u32,
    pub temperature_c: u32,
    pub power_watts: u32,

    // Memory information, all values in MiB
    pub memory_used_mib: u64,
    pub memory_total_mib: u64,

    pub utilization_percent: u32,
}

// One process holding resources on a GPU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    // Index of the device the process runs on
    pub device_index: u32,
    pub pid: u32,
    pub kind: ProcessKind,
    pub process_name: String,
    pub memory_usage_mib: u64,
}

// Everything needed to produce one report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSnapshot {
    pub driver_version: String,
    pub cuda_version: String,

    // Ordered by device index
    pub devices: Vec<DeviceRecord>,

    // Ordered by discovery: grouped by device,
    // compute processes before graphics processes
    pub processes: Vec<ProcessRecord>,
}

impl ReportSnapshot {
    pub fn new(driver_version: &str, cuda_version: &str) -> Self {
        Self {
            driver_version: driver_version.to_string(),
            cuda_version: cuda_version.to_string(),
            devices: Vec::new(),
            processes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags() {
        assert_eq!(ProcessKind::Compute.tag(), 'C');
        assert_eq!(ProcessKind::Graphics.tag(), 'G');
    }

    #[test]
    fn new_snapshot_is_empty() {
        let snapshot = ReportSnapshot::new("550.90.07", "12.4");

        assert_eq!(snapshot.driver_version, "550.90.07");
        assert_eq!(snapshot.cuda_version, "12.4");
        assert!(snapshot.devices.is_empty());
        assert!(snapshot.processes.is_empty());
    }

    #[test]
    fn records_accept_inconsistent_values() {
        // Used memory above total is kept as is
        let device = DeviceRecord {
            memory_used_mib: 2048,
            memory_total_mib: 1024,
            utilization_percent: 250,
            ..Default::default()
        };

        assert_eq!(device.memory_used_mib, 2048);
        assert_eq!(device.utilization_percent, 250);
    }
}
