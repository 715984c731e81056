use nvml_wrapper::error::NvmlError;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::telemetry::{
    DeviceRecord, ProcessKind, ProcessRecord, ReportSnapshot,
};

pub mod nvidia;
pub mod procfs;

// Shown in place of any value that could not be obtained
pub const NOT_AVAILABLE: &str = "N/A";

const BYTES_PER_MIB: u64 = 1024 * 1024;
const MILLIWATTS_PER_WATT: u32 = 1000;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("GPU {0} not found")]
    DeviceNotFound(u32),
    #[error("Requested information not found")]
    NotFound,
    #[error("Query not supported by the device")]
    NotSupported,
    #[error(transparent)]
    Nvml(#[from] NvmlError),
}

// Raw device readings, a None field means the query failed
#[derive(Debug, Default, Clone)]
pub struct DeviceStats {
    pub name: Option<String>,
    pub bus_id: Option<String>,

    pub fan_speed: Option<u32>,
    pub temperature: Option<u32>,

    // Power usage in milliwatts
    pub power_usage: Option<u32>,

    // Memory information, all values in bytes
    pub used_memory: Option<u64>,
    pub total_memory: Option<u64>,

    pub utilization: Option<u32>,
}

// A process running on a device as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuProcess {
    pub pid: u32,
    // Used GPU memory in bytes, None when the driver doesn't expose it
    pub used_memory: Option<u64>,
}

// Per-device telemetry provider
pub trait TelemetrySource {
    // Return the number of devices on the system
    fn device_count(&self) -> Result<u32, TelemetryError>;

    // Return the current readings of the given device
    fn device_stats(&self, index: u32) -> Result<DeviceStats, TelemetryError>;

    // Return the processes using the given engine of the device
    fn running_processes(
        &self,
        index: u32,
        kind: ProcessKind,
    ) -> Result<Vec<GpuProcess>, TelemetryError>;
}

// Driver and runtime version provider
pub trait VersionSource {
    fn driver_version(&self) -> Result<String, TelemetryError>;
    fn cuda_version(&self) -> Result<String, TelemetryError>;
}

// Process id to display name lookup.
// Lookup failures are answered with a placeholder, never an error
pub trait ProcessNameResolver {
    fn process_name(&self, pid: u32) -> String;
}

// Builds report snapshots from the external collaborators.
// Failing sub-queries degrade to placeholders instead of
// aborting the whole report
pub struct SnapshotCollector<'a, S, R> {
    source: &'a S,
    resolver: &'a R,

    // Only report this device when set
    device_filter: Option<u32>,
}

impl<'a, S, R> SnapshotCollector<'a, S, R>
where
    S: TelemetrySource + VersionSource,
    R: ProcessNameResolver,
{
    pub fn new(source: &'a S, resolver: &'a R) -> Self {
        Self {
            source,
            resolver,
            device_filter: None,
        }
    }

    pub fn with_device_filter(mut self, device_filter: Option<u32>) -> Self {
        self.device_filter = device_filter;
        self
    }

    // Query every collaborator and assemble a snapshot
    pub fn collect(&self) -> Result<ReportSnapshot, TelemetryError> {
        let driver_version = self.source.driver_version().unwrap_or_else(|err| {
            warn!("Failed to fetch driver version: {err}");
            NOT_AVAILABLE.to_string()
        });
        let cuda_version = self.source.cuda_version().unwrap_or_else(|err| {
            warn!("Failed to fetch CUDA version: {err}");
            NOT_AVAILABLE.to_string()
        });

        let mut snapshot =
            ReportSnapshot::new(driver_version.as_str(), cuda_version.as_str());

        let indices = self.device_indices()?;

        for &index in indices.iter() {
            snapshot.devices.push(self.device_record(index));
        }

        for &index in indices.iter() {
            // Compute processes are listed before graphics processes
            for kind in [ProcessKind::Compute, ProcessKind::Graphics] {
                self.collect_processes(index, kind, &mut snapshot.processes);
            }
        }

        trace!(
            "Collected snapshot: {} devices, {} processes",
            snapshot.devices.len(),
            snapshot.processes.len()
        );

        Ok(snapshot)
    }

    // Return the indices of the devices to report
    fn device_indices(&self) -> Result<Vec<u32>, TelemetryError> {
        let device_count = self.source.device_count()?;

        debug!("Found {device_count} GPU devices");

        match self.device_filter {
            Some(index) if index < device_count => Ok(vec![index]),
            Some(index) => Err(TelemetryError::DeviceNotFound(index)),
            None => Ok((0..device_count).collect()),
        }
    }

    fn device_record(&self, index: u32) -> DeviceRecord {
        let stats = self.source.device_stats(index).unwrap_or_else(|err| {
            warn!("Failed to fetch GPU {index} information: {err}");
            DeviceStats::default()
        });

        DeviceRecord {
            index,
            name: stats.name.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            bus_id: stats.bus_id.unwrap_or_default(),
            fan_percent: stats.fan_speed.unwrap_or(0),
            temperature_c: stats.temperature.unwrap_or(0),
            power_watts: stats.power_usage.unwrap_or(0) / MILLIWATTS_PER_WATT,
            memory_used_mib: stats.used_memory.unwrap_or(0) / BYTES_PER_MIB,
            memory_total_mib: stats.total_memory.unwrap_or(0) / BYTES_PER_MIB,
            utilization_percent: stats.utilization.unwrap_or(0),
        }
    }

    fn collect_processes(
        &self,
        index: u32,
        kind: ProcessKind,
        processes: &mut Vec<ProcessRecord>,
    ) {
        let running = match self.source.running_processes(index, kind) {
            Ok(running) => running,
            Err(err @ (TelemetryError::NotFound | TelemetryError::NotSupported)) => {
                debug!("No {kind:?} processes on GPU {index}: {err}");
                return;
            }
            Err(err) => {
                warn!("Failed to fetch {kind:?} processes on GPU {index}: {err}");
                return;
            }
        };

        for process in running {
            processes.push(ProcessRecord {
                device_index: index,
                pid: process.pid,
                kind,
                process_name: self.resolver.process_name(process.pid),
                memory_usage_mib: process.used_memory.unwrap_or(0) / BYTES_PER_MIB,
            });
        }
    }
}
