use nvml_wrapper::{
    Device, Nvml, enum_wrappers::device::TemperatureSensor,
    enums::device::UsedGpuMemory, error::NvmlError,
};
use tracing::warn;

use crate::{
    collector::{
        DeviceStats, GpuProcess, TelemetryError, TelemetrySource,
        VersionSource,
    },
    telemetry::ProcessKind,
};

// Telemetry and version source backed by the NVML library
pub struct NvmlSource {
    nvml: Nvml,
}

impl NvmlSource {
    pub fn new(nvml: Nvml) -> Self {
        Self { nvml }
    }

    // Return a NVML device handle for the given index
    fn get(&self, index: u32) -> Result<Device<'_>, TelemetryError> {
        self.nvml.device_by_index(index).map_err(|err| match err {
            NvmlError::InvalidArg | NvmlError::NotFound => {
                TelemetryError::DeviceNotFound(index)
            }
            err => err.into(),
        })
    }

    fn update_identity(stats: &mut DeviceStats, device: &Device) {
        if let Ok(name) = device.name() {
            stats.name = Some(name);
        } else {
            warn!("Failed to fetch GPU name");
        }

        if let Ok(pci_info) = device.pci_info() {
            stats.bus_id = Some(pci_info.bus_id);
        } else {
            warn!("Failed to fetch GPU PCI info");
        }
    }

    fn update_temp(stats: &mut DeviceStats, device: &Device) {
        if let Ok(temp) = device.temperature(TemperatureSensor::Gpu) {
            stats.temperature = Some(temp);
        } else {
            warn!("Failed to fetch GPU temperature");
        }
    }

    fn update_memory_info(stats: &mut DeviceStats, device: &Device) {
        if let Ok(mem_info) = device.memory_info() {
            stats.used_memory = Some(mem_info.used);
            stats.total_memory = Some(mem_info.total);
        } else {
            warn!("Failed to fetch GPU memory info");
        }
    }

    fn update_utilization(stats: &mut DeviceStats, device: &Device) {
        if let Ok(utilization) = device.utilization_rates() {
            stats.utilization = Some(utilization.gpu);
        } else {
            warn!("Failed to fetch GPU utilization info");
        }
    }

    fn update_power(stats: &mut DeviceStats, device: &Device) {
        if let Ok(power_usage) = device.power_usage() {
            stats.power_usage = Some(power_usage);
        } else {
            warn!("Failed to fetch GPU power usage");
        }
    }

    fn update_fan(stats: &mut DeviceStats, device: &Device) {
        // Passively cooled boards have no fan, not worth a warning
        stats.fan_speed = device.fan_speed(0).ok();
    }
}

impl TelemetrySource for NvmlSource {
    fn device_count(&self) -> Result<u32, TelemetryError> {
        Ok(self.nvml.device_count()?)
    }

    fn device_stats(&self, index: u32) -> Result<DeviceStats, TelemetryError> {
        let device = self.get(index)?;
        let mut stats = DeviceStats::default();

        Self::update_identity(&mut stats, &device);
        Self::update_temp(&mut stats, &device);
        Self::update_memory_info(&mut stats, &device);
        Self::update_utilization(&mut stats, &device);
        Self::update_power(&mut stats, &device);
        Self::update_fan(&mut stats, &device);

        Ok(stats)
    }

    fn running_processes(
        &self,
        index: u32,
        kind: ProcessKind,
    ) -> Result<Vec<GpuProcess>, TelemetryError> {
        let device = self.get(index)?;

        let processes = match kind {
            ProcessKind::Compute => device.running_compute_processes(),
            ProcessKind::Graphics => device.running_graphics_processes(),
        }
        .map_err(|err| match err {
            NvmlError::NotFound => TelemetryError::NotFound,
            NvmlError::NotSupported => TelemetryError::NotSupported,
            err => err.into(),
        })?;

        Ok(processes
            .into_iter()
            .map(|process| GpuProcess {
                pid: process.pid,
                used_memory: match process.used_gpu_memory {
                    UsedGpuMemory::Used(bytes) => Some(bytes),
                    UsedGpuMemory::Unavailable => None,
                },
            })
            .collect())
    }
}

impl VersionSource for NvmlSource {
    fn driver_version(&self) -> Result<String, TelemetryError> {
        Ok(self.nvml.sys_driver_version()?)
    }

    fn cuda_version(&self) -> Result<String, TelemetryError> {
        let version = self.nvml.sys_cuda_driver_version()?;

        Ok(format_cuda_version(version))
    }
}

// Format the driver's CUDA version number (e.g. 12040) as "major.minor"
pub fn format_cuda_version(version: i32) -> String {
    let major = version / 1000;
    let minor = (version % 1000) / 10;

    format!("{major}.{minor}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuda_version_major_minor() {
        assert_eq!(format_cuda_version(12040), "12.4");
        assert_eq!(format_cuda_version(11070), "11.7");
        assert_eq!(format_cuda_version(12000), "12.0");
    }

    #[test]
    fn cuda_version_patch_digit_is_dropped() {
        assert_eq!(format_cuda_version(12021), "12.2");
    }
}
