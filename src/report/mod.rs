// Fixed width text report in the layout of the vendor `nvidia-smi` summary.
//
// Rendering is a pure function of the snapshot: no I/O and no clock, the
// same snapshot always produces the same bytes.

use crate::telemetry::{DeviceRecord, ProcessRecord, ReportSnapshot};

use layout::{Row, fill};
use templates::{
    BANNER_ROW, BORDER, BannerField, DEVICE_DIVIDER, DEVICE_IDENTITY_ROW,
    DEVICE_MIG_ROW, DEVICE_TABLE_HEADER, DEVICE_USAGE_ROW, DeviceField,
    FALLBACK_BUS_ID, NO_PROCESSES_ROW, PROCESS_ROW, PROCESS_TABLE_HEADER,
    ProcessField,
};

pub mod layout;
pub mod templates;

// Render the whole report, one trailing newline included
pub fn render(snapshot: &ReportSnapshot) -> String {
    let mut lines: Vec<String> = Vec::new();

    render_banner(&mut lines, snapshot);

    for device in snapshot.devices.iter() {
        render_device(&mut lines, device);
    }

    render_processes(&mut lines, &snapshot.processes);

    lines.push(BORDER.to_string());

    let mut text = lines.join("\n");
    text.push('\n');

    text
}

// Turn a short form bus id ("50:00.0") into the canonical form with an
// 8 digit PCI domain ("00000050:00.0")
pub fn normalize_bus_id(raw: &str) -> String {
    if let Some((domain, rest)) = raw.split_once(':') {
        let domain_valid =
            !domain.is_empty() && domain.chars().all(|c| c.is_ascii_hexdigit());
        let rest_valid = !rest.is_empty()
            && rest
                .chars()
                .all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.');

        if domain_valid && rest_valid {
            return format!("{domain:0>8}:{rest}");
        }
    }

    FALLBACK_BUS_ID.to_string()
}

// Replace control characters so a value can never start a new line
// or move the cursor. Nothing is truncated
pub fn printable(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { '?' } else { c })
        .collect()
}

fn render_banner(lines: &mut Vec<String>, snapshot: &ReportSnapshot) {
    let banner = Banner {
        driver_version: snapshot.driver_version.as_str(),
        cuda_version: snapshot.cuda_version.as_str(),
    };

    lines.push(BORDER.to_string());
    lines.push(fill(BANNER_ROW, &banner));
    lines.extend(DEVICE_TABLE_HEADER.iter().map(|line| line.to_string()));
}

fn render_device(lines: &mut Vec<String>, device: &DeviceRecord) {
    lines.push(fill(DEVICE_IDENTITY_ROW, device));
    lines.push(fill(DEVICE_USAGE_ROW, device));
    lines.push(DEVICE_MIG_ROW.to_string());
    lines.push(DEVICE_DIVIDER.to_string());
}

fn render_processes(lines: &mut Vec<String>, processes: &[ProcessRecord]) {
    // The process table is separated from the device table by an empty line
    lines.push(String::new());
    lines.push(BORDER.to_string());
    lines.extend(PROCESS_TABLE_HEADER.iter().map(|line| line.to_string()));

    if processes.is_empty() {
        lines.push(NO_PROCESSES_ROW.to_string());
    } else {
        for process in processes {
            lines.push(fill(PROCESS_ROW, process));
        }
    }
}

// Header values. The product version and the driver version
// are the same value
struct Banner<'a> {
    driver_version: &'a str,
    cuda_version: &'a str,
}

impl Row for Banner<'_> {
    type Field = BannerField;

    fn value(&self, field: BannerField) -> String {
        match field {
            BannerField::SmiVersion => printable(self.driver_version),
            BannerField::DriverVersion => printable(self.driver_version),
            BannerField::CudaVersion => printable(self.cuda_version),
        }
    }
}

impl Row for DeviceRecord {
    type Field = DeviceField;

    fn value(&self, field: DeviceField) -> String {
        match field {
            DeviceField::Index => self.index.to_string(),
            DeviceField::Name => printable(&self.name),
            DeviceField::BusId => normalize_bus_id(&self.bus_id),
            DeviceField::FanSpeed => self.fan_percent.to_string(),
            DeviceField::Temperature => self.temperature_c.to_string(),
            DeviceField::PowerUsage => self.power_watts.to_string(),
            DeviceField::MemoryUsed => self.memory_used_mib.to_string(),
            DeviceField::MemoryTotal => self.memory_total_mib.to_string(),
            DeviceField::Utilization => self.utilization_percent.to_string(),
        }
    }
}

impl Row for ProcessRecord {
    type Field = ProcessField;

    fn value(&self, field: ProcessField) -> String {
        match field {
            ProcessField::DeviceIndex => self.device_index.to_string(),
            ProcessField::Pid => self.pid.to_string(),
            ProcessField::Kind => self.kind.tag().to_string(),
            ProcessField::Name => printable(&self.process_name),
            // Value and unit are a single field
            ProcessField::MemoryUsage => format!("{}MiB", self.memory_usage_mib),
        }
    }
}
