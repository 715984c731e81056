// Report templates and field table.
// All constant text of the report lives here, rows are parameterized
// only through the fields below.

use super::layout::{Column, LayoutField, Segment};

// Outer border shared by both tables and the footer
pub const BORDER: &str = "+-----------------------------------------------------------------------------------------+";

pub const DEVICE_TABLE_HEADER: [&str; 5] = [
    "|-----------------------------------------+------------------------+----------------------+",
    "| GPU  Name                 Persistence-M | Bus-Id          Disp.A | Volatile Uncorr. ECC |",
    "| Fan  Temp   Perf          Pwr:Usage/Cap |           Memory-Usage | GPU-Util  Compute M. |",
    "|                                         |                        |               MIG M. |",
    "|=========================================+========================+======================|",
];

// Third line of every device block, MIG mode is not reported
pub const DEVICE_MIG_ROW: &str = "|                                         |                        |                  N/A |";

pub const DEVICE_DIVIDER: &str = "+-----------------------------------------+------------------------+----------------------+";

pub const PROCESS_TABLE_HEADER: [&str; 4] = [
    "| Processes:                                                                              |",
    "|  GPU   GI   CI        PID   Type   Process name                              GPU Memory |",
    "|        ID   ID                                                               Usage      |",
    "|=========================================================================================|",
];

pub const NO_PROCESSES_ROW: &str = "|  No running processes found                                                             |";

// Placeholder shown for a missing or malformed bus id
pub const FALLBACK_BUS_ID: &str = "00000000:00.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerField {
    SmiVersion,
    DriverVersion,
    CudaVersion,
}

impl LayoutField for BannerField {
    fn column(self) -> Column {
        match self {
            BannerField::SmiVersion => Column::left(22),
            BannerField::DriverVersion => Column::left(14),
            BannerField::CudaVersion => Column::left(9),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceField {
    Index,
    Name,
    BusId,
    FanSpeed,
    Temperature,
    PowerUsage,
    MemoryUsed,
    MemoryTotal,
    Utilization,
}

impl LayoutField for DeviceField {
    fn column(self) -> Column {
        match self {
            DeviceField::Index => Column::right(4),
            DeviceField::Name => Column::left(31),
            DeviceField::BusId => Column::right(19),
            DeviceField::FanSpeed => Column::right(3),
            DeviceField::Temperature => Column::right(5),
            DeviceField::PowerUsage => Column::right(15),
            DeviceField::MemoryUsed => Column::right(8),
            DeviceField::MemoryTotal => Column::right(7),
            DeviceField::Utilization => Column::right(7),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessField {
    DeviceIndex,
    Pid,
    Kind,
    Name,
    MemoryUsage,
}

impl LayoutField for ProcessField {
    fn column(self) -> Column {
        match self {
            ProcessField::DeviceIndex => Column::right(5),
            ProcessField::Pid => Column::right(10),
            ProcessField::Kind => Column::right(7),
            ProcessField::Name => Column::left(38),
            ProcessField::MemoryUsage => Column::right(14),
        }
    }
}

pub const BANNER_ROW: &[Segment<BannerField>] = &[
    Segment::Text("| NVIDIA-SMI "),
    Segment::Value(BannerField::SmiVersion),
    Segment::Text(" Driver Version: "),
    Segment::Value(BannerField::DriverVersion),
    Segment::Text(" CUDA Version: "),
    Segment::Value(BannerField::CudaVersion),
    Segment::Text("|"),
];

// Index, name, persistence mode, bus id, display active, ECC
pub const DEVICE_IDENTITY_ROW: &[Segment<DeviceField>] = &[
    Segment::Text("|"),
    Segment::Value(DeviceField::Index),
    Segment::Text("  "),
    Segment::Value(DeviceField::Name),
    Segment::Text("Off |"),
    Segment::Value(DeviceField::BusId),
    Segment::Text(" Off |                  Off |"),
];

// Fan, temperature, performance state, power, memory, utilization,
// compute mode
pub const DEVICE_USAGE_ROW: &[Segment<DeviceField>] = &[
    Segment::Text("|"),
    Segment::Value(DeviceField::FanSpeed),
    Segment::Text("%"),
    Segment::Value(DeviceField::Temperature),
    Segment::Text("C    P2"),
    Segment::Value(DeviceField::PowerUsage),
    Segment::Text("W /  300W |"),
    Segment::Value(DeviceField::MemoryUsed),
    Segment::Text("MiB /"),
    Segment::Value(DeviceField::MemoryTotal),
    Segment::Text("MiB |"),
    Segment::Value(DeviceField::Utilization),
    Segment::Text("%      Default |"),
];

// GPU and compute instance ids are not reported
pub const PROCESS_ROW: &[Segment<ProcessField>] = &[
    Segment::Text("|"),
    Segment::Value(ProcessField::DeviceIndex),
    Segment::Text("   N/A  N/A"),
    Segment::Value(ProcessField::Pid),
    Segment::Value(ProcessField::Kind),
    Segment::Text("   "),
    Segment::Value(ProcessField::Name),
    Segment::Value(ProcessField::MemoryUsage),
    Segment::Text(" |"),
];

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT_WIDTH: usize = 91;

    // Width of a template line when every field fits its column
    fn template_width<F: LayoutField>(template: &[Segment<F>]) -> usize {
        template
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => text.len(),
                Segment::Value(field) => field.column().width,
            })
            .sum()
    }

    #[test]
    fn constant_lines_share_the_report_width() {
        let mut lines = vec![BORDER, DEVICE_MIG_ROW, DEVICE_DIVIDER, NO_PROCESSES_ROW];
        lines.extend(DEVICE_TABLE_HEADER);
        lines.extend(PROCESS_TABLE_HEADER);

        for line in lines {
            assert_eq!(line.len(), REPORT_WIDTH, "{line}");
        }
    }

    #[test]
    fn templates_share_the_report_width() {
        assert_eq!(template_width(BANNER_ROW), REPORT_WIDTH);
        assert_eq!(template_width(DEVICE_IDENTITY_ROW), REPORT_WIDTH);
        assert_eq!(template_width(DEVICE_USAGE_ROW), REPORT_WIDTH);
        assert_eq!(template_width(PROCESS_ROW), REPORT_WIDTH);
    }
}
