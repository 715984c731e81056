use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{arg_parser::ArgsOptions, collector::procfs::UNKNOWN_PROCESS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to open Json configuration file {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse Json configuration file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// Report settings, read from an optional Json file and
// overridden by the command line
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    // Only report this GPU
    pub gpu_id: Option<u32>,

    // Write the report to this file instead of stdout
    pub filename: Option<PathBuf>,

    // Repeat the report every given number of seconds, 0 disables looping
    pub loop_interval: Option<u64>,

    // Name shown for processes that can't be resolved
    pub unknown_process_name: String,

    // Print the local date and time before each report
    pub timestamp: bool,
}

impl ReportConfig {
    // Parse the Json configuration file at the given path
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Parsing config file at: {:?}", path);

        let file = File::open(path).map_err(|source| ConfigError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let buf = BufReader::new(file);

        serde_json::from_reader(buf).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    // Build the configuration for the given command line, values passed
    // on the command line take precedence over the file
    pub fn load(args: &ArgsOptions) -> Result<Self, ConfigError> {
        let config = match &args.config_file_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        Ok(config.merge_args(args))
    }

    pub fn merge_args(mut self, args: &ArgsOptions) -> Self {
        if args.gpu_id.is_some() {
            self.gpu_id = args.gpu_id;
        }
        if args.filename.is_some() {
            self.filename = args.filename.clone();
        }
        if args.loop_interval.is_some() {
            self.loop_interval = args.loop_interval;
        }
        if args.timestamp {
            self.timestamp = true;
        }

        self
    }

    // Return the repeat interval, None for a single report
    pub fn interval(&self) -> Option<Duration> {
        self.loop_interval
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            gpu_id: None,
            filename: None,
            loop_interval: None,
            unknown_process_name: UNKNOWN_PROCESS.to_string(),
            timestamp: false,
        }
    }
}
