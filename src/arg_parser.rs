use std::path::PathBuf;

use argparse::{ArgumentParser, Print, StoreOption, StoreTrue};

#[derive(Debug, Default, Clone)]
pub struct ArgsOptions {
    pub config_file_path: Option<PathBuf>,

    pub gpu_id: Option<u32>,
    pub filename: Option<PathBuf>,
    pub loop_interval: Option<u64>,
    pub timestamp: bool,
}

impl ArgsOptions {
    pub fn parse() -> Self {
        let mut options = ArgsOptions::default();

        {
            let mut parser = ArgumentParser::new();
            parser.set_description(
                "nvsmi: an open-source implementation of nvidia-smi",
            );

            // Target GPU
            parser.refer(&mut options.gpu_id).add_option(
                &["-i", "--id"],
                StoreOption,
                "Target a specific GPU",
            );

            // Output file
            parser.refer(&mut options.filename).add_option(
                &["-f", "--filename"],
                StoreOption,
                "Log to the specified file, rather than to stdout",
            );

            // Loop interval
            parser.refer(&mut options.loop_interval).add_option(
                &["-l", "--loop"],
                StoreOption,
                "Repeat the report until Ctrl+C at the specified second interval",
            );

            // Timestamp line
            parser.refer(&mut options.timestamp).add_option(
                &["-t", "--timestamp"],
                StoreTrue,
                "Print the current date and time before the report",
            );

            // Configuration file path
            parser.refer(&mut options.config_file_path).add_option(
                &["-c", "--config"],
                StoreOption,
                "The file path of the Json configuration file",
            );

            // Show version
            parser.add_option(
                &["-V", "--version"],
                Print(env!("CARGO_PKG_VERSION").to_string()),
                "Show the program version",
            );

            parser.parse_args_or_exit();
        }

        options
    }
}
