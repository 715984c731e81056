pub mod arg_parser;
pub mod collector;
pub mod config;
pub mod errors;
pub mod logger;
pub mod report;
pub mod reporter;
pub mod telemetry;
