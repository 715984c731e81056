use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    collector::{
        ProcessNameResolver, SnapshotCollector, TelemetrySource, VersionSource,
    },
    config::ReportConfig,
    errors::NvsmiError,
    report,
};

// Same layout as the date line of the vendor tool, e.g. "Mon Jul 14 21:58:43 2025"
pub const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

// Date line written before the report when enabled
pub fn timestamp_line(now: &NaiveDateTime) -> String {
    format!("{}\n", now.format(TIMESTAMP_FORMAT))
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write report to {path:?}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write report to stdout")]
    Stdout(#[source] io::Error),
}

// Where the rendered report goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    Stdout,
    // The file is truncated on every write
    File(PathBuf),
}

impl OutputSink {
    pub fn write(&self, text: &str) -> Result<(), OutputError> {
        match self {
            OutputSink::Stdout => {
                let mut stdout = io::stdout().lock();

                stdout
                    .write_all(text.as_bytes())
                    .and_then(|_| stdout.flush())
                    .map_err(OutputError::Stdout)
            }
            OutputSink::File(path) => {
                // The handle is closed before returning
                let mut file = File::create(path).map_err(|source| {
                    OutputError::File { path: path.clone(), source }
                })?;

                file.write_all(text.as_bytes()).map_err(|source| {
                    OutputError::File { path: path.clone(), source }
                })
            }
        }
    }
}

impl From<&ReportConfig> for OutputSink {
    fn from(config: &ReportConfig) -> Self {
        match &config.filename {
            Some(path) => OutputSink::File(path.clone()),
            None => OutputSink::Stdout,
        }
    }
}

// Collect, render and write reports, once or on an interval
pub struct Reporter<S, R> {
    source: S,
    resolver: R,

    sink: OutputSink,
    device_filter: Option<u32>,

    // None for a single report
    interval: Option<Duration>,

    timestamp: bool,
}

impl<S, R> Reporter<S, R>
where
    S: TelemetrySource + VersionSource,
    R: ProcessNameResolver,
{
    pub fn new(source: S, resolver: R, config: &ReportConfig) -> Self {
        Self {
            source,
            resolver,
            sink: OutputSink::from(config),
            device_filter: config.gpu_id,
            interval: config.interval(),
            timestamp: config.timestamp,
        }
    }

    // Produce a single report
    pub fn report_once(&self) -> Result<(), NvsmiError> {
        let snapshot = SnapshotCollector::new(&self.source, &self.resolver)
            .with_device_filter(self.device_filter)
            .collect()?;

        // The clock is read here, rendering itself stays pure
        let mut text = String::new();
        if self.timestamp {
            text.push_str(&timestamp_line(&Local::now().naive_local()));
        }
        text.push_str(&report::render(&snapshot));

        self.sink.write(&text)?;

        debug!("Report written to {:?}", self.sink);

        Ok(())
    }

    // Run the reporter until the last report or until the token is
    // cancelled. Cancellation is a normal exit
    pub async fn run(&self, run_token: CancellationToken) -> Result<(), NvsmiError> {
        loop {
            self.report_once()?;

            let Some(interval) = self.interval else {
                break;
            };

            select! {
                _ = run_token.cancelled() => {
                    info!("Reporter: Quiting");

                    break;
                },
                _ = tokio::time::sleep(interval) => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        collector::fake::{FakeResolver, FakeSource, two_gpu_source},
        report::templates::BORDER,
    };

    fn file_config(path: &std::path::Path) -> ReportConfig {
        ReportConfig {
            filename: Some(path.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn sink_from_config() {
        assert_eq!(
            OutputSink::from(&ReportConfig::default()),
            OutputSink::Stdout
        );

        let config = file_config(std::path::Path::new("out.txt"));
        assert_eq!(
            OutputSink::from(&config),
            OutputSink::File(PathBuf::from("out.txt"))
        );
    }

    #[test]
    fn timestamp_line_format() {
        let now = chrono::NaiveDate::from_ymd_opt(2025, 7, 14)
            .and_then(|date| date.and_hms_opt(21, 58, 43))
            .unwrap();

        assert_eq!(timestamp_line(&now), "Mon Jul 14 21:58:43 2025\n");
    }

    #[test]
    fn file_sink_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let sink = OutputSink::File(path.clone());

        sink.write("first report, longer\n").unwrap();
        sink.write("second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
    }

    #[test]
    fn file_sink_reports_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let sink = OutputSink::File(dir.path().join("missing").join("out.txt"));

        assert!(matches!(sink.write("x"), Err(OutputError::File { .. })));
    }

    #[tokio::test]
    async fn single_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");

        let reporter =
            Reporter::new(two_gpu_source(), FakeResolver, &file_config(&path));
        reporter.run(CancellationToken::new()).await.unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Driver Version: 550.90.07"));
        assert!(text.contains("proc-4242"));
        assert!(text.ends_with('\n'));
    }

    #[tokio::test]
    async fn timestamp_precedes_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");

        let config = ReportConfig {
            timestamp: true,
            ..file_config(&path)
        };

        let reporter = Reporter::new(two_gpu_source(), FakeResolver, &config);
        reporter.run(CancellationToken::new()).await.unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();

        let date = lines.next().unwrap();
        assert!(NaiveDateTime::parse_from_str(date, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(lines.next(), Some(BORDER));
    }

    #[tokio::test]
    async fn report_without_timestamp_starts_with_border() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");

        let reporter =
            Reporter::new(two_gpu_source(), FakeResolver, &file_config(&path));
        reporter.run(CancellationToken::new()).await.unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some(BORDER));
    }

    #[tokio::test]
    async fn cancelled_loop_stops_after_current_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");

        let config = ReportConfig {
            loop_interval: Some(3600),
            ..file_config(&path)
        };

        let token = CancellationToken::new();
        token.cancel();

        let reporter = Reporter::new(two_gpu_source(), FakeResolver, &config);
        reporter.run(token).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn collection_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");

        let reporter =
            Reporter::new(FakeSource::default(), FakeResolver, &file_config(&path));
        let result = reporter.run(CancellationToken::new()).await;

        assert!(matches!(result, Err(NvsmiError::Telemetry(_))));
        assert!(!path.exists());
    }
}
