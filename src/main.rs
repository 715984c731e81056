use anyhow::{Context, Result};
use nvml_wrapper::Nvml;
use nvsmi::{
    arg_parser::ArgsOptions,
    collector::{nvidia::NvmlSource, procfs::ProcfsResolver},
    config::ReportConfig,
    logger,
    reporter::Reporter,
};
use tokio::signal::ctrl_c;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_logging();

    // Parse the command line arguments
    let args_options = ArgsOptions::parse();
    let config = ReportConfig::load(&args_options)?;

    // This token is used to stop a looping report on Ctrl+C
    let token = CancellationToken::new();
    {
        let token = token.clone();

        tokio::spawn(async move {
            match ctrl_c().await {
                Ok(()) => {
                    info!("Interrupted, stopping");
                    token.cancel();
                }
                Err(err) => error!("Failed to listen for Ctrl+C: {err}"),
            }
        });
    }

    let nvml = Nvml::init().with_context(|| "Failed to load NVML library")?;

    let reporter = Reporter::new(
        NvmlSource::new(nvml),
        ProcfsResolver::new(&config.unknown_process_name),
        &config,
    );

    reporter
        .run(token)
        .await
        .with_context(|| "Failed to produce GPU report")?;

    Ok(())
}
