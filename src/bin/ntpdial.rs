use clap::Parser;
use clap::error::ErrorKind;
use std::panic;
use std::process;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};

use ntpdial::{Args, ProbeError, Settings, SntpClient, UdpDialer, boundary, logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // the boundary below reports panics as log records
    panic::set_hook(Box::new(|_| {}));

    let code = boundary::guard(start()).await;
    process::exit(code);
}

async fn start() -> i32 {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => return fatal(ProbeError::Config(e.to_string().trim().to_string())),
    };

    let env_level = std::env::var(logging::LEVEL_ENV).ok();
    let level = match logging::resolve_level(args.log_level.as_deref(), env_level.as_deref()) {
        Ok(level) => level,
        Err(e) => return fatal(e),
    };
    logging::init(level);

    let settings = match Settings::from_args(&args) {
        Ok(settings) => settings,
        Err(e) => return fatal(e),
    };
    debug!(
        network = %settings.network,
        policy = %settings.policy,
        targets = settings.targets.len(),
        timeout_ms = settings.timeout.as_millis() as u64,
        "settings loaded"
    );

    let dialer = UdpDialer::new(settings.network);
    let client = SntpClient::new(settings.local_address.clone(), settings.timeout);

    match run(&settings.targets, settings.run_options(), &client, &dialer).await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => fatal(e),
    }
}

/// Log a terminal error once and map it to the process exit code.
fn fatal(err: ProbeError) -> i32 {
    logging::init(LevelFilter::INFO);
    error!(error = %err, error_kind = err.kind(), "fatal error");
    err.exit_code()
}
