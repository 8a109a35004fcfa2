use clap::Parser;
use std::process::ExitCode;
use tosheets::args::Args;
use tosheets::dispatch::{Env, Invocation};
use tosheets::{commands, edit_url, Config, Mode, Result};
use tracing::{debug, error, trace, warn, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Usage errors exit with 1 like every other error; --help and --version exit with 0.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            // The error is always shown, even when the log filter hides the error level.
            if tracing::enabled!(Level::ERROR) {
                error!("{e}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");

    // Configuration errors surface here, before credentials or the network are touched.
    let invocation = Invocation::resolve(&args, &Env::from_process())?;
    debug!("Resolved {invocation:?}");

    let config = Config::load(args.common().home().path(), args.common().client_secret()).await?;

    // When TOSHEETS_IN_TEST_MODE is set and non-empty, the in-memory sheet replaces Google.
    let mode = Mode::from_env();
    let mut sheet = tosheets::sheet(&config, mode).await?;

    let mut stdout = std::io::stdout();
    let out = commands::run(&invocation, sheet.as_mut(), &mut stdout).await?;
    out.print();

    if invocation.open() {
        if let Some(report) = out.structure() {
            let url = edit_url(report.spreadsheet_id());
            debug!("Opening {url}");
            if let Err(e) = open::that_detached(&url) {
                warn!("Unable to open {url} in a browser: {e}");
            }
        }
    }
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
