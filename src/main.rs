use std::process::ExitCode;

use clap::Parser;
use lti_grader::cli::Cli;
use lti_grader::logging;

fn main() -> ExitCode {
    // Initialize Sentry before anything else so panics during startup are captured.
    // Returns a no-op guard when SENTRY_DSN is absent (local dev).
    let _sentry_guard = sentry::init(logging::sentry_options());
    logging::init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(lti_grader::run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind(), "{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
