//! Boutique command line

use std::process::ExitCode;

use clap::Parser;

mod cli;

#[tokio::main]
#[expect(
    clippy::print_stderr,
    reason = "errors are reported to the terminal, logging may not be initialized"
)]
async fn main() -> ExitCode {
    _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    if let Err(error) = boutique::observability::init(&cli.config.logging) {
        eprintln!("{error}");

        return ExitCode::FAILURE;
    }

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");

            ExitCode::FAILURE
        }
    }
}
