mod cli;
mod prompt;
mod run;

use std::process::ExitCode;

use clap::Parser;
use engine_logging::engine_error;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors exit with status 2 from inside clap.
    let cli = Cli::parse();
    engine_logging::initialize(&cli.log_destination(), cli.log_level());

    match run::execute(&cli).await {
        Ok(summary) => {
            if summary.interrupted() {
                println!("\nDownload interrupted by user");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            engine_error!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
