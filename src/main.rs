// Headless entry point.  Rendering and pointer wiring belong to the host
// application; the binary drives the same editing session from the command
// line so redactions can be batch-applied to files.

use clap::Parser;
use redactfe::{cli, log_info, logger};

fn main() -> std::process::ExitCode {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let args = cli::CliArgs::parse();
    log_info!("CLI invoked with {} input pattern(s)", args.input.len());
    cli::run(args)
}
