use backtester::cli::{run, Cli};
use backtester::telemetry::init_logging;
use clap::Parser;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("warning: logging disabled ({e})");
    }
    run(cli)
}
