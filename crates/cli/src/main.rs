use clap::Parser;
use mapper_core::Capabilities;
use photo_mapper::app::{self, Cli};
use photo_mapper::report;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let caps = Capabilities::detect();
    let mut stderr = io::stderr();
    match app::run(&cli, &caps, &mut stderr).await {
        Ok(summary) => {
            if let Err(e) = report::success(&mut io::stdout(), &summary, cli.json) {
                eprintln!("failed to print summary: {}", e);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            let _ = report::failure(&mut stderr, &err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
