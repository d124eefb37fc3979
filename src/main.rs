use clap::Parser;
use loan_payoff::cli::{Cli, run};
use loan_payoff::telemetry;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = telemetry::init(&cli.log_level) {
        eprintln!("Telemetry error: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
