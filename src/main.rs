use clap::Parser;

use crossarb::adapter::inbound::cli::command::{Cli, Commands};
use crossarb::adapter::inbound::cli::output::{self, OutputConfig};
use crossarb::adapter::inbound::cli::{check, run, trades};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    output::configure(OutputConfig { json: cli.json });

    let result = match &cli.command {
        Commands::Run(args) => run::execute(args).await,
        Commands::Check(args) => check::execute(&args.config),
        Commands::Trades(args) => trades::execute(args),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
