use clap::Parser;
use gridflux::cli::{self, Cli};
use gridflux::config::Config;
use tracing::error;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    config.init_logging();

    if let Err(e) = cli::execute(cli, config).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
