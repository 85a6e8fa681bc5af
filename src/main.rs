use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::error;

use storefront::config::{load_config, print_schema};
use storefront::startup;
use storefront::utils::logger::init_logging;

#[derive(Parser)]
#[command(name = "storefront", version, about = "Storefront edge server with the Session Gate")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the edge server (default).
    Serve {
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
    },
    /// Print the configuration JSON schema.
    Schema,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve {
        config: PathBuf::from("config.yaml"),
    });

    match command {
        Command::Schema => print_schema(),
        Command::Serve { config } => {
            let config = load_config(&config);
            if let Err(e) = init_logging(&config.logging, config.environment) {
                eprintln!("{}", e);
                std::process::exit(1);
            }
            if let Err(e) = startup::run(Arc::new(config)).await {
                error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
