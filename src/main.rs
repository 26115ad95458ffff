mod cli;

use clap::Parser;
use cli::{Cli, Commands, ConfigArgs};
use imagebox::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    imagebox::observability::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server(args) => {
            let mut config = load_config(&args.config)?;
            if let Some(address) = args.address {
                config.server.bind_addr = address;
            }
            imagebox::api::run(config).await?;
        }
        Commands::CheckConfig(args) => {
            let config = load_config(&args)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn load_config(args: &ConfigArgs) -> Result<Config, AnyError> {
    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    Ok(config)
}
