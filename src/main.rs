use anyhow::Result;
use clap::Parser;

use pricewatch::application::{Cli, CommandExecutor};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    CommandExecutor::execute(cli).await?;
    Ok(())
}
