use anyhow::Result;
use clap::Parser;

use trace_workbench::cli;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = cli::Cli::parse();
    cli::run(args).await
}
