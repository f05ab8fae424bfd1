use anyhow::Result;
use clap::Parser;

mod args;
mod cmd;
mod logging;
mod output;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = args::Cli::parse();
    output::init(cli.json);
    logging::init(cli.log_json);

    cmd::dispatch(cli).await
}
