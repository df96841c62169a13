mod app;
mod cli;
mod db;
mod http;
mod logging;
mod paths;
mod store;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    logging::init(&paths::log_file_path()?)?;
    app::run(cli)
}
