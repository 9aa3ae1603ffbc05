// Project Samarth command-line entry point

use clap::Parser;
use samarth::cli::{self, Cli};
use samarth::config::Settings;
use samarth::logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load()?;
    logging::init(&settings.log_level, settings.debug)?;

    // One query at a time; a single-threaded runtime is enough for reqwest.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(cli::run(cli, settings))
}
