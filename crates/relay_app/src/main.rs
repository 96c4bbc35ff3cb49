mod platform;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    platform::app::run(platform::cli::Cli::parse())
}
