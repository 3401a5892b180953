use clap::Parser;
use player_progress_lib::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    player_progress_lib::run(cli)?;
    Ok(())
}
