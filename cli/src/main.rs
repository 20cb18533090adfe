use clap::Parser;
use clipdiff_cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    clipdiff_cli::run_main(cli)
}
