//! msgview CLI — bundle conversation transcripts into a single HTML viewer.
//!
//! Reads every transcript in the messages directory and embeds them as
//! JSON in a viewer template, producing one self-contained file.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
