//! `vdt` - administer the organisation tree, rest policies and VDT compliance
//! statistics from the command line.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
