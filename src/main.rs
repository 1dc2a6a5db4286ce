//! Feedgrab CLI: download recent feed media; use --dry-run to list without downloading.

use anyhow::Result;
use clap::Parser;
use feedgrab::engine::arg_parser::Cli;
use feedgrab::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
