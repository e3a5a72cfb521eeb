use anyhow::Context;
use structopt::StructOpt;

use puzzlebox::{tui, Opts};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::from_args();
    tui::run(opts).context("terminal frontend failed")?;
    Ok(())
}
