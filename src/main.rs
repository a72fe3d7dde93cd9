use anyhow::anyhow;
use clap::Parser;

use minc::driver::{self, Options};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let opts = Options::parse();

    driver::run(&opts).map_err(|err| {
        if err.is_internal() {
            anyhow!(err).context("internal compiler error, no assembly was produced")
        } else {
            anyhow!(err).context("no assembly was produced")
        }
    })
}
