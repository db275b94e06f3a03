//! # nutriscope entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Initialize logging (stderr + rolling file)
//!   ├─> init-config: write settings and exit
//!   ├─> Load settings and both datasets once
//!   │
//!   ├─> If a subcommand was given: run it and exit
//!   └─> Otherwise: interactive menu
//! ```
//!
//! ```bash
//! nutriscope stats
//! nutriscope compare --nutrients calories,fat --metrics mean,max
//! nutriscope filter "Calories between 200 400" --category food
//! nutriscope chat "Which drink has the least sugar?"
//! nutriscope --food menus/food.csv init-config
//! nutriscope            # interactive menu
//! ```

#![warn(clippy::all, rust_2018_idioms)]

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    nutriscope::logging::init(cli.verbose)?;
    cli::run(cli)
}
