// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::telemetry::setup_tracing;
use crate::{address, fingerprint, simulate};
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use eld_config::{load_config, AppConfig, CliOverrides};
use tracing::{info, instrument, Level};

#[derive(Parser, Debug)]
#[command(name = "lucky-draw")]
#[command(about = "Run and inspect lucky draws over encrypted participant names", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `lucky-draw -vvv` will give
    /// you trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,

    /// Chain to act on. Defaults to the coprocessor chain in the configuration
    #[arg(long, global = true)]
    chain_id: Option<u64>,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        setup_tracing(self.log_level())?;
        let config = self.load_config()?;
        info!("Config loaded from: {:?}", config.config_file());

        match self.command {
            Commands::Fingerprint { name } => fingerprint::execute(&name)?,
            Commands::Address => address::execute(&config)?,
            Commands::Simulate { names, seed, json } => {
                simulate::execute(&config, names, seed, json).await?
            }
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        load_config(
            self.config.as_deref(),
            CliOverrides {
                chain_id: self.chain_id,
                ..Default::default()
            },
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the 64 bit fingerprint a participant registers for NAME
    Fingerprint { name: String },

    /// Print the lucky draw deployment for the selected chain
    Address,

    /// Run a complete draw in process: deploy, register every name, draw, wait for the reveal
    /// and decrypt the winner with each participant's grant
    Simulate {
        /// A participant name. Repeat for every participant
        #[arg(long = "name", value_name = "NAME", required = true, action = ArgAction::Append)]
        names: Vec<String>,

        /// Seed the draw randomness for a reproducible result
        #[arg(long)]
        seed: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}
