//! Command-line interface.

use crate::config::{self, Settings};
use crate::update::{UpdateLauncher, UpdateRunner};
use crate::web;
use failure::{Fallible, ResultExt};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "dells2725hs-web",
    about = "Device-management front end for the Dell S2725HS."
)]
#[structopt(raw(setting = "clap::AppSettings::VersionlessSubcommands"))]
pub(crate) struct CliOptions {
    /// Verbosity level (higher is more verbose).
    #[structopt(short = "v", parse(from_occurrences))]
    pub(crate) verbosity: u64,

    /// Configuration base directory (repeatable, replaces system defaults).
    #[structopt(long = "config-dir", parse(from_os_str))]
    pub(crate) config_dirs: Vec<PathBuf>,

    #[structopt(subcommand)]
    pub(crate) cmd: CliCommand,
}

#[derive(Debug, StructOpt)]
pub(crate) enum CliCommand {
    /// Serve the HTTP API.
    #[structopt(name = "serve")]
    Serve {},
    /// Print current update status as JSON.
    #[structopt(name = "status")]
    Status {},
    /// Start an update in the background.
    #[structopt(name = "start")]
    Start {},
    /// Run the update script and record its result (updater service entrypoint).
    #[structopt(name = "run-update")]
    RunUpdate {},
}

impl CliOptions {
    /// Dispatch to the selected subcommand.
    pub(crate) fn run(self) -> Fallible<()> {
        let dirs = if self.config_dirs.is_empty() {
            config::default_dirs()
        } else {
            self.config_dirs
        };
        let settings = Settings::read_config(&dirs).context("failed to read configuration")?;

        match self.cmd {
            CliCommand::Serve {} => web::serve(&settings),
            CliCommand::Status {} => print_status(&settings),
            CliCommand::Start {} => start_update(&settings),
            CliCommand::RunUpdate {} => run_update(&settings),
        }
    }
}

fn print_status(cfg: &Settings) -> Fallible<()> {
    let launcher = UpdateLauncher::from_settings(cfg);
    let status = launcher.status()?;
    let reply = web::StatusReply::from(&status);
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

fn start_update(cfg: &Settings) -> Fallible<()> {
    let launcher = UpdateLauncher::from_settings(cfg);
    launcher.start_async()?;
    println!("update started");
    Ok(())
}

fn run_update(cfg: &Settings) -> Fallible<()> {
    let runner = UpdateRunner::from_settings(cfg);
    let result = runner.run()?;
    if !result.is_success() {
        bail!(
            "update failed: {}",
            result.diagnostic.unwrap_or_default()
        );
    }
    Ok(())
}
