//! dells2725hs-web: device-management front end for the Dell S2725HS.
//!
//! This binary serves the local management API of the appliance and
//! orchestrates its privileged updater. Updates run detached from the
//! front end, under a process supervisor, and report their outcome
//! through a durable result file.
//!
//! It is made of a few entities passing requests to each other:
//!  * `UpdateManager` - actor pool answering status and launch requests.
//!  * `UpdateLauncher` - serialized check-clear-start of the updater.
//!  * `StatusOracle` - status derived from updater liveness and last result.
//!  * `ProcessSupervisor` - systemd (over D-Bus) or child-process backend.
//!
//! The `run-update` subcommand is the other side of the contract: it runs
//! as the updater service and records the result.

extern crate actix;
extern crate actix_web;
extern crate chrono;
extern crate clap;
extern crate dbus;
extern crate env_logger;
#[macro_use]
extern crate failure;
extern crate futures;
#[macro_use]
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
#[macro_use]
extern crate structopt;
extern crate tempfile;
extern crate toml;

mod cli;
mod config;
mod supervisor;
mod update;
mod web;

use failure::Fallible;
use structopt::StructOpt;

fn main() -> Fallible<()> {
    let opts = cli::CliOptions::from_args();
    init_logging(opts.verbosity)?;

    trace!("command-line options: {:?}", opts);
    opts.run()
}

/// Initialize logging from `RUST_LOG`, raised by command-line verbosity.
fn init_logging(verbosity: u64) -> Fallible<()> {
    let mut builder = env_logger::Builder::from_default_env();
    match verbosity {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    };
    builder.try_init()?;
    Ok(())
}
