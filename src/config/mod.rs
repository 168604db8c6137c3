//! Configuration parsing and validation.
//!
//! This module contains three logical entities:
//!  * Fragments: single configuration files, holding a subset of configuration entries.
//!  * Inputs: configuration fragments merged, but not yet validated.
//!  * Settings: validated runtime configuration, handed to each component.
mod fragments;
mod inputs;

use failure::{Fallible, ResultExt};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Base directories for configuration fragments, in increasing priority.
static DEFAULT_CONFIG_DIRS: [&str; 3] = ["/usr/lib", "/run", "/etc"];

static DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:8000";
const DEFAULT_WORKERS: usize = 2;
static DEFAULT_SERVICE: &str = "dells2725hs-updater";
static DEFAULT_SCRIPT: &str = "/opt/dells2725hs-privileged/scripts/update";
static DEFAULT_RESULT_PATH: &str = "/home/dells2725hs/logs/latest-update-result.json";

/// Runtime configuration.
///
/// It holds validated settings, passed explicitly to each component.
#[derive(Clone, Debug, Serialize)]
pub(crate) struct Settings {
    pub(crate) server: ServerSettings,
    pub(crate) updater: UpdaterSettings,
    /// Location of the update result file.
    pub(crate) result_store: PathBuf,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct ServerSettings {
    pub(crate) listen_address: SocketAddr,
    pub(crate) workers: usize,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct UpdaterSettings {
    pub(crate) backend: Backend,
    /// Name under which the updater is supervised.
    pub(crate) service: String,
    /// Update script, executed by `run-update`.
    pub(crate) script: PathBuf,
}

/// Supervisor backend for the updater.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) enum Backend {
    /// Units managed by systemd.
    Systemd,
    /// Child processes of the front end, spawned from this command line.
    Command(Vec<String>),
}

impl Settings {
    /// Read configuration fragments from `dirs` and validate them.
    pub(crate) fn read_config(dirs: &[PathBuf]) -> Fallible<Self> {
        let cfg = inputs::ConfigInput::read_configs(dirs)?;
        Self::try_from_input(cfg)
    }

    /// Validate inputs and return valid settings.
    fn try_from_input(cfg: inputs::ConfigInput) -> Fallible<Self> {
        let listen_address = non_empty_or(cfg.server.listen_address, DEFAULT_LISTEN_ADDRESS);
        let listen_address: SocketAddr = listen_address
            .parse::<SocketAddr>()
            .context(format!("invalid listen address '{}'", listen_address))?;
        let workers = cfg.server.workers.unwrap_or(DEFAULT_WORKERS);
        ensure!(workers > 0, "number of HTTP workers must be positive");

        let updater = UpdaterSettings::try_from_input(cfg.updater)?;

        let result_store = PathBuf::from(non_empty_or(cfg.result_store.path, DEFAULT_RESULT_PATH));
        ensure!(
            result_store.is_absolute(),
            "result store path '{}' is not absolute",
            result_store.display()
        );

        let settings = Self {
            server: ServerSettings {
                listen_address,
                workers,
            },
            updater,
            result_store,
        };
        if let Ok(dump) = serde_json::to_string_pretty(&settings) {
            debug!("runtime configuration:\n{}", dump);
        }

        Ok(settings)
    }
}

impl UpdaterSettings {
    fn try_from_input(cfg: inputs::UpdaterInput) -> Fallible<Self> {
        let backend = match cfg.backend.as_ref() {
            "" | "systemd" => Backend::Systemd,
            "command" => {
                ensure!(
                    !cfg.command.is_empty(),
                    "updater backend 'command' requires a non-empty 'command'"
                );
                Backend::Command(cfg.command)
            }
            x => bail!("unsupported updater backend '{}'", x),
        };

        let service = cfg.service.unwrap_or_else(|| DEFAULT_SERVICE.to_string());
        ensure!(!service.is_empty(), "updater service name must not be empty");
        ensure!(
            !service.contains(|c: char| c == '/' || c.is_whitespace()),
            "invalid updater service name '{}'",
            service
        );

        let script = PathBuf::from(non_empty_or(cfg.script, DEFAULT_SCRIPT));

        Ok(Self {
            backend,
            service,
            script,
        })
    }
}

/// Default configuration directories, as paths.
pub(crate) fn default_dirs() -> Vec<PathBuf> {
    DEFAULT_CONFIG_DIRS.iter().map(|d| Path::new(d).to_path_buf()).collect()
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}
