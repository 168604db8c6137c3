//! Process supervision.
//!
//! The updater runs outside of this process, under the control of a
//! supervisor. Two backends are available:
//!  * `SystemdSupervisor` - systemd units, driven over the system D-Bus.
//!  * `CommandSupervisor` - detached child processes, tracked in-process.

mod command;
mod systemd;

pub(crate) use command::CommandSupervisor;
pub(crate) use systemd::SystemdSupervisor;

use crate::config::{Backend, UpdaterSettings};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Fail)]
pub(crate) enum SupervisorError {
    #[fail(display = "failed to query liveness of '{}': {}", service, reason)]
    Liveness { service: String, reason: String },
    #[fail(display = "failed to start '{}': {}", service, reason)]
    Start { service: String, reason: String },
}

impl SupervisorError {
    pub(crate) fn liveness<S: fmt::Display>(service: &str, reason: S) -> Self {
        SupervisorError::Liveness {
            service: service.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn start<S: fmt::Display>(service: &str, reason: S) -> Self {
        SupervisorError::Start {
            service: service.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Liveness queries and detached starts of named long-running tasks.
pub(crate) trait ProcessSupervisor: fmt::Debug + Send + Sync {
    /// Whether `service` is currently running.
    fn is_running(&self, service: &str) -> Result<bool, SupervisorError>;

    /// Request `service` to start, without waiting for it to finish.
    fn start(&self, service: &str) -> Result<(), SupervisorError>;
}

/// Build the supervisor backend selected by configuration.
pub(crate) fn from_settings(cfg: &UpdaterSettings) -> Arc<dyn ProcessSupervisor> {
    match cfg.backend {
        Backend::Systemd => Arc::new(SystemdSupervisor::default()),
        Backend::Command(ref argv) => Arc::new(CommandSupervisor::new(argv.clone())),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SupervisorError::start("dells2725hs-updater", "access denied");
        assert_eq!(
            err.to_string(),
            "failed to start 'dells2725hs-updater': access denied"
        );
    }
}
