//! Supervisor for detached child processes.

use super::{ProcessSupervisor, SupervisorError};
use std::collections::HashMap;
use std::io;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;

/// Supervisor spawning a fixed command as a child of this process.
///
/// Liveness is tracked through the child handle, so a running update is
/// not visible anymore after the front end restarts. This backend is
/// meant for development hosts without systemd.
#[derive(Debug)]
pub(crate) struct CommandSupervisor {
    argv: Vec<String>,
    children: Mutex<HashMap<String, Child>>,
}

impl CommandSupervisor {
    pub(crate) fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            children: Mutex::new(HashMap::new()),
        }
    }

    fn spawn(&self) -> io::Result<Child> {
        let (program, args) = match self.argv.split_first() {
            Some(split) => split,
            None => return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command")),
        };
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .spawn()
    }
}

impl ProcessSupervisor for CommandSupervisor {
    fn is_running(&self, service: &str) -> Result<bool, SupervisorError> {
        let mut children = self
            .children
            .lock()
            .map_err(|_| SupervisorError::liveness(service, "poisoned lock"))?;
        reap(&mut children, service).map_err(|e| SupervisorError::liveness(service, e))
    }

    fn start(&self, service: &str) -> Result<(), SupervisorError> {
        let mut children = self
            .children
            .lock()
            .map_err(|_| SupervisorError::start(service, "poisoned lock"))?;

        // Single instance per service, as a unit manager would do.
        if reap(&mut children, service).map_err(|e| SupervisorError::start(service, e))? {
            debug!("'{}' already running, start request merged", service);
            return Ok(());
        }

        let child = self
            .spawn()
            .map_err(|e| SupervisorError::start(service, e))?;
        debug!("spawned '{}' with pid {}", service, child.id());
        children.insert(service.to_string(), child);
        Ok(())
    }
}

/// Check whether the child for `service` is still alive, collecting it
/// once it has exited.
fn reap(children: &mut HashMap<String, Child>, service: &str) -> io::Result<bool> {
    let status = match children.get_mut(service) {
        Some(child) => match child.try_wait()? {
            Some(status) => status,
            None => return Ok(true),
        },
        None => return Ok(false),
    };

    debug!("'{}' exited, {}", service, status);
    children.remove(service);
    Ok(false)
}
