//! Blocking systemd client, over the system D-Bus.

use super::{ProcessSupervisor, SupervisorError};
use dbus::arg::Variant;
use dbus::{BusType, Connection, Message, Path};

static SYSTEMD_DEST: &str = "org.freedesktop.systemd1";
static SYSTEMD_PATH: &str = "/org/freedesktop/systemd1";
static MANAGER_IFACE: &str = "org.freedesktop.systemd1.Manager";
static UNIT_IFACE: &str = "org.freedesktop.systemd1.Unit";
static PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";

/// Job mode for start requests: refuse if a conflicting job is queued.
static START_JOB_MODE: &str = "fail";

/// Unit states in which the updater counts as live.
static LIVE_STATES: [&str; 4] = ["active", "activating", "deactivating", "reloading"];

/// Method-call reply timeout, in milliseconds.
const DEFAULT_TIMEOUT_MS: i32 = 2000;

/// Supervisor backed by systemd.
///
/// A private bus connection is opened for each request, so that the
/// supervisor can be shared across threads.
#[derive(Clone, Debug)]
pub(crate) struct SystemdSupervisor {
    timeout_ms: i32,
}

impl Default for SystemdSupervisor {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SystemdSupervisor {
    fn connect() -> Result<Connection, String> {
        Connection::get_private(BusType::System)
            .map_err(|e| format!("failed to connect to system bus: {}", e))
    }

    fn call(&self, conn: &Connection, msg: Message) -> Result<Message, String> {
        conn.send_with_reply_and_block(msg, self.timeout_ms)
            .map_err(|e| e.to_string())
    }

    /// Load `unit` and return its object path.
    fn load_unit(&self, conn: &Connection, unit: &str) -> Result<Path<'static>, String> {
        let load =
            Message::new_method_call(SYSTEMD_DEST, SYSTEMD_PATH, MANAGER_IFACE, "LoadUnit")?
                .append1(unit);
        let loaded = self.call(conn, load)?;
        let unit_path: Path = loaded.read1().map_err(|e| e.to_string())?;
        trace!("unit '{}' loaded at {:?}", unit, unit_path);
        Ok(unit_path.into_static())
    }

    /// Fetch a unit property, as a raw reply.
    fn get_property(
        &self,
        conn: &Connection,
        unit_path: &Path,
        property: &str,
    ) -> Result<Message, String> {
        let get =
            Message::new_method_call(SYSTEMD_DEST, unit_path.clone(), PROPERTIES_IFACE, "Get")?
                .append2(UNIT_IFACE, property);
        self.call(conn, get)
    }

    /// Return the `ActiveState` of the unit and the id of its pending
    /// job, zero if none.
    fn unit_state(&self, conn: &Connection, unit: &str) -> Result<(String, u32), String> {
        let unit_path = self.load_unit(conn, unit)?;

        let reply = self.get_property(conn, &unit_path, "ActiveState")?;
        let state: Variant<String> = reply.read1().map_err(|e| e.to_string())?;

        let reply = self.get_property(conn, &unit_path, "Job")?;
        let job: Variant<(u32, Path)> = reply.read1().map_err(|e| e.to_string())?;
        let (job_id, _) = job.0;

        Ok((state.0, job_id))
    }
}

impl ProcessSupervisor for SystemdSupervisor {
    fn is_running(&self, service: &str) -> Result<bool, SupervisorError> {
        let unit = unit_name(service);
        let conn = Self::connect().map_err(|e| SupervisorError::liveness(service, e))?;
        let (state, job_id) = self
            .unit_state(&conn, &unit)
            .map_err(|e| SupervisorError::liveness(service, e))?;

        trace!("unit '{}' is {} (pending job: {})", unit, state, job_id);
        Ok(is_live(&state, job_id))
    }

    fn start(&self, service: &str) -> Result<(), SupervisorError> {
        let unit = unit_name(service);
        let conn = Self::connect().map_err(|e| SupervisorError::start(service, e))?;

        let start =
            Message::new_method_call(SYSTEMD_DEST, SYSTEMD_PATH, MANAGER_IFACE, "StartUnit")
                .map_err(|e| SupervisorError::start(service, e))?
                .append2(unit.as_str(), START_JOB_MODE);
        let reply = self
            .call(&conn, start)
            .map_err(|e| SupervisorError::start(service, e))?;
        let job: Path = reply
            .read1()
            .map_err(|e| SupervisorError::start(service, e))?;

        debug!("systemd queued start of '{}' as job {:?}", unit, job);
        Ok(())
    }
}

/// Full unit name for `service`, defaulting to a `.service` unit.
fn unit_name(service: &str) -> String {
    if service.contains('.') {
        service.to_string()
    } else {
        format!("{}.service", service)
    }
}

/// A unit is live while it is in a live state, or while a job for it
/// is queued and not yet running.
fn is_live(state: &str, job_id: u32) -> bool {
    job_id != 0 || LIVE_STATES.contains(&state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_names() {
        assert_eq!(unit_name("dells2725hs-updater"), "dells2725hs-updater.service");
        assert_eq!(unit_name("updater.service"), "updater.service");
        assert_eq!(unit_name("updater.target"), "updater.target");
    }

    #[test]
    fn live_states() {
        assert!(is_live("active", 0));
        assert!(is_live("activating", 0));
        assert!(is_live("deactivating", 0));
        assert!(is_live("reloading", 0));
        assert!(!is_live("inactive", 0));
        assert!(!is_live("failed", 0));
        assert!(!is_live("", 0));
    }

    #[test]
    fn queued_job_is_live() {
        // Start job waiting on ordering dependencies, unit not yet activating.
        assert!(is_live("inactive", 4211));
        assert!(is_live("failed", 12));
        assert!(is_live("activating", 4211));
    }
}
