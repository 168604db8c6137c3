use super::{ResultStore, UpdateError, UpdateResult};
use crate::supervisor::ProcessSupervisor;
use std::sync::Arc;

/// Update status, as observed by clients.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum UpdateStatus {
    /// No updater running and no result stored.
    Idle,
    /// Updater running; any stored result is stale.
    InProgress,
    /// Updater not running, last outcome available.
    Completed(UpdateResult),
}

impl UpdateStatus {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            UpdateStatus::Idle => "idle",
            UpdateStatus::InProgress => "in_progress",
            UpdateStatus::Completed(_) => "completed",
        }
    }

    pub(crate) fn result(&self) -> Option<&UpdateResult> {
        match self {
            UpdateStatus::Completed(r) => Some(r),
            _ => None,
        }
    }
}

/// Source of truth for the update status.
///
/// Liveness of the updater is always checked before looking at the
/// result store, so a leftover result is never reported while an
/// update is running.
#[derive(Clone, Debug)]
pub(crate) struct StatusOracle {
    service: String,
    supervisor: Arc<dyn ProcessSupervisor>,
    store: ResultStore,
}

impl StatusOracle {
    pub(crate) fn new(
        service: String,
        supervisor: Arc<dyn ProcessSupervisor>,
        store: ResultStore,
    ) -> Self {
        Self {
            service,
            supervisor,
            store,
        }
    }

    /// Compute current status.
    pub(crate) fn get(&self) -> Result<UpdateStatus, UpdateError> {
        if self.is_live()? {
            return Ok(UpdateStatus::InProgress);
        }

        let status = match self.store.read()? {
            Some(res) => UpdateStatus::Completed(res),
            None => UpdateStatus::Idle,
        };
        trace!("update status: {:?}", status);
        Ok(status)
    }

    /// Whether the updater is currently running.
    pub(crate) fn is_live(&self) -> Result<bool, UpdateError> {
        let live = self.supervisor.is_running(&self.service)?;
        if live {
            trace!("updater '{}' is running", self.service);
        }
        Ok(live)
    }

    pub(crate) fn service(&self) -> &str {
        &self.service
    }

    pub(crate) fn supervisor(&self) -> &dyn ProcessSupervisor {
        self.supervisor.as_ref()
    }

    pub(crate) fn store(&self) -> &ResultStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::testing::FakeSupervisor;
    use std::fs;

    fn oracle(dir: &tempfile::TempDir) -> (StatusOracle, Arc<FakeSupervisor>) {
        let sup = Arc::new(FakeSupervisor::default());
        let store = ResultStore::new(dir.path().join("result.json"));
        let oracle = StatusOracle::new("dells2725hs-updater".to_string(), sup.clone(), store);
        (oracle, sup)
    }

    #[test]
    fn idle_without_process_or_result() {
        let dir = tempfile::tempdir().unwrap();
        let (oracle, _) = oracle(&dir);

        let status = oracle.get().unwrap();
        assert_eq!(status, UpdateStatus::Idle);
        assert_eq!(status.result(), None);
    }

    #[test]
    fn liveness_dominates_stored_result() {
        let dir = tempfile::tempdir().unwrap();
        let (oracle, sup) = oracle(&dir);
        oracle.store().write(&UpdateResult::success()).unwrap();
        sup.set_running(true);

        let status = oracle.get().unwrap();
        assert_eq!(status, UpdateStatus::InProgress);
        assert_eq!(status.result(), None);
    }

    #[test]
    fn completed_with_stored_result() {
        let dir = tempfile::tempdir().unwrap();
        let (oracle, _) = oracle(&dir);
        let res = UpdateResult::failure("exit code: 1");
        oracle.store().write(&res).unwrap();

        let status = oracle.get().unwrap();
        assert_eq!(status.label(), "completed");
        assert_eq!(status.result(), Some(&res));
    }

    #[test]
    fn running_then_finished() {
        let dir = tempfile::tempdir().unwrap();
        let (oracle, sup) = oracle(&dir);

        sup.set_running(true);
        assert_eq!(oracle.get().unwrap(), UpdateStatus::InProgress);

        let res = UpdateResult::success();
        oracle.store().write(&res).unwrap();
        assert_eq!(oracle.get().unwrap(), UpdateStatus::InProgress);

        sup.set_running(false);
        assert_eq!(oracle.get().unwrap(), UpdateStatus::Completed(res));
    }

    #[test]
    fn liveness_failure_is_not_idle() {
        let dir = tempfile::tempdir().unwrap();
        let (oracle, sup) = oracle(&dir);
        sup.break_liveness();

        match oracle.get() {
            Err(UpdateError::Supervisor(_)) => {}
            other => panic!("unexpected status: {:?}", other),
        }
    }

    #[test]
    fn corrupted_result_is_not_idle() {
        let dir = tempfile::tempdir().unwrap();
        let (oracle, _) = oracle(&dir);
        fs::write(oracle.store().path(), b"garbage").unwrap();

        match oracle.get() {
            Err(UpdateError::Store(_)) => {}
            other => panic!("unexpected status: {:?}", other),
        }
    }
}
