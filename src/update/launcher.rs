use super::{ResultStore, StatusOracle, UpdateError, UpdateStatus};
use crate::config::Settings;
use crate::supervisor;
use std::sync::Mutex;

/// Entry point for starting updates.
#[derive(Debug)]
pub(crate) struct UpdateLauncher {
    oracle: StatusOracle,
    /// Serializes check-clear-start sequences.
    launch_lock: Mutex<()>,
}

impl UpdateLauncher {
    pub(crate) fn new(oracle: StatusOracle) -> Self {
        Self {
            oracle,
            launch_lock: Mutex::new(()),
        }
    }

    pub(crate) fn from_settings(cfg: &Settings) -> Self {
        let supervisor = supervisor::from_settings(&cfg.updater);
        let store = ResultStore::new(cfg.result_store.clone());
        let oracle = StatusOracle::new(cfg.updater.service.clone(), supervisor, store);
        Self::new(oracle)
    }

    pub(crate) fn oracle(&self) -> &StatusOracle {
        &self.oracle
    }

    /// Current update status.
    pub(crate) fn status(&self) -> Result<UpdateStatus, UpdateError> {
        self.oracle.get()
    }

    /// Start a new update in the background.
    ///
    /// This returns as soon as the supervisor has accepted the start
    /// request. If the start request fails, the previous result has
    /// already been cleared and stays so.
    pub(crate) fn start_async(&self) -> Result<(), UpdateError> {
        // The lock guards no data, a poisoned one is still usable.
        let _guard = self
            .launch_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Only liveness decides `InProgress`; a corrupted leftover result
        // must not prevent a new update from being launched.
        if self.oracle.is_live()? {
            info!("update requested, but one is already in progress");
            return Err(UpdateError::AlreadyInProgress);
        }

        self.oracle.store().clear()?;
        self.oracle.supervisor().start(self.oracle.service())?;

        info!("update started via '{}'", self.oracle.service());
        Ok(())
    }
}
