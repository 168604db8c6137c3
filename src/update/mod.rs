//! Update orchestration.
//!
//! This module contains the entities coordinating the front end with the
//! privileged updater:
//!  * `ResultStore` - durable record of the last update outcome.
//!  * `StatusOracle` - status derived from updater liveness and the stored result.
//!  * `UpdateLauncher` - serialized, detached start of the updater.
//!  * `UpdateRunner` - the updater side, running the update script.
//!  * `UpdateManager` - actor pool serving the above to the HTTP layer.

mod launcher;
mod manager;
mod result;
mod result_store;
mod runner;
mod status;

pub(crate) use launcher::UpdateLauncher;
pub(crate) use manager::{QueryStatus, StartUpdate, UpdateManager, MANAGER_THREADS};
pub(crate) use result::{Outcome, UpdateResult};
pub(crate) use result_store::{ResultStore, StoreError};
pub(crate) use runner::UpdateRunner;
pub(crate) use status::{StatusOracle, UpdateStatus};

use crate::supervisor::SupervisorError;

#[derive(Debug, Fail)]
pub(crate) enum UpdateError {
    #[fail(display = "an update is already in progress")]
    AlreadyInProgress,
    #[fail(display = "{}", _0)]
    Supervisor(#[cause] SupervisorError),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl UpdateError {
    /// Stable identifier of the error kind, for API consumers.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            UpdateError::AlreadyInProgress => "already_in_progress",
            UpdateError::Supervisor(_) => "supervisor",
            UpdateError::Store(_) => "store",
        }
    }
}

impl From<SupervisorError> for UpdateError {
    fn from(err: SupervisorError) -> Self {
        UpdateError::Supervisor(err)
    }
}

impl From<StoreError> for UpdateError {
    fn from(err: StoreError) -> Self {
        UpdateError::Store(err)
    }
}
