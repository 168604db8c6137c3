//! Synchronous actor pool serving update requests.
//!
//! Status queries and launches perform blocking D-Bus and filesystem
//! calls, so they run on dedicated threads instead of the HTTP event
//! loop. Concurrent launches are still serialized by the launcher.

use super::{UpdateError, UpdateLauncher, UpdateStatus};
use actix::prelude::*;
use std::sync::Arc;

/// Number of threads serving update requests.
pub(crate) const MANAGER_THREADS: usize = 2;

pub(crate) struct UpdateManager {
    launcher: Arc<UpdateLauncher>,
}

impl UpdateManager {
    /// Start a pool of managers sharing `launcher`.
    pub(crate) fn start_pool(launcher: Arc<UpdateLauncher>, threads: usize) -> Addr<Self> {
        SyncArbiter::start(threads, move || UpdateManager {
            launcher: launcher.clone(),
        })
    }
}

impl Actor for UpdateManager {
    type Context = SyncContext<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        trace!("update manager started");
    }
}

/// Request: compute current update status.
pub(crate) struct QueryStatus {}

impl Message for QueryStatus {
    type Result = Result<UpdateStatus, UpdateError>;
}

impl Handler<QueryStatus> for UpdateManager {
    type Result = Result<UpdateStatus, UpdateError>;

    fn handle(&mut self, _msg: QueryStatus, _ctx: &mut Self::Context) -> Self::Result {
        self.launcher.status()
    }
}

/// Request: launch a new update.
pub(crate) struct StartUpdate {}

impl Message for StartUpdate {
    type Result = Result<(), UpdateError>;
}

impl Handler<StartUpdate> for UpdateManager {
    type Result = Result<(), UpdateError>;

    fn handle(&mut self, _msg: StartUpdate, _ctx: &mut Self::Context) -> Self::Result {
        self.launcher.start_async()
    }
}
