/// Top-level configuration stanza.
#[derive(Debug, Deserialize)]
pub(crate) struct ConfigFragment {
    /// HTTP server configuration.
    pub(crate) server: Option<ServerFragment>,
    /// Updater service configuration.
    pub(crate) updater: Option<UpdaterFragment>,
    /// Result store configuration.
    pub(crate) result_store: Option<ResultStoreFragment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServerFragment {
    /// Socket address to listen on (default: 127.0.0.1:8000)
    pub(crate) listen_address: Option<String>,
    /// Number of HTTP worker threads (default: 2)
    pub(crate) workers: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdaterFragment {
    /// Supervisor backend, `systemd` or `command` (default: systemd)
    pub(crate) backend: Option<String>,
    /// Name of the updater service (default: dells2725hs-updater)
    pub(crate) service: Option<String>,
    /// Privileged update script, run by the updater service.
    pub(crate) script: Option<String>,
    /// Command line spawned by the `command` backend.
    pub(crate) command: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultStoreFragment {
    /// Absolute path of the update result file.
    pub(crate) path: Option<String>,
}
