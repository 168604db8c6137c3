use crate::config::fragments;
use failure::{Fallible, ResultExt};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory holding configuration fragments, relative to each base directory.
static FRAGMENTS_DIR: &str = "dells2725hs-web/config.d";

/// Configuration fragments merged, not yet validated.
#[derive(Debug, Serialize)]
pub(crate) struct ConfigInput {
    pub(crate) server: ServerInput,
    pub(crate) updater: UpdaterInput,
    pub(crate) result_store: ResultStoreInput,
}

impl ConfigInput {
    /// Read config fragments from `dirs` and merge them into a single config.
    pub(crate) fn read_configs(dirs: &[PathBuf]) -> Fallible<Self> {
        let mut fragments = vec![];
        for path in collect_fragments(dirs)? {
            trace!("reading config fragment '{}'", path.display());

            let content =
                fs::read(&path).context(format!("failed to read '{}'", path.display()))?;
            let frag: fragments::ConfigFragment = toml::from_slice(&content)
                .context(format!("failed to parse TOML in '{}'", path.display()))?;
            fragments.push(frag);
        }

        let cfg = Self::merge_fragments(fragments);
        if let Ok(dump) = toml::to_string_pretty(&cfg) {
            debug!("configuration input:\n{}", dump);
        }

        Ok(cfg)
    }

    /// Merge multiple fragments into a single configuration, later
    /// fragments overriding earlier ones.
    pub(crate) fn merge_fragments(fragments: Vec<fragments::ConfigFragment>) -> Self {
        let mut servers = vec![];
        let mut updaters = vec![];
        let mut stores = vec![];

        for frag in fragments {
            if let Some(s) = frag.server {
                servers.push(s);
            }
            if let Some(u) = frag.updater {
                updaters.push(u);
            }
            if let Some(r) = frag.result_store {
                stores.push(r);
            }
        }

        Self {
            server: ServerInput::from_fragments(servers),
            updater: UpdaterInput::from_fragments(updaters),
            result_store: ResultStoreInput::from_fragments(stores),
        }
    }
}

/// List fragment files, in merge order.
///
/// A fragment in a later directory shadows the same-named fragment of
/// an earlier one. Surviving fragments are ordered by file name.
fn collect_fragments(dirs: &[PathBuf]) -> Fallible<Vec<PathBuf>> {
    let mut by_name: BTreeMap<OsString, PathBuf> = BTreeMap::new();

    for base in dirs {
        let dir = base.join(FRAGMENTS_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => bail!("failed to list '{}': {}", dir.display(), e),
        };

        for entry in entries {
            let path = entry?.path();
            if !is_fragment(&path) {
                continue;
            }
            if let Some(name) = path.file_name() {
                by_name.insert(name.to_os_string(), path.clone());
            }
        }
    }

    Ok(by_name.into_iter().map(|(_, path)| path).collect())
}

fn is_fragment(path: &Path) -> bool {
    path.is_file() && path.extension().map_or(false, |ext| ext == "toml")
}

#[derive(Debug, Serialize)]
pub(crate) struct ServerInput {
    pub(crate) listen_address: String,
    pub(crate) workers: Option<usize>,
}

impl ServerInput {
    fn from_fragments(fragments: Vec<fragments::ServerFragment>) -> Self {
        let mut cfg = Self {
            listen_address: String::new(),
            workers: None,
        };

        for frag in fragments {
            if let Some(a) = frag.listen_address {
                cfg.listen_address = a;
            }
            if let Some(w) = frag.workers {
                cfg.workers = Some(w);
            }
        }

        cfg
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdaterInput {
    pub(crate) backend: String,
    /// Unset unless some fragment names a service, even an empty one.
    pub(crate) service: Option<String>,
    pub(crate) script: String,
    pub(crate) command: Vec<String>,
}

impl UpdaterInput {
    fn from_fragments(fragments: Vec<fragments::UpdaterFragment>) -> Self {
        let mut cfg = Self {
            backend: String::new(),
            service: None,
            script: String::new(),
            command: vec![],
        };

        for frag in fragments {
            if let Some(b) = frag.backend {
                cfg.backend = b;
            }
            if frag.service.is_some() {
                cfg.service = frag.service;
            }
            if let Some(s) = frag.script {
                cfg.script = s;
            }
            if let Some(c) = frag.command {
                cfg.command = c;
            }
        }

        cfg
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultStoreInput {
    pub(crate) path: String,
}

impl ResultStoreInput {
    fn from_fragments(fragments: Vec<fragments::ResultStoreFragment>) -> Self {
        let mut cfg = Self {
            path: String::new(),
        };

        for frag in fragments {
            if let Some(p) = frag.path {
                cfg.path = p;
            }
        }

        cfg
    }
}
