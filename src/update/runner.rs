//! Updater side: run the update script and record its outcome.
//!
//! This is what runs inside the privileged updater service. Whatever
//! happens to the script, exactly one result is written before
//! returning.

use super::{Outcome, ResultStore, StoreError, UpdateResult};
use crate::config::Settings;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

#[derive(Debug)]
pub(crate) struct UpdateRunner {
    program: PathBuf,
    args: Vec<String>,
    store: ResultStore,
}

impl UpdateRunner {
    pub(crate) fn new(program: PathBuf, args: Vec<String>, store: ResultStore) -> Self {
        Self {
            program,
            args,
            store,
        }
    }

    pub(crate) fn from_settings(cfg: &Settings) -> Self {
        let store = ResultStore::new(cfg.result_store.clone());
        Self::new(cfg.updater.script.clone(), vec![], store)
    }

    /// Run the update script to completion and persist its outcome.
    pub(crate) fn run(&self) -> Result<UpdateResult, StoreError> {
        let result = self.execute();
        match result.outcome {
            Outcome::Success => info!("update completed successfully"),
            Outcome::Failure => error!(
                "update failed: {}",
                result.diagnostic.as_ref().map_or("unknown error", String::as_str)
            ),
        }

        self.store.write(&result)?;
        Ok(result)
    }

    fn execute(&self) -> UpdateResult {
        info!("running update script '{}'", self.program.display());

        // Stdout goes straight to the journal, stderr is captured to
        // extract a diagnostic and then forwarded.
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(out) => {
                if let Err(e) = io::stderr().write_all(&out.stderr) {
                    warn!("failed to forward update script stderr: {}", e);
                }
                if out.status.success() {
                    UpdateResult::success()
                } else {
                    UpdateResult::failure(failure_diagnostic(out.status, &out.stderr))
                }
            }
            Err(e) => UpdateResult::failure(format!(
                "failed to launch update script '{}': {}",
                self.program.display(),
                e
            )),
        }
    }
}

/// Describe a failed run from its exit status and the last line it
/// printed on stderr.
fn failure_diagnostic(status: ExitStatus, stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let last_line = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).last();

    match last_line {
        Some(line) => format!("update script failed ({}): {}", status, line),
        None => format!("update script failed ({})", status),
    }
}
