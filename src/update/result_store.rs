//! Durable single-slot store for the latest update result.
//!
//! The store is shared between the front end (which clears it when
//! launching an update) and the privileged updater (which writes the
//! outcome before exiting). Writes go through a temporary file in the
//! same directory, renamed over the target, so that readers never see
//! a partial record.

use super::result::UpdateResult;
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Mode for the result file; the updater runs privileged but the
/// front end must still be able to read its record.
const RESULT_FILE_MODE: u32 = 0o644;

#[derive(Debug, Fail)]
pub(crate) enum StoreError {
    #[fail(display = "failed to read update result '{}': {}", _0, _1)]
    Read(String, #[cause] io::Error),
    #[fail(display = "failed to write update result '{}': {}", _0, _1)]
    Write(String, #[cause] io::Error),
    #[fail(display = "failed to clear update result '{}': {}", _0, _1)]
    Clear(String, #[cause] io::Error),
    #[fail(display = "malformed update result '{}': {}", _0, _1)]
    Decode(String, #[cause] serde_json::Error),
    #[fail(display = "failed to serialize update result: {}", _0)]
    Encode(#[cause] serde_json::Error),
}

#[derive(Clone, Debug)]
pub(crate) struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub(crate) fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Remove any stored result. Succeeds if nothing is stored.
    pub(crate) fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(_) => {
                debug!("cleared update result at '{}'", self.path.display());
                sync_dir(self.parent_dir()).map_err(|e| StoreError::Clear(self.name(), e))
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
                trace!("no update result to clear at '{}'", self.path.display());
                Ok(())
            }
            Err(e) => Err(StoreError::Clear(self.name(), e)),
        }
    }

    /// Persist `result`, replacing any previous one.
    pub(crate) fn write(&self, result: &UpdateResult) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(result).map_err(StoreError::Encode)?;
        let dir = self.parent_dir();
        self.replace(dir, &content)
            .map_err(|e| StoreError::Write(self.name(), e))?;

        debug!(
            "recorded update result ({:?}) at '{}'",
            result.outcome,
            self.path.display()
        );
        Ok(())
    }

    /// Return the stored result, if any.
    pub(crate) fn read(&self) -> Result<Option<UpdateResult>, StoreError> {
        let content = match fs::read(&self.path) {
            Ok(c) => c,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Read(self.name(), e)),
        };

        let result =
            serde_json::from_slice(&content).map_err(|e| StoreError::Decode(self.name(), e))?;
        Ok(Some(result))
    }

    fn replace(&self, dir: &Path, content: &[u8]) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".update-result")
            .tempfile_in(dir)?;
        tmp.write_all(content)?;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(RESULT_FILE_MODE))?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        sync_dir(dir)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Flush directory entries, making a rename or removal durable.
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::result::Outcome;

    fn store_in(dir: &tempfile::TempDir) -> ResultStore {
        ResultStore::new(dir.path().join("latest-update-result.json"))
    }

    #[test]
    fn read_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let res = UpdateResult::failure("exit code: 2");
        store.write(&res).unwrap();
        assert_eq!(store.read().unwrap(), Some(res));
    }

    #[test]
    fn write_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.write(&UpdateResult::failure("first")).unwrap();
        let second = UpdateResult::success();
        store.write(&second).unwrap();
        assert_eq!(store.read().unwrap(), Some(second));

        // Only the result file is left behind, no temporaries.
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn clear_from_any_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        // Absent.
        store.clear().unwrap();
        assert_eq!(store.read().unwrap(), None);

        // Present.
        store.write(&UpdateResult::success()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.read().unwrap(), None);

        // Corrupted.
        fs::write(store.path(), b"{not json").unwrap();
        store.clear().unwrap();
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn corrupted_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), b"").unwrap();

        match store.read() {
            Err(StoreError::Decode(..)) => {}
            other => panic!("unexpected read result: {:?}", other),
        }
    }

    #[test]
    fn clear_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory sitting at the result path cannot be removed as a file.
        let path = dir.path().join("result");
        fs::create_dir(&path).unwrap();
        let store = ResultStore::new(path);

        match store.clear() {
            Err(StoreError::Clear(..)) => {}
            other => panic!("unexpected clear result: {:?}", other),
        }
    }

    #[test]
    fn write_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("logs").join("result.json"));

        store.write(&UpdateResult::success()).unwrap();
        let res = store.read().unwrap().unwrap();
        assert_eq!(res.outcome, Outcome::Success);
    }

    #[test]
    fn result_file_is_world_readable() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.write(&UpdateResult::success()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, RESULT_FILE_MODE);
    }
}
