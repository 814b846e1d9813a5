use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::RelverResult;

/// Default name of the version cache file.
pub const VERSION_CACHE: &str = "RELEASE-VERSION";

/// File holding the last version computed from git.
///
/// The file should be shipped in source distributions and ignored by git.
#[derive(Clone, Debug)]
pub struct VersionCache {
    path: PathBuf,
}

impl Default for VersionCache {
    fn default() -> Self {
        Self::new(VERSION_CACHE)
    }
}

impl VersionCache {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached version, `None` if the file is missing or blank.
    pub fn load(&self) -> RelverResult<Option<String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cached version");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let version = contents.trim();
        if version.is_empty() {
            return Ok(None);
        }
        Ok(Some(version.to_string()))
    }

    /// Overwrites the cache with the given version.
    pub fn store(&self, version: &str) -> RelverResult<()> {
        fs::write(&self.path, format!("{version}\n"))?;
        Ok(())
    }
}
