//! Compute a PEP440 release version from git history.
//!
//! The version is derived from `git describe --dirty`. Whenever git yields a
//! version it is written to a cache file (`RELEASE-VERSION`), which is read
//! back when git is unavailable, e.g. in an unpacked source distribution.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use bon::Builder;
use thiserror::Error;
use tracing::{debug, info};

pub mod cache;
pub mod describe;
pub mod error;
pub mod git;

pub use cache::{VERSION_CACHE, VersionCache};
pub use describe::{Description, Version, is_valid_release};
pub use git::Git;

#[derive(Debug, Error)]
pub enum RelverError {
    #[error("'{}' not found in PATH", .program.display())]
    GitNotFound { program: PathBuf },
    #[error("'{}' failed with exit status {}:\n{detail}", .cmd.join(" "), display_code(.code))]
    GitFailed {
        cmd: Vec<String>,
        code: Option<i32>,
        detail: String,
    },
    #[error("can not parse the output of git describe ({0:?})")]
    UnparsableDescription(String),
    #[error("invalid release version ({release:?})")]
    InvalidRelease { release: String, description: String },
    #[error("can not determine version number")]
    Unresolved,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl RelverError {
    /// Exit code of a failed git command.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::GitFailed { code, .. } => *code,
            _ => None,
        }
    }

    /// True when git could not be run or refused to run.
    pub fn is_git_unavailable(&self) -> bool {
        matches!(self, Self::GitNotFound { .. } | Self::GitFailed { .. })
    }
}

pub type RelverResult<T> = Result<T, RelverError>;

/// Where a resolved version came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Git,
    Cache,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Cache => "cache",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub version: String,
    pub source: Source,
}

/// Resolves the release version from git, falling back to the version cache.
#[derive(Builder, Clone, Debug, Default)]
pub struct Resolver {
    #[builder(default)]
    git: Git,
    #[builder(default)]
    cache: VersionCache,
}

impl Resolver {
    /// Resolver for the repository at `dir`, caching into `dir/RELEASE-VERSION`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            git: Git::builder().cwd(dir).build(),
            cache: VersionCache::new(dir.join(VERSION_CACHE)),
        }
    }

    pub fn cache(&self) -> &VersionCache {
        &self.cache
    }

    /// Computes the version from git, updating the cache when it changed.
    ///
    /// The cached version is returned when git is not available or the
    /// directory is not a work tree.
    pub fn resolve(&self) -> RelverResult<Resolved> {
        let cached = self.cache.load()?;
        let Some(version) = self.live_version()? else {
            let version = cached.ok_or(RelverError::Unresolved)?;
            info!(%version, path = %self.cache.path().display(), "using cached version");
            return Ok(Resolved {
                version,
                source: Source::Cache,
            });
        };

        if cached.as_deref() != Some(version.as_str()) {
            info!(%version, path = %self.cache.path().display(), "updating version cache");
            self.cache.store(version.as_str())?;
        }
        Ok(Resolved {
            version: version.into_string(),
            source: Source::Git,
        })
    }

    /// Computes the version from git alone, `None` outside of a work tree.
    pub fn live_version(&self) -> RelverResult<Option<Version>> {
        if let Err(e) = self.git.is_inside_work_tree() {
            if e.is_git_unavailable() {
                debug!(error = %e, "not a git work tree");
                return Ok(None);
            }
            return Err(e);
        }

        let Some(output) = self.git.describe()? else {
            let commits = self.git.commit_count()?;
            debug!(commits, "no release has been tagged");
            return Ok(Some(Version::untagged(commits)));
        };

        let version = Description::parse(&output)?.version();
        debug!(%output, %version, "described HEAD");
        Ok(Some(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_failed_display() {
        let err = RelverError::GitFailed {
            cmd: vec!["foo".to_string()],
            code: Some(42),
            detail: "DETAIL".to_string(),
        };
        assert_eq!("'foo' failed with exit status 42:\nDETAIL", err.to_string());
        assert_eq!(Some(42), err.exit_code());
    }

    #[test]
    fn test_git_failed_by_signal() {
        let err = RelverError::GitFailed {
            cmd: vec!["git".to_string(), "describe".to_string()],
            code: None,
            detail: String::new(),
        };
        assert_eq!(
            "'git describe' failed with exit status signal:\n",
            err.to_string()
        );
        assert_eq!(None, err.exit_code());
    }

    #[test]
    fn test_parse_errors_display() {
        let err = RelverError::UnparsableDescription("a\nb".to_string());
        assert_eq!(
            r#"can not parse the output of git describe ("a\nb")"#,
            err.to_string()
        );
        let err = RelverError::InvalidRelease {
            release: "v1.0".to_string(),
            description: "v1.0-dirty".to_string(),
        };
        assert_eq!(r#"invalid release version ("v1.0")"#, err.to_string());
        assert!(!err.is_git_unavailable());
    }

    #[test]
    fn test_uses_cache_outside_work_tree() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = Resolver::builder()
            .git(Git::builder().program("/no/such/file").build())
            .cache(VersionCache::new(dir.path().join(VERSION_CACHE)))
            .build();
        assert!(matches!(resolver.resolve(), Err(RelverError::Unresolved)));

        resolver.cache().store("42").unwrap();
        let resolved = resolver.resolve().unwrap();
        assert_eq!(
            Resolved {
                version: "42".to_string(),
                source: Source::Cache,
            },
            resolved
        );
    }
}
