#![allow(dead_code)]

use std::{
    fs::OpenOptions,
    io::Write as _,
    path::{Path, PathBuf},
    process::Command,
};

use relver::{Git, Resolver, VersionCache};
use tempfile::TempDir;

/// A scratch git repository with a single tracked file.
pub struct Repo {
    dir: TempDir,
}

impl Repo {
    /// An empty directory, not yet a repository.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// A freshly initialized repository without commits.
    pub fn init() -> Self {
        let repo = Self::new();
        repo.git(&["init", "--quiet"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory git must not search past, so an enclosing repository stays invisible.
    pub fn ceiling(&self) -> &Path {
        self.path().parent().unwrap()
    }

    /// Resolver for this directory that cannot see repositories above it.
    pub fn resolver(&self) -> Resolver {
        Resolver::builder()
            .git(
                Git::builder()
                    .cwd(self.path())
                    .ceiling(self.ceiling())
                    .build(),
            )
            .cache(VersionCache::new(self.cache_file()))
            .build()
    }

    pub fn cache_file(&self) -> PathBuf {
        self.path().join("RELEASE-VERSION")
    }

    pub fn git(&self, args: &[&str]) {
        let output = Command::new("git")
            .args([
                "-c",
                "user.name=relver",
                "-c",
                "user.email=relver@example.com",
                "-c",
                "commit.gpgSign=false",
                "-c",
                "tag.gpgSign=false",
                "-c",
                "tag.forceSignAnnotated=false",
            ])
            .args(args)
            .current_dir(self.path())
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed with status {:?}:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Appends a line to the tracked file.
    pub fn touch(&self) {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path().join("f"))
            .unwrap();
        f.write_all(b"\n").unwrap();
    }

    pub fn commit(&self) {
        self.touch();
        self.git(&["add", "f"]);
        self.git(&["commit", "--quiet", "-m", "test", "f"]);
    }

    /// Annotated tag on HEAD.
    pub fn tag(&self, tag: &str) {
        self.git(&["tag", "-a", "-m", "test", tag]);
    }

    pub fn commit_and_tag(&self, tag: &str) {
        self.commit();
        self.tag(tag);
    }
}
