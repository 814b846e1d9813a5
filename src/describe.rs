//! Parsing of `git describe --dirty` output into PEP440 versions.

use std::fmt;

use lazy_regex::*;

use crate::{RelverError, RelverResult};

static DESCRIPTION: Lazy<Regex> = lazy_regex!(
    r"(?x)
    \A \s*
    (?P<release>.*?)
    (?:
        -(?P<post>\d+)
        -g[\da-f]+        # abbreviated commit hash
    )?
    (?P<dirty>-dirty)?
    \s* \z"
);

static RELEASE: Lazy<Regex> = lazy_regex!(r"\A\d+(\.\d+)*((?:a|b|c|rc)\d+)?\z");

/// Returns true if `release` is a numeric PEP440 release, optionally with a pre-release segment.
pub fn is_valid_release(release: &str) -> bool {
    RELEASE.is_match(release)
}

/// A parsed `git describe` description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Description<'a> {
    /// The most recent annotated tag.
    pub release: &'a str,
    /// Commits on top of the tag, zero when HEAD is tagged.
    pub post: u64,
    /// Whether the working tree has uncommitted changes.
    pub dirty: bool,
}

impl<'a> Description<'a> {
    /// Parses the output of `git describe --dirty`.
    pub fn parse(output: &'a str) -> RelverResult<Self> {
        let unparsable = || RelverError::UnparsableDescription(output.to_string());
        let captures = DESCRIPTION.captures(output).ok_or_else(unparsable)?;

        let release = captures.name("release").map_or("", |m| m.as_str());
        let post = match captures.name("post") {
            Some(m) => m.as_str().parse::<u64>().ok().ok_or_else(unparsable)?,
            None => 0,
        };
        let dirty = captures.name("dirty").is_some();

        if !is_valid_release(release) {
            return Err(RelverError::InvalidRelease {
                release: release.to_string(),
                description: output.to_string(),
            });
        }

        Ok(Self {
            release,
            post,
            dirty,
        })
    }

    /// Normalizes the description into a version.
    pub fn version(&self) -> Version {
        let version = if self.dirty {
            format!("{}.post{}.dev0", self.release, self.post.saturating_add(1))
        } else if self.post > 0 {
            format!("{}.post{}", self.release, self.post)
        } else {
            self.release.to_string()
        };
        Version(version)
    }
}

/// A normalized PEP440 version string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Version(String);

impl Version {
    /// Version of a history with no annotated tags, counting commits reachable from HEAD.
    pub fn untagged(commits: usize) -> Self {
        Self(format!("0.dev{commits}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Version {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
