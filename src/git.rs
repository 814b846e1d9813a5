//! Thin wrapper around the `git` command line client.

use std::{
    ffi::OsStr,
    io::ErrorKind,
    path::PathBuf,
    process::{Command, Stdio},
};

use bon::Builder;
use tracing::{debug, debug_span};

use crate::{RelverError, RelverResult};

/// Exit status git uses for fatal errors such as "no names found" or "bad revision".
const EXIT_FATAL: i32 = 128;

/// Runs git subcommands in a fixed directory.
#[derive(Builder, Clone, Debug)]
pub struct Git {
    /// Path or name of the git executable
    #[builder(into, default = PathBuf::from("git"))]
    program: PathBuf,
    /// Directory to run git in, defaults to the current directory
    #[builder(into)]
    cwd: Option<PathBuf>,
    /// Git stops looking for a repository before reaching this directory
    #[builder(into)]
    ceiling: Option<PathBuf>,
}

impl Default for Git {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Git {
    /// Runs git with the given arguments and returns the lines it printed to stdout.
    pub fn run<I, S>(&self, args: I) -> RelverResult<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect();
        let cmd: Vec<String> = std::iter::once(self.program.as_os_str())
            .chain(args.iter().map(|a| a.as_os_str()))
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let _span = debug_span!("git", cmd = %cmd.join(" ")).entered();

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        if let Some(ceiling) = &self.ceiling {
            command.env("GIT_CEILING_DIRECTORIES", ceiling);
        }

        let output = match command.output() {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("git executable not found");
                return Err(RelverError::GitNotFound {
                    program: self.program.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let detail = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
            debug!(code = ?output.status.code(), "git failed");
            return Err(RelverError::GitFailed {
                cmd,
                code: output.status.code(),
                detail,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<String> = stdout.lines().map(str::to_string).collect();
        debug!(lines = lines.len(), "git succeeded");
        Ok(lines)
    }

    /// Succeeds if the directory is part of a git work tree.
    pub fn is_inside_work_tree(&self) -> RelverResult<()> {
        self.run(["rev-parse", "--is-inside-work-tree"])?;
        Ok(())
    }

    /// Describes HEAD relative to the most recent annotated tag.
    ///
    /// Returns `None` when no annotated tag is reachable from HEAD.
    pub fn describe(&self) -> RelverResult<Option<String>> {
        match self.run(["describe", "--dirty"]) {
            Ok(lines) => Ok(Some(lines.join("\n").trim().to_string())),
            Err(e) if e.exit_code() == Some(EXIT_FATAL) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Counts the commits reachable from HEAD, zero for a repository without commits.
    pub fn commit_count(&self) -> RelverResult<usize> {
        match self.run(["rev-list", "HEAD"]) {
            Ok(lines) => Ok(lines.len()),
            Err(e) if e.exit_code() == Some(EXIT_FATAL) => Ok(0),
            Err(e) => Err(e),
        }
    }
}
