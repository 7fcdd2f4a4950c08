// siteback: site backup and restore.
// Copyright 2026 Martin Pool.

// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

//! Run external tools (rsync, database clients) and capture what they say.

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

use tracing::{debug, trace};

use crate::*;

/// A command to run, with its redirections.
///
/// Environment variables are passed to the child but never logged, so they
/// are the place for passwords.
#[derive(Debug)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    stdin_path: Option<PathBuf>,
    stdout_path: Option<PathBuf>,
}

/// What happened when a command ran.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    /// Captured stdout, empty if it was redirected to a file.
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

impl Cmd {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Cmd {
        Cmd {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
            envs: Vec::new(),
            stdin_path: None,
            stdout_path: None,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Cmd {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Cmd
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    pub fn env<K: AsRef<OsStr>, V: AsRef<OsStr>>(mut self, key: K, value: V) -> Cmd {
        self.envs
            .push((key.as_ref().to_owned(), value.as_ref().to_owned()));
        self
    }

    /// Feed the contents of this file to the child's stdin.
    pub fn stdin_file<P: Into<PathBuf>>(mut self, path: P) -> Cmd {
        self.stdin_path = Some(path.into());
        self
    }

    /// Write the child's stdout into this file, rather than capturing it.
    pub fn stdout_file<P: Into<PathBuf>>(mut self, path: P) -> Cmd {
        self.stdout_path = Some(path.into());
        self
    }

    pub fn program_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// The command line as it would be typed, for logs.
    pub fn command_line(&self) -> String {
        let mut s = self.program.to_string_lossy().into_owned();
        for a in &self.args {
            s.push(' ');
            s.push_str(&a.to_string_lossy());
        }
        s
    }

    /// Run to completion, returning the exit status and captured output
    /// whether or not it succeeded.
    pub fn run(&self) -> Result<ProcessOutput> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (k, v) in &self.envs {
            command.env(k, v);
        }
        match &self.stdin_path {
            Some(path) => {
                let f = File::open(path).map_err(|source| Error::ReadFile {
                    path: path.clone(),
                    source,
                })?;
                command.stdin(Stdio::from(f));
            }
            None => {
                command.stdin(Stdio::null());
            }
        }
        match &self.stdout_path {
            Some(path) => {
                let f = File::create(path).map_err(|source| Error::WriteFile {
                    path: path.clone(),
                    source,
                })?;
                command.stdout(Stdio::from(f));
            }
            None => {
                command.stdout(Stdio::piped());
            }
        }
        command.stderr(Stdio::piped());
        debug!(command = %self.command_line(), "Run");
        let start = Instant::now();
        let output = command.output().map_err(|source| Error::ToolNotFound {
            program: self.program_name(),
            source,
        })?;
        let output = ProcessOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            program = %self.program_name(),
            status = %output.status,
            elapsed = ?start.elapsed(),
            "Finished"
        );
        if !output.stderr.is_empty() {
            trace!(stderr = %output.stderr, "Child stderr");
        }
        Ok(output)
    }

    /// Run to completion, failing with the captured stderr if the command
    /// exits unsuccessfully.
    pub fn run_checked(&self) -> Result<ProcessOutput> {
        let output = self.run()?;
        if output.success() {
            Ok(output)
        } else {
            Err(Error::ExternalTool {
                program: self.program_name(),
                status: output.status.to_string(),
                stderr: output.stderr.trim_end().to_owned(),
            })
        }
    }
}

/// True if this program can be started and exits successfully with these arguments.
pub fn tool_available(program: &str, version_args: &[&str]) -> bool {
    Cmd::new(program)
        .args(version_args)
        .run()
        .map(|o| o.success())
        .unwrap_or(false)
}
