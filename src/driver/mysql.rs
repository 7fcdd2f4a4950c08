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

//! MySQL and MariaDB, through `mysqldump` and `mysql`.
//!
//! Credentials are passed in a temporary option file so that the password
//! never appears on a command line.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::{require_database_name, require_simple_identifier, DatabaseDriver};
use crate::process::Cmd;
use crate::*;

#[derive(Debug)]
pub struct MySql;

impl MySql {
    /// Write a `[client]` option file for this spec.
    fn defaults_file(&self, spec: &DatabaseSpec) -> Result<NamedTempFile> {
        let mut f = NamedTempFile::new().map_err(|source| Error::CreateTemp { source })?;
        let body = client_options(spec);
        f.write_all(body.as_bytes())
            .map_err(|source| Error::WriteFile {
                path: f.path().to_owned(),
                source,
            })?;
        Ok(f)
    }

    fn client(&self, program: &str, defaults: &NamedTempFile) -> Cmd {
        // --defaults-extra-file must come first.
        Cmd::new(program).arg(format!("--defaults-extra-file={}", defaults.path().display()))
    }
}

fn client_options(spec: &DatabaseSpec) -> String {
    let mut s = String::from("[client]\n");
    s.push_str(&format!("host={}\n", spec.host_or_default()));
    if let Some(port) = spec.port {
        s.push_str(&format!("port={port}\n"));
    }
    if let Some(user) = &spec.username {
        s.push_str(&format!("user=\"{}\"\n", escape_option(user)));
    }
    if let Some(password) = &spec.password {
        s.push_str(&format!("password=\"{}\"\n", escape_option(password)));
    }
    s
}

fn escape_option(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

impl DatabaseDriver for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn validate(&self, spec: &DatabaseSpec) -> Result<()> {
        require_database_name(self.name(), spec)?;
        require_simple_identifier(self.name(), &spec.database)
    }

    fn dump(&self, spec: &DatabaseSpec, out: &Path, extra_args: &[String]) -> Result<()> {
        let defaults = self.defaults_file(spec)?;
        self.client("mysqldump", &defaults)
            .args([
                "--single-transaction",
                "--no-tablespaces",
                "--routines",
                "--add-drop-table",
            ])
            .arg(format!("--result-file={}", out.display()))
            .args(extra_args)
            .arg(&spec.database)
            .run_checked()?;
        Ok(())
    }

    fn database_exists(&self, spec: &DatabaseSpec) -> Result<bool> {
        let defaults = self.defaults_file(spec)?;
        let output = self
            .client("mysql", &defaults)
            .args(["--batch", "--skip-column-names", "-e"])
            .arg(format!(
                "SELECT SCHEMA_NAME FROM INFORMATION_SCHEMA.SCHEMATA WHERE SCHEMA_NAME = '{}'",
                spec.database
            ))
            .run_checked()?;
        Ok(!output.stdout_str().trim().is_empty())
    }

    fn recreate(&self, spec: &DatabaseSpec) -> Result<()> {
        let defaults = self.defaults_file(spec)?;
        self.client("mysql", &defaults)
            .arg("-e")
            .arg(format!(
                "DROP DATABASE IF EXISTS `{db}`; CREATE DATABASE `{db}`",
                db = spec.database
            ))
            .run_checked()?;
        Ok(())
    }

    fn import(&self, spec: &DatabaseSpec, sql: &Path) -> Result<()> {
        let defaults = self.defaults_file(spec)?;
        self.client("mysql", &defaults)
            .arg(&spec.database)
            .stdin_file(sql)
            .run_checked()?;
        Ok(())
    }
}
