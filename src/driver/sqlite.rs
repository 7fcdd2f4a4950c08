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

//! SQLite, through the `sqlite3` shell. The "database name" is the path of
//! the database file.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use super::{require_database_name, DatabaseDriver};
use crate::process::Cmd;
use crate::*;

#[derive(Debug)]
pub struct Sqlite;

impl DatabaseDriver for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn validate(&self, spec: &DatabaseSpec) -> Result<()> {
        require_database_name(self.name(), spec)
    }

    fn dump(&self, spec: &DatabaseSpec, out: &Path, extra_args: &[String]) -> Result<()> {
        if !Path::new(&spec.database).is_file() {
            return Err(Error::SourceNotFound {
                path: spec.database.clone().into(),
            });
        }
        Cmd::new("sqlite3")
            .args(extra_args)
            .arg(&spec.database)
            .arg(".dump")
            .stdout_file(out)
            .run_checked()?;
        Ok(())
    }

    fn database_exists(&self, spec: &DatabaseSpec) -> Result<bool> {
        Ok(Path::new(&spec.database).exists())
    }

    fn recreate(&self, spec: &DatabaseSpec) -> Result<()> {
        let path = Path::new(&spec.database);
        match fs::remove_file(path) {
            Ok(()) => debug!("Removed old database {path:?}"),
            Err(err) if err.kind() == ErrorKind::NotFound => (),
            Err(source) => {
                return Err(Error::RemoveEntry {
                    path: path.to_owned(),
                    source,
                })
            }
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::WriteFile {
                path: parent.to_owned(),
                source,
            })?;
        }
        // An empty file is a valid empty database.
        fs::write(path, b"").map_err(|source| Error::WriteFile {
            path: path.to_owned(),
            source,
        })
    }

    fn import(&self, spec: &DatabaseSpec, sql: &Path) -> Result<()> {
        Cmd::new("sqlite3")
            .arg("-bail")
            .arg(&spec.database)
            .stdin_file(sql)
            .run_checked()?;
        Ok(())
    }
}
