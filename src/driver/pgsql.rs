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

//! PostgreSQL, through `pg_dump` and `psql`.

use std::path::Path;

use super::{require_database_name, require_simple_identifier, DatabaseDriver};
use crate::process::Cmd;
use crate::*;

/// Database to connect to when the target database itself may not exist.
const MAINTENANCE_DB: &str = "postgres";

#[derive(Debug)]
pub struct PgSql;

impl PgSql {
    /// A client command with connection options; the password goes in the
    /// environment.
    fn client(&self, program: &str, spec: &DatabaseSpec) -> Cmd {
        let mut cmd = Cmd::new(program)
            .arg("--host")
            .arg(spec.host_or_default());
        if let Some(port) = spec.port {
            cmd = cmd.arg("--port").arg(port.to_string());
        }
        if let Some(user) = &spec.username {
            cmd = cmd.arg("--username").arg(user);
        }
        if let Some(password) = &spec.password {
            cmd = cmd.env("PGPASSWORD", password);
        }
        cmd.arg("--no-password")
    }

    fn maintenance_sql(&self, spec: &DatabaseSpec, sql: &str) -> Result<String> {
        let output = self
            .client("psql", spec)
            .args(["--dbname", MAINTENANCE_DB])
            .args(["--no-align", "--tuples-only", "--quiet", "--command"])
            .arg(sql)
            .run_checked()?;
        Ok(output.stdout_str())
    }
}

impl DatabaseDriver for PgSql {
    fn name(&self) -> &'static str {
        "pgsql"
    }

    fn validate(&self, spec: &DatabaseSpec) -> Result<()> {
        require_database_name(self.name(), spec)?;
        require_simple_identifier(self.name(), &spec.database)
    }

    fn dump(&self, spec: &DatabaseSpec, out: &Path, extra_args: &[String]) -> Result<()> {
        self.client("pg_dump", spec)
            .args(["--no-owner", "--no-privileges", "--clean", "--if-exists"])
            .arg("--file")
            .arg(out)
            .args(extra_args)
            .arg(&spec.database)
            .run_checked()?;
        Ok(())
    }

    fn database_exists(&self, spec: &DatabaseSpec) -> Result<bool> {
        let out = self.maintenance_sql(
            spec,
            &format!(
                "SELECT 1 FROM pg_database WHERE datname = '{}'",
                spec.database
            ),
        )?;
        Ok(out.trim() == "1")
    }

    fn recreate(&self, spec: &DatabaseSpec) -> Result<()> {
        self.maintenance_sql(
            spec,
            &format!("DROP DATABASE IF EXISTS \"{}\"", spec.database),
        )?;
        self.maintenance_sql(spec, &format!("CREATE DATABASE \"{}\"", spec.database))?;
        Ok(())
    }

    fn import(&self, spec: &DatabaseSpec, sql: &Path) -> Result<()> {
        self.client("psql", spec)
            .args(["--quiet", "--set", "ON_ERROR_STOP=1", "--dbname"])
            .arg(&spec.database)
            .arg("--file")
            .arg(sql)
            .run_checked()?;
        Ok(())
    }
}
