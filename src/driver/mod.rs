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

//! Database drivers: how to dump, recreate, and import each kind of database.
//!
//! Drivers are looked up by the `driver` field of a [DatabaseSpec] in a
//! [DriverRegistry].

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use crate::*;

pub mod mysql;
pub mod pgsql;
pub mod sqlite;

/// The operations siteback needs from one kind of database.
pub trait DatabaseDriver: Debug + Send + Sync {
    /// Canonical identifier, as written into settings.
    fn name(&self) -> &'static str;

    /// Check that the spec has the fields this driver needs.
    fn validate(&self, spec: &DatabaseSpec) -> Result<()>;

    /// Write a SQL dump of the whole database to `out`.
    fn dump(&self, spec: &DatabaseSpec, out: &Path, extra_args: &[String]) -> Result<()>;

    /// True if the database already exists.
    fn database_exists(&self, spec: &DatabaseSpec) -> Result<bool>;

    /// Drop the database if it exists, and create it empty.
    fn recreate(&self, spec: &DatabaseSpec) -> Result<()>;

    /// Execute a SQL dump file against the database.
    fn import(&self, spec: &DatabaseSpec, sql: &Path) -> Result<()>;
}

/// Maps driver identifiers and their aliases to drivers.
#[derive(Debug, Clone, Default)]
pub struct DriverRegistry {
    drivers: BTreeMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// An empty registry.
    pub fn new() -> DriverRegistry {
        DriverRegistry::default()
    }

    /// A registry of the drivers built in to siteback.
    pub fn with_builtin() -> DriverRegistry {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(mysql::MySql), &["mariadb"]);
        registry.register(Arc::new(pgsql::PgSql), &["postgres", "postgresql"]);
        registry.register(Arc::new(sqlite::Sqlite), &["sqlite3"]);
        registry
    }

    /// Add a driver under its own name and some aliases, replacing any
    /// previous driver with those names.
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>, aliases: &[&str]) {
        for alias in aliases {
            self.drivers.insert(alias.to_string(), driver.clone());
        }
        self.drivers.insert(driver.name().to_owned(), driver);
    }

    /// Find the driver for a spec and check the spec is usable with it.
    pub fn resolve(&self, spec: &DatabaseSpec) -> Result<Arc<dyn DatabaseDriver>> {
        let driver = self.get(&spec.driver)?;
        driver.validate(spec)?;
        Ok(driver)
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn DatabaseDriver>> {
        self.drivers
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| Error::UnknownDriver {
                driver: name.to_owned(),
            })
    }

    /// All registered names, including aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(String::as_str)
    }
}

/// Fail unless the spec names a database.
pub(crate) fn require_database_name(driver: &str, spec: &DatabaseSpec) -> Result<()> {
    if spec.database.trim().is_empty() {
        return Err(Error::InvalidDatabaseSpec {
            driver: driver.to_owned(),
            message: "database name is required".to_owned(),
        });
    }
    Ok(())
}

/// Fail unless the database name is a plain identifier that can be quoted
/// into SQL without escaping.
pub(crate) fn require_simple_identifier(driver: &str, name: &str) -> Result<()> {
    if name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '$')
    {
        Ok(())
    } else {
        Err(Error::InvalidDatabaseSpec {
            driver: driver.to_owned(),
            message: format!("unsupported characters in database name {name:?}"),
        })
    }
}
