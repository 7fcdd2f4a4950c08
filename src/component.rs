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

//! The independently selectable parts of a site backup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::*;

/// Subdirectory of the staging root holding the database dump.
pub const DATABASE_DIR: &str = "database";

/// Name of the SQL dump inside [DATABASE_DIR].
pub const DATABASE_DUMP_NAME: &str = "database.sql";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Component {
    Code,
    Files,
    Database,
}

impl Component {
    /// The staging subdirectory for this component.
    pub fn staging_dir(self, staging_root: &Path) -> PathBuf {
        match self {
            Component::Code => staging_root.join("code"),
            Component::Files => staging_root.join("files"),
            Component::Database => staging_root.join(DATABASE_DIR),
        }
    }

    /// Where this component's data lives in a staging root: a directory for
    /// code and files, the SQL dump for the database.
    pub fn staging_source(self, staging_root: &Path) -> PathBuf {
        match self {
            Component::Database => self.staging_dir(staging_root).join(DATABASE_DUMP_NAME),
            _ => self.staging_dir(staging_root),
        }
    }
}

/// Which components are present in an archive, or selected for an operation.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub code: bool,
    #[serde(default)]
    pub files: bool,
    #[serde(default)]
    pub database: bool,
}

impl Components {
    pub const ALL: Components = Components {
        code: true,
        files: true,
        database: true,
    };

    pub const NONE: Components = Components {
        code: false,
        files: false,
        database: false,
    };

    pub fn contains(&self, component: Component) -> bool {
        match component {
            Component::Code => self.code,
            Component::Files => self.files,
            Component::Database => self.database,
        }
    }

    pub fn set(&mut self, component: Component, value: bool) {
        match component {
            Component::Code => self.code = value,
            Component::Files => self.files = value,
            Component::Database => self.database = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.code || self.files || self.database)
    }

    /// The selected components, in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Component> + '_ {
        Component::iter().filter(|c| self.contains(*c))
    }

    /// Fail unless at least one component is selected.
    pub fn require_some(&self) -> Result<()> {
        if self.is_empty() {
            Err(Error::NoComponents)
        } else {
            Ok(())
        }
    }
}

impl FromIterator<Component> for Components {
    fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
        let mut c = Components::NONE;
        for component in iter {
            c.set(component, true);
        }
        c
    }
}
