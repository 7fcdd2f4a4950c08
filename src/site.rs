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

//! The layout of a site on disk.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::*;

/// Directory under the site root holding settings files.
pub const SETTINGS_DIR: &str = "config";

pub const SETTINGS_FILENAME: &str = "settings.yml";

/// Site-local override, which holds credentials and is never archived.
pub const LOCAL_SETTINGS_FILENAME: &str = "settings.local.yml";

/// User-data directory, when the settings don't name one.
pub const DEFAULT_FILES_DIR: &str = "files";

/// A site rooted at some directory, which may not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    root: PathBuf,
}

impl Site {
    pub fn new<P: Into<PathBuf>>(root: P) -> Site {
        Site { root: root.into() }
    }

    /// Find the site containing `start`: the nearest ancestor directory,
    /// including `start` itself, that holds a main settings file.
    pub fn find_containing(start: &Path) -> Option<Site> {
        start
            .ancestors()
            .find(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILENAME).is_file())
            .map(Site::new)
    }

    /// The active site: an explicitly given root, or else the site containing
    /// the current directory, if any.
    pub fn active(explicit_root: Option<&Path>) -> Result<Option<Site>> {
        if let Some(root) = explicit_root {
            return Ok(Some(Site::new(root)));
        }
        let cwd = std::env::current_dir()?;
        let site = Site::find_containing(&cwd);
        debug!(?cwd, ?site, "Looked for active site");
        Ok(site)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_DIR).join(SETTINGS_FILENAME)
    }

    pub fn local_settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_DIR).join(LOCAL_SETTINGS_FILENAME)
    }

    /// The effective settings, or `None` if there is no main settings file.
    pub fn settings(&self) -> Result<Option<Settings>> {
        Settings::load(&self.settings_path())
    }

    /// True if the main settings file exists and parses.
    pub fn is_bootstrapped(&self) -> bool {
        matches!(self.settings(), Ok(Some(_)))
    }

    /// The user-data directory named by the settings, or the default.
    pub fn files_path(&self) -> Result<PathBuf> {
        let configured = self
            .settings()?
            .and_then(|s| s.files_path().map(PathBuf::from));
        Ok(self
            .root
            .join(configured.unwrap_or_else(|| PathBuf::from(DEFAULT_FILES_DIR))))
    }

    /// The database named by the effective settings, if any.
    pub fn database(&self) -> Result<Option<DatabaseSpec>> {
        match self.settings()? {
            Some(settings) => settings.database(),
            None => Ok(None),
        }
    }
}
