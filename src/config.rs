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

//! User configuration, read from an optional YAML file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mirror::MirrorKind;
use crate::*;

pub const CONFIG_FILENAME: &str = "config.yml";

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where new archives are written when no destination is given.
    pub backup_dir: Option<PathBuf>,
    pub mirror: MirrorKind,
    /// Extra patterns excluded from the code component.
    pub code_excludes: Vec<String>,
    /// Patterns excluded from the files component.
    pub files_excludes: Vec<String>,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "siteback")
}

impl Config {
    /// The config file in the user's configuration directory, if there is one.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    /// Load configuration.
    ///
    /// An explicitly named file must exist. The default file is optional, and
    /// if it's absent the defaults are used.
    pub fn load(explicit_path: Option<&Path>) -> Result<Config> {
        let (path, required) = match explicit_path {
            Some(path) => (path.to_owned(), true),
            None => match Config::default_path() {
                Some(path) => (path, false),
                None => return Ok(Config::default()),
            },
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound && !required => {
                debug!(?path, "No config file");
                return Ok(Config::default());
            }
            Err(source) => return Err(Error::ReadFile { path, source }),
        };
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        let config = serde_yaml::from_str(&text).map_err(|source| Error::ParseYaml {
            path: path.clone(),
            source,
        })?;
        debug!(?path, ?config, "Loaded config");
        Ok(config)
    }

    /// Directory for archives when the user doesn't give a destination.
    pub fn backup_dir(&self) -> PathBuf {
        if let Some(dir) = &self.backup_dir {
            return dir.clone();
        }
        match project_dirs() {
            Some(dirs) => dirs.data_dir().join("backups"),
            None => PathBuf::from("backups"),
        }
    }
}
