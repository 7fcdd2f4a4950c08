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

//! Staging directories: where components are gathered before packing, or
//! unpacked before restoring.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::*;

/// A staging root, which is either a temporary directory owned by this
/// object and deleted when it is dropped, or an existing directory given by
/// the user that is left alone.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    _tempdir: Option<TempDir>, // held only for cleanup
}

impl StagingDir {
    /// Create a new empty temporary staging directory.
    pub fn temporary() -> Result<StagingDir> {
        let tempdir = tempfile::Builder::new()
            .prefix("siteback-")
            .tempdir()
            .map_err(|source| Error::CreateTemp { source })?;
        let path = tempdir.path().to_owned();
        debug!(?path, "Created staging directory");
        Ok(StagingDir {
            path,
            _tempdir: Some(tempdir),
        })
    }

    /// Use an existing, already unpacked, directory as a staging root.
    pub fn existing(path: &Path) -> Result<StagingDir> {
        if !path.is_dir() {
            return Err(Error::SourceNotFound {
                path: path.to_owned(),
            });
        }
        Ok(StagingDir {
            path: path.to_owned(),
            _tempdir: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if this directory will be deleted when dropped.
    pub fn is_temporary(&self) -> bool {
        self._tempdir.is_some()
    }

    /// Where the data for a component lives in this staging root.
    pub fn component_source(&self, component: Component) -> PathBuf {
        component.staging_source(&self.path)
    }

    pub fn read_manifest(&self) -> Result<Manifest> {
        Manifest::read(&self.path)
    }
}
