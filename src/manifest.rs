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

//! The manifest describing what an archive contains.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::*;

/// Name of the manifest file at the root of an archive.
pub const MANIFEST_FILENAME: &str = "MANIFEST.yml";

/// Format version written into new manifests.
pub const FORMAT_VERSION: &str = "1.0";

/// Major format version this reader understands.
const SUPPORTED_MAJOR_VERSION: u32 = 1;

/// Description of an archive: written once when the archive is made, and read
/// back to decide what to restore.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// When the archive was made, in seconds since the Unix epoch.
    pub datestamp: i64,
    pub formatversion: String,
    pub components: Components,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: String,
    pub generator: String,
    pub generatorversion: String,
}

impl Manifest {
    /// A manifest for an archive being made now by this program.
    pub fn new(components: Components) -> Manifest {
        Manifest {
            datestamp: OffsetDateTime::now_utc().unix_timestamp(),
            formatversion: FORMAT_VERSION.to_owned(),
            components,
            description: String::new(),
            tags: String::new(),
            generator: env!("CARGO_PKG_NAME").to_owned(),
            generatorversion: crate::VERSION.to_owned(),
        }
    }

    /// Write the manifest into the root of a staging directory.
    pub fn write(&self, staging_root: &Path) -> Result<()> {
        let path = staging_root.join(MANIFEST_FILENAME);
        let yaml = serde_yaml::to_string(self).map_err(|source| Error::SerializeYaml {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, yaml).map_err(|source| Error::WriteFile {
            path: path.clone(),
            source,
        })?;
        debug!(?path, "Wrote manifest");
        Ok(())
    }

    /// Read and check the manifest from the root of a staging directory.
    pub fn read(staging_root: &Path) -> Result<Manifest> {
        let path = staging_root.join(MANIFEST_FILENAME);
        let yaml = match fs::read_to_string(&path) {
            Ok(yaml) => yaml,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::ManifestNotFound {
                    path: staging_root.to_owned(),
                })
            }
            Err(source) => return Err(Error::ReadFile { path, source }),
        };
        let manifest: Manifest =
            serde_yaml::from_str(&yaml).map_err(|source| Error::ParseYaml {
                path: path.clone(),
                source,
            })?;
        check_format_version(&manifest.formatversion)?;
        Ok(manifest)
    }
}

/// Accept any minor version of the supported major version.
fn check_format_version(version: &str) -> Result<()> {
    let major = version
        .split('.')
        .next()
        .and_then(|m| m.trim().parse::<u32>().ok());
    if major == Some(SUPPORTED_MAJOR_VERSION) {
        Ok(())
    } else {
        Err(Error::UnsupportedFormatVersion {
            version: version.to_owned(),
        })
    }
}
