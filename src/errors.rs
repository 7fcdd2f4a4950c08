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

//! Siteback error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::Component;

/// Siteback specific error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("No components selected: choose at least one of code, files, or database")]
    NoComponents,

    #[error("Source directory not found: {path:?}")]
    SourceNotFound { path: PathBuf },

    #[error("SQL dump file not found: {path:?}")]
    SqlFileNotFound { path: PathBuf },

    #[error("Archive already exists: {path:?} (use --overwrite to replace it)")]
    ArchiveExists { path: PathBuf },

    #[error("Destination directory not empty: {path:?} (use --overwrite to replace its contents)")]
    DestinationNotEmpty { path: PathBuf },

    #[error("Archive {archive:?} does not contain the {component} component")]
    ComponentNotInArchive {
        archive: PathBuf,
        component: Component,
    },

    #[error("No source for the {component} component: give an archive or an explicit source path")]
    NoComponentSource { component: Component },

    #[error("Not a siteback archive (no manifest): {path:?}")]
    ManifestNotFound { path: PathBuf },

    #[error("Unsupported archive format version: {version:?}")]
    UnsupportedFormatVersion { version: String },

    #[error("Failed to parse YAML in {path:?}")]
    ParseYaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize YAML for {path:?}")]
    SerializeYaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize JSON")]
    SerializeJson {
        #[from]
        source: serde_json::Error,
    },

    #[error("Refusing to archive live database credentials found in {path:?}: move them to settings.local.yml or exclude the file")]
    LiveCredentials { path: PathBuf },

    #[error("No database connection given and none is configured for the site: use --db-url or the --db-* options")]
    NoDatabaseSpec,

    #[error("Unknown database driver {driver:?}")]
    UnknownDriver { driver: String },

    #[error("Invalid database URL {url:?}: {message}")]
    InvalidDatabaseUrl { url: String, message: String },

    #[error("Invalid database connection for driver {driver}: {message}")]
    InvalidDatabaseSpec { driver: String, message: String },

    #[error("{program} failed with {status}: {stderr}\nRe-run with --debug for more detail")]
    ExternalTool {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to run {program}: is it installed?")]
    ToolNotFound { program: String, source: io::Error },

    #[error("Invalid exclude pattern")]
    ParseGlob {
        #[from]
        source: globset::Error,
    },

    #[error("Failed to read exclusion patterns from {path:?}")]
    ReadExcludes { path: PathBuf, source: io::Error },

    #[error("Failed to copy {path:?}")]
    CopyEntry { path: PathBuf, source: io::Error },

    #[error("Failed to write archive {path:?}")]
    WriteArchive { path: PathBuf, source: io::Error },

    #[error("Failed to read archive {path:?}")]
    ReadArchive { path: PathBuf, source: io::Error },

    #[error("Failed to read {path:?}")]
    ReadFile { path: PathBuf, source: io::Error },

    #[error("Failed to write {path:?}")]
    WriteFile { path: PathBuf, source: io::Error },

    #[error("Failed to remove {path:?}")]
    RemoveEntry { path: PathBuf, source: io::Error },

    #[error("Failed to create temporary directory")]
    CreateTemp { source: io::Error },

    #[error("Cancelled at the user's request")]
    UserAbort,

    #[error(transparent)]
    IOError {
        #[from]
        source: io::Error,
    },
}

impl Error {
    /// True if the user declined a confirmation, rather than something breaking.
    pub fn is_user_abort(&self) -> bool {
        matches!(self, Error::UserAbort)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
