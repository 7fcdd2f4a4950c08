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

//! Dump a site into a new archive.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::export::{code_exclude, export_code, export_database, export_tree};
use crate::monitor::Monitor;
use crate::*;

/// Options for [dump].
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    pub components: Components,

    /// The archive to write. If this is an existing directory, or not given,
    /// the archive gets a name made from the site and the time.
    pub destination: Option<PathBuf>,

    /// Directory for archives when `destination` is not given.
    pub backup_dir: PathBuf,

    /// Replace an existing archive.
    pub overwrite: bool,

    pub description: String,
    pub tags: String,

    /// Extra patterns to exclude from the code component.
    pub code_excludes: Vec<String>,
    /// Files of extra patterns to exclude from the code component.
    pub code_exclude_files: Vec<PathBuf>,
    /// Patterns to exclude from the files component.
    pub files_excludes: Vec<String>,

    /// Database to dump, instead of the one in the site settings.
    pub database: Option<DatabaseSpec>,
    /// Extra arguments for the database dump tool.
    pub extra_dump_args: Vec<String>,

    /// Override the generator recorded in the manifest.
    pub generator: Option<String>,
    pub generator_version: Option<String>,
}

/// Dump the selected components of a site into an archive, returning the
/// path of the archive.
///
/// All inputs are checked before anything is exported, and nothing is left
/// behind if the dump fails.
pub fn dump(
    site: &Site,
    options: &DumpOptions,
    drivers: &DriverRegistry,
    monitor: Arc<dyn Monitor>,
) -> Result<PathBuf> {
    let components = options.components;
    components.require_some()?;
    let archive_path = archive_path(site, options);
    if archive_path.exists() && !options.overwrite {
        return Err(Error::ArchiveExists { path: archive_path });
    }

    let code_root = site.root();
    if components.code && !code_root.is_dir() {
        return Err(Error::SourceNotFound {
            path: code_root.to_owned(),
        });
    }
    let files_dir = site.files_path()?;
    if components.files && !files_dir.is_dir() {
        return Err(Error::SourceNotFound { path: files_dir });
    }
    let database = if components.database {
        let spec = match &options.database {
            Some(spec) => spec.clone(),
            None => site.database()?.ok_or(Error::NoDatabaseSpec)?,
        };
        let driver = drivers.resolve(&spec)?;
        Some((driver, spec))
    } else {
        None
    };
    let code_exclude = if components.code {
        Some(code_exclude(
            code_root,
            Some(&files_dir),
            archive_path.parent(),
            &options.code_excludes,
            &options.code_exclude_files,
        )?)
    } else {
        None
    };
    let files_exclude = Exclude::from_strings(&options.files_excludes)?;

    let staging = StagingDir::temporary()?;
    if let Some(exclude) = code_exclude {
        export_code(
            code_root,
            &staging.component_source(Component::Code),
            exclude,
            monitor.clone(),
        )?;
    }
    if components.files {
        export_tree(
            &files_dir,
            &staging.component_source(Component::Files),
            files_exclude,
            monitor.clone(),
        )?;
    }
    if let Some((driver, spec)) = &database {
        export_database(
            driver.as_ref(),
            spec,
            staging.path(),
            &options.extra_dump_args,
        )?;
    }

    let mut manifest = Manifest::new(components);
    manifest.description.clone_from(&options.description);
    manifest.tags.clone_from(&options.tags);
    if let Some(generator) = &options.generator {
        manifest.generator.clone_from(generator);
    }
    if let Some(version) = &options.generator_version {
        manifest.generatorversion.clone_from(version);
    }
    manifest.write(staging.path())?;

    let archive = pack(staging.path(), &archive_path, options.overwrite)?;
    info!("Dumped {} to {archive:?}", component_names(components));
    Ok(archive)
}

fn component_names(components: Components) -> String {
    components
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where the archive will be written.
fn archive_path(site: &Site, options: &DumpOptions) -> PathBuf {
    match &options.destination {
        Some(dest) if dest.is_dir() => dest.join(default_archive_name(site, now())),
        Some(dest) => dest.clone(),
        None => options
            .backup_dir
            .join(default_archive_name(site, now())),
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// A name like `example-20261019-142501.tar.gz`.
pub fn default_archive_name(site: &Site, when: OffsetDateTime) -> String {
    let site_name = fs::canonicalize(site.root())
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .unwrap_or_else(|| "site".to_owned());
    let stamp = when
        .format(format_description!(
            "[year][month][day]-[hour][minute][second]"
        ))
        .unwrap_or_else(|err| {
            debug!("Failed to format time: {err}");
            when.unix_timestamp().to_string()
        });
    format!("{site_name}-{stamp}.tar.gz")
}
