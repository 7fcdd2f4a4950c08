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

//! Restore a site from an archive, or from separate component sources.
//!
//! Everything that can be checked is checked, and every confirmation is
//! obtained, before the destination is changed. There is no rollback: if a
//! step fails after that, the destination is left partly restored.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::confirm::{self, Confirm};
use crate::driver::DatabaseDriver;
use crate::mirror::Mirror;
use crate::misc::dir_has_entries;
use crate::monitor::Monitor;
use crate::*;

/// Description of what to restore, and where.
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    /// An archive file, or a directory holding an unpacked archive.
    pub archive: Option<PathBuf>,

    /// The site root to restore into.
    pub destination: Option<PathBuf>,

    /// Components to restore. If empty, everything in the archive plus
    /// everything with an explicit source.
    pub components: Components,

    /// Explicit sources, used instead of the archive.
    pub code_source: Option<PathBuf>,
    pub files_source: Option<PathBuf>,
    /// A SQL dump file.
    pub db_source: Option<PathBuf>,

    /// Where to put user files, instead of the site's configured directory.
    pub files_destination: Option<PathBuf>,

    /// Database to restore into. When given, it's also written into the
    /// destination's local settings.
    pub database: Option<DatabaseSpec>,

    /// Allow replacing the contents of a non-empty destination.
    pub overwrite: bool,
}

/// The collaborators a restore needs, which callers and tests can replace.
pub struct RestoreEnv<'a> {
    pub drivers: &'a DriverRegistry,
    pub confirm: &'a dyn Confirm,
    pub mirror: &'a dyn Mirror,
    pub monitor: Arc<dyn Monitor>,
    /// The site containing the current directory, if any.
    pub active_site: Option<Site>,
}

/// What a restore did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreSummary {
    pub destination: PathBuf,
    pub components: Components,
    pub files_destination: Option<PathBuf>,
    /// The database that was replaced.
    pub database: Option<String>,
    /// True if the database connection was written into local settings.
    pub wired_settings: bool,
}

/// Where each selected component comes from.
#[derive(Debug, Default)]
struct Sources {
    code: Option<PathBuf>,
    files: Option<PathBuf>,
    database: Option<PathBuf>,
}

struct DatabasePlan {
    driver: Arc<dyn DatabaseDriver>,
    spec: DatabaseSpec,
    sql: PathBuf,
    explicit: bool,
}

pub fn restore(options: &RestoreOptions, env: &RestoreEnv) -> Result<RestoreSummary> {
    // 1. Sources.
    let staging = match &options.archive {
        Some(archive) if archive.is_dir() => Some(StagingDir::existing(archive)?),
        Some(archive) if archive.is_file() => {
            info!("Unpack {archive:?}");
            Some(pack::unpack(archive)?)
        }
        Some(archive) => {
            return Err(Error::SourceNotFound {
                path: archive.clone(),
            })
        }
        None => None,
    };
    let manifest = staging.as_ref().map(StagingDir::read_manifest).transpose()?;
    if let Some(manifest) = &manifest {
        debug!(?manifest, "Read manifest");
    }
    let explicit_sources: Components = [
        (Component::Code, options.code_source.is_some()),
        (Component::Files, options.files_source.is_some()),
        (Component::Database, options.db_source.is_some()),
    ]
    .into_iter()
    .filter_map(|(c, given)| given.then_some(c))
    .collect();
    let components = if options.components.is_empty() {
        let in_archive = manifest.as_ref().map(|m| m.components).unwrap_or_default();
        in_archive
            .iter()
            .chain(explicit_sources.iter())
            .collect::<Components>()
    } else {
        options.components
    };
    components.require_some()?;
    let sources = resolve_sources(options, components, staging.as_ref(), manifest.as_ref())?;

    // 2. Destination.
    let destination = resolve_destination(options, env)?;
    info!("Restore {} into {destination:?}", component_list(components));

    // 3. Guard the destination.
    if components.code && dir_has_entries(&destination)? {
        if !options.overwrite {
            return Err(Error::DestinationNotEmpty { path: destination });
        }
        confirm::require(
            env.confirm,
            &format!("Replace the contents of {}?", destination.display()),
        )?;
    }

    let database = match &sources.database {
        Some(sql) => Some(plan_database(options, env, &destination, &sources, sql)?),
        None => None,
    };

    // From here on the destination is changed.
    let result = apply(options, env, &destination, &sources, database.as_ref());
    if result.is_err() {
        warn!("Restore failed part way: {destination:?} may be partially restored");
    }
    let (files_destination, wired_settings) = result?;
    Ok(RestoreSummary {
        destination,
        components,
        files_destination,
        database: database.map(|plan| plan.spec.database),
        wired_settings,
    })
}

fn resolve_sources(
    options: &RestoreOptions,
    components: Components,
    staging: Option<&StagingDir>,
    manifest: Option<&Manifest>,
) -> Result<Sources> {
    let source_for = |component: Component, explicit: &Option<PathBuf>| -> Result<Option<PathBuf>> {
        if !components.contains(component) {
            return Ok(None);
        }
        if let Some(path) = explicit {
            return Ok(Some(path.clone()));
        }
        match (staging, manifest, &options.archive) {
            (Some(staging), Some(manifest), Some(archive)) => {
                if manifest.components.contains(component) {
                    Ok(Some(staging.component_source(component)))
                } else {
                    Err(Error::ComponentNotInArchive {
                        archive: archive.clone(),
                        component,
                    })
                }
            }
            _ => Err(Error::NoComponentSource { component }),
        }
    };
    let sources = Sources {
        code: source_for(Component::Code, &options.code_source)?,
        files: source_for(Component::Files, &options.files_source)?,
        database: source_for(Component::Database, &options.db_source)?,
    };
    for dir in sources.code.iter().chain(&sources.files) {
        if !dir.is_dir() {
            return Err(Error::SourceNotFound { path: dir.clone() });
        }
    }
    if let Some(sql) = &sources.database {
        if !sql.is_file() {
            return Err(Error::SqlFileNotFound { path: sql.clone() });
        }
    }
    Ok(sources)
}

fn resolve_destination(options: &RestoreOptions, env: &RestoreEnv) -> Result<PathBuf> {
    if let Some(dest) = &options.destination {
        return Ok(dest.clone());
    }
    if let Some(site) = &env.active_site {
        return Ok(site.root().to_owned());
    }
    let name = options
        .archive
        .as_deref()
        .or(options.code_source.as_deref())
        .and_then(archive_stem)
        .unwrap_or_else(|| "site".to_owned());
    Ok(std::env::current_dir()?.join(name))
}

/// The archive's file name without its archive extensions.
pub fn archive_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = [".tar.gz", ".tgz", ".tar"]
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name);
    (!stem.is_empty()).then(|| stem.to_owned())
}

/// Choose the database, and get permission to replace it, before anything
/// is changed.
fn plan_database(
    options: &RestoreOptions,
    env: &RestoreEnv,
    destination: &Path,
    sources: &Sources,
    sql: &Path,
) -> Result<DatabasePlan> {
    let (spec, explicit) = match &options.database {
        Some(spec) => (spec.clone(), true),
        None => {
            let from_code_source = || match &sources.code {
                Some(code) => Site::new(code).database(),
                None => Ok(None),
            };
            let spec = match Site::new(destination).database()? {
                Some(spec) => spec,
                None => from_code_source()?.ok_or(Error::NoDatabaseSpec)?,
            };
            (spec, false)
        }
    };
    let driver = env.drivers.resolve(&spec)?;
    if driver.database_exists(&spec)? {
        confirm::require(
            env.confirm,
            &format!(
                "Drop and recreate the existing {} database {:?}?",
                driver.name(),
                spec.database
            ),
        )?;
    }
    Ok(DatabasePlan {
        driver,
        spec,
        sql: sql.to_owned(),
        explicit,
    })
}

/// Paths under the destination that the code mirror must leave alone.
fn code_protection(destination: &Path, code_source: &Path) -> Result<Exclude> {
    let mut builder = ExcludeBuilder::new();
    builder.add_anywhere(site::LOCAL_SETTINGS_FILENAME)?;
    builder.add(site::DEFAULT_FILES_DIR)?;
    // The files directory as the site is configured now, and as it will be
    // configured once the new code is in place.
    for site in [Site::new(destination), Site::new(code_source)] {
        if let Ok(files_path) = site.files_path() {
            if let Some(apath) = files_path
                .strip_prefix(site.root())
                .ok()
                .and_then(|rel| Apath::relative_to(&destination.join(rel), destination))
            {
                builder.add_apath(&apath)?;
            }
        }
    }
    builder.build()
}

fn apply(
    options: &RestoreOptions,
    env: &RestoreEnv,
    destination: &Path,
    sources: &Sources,
    database: Option<&DatabasePlan>,
) -> Result<(Option<PathBuf>, bool)> {
    if let Some(code) = &sources.code {
        info!("Import code from {code:?}");
        let protect = code_protection(destination, code)?;
        env.mirror
            .mirror(code, destination, &protect, env.monitor.clone())?;
    }

    let mut files_destination = None;
    if let Some(files) = &sources.files {
        let dest_site = Site::new(destination);
        let target = match &options.files_destination {
            Some(path) => path.clone(),
            None if dest_site.is_bootstrapped() => dest_site.files_path()?,
            None => destination.join(site::DEFAULT_FILES_DIR),
        };
        info!("Import files from {files:?} to {target:?}");
        env.mirror
            .mirror(files, &target, &Exclude::nothing(), env.monitor.clone())?;
        files_destination = Some(target);
    }

    let mut wired = false;
    if let Some(plan) = database {
        info!(
            driver = plan.driver.name(),
            "Import database {:?} from {:?}", plan.spec.database, plan.sql
        );
        plan.driver.recreate(&plan.spec)?;
        plan.driver.import(&plan.spec, &plan.sql)?;
        if plan.explicit {
            settings::wire_database_settings(&Site::new(destination), &plan.spec)?;
            wired = true;
        }
    }
    Ok((files_destination, wired))
}

fn component_list(components: Components) -> String {
    components
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
