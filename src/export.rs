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

//! Export site components into a staging directory.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use filetime::{set_file_mtime, FileTime};
use tracing::{debug, info, warn};

use crate::live_tree::{Kind, LiveEntry};
use crate::monitor::{Counter, Monitor};
use crate::*;

/// Directories that hold installed dependencies rather than site code.
pub const DEPENDENCY_DIRS_ROOTED: &[&str] = &["vendor"];
pub const DEPENDENCY_DIRS_ANYWHERE: &[&str] = &["node_modules"];

/// Copy every entry of `source` kept by `exclude` into `dest`.
///
/// Directories, regular files and symlinks are copied; file and directory
/// mtimes are preserved. Other kinds of file are skipped with a warning.
pub fn export_tree(
    source: &Path,
    dest: &Path,
    exclude: Exclude,
    monitor: Arc<dyn Monitor>,
) -> Result<()> {
    copy_entries(source, dest, exclude, monitor, false)
}

/// Export a code tree, refusing to include settings files that hold a live
/// database connection.
///
/// The credentials check runs as each `settings.yml` is reached, and covers
/// the files it includes that are also being exported, so a failure stops
/// the export before anything is archived.
pub fn export_code(
    source: &Path,
    dest: &Path,
    exclude: Exclude,
    monitor: Arc<dyn Monitor>,
) -> Result<()> {
    copy_entries(source, dest, exclude, monitor, true)
}

fn copy_entries(
    source: &Path,
    dest: &Path,
    exclude: Exclude,
    monitor: Arc<dyn Monitor>,
    check_credentials: bool,
) -> Result<()> {
    let tree = LiveTree::open(source)?;
    info!("Export {source:?} to {dest:?}");
    let kept_exclude = exclude.clone();
    // Directory mtimes are set after their contents are written.
    let mut dir_times: Vec<(PathBuf, FileTime)> = Vec::new();
    for entry in tree.iter_entries(exclude, monitor.clone())? {
        let entry = entry?;
        let dest_path = entry.apath.below(dest);
        match entry.kind {
            Kind::Dir => {
                fs::create_dir_all(&dest_path).map_err(|source| Error::CopyEntry {
                    path: dest_path.clone(),
                    source,
                })?;
                dir_times.push((dest_path, entry.mtime));
                monitor.count(Counter::Dirs, 1);
            }
            Kind::File => {
                let source_path = entry.apath.below(source);
                if check_credentials
                    && source_path.file_name() == Some(OsStr::new(site::SETTINGS_FILENAME))
                {
                    settings::check_no_live_credentials(&source_path)?;
                    check_included_settings(source, &source_path, &kept_exclude)?;
                }
                copy_file(&source_path, &dest_path, &entry)?;
                monitor.count(Counter::Files, 1);
                monitor.count(Counter::FileBytes, entry.size.unwrap_or_default() as usize);
            }
            Kind::Symlink => {
                copy_symlink(&entry, &dest_path)?;
                monitor.count(Counter::Symlinks, 1);
            }
            Kind::Unknown => {
                warn!("Skipping special file {}", entry.apath);
                monitor.count(Counter::Unknown, 1);
            }
        }
    }
    for (path, mtime) in dir_times.into_iter().rev() {
        if let Err(err) = set_file_mtime(&path, mtime) {
            debug!("Failed to set mtime on {path:?}: {err}");
        }
    }
    Ok(())
}

/// Check the settings files included by `settings_path` that will be
/// exported along with it.
fn check_included_settings(source: &Path, settings_path: &Path, exclude: &Exclude) -> Result<()> {
    for include_path in settings::included_paths(settings_path) {
        if !include_path.is_file() {
            continue;
        }
        let Some(apath) = apath_inside(&include_path, source) else {
            debug!(?include_path, "Included settings file is outside the tree");
            continue;
        };
        if excluded_or_below_excluded(&apath, exclude) {
            continue;
        }
        settings::check_no_live_credentials(&include_path)?;
    }
    Ok(())
}

/// True if the apath or any directory above it is excluded.
fn excluded_or_below_excluded(apath: &Apath, exclude: &Exclude) -> bool {
    let path: &str = apath;
    path.match_indices('/')
        .skip(1)
        .map(|(i, _)| &path[..i])
        .chain([path])
        .any(|prefix| exclude.matches(prefix))
}

pub(crate) fn copy_file(source_path: &Path, dest_path: &Path, entry: &LiveEntry) -> Result<()> {
    let copy_err = |source| Error::CopyEntry {
        path: source_path.to_owned(),
        source,
    };
    fs::copy(source_path, dest_path).map_err(copy_err)?;
    set_file_mtime(dest_path, entry.mtime).map_err(copy_err)?;
    Ok(())
}

#[cfg(unix)]
pub(crate) fn copy_symlink(entry: &LiveEntry, dest_path: &Path) -> Result<()> {
    let copy_err = |source| Error::CopyEntry {
        path: dest_path.to_owned(),
        source,
    };
    let Some(target) = &entry.symlink_target else {
        warn!("Symlink {} has no target", entry.apath);
        return Ok(());
    };
    std::os::unix::fs::symlink(target, dest_path).map_err(copy_err)?;
    filetime::set_symlink_file_times(dest_path, entry.mtime, entry.mtime).map_err(copy_err)?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn copy_symlink(entry: &LiveEntry, _dest_path: &Path) -> Result<()> {
    warn!("Can't copy symlink {} on this platform", entry.apath);
    Ok(())
}

/// Dump a database into the staging root, returning the path of the dump.
pub fn export_database(
    driver: &dyn DatabaseDriver,
    spec: &DatabaseSpec,
    staging_root: &Path,
    extra_args: &[String],
) -> Result<PathBuf> {
    let dir = Component::Database.staging_dir(staging_root);
    fs::create_dir_all(&dir).map_err(|source| Error::WriteFile {
        path: dir.clone(),
        source,
    })?;
    let out = Component::Database.staging_source(staging_root);
    info!(driver = driver.name(), database = %spec.database, "Dump database");
    driver.dump(spec, &out, extra_args)?;
    let size = fs::metadata(&out)
        .map_err(|source| Error::ReadFile {
            path: out.clone(),
            source,
        })?
        .len();
    debug!(?out, size, "Database dump complete");
    Ok(out)
}

/// Patterns always excluded from a code export, plus those given by the user.
///
/// `files_dir` and `archive_dir` are excluded when they lie inside `code_root`.
pub fn code_exclude(
    code_root: &Path,
    files_dir: Option<&Path>,
    archive_dir: Option<&Path>,
    patterns: &[String],
    pattern_files: &[PathBuf],
) -> Result<Exclude> {
    let mut builder = ExcludeBuilder::new();
    for name in excludes::VCS_DIRS.iter().chain(DEPENDENCY_DIRS_ANYWHERE) {
        builder.add_anywhere(name)?;
    }
    for name in DEPENDENCY_DIRS_ROOTED {
        builder.add(name)?;
    }
    builder.add_anywhere(site::LOCAL_SETTINGS_FILENAME)?;
    for dir in files_dir.into_iter().chain(archive_dir) {
        if let Some(apath) = apath_inside(dir, code_root) {
            debug!("Exclude {apath} from code");
            builder.add_apath(&apath)?;
        }
    }
    for pattern in patterns {
        builder.add(pattern)?;
    }
    for path in pattern_files {
        builder.add_file(path)?;
    }
    builder.build()
}

/// The apath of `path` within `root`, comparing canonical paths where
/// they exist.
fn apath_inside(path: &Path, root: &Path) -> Option<Apath> {
    let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_owned());
    let path = canonical_or_absolute(path);
    Apath::relative_to(&path, &root).filter(|apath| !apath.is_root())
}

/// Canonicalize the nearest existing ancestor, and rejoin the rest.
fn canonical_or_absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            canonical_or_absolute(parent).join(name)
        }
        _ => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_owned()),
    }
}
