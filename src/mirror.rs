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

//! Mirror one directory onto another, deleting destination-only entries.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::{debug, info, trace};

use crate::export::{copy_file, copy_symlink};
use crate::live_tree::{Kind, LiveEntry};
use crate::monitor::{Counter, Monitor};
use crate::process::{tool_available, Cmd};
use crate::*;

/// Make `dest` an exact copy of `source`.
///
/// Paths in `dest` matched by `protect` are neither deleted nor overwritten.
pub trait Mirror: Debug {
    fn mirror(
        &self,
        source: &Path,
        dest: &Path,
        protect: &Exclude,
        monitor: Arc<dyn Monitor>,
    ) -> Result<()>;
}

/// Which mirror implementation to use.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MirrorKind {
    /// rsync if it can be run, otherwise native.
    #[default]
    Auto,
    Rsync,
    Native,
}

impl MirrorKind {
    pub fn open(self) -> Box<dyn Mirror> {
        match self {
            MirrorKind::Rsync => Box::new(RsyncMirror),
            MirrorKind::Native => Box::new(NativeMirror),
            MirrorKind::Auto => {
                if tool_available("rsync", &["--version"]) {
                    Box::new(RsyncMirror)
                } else {
                    debug!("rsync is not available; using native mirror");
                    Box::new(NativeMirror)
                }
            }
        }
    }
}

/// Mirror by running `rsync -a --delete`.
#[derive(Debug)]
pub struct RsyncMirror;

impl Mirror for RsyncMirror {
    fn mirror(
        &self,
        source: &Path,
        dest: &Path,
        protect: &Exclude,
        _monitor: Arc<dyn Monitor>,
    ) -> Result<()> {
        LiveTree::open(source)?;
        create_dest(dest)?;
        // Trailing slashes so rsync copies the contents, not the directory.
        let mut source_arg = source.as_os_str().to_owned();
        source_arg.push("/");
        let mut dest_arg = dest.as_os_str().to_owned();
        dest_arg.push("/");
        let mut cmd = Cmd::new("rsync").arg("-a").arg("--delete");
        for pattern in protect.patterns() {
            cmd = cmd.arg(format!("--exclude={pattern}"));
        }
        info!("Mirror {source:?} to {dest:?} with rsync");
        cmd.arg(source_arg).arg(dest_arg).run_checked()?;
        Ok(())
    }
}

/// Mirror in-process: copy entries that differ, then remove entries that
/// are only in the destination.
#[derive(Debug)]
pub struct NativeMirror;

impl Mirror for NativeMirror {
    fn mirror(
        &self,
        source: &Path,
        dest: &Path,
        protect: &Exclude,
        monitor: Arc<dyn Monitor>,
    ) -> Result<()> {
        let tree = LiveTree::open(source)?;
        create_dest(dest)?;
        info!("Mirror {source:?} to {dest:?}");
        let mut wanted: BTreeSet<Apath> = BTreeSet::new();
        // Protected paths in the source are skipped too, the same as rsync --exclude.
        for entry in tree.iter_entries(protect.clone(), monitor.clone())? {
            let entry = entry?;
            update_entry(source, dest, &entry, monitor.as_ref())?;
            wanted.insert(entry.apath);
        }
        delete_unwanted(dest, &wanted, protect, monitor.as_ref())
    }
}

fn create_dest(dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).map_err(|source| Error::WriteFile {
        path: dest.to_owned(),
        source,
    })
}

/// Make the destination entry match the source, if it doesn't already.
fn update_entry(source: &Path, dest: &Path, entry: &LiveEntry, monitor: &dyn Monitor) -> Result<()> {
    let dest_path = entry.apath.below(dest);
    let existing = match fs::symlink_metadata(&dest_path) {
        Ok(metadata) => Some(metadata),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(source) => {
            return Err(Error::ReadFile {
                path: dest_path,
                source,
            })
        }
    };
    let existing_kind = existing.as_ref().map(|m| Kind::from(m.file_type()));
    match entry.kind {
        Kind::Dir => {
            if existing_kind == Some(Kind::Dir) {
                return Ok(());
            }
            if existing.is_some() {
                remove_entry(&dest_path, monitor)?;
            }
            fs::create_dir(&dest_path).map_err(|source| Error::CopyEntry {
                path: dest_path.clone(),
                source,
            })?;
            monitor.count(Counter::Dirs, 1);
        }
        Kind::File => {
            if let Some(metadata) = &existing {
                if existing_kind == Some(Kind::File)
                    && Some(metadata.len()) == entry.size
                    && filetime::FileTime::from_last_modification_time(metadata) == entry.mtime
                {
                    trace!("Unchanged {}", entry.apath);
                    monitor.count(Counter::Unchanged, 1);
                    return Ok(());
                }
                if existing_kind != Some(Kind::File) {
                    remove_entry(&dest_path, monitor)?;
                }
            }
            copy_file(&entry.apath.below(source), &dest_path, entry)?;
            monitor.count(Counter::Files, 1);
            monitor.count(Counter::FileBytes, entry.size.unwrap_or_default() as usize);
        }
        Kind::Symlink => {
            if existing_kind == Some(Kind::Symlink)
                && fs::read_link(&dest_path).ok() == entry.symlink_target
            {
                monitor.count(Counter::Unchanged, 1);
                return Ok(());
            }
            if existing.is_some() {
                remove_entry(&dest_path, monitor)?;
            }
            copy_symlink(entry, &dest_path)?;
            monitor.count(Counter::Symlinks, 1);
        }
        Kind::Unknown => monitor.count(Counter::Unknown, 1),
    }
    Ok(())
}

/// Remove entries in `dest` that are neither wanted nor protected.
///
/// Directories that still hold protected entries are kept.
fn delete_unwanted(
    dest: &Path,
    wanted: &BTreeSet<Apath>,
    protect: &Exclude,
    monitor: &dyn Monitor,
) -> Result<()> {
    let mut doomed = Vec::new();
    // Walking with the protections as excludes means protected entries, and
    // everything inside them, are never visited.
    for entry in LiveTree::open(dest)?.iter_entries(protect.clone(), Arc::new(NoCounts))? {
        let entry = entry?;
        if !wanted.contains(&entry.apath) {
            doomed.push(entry);
        }
    }
    // Children are always listed after their parents, so in reverse each
    // directory is already emptied of everything unprotected.
    for entry in doomed.into_iter().rev() {
        let path = entry.apath.below(dest);
        if entry.kind == Kind::Dir {
            match fs::remove_dir(&path) {
                Ok(()) => monitor.count(Counter::Deleted, 1),
                Err(err) if dir_has_protected_content(&path) => {
                    debug!("Keep {} holding protected entries: {err}", entry.apath);
                }
                Err(source) => return Err(Error::RemoveEntry { path, source }),
            }
        } else {
            debug!("Delete {}", entry.apath);
            remove_entry(&path, monitor)?;
        }
    }
    Ok(())
}

fn dir_has_protected_content(path: &Path) -> bool {
    matches!(misc::dir_has_entries(path), Ok(true))
}

fn remove_entry(path: &Path, monitor: &dyn Monitor) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|source| Error::RemoveEntry {
        path: path.to_owned(),
        source,
    })?;
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|source| Error::RemoveEntry {
        path: path.to_owned(),
        source,
    })?;
    monitor.count(Counter::Deleted, 1);
    Ok(())
}

/// Discards counts from the walk used only to find deletions.
struct NoCounts;

impl Monitor for NoCounts {
    fn count(&self, _counter: Counter, _increment: usize) {}
}
