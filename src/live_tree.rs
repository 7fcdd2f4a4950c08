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

//! Walk a "live" on-disk tree, as a source for exports and mirrors.

use std::collections::vec_deque::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use filetime::FileTime;
use tracing::{info, warn};

use crate::monitor::{Counter, Monitor};
use crate::*;

/// Kind of file that can be stored in a tree.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Kind {
    File,
    Dir,
    Symlink,
    /// Sockets, devices, and other special files.
    Unknown,
}

impl From<fs::FileType> for Kind {
    fn from(ft: fs::FileType) -> Kind {
        if ft.is_file() {
            Kind::File
        } else if ft.is_dir() {
            Kind::Dir
        } else if ft.is_symlink() {
            Kind::Symlink
        } else {
            Kind::Unknown
        }
    }
}

/// A real tree on the filesystem.
#[derive(Clone, Debug)]
pub struct LiveTree {
    path: PathBuf,
}

impl LiveTree {
    /// Open the live tree rooted at `path`, which must be an existing directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<LiveTree> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::SourceNotFound {
                path: path.to_owned(),
            });
        }
        Ok(LiveTree {
            path: path.to_path_buf(),
        })
    }

    /// Return the root path for this tree.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterate all entries not excluded, starting with the root.
    pub fn iter_entries(&self, exclude: Exclude, monitor: Arc<dyn Monitor>) -> Result<Iter> {
        Iter::new(&self.path, exclude, monitor)
    }
}

/// An entry describing a file/dir/symlink in a live tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LiveEntry {
    pub apath: Apath,
    pub kind: Kind,
    pub mtime: FileTime,
    pub size: Option<u64>,
    pub symlink_target: Option<PathBuf>,
}

impl LiveEntry {
    fn from_fs_metadata(
        apath: Apath,
        metadata: &fs::Metadata,
        symlink_target: Option<PathBuf>,
    ) -> LiveEntry {
        let size = if metadata.is_file() {
            Some(metadata.len())
        } else {
            None
        };
        LiveEntry {
            apath,
            kind: metadata.file_type().into(),
            mtime: FileTime::from_last_modification_time(metadata),
            size,
            symlink_target,
        }
    }
}

/// Recursive iterator of the contents of a live tree.
///
/// Visit the files in a directory before descending into its children.
/// Within those files and child directories, visit them according to a
/// sorted comparison by their UTF-8 name.
///
/// Excluded entries are not returned, and excluded directories are not
/// descended into. Each exclusion is logged and counted.
pub struct Iter {
    /// Root of the source tree.
    root_path: PathBuf,

    /// Directories yet to be visited.
    dir_deque: VecDeque<Apath>,

    /// All entries that have been seen but not yet returned by the iterator, in the order they
    /// should be returned.
    entry_deque: VecDeque<LiveEntry>,

    /// Patterns to exclude from iteration.
    exclude: Exclude,

    monitor: Arc<dyn Monitor>,
}

impl Iter {
    fn new(root_path: &Path, exclude: Exclude, monitor: Arc<dyn Monitor>) -> Result<Iter> {
        let start_metadata =
            fs::symlink_metadata(root_path).map_err(|source| Error::ReadFile {
                path: root_path.to_owned(),
                source,
            })?;
        let entry_deque: VecDeque<LiveEntry> =
            [LiveEntry::from_fs_metadata(Apath::root(), &start_metadata, None)].into();
        let dir_deque: VecDeque<Apath> = [Apath::root()].into();
        Ok(Iter {
            root_path: root_path.to_path_buf(),
            entry_deque,
            dir_deque,
            exclude,
            monitor,
        })
    }

    /// Visit the next directory, queueing its children.
    fn visit_next_directory(&mut self, parent_apath: &Apath) -> Result<()> {
        let dir_path = parent_apath.below(&self.root_path);
        let read_err = |source| Error::ReadFile {
            path: dir_path.clone(),
            source,
        };
        // Tuples of (name, entry) so that we can sort children by name.
        let mut children = Vec::<(String, LiveEntry)>::new();
        let mut subdir_apaths: Vec<Apath> = Vec::new();
        for dir_entry in fs::read_dir(&dir_path).map_err(read_err)? {
            let dir_entry = dir_entry.map_err(read_err)?;
            let child_osstr = dir_entry.file_name();
            let Some(child_name) = child_osstr.to_str() else {
                warn!("Skipping non-UTF-8 filename {child_osstr:?} in {dir_path:?}");
                continue;
            };
            let child_apath = parent_apath.append(child_name);
            if self.exclude.matches(&child_apath) {
                info!("Excluded {child_apath}");
                self.monitor.count(Counter::Excluded, 1);
                continue;
            }
            let child_path = dir_entry.path();
            let metadata = fs::symlink_metadata(&child_path).map_err(|source| Error::ReadFile {
                path: child_path.clone(),
                source,
            })?;
            let ft = metadata.file_type();
            let target = if ft.is_symlink() {
                Some(
                    fs::read_link(&child_path).map_err(|source| Error::ReadFile {
                        path: child_path.clone(),
                        source,
                    })?,
                )
            } else {
                None
            };
            if ft.is_dir() {
                subdir_apaths.push(child_apath.clone());
            }
            children.push((
                child_name.to_string(),
                LiveEntry::from_fs_metadata(child_apath, &metadata, target),
            ));
        }
        // Subdirectories discovered here are visited together in name order, but
        // before any previously pending directories: so, in reverse order, push them
        // onto the front of the dir deque.
        subdir_apaths.sort_unstable();
        for a in subdir_apaths.into_iter().rev() {
            self.dir_deque.push_front(a);
        }
        children.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        self.entry_deque.extend(children.into_iter().map(|x| x.1));
        Ok(())
    }
}

impl Iterator for Iter {
    type Item = Result<LiveEntry>;

    fn next(&mut self) -> Option<Result<LiveEntry>> {
        loop {
            if let Some(entry) = self.entry_deque.pop_front() {
                return Some(Ok(entry));
            } else if let Some(dir) = self.dir_deque.pop_front() {
                if let Err(err) = self.visit_next_directory(&dir) {
                    return Some(Err(err));
                }
            } else {
                return None;
            }
        }
    }
}
