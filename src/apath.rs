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

//! "Apaths" are platform-independent paths relative to the root of a tree
//! being exported, mirrored, or packed.
//!
//! Apaths are:
//!
//!  * Case-sensitive.
//!  * Components are separated by `/`.
//!  * UTF-8, without consideration of normalization.
//!  * Start with a `/`, meaning the root of the tree; the root itself is `/`.
//!  * Do not contain `.`, `..`, or empty components.
//!
//! Exclusion patterns are matched against apaths, so a pattern anchored at the
//! start of the tree is simply one that starts with `/`.

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Apath(String);

impl Apath {
    /// The root of a tree.
    pub fn root() -> Apath {
        Apath("/".to_owned())
    }

    /// True if this apath is well-formed.
    pub fn is_valid(a: &str) -> bool {
        if !a.starts_with('/') {
            return false;
        } else if a.len() == 1 {
            return true;
        }
        for part in a[1..].split('/') {
            if part.is_empty() || part == "." || part == ".." || part.contains('\0') {
                return false;
            }
        }
        true
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Make a new apath for a child of this one.
    pub fn append(&self, child_name: &str) -> Apath {
        let mut c = self.0.clone();
        if c != "/" {
            c.push('/');
        }
        c.push_str(child_name);
        Apath(c)
    }

    /// Return the local filesystem path for this apath below a tree root.
    pub fn below<P: Into<PathBuf>>(&self, tree_root: P) -> PathBuf {
        let mut buf: PathBuf = tree_root.into();
        for part in self.0[1..].split('/').filter(|p| !p.is_empty()) {
            buf.push(part);
        }
        buf
    }

    /// Find the apath of `path` relative to `root`, if it is inside it.
    pub fn relative_to(path: &Path, root: &Path) -> Option<Apath> {
        let rel = path.strip_prefix(root).ok()?;
        let mut apath = Apath::root();
        for part in rel.components() {
            apath = apath.append(part.as_os_str().to_str()?);
        }
        Some(apath)
    }

    /// The path without its leading slash, as stored inside a tar archive.
    pub fn relative_str(&self) -> &str {
        &self.0[1..]
    }
}

impl fmt::Display for Apath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for Apath {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Apath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Apath {
    fn from(s: &str) -> Apath {
        assert!(Apath::is_valid(s), "invalid apath: {s:?}");
        Apath(s.to_owned())
    }
}
