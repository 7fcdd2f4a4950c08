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

//! Exclusion rules: build an [Exclude] from glob patterns, matched against [Apath]s.
//!
//! Patterns are anchored at both ends of the apath: `sites/*/private` matches
//! exactly `/sites/anything/private`, and nothing above or below it.
//! A leading `/` is optional. `*` does not match `/`; `**/` matches any number
//! of directories, so `**/.git` matches `.git` at any depth.
//!
//! Tree walks do not descend into excluded directories, so excluding a
//! directory excludes everything inside it.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::*;

/// Version control metadata directories, excluded from code at any depth.
pub const VCS_DIRS: &[&str] = &[".git", ".svn", ".hg", ".bzr"];

/// Compiled exclusion rules.
#[derive(Clone, Debug)]
pub struct Exclude {
    globset: GlobSet,
    patterns: Vec<String>,
}

impl Exclude {
    /// Exclude nothing.
    pub fn nothing() -> Exclude {
        Exclude {
            globset: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }

    /// Create an [Exclude] from a list of glob strings.
    pub fn from_strings<I: IntoIterator<Item = S>, S: AsRef<str>>(excludes: I) -> Result<Exclude> {
        let mut builder = ExcludeBuilder::new();
        for s in excludes {
            builder.add(s.as_ref())?;
        }
        builder.build()
    }

    /// True if this apath is excluded.
    pub fn matches<A: AsRef<str>>(&self, apath: A) -> bool {
        self.globset.is_match(apath.as_ref())
    }

    /// The normalized (rooted) patterns that were compiled.
    ///
    /// These have the same meaning as `rsync --exclude` patterns anchored at the
    /// transfer root.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for Exclude {
    fn default() -> Self {
        Exclude::nothing()
    }
}

/// Accumulates patterns and compiles them once into an [Exclude].
pub struct ExcludeBuilder {
    gsb: GlobSetBuilder,
    patterns: Vec<String>,
}

impl ExcludeBuilder {
    pub fn new() -> ExcludeBuilder {
        ExcludeBuilder {
            gsb: GlobSetBuilder::new(),
            patterns: Vec::new(),
        }
    }

    pub fn build(&self) -> Result<Exclude> {
        Ok(Exclude {
            globset: self.gsb.build()?,
            patterns: self.patterns.clone(),
        })
    }

    /// Add one pattern, anchored at the root of the tree.
    pub fn add(&mut self, pat: &str) -> Result<&mut ExcludeBuilder> {
        let pat = pat.trim();
        if pat.is_empty() {
            return Ok(self);
        }
        let pat = format!("/{}", pat.trim_start_matches('/'));
        let pat = pat.trim_end_matches('/');
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .backslash_escape(true)
            .build()?;
        self.gsb.add(glob);
        self.patterns.push(pat.to_owned());
        Ok(self)
    }

    /// Add a pattern matching a name at any depth.
    pub fn add_anywhere(&mut self, name: &str) -> Result<&mut ExcludeBuilder> {
        self.add(&format!("**/{}", name.trim_start_matches('/')))
    }

    /// Exclude exactly this apath, escaping any glob metacharacters in it.
    pub fn add_apath(&mut self, apath: &Apath) -> Result<&mut ExcludeBuilder> {
        if apath.is_root() {
            return Ok(self);
        }
        let escaped: String = apath
            .chars()
            .flat_map(|c| match c {
                '*' | '?' | '[' | ']' | '{' | '}' | '\\' => vec!['\\', c],
                c => vec![c],
            })
            .collect();
        self.add(&escaped)
    }

    pub fn add_file(&mut self, path: &Path) -> Result<&mut ExcludeBuilder> {
        let mut f = File::open(path).map_err(|source| Error::ReadExcludes {
            path: path.to_owned(),
            source,
        })?;
        self.add_from_read(&mut f).map_err(|err| match err {
            Error::IOError { source } => Error::ReadExcludes {
                path: path.to_owned(),
                source,
            },
            err => err,
        })
    }

    /// Add patterns from lines in a file, with one pattern per line.
    ///
    /// Lines starting with `#` are comments, and leading and trailing whitespace is removed.
    pub fn add_from_read(&mut self, f: &mut dyn Read) -> Result<&mut ExcludeBuilder> {
        let mut b = String::new();
        f.read_to_string(&mut b)?;
        for pat in b
            .lines()
            .map(str::trim)
            .filter(|s| !s.starts_with('#') && !s.is_empty())
        {
            self.add(pat)?;
        }
        Ok(self)
    }
}

impl Default for ExcludeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
