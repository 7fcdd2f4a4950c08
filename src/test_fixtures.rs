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

//! Utilities to set up test environments.
//!
//! Fixtures that create directories will be automatically deleted when the object
//! is deleted.

use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::confirm::Confirm;
use crate::driver::{require_database_name, DatabaseDriver};
use crate::*;

/// A temporary tree for running a test.
///
/// Created in a temporary directory and automatically disposed when done.
pub struct TreeFixture {
    pub root: PathBuf,
    _tempdir: TempDir, // held only for cleanup
}

impl TreeFixture {
    pub fn new() -> TreeFixture {
        let tempdir = TempDir::new().unwrap();
        let root = tempdir.path().to_path_buf();
        TreeFixture {
            _tempdir: tempdir,
            root,
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Make a file in the tree, with arbitrary contents. Returns the full path.
    pub fn create_file(&self, relative_path: &str) -> PathBuf {
        self.create_file_with_contents(relative_path, b"contents")
    }

    /// Make a file in the tree, with given contents. Returns the full path.
    pub fn create_file_with_contents(&self, relative_path: &str, contents: &[u8]) -> PathBuf {
        let full_path = self.root.join(relative_path);
        let mut f = fs::File::create(&full_path).unwrap();
        f.write_all(contents).unwrap();
        full_path
    }

    pub fn create_dir(&self, relative_path: &str) {
        fs::create_dir(self.root.join(relative_path)).unwrap();
    }

    #[cfg(unix)]
    pub fn create_symlink(&self, relative_path: &str, target: &str) {
        use std::os::unix::fs as unix_fs;

        unix_fs::symlink(target, self.root.join(relative_path)).unwrap();
    }

    /// Symlinks are just not present on Windows.
    #[cfg(windows)]
    pub fn create_symlink(&self, _relative_path: &str, _target: &str) {}
}

impl Default for TreeFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A small bootstrapped site, with its database kept outside the site tree.
///
/// ```text
/// config/settings.yml        files_path: files, includes the local file
/// config/settings.local.yml  database connection, using [FakeDriver]
/// files/a.txt                "X"
/// index.php
/// ```
pub struct SiteFixture {
    pub tree: TreeFixture,
    db_dir: TempDir,
}

impl SiteFixture {
    pub fn new() -> SiteFixture {
        let tree = TreeFixture::new();
        let db_dir = TempDir::new().unwrap();
        tree.create_dir("config");
        tree.create_file_with_contents(
            "config/settings.yml",
            b"files_path: files\ninclude:\n  - settings.local.yml\n",
        );
        let fixture = SiteFixture { tree, db_dir };
        fixture.tree.create_file_with_contents(
            "config/settings.local.yml",
            format!(
                "database:\n  driver: fake\n  database: {}\n",
                fixture.database_path().display()
            )
            .as_bytes(),
        );
        fixture.tree.create_dir("files");
        fixture.tree.create_file_with_contents("files/a.txt", b"X");
        fixture
            .tree
            .create_file_with_contents("index.php", b"<?php echo 'hello';\n");
        fs::write(fixture.database_path(), b"CREATE TABLE t (v);\nINSERT INTO t VALUES (1);\n")
            .unwrap();
        fixture
    }

    pub fn path(&self) -> &Path {
        self.tree.path()
    }

    pub fn site(&self) -> Site {
        Site::new(self.path())
    }

    /// The file standing in for this site's database.
    pub fn database_path(&self) -> PathBuf {
        self.db_dir.path().join("site.db")
    }

    pub fn database_spec(&self) -> DatabaseSpec {
        FakeDriver::spec(&self.database_path())
    }
}

impl Default for SiteFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A database driver that keeps each "database" as a file holding its SQL,
/// so tests can exercise database handling without external tools.
///
/// Dumping copies the file out; importing copies the dump in.
#[derive(Debug, Default)]
pub struct FakeDriver;

impl FakeDriver {
    pub const NAME: &'static str = "fake";

    pub fn spec(path: &Path) -> DatabaseSpec {
        DatabaseSpec {
            driver: FakeDriver::NAME.to_owned(),
            database: path.to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    /// The built in drivers plus this one.
    pub fn registry() -> DriverRegistry {
        let mut registry = DriverRegistry::with_builtin();
        registry.register(Arc::new(FakeDriver), &[]);
        registry
    }
}

impl DatabaseDriver for FakeDriver {
    fn name(&self) -> &'static str {
        FakeDriver::NAME
    }

    fn validate(&self, spec: &DatabaseSpec) -> Result<()> {
        require_database_name(self.name(), spec)
    }

    fn dump(&self, spec: &DatabaseSpec, out: &Path, _extra_args: &[String]) -> Result<()> {
        let db = Path::new(&spec.database);
        if !db.is_file() {
            return Err(Error::SourceNotFound { path: db.into() });
        }
        fs::copy(db, out).map_err(|source| Error::WriteFile {
            path: out.to_owned(),
            source,
        })?;
        Ok(())
    }

    fn database_exists(&self, spec: &DatabaseSpec) -> Result<bool> {
        Ok(Path::new(&spec.database).exists())
    }

    fn recreate(&self, spec: &DatabaseSpec) -> Result<()> {
        fs::write(&spec.database, b"").map_err(|source| Error::WriteFile {
            path: spec.database.clone().into(),
            source,
        })
    }

    fn import(&self, spec: &DatabaseSpec, sql: &Path) -> Result<()> {
        fs::copy(sql, &spec.database).map_err(|source| Error::WriteFile {
            path: spec.database.clone().into(),
            source,
        })?;
        Ok(())
    }
}

/// Answers confirmations from a script, and remembers the questions.
///
/// Once the script runs out, every answer is no.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: Mutex<VecDeque<bool>>,
    questions: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn new<I: IntoIterator<Item = bool>>(answers: I) -> ScriptedConfirm {
        ScriptedConfirm {
            answers: Mutex::new(answers.into_iter().collect()),
            questions: Mutex::default(),
        }
    }

    /// The questions asked so far.
    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, question: &str) -> Result<bool> {
        self.questions.lock().unwrap().push(question.to_owned());
        Ok(self.answers.lock().unwrap().pop_front().unwrap_or(false))
    }
}
