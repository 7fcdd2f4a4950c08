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

//! Tests for the `dump` command.

use std::fs;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

use siteback::unpack;

use super::*;

#[test]
fn dump_code_and_files() {
    let site = code_site();
    let out = TempDir::new().unwrap();
    let archive = dump_code_site(site.path(), out.path());
    let staging = unpack(&archive).unwrap();
    let manifest = staging.read_manifest().unwrap();
    assert!(manifest.components.code);
    assert!(manifest.components.files);
    assert!(!manifest.components.database);
    assert!(staging.path().join("code/index.php").is_file());
    assert!(!staging.path().join("code/files").exists());
    assert_eq!(
        fs::read(staging.path().join("files/a.txt")).unwrap(),
        b"X"
    );
}

#[test]
fn dump_into_directory_uses_generated_name() {
    let site = code_site();
    let out = TempDir::new().unwrap();
    run_siteback()
        .args(["dump", "--code"])
        .arg("--destination")
        .arg(out.path())
        .current_dir(site.path())
        .assert()
        .success()
        .stdout(predicate::str::ends_with(".tar.gz\n"))
        .stdout(predicate::str::starts_with(out.path().to_string_lossy()));
}

#[test]
fn existing_archive_is_refused() {
    let site = code_site();
    let out = TempDir::new().unwrap();
    let archive = out.child("site.tar.gz");
    archive.write_str("precious").unwrap();
    run_siteback()
        .args(["dump", "--files", "--site-root"])
        .arg(site.path())
        .arg("--destination")
        .arg(archive.path())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Archive already exists"));
    archive.assert("precious");

    run_siteback()
        .args(["dump", "--files", "--overwrite", "--site-root"])
        .arg(site.path())
        .arg("--destination")
        .arg(archive.path())
        .assert()
        .success();
    assert!(unpack(archive.path()).unwrap().read_manifest().is_ok());
}

#[test]
fn live_credentials_in_code() {
    let site = code_site();
    site.create_file_with_contents(
        "config/settings.yml",
        b"database:\n  driver: mysql\n  database: prod\n",
    );
    let out = TempDir::new().unwrap();
    run_siteback()
        .args(["dump", "--code", "--site-root"])
        .arg(site.path())
        .arg("--destination")
        .arg(out.child("x.tar.gz").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("live database credentials"));
    out.child("x.tar.gz").assert(predicate::path::missing());
}

#[test]
fn exclude_code_paths() {
    let site = code_site();
    site.create_dir("cache");
    site.create_file("cache/x.html");
    site.create_file("notes.txt");
    let out = TempDir::new().unwrap();
    let archive = out.child("a.tar.gz");
    run_siteback()
        .args(["dump", "--code", "--exclude-code-paths", "cache,*.txt"])
        .arg("--site-root")
        .arg(site.path())
        .arg("--destination")
        .arg(archive.path())
        .assert()
        .success();
    let staging = unpack(archive.path()).unwrap();
    assert!(staging.path().join("code/index.php").exists());
    assert!(!staging.path().join("code/cache").exists());
    assert!(!staging.path().join("code/notes.txt").exists());
}

#[test]
fn no_site_found() {
    let empty = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    run_siteback()
        .args(["dump", "--code"])
        .arg("--destination")
        .arg(out.path())
        .current_dir(empty.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn database_needs_a_connection() {
    let site = code_site();
    let out = TempDir::new().unwrap();
    run_siteback()
        .args(["dump", "--db", "--site-root"])
        .arg(site.path())
        .arg("--destination")
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No database connection"));
}
