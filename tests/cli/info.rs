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

//! Tests for the `info` command.

use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::Value;

use siteback::unpack;

use super::*;

#[test]
fn info_as_yaml() {
    let site = code_site();
    let out = TempDir::new().unwrap();
    let archive = dump_code_site(site.path(), out.path());
    run_siteback()
        .arg("info")
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("formatversion: '1.0'"))
        .stdout(predicate::str::contains(
            "components:\n  code: true\n  files: true\n  database: false\n",
        ))
        .stdout(predicate::str::contains("generator: siteback"));
}

#[test]
fn info_as_json() {
    let site = code_site();
    let out = TempDir::new().unwrap();
    let archive = dump_code_site(site.path(), out.path());
    let output = run_siteback()
        .args(["info", "--json"])
        .arg(&archive)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["formatversion"], "1.0");
    assert_eq!(json["components"]["code"], true);
    assert_eq!(json["components"]["database"], false);
    assert!(json["datestamp"].as_i64().unwrap() > 0);
}

#[test]
fn info_of_unpacked_directory() {
    let site = code_site();
    let out = TempDir::new().unwrap();
    let archive = dump_code_site(site.path(), out.path());
    let staging = unpack(&archive).unwrap();
    run_siteback()
        .arg("info")
        .arg(staging.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("code: true"));
}

#[test]
fn info_of_garbage_file() {
    let out = TempDir::new().unwrap();
    let bogus = out.path().join("bogus.tar.gz");
    std::fs::write(&bogus, b"this is not an archive").unwrap();
    run_siteback()
        .arg("info")
        .arg(&bogus)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("archive"));
}
