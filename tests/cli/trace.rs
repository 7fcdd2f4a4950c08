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

//! Tests for trace and log output.

use std::fs::read_to_string;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::Deserializer;

use super::*;

#[test]
fn debug_shows_trace_on_stderr() {
    let temp = TempDir::new().unwrap();
    let site = code_site();
    run_siteback()
        .args(["-D", "dump", "--code", "--site-root"])
        .arg(site.path())
        .arg("--destination")
        .arg(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Tracing enabled"));
}

#[test]
fn default_stderr_has_no_trace() {
    let temp = TempDir::new().unwrap();
    let site = code_site();
    run_siteback()
        .args(["dump", "--code", "--site-root"])
        .arg(site.path())
        .arg("--destination")
        .arg(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Tracing enabled").not());
}

#[test]
fn counters_are_shown_by_default() {
    let temp = TempDir::new().unwrap();
    let site = code_site();
    run_siteback()
        .args(["dump", "--code", "--site-root"])
        .arg(site.path())
        .arg("--destination")
        .arg(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Files: "));
}

#[test]
fn log_json_file() {
    let temp = TempDir::new().unwrap();
    let site = code_site();
    let log = temp.child("log.json");
    run_siteback()
        .arg("--log-json")
        .arg(log.path())
        .args(["dump", "--code", "--site-root"])
        .arg(site.path())
        .arg("--destination")
        .arg(temp.child("out.tar.gz").path())
        .assert()
        .success();

    let text = read_to_string(log.path()).unwrap();
    let records: Vec<serde_json::Value> = Deserializer::from_str(&text)
        .into_iter::<serde_json::Value>()
        .map(Result::unwrap)
        .collect();
    assert!(!records.is_empty());
    assert!(
        records
            .iter()
            .any(|r| r["fields"]["message"] == "Tracing enabled"),
        "{text}"
    );
}
