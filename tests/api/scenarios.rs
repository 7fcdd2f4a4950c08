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

//! End to end scenarios using real database tools, where they're installed.

use std::fs;

use pretty_assertions::assert_eq;

use siteback::mirror::NativeMirror;
use siteback::monitor::collect::CollectMonitor;
use siteback::process::{tool_available, Cmd};
use siteback::test_fixtures::{ScriptedConfirm, TreeFixture};
use siteback::*;

fn sqlite_spec(path: &std::path::Path) -> DatabaseSpec {
    DatabaseSpec {
        driver: "sqlite".to_owned(),
        database: path.to_string_lossy().into_owned(),
        ..Default::default()
    }
}

fn query(db: &std::path::Path, sql: &str) -> String {
    Cmd::new("sqlite3")
        .arg(db)
        .arg(sql)
        .run_checked()
        .unwrap()
        .stdout_str()
}

#[test]
fn sqlite_site_round_trip() {
    if !tool_available("sqlite3", &["-version"]) {
        eprintln!("sqlite3 not available; skipping");
        return;
    }
    let site = TreeFixture::new();
    let db_dir = TreeFixture::new();
    let db = db_dir.path().join("site.sqlite");
    query(
        &db,
        "CREATE TABLE node (title TEXT); INSERT INTO node VALUES ('home'), ('about');",
    );
    site.create_dir("config");
    site.create_file_with_contents(
        "config/settings.yml",
        b"include:\n  - settings.local.yml\n",
    );
    site.create_file_with_contents(
        "config/settings.local.yml",
        format!("database:\n  driver: sqlite\n  database: {}\n", db.display()).as_bytes(),
    );
    site.create_dir("files");
    site.create_file("files/logo.png");
    site.create_file("index.php");

    let out = TreeFixture::new();
    let drivers = DriverRegistry::with_builtin();
    let archive = dump(
        &Site::new(site.path()),
        &DumpOptions {
            components: Components::ALL,
            destination: Some(out.path().to_owned()),
            ..Default::default()
        },
        &drivers,
        CollectMonitor::arc(),
    )
    .unwrap();
    assert_eq!(archive.parent(), Some(out.path()));

    let target = TreeFixture::new();
    let dest = target.path().join("copy");
    let new_db = target.path().join("copy.sqlite");
    let confirm = ScriptedConfirm::new([]);
    restore(
        &RestoreOptions {
            archive: Some(archive),
            destination: Some(dest.clone()),
            database: Some(sqlite_spec(&new_db)),
            ..Default::default()
        },
        &RestoreEnv {
            drivers: &drivers,
            confirm: &confirm,
            mirror: &NativeMirror,
            monitor: CollectMonitor::arc(),
            active_site: None,
        },
    )
    .unwrap();

    assert_eq!(
        query(&new_db, "SELECT title FROM node ORDER BY title"),
        "about\nhome\n"
    );
    assert!(dest.join("files/logo.png").is_file());
    let local = fs::read_to_string(dest.join("config/settings.local.yml")).unwrap();
    assert!(local.contains("driver: sqlite"), "{local}");
    assert_eq!(
        Site::new(&dest).database().unwrap(),
        Some(sqlite_spec(&new_db))
    );
}
