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

//! Tests for dumping a site into an archive.

use std::fs;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use siteback::monitor::collect::CollectMonitor;
use siteback::monitor::Counter;
use siteback::test_fixtures::{FakeDriver, SiteFixture, TreeFixture};
use siteback::*;

use super::{dir_names, dump_fixture};

#[test]
fn dump_all_components() {
    let site = SiteFixture::new();
    let out = TreeFixture::new();
    let archive = dump_fixture(&site, out.path());
    assert_eq!(archive, out.path().join("site.tar.gz"));

    let staging = unpack(&archive).unwrap();
    let manifest = staging.read_manifest().unwrap();
    assert_eq!(manifest.components, Components::ALL);
    assert_eq!(manifest.formatversion, "1.0");
    assert_eq!(manifest.generator, "siteback");

    assert_eq!(
        dir_names(staging.path()),
        ["MANIFEST.yml", "code", "database", "files"]
    );
    let code = staging.path().join("code");
    assert_eq!(dir_names(&code), ["config", "index.php"]);
    // The local override holds credentials and is never archived.
    assert_eq!(dir_names(&code.join("config")), ["settings.yml"]);
    assert_eq!(
        fs::read_to_string(staging.path().join("files/a.txt")).unwrap(),
        "X"
    );
    assert_eq!(
        fs::read(staging.path().join("database/database.sql")).unwrap(),
        fs::read(site.database_path()).unwrap()
    );
}

#[test]
fn dump_records_description_and_tags() {
    let site = SiteFixture::new();
    let out = TreeFixture::new();
    let options = DumpOptions {
        components: Components {
            files: true,
            ..Components::NONE
        },
        destination: Some(out.path().join("files.tar.gz")),
        description: "before upgrade".to_owned(),
        tags: "weekly".to_owned(),
        generator: Some("deploy-bot".to_owned()),
        generator_version: Some("7".to_owned()),
        ..Default::default()
    };
    let archive = dump(
        &site.site(),
        &options,
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .unwrap();
    let manifest = unpack(&archive).unwrap().read_manifest().unwrap();
    assert_eq!(
        manifest.components,
        Components {
            files: true,
            ..Components::NONE
        }
    );
    assert_eq!(manifest.description, "before upgrade");
    assert_eq!(manifest.tags, "weekly");
    assert_eq!(manifest.generator, "deploy-bot");
    assert_eq!(manifest.generatorversion, "7");
}

#[test]
fn no_components_is_an_error() {
    let site = SiteFixture::new();
    let out = TreeFixture::new();
    let options = DumpOptions {
        destination: Some(out.path().join("x.tar.gz")),
        ..Default::default()
    };
    let err = dump(
        &site.site(),
        &options,
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .unwrap_err();
    assert_matches!(err, Error::NoComponents);
    assert!(dir_names(out.path()).is_empty());
}

#[test]
fn existing_archive_is_not_replaced() {
    let site = SiteFixture::new();
    let out = TreeFixture::new();
    let archive = out.create_file_with_contents("site.tar.gz", b"precious");
    let options = DumpOptions {
        components: Components::ALL,
        destination: Some(archive.clone()),
        ..Default::default()
    };
    let err = dump(
        &site.site(),
        &options,
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .unwrap_err();
    assert_matches!(err, Error::ArchiveExists { .. });
    assert_eq!(fs::read(&archive).unwrap(), b"precious");

    let options = DumpOptions {
        overwrite: true,
        ..options
    };
    dump(
        &site.site(),
        &options,
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .unwrap();
    assert_eq!(
        unpack(&archive).unwrap().read_manifest().unwrap().components,
        Components::ALL
    );
}

#[test]
fn live_credentials_block_the_dump() {
    let site = SiteFixture::new();
    site.tree.create_dir("sites");
    site.tree.create_file_with_contents(
        "sites/settings.yml",
        b"database:\n  driver: mysql\n  database: prod\n  password: secret\n",
    );
    let out = TreeFixture::new();
    let err = dump(
        &site.site(),
        &DumpOptions {
            components: Components {
                code: true,
                ..Components::NONE
            },
            destination: Some(out.path().join("code.tar.gz")),
            ..Default::default()
        },
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .unwrap_err();
    match err {
        Error::LiveCredentials { path } => assert!(path.ends_with("sites/settings.yml")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(dir_names(out.path()).is_empty());
}

#[test]
fn empty_database_mapping_is_allowed() {
    let site = SiteFixture::new();
    site.tree.create_dir("sites");
    site.tree
        .create_file_with_contents("sites/settings.yml", b"database: {}\n");
    let out = TreeFixture::new();
    dump(
        &site.site(),
        &DumpOptions {
            components: Components {
                code: true,
                ..Components::NONE
            },
            destination: Some(out.path().join("code.tar.gz")),
            ..Default::default()
        },
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .unwrap();
}

#[test]
fn user_code_exclusions() {
    let site = SiteFixture::new();
    site.tree.create_dir("cache");
    site.tree.create_file("cache/page.html");
    site.tree.create_file("debug.log");
    let patterns = site.tree.create_file_with_contents("excludes.txt", b"# generated\n*.log\n");
    let out = TreeFixture::new();
    let monitor = CollectMonitor::arc();
    let archive = dump(
        &site.site(),
        &DumpOptions {
            components: Components {
                code: true,
                ..Components::NONE
            },
            destination: Some(out.path().join("code.tar.gz")),
            code_excludes: vec!["cache".to_owned()],
            code_exclude_files: vec![patterns],
            ..Default::default()
        },
        &FakeDriver::registry(),
        monitor.clone(),
    )
    .unwrap();
    let staging = unpack(&archive).unwrap();
    assert_eq!(
        dir_names(&staging.path().join("code")),
        ["config", "excludes.txt", "index.php"]
    );
    // cache, debug.log, files, and settings.local.yml
    assert_eq!(monitor.get_counter(Counter::Excluded), 4);
}

#[test]
fn archive_inside_the_site_is_not_archived() {
    let site = SiteFixture::new();
    site.tree.create_dir("backups");
    site.tree.create_file("backups/older.tar.gz");
    let archive = dump(
        &site.site(),
        &DumpOptions {
            components: Components {
                code: true,
                ..Components::NONE
            },
            destination: Some(site.path().join("backups/new.tar.gz")),
            ..Default::default()
        },
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .unwrap();
    let staging = unpack(&archive).unwrap();
    assert!(!staging.path().join("code/backups").exists());
}

#[test]
fn explicit_database_replaces_site_settings() {
    let site = SiteFixture::new();
    let other = TreeFixture::new();
    let other_db = other.create_file_with_contents("other.db", b"OTHER;\n");
    let out = TreeFixture::new();
    let archive = dump(
        &site.site(),
        &DumpOptions {
            components: Components {
                database: true,
                ..Components::NONE
            },
            destination: Some(out.path().join("db.tar.gz")),
            database: Some(FakeDriver::spec(&other_db)),
            ..Default::default()
        },
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .unwrap();
    let staging = unpack(&archive).unwrap();
    assert_eq!(
        fs::read(staging.path().join("database/database.sql")).unwrap(),
        b"OTHER;\n"
    );
}

#[test]
fn unknown_driver_fails_before_writing() {
    let site = SiteFixture::new();
    let out = TreeFixture::new();
    let err = dump(
        &site.site(),
        &DumpOptions {
            components: Components::ALL,
            destination: Some(out.path().join("x.tar.gz")),
            database: Some(DatabaseSpec {
                driver: "oracle".to_owned(),
                database: "prod".to_owned(),
                ..Default::default()
            }),
            ..Default::default()
        },
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .unwrap_err();
    assert_matches!(err, Error::UnknownDriver { driver } if driver == "oracle");
    assert!(dir_names(out.path()).is_empty());
}

#[test]
fn database_without_connection() {
    let tree = TreeFixture::new();
    tree.create_file("index.php");
    let out = TreeFixture::new();
    let err = dump(
        &Site::new(tree.path()),
        &DumpOptions {
            components: Components::ALL,
            destination: Some(out.path().join("x.tar.gz")),
            ..Default::default()
        },
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .unwrap_err();
    // The files directory is checked first.
    assert_matches!(err, Error::SourceNotFound { .. });

    tree.create_dir("files");
    let err = dump(
        &Site::new(tree.path()),
        &DumpOptions {
            components: Components::ALL,
            destination: Some(out.path().join("x.tar.gz")),
            ..Default::default()
        },
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .unwrap_err();
    assert_matches!(err, Error::NoDatabaseSpec);
}

#[test]
fn live_credentials_in_included_settings_block_the_dump() {
    let site = SiteFixture::new();
    site.tree.create_file_with_contents(
        "config/settings.yml",
        b"files_path: files\ninclude:\n  - prod.yml\n  - settings.local.yml\n",
    );
    site.tree.create_file_with_contents(
        "config/prod.yml",
        b"database: {driver: mysql, database: prod, password: hunter2}\n",
    );
    let out = TreeFixture::new();
    let err = dump(
        &site.site(),
        &DumpOptions {
            components: Components {
                code: true,
                ..Components::NONE
            },
            destination: Some(out.path().join("code.tar.gz")),
            ..Default::default()
        },
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .unwrap_err();
    assert_matches!(err, Error::LiveCredentials { path } if path.ends_with("config/prod.yml"));
    assert!(dir_names(out.path()).is_empty());
}
