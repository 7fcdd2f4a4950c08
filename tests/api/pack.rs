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

//! Tests for packing and unpacking staging directories.

use std::fs;

use filetime::{set_file_mtime, FileTime};
use pretty_assertions::assert_eq;

use siteback::test_fixtures::TreeFixture;
use siteback::*;

#[test]
fn pack_and_unpack_keep_contents_and_mtimes() {
    let staging = TreeFixture::new();
    staging.create_dir("code");
    staging.create_dir("code/lib");
    let php = staging.create_file_with_contents("code/lib/a.php", b"<?php\n");
    set_file_mtime(&php, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();
    staging.create_symlink("code/current", "lib");
    staging.create_file_with_contents("MANIFEST.yml", b"formatversion: '1.0'\n");

    let out = TreeFixture::new();
    let archive = pack(staging.path(), &out.path().join("a.tar.gz"), false).unwrap();
    let unpacked = unpack(&archive).unwrap();
    assert!(unpacked.is_temporary());

    let copy = unpacked.path().join("code/lib/a.php");
    assert_eq!(fs::read(&copy).unwrap(), b"<?php\n");
    assert_eq!(
        FileTime::from_last_modification_time(&fs::metadata(&copy).unwrap()),
        FileTime::from_unix_time(1_700_000_000, 0)
    );
    #[cfg(unix)]
    assert_eq!(
        fs::read_link(unpacked.path().join("code/current")).unwrap(),
        std::path::Path::new("lib")
    );
}

#[test]
fn unpacked_directory_is_removed_when_dropped() {
    let staging = TreeFixture::new();
    staging.create_file("MANIFEST.yml");
    let out = TreeFixture::new();
    let archive = pack(staging.path(), &out.path().join("a.tar.gz"), false).unwrap();
    let unpacked = unpack(&archive).unwrap();
    let path = unpacked.path().to_owned();
    assert!(path.is_dir());
    drop(unpacked);
    assert!(!path.exists());
}

#[test]
fn unpacked_archive_without_manifest() {
    let staging = TreeFixture::new();
    staging.create_file("stray.txt");
    let out = TreeFixture::new();
    let archive = pack(staging.path(), &out.path().join("a.tar.gz"), false).unwrap();
    let err = unpack(&archive).unwrap().read_manifest().unwrap_err();
    assert!(matches!(err, Error::ManifestNotFound { .. }), "{err:?}");
}
