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

//! Tests for the siteback library API.

use std::fs;
use std::path::{Path, PathBuf};

use siteback::monitor::collect::CollectMonitor;
use siteback::test_fixtures::{FakeDriver, SiteFixture};
use siteback::*;

mod dump;
mod pack;
mod scenarios;

/// Dump all components of a site fixture into `out_dir`, returning the archive path.
fn dump_fixture(site: &SiteFixture, out_dir: &Path) -> PathBuf {
    let options = DumpOptions {
        components: Components::ALL,
        destination: Some(out_dir.join("site.tar.gz")),
        ..Default::default()
    };
    dump(
        &site.site(),
        &options,
        &FakeDriver::registry(),
        CollectMonitor::arc(),
    )
    .expect("dump")
}

/// Names of everything in a directory, not recursive, sorted.
fn dir_names(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
