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

//! siteback: back up and restore a site's code, user files, and database.
//!
//! A dump exports each selected component into a staging directory, writes a
//! manifest, and packs the lot into one compressed archive. A restore
//! unpacks the archive and replays each component into a destination site.

pub mod apath;
pub mod component;
pub mod config;
pub mod confirm;
pub mod database;
pub mod driver;
pub mod dump;
pub mod errors;
pub mod excludes;
pub mod export;
pub mod live_tree;
pub mod manifest;
pub mod mirror;
mod misc;
pub mod monitor;
pub mod pack;
pub mod process;
pub mod restore;
pub mod settings;
pub mod site;
pub mod staging;
pub mod test_fixtures;
pub mod trace;

pub use crate::apath::Apath;
pub use crate::component::{Component, Components};
pub use crate::config::Config;
pub use crate::database::DatabaseSpec;
pub use crate::driver::{DatabaseDriver, DriverRegistry};
pub use crate::dump::{dump, DumpOptions};
pub use crate::errors::{Error, Result};
pub use crate::excludes::{Exclude, ExcludeBuilder};
pub use crate::live_tree::LiveTree;
pub use crate::manifest::Manifest;
pub use crate::misc::bytes_to_human_mb;
pub use crate::pack::{pack, unpack};
pub use crate::restore::{restore, RestoreEnv, RestoreOptions, RestoreSummary};
pub use crate::settings::Settings;
pub use crate::site::Site;
pub use crate::staging::StagingDir;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
