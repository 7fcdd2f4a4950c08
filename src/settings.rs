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

//! Site settings files: loading the effective settings, checking them for
//! credentials before they're archived, and writing the database connection
//! into the site-local override after a restore.
//!
//! Settings are YAML mappings. The main file may name other files in its
//! `include` list; each of those that exists has its top-level keys laid over
//! the main file, in order.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

use crate::*;

/// Key listing override files to read after the main settings file.
pub const INCLUDE_KEY: &str = "include";

/// Key holding the database connection.
pub const DATABASE_KEY: &str = "database";

/// Key holding the user-data directory, relative to the site root.
pub const FILES_PATH_KEY: &str = "files_path";

pub const BLOCK_BEGIN: &str =
    "# BEGIN SITEBACK DATABASE (managed by siteback restore; edits inside are overwritten)";
pub const BLOCK_END: &str = "# END SITEBACK DATABASE";

lazy_static! {
    static ref BLOCK_RE: Regex =
        Regex::new(r"(?ms)^# BEGIN SITEBACK DATABASE\b.*?^# END SITEBACK DATABASE[^\n]*(?:\n|\z)")
            .unwrap();
}

/// The effective settings of a site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// The main settings file these were loaded from.
    path: PathBuf,
    values: Mapping,
}

impl Settings {
    /// Load the main settings file and any included overrides.
    ///
    /// Returns `None` if the main file does not exist.
    pub fn load(main_path: &Path) -> Result<Option<Settings>> {
        let Some(mut values) = read_mapping(main_path)? else {
            return Ok(None);
        };
        let dir = main_path.parent().unwrap_or(Path::new("."));
        for include in include_names(&values) {
            let include_path = dir.join(&include);
            match read_mapping(&include_path)? {
                Some(overlay) => {
                    debug!(?include_path, "Merge included settings");
                    for (key, value) in overlay {
                        if key.as_str() != Some(INCLUDE_KEY) {
                            values.insert(key, value);
                        }
                    }
                }
                None => debug!(?include_path, "Included settings file does not exist"),
            }
        }
        Ok(Some(Settings {
            path: main_path.to_owned(),
            values,
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The configured user-data directory, as written in the settings.
    pub fn files_path(&self) -> Option<&str> {
        self.values
            .get(FILES_PATH_KEY)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// The configured database connection, if there is a non-empty one.
    pub fn database(&self) -> Result<Option<DatabaseSpec>> {
        match self.values.get(DATABASE_KEY) {
            Some(value) if holds_credentials(value) => serde_yaml::from_value(value.clone())
                .map(Some)
                .map_err(|source| Error::ParseYaml {
                    path: self.path.clone(),
                    source,
                }),
            _ => Ok(None),
        }
    }
}

/// Read a YAML file whose top level is a mapping; an empty file is an empty
/// mapping. Returns `None` if the file does not exist.
fn read_mapping(path: &Path) -> Result<Option<Mapping>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(Error::ReadFile {
                path: path.to_owned(),
                source,
            })
        }
    };
    parse_mapping(&text, path).map(Some)
}

fn parse_mapping(text: &str, path: &Path) -> Result<Mapping> {
    let parse_err = |source| Error::ParseYaml {
        path: path.to_owned(),
        source,
    };
    match serde_yaml::from_str::<Value>(text).map_err(parse_err)? {
        Value::Null => Ok(Mapping::new()),
        value => serde_yaml::from_value(value).map_err(parse_err),
    }
}

/// Names in the `include` key, which may be a list or a single string.
fn include_names(values: &Mapping) -> Vec<String> {
    match values.get(INCLUDE_KEY) {
        Some(Value::String(name)) => vec![name.clone()],
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

/// True if a `database` value holds something that looks like a connection.
fn holds_credentials(value: &Value) -> bool {
    match value {
        Value::Mapping(m) => !m.is_empty(),
        Value::Sequence(s) => !s.is_empty(),
        _ => false,
    }
}

/// Fail if a settings file that is about to be archived holds a database
/// connection.
///
/// A file that is not valid YAML can't be evaluated, so it's kept with a
/// warning.
pub fn check_no_live_credentials(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_owned(),
        source,
    })?;
    let value: Value = match serde_yaml::from_str(&text) {
        Ok(value) => value,
        Err(err) => {
            warn!("Can't parse settings file {path:?} to check for credentials: {err}");
            return Ok(());
        }
    };
    if value.get(DATABASE_KEY).is_some_and(holds_credentials) {
        return Err(Error::LiveCredentials {
            path: path.to_owned(),
        });
    }
    Ok(())
}

/// The files named in a settings file's `include` list, resolved against its
/// directory. A file that can't be read or parsed includes nothing.
pub fn included_paths(path: &Path) -> Vec<PathBuf> {
    let Ok(text) = fs::read_to_string(path) else {
        return Vec::new();
    };
    let Ok(values) = parse_mapping(&text, path) else {
        return Vec::new();
    };
    let dir = path.parent().unwrap_or(Path::new("."));
    include_names(&values)
        .iter()
        .map(|name| dir.join(name))
        .collect()
}

#[derive(Serialize)]
struct DatabaseBlock<'a> {
    database: &'a DatabaseSpec,
}

/// The delimited block of YAML holding a database connection.
fn database_block(spec: &DatabaseSpec, path: &Path) -> Result<String> {
    let body = serde_yaml::to_string(&DatabaseBlock { database: spec }).map_err(|source| {
        Error::SerializeYaml {
            path: path.to_owned(),
            source,
        }
    })?;
    Ok(format!("{BLOCK_BEGIN}\n{body}{BLOCK_END}\n"))
}

/// Replace the managed database block in `existing`, or append one.
///
/// Any extra managed blocks are removed so exactly one remains. A top-level
/// `database` key written outside the block is commented out, since the
/// block's key would duplicate it. Returns the new text and whether such a
/// key was found.
fn replace_block(existing: &str, block: &str) -> (String, bool) {
    let mut out = String::with_capacity(existing.len() + block.len());
    let mut last = 0;
    let mut placed = false;
    let mut superseded = false;
    for m in BLOCK_RE.find_iter(existing) {
        superseded |= comment_out_database_key(&existing[last..m.start()], &mut out);
        if !placed {
            out.push_str(block);
            placed = true;
        }
        last = m.end();
    }
    superseded |= comment_out_database_key(&existing[last..], &mut out);
    if !placed {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(block);
    }
    (out, superseded)
}

/// Marks the lines of a `database` key that was replaced by the managed block.
const SUPERSEDED_NOTE: &str = "# Superseded by the SITEBACK DATABASE block:\n";

/// Copy `text` into `out`, commenting out any top-level `database` key and
/// its nested lines. Returns true if one was found.
///
/// `text` holds whole lines.
fn comment_out_database_key(text: &str, out: &mut String) -> bool {
    let mut found = false;
    let mut in_key = false;
    for line in text.split_inclusive('\n') {
        if is_database_key_line(line) {
            found = true;
            in_key = true;
            out.push_str(SUPERSEDED_NOTE);
        } else if in_key && !continues_top_level_value(line) {
            in_key = false;
        }
        if in_key && !line.trim().is_empty() {
            out.push_str("# ");
        }
        out.push_str(line);
    }
    found
}

/// True for a line that starts the top-level `database` key.
fn is_database_key_line(line: &str) -> bool {
    let Some(rest) = line.strip_prefix(DATABASE_KEY) else {
        return false;
    };
    let Some(after) = rest.trim_start_matches([' ', '\t']).strip_prefix(':') else {
        return false;
    };
    after.is_empty() || after.starts_with(char::is_whitespace)
}

/// True if the line still belongs to the value of the previous top-level key:
/// blank, indented, or a sequence item at the left margin.
fn continues_top_level_value(line: &str) -> bool {
    line.trim().is_empty()
        || line.starts_with([' ', '\t'])
        || line == "-\n"
        || line.starts_with("- ")
}

/// Make sure the main settings file includes the local override file,
/// creating the main file if it doesn't exist.
fn ensure_included(main_path: &Path, local_name: &str) -> Result<()> {
    let write = |text: &str| {
        fs::write(main_path, text).map_err(|source| Error::WriteFile {
            path: main_path.to_owned(),
            source,
        })
    };
    let include_text = format!("{INCLUDE_KEY}:\n  - {local_name}\n");
    let text = match fs::read_to_string(main_path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!("Create settings file {main_path:?}");
            return write(&include_text);
        }
        Err(source) => {
            return Err(Error::ReadFile {
                path: main_path.to_owned(),
                source,
            })
        }
    };
    let mut values = parse_mapping(&text, main_path)?;
    let mut names = include_names(&values);
    if names.iter().any(|n| n == local_name) {
        return Ok(());
    }
    if !values.contains_key(INCLUDE_KEY) {
        // Append, so comments in the file survive.
        let mut text = text;
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&include_text);
        return write(&text);
    }
    names.push(local_name.to_owned());
    values.insert(
        Value::from(INCLUDE_KEY),
        Value::Sequence(names.into_iter().map(Value::from).collect()),
    );
    let text = serde_yaml::to_string(&values).map_err(|source| Error::SerializeYaml {
        path: main_path.to_owned(),
        source,
    })?;
    write(&text)
}

/// Record a database connection in a site's local settings override.
///
/// The override file is created if needed and listed in the main settings
/// file's includes. The connection goes in a delimited block that is replaced
/// on each call.
pub fn wire_database_settings(site: &Site, spec: &DatabaseSpec) -> Result<()> {
    let local_path = site.local_settings_path();
    if let Some(dir) = local_path.parent() {
        fs::create_dir_all(dir).map_err(|source| Error::WriteFile {
            path: dir.to_owned(),
            source,
        })?;
    }
    ensure_included(&site.settings_path(), site::LOCAL_SETTINGS_FILENAME)?;
    let existing = match fs::read_to_string(&local_path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(Error::ReadFile {
                path: local_path,
                source,
            })
        }
    };
    let block = database_block(spec, &local_path)?;
    let (text, superseded) = replace_block(&existing, &block);
    // Refuse to leave behind a file that the next load can't read.
    parse_mapping(&text, &local_path)?;
    if superseded {
        warn!("Commented out the previous database connection in {local_path:?}");
    }
    fs::write(&local_path, text).map_err(|source| Error::WriteFile {
        path: local_path.clone(),
        source,
    })?;
    info!("Wrote database connection to {local_path:?}");
    Ok(())
}
