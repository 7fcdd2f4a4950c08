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

//! Set up tracing to the console and optionally a JSON log file.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use tracing::{trace, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::Registry;

use crate::*;

/// Chosen style of timestamp prefix on trace lines.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
pub enum TraceTimeStyle {
    /// No timestamp on trace lines.
    #[default]
    None,
    /// Universal time, in RFC 3339 style.
    Utc,
    /// Local time, in RFC 3339, using the offset when the program starts.
    Local,
    /// Time since the start of the process, in seconds.
    Relative,
}

/// Install the global subscriber.
///
/// Console output goes to stderr, so that stdout carries only command
/// results such as the archive path. The returned guard must be held until
/// the program exits so the JSON log is flushed.
#[must_use = "the guard flushes the JSON log when dropped"]
pub fn enable_tracing(
    time_style: TraceTimeStyle,
    console_level: Level,
    json_path: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt::time;
    fn hookup<FT>(
        timer: FT,
        console_level: Level,
        json_path: Option<&Path>,
    ) -> Result<Option<WorkerGuard>>
    where
        FT: FormatTime + Send + Sync + 'static,
    {
        let console_layer = tracing_subscriber::fmt::Layer::default()
            .with_ansi(clicolors_control::colors_enabled())
            .with_writer(io::stderr)
            .with_timer(timer)
            .with_filter(filter::Targets::new().with_target("siteback", console_level));
        let mut flush_guard = None;
        let json_layer = match json_path {
            Some(json_path) => {
                let file_writer = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(json_path)
                    .map_err(|source| Error::WriteFile {
                        path: json_path.to_owned(),
                        source,
                    })?;
                let (non_blocking, guard) = tracing_appender::non_blocking(file_writer);
                flush_guard = Some(guard);
                Some(
                    tracing_subscriber::fmt::Layer::default()
                        .json()
                        .with_writer(non_blocking)
                        .with_filter(filter::Targets::new().with_target("siteback", Level::TRACE)),
                )
            }
            None => None,
        };
        Registry::default()
            .with(console_layer)
            .with(json_layer)
            .init();
        Ok(flush_guard)
    }

    let flush_guard = match time_style {
        TraceTimeStyle::None => hookup((), console_level, json_path)?,
        TraceTimeStyle::Utc => hookup(time::UtcTime::rfc_3339(), console_level, json_path)?,
        TraceTimeStyle::Relative => hookup(time::uptime(), console_level, json_path)?,
        TraceTimeStyle::Local => match time::OffsetTime::local_rfc_3339() {
            Ok(timer) => hookup(timer, console_level, json_path)?,
            // The local offset can't always be determined, e.g. in multithreaded processes.
            Err(_) => hookup(time::UtcTime::rfc_3339(), console_level, json_path)?,
        },
    };
    trace!("Tracing enabled");
    Ok(flush_guard)
}
