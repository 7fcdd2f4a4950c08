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

//! Track counters of the number of files, bytes, exclusions, etc, processed.
//!
//! Library code sets counters through the [Monitor](super::Monitor) interface.

#![warn(missing_docs)]

use std::fmt::{self, Debug};
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::Relaxed;

use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{EnumCount, EnumIter};

/// Counters of events or bytes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, EnumCount, EnumIter)]
pub enum Counter {
    /// Number of files copied into staging or a destination.
    Files,
    /// Total bytes in files copied.
    FileBytes,
    /// Number of directories created.
    Dirs,
    /// Number of symlinks created.
    Symlinks,
    /// Number of entries skipped by exclusion rules.
    Excluded,
    /// Number of files left alone by a mirror because they were unchanged.
    Unchanged,
    /// Number of destination-only entries deleted by a mirror.
    Deleted,
    /// Number of special files (sockets, devices) skipped.
    Unknown,
}

/// Counter values, identified by a [Counter].
#[derive(Default)]
pub struct Counters {
    counters: [AtomicUsize; Counter::COUNT],
}

impl Counters {
    /// Increase the value for a given counter by an amount.
    pub fn count(&self, counter: Counter, increment: usize) {
        self.counters[counter as usize].fetch_add(increment, Relaxed);
    }

    /// Get the current value of a counter.
    pub fn get(&self, counter: Counter) -> usize {
        self.counters[counter as usize].load(Relaxed)
    }

    /// Return an iterator over (counter, value) pairs that are non-zero.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (Counter, usize)> + '_ {
        Counter::iter()
            .map(move |c| (c, self.get(c)))
            .filter(|(_, v)| *v != 0)
    }
}

impl Debug for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Counters");
        for (c, v) in self.iter_nonzero() {
            s.field(&format!("{c:?}"), &v);
        }
        s.finish()
    }
}
