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

//! Communication from the library to a monitor: a test, the CLI, etc.

pub mod collect;
pub mod counters;

pub use counters::Counter;

pub trait Monitor: Send + Sync {
    /// Notify that a counter increased by a given amount.
    fn count(&self, counter: Counter, increment: usize);
}
