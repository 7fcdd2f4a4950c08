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

//! Collect monitored information so that it can be inspected by tests or
//! summarized at the end of a command.

use std::sync::Arc;

use super::counters::Counters;
use super::{Counter, Monitor};

/// A monitor that keeps totals of counters.
#[derive(Default, Debug)]
pub struct CollectMonitor {
    counters: Counters,
}

impl CollectMonitor {
    pub fn new() -> Self {
        CollectMonitor::default()
    }

    /// Construct a new CollectMonitor and wrap it in an Arc.
    pub fn arc() -> Arc<CollectMonitor> {
        Arc::new(CollectMonitor::new())
    }

    pub fn get_counter(&self, counter: Counter) -> usize {
        self.counters.get(counter)
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }
}

impl Monitor for CollectMonitor {
    fn count(&self, counter: Counter, increment: usize) {
        self.counters.count(counter, increment)
    }
}
