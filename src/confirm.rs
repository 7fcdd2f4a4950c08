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

//! Ask the user before destroying data.

use std::fmt::Debug;
use std::io::{self, BufRead, Write};

use tracing::info;

use crate::*;

pub trait Confirm: Debug {
    /// Ask a yes/no question; true means go ahead.
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Ask on the terminal, reading the answer from stdin.
///
/// The question goes to stderr, because stdout carries command output.
/// Anything other than `y` or `yes`, including end of input, is a no.
#[derive(Debug, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, question: &str) -> Result<bool> {
        let mut stderr = io::stderr().lock();
        write!(stderr, "{question} [y/N] ")?;
        stderr.flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

/// Say yes to everything, for `--yes`.
#[derive(Debug, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, question: &str) -> Result<bool> {
        info!("{question} yes (--yes given)");
        Ok(true)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Ask, and turn a no into [Error::UserAbort].
pub fn require(confirm: &dyn Confirm, question: &str) -> Result<()> {
    if confirm.confirm(question)? {
        Ok(())
    } else {
        Err(Error::UserAbort)
    }
}
