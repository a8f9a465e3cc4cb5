// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can stop a run.  The numeric core itself cannot
//! fail; what can go wrong is bad configuration, a sampling grid with
//! nothing worth sampling, and the final write to disk.

use failure::Fail;
use std::io;

/// A configuration value that cannot produce a meaningful run.
#[derive(Debug, Fail, PartialEq)]
#[fail(display = "{}: {}", field, message)]
pub struct ConfigError {
    /// The name of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ConfigError {
    pub(crate) fn new(field: &'static str, message: &str) -> Self {
        ConfigError {
            field,
            message: message.to_string(),
        }
    }
}

/// The failure modes of a render.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The configuration was rejected before any work started.
    #[fail(display = "invalid configuration: {}", _0)]
    Config(#[cause] ConfigError),

    /// Not a single cell of the sampling grid straddles the boundary of
    /// the set, so rejection sampling could never return a seed.
    #[fail(display = "the sampling grid contains no interesting cells")]
    NoInterestingCells,

    /// The rejection cap was hit while drawing a single seed.
    #[fail(display = "gave up drawing a seed after {} rejections", rejections)]
    SeedStarvation {
        /// Consecutive rejected draws.
        rejections: u64,
    },

    /// A worker thread died; the histogram is incomplete.
    #[fail(display = "a worker thread panicked")]
    WorkerPanicked,

    /// Reading or writing the grid artifact failed.
    #[fail(display = "I/O failure: {}", _0)]
    Io(#[cause] io::Error),

    /// A grid artifact did not hold the expected number of counters.
    #[fail(display = "grid holds {} bytes, expected {}", found, expected)]
    Truncated {
        /// Bytes required for a full grid.
        expected: usize,
        /// Bytes actually present.
        found: usize,
    },
}

impl From<ConfigError> for RenderError {
    fn from(e: ConfigError) -> Self {
        RenderError::Config(e)
    }
}

impl From<io::Error> for RenderError {
    fn from(e: io::Error) -> Self {
        RenderError::Io(e)
    }
}
