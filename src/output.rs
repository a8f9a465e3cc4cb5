// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The grid artifact: `side * side` unsigned 64-bit counters, row 0
//! first, little-endian, with no header and no padding.  Rendering it
//! into an image is somebody else's job.

use crate::errors::RenderError;
use crate::histogram::Histogram;
use log::info;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Bytes per counter.
pub const COUNTER_BYTES: usize = 8;

/// Write counters in the order given.
pub fn write_grid<W, I>(counts: I, writer: &mut W) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = u64>,
{
    for count in counts {
        writer.write_all(&count.to_le_bytes())?;
    }
    Ok(())
}

/// Read back a grid of `side` x `side` counters.  Anything other than
/// exactly that many bytes is an error.
pub fn read_grid<R: Read>(reader: &mut R, side: usize) -> Result<Vec<u64>, RenderError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let expected = side * side * COUNTER_BYTES;
    if bytes.len() != expected {
        return Err(RenderError::Truncated {
            expected,
            found: bytes.len(),
        });
    }
    Ok(bytes
        .chunks(COUNTER_BYTES)
        .map(|chunk| {
            let mut word = [0u8; COUNTER_BYTES];
            word.copy_from_slice(chunk);
            u64::from_le_bytes(word)
        })
        .collect())
}

/// A few totals describing a grid, for sanity checking a saved run.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GridSummary {
    /// Number of counters.
    pub counters: usize,
    /// Sum of every counter: the total number of plotted points.
    pub total: u64,
    /// The largest single counter.
    pub max: u64,
}

impl GridSummary {
    /// Summarize row-major counters.
    pub fn of(counts: &[u64]) -> Self {
        GridSummary {
            counters: counts.len(),
            total: counts.iter().sum(),
            max: counts.iter().cloned().max().unwrap_or(0),
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

fn write_partial(histogram: &Histogram, partial: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(partial)?);
    write_grid(histogram.iter(), &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

/// Write the histogram to `path`.  The grid is written beside the
/// target first and renamed into place only once complete, so a failed
/// write never leaves a short artifact at `path`.
pub fn save<P: AsRef<Path>>(histogram: &Histogram, path: P) -> Result<(), RenderError> {
    let path = path.as_ref();
    let partial = partial_path(path);
    if let Err(e) = write_partial(histogram, &partial).and_then(|_| fs::rename(&partial, path)) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }
    info!(
        "wrote {} counters ({} bytes) to {}",
        histogram.len(),
        histogram.len() * COUNTER_BYTES,
        path.display()
    );
    Ok(())
}

/// Read a saved grid of `side` x `side` counters from `path`.
pub fn load<P: AsRef<Path>>(path: P, side: usize) -> Result<Vec<u64>, RenderError> {
    let mut file = File::open(path)?;
    read_grid(&mut file, side)
}
