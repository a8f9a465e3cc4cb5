#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Deep Buddhabrot density grids
//!
//! The Buddhabrot is a variant of the Mandelbrot set that plots not
//! whether a point escapes, but where it goes on the way out.  Take a
//! point `c` on the complex plane, repeatedly square it and add `c`
//! back, and each intermediate value is itself a point on the plane.
//! Map each of those to the nearest pixel and increment that pixel, and
//! over enough starting points the "orbits" pile up into a ghostly
//! figure.
//!
//! This crate is after the deep version of that figure: only orbits
//! that survive for a very long time (a million iterations, by default)
//! before escaping are plotted.  Those are rare, and they start close
//! to the border of the Mandelbrot set, so seeds are drawn only from
//! cells of the plane that straddle that border (see [`seeds`]).
//! Orbits that fall into an exact cycle, or that never escape at all,
//! are thrown away (see [`orbit`]).  A pool of threads does the tracing
//! and plots into a shared grid of atomic counters (see [`render`] and
//! [`histogram`]), and the finished grid is written out as raw
//! little-endian counters (see [`output`]).  Turning those counts into
//! an image is left to other tools.

pub mod config;
pub mod errors;
pub mod histogram;
pub mod orbit;
pub mod output;
pub mod planes;
pub mod render;
pub mod seeds;

pub use config::{Bounds, Config};
pub use errors::{ConfigError, RenderError};
pub use histogram::Histogram;
pub use render::{Render, Renderer, RunStats};
