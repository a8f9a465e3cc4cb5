// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The knobs and dials of a render.  The defaults describe a full
//! size run: a 10,000 pixel square image, a hundred million seeds, and
//! orbits between one and five million points long.  Expect it to take
//! a while.

use crate::errors::ConfigError;

/// The four edges of the sampling rectangle.  The same rectangle is
/// used for seeding, for the escape test, and for mapping points to
/// pixels.  Note that `left` and `right` bound the *imaginary*
/// component and `top` and `bottom` bound the *real* component; see
/// [`Plane`](crate::planes::Plane).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    /// Lower bound of the imaginary component.
    pub left: f64,
    /// Upper bound of the imaginary component.
    pub right: f64,
    /// Lower bound of the real component.
    pub top: f64,
    /// Upper bound of the real component.
    pub bottom: f64,
}

impl Bounds {
    /// Span of the horizontal (imaginary) axis.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Span of the vertical (real) axis.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds {
            left: -5.0 / 3.0,
            right: 5.0 / 3.0,
            top: -13.0 / 6.0,
            bottom: 7.0 / 6.0,
        }
    }
}

/// A complete description of a run.  Once handed to a
/// [`Renderer`](crate::render::Renderer) it is not mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The sampling rectangle.
    pub bounds: Bounds,
    /// Width and height, in pixels, of the output grid.
    pub side: usize,
    /// Width and height, in cells, of the interest mask.
    pub cells_per_side: usize,
    /// Random trial points examined per cell while building the mask.
    pub cell_trials: usize,
    /// Iterations per trial point while building the mask.
    pub cell_iterations: usize,
    /// Number of worker threads.
    pub threads: usize,
    /// Total number of seeds examined across all workers.
    pub seed_budget: u64,
    /// Seeds drawn per trip to the shared generator.
    pub batch_size: usize,
    /// Orbits this short or shorter are discarded.
    pub min_iterations: usize,
    /// Orbits are abandoned after this many iterations.
    pub max_iterations: usize,
    /// Consecutive rejected draws tolerated for one seed.  `None`
    /// retries forever.
    pub max_rejections: Option<u64>,
    /// Seed for the generator's random state.  `None` draws one from
    /// the operating system.
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bounds: Bounds::default(),
            side: 10_000,
            cells_per_side: 100,
            cell_trials: 1000,
            cell_iterations: 1000,
            threads: 8,
            seed_budget: 100_000_000,
            batch_size: 1_000_000,
            min_iterations: 1_000_000,
            max_iterations: 5_000_000,
            max_rejections: None,
            rng_seed: None,
        }
    }
}

impl Config {
    /// A small, quick configuration: the square [-2, 2] on both axes, a
    /// 100 pixel image, a 10x10 mask, one worker, and a thousand seeds
    /// whose orbits are kept when between 50 and 10,000 points long.
    pub fn reduced() -> Self {
        Config {
            bounds: Bounds {
                left: -2.0,
                right: 2.0,
                top: -2.0,
                bottom: 2.0,
            },
            side: 100,
            cells_per_side: 10,
            cell_trials: 1000,
            cell_iterations: 1000,
            threads: 1,
            seed_budget: 1000,
            batch_size: 1000,
            min_iterations: 50,
            max_iterations: 10_000,
            max_rejections: None,
            rng_seed: None,
        }
    }

    /// Rejects configurations that cannot produce a meaningful grid.
    /// An empty seed budget is allowed; it produces an empty grid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.bounds;
        if !(b.left.is_finite() && b.right.is_finite() && b.top.is_finite() && b.bottom.is_finite())
        {
            return Err(ConfigError::new("bounds", "every bound must be finite"));
        }
        if b.right <= b.left {
            return Err(ConfigError::new("bounds", "right must be greater than left"));
        }
        if b.bottom <= b.top {
            return Err(ConfigError::new("bounds", "bottom must be greater than top"));
        }
        if self.side == 0 {
            return Err(ConfigError::new("side", "the image needs at least one pixel"));
        }
        if self.cells_per_side == 0 {
            return Err(ConfigError::new("cells_per_side", "the mask needs at least one cell"));
        }
        if self.cell_trials == 0 {
            return Err(ConfigError::new("cell_trials", "must be at least 1"));
        }
        if self.cell_iterations == 0 {
            return Err(ConfigError::new("cell_iterations", "must be at least 1"));
        }
        if self.threads == 0 {
            return Err(ConfigError::new("threads", "must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::new("batch_size", "must be at least 1"));
        }
        if self.min_iterations >= self.max_iterations {
            return Err(ConfigError::new(
                "min_iterations",
                "must be smaller than max_iterations",
            ));
        }
        Ok(())
    }
}
