// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seed selection.
//!
//! The orbits worth plotting start from points very close to the
//! border of the Mandelbrot set.  Points deep inside the set never
//! escape, and points well outside escape almost at once, so drawing
//! seeds uniformly from the whole rectangle wastes nearly every draw.
//!
//! Instead, the rectangle is broken up into a coarse grid of cells,
//! and each cell is sampled with a number of random trial points.  A
//! cell is "interesting" if at least one trial escaped the rectangle
//! and at least one trial survived every sampling iteration; such a
//! cell straddles the border.  Seeds are then drawn uniformly from the
//! whole rectangle and thrown back until one lands in an interesting
//! cell.

use crate::config::Config;
use crate::errors::{ConfigError, RenderError};
use crate::orbit::escapes;
use crate::planes::Plane;
use itertools::iproduct;
use log::{debug, info};
use num::Complex;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;

/// A source of uniform fractions in [0, 1).
pub struct Unit(Uniform<f64>, StdRng);

impl Unit {
    /// Wraps an already-seeded generator.
    pub fn new(rng: StdRng) -> Self {
        Unit(Uniform::new(0.0_f64, 1.0_f64), rng)
    }

    /// Seeded from `seed`, or from the operating system when absent.
    pub fn seeded(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Unit::new(StdRng::seed_from_u64(seed)),
            None => Unit::new(StdRng::from_entropy()),
        }
    }

    /// The next fraction.
    pub fn get(&mut self) -> f64 {
        self.0.sample(&mut self.1)
    }
}

/// The precomputed, read-only classification of every sampling cell.
#[derive(Clone, Debug, PartialEq)]
pub struct InterestMask {
    cells_per_side: usize,
    interesting: Vec<bool>,
}

impl InterestMask {
    /// Sample every cell of a `cells_per_side` square grid over `plane`
    /// with up to `trials` random points, each iterated up to
    /// `iterations` times.
    pub fn classify(
        plane: &Plane,
        cells_per_side: usize,
        trials: usize,
        iterations: usize,
        unit: &mut Unit,
    ) -> Self {
        let interesting = iproduct!(0..cells_per_side, 0..cells_per_side)
            .map(|(row, column)| {
                let cell = row * cells_per_side + column;
                is_interesting_cell(plane, cell, cells_per_side, trials, iterations, unit)
            })
            .collect();
        InterestMask {
            cells_per_side,
            interesting,
        }
    }

    /// Build a mask from an explicit, row-major classification.  There
    /// must be exactly one entry per cell.
    pub fn from_cells(
        cells_per_side: usize,
        interesting: Vec<bool>,
    ) -> Result<Self, ConfigError> {
        if interesting.len() != cells_per_side * cells_per_side {
            return Err(ConfigError::new(
                "cells_per_side",
                "the classification does not cover the grid",
            ));
        }
        Ok(InterestMask {
            cells_per_side,
            interesting,
        })
    }

    /// Width and height of the grid.
    pub fn cells_per_side(&self) -> usize {
        self.cells_per_side
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.interesting.len()
    }

    /// True for a zero-sized grid.
    pub fn is_empty(&self) -> bool {
        self.interesting.is_empty()
    }

    /// The classification of a single cell.
    pub fn is_interesting(&self, cell: usize) -> bool {
        self.interesting.get(cell).cloned().unwrap_or(false)
    }

    /// How many cells are worth drawing from.
    pub fn interesting_count(&self) -> usize {
        self.interesting.iter().filter(|&&i| i).count()
    }

    /// True if `point` lies in an interesting cell of `plane`.
    pub fn contains(&self, plane: &Plane, point: &Complex<f64>) -> bool {
        plane
            .cell_of(point, self.cells_per_side)
            .map_or(false, |cell| self.interesting[cell])
    }
}

/// A cell is interesting if its trials include both a point that
/// escapes and one that survives every iteration.  Stops sampling as
/// soon as both have been seen.
fn is_interesting_cell(
    plane: &Plane,
    cell: usize,
    cells_per_side: usize,
    trials: usize,
    iterations: usize,
    unit: &mut Unit,
) -> bool {
    let (mut seen_inside, mut seen_outside) = (false, false);
    for _ in 0..trials {
        let re_frac = unit.get();
        let im_frac = unit.get();
        let c = plane.cell_point(cell, cells_per_side, re_frac, im_frac);
        if escapes(c, plane, iterations) {
            seen_outside = true;
        } else {
            seen_inside = true;
        }
        if seen_inside && seen_outside {
            return true;
        }
    }
    false
}

/// Anything that can hand out seeds in bulk.  Workers share a single
/// source behind a lock and refill a private queue from it.
pub trait SeedSource {
    /// Append `count` seeds to `queue`.
    fn fill(&mut self, queue: &mut VecDeque<Complex<f64>>, count: usize) -> Result<(), RenderError>;
}

/// Draws seeds from the interesting cells of the sampling rectangle.
/// The generator's random state is not shareable; callers on several
/// threads must serialize access to it.
pub struct SeedGenerator {
    plane: Plane,
    mask: InterestMask,
    unit: Unit,
    max_rejections: Option<u64>,
}

impl SeedGenerator {
    /// Classify the configured cell grid and prepare to draw seeds from
    /// it.  The same random stream drives classification and drawing,
    /// so a fixed `rng_seed` fixes both.
    pub fn new(config: &Config) -> Result<Self, RenderError> {
        let plane = Plane::new(config.bounds);
        let mut unit = Unit::seeded(config.rng_seed);
        let mask = InterestMask::classify(
            &plane,
            config.cells_per_side,
            config.cell_trials,
            config.cell_iterations,
            &mut unit,
        );
        info!(
            "{} of {} sampling cells are interesting",
            mask.interesting_count(),
            mask.len()
        );
        SeedGenerator::from_parts(plane, mask, unit, config.max_rejections)
    }

    /// Assemble a generator from a ready-made mask.  Fails if the mask
    /// has no interesting cells, since no seed could ever be drawn.
    pub fn from_parts(
        plane: Plane,
        mask: InterestMask,
        unit: Unit,
        max_rejections: Option<u64>,
    ) -> Result<Self, RenderError> {
        if mask.interesting_count() == 0 {
            return Err(RenderError::NoInterestingCells);
        }
        Ok(SeedGenerator {
            plane,
            mask,
            unit,
            max_rejections,
        })
    }

    /// The cell classification in use.
    pub fn mask(&self) -> &InterestMask {
        &self.mask
    }

    /// The rectangle seeds are drawn from.
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Draw one seed.  Candidates outside interesting cells are thrown
    /// back; with a rejection cap configured, exceeding it is an error.
    pub fn generate(&mut self) -> Result<Complex<f64>, RenderError> {
        let mut rejections: u64 = 0;
        loop {
            let re_frac = self.unit.get();
            let im_frac = self.unit.get();
            let candidate = self.plane.point_at(re_frac, im_frac);
            if self.mask.contains(&self.plane, &candidate) {
                return Ok(candidate);
            }
            rejections += 1;
            if let Some(cap) = self.max_rejections {
                if rejections > cap {
                    return Err(RenderError::SeedStarvation { rejections });
                }
            }
        }
    }
}

impl SeedSource for SeedGenerator {
    fn fill(&mut self, queue: &mut VecDeque<Complex<f64>>, count: usize) -> Result<(), RenderError> {
        for _ in 0..count {
            queue.push_back(self.generate()?);
        }
        debug!("drew a batch of {} seeds", count);
        Ok(())
    }
}

/// Replays a fixed list of seeds, round and round.  Useful when the
/// exact seed sequence has to be controlled.
#[derive(Clone, Debug)]
pub struct ReplaySeeds {
    seeds: Vec<Complex<f64>>,
    next: usize,
}

impl ReplaySeeds {
    /// Replay `seeds` from the beginning.
    pub fn new(seeds: Vec<Complex<f64>>) -> Self {
        ReplaySeeds { seeds, next: 0 }
    }
}

impl SeedSource for ReplaySeeds {
    fn fill(&mut self, queue: &mut VecDeque<Complex<f64>>, count: usize) -> Result<(), RenderError> {
        if self.seeds.is_empty() {
            return Err(RenderError::SeedStarvation { rejections: 0 });
        }
        for _ in 0..count {
            queue.push_back(self.seeds[self.next]);
            self.next = (self.next + 1) % self.seeds.len();
        }
        Ok(())
    }
}
