// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The worker pool.
//!
//! A fixed number of threads each work through their share of the seed
//! budget: draw a seed, trace its orbit, and if the orbit qualifies,
//! plot every point of it into the shared histogram.  Seeds come from
//! a single generator behind a mutex; each worker takes a whole batch
//! at a time into a private queue, so the lock is touched once per
//! batch rather than once per seed, and never while an orbit is being
//! traced.

use crate::config::Config;
use crate::errors::RenderError;
use crate::histogram::Histogram;
use crate::orbit::{Orbit, OrbitLimits};
use crate::planes::Plane;
use crate::seeds::{SeedGenerator, SeedSource};
use crossbeam::thread::ScopedJoinHandle;
use log::{debug, info};
use num::Complex;
use std::collections::VecDeque;
use std::ops::Add;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// What a run, or one worker's part of it, got through.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RunStats {
    /// Seeds traced.
    pub seeds: u64,
    /// Orbits that qualified and were plotted.
    pub qualifying: u64,
    /// Histogram increments performed.
    pub points: u64,
}

impl Add for RunStats {
    type Output = RunStats;

    fn add(self, other: RunStats) -> RunStats {
        RunStats {
            seeds: self.seeds + other.seeds,
            qualifying: self.qualifying + other.qualifying,
            points: self.points + other.points,
        }
    }
}

/// The product of a completed run.
#[derive(Debug)]
pub struct Render {
    /// The plotted grid, no longer being written to.
    pub histogram: Histogram,
    /// Totals across every worker.
    pub stats: RunStats,
}

/// Owns a validated configuration and the seed generator built from
/// it.  Building the generator classifies the sampling grid, which is
/// the expensive part of setting up.
pub struct Renderer {
    config: Config,
    generator: SeedGenerator,
}

impl Renderer {
    /// Validate `config` and classify its sampling grid.
    pub fn new(config: Config) -> Result<Self, RenderError> {
        config.validate()?;
        let generator = SeedGenerator::new(&config)?;
        Ok(Renderer { config, generator })
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The seed generator, and through it the interest mask.
    pub fn generator(&self) -> &SeedGenerator {
        &self.generator
    }

    /// Run every worker to completion.
    pub fn run(self) -> Result<Render, RenderError> {
        render_with(&self.config, self.generator)
    }
}

/// The number of seeds worker `worker` of `threads` is responsible
/// for.  The budget is split evenly; any remainder goes one apiece to
/// the lowest-numbered workers, so the shares always add up to it.
pub fn share(budget: u64, threads: usize, worker: usize) -> u64 {
    let threads = threads as u64;
    let extra = if (worker as u64) < budget % threads { 1 } else { 0 };
    budget / threads + extra
}

/// Counts seeds across all workers and logs every hundredth of the
/// budget.
struct Progress {
    done: AtomicU64,
    total: u64,
    step: u64,
}

impl Progress {
    fn new(total: u64) -> Self {
        Progress {
            done: AtomicU64::new(0),
            total,
            step: total / 100,
        }
    }

    fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if self.step != 0 && done % self.step == 0 {
            info!("{}% of seeds traced", done * 100 / self.total);
        }
    }
}

/// Run a whole render with seeds taken from `source`.  The
/// configuration is assumed to be valid.
pub fn render_with<S>(config: &Config, source: S) -> Result<Render, RenderError>
where
    S: SeedSource + Send,
{
    let plane = Plane::new(config.bounds);
    let histogram = Histogram::new(plane, config.side);
    let source = Mutex::new(source);
    let progress = Progress::new(config.seed_budget);

    info!(
        "tracing {} seeds on {} threads into a {}x{} grid",
        config.seed_budget, config.threads, config.side, config.side
    );

    let results = crossbeam::scope(|spawner| {
        let (plane, source, histogram, progress) = (&plane, &source, &histogram, &progress);
        let handles: Vec<ScopedJoinHandle<Result<RunStats, RenderError>>> = (0..config.threads)
            .map(|worker| {
                let share = share(config.seed_budget, config.threads, worker);
                spawner.spawn(move |_| {
                    let stats = work(config, plane, source, histogram, progress, share);
                    debug!("worker {} finished: {:?}", worker, stats);
                    stats
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<Vec<_>>()
    })
    .map_err(|_| RenderError::WorkerPanicked)?;

    let mut stats = RunStats::default();
    for result in results {
        stats = stats + result.map_err(|_| RenderError::WorkerPanicked)??;
    }

    info!(
        "traced {} seeds, {} orbits qualified, {} points plotted",
        stats.seeds, stats.qualifying, stats.points
    );
    Ok(Render { histogram, stats })
}

/// Top up a worker's private queue from the shared source.
fn refill<S: SeedSource>(
    source: &Mutex<S>,
    queue: &mut VecDeque<Complex<f64>>,
    count: usize,
) -> Result<(), RenderError> {
    // A poisoned lock still guards a usable generator.
    let mut source = source.lock().unwrap_or_else(PoisonError::into_inner);
    source.fill(queue, count)
}

/// One worker's loop.
fn work<S: SeedSource>(
    config: &Config,
    plane: &Plane,
    source: &Mutex<S>,
    histogram: &Histogram,
    progress: &Progress,
    share: u64,
) -> Result<RunStats, RenderError> {
    let limits = OrbitLimits::from(config);
    let mut queue: VecDeque<Complex<f64>> = VecDeque::new();
    let mut orbit = Orbit::new();
    let mut stats = RunStats::default();

    while stats.seeds < share {
        if queue.is_empty() {
            let wanted = (share - stats.seeds).min(config.batch_size as u64) as usize;
            refill(source, &mut queue, wanted)?;
        }
        let c = match queue.pop_front() {
            Some(c) => c,
            None => break,
        };
        if let Some(points) = orbit.qualifying(c, plane, &limits) {
            histogram.accumulate(points);
            stats.qualifying += 1;
            stats.points += points.len() as u64;
        }
        stats.seeds += 1;
        progress.tick();
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;
    use crate::seeds::ReplaySeeds;

    fn small_config(threads: usize, budget: u64, batch: usize) -> Config {
        Config {
            bounds: Bounds {
                left: -2.0,
                right: 2.0,
                top: -2.0,
                bottom: 2.0,
            },
            side: 32,
            cells_per_side: 4,
            cell_trials: 10,
            cell_iterations: 10,
            threads,
            seed_budget: budget,
            batch_size: batch,
            min_iterations: 2,
            max_iterations: 2000,
            max_rejections: None,
            rng_seed: Some(1),
        }
    }

    // Seeds just to the right of the cusp at 0.25 escape slowly.
    fn slow_escapes() -> Vec<Complex<f64>> {
        (0..16)
            .map(|i| Complex::new(0.26 + 0.01 * i as f64, 0.003 * i as f64))
            .collect()
    }

    #[test]
    fn shares_add_up_to_the_budget() {
        for &(budget, threads) in &[(1000, 8), (1003, 8), (7, 8), (0, 3), (10, 1)] {
            let total: u64 = (0..threads).map(|w| share(budget, threads, w)).sum();
            assert_eq!(total, budget);
            let most = share(budget, threads, 0);
            let least = share(budget, threads, threads - 1);
            assert!(most - least <= 1);
        }
    }

    #[test]
    fn stats_add_fieldwise() {
        let a = RunStats {
            seeds: 1,
            qualifying: 2,
            points: 3,
        };
        assert_eq!(
            a + a,
            RunStats {
                seeds: 2,
                qualifying: 4,
                points: 6
            }
        );
    }

    #[test]
    fn every_seed_in_the_budget_is_traced() {
        let config = small_config(3, 100, 7);
        let render = render_with(&config, ReplaySeeds::new(slow_escapes())).unwrap();
        assert_eq!(render.stats.seeds, 100);
    }

    #[test]
    fn plotted_points_match_the_histogram() {
        let config = small_config(4, 64, 4);
        let render = render_with(&config, ReplaySeeds::new(slow_escapes())).unwrap();
        assert!(render.stats.qualifying > 0);
        assert_eq!(render.histogram.total(), render.stats.points);
    }

    #[test]
    fn threaded_run_matches_single_threaded_run() {
        let single = render_with(&small_config(1, 64, 4), ReplaySeeds::new(slow_escapes())).unwrap();
        let many = render_with(&small_config(4, 64, 4), ReplaySeeds::new(slow_escapes())).unwrap();
        assert_eq!(single.stats, many.stats);
        assert_eq!(single.histogram.counts(), many.histogram.counts());
    }

    #[test]
    fn uneven_batches_still_match() {
        let single = render_with(&small_config(1, 50, 3), ReplaySeeds::new(slow_escapes())).unwrap();
        let many = render_with(&small_config(3, 50, 3), ReplaySeeds::new(slow_escapes())).unwrap();
        assert_eq!(single.histogram.counts(), many.histogram.counts());
    }

    #[test]
    fn qualifying_orbit_is_plotted_once_per_point() {
        let c = Complex::new(0.26, 0.0);
        let config = small_config(1, 1, 1);
        let mut orbit = Orbit::new();
        let expected = orbit
            .qualifying(c, &Plane::new(config.bounds), &OrbitLimits::from(&config))
            .map(|p| p.len() as u64)
            .unwrap();
        let render = render_with(&config, ReplaySeeds::new(vec![c])).unwrap();
        assert_eq!(render.histogram.total(), expected);
        assert_eq!(render.stats.qualifying, 1);
    }

    #[test]
    fn starved_source_fails_the_run() {
        let config = small_config(2, 10, 5);
        match render_with(&config, ReplaySeeds::new(vec![])) {
            Err(RenderError::SeedStarvation { .. }) => {}
            other => panic!("expected starvation, got {:?}", other.map(|r| r.stats)),
        }
    }

    #[test]
    fn empty_budget_gives_empty_grid() {
        let config = small_config(2, 0, 5);
        let render = render_with(&config, ReplaySeeds::new(slow_escapes())).unwrap();
        assert_eq!(render.stats, RunStats::default());
        assert_eq!(render.histogram.total(), 0);
    }

    #[test]
    fn renderer_runs_from_a_configuration() {
        let mut config = small_config(2, 200, 16);
        config.cell_trials = 100;
        config.cell_iterations = 100;
        let renderer = Renderer::new(config).unwrap();
        assert!(renderer.generator().mask().interesting_count() > 0);
        let render = renderer.run().unwrap();
        assert_eq!(render.stats.seeds, 200);
        assert_eq!(render.histogram.total(), render.stats.points);
    }

    #[test]
    fn renderer_rejects_bad_configuration() {
        let mut config = small_config(2, 200, 16);
        config.threads = 0;
        match Renderer::new(config) {
            Err(RenderError::Config(e)) => assert_eq!(e.field, "threads"),
            _ => panic!("expected a configuration error"),
        }
    }
}
