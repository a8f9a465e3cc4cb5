// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The shared pixel histogram.  Every worker plots into the same grid;
//! each pixel is an independent atomic counter, so no lock is needed
//! and no increment is lost.  Counters only ever go up.

use crate::planes::{Pixel, PixelMapper, Plane};
use num::Complex;
use std::sync::atomic::{AtomicU64, Ordering};

/// A square grid of visit counters over the sampling rectangle.
#[derive(Debug)]
pub struct Histogram {
    mapper: PixelMapper,
    counters: Vec<AtomicU64>,
}

impl Histogram {
    /// A zeroed grid of `side` x `side` counters over `plane`.
    pub fn new(plane: Plane, side: usize) -> Self {
        let mapper = PixelMapper::new(plane, side);
        let counters = (0..mapper.len()).map(|_| AtomicU64::new(0)).collect();
        Histogram { mapper, counters }
    }

    /// Width and height of the grid.
    pub fn side(&self) -> usize {
        self.mapper.side
    }

    /// Number of counters.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// True for a zero-sized grid.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// The point-to-pixel mapping in use.
    pub fn mapper(&self) -> &PixelMapper {
        &self.mapper
    }

    /// Bump the counter of the pixel `point` maps to.
    #[inline]
    pub fn increment(&self, point: &Complex<f64>) {
        let offset = self.mapper.point_to_offset(point);
        self.counters[offset].fetch_add(1, Ordering::Relaxed);
    }

    /// Plot every point of an orbit.
    pub fn accumulate(&self, points: &[Complex<f64>]) {
        for point in points {
            self.increment(point);
        }
    }

    /// The current count at a pixel.
    pub fn get(&self, pixel: Pixel) -> u64 {
        self.counters[pixel.1 * self.mapper.side + pixel.0].load(Ordering::Relaxed)
    }

    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        self.iter().sum()
    }

    /// The counters in row-major order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = u64> + 'a {
        self.counters.iter().map(|c| c.load(Ordering::Relaxed))
    }

    /// A row-major copy of the counters.
    pub fn counts(&self) -> Vec<u64> {
        self.iter().collect()
    }

    /// Consume the histogram, once every writer is done, and return its
    /// row-major counters.
    pub fn into_counts(self) -> Vec<u64> {
        self.counters.into_iter().map(AtomicU64::into_inner).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;

    fn histogram(side: usize) -> Histogram {
        Histogram::new(
            Plane::new(Bounds {
                left: -2.0,
                right: 2.0,
                top: -2.0,
                bottom: 2.0,
            }),
            side,
        )
    }

    #[test]
    fn starts_empty() {
        let h = histogram(8);
        assert_eq!(h.len(), 64);
        assert_eq!(h.total(), 0);
        assert!(h.iter().all(|c| c == 0));
    }

    #[test]
    fn rows_follow_the_real_axis() {
        let h = histogram(4);
        h.increment(&Complex::new(1.0, -2.0));
        assert_eq!(h.get(Pixel(0, 3)), 1);
        assert_eq!(h.counts()[3 * 4], 1);
    }

    #[test]
    fn one_increment_per_point() {
        let h = histogram(4);
        let points = vec![
            Complex::new(0.0, 0.0),
            Complex::new(0.1, 0.1),
            Complex::new(-1.5, 1.5),
        ];
        h.accumulate(&points);
        assert_eq!(h.total(), 3);
        assert_eq!(h.get(Pixel(2, 2)), 2);
        assert_eq!(h.get(Pixel(3, 0)), 1);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let h = histogram(4);
        let point = Complex::new(0.5, 0.5);
        crossbeam::scope(|spawner| {
            for _ in 0..8 {
                let h = &h;
                spawner.spawn(move |_| {
                    for _ in 0..10_000 {
                        h.increment(&point);
                    }
                });
            }
        })
        .unwrap();
        assert_eq!(h.get(Pixel(2, 2)), 80_000);
        assert_eq!(h.into_counts().iter().sum::<u64>(), 80_000);
    }
}
