// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Orbit tracing and classification.
//!
//! Unlike the classic Buddhabrot, which plots every escaping orbit,
//! this one is only interested in orbits that wander around for a very
//! long time before escaping.  An orbit is followed from its seed `c`
//! (the first point is `c` itself, not zero) until it leaves the
//! sampling rectangle, lands exactly on a point it has visited before,
//! or runs out of iterations.  Only the first of those, and only after
//! more than `min` steps, produces points worth plotting.
//!
//! Cycles are caught with Brent's trick: a reference point is
//! snapshotted at every power-of-two step and every new point is
//! compared against it.  The comparison is exact, so only orbits that
//! collapse onto a true floating-point cycle are caught.

use crate::config::Config;
use crate::planes::Plane;
use num::Complex;

/// How a traced orbit ended.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Outcome {
    /// A point left the sampling rectangle.
    Escaped,
    /// A point exactly matched the reference snapshot.
    Periodic,
    /// The iteration cap was reached with the orbit still inside.
    Exhausted,
}

/// The window of orbit lengths worth plotting.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrbitLimits {
    /// Orbits must be strictly longer than this.
    pub min: usize,
    /// Orbits are cut off at this many iterations, and an orbit that
    /// is exactly this long is never plotted.
    pub max: usize,
}

impl OrbitLimits {
    /// Decides whether an orbit of `len` points that ended with
    /// `outcome` should be plotted.
    pub fn qualifies(&self, outcome: Outcome, len: usize) -> bool {
        outcome != Outcome::Periodic && len > self.min && len != self.max
    }
}

impl<'a> From<&'a Config> for OrbitLimits {
    fn from(config: &'a Config) -> Self {
        OrbitLimits {
            min: config.min_iterations,
            max: config.max_iterations,
        }
    }
}

/// A reusable buffer holding the points of the orbit most recently
/// traced.  Each worker owns one and reuses it for every seed, so the
/// allocation grows to the longest orbit seen and then stays put.
#[derive(Debug, Default)]
pub struct Orbit {
    points: Vec<Complex<f64>>,
}

impl Orbit {
    /// An empty orbit buffer.
    pub fn new() -> Self {
        Orbit { points: Vec::new() }
    }

    /// The points visited by the last trace, in order.  The seed itself
    /// is not included.
    pub fn points(&self) -> &[Complex<f64>] {
        &self.points
    }

    /// Number of points visited by the last trace.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the last trace visited nothing.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Follow the orbit of `c` under z -> z^2 + c for at most
    /// `limits.max` iterations, recording every point that stays
    /// inside the plane.
    pub fn trace(&mut self, c: Complex<f64>, plane: &Plane, limits: &OrbitLimits) -> Outcome {
        self.points.clear();
        let mut x = c;
        let mut old_x = c;
        for it in 0..limits.max {
            x = x * x + c;
            if plane.is_outside(&x) {
                return Outcome::Escaped;
            }
            if x == old_x {
                return Outcome::Periodic;
            }
            self.points.push(x);
            if it.is_power_of_two() {
                old_x = x;
            }
        }
        Outcome::Exhausted
    }

    /// Trace `c` and hand back its points only if the orbit qualifies
    /// for plotting.
    pub fn qualifying(
        &mut self,
        c: Complex<f64>,
        plane: &Plane,
        limits: &OrbitLimits,
    ) -> Option<&[Complex<f64>]> {
        let outcome = self.trace(c, plane, limits);
        if limits.qualifies(outcome, self.points.len()) {
            Some(&self.points)
        } else {
            None
        }
    }
}

/// Iterate `c` (starting from `c`) up to `iterations` times without
/// recording anything, and report whether it left the plane.  Used to
/// classify sampling cells.
pub fn escapes(c: Complex<f64>, plane: &Plane, iterations: usize) -> bool {
    let mut x = c;
    for _ in 0..iterations {
        x = x * x + c;
        if plane.is_outside(&x) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;

    fn plane() -> Plane {
        Plane::new(Bounds {
            left: -2.0,
            right: 2.0,
            top: -2.0,
            bottom: 2.0,
        })
    }

    fn limits(min: usize, max: usize) -> OrbitLimits {
        OrbitLimits { min, max }
    }

    #[test]
    fn complex_arithmetic_is_textbook_and_exact() {
        let a = Complex::new(1.5, -2.0);
        let b = Complex::new(-0.25, 3.0);
        assert_eq!(a + b, Complex::new(1.25, 1.0));
        assert_eq!(a * b, Complex::new(1.5 * -0.25 - -2.0 * 3.0, 1.5 * 3.0 + -2.0 * -0.25));
        assert_ne!(Complex::new(0.1 + 0.2, 0.0), Complex::new(0.3, 0.0));
    }

    #[test]
    fn fixed_point_is_periodic() {
        let mut orbit = Orbit::new();
        let outcome = orbit.trace(Complex::new(0.0, 0.0), &plane(), &limits(0, 100));
        assert_eq!(outcome, Outcome::Periodic);
        assert!(orbit.is_empty());
    }

    #[test]
    fn two_cycle_is_periodic() {
        // -1 -> 0 -> -1: the snapshot taken at step 1 is matched.
        let mut orbit = Orbit::new();
        let outcome = orbit.trace(Complex::new(-1.0, 0.0), &plane(), &limits(0, 100));
        assert_eq!(outcome, Outcome::Periodic);
        assert_eq!(orbit.points(), &[Complex::new(0.0, 0.0)]);
    }

    #[test]
    fn periodic_orbits_never_qualify() {
        let l = limits(0, 100);
        assert!(!l.qualifies(Outcome::Periodic, 50));
        let mut orbit = Orbit::new();
        assert!(orbit.qualifying(Complex::new(-1.0, 0.0), &plane(), &l).is_none());
    }

    #[test]
    fn immediate_escape_records_nothing() {
        let mut orbit = Orbit::new();
        let outcome = orbit.trace(Complex::new(1.5, 0.0), &plane(), &limits(0, 100));
        assert_eq!(outcome, Outcome::Escaped);
        assert!(orbit.is_empty());
        assert!(orbit.qualifying(Complex::new(1.5, 0.0), &plane(), &limits(0, 100)).is_none());
    }

    #[test]
    fn escape_is_measured_against_the_crossed_axes() {
        // Tall and narrow: the imaginary component has little room.
        let narrow = Plane::new(Bounds {
            left: -0.5,
            right: 0.5,
            top: -2.0,
            bottom: 2.0,
        });
        let mut orbit = Orbit::new();
        assert_eq!(
            orbit.trace(Complex::new(0.0, 0.6), &narrow, &limits(0, 100)),
            Outcome::Escaped
        );
        assert!(orbit.is_empty());
    }

    #[test]
    fn exhausting_the_cap_never_qualifies() {
        // -0.5 creeps toward its fixed point far too slowly to repeat
        // exactly within ten steps.
        let mut orbit = Orbit::new();
        let l = limits(5, 10);
        let outcome = orbit.trace(Complex::new(-0.5, 0.0), &plane(), &l);
        assert_eq!(outcome, Outcome::Exhausted);
        assert_eq!(orbit.len(), 10);
        assert!(!l.qualifies(outcome, orbit.len()));
        assert!(orbit.qualifying(Complex::new(-0.5, 0.0), &plane(), &l).is_none());
    }

    #[test]
    fn length_at_the_cap_is_excluded_even_when_escaping() {
        assert!(!limits(5, 10).qualifies(Outcome::Escaped, 10));
        assert!(limits(5, 10).qualifies(Outcome::Escaped, 9));
    }

    #[test]
    fn minimum_length_is_strict() {
        let c = Complex::new(0.3, 0.0);
        let mut orbit = Orbit::new();
        assert_eq!(orbit.trace(c, &plane(), &limits(0, 1000)), Outcome::Escaped);
        let len = orbit.len();
        assert!(len > 2);

        assert!(orbit.qualifying(c, &plane(), &limits(len, 1000)).is_none());
        let points = orbit.qualifying(c, &plane(), &limits(len - 1, 1000));
        assert_eq!(points.map(|p| p.len()), Some(len));
    }

    #[test]
    fn tracing_is_deterministic() {
        let c = Complex::new(-0.74, 0.12);
        let l = limits(0, 5000);
        let mut first = Orbit::new();
        let mut second = Orbit::new();
        assert_eq!(first.trace(c, &plane(), &l), second.trace(c, &plane(), &l));
        assert_eq!(first.points(), second.points());
    }

    #[test]
    fn buffer_is_cleared_between_traces() {
        let mut orbit = Orbit::new();
        orbit.trace(Complex::new(0.3, 0.0), &plane(), &limits(0, 1000));
        assert!(!orbit.is_empty());
        orbit.trace(Complex::new(1.5, 0.0), &plane(), &limits(0, 1000));
        assert!(orbit.is_empty());
    }

    #[test]
    fn quick_escape_test_agrees_with_tracing() {
        assert!(escapes(Complex::new(0.3, 0.0), &plane(), 1000));
        assert!(!escapes(Complex::new(-0.5, 0.0), &plane(), 1000));
        assert!(!escapes(Complex::new(0.0, 0.0), &plane(), 1000));
    }
}
