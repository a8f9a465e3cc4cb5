//! Contains the Plane and PixelMapper structs, which describe the
//! relationship between the sampling rectangle on the complex plane,
//! the coarse grid of sampling cells laid over it, and the integral
//! plane of output pixels.
//!
//! The rectangle is described as left/right/top/bottom, but the
//! imaginary component of a point is measured against left and right
//! and the real component against top and bottom.  Every consumer of
//! the rectangle (seeding, the escape test, and pixel mapping) goes
//! through this module so that they agree on that convention.  The
//! images produced by earlier runs depend on it, so leave it alone.
use crate::config::Bounds;
use num::Complex;

/// Describes the column, row of a pixel in the output grid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The sampling rectangle on the complex plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    /// The four edges.
    pub bounds: Bounds,
}

impl Plane {
    /// Constructor.
    pub fn new(bounds: Bounds) -> Self {
        Plane { bounds }
    }

    /// The escape test: true once a point has left the rectangle.
    #[inline]
    pub fn is_outside(&self, x: &Complex<f64>) -> bool {
        let b = &self.bounds;
        x.im < b.left || x.im > b.right || x.re < b.top || x.re > b.bottom
    }

    /// Given a point inside the rectangle and a grid of `cells` x
    /// `cells` cells laid over it, return the row-major index of the
    /// cell containing the point.  Points on or beyond the right and
    /// bottom edges, or outside altogether, belong to no cell.
    pub fn cell_of(&self, point: &Complex<f64>, cells: usize) -> Option<usize> {
        let b = &self.bounds;
        let across = (point.im - b.left) / b.width();
        let down = (point.re - b.top) / b.height();
        if !(across >= 0.0 && across < 1.0 && down >= 0.0 && down < 1.0) {
            return None;
        }
        // The product can round up to `cells` for fractions a hair
        // below 1.0.
        let column = ((across * cells as f64) as usize).min(cells - 1);
        let row = ((down * cells as f64) as usize).min(cells - 1);
        Some(row * cells + column)
    }

    /// Given a cell index and two fractions in [0, 1), return the point
    /// that far down and across the cell.
    pub fn cell_point(&self, cell: usize, cells: usize, re_frac: f64, im_frac: f64) -> Complex<f64> {
        let b = &self.bounds;
        let cell_height = b.height() / cells as f64;
        let cell_width = b.width() / cells as f64;
        let cell_top = b.top + (cell / cells) as f64 * cell_height;
        let cell_left = b.left + (cell % cells) as f64 * cell_width;
        Complex::new(
            cell_top + cell_height * re_frac,
            cell_left + cell_width * im_frac,
        )
    }

    /// Given two fractions in [0, 1), return the point that far down and
    /// across the whole rectangle.
    pub fn point_at(&self, re_frac: f64, im_frac: f64) -> Complex<f64> {
        let b = &self.bounds;
        Complex::new(
            b.top + re_frac * b.height(),
            b.left + im_frac * b.width(),
        )
    }
}

/// Maps points on the complex plane to pixels in a square output grid
/// of `side` x `side` pixels.  Pixels are square, sized from the width
/// of the rectangle alone.
#[derive(Debug)]
pub struct PixelMapper {
    /// Width and height of the output grid.
    pub side: usize,
    /// The rectangle being mapped.
    pub plane: Plane,
    // The width and height of one pixel on the complex plane.
    pix_side: f64,
}

impl PixelMapper {
    /// Constructor.  Takes the sampling rectangle and the pixel count
    /// along one side of the output grid.
    pub fn new(plane: Plane, side: usize) -> Self {
        PixelMapper {
            side,
            plane,
            pix_side: plane.bounds.width() / side as f64,
        }
    }

    /// The total number of pixels in the grid.
    pub fn len(&self) -> usize {
        self.side * self.side
    }

    /// Describes that the grid is of a size.
    pub fn is_empty(&self) -> bool {
        self.side == 0
    }

    /// Given a complex number, map it to a pixel.  Coordinates that fall
    /// off the grid wrap around rather than being rejected; negative
    /// coordinates clamp to zero first.
    #[inline]
    pub fn point_to_pixel(&self, x: &Complex<f64>) -> Pixel {
        let b = &self.plane.bounds;
        let column = ((x.im - b.left) / self.pix_side) as usize % self.side;
        let row = ((x.re - b.top) / self.pix_side) as usize % self.side;
        Pixel(column, row)
    }

    /// The linear, row-major offset of the pixel a point maps to.
    #[inline]
    pub fn point_to_offset(&self, x: &Complex<f64>) -> usize {
        let Pixel(column, row) = self.point_to_pixel(x);
        row * self.side + column
    }

    /// Given a pixel, return the point at its upper left corner.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        let b = &self.plane.bounds;
        Complex::new(
            b.top + (pixel.1 as f64) * self.pix_side,
            b.left + (pixel.0 as f64) * self.pix_side,
        )
    }
}
