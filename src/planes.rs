// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0 in
//! the upper-left corner, and a window on the complex plane.  The
//! imaginary axis grows upward while pixel rows grow downward, so the
//! top of the window lands on row zero.
use num::Complex;
use std::fmt;

use crate::errors::NebulaError;

/// Describes the width and height of an integral plane that is assumed
/// to start at 0,0.  Both values are positive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dimensions {
    width: usize,
    height: usize,
}

impl Dimensions {
    /// Refuses an image with no pixels.
    pub fn new(width: usize, height: usize) -> Result<Dimensions, NebulaError> {
        if width == 0 || height == 0 {
            return Err(NebulaError::InvalidDimensions { width, height });
        }
        Ok(Dimensions { width, height })
    }

    /// Pixels per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows in the image.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Never true for a validated value; present because `len` is.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Dimensions {
            width: 512,
            height: 512,
        }
    }
}

/// The rectangle of the complex plane that is sampled and drawn,
/// treating the real part as the x-component and the imaginary part
/// as the y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneWindow {
    xmin: f64,
    xmax: f64,
    ymin: f64,
    ymax: f64,
}

impl PlaneWindow {
    /// Refuses windows that are empty, inverted, or have non-finite
    /// bounds.
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Result<PlaneWindow, NebulaError> {
        let finite = xmin.is_finite() && xmax.is_finite() && ymin.is_finite() && ymax.is_finite();
        if !finite || xmax <= xmin || ymax <= ymin {
            return Err(NebulaError::InvalidWindow {
                xmin,
                xmax,
                ymin,
                ymax,
            });
        }
        Ok(PlaneWindow {
            xmin,
            xmax,
            ymin,
            ymax,
        })
    }

    /// Left edge.
    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    /// Right edge.
    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    /// Bottom edge.
    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    /// Top edge.
    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    /// Extent along the real axis.
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Extent along the imaginary axis.
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Closed-interval containment on both axes.
    pub fn contains(&self, point: &Complex<f64>) -> bool {
        point.re >= self.xmin
            && point.re <= self.xmax
            && point.im >= self.ymin
            && point.im <= self.ymax
    }
}

impl Default for PlaneWindow {
    /// The whole of the Mandelbrot set, with a little room to spare.
    fn default() -> Self {
        PlaneWindow {
            xmin: -2.0,
            xmax: 1.0,
            ymin: -1.5,
            ymax: 1.5,
        }
    }
}

/// Describes the x, y of a pixel in the image: column first, then row.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pixel(pub usize, pub usize);

/// A point mapped to a pixel outside the image.  Expected, and common:
/// most orbits wander out of the window before they escape.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutOfBounds;

impl fmt::Display for OutOfBounds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "point lies outside the image")
    }
}

/// Contains the definitions of two planes: an integral cartesian plane,
/// and a window on the complex plane.  Maps points from one to the
/// other.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// The size of the integral cartesian plane.
    pub dimensions: Dimensions,
    /// The window on the complex plane the image covers.
    pub window: PlaneWindow,
    // The ratio mapping the width and height, respectively, of the two
    // different planes.
    grid_factors: (f64, f64),
}

impl PlaneMapper {
    /// Both halves have already been validated, so this cannot fail.
    pub fn new(dimensions: Dimensions, window: PlaneWindow) -> PlaneMapper {
        // these are the multipliers of the complex plane to the integral plane.
        let grid_factors = (
            (dimensions.width as f64) / window.width(),
            (dimensions.height as f64) / window.height(),
        );

        PlaneMapper {
            dimensions,
            window,
            grid_factors,
        }
    }

    /// The total number of points in the integral grid.
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Given a complex number corresponding to a location on the
    /// complex cartesian plane, map it to the pixel that contains it.
    /// The right and bottom edges of the window belong to the pixel
    /// past the end of the image and so are out of bounds.
    pub fn to_pixel(&self, point: &Complex<f64>) -> Result<Pixel, OutOfBounds> {
        let left = ((point.re - self.window.xmin) * self.grid_factors.0).floor();
        let top = ((self.window.ymax - point.im) * self.grid_factors.1).floor();
        // Negated so that NaN is rejected too.
        if !(left >= 0.0 && top >= 0.0)
            || left >= (self.dimensions.width as f64)
            || top >= (self.dimensions.height as f64)
        {
            return Err(OutOfBounds);
        }
        Ok(Pixel(left as usize, top as usize))
    }

    /// Given a pixel on the integral cartesian plane, return the point
    /// on the complex plane at its upper-left corner.
    pub fn to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.window.xmin + (pixel.0 as f64) / self.grid_factors.0,
            self.window.ymax - (pixel.1 as f64) / self.grid_factors.1,
        )
    }

    /// Whether an orbit is still inside the drawn region.
    pub fn in_window(&self, point: &Complex<f64>) -> bool {
        self.window.contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    fn mapper(width: usize, height: usize, window: (f64, f64, f64, f64)) -> PlaneMapper {
        PlaneMapper::new(
            Dimensions::new(width, height).unwrap(),
            PlaneWindow::new(window.0, window.1, window.2, window.3).unwrap(),
        )
    }

    #[test]
    fn window_fails_on_bad_shape() {
        assert!(PlaneWindow::new(1.0, -1.0, -1.0, 1.0).is_err());
        assert!(PlaneWindow::new(-1.0, 1.0, 1.0, -1.0).is_err());
        assert!(PlaneWindow::new(-1.0, -1.0, -1.0, 1.0).is_err());
        assert!(PlaneWindow::new(-1.0, std::f64::NAN, -1.0, 1.0).is_err());
        assert!(PlaneWindow::new(std::f64::NEG_INFINITY, 1.0, -1.0, 1.0).is_err());
    }

    #[test]
    fn window_passes_on_good_shape() {
        let window = PlaneWindow::new(-2.0, 1.0, -1.5, 1.5).unwrap();
        assert_eq!(window.width(), 3.0);
        assert_eq!(window.height(), 3.0);
    }

    #[test]
    fn dimensions_must_be_positive() {
        assert!(Dimensions::new(0, 4).is_err());
        assert!(Dimensions::new(4, 0).is_err());
        assert_eq!(Dimensions::new(4, 3).unwrap().len(), 12);
    }

    #[test]
    fn to_pixel_on_positive_planes() {
        let pm = mapper(5, 5, (0.0, 5.0, 0.0, 5.0));
        assert_eq!(pm.to_pixel(&Complex::new(0.0, 5.0)), Ok(Pixel(0, 0)));
        assert_eq!(pm.to_pixel(&Complex::new(2.0, 2.0)), Ok(Pixel(2, 3)));
        assert_eq!(pm.to_pixel(&Complex::new(4.5, 0.5)), Ok(Pixel(4, 4)));
    }

    #[test]
    fn to_pixel_on_mixed_planes() {
        let pm = mapper(4, 4, (-2.0, 2.0, -2.0, 2.0));
        assert_eq!(pm.to_pixel(&Complex::new(0.0, 0.0)), Ok(Pixel(2, 2)));
        assert_eq!(pm.to_pixel(&Complex::new(-2.0, 2.0)), Ok(Pixel(0, 0)));
        assert_eq!(pm.to_pixel(&Complex::new(1.5, -1.5)), Ok(Pixel(3, 3)));
        assert_eq!(pm.to_pixel(&Complex::new(2.0, -2.0)), Err(OutOfBounds));
    }

    #[test]
    fn to_pixel_maps_on_large_mixed_planes() {
        let pm = mapper(640, 640, (-2.0, 2.0, -2.0, 2.0));
        assert_eq!(pm.to_pixel(&Complex::new(0.0, 0.0)), Ok(Pixel(320, 320)));
        assert_eq!(pm.to_pixel(&Complex::new(-2.0, 2.0)), Ok(Pixel(0, 0)));
        assert_eq!(pm.to_pixel(&Complex::new(1.0, 1.0)), Ok(Pixel(480, 160)));
        assert_eq!(pm.to_pixel(&Complex::new(1.0, -1.99)), Ok(Pixel(480, 638)));
    }

    #[test]
    fn every_interior_point_lands_in_the_image() {
        let pm = mapper(7, 5, (-2.0, 1.0, -1.5, 1.5));
        for (i, j) in iproduct!(0..40, 0..40) {
            let re = -2.0 + 3.0 * (i as f64 + 0.5) / 40.0;
            let im = -1.5 + 3.0 * (j as f64 + 0.5) / 40.0;
            let point = Complex::new(re, im);
            assert!(pm.in_window(&point));
            let Pixel(x, y) = pm.to_pixel(&point).unwrap();
            assert!(x < 7 && y < 5, "{:?} mapped to ({}, {})", point, x, y);
        }
    }

    #[test]
    fn points_outside_the_window_are_out_of_bounds() {
        let pm = mapper(7, 5, (-2.0, 1.0, -1.5, 1.5));
        let outside = [
            Complex::new(-2.01, 0.0),
            Complex::new(1.01, 0.0),
            Complex::new(0.0, -1.51),
            Complex::new(0.0, 1.51),
            Complex::new(-30.0, 30.0),
            Complex::new(std::f64::NAN, 0.0),
            Complex::new(std::f64::INFINITY, 0.0),
        ];
        for point in outside.iter() {
            assert!(!pm.in_window(point));
            assert_eq!(pm.to_pixel(point), Err(OutOfBounds), "{:?}", point);
        }
    }

    #[test]
    fn to_pixel_is_deterministic() {
        let pm = mapper(640, 480, (-2.0, 1.0, -1.5, 1.5));
        let other = mapper(640, 480, (-2.0, 1.0, -1.5, 1.5));
        let point = Complex::new(-0.743_643_887, 0.131_825_904);
        assert_eq!(pm.to_pixel(&point), pm.to_pixel(&point));
        assert_eq!(pm.to_pixel(&point), other.to_pixel(&point));
    }

    #[test]
    fn to_point_on_mixed_planes() {
        let pm = mapper(4, 4, (-2.0, 2.0, -2.0, 2.0));
        assert_eq!(pm.to_point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(pm.to_point(&Pixel(0, 0)), Complex::new(-2.0, 2.0));
        assert_eq!(pm.to_point(&Pixel(4, 4)), Complex::new(2.0, -2.0));
    }

    #[test]
    fn in_window_includes_the_edges() {
        let pm = mapper(4, 4, (-1.0, 1.0, -1.0, 1.0));
        assert!(pm.in_window(&Complex::new(1.0, -1.0)));
        assert!(pm.in_window(&Complex::new(-1.0, 1.0)));
        assert!(!pm.in_window(&Complex::new(1.0 + 1e-9, 0.0)));
    }
}
