//! Sampled Cartesian coordinate grids.
//!
//! A [`Grid`] is a pair of equal-shape 2D arrays `(X, Y)` following NumPy's
//! `meshgrid` convention: the first (row) index runs along *y* and the second
//! (column) index along *x*. Grids are immutable once built and clone in
//! constant time, so a single grid can be shared by every evaluation in a
//! session.

use std::sync::Arc;
use ndarray as nd;
use crate::error::{ PatternError, PatternResult };

/// Immutable pair of coordinate arrays.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    x: Arc<nd::Array2<f64>>,
    y: Arc<nd::Array2<f64>>,
}

impl Grid {
    /// Create a new grid from pre-built coordinate arrays.
    ///
    /// Fails if the arrays differ in shape or contain no samples.
    pub fn new(x: nd::Array2<f64>, y: nd::Array2<f64>) -> PatternResult<Self> {
        if x.shape() != y.shape() {
            return Err(PatternError::GridShape {
                x: x.shape().to_vec(),
                y: y.shape().to_vec(),
            });
        }
        if x.is_empty() {
            return Err(PatternError::EmptyGrid);
        }
        Ok(Self { x: Arc::new(x), y: Arc::new(y) })
    }

    /// Build a grid from 1D axis samples, so that `X[[i, j]] = xs[j]` and
    /// `Y[[i, j]] = ys[i]`.
    pub fn meshgrid<SX, SY>(
        xs: &nd::ArrayBase<SX, nd::Ix1>,
        ys: &nd::ArrayBase<SY, nd::Ix1>,
    ) -> PatternResult<Self>
    where
        SX: nd::Data<Elem = f64>,
        SY: nd::Data<Elem = f64>,
    {
        let shape = (ys.len(), xs.len());
        let x: nd::Array2<f64>
            = nd::Array2::from_shape_fn(shape, |(_, j)| xs[j]);
        let y: nd::Array2<f64>
            = nd::Array2::from_shape_fn(shape, |(i, _)| ys[i]);
        Self::new(x, y)
    }

    /// Build a grid of `nx × ny` evenly spaced samples covering the closed
    /// rectangle `[x0, x1] × [y0, y1]`.
    pub fn linspace(
        x_range: (f64, f64),
        y_range: (f64, f64),
        nx: usize,
        ny: usize,
    ) -> PatternResult<Self>
    {
        if nx == 0 || ny == 0 { return Err(PatternError::EmptyGrid); }
        let xs = nd::Array1::linspace(x_range.0, x_range.1, nx);
        let ys = nd::Array1::linspace(y_range.0, y_range.1, ny);
        Self::meshgrid(&xs, &ys)
    }

    /// Both axes span `[-1, 1]` regardless of sample counts.
    pub fn square(nx: usize, ny: usize) -> PatternResult<Self> {
        Self::linspace((-1.0, 1.0), (-1.0, 1.0), nx, ny)
    }

    /// The axis with more samples spans `[-1, 1]`; the other is scaled by the
    /// ratio of sample counts so that both axes share a sample pitch.
    pub fn aspect_corrected(nx: usize, ny: usize) -> PatternResult<Self> {
        if nx == 0 || ny == 0 { return Err(PatternError::EmptyGrid); }
        let long = nx.max(ny) as f64;
        let ax = nx as f64 / long;
        let ay = ny as f64 / long;
        Self::linspace((-ax, ax), (-ay, ay), nx, ny)
    }

    /// X-coordinate array.
    pub fn x(&self) -> &nd::Array2<f64> { &self.x }

    /// Y-coordinate array.
    pub fn y(&self) -> &nd::Array2<f64> { &self.y }

    /// Shape of the grid as `(rows, columns)`, i.e. `(ny, nx)`.
    pub fn dim(&self) -> (usize, usize) { self.x.dim() }

    /// Shape of the grid as a slice.
    pub fn shape(&self) -> &[usize] { self.x.shape() }

    /// Total number of samples.
    pub fn len(&self) -> usize { self.x.len() }

    /// Always `false`; empty grids cannot be constructed.
    pub fn is_empty(&self) -> bool { self.x.is_empty() }

    /// Distance of every sample from the origin.
    pub fn radius(&self) -> nd::Array2<f64> {
        nd::Zip::from(self.x()).and(self.y())
            .par_map_collect(|&x, &y| x.hypot(y))
    }

    /// Azimuthal angle of every sample, `atan2(y, x)` in `[-π, π]`.
    pub fn azimuth(&self) -> nd::Array2<f64> {
        nd::Zip::from(self.x()).and(self.y())
            .par_map_collect(|&x, &y| y.atan2(x))
    }

    /// `true` at samples lying on or inside the unit circle.
    pub fn unit_disk(&self) -> nd::Array2<bool> {
        nd::Zip::from(self.x()).and(self.y())
            .par_map_collect(|&x, &y| x * x + y * y <= 1.0)
    }

    /// Return an error unless `field` has the same shape as `self`.
    pub fn check_shape<S>(&self, field: &nd::ArrayBase<S, nd::Ix2>)
        -> PatternResult<()>
    where S: nd::RawData
    {
        if field.shape() == self.shape() {
            Ok(())
        } else {
            Err(PatternError::FieldShape {
                field: field.shape().to_vec(),
                expected: self.shape().to_vec(),
            })
        }
    }
}
