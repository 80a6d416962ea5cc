//! Superpositions of optical vortices with linear phase ramps.
//!
//! A single pattern is the unit-magnitude field
//! ```text
//! exp(i (n atan2(y - cy, x - cx) + kx x + ky y + φ))
//! ```
//! where `n` is the topological charge, `(kx, ky)` the wavevector of the
//! blazed-grating ramp, `φ` a constant phase offset, and `(cx, cy)` the vortex
//! centre. Patterns are summed coherently, weighted by their amplitudes, and
//! the phase of the sum is what gets written to the modulator.

use std::ops::{ Deref, DerefMut };
use ndarray as nd;
use num_complex::Complex64 as C64;
use serde::{ Deserialize, Serialize };
use crate::{ compose::wrap_phase, grid::Grid };

/// Anything that can be evaluated to a complex field over a [`Grid`].
///
/// Implementors must return an array with the grid's shape.
pub trait FieldBuild {
    /// Evaluate the field at every sample of `grid`.
    fn build(&self, grid: &Grid) -> nd::Array2<C64>;

    /// Phase of [`Self::build`], in `(-π, π]`.
    fn build_phase(&self, grid: &Grid) -> nd::Array2<f64> {
        self.build(grid).mapv(|z| wrap_phase(z.arg()))
    }
}

fn unit_amplitude() -> f64 { 1.0 }

/// Parameters for a single vortex/plane-wave pattern.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternParams {
    /// Real weight in the coherent sum; any sign or magnitude.
    #[serde(default = "unit_amplitude")]
    pub amplitude: f64,
    /// Topological charge (winding number) of the vortex.
    #[serde(default)]
    pub charge: i32,
    /// Wavevector `[kx, ky]` of the linear phase ramp.
    #[serde(default)]
    pub k: [f64; 2],
    /// Constant phase offset (radians).
    #[serde(default)]
    pub phase: f64,
    /// Vortex centre `[cx, cy]` in grid coordinates.
    #[serde(default)]
    pub centre: [f64; 2],
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            charge: 0,
            k: [0.0, 0.0],
            phase: 0.0,
            centre: [0.0, 0.0],
        }
    }
}

impl PatternParams {
    /// Create a new set of pattern parameters.
    pub fn new(
        amplitude: f64,
        charge: i32,
        k: [f64; 2],
        phase: f64,
        centre: [f64; 2],
    ) -> Self
    {
        Self { amplitude, charge, k, phase, centre }
    }

    /// Unit-amplitude vortex of charge `charge` centred on the origin.
    pub fn vortex(charge: i32) -> Self {
        Self { charge, ..Self::default() }
    }

    /// Unit-amplitude plane wave (no vortex) with wavevector `k`.
    pub fn plane_wave(k: [f64; 2]) -> Self {
        Self { k, ..Self::default() }
    }

    /// Return a copy with a different amplitude.
    pub fn with_amplitude(self, amplitude: f64) -> Self {
        Self { amplitude, ..self }
    }

    /// Return a copy with a different wavevector.
    pub fn with_k(self, k: [f64; 2]) -> Self { Self { k, ..self } }

    /// Return a copy with a different phase offset.
    pub fn with_phase(self, phase: f64) -> Self { Self { phase, ..self } }

    /// Return a copy with a different vortex centre.
    pub fn with_centre(self, centre: [f64; 2]) -> Self {
        Self { centre, ..self }
    }

    /// Total phase of the (unweighted) pattern at a single point.
    pub fn phase_at(&self, x: f64, y: f64) -> f64 {
        pattern_phase(x, y, self.charge, self.k, self.phase, self.centre)
    }

    /// Amplitude-weighted field at a single point.
    pub fn value_at(&self, x: f64, y: f64) -> C64 {
        C64::from_polar(self.amplitude, self.phase_at(x, y))
    }
}

impl FieldBuild for PatternParams {
    fn build(&self, grid: &Grid) -> nd::Array2<C64> {
        let mut field
            = generate_pattern(grid, self.charge, self.k, self.phase, self.centre);
        if self.amplitude != 1.0 {
            field *= C64::from(self.amplitude);
        }
        field
    }
}

impl From<(f64, i32, [f64; 2], f64, [f64; 2])> for PatternParams {
    fn from(args: (f64, i32, [f64; 2], f64, [f64; 2])) -> Self {
        let (amplitude, charge, k, phase, centre) = args;
        Self { amplitude, charge, k, phase, centre }
    }
}

#[inline]
fn pattern_phase(
    x: f64,
    y: f64,
    n: i32,
    k_vec: [f64; 2],
    phase: f64,
    centre: [f64; 2],
) -> f64
{
    f64::from(n) * (y - centre[1]).atan2(x - centre[0])
        + (k_vec[0] * x + k_vec[1] * y)
        + phase
}

/// Evaluate a single unit-magnitude pattern over a grid.
pub fn generate_pattern(
    grid: &Grid,
    n: i32,
    k_vec: [f64; 2],
    phase: f64,
    centre: [f64; 2],
) -> nd::Array2<C64>
{
    nd::Zip::from(grid.x()).and(grid.y())
        .par_map_collect(|&x, &y| {
            C64::cis(pattern_phase(x, y, n, k_vec, phase, centre))
        })
}

/// Amplitude-weighted coherent sum of patterns.
///
/// An empty parameter list gives a field of zeros with the grid's shape.
pub fn combine_patterns_no_angle(grid: &Grid, params: &[PatternParams])
    -> nd::Array2<C64>
{
    let mut acc: nd::Array2<C64> = nd::Array2::zeros(grid.dim());
    for p in params.iter() {
        let PatternParams { amplitude, charge, k, phase, centre } = *p;
        nd::Zip::from(&mut acc).and(grid.x()).and(grid.y())
            .par_for_each(|a, &x, &y| {
                *a += amplitude
                    * C64::cis(pattern_phase(x, y, charge, k, phase, centre));
            });
    }
    acc
}

/// Phase of the coherent sum of patterns, in `(-π, π]`.
///
/// An empty parameter list gives a field of zeros with the grid's shape.
pub fn combine_patterns(grid: &Grid, params: &[PatternParams])
    -> nd::Array2<f64>
{
    if params.is_empty() {
        return nd::Array2::zeros(grid.dim());
    }
    combine_patterns_no_angle(grid, params).mapv(|z| wrap_phase(z.arg()))
}

/// Ordered collection of patterns.
///
/// Order has no effect on the sum but is kept so that patterns can be
/// addressed by position.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternSet(Vec<PatternParams>);

impl AsRef<Vec<PatternParams>> for PatternSet {
    fn as_ref(&self) -> &Vec<PatternParams> { &self.0 }
}

impl AsMut<Vec<PatternParams>> for PatternSet {
    fn as_mut(&mut self) -> &mut Vec<PatternParams> { &mut self.0 }
}

impl Deref for PatternSet {
    type Target = Vec<PatternParams>;

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl DerefMut for PatternSet {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.0 }
}

impl PatternSet {
    /// Create a new, empty set.
    pub fn new() -> Self { Self::default() }

    /// Append a pattern, returning its position.
    pub fn add(&mut self, params: PatternParams) -> usize {
        self.0.push(params);
        self.0.len() - 1
    }

    /// Remove and return the pattern at position `k`, if it exists.
    pub fn take(&mut self, k: usize) -> Option<PatternParams> {
        (k < self.0.len()).then(|| self.0.remove(k))
    }

    /// Coherent sum of all patterns. See [`combine_patterns_no_angle`].
    pub fn combine_no_angle(&self, grid: &Grid) -> nd::Array2<C64> {
        combine_patterns_no_angle(grid, &self.0)
    }

    /// Phase of the coherent sum of all patterns. See [`combine_patterns`].
    pub fn combine(&self, grid: &Grid) -> nd::Array2<f64> {
        combine_patterns(grid, &self.0)
    }
}

impl FromIterator<PatternParams> for PatternSet {
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = PatternParams>
    {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<PatternParams>> for PatternSet {
    fn from(params: Vec<PatternParams>) -> Self { Self(params) }
}

impl FieldBuild for PatternSet {
    fn build(&self, grid: &Grid) -> nd::Array2<C64> {
        self.combine_no_angle(grid)
    }

    fn build_phase(&self, grid: &Grid) -> nd::Array2<f64> {
        self.combine(grid)
    }
}
