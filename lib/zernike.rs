//! Zernike polynomials over Cartesian coordinates.
//!
//! Modes are indexed by radial order `n ≥ 0` and azimuthal order `m` with
//! `|m| ≤ n`, and normalized so that
//! ```text
//! ∫∫_disk Z(m, n) Z(m', n') dA / π = δ(m, m') δ(n, n')
//! ```
//! Modes with odd `n - |m|` are accepted but vanish identically. Evaluation is
//! *not* restricted to the unit disk unless explicitly requested.

use std::{
    ops::{ Deref, DerefMut },
    sync::Arc,
};
use indexmap::IndexMap;
use ndarray as nd;
use num_complex::Complex64 as C64;
use rustc_hash::FxHashMap;
use crate::{
    error::{ PatternError, PatternResult },
    grid::Grid,
};

/* Modes **********************************************************************/

/// A single Zernike mode `(m, n)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZernikeMode {
    m: i32,
    n: u32,
}

impl ZernikeMode {
    /// Create a new mode, failing unless `n ≥ 0` and `|m| ≤ n`.
    pub fn new(m: i32, n: i32) -> PatternResult<Self> {
        if n < 0 || i64::from(m).abs() > i64::from(n) {
            return Err(PatternError::InvalidZernike {
                m: i64::from(m),
                n: i64::from(n),
            });
        }
        Ok(Self { m, n: n as u32 })
    }

    /// Azimuthal index.
    pub fn m(self) -> i32 { self.m }

    /// Radial index.
    pub fn n(self) -> u32 { self.n }

    /// Magnitude of the azimuthal index.
    pub fn abs_m(self) -> u32 { self.m.unsigned_abs() }

    /// Return `true` if `n - |m|` is odd, in which case the radial polynomial
    /// (and therefore the whole mode) is identically zero.
    pub fn is_degenerate(self) -> bool { (self.n - self.abs_m()) % 2 == 1 }

    /// Normalization factor for orthonormality over the unit disk.
    pub fn norm(self) -> f64 {
        if self.m == 0 {
            f64::from(self.n + 1).sqrt()
        } else {
            (2.0 * f64::from(self.n + 1)).sqrt()
        }
    }

    /// Convert from a Noll index, `j ≥ 1`.
    ///
    /// Even `j` map to cosine (`m > 0`) modes and odd `j` to sine (`m < 0`)
    /// modes, with `m = 0` modes taking whichever parity falls at the start of
    /// their row.
    pub fn from_noll(j: u64) -> PatternResult<Self> {
        let bad = PatternError::InvalidModeIndex { convention: "Noll", j };
        if j == 0 { return Err(bad); }
        let n = row_containing(u128::from(j), |n| (n + 1) * (n + 2) / 2);
        let p = u128::from(j) - n * (n + 1) / 2 - 1;
        let abs_m
            = if n % 2 == 0 { 2 * ((p + 1) / 2) } else { 2 * (p / 2) + 1 };
        if n > i32::MAX as u128 { return Err(bad); }
        let m = if abs_m != 0 && j % 2 == 1 { -(abs_m as i64) } else { abs_m as i64 };
        Self::new(m as i32, n as i32)
    }

    /// Convert to a Noll index. Degenerate modes have none.
    pub fn to_noll(self) -> Option<u64> {
        if self.is_degenerate() { return None; }
        let n = u128::from(self.n);
        let base = n * (n + 1) / 2;
        let abs_m = u128::from(self.abs_m());
        if abs_m == 0 {
            return u64::try_from(base + 1).ok();
        }
        // the two row positions holding |m| are |m| - 1 and |m|
        let j0 = base + abs_m;
        let want_even = self.m > 0;
        let j = if (j0 % 2 == 0) == want_even { j0 } else { j0 + 1 };
        u64::try_from(j).ok()
    }

    /// Convert from an OSA/ANSI index, `j ≥ 0`, where
    /// `j = (n (n + 2) + m) / 2`.
    pub fn from_ansi(j: u64) -> PatternResult<Self> {
        let bad = PatternError::InvalidModeIndex { convention: "ANSI", j };
        let n = row_containing(u128::from(j) + 1, |n| n * (n + 3) / 2 + 1);
        if n > i32::MAX as u128 { return Err(bad); }
        let m = 2 * i128::from(j) - (n * (n + 2)) as i128;
        Self::new(m as i32, n as i32)
    }

    /// Convert to an OSA/ANSI index. Degenerate modes have none.
    pub fn to_ansi(self) -> Option<u64> {
        if self.is_degenerate() { return None; }
        let n = i128::from(self.n);
        u64::try_from((n * (n + 2) + i128::from(self.m)) / 2).ok()
    }

    /// All non-degenerate modes with radial order at most `n_max`, in ANSI
    /// order.
    pub fn all_up_to(n_max: u32) -> Vec<Self> {
        (0..=n_max as i32)
            .flat_map(|n| {
                (-n..=n).step_by(2).map(move |m| Self { m, n: n as u32 })
            })
            .collect()
    }

    /// Conventional name of the aberration, for low orders.
    pub fn name(self) -> Option<&'static str> {
        match (self.m, self.n) {
            (0, 0) => Some("piston"),
            (-1, 1) => Some("vertical tilt"),
            (1, 1) => Some("horizontal tilt"),
            (-2, 2) => Some("oblique astigmatism"),
            (0, 2) => Some("defocus"),
            (2, 2) => Some("vertical astigmatism"),
            (-3, 3) => Some("vertical trefoil"),
            (-1, 3) => Some("vertical coma"),
            (1, 3) => Some("horizontal coma"),
            (3, 3) => Some("oblique trefoil"),
            (-4, 4) => Some("oblique quadrafoil"),
            (-2, 4) => Some("oblique secondary astigmatism"),
            (0, 4) => Some("primary spherical"),
            (2, 4) => Some("vertical secondary astigmatism"),
            (4, 4) => Some("vertical quadrafoil"),
            _ => None,
        }
    }
}

impl TryFrom<(i32, i32)> for ZernikeMode {
    type Error = PatternError;

    fn try_from(mn: (i32, i32)) -> PatternResult<Self> {
        let (m, n) = mn;
        Self::new(m, n)
    }
}

impl std::fmt::Display for ZernikeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Z(m={}, n={})", self.m, self.n)
    }
}

// smallest n such that `end(n) >= j`, where `end` is increasing
fn row_containing<F>(j: u128, end: F) -> u128
where F: Fn(u128) -> u128
{
    let mut n = ((2.0 * j as f64).sqrt() as u128).saturating_sub(1);
    while n > 0 && end(n - 1) >= j { n -= 1; }
    while end(n) < j { n += 1; }
    n
}

/* Radial polynomials *********************************************************/

fn binomial(a: u32, b: u32) -> Option<u128> {
    if b > a { return Some(0); }
    let b = b.min(a - b);
    let mut acc: u128 = 1;
    for i in 0..b {
        acc = acc.checked_mul(u128::from(a - i))? / u128::from(i + 1);
    }
    Some(acc)
}

/// Coefficients of the radial polynomial `R(m, n)(r) = Σ c r^p` as
/// `(c, p)` pairs in order of decreasing power.
///
/// Requires `n ≥ m`. If `n - m` is odd the polynomial is identically zero and
/// the returned list is empty.
///
/// Each coefficient
/// ```text
/// (-1)^l (n - l)! / (l! ((n + m)/2 - l)! ((n - m)/2 - l)!)
/// ```
/// is computed exactly as the integer `C(n - l, l) C(n - 2l, (n - m)/2 - l)`;
/// an error is returned if it does not fit in 128 bits.
pub fn radial_coefficients(m: u32, n: u32) -> PatternResult<Vec<(f64, u32)>> {
    if m > n {
        return Err(PatternError::InvalidZernike {
            m: i64::from(m),
            n: i64::from(n),
        });
    }
    if (n - m) % 2 == 1 { return Ok(Vec::new()); }
    let half = (n - m) / 2;
    (0..=half)
        .map(|l| -> PatternResult<(f64, u32)> {
            let mag
                = binomial(n - l, l)
                .and_then(|a| {
                    binomial(n - 2 * l, half - l)
                        .and_then(|b| a.checked_mul(b))
                })
                .ok_or(PatternError::CoefficientOverflow { m, n })?;
            let sign = if l % 2 == 0 { 1.0 } else { -1.0 };
            Ok((sign * mag as f64, n - 2 * l))
        })
        .filter(|term| !matches!(term, Ok((c, _)) if *c == 0.0))
        .collect()
}

/* Evaluation *****************************************************************/

/// A single Zernike polynomial, ready for evaluation.
///
/// Holds only the mode, its normalization, and its radial coefficients, so
/// equal modes always evaluate identically.
#[derive(Clone, Debug, PartialEq)]
pub struct Zernike {
    mode: ZernikeMode,
    norm: f64,
    radial: Vec<(f64, u32)>,
}

impl Zernike {
    /// Prepare a mode for evaluation.
    pub fn new(mode: ZernikeMode) -> PatternResult<Self> {
        let radial = radial_coefficients(mode.abs_m(), mode.n())?;
        Ok(Self { mode, norm: mode.norm(), radial })
    }

    /// Return the mode.
    pub fn mode(&self) -> ZernikeMode { self.mode }

    /// Return the `(coefficient, power)` terms of the radial polynomial.
    pub fn radial_terms(&self) -> &[(f64, u32)] { &self.radial }

    /// Evaluate the (unnormalized) radial polynomial.
    pub fn radial_at(&self, r: f64) -> f64 {
        self.radial.iter()
            .map(|&(c, p)| c * r.powi(p as i32))
            .sum()
    }

    /// Evaluate in polar coordinates.
    pub fn eval_polar(&self, r: f64, theta: f64) -> f64 {
        if self.radial.is_empty() { return 0.0; }
        let arg = f64::from(self.mode.abs_m()) * theta;
        let angular = if self.mode.m() < 0 { arg.sin() } else { arg.cos() };
        self.norm * self.radial_at(r) * angular
    }

    /// Evaluate at a single Cartesian point.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        self.eval_polar(x.hypot(y), y.atan2(x))
    }

    /// Evaluate over arbitrary equal-shape coordinate arrays.
    pub fn evaluate<SX, SY, D>(
        &self,
        x: &nd::ArrayBase<SX, D>,
        y: &nd::ArrayBase<SY, D>,
    ) -> PatternResult<nd::Array<f64, D>>
    where
        SX: nd::Data<Elem = f64>,
        SY: nd::Data<Elem = f64>,
        D: nd::Dimension,
    {
        if x.shape() != y.shape() {
            return Err(PatternError::FieldShape {
                field: y.shape().to_vec(),
                expected: x.shape().to_vec(),
            });
        }
        Ok(
            nd::Zip::from(x).and(y)
                .par_map_collect(|&x, &y| self.eval(x, y))
        )
    }

    /// Evaluate over a grid, without restriction to the unit disk.
    pub fn build(&self, grid: &Grid) -> nd::Array2<f64> {
        nd::Zip::from(grid.x()).and(grid.y())
            .par_map_collect(|&x, &y| self.eval(x, y))
    }

    /// Evaluate over a grid, setting samples outside the unit disk to zero.
    pub fn build_clipped(&self, grid: &Grid) -> nd::Array2<f64> {
        nd::Zip::from(grid.x()).and(grid.y())
            .par_map_collect(|&x, &y| {
                if x * x + y * y <= 1.0 { self.eval(x, y) } else { 0.0 }
            })
    }
}

/// Prepare the Zernike polynomial with azimuthal index `m` and radial index
/// `n` for evaluation over Cartesian coordinates.
pub fn zernike_cartesian(m: i32, n: i32) -> PatternResult<Zernike> {
    Zernike::new(ZernikeMode::new(m, n)?)
}

/// Memoized Zernike fields over a single grid.
#[derive(Clone, Debug)]
pub struct ZernikeCache {
    grid: Grid,
    fields: FxHashMap<(ZernikeMode, bool), Arc<nd::Array2<f64>>>,
}

impl ZernikeCache {
    /// Create a new, empty cache for `grid`.
    pub fn new(grid: Grid) -> Self {
        Self { grid, fields: FxHashMap::default() }
    }

    /// Return a reference to the grid.
    pub fn grid(&self) -> &Grid { &self.grid }

    /// Number of fields currently stored.
    pub fn len(&self) -> usize { self.fields.len() }

    /// Return `true` if no fields are stored.
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    /// Drop all stored fields.
    pub fn clear(&mut self) { self.fields.clear(); }

    /// Get the field for `mode`, computing and storing it on first use.
    ///
    /// If `clip` is `true`, the field is zero outside the unit disk.
    pub fn field(&mut self, mode: ZernikeMode, clip: bool)
        -> PatternResult<Arc<nd::Array2<f64>>>
    {
        if let Some(field) = self.fields.get(&(mode, clip)) {
            return Ok(Arc::clone(field));
        }
        tracing::debug!(m = mode.m(), n = mode.n(), clip, "computing zernike field");
        let z = Zernike::new(mode)?;
        let field
            = Arc::new(
                if clip { z.build_clipped(&self.grid) } else { z.build(&self.grid) }
            );
        self.fields.insert((mode, clip), Arc::clone(&field));
        Ok(field)
    }
}

/* Weighted corrections *******************************************************/

/// Insertion-ordered mapping from Zernike modes to real weights.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZernikeWeights(IndexMap<ZernikeMode, f64>);

impl AsRef<IndexMap<ZernikeMode, f64>> for ZernikeWeights {
    fn as_ref(&self) -> &IndexMap<ZernikeMode, f64> { &self.0 }
}

impl Deref for ZernikeWeights {
    type Target = IndexMap<ZernikeMode, f64>;

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl DerefMut for ZernikeWeights {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.0 }
}

impl FromIterator<(ZernikeMode, f64)> for ZernikeWeights {
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = (ZernikeMode, f64)>
    {
        Self(iter.into_iter().collect())
    }
}

impl ZernikeWeights {
    /// Create a new, empty set of weights.
    pub fn new() -> Self { Self::default() }

    /// Set the weight of `mode`, returning the previous weight if any.
    ///
    /// Re-weighting a mode keeps its original position.
    pub fn set(&mut self, mode: ZernikeMode, weight: f64) -> Option<f64> {
        self.0.insert(mode, weight)
    }

    /// Remove `mode`, preserving the order of the remaining modes.
    pub fn unset(&mut self, mode: ZernikeMode) -> Option<f64> {
        self.0.shift_remove(&mode)
    }

    /// Weighted sum `Σ w Z` over the cache's grid.
    ///
    /// Zero weights and degenerate modes are skipped.
    pub fn correction_field(&self, cache: &mut ZernikeCache, clip: bool)
        -> PatternResult<nd::Array2<f64>>
    {
        let mut acc: nd::Array2<f64> = nd::Array2::zeros(cache.grid().dim());
        for (&mode, &w) in self.0.iter() {
            if w == 0.0 || mode.is_degenerate() { continue; }
            let z = cache.field(mode, clip)?;
            acc.scaled_add(w, &*z);
        }
        Ok(acc)
    }

    /// Unit-magnitude phasor `exp(i Σ w Z)` over the cache's grid.
    pub fn correction_phasor(&self, cache: &mut ZernikeCache, clip: bool)
        -> PatternResult<nd::Array2<C64>>
    {
        Ok(self.correction_field(cache, clip)?.mapv(C64::cis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(m: i32, n: i32) -> ZernikeMode { ZernikeMode::new(m, n).unwrap() }

    #[test]
    fn radial_coefficients_match_closed_forms() {
        assert_eq!(radial_coefficients(0, 0).unwrap(), vec![(1.0, 0)]);
        assert_eq!(radial_coefficients(1, 1).unwrap(), vec![(1.0, 1)]);
        assert_eq!(radial_coefficients(0, 2).unwrap(), vec![(2.0, 2), (-1.0, 0)]);
        assert_eq!(radial_coefficients(1, 3).unwrap(), vec![(3.0, 3), (-2.0, 1)]);
        assert_eq!(
            radial_coefficients(0, 4).unwrap(),
            vec![(6.0, 4), (-6.0, 2), (1.0, 0)],
        );
        assert_eq!(
            radial_coefficients(2, 6).unwrap(),
            vec![(15.0, 6), (-20.0, 4), (6.0, 2)],
        );
        assert_eq!(
            radial_coefficients(0, 6).unwrap(),
            vec![(20.0, 6), (-30.0, 4), (12.0, 2), (-1.0, 0)],
        );
    }

    #[test]
    fn radial_polynomials_are_one_at_the_rim() {
        for n in 0..=20_u32 {
            for m in (n % 2..=n).step_by(2) {
                let total: f64
                    = radial_coefficients(m, n).unwrap()
                    .iter()
                    .map(|(c, _)| c)
                    .sum();
                assert_eq!(total, 1.0, "R({}, {})(1)", m, n);
            }
        }
    }

    #[test]
    fn odd_parity_and_bad_indices() {
        assert!(radial_coefficients(0, 1).unwrap().is_empty());
        assert!(matches!(
            radial_coefficients(3, 1),
            Err(PatternError::InvalidZernike { m: 3, n: 1 })
        ));
        assert!(matches!(
            ZernikeMode::new(0, -1),
            Err(PatternError::InvalidZernike { .. })
        ));
        assert!(matches!(
            ZernikeMode::new(-3, 2),
            Err(PatternError::InvalidZernike { .. })
        ));
        assert!(ZernikeMode::new(i32::MIN, i32::MAX).is_err());
        assert!(mode(0, 1).is_degenerate());
        assert!(!mode(-2, 4).is_degenerate());
    }

    #[test]
    fn very_high_orders_report_overflow() {
        assert!(matches!(
            radial_coefficients(0, 300),
            Err(PatternError::CoefficientOverflow { m: 0, n: 300 })
        ));
        assert!(radial_coefficients(0, 60).is_ok());
    }

    #[test]
    fn piston_is_one_everywhere() {
        let grid = Grid::square(11, 7).unwrap();
        let z = zernike_cartesian(0, 0).unwrap().build(&grid);
        assert_eq!(z.dim(), grid.dim());
        assert!(z.iter().all(|v| *v == 1.0));
    }

    #[test]
    fn degenerate_modes_are_zero() {
        let grid = Grid::square(6, 6).unwrap();
        for (m, n) in [(0, 1), (1, 2), (-2, 5), (0, 3)] {
            let z = zernike_cartesian(m, n).unwrap();
            assert!(z.build(&grid).iter().all(|v| *v == 0.0));
            assert_eq!(z.eval(0.3, -0.2), 0.0);
        }
    }

    #[test]
    fn known_values() {
        let defocus = zernike_cartesian(0, 2).unwrap();
        assert!((defocus.eval(1.0, 0.0) - 3.0_f64.sqrt()).abs() < 1e-12);
        assert!((defocus.eval(0.0, 0.0) + 3.0_f64.sqrt()).abs() < 1e-12);
        let tilt_x = zernike_cartesian(1, 1).unwrap();
        let tilt_y = zernike_cartesian(-1, 1).unwrap();
        assert!((tilt_x.eval(0.5, 0.0) - 1.0).abs() < 1e-12);
        assert!(tilt_x.eval(0.0, 0.5).abs() < 1e-12);
        assert!((tilt_y.eval(0.0, 0.5) - 1.0).abs() < 1e-12);
        let astig = zernike_cartesian(2, 2).unwrap();
        // sqrt(6) r² cos 2θ = sqrt(6) (x² - y²)
        let (x, y) = (0.3, -0.4);
        assert!((astig.eval(x, y) - 6.0_f64.sqrt() * (x * x - y * y)).abs() < 1e-12);
        // evaluation continues outside the unit disk
        assert!((defocus.eval(2.0, 0.0) - 3.0_f64.sqrt() * 7.0).abs() < 1e-12);
    }

    #[test]
    fn evaluate_accepts_any_matching_shape() {
        let z = zernike_cartesian(-1, 3).unwrap();
        let x = nd::array![0.1, 0.2, 0.3];
        let y = nd::array![0.0, -0.5, 0.7];
        let v = z.evaluate(&x, &y).unwrap();
        for k in 0..3 {
            assert_eq!(v[k], z.eval(x[k], y[k]));
        }
        let short = nd::array![0.0, 1.0];
        assert!(matches!(
            z.evaluate(&x, &short),
            Err(PatternError::FieldShape { .. })
        ));
    }

    #[test]
    fn clipping_zeroes_outside_the_disk() {
        let grid = Grid::square(9, 9).unwrap();
        let z = zernike_cartesian(0, 2).unwrap();
        let clipped = z.build_clipped(&grid);
        let full = z.build(&grid);
        let disk = grid.unit_disk();
        for ((c, f), inside) in clipped.iter().zip(full.iter()).zip(disk.iter()) {
            if *inside { assert_eq!(c, f); } else { assert_eq!(*c, 0.0); }
        }
    }

    #[test]
    fn noll_indices() {
        let expected = [
            (0, 0), (1, 1), (-1, 1), (0, 2), (-2, 2), (2, 2),
            (-1, 3), (1, 3), (-3, 3), (3, 3), (0, 4),
        ];
        for (k, &(m, n)) in expected.iter().enumerate() {
            let j = k as u64 + 1;
            assert_eq!(ZernikeMode::from_noll(j).unwrap(), mode(m, n), "j = {}", j);
            assert_eq!(mode(m, n).to_noll(), Some(j));
        }
        for j in 1..=500 {
            assert_eq!(ZernikeMode::from_noll(j).unwrap().to_noll(), Some(j));
        }
        assert!(ZernikeMode::from_noll(0).is_err());
        assert_eq!(mode(0, 1).to_noll(), None);
    }

    #[test]
    fn ansi_indices() {
        let expected = [(0, 0), (-1, 1), (1, 1), (-2, 2), (0, 2), (2, 2), (-3, 3)];
        for (j, &(m, n)) in expected.iter().enumerate() {
            assert_eq!(ZernikeMode::from_ansi(j as u64).unwrap(), mode(m, n));
            assert_eq!(mode(m, n).to_ansi(), Some(j as u64));
        }
        for j in 0..=500 {
            assert_eq!(ZernikeMode::from_ansi(j).unwrap().to_ansi(), Some(j));
        }
    }

    #[test]
    fn all_modes_up_to_order() {
        let modes = ZernikeMode::all_up_to(4);
        assert_eq!(modes.len(), 15);
        for (j, mode) in modes.iter().enumerate() {
            assert_eq!(mode.to_ansi(), Some(j as u64));
            assert!(!mode.is_degenerate());
        }
    }

    #[test]
    fn names_and_display() {
        assert_eq!(mode(0, 2).name(), Some("defocus"));
        assert_eq!(mode(0, 4).name(), Some("primary spherical"));
        assert_eq!(mode(1, 7).name(), None);
        assert_eq!(mode(-1, 3).to_string(), "Z(m=-1, n=3)");
    }

    #[test]
    fn cache_returns_shared_fields() {
        let grid = Grid::square(16, 16).unwrap();
        let mut cache = ZernikeCache::new(grid.clone());
        let a = cache.field(mode(2, 4), false).unwrap();
        let b = cache.field(mode(2, 4), false).unwrap();
        let c = cache.field(mode(2, 4), true).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
        assert_eq!(*a, zernike_cartesian(2, 4).unwrap().build(&grid));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn weighted_corrections() {
        let grid = Grid::square(8, 8).unwrap();
        let mut cache = ZernikeCache::new(grid.clone());
        let mut weights = ZernikeWeights::new();
        assert!(weights.correction_field(&mut cache, false).unwrap()
            .iter().all(|v| *v == 0.0));
        weights.set(mode(0, 2), 0.5);
        weights.set(mode(-2, 2), -0.25);
        weights.set(mode(0, 3), 10.0);
        let field = weights.correction_field(&mut cache, false).unwrap();
        let expected
            = 0.5 * zernike_cartesian(0, 2).unwrap().build(&grid)
            - 0.25 * zernike_cartesian(-2, 2).unwrap().build(&grid);
        for (f, e) in field.iter().zip(expected.iter()) {
            assert!((f - e).abs() < 1e-12);
        }
        let phasor = weights.correction_phasor(&mut cache, false).unwrap();
        assert!(phasor.iter().all(|z| (z.norm() - 1.0).abs() < 1e-12));
        assert_eq!(weights.set(mode(0, 2), 1.0), Some(0.5));
        assert_eq!(weights.unset(mode(0, 2)), Some(1.0));
        assert_eq!(weights.keys().next(), Some(&mode(-2, 2)));
    }
}
