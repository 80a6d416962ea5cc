//! Composition of pattern superpositions with Zernike corrections, and the
//! mapping from phase to display gray levels.

use std::f64::consts::{ PI, TAU };
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    error::{ PatternError, PatternResult },
    pattern::PatternSet,
    zernike::{ ZernikeCache, ZernikeWeights },
};

/// Wrap an angle into `(-π, π]`.
///
/// Values already in range are returned unchanged.
pub fn wrap_phase(phi: f64) -> f64 {
    if phi > -PI && phi <= PI { return phi; }
    let w = phi.rem_euclid(TAU);
    if w > PI { w - TAU } else { w }
}

/// Map phases linearly onto `levels` integer gray levels, `-π ↦ 0` up to
/// `π ↦ levels - 1`, wrapping inputs into `(-π, π]` first.
pub fn quantize<S>(phase: &nd::ArrayBase<S, nd::Ix2>, levels: u32)
    -> PatternResult<nd::Array2<u16>>
where S: nd::Data<Elem = f64>
{
    if !(2..=65536).contains(&levels) {
        return Err(PatternError::Levels(levels));
    }
    let top = f64::from(levels - 1);
    let n = f64::from(levels);
    Ok(
        phase.mapv(|phi| {
            ((wrap_phase(phi) + PI) / TAU * n).floor().clamp(0.0, top) as u16
        })
    )
}

/// A complete phase-pattern description: a set of patterns, a Zernike
/// correction, and whether the correction is confined to the unit disk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhaseComposer {
    pub patterns: PatternSet,
    pub weights: ZernikeWeights,
    pub clip: bool,
}

impl PhaseComposer {
    /// Create a new composer without clipping.
    pub fn new(patterns: PatternSet, weights: ZernikeWeights) -> Self {
        Self { patterns, weights, clip: false }
    }

    /// Return a copy with Zernike clipping turned on or off.
    pub fn with_clip(self, clip: bool) -> Self { Self { clip, ..self } }

    /// Complex field `Σ a P · exp(i Σ w Z)` over the cache's grid.
    pub fn field(&self, cache: &mut ZernikeCache)
        -> PatternResult<nd::Array2<C64>>
    {
        let mut field = self.patterns.combine_no_angle(cache.grid());
        if !self.weights.is_empty() {
            let correction = self.weights.correction_field(cache, self.clip)?;
            nd::Zip::from(&mut field).and(&correction)
                .par_for_each(|z, &c| { *z *= C64::cis(c); });
        }
        Ok(field)
    }

    /// Phase of [`Self::field`], or zeros if there are no patterns.
    pub fn phase(&self, cache: &mut ZernikeCache)
        -> PatternResult<nd::Array2<f64>>
    {
        if self.patterns.is_empty() {
            return Ok(nd::Array2::zeros(cache.grid().dim()));
        }
        Ok(self.field(cache)?.mapv(|z| wrap_phase(z.arg())))
    }
}
