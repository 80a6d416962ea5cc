//! Phase-pattern synthesis for a phase-only spatial light modulator.
//!
//! Patterns are superpositions of optical vortices with linear (blazed
//! grating) phase ramps, optionally multiplied by a Zernike aberration
//! correction before the phase of the coherent sum is taken. Everything is
//! evaluated over an explicit, immutable [`Grid`][grid::Grid].

pub mod utils;
pub mod error;
pub mod grid;
pub mod pattern;
pub mod zernike;
pub mod quadrature;
pub mod compose;
pub mod recompute;
pub mod config;

pub use error::{ PatternError, PatternResult };
pub use grid::Grid;
pub use pattern::{
    FieldBuild,
    PatternParams,
    PatternSet,
    generate_pattern,
    combine_patterns,
    combine_patterns_no_angle,
};
pub use zernike::{
    Zernike,
    ZernikeCache,
    ZernikeMode,
    ZernikeWeights,
    radial_coefficients,
    zernike_cartesian,
};
pub use compose::{ PhaseComposer, quantize, wrap_phase };
