//! Error type shared across the crate.

use thiserror::Error;

/// Everything that can go wrong while building grids, Zernike modes, or
/// sessions.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The two coordinate arrays of a grid do not have the same shape.
    #[error("grid coordinate arrays have mismatched shapes {x:?} and {y:?}")]
    GridShape { x: Vec<usize>, y: Vec<usize> },

    /// A grid was requested with zero samples along some axis.
    #[error("grid must have at least one sample along each axis")]
    EmptyGrid,

    /// Zernike indices outside `n >= 0`, `|m| <= n`.
    #[error("invalid Zernike indices (m = {m}, n = {n}): require n >= 0 and |m| <= n")]
    InvalidZernike { m: i64, n: i64 },

    /// A radial coefficient does not fit in 128 bits.
    #[error("radial coefficient overflow for Zernike indices (m = {m}, n = {n})")]
    CoefficientOverflow { m: u32, n: u32 },

    /// Single-index mode numbers start at 1 (Noll) or 0 (ANSI) and must map
    /// to representable indices.
    #[error("invalid {convention} index {j}")]
    InvalidModeIndex { convention: &'static str, j: u64 },

    /// A Zernike term in a session file names no mode, or more than one.
    #[error("Zernike term must give exactly one of (m, n), noll, or ansi")]
    ModeSelection,

    /// Two arrays that must share a shape do not.
    #[error("field shape {field:?} does not match expected shape {expected:?}")]
    FieldShape { field: Vec<usize>, expected: Vec<usize> },

    /// A disk quadrature rule needs at least one node along each axis.
    #[error("quadrature node counts must be nonzero (radial {n_r}, angular {n_theta})")]
    QuadratureNodes { n_r: usize, n_theta: usize },

    /// Quantization needs at least two gray levels and at most 2^16.
    #[error("invalid number of gray levels {0}; must be in 2..=65536")]
    Levels(u32),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("npz write error: {0}")]
    Npz(#[from] ndarray_npy::WriteNpzError),
}

pub type PatternResult<T> = Result<T, PatternError>;
