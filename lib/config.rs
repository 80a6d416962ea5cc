//! Session files.
//!
//! A session is a TOML document describing the sampling grid, the patterns
//! to superpose, the Zernike correction, and output options:
//!
//! ```toml
//! [grid]
//! width = 1280
//! height = 1024
//! aspect = true
//!
//! [[patterns]]
//! charge = 1
//! k = [40.0, 0.0]
//!
//! [[zernike]]
//! noll = 4
//! weight = 0.5
//!
//! [correction]
//! clip = true
//!
//! [output]
//! levels = 256
//! ```
//!
//! Every table and field is optional.

use std::path::Path;
use serde::{ Deserialize, Serialize };
use crate::{
    compose::PhaseComposer,
    error::{ PatternError, PatternResult },
    grid::Grid,
    pattern::PatternSet,
    zernike::{ ZernikeMode, ZernikeWeights },
};

/// Sampling grid description.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Number of samples along *x*.
    pub width: usize,
    /// Number of samples along *y*.
    pub height: usize,
    /// If `true`, the longer axis spans `[-1, 1]` and the shorter is scaled
    /// to keep the sample pitch equal; otherwise both axes span `[-1, 1]`.
    pub aspect: bool,
}

impl Default for GridConfig {
    fn default() -> Self { Self { width: 1280, height: 1024, aspect: true } }
}

impl GridConfig {
    /// Build the described grid.
    pub fn build(&self) -> PatternResult<Grid> {
        if self.aspect {
            Grid::aspect_corrected(self.width, self.height)
        } else {
            Grid::square(self.width, self.height)
        }
    }
}

/// A single weighted Zernike term, identified by exactly one of `(m, n)`, a
/// Noll index, or an ANSI index.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZernikeTerm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noll: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ansi: Option<u64>,
    pub weight: f64,
}

impl ZernikeTerm {
    /// Resolve the mode named by this term.
    pub fn mode(&self) -> PatternResult<ZernikeMode> {
        match (self.m, self.n, self.noll, self.ansi) {
            (Some(m), Some(n), None, None) => ZernikeMode::new(m, n),
            (None, None, Some(j), None) => ZernikeMode::from_noll(j),
            (None, None, None, Some(j)) => ZernikeMode::from_ansi(j),
            _ => Err(PatternError::ModeSelection),
        }
    }
}

/// Options for the Zernike correction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorrectionConfig {
    /// Confine the correction to the unit disk.
    pub clip: bool,
}

/// Output options.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Number of gray levels in the quantized pattern.
    pub levels: u32,
}

impl Default for OutputConfig {
    fn default() -> Self { Self { levels: 256 } }
}

/// A complete session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub grid: GridConfig,
    pub patterns: PatternSet,
    pub zernike: Vec<ZernikeTerm>,
    pub correction: CorrectionConfig,
    pub output: OutputConfig,
}

impl SessionConfig {
    /// Parse a session from TOML text.
    pub fn from_toml_str(s: &str) -> PatternResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a session file.
    pub fn from_file<P>(path: P) -> PatternResult<Self>
    where P: AsRef<Path>
    {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading session");
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Build the session's grid.
    pub fn grid(&self) -> PatternResult<Grid> { self.grid.build() }

    /// Resolve all Zernike terms, failing on the first invalid one.
    ///
    /// Repeated modes keep their first position and take the last weight.
    pub fn weights(&self) -> PatternResult<ZernikeWeights> {
        let mut weights = ZernikeWeights::new();
        for term in self.zernike.iter() {
            weights.set(term.mode()?, term.weight);
        }
        Ok(weights)
    }

    /// Assemble the session's [`PhaseComposer`].
    pub fn composer(&self) -> PatternResult<PhaseComposer> {
        Ok(
            PhaseComposer::new(self.patterns.clone(), self.weights()?)
                .with_clip(self.correction.clip)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = r#"
        [grid]
        width = 64
        height = 48
        aspect = false

        [[patterns]]
        charge = 1
        k = [40.0, 0.0]

        [[patterns]]
        amplitude = 0.5
        charge = -2
        centre = [0.2, 0.1]
        phase = 1.5

        [[zernike]]
        noll = 4
        weight = 0.5

        [[zernike]]
        m = -2
        n = 2
        weight = -0.1

        [[zernike]]
        ansi = 12
        weight = 0.05

        [correction]
        clip = true

        [output]
        levels = 1024
    "#;

    #[test]
    fn empty_session_uses_defaults() {
        let session = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(session, SessionConfig::default());
        assert_eq!(session.grid().unwrap().dim(), (1024, 1280));
        assert!(session.composer().unwrap().patterns.is_empty());
        assert_eq!(session.output.levels, 256);
    }

    #[test]
    fn full_session() {
        let session = SessionConfig::from_toml_str(SESSION).unwrap();
        assert_eq!(session.grid().unwrap().dim(), (48, 64));
        assert_eq!(session.patterns.len(), 2);
        assert_eq!(session.patterns[0].amplitude, 1.0);
        assert_eq!(session.patterns[1].charge, -2);
        assert_eq!(session.patterns[1].centre, [0.2, 0.1]);
        let composer = session.composer().unwrap();
        assert!(composer.clip);
        let modes: Vec<(i32, u32)>
            = composer.weights.keys().map(|m| (m.m(), m.n())).collect();
        assert_eq!(modes, vec![(0, 2), (-2, 2), (0, 4)]);
        assert_eq!(session.output.levels, 1024);
    }

    #[test]
    fn bad_mode_selections_are_rejected() {
        let both = "[[zernike]]\nm = 0\nn = 2\nnoll = 4\nweight = 1.0";
        let session = SessionConfig::from_toml_str(both).unwrap();
        assert!(matches!(session.composer(), Err(PatternError::ModeSelection)));
        let half = "[[zernike]]\nm = 0\nweight = 1.0";
        let session = SessionConfig::from_toml_str(half).unwrap();
        assert!(matches!(session.weights(), Err(PatternError::ModeSelection)));
        let invalid = "[[zernike]]\nm = 3\nn = 1\nweight = 1.0";
        let session = SessionConfig::from_toml_str(invalid).unwrap();
        assert!(matches!(
            session.weights(),
            Err(PatternError::InvalidZernike { m: 3, n: 1 })
        ));
    }

    #[test]
    fn unknown_fields_are_errors() {
        assert!(matches!(
            SessionConfig::from_toml_str("[grid]\nwidht = 3"),
            Err(PatternError::Config(_))
        ));
    }

    #[test]
    fn misspelled_pattern_fields_are_errors() {
        assert!(matches!(
            SessionConfig::from_toml_str("[[patterns]]\ncharg = 3\n"),
            Err(PatternError::Config(_))
        ));
        let cfg = SessionConfig::from_toml_str("[[patterns]]\ncharge = 3\n").unwrap();
        assert_eq!(cfg.patterns[0].charge, 3);
    }
}
