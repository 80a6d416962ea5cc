//! Numerical integration over the unit disk, used to verify the
//! orthonormality of Zernike modes.
//!
//! Integrals are taken in polar form,
//! ```text
//! ∫_0^1 ∫_0^2π f(r cos θ, r sin θ) r dθ dr
//! ```
//! with Gauss-Legendre nodes in `r` and a uniform (midpoint) rule in `θ`. The
//! radial rule with `N` nodes is exact for polynomials of degree `2N - 1` and
//! the angular rule with `M` nodes is exact for trigonometric polynomials of
//! degree below `M`, so products of Zernike modes are integrated exactly up to
//! rounding when the rule is sized with [`DiskQuadrature::for_order`].

use std::f64::consts::{ PI, TAU };
use itertools::Itertools;
use ndarray as nd;
use rayon::prelude::*;
use crate::{
    error::{ PatternError, PatternResult },
    zernike::{ Zernike, ZernikeMode },
};

/// Nodes and weights of the `n`-point Gauss-Legendre rule on `[-1, 1]`.
///
/// Nodes are found by Newton iteration on the three-term Legendre
/// recurrence and returned in ascending order.
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes: Vec<f64> = vec![0.0; n];
    let mut weights: Vec<f64> = vec![0.0; n];
    let nf = n as f64;
    for i in 0..(n + 1) / 2 {
        let mut x = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
        let mut dp: f64 = 0.0;
        for _ in 0..100 {
            let (p, dpx) = legendre_with_derivative(n, x);
            dp = dpx;
            let dx = p / dp;
            x -= dx;
            if dx.abs() < 1e-15 { break; }
        }
        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        nodes[i] = -x;
        nodes[n - 1 - i] = x;
        weights[i] = w;
        weights[n - 1 - i] = w;
    }
    (nodes, weights)
}

// P_n(x) and P_n'(x)
fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    if n == 0 { return (1.0, 0.0); }
    let mut p0: f64 = 1.0;
    let mut p1: f64 = x;
    for k in 2..=n {
        let kf = k as f64;
        let p2 = ((2.0 * kf - 1.0) * x * p1 - (kf - 1.0) * p0) / kf;
        p0 = p1;
        p1 = p2;
    }
    let dp = n as f64 * (x * p1 - p0) / (x * x - 1.0);
    (p1, dp)
}

/// Product rule over the unit disk.
#[derive(Clone, Debug, PartialEq)]
pub struct DiskQuadrature {
    r_nodes: Vec<f64>,
    r_weights: Vec<f64>,
    n_theta: usize,
}

impl DiskQuadrature {
    /// Create a rule with `n_r` radial and `n_theta` angular nodes, both
    /// nonzero.
    pub fn new(n_r: usize, n_theta: usize) -> PatternResult<Self> {
        if n_r == 0 || n_theta == 0 {
            return Err(PatternError::QuadratureNodes { n_r, n_theta });
        }
        Ok(Self::with_nodes(n_r, n_theta))
    }

    fn with_nodes(n_r: usize, n_theta: usize) -> Self {
        let (x, w) = gauss_legendre(n_r);
        // map [-1, 1] onto [0, 1]
        let r_nodes: Vec<f64> = x.iter().map(|xk| (xk + 1.0) / 2.0).collect();
        let r_weights: Vec<f64> = w.iter().map(|wk| wk / 2.0).collect();
        Self { r_nodes, r_weights, n_theta }
    }

    /// Smallest rule that integrates the product of any two modes of radial
    /// order at most `n_max` exactly.
    pub fn for_order(n_max: u32) -> Self {
        let n_max = n_max as usize;
        Self::with_nodes(n_max + 2, 2 * n_max + 2)
    }

    /// Integrate `f(x, y)` over the unit disk.
    pub fn integrate<F>(&self, f: F) -> f64
    where F: Fn(f64, f64) -> f64
    {
        let dtheta = TAU / self.n_theta as f64;
        let angles: Vec<(f64, f64)>
            = (0..self.n_theta)
            .map(|k| {
                let th = dtheta * (k as f64 + 0.5);
                (th.cos(), th.sin())
            })
            .collect();
        self.r_nodes.iter().zip(&self.r_weights)
            .map(|(&r, &wr)| {
                let ring: f64
                    = angles.iter()
                    .map(|&(c, s)| f(r * c, r * s))
                    .sum();
                wr * r * dtheta * ring
            })
            .sum()
    }

    /// Disk inner product `(1/π) ∫∫ a b dA` of two modes.
    pub fn inner_product(&self, a: &Zernike, b: &Zernike) -> f64 {
        self.integrate(|x, y| a.eval(x, y) * b.eval(x, y)) / PI
    }
}

/// Matrix of pairwise disk inner products for a list of modes, computed in
/// parallel.
pub fn gram_matrix(modes: &[ZernikeMode], quad: &DiskQuadrature)
    -> PatternResult<nd::Array2<f64>>
{
    let polys: Vec<Zernike>
        = modes.iter()
        .map(|mode| Zernike::new(*mode))
        .collect::<PatternResult<_>>()?;
    let n = polys.len();
    let pairs: Vec<(usize, usize)>
        = (0..n).cartesian_product(0..n)
        .filter(|(i, j)| i <= j)
        .collect();
    let values: Vec<((usize, usize), f64)>
        = pairs.into_par_iter()
        .map(|(i, j)| ((i, j), quad.inner_product(&polys[i], &polys[j])))
        .collect();
    let mut gram: nd::Array2<f64> = nd::Array2::zeros((n, n));
    for ((i, j), v) in values.into_iter() {
        gram[[i, j]] = v;
        gram[[j, i]] = v;
    }
    Ok(gram)
}

/// Largest absolute elementwise deviation of a square matrix from the
/// identity.
pub fn identity_deviation(gram: &nd::Array2<f64>) -> f64 {
    gram.indexed_iter()
        .map(|((i, j), v)| if i == j { (v - 1.0).abs() } else { v.abs() })
        .fold(0.0, f64::max)
}
