/* ************************************************************************ **
** This file is part of nnip, and is licensed under EITHER the MIT license  **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of nnip is provided under this permissive license, **
** and that the project as a whole is licensed under the GPL 3.0.           **
** ************************************************************************ */

//! Smooth cutoff functions, and the per-species-pair table of cutoff radii.

use crate::{FailResult, ConfigError};

use std::f64::consts::PI;

/// Cutoff function applied to every distance that enters a descriptor.
///
/// Both are 1 at `r = 0` and fall to 0 at `r = rc` with a continuous first
/// derivative.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CutoffFunction {
    /// `0.5 (cos(pi r / rc) + 1)`
    Cos,
    /// `exp(1 - 1 / (1 - (r / rc)^2))`
    Exp,
}

impl Default for CutoffFunction {
    fn default() -> Self { CutoffFunction::Cos }
}

impl CutoffFunction {
    /// Returns the value and derivative at `r`.
    #[inline]
    pub fn compute(self, r: f64, rc: f64) -> (f64, f64) {
        match self {
            CutoffFunction::Cos => cos(r, rc),
            CutoffFunction::Exp => exp(r, rc),
        }
    }
}

/// Cosine cutoff.  Returns the value and derivative at `r`.
#[inline]
pub fn cos(r: f64, rc: f64) -> (f64, f64) {
    if r >= rc {
        return (0.0, 0.0);
    }
    let arg = PI * r / rc;
    let value = 0.5 * (f64::cos(arg) + 1.0);
    let d_r = -0.5 * PI / rc * f64::sin(arg);
    (value, d_r)
}

/// Exponential (bump function) cutoff.  Returns the value and derivative at `r`.
///
/// All derivatives vanish at `rc`.
#[inline]
pub fn exp(r: f64, rc: f64) -> (f64, f64) {
    if r >= rc {
        return (0.0, 0.0);
    }
    let x = r / rc;
    let y = 1.0 - x * x;
    let value = f64::exp(1.0 - 1.0 / y);
    let d_r = -2.0 * x / (rc * y * y) * value;
    (value, d_r)
}

/// Symmetric table of cutoff radii, indexed by species code.
#[derive(Debug, Clone, PartialEq)]
pub struct CutoffTable {
    num_species: usize,
    // row-major, num_species x num_species
    cutoffs: Vec<f64>,
    cutoffs_sq: Vec<f64>,
}

impl CutoffTable {
    /// Build from a square matrix of cutoff radii.
    ///
    /// The matrix must be symmetric, with finite positive entries.
    pub fn new(cutoffs: Vec<Vec<f64>>) -> FailResult<Self> {
        let num_species = cutoffs.len();
        if num_species == 0 {
            throw!(ConfigError::BadCutoffTable("no species".to_string()));
        }

        for (a, row) in cutoffs.iter().enumerate() {
            if row.len() != num_species {
                throw!(ConfigError::BadCutoffTable(format!(
                    "row {} has {} entries, but there are {} species", a, row.len(), num_species,
                )));
            }
            for (b, &rc) in row.iter().enumerate() {
                if !(rc.is_finite() && rc > 0.0) {
                    throw!(ConfigError::BadCutoffTable(format!("cutoff[{}][{}] = {}", a, b, rc)));
                }
                if rc != cutoffs[b][a] {
                    throw!(ConfigError::BadCutoffTable(format!(
                        "not symmetric: cutoff[{}][{}] = {}, cutoff[{}][{}] = {}",
                        a, b, rc, b, a, cutoffs[b][a],
                    )));
                }
            }
        }

        let cutoffs: Vec<f64> = cutoffs.into_iter().flatten().collect();
        let cutoffs_sq = cutoffs.iter().map(|&rc| rc * rc).collect();
        Ok(CutoffTable { num_species, cutoffs, cutoffs_sq })
    }

    /// A table with the same cutoff for every pair of species.
    pub fn uniform(num_species: usize, cutoff: f64) -> FailResult<Self>
    { CutoffTable::new(vec![vec![cutoff; num_species]; num_species]) }

    pub fn num_species(&self) -> usize { self.num_species }

    #[inline(always)]
    pub fn cutoff(&self, a: usize, b: usize) -> f64
    { self.cutoffs[a * self.num_species + b] }

    #[inline(always)]
    pub fn cutoff_sq(&self, a: usize, b: usize) -> f64
    { self.cutoffs_sq[a * self.num_species + b] }

    /// Largest cutoff between any two species.
    pub fn max_cutoff(&self) -> f64
    { self.cutoffs.iter().cloned().fold(0.0, f64::max) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::uniform;
    use nnip_numerical::slope;

    #[test]
    fn endpoints() {
        for &func in &[CutoffFunction::Cos, CutoffFunction::Exp] {
            assert_eq!(func.compute(0.0, 3.0), (1.0, 0.0));
            assert_eq!(func.compute(3.0, 3.0), (0.0, 0.0));
            assert_eq!(func.compute(4.0, 3.0), (0.0, 0.0));

            let (value, _) = func.compute(3.0 - 1e-9, 3.0);
            assert_close!(abs=1e-8, value, 0.0);
        }
        assert_close!(cos(1.5, 3.0).0, 0.5);
    }

    #[test]
    fn num_deriv() {
        for _ in 0..20 {
            let rc = uniform(2.0, 6.0);
            let r = uniform(0.01, 0.99) * rc;
            for &func in &[CutoffFunction::Cos, CutoffFunction::Exp] {
                assert_close!(
                    rel=1e-8, abs=1e-10, func.compute(r, rc).1,
                    slope(1e-4, None, r, |r| func.compute(r, rc).0),
                    "{:?} at r={} rc={}", func, r, rc,
                );
            }
        }
    }

    #[test]
    fn table() {
        let table = CutoffTable::new(vec![vec![4.0, 4.5], vec![4.5, 5.0]]).unwrap();
        assert_eq!(table.cutoff(0, 1), 4.5);
        assert_eq!(table.cutoff_sq(1, 1), 25.0);
        assert_eq!(table.max_cutoff(), 5.0);

        assert!(CutoffTable::new(vec![vec![4.0, 4.5], vec![4.0, 5.0]]).is_err());
        assert!(CutoffTable::new(vec![vec![4.0, 4.5]]).is_err());
        assert!(CutoffTable::new(vec![vec![-1.0]]).is_err());
        assert!(CutoffTable::new(vec![]).is_err());
    }
}
