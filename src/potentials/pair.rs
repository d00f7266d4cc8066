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

//! A switched Lennard-Jones pair term added on top of the network energy.
//!
//! It is switched *on* across `r_up` (so that it vanishes at short range, where
//! the network alone describes the interaction) and *off* again across
//! `r_down`.

use crate::{FailResult, ConfigError};
use crate::util::switch;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PairCorrection {
    /// Strength; the Lennard-Jones well depth is `a / 4`. Units are energy.
    pub a: f64,
    /// `(min, max)` of the band across which the term switches on.
    pub r_up: (f64, f64),
    /// `(min, max)` of the band across which the term switches off.
    pub r_down: (f64, f64),
    /// Distance beyond which the bare Lennard-Jones term is zero.
    pub cutoff: f64,
}

// The Lennard-Jones length scale.
const SIGMA: f64 = 1.0;

impl PairCorrection {
    pub fn validate(&self) -> FailResult<()> {
        let PairCorrection { a, r_up, r_down, cutoff } = *self;
        if !a.is_finite() {
            throw!(ConfigError::BadPairCorrection(format!("a = {}", a)));
        }
        for &(name, (min, max)) in &[("r-up", r_up), ("r-down", r_down)] {
            if !(0.0 <= min && min < max) {
                throw!(ConfigError::BadPairCorrection(format!("{} = ({}, {}) is not an interval", name, min, max)));
            }
        }
        if !(cutoff.is_finite() && cutoff > 0.0) {
            throw!(ConfigError::BadPairCorrection(format!("cutoff = {}", cutoff)));
        }
        if r_down.1 > cutoff {
            warn!("pair correction switches off at {}, beyond its cutoff of {}", r_down.1, cutoff);
        }
        Ok(())
    }

    pub fn cutoff(&self) -> f64 { self.cutoff }

    /// Energy of one pair and its derivative with respect to `r`.
    pub fn compute(&self, r: f64) -> (f64, f64) {
        let (phi, phi_d_r) = lennard_jones(self.a / 4.0, SIGMA, self.cutoff, r);
        let (up, up_d_r) = switch::poly3(self.r_up, r);
        let (down, down_d_r) = switch::poly3((self.r_down.1, self.r_down.0), r);

        let value = phi * up * down;
        let d_r = phi_d_r * up * down + phi * up_d_r * down + phi * up * down_d_r;
        (value, d_r)
    }
}

fn lennard_jones(epsilon: f64, sigma: f64, cutoff: f64, r: f64) -> (f64, f64) {
    if r >= cutoff {
        return (0.0, 0.0);
    }
    let sor = sigma / r;
    let sor6 = sor * sor * sor * sor * sor * sor;
    let sor12 = sor6 * sor6;
    let value = 4.0 * epsilon * (sor12 - sor6);
    let d_r = 24.0 * epsilon * (-2.0 * sor12 + sor6) / r;
    (value, d_r)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::util::uniform;
    use nnip_numerical::slope;

    pub(crate) fn example() -> PairCorrection {
        PairCorrection { a: 2.0, r_up: (0.8, 1.1), r_down: (1.6, 2.0), cutoff: 2.2 }
    }

    #[test]
    fn regions() {
        let pair = example();
        assert_eq!(pair.compute(0.5), (0.0, 0.0));
        assert_eq!(pair.compute(2.1), (0.0, 0.0));
        assert_eq!(pair.compute(3.0), (0.0, 0.0));

        // fully switched on
        let r = 1.3;
        assert_eq!(pair.compute(r), lennard_jones(0.5, 1.0, 2.2, r));
    }

    #[test]
    fn num_deriv() {
        let pair = example();
        for _ in 0..40 {
            let r = uniform(0.6, 2.3);
            assert_close!(
                rel=1e-7, abs=1e-9, pair.compute(r).1,
                slope(1e-5, None, r, |r| pair.compute(r).0),
                "r = {}", r,
            );
        }
    }

    #[test]
    fn lj_num_deriv() {
        for _ in 0..20 {
            let r = uniform(0.8, 3.0);
            assert_close!(
                rel=1e-8, abs=1e-10, lennard_jones(0.3, 1.0, 10.0, r).1,
                slope(1e-5, None, r, |r| lennard_jones(0.3, 1.0, 10.0, r).0),
            );
        }
    }

    // The switched term meets the unswitched one at the inner edge of each
    // band, and the derivative has no jump across any band edge.
    #[test]
    fn switch_continuity() {
        let pair = example();
        // the bare term is large near r_up.0, so the derivative of the switched
        // term picks up a jump of about |phi| * 6 eps / width^2 from either side
        let eps = 1e-10;
        let bare = |r| lennard_jones(pair.a / 4.0, SIGMA, pair.cutoff, r);

        assert_close!(rel=1e-6, pair.compute(pair.r_up.1 - eps).0, bare(pair.r_up.1).0);
        assert_close!(rel=1e-6, pair.compute(pair.r_down.0 + eps).0, bare(pair.r_down.0).0);

        for &edge in &[pair.r_up.0, pair.r_up.1, pair.r_down.0, pair.r_down.1] {
            let (below, d_below) = pair.compute(edge - eps);
            let (above, d_above) = pair.compute(edge + eps);
            assert_close!(abs=1e-7, below, above, "value at {}", edge);
            assert_close!(abs=1e-5, d_below, d_above, "derivative at {}", edge);
        }
    }

    #[test]
    fn validation() {
        assert!(example().validate().is_ok());
        assert!(PairCorrection { r_up: (1.1, 0.8), ..example() }.validate().is_err());
        assert!(PairCorrection { r_down: (2.0, 2.0), ..example() }.validate().is_err());
        assert!(PairCorrection { cutoff: 0.0, ..example() }.validate().is_err());
        assert!(PairCorrection { a: f64::NAN, ..example() }.validate().is_err());
    }
}
