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

//! Utilities for numeric differentiation.
//!
//! These exist to check the analytic forces produced by potentials.
//! The gradient of the energy with respect to a position is minus the force,
//! so a typical check looks like
//!
//! ```ignore
//! let num_grad = nnip_numerical::position_gradient(1e-4, None, &coords, |coords| energy(coords));
//! assert_close!(rel=1e-7, abs=1e-9, forces, num_grad.iter().map(|g| -g).collect::<Vec<_>>());
//! ```

use nnip_array_types::V3;

/// Approximation method for a numerical 1D derivative.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DerivativeKind {
    /// n-point central stencil. `n` must be odd. Only implemented for `n = 3, 5, 7, 9`.
    Stencil(u32),
}

impl DerivativeKind {
    /// Alias for `DerivativeKind::Stencil(3)`.
    #[allow(bad_style)]
    pub const CentralDifference: Self = DerivativeKind::Stencil(3);

    /// Offsets (in steps) and weights of the positive half of the stencil, and
    /// the denominator (in steps).  The stencil is antisymmetric, so the
    /// negative half uses the same weights with flipped sign.
    ///
    /// http://www.holoborodko.com/pavel/numerical-methods/numerical-derivative/central-differences/
    fn half_stencil(self) -> (&'static [(f64, f64)], f64) {
        match self {
            DerivativeKind::Stencil(3) => (&[(1.0, 1.0)], 2.0),
            DerivativeKind::Stencil(5) => (&[(1.0, 8.0), (2.0, -1.0)], 12.0),
            DerivativeKind::Stencil(7) => (&[(1.0, 45.0), (2.0, -9.0), (3.0, 1.0)], 60.0),
            DerivativeKind::Stencil(9) => {
                (&[(1.0, 672.0), (2.0, -168.0), (3.0, 32.0), (4.0, -3.0)], 840.0)
            },
            DerivativeKind::Stencil(n) if n < 3 || n % 2 == 0 => {
                panic!("{}-point stencil does not exist", n);
            },
            DerivativeKind::Stencil(n) => panic!("{}-point stencil is not implemented", n),
        }
    }
}

impl Default for DerivativeKind {
    fn default() -> DerivativeKind
    { DerivativeKind::Stencil(5) }
}

enum Never {}

/// Compute a numerical derivative using finite differences.
pub fn slope(
    step: f64,
    kind: Option<DerivativeKind>,
    point: f64,
    mut value_fn: impl FnMut(f64) -> f64,
) -> f64 {
    try_slope::<Never, _>(step, kind, point, |x| Ok(value_fn(x)))
        .unwrap_or_else(|e| match e {})
}

/// `slope` for functions that can fail.
pub fn try_slope<E, F>(
    step: f64,
    kind: Option<DerivativeKind>,
    point: f64,
    mut value_fn: F,
) -> Result<f64, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let (half_stencil, denom) = kind.unwrap_or_default().half_stencil();

    let mut numer = 0.0;
    for &(offset, weight) in half_stencil {
        let right = value_fn(point + offset * step)?;
        let left = value_fn(point - offset * step)?;
        numer += weight * (right - left);
    }
    Ok(numer / (denom * step))
}

/// Numerically compute a gradient.
///
/// This independently performs a slope check along each individual
/// axis of the input, so the number of function calls is proportional
/// to the input size.
pub fn gradient(
    step: f64,
    kind: Option<DerivativeKind>,
    point: &[f64],
    mut value_fn: impl FnMut(&[f64]) -> f64,
) -> Vec<f64> {
    try_gradient::<Never, _>(step, kind, point, |x| Ok(value_fn(x)))
        .unwrap_or_else(|e| match e {})
}

/// `gradient` for functions that can fail.
pub fn try_gradient<E, F>(
    step: f64,
    kind: Option<DerivativeKind>,
    point: &[f64],
    mut value_fn: F,
) -> Result<Vec<f64>, E>
where
    F: FnMut(&[f64]) -> Result<f64, E>,
{
    let mut work = point.to_vec();
    let mut out = Vec::with_capacity(point.len());
    for (i, &center) in point.iter().enumerate() {
        out.push(try_slope(step, kind, center, |x| {
            work[i] = x;
            value_fn(&work)
        })?);
        work[i] = center;
    }
    Ok(out)
}

/// Gradient of a function of a list of positions, as one `V3` per position.
pub fn position_gradient(
    step: f64,
    kind: Option<DerivativeKind>,
    coords: &[V3],
    mut value_fn: impl FnMut(&[V3]) -> f64,
) -> Vec<V3> {
    try_position_gradient::<Never, _>(step, kind, coords, |x| Ok(value_fn(x)))
        .unwrap_or_else(|e| match e {})
}

/// `position_gradient` for functions that can fail.
pub fn try_position_gradient<E, F>(
    step: f64,
    kind: Option<DerivativeKind>,
    coords: &[V3],
    mut value_fn: F,
) -> Result<Vec<V3>, E>
where
    F: FnMut(&[V3]) -> Result<f64, E>,
{
    let mut work = coords.to_vec();
    let mut out = Vec::with_capacity(coords.len());
    for atom in 0..coords.len() {
        let mut grad = V3::zero();
        for axis in 0..3 {
            let center = coords[atom][axis];
            grad[axis] = try_slope(step, kind, center, |x| {
                work[atom][axis] = x;
                value_fn(&work)
            })?;
            work[atom][axis] = center;
        }
        out.push(grad);
    }
    Ok(out)
}

//---------------------------------------------------------
