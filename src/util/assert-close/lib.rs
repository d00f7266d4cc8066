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

//! `assert_close!`, for comparing energies, forces and virials against
//! reference values or numerical derivatives.
//!
//! ```ignore
//! assert_close!(rel=1e-6, abs=1e-9, analytic_force, numerical_force);
//! ```
//!
//! Both tolerances are optional (`rel` defaults to `DEFAULT_NONZERO_TOL`,
//! `abs` to zero). Nested data (slices of `V3`, arrays of arrays) is compared
//! elementwise, and a failure reports the index path of the first offending
//! element.

#[macro_use]
extern crate failure;

use std::fmt;

use nnip_array_types::V3;

pub const DEFAULT_NONZERO_TOL: f64 = 1e-9;

#[macro_export]
macro_rules! assert_close {
    ($($t:tt)*) => {
        $crate::assert_close_impl!{
            @parsing [$($t)*] [[@rel $crate::DEFAULT_NONZERO_TOL] [@abs 0.0]]
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! assert_close_impl {
    (@parsing [rel=$tol:expr, $($rest:tt)*] [$($assignment:tt)*]) => {
        $crate::assert_close_impl!(@parsing [$($rest)*] [$($assignment)* [@rel $tol]]);
    };
    (@parsing [abs=$tol:expr, $($rest:tt)*] [$($assignment:tt)*]) => {
        $crate::assert_close_impl!(@parsing [$($rest)*] [$($assignment)* [@abs $tol]]);
    };
    (@parsing [$a:expr, $b:expr $(,)*] $assignments:tt) => {
        $crate::assert_close_impl!(@expand $assignments [$a, $b] ["values are not close"])
    };
    (@parsing [$a:expr, $b:expr, $($fmt:tt)+] $assignments:tt) => {
        $crate::assert_close_impl!(@expand $assignments [$a, $b] [$($fmt)+])
    };
    (@expand [$([@$which:ident $tol:expr])*] [$a:expr, $b:expr] [$($fmt:tt)+]) => {
        #[allow(unused_mut)]
        #[allow(unused_assignments)]
        {
            let (a, b) = ($a, $b);

            let mut tol = $crate::Tolerances { abs: 0.0, rel: 0.0 };
            $( tol.$which = $tol; )*

            if let Err(e) = $crate::CheckClose::check_close(&a, &b, tol) {
                panic!(
                    "{}\n  left: {:?}\n right: {:?}\n{}",
                    format!($($fmt)+), a, b, e,
                );
            }
        }
    };
}

/// Python's `math.isclose`.
#[inline]
pub fn is_close(a: f64, b: f64, Tolerances { abs, rel }: Tolerances) -> bool {
    assert!(rel >= 0.0);
    assert!(abs >= 0.0);

    // equal infinities
    if a == b { return true; }

    // unequal infinities would otherwise pass by having an infinite relative tolerance
    if a.is_infinite() || b.is_infinite() { return false; }

    // NaN fails here
    (a - b).abs() <= abs.max(rel * a.abs()).max(rel * b.abs())
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

/// The first pair of elements found to differ.
#[derive(Debug, Fail)]
pub struct CheckCloseError {
    /// Index path from the outermost container to the scalar, outermost first.
    pub path: Vec<usize>,
    pub values: (f64, f64),
    pub tol: Tolerances,
}

impl CheckCloseError {
    fn within(mut self, index: usize) -> Self {
        self.path.insert(0, index);
        self
    }
}

impl fmt::Display for CheckCloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (left, right) = self.values;
        write!(f, "first difference at {:?}: {:e} vs {:e} (diff {:e}, {:?})",
            self.path, left, right, (left - right).abs(), self.tol)
    }
}

pub trait CheckClose<Rhs: ?Sized = Self> {
    /// Test that all values of self and other are close.
    fn check_close(&self, other: &Rhs, tol: Tolerances) -> Result<(), CheckCloseError>;
}

impl CheckClose for f64 {
    #[inline]
    fn check_close(&self, other: &f64, tol: Tolerances) -> Result<(), CheckCloseError> {
        match is_close(*self, *other, tol) {
            true => Ok(()),
            false => Err(CheckCloseError { path: vec![], values: (*self, *other), tol }),
        }
    }
}

impl<'a, A: ?Sized + CheckClose<B>, B: ?Sized> CheckClose<&'a B> for &'a A {
    fn check_close(&self, other: &&'a B, tol: Tolerances) -> Result<(), CheckCloseError>
    { (**self).check_close(*other, tol) }
}

impl<T: CheckClose> CheckClose for [T] {
    fn check_close(&self, other: &[T], tol: Tolerances) -> Result<(), CheckCloseError> {
        assert_eq!(self.len(), other.len(), "length mismatch in check_close");
        for (index, (a, b)) in self.iter().zip(other).enumerate() {
            a.check_close(b, tol).map_err(|e| e.within(index))?;
        }
        Ok(())
    }
}

impl<T: CheckClose> CheckClose for Vec<T> {
    fn check_close(&self, other: &Vec<T>, tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(&other[..], tol) }
}

impl<T: CheckClose> CheckClose<[T]> for Vec<T> {
    fn check_close(&self, other: &[T], tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(other, tol) }
}

impl<T: CheckClose, const N: usize> CheckClose for [T; N] {
    fn check_close(&self, other: &[T; N], tol: Tolerances) -> Result<(), CheckCloseError>
    { self[..].check_close(&other[..], tol) }
}

impl CheckClose for V3 {
    fn check_close(&self, other: &V3, tol: Tolerances) -> Result<(), CheckCloseError>
    { self.0.check_close(&other.0, tol) }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;

    #[test]
    fn macro_forms() {
        assert_close!(1.0, 1.0);
        assert_close!(abs=1e-8, 1.0, 1.0 + 1e-9);
        assert_close!(rel=1e-8, abs=1e-8, 1.0, 1.0);
        assert_close!(rel=1e-8, 1.0, 1.0,);
        assert_close!(abs=1e-10, vec![V3([1.0, 2.0, 3.0])], vec![V3([1.0, 2.0, 3.0])]);
        assert_close!(abs=1e-10, [[0.0; 3]; 2], [[0.0; 3]; 2], "{}", "with message");
        assert_close!(abs=1e-10, &[1.0, 2.0][..], &[1.0, 2.0][..]);
    }

    #[test]
    fn error_path() {
        let a = vec![V3([1.0, 2.0, 3.0]), V3([4.0, 5.0, 6.0])];
        let b = vec![V3([1.0, 2.0, 3.0]), V3([4.0, 5.5, 6.0])];
        let tol = Tolerances { abs: 1e-3, rel: 0.0 };
        let err = a.check_close(&b, tol).unwrap_err();
        assert_eq!(err.path, vec![1, 1]);
        assert_eq!(err.values, (5.0, 5.5));
    }

    #[test]
    fn python_semantics() {
        let tol = Tolerances { abs: 0.0, rel: 1e-9 };
        assert!(is_close(std::f64::INFINITY, std::f64::INFINITY, tol));
        assert!(!is_close(std::f64::INFINITY, -std::f64::INFINITY, tol));
        assert!(!is_close(std::f64::NAN, std::f64::NAN, tol));
        assert!(!is_close(0.0, 1e-300, tol));
        assert!(is_close(0.0, 1e-300, Tolerances { abs: 1e-12, rel: 0.0 }));
    }

    #[test]
    #[should_panic(expected = "values are not close")]
    fn not_close() {
        assert_close!(abs=0.0, rel=0.0, 1.0, 1.1);
    }
}
