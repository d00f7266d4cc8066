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

use std::ops::{Add, Sub, Neg, Mul, Div};
use std::ops::{AddAssign, SubAssign, MulAssign, DivAssign};

use crate::V3;

#[inline(always)]
fn from_fn(mut f: impl FnMut(usize) -> f64) -> V3
{ V3([f(0), f(1), f(2)]) }

// Generates an operator impl for every combination of owned and borrowed operands.
macro_rules! impl_v_binop {
    ($Trait:ident, $method:ident, $op:tt) => {
        impl_v_binop!(@one [] [] $Trait $method $op);
        impl_v_binop!(@one ['a,] [&'a] $Trait $method $op);
        impl_v_binop!(@one ['b,] [] [&'b] $Trait $method $op);
        impl_v_binop!(@one ['a, 'b,] [&'a] [&'b] $Trait $method $op);
    };
    (@one [$($lt:tt)*] [$($ref_a:tt)*] $Trait:ident $method:ident $op:tt) => {
        impl_v_binop!(@one [$($lt)*] [$($ref_a)*] [] $Trait $method $op);
    };
    (@one [$($lt:tt)*] [$($ref_a:tt)*] [$($ref_b:tt)*] $Trait:ident $method:ident $op:tt) => {
        impl<$($lt)*> $Trait<$($ref_b)* V3> for $($ref_a)* V3 {
            type Output = V3;

            #[inline]
            fn $method(self, other: $($ref_b)* V3) -> V3
            { from_fn(|k| self.0[k] $op other.0[k]) }
        }
    };
}

impl_v_binop!(Add, add, +);
impl_v_binop!(Sub, sub, -);

// -vector
impl Neg for V3 {
    type Output = V3;

    #[inline]
    fn neg(self) -> V3
    { from_fn(|k| -self.0[k]) }
}

impl<'a> Neg for &'a V3 {
    type Output = V3;

    #[inline]
    fn neg(self) -> V3
    { from_fn(|k| -self.0[k]) }
}

// vector * scalar, vector / scalar
macro_rules! impl_v_scalar_ops {
    ($($ref_a:tt)*) => {
        impl<'a> Mul<f64> for $($ref_a)* V3 {
            type Output = V3;

            #[inline]
            fn mul(self, scalar: f64) -> V3
            { from_fn(|k| self.0[k] * scalar) }
        }

        impl<'a> Div<f64> for $($ref_a)* V3 {
            type Output = V3;

            #[inline]
            fn div(self, scalar: f64) -> V3
            { from_fn(|k| self.0[k] / scalar) }
        }

        // scalar * vector
        //
        // (the orphan rules would not allow this to be generic over the scalar type)
        impl<'a> Mul<$($ref_a)* V3> for f64 {
            type Output = V3;

            #[inline(always)]
            fn mul(self, vector: $($ref_a)* V3) -> V3
            { vector * self }
        }
    };
}

impl_v_scalar_ops!();
impl_v_scalar_ops!(&'a);

impl<B> AddAssign<B> for V3 where V3: Add<B, Output=V3> {
    #[inline(always)]
    fn add_assign(&mut self, rhs: B)
    { *self = *self + rhs; }
}

impl<B> SubAssign<B> for V3 where V3: Sub<B, Output=V3> {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: B)
    { *self = *self - rhs; }
}

impl MulAssign<f64> for V3 {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: f64)
    { *self = *self * rhs; }
}

impl DivAssign<f64> for V3 {
    #[inline(always)]
    fn div_assign(&mut self, rhs: f64)
    { *self = *self / rhs; }
}

impl std::iter::Sum for V3 {
    fn sum<I: Iterator<Item=V3>>(iter: I) -> V3
    { iter.fold(V3::zero(), |a, b| a + b) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = V3([1.0, 2.0, 3.0]);
        let b = V3([-1.0, 0.5, 2.0]);
        assert_eq!(a + b, V3([0.0, 2.5, 5.0]));
        assert_eq!(&a - &b, V3([2.0, 1.5, 1.0]));
        assert_eq!(2.0 * a, V3([2.0, 4.0, 6.0]));
        assert_eq!(a / 2.0, V3([0.5, 1.0, 1.5]));
        assert_eq!(-a, V3([-1.0, -2.0, -3.0]));

        let mut c = a;
        c += b;
        c -= &a;
        assert_eq!(c, b);

        let total: V3 = vec![a, b, a].into_iter().sum();
        assert_eq!(total, V3([1.0, 4.5, 8.0]));
    }
}
