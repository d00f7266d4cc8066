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

use crate::V3;

impl V3 {
    /// Get a zero vector.
    #[inline(always)]
    pub fn zero() -> Self
    { V3([0.0; 3]) }

    /// Construct a vector from a function on indices.
    #[inline(always)]
    pub fn from_fn(mut f: impl FnMut(usize) -> f64) -> Self
    { V3([f(0), f(1), f(2)]) }

    /// Apply a function to each element.
    #[inline(always)]
    pub fn map(self, mut f: impl FnMut(f64) -> f64) -> Self
    { V3([f(self.0[0]), f(self.0[1]), f(self.0[2])]) }

    /// Get the inner product of two vectors.
    ///
    /// It is recommended you write this as `V3::dot(a, b)`, rather than `a.dot(b)`.
    #[inline(always)]
    pub fn dot(&self, other: &V3) -> f64
    { self.0[0] * other.0[0] + self.0[1] * other.0[1] + self.0[2] * other.0[2] }

    /// Get the vector's squared magnitude.
    #[inline(always)]
    pub fn sqnorm(&self) -> f64
    { V3::dot(self, self) }

    /// Get the vector's magnitude.
    #[inline(always)]
    pub fn norm(&self) -> f64
    { self.sqnorm().sqrt() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norms() {
        let v = V3([3.0, 4.0, 0.0]);
        assert_eq!(v.sqnorm(), 25.0);
        assert_eq!(v.norm(), 5.0);
        assert_eq!(V3::dot(&v, &V3([1.0, -1.0, 2.0])), -1.0);
        assert_eq!(v.map(|x| 2.0 * x), V3([6.0, 8.0, 0.0]));
        assert_eq!(V3::from_fn(|k| k as f64), V3([0.0, 1.0, 2.0]));
    }
}
