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

use std::ops::{Deref, DerefMut};
use std::fmt;

/// A 3-dimensional cartesian vector with operations for linear algebra.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct V3(pub [f64; 3]);

/// The vector behaves generally like its backing array.
impl Deref for V3 {
    type Target = [f64; 3];

    #[inline(always)]
    fn deref(&self) -> &Self::Target
    { &self.0 }
}

impl DerefMut for V3 {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target
    { &mut self.0 }
}

impl<'a> IntoIterator for &'a V3 {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter
    { self.0.iter() }
}

impl From<[f64; 3]> for V3 {
    #[inline(always)]
    fn from(array: [f64; 3]) -> Self
    { V3(array) }
}

// forward the debug impl without a surrounding "V3(...)", so that debug output
// of force lists is valid JSON and Python
impl fmt::Debug for V3 {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    { fmt::Debug::fmt(&self.0, f) }
}
