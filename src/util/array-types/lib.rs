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

//! Fixed-size cartesian vectors.
//!
//! Only the three-dimensional vector is provided, since that is all a
//! pair/triplet potential ever needs.  It behaves like its backing array
//! (via `Deref`) while also supporting the usual linear algebra operators.

#[cfg(feature = "serde")]
#[macro_use] extern crate serde;

pub use self::types::*;
mod types;

mod ops;
mod methods;
