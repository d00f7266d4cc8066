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

//! A machine-learned interatomic potential.
//!
//! Each contributing atom's local environment is encoded into a fixed-length
//! vector of symmetry functions (`descriptor`), which a feed-forward network
//! (`network`) maps to that atom's energy.  The network's input gradient is
//! then chained through the analytic descriptor derivatives into pairwise
//! forces and virials (`assemble`).  An optional short-range pair correction
//! (`pair`) is added on top.
//!
//! The host owns the particles and the neighbor lists; see `host` and
//! `compute::Model::compute`.

#[cfg(test)] #[macro_use] extern crate nnip_assert_close;

#[macro_use] extern crate failure;
#[macro_use] extern crate log;

macro_rules! throw {
    ($e:expr) => {
        return Err(::std::convert::Into::into($e))
    }
}

pub mod cutoff;
pub mod descriptor;
pub mod network;
pub mod pair;
pub mod host;
pub mod compute;
pub mod util;
mod assemble;

pub use crate::errors::{ComputeError, ConfigError};
mod errors;

pub use crate::compute::{Model, ComputeArguments, ComputeRequest};

pub type FailResult<T> = Result<T, failure::Error>;
