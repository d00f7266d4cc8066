/* ********************************************************************** **
**  This file is part of nnip.                                            **
**                                                                        **
**  nnip is free software: you can redistribute it and/or modify it under **
**  the terms of the GNU General Public License as published by the Free  **
**  Software Foundation, either version 3 of the License, or (at your     **
**  option) any later version.                                            **
**                                                                        **
**      http://www.gnu.org/licenses/                                      **
**                                                                        **
** Do note that, while the whole of nnip is licensed under the GPL, many  **
** parts of it are licensed under more permissive terms.                  **
** ********************************************************************** */

// Crate where serde_yaml code for the 'tasks' crate is monomorphized,
// because this is a huge compile time sink.
//
// The functions here also make use of serde_ignored to catch typos in the config.

#[macro_use] extern crate serde_derive;
#[macro_use] extern crate failure;
#[macro_use] extern crate log;

pub use crate::monomorphize::YamlRead;
#[macro_use]
mod monomorphize;

pub use crate::config::*;
mod config;
mod validation;

#[doc(hidden)] // used by macro
pub mod reexports {
    pub use serde_ignored;
    pub use serde_yaml;
}

pub type FailResult<T> = Result<T, failure::Error>;
