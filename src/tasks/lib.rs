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

//! Host side of nnip: reads model files and structures, builds neighbor
//! lists, and drives `nnip_potentials::Model`.

#[macro_use] extern crate serde_derive;
#[macro_use] extern crate failure;
#[macro_use] extern crate log;

#[cfg(test)] #[macro_use] extern crate nnip_assert_close;

pub type FailResult<T> = Result<T, failure::Error>;

pub mod entry_points;
pub mod logging;
pub mod model;
pub mod filetypes;
pub mod neighbors;
pub mod cmd;
