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

#![allow(non_snake_case)]

use failure::Error;

use std::io::Read;

/// Provides an alternative to `serde_yaml::from_reader` where all of the
/// expensive codegen has already been performed in this crate.
///
/// It also uses `serde_ignored` to warn on unrecognized keys.
/// Since YAML is a superset of JSON, JSON input is accepted as well.
pub trait YamlRead: for <'de> serde::Deserialize<'de> {
    fn from_reader(mut r: impl Read) -> Result<Self, Error>
    { YamlRead::from_dyn_reader(&mut r) }

    fn from_dyn_reader(r: &mut dyn Read) -> Result<Self, Error> {
        // serde_ignored needs a Deserializer, and serde_yaml only offers one for
        // Value.  Deserializing a Value loses the detail from error messages, so
        // keep the text around to parse again if that fails.
        let mut s = String::new();
        r.read_to_string(&mut s)?;

        let value = value_from_str(&s)?;
        match Self::__serde_ignored__from_value(value) {
            Ok(out) => Ok(out),
            Err(value_error) => match Self::__serde_yaml__from_str(&s) {
                Err(e) => Err(e),
                // the two paths should agree; if not, report what we have
                Ok(_) => Err(value_error),
            },
        }
    }

    // trait-provided function definitions seem to be lazily monomorphized, so
    // the meat goes directly into the impls
    #[doc(hidden)]
    fn __serde_ignored__from_value(value: serde_yaml::Value) -> Result<Self, Error>;
    #[doc(hidden)]
    fn __serde_yaml__from_str(s: &str) -> Result<Self, Error>;
}

#[macro_export]
macro_rules! derive_yaml_read {
    ($Type:ty) => {
        const _: () = {
            use std::result::Result;
            use std::convert::Into;
            use $crate::reexports::serde_yaml;
            use $crate::reexports::serde_ignored;
            use failure::Error;
            use log::warn;

            impl $crate::YamlRead for $Type {
                fn __serde_ignored__from_value(value: serde_yaml::Value) -> Result<$Type, Error> {
                    serde_ignored::deserialize(
                        value,
                        |path| warn!("Unused config item (possible typo?): {}", path),
                    ).map_err(Into::into)
                }

                fn __serde_yaml__from_str(s: &str) -> Result<$Type, Error> {
                    serde_yaml::from_str(s)
                        .map_err(Into::into)
                }
            }
        };
    };
}

derive_yaml_read!{serde_yaml::Value}

// (this also exists solely for codegen reasons)
fn value_from_str(s: &str) -> Result<serde_yaml::Value, Error>
{ serde_yaml::from_str(s).map_err(Into::into) }
