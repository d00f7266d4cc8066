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

// NOTE: Please make sure to use the YamlRead trait when deserializing these types!
//
//       DO NOT USE serde_yaml::from_{reader,value,etc.} OUTSIDE THIS CRATE
//       or else you defeat the entire reason for YamlRead's existence.

use serde::de;

use std::collections::BTreeMap;

pub const MAX_VERSION: u32 = 1;

/// Root model file object.
///
/// This is what you should deserialize.
#[derive(Serialize)]
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedModelSettings(pub ModelSettings);

/// Raw deserialized form of a model file.
///
/// You shouldn't deserialize this type directly; deserialize `ValidatedModelSettings`
/// instead, so that consistency checks can be performed.
///
/// # Example
///
/// ```yaml
/// version: 1
/// species: [C, H]
/// cutoff-function: cos
/// cutoffs:
///   - {pair: [C, C], cutoff: 5.0}
///   - {pair: [C, H], cutoff: 4.5}
///   - {pair: [H, H], cutoff: 4.0}
/// descriptors:
///   - g2: [{eta: 0.1, rs: 0.0}, {eta: 0.5, rs: 1.5}]
///   - g4: [{zeta: 1.0, lambda: -1.0, eta: 0.005}]
/// network:
///   activation: tanh
///   layers:
///     - {weights: [[...], [...], [...]], bias: [...]}
///     - {weights: [[...], ...], bias: [0.0]}
/// ```
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ModelSettings {
    /// Identifies the version of the format that this file uses.
    ///
    /// If not specified, assumes a value of 1.
    #[serde(default)]
    pub version: Option<u32>,

    /// Names of the species, in the order of their species codes.
    pub species: Vec<String>,

    /// The cutoff function used for every distance.
    #[serde(default)]
    pub cutoff_function: CutoffFunction,

    /// One entry for each unordered pair of species.
    pub cutoffs: Vec<CutoffEntry>,

    /// Descriptor groups, in feature vector order.
    pub descriptors: Vec<DescriptorGroup>,

    /// Centering and scaling of the features.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalization: Option<Normalization>,

    pub network: Network,

    /// Short-range pair term added on top of the network energy.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair_correction: Option<PairCorrection>,

    /// Factor applied to the network output (and its gradient).
    #[serde(default = "_model_settings__energy_scale")]
    pub energy_scale: f64,

    #[serde(default)]
    pub threading: Threading,
}
fn _model_settings__energy_scale() -> f64 { 1.0 }
derive_yaml_read!{ValidatedModelSettings}

impl<'de> de::Deserialize<'de> for ValidatedModelSettings {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cereal: ModelSettings = de::Deserialize::deserialize(deserializer)?;

        cereal.validate().map_err(de::Error::custom)
    }
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CutoffFunction {
    /// `(cos(pi r / rc) + 1) / 2`
    Cos,
    /// `exp(1 - 1 / (1 - (r / rc)^2))`
    Exp,
}

impl Default for CutoffFunction {
    fn default() -> Self { CutoffFunction::Cos }
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct CutoffEntry {
    pub pair: [String; 2],
    pub cutoff: f64,
}

/// One group of symmetry functions, written as a mapping with a single key:
/// the family name (`g2` or `g4`), whose value is the list of parameter sets.
///
/// ```yaml
/// g2: [{eta: 0.1, rs: 0.0}, {eta: 0.5, rs: 1.5}]
/// ```
///
/// The family name is only checked when the model is built.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct DescriptorGroup(pub BTreeMap<String, Vec<ParamSet>>);

/// Parameter values of one symmetry function, by name.
pub type ParamSet = BTreeMap<String, f64>;

impl DescriptorGroup {
    /// The family name and parameter sets.  `None` unless there is exactly one key.
    pub fn single(&self) -> Option<(&str, &[ParamSet])> {
        match self.0.len() {
            1 => self.0.iter().next().map(|(name, params)| (&name[..], &params[..])),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Normalization {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Network {
    /// Activation of the hidden layers: `sigmoid`, `tanh`, `relu`, `elu`, or
    /// `identity`.  The output layer is always linear.
    pub activation: String,

    pub layers: Vec<Layer>,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Layer {
    /// Indexed as `weights[input][output]`.
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PairCorrection {
    /// Strength.
    pub a: f64,
    /// `[min, max]` of the band across which the term switches on.
    pub r_up: [f64; 2],
    /// `[min, max]` of the band across which the term switches off.
    pub r_down: [f64; 2],
    pub cutoff: f64,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Threading {
    Serial,
    Rayon,
}

impl Default for Threading {
    fn default() -> Self { Threading::Serial }
}
