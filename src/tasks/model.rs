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

//! Conversion of a model file into a `Model`.

use crate::FailResult;

use nnip_config::{self as cfg, YamlRead};
use nnip_potentials::Model;
use nnip_potentials::cutoff::{CutoffFunction, CutoffTable};
use nnip_potentials::descriptor::{DescriptorGroup, DescriptorKind, DescriptorSet, Normalization};
use nnip_potentials::network::{Activation, Layer, NeuralNetwork};
use nnip_potentials::pair::PairCorrection;

use failure::ResultExt;
use std::fs::File;
use std::path::Path;

/// A model together with the species names that its species codes stand for.
#[derive(Debug, Clone)]
pub struct HostModel {
    pub species: Vec<String>,
    pub model: Model,
}

impl HostModel {
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species.iter().position(|s| s == name)
    }
}

/// Read a model file (YAML or JSON) and build the model.
pub fn read_model(path: &Path) -> FailResult<HostModel> {
    let file = File::open(path).with_context(|_| format!("could not open model file {}", path.display()))?;
    let settings = cfg::ValidatedModelSettings::from_reader(file)
        .with_context(|_| format!("while reading model file {}", path.display()))?;
    build_model(&settings.0)
}

pub fn build_model(settings: &cfg::ModelSettings) -> FailResult<HostModel> {
    let cutoffs = CutoffTable::new(settings.cutoff_matrix()?)?;
    let cutoff_function = match settings.cutoff_function {
        cfg::CutoffFunction::Cos => CutoffFunction::Cos,
        cfg::CutoffFunction::Exp => CutoffFunction::Exp,
    };

    let groups = settings.descriptors.iter().enumerate()
        .map(|(index, group)| {
            build_descriptor_group(group)
                .map_err(|e| e.context(format!("in descriptors[{}]", index)).into())
        })
        .collect::<FailResult<Vec<_>>>()?;

    let normalization = settings.normalization.as_ref().map(|norm| Normalization {
        mean: norm.mean.clone(),
        std: norm.std.clone(),
    });
    let descriptors = DescriptorSet::new(cutoff_function, groups, normalization)?;

    let activation = Activation::from_name(&settings.network.activation)?;
    let layers = settings.network.layers.iter().enumerate()
        .map(|(index, layer)| {
            Layer::new(layer.weights.clone(), layer.bias.clone())
                .map_err(|e| e.context(format!("in network layer {}", index)).into())
        })
        .collect::<FailResult<Vec<_>>>()?;
    let network = NeuralNetwork::new(activation, layers)?;

    let pair = settings.pair_correction.as_ref().map(|pair| PairCorrection {
        a: pair.a,
        r_up: (pair.r_up[0], pair.r_up[1]),
        r_down: (pair.r_down[0], pair.r_down[1]),
        cutoff: pair.cutoff,
    });

    let mut model = Model::new(cutoffs, descriptors, pair, network, settings.energy_scale)?;
    model.set_parallel(settings.threading == cfg::Threading::Rayon);

    Ok(HostModel { species: settings.species.clone(), model })
}

// Parameter sets are written as mappings; the core wants them positionally.
fn build_descriptor_group(group: &cfg::DescriptorGroup) -> FailResult<DescriptorGroup> {
    let (name, param_sets) = match group.single() {
        Some(x) => x,
        None => bail!("a descriptor group must have exactly one family name"),
    };
    let kind = DescriptorKind::from_name(name)?;
    let names = kind.param_names();

    let mut positional = Vec::with_capacity(param_sets.len());
    for (index, params) in param_sets.iter().enumerate() {
        if let Some(unknown) = params.keys().find(|key| !names.contains(&&key[..])) {
            bail!("{}[{}]: unknown parameter '{}' (expected {:?})", name, index, unknown, names);
        }
        let values = names.iter()
            .map(|&param| match params.get(param) {
                Some(&value) => Ok(value),
                None => Err(format_err!("{}[{}]: missing parameter '{}'", name, index, param)),
            })
            .collect::<FailResult<Vec<_>>>()?;
        positional.push(values);
    }
    DescriptorGroup::from_params(kind, &positional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nnip_potentials::ConfigError;

    const MODEL: &str = "
version: 1
species: [Si, O]
cutoffs:
  - {pair: [Si, Si], cutoff: 3.0}
  - {pair: [Si, O], cutoff: 2.5}
  - {pair: [O, O], cutoff: 2.0}
descriptors:
  - g2: [{eta: 0.5, rs: 0.0}, {rs: 1.0, eta: 1.5}]
  - g4: [{zeta: 2.0, lambda: 1.0, eta: 0.1}]
network:
  activation: tanh
  layers:
    - {weights: [[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]], bias: [0.0, 0.1]}
    - {weights: [[1.0], [-1.0]], bias: [0.2]}
threading: rayon
";

    fn build(text: &str) -> FailResult<HostModel> {
        let settings = cfg::ValidatedModelSettings::from_reader(text.as_bytes())?;
        build_model(&settings.0)
    }

    #[test]
    fn builds() {
        let host = build(MODEL).unwrap();
        assert_eq!(host.species, vec!["Si", "O"]);
        assert_eq!(host.species_index("O"), Some(1));
        assert_eq!(host.species_index("C"), None);

        let model = &host.model;
        assert_eq!(model.cutoffs().cutoff(0, 1), 2.5);
        assert_eq!(model.descriptors().num_two_body(), 2);
        assert_eq!(model.descriptors().num_three_body(), 1);
        assert_eq!(model.descriptors().cutoff_function(), CutoffFunction::Cos);
        assert_eq!(model.influence_distance(), 3.0);

        // parameters are matched by name, not by position
        match &model.descriptors().groups()[0] {
            DescriptorGroup::Pairwise(params) => {
                assert_eq!((params[1].eta, params[1].rs), (1.5, 1.0));
            },
            other => panic!("wrong group: {:?}", other),
        }
    }

    #[test]
    fn pair_correction_extends_influence() {
        let text = format!("{}pair-correction: {{a: 1.0, r-up: [0.5, 1.0], r-down: [3.0, 3.5], cutoff: 4.0}}\n", MODEL);
        let host = build(&text).unwrap();
        assert_eq!(host.model.influence_distance(), 4.0);
        assert_eq!(host.model.pair_correction().map(|p| p.r_down), Some((3.0, 3.5)));
    }

    #[test]
    fn bad_models() {
        let check = |from: &str, to: &str| {
            let text = MODEL.replace(from, to);
            assert_ne!(text, MODEL);
            assert!(build(&text).is_err(), "accepted: {} -> {}", from, to);
        };
        // unsupported family
        check("- g4:", "- g5:");
        // missing and unknown parameters
        check("{zeta: 2.0, lambda: 1.0, eta: 0.1}", "{zeta: 2.0, lambda: 1.0}");
        check("{zeta: 2.0, lambda: 1.0, eta: 0.1}", "{zeta: 2.0, lambda: 1.0, eta: 0.1, rs: 0.0}");
        // network shape
        check("{weights: [[1.0], [-1.0]], bias: [0.2]}", "{weights: [[1.0], [-1.0], [0.0]], bias: [0.2]}");
        check("[0.5, 0.6]], bias", "[0.5, 0.6], [0.7, 0.8]], bias");
        check("activation: tanh", "activation: softplus");
        // normalization of the wrong length
        check("threading: rayon\n", "normalization: {mean: [0.0], std: [1.0]}\n");
    }

    #[test]
    fn unsupported_family_is_reported_by_name() {
        let err = build(&MODEL.replace("- g4:", "- g3:")).unwrap_err();
        let found = err.iter_chain().any(|fail| match fail.downcast_ref::<ConfigError>() {
            Some(ConfigError::UnsupportedDescriptor { name }) => name == "g3",
            _ => false,
        });
        assert!(found, "{}", err);
    }
}
