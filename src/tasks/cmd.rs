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

//! Evaluation of a model on a structure.

use crate::FailResult;
use crate::filetypes::{EvalOutput, StructureFile};
use crate::model::HostModel;
use crate::neighbors::full_neighbor_lists;

use nnip_array_types::V3;
use nnip_potentials::ComputeArguments;
use nnip_potentials::host::{Particles, PairDerivativeSink};

/// A structure whose species names have been resolved against a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub species: Vec<usize>,
    pub contributing: Vec<bool>,
    pub positions: Vec<V3>,
}

impl Structure {
    pub fn resolve(file: &StructureFile, model: &HostModel) -> FailResult<Self> {
        let n = file.positions.len();
        if file.species.len() != n {
            bail!("structure has {} positions but {} species", n, file.species.len());
        }
        let species = file.species.iter().enumerate()
            .map(|(atom, name)| match model.species_index(name) {
                Some(code) => Ok(code),
                None => Err(format_err!(
                    "atom {} has species '{}', which the model does not know (model species: {:?})",
                    atom, name, model.species,
                )),
            })
            .collect::<FailResult<Vec<_>>>()?;

        let contributing = match &file.contributing {
            Some(flags) if flags.len() != n => {
                bail!("structure has {} positions but {} contributing flags", n, flags.len());
            },
            Some(flags) => flags.clone(),
            None => vec![true; n],
        };
        Ok(Structure { species, contributing, positions: file.positions.clone() })
    }

    pub fn particles(&self) -> Particles<'_> {
        Particles {
            species: &self.species,
            contributing: &self.contributing,
            positions: &self.positions,
        }
    }
}

#[derive(Debug, Default)]
struct PairCounter(usize);

impl PairDerivativeSink for PairCounter {
    fn report_pair_derivative(&mut self, _: f64, _: f64, _: V3, _: usize, _: usize) -> FailResult<()> {
        self.0 += 1;
        Ok(())
    }
}

/// Compute every output of the model for one structure.
///
/// `parallel` controls the neighbor list construction; the model's own
/// threading setting controls the compute call.
pub fn evaluate(host: &HostModel, structure: &Structure, parallel: bool) -> FailResult<EvalOutput> {
    let n = structure.positions.len();
    let neighbors = full_neighbor_lists(
        &structure.positions,
        &structure.contributing,
        host.model.influence_distance(),
        parallel,
    );

    let mut energy = 0.0;
    let mut forces = vec![V3::zero(); n];
    let mut particle_energy = vec![0.0; n];
    let mut virial = [0.0; 6];
    let mut particle_virial = vec![[0.0; 6]; n];
    let mut counter = PairCounter::default();
    host.model.compute(ComputeArguments {
        energy: Some(&mut energy),
        forces: Some(&mut forces[..]),
        particle_energy: Some(&mut particle_energy[..]),
        virial: Some(&mut virial),
        particle_virial: Some(&mut particle_virial[..]),
        pair_sink: Some(&mut counter),
        ..ComputeArguments::new(structure.particles(), &neighbors)
    })?;

    info!("energy: {}", energy);
    Ok(EvalOutput {
        energy, particle_energy, forces, virial, particle_virial,
        num_pair_reports: counter.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build_model;
    use nnip_config::{ValidatedModelSettings, YamlRead};

    // a single g2 feeding an identity network, so the energy is easy to write down
    const MODEL: &str = "
version: 1
species: [Ar, Kr]
cutoffs:
  - {pair: [Ar, Ar], cutoff: 3.0}
  - {pair: [Ar, Kr], cutoff: 3.0}
  - {pair: [Kr, Kr], cutoff: 3.0}
descriptors:
  - g2: [{eta: 0.0, rs: 0.0}]
network:
  activation: identity
  layers:
    - {weights: [[2.0]], bias: [0.5]}
";

    fn host() -> HostModel {
        let settings = ValidatedModelSettings::from_reader(MODEL.as_bytes()).unwrap();
        build_model(&settings.0).unwrap()
    }

    fn dimer(contributing: Option<Vec<bool>>) -> StructureFile {
        StructureFile {
            species: vec!["Ar".into(), "Kr".into()],
            positions: vec![V3([0.0, 0.0, 0.0]), V3([1.5, 0.0, 0.0])],
            contributing,
        }
    }

    #[test]
    fn dimer_energy() {
        let host = host();
        let structure = Structure::resolve(&dimer(None), &host).unwrap();
        assert_eq!(structure.species, vec![0, 1]);

        let output = evaluate(&host, &structure, false).unwrap();
        // with eta = 0 the feature is just the cutoff function, which is 1/2 at rc/2
        let expected_atom = 2.0 * 0.5 + 0.5;
        assert_close!(abs=1e-12, output.particle_energy[0], expected_atom);
        assert_close!(abs=1e-12, output.particle_energy[1], expected_atom);
        assert_close!(abs=1e-12, output.energy, 2.0 * expected_atom);
        assert_close!(abs=1e-12, output.forces[0][0], -output.forces[1][0]);
        // one report per atom's view of the pair
        assert_eq!(output.num_pair_reports, 2);
    }

    #[test]
    fn ghost_atoms_only_receive_forces() {
        let host = host();
        let structure = Structure::resolve(&dimer(Some(vec![true, false])), &host).unwrap();
        let output = evaluate(&host, &structure, true).unwrap();

        assert_eq!(output.particle_energy[1], 0.0);
        assert_ne!(output.forces[1][0], 0.0);
        assert_eq!(output.num_pair_reports, 1);
    }

    #[test]
    fn resolve_errors() {
        let host = host();
        let mut file = dimer(None);
        file.species[1] = "Xe".into();
        assert!(Structure::resolve(&file, &host).is_err());

        assert!(Structure::resolve(&dimer(Some(vec![true])), &host).is_err());

        let mut file = dimer(None);
        file.positions.pop();
        assert!(Structure::resolve(&file, &host).is_err());
    }
}
