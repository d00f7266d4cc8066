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

//! Consistency checks that serde's derives can't express.
//!
//! Checks that require knowledge of the descriptor families or of the network
//! shapes are left to the code that builds the model.

use crate::config::*;
use failure::Error;

impl ModelSettings {
    pub fn validate(mut self) -> Result<ValidatedModelSettings, Error> {
        fix_version(&mut self.version)?;
        check_species(&self.species)?;
        self.cutoff_matrix()?;

        for (index, group) in self.descriptors.iter().enumerate() {
            if group.single().is_none() {
                let names: Vec<_> = group.0.keys().collect();
                bail!("descriptors[{}] must have exactly one family name, found {:?}", index, names);
            }
        }
        if self.network.layers.is_empty() {
            bail!("network must have at least one layer");
        }
        if let Some(pair) = &self.pair_correction {
            if pair.cutoff > self.max_cutoff() {
                info!(
                    "pair correction cutoff ({}) exceeds every descriptor cutoff; neighbor lists will be larger",
                    pair.cutoff,
                );
            }
        }

        Ok(ValidatedModelSettings(self))
    }

    /// Species code of a species name.
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species.iter().position(|s| s == name)
    }

    /// The symmetric `(species, species)` cutoff table.
    ///
    /// Every unordered pair must be given.  Repeated entries (in either order)
    /// must agree.
    pub fn cutoff_matrix(&self) -> Result<Vec<Vec<f64>>, Error> {
        let n = self.species.len();
        let mut matrix = vec![vec![None; n]; n];
        for CutoffEntry { pair: [a, b], cutoff } in &self.cutoffs {
            let lookup = |name: &str| match self.species_index(name) {
                Some(index) => Ok(index),
                None => Err(format_err!("cutoff given for unknown species '{}'", name)),
            };
            let (ia, ib) = (lookup(a)?, lookup(b)?);
            for &(row, col) in &[(ia, ib), (ib, ia)] {
                match matrix[row][col] {
                    Some(old) if old != *cutoff => {
                        bail!("conflicting cutoffs for pair [{}, {}]: {} and {}", a, b, old, cutoff);
                    },
                    _ => matrix[row][col] = Some(*cutoff),
                }
            }
        }

        let mut out = vec![vec![0.0; n]; n];
        for row in 0..n {
            for col in 0..n {
                match matrix[row][col] {
                    Some(cutoff) => out[row][col] = cutoff,
                    None => bail!("no cutoff for pair [{}, {}]", self.species[row], self.species[col]),
                }
            }
        }
        Ok(out)
    }

    fn max_cutoff(&self) -> f64 {
        self.cutoffs.iter().map(|entry| entry.cutoff).fold(0.0, f64::max)
    }
}

fn fix_version(it: &mut Option<u32>) -> Result<(), Error> {
    match *it {
        Some(x) if x == 0 || x > MAX_VERSION => {
            bail!("`version: {}` is invalid. (1 <= version <= {})", x, MAX_VERSION);
        },
        None => {
            warn!("\
                Model file has no `version` field! Assuming `version: 1`. \
                (the latest is version {})\
            ", MAX_VERSION);
            *it = Some(1);
        },
        _ => {},
    };

    Ok(())
}

fn check_species(species: &[String]) -> Result<(), Error> {
    if species.is_empty() {
        bail!("at least one species is required");
    }
    for (index, name) in species.iter().enumerate() {
        if species[..index].contains(name) {
            bail!("species '{}' is listed twice", name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::YamlRead;

    const EXAMPLE: &str = "
version: 1
species: [C, H]
cutoff-function: exp
cutoffs:
  - {pair: [C, C], cutoff: 5.0}
  - {pair: [H, C], cutoff: 4.5}
  - {pair: [H, H], cutoff: 4.0}
descriptors:
  - g2: [{eta: 0.1, rs: 0.0}, {eta: 0.5, rs: 1.5}]
  - g4: [{zeta: 1.0, lambda: -1.0, eta: 0.005}]
network:
  activation: tanh
  layers:
    - {weights: [[1.0], [2.0], [3.0]], bias: [0.5]}
pair-correction: {a: 1.5, r-up: [0.5, 1.0], r-down: [1.5, 2.0], cutoff: 2.0}
";

    fn read(text: &str) -> Result<ModelSettings, Error> {
        ValidatedModelSettings::from_reader(text.as_bytes()).map(|v| v.0)
    }

    #[test]
    fn example() {
        let settings = read(EXAMPLE).unwrap();
        assert_eq!(settings.species, vec!["C", "H"]);
        assert_eq!(settings.cutoff_function, CutoffFunction::Exp);
        assert_eq!(settings.cutoff_matrix().unwrap(), vec![vec![5.0, 4.5], vec![4.5, 4.0]]);
        assert_eq!(settings.descriptors.len(), 2);

        let (name, params) = settings.descriptors[1].single().unwrap();
        assert_eq!(name, "g4");
        assert_eq!(params[0]["lambda"], -1.0);

        assert_eq!(settings.pair_correction.as_ref().unwrap().r_up, [0.5, 1.0]);
        assert_eq!(settings.energy_scale, 1.0);
        assert_eq!(settings.threading, Threading::Serial);
        assert_eq!(settings.normalization, None);
    }

    #[test]
    fn defaults() {
        let text = EXAMPLE.replace("version: 1\n", "").replace("cutoff-function: exp\n", "");
        let settings = read(&text).unwrap();
        assert_eq!(settings.version, Some(1));
        assert_eq!(settings.cutoff_function, CutoffFunction::Cos);
    }

    #[test]
    fn json_is_yaml() {
        let text = r#"{
            "species": ["Si"],
            "cutoffs": [{"pair": ["Si", "Si"], "cutoff": 3.0}],
            "descriptors": [{"g2": [{"eta": 1.0, "rs": 0.0}]}],
            "network": {"activation": "sigmoid", "layers": [{"weights": [[1.0]], "bias": [0.0]}]},
            "energy-scale": 2.0,
            "threading": "rayon"
        }"#;
        let settings = read(text).unwrap();
        assert_eq!(settings.energy_scale, 2.0);
        assert_eq!(settings.threading, Threading::Rayon);
    }

    #[test]
    fn bad_settings() {
        let bad = |from: &str, to: &str| {
            let text = EXAMPLE.replace(from, to);
            assert_ne!(text, EXAMPLE);
            assert!(read(&text).is_err(), "accepted: {} -> {}", from, to);
        };
        bad("version: 1", "version: 2");
        bad("species: [C, H]", "species: [C, C]");
        bad("  - {pair: [H, H], cutoff: 4.0}\n", "");
        bad("  - {pair: [H, H], cutoff: 4.0}\n", "  - {pair: [H, H], cutoff: 4.0}\n  - {pair: [H, H], cutoff: 3.0}\n");
        bad("[H, C]", "[H, O]");
        bad("  - g2: [{eta: 0.1, rs: 0.0}, {eta: 0.5, rs: 1.5}]", "  - {g1: [], g2: [{eta: 0.1, rs: 0.0}]}");
        bad("cutoff-function: exp", "cutoff-function: gaussian");
        bad("    - {weights: [[1.0], [2.0], [3.0]], bias: [0.5]}\n", "    []\n");
    }

    #[test]
    fn repeated_consistent_cutoffs_are_fine() {
        let text = EXAMPLE.replace(
            "  - {pair: [H, H], cutoff: 4.0}\n",
            "  - {pair: [H, H], cutoff: 4.0}\n  - {pair: [C, H], cutoff: 4.5}\n",
        );
        read(&text).unwrap();
    }
}
