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

//! JSON files read and written by `nnip-eval`.

use crate::FailResult;

use nnip_array_types::V3;

use failure::ResultExt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// A structure file.
///
/// ```json
/// {
///   "species": ["Si", "Si", "O"],
///   "positions": [[0.0, 0.0, 0.0], [2.3, 0.0, 0.0], [1.1, 1.2, 0.0]],
///   "contributing": [true, true, false]
/// }
/// ```
///
/// `contributing` may be omitted, in which case every particle contributes.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct StructureFile {
    pub species: Vec<String>,
    pub positions: Vec<V3>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributing: Option<Vec<bool>>,
}

impl StructureFile {
    pub fn load(path: &Path) -> FailResult<Self> {
        let file = File::open(path).with_context(|_| format!("could not open structure file {}", path.display()))?;
        let structure = serde_json::from_reader(BufReader::new(file))
            .with_context(|_| format!("while reading structure file {}", path.display()))?;
        Ok(structure)
    }
}

/// Everything `nnip-eval` computes for one structure.
#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct EvalOutput {
    pub energy: f64,
    pub particle_energy: Vec<f64>,
    pub forces: Vec<V3>,
    /// Voigt order: xx, yy, zz, yz, xz, xy.
    pub virial: [f64; 6],
    pub particle_virial: Vec<[f64; 6]>,
    /// Number of terms in the pairwise decomposition of the gradient.
    pub num_pair_reports: usize,
}

impl EvalOutput {
    pub fn save(&self, mut w: impl Write) -> FailResult<()> {
        serde_json::to_writer_pretty(&mut w, self)?;
        writeln!(w)?;
        Ok(())
    }
}
