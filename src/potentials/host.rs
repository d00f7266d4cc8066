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

//! Types through which the host simulation engine hands data to a compute call.

use crate::FailResult;

use nnip_array_types::V3;

/// Read-only view of the host's particles for one compute call.
#[derive(Debug, Copy, Clone)]
pub struct Particles<'a> {
    /// Species code of each particle, an index into the model's cutoff table.
    pub species: &'a [usize],
    /// Whether each particle originates energy and force bookkeeping.
    ///
    /// Non-contributing particles (e.g. ghosts or atoms owned by another domain)
    /// still appear as neighbors and receive forces.
    pub contributing: &'a [bool],
    pub positions: &'a [V3],
}

impl<'a> Particles<'a> {
    pub fn len(&self) -> usize { self.positions.len() }
    pub fn is_empty(&self) -> bool { self.positions.is_empty() }
}

/// Provides the neighbors of each contributing particle.
///
/// The order of each list is irrelevant.  The lists must be full lists
/// (`j` appears in `i`'s list and `i` in `j`'s when both are contributing),
/// and must contain every particle within the model's influence distance.
pub trait NeighborList: Sync {
    /// Number of lists; one per particle, including non-contributing ones.
    fn num_atoms(&self) -> usize;

    fn neighbors(&self, atom: usize) -> &[usize];
}

impl NeighborList for [Vec<usize>] {
    fn num_atoms(&self) -> usize { self.len() }
    fn neighbors(&self, atom: usize) -> &[usize] { &self[atom] }
}

impl NeighborList for Vec<Vec<usize>> {
    fn num_atoms(&self) -> usize { self.len() }
    fn neighbors(&self, atom: usize) -> &[usize] { &self[atom] }
}

/// Neighbor lists in compressed row storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedNeighbors {
    // offsets[i]..offsets[i + 1] is the range of atom i's neighbors
    offsets: Vec<usize>,
    indices: Vec<usize>,
}

impl CompressedNeighbors {
    pub fn from_lists<L: AsRef<[usize]>>(lists: impl IntoIterator<Item=L>) -> Self {
        let mut offsets = vec![0];
        let mut indices = vec![];
        for list in lists {
            indices.extend_from_slice(list.as_ref());
            offsets.push(indices.len());
        }
        CompressedNeighbors { offsets, indices }
    }

    /// Total number of (directed) neighbor entries.
    pub fn num_entries(&self) -> usize { self.indices.len() }
}

impl NeighborList for CompressedNeighbors {
    fn num_atoms(&self) -> usize { self.offsets.len() - 1 }

    fn neighbors(&self, atom: usize) -> &[usize] {
        &self.indices[self.offsets[atom]..self.offsets[atom + 1]]
    }
}

/// Receives the pairwise decomposition of the energy gradient.
///
/// Every contribution to the forces is reported as a term `dE/dr` for the
/// distance `r = |delta|` between particles `a` and `b`, where `delta = x_b - x_a`.
/// Returning an error aborts the compute call.
pub trait PairDerivativeSink {
    fn report_pair_derivative(&mut self, de_dr: f64, r: f64, delta: V3, a: usize, b: usize) -> FailResult<()>;
}

impl<F> PairDerivativeSink for F
where F: FnMut(f64, f64, V3, usize, usize) -> FailResult<()>,
{
    fn report_pair_derivative(&mut self, de_dr: f64, r: f64, delta: V3, a: usize, b: usize) -> FailResult<()> {
        self(de_dr, r, delta, a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed() {
        let lists: Vec<Vec<usize>> = vec![vec![1, 2], vec![], vec![0]];
        let csr = CompressedNeighbors::from_lists(&lists);
        assert_eq!(csr.num_atoms(), 3);
        assert_eq!(csr.num_entries(), 3);
        for atom in 0..3 {
            assert_eq!(csr.neighbors(atom), lists.neighbors(atom));
        }
    }

    #[test]
    fn closure_sink() {
        let mut total = 0.0;
        {
            let mut sink = |de_dr: f64, _r: f64, _delta: V3, _a: usize, _b: usize| -> FailResult<()> {
                total += de_dr;
                Ok(())
            };
            let sink: &mut dyn PairDerivativeSink = &mut sink;
            sink.report_pair_derivative(1.5, 1.0, V3::zero(), 0, 1).unwrap();
            sink.report_pair_derivative(2.0, 1.0, V3::zero(), 1, 0).unwrap();
        }
        assert_eq!(total, 3.5);
    }
}
