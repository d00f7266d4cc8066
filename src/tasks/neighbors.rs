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

//! Brute-force construction of full neighbor lists for free clusters.

use nnip_array_types::V3;
use nnip_potentials::host::{CompressedNeighbors, NeighborList};

use rayon_cond::CondIterator;

/// Every particle strictly within `cutoff` of each contributing particle.
///
/// Non-contributing particles get empty lists.  The lists are full: when
/// `i` and `j` both contribute, each appears in the other's list.
pub fn full_neighbor_lists(
    positions: &[V3],
    contributing: &[bool],
    cutoff: f64,
    parallel: bool,
) -> CompressedNeighbors {
    assert_eq!(positions.len(), contributing.len());
    let cutoff_sq = cutoff * cutoff;

    let lists: Vec<Vec<usize>> = {
        CondIterator::new(0..positions.len(), parallel)
            .map(|i| match contributing[i] {
                false => vec![],
                true => {
                    (0..positions.len())
                        .filter(|&j| j != i)
                        .filter(|&j| (positions[j] - positions[i]).sqnorm() < cutoff_sq)
                        .collect()
                },
            })
            .collect()
    };

    let neighbors = CompressedNeighbors::from_lists(lists);
    trace!("neighbor lists: {} atoms, {} entries", neighbors.num_atoms(), neighbors.num_entries());
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_cutoff() {
        let positions = vec![
            V3([0.0, 0.0, 0.0]),
            V3([1.0, 0.0, 0.0]),
            V3([0.0, 2.0, 0.0]),
            V3([0.0, 0.0, 0.5]),
        ];
        let contributing = vec![true, true, true, false];
        for &parallel in &[false, true] {
            let neighbors = full_neighbor_lists(&positions, &contributing, 2.0, parallel);
            assert_eq!(neighbors.num_atoms(), 4);
            assert_eq!(neighbors.neighbors(0), &[1, 3][..]);
            assert_eq!(neighbors.neighbors(1), &[0, 3][..]);
            // exactly at the cutoff from atom 0
            assert_eq!(neighbors.neighbors(2), &[] as &[usize]);
            assert_eq!(neighbors.neighbors(3), &[] as &[usize]);
        }
    }

    #[test]
    fn parallel_agrees() {
        let positions: Vec<_> = (0..50).map(|_| V3::from_fn(|_| 4.0 * rand::random::<f64>())).collect();
        let contributing: Vec<_> = (0..50).map(|i| i % 7 != 0).collect();
        assert_eq!(
            full_neighbor_lists(&positions, &contributing, 1.5, false),
            full_neighbor_lists(&positions, &contributing, 1.5, true),
        );
    }
}
