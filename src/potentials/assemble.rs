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

//! Application of energies and pairwise `dE/dr` terms to the host's buffers.

use crate::{FailResult, ComputeError};
use crate::host::PairDerivativeSink;

use nnip_array_types::V3;

/// One pairwise contribution to the energy gradient.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct PairTerm {
    pub de_dr: f64,
    pub r: f64,
    /// `x_b - x_a`
    pub delta: V3,
    pub a: usize,
    pub b: usize,
}

/// Destination for everything a single atom contributes.
pub(crate) trait Contributions {
    fn add_energy(&mut self, energy: f64);
    fn add_particle_energy(&mut self, atom: usize, energy: f64);
    fn add_pair_term(&mut self, term: PairTerm) -> FailResult<()>;
}

/// The host's output buffers, each present only if requested.
pub(crate) struct Accumulators<'a> {
    pub energy: Option<&'a mut f64>,
    pub forces: Option<&'a mut [V3]>,
    pub particle_energy: Option<&'a mut [f64]>,
    pub virial: Option<&'a mut [f64; 6]>,
    pub particle_virial: Option<&'a mut [[f64; 6]]>,
    pub sink: Option<&'a mut dyn PairDerivativeSink>,
}

impl<'a> Accumulators<'a> {
    pub fn zero(&mut self) {
        if let Some(energy) = &mut self.energy {
            **energy = 0.0;
        }
        if let Some(forces) = &mut self.forces {
            forces.iter_mut().for_each(|f| *f = V3::zero());
        }
        if let Some(particle_energy) = &mut self.particle_energy {
            particle_energy.iter_mut().for_each(|e| *e = 0.0);
        }
        if let Some(virial) = &mut self.virial {
            **virial = [0.0; 6];
        }
        if let Some(particle_virial) = &mut self.particle_virial {
            particle_virial.iter_mut().for_each(|v| *v = [0.0; 6]);
        }
    }
}

/// `v * (delta (x) delta)` in Voigt order `xx, yy, zz, yz, xz, xy`.
#[inline]
pub(crate) fn voigt_outer(v: f64, delta: V3) -> [f64; 6] {
    let V3([x, y, z]) = delta;
    [v * x * x, v * y * y, v * z * z, v * y * z, v * x * z, v * x * y]
}

impl<'a> Contributions for Accumulators<'a> {
    #[inline]
    fn add_energy(&mut self, energy: f64) {
        if let Some(total) = &mut self.energy {
            **total += energy;
        }
    }

    #[inline]
    fn add_particle_energy(&mut self, atom: usize, energy: f64) {
        if let Some(particle_energy) = &mut self.particle_energy {
            particle_energy[atom] += energy;
        }
    }

    fn add_pair_term(&mut self, term: PairTerm) -> FailResult<()> {
        let PairTerm { de_dr, r, delta, a, b } = term;

        if let Some(forces) = &mut self.forces {
            let force = delta * (de_dr / r);
            forces[a] += force;
            forces[b] -= force;
        }

        if self.virial.is_some() || self.particle_virial.is_some() {
            let contribution = voigt_outer(de_dr / r, delta);
            if let Some(virial) = &mut self.virial {
                for k in 0..6 {
                    virial[k] += contribution[k];
                }
            }
            if let Some(particle_virial) = &mut self.particle_virial {
                for k in 0..6 {
                    particle_virial[a][k] += 0.5 * contribution[k];
                    particle_virial[b][k] += 0.5 * contribution[k];
                }
            }
        }

        if let Some(sink) = &mut self.sink {
            sink.report_pair_derivative(de_dr, r, delta, a, b)
                .map_err(|e| e.context(ComputeError::PairReportRejected { a, b }))?;
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Event {
    Energy(f64),
    ParticleEnergy(usize, f64),
    Pair(PairTerm),
}

/// Contributions of one atom, saved so that they can be applied later.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Recorded {
    events: Vec<Event>,
}

impl Recorded {
    pub fn new() -> Self { Default::default() }

    /// Apply the saved contributions in the order they were made.
    pub fn replay(self, dest: &mut impl Contributions) -> FailResult<()> {
        for event in self.events {
            match event {
                Event::Energy(energy) => dest.add_energy(energy),
                Event::ParticleEnergy(atom, energy) => dest.add_particle_energy(atom, energy),
                Event::Pair(term) => dest.add_pair_term(term)?,
            }
        }
        Ok(())
    }
}

impl Contributions for Recorded {
    fn add_energy(&mut self, energy: f64) {
        self.events.push(Event::Energy(energy));
    }

    fn add_particle_energy(&mut self, atom: usize, energy: f64) {
        self.events.push(Event::ParticleEnergy(atom, energy));
    }

    fn add_pair_term(&mut self, term: PairTerm) -> FailResult<()> {
        self.events.push(Event::Pair(term));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(de_dr: f64, a: usize, b: usize) -> PairTerm {
        PairTerm { de_dr, r: 2.0, delta: V3([0.0, 2.0, 0.0]), a, b }
    }

    #[test]
    fn pair_term_application() {
        let mut energy = 7.0;
        let mut forces = vec![V3([1.0; 3]); 3];
        let mut virial = [1.0; 6];
        let mut particle_virial = vec![[1.0; 6]; 3];
        {
            let mut acc = Accumulators {
                energy: Some(&mut energy),
                forces: Some(&mut forces[..]),
                particle_energy: None,
                virial: Some(&mut virial),
                particle_virial: Some(&mut particle_virial[..]),
                sink: None,
            };
            acc.zero();
            acc.add_energy(1.5);
            acc.add_particle_energy(0, 100.0);
            acc.add_pair_term(term(3.0, 0, 2)).unwrap();
        }
        assert_eq!(energy, 1.5);
        assert_eq!(forces, vec![V3([0.0, 3.0, 0.0]), V3::zero(), V3([0.0, -3.0, 0.0])]);
        assert_eq!(virial, [0.0, 6.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(particle_virial[0], [0.0, 3.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(particle_virial[1], [0.0; 6]);
        assert_eq!(particle_virial[2], [0.0, 3.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn sink_rejection_is_wrapped() {
        let mut sink = |_: f64, _: f64, _: V3, _: usize, b: usize| -> FailResult<()> {
            match b {
                2 => bail!("no thanks"),
                _ => Ok(()),
            }
        };
        let mut acc = Accumulators {
            energy: None, forces: None, particle_energy: None,
            virial: None, particle_virial: None,
            sink: Some(&mut sink),
        };
        acc.add_pair_term(term(1.0, 0, 1)).unwrap();
        let err = acc.add_pair_term(term(1.0, 0, 2)).unwrap_err();
        match err.downcast_ref::<failure::Context<ComputeError>>().map(|c| c.get_context()) {
            Some(&ComputeError::PairReportRejected { a: 0, b: 2 }) => {},
            _ => panic!("wrong error: {}", err),
        }
    }

    #[test]
    fn replay_preserves_order() {
        let mut reports = vec![];
        {
            let mut sink = |de_dr: f64, _: f64, _: V3, a: usize, b: usize| -> FailResult<()> {
                reports.push((de_dr, a, b));
                Ok(())
            };
            let mut acc = Accumulators {
                energy: None, forces: None, particle_energy: None,
                virial: None, particle_virial: None,
                sink: Some(&mut sink),
            };

            let mut recorded = Recorded::new();
            recorded.add_energy(1.0);
            recorded.add_pair_term(term(1.0, 0, 1)).unwrap();
            recorded.add_pair_term(term(2.0, 1, 2)).unwrap();
            recorded.add_pair_term(term(3.0, 0, 2)).unwrap();
            recorded.replay(&mut acc).unwrap();
        }
        assert_eq!(reports, vec![(1.0, 0, 1), (2.0, 1, 2), (3.0, 0, 2)]);
    }
}
