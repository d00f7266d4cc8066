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

//! The model and its per-call entry point.

use crate::{FailResult, ComputeError, ConfigError};
use crate::assemble::{Accumulators, Contributions, PairTerm, Recorded};
use crate::cutoff::CutoffTable;
use crate::descriptor::{DescriptorSet, AtomScratch, PairSlot, TripletSlot};
use crate::host::{Particles, NeighborList, PairDerivativeSink};
use crate::network::{Network, NeuralNetwork};
use crate::pair::PairCorrection;

use nnip_array_types::V3;

use rayon::prelude::*;

/// Which outputs a compute call produces.
///
/// Resolved once per call from the buffers supplied in `ComputeArguments`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ComputeRequest {
    /// Report the pairwise decomposition of the gradient to the host.
    pub process_dedr: bool,
    /// Second derivatives. Always rejected.
    pub process_d2edr2: bool,
    pub energy: bool,
    pub forces: bool,
    pub particle_energy: bool,
    pub virial: bool,
    pub particle_virial: bool,
}

impl ComputeRequest {
    pub fn is_empty(&self) -> bool { *self == Default::default() }

    /// Whether any output depends on `dE/dr`.
    pub fn needs_gradient(&self) -> bool {
        self.process_dedr || self.forces || self.virial || self.particle_virial
    }
}

/// Inputs and output buffers of one compute call.
///
/// Every output is optional; those that are present are overwritten.
pub struct ComputeArguments<'a> {
    pub particles: Particles<'a>,
    pub neighbors: &'a dyn NeighborList,
    pub energy: Option<&'a mut f64>,
    pub forces: Option<&'a mut [V3]>,
    pub particle_energy: Option<&'a mut [f64]>,
    pub virial: Option<&'a mut [f64; 6]>,
    pub particle_virial: Option<&'a mut [[f64; 6]]>,
    pub pair_sink: Option<&'a mut dyn PairDerivativeSink>,
    pub process_d2edr2: bool,
}

impl<'a> ComputeArguments<'a> {
    /// Arguments with every output absent.
    pub fn new(particles: Particles<'a>, neighbors: &'a dyn NeighborList) -> Self {
        ComputeArguments {
            particles, neighbors,
            energy: None,
            forces: None,
            particle_energy: None,
            virial: None,
            particle_virial: None,
            pair_sink: None,
            process_d2edr2: false,
        }
    }

    pub fn request(&self) -> ComputeRequest {
        ComputeRequest {
            process_dedr: self.pair_sink.is_some(),
            process_d2edr2: self.process_d2edr2,
            energy: self.energy.is_some(),
            forces: self.forces.is_some(),
            particle_energy: self.particle_energy.is_some(),
            virial: self.virial.is_some(),
            particle_virial: self.particle_virial.is_some(),
        }
    }
}

/// A complete potential: descriptors, network, and optional pair correction.
#[derive(Debug, Clone)]
pub struct Model<N = NeuralNetwork> {
    cutoffs: CutoffTable,
    descriptors: DescriptorSet,
    pair: Option<PairCorrection>,
    network: N,
    energy_scale: f64,
    parallel: bool,
}

impl<N: Network> Model<N> {
    pub fn new(
        cutoffs: CutoffTable,
        descriptors: DescriptorSet,
        pair: Option<PairCorrection>,
        network: N,
        energy_scale: f64,
    ) -> FailResult<Self> {
        if network.num_inputs() != descriptors.num_descriptors() {
            throw!(ConfigError::ShapeMismatch(format!(
                "network takes {} inputs, but there are {} descriptors",
                network.num_inputs(), descriptors.num_descriptors(),
            )));
        }
        if let Some(pair) = &pair {
            pair.validate()?;
        }
        if !energy_scale.is_finite() {
            bail!("energy scale must be finite, got {}", energy_scale);
        }

        let model = Model { cutoffs, descriptors, pair, network, energy_scale, parallel: false };
        debug!(
            "model: {} species, {} descriptors, influence distance {}, pair correction: {}",
            model.cutoffs.num_species(), model.descriptors.num_descriptors(),
            model.influence_distance(), model.pair.is_some(),
        );
        Ok(model)
    }

    pub fn set_parallel(&mut self, parallel: bool) -> &mut Self {
        self.parallel = parallel;
        self
    }

    pub fn cutoffs(&self) -> &CutoffTable { &self.cutoffs }
    pub fn descriptors(&self) -> &DescriptorSet { &self.descriptors }
    pub fn pair_correction(&self) -> Option<&PairCorrection> { self.pair.as_ref() }
    pub fn network(&self) -> &N { &self.network }
    pub fn energy_scale(&self) -> f64 { self.energy_scale }

    /// The distance within which neighbor lists must be complete.
    pub fn influence_distance(&self) -> f64 {
        let pair_cutoff = self.pair.as_ref().map_or(0.0, |pair| pair.cutoff());
        f64::max(self.cutoffs.max_cutoff(), pair_cutoff)
    }

    pub fn compute(&self, args: ComputeArguments<'_>) -> FailResult<()> {
        let request = args.request();
        if request.is_empty() {
            trace!("compute: nothing requested");
            return Ok(());
        }
        if request.process_d2edr2 {
            throw!(ComputeError::UnsupportedOutput);
        }
        self.validate(&args)?;

        let ComputeArguments {
            particles, neighbors,
            energy, forces, particle_energy, virial, particle_virial, pair_sink, ..
        } = args;
        let mut acc = Accumulators {
            energy, forces, particle_energy, virial, particle_virial,
            sink: pair_sink,
        };
        acc.zero();

        if self.parallel {
            self.compute_parallel(particles, neighbors, request, &mut acc)?;
        } else {
            let mut scratch = AtomScratch::new();
            let mut ws = self.network.workspace();
            for atom in 0..particles.len() {
                if particles.contributing[atom] {
                    self.compute_atom(particles, neighbors, atom, request, &mut scratch, &mut ws, &mut acc)?;
                }
            }
        }

        trace!(
            "compute: {} particles ({} contributing), parallel: {}, {:?}",
            particles.len(), particles.contributing.iter().filter(|&&c| c).count(),
            self.parallel, request,
        );
        Ok(())
    }

    /// The feature vector of a single atom, as fed to the network.
    pub fn compute_features(
        &self,
        particles: Particles<'_>,
        neighbors: &dyn NeighborList,
        atom: usize,
    ) -> FailResult<Vec<f64>> {
        self.validate_particles(particles)?;
        check_len("neighbor lists", Some(neighbors.num_atoms()), particles.len())?;
        if atom >= particles.len() {
            bail!("atom {} out of range for {} particles", atom, particles.len());
        }
        validate_neighbors(particles, neighbors, atom)?;

        let mut scratch = AtomScratch::new();
        self.gather(particles, neighbors, atom, &mut scratch, &mut |_| Ok(()))?;
        self.descriptors.evaluate(&mut scratch);
        Ok(scratch.features)
    }

    fn validate(&self, args: &ComputeArguments<'_>) -> FailResult<()> {
        let particles = args.particles;
        let n = particles.len();
        check_len("forces", args.forces.as_ref().map(|x| x.len()), n)?;
        check_len("particle_energy", args.particle_energy.as_ref().map(|x| x.len()), n)?;
        check_len("particle_virial", args.particle_virial.as_ref().map(|x| x.len()), n)?;
        check_len("neighbor lists", Some(args.neighbors.num_atoms()), n)?;

        self.validate_particles(particles)?;
        for atom in 0..n {
            if particles.contributing[atom] {
                validate_neighbors(particles, args.neighbors, atom)?;
            }
        }
        Ok(())
    }

    fn validate_particles(&self, particles: Particles<'_>) -> FailResult<()> {
        let n = particles.len();
        check_len("species", Some(particles.species.len()), n)?;
        check_len("contributing", Some(particles.contributing.len()), n)?;

        let num_species = self.cutoffs.num_species();
        for (atom, &species) in particles.species.iter().enumerate() {
            if species >= num_species {
                throw!(ComputeError::InvalidSpecies { atom, species, num_species });
            }
        }
        Ok(())
    }

    fn compute_parallel(
        &self,
        particles: Particles<'_>,
        neighbors: &dyn NeighborList,
        request: ComputeRequest,
        acc: &mut Accumulators<'_>,
    ) -> FailResult<()> {
        let recorded = {
            (0..particles.len()).into_par_iter()
                .filter(|&atom| particles.contributing[atom])
                .map_init(
                    || (AtomScratch::new(), self.network.workspace()),
                    |(scratch, ws), atom| -> FailResult<Recorded> {
                        let mut events = Recorded::new();
                        self.compute_atom(particles, neighbors, atom, request, scratch, ws, &mut events)?;
                        Ok(events)
                    },
                )
                .collect::<FailResult<Vec<_>>>()?
        };

        for events in recorded {
            events.replay(acc)?;
        }
        Ok(())
    }

    /// Collect the in-cutoff pairs and triplets of `atom` into the scratch,
    /// passing every neighbor to `visit` along the way.
    fn gather(
        &self,
        particles: Particles<'_>,
        neighbors: &dyn NeighborList,
        atom: usize,
        scratch: &mut AtomScratch,
        visit: &mut dyn FnMut(PairSlot) -> FailResult<()>,
    ) -> FailResult<()> {
        let Particles { species, positions, .. } = particles;
        scratch.reset();

        for &other in neighbors.neighbors(atom) {
            let delta = positions[other] - positions[atom];
            let r = delta.norm();
            let rcut = self.cutoffs.cutoff(species[atom], species[other]);
            let slot = PairSlot { atom: other, delta, r, rcut };
            visit(slot)?;
            if r < rcut {
                scratch.pairs.push(slot);
            }
        }

        if self.descriptors.num_three_body() > 0 {
            let pairs = &scratch.pairs;
            for j in 0..pairs.len() {
                for k in j + 1..pairs.len() {
                    let delta_jk = pairs[k].delta - pairs[j].delta;
                    let r_jk = delta_jk.norm();
                    let rcut_jk = self.cutoffs.cutoff(species[pairs[j].atom], species[pairs[k].atom]);
                    if r_jk < rcut_jk {
                        scratch.triplets.push(TripletSlot { j, k, delta_jk, r_jk, rcut_jk });
                    }
                }
            }
        }
        Ok(())
    }

    fn compute_atom(
        &self,
        particles: Particles<'_>,
        neighbors: &dyn NeighborList,
        atom: usize,
        request: ComputeRequest,
        scratch: &mut AtomScratch,
        ws: &mut N::Workspace,
        out: &mut impl Contributions,
    ) -> FailResult<()> {
        let need_gradient = request.needs_gradient();

        {
            let contributing = particles.contributing;
            let pair = self.pair.as_ref();
            self.gather(particles, neighbors, atom, scratch, &mut |slot| {
                match pair {
                    Some(pair) => add_pair_correction(pair, contributing, atom, slot, request, &mut *out),
                    None => Ok(()),
                }
            })?;
        }

        self.descriptors.evaluate(scratch);
        self.network.forward(ws, &scratch.features);
        let energy = self.energy_scale * self.network.sum_output(ws);
        if request.energy {
            out.add_energy(energy);
        }
        if request.particle_energy {
            out.add_particle_energy(atom, energy);
        }
        if !need_gradient {
            return Ok(());
        }

        self.network.backward(ws);
        self.descriptors.raw_feature_gradient(self.network.grad_input(ws), self.energy_scale, &mut scratch.de_dfeature);

        // Each pair is followed by the triplets whose first leg it is.
        let mut t = 0;
        for slot in 0..scratch.pairs.len() {
            let pair = scratch.pairs[slot];
            let de_dr = self.descriptors.pair_de_dr(scratch, slot);
            out.add_pair_term(PairTerm { de_dr, r: pair.r, delta: pair.delta, a: atom, b: pair.atom })?;

            while t < scratch.triplets.len() && scratch.triplets[t].j == slot {
                let triplet = scratch.triplets[t];
                let (pj, pk) = (scratch.pairs[triplet.j], scratch.pairs[triplet.k]);
                let [d_ij, d_ik, d_jk] = self.descriptors.triplet_de_dr(scratch, t);
                out.add_pair_term(PairTerm { de_dr: d_ij, r: pj.r, delta: pj.delta, a: atom, b: pj.atom })?;
                out.add_pair_term(PairTerm { de_dr: d_ik, r: pk.r, delta: pk.delta, a: atom, b: pk.atom })?;
                out.add_pair_term(PairTerm {
                    de_dr: d_jk, r: triplet.r_jk, delta: triplet.delta_jk, a: pj.atom, b: pk.atom,
                })?;
                t += 1;
            }
        }
        Ok(())
    }
}

// Half-list convention: a pair of contributing atoms is handled by the lower index.
fn add_pair_correction(
    pair: &PairCorrection,
    contributing: &[bool],
    atom: usize,
    slot: PairSlot,
    request: ComputeRequest,
    out: &mut impl Contributions,
) -> FailResult<()> {
    let PairSlot { atom: other, delta, r, .. } = slot;
    let both = contributing[other];
    if both && other < atom {
        return Ok(());
    }
    if r >= pair.cutoff() {
        return Ok(());
    }

    let (phi, phi_d_r) = pair.compute(r);
    let factor = if both { 2.0 } else { 1.0 };
    if request.energy {
        out.add_energy(factor * phi);
    }
    if request.particle_energy {
        out.add_particle_energy(atom, phi);
        if both {
            out.add_particle_energy(other, phi);
        }
    }
    if request.needs_gradient() {
        out.add_pair_term(PairTerm { de_dr: factor * phi_d_r, r, delta, a: atom, b: other })?;
    }
    Ok(())
}

fn check_len(what: &'static str, actual: Option<usize>, expected: usize) -> FailResult<()> {
    match actual {
        Some(actual) if actual != expected => {
            throw!(ComputeError::BadBufferLength { what, expected, actual })
        },
        _ => Ok(()),
    }
}

fn validate_neighbors(particles: Particles<'_>, neighbors: &dyn NeighborList, atom: usize) -> FailResult<()> {
    for &neighbor in neighbors.neighbors(atom) {
        if neighbor >= particles.len() || neighbor == atom {
            throw!(ComputeError::BadNeighbor { atom, neighbor });
        }
    }
    Ok(())
}
