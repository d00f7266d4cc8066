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

//! Behler-Parrinello symmetry functions.
//!
//! Two families are supported:
//!
//! * `g2` (pairwise): `exp(-eta (r_ij - Rs)^2) fc(r_ij)`, summed over neighbors `j`.
//! * `g4` (triplet):
//!   `2^(1-zeta) (1 + lambda cos(theta_ijk))^zeta exp(-eta (r_ij^2 + r_ik^2 + r_jk^2)) fc(r_ij) fc(r_ik) fc(r_jk)`,
//!   summed over unordered pairs of neighbors `{j, k}`.
//!
//! Every parameter set of every group is one entry of the feature vector.
//! Entries are numbered by group order, then by parameter set order within the group.

use crate::{FailResult, ConfigError};
use crate::cutoff::CutoffFunction;

use nnip_array_types::V3;

/// Parameters of a pairwise symmetry function.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct G2 {
    /// Width of the gaussian. Units are inverse length squared.
    pub eta: f64,
    /// Center of the gaussian. Units are length.
    pub rs: f64,
}

/// Parameters of a triplet symmetry function.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct G4 {
    /// Angular resolution.
    pub zeta: f64,
    /// `+1` or `-1`; selects which angle the function peaks at.
    pub lambda: f64,
    /// Width of the gaussian. Units are inverse length squared.
    pub eta: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DescriptorKind {
    Pairwise,
    Triplet,
}

impl DescriptorKind {
    /// Look up a descriptor family by the name used in parameter files.
    ///
    /// Only `g2` and `g4` are supported; every other name (including the
    /// other Behler families `g1`, `g3`, `g5`) is an `UnsupportedDescriptor` error.
    pub fn from_name(name: &str) -> FailResult<Self> {
        match name {
            "g2" => Ok(DescriptorKind::Pairwise),
            "g4" => Ok(DescriptorKind::Triplet),
            _ => throw!(ConfigError::UnsupportedDescriptor { name: name.to_string() }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DescriptorKind::Pairwise => "g2",
            DescriptorKind::Triplet => "g4",
        }
    }

    /// Names of the parameters of one parameter set, in the order expected by
    /// `DescriptorGroup::from_params`.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            DescriptorKind::Pairwise => &["eta", "rs"],
            DescriptorKind::Triplet => &["zeta", "lambda", "eta"],
        }
    }
}

/// One named group of symmetry functions, with its list of parameter sets.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorGroup {
    Pairwise(Vec<G2>),
    Triplet(Vec<G4>),
}

impl DescriptorGroup {
    /// Build a group from parameter sets whose values are listed in the order
    /// given by `kind.param_names()`.
    pub fn from_params(kind: DescriptorKind, param_sets: &[Vec<f64>]) -> FailResult<Self> {
        let expected = kind.param_names();
        for values in param_sets {
            if values.len() != expected.len() {
                throw!(ConfigError::BadDescriptorParams {
                    name: kind.name().to_string(),
                    expected,
                    actual: values.len(),
                });
            }
        }

        Ok(match kind {
            DescriptorKind::Pairwise => DescriptorGroup::Pairwise({
                param_sets.iter().map(|v| G2 { eta: v[0], rs: v[1] }).collect()
            }),
            DescriptorKind::Triplet => DescriptorGroup::Triplet({
                param_sets.iter().map(|v| G4 { zeta: v[0], lambda: v[1], eta: v[2] }).collect()
            }),
        })
    }

    pub fn kind(&self) -> DescriptorKind {
        match self {
            DescriptorGroup::Pairwise(_) => DescriptorKind::Pairwise,
            DescriptorGroup::Triplet(_) => DescriptorKind::Triplet,
        }
    }

    /// Number of parameter sets.
    pub fn len(&self) -> usize {
        match self {
            DescriptorGroup::Pairwise(params) => params.len(),
            DescriptorGroup::Triplet(params) => params.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Feature centering and scaling, `(value - mean) / std`.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

#[derive(Debug, Copy, Clone)]
struct TwoBodyEntry {
    global: usize,
    params: G2,
}

#[derive(Debug, Copy, Clone)]
struct ThreeBodyEntry {
    global: usize,
    // index into the angular term tables
    lambda_zeta: usize,
    // index into the radial term tables
    eta: usize,
}

/// The full feature vector definition.
#[derive(Debug, Clone)]
pub struct DescriptorSet {
    cutoff_function: CutoffFunction,
    groups: Vec<DescriptorGroup>,
    num_descriptors: usize,
    two_body: Vec<TwoBodyEntry>,
    three_body: Vec<ThreeBodyEntry>,
    distinct_lambda: Vec<f64>,
    distinct_zeta: Vec<f64>,
    distinct_eta: Vec<f64>,
    normalization: Option<Normalization>,
}

impl DescriptorSet {
    pub fn new(
        cutoff_function: CutoffFunction,
        groups: Vec<DescriptorGroup>,
        normalization: Option<Normalization>,
    ) -> FailResult<Self> {
        let mut two_body = vec![];
        let mut three_body = vec![];
        let mut distinct_lambda = vec![];
        let mut distinct_zeta = vec![];
        let mut distinct_eta = vec![];

        // first pass to find the distinct values, since the table
        // layout depends on how many zetas there are
        for group in &groups {
            if let DescriptorGroup::Triplet(params) = group {
                for p in params {
                    distinct_index(&mut distinct_lambda, p.lambda);
                    distinct_index(&mut distinct_zeta, p.zeta);
                    distinct_index(&mut distinct_eta, p.eta);
                }
            }
        }

        let mut global = 0;
        for group in &groups {
            match group {
                DescriptorGroup::Pairwise(params) => for &params in params {
                    two_body.push(TwoBodyEntry { global, params });
                    global += 1;
                },
                DescriptorGroup::Triplet(params) => for p in params {
                    let lambda = distinct_index(&mut distinct_lambda, p.lambda);
                    let zeta = distinct_index(&mut distinct_zeta, p.zeta);
                    let eta = distinct_index(&mut distinct_eta, p.eta);
                    let lambda_zeta = lambda * distinct_zeta.len() + zeta;
                    three_body.push(ThreeBodyEntry { global, lambda_zeta, eta });
                    global += 1;
                },
            }
        }
        let num_descriptors = global;

        if let Some(norm) = &normalization {
            validate_normalization(norm, num_descriptors)?;
        }

        debug!(
            "descriptors: {} two-body, {} three-body ({} distinct lambda, {} distinct zeta, {} distinct eta), normalized: {}",
            two_body.len(), three_body.len(),
            distinct_lambda.len(), distinct_zeta.len(), distinct_eta.len(),
            normalization.is_some(),
        );

        Ok(DescriptorSet {
            cutoff_function, groups, num_descriptors,
            two_body, three_body,
            distinct_lambda, distinct_zeta, distinct_eta,
            normalization,
        })
    }

    pub fn cutoff_function(&self) -> CutoffFunction { self.cutoff_function }
    pub fn groups(&self) -> &[DescriptorGroup] { &self.groups }
    pub fn normalization(&self) -> Option<&Normalization> { self.normalization.as_ref() }

    /// Length of the feature vector.
    pub fn num_descriptors(&self) -> usize { self.num_descriptors }
    pub fn num_two_body(&self) -> usize { self.two_body.len() }
    pub fn num_three_body(&self) -> usize { self.three_body.len() }

    /// Feature vector index of each two-body descriptor.
    pub fn two_body_indices(&self) -> impl ExactSizeIterator<Item=usize> + '_
    { self.two_body.iter().map(|entry| entry.global) }

    /// Feature vector index of each three-body descriptor.
    pub fn three_body_indices(&self) -> impl ExactSizeIterator<Item=usize> + '_
    { self.three_body.iter().map(|entry| entry.global) }
}

// Index of `value` in `values`, appending it if new.
fn distinct_index(values: &mut Vec<f64>, value: f64) -> usize {
    match values.iter().position(|&x| x == value) {
        Some(index) => index,
        None => {
            values.push(value);
            values.len() - 1
        },
    }
}

fn validate_normalization(norm: &Normalization, num_descriptors: usize) -> FailResult<()> {
    let Normalization { mean, std } = norm;
    for &(name, len) in &[("mean", mean.len()), ("std", std.len())] {
        if len != num_descriptors {
            throw!(ConfigError::BadNormalization(format!(
                "{} has length {}, but there are {} descriptors", name, len, num_descriptors,
            )));
        }
    }
    if let Some(t) = mean.iter().position(|x| !x.is_finite()) {
        throw!(ConfigError::BadNormalization(format!("mean[{}] = {}", t, mean[t])));
    }
    if let Some(t) = std.iter().position(|&x| !(x.is_finite() && x > 0.0)) {
        throw!(ConfigError::BadNormalization(format!("std[{}] = {} is not positive", t, std[t])));
    }
    Ok(())
}

//------------------------------------------------------------------

/// A neighbor of the central atom that lies inside its cutoff.
#[derive(Debug, Copy, Clone)]
pub(crate) struct PairSlot {
    pub atom: usize,
    /// `x_neighbor - x_center`
    pub delta: V3,
    pub r: f64,
    pub rcut: f64,
}

/// An unordered pair of in-cutoff neighbors `j`, `k` that are also inside
/// each other's cutoff.
#[derive(Debug, Copy, Clone)]
pub(crate) struct TripletSlot {
    /// Index into the pair slots. Always less than `k`.
    pub j: usize,
    /// Index into the pair slots.
    pub k: usize,
    /// `x_k - x_j`
    pub delta_jk: V3,
    pub r_jk: f64,
    pub rcut_jk: f64,
}

/// Per-atom working memory.
///
/// Reused from one atom to the next; `reset` empties it without releasing
/// capacity, so after the first few atoms no allocation occurs.
#[derive(Debug, Default)]
pub(crate) struct AtomScratch {
    pub pairs: Vec<PairSlot>,
    pub triplets: Vec<TripletSlot>,
    /// The feature vector (after normalization, if any).
    pub features: Vec<f64>,
    /// `d(feature)/d(r_ij)`, indexed by `[pair slot][two-body index]`.
    pub d_two: Vec<f64>,
    /// `d(feature)/d(r_ij, r_ik, r_jk)`, indexed by `[triplet slot][three-body index]`.
    pub d_three: Vec<[f64; 3]>,
    /// Energy gradient with respect to the unnormalized features.
    pub de_dfeature: Vec<f64>,
    pair_cutoffs: Vec<(f64, f64)>,
    terms: TripletTerms,
}

impl AtomScratch {
    pub fn new() -> Self { Default::default() }

    pub fn reset(&mut self) {
        self.pairs.clear();
        self.triplets.clear();
        self.features.clear();
        self.d_two.clear();
        self.d_three.clear();
        self.de_dfeature.clear();
        self.pair_cutoffs.clear();
    }
}

/// Angular and radial factors of `g4` for one triplet, tabulated over the
/// distinct parameter values so that parameter sets sharing a value share the work.
#[derive(Debug, Default)]
struct TripletTerms {
    // [lambda][zeta]
    angular: Vec<f64>,
    angular_d_r: Vec<[f64; 3]>,
    // [eta]
    radial: Vec<f64>,
    radial_d_r: Vec<[f64; 3]>,
}

impl TripletTerms {
    fn precompute(&mut self, set: &DescriptorSet, r: [f64; 3]) {
        self.angular.clear();
        self.angular_d_r.clear();
        self.radial.clear();
        self.radial_d_r.clear();

        let (cos, cos_d_r) = triplet_cosine(r);
        for &lambda in &set.distinct_lambda {
            let base = 1.0 + lambda * cos;
            for &zeta in &set.distinct_zeta {
                if base <= 0.0 {
                    self.angular.push(0.0);
                    self.angular_d_r.push([0.0; 3]);
                    continue;
                }
                let prefactor = f64::powf(2.0, 1.0 - zeta);
                let value = prefactor * base.powf(zeta);
                let d_cos = prefactor * zeta * base.powf(zeta - 1.0) * lambda;
                self.angular.push(value);
                self.angular_d_r.push([d_cos * cos_d_r[0], d_cos * cos_d_r[1], d_cos * cos_d_r[2]]);
            }
        }

        let sqsum = r[0] * r[0] + r[1] * r[1] + r[2] * r[2];
        for &eta in &set.distinct_eta {
            let value = f64::exp(-eta * sqsum);
            let d_sqsum = -eta * value;
            self.radial.push(value);
            self.radial_d_r.push([2.0 * r[0] * d_sqsum, 2.0 * r[1] * d_sqsum, 2.0 * r[2] * d_sqsum]);
        }
    }
}

/// Pairwise symmetry function, given the cutoff function value and derivative at `r`.
///
/// Returns the value and derivative with respect to `r`.
#[inline]
pub fn g2(params: G2, r: f64, fc: f64, fc_d_r: f64) -> (f64, f64) {
    let G2 { eta, rs } = params;
    let offset = r - rs;
    let gauss = f64::exp(-eta * offset * offset);
    let gauss_d_r = -2.0 * eta * offset * gauss;
    (gauss * fc, gauss_d_r * fc + gauss * fc_d_r)
}

/// Cosine of the angle at `i` in the triangle with sides `[r_ij, r_ik, r_jk]`,
/// and its derivatives with respect to each side.
#[inline]
pub fn triplet_cosine(r: [f64; 3]) -> (f64, [f64; 3]) {
    let [rij, rik, rjk] = r;
    let (rijsq, riksq, rjksq) = (rij * rij, rik * rik, rjk * rjk);

    let value = (rijsq + riksq - rjksq) / (2.0 * rij * rik);
    let d_rij = (rijsq - riksq + rjksq) / (2.0 * rijsq * rik);
    let d_rik = (riksq - rijsq + rjksq) / (2.0 * rij * riksq);
    let d_rjk = -rjk / (rij * rik);
    (value, [d_rij, d_rik, d_rjk])
}

// product rule over the angular, radial, and cutoff factors
#[inline(always)]
fn g4_from_terms(
    angular: f64, angular_d_r: [f64; 3],
    radial: f64, radial_d_r: [f64; 3],
    fc: f64, fc_d_r: [f64; 3],
) -> (f64, [f64; 3]) {
    let value = angular * radial * fc;
    let mut d_r = [0.0; 3];
    for x in 0..3 {
        d_r[x] = angular_d_r[x] * radial * fc
            + angular * radial_d_r[x] * fc
            + angular * radial * fc_d_r[x];
    }
    (value, d_r)
}

impl DescriptorSet {
    /// Fill in the feature vector and the derivative tables for the pairs and
    /// triplets currently in the scratch.
    pub(crate) fn evaluate(&self, scratch: &mut AtomScratch) {
        let AtomScratch {
            pairs, triplets, features, d_two, d_three,
            pair_cutoffs, terms, ..
        } = scratch;

        features.clear();
        features.resize(self.num_descriptors, 0.0);

        // two-body pass
        let n_two = self.two_body.len();
        d_two.clear();
        d_two.resize(pairs.len() * n_two, 0.0);
        pair_cutoffs.clear();
        for (slot, pair) in pairs.iter().enumerate() {
            let (fc, fc_d_r) = self.cutoff_function.compute(pair.r, pair.rcut);
            pair_cutoffs.push((fc, fc_d_r));

            let row = &mut d_two[slot * n_two..(slot + 1) * n_two];
            for (entry, out) in self.two_body.iter().zip(row) {
                let (value, d_r) = g2(entry.params, pair.r, fc, fc_d_r);
                features[entry.global] += value;
                *out = d_r;
            }
        }

        // three-body pass
        let n_three = self.three_body.len();
        d_three.clear();
        d_three.resize(triplets.len() * n_three, [0.0; 3]);
        for (slot, triplet) in triplets.iter().enumerate() {
            let r = [pairs[triplet.j].r, pairs[triplet.k].r, triplet.r_jk];
            let (fc_ij, fc_ij_d_r) = pair_cutoffs[triplet.j];
            let (fc_ik, fc_ik_d_r) = pair_cutoffs[triplet.k];
            let (fc_jk, fc_jk_d_r) = self.cutoff_function.compute(triplet.r_jk, triplet.rcut_jk);
            let fc = fc_ij * fc_ik * fc_jk;
            let fc_d_r = [
                fc_ij_d_r * fc_ik * fc_jk,
                fc_ij * fc_ik_d_r * fc_jk,
                fc_ij * fc_ik * fc_jk_d_r,
            ];

            terms.precompute(self, r);

            let row = &mut d_three[slot * n_three..(slot + 1) * n_three];
            for (entry, out) in self.three_body.iter().zip(row) {
                let (value, d_r) = g4_from_terms(
                    terms.angular[entry.lambda_zeta], terms.angular_d_r[entry.lambda_zeta],
                    terms.radial[entry.eta], terms.radial_d_r[entry.eta],
                    fc, fc_d_r,
                );
                features[entry.global] += value;
                *out = d_r;
            }
        }

        if let Some(Normalization { mean, std }) = &self.normalization {
            for t in 0..self.num_descriptors {
                features[t] = (features[t] - mean[t]) / std[t];
            }
        }
    }

    /// Convert a gradient with respect to the (normalized) network inputs into a
    /// gradient with respect to the raw features, times `scale`.
    pub(crate) fn raw_feature_gradient(&self, grad_input: &[f64], scale: f64, out: &mut Vec<f64>) {
        out.clear();
        match &self.normalization {
            None => out.extend(grad_input.iter().map(|&g| scale * g)),
            Some(Normalization { std, .. }) => {
                out.extend(grad_input.iter().zip(std).map(|(&g, &std)| scale * g / std));
            },
        }
    }

    /// `dE/dr_ij` for one pair slot, given the raw feature gradient.
    #[inline]
    pub(crate) fn pair_de_dr(&self, scratch: &AtomScratch, slot: usize) -> f64 {
        let n_two = self.two_body.len();
        let row = &scratch.d_two[slot * n_two..(slot + 1) * n_two];
        self.two_body.iter().zip(row)
            .map(|(entry, &d_r)| d_r * scratch.de_dfeature[entry.global])
            .sum()
    }

    /// `dE/d(r_ij, r_ik, r_jk)` for one triplet slot, given the raw feature gradient.
    #[inline]
    pub(crate) fn triplet_de_dr(&self, scratch: &AtomScratch, slot: usize) -> [f64; 3] {
        let n_three = self.three_body.len();
        let row = &scratch.d_three[slot * n_three..(slot + 1) * n_three];
        let mut out = [0.0; 3];
        for (entry, d_r) in self.three_body.iter().zip(row) {
            let de_dfeature = scratch.de_dfeature[entry.global];
            for x in 0..3 {
                out[x] += d_r[x] * de_dfeature;
            }
        }
        out
    }
}

//------------------------------------------------------------------
