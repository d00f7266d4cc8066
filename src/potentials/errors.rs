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

/// Problems with a model's parameters, detected while it is being set up.
#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "unsupported descriptor family '{}' (only 'g2' and 'g4' are supported)", name)]
    UnsupportedDescriptor { name: String },

    #[fail(display = "descriptor '{}' expects parameters {:?}, got {} values", name, expected, actual)]
    BadDescriptorParams { name: String, expected: &'static [&'static str], actual: usize },

    #[fail(display = "shape mismatch: {}", _0)]
    ShapeMismatch(String),

    #[fail(display = "bad cutoff table: {}", _0)]
    BadCutoffTable(String),

    #[fail(display = "bad feature normalization: {}", _0)]
    BadNormalization(String),

    #[fail(display = "bad pair correction: {}", _0)]
    BadPairCorrection(String),
}

/// Problems detected during a call to `Model::compute`.
///
/// Every variant except `PairReportRejected` is detected before any output
/// buffer is written.
#[derive(Debug, Fail)]
pub enum ComputeError {
    #[fail(display = "second derivatives (process_d2edr2) are not supported")]
    UnsupportedOutput,

    #[fail(display = "particle {} has species code {}, but the model has {} species", atom, species, num_species)]
    InvalidSpecies { atom: usize, species: usize, num_species: usize },

    #[fail(display = "buffer '{}' has length {} (expected {})", what, actual, expected)]
    BadBufferLength { what: &'static str, expected: usize, actual: usize },

    #[fail(display = "neighbor list of particle {} contains invalid index {}", atom, neighbor)]
    BadNeighbor { atom: usize, neighbor: usize },

    /// Wraps the error returned by a `PairDerivativeSink`.
    #[fail(display = "host rejected the pair derivative for particles {} and {}", a, b)]
    PairReportRejected { a: usize, b: usize },
}
