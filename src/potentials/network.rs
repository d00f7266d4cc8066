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

//! Per-atom energy networks.

use crate::{FailResult, ConfigError};

use itertools::Itertools;

/// Maps a feature vector to an atomic energy, with a reverse-mode gradient.
///
/// The network itself is immutable; everything retained between `forward` and
/// `backward` lives in a `Workspace` owned by the caller, so that a single
/// network can be shared between threads, each evaluating its own atoms.
pub trait Network: Sync {
    type Workspace: Send;

    /// Length of the feature vector.
    fn num_inputs(&self) -> usize;

    /// Create a workspace suitable for use with this network.
    fn workspace(&self) -> Self::Workspace;

    /// Evaluate the network, retaining whatever `backward` will need.
    fn forward(&self, ws: &mut Self::Workspace, features: &[f64]);

    /// Sum of the outputs of the most recent `forward`.
    fn sum_output(&self, ws: &Self::Workspace) -> f64;

    /// Compute the gradient of `sum_output` with respect to the inputs of
    /// the most recent `forward`.
    fn backward(&self, ws: &mut Self::Workspace);

    /// The gradient computed by the most recent `backward`.
    fn grad_input<'a>(&self, ws: &'a Self::Workspace) -> &'a [f64];
}

/// Nonlinearity applied after every hidden layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
    /// Exponential linear unit with `alpha = 1`.
    Elu,
    Identity,
}

impl Activation {
    pub fn from_name(name: &str) -> FailResult<Self> {
        Ok(match name {
            "sigmoid" => Activation::Sigmoid,
            "tanh" => Activation::Tanh,
            "relu" => Activation::Relu,
            "elu" => Activation::Elu,
            "identity" | "linear" => Activation::Identity,
            _ => bail!("unknown activation function '{}'", name),
        })
    }

    /// Value and derivative.
    #[inline]
    pub fn compute(self, x: f64) -> (f64, f64) {
        match self {
            Activation::Sigmoid => {
                let value = 1.0 / (1.0 + f64::exp(-x));
                (value, value * (1.0 - value))
            },
            Activation::Tanh => {
                let value = x.tanh();
                (value, 1.0 - value * value)
            },
            Activation::Relu => match x > 0.0 {
                true => (x, 1.0),
                false => (0.0, 0.0),
            },
            Activation::Elu => match x > 0.0 {
                true => (x, 1.0),
                false => {
                    let exp = f64::exp(x);
                    (exp - 1.0, exp)
                },
            },
            Activation::Identity => (x, 1.0),
        }
    }
}

/// A dense layer, `y = x W + b`.
#[derive(Debug, Clone)]
pub struct Layer {
    num_inputs: usize,
    num_outputs: usize,
    // [input][output]
    weights: Vec<f64>,
    bias: Vec<f64>,
}

impl Layer {
    /// `weights` is indexed as `[input][output]`.
    pub fn new(weights: Vec<Vec<f64>>, bias: Vec<f64>) -> FailResult<Self> {
        let num_inputs = weights.len();
        let num_outputs = bias.len();
        if num_outputs == 0 {
            throw!(ConfigError::ShapeMismatch("layer has no outputs".to_string()));
        }
        if let Some(row) = weights.iter().position(|row| row.len() != num_outputs) {
            throw!(ConfigError::ShapeMismatch(format!(
                "weight row {} has length {}, but the bias has length {}",
                row, weights[row].len(), num_outputs,
            )));
        }
        let weights = Iterator::flatten(weights.into_iter()).collect();
        Ok(Layer { num_inputs, num_outputs, weights, bias })
    }

    pub fn num_inputs(&self) -> usize { self.num_inputs }
    pub fn num_outputs(&self) -> usize { self.num_outputs }

    fn apply(&self, input: &[f64], out: &mut [f64]) {
        out.copy_from_slice(&self.bias);
        for (x, row) in input.iter().zip(self.weights.chunks(self.num_outputs)) {
            for (y, w) in out.iter_mut().zip(row) {
                *y += x * w;
            }
        }
    }

    // gradient with respect to the input, given the gradient with respect to the output
    fn apply_transpose(&self, d_out: &[f64], d_in: &mut [f64]) {
        for (d_x, row) in d_in.iter_mut().zip(self.weights.chunks(self.num_outputs)) {
            *d_x = row.iter().zip(d_out).map(|(w, d_y)| w * d_y).sum();
        }
    }
}

/// A multi-layer perceptron.  The last layer is linear; every other layer is
/// followed by the activation function.
#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    activation: Activation,
    layers: Vec<Layer>,
}

/// Activations retained between `forward` and `backward`.
#[derive(Debug, Clone)]
pub struct NeuralNetworkWorkspace {
    // values[0] is the input; values[l + 1] is the output of layer l (after activation)
    values: Vec<Vec<f64>>,
    // derivative of the activation at each hidden layer's output
    slopes: Vec<Vec<f64>>,
    // gradient with respect to values[l]
    grads: Vec<Vec<f64>>,
}

impl NeuralNetwork {
    pub fn new(activation: Activation, layers: Vec<Layer>) -> FailResult<Self> {
        if layers.is_empty() {
            throw!(ConfigError::ShapeMismatch("network has no layers".to_string()));
        }
        for (index, (a, b)) in layers.iter().tuple_windows().enumerate() {
            if a.num_outputs != b.num_inputs {
                throw!(ConfigError::ShapeMismatch(format!(
                    "layer {} has {} outputs, but layer {} has {} inputs",
                    index, a.num_outputs, index + 1, b.num_inputs,
                )));
            }
        }

        debug!(
            "network: {:?}, layer sizes {}",
            activation,
            std::iter::once(layers[0].num_inputs)
                .chain(layers.iter().map(|layer| layer.num_outputs))
                .join(" -> "),
        );
        Ok(NeuralNetwork { activation, layers })
    }

    pub fn activation(&self) -> Activation { self.activation }
    pub fn layers(&self) -> &[Layer] { &self.layers }
}

impl Network for NeuralNetwork {
    type Workspace = NeuralNetworkWorkspace;

    fn num_inputs(&self) -> usize { self.layers[0].num_inputs }

    fn workspace(&self) -> NeuralNetworkWorkspace {
        let mut sizes = vec![self.num_inputs()];
        sizes.extend(self.layers.iter().map(|layer| layer.num_outputs));
        let hidden = &sizes[1..sizes.len() - 1];

        NeuralNetworkWorkspace {
            values: sizes.iter().map(|&n| vec![0.0; n]).collect(),
            slopes: hidden.iter().map(|&n| vec![0.0; n]).collect(),
            grads: sizes.iter().map(|&n| vec![0.0; n]).collect(),
        }
    }

    fn forward(&self, ws: &mut NeuralNetworkWorkspace, features: &[f64]) {
        assert_eq!(features.len(), self.num_inputs(), "wrong number of features");
        ws.values[0].copy_from_slice(features);

        let last = self.layers.len() - 1;
        for (l, layer) in self.layers.iter().enumerate() {
            let (inputs, outputs) = ws.values.split_at_mut(l + 1);
            let output = &mut outputs[0];
            layer.apply(&inputs[l], output);

            if l != last {
                for (y, slope) in output.iter_mut().zip(&mut ws.slopes[l]) {
                    let (value, d_y) = self.activation.compute(*y);
                    *y = value;
                    *slope = d_y;
                }
            }
        }
    }

    fn sum_output(&self, ws: &NeuralNetworkWorkspace) -> f64 {
        ws.values[self.layers.len()].iter().sum()
    }

    fn backward(&self, ws: &mut NeuralNetworkWorkspace) {
        let NeuralNetworkWorkspace { grads, slopes, .. } = ws;

        for d_y in &mut grads[self.layers.len()] {
            *d_y = 1.0;
        }
        for (l, layer) in self.layers.iter().enumerate().rev() {
            let (before, after) = grads.split_at_mut(l + 1);
            let d_in = &mut before[l];
            layer.apply_transpose(&after[0], d_in);

            // through the activation that produced this layer's input
            if l > 0 {
                for (d_x, slope) in d_in.iter_mut().zip(&slopes[l - 1]) {
                    *d_x *= slope;
                }
            }
        }
    }

    fn grad_input<'a>(&self, ws: &'a NeuralNetworkWorkspace) -> &'a [f64] {
        &ws.grads[0]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::util::uniform;
    use nnip_numerical::gradient;

    pub(crate) fn random_network(activation: Activation, sizes: &[usize]) -> NeuralNetwork {
        let layers = sizes.iter().tuple_windows().map(|(&n_in, &n_out)| {
            let weights = (0..n_in).map(|_| (0..n_out).map(|_| uniform(-1.0, 1.0)).collect()).collect();
            let bias = (0..n_out).map(|_| uniform(-0.5, 0.5)).collect();
            Layer::new(weights, bias).unwrap()
        }).collect();
        NeuralNetwork::new(activation, layers).unwrap()
    }

    fn evaluate(network: &NeuralNetwork, features: &[f64]) -> f64 {
        let mut ws = network.workspace();
        network.forward(&mut ws, features);
        network.sum_output(&ws)
    }

    #[test]
    fn single_linear_layer() {
        let layer = Layer::new(vec![vec![2.0], vec![-3.0]], vec![0.5]).unwrap();
        let network = NeuralNetwork::new(Activation::Tanh, vec![layer]).unwrap();
        let mut ws = network.workspace();

        network.forward(&mut ws, &[1.0, 4.0]);
        assert_eq!(network.sum_output(&ws), 2.0 - 12.0 + 0.5);
        network.backward(&mut ws);
        assert_eq!(network.grad_input(&ws), &[2.0, -3.0][..]);
    }

    #[test]
    fn sums_multiple_outputs() {
        let hidden = Layer::new(vec![vec![1.0, -1.0]], vec![0.0, 0.0]).unwrap();
        let out = Layer::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![0.0, 1.0]).unwrap();
        let network = NeuralNetwork::new(Activation::Relu, vec![hidden, out]).unwrap();

        // hidden = relu([2, -2]) = [2, 0]; out = [2, 4 + 1]
        assert_eq!(evaluate(&network, &[2.0]), 7.0);
    }

    #[test]
    fn num_grad() {
        for &activation in &[Activation::Sigmoid, Activation::Tanh, Activation::Elu, Activation::Identity] {
            for _ in 0..10 {
                let network = random_network(activation, &[5, 8, 6, 1]);
                let features: Vec<_> = (0..5).map(|_| uniform(-2.0, 2.0)).collect();

                let mut ws = network.workspace();
                network.forward(&mut ws, &features);
                network.backward(&mut ws);

                assert_close!(
                    rel=1e-7, abs=1e-9,
                    network.grad_input(&ws).to_vec(),
                    gradient(1e-4, None, &features, |x| evaluate(&network, x)),
                    "{:?}", activation,
                );
            }
        }
    }

    #[test]
    fn workspace_reuse() {
        let network = random_network(Activation::Tanh, &[3, 4, 1]);
        let a = [0.1, 0.2, 0.3];
        let b = [-1.0, 0.0, 2.0];

        let mut ws = network.workspace();
        network.forward(&mut ws, &a);
        network.forward(&mut ws, &b);
        network.backward(&mut ws);
        let reused = network.grad_input(&ws).to_vec();

        let mut fresh = network.workspace();
        network.forward(&mut fresh, &b);
        network.backward(&mut fresh);
        assert_eq!(reused, network.grad_input(&fresh).to_vec());
    }

    #[test]
    fn bad_shapes() {
        let layer = |n_in: usize, n_out: usize| Layer::new(vec![vec![0.0; n_out]; n_in], vec![0.0; n_out]).unwrap();
        assert!(NeuralNetwork::new(Activation::Tanh, vec![]).is_err());
        assert!(NeuralNetwork::new(Activation::Tanh, vec![layer(3, 4), layer(5, 1)]).is_err());
        assert!(NeuralNetwork::new(Activation::Tanh, vec![layer(3, 4), layer(4, 1)]).is_ok());
        assert!(Layer::new(vec![vec![0.0; 2], vec![0.0; 3]], vec![0.0; 2]).is_err());
        assert!(Layer::new(vec![vec![]], vec![]).is_err());
        assert!(Activation::from_name("softsign").is_err());
    }
}
