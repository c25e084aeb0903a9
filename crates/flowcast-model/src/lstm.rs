//! Stacked LSTM regression network.
//!
//! Weights use the Keras export layout: `kernel` is `[input, 4 * units]`,
//! `recurrent_kernel` is `[units, 4 * units]` and the gate blocks are
//! ordered input, forget, cell candidate, output. Every LSTM layer but the
//! last feeds its full hidden sequence to the next one; the last layer's
//! final hidden state goes through the dense head.

use ndarray::{s, Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use flow_core::{LOOK_BACK, N_FEATURES};

use crate::error::{ModelError, ModelResult};

/// A sequence-to-scalar model over a `[1, look_back, n_features]` tensor.
pub trait Predictor: Send + Sync {
    /// Return the scaled prediction for the target feature: the first
    /// output channel of the first batch element.
    fn infer(&self, tensor: &Array3<f64>) -> ModelResult<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => sigmoid(x),
            Activation::Tanh => x.tanh(),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone)]
pub struct LstmLayer {
    units: usize,
    kernel: Array2<f64>,
    recurrent: Array2<f64>,
    bias: Array1<f64>,
}

impl LstmLayer {
    pub fn new(
        kernel: Array2<f64>,
        recurrent: Array2<f64>,
        bias: Array1<f64>,
    ) -> ModelResult<Self> {
        let units = recurrent.nrows();
        if units == 0 {
            return Err(ModelError::Invalid("lstm layer has zero units".into()));
        }
        let gates = 4 * units;
        if recurrent.ncols() != gates {
            return Err(shape(&[units, gates], recurrent.shape()));
        }
        if kernel.ncols() != gates {
            return Err(shape(&[kernel.nrows(), gates], kernel.shape()));
        }
        if bias.len() != gates {
            return Err(shape(&[gates], bias.shape()));
        }
        Ok(Self {
            units,
            kernel,
            recurrent,
            bias,
        })
    }

    pub fn input_width(&self) -> usize {
        self.kernel.nrows()
    }

    /// Run the layer over `seq` (`timesteps x input`) from a zero state and
    /// return the hidden state at every step (`timesteps x units`).
    fn run(&self, seq: ArrayView2<f64>) -> Array2<f64> {
        let u = self.units;
        let mut h = Array1::<f64>::zeros(u);
        let mut c = Array1::<f64>::zeros(u);
        let mut hidden = Array2::<f64>::zeros((seq.nrows(), u));

        for (t, x) in seq.outer_iter().enumerate() {
            let z = x.dot(&self.kernel) + h.dot(&self.recurrent) + &self.bias;
            let i = z.slice(s![0..u]).mapv(sigmoid);
            let f = z.slice(s![u..2 * u]).mapv(sigmoid);
            let g = z.slice(s![2 * u..3 * u]).mapv(f64::tanh);
            let o = z.slice(s![3 * u..4 * u]).mapv(sigmoid);

            c = &f * &c + &i * &g;
            h = &o * &c.mapv(f64::tanh);
            hidden.row_mut(t).assign(&h);
        }

        hidden
    }
}

#[derive(Debug, Clone)]
pub struct DenseLayer {
    weights: Array2<f64>,
    bias: Array1<f64>,
    activation: Activation,
}

impl DenseLayer {
    pub fn new(
        weights: Array2<f64>,
        bias: Array1<f64>,
        activation: Activation,
    ) -> ModelResult<Self> {
        if bias.len() != weights.ncols() {
            return Err(shape(&[weights.ncols()], bias.shape()));
        }
        Ok(Self {
            weights,
            bias,
            activation,
        })
    }

    fn forward(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let act = self.activation;
        (x.dot(&self.weights) + &self.bias).mapv(|v| act.apply(v))
    }
}

/// The trained forecaster.
#[derive(Debug, Clone)]
pub struct LstmModel {
    look_back: usize,
    n_features: usize,
    lstm: Vec<LstmLayer>,
    dense: Vec<DenseLayer>,
}

impl LstmModel {
    /// Assemble a model and check that its layers chain together and that
    /// it consumes the `LOOK_BACK x N_FEATURES` window.
    pub fn new(
        look_back: usize,
        n_features: usize,
        lstm: Vec<LstmLayer>,
        dense: Vec<DenseLayer>,
    ) -> ModelResult<Self> {
        if look_back != LOOK_BACK || n_features != N_FEATURES {
            return Err(ModelError::Invalid(format!(
                "model expects a {look_back}x{n_features} window, service provides {LOOK_BACK}x{N_FEATURES}"
            )));
        }
        if lstm.is_empty() {
            return Err(ModelError::Invalid("model has no lstm layers".into()));
        }

        let mut width = n_features;
        for layer in &lstm {
            if layer.input_width() != width {
                return Err(shape(&[width], &[layer.input_width()]));
            }
            width = layer.units;
        }
        for layer in &dense {
            if layer.weights.nrows() != width {
                return Err(shape(&[width], &[layer.weights.nrows()]));
            }
            width = layer.weights.ncols();
        }
        if width == 0 {
            return Err(ModelError::Invalid("model has no outputs".into()));
        }

        Ok(Self {
            look_back,
            n_features,
            lstm,
            dense,
        })
    }

    pub fn input_shape(&self) -> [usize; 3] {
        [1, self.look_back, self.n_features]
    }

    fn forward_one(&self, seq: ArrayView2<f64>) -> Array1<f64> {
        let mut hidden = seq.to_owned();
        for layer in &self.lstm {
            hidden = layer.run(hidden.view());
        }

        let mut out = hidden.row(hidden.nrows() - 1).to_owned();
        for layer in &self.dense {
            out = layer.forward(out.view());
        }
        out
    }
}

impl Predictor for LstmModel {
    fn infer(&self, tensor: &Array3<f64>) -> ModelResult<f64> {
        let expected = self.input_shape();
        if tensor.shape() != &expected[..] {
            return Err(shape(&expected, tensor.shape()));
        }

        let out = self.forward_one(tensor.index_axis(Axis(0), 0));
        let value = out[0];
        if !value.is_finite() {
            return Err(ModelError::NonFinite("model"));
        }
        Ok(value)
    }
}

fn shape(expected: &[usize], found: &[usize]) -> ModelError {
    ModelError::Shape {
        expected: expected.to_vec(),
        found: found.to_vec(),
    }
}
