use crate::{activations::Activation, Error, Result, Tensor};
use ndarray::{Array1, Array2, Ix1};

/// Fully-connected layer, `y = W x + b` with PyTorch `[units, features]` weights.
#[derive(Debug, Clone)]
pub struct Dense {
    name: String,
    weights: Array2<f32>,
    bias: Option<Array1<f32>>,
    activation: Activation,
    units: usize,
}

impl Dense {
    pub fn new(
        name: String,
        weights: Array2<f32>,
        bias: Option<Array1<f32>>,
        activation: Activation,
    ) -> Result<Self> {
        let units = weights.nrows();

        if let Some(ref b) = bias {
            if b.len() != units {
                return Err(Error::Layer(format!(
                    "Bias size {} doesn't match units {}",
                    b.len(),
                    units
                )));
            }
        }

        Ok(Self {
            name,
            weights,
            bias,
            activation,
            units,
        })
    }

    fn features(&self) -> usize {
        self.weights.ncols()
    }
}

impl super::Layer for Dense {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let input_1d = input
            .data()
            .view()
            .into_dimensionality::<Ix1>()
            .map_err(|_| {
                Error::Layer(format!(
                    "Dense layer expects 1D input, got {:?}",
                    input.shape()
                ))
            })?;

        if input_1d.len() != self.features() {
            return Err(Error::ShapeMismatch {
                expected: vec![self.features()],
                actual: vec![input_1d.len()],
            });
        }

        let mut output = self.weights.dot(&input_1d);

        if let Some(ref bias) = self.bias {
            output += bias;
        }

        let mut tensor = Tensor::new(output.into_dyn());
        self.activation.apply(&mut tensor);

        Ok(tensor)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        if input_shape.len() == 1 {
            Ok(vec![self.units])
        } else {
            Err(Error::Layer(format!(
                "Dense layer expects 1D input, got {:?}",
                input_shape
            )))
        }
    }
}
