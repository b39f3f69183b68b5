use crate::{activations::Activation, conv2d_impl::im2col, Error, Result, Tensor};
use ndarray::{Array1, Array2, Array4, Axis};

/// Valid (unpadded) 2D convolution over a `[C, H, W]` feature map.
///
/// Weights use the PyTorch layout `[filters, in_channels, kernel_h, kernel_w]`.
#[derive(Debug, Clone)]
pub struct Conv2D {
    name: String,
    filters: usize,
    in_channels: usize,
    kernel_size: (usize, usize),
    strides: (usize, usize),
    kernel: Array2<f32>,
    bias: Option<Array1<f32>>,
    activation: Activation,
}

impl Conv2D {
    pub fn new(
        name: String,
        strides: (usize, usize),
        weights: Array4<f32>,
        bias: Option<Array1<f32>>,
        activation: Activation,
    ) -> Result<Self> {
        let (filters, in_channels, kernel_h, kernel_w) = weights.dim();

        if filters == 0 || in_channels == 0 || kernel_h == 0 || kernel_w == 0 {
            return Err(Error::Layer(format!(
                "Conv2D {} has a degenerate kernel {:?}",
                name,
                weights.shape()
            )));
        }

        if strides.0 == 0 || strides.1 == 0 {
            return Err(Error::Layer(format!("Conv2D {} has a zero stride", name)));
        }

        if let Some(ref b) = bias {
            if b.len() != filters {
                return Err(Error::Layer(format!(
                    "Bias size {} doesn't match filters {}",
                    b.len(),
                    filters
                )));
            }
        }

        // Flattened once here; forward is then a single GEMM per call.
        let kernel = weights
            .into_shape_with_order((filters, in_channels * kernel_h * kernel_w))
            .map_err(|e| Error::Layer(format!("Reshape failed: {}", e)))?;

        Ok(Self {
            name,
            filters,
            in_channels,
            kernel_size: (kernel_h, kernel_w),
            strides,
            kernel,
            bias,
            activation,
        })
    }

    fn compute_output_size(&self, height: usize, width: usize) -> Result<(usize, usize)> {
        if height < self.kernel_size.0 || width < self.kernel_size.1 {
            return Err(Error::Layer(format!(
                "Conv2D {} kernel {:?} larger than input {}x{}",
                self.name, self.kernel_size, height, width
            )));
        }

        let out_height = (height - self.kernel_size.0) / self.strides.0 + 1;
        let out_width = (width - self.kernel_size.1) / self.strides.1 + 1;

        Ok((out_height, out_width))
    }
}

impl super::Layer for Conv2D {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let input_3d = input.as_chw()?;
        let (in_channels, height, width) = input_3d.dim();

        if in_channels != self.in_channels {
            return Err(Error::ShapeMismatch {
                expected: vec![self.in_channels],
                actual: vec![in_channels],
            });
        }

        let (out_height, out_width) = self.compute_output_size(height, width)?;

        let cols = im2col(
            input_3d,
            self.kernel_size.0,
            self.kernel_size.1,
            self.strides.0,
            self.strides.1,
            out_height,
            out_width,
        );

        let mut output = self.kernel.dot(&cols);

        if let Some(ref bias) = self.bias {
            for (mut row, &b) in output.axis_iter_mut(Axis(0)).zip(bias.iter()) {
                row += b;
            }
        }

        let output_dyn = output
            .into_shape_with_order(ndarray::IxDyn(&[self.filters, out_height, out_width]))
            .map_err(|e| Error::Layer(format!("Reshape failed: {}", e)))?;

        let mut tensor = Tensor::new(output_dyn);
        self.activation.apply(&mut tensor);

        Ok(tensor)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        if input_shape.len() != 3 {
            return Err(Error::Layer(format!(
                "Conv2D expects [channels, height, width] input, got {:?}",
                input_shape
            )));
        }

        if input_shape[0] != self.in_channels {
            return Err(Error::ShapeMismatch {
                expected: vec![self.in_channels],
                actual: vec![input_shape[0]],
            });
        }

        let (out_height, out_width) = self.compute_output_size(input_shape[1], input_shape[2])?;
        Ok(vec![self.filters, out_height, out_width])
    }
}
