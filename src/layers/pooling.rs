use crate::{Error, Result, Tensor};
use ndarray::{Array1, Array3, Axis};

/// Max pooling over non-overlapping windows (floor mode: a trailing partial
/// window is dropped).
#[derive(Debug, Clone)]
pub struct MaxPooling2D {
    name: String,
    pool_size: (usize, usize),
    strides: (usize, usize),
}

/// Averages each channel over all spatial positions: `[C, H, W] -> [C]`.
#[derive(Debug, Clone)]
pub struct GlobalAveragePooling2D {
    name: String,
}

impl MaxPooling2D {
    pub fn new(name: String, pool_size: (usize, usize), strides: Option<(usize, usize)>) -> Self {
        let strides = strides.unwrap_or(pool_size);
        Self {
            name,
            pool_size,
            strides,
        }
    }

    fn compute_output_size(&self, height: usize, width: usize) -> Result<(usize, usize)> {
        if self.pool_size.0 == 0 || self.pool_size.1 == 0 || self.strides.0 == 0 || self.strides.1 == 0 {
            return Err(Error::Layer(format!(
                "MaxPooling2D {} has a zero window or stride",
                self.name
            )));
        }

        if height < self.pool_size.0 || width < self.pool_size.1 {
            return Err(Error::Layer(format!(
                "MaxPooling2D {} window {:?} larger than input {}x{}",
                self.name, self.pool_size, height, width
            )));
        }

        let out_height = (height - self.pool_size.0) / self.strides.0 + 1;
        let out_width = (width - self.pool_size.1) / self.strides.1 + 1;

        Ok((out_height, out_width))
    }
}

impl super::Layer for MaxPooling2D {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let input_3d = input.as_chw()?;
        let (channels, height, width) = input_3d.dim();

        let (out_height, out_width) = self.compute_output_size(height, width)?;

        let mut output = Array3::zeros((channels, out_height, out_width));

        for c in 0..channels {
            for oh in 0..out_height {
                for ow in 0..out_width {
                    let h_start = oh * self.strides.0;
                    let w_start = ow * self.strides.1;
                    let h_end = h_start + self.pool_size.0;
                    let w_end = w_start + self.pool_size.1;

                    let mut max_val = f32::NEG_INFINITY;
                    for h in h_start..h_end {
                        for w in w_start..w_end {
                            let val = input_3d[[c, h, w]];
                            if val > max_val {
                                max_val = val;
                            }
                        }
                    }
                    output[[c, oh, ow]] = max_val;
                }
            }
        }

        Ok(Tensor::new(output.into_dyn()))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        if input_shape.len() != 3 {
            return Err(Error::Layer(format!(
                "MaxPooling2D expects [channels, height, width] input, got {:?}",
                input_shape
            )));
        }

        let (out_height, out_width) = self.compute_output_size(input_shape[1], input_shape[2])?;
        Ok(vec![input_shape[0], out_height, out_width])
    }
}

impl GlobalAveragePooling2D {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

impl super::Layer for GlobalAveragePooling2D {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let input_3d = input.as_chw()?;
        let (_, height, width) = input_3d.dim();

        if height == 0 || width == 0 {
            return Err(Error::Layer(format!(
                "GlobalAveragePooling2D {} got an empty feature map",
                self.name
            )));
        }

        let count = (height * width) as f32;
        let output: Array1<f32> = input_3d
            .axis_iter(Axis(0))
            .map(|plane| plane.sum() / count)
            .collect();

        Ok(Tensor::new(output.into_dyn()))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        if input_shape.len() != 3 {
            return Err(Error::Layer(format!(
                "GlobalAveragePooling2D expects [channels, height, width] input, got {:?}",
                input_shape
            )));
        }
        Ok(vec![input_shape[0]])
    }
}
