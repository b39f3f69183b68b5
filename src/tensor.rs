use ndarray::{Array, ArrayD, Ix3, IxDyn};

use crate::{Error, Result};

/// Dense f32 tensor. Feature maps are channel-first `[C, H, W]`, vectors are `[N]`.
#[derive(Clone, Debug)]
pub struct Tensor {
    data: ArrayD<f32>,
}

impl Tensor {
    pub fn new(data: ArrayD<f32>) -> Self {
        Self { data }
    }

    pub fn from_vec(vec: Vec<f32>, shape: &[usize]) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != vec.len() {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                actual: vec![vec.len()],
            });
        }

        let data = Array::from_shape_vec(IxDyn(shape), vec)
            .map_err(|e| Error::Layer(format!("Tensor construction failed: {}", e)))?;
        Ok(Self { data })
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ArrayD<f32> {
        &mut self.data
    }

    pub fn zeros(shape: &[usize]) -> Self {
        let data = ArrayD::zeros(IxDyn(shape));
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow a rank-3 tensor as a `[C, H, W]` feature map.
    pub fn as_chw(&self) -> Result<ndarray::ArrayView3<'_, f32>> {
        self.data
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|_| {
                Error::Layer(format!(
                    "expected a [channels, height, width] tensor, got {:?}",
                    self.shape()
                ))
            })
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }
}
