use crate::Tensor;
use ndarray::Zip;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    Linear,
    ReLU,
    Sigmoid,
}

impl Activation {
    pub fn apply(&self, tensor: &mut Tensor) {
        match self {
            Activation::Linear => {}
            Activation::ReLU => {
                Zip::from(tensor.data_mut()).for_each(|x| {
                    *x = x.max(0.0);
                });
            }
            Activation::Sigmoid => {
                Zip::from(tensor.data_mut()).for_each(|x| {
                    *x = sigmoid(*x);
                });
            }
        }
    }
}

/// Logistic function. Branches on sign so `exp` never overflows.
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
