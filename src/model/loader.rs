use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2, Array4};
use safetensors::{Dtype, SafeTensors};

use crate::{
    activations::Activation,
    layers::{Conv2D, Dense, GlobalAveragePooling2D, MaxPooling2D},
    Error, Result,
};

use super::topology::{self, CONV_BLOCKS, DENSE_LAYERS, KERNEL_SIZE, POOL_SIZE};
use super::Sequential;

const MODEL_NAME: &str = "dog_cat_cnn";

/// Prefix PyTorch adds to every key when the module was wrapped in `DataParallel`.
const DATA_PARALLEL_PREFIX: &str = "module.";

pub fn load_safetensors(path: impl AsRef<Path>) -> Result<Sequential> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        Error::ModelLoad(format!("Failed to read weights file {}: {}", path.display(), e))
    })?;
    load_safetensors_bytes(&bytes)
}

pub fn load_safetensors_bytes(bytes: &[u8]) -> Result<Sequential> {
    let tensors = SafeTensors::deserialize(bytes)?;

    let mut model = Sequential::new(MODEL_NAME.to_string());
    model.set_input_shape(topology::input_shape());

    for block in &CONV_BLOCKS {
        let weight_shape = [block.out_channels, block.in_channels, KERNEL_SIZE, KERNEL_SIZE];
        let weight_data = read_param(&tensors, &format!("{}.weight", block.name), &weight_shape)?;
        let weights = Array4::from_shape_vec(weight_shape, weight_data)
            .map_err(|e| Error::ModelLoad(format!("Failed to create weights array: {}", e)))?;

        let bias = read_bias(&tensors, block.name, block.out_channels)?;

        model.add(Box::new(Conv2D::new(
            block.name.to_string(),
            (1, 1),
            weights,
            Some(bias),
            Activation::ReLU,
        )?));
        model.add(Box::new(MaxPooling2D::new(
            block.pool_name.to_string(),
            (POOL_SIZE, POOL_SIZE),
            None,
        )));
    }

    model.add(Box::new(GlobalAveragePooling2D::new(
        topology::GLOBAL_POOL_NAME.to_string(),
    )));

    for dense in &DENSE_LAYERS {
        let weight_shape = [dense.out_features, dense.in_features];
        let weight_data = read_param(&tensors, &format!("{}.weight", dense.name), &weight_shape)?;
        let weights = Array2::from_shape_vec(weight_shape, weight_data)
            .map_err(|e| Error::ModelLoad(format!("Failed to create weights array: {}", e)))?;

        let bias = read_bias(&tensors, dense.name, dense.out_features)?;

        model.add(Box::new(Dense::new(
            dense.name.to_string(),
            weights,
            Some(bias),
            dense.activation,
        )?));
    }

    Ok(model)
}

fn read_bias(tensors: &SafeTensors<'_>, layer: &str, len: usize) -> Result<Array1<f32>> {
    let data = read_param(tensors, &format!("{}.bias", layer), &[len])?;
    Ok(Array1::from_vec(data))
}

/// Fetch one parameter tensor, check its shape and widen it to `f32`.
fn read_param(tensors: &SafeTensors<'_>, key: &str, expected_shape: &[usize]) -> Result<Vec<f32>> {
    let view = tensors
        .tensor(key)
        .or_else(|_| tensors.tensor(&format!("{}{}", DATA_PARALLEL_PREFIX, key)))
        .map_err(|_| Error::ModelLoad(format!("tensor {} not found in weights file", key)))?;

    if view.shape() != expected_shape {
        return Err(Error::ShapeMismatch {
            expected: expected_shape.to_vec(),
            actual: view.shape().to_vec(),
        });
    }

    let values: Vec<f32> = match view.dtype() {
        Dtype::F32 => view
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
        Dtype::F64 => view
            .data()
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect(),
        other => {
            return Err(Error::ModelLoad(format!(
                "tensor {} has unsupported dtype {:?} (expected F32 or F64)",
                key, other
            )))
        }
    };

    if values.iter().any(|v| !v.is_finite()) {
        return Err(Error::ModelLoad(format!(
            "tensor {} contains non-finite values",
            key
        )));
    }

    Ok(values)
}
