//! Fixed layer layout of the cat/dog network.
//!
//! Parameter names follow the PyTorch `state_dict` of the training module so a
//! weights file exported from it loads without renaming.

use crate::activations::Activation;

/// Side length of the square input image.
pub const INPUT_SIZE: usize = 128;
pub const INPUT_CHANNELS: usize = 3;
pub const KERNEL_SIZE: usize = 3;
pub const POOL_SIZE: usize = 2;

pub struct ConvBlockSpec {
    pub name: &'static str,
    pub pool_name: &'static str,
    pub in_channels: usize,
    pub out_channels: usize,
}

pub struct DenseSpec {
    pub name: &'static str,
    pub in_features: usize,
    pub out_features: usize,
    pub activation: Activation,
}

/// Conv(3x3, valid) -> ReLU -> MaxPool(2x2) blocks.
pub const CONV_BLOCKS: [ConvBlockSpec; 3] = [
    ConvBlockSpec {
        name: "conv1",
        pool_name: "pool1",
        in_channels: 3,
        out_channels: 32,
    },
    ConvBlockSpec {
        name: "conv2",
        pool_name: "pool2",
        in_channels: 32,
        out_channels: 64,
    },
    ConvBlockSpec {
        name: "conv3",
        pool_name: "pool3",
        in_channels: 64,
        out_channels: 128,
    },
];

pub const GLOBAL_POOL_NAME: &str = "gap";

/// Classifier head applied to the globally pooled features.
pub const DENSE_LAYERS: [DenseSpec; 2] = [
    DenseSpec {
        name: "fc1",
        in_features: 128,
        out_features: 128,
        activation: Activation::ReLU,
    },
    DenseSpec {
        name: "fc2",
        in_features: 128,
        out_features: 1,
        activation: Activation::Sigmoid,
    },
];

/// `[C, H, W]` shape the network accepts.
pub fn input_shape() -> Vec<usize> {
    vec![INPUT_CHANNELS, INPUT_SIZE, INPUT_SIZE]
}
