#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use petclass::model::topology::{CONV_BLOCKS, DENSE_LAYERS, KERNEL_SIZE};
use safetensors::tensor::TensorView;
use safetensors::Dtype;

/// Parameter set for the fixed topology, zero-initialised and editable by key.
pub struct Weights {
    tensors: Vec<(String, Vec<usize>, Vec<f32>)>,
}

impl Weights {
    pub fn zeros() -> Self {
        let mut tensors = Vec::new();
        for block in &CONV_BLOCKS {
            let shape = vec![block.out_channels, block.in_channels, KERNEL_SIZE, KERNEL_SIZE];
            tensors.push(zeros_entry(format!("{}.weight", block.name), shape));
            tensors.push(zeros_entry(format!("{}.bias", block.name), vec![block.out_channels]));
        }
        for dense in &DENSE_LAYERS {
            let shape = vec![dense.out_features, dense.in_features];
            tensors.push(zeros_entry(format!("{}.weight", dense.name), shape));
            tensors.push(zeros_entry(format!("{}.bias", dense.name), vec![dense.out_features]));
        }
        Self { tensors }
    }

    /// Network whose output is `sigmoid(gain * mean_brightness + bias)` for flat images.
    ///
    /// Filter 0 of every conv averages its window over input channel 0 (all
    /// channels for conv1), so a uniform image of value `v` reaches the head as `v`.
    pub fn brightness(gain: f32, bias: f32) -> Self {
        let mut weights = Self::zeros();
        let taps = (KERNEL_SIZE * KERNEL_SIZE) as f32;

        weights.update("conv1.weight", |w, shape| {
            let per_filter = shape[1] * KERNEL_SIZE * KERNEL_SIZE;
            for v in &mut w[..per_filter] {
                *v = 1.0 / per_filter as f32;
            }
        });
        for name in ["conv2.weight", "conv3.weight"] {
            weights.update(name, |w, _| {
                for v in &mut w[..KERNEL_SIZE * KERNEL_SIZE] {
                    *v = 1.0 / taps;
                }
            });
        }
        weights.update("fc1.weight", |w, _| w[0] = 1.0);
        weights.update("fc2.weight", |w, _| w[0] = gain);
        weights.update("fc2.bias", |w, _| w[0] = bias);
        weights
    }

    /// Every parameter drawn uniformly from `[-1/sqrt(fan_in), 1/sqrt(fan_in)]`,
    /// the PyTorch default init, from a fixed-seed LCG.
    pub fn seeded(seed: u64) -> Self {
        let mut weights = Self::zeros();
        let mut state = seed;
        let mut fan_in = 1;
        for (name, shape, data) in &mut weights.tensors {
            // Biases share the fan-in of the weight stored just before them.
            if name.ends_with(".weight") {
                fan_in = shape[1..].iter().product::<usize>();
            }
            let bound = 1.0 / (fan_in as f32).sqrt();
            for v in data.iter_mut() {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let unit = (state >> 40) as f32 / (1u64 << 24) as f32;
                *v = (unit * 2.0 - 1.0) * bound;
            }
        }
        weights
    }

    pub fn get(&self, key: &str) -> &[f32] {
        self.tensors
            .iter()
            .find(|(name, _, _)| name == key)
            .map(|(_, _, data)| data.as_slice())
            .unwrap_or_else(|| panic!("no tensor {}", key))
    }

    pub fn update(&mut self, key: &str, f: impl FnOnce(&mut [f32], &[usize])) {
        let entry = self
            .tensors
            .iter_mut()
            .find(|(name, _, _)| name == key)
            .unwrap_or_else(|| panic!("no tensor {}", key));
        f(&mut entry.2, &entry.1);
    }

    pub fn remove(&mut self, key: &str) {
        self.tensors.retain(|(name, _, _)| name != key);
    }

    pub fn replace(&mut self, key: &str, shape: Vec<usize>) {
        self.remove(key);
        self.tensors.push(zeros_entry(key.to_string(), shape));
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        for entry in &mut self.tensors {
            entry.0 = format!("{}{}", prefix, entry.0);
        }
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let raw: Vec<(String, Vec<usize>, Vec<u8>)> = self
            .tensors
            .iter()
            .map(|(name, shape, data)| {
                let bytes = data.iter().flat_map(|v| v.to_le_bytes()).collect();
                (name.clone(), shape.clone(), bytes)
            })
            .collect();

        let views: HashMap<String, TensorView<'_>> = raw
            .iter()
            .map(|(name, shape, bytes)| {
                (
                    name.clone(),
                    TensorView::new(Dtype::F32, shape.clone(), bytes).unwrap(),
                )
            })
            .collect();

        safetensors::serialize(views, &None).unwrap()
    }
}

fn zeros_entry(name: String, shape: Vec<usize>) -> (String, Vec<usize>, Vec<f32>) {
    let len = shape.iter().product();
    (name, shape, vec![0.0; len])
}

pub fn flat_image(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
}

pub fn patterned_image(width: u32, height: u32, seed: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let v = x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17)).wrapping_add(seed);
        Rgb([(v % 256) as u8, ((v / 3) % 256) as u8, ((v / 7) % 256) as u8])
    }))
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub const BOUNDARY: &str = "petclass-test-boundary";

/// Build a `multipart/form-data` body from `(field, file_name, data)` parts.
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
