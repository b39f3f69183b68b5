//! The cat/dog inference engine.
//!
//! A [`Classifier`] owns the loaded network and is immutable once built, so a
//! single instance can be shared by reference across threads and requests.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use serde::Serialize;
use tracing::debug;

use crate::model::{self, topology, Sequential};
use crate::{preprocess, Error, Result, Tensor};

/// Sigmoid outputs at or above this value are labelled [`Label::Dog`].
pub const DOG_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Label {
    Cat,
    Dog,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Cat => "Cat",
            Label::Dog => "Dog",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label plus the raw sigmoid output, read as the probability of "Dog".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    #[serde(rename = "prediction")]
    pub label: Label,
    pub confidence: f32,
}

impl Prediction {
    pub fn from_confidence(confidence: f32) -> Result<Self> {
        if !confidence.is_finite() {
            return Err(Error::NonFiniteOutput(confidence));
        }

        let label = if confidence >= DOG_THRESHOLD {
            Label::Dog
        } else {
            Label::Cat
        };

        Ok(Self { label, confidence })
    }
}

#[derive(Debug)]
pub struct Classifier {
    model: Sequential,
}

impl Classifier {
    /// Load parameters from a safetensors weights file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_model(model::load_safetensors(path)?)
    }

    /// Load parameters from an in-memory safetensors buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_model(model::load_safetensors_bytes(bytes)?)
    }

    fn from_model(model: Sequential) -> Result<Self> {
        let output = model.output_shape(&topology::input_shape())?;
        if output != [1] {
            return Err(Error::ShapeMismatch {
                expected: vec![1],
                actual: output,
            });
        }
        Ok(Self { model })
    }

    pub fn model(&self) -> &Sequential {
        &self.model
    }

    pub fn input_size(&self) -> u32 {
        topology::INPUT_SIZE as u32
    }

    /// Run the network on a preprocessed `[3, 128, 128]` tensor and return the sigmoid output.
    pub fn forward(&self, input: &Tensor) -> Result<f32> {
        let output = self.model.predict(input)?;
        output
            .to_vec()
            .first()
            .copied()
            .ok_or_else(|| Error::Layer("network produced an empty output".to_string()))
    }

    pub fn classify(&self, image: &DynamicImage) -> Result<Prediction> {
        let start = Instant::now();

        let input = preprocess::to_tensor(image, self.input_size())?;
        let confidence = self.forward(&input)?;
        let prediction = Prediction::from_confidence(confidence)?;

        debug!(
            label = %prediction.label,
            confidence = prediction.confidence,
            source_width = image.width(),
            source_height = image.height(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Classified image"
        );

        Ok(prediction)
    }

    /// Decode raw image bytes and classify them.
    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<Prediction> {
        let image = preprocess::decode_image(bytes)?;
        self.classify(&image)
    }
}
