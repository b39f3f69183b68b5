//! # petclass
//!
//! Cat vs dog image classification with a small fixed convolutional network,
//! plus the HTTP service that exposes it. Inference only - no training.
//!
//! ## Example
//!
//! ```rust,ignore
//! use petclass::Classifier;
//!
//! let classifier = Classifier::load("dog_cat_model.safetensors")?;
//! let prediction = classifier.classify_bytes(&std::fs::read("cat.jpg")?)?;
//! println!("{} ({:.3})", prediction.label, prediction.confidence);
//! ```

pub mod activations;
pub mod classifier;
mod conv2d_impl;
pub mod error;
pub mod layers;
pub mod model;
pub mod preprocess;
pub mod server;
pub mod tensor;

pub use classifier::{Classifier, Label, Prediction};
pub use error::{Error, Result};
pub use model::Sequential;
pub use tensor::Tensor;
