use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Model loading error: {0}")]
    ModelLoad(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Network produced a non-finite output: {0}")]
    NonFiniteOutput(f32),

    #[error("Safetensors error: {0}")]
    SafeTensors(#[from] safetensors::SafeTensorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error was caused by the caller's image rather than the model.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::Decode(_) | Error::EmptyImage { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
