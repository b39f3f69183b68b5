mod loader;
mod sequential;
pub mod topology;

pub use loader::{load_safetensors, load_safetensors_bytes};
pub use sequential::Sequential;
