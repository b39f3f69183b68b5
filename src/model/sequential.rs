use crate::{layers::Layer, Error, Result, Tensor};

#[derive(Debug)]
pub struct Sequential {
    name: String,
    layers: Vec<Box<dyn Layer>>,
    input_shape: Option<Vec<usize>>,
}

impl Sequential {
    pub fn new(name: String) -> Self {
        Self {
            name,
            layers: Vec::new(),
            input_shape: None,
        }
    }

    pub fn add(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer);
    }

    pub fn set_input_shape(&mut self, shape: Vec<usize>) {
        self.input_shape = Some(shape);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    pub fn predict(&self, input: &Tensor) -> Result<Tensor> {
        let Some((first, rest)) = self.layers.split_first() else {
            return Err(Error::ModelLoad(
                "Cannot predict with empty model".to_string(),
            ));
        };

        if let Some(expected) = self.input_shape.as_deref() {
            if input.shape() != expected {
                return Err(Error::ShapeMismatch {
                    expected: expected.to_vec(),
                    actual: input.shape().to_vec(),
                });
            }
        }

        let mut current = first
            .forward(input)
            .map_err(|e| Error::Layer(format!("Layer 0 ({}): {}", first.name(), e)))?;

        for (idx, layer) in rest.iter().enumerate() {
            current = layer
                .forward(&current)
                .map_err(|e| Error::Layer(format!("Layer {} ({}): {}", idx + 1, layer.name(), e)))?;
        }

        Ok(current)
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        let mut current_shape = input_shape.to_vec();

        for layer in &self.layers {
            current_shape = layer.output_shape(&current_shape)?;
        }

        Ok(current_shape)
    }

    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Model: {}\n", self.name));
        s.push_str("_________________________________________________________________\n");
        s.push_str("Layer (type)                 Output Shape              \n");
        s.push_str("=================================================================\n");

        let mut current_shape = self.input_shape.clone().unwrap_or_default();

        for layer in &self.layers {
            if !current_shape.is_empty() {
                current_shape = layer.output_shape(&current_shape).unwrap_or_default();
            }

            s.push_str(&format!("{:28} {:?}\n", layer.name(), current_shape));
        }

        s.push_str("=================================================================\n");
        s.push_str(&format!("Total layers: {}\n", self.layers.len()));

        s
    }
}
