use ndarray::{ArrayD, ArrayViewD};

use crate::error::Result;
use crate::shape::Dim;

/// Trait defining the interface a graph-construction framework uses to drive
/// pooling and rescaling layers.
///
/// Every layer exposes exactly two contracts: static shape inference, usable
/// before any tensor values exist, and value computation at graph-execution
/// time. The two must agree: wherever `output_shape` reports a known entry,
/// `forward` produces a tensor with that extent.
pub trait Layer: Send + Sync {
    /// Infer the output shape from an input shape.
    ///
    /// Pure and side-effect free. `input_shape` must have the rank the layer
    /// was constructed for.
    fn output_shape(&self, input_shape: &[Dim]) -> Vec<Dim>;

    /// Compute the output tensor for a concrete input.
    fn forward(&self, input: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>>;

    /// Clone the layer into a boxed trait object
    fn clone_box(&self) -> Box<dyn Layer>;
}

impl Clone for Box<dyn Layer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
