//! Global pooling layer
//!
//! Reduces every trailing dimension beyond the second, keeping only the
//! batch and channel axes. Commonly used before the final classification
//! layer in CNNs.

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};

use crate::error::{CharybdisError, Result};
use crate::layers::traits::Layer;
use crate::ops::{self, ReduceFn};
use crate::shape::{format_shape, Dim};

/// Global pooling layer
///
/// Pools globally across all trailing dimensions beyond the second: input
/// `[batch, channels, d1, d2, ...]` becomes `[batch, channels]`, however
/// many trailing axes there are.
///
/// Carries a function value, so it is not serializable.
#[derive(Clone, Debug)]
pub struct GlobalPoolLayer {
    /// Reduction applied to the flattened trailing axes
    pub pool_function: ReduceFn,

    /// Shape of the incoming tensor
    pub input_shape: Vec<Dim>,
}

impl GlobalPoolLayer {
    /// Create a new global mean-pooling layer.
    pub fn new(input_shape: &[Dim]) -> Result<Self> {
        Self::with_function(input_shape, ops::mean_axis)
    }

    /// Create a global pooling layer with an explicit reduction.
    pub fn with_function(input_shape: &[Dim], pool_function: ReduceFn) -> Result<Self> {
        if input_shape.len() < 3 {
            return Err(CharybdisError::rank_mismatch(
                "at least 3 input dimensions (batchsize, channels, spatial dimensions)".to_string(),
                format_shape(input_shape),
            ));
        }

        Ok(GlobalPoolLayer {
            pool_function,
            input_shape: input_shape.to_vec(),
        })
    }
}

impl Layer for GlobalPoolLayer {
    fn output_shape(&self, input_shape: &[Dim]) -> Vec<Dim> {
        input_shape[..2].to_vec()
    }

    fn forward(&self, input: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        let shape = input.shape();
        let (batch_size, channels) = (shape[0], shape[1]);
        let trailing: usize = shape[2..].iter().product();

        let flattened = input
            .to_owned()
            .into_shape(IxDyn(&[batch_size, channels, trailing]))?;
        Ok((self.pool_function)(&flattened, Axis(2)))
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }
}
