//! Pooling across a feature axis
//!
//! These layers pool groups of adjacent entries along one axis of the input,
//! by default axis 1 (the feature axis of dense and convolutional outputs).
//! [`FeaturePoolLayer`] reduces each group with an injected function and can
//! be used to implement maxout; [`FeatureWTALayer`] keeps only the maximal
//! activation of each group.

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{CharybdisError, Result};
use crate::layers::traits::Layer;
use crate::ops::{self, ReduceFn};
use crate::shape::Dim;

fn check_axis(input_shape: &[Dim], axis: usize, pool_size: usize) -> Result<()> {
    if pool_size == 0 {
        return Err(CharybdisError::invalid_parameter(
            "pool_size",
            "pool size must be >= 1",
        ));
    }
    if axis >= input_shape.len() {
        return Err(CharybdisError::invalid_parameter(
            "axis".to_string(),
            format!(
                "axis {} is out of bounds for a rank {} input",
                axis,
                input_shape.len()
            ),
        ));
    }
    // An unknown axis size defers this check to execution time
    if let Some(size) = input_shape[axis] {
        if size % pool_size != 0 {
            return Err(CharybdisError::IncompatiblePoolSize {
                axis_size: size,
                pool_size,
            });
        }
    }
    Ok(())
}

/// Reshape so the pooled axis is split into (groups, pool_size), inserting
/// the group-member axis directly after the target axis.
fn pooled_shape(input_shape: &[usize], axis: usize, pool_size: usize) -> Result<Vec<usize>> {
    let size = input_shape[axis];
    if size % pool_size != 0 {
        return Err(CharybdisError::IncompatiblePoolSize {
            axis_size: size,
            pool_size,
        });
    }
    let mut pool_shape = input_shape.to_vec();
    pool_shape[axis] = size / pool_size;
    pool_shape.insert(axis + 1, pool_size);
    Ok(pool_shape)
}

/// Feature pooling layer
///
/// Pools groups of `pool_size` adjacent entries along `axis` with an
/// arbitrary reduction function. The size of the pooled axis must be a
/// multiple of the pool size.
///
/// Carries a function value, so it is not serializable.
#[derive(Clone, Debug)]
pub struct FeaturePoolLayer {
    /// Number of entries pooled into one output entry
    pub pool_size: usize,

    /// The axis along which to pool
    pub axis: usize,

    /// Reduction applied to each group
    pub pool_function: ReduceFn,

    /// Shape of the incoming tensor
    pub input_shape: Vec<Dim>,
}

impl FeaturePoolLayer {
    /// Create a new feature pooling layer with an explicit reduction.
    pub fn new(
        input_shape: &[Dim],
        pool_size: usize,
        axis: usize,
        pool_function: ReduceFn,
    ) -> Result<Self> {
        check_axis(input_shape, axis, pool_size)?;

        Ok(FeaturePoolLayer {
            pool_size,
            axis,
            pool_function,
            input_shape: input_shape.to_vec(),
        })
    }

    /// Shortcut for max pooling over the feature axis (maxout).
    pub fn maxout(input_shape: &[Dim], pool_size: usize) -> Result<Self> {
        Self::new(input_shape, pool_size, 1, ops::max_axis)
    }
}

impl Layer for FeaturePoolLayer {
    fn output_shape(&self, input_shape: &[Dim]) -> Vec<Dim> {
        let mut output_shape = input_shape.to_vec();
        output_shape[self.axis] = input_shape[self.axis].map(|d| d / self.pool_size);
        output_shape
    }

    fn forward(&self, input: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        let pool_shape = pooled_shape(input.shape(), self.axis, self.pool_size)?;
        let reshaped = input.to_owned().into_shape(IxDyn(&pool_shape))?;
        Ok((self.pool_function)(&reshaped, Axis(self.axis + 1)))
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }
}

/// 'Winner Take All' layer
///
/// Zeroes out all but the maximal activation within each group of
/// `pool_size` entries along `axis`. The output has the input's shape; each
/// group keeps exactly one nonzero entry. Ties break toward the lowest index
/// within the group.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FeatureWTALayer {
    /// Number of entries per competition group
    pub pool_size: usize,

    /// The axis along which the groups are formed
    pub axis: usize,

    /// Shape of the incoming tensor
    pub input_shape: Vec<Dim>,

    // Broadcast shape of the comparison-index tensor: singleton on every
    // axis of the pooled shape except the group-member axis. Fixed by
    // (rank, axis, pool_size) at construction.
    index_shape: Vec<usize>,
}

impl FeatureWTALayer {
    /// Create a new winner-take-all layer.
    pub fn new(input_shape: &[Dim], pool_size: usize, axis: usize) -> Result<Self> {
        check_axis(input_shape, axis, pool_size)?;

        let mut index_shape = vec![1; input_shape.len() + 1];
        index_shape[axis + 1] = pool_size;

        Ok(FeatureWTALayer {
            pool_size,
            axis,
            input_shape: input_shape.to_vec(),
            index_shape,
        })
    }
}

impl Layer for FeatureWTALayer {
    fn output_shape(&self, input_shape: &[Dim]) -> Vec<Dim> {
        input_shape.to_vec()
    }

    fn forward(&self, input: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        let input_shape = input.shape().to_vec();
        let pool_shape = pooled_shape(&input_shape, self.axis, self.pool_size)?;
        let reshaped = input.to_owned().into_shape(IxDyn(&pool_shape))?;

        let group_axis = Axis(self.axis + 1);
        let winners = reshaped
            .map_axis(group_axis, ops::argmax)
            .insert_axis(group_axis);
        let index = ArrayD::from_shape_fn(IxDyn(&self.index_shape), |idx| idx[self.axis + 1]);

        let winners = winners.broadcast(reshaped.raw_dim()).ok_or_else(|| {
            CharybdisError::ShapeError("winner indices do not broadcast to the pooled shape".to_string())
        })?;
        let index = index.broadcast(reshaped.raw_dim()).ok_or_else(|| {
            CharybdisError::ShapeError("index range does not broadcast to the pooled shape".to_string())
        })?;

        let mask = Zip::from(&winners)
            .and(&index)
            .map_collect(|&winner, &offset| if winner == offset { 1.0f32 } else { 0.0 });
        let mask = mask.into_shape(IxDyn(&input_shape))?;

        Ok(input.to_owned() * mask)
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }
}
