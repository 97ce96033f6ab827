//! Windowed pooling layers for downsampling spatial data
//!
//! This module provides parameterized mean/max pooling layers for 1D, 2D and
//! 3D data. Max pooling is a factory preset of the parameterized layer, not a
//! separate type.

use ndarray::{Array3, Array4, Array5, ArrayD, ArrayViewD, ArrayView3, ArrayView4, ArrayView5,
              Axis, Ix3, Ix4, Ix5};
use serde::{Deserialize, Serialize};

use crate::error::{CharybdisError, Result};
use crate::layers::traits::Layer;
use crate::ops;
pub use crate::ops::PoolMode;
use crate::shape::{format_shape, pool_output_length, AxisParam, Dim};

fn check_rank(input_shape: &[Dim], rank: usize, spatial: usize) -> Result<()> {
    if input_shape.len() != rank {
        return Err(CharybdisError::rank_mismatch(
            format!(
                "{} input dimensions (batchsize, channels, {} spatial dimensions)",
                rank, spatial
            ),
            format_shape(input_shape),
        ));
    }
    Ok(())
}

/// 1D pooling layer
///
/// Performs mean or max-pooling over the trailing axis of a 3D input tensor
/// `[batch, channels, length]`. Computation inserts a synthetic trailing axis
/// of size 1 and delegates to the 2D windowed reduction primitive.
///
/// Note that `ignore_border=false` is the slow path of most windowed
/// reduction backends; prefer the default unless partial trailing windows are
/// required.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Pool1DLayer {
    /// Length of the pooling window
    pub pool_size: usize,

    /// Stride between successive windows
    pub stride: usize,

    /// Virtual elements added to each border before windowing
    pub pad: usize,

    /// Discard the trailing partial window instead of pooling it
    pub ignore_border: bool,

    /// Reduction applied to each window
    pub mode: PoolMode,

    /// Shape of the incoming tensor
    pub input_shape: Vec<Dim>,
}

impl Pool1DLayer {
    /// Create a new 1D pooling layer.
    ///
    /// `stride` defaults to `pool_size` when `None`. Padding requires
    /// `ignore_border` to stay enabled.
    pub fn new(
        input_shape: &[Dim],
        pool_size: impl Into<AxisParam>,
        stride: Option<AxisParam>,
        pad: impl Into<AxisParam>,
        ignore_border: bool,
        mode: PoolMode,
    ) -> Result<Self> {
        check_rank(input_shape, 3, 1)?;

        let pool_size = pool_size.into().into_axes("pool_size", 1)?[0];
        let stride = match stride {
            Some(stride) => stride.into_axes("stride", 1)?[0],
            None => pool_size,
        };
        let pad = pad.into().into_axes("pad", 1)?[0];
        validate_pool_params(&[pool_size], &[stride], &[pad], ignore_border)?;

        Ok(Pool1DLayer {
            pool_size,
            stride,
            pad,
            ignore_border,
            mode,
            input_shape: input_shape.to_vec(),
        })
    }

    /// Shortcut for a max-pooling layer with zero padding.
    pub fn max_pool(
        input_shape: &[Dim],
        pool_size: impl Into<AxisParam>,
        stride: Option<AxisParam>,
    ) -> Result<Self> {
        Self::new(input_shape, pool_size, stride, 0, true, PoolMode::Max)
    }

    /// Forward pass for a batch of sequences `[batch, channels, length]`.
    pub fn forward_batch(&self, input: ArrayView3<f32>) -> Result<Array3<f32>> {
        let input_4d = input.insert_axis(Axis(3));
        let pooled = ops::pool_2d(
            input_4d,
            (self.pool_size, 1),
            (self.stride, 1),
            (self.pad, 0),
            self.ignore_border,
            self.mode,
        )?;
        Ok(pooled.index_axis_move(Axis(3), 0))
    }
}

impl Layer for Pool1DLayer {
    fn output_shape(&self, input_shape: &[Dim]) -> Vec<Dim> {
        let mut output_shape = input_shape.to_vec();
        output_shape[2] = pool_output_length(
            input_shape[2],
            Some(self.pool_size),
            self.stride,
            self.pad,
            self.ignore_border,
        );
        output_shape
    }

    fn forward(&self, input: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        let input = input.into_dimensionality::<Ix3>()?;
        Ok(self.forward_batch(input)?.into_dyn())
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }
}

/// 2D pooling layer
///
/// Performs mean or max-pooling over the two trailing axes of a 4D input
/// tensor `[batch, channels, rows, columns]`.
///
/// Note that `ignore_border=false` is the slow path of most windowed
/// reduction backends; prefer the default unless partial trailing windows are
/// required.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Pool2DLayer {
    /// Pooling window size per spatial axis
    pub pool_size: (usize, usize),

    /// Stride between successive windows per spatial axis
    pub stride: (usize, usize),

    /// Virtual elements added to each border before windowing
    pub pad: (usize, usize),

    /// Discard trailing partial windows instead of pooling them
    pub ignore_border: bool,

    /// Reduction applied to each window
    pub mode: PoolMode,

    /// Shape of the incoming tensor
    pub input_shape: Vec<Dim>,
}

impl Pool2DLayer {
    /// Create a new 2D pooling layer.
    ///
    /// A scalar `pool_size`, `stride` or `pad` broadcasts over both spatial
    /// axes. `stride` defaults to `pool_size` when `None`. Padding requires
    /// `ignore_border` to stay enabled.
    pub fn new(
        input_shape: &[Dim],
        pool_size: impl Into<AxisParam>,
        stride: Option<AxisParam>,
        pad: impl Into<AxisParam>,
        ignore_border: bool,
        mode: PoolMode,
    ) -> Result<Self> {
        check_rank(input_shape, 4, 2)?;

        let pool_size = pool_size.into().into_axes("pool_size", 2)?;
        let stride = match stride {
            Some(stride) => stride.into_axes("stride", 2)?,
            None => pool_size.clone(),
        };
        let pad = pad.into().into_axes("pad", 2)?;
        validate_pool_params(&pool_size, &stride, &pad, ignore_border)?;

        Ok(Pool2DLayer {
            pool_size: (pool_size[0], pool_size[1]),
            stride: (stride[0], stride[1]),
            pad: (pad[0], pad[1]),
            ignore_border,
            mode,
            input_shape: input_shape.to_vec(),
        })
    }

    /// Shortcut for a max-pooling layer with zero padding.
    pub fn max_pool(
        input_shape: &[Dim],
        pool_size: impl Into<AxisParam>,
        stride: Option<AxisParam>,
    ) -> Result<Self> {
        Self::new(input_shape, pool_size, stride, 0, true, PoolMode::Max)
    }

    /// Forward pass for a batch of images `[batch, channels, rows, columns]`.
    pub fn forward_batch(&self, input: ArrayView4<f32>) -> Result<Array4<f32>> {
        ops::pool_2d(
            input,
            self.pool_size,
            self.stride,
            self.pad,
            self.ignore_border,
            self.mode,
        )
    }
}

impl Layer for Pool2DLayer {
    fn output_shape(&self, input_shape: &[Dim]) -> Vec<Dim> {
        let mut output_shape = input_shape.to_vec();
        output_shape[2] = pool_output_length(
            input_shape[2],
            Some(self.pool_size.0),
            self.stride.0,
            self.pad.0,
            self.ignore_border,
        );
        output_shape[3] = pool_output_length(
            input_shape[3],
            Some(self.pool_size.1),
            self.stride.1,
            self.pad.1,
            self.ignore_border,
        );
        output_shape
    }

    fn forward(&self, input: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        let input = input.into_dimensionality::<Ix4>()?;
        Ok(self.forward_batch(input)?.into_dyn())
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }
}

/// 3D pooling layer
///
/// Performs mean or max-pooling over the three trailing axes of a 5D input
/// tensor `[batch, channels, depth, rows, columns]`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Pool3DLayer {
    /// Pooling window size per spatial axis
    pub pool_size: (usize, usize, usize),

    /// Stride between successive windows per spatial axis
    pub stride: (usize, usize, usize),

    /// Virtual elements added to each border before windowing
    pub pad: (usize, usize, usize),

    /// Discard trailing partial windows instead of pooling them
    pub ignore_border: bool,

    /// Reduction applied to each window
    pub mode: PoolMode,

    /// Shape of the incoming tensor
    pub input_shape: Vec<Dim>,
}

impl Pool3DLayer {
    /// Create a new 3D pooling layer.
    ///
    /// A scalar `pool_size`, `stride` or `pad` broadcasts over all three
    /// spatial axes. `stride` defaults to `pool_size` when `None`. Padding
    /// requires `ignore_border` to stay enabled.
    pub fn new(
        input_shape: &[Dim],
        pool_size: impl Into<AxisParam>,
        stride: Option<AxisParam>,
        pad: impl Into<AxisParam>,
        ignore_border: bool,
        mode: PoolMode,
    ) -> Result<Self> {
        check_rank(input_shape, 5, 3)?;

        let pool_size = pool_size.into().into_axes("pool_size", 3)?;
        let stride = match stride {
            Some(stride) => stride.into_axes("stride", 3)?,
            None => pool_size.clone(),
        };
        let pad = pad.into().into_axes("pad", 3)?;
        validate_pool_params(&pool_size, &stride, &pad, ignore_border)?;

        Ok(Pool3DLayer {
            pool_size: (pool_size[0], pool_size[1], pool_size[2]),
            stride: (stride[0], stride[1], stride[2]),
            pad: (pad[0], pad[1], pad[2]),
            ignore_border,
            mode,
            input_shape: input_shape.to_vec(),
        })
    }

    /// Shortcut for a max-pooling layer with zero padding.
    pub fn max_pool(
        input_shape: &[Dim],
        pool_size: impl Into<AxisParam>,
        stride: Option<AxisParam>,
    ) -> Result<Self> {
        Self::new(input_shape, pool_size, stride, 0, true, PoolMode::Max)
    }

    /// Forward pass for a batch of volumes `[batch, channels, depth, rows,
    /// columns]`.
    pub fn forward_batch(&self, input: ArrayView5<f32>) -> Result<Array5<f32>> {
        ops::pool_3d(
            input,
            self.pool_size,
            self.stride,
            self.pad,
            self.ignore_border,
            self.mode,
        )
    }
}

impl Layer for Pool3DLayer {
    fn output_shape(&self, input_shape: &[Dim]) -> Vec<Dim> {
        let mut output_shape = input_shape.to_vec();
        let pool_size = [self.pool_size.0, self.pool_size.1, self.pool_size.2];
        let stride = [self.stride.0, self.stride.1, self.stride.2];
        let pad = [self.pad.0, self.pad.1, self.pad.2];
        for axis in 0..3 {
            output_shape[axis + 2] = pool_output_length(
                input_shape[axis + 2],
                Some(pool_size[axis]),
                stride[axis],
                pad[axis],
                self.ignore_border,
            );
        }
        output_shape
    }

    fn forward(&self, input: ArrayViewD<'_, f32>) -> Result<ArrayD<f32>> {
        let input = input.into_dimensionality::<Ix5>()?;
        Ok(self.forward_batch(input)?.into_dyn())
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }
}

fn validate_pool_params(
    pool_size: &[usize],
    stride: &[usize],
    pad: &[usize],
    ignore_border: bool,
) -> Result<()> {
    if pool_size.iter().any(|&p| p == 0) {
        return Err(CharybdisError::InvalidParameter {
            name: "pool_size".to_string(),
            reason: format!("window sizes must be >= 1, got {:?}", pool_size),
        });
    }
    if stride.iter().any(|&s| s == 0) {
        return Err(CharybdisError::InvalidParameter {
            name: "stride".to_string(),
            reason: format!("strides must be >= 1, got {:?}", stride),
        });
    }
    if !ignore_border && pad.iter().any(|&p| p != 0) {
        return Err(CharybdisError::InvalidParameter {
            name: "pad".to_string(),
            reason: format!("padding must be zero when ignore_border is false, got {:?}", pad),
        });
    }
    Ok(())
}

/// Builder for 2D pooling layers
pub struct Pool2DLayerBuilder {
    input_shape: Option<Vec<Dim>>,
    pool_size: Option<AxisParam>,
    stride: Option<AxisParam>,
    pad: AxisParam,
    ignore_border: bool,
    mode: PoolMode,
}

impl Pool2DLayerBuilder {
    pub fn new() -> Self {
        Pool2DLayerBuilder {
            input_shape: None,
            pool_size: None,
            stride: None,
            pad: AxisParam::Uniform(0),
            ignore_border: true,
            mode: PoolMode::Max,
        }
    }

    pub fn input_shape(mut self, input_shape: &[Dim]) -> Self {
        self.input_shape = Some(input_shape.to_vec());
        self
    }

    pub fn pool_size(mut self, pool_size: impl Into<AxisParam>) -> Self {
        self.pool_size = Some(pool_size.into());
        self
    }

    pub fn stride(mut self, stride: impl Into<AxisParam>) -> Self {
        self.stride = Some(stride.into());
        self
    }

    pub fn pad(mut self, pad: impl Into<AxisParam>) -> Self {
        self.pad = pad.into();
        self
    }

    pub fn ignore_border(mut self, ignore_border: bool) -> Self {
        self.ignore_border = ignore_border;
        self
    }

    pub fn mode(mut self, mode: PoolMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn build(self) -> Result<Pool2DLayer> {
        let input_shape = self.input_shape.ok_or_else(|| CharybdisError::InvalidParameter {
            name: "input_shape".to_string(),
            reason: "input_shape is required for Pool2DLayer".to_string(),
        })?;
        let pool_size = self.pool_size.ok_or_else(|| CharybdisError::InvalidParameter {
            name: "pool_size".to_string(),
            reason: "pool_size is required for Pool2DLayer".to_string(),
        })?;

        Pool2DLayer::new(
            &input_shape,
            pool_size,
            self.stride,
            self.pad,
            self.ignore_border,
            self.mode,
        )
    }
}

impl Default for Pool2DLayerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
