//! Upscaling layers for enlarging spatial data
//!
//! This module provides 1D, 2D and 3D upscaling layers with two expansion
//! strategies: repeating element values, or dilating (inserting zeroes
//! between the original elements).

use ndarray::{s, Array3, Array4, Array5, ArrayD, ArrayViewD, ArrayView3, ArrayView4, ArrayView5,
              Axis, Ix3, Ix4, Ix5};
use serde::{Deserialize, Serialize};

use crate::error::{CharybdisError, Result};
use crate::layers::traits::Layer;
use crate::ops;
use crate::shape::{format_shape, AxisParam, Dim};

/// Upscaling mode.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpscaleMode {
    /// Replicate every element `scale` times contiguously
    Repeat,

    /// Scatter elements onto a zero tensor, `scale` positions apart
    Dilate,
}

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

fn validate_scale(scale_factor: &[usize]) -> Result<()> {
    if scale_factor.iter().any(|&s| s < 1) {
        return Err(CharybdisError::InvalidParameter {
            name: "scale_factor".to_string(),
            reason: format!("scale factors must be >= 1, got {:?}", scale_factor),
        });
    }
    Ok(())
}

/// 1D upscaling layer
///
/// Performs 1D upscaling over the trailing axis of a 3D input tensor.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Upscale1DLayer {
    /// Integer scale factor for the spatial axis
    pub scale_factor: usize,

    /// Expansion strategy
    pub mode: UpscaleMode,

    /// Shape of the incoming tensor
    pub input_shape: Vec<Dim>,
}

impl Upscale1DLayer {
    /// Create a new 1D upscaling layer
    pub fn new(
        input_shape: &[Dim],
        scale_factor: impl Into<AxisParam>,
        mode: UpscaleMode,
    ) -> Result<Self> {
        check_rank(input_shape, 3, 1)?;
        let scale_factor = scale_factor.into().into_axes("scale_factor", 1)?;
        validate_scale(&scale_factor)?;

        Ok(Upscale1DLayer {
            scale_factor: scale_factor[0],
            mode,
            input_shape: input_shape.to_vec(),
        })
    }

    /// Forward pass for a batch of sequences `[batch, channels, length]`.
    pub fn forward_batch(&self, input: ArrayView3<f32>) -> Result<Array3<f32>> {
        let a = self.scale_factor;
        if a == 1 {
            return Ok(input.to_owned());
        }

        let upscaled = match self.mode {
            UpscaleMode::Repeat => ops::repeat_axis(input, Axis(2), a),
            UpscaleMode::Dilate => {
                let (batch_size, channels, length) = input.dim();
                let mut upscaled = Array3::zeros((batch_size, channels, length * a));
                let step = a as isize;
                upscaled.slice_mut(s![.., .., ..;step]).assign(&input);
                upscaled
            }
        };
        Ok(upscaled)
    }
}

impl Layer for Upscale1DLayer {
    fn output_shape(&self, input_shape: &[Dim]) -> Vec<Dim> {
        let mut output_shape = input_shape.to_vec();
        output_shape[2] = input_shape[2].map(|d| d * self.scale_factor);
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

/// 2D upscaling layer
///
/// Performs 2D upscaling over the two trailing axes of a 4D input tensor.
///
/// Dilate mode allocates a dense zero tensor of the full output size before
/// scattering, so its transient memory use is proportional to the output.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Upscale2DLayer {
    /// Integer scale factor per spatial axis
    pub scale_factor: (usize, usize),

    /// Expansion strategy
    pub mode: UpscaleMode,

    /// Shape of the incoming tensor
    pub input_shape: Vec<Dim>,
}

impl Upscale2DLayer {
    /// Create a new 2D upscaling layer. A scalar scale factor is promoted to
    /// a square one.
    pub fn new(
        input_shape: &[Dim],
        scale_factor: impl Into<AxisParam>,
        mode: UpscaleMode,
    ) -> Result<Self> {
        check_rank(input_shape, 4, 2)?;
        let scale_factor = scale_factor.into().into_axes("scale_factor", 2)?;
        validate_scale(&scale_factor)?;

        Ok(Upscale2DLayer {
            scale_factor: (scale_factor[0], scale_factor[1]),
            mode,
            input_shape: input_shape.to_vec(),
        })
    }

    /// Forward pass for a batch of images `[batch, channels, rows, columns]`.
    pub fn forward_batch(&self, input: ArrayView4<f32>) -> Result<Array4<f32>> {
        let (a, b) = self.scale_factor;
        if a == 1 && b == 1 {
            return Ok(input.to_owned());
        }

        let upscaled = match self.mode {
            UpscaleMode::Repeat => {
                // Expand from the last spatial axis to the first
                let mut upscaled = input.to_owned();
                if b > 1 {
                    upscaled = ops::repeat_axis(upscaled.view(), Axis(3), b);
                }
                if a > 1 {
                    upscaled = ops::repeat_axis(upscaled.view(), Axis(2), a);
                }
                upscaled
            }
            UpscaleMode::Dilate => {
                let (batch_size, channels, height, width) = input.dim();
                let mut upscaled =
                    Array4::zeros((batch_size, channels, height * a, width * b));
                let (sa, sb) = (a as isize, b as isize);
                upscaled.slice_mut(s![.., .., ..;sa, ..;sb]).assign(&input);
                upscaled
            }
        };
        Ok(upscaled)
    }
}

impl Layer for Upscale2DLayer {
    fn output_shape(&self, input_shape: &[Dim]) -> Vec<Dim> {
        let mut output_shape = input_shape.to_vec();
        output_shape[2] = input_shape[2].map(|d| d * self.scale_factor.0);
        output_shape[3] = input_shape[3].map(|d| d * self.scale_factor.1);
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

/// 3D upscaling layer
///
/// Performs 3D upscaling over the three trailing axes of a 5D input tensor.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Upscale3DLayer {
    /// Integer scale factor per spatial axis
    pub scale_factor: (usize, usize, usize),

    /// Expansion strategy
    pub mode: UpscaleMode,

    /// Shape of the incoming tensor
    pub input_shape: Vec<Dim>,
}

impl Upscale3DLayer {
    /// Create a new 3D upscaling layer. A scalar scale factor is promoted to
    /// a cubic one.
    pub fn new(
        input_shape: &[Dim],
        scale_factor: impl Into<AxisParam>,
        mode: UpscaleMode,
    ) -> Result<Self> {
        check_rank(input_shape, 5, 3)?;
        let scale_factor = scale_factor.into().into_axes("scale_factor", 3)?;
        validate_scale(&scale_factor)?;

        Ok(Upscale3DLayer {
            scale_factor: (scale_factor[0], scale_factor[1], scale_factor[2]),
            mode,
            input_shape: input_shape.to_vec(),
        })
    }

    /// Forward pass for a batch of volumes `[batch, channels, depth, rows,
    /// columns]`.
    pub fn forward_batch(&self, input: ArrayView5<f32>) -> Result<Array5<f32>> {
        let (a, b, c) = self.scale_factor;
        if a == 1 && b == 1 && c == 1 {
            return Ok(input.to_owned());
        }

        let upscaled = match self.mode {
            UpscaleMode::Repeat => {
                // Expand from the last spatial axis to the first
                let mut upscaled = input.to_owned();
                if c > 1 {
                    upscaled = ops::repeat_axis(upscaled.view(), Axis(4), c);
                }
                if b > 1 {
                    upscaled = ops::repeat_axis(upscaled.view(), Axis(3), b);
                }
                if a > 1 {
                    upscaled = ops::repeat_axis(upscaled.view(), Axis(2), a);
                }
                upscaled
            }
            UpscaleMode::Dilate => {
                let (batch_size, channels, depth, height, width) = input.dim();
                let mut upscaled = Array5::zeros((
                    batch_size,
                    channels,
                    depth * a,
                    height * b,
                    width * c,
                ));
                let (sa, sb, sc) = (a as isize, b as isize, c as isize);
                upscaled
                    .slice_mut(s![.., .., ..;sa, ..;sb, ..;sc])
                    .assign(&input);
                upscaled
            }
        };
        Ok(upscaled)
    }
}

impl Layer for Upscale3DLayer {
    fn output_shape(&self, input_shape: &[Dim]) -> Vec<Dim> {
        let mut output_shape = input_shape.to_vec();
        output_shape[2] = input_shape[2].map(|d| d * self.scale_factor.0);
        output_shape[3] = input_shape[3].map(|d| d * self.scale_factor.1);
        output_shape[4] = input_shape[4].map(|d| d * self.scale_factor.2);
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
