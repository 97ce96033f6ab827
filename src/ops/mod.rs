//! Tensor reduction primitives backing the pooling and rescaling layers
//!
//! This module provides the padded sliding-window reductions ([`pool_2d`],
//! [`pool_3d`]), the axis reduction functions that can be injected into
//! feature and global pooling layers, and the element replication helper used
//! by repeat-mode upscaling.

use ndarray::{Array, Array4, Array5, ArrayD, ArrayView, ArrayView1, ArrayView4, ArrayView5, Axis,
              RemoveAxis};
use serde::{Deserialize, Serialize};

use crate::error::{CharybdisError, Result};
use crate::shape::pool_output_length;

/// Pooling mode for windowed reductions.
///
/// The two average modes differ only when the input is padded: including the
/// padding counts padded positions as zeros in the divisor, excluding it
/// divides by the number of real elements in the window.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolMode {
    /// Maximum over the window; padded positions never win
    Max,

    /// Mean over the window, counting padded positions as zeros
    AverageIncPad,

    /// Mean over the real (unpadded) elements of the window
    AverageExcPad,
}

/// A reduction from one axis of a dynamic-rank tensor down to a scalar per
/// lane, removing the axis. Feature and global pooling layers accept any
/// function of this type.
pub type ReduceFn = fn(&ArrayD<f32>, Axis) -> ArrayD<f32>;

/// Maximum along `axis`, removing it.
pub fn max_axis(input: &ArrayD<f32>, axis: Axis) -> ArrayD<f32> {
    input.map_axis(axis, |lane| {
        lane.fold(f32::NEG_INFINITY, |max, &v| max.max(v))
    })
}

/// Mean along `axis`, removing it.
pub fn mean_axis(input: &ArrayD<f32>, axis: Axis) -> ArrayD<f32> {
    input.map_axis(axis, |lane| lane.sum() / lane.len() as f32)
}

/// Sum along `axis`, removing it.
pub fn sum_axis(input: &ArrayD<f32>, axis: Axis) -> ArrayD<f32> {
    input.map_axis(axis, |lane| lane.sum())
}

/// Index of the maximum element of a lane. Ties break toward the lowest
/// index, so the result is deterministic.
pub fn argmax(lane: ArrayView1<f32>) -> usize {
    let mut best = 0;
    let mut best_val = f32::NEG_INFINITY;
    for (i, &v) in lane.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best = i;
        }
    }
    best
}

/// Replicate every element of `input` `reps` times contiguously along `axis`.
pub fn repeat_axis<D: RemoveAxis>(
    input: ArrayView<'_, f32, D>,
    axis: Axis,
    reps: usize,
) -> Array<f32, D> {
    let mut dim = input.raw_dim();
    dim[axis.index()] *= reps;
    let mut output = Array::zeros(dim);

    for (i, lane) in input.axis_iter(axis).enumerate() {
        for r in 0..reps {
            output.index_axis_mut(axis, i * reps + r).assign(&lane);
        }
    }

    output
}

fn validate_windowed(
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
    // A window lying entirely in the padding would have no real elements
    if pad.iter().zip(pool_size).any(|(&p, &size)| p >= size) {
        return Err(CharybdisError::InvalidParameter {
            name: "pad".to_string(),
            reason: format!("padding {:?} must be smaller than the window {:?}", pad, pool_size),
        });
    }
    Ok(())
}

/// Windowed reduction over the two trailing axes of a `[batch, channels,
/// rows, columns]` tensor.
///
/// Window counts follow [`pool_output_length`]. Padding adds `pad` virtual
/// elements on each border; padded positions are excluded from max pooling
/// and handled per [`PoolMode`] for the average modes. With `ignore_border`
/// disabled (zero padding required), one partial trailing window is appended
/// per axis whenever elements would otherwise be left uncovered.
pub fn pool_2d(
    input: ArrayView4<f32>,
    pool_size: (usize, usize),
    stride: (usize, usize),
    pad: (usize, usize),
    ignore_border: bool,
    mode: PoolMode,
) -> Result<Array4<f32>> {
    validate_windowed(
        &[pool_size.0, pool_size.1],
        &[stride.0, stride.1],
        &[pad.0, pad.1],
        ignore_border,
    )?;

    let (batch_size, channels, in_height, in_width) = input.dim();

    let out_height = pool_output_length(Some(in_height), Some(pool_size.0), stride.0, pad.0, ignore_border)
        .expect("concrete input length");
    let out_width = pool_output_length(Some(in_width), Some(pool_size.1), stride.1, pad.1, ignore_border)
        .expect("concrete input length");

    let mut output = Array4::zeros((batch_size, channels, out_height, out_width));

    for b in 0..batch_size {
        for c in 0..channels {
            for oh in 0..out_height {
                // Window extent in padded coordinates, clipped at the border
                let h_start = oh * stride.0;
                let h_stop = (h_start + pool_size.0).min(in_height + 2 * pad.0);
                // Portion of the window that maps to real elements
                let h0 = h_start.max(pad.0);
                let h1 = h_stop.min(pad.0 + in_height);

                for ow in 0..out_width {
                    let w_start = ow * stride.1;
                    let w_stop = (w_start + pool_size.1).min(in_width + 2 * pad.1);
                    let w0 = w_start.max(pad.1);
                    let w1 = w_stop.min(pad.1 + in_width);

                    output[[b, c, oh, ow]] = match mode {
                        PoolMode::Max => {
                            let mut max_val = f32::NEG_INFINITY;
                            for h in h0..h1 {
                                for w in w0..w1 {
                                    let val = input[[b, c, h - pad.0, w - pad.1]];
                                    if val > max_val {
                                        max_val = val;
                                    }
                                }
                            }
                            max_val
                        }
                        PoolMode::AverageIncPad | PoolMode::AverageExcPad => {
                            let mut sum = 0.0;
                            for h in h0..h1 {
                                for w in w0..w1 {
                                    sum += input[[b, c, h - pad.0, w - pad.1]];
                                }
                            }
                            let area = if mode == PoolMode::AverageIncPad {
                                (h_stop - h_start) * (w_stop - w_start)
                            } else {
                                (h1 - h0) * (w1 - w0)
                            };
                            sum / area as f32
                        }
                    };
                }
            }
        }
    }

    Ok(output)
}

/// Windowed reduction over the three trailing axes of a `[batch, channels,
/// depth, rows, columns]` tensor. See [`pool_2d`] for the border and padding
/// semantics.
pub fn pool_3d(
    input: ArrayView5<f32>,
    pool_size: (usize, usize, usize),
    stride: (usize, usize, usize),
    pad: (usize, usize, usize),
    ignore_border: bool,
    mode: PoolMode,
) -> Result<Array5<f32>> {
    validate_windowed(
        &[pool_size.0, pool_size.1, pool_size.2],
        &[stride.0, stride.1, stride.2],
        &[pad.0, pad.1, pad.2],
        ignore_border,
    )?;

    let (batch_size, channels, in_depth, in_height, in_width) = input.dim();

    let out_depth = pool_output_length(Some(in_depth), Some(pool_size.0), stride.0, pad.0, ignore_border)
        .expect("concrete input length");
    let out_height = pool_output_length(Some(in_height), Some(pool_size.1), stride.1, pad.1, ignore_border)
        .expect("concrete input length");
    let out_width = pool_output_length(Some(in_width), Some(pool_size.2), stride.2, pad.2, ignore_border)
        .expect("concrete input length");

    let mut output = Array5::zeros((batch_size, channels, out_depth, out_height, out_width));

    for b in 0..batch_size {
        for c in 0..channels {
            for od in 0..out_depth {
                let d_start = od * stride.0;
                let d_stop = (d_start + pool_size.0).min(in_depth + 2 * pad.0);
                let d0 = d_start.max(pad.0);
                let d1 = d_stop.min(pad.0 + in_depth);

                for oh in 0..out_height {
                    let h_start = oh * stride.1;
                    let h_stop = (h_start + pool_size.1).min(in_height + 2 * pad.1);
                    let h0 = h_start.max(pad.1);
                    let h1 = h_stop.min(pad.1 + in_height);

                    for ow in 0..out_width {
                        let w_start = ow * stride.2;
                        let w_stop = (w_start + pool_size.2).min(in_width + 2 * pad.2);
                        let w0 = w_start.max(pad.2);
                        let w1 = w_stop.min(pad.2 + in_width);

                        output[[b, c, od, oh, ow]] = match mode {
                            PoolMode::Max => {
                                let mut max_val = f32::NEG_INFINITY;
                                for d in d0..d1 {
                                    for h in h0..h1 {
                                        for w in w0..w1 {
                                            let val =
                                                input[[b, c, d - pad.0, h - pad.1, w - pad.2]];
                                            if val > max_val {
                                                max_val = val;
                                            }
                                        }
                                    }
                                }
                                max_val
                            }
                            PoolMode::AverageIncPad | PoolMode::AverageExcPad => {
                                let mut sum = 0.0;
                                for d in d0..d1 {
                                    for h in h0..h1 {
                                        for w in w0..w1 {
                                            sum += input[[b, c, d - pad.0, h - pad.1, w - pad.2]];
                                        }
                                    }
                                }
                                let volume = if mode == PoolMode::AverageIncPad {
                                    (d_stop - d_start) * (h_stop - h_start) * (w_stop - w_start)
                                } else {
                                    (d1 - d0) * (h1 - h0) * (w1 - w0)
                                };
                                sum / volume as f32
                            }
                        };
                    }
                }
            }
        }
    }

    Ok(output)
}
