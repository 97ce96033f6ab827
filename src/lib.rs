//! # Charybdis - Pooling and Rescaling Layers for Neural Network Graphs
//!
//! Charybdis is a Rust library of shape-transforming, parameter-free layers
//! for feed-forward computation graphs: windowed max/average pooling over
//! 1D/2D/3D signals, repeat and dilate upscaling, pooling across a feature
//! axis (including winner-take-all competitive pooling), and global pooling.
//!
//! Every layer exposes two contracts to the surrounding graph framework:
//! static shape inference, callable before any tensor values exist, and
//! value computation at graph-execution time. The two are kept consistent by
//! deriving both from the same output-length arithmetic
//! ([`shape::pool_output_length`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use charybdis::layers::{Layer, Pool2DLayer};
//! use ndarray::Array4;
//!
//! let input_shape = vec![Some(1), Some(3), Some(32), Some(32)];
//! let pool = Pool2DLayer::max_pool(&input_shape, 2, None).unwrap();
//!
//! // Static shape inference
//! assert_eq!(
//!     pool.output_shape(&input_shape),
//!     vec![Some(1), Some(3), Some(16), Some(16)]
//! );
//!
//! // Value computation
//! let input = Array4::<f32>::zeros((1, 3, 32, 32));
//! let output = pool.forward_batch(input.view()).unwrap();
//! assert_eq!(output.dim(), (1, 3, 16, 16));
//! ```
//!
//! ## Module Organization
//!
//! - [`error`] - Error types and result handling
//! - [`layers`] - Pooling, upscaling, feature-pool and global-pool layers
//! - [`ops`] - Windowed reduction primitives and axis reductions
//! - [`shape`] - Dimension type and windowed output-length arithmetic

pub mod error;
pub mod layers;
pub mod ops;
pub mod shape;

#[cfg(test)]
mod tests;
