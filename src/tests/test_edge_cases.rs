use ndarray::{Array3, Array4};

use crate::error::CharybdisError;
use crate::layers::{
    FeaturePoolLayer, FeatureWTALayer, GlobalPoolLayer, Layer, Pool1DLayer, Pool2DLayer,
    Pool3DLayer, PoolMode, Upscale1DLayer, UpscaleMode,
};
use crate::ops;
use crate::shape::{pool_output_length, AxisParam, Dim};

fn shape(dims: &[usize]) -> Vec<Dim> {
    dims.iter().map(|&d| Some(d)).collect()
}

#[test]
fn test_rank_mismatch_messages_name_both_ranks() {
    let err = Pool1DLayer::max_pool(&shape(&[1, 1, 4, 4]), 2, None).unwrap_err();
    assert!(matches!(err, CharybdisError::RankMismatch { .. }));
    assert!(err.to_string().contains("3 input dimensions"));

    let err = Pool3DLayer::max_pool(&shape(&[1, 1, 4]), 2, None).unwrap_err();
    assert!(err.to_string().contains("5 input dimensions"));
}

#[test]
fn test_zero_window_and_stride_rejected() {
    let err = Pool2DLayer::max_pool(&shape(&[1, 1, 4, 4]), 0, None).unwrap_err();
    assert!(err.to_string().contains("pool_size"));

    let err = Pool2DLayer::max_pool(
        &shape(&[1, 1, 4, 4]),
        2,
        Some(AxisParam::Uniform(0)),
    )
    .unwrap_err();
    assert!(err.to_string().contains("stride"));
}

#[test]
fn test_per_axis_parameter_length_mismatch() {
    let err = Pool2DLayer::max_pool(
        &shape(&[1, 1, 4, 4]),
        AxisParam::PerAxis(vec![2, 2, 2]),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, CharybdisError::InvalidParameter { .. }));
}

#[test]
fn test_window_larger_than_input() {
    // ignore_border discards the window that cannot fit
    let layer = Pool1DLayer::max_pool(&shape(&[1, 1, 2]), 5, None).unwrap();
    let input = Array3::from_shape_vec((1, 1, 2), vec![1.0, 2.0]).unwrap();
    let output = layer.forward_batch(input.view()).unwrap();
    assert_eq!(output.dim(), (1, 1, 0));

    // without ignore_border the partial window survives
    let layer = Pool1DLayer::new(&shape(&[1, 1, 2]), 5, None, 0, false, PoolMode::Max).unwrap();
    let output = layer.forward_batch(input.view()).unwrap();
    assert_eq!(output.dim(), (1, 1, 1));
    assert_eq!(output[[0, 0, 0]], 2.0);
}

#[test]
fn test_pool_size_one_is_identity() {
    let layer = Pool2DLayer::max_pool(&shape(&[1, 2, 3, 3]), 1, None).unwrap();
    let input = Array4::from_shape_fn((1, 2, 3, 3), |(_, c, h, w)| (c + h + w) as f32);
    let output = layer.forward_batch(input.view()).unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_max_pool_all_negative_input() {
    let layer = Pool2DLayer::max_pool(&shape(&[1, 1, 2, 2]), 2, None).unwrap();
    let input = Array4::from_shape_vec((1, 1, 2, 2), vec![-5.0, -3.0, -9.0, -4.0]).unwrap();
    let output = layer.forward_batch(input.view()).unwrap();
    assert_eq!(output[[0, 0, 0, 0]], -3.0);
}

#[test]
fn test_wta_group_of_one_is_identity() {
    let layer = FeatureWTALayer::new(&shape(&[2, 3]), 1, 1).unwrap();
    let input = ndarray::Array2::from_shape_vec((2, 3), vec![1.0, -2.0, 3.0, 4.0, 5.0, -6.0])
        .unwrap()
        .into_dyn();
    let output = layer.forward(input.view()).unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_feature_pool_whole_axis() {
    // Pooling the entire axis collapses it to one entry
    let layer = FeaturePoolLayer::new(&shape(&[2, 6]), 6, 1, ops::max_axis).unwrap();
    let input = ndarray::Array2::from_shape_fn((2, 6), |(b, f)| (b * 6 + f) as f32).into_dyn();
    let output = layer.forward(input.view()).unwrap();
    assert_eq!(output.shape(), &[2, 1]);
    assert_eq!(output[[0, 0]], 5.0);
    assert_eq!(output[[1, 0]], 11.0);
}

#[test]
fn test_global_pool_single_trailing_axis() {
    let layer = GlobalPoolLayer::new(&shape(&[2, 4, 5])).unwrap();
    let input = Array3::from_elem((2, 4, 5), 2.0).into_dyn();
    let output = layer.forward(input.view()).unwrap();
    assert_eq!(output.shape(), &[2, 4]);
}

#[test]
fn test_upscale_wrong_rank_input_at_forward() {
    let layer = Upscale1DLayer::new(&shape(&[1, 1, 4]), 2, UpscaleMode::Repeat).unwrap();
    let input = Array4::zeros((1, 1, 4, 4)).into_dyn();
    assert!(layer.forward(input.view()).is_err());
}

#[test]
fn test_output_length_zero_input() {
    assert_eq!(pool_output_length(Some(0), Some(2), 2, 0, true), Some(0));
}
