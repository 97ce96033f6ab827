#[cfg(test)]
mod property_tests {
    use charybdis::layers::{
        FeatureWTALayer, GlobalPoolLayer, Layer, Pool2DLayer, PoolMode, Upscale2DLayer,
        UpscaleMode,
    };
    use charybdis::shape::{pool_output_length, Dim};
    use ndarray::{Array4, ArrayD, IxDyn};
    use proptest::prelude::*;

    fn known(dims: &[usize]) -> Vec<Dim> {
        dims.iter().map(|&d| Some(d)).collect()
    }

    // Strategy for integer-valued activations, so that sums and averages
    // stay exact in f32
    fn values_strategy(len: usize) -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec((-8i8..=8).prop_map(|v| v as f32), len)
    }

    proptest! {
        #[test]
        fn output_length_monotonic_in_input_length(
            input_length in 0usize..200,
            pool_size in 1usize..8,
            stride in 1usize..8,
            pad in 0usize..4,
        ) {
            prop_assume!(pad < pool_size);

            let shorter = pool_output_length(Some(input_length), Some(pool_size), stride, pad, true);
            let longer = pool_output_length(Some(input_length + 1), Some(pool_size), stride, pad, true);

            prop_assert!(longer.unwrap() >= shorter.unwrap());
        }

        #[test]
        fn inferred_shape_matches_computed_shape(
            batch_size in 1usize..3,
            channels in 1usize..3,
            height in 1usize..12,
            width in 1usize..12,
            pool_size in 1usize..5,
            stride in 1usize..5,
            pad in 0usize..4,
            ignore_border in any::<bool>(),
        ) {
            prop_assume!(pad < pool_size);
            let pad = if ignore_border { pad } else { 0 };

            let input_shape = known(&[batch_size, channels, height, width]);
            let layer = Pool2DLayer::new(
                &input_shape,
                pool_size,
                Some(stride.into()),
                pad,
                ignore_border,
                PoolMode::Max,
            ).unwrap();

            let inferred = layer.output_shape(&input_shape);
            let input = Array4::<f32>::ones((batch_size, channels, height, width));
            let output = layer.forward_batch(input.view()).unwrap();

            let actual: Vec<Dim> = output.shape().iter().map(|&d| Some(d)).collect();
            prop_assert_eq!(inferred, actual);
        }

        #[test]
        fn repeat_upscale_then_pool_is_identity(
            values in values_strategy(2 * 3 * 3),
            scale in 1usize..4,
            max_mode in any::<bool>(),
        ) {
            let input = Array4::from_shape_vec((1, 2, 3, 3), values).unwrap();

            let upscale = Upscale2DLayer::new(
                &known(&[1, 2, 3, 3]),
                scale,
                UpscaleMode::Repeat,
            ).unwrap();
            let upscaled = upscale.forward_batch(input.view()).unwrap();

            let mode = if max_mode { PoolMode::Max } else { PoolMode::AverageExcPad };
            let pool = Pool2DLayer::new(
                &known(&[1, 2, 3 * scale, 3 * scale]),
                scale,
                None,
                0,
                true,
                mode,
            ).unwrap();
            let recovered = pool.forward_batch(upscaled.view()).unwrap();

            prop_assert_eq!(recovered, input);
        }

        #[test]
        fn dilate_scatters_exactly_at_scale_multiples(
            values in values_strategy(2 * 3 * 2),
            scale_h in 1usize..4,
            scale_w in 1usize..4,
        ) {
            let input = Array4::from_shape_vec((1, 2, 3, 2), values).unwrap();

            let upscale = Upscale2DLayer::new(
                &known(&[1, 2, 3, 2]),
                (scale_h, scale_w),
                UpscaleMode::Dilate,
            ).unwrap();
            let output = upscale.forward_batch(input.view()).unwrap();

            prop_assert_eq!(output.dim(), (1, 2, 3 * scale_h, 2 * scale_w));
            for ((b, c, h, w), &val) in output.indexed_iter() {
                if h % scale_h == 0 && w % scale_w == 0 {
                    prop_assert_eq!(val, input[[b, c, h / scale_h, w / scale_w]]);
                } else {
                    prop_assert_eq!(val, 0.0);
                }
            }
        }

        #[test]
        fn wta_keeps_the_first_maximum_of_each_group(
            values in values_strategy(2 * 6),
            pool_size in prop::sample::select(vec![1usize, 2, 3, 6]),
        ) {
            let input = ArrayD::from_shape_vec(IxDyn(&[2, 6]), values).unwrap();

            let layer = FeatureWTALayer::new(&known(&[2, 6]), pool_size, 1).unwrap();
            let output = layer.forward(input.view()).unwrap();

            for b in 0..2 {
                for group in 0..6 / pool_size {
                    // Reference winner: first maximal index in the group
                    let mut winner = 0;
                    let mut winner_val = f32::NEG_INFINITY;
                    for j in 0..pool_size {
                        let val = input[[b, group * pool_size + j]];
                        if val > winner_val {
                            winner_val = val;
                            winner = j;
                        }
                    }

                    for j in 0..pool_size {
                        let out = output[[b, group * pool_size + j]];
                        if j == winner {
                            prop_assert_eq!(out, winner_val);
                        } else {
                            prop_assert_eq!(out, 0.0);
                        }
                    }
                }
            }
        }

        #[test]
        fn global_pool_keeps_only_batch_and_channels(
            batch_size in 1usize..4,
            channels in 1usize..4,
            trailing in prop::collection::vec(1usize..4, 1..4),
        ) {
            let mut dims = vec![batch_size, channels];
            dims.extend(&trailing);

            let layer = GlobalPoolLayer::new(&known(&dims)).unwrap();
            prop_assert_eq!(
                layer.output_shape(&known(&dims)),
                known(&[batch_size, channels])
            );

            let input = ArrayD::from_elem(IxDyn(&dims), 1.5);
            let output = layer.forward(input.view()).unwrap();
            prop_assert_eq!(output.shape(), &[batch_size, channels][..]);
            for &val in output.iter() {
                prop_assert_eq!(val, 1.5);
            }
        }
    }
}
