//! Shape arithmetic for pooling and rescaling layers
//!
//! Shapes are sequences of dimensions that may be unknown at graph
//! construction time. The windowed output-length formula in this module is
//! the single source of truth for every sliding-window operator: the layer
//! shape inference and the reduction primitives in [`crate::ops`] both
//! derive their window counts from it.

use crate::error::{CharybdisError, Result};

/// A single dimension of a tensor shape. `None` marks a dimension whose size
/// is not known until graph execution.
pub type Dim = Option<usize>;

/// Compute the output length of a windowed (pooling) operator along a single
/// dimension.
///
/// If either `input_length` or `pool_size` is unknown, the result is unknown.
///
/// With `ignore_border` enabled, the result is the number of windows that fit
/// entirely inside the padded input, one per stride. With `ignore_border`
/// disabled (which requires `pad == 0`, see [`crate::ops::pool_2d`]), a single
/// partial trailing window is appended whenever elements would otherwise be
/// left uncovered.
///
/// # Examples
///
/// ```
/// use charybdis::shape::pool_output_length;
///
/// assert_eq!(pool_output_length(Some(10), Some(3), 2, 0, true), Some(4));
/// assert_eq!(pool_output_length(Some(10), Some(3), 2, 0, false), Some(5));
/// assert_eq!(pool_output_length(None, Some(3), 2, 0, true), None);
/// ```
pub fn pool_output_length(
    input_length: Dim,
    pool_size: Dim,
    stride: usize,
    pad: usize,
    ignore_border: bool,
) -> Dim {
    let (input_length, pool_size) = match (input_length, pool_size) {
        (Some(i), Some(p)) => (i, p),
        _ => return None,
    };

    let output_length = if ignore_border {
        // Number of window start positions inside the padded input. Saturates
        // at zero when the window is larger than the padded input.
        let span = (input_length + 2 * pad + 1).saturating_sub(pool_size);
        (span + stride - 1) / stride
    } else {
        debug_assert_eq!(pad, 0, "ignore_border=false requires zero padding");

        if stride >= pool_size {
            (input_length + stride - 1) / stride
        } else {
            (input_length.saturating_sub(pool_size) + stride - 1) / stride + 1
        }
    };

    Some(output_length)
}

/// A per-axis parameter that broadcasts a single value over every spatial
/// axis, or lists one value per axis.
///
/// This is the normalization step every windowed layer constructor performs
/// on its `pool_size`, `stride`, and `pad` arguments: a scalar applies to all
/// spatial axes, a sequence must match the axis count exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisParam {
    /// One value for every spatial axis
    Uniform(usize),

    /// One value per spatial axis
    PerAxis(Vec<usize>),
}

impl AxisParam {
    /// Resolve the parameter into one value per spatial axis.
    ///
    /// Fails when a `PerAxis` list does not have exactly `axes` entries.
    pub fn into_axes(self, name: &str, axes: usize) -> Result<Vec<usize>> {
        match self {
            AxisParam::Uniform(value) => Ok(vec![value; axes]),
            AxisParam::PerAxis(values) => {
                if values.len() != axes {
                    return Err(CharybdisError::InvalidParameter {
                        name: name.to_string(),
                        reason: format!(
                            "expected {} per-axis values, got {}",
                            axes,
                            values.len()
                        ),
                    });
                }
                Ok(values)
            }
        }
    }
}

impl From<usize> for AxisParam {
    fn from(value: usize) -> Self {
        AxisParam::Uniform(value)
    }
}

impl From<(usize, usize)> for AxisParam {
    fn from(value: (usize, usize)) -> Self {
        AxisParam::PerAxis(vec![value.0, value.1])
    }
}

impl From<(usize, usize, usize)> for AxisParam {
    fn from(value: (usize, usize, usize)) -> Self {
        AxisParam::PerAxis(vec![value.0, value.1, value.2])
    }
}

impl From<Vec<usize>> for AxisParam {
    fn from(value: Vec<usize>) -> Self {
        AxisParam::PerAxis(value)
    }
}

/// Render a shape for error messages, writing unknown dimensions as `?`.
pub fn format_shape(shape: &[Dim]) -> String {
    let dims: Vec<String> = shape
        .iter()
        .map(|dim| match dim {
            Some(size) => size.to_string(),
            None => "?".to_string(),
        })
        .collect();
    format!("({})", dims.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_length_ignore_border() {
        assert_eq!(pool_output_length(Some(10), Some(3), 2, 0, true), Some(4));
        assert_eq!(pool_output_length(Some(10), Some(2), 2, 0, true), Some(5));
        assert_eq!(pool_output_length(Some(7), Some(3), 3, 0, true), Some(2));
        // Padding extends the input on both sides
        assert_eq!(pool_output_length(Some(10), Some(3), 2, 1, true), Some(5));
    }

    #[test]
    fn test_output_length_partial_windows() {
        assert_eq!(pool_output_length(Some(10), Some(3), 2, 0, false), Some(5));
        // stride >= pool_size: every element is covered, round up
        assert_eq!(pool_output_length(Some(10), Some(2), 3, 0, false), Some(4));
        // input smaller than the window still yields one partial window
        assert_eq!(pool_output_length(Some(2), Some(5), 1, 0, false), Some(1));
    }

    #[test]
    fn test_output_length_window_larger_than_input() {
        assert_eq!(pool_output_length(Some(2), Some(5), 1, 0, true), Some(0));
        assert_eq!(pool_output_length(Some(0), Some(3), 1, 0, true), Some(0));
    }

    #[test]
    fn test_output_length_unknown_propagates() {
        assert_eq!(pool_output_length(None, Some(3), 2, 0, true), None);
        assert_eq!(pool_output_length(Some(10), None, 2, 0, true), None);
    }

    #[test]
    fn test_axis_param_broadcast() {
        let param = AxisParam::from(2);
        assert_eq!(param.into_axes("pool_size", 3).unwrap(), vec![2, 2, 2]);

        let param = AxisParam::from((2, 3));
        assert_eq!(param.into_axes("pool_size", 2).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_axis_param_wrong_length() {
        let param = AxisParam::from((2, 3));
        let err = param.into_axes("stride", 3).unwrap_err();
        assert!(err.to_string().contains("stride"));
    }

    #[test]
    fn test_format_shape() {
        assert_eq!(format_shape(&[Some(2), None, Some(4)]), "(2, ?, 4)");
    }
}
