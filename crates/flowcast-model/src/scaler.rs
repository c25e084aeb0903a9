//! Fitted per-feature scalers.
//!
//! Every supported scaler is an affine map per column,
//! `scaled = x * scale + offset`, so a single [`AffineScaler`] evaluates
//! both min-max and standard fits. Parameters follow the fitted attributes
//! of the scaler the model was trained with; zero data ranges and zero
//! standard deviations are treated as 1 so constant columns stay finite.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// An invertible feature transform over `n_features` columns.
pub trait Transform: Send + Sync {
    fn n_features(&self) -> usize;

    /// Normalize each column of `x` (`rows x n_features`).
    fn forward(&self, x: &Array2<f64>) -> ModelResult<Array2<f64>>;

    /// Map normalized rows back to real units.
    fn inverse(&self, x: &Array2<f64>) -> ModelResult<Array2<f64>>;
}

fn unit_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// Serialized scaler parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerSpec {
    MinMax {
        data_min: Vec<f64>,
        data_max: Vec<f64>,
        #[serde(default = "unit_range")]
        feature_range: (f64, f64),
    },
    Standard {
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AffineScaler {
    scale: Array1<f64>,
    offset: Array1<f64>,
}

fn nonzero(v: f64) -> f64 {
    if v == 0.0 { 1.0 } else { v }
}

impl AffineScaler {
    pub fn from_spec(spec: &ScalerSpec) -> ModelResult<Self> {
        let (scale, offset): (Vec<f64>, Vec<f64>) = match spec {
            ScalerSpec::MinMax {
                data_min,
                data_max,
                feature_range: (lo, hi),
            } => {
                if data_min.len() != data_max.len() {
                    return Err(ModelError::Invalid(format!(
                        "data_min has {} features but data_max has {}",
                        data_min.len(),
                        data_max.len()
                    )));
                }
                if lo >= hi {
                    return Err(ModelError::Invalid(format!(
                        "feature_range ({lo}, {hi}) is empty"
                    )));
                }
                data_min
                    .iter()
                    .zip(data_max)
                    .map(|(&min, &max)| {
                        let scale = (hi - lo) / nonzero(max - min);
                        (scale, lo - min * scale)
                    })
                    .unzip()
            }
            ScalerSpec::Standard { mean, scale } => {
                if mean.len() != scale.len() {
                    return Err(ModelError::Invalid(format!(
                        "mean has {} features but scale has {}",
                        mean.len(),
                        scale.len()
                    )));
                }
                mean.iter()
                    .zip(scale)
                    .map(|(&m, &s)| {
                        let s = nonzero(s);
                        (1.0 / s, -m / s)
                    })
                    .unzip()
            }
        };

        if scale.is_empty() {
            return Err(ModelError::Invalid("scaler has no features".into()));
        }
        if scale.iter().chain(&offset).any(|v| !v.is_finite()) {
            return Err(ModelError::Invalid(
                "scaler parameters must be finite".into(),
            ));
        }

        Ok(Self {
            scale: Array1::from(scale),
            offset: Array1::from(offset),
        })
    }

    fn check_width(&self, x: &Array2<f64>) -> ModelResult<()> {
        if x.ncols() != self.scale.len() {
            return Err(ModelError::Shape {
                expected: vec![x.nrows(), self.scale.len()],
                found: x.shape().to_vec(),
            });
        }
        Ok(())
    }
}

impl Transform for AffineScaler {
    fn n_features(&self) -> usize {
        self.scale.len()
    }

    fn forward(&self, x: &Array2<f64>) -> ModelResult<Array2<f64>> {
        self.check_width(x)?;
        Ok(x * &self.scale + &self.offset)
    }

    fn inverse(&self, x: &Array2<f64>) -> ModelResult<Array2<f64>> {
        self.check_width(x)?;
        Ok((x - &self.offset) / &self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn traffic_minmax() -> AffineScaler {
        AffineScaler::from_spec(&ScalerSpec::MinMax {
            data_min: vec![0.0, 0.0, 0.0],
            data_max: vec![23.0, 6.0, 200.0],
            feature_range: (0.0, 1.0),
        })
        .unwrap()
    }

    fn assert_close(a: &Array2<f64>, b: &Array2<f64>) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{x} != {y}");
        }
    }

    #[test]
    fn minmax_maps_data_range_onto_feature_range() {
        let s = traffic_minmax();
        let out = s.forward(&array![[0.0, 0.0, 0.0], [23.0, 6.0, 200.0]]).unwrap();
        assert_close(&out, &array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
    }

    #[test]
    fn minmax_custom_feature_range() {
        let s = AffineScaler::from_spec(&ScalerSpec::MinMax {
            data_min: vec![10.0],
            data_max: vec![20.0],
            feature_range: (-1.0, 1.0),
        })
        .unwrap();
        let out = s.forward(&array![[10.0], [15.0], [20.0]]).unwrap();
        assert_close(&out, &array![[-1.0], [0.0], [1.0]]);
    }

    #[test]
    fn constant_column_is_not_divided_by_zero() {
        let s = AffineScaler::from_spec(&ScalerSpec::MinMax {
            data_min: vec![5.0],
            data_max: vec![5.0],
            feature_range: (0.0, 1.0),
        })
        .unwrap();
        let out = s.forward(&array![[5.0], [6.0]]).unwrap();
        assert_close(&out, &array![[0.0], [1.0]]);
    }

    #[test]
    fn standard_scaler_centres_and_scales() {
        let s = AffineScaler::from_spec(&ScalerSpec::Standard {
            mean: vec![10.0, 0.0],
            scale: vec![2.0, 0.0],
        })
        .unwrap();
        let out = s.forward(&array![[12.0, 3.0]]).unwrap();
        assert_close(&out, &array![[1.0, 3.0]]);
    }

    #[test]
    fn inverse_recovers_forward_input() {
        let s = traffic_minmax();
        let x = Array2::from_shape_fn((12, 3), |(i, j)| (i * 7 + j * 13) as f64 * 1.37 - 4.0);
        let back = s.inverse(&s.forward(&x).unwrap()).unwrap();
        assert_close(&back, &x);

        let z = AffineScaler::from_spec(&ScalerSpec::Standard {
            mean: vec![3.0, -1.0, 120.0],
            scale: vec![0.5, 2.0, 40.0],
        })
        .unwrap();
        let back = z.inverse(&z.forward(&x).unwrap()).unwrap();
        assert_close(&back, &x);
    }

    #[test]
    fn placeholder_inverse_only_target_slot_is_meaningful() {
        let s = traffic_minmax();
        let out = s.inverse(&array![[0.0, 0.0, 0.5]]).unwrap();
        assert!((out[[0, 2]] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_wrong_width() {
        let s = traffic_minmax();
        let err = s.forward(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, ModelError::Shape { .. }));
    }

    #[test]
    fn rejects_mismatched_parameters() {
        let err = AffineScaler::from_spec(&ScalerSpec::MinMax {
            data_min: vec![0.0, 0.0],
            data_max: vec![1.0],
            feature_range: (0.0, 1.0),
        })
        .unwrap_err();
        assert!(matches!(err, ModelError::Invalid(_)));
    }

    #[test]
    fn spec_parses_tagged_json() {
        let spec: ScalerSpec = serde_json::from_str(
            r#"{"kind":"min_max","data_min":[0,0,0],"data_max":[1,1,1]}"#,
        )
        .unwrap();
        assert_eq!(
            spec,
            ScalerSpec::MinMax {
                data_min: vec![0.0; 3],
                data_max: vec![1.0; 3],
                feature_range: (0.0, 1.0),
            }
        );
    }
}
