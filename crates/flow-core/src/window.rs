//! The fixed input window consumed by a single forecast.
//!
//! A window is exactly [`LOOK_BACK`] timesteps of [`N_FEATURES`] readings.
//! The model predicts only the feature stored at [`TARGET_SLOT`].

use thiserror::Error;

/// Number of historical timesteps per prediction.
pub const LOOK_BACK: usize = 12;

/// Number of numeric features per timestep.
pub const N_FEATURES: usize = 3;

/// Index of the predicted feature (the last one).
pub const TARGET_SLOT: usize = N_FEATURES - 1;

/// One timestep worth of features.
pub type Timestep = [f64; N_FEATURES];

/// Shape violations when building an [`InputSequence`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowError {
    #[error("expected {expected} timesteps, found {found}", expected = LOOK_BACK)]
    Length { found: usize },

    #[error("timestep {row} has {found} features, expected {expected}", expected = N_FEATURES)]
    Width { row: usize, found: usize },
}

/// A shape-checked `LOOK_BACK x N_FEATURES` window in real units.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSequence {
    rows: [Timestep; LOOK_BACK],
}

impl InputSequence {
    /// Build a window from ragged rows, rejecting anything that is not
    /// exactly `LOOK_BACK x N_FEATURES`.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, WindowError> {
        if rows.len() != LOOK_BACK {
            return Err(WindowError::Length { found: rows.len() });
        }

        let mut out = [[0.0; N_FEATURES]; LOOK_BACK];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != N_FEATURES {
                return Err(WindowError::Width {
                    row: i,
                    found: row.len(),
                });
            }
            out[i].copy_from_slice(row);
        }

        Ok(Self { rows: out })
    }

    pub fn rows(&self) -> &[Timestep; LOOK_BACK] {
        &self.rows
    }

    /// Row-major flattening, `LOOK_BACK * N_FEATURES` values.
    pub fn to_flat(&self) -> Vec<f64> {
        self.rows.iter().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize, width: usize) -> Vec<Vec<f64>> {
        (0..n).map(|i| vec![i as f64; width]).collect()
    }

    #[test]
    fn target_slot_is_last_feature() {
        assert_eq!(TARGET_SLOT, 2);
    }

    #[test]
    fn accepts_exact_shape() {
        let seq = InputSequence::from_rows(&rows(LOOK_BACK, N_FEATURES)).unwrap();
        assert_eq!(seq.rows()[11], [11.0, 11.0, 11.0]);
        assert_eq!(seq.to_flat().len(), LOOK_BACK * N_FEATURES);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = InputSequence::from_rows(&rows(11, N_FEATURES)).unwrap_err();
        assert_eq!(err, WindowError::Length { found: 11 });
    }

    #[test]
    fn rejects_ragged_row() {
        let mut r = rows(LOOK_BACK, N_FEATURES);
        r[4].pop();
        let err = InputSequence::from_rows(&r).unwrap_err();
        assert_eq!(err, WindowError::Width { row: 4, found: 2 });
    }
}
