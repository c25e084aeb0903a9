//! Loading the exported model and scaler artifacts from disk.
//!
//! Both artifacts are JSON documents carrying a semver `format_version`.
//! Loading is all-or-nothing: any read, parse, checksum, version or shape
//! problem is returned as a [`ModelError`] and nothing is constructed.

use std::path::Path;

use ndarray::{Array1, Array2};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use flow_core::N_FEATURES;

use crate::error::{ModelError, ModelResult};
use crate::lstm::{Activation, DenseLayer, LstmLayer, LstmModel};
use crate::scaler::{AffineScaler, ScalerSpec, Transform};

/// Artifact format versions this build understands.
pub const SUPPORTED_FORMAT: &str = "^1";

/// A constructed artifact together with the digest of the bytes it came from.
#[derive(Debug, Clone)]
pub struct LoadedArtifact<T> {
    pub value: T,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: String,
    pub look_back: usize,
    pub n_features: usize,
    pub lstm: Vec<LstmLayerArtifact>,
    #[serde(default)]
    pub dense: Vec<DenseLayerArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayerArtifact {
    pub kernel: Vec<Vec<f64>>,
    pub recurrent_kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayerArtifact {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default = "linear")]
    pub activation: Activation,
}

fn linear() -> Activation {
    Activation::Linear
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub format_version: String,
    #[serde(flatten)]
    pub spec: ScalerSpec,
}

/// Load and validate the LSTM model artifact.
pub fn load_model(path: &Path, expected_sha256: Option<&str>) -> ModelResult<LoadedArtifact<LstmModel>> {
    let (artifact, sha256): (ModelArtifact, _) = read_json(path, expected_sha256)?;
    check_format_version(&artifact.format_version)?;

    let lstm = artifact
        .lstm
        .iter()
        .enumerate()
        .map(|(i, l)| {
            LstmLayer::new(
                matrix(&format!("lstm[{i}].kernel"), &l.kernel)?,
                matrix(&format!("lstm[{i}].recurrent_kernel"), &l.recurrent_kernel)?,
                Array1::from(l.bias.clone()),
            )
        })
        .collect::<ModelResult<Vec<_>>>()?;

    let dense = artifact
        .dense
        .iter()
        .enumerate()
        .map(|(i, d)| {
            DenseLayer::new(
                matrix(&format!("dense[{i}].weights"), &d.weights)?,
                Array1::from(d.bias.clone()),
                d.activation,
            )
        })
        .collect::<ModelResult<Vec<_>>>()?;

    let model = LstmModel::new(artifact.look_back, artifact.n_features, lstm, dense)?;
    info!(
        path = %path.display(),
        %sha256,
        lstm_layers = artifact.lstm.len(),
        dense_layers = artifact.dense.len(),
        "model artifact loaded"
    );

    Ok(LoadedArtifact { value: model, sha256 })
}

/// Load and validate the fitted scaler artifact.
pub fn load_scaler(path: &Path, expected_sha256: Option<&str>) -> ModelResult<LoadedArtifact<AffineScaler>> {
    let (artifact, sha256): (ScalerArtifact, _) = read_json(path, expected_sha256)?;
    check_format_version(&artifact.format_version)?;

    let scaler = AffineScaler::from_spec(&artifact.spec)?;
    if scaler.n_features() != N_FEATURES {
        return Err(ModelError::Invalid(format!(
            "scaler was fit on {} features, expected {N_FEATURES}",
            scaler.n_features()
        )));
    }
    info!(path = %path.display(), %sha256, "scaler artifact loaded");

    Ok(LoadedArtifact { value: scaler, sha256 })
}

fn read_json<T: for<'de> Deserialize<'de>>(
    path: &Path,
    expected_sha256: Option<&str>,
) -> ModelResult<(T, String)> {
    let bytes = std::fs::read(path).map_err(|source| ModelError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let sha256 = hex::encode(Sha256::digest(&bytes));
    if let Some(expected) = expected_sha256 {
        if !expected.eq_ignore_ascii_case(&sha256) {
            return Err(ModelError::Checksum {
                path: path.to_path_buf(),
                expected: expected.to_string(),
                found: sha256,
            });
        }
    }

    let value = serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((value, sha256))
}

fn check_format_version(raw: &str) -> ModelResult<()> {
    let version = Version::parse(raw).map_err(|e| ModelError::Version(format!("{raw}: {e}")))?;
    let req = VersionReq::parse(SUPPORTED_FORMAT).map_err(|e| ModelError::Version(e.to_string()))?;
    if !req.matches(&version) {
        return Err(ModelError::Version(format!(
            "{version} does not satisfy {SUPPORTED_FORMAT}"
        )));
    }
    Ok(())
}

fn matrix(name: &str, rows: &[Vec<f64>]) -> ModelResult<Array2<f64>> {
    let ncols = rows.first().map(Vec::len).unwrap_or(0);
    if let Some(bad) = rows.iter().find(|r| r.len() != ncols) {
        return Err(ModelError::Invalid(format!(
            "{name} is ragged: rows of {ncols} and {} values",
            bad.len()
        )));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), ncols), flat)
        .map_err(|e| ModelError::Invalid(format!("{name}: {e}")))
}
