//! Predictor artifact loading.
//!
//! An artifact is a JSON document:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "name": "logreg-2024-11",
//!   "feature_names": ["contract_risk_score", "..."],
//!   "model": { "kind": "logistic_regression", "coefficients": [], "intercept": 0.0 }
//! }
//! ```
//!
//! `feature_names` must equal the scorer's feature contract exactly, in
//! order. An optional `manifest.json` in the same directory binds the model
//! file to a SHA-256 digest; when present it is always enforced.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::logistic::LogisticModel;
use super::tree_ensemble::TreeEnsemble;
use crate::domain::{FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::{ChurnPredictor, ModelLoadError};

/// Artifact format versions this loader understands.
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// File name looked up when the model source is a directory.
pub const MODEL_FILE_NAME: &str = "model.json";

/// File name of the optional integrity manifest.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Model family and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    LogisticRegression(LogisticModel),
    TreeEnsemble(TreeEnsemble),
}

/// Serialized predictor artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub feature_names: Vec<String>,
    pub model: ModelSpec,
}

/// Integrity manifest written by the `seal_model` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    #[serde(default)]
    pub created_at: Option<i64>,
    /// File name -> lowercase hex SHA-256
    pub files: BTreeMap<String, String>,
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for hex digests.
fn digest_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

impl ModelArtifact {
    /// Parse an artifact from JSON text.
    ///
    /// # Errors
    /// Returns `ModelLoadError::Malformed` on invalid JSON.
    pub fn from_json(content: &str) -> Result<Self, ModelLoadError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Check the artifact against the scorer's feature contract.
    ///
    /// # Errors
    /// Returns `ModelLoadError` describing the first incompatibility.
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ModelLoadError::UnsupportedVersion(self.format_version));
        }
        if self.feature_names.len() != FEATURE_COUNT {
            return Err(ModelLoadError::FeatureCount {
                expected: FEATURE_COUNT,
                got: self.feature_names.len(),
            });
        }
        for (index, (got, expected)) in self.feature_names.iter().zip(FEATURE_NAMES).enumerate() {
            if got != expected {
                return Err(ModelLoadError::FeatureOrder {
                    index,
                    expected: expected.to_string(),
                    got: got.clone(),
                });
            }
        }
        match &self.model {
            ModelSpec::LogisticRegression(m) => m.validate(FEATURE_COUNT),
            ModelSpec::TreeEnsemble(m) => m.validate(FEATURE_COUNT),
        }
    }

    /// Validate and convert into a shareable predictor.
    ///
    /// # Errors
    /// Returns `ModelLoadError` if validation fails.
    pub fn into_predictor(self) -> Result<Box<dyn ChurnPredictor>, ModelLoadError> {
        self.validate()?;
        Ok(match self.model {
            ModelSpec::LogisticRegression(m) => Box::new(m),
            ModelSpec::TreeEnsemble(m) => Box::new(m),
        })
    }
}

/// Where the scorer acquires its predictor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSource {
    path: PathBuf,
    require_manifest: bool,
}

impl ModelSource {
    /// A model directory (containing `model.json`) or a model file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            require_manifest: false,
        }
    }

    /// Refuse artifacts that are not bound by a manifest.
    #[must_use]
    pub fn require_manifest(mut self, required: bool) -> Self {
        self.require_manifest = required;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn model_path(&self) -> PathBuf {
        if self.path.is_dir() {
            self.path.join(MODEL_FILE_NAME)
        } else {
            self.path.clone()
        }
    }

    /// Read, verify and deserialize the artifact.
    ///
    /// # Errors
    /// Returns `ModelLoadError` if the artifact is missing, unreadable,
    /// fails its integrity check, or is incompatible with the scorer.
    pub fn load(&self) -> Result<Box<dyn ChurnPredictor>, ModelLoadError> {
        let model_path = self.model_path();
        if !model_path.is_file() {
            return Err(ModelLoadError::NotFound(model_path));
        }

        let bytes = std::fs::read(&model_path).map_err(|source| ModelLoadError::Unreadable {
            path: model_path.clone(),
            source,
        })?;
        self.verify_manifest(&model_path, &bytes)?;

        let content = std::str::from_utf8(&bytes).map_err(|e| {
            ModelLoadError::InvalidParameters(format!("model file is not UTF-8: {e}"))
        })?;
        let artifact = ModelArtifact::from_json(content)?;
        let name = artifact.name.clone();
        let predictor = artifact.into_predictor()?;

        tracing::info!(
            "Loaded model {} from {:?}: {}",
            name.as_deref().unwrap_or("<unnamed>"),
            model_path,
            predictor.describe()
        );
        Ok(predictor)
    }

    fn verify_manifest(&self, model_path: &Path, bytes: &[u8]) -> Result<(), ModelLoadError> {
        let dir = model_path.parent().unwrap_or_else(|| Path::new("."));
        let manifest_path = dir.join(MANIFEST_FILE_NAME);

        if !manifest_path.is_file() {
            if self.require_manifest {
                return Err(ModelLoadError::Integrity(format!(
                    "{MANIFEST_FILE_NAME} required but not found in {dir:?}"
                )));
            }
            tracing::debug!("No manifest next to {:?}; skipping integrity check", model_path);
            return Ok(());
        }

        let content =
            std::fs::read_to_string(&manifest_path).map_err(|source| ModelLoadError::Unreadable {
                path: manifest_path.clone(),
                source,
            })?;
        let manifest: ModelManifest = serde_json::from_str(&content).map_err(|e| {
            ModelLoadError::Integrity(format!("invalid {MANIFEST_FILE_NAME}: {e}"))
        })?;

        let file_name = model_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ModelLoadError::Integrity("model path has no file name".into()))?;
        let expected = manifest.files.get(file_name).ok_or_else(|| {
            ModelLoadError::Integrity(format!("{file_name} is not bound by {MANIFEST_FILE_NAME}"))
        })?;

        let actual = sha256_hex(bytes);
        if !digest_eq(&actual, &expected.to_ascii_lowercase()) {
            return Err(ModelLoadError::Integrity(format!(
                "SHA-256 mismatch for {file_name}"
            )));
        }

        tracing::debug!("Manifest digest verified for {}", file_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn logistic_artifact() -> ModelArtifact {
        ModelArtifact {
            format_version: 1,
            name: Some("test".into()),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            model: ModelSpec::LogisticRegression(LogisticModel {
                coefficients: vec![0.1; FEATURE_COUNT],
                intercept: -1.0,
                scaler: None,
                threshold: 0.5,
            }),
        }
    }

    fn write_artifact(dir: &Path, artifact: &ModelArtifact) -> Vec<u8> {
        let bytes = serde_json::to_vec_pretty(artifact).expect("Should serialize");
        fs::write(dir.join(MODEL_FILE_NAME), &bytes).expect("Should write");
        bytes
    }

    fn write_manifest(dir: &Path, digest: &str) {
        let manifest = ModelManifest {
            version: 1,
            created_at: None,
            files: BTreeMap::from([(MODEL_FILE_NAME.to_string(), digest.to_string())]),
        };
        fs::write(
            dir.join(MANIFEST_FILE_NAME),
            serde_json::to_vec(&manifest).expect("Should serialize"),
        )
        .expect("Should write");
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempdir().expect("tempdir");
        write_artifact(dir.path(), &logistic_artifact());

        let predictor = ModelSource::new(dir.path()).load().expect("Should load");
        assert_eq!(predictor.n_features(), FEATURE_COUNT);
    }

    #[test]
    fn test_load_from_file_path() {
        let dir = tempdir().expect("tempdir");
        write_artifact(dir.path(), &logistic_artifact());

        let source = ModelSource::new(dir.path().join(MODEL_FILE_NAME));
        assert!(source.load().is_ok());
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempdir().expect("tempdir");
        let err = ModelSource::new(dir.path()).load().err().expect("Should fail");
        assert!(matches!(err, ModelLoadError::NotFound(_)));
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join(MODEL_FILE_NAME), b"{ not json").expect("Should write");
        let err = ModelSource::new(dir.path()).load().err().expect("Should fail");
        assert!(matches!(err, ModelLoadError::Malformed(_)));
    }

    #[test]
    fn test_wrong_feature_count() {
        let mut artifact = logistic_artifact();
        artifact.feature_names.pop();
        assert!(matches!(
            artifact.validate(),
            Err(ModelLoadError::FeatureCount { expected: 37, got: 36 })
        ));
    }

    #[test]
    fn test_wrong_feature_order() {
        let mut artifact = logistic_artifact();
        artifact.feature_names.swap(1, 2);
        match artifact.validate() {
            Err(ModelLoadError::FeatureOrder { index, expected, got }) => {
                assert_eq!(index, 1);
                assert_eq!(expected, "tenure_group_encoded");
                assert_eq!(got, "price_segment_encoded");
            }
            other => panic!("Expected FeatureOrder, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_version() {
        let mut artifact = logistic_artifact();
        artifact.format_version = 2;
        assert!(matches!(
            artifact.validate(),
            Err(ModelLoadError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_coefficient_count_must_match() {
        let mut artifact = logistic_artifact();
        artifact.model = ModelSpec::LogisticRegression(LogisticModel {
            coefficients: vec![0.1; 36],
            intercept: 0.0,
            scaler: None,
            threshold: 0.5,
        });
        assert!(matches!(
            artifact.validate(),
            Err(ModelLoadError::FeatureCount { .. })
        ));
    }

    #[test]
    fn test_manifest_verified() {
        let dir = tempdir().expect("tempdir");
        let bytes = write_artifact(dir.path(), &logistic_artifact());
        write_manifest(dir.path(), &sha256_hex(&bytes));

        let source = ModelSource::new(dir.path()).require_manifest(true);
        assert!(source.load().is_ok());
    }

    #[test]
    fn test_manifest_mismatch_rejected() {
        let dir = tempdir().expect("tempdir");
        write_artifact(dir.path(), &logistic_artifact());
        write_manifest(dir.path(), &sha256_hex(b"something else"));

        let err = ModelSource::new(dir.path()).load().err().expect("Should fail");
        assert!(matches!(err, ModelLoadError::Integrity(_)));
    }

    #[test]
    fn test_unparseable_manifest_is_integrity_error() {
        let dir = tempdir().expect("tempdir");
        write_artifact(dir.path(), &logistic_artifact());
        fs::write(dir.path().join(MANIFEST_FILE_NAME), b"{ \"files\": ").expect("Should write");

        match ModelSource::new(dir.path()).load() {
            Err(ModelLoadError::Integrity(msg)) => assert!(msg.contains(MANIFEST_FILE_NAME)),
            Err(other) => panic!("Expected Integrity, got {other}"),
            Ok(_) => panic!("Expected Integrity, got a predictor"),
        }
    }

    #[test]
    fn test_required_manifest_missing() {
        let dir = tempdir().expect("tempdir");
        write_artifact(dir.path(), &logistic_artifact());

        let err = ModelSource::new(dir.path())
            .require_manifest(true)
            .load()
            .err()
            .expect("Should fail");
        assert!(matches!(err, ModelLoadError::Integrity(_)));
    }

    #[test]
    fn test_tree_ensemble_artifact_json() {
        let names: Vec<String> = FEATURE_NAMES.iter().map(|s| format!("\"{s}\"")).collect();
        let json = format!(
            r#"{{
                "format_version": 1,
                "feature_names": [{}],
                "model": {{
                    "kind": "tree_ensemble",
                    "n_features": 37,
                    "aggregation": "average",
                    "trees": [{{"nodes": [
                        {{"type": "split", "feature": 0, "threshold": 1.5, "left": 1, "right": 2}},
                        {{"type": "leaf", "value": 0.1}},
                        {{"type": "leaf", "value": 0.9}}
                    ]}}]
                }}
            }}"#,
            names.join(",")
        );
        let artifact = ModelArtifact::from_json(&json).expect("Should parse");
        let predictor = artifact.into_predictor().expect("Should validate");

        let mut x = [0.0; FEATURE_COUNT];
        x[0] = 2.0;
        let [_, p] = predictor.predict_proba(&x).expect("Should predict");
        assert!((p - 0.9).abs() < 1e-12);
    }
}
