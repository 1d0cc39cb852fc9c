//! Model sealing utility.
//!
//! Validates a predictor artifact against the scorer's feature contract and
//! writes `manifest.json` binding it to its SHA-256 digest. The loader
//! refuses a sealed artifact whose bytes no longer match.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin seal_model -- <model_dir | model.json>
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};

use churnscope::adapters::artifact::{sha256_hex, MANIFEST_FILE_NAME, MODEL_FILE_NAME};
use churnscope::adapters::{ModelArtifact, ModelManifest};

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn main() -> Result<()> {
    let Some(arg) = std::env::args().nth(1) else {
        bail!("Usage: seal_model <model_dir | model.json>");
    };
    let path = PathBuf::from(arg);

    let (model_dir, model_path) = if path.is_file() {
        let dir = path
            .parent()
            .context("Model path has no parent directory")?
            .to_path_buf();
        (dir, path)
    } else {
        (path.clone(), path.join(MODEL_FILE_NAME))
    };

    let bytes = fs::read(&model_path).with_context(|| format!("Failed to read {model_path:?}"))?;
    let content = std::str::from_utf8(&bytes).context("Model file is not UTF-8")?;

    // Never seal an artifact the scorer would refuse.
    ModelArtifact::from_json(content)
        .and_then(|artifact| artifact.validate())
        .with_context(|| format!("{model_path:?} is not a valid churn model artifact"))?;

    let file_name = model_path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Model path has no file name")?
        .to_string();

    let manifest = ModelManifest {
        version: 1,
        created_at: Some(unix_now()),
        files: BTreeMap::from([(file_name, sha256_hex(&bytes))]),
    };

    let manifest_path = model_dir.join(MANIFEST_FILE_NAME);
    fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    println!("Sealed {model_path:?}");
    println!("Wrote manifest: {manifest_path:?}");
    Ok(())
}
