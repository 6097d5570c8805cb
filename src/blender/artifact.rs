// Artifact references
//
// A reference is only ever constructed after confirming the file exists on
// disk; a missing expected artifact is a first-class error, not a silent
// gap in the response.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::BridgeError;

/// A file produced by the external tool, referenced by path in later
/// pipeline steps. The file itself belongs to the filesystem; the bridge
/// never deletes final artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactReference {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub format: String,
}

impl ArtifactReference {
    /// Check that `path` exists and build a reference to it.
    pub fn verify(path: &Path) -> Result<Self, BridgeError> {
        let metadata = std::fs::metadata(path)
            .map_err(|_| BridgeError::ArtifactMissing(path.to_path_buf()))?;
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_verify_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mesh.obj");
        std::fs::write(&path, "v 0 0 0\n").unwrap();
        let artifact = ArtifactReference::verify(&path).unwrap();
        assert_eq!(artifact.path, path);
        assert_eq!(artifact.size_bytes, 8);
        assert_eq!(artifact.format, "obj");
    }

    #[test]
    fn test_verify_missing_file_is_artifact_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.obj");
        let err = ArtifactReference::verify(&path).unwrap_err();
        assert!(matches!(err, BridgeError::ArtifactMissing(_)));
    }

    #[test]
    fn test_verify_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mesh.obj");
        std::fs::write(&path, "data").unwrap();
        let first = ArtifactReference::verify(&path).unwrap();
        let second = ArtifactReference::verify(&path).unwrap();
        assert_eq!(first.path, second.path);
        assert_eq!(first.size_bytes, second.size_bytes);
        assert_eq!(first.format, second.format);
    }
}
