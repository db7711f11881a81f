//! Recording storage
//!
//! Recordings are JSON files named `{hash}.json`. With a test id they live
//! in `{base}/{test dir}/recordings/`, otherwise in `{base}/recordings/`.
//! Lookups in a test scope fall back to the shared directory.

use std::path::{Component, Path, PathBuf};

use crate::error::StoreError;
use crate::record::Recording;

const RECORDINGS_DIR: &str = "recordings";

/// Recording files under one base directory
#[derive(Debug, Clone)]
pub struct ResponseStorage {
    base_dir: PathBuf,
    test_dir: Option<PathBuf>,
}

impl ResponseStorage {
    pub fn new(base_dir: impl Into<PathBuf>, test_id: Option<&str>) -> Self {
        Self {
            base_dir: base_dir.into(),
            test_dir: test_id.and_then(test_dir_for),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory new recordings are written to
    pub fn recordings_dir(&self) -> PathBuf {
        self.test_dir.as_ref().map_or_else(
            || self.shared_dir(),
            |dir| self.base_dir.join(dir).join(RECORDINGS_DIR),
        )
    }

    fn shared_dir(&self) -> PathBuf {
        self.base_dir.join(RECORDINGS_DIR)
    }

    /// Write a recording, replacing any previous one for `hash`
    ///
    /// The file is written beside its final path and renamed into place, so
    /// readers never observe a partial recording.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash is not a valid file stem, or the
    /// recording cannot be encoded or written
    pub async fn store_recording(&self, hash: &str, recording: &Recording) -> Result<PathBuf, StoreError> {
        validate_hash(hash)?;

        let dir = self.recordings_dir();
        tokio::fs::create_dir_all(&dir).await.map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(format!("{hash}.json"));
        let tmp = dir.join(format!(".{hash}.json.tmp-{}", uuid::Uuid::new_v4()));
        let encoded = serde_json::to_vec_pretty(recording).map_err(StoreError::Encode)?;

        let written = match tokio::fs::write(&tmp, &encoded).await {
            Ok(()) => tokio::fs::rename(&tmp, &path)
                .await
                .map_err(|source| StoreError::Io { path: path.clone(), source }),
            Err(source) => Err(StoreError::Io { path: tmp.clone(), source }),
        };
        if written.is_err() {
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        written?;

        tracing::debug!(hash, path = %path.display(), "recording stored");
        Ok(path)
    }

    /// Load the recording for `hash`, if one exists
    ///
    /// # Errors
    ///
    /// Returns an error if the hash is invalid, or a recording file exists
    /// but cannot be read or decoded
    pub async fn find_recording(&self, hash: &str) -> Result<Option<Recording>, StoreError> {
        validate_hash(hash)?;

        let file = format!("{hash}.json");
        let mut candidates = vec![self.recordings_dir().join(&file)];
        if self.test_dir.is_some() {
            candidates.push(self.shared_dir().join(&file));
        }

        for path in candidates {
            if let Some(recording) = read_recording(&path).await? {
                tracing::debug!(hash, path = %path.display(), "recording found");
                return Ok(Some(recording));
            }
        }

        tracing::debug!(hash, "no recording found");
        Ok(None)
    }

    /// Hashes of every recording visible from this scope, sorted
    ///
    /// # Errors
    ///
    /// Returns an error if a recordings directory exists but cannot be read
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut dirs = vec![self.recordings_dir()];
        if self.test_dir.is_some() {
            dirs.push(self.shared_dir());
        }

        let mut hashes = Vec::new();
        for dir in dirs {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(source) => return Err(StoreError::Io { path: dir, source }),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|source| StoreError::Io { path: dir.clone(), source })?
            {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json")
                    && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                    && validate_hash(stem).is_ok()
                {
                    hashes.push(stem.to_owned());
                }
            }
        }

        hashes.sort();
        hashes.dedup();
        Ok(hashes)
    }
}

/// Read one recording file; a missing file is not an error
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or decoded
pub async fn read_recording(path: &Path) -> Result<Option<Recording>, StoreError> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_owned(),
                source,
            });
        }
    };

    serde_json::from_slice(&raw)
        .map(Some)
        .map_err(|source| StoreError::Decode {
            path: path.to_owned(),
            source,
        })
}

fn validate_hash(hash: &str) -> Result<(), StoreError> {
    let valid = !hash.is_empty()
        && hash
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidHash(hash.to_owned()))
    }
}

/// Directory of the test file a test id names
///
/// `tests/inference/test_errors.py::test_404` maps to `tests/inference`.
/// Only plain path components are kept.
fn test_dir_for(test_id: &str) -> Option<PathBuf> {
    let file = test_id.split("::").next().unwrap_or_default();
    let parent = Path::new(file).parent()?;

    let dir: PathBuf = parent
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    (!dir.as_os_str().is_empty()).then_some(dir)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::record::{RequestRecord, ResponseRecord};

    fn recording(content: &str) -> Recording {
        Recording {
            test_id: None,
            request: RequestRecord {
                method: "POST".to_owned(),
                url: "http://localhost:11434/v1/chat/completions".to_owned(),
                endpoint: "/v1/chat/completions".to_owned(),
                body: json!({"model": "llama3.2:3b"}),
                extra: serde_json::Map::new(),
            },
            response: ResponseRecord::body(json!({"content": content})),
            id_normalization_mapping: std::collections::BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn stored_recording_is_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResponseStorage::new(dir.path(), None);

        let path = storage.store_recording("test_hash_123", &recording("test response")).await.unwrap();
        assert_eq!(path, dir.path().join("recordings/test_hash_123.json"));

        let found = storage.find_recording("test_hash_123").await.unwrap().unwrap();
        assert_eq!(found.request.body["model"], "llama3.2:3b");
        assert_eq!(found.response.body.unwrap()["content"], "test response");
    }

    #[tokio::test]
    async fn missing_recording_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResponseStorage::new(dir.path(), None);
        assert!(storage.find_recording("abc123").await.unwrap().is_none());
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rewrite_replaces_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResponseStorage::new(dir.path(), None);

        storage.store_recording("abc", &recording("first")).await.unwrap();
        storage.store_recording("abc", &recording("second")).await.unwrap();

        let found = storage.find_recording("abc").await.unwrap().unwrap();
        assert_eq!(found.response.body.unwrap()["content"], "second");

        let files: Vec<_> = std::fs::read_dir(storage.recordings_dir()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn failed_store_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResponseStorage::new(dir.path(), None);
        std::fs::create_dir_all(storage.recordings_dir().join("blocked.json/occupied")).unwrap();

        let err = storage.store_recording("blocked", &recording("lost")).await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));

        let names: Vec<_> = std::fs::read_dir(storage.recordings_dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, ["blocked.json"]);
    }

    #[tokio::test]
    async fn test_scope_falls_back_to_shared_recordings() {
        let dir = tempfile::tempdir().unwrap();
        let shared = ResponseStorage::new(dir.path(), None);
        let scoped = ResponseStorage::new(dir.path(), Some("tests/inference/test_errors.py::test_404"));

        assert_eq!(scoped.recordings_dir(), dir.path().join("tests/inference/recordings"));

        shared.store_recording("shared", &recording("from shared")).await.unwrap();
        scoped.store_recording("scoped", &recording("from scope")).await.unwrap();

        assert!(scoped.find_recording("shared").await.unwrap().is_some());
        assert!(shared.find_recording("scoped").await.unwrap().is_none());
        assert_eq!(scoped.list().await.unwrap(), ["scoped", "shared"]);
    }

    #[tokio::test]
    async fn malformed_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResponseStorage::new(dir.path(), None);
        std::fs::create_dir_all(storage.recordings_dir()).unwrap();
        std::fs::write(storage.recordings_dir().join("bad.json"), "{not json").unwrap();

        let err = storage.find_recording("bad").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn path_like_hashes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ResponseStorage::new(dir.path(), None);

        for hash in ["", "../escape", "a/b", "x.json"] {
            let err = storage.find_recording(hash).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidHash(_)), "{hash}");
        }
    }

    #[test]
    fn test_dirs_keep_only_plain_components() {
        assert_eq!(test_dir_for("tests/unit/test_x.py::test_a"), Some(PathBuf::from("tests/unit")));
        assert_eq!(test_dir_for("/abs/../tests/test_x.py::t"), Some(PathBuf::from("abs/tests")));
        assert_eq!(test_dir_for("test_x.py::t"), None);
    }
}
