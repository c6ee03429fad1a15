//! File-backed workout storage.
//!
//! Layout, one YAML document per record:
//!
//! ```text
//! {root}/users/{user_id}/routines/{id}.yaml
//! {root}/users/{user_id}/programs/{id}.yaml
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::fs;

use super::error::{StorageError, StorageResult};
use super::workout::{Routine, WorkoutProgram, WorkoutStore};

#[derive(Debug, Clone)]
pub struct FileWorkoutStore {
    root: PathBuf,
}

impl FileWorkoutStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn user_dir(&self, user_id: &str) -> StorageResult<PathBuf> {
        if !is_safe_segment(user_id) {
            return Err(StorageError::invalid_key("user id", user_id));
        }
        Ok(self.root.join("users").join(user_id))
    }
}

/// Reject anything that could escape the user directory.
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}

/// Read every `*.yaml` file in `dir`. A missing directory is an empty list.
///
/// Unreadable or malformed files are logged and skipped.
async fn read_yaml_dir<T: DeserializeOwned>(dir: &Path) -> StorageResult<Vec<T>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::file_io(dir, e)),
    };

    let mut records = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StorageError::file_io(dir, e))?
    {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "yaml") {
            continue;
        }
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| StorageError::file_io(&path, e))?;
        if file_type.is_dir() {
            continue;
        }

        let content = match fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read workout file");
                continue;
            }
        };

        match serde_saphyr::from_str::<T>(&content) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse workout file");
            }
        }
    }

    Ok(records)
}

#[async_trait]
impl WorkoutStore for FileWorkoutStore {
    async fn list_routines(&self, user_id: &str) -> StorageResult<Vec<Routine>> {
        let dir = self.user_dir(user_id)?.join("routines");
        let mut routines: Vec<Routine> = read_yaml_dir(&dir).await?;
        routines.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(routines)
    }

    async fn list_programs(&self, user_id: &str) -> StorageResult<Vec<WorkoutProgram>> {
        let dir = self.user_dir(user_id)?.join("programs");
        let mut programs: Vec<WorkoutProgram> = read_yaml_dir(&dir).await?;
        programs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(programs)
    }
}
