use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::document::KnowledgeRecord;
use super::error::KnowledgeError;

/// Supplies raw knowledge records at startup.
///
/// Only an unreachable corpus location is an error; individual bad entries are skipped
/// by the implementation (unparseable files) or by the index (missing fields).
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    async fn load(&self) -> Result<Vec<KnowledgeRecord>, KnowledgeError>;
}

/// Reads every `*.json` file in a directory.
///
/// A file may hold one record object or an array of them. Files are visited in name
/// order so corpus order (and therefore search tie-breaking) is stable across runs.
#[derive(Debug, Clone)]
pub struct DirectoryKnowledgeSource {
    dir: PathBuf,
}

impl DirectoryKnowledgeSource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn json_files(&self) -> Result<Vec<PathBuf>, KnowledgeError> {
        let unavailable = |e: std::io::Error| KnowledgeError::SourceUnavailable {
            path: self.dir.clone(),
            reason: e.to_string(),
        };

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(unavailable)?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl KnowledgeSource for DirectoryKnowledgeSource {
    async fn load(&self) -> Result<Vec<KnowledgeRecord>, KnowledgeError> {
        let files = self.json_files().await?;
        let mut records = Vec::new();

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(file = %name, error = %e, "Failed to read knowledge file, skipping");
                    continue;
                }
            };

            let value: Value = match serde_json::from_str(&content) {
                Ok(value) => value,
                Err(e) => {
                    warn!(file = %name, error = %e, "Invalid JSON in knowledge file, skipping");
                    continue;
                }
            };

            match value {
                Value::Array(items) => {
                    for (i, item) in items.into_iter().enumerate() {
                        let origin = format!("{}#{}", name, i);
                        match KnowledgeRecord::from_value(origin.clone(), item) {
                            Some(record) => records.push(record),
                            None => warn!(origin = %origin, "Knowledge entry is not an object, skipping"),
                        }
                    }
                }
                other => match KnowledgeRecord::from_value(name.clone(), other) {
                    Some(record) => records.push(record),
                    None => warn!(file = %name, "Knowledge file is not an object, skipping"),
                },
            }
            debug!(file = %name, "Read knowledge file");
        }

        info!(
            dir = %self.dir.display(),
            records = records.len(),
            "Loaded raw knowledge records"
        );
        Ok(records)
    }
}

/// Fixed in-memory record list (fixtures, embedded corpora).
#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeSource {
    records: Vec<KnowledgeRecord>,
}

impl InMemoryKnowledgeSource {
    pub fn new(records: Vec<KnowledgeRecord>) -> Self {
        Self { records }
    }

    /// Builds records from JSON values; non-objects are dropped.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let records = values
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| KnowledgeRecord::from_value(format!("record-{}", i), v))
            .collect();
        Self { records }
    }
}

#[async_trait]
impl KnowledgeSource for InMemoryKnowledgeSource {
    async fn load(&self) -> Result<Vec<KnowledgeRecord>, KnowledgeError> {
        Ok(self.records.clone())
    }
}
