use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{StoreError, WorkflowStore};
use crate::request::{format_reference, parse_reference, GatePass};

const STATE_VERSION: &str = "1.0";

/// On-disk envelope around the pass map. Versioned so a format change is a
/// detectable error rather than silent corruption.
#[derive(Debug, Serialize, Deserialize)]
struct StateEnvelope {
    version: String,
    saved_at: DateTime<Utc>,
    passes: Vec<GatePass>,
}

/// JSON-file-backed workflow store. The whole state is held in memory and
/// rewritten on every mutation via a temp file and rename, so a crashed
/// write never leaves a torn state file behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    passes: RwLock<HashMap<String, GatePass>>,
    sequence: AtomicU64,
}

impl FileStore {
    /// Open the store at `path`, loading existing state when present. The
    /// reference allocation counter is recovered from the highest persisted
    /// sequence number.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut passes = HashMap::new();
        let mut highest_sequence = 0;

        match fs::read(&path).await {
            Ok(bytes) => {
                let envelope: StateEnvelope = serde_json::from_slice(&bytes)?;
                if envelope.version != STATE_VERSION {
                    return Err(StoreError::VersionMismatch {
                        expected: STATE_VERSION.to_string(),
                        found: envelope.version,
                    });
                }
                for pass in envelope.passes {
                    match parse_reference(&pass.reference_number) {
                        Some((_, sequence)) => highest_sequence = highest_sequence.max(sequence),
                        None => warn!(
                            reference = %pass.reference_number,
                            "stored reference does not match the allocation format; \
                             counter recovery skips it"
                        ),
                    }
                    passes.insert(pass.reference_number.clone(), pass);
                }
                info!(
                    path = %path.display(),
                    passes = passes.len(),
                    next_sequence = highest_sequence + 1,
                    "Loaded gate pass state"
                );
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No existing state file, starting empty");
            }
            Err(err) => return Err(err.into()),
        }

        Ok(Self {
            path,
            passes: RwLock::new(passes),
            sequence: AtomicU64::new(highest_sequence),
        })
    }

    /// Persist the full map. Callers hold the write lock, so the snapshot is
    /// consistent with the mutation that triggered the save.
    async fn save(&self, passes: &HashMap<String, GatePass>) -> Result<(), StoreError> {
        let envelope = StateEnvelope {
            version: STATE_VERSION.to_string(),
            saved_at: Utc::now(),
            passes: passes.values().cloned().collect(),
        };
        let json = serde_json::to_vec_pretty(&envelope)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &json).await?;
        fs::rename(&temp_path, &self.path).await?;
        debug!(path = %self.path.display(), passes = envelope.passes.len(), "State persisted");
        Ok(())
    }
}

#[async_trait]
impl WorkflowStore for FileStore {
    async fn get(&self, reference: &str) -> Result<GatePass, StoreError> {
        self.passes
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                reference: reference.to_string(),
            })
    }

    async fn insert(&self, pass: GatePass) -> Result<(), StoreError> {
        let mut passes = self.passes.write().await;
        if passes.contains_key(&pass.reference_number) {
            return Err(StoreError::DuplicateReference {
                reference: pass.reference_number.clone(),
            });
        }
        passes.insert(pass.reference_number.clone(), pass);
        self.save(&passes).await
    }

    async fn put(&self, pass: GatePass) -> Result<(), StoreError> {
        let mut passes = self.passes.write().await;
        if !passes.contains_key(&pass.reference_number) {
            return Err(StoreError::NotFound {
                reference: pass.reference_number.clone(),
            });
        }
        passes.insert(pass.reference_number.clone(), pass);
        self.save(&passes).await
    }

    async fn list_for_actor(&self, service_no: &str) -> Result<Vec<GatePass>, StoreError> {
        let passes = self.passes.read().await;
        let mut matching: Vec<GatePass> = passes
            .values()
            .filter(|pass| pass.requester_service_no == service_no)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn list_all(&self) -> Result<Vec<GatePass>, StoreError> {
        let passes = self.passes.read().await;
        let mut all: Vec<GatePass> = passes.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn allocate_reference(&self) -> Result<String, StoreError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format_reference(Utc::now().year(), sequence))
    }
}
