use async_trait::async_trait;
use chrono::{Datelike, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::{StoreError, WorkflowStore};
use crate::request::{format_reference, GatePass};

/// In-memory workflow store for tests and demos. Reads never block writers
/// beyond the brief map access.
#[derive(Default)]
pub struct MemoryStore {
    passes: RwLock<HashMap<String, GatePass>>,
    sequence: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a pass directly, bypassing creation validation. Test helper for
    /// setting up mid-pipeline or legacy states.
    pub async fn seed(&self, pass: GatePass) {
        self.passes
            .write()
            .await
            .insert(pass.reference_number.clone(), pass);
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
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
        Ok(())
    }

    async fn put(&self, pass: GatePass) -> Result<(), StoreError> {
        let mut passes = self.passes.write().await;
        if !passes.contains_key(&pass.reference_number) {
            return Err(StoreError::NotFound {
                reference: pass.reference_number.clone(),
            });
        }
        passes.insert(pass.reference_number.clone(), pass);
        Ok(())
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
