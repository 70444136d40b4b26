//! Named Snapshots ("Save As")
//!
//! Copies of the risk assessment kept in an index under
//! [`keys::SAVED_ASSESSMENTS`]. Saving under an existing name replaces that
//! snapshot in place.

use crate::assessment::RiskAssessment;
use crate::{IsmsError, IsmsResult};
use chrono::{DateTime, Utc};
use isms_common::{keys, IsmsStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Saved copy of a risk assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAssessment {
    pub id: String,
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub data: RiskAssessment,
}

impl SavedAssessment {
    fn matches(&self, id_or_name: &str) -> bool {
        self.id == id_or_name || self.name == id_or_name
    }
}

/// Snapshot index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshots {
    pub entries: Vec<SavedAssessment>,
}

impl Snapshots {
    pub fn load(store: &IsmsStore) -> Self {
        store.load_or_default(keys::SAVED_ASSESSMENTS)
    }

    fn persist(&self, store: &IsmsStore) -> IsmsResult<()> {
        store.write(keys::SAVED_ASSESSMENTS, self)?;
        Ok(())
    }

    /// Store `assessment` under `name`, replacing a snapshot of the same name
    pub fn save_as(store: &IsmsStore, name: &str, assessment: &RiskAssessment) -> IsmsResult<SavedAssessment> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IsmsError::InvalidInput("snapshot name is empty".into()));
        }

        let mut index = Self::load(store);
        let saved = SavedAssessment {
            id: index
                .entries
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.id.clone())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: name.to_string(),
            saved_at: Utc::now(),
            data: assessment.clone(),
        };

        match index.entries.iter_mut().find(|s| s.name == name) {
            Some(existing) => {
                tracing::info!("Replacing snapshot '{}'", name);
                *existing = saved.clone();
            }
            None => {
                tracing::info!("Saving snapshot '{}'", name);
                index.entries.push(saved.clone());
            }
        }
        index.persist(store)?;
        Ok(saved)
    }

    /// Find by id or name
    pub fn get(&self, id_or_name: &str) -> Option<&SavedAssessment> {
        self.entries.iter().find(|s| s.matches(id_or_name))
    }

    /// Restore a snapshot as the current risk assessment
    pub fn restore(store: &IsmsStore, id_or_name: &str) -> IsmsResult<RiskAssessment> {
        let index = Self::load(store);
        let snapshot = index
            .get(id_or_name)
            .ok_or_else(|| IsmsError::not_found("snapshot", id_or_name))?;
        snapshot.data.save(store)?;
        tracing::info!("Restored snapshot '{}'", snapshot.name);
        Ok(snapshot.data.clone())
    }

    /// Delete by id or name
    pub fn delete(store: &IsmsStore, id_or_name: &str) -> IsmsResult<SavedAssessment> {
        let mut index = Self::load(store);
        let idx = index
            .entries
            .iter()
            .position(|s| s.matches(id_or_name))
            .ok_or_else(|| IsmsError::not_found("snapshot", id_or_name))?;
        let removed = index.entries.remove(idx);
        index.persist(store)?;
        Ok(removed)
    }

    /// Newest first
    pub fn list(&self) -> Vec<&SavedAssessment> {
        let mut out: Vec<_> = self.entries.iter().collect();
        out.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        out
    }
}
