//! JSON Import
//!
//! An import parses and validates the whole document before anything is
//! replaced; on error the caller's model and the store are left as they were.

use crate::assessment::RiskAssessment;
use crate::controls;
use crate::scope::ScopeData;
use crate::soa::StatementOfApplicability;
use crate::treatment::TreatmentPlan;
use isms_common::{IsmsStore, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Import errors
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read import file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid {kind} file: {reason}")]
    Format { kind: &'static str, reason: String },
    #[error("{kind} file has broken references: {}", .problems.join("; "))]
    DanglingReferences { kind: &'static str, problems: Vec<String> },
    #[error("{kind} file references unknown controls: {}", .ids.join(", "))]
    UnknownControls { kind: &'static str, ids: Vec<String> },
    #[error("failed to store import: {0}")]
    Storage(#[from] StorageError),
}

/// Model that can be replaced wholesale from a JSON document
pub trait Importable: Serialize + DeserializeOwned {
    /// Name used in messages
    const KIND: &'static str;
    /// Storage key the model lives under
    const KEY: &'static str;

    /// Consistency checks beyond parsing
    fn validate(&self) -> Result<(), ImportError> {
        Ok(())
    }
}

impl Importable for RiskAssessment {
    const KIND: &'static str = "risk assessment";
    const KEY: &'static str = isms_common::keys::RISK_ASSESSMENT;

    fn validate(&self) -> Result<(), ImportError> {
        let problems = self.dangling_references();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ImportError::DanglingReferences {
                kind: Self::KIND,
                problems,
            })
        }
    }
}

impl Importable for StatementOfApplicability {
    const KIND: &'static str = "statement of applicability";
    const KEY: &'static str = isms_common::keys::SOA;

    fn validate(&self) -> Result<(), ImportError> {
        unknown_controls(Self::KIND, self.controls.iter().map(|c| c.control_id.as_str()))
    }
}

impl Importable for TreatmentPlan {
    const KIND: &'static str = "risk treatment";
    const KEY: &'static str = isms_common::keys::RISK_TREATMENTS;

    fn validate(&self) -> Result<(), ImportError> {
        unknown_controls(
            Self::KIND,
            self.treatments.iter().flat_map(|t| t.selected_controls.iter().map(String::as_str)),
        )
    }
}

impl Importable for ScopeData {
    const KIND: &'static str = "scope";
    const KEY: &'static str = isms_common::keys::SCOPE;
}

fn unknown_controls<'a>(kind: &'static str, ids: impl Iterator<Item = &'a str>) -> Result<(), ImportError> {
    let mut unknown: Vec<String> = ids.filter(|id| !controls::is_known(id)).map(str::to_string).collect();
    unknown.sort();
    unknown.dedup();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ImportError::UnknownControls { kind, ids: unknown })
    }
}

/// Parse and validate a document
pub fn parse<T: Importable>(json: &str) -> Result<T, ImportError> {
    let model: T = serde_json::from_str(json).map_err(|e| ImportError::Format {
        kind: T::KIND,
        reason: e.to_string(),
    })?;
    model.validate()?;
    Ok(model)
}

/// Replace `current` with the parsed document; `current` is untouched on error
pub fn replace_from_json<T: Importable>(current: &mut T, json: &str) -> Result<(), ImportError> {
    *current = parse(json)?;
    Ok(())
}

/// Import a file and store it under the model's key
pub fn import_file<T: Importable>(store: &IsmsStore, path: &Path) -> Result<T, ImportError> {
    let json = std::fs::read_to_string(path)?;
    let model: T = parse(&json)?;
    store.write(T::KEY, &model)?;
    tracing::info!("Imported {} from {}", T::KIND, path.display());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Asset, AssetType};
    use isms_common::keys;

    #[test]
    fn test_bad_json_leaves_model_untouched() {
        let mut ra = RiskAssessment::default();
        ra.add_asset(Asset::new("Servers", AssetType::Physical));
        let before = ra.clone();

        let err = replace_from_json(&mut ra, "{\"assets\": [").unwrap_err();
        assert!(matches!(err, ImportError::Format { .. }));
        assert_eq!(ra, before);
    }

    #[test]
    fn test_rejects_dangling_risk() {
        let json = r#"{
            "assets": [],
            "risks": [{
                "id": "risk-1", "assetId": "asset-x", "threatId": "threat-y",
                "vulnerabilityId": "vuln-z", "likelihood": "high", "impact": "high"
            }]
        }"#;
        let mut ra = RiskAssessment::default();
        let err = replace_from_json(&mut ra, json).unwrap_err();
        match err {
            ImportError::DanglingReferences { problems, .. } => assert_eq!(problems.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
        assert!(ra.risks.is_empty());
    }

    #[test]
    fn test_rejects_unknown_controls() {
        let err = parse::<TreatmentPlan>(r#"[{"riskId": "r", "selectedControls": ["A.5.1", "A.42"]}]"#).unwrap_err();
        assert_eq!(err.to_string(), "risk treatment file references unknown controls: A.42");
    }

    #[test]
    fn test_import_file_writes_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scope.json");
        std::fs::write(&path, r#"{"organization": {"name": "Acme"}}"#).unwrap();

        let store = IsmsStore::in_memory();
        let scope: ScopeData = import_file(&store, &path).unwrap();
        assert_eq!(scope.organization.name, "Acme");
        assert_eq!(ScopeData::load(&store), scope);

        std::fs::write(&path, "not json").unwrap();
        assert!(import_file::<ScopeData>(&store, &path).is_err());
        assert_eq!(ScopeData::load(&store).organization.name, "Acme");
        assert!(store.raw(keys::SCOPE).unwrap().is_some());
    }
}
