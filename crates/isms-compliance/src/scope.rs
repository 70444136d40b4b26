//! ISMS Scope (clause 4)
//!
//! Organization context, interested parties and the boundaries of the
//! management system. [`ScopeWizard`] walks the stages in order and refuses
//! to advance past a stage with missing required fields.

use isms_common::{keys, IsmsStore, StorageResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Organization identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Organization {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub description: String,
}

/// Party with an interest in the ISMS
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterestedParty {
    pub name: String,
    pub requirements: String,
}

/// Interface direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterfaceKind {
    #[default]
    Internal,
    External,
}

impl std::str::FromStr for InterfaceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(Self::Internal),
            "external" => Ok(Self::External),
            _ => Err(format!("unknown interface kind '{}'", s)),
        }
    }
}

/// Interface or dependency crossing the scope boundary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Interface {
    pub name: String,
    pub description: String,
    pub kind: InterfaceKind,
}

/// Item excluded from scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Exclusion {
    pub item: String,
    pub justification: String,
}

/// What the scope statement covers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScopeDocument {
    pub processes: Vec<String>,
    pub departments: Vec<String>,
    pub locations: Vec<String>,
}

/// Scope data stored under [`keys::SCOPE`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScopeData {
    pub organization: Organization,
    pub internal_issues: Vec<String>,
    pub external_issues: Vec<String>,
    pub interested_parties: Vec<InterestedParty>,
    pub interfaces: Vec<Interface>,
    pub exclusions: Vec<Exclusion>,
    pub scope_document: ScopeDocument,
}

impl ScopeData {
    pub fn load(store: &IsmsStore) -> Self {
        store.load_or_default(keys::SCOPE)
    }

    pub fn save(&self, store: &IsmsStore) -> StorageResult<()> {
        store.write(keys::SCOPE, self)
    }

    /// Plain-text scope statement
    pub fn statement(&self) -> String {
        let org = if self.organization.name.trim().is_empty() {
            "The organization"
        } else {
            self.organization.name.trim()
        };
        let mut out = format!("The ISMS of {} covers", org);
        if self.scope_document.processes.is_empty() {
            out.push_str(" no processes yet");
        } else {
            out.push_str(&format!(" the processes {}", self.scope_document.processes.join(", ")));
        }
        if !self.scope_document.departments.is_empty() {
            out.push_str(&format!(", performed by {}", self.scope_document.departments.join(", ")));
        }
        if !self.scope_document.locations.is_empty() {
            out.push_str(&format!(", at {}", self.scope_document.locations.join(", ")));
        }
        out.push('.');
        if !self.exclusions.is_empty() {
            let items: Vec<&str> = self.exclusions.iter().map(|e| e.item.as_str()).collect();
            out.push_str(&format!(" Excluded: {}.", items.join(", ")));
        }
        out
    }
}

/// Scope wizard stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeStage {
    #[default]
    Organization,
    Context,
    InterestedParties,
    Boundaries,
    ScopeDocument,
}

impl ScopeStage {
    pub const ALL: [ScopeStage; 5] = [
        ScopeStage::Organization,
        ScopeStage::Context,
        ScopeStage::InterestedParties,
        ScopeStage::Boundaries,
        ScopeStage::ScopeDocument,
    ];

    pub fn next(self) -> Option<Self> {
        let idx = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        let idx = Self::ALL.iter().position(|s| *s == self)?;
        idx.checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Fields missing for this stage
    pub fn missing_fields(self, data: &ScopeData) -> Vec<String> {
        let mut missing = Vec::new();
        match self {
            ScopeStage::Organization => {
                if data.organization.name.trim().is_empty() {
                    missing.push("organization.name".to_string());
                }
            }
            ScopeStage::Context => {
                if data.internal_issues.is_empty() && data.external_issues.is_empty() {
                    missing.push("internalIssues|externalIssues".to_string());
                }
            }
            ScopeStage::InterestedParties => {
                if data.interested_parties.is_empty() {
                    missing.push("interestedParties".to_string());
                }
            }
            ScopeStage::Boundaries => {
                for (i, e) in data.exclusions.iter().enumerate() {
                    if e.justification.trim().is_empty() {
                        missing.push(format!("exclusions[{}].justification", i));
                    }
                }
            }
            ScopeStage::ScopeDocument => {
                if data.scope_document.processes.is_empty() {
                    missing.push("scopeDocument.processes".to_string());
                }
            }
        }
        missing
    }
}

impl std::fmt::Display for ScopeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Organization => write!(f, "Organization"),
            Self::Context => write!(f, "Context"),
            Self::InterestedParties => write!(f, "Interested Parties"),
            Self::Boundaries => write!(f, "Boundaries"),
            Self::ScopeDocument => write!(f, "Scope Document"),
        }
    }
}

/// Stage cannot be completed yet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} stage incomplete: missing {}", .fields.join(", "))]
pub struct ValidationError {
    pub stage: ScopeStage,
    pub fields: Vec<String>,
}

/// Stage-by-stage scope editor
#[derive(Debug, Clone, Default)]
pub struct ScopeWizard {
    stage: ScopeStage,
    data: ScopeData,
}

impl ScopeWizard {
    pub fn new(data: ScopeData) -> Self {
        Self {
            stage: ScopeStage::default(),
            data,
        }
    }

    /// Resume at a given stage
    pub fn at(data: ScopeData, stage: ScopeStage) -> Self {
        Self { stage, data }
    }

    pub fn stage(&self) -> ScopeStage {
        self.stage
    }

    pub fn data(&self) -> &ScopeData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ScopeData {
        &mut self.data
    }

    pub fn into_data(self) -> ScopeData {
        self.data
    }

    /// Check the current stage
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = self.stage.missing_fields(&self.data);
        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                stage: self.stage,
                fields,
            })
        }
    }

    /// Validate the current stage and move to the next one.
    ///
    /// Returns the new stage, or the current one when already at the last stage.
    pub fn advance(&mut self) -> Result<ScopeStage, ValidationError> {
        self.validate()?;
        if let Some(next) = self.stage.next() {
            tracing::debug!("Scope wizard: {} -> {}", self.stage, next);
            self.stage = next;
        }
        Ok(self.stage)
    }

    /// Move back without validation
    pub fn back(&mut self) -> ScopeStage {
        if let Some(prev) = self.stage.previous() {
            self.stage = prev;
        }
        self.stage
    }

    /// Validate every stage, stopping at the first incomplete one
    pub fn finish(&mut self) -> Result<&ScopeData, ValidationError> {
        for stage in ScopeStage::ALL {
            self.stage = stage;
            self.validate()?;
        }
        Ok(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ScopeData {
        ScopeData {
            organization: Organization {
                name: "Acme".into(),
                industry: "Retail".into(),
                ..Organization::default()
            },
            internal_issues: vec!["Legacy systems".into()],
            external_issues: vec!["GDPR".into()],
            interested_parties: vec![InterestedParty {
                name: "Customers".into(),
                requirements: "Data privacy".into(),
            }],
            interfaces: vec![Interface {
                name: "Payment provider".into(),
                description: String::new(),
                kind: InterfaceKind::External,
            }],
            exclusions: vec![],
            scope_document: ScopeDocument {
                processes: vec!["Order handling".into()],
                departments: vec!["IT".into()],
                locations: vec![],
            },
        }
    }

    #[test]
    fn test_advance_blocks_on_missing_name() {
        let mut wizard = ScopeWizard::default();
        let err = wizard.advance().unwrap_err();
        assert_eq!(err.stage, ScopeStage::Organization);
        assert_eq!(err.fields, vec!["organization.name"]);
        assert_eq!(wizard.stage(), ScopeStage::Organization);

        wizard.data_mut().organization.name = "Acme".into();
        assert_eq!(wizard.advance().unwrap(), ScopeStage::Context);
    }

    #[test]
    fn test_exclusions_need_justification() {
        let mut data = complete();
        data.exclusions.push(Exclusion {
            item: "Branch office".into(),
            justification: " ".into(),
        });
        let mut wizard = ScopeWizard::at(data, ScopeStage::Boundaries);
        let err = wizard.advance().unwrap_err();
        assert_eq!(err.fields, vec!["exclusions[0].justification"]);
        assert!(err.to_string().contains("Boundaries"));
    }

    #[test]
    fn test_walks_all_stages() {
        let mut wizard = ScopeWizard::new(complete());
        for _ in 0..10 {
            wizard.advance().unwrap();
        }
        assert_eq!(wizard.stage(), ScopeStage::ScopeDocument);
        assert_eq!(wizard.back(), ScopeStage::Boundaries);
        assert!(wizard.finish().is_ok());
    }

    #[test]
    fn test_finish_stops_at_first_gap() {
        let mut data = complete();
        data.interested_parties.clear();
        let mut wizard = ScopeWizard::new(data);
        let err = wizard.finish().unwrap_err();
        assert_eq!(err.stage, ScopeStage::InterestedParties);
        assert_eq!(wizard.stage(), ScopeStage::InterestedParties);
    }

    #[test]
    fn test_statement() {
        let text = complete().statement();
        assert_eq!(text, "The ISMS of Acme covers the processes Order handling, performed by IT.");
    }

    #[test]
    fn test_parses_partial_stored_json() {
        let data: ScopeData = serde_json::from_str(r#"{"organization": {"name": "Acme"}}"#).unwrap();
        assert_eq!(data.organization.name, "Acme");
        assert!(data.scope_document.processes.is_empty());
    }
}
