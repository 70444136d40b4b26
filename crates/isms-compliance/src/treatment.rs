//! Risk Treatment
//!
//! Links risks to the Annex A controls selected to treat them. Stored as a
//! plain array under [`keys::RISK_TREATMENTS`]. Stored data may hold several
//! records for one risk, or records for risks deleted since; consumers
//! deduplicate and filter against the current assessment.

use crate::assessment::RiskAssessment;
use crate::controls;
use crate::{IsmsError, IsmsResult};
use isms_common::{keys, IsmsStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Treatment strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TreatmentStrategy {
    Accept,
    Avoid,
    #[default]
    Mitigate,
    Transfer,
}

impl std::str::FromStr for TreatmentStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(Self::Accept),
            "avoid" => Ok(Self::Avoid),
            "mitigate" => Ok(Self::Mitigate),
            "transfer" => Ok(Self::Transfer),
            _ => Err(format!("unknown strategy '{}'", s)),
        }
    }
}

impl std::fmt::Display for TreatmentStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "Accept"),
            Self::Avoid => write!(f, "Avoid"),
            Self::Mitigate => write!(f, "Mitigate"),
            Self::Transfer => write!(f, "Transfer"),
        }
    }
}

/// Treatment of one risk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    pub risk_id: String,
    #[serde(default)]
    pub selected_controls: Vec<String>,
    #[serde(default)]
    pub strategy: TreatmentStrategy,
}

/// All treatments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreatmentPlan {
    pub treatments: Vec<Treatment>,
}

impl TreatmentPlan {
    pub fn load(store: &IsmsStore) -> Self {
        store.load_or_default(keys::RISK_TREATMENTS)
    }

    pub fn save(&self, store: &IsmsStore) -> StorageResult<()> {
        store.write(keys::RISK_TREATMENTS, self)
    }

    /// Set treatment for a risk of `assessment`, replacing earlier records
    /// for the same risk
    pub fn set(&mut self, assessment: &RiskAssessment, treatment: Treatment) -> IsmsResult<()> {
        if assessment.risk(&treatment.risk_id).is_none() {
            return Err(IsmsError::not_found("risk", &treatment.risk_id));
        }
        if let Some(unknown) = treatment.selected_controls.iter().find(|c| !controls::is_known(c)) {
            return Err(IsmsError::InvalidInput(format!("unknown Annex A control '{}'", unknown)));
        }

        self.treatments.retain(|t| t.risk_id != treatment.risk_id);
        tracing::info!(
            "Treatment for {}: {} with {} controls",
            treatment.risk_id,
            treatment.strategy,
            treatment.selected_controls.len()
        );
        self.treatments.push(treatment);
        Ok(())
    }

    /// Treatment for a risk (first record wins)
    pub fn for_risk(&self, risk_id: &str) -> Option<&Treatment> {
        self.treatments.iter().find(|t| t.risk_id == risk_id)
    }

    /// Remove all records for a risk, returning how many were removed
    pub fn remove(&mut self, risk_id: &str) -> usize {
        let before = self.treatments.len();
        self.treatments.retain(|t| t.risk_id != risk_id);
        before - self.treatments.len()
    }

    /// Drop records whose risk no longer exists
    pub fn prune(&mut self, assessment: &RiskAssessment) -> usize {
        let before = self.treatments.len();
        self.treatments.retain(|t| assessment.risk(&t.risk_id).is_some());
        before - self.treatments.len()
    }

    /// Every control selected by any treatment
    pub fn referenced_controls(&self) -> BTreeSet<&str> {
        self.treatments
            .iter()
            .flat_map(|t| t.selected_controls.iter().map(String::as_str))
            .collect()
    }

    /// Distinct risk ids with at least one treatment record
    pub fn treated_risk_ids(&self) -> HashSet<&str> {
        self.treatments.iter().map(|t| t.risk_id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Asset, AssetType, Threat, Vulnerability};
    use crate::risk::RiskLevel;

    fn assessment_with_risk() -> (RiskAssessment, String) {
        let mut ra = RiskAssessment::default();
        let a = ra.add_asset(Asset::new("Email System", AssetType::Software)).id.clone();
        let t = ra.add_threat(Threat::new("Phishing", "", "")).id.clone();
        let v = ra.add_vulnerability(Vulnerability::new(&a, "No awareness", "")).unwrap().id.clone();
        let r = ra.add_risk(&a, &t, &v, RiskLevel::High, RiskLevel::Medium).unwrap().id.clone();
        (ra, r)
    }

    #[test]
    fn test_set_replaces_existing_record() {
        let (ra, risk) = assessment_with_risk();
        let mut plan = TreatmentPlan::default();

        plan.set(&ra, Treatment {
            risk_id: risk.clone(),
            selected_controls: vec!["A.6.3".into()],
            strategy: TreatmentStrategy::Mitigate,
        })
        .unwrap();
        plan.set(&ra, Treatment {
            risk_id: risk.clone(),
            selected_controls: vec!["A.6.3".into(), "A.8.7".into()],
            strategy: TreatmentStrategy::Mitigate,
        })
        .unwrap();

        assert_eq!(plan.treatments.len(), 1);
        assert_eq!(plan.for_risk(&risk).unwrap().selected_controls.len(), 2);
    }

    #[test]
    fn test_set_validates_risk_and_controls() {
        let (ra, risk) = assessment_with_risk();
        let mut plan = TreatmentPlan::default();

        let unknown_risk = Treatment {
            risk_id: "risk-gone".into(),
            selected_controls: vec![],
            strategy: TreatmentStrategy::Accept,
        };
        assert!(matches!(plan.set(&ra, unknown_risk), Err(IsmsError::NotFound { .. })));

        let bad_control = Treatment {
            risk_id: risk,
            selected_controls: vec!["A.99.1".into()],
            strategy: TreatmentStrategy::Mitigate,
        };
        assert!(matches!(plan.set(&ra, bad_control), Err(IsmsError::InvalidInput(_))));
        assert!(plan.treatments.is_empty());
    }

    #[test]
    fn test_stored_as_plain_array() {
        let json = r#"[
            {"riskId": "r1", "selectedControls": ["A.5.15", "A.8.5"], "strategy": "mitigate"},
            {"riskId": "r1", "selectedControls": ["A.8.5"]},
            {"riskId": "r2", "selectedControls": [], "strategy": "accept"}
        ]"#;
        let plan: TreatmentPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.treatments.len(), 3);
        assert_eq!(plan.treated_risk_ids().len(), 2);
        assert_eq!(plan.referenced_controls().into_iter().collect::<Vec<_>>(), vec!["A.5.15", "A.8.5"]);
        assert!(serde_json::to_string(&plan).unwrap().starts_with('['));
    }

    #[test]
    fn test_prune_drops_stale_records() {
        let (ra, risk) = assessment_with_risk();
        let mut plan = TreatmentPlan {
            treatments: vec![
                Treatment { risk_id: risk, selected_controls: vec![], strategy: TreatmentStrategy::Avoid },
                Treatment { risk_id: "risk-deleted".into(), selected_controls: vec![], strategy: TreatmentStrategy::Avoid },
            ],
        };
        assert_eq!(plan.prune(&ra), 1);
        assert_eq!(plan.treatments.len(), 1);
    }
}
