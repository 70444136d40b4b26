//! Completion Scoring
//!
//! Every lifecycle step is scored 0-100 from its own stored record. Checklist
//! steps score the truncated share of satisfied checks; risk treatment and
//! SOA score a ratio rounded half-up. Reading never writes back, so scoring
//! the same stored data twice gives the same result.

use crate::assessment::RiskAssessment;
use crate::scope::ScopeData;
use crate::soa::StatementOfApplicability;
use crate::steps::{
    CorrectiveActionsData, ImplementationData, InternalAuditData, ManagementReviewData, MonitoringData,
    ObjectivesData, PolicyData, StepRecord, TrainingData,
};
use crate::treatment::TreatmentPlan;
use isms_common::{keys, IsmsStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Record scored by a list of boolean checks
pub trait Checklist {
    /// One entry per check
    fn checks(&self) -> Vec<bool>;

    /// Truncated percentage of satisfied checks
    fn completion(&self) -> u8 {
        checklist_percent(&self.checks())
    }
}

/// `floor(100 * satisfied / total)`; 0 for an empty list
pub fn checklist_percent(checks: &[bool]) -> u8 {
    if checks.is_empty() {
        return 0;
    }
    let satisfied = checks.iter().filter(|c| **c).count();
    (satisfied * 100 / checks.len()) as u8
}

/// `min(100, round(100 * n / d))` with halves rounded up; 0 when `d == 0`
pub fn ratio_percent(n: usize, d: usize) -> u8 {
    if d == 0 {
        return 0;
    }
    let pct = (200 * n + d) / (2 * d);
    pct.min(100) as u8
}

impl Checklist for ScopeData {
    fn checks(&self) -> Vec<bool> {
        let doc = &self.scope_document;
        let mut checks = vec![
            !self.organization.name.trim().is_empty() && !self.organization.industry.trim().is_empty(),
            !self.internal_issues.is_empty(),
            !self.external_issues.is_empty(),
            !self.interested_parties.is_empty(),
            !self.interfaces.is_empty(),
            !doc.processes.is_empty(),
            !doc.departments.is_empty() || !doc.locations.is_empty(),
        ];
        // Bonus point for a fully completed scope
        let all = checks.iter().all(|c| *c);
        checks.push(all);
        checks
    }
}

impl Checklist for RiskAssessment {
    fn checks(&self) -> Vec<bool> {
        vec![
            !self.assets.is_empty(),
            !self.threats.is_empty(),
            !self.vulnerabilities.is_empty(),
            !self.risks.is_empty(),
            !self.risks.is_empty() && self.risks.iter().all(|r| !r.owner.trim().is_empty()),
        ]
    }
}

/// ISMS lifecycle step, in dashboard order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    Scope,
    Policy,
    RiskAssessment,
    RiskTreatment,
    Soa,
    Objectives,
    Implementation,
    Monitoring,
    Training,
    InternalAudit,
    ManagementReview,
    CorrectiveActions,
}

impl StepId {
    pub const ALL: [StepId; 12] = [
        StepId::Scope,
        StepId::Policy,
        StepId::RiskAssessment,
        StepId::RiskTreatment,
        StepId::Soa,
        StepId::Objectives,
        StepId::Implementation,
        StepId::Monitoring,
        StepId::Training,
        StepId::InternalAudit,
        StepId::ManagementReview,
        StepId::CorrectiveActions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scope => "scope",
            Self::Policy => "policy",
            Self::RiskAssessment => "risk-assessment",
            Self::RiskTreatment => "risk-treatment",
            Self::Soa => "soa",
            Self::Objectives => "objectives",
            Self::Implementation => "implementation",
            Self::Monitoring => "monitoring",
            Self::Training => "training",
            Self::InternalAudit => "internal-audit",
            Self::ManagementReview => "management-review",
            Self::CorrectiveActions => "corrective-actions",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Scope => "ISMS Scope",
            Self::Policy => "Information Security Policy",
            Self::RiskAssessment => "Risk Assessment",
            Self::RiskTreatment => "Risk Treatment",
            Self::Soa => "Statement of Applicability",
            Self::Objectives => "Security Objectives",
            Self::Implementation => "Implementation",
            Self::Monitoring => "Monitoring & Measurement",
            Self::Training => "Training & Awareness",
            Self::InternalAudit => "Internal Audit",
            Self::ManagementReview => "Management Review",
            Self::CorrectiveActions => "Corrective Actions",
        }
    }

    /// Primary storage key
    pub fn key(self) -> &'static str {
        match self {
            Self::Scope => keys::SCOPE,
            Self::Policy => keys::POLICY,
            Self::RiskAssessment => keys::RISK_ASSESSMENT,
            Self::RiskTreatment => keys::RISK_TREATMENTS,
            Self::Soa => keys::SOA,
            Self::Objectives => keys::OBJECTIVES,
            Self::Implementation => keys::IMPLEMENTATION,
            Self::Monitoring => keys::MONITORING,
            Self::Training => keys::TRAINING,
            Self::InternalAudit => keys::INTERNAL_AUDIT,
            Self::ManagementReview => keys::MANAGEMENT_REVIEW,
            Self::CorrectiveActions => keys::CORRECTIVE_ACTIONS,
        }
    }

    /// Every key this step reads
    pub fn reads(self) -> &'static [&'static str] {
        match self {
            Self::RiskTreatment => &[keys::RISK_TREATMENTS, keys::RISK_ASSESSMENT],
            Self::Soa => &[keys::SOA, keys::SOA_LEGACY],
            Self::Scope => &[keys::SCOPE],
            Self::Policy => &[keys::POLICY],
            Self::RiskAssessment => &[keys::RISK_ASSESSMENT],
            Self::Objectives => &[keys::OBJECTIVES],
            Self::Implementation => &[keys::IMPLEMENTATION],
            Self::Monitoring => &[keys::MONITORING],
            Self::Training => &[keys::TRAINING],
            Self::InternalAudit => &[keys::INTERNAL_AUDIT],
            Self::ManagementReview => &[keys::MANAGEMENT_REVIEW],
            Self::CorrectiveActions => &[keys::CORRECTIVE_ACTIONS],
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| format!("unknown step '{}'", s))
    }
}

/// Step status derived from its completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl StepStatus {
    pub fn from_completion(completion: u8) -> Self {
        match completion {
            0 => Self::NotStarted,
            100..=u8::MAX => Self::Completed,
            _ => Self::InProgress,
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not-started"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Progress of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepProgress {
    pub id: StepId,
    pub title: String,
    pub completion: u8,
    pub status: StepStatus,
}

impl StepProgress {
    pub fn new(id: StepId, completion: u8) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            completion,
            status: StepStatus::from_completion(completion),
        }
    }
}

fn checklist_step<T: Checklist + DeserializeOwned>(store: &IsmsStore, key: &str) -> u8 {
    store.load::<T>(key).map(|r| r.completion()).unwrap_or(0)
}

fn record_step<T: StepRecord>(store: &IsmsStore) -> u8 {
    checklist_step::<T>(store, T::KEY)
}

/// Share of existing risks with at least one treatment record
pub fn treatment_completion(assessment: &RiskAssessment, plan: &TreatmentPlan) -> u8 {
    let existing: HashSet<&str> = assessment.risks.iter().map(|r| r.id.as_str()).collect();
    let treated = plan.treated_risk_ids();
    ratio_percent(existing.intersection(&treated).count(), existing.len())
}

/// Completion of one step from stored data
pub fn step_completion(store: &IsmsStore, step: StepId) -> u8 {
    match step {
        StepId::Scope => checklist_step::<ScopeData>(store, keys::SCOPE),
        StepId::Policy => record_step::<PolicyData>(store),
        StepId::RiskAssessment => checklist_step::<RiskAssessment>(store, keys::RISK_ASSESSMENT),
        StepId::RiskTreatment => {
            let plan: Option<TreatmentPlan> = store.load(keys::RISK_TREATMENTS);
            let assessment: Option<RiskAssessment> = store.load(keys::RISK_ASSESSMENT);
            match (plan, assessment) {
                (Some(plan), Some(assessment)) => treatment_completion(&assessment, &plan),
                _ => 0,
            }
        }
        StepId::Soa => StatementOfApplicability::load(store).map(|s| s.completion()).unwrap_or(0),
        StepId::Objectives => record_step::<ObjectivesData>(store),
        StepId::Implementation => record_step::<ImplementationData>(store),
        StepId::Monitoring => record_step::<MonitoringData>(store),
        StepId::Training => record_step::<TrainingData>(store),
        StepId::InternalAudit => record_step::<InternalAuditData>(store),
        StepId::ManagementReview => record_step::<ManagementReviewData>(store),
        StepId::CorrectiveActions => record_step::<CorrectiveActionsData>(store),
    }
}

/// Progress across all steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub steps: Vec<StepProgress>,
    pub overall: u8,
}

impl ProgressReport {
    /// Score every step from the store
    pub fn compute(store: &IsmsStore) -> Self {
        let steps = StepId::ALL
            .into_iter()
            .map(|id| StepProgress::new(id, step_completion(store, id)))
            .collect::<Vec<_>>();
        Self::from_steps(steps)
    }

    /// Aggregate already-scored steps
    pub fn from_steps(steps: Vec<StepProgress>) -> Self {
        let overall = overall_completion(steps.iter().map(|s| s.completion));
        Self { steps, overall }
    }

    pub fn overall_status(&self) -> StepStatus {
        StepStatus::from_completion(self.overall)
    }

    pub fn step(&self, id: StepId) -> Option<&StepProgress> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn completed_count(&self) -> usize {
        self.steps.iter().filter(|s| s.status == StepStatus::Completed).count()
    }
}

/// Rounded mean of step completions
pub fn overall_completion(completions: impl IntoIterator<Item = u8>) -> u8 {
    let (sum, count) = completions
        .into_iter()
        .fold((0usize, 0usize), |(sum, count), c| (sum + c as usize, count + 1));
    if count == 0 {
        return 0;
    }
    ratio_percent(sum, count * 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Asset, AssetType, Threat, Vulnerability};
    use crate::risk::RiskLevel;
    use crate::scope::{Organization, ScopeDocument};
    use crate::soa::{ApplicabilityStatus, ControlApplicability};
    use crate::treatment::{Treatment, TreatmentStrategy};

    fn org_only() -> ScopeData {
        ScopeData {
            organization: Organization {
                name: "Acme".into(),
                industry: "Retail".into(),
                ..Organization::default()
            },
            ..ScopeData::default()
        }
    }

    fn full_scope() -> ScopeData {
        let mut scope = org_only();
        scope.internal_issues = vec!["Legacy systems".into()];
        scope.external_issues = vec!["Regulation".into()];
        scope.interested_parties = vec![Default::default()];
        scope.interfaces = vec![Default::default()];
        scope.scope_document = ScopeDocument {
            processes: vec!["Sales".into()],
            departments: vec![],
            locations: vec!["HQ".into()],
        };
        scope
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(checklist_percent(&[true, false, false, false, false, false, false, false]), 12);
        assert_eq!(checklist_percent(&[]), 0);
        assert_eq!(ratio_percent(5, 93), 5);
        assert_eq!(ratio_percent(1, 2), 50);
        assert_eq!(ratio_percent(1, 8), 13);
        assert_eq!(ratio_percent(3, 2), 100);
        assert_eq!(ratio_percent(3, 0), 0);
    }

    #[test]
    fn test_scope_org_only_is_12() {
        assert_eq!(org_only().completion(), 12);
    }

    #[test]
    fn test_scope_full_is_100() {
        assert_eq!(full_scope().completion(), 100);
    }

    #[test]
    fn test_scope_bonus_needs_all_checks() {
        let mut scope = full_scope();
        scope.interfaces.clear();
        // 6 of 7 checks, bonus withheld
        assert_eq!(scope.completion(), 75);
    }

    #[test]
    fn test_absent_and_corrupt_keys_score_zero() {
        let store = IsmsStore::in_memory();
        for step in StepId::ALL {
            assert_eq!(step_completion(&store, step), 0, "{}", step);
        }
        store.write_raw(keys::SCOPE, "{not json").unwrap();
        assert_eq!(step_completion(&store, StepId::Scope), 0);
    }

    #[test]
    fn test_treatment_ignores_stale_and_duplicate_records() {
        let mut ra = RiskAssessment::default();
        let a = ra.add_asset(Asset::new("Servers", AssetType::Physical)).id.clone();
        let t = ra.add_threat(Threat::new("Fire", "", "")).id.clone();
        let v = ra.add_vulnerability(Vulnerability::new(&a, "No suppression", "")).unwrap().id.clone();
        let risk = ra.add_risk(&a, &t, &v, RiskLevel::Low, RiskLevel::High).unwrap().id.clone();

        let record = |id: &str| Treatment {
            risk_id: id.into(),
            selected_controls: vec!["A.7.5".into()],
            strategy: TreatmentStrategy::Mitigate,
        };
        let plan = TreatmentPlan {
            treatments: vec![record(&risk), record(&risk), record("risk-deleted")],
        };
        assert_eq!(treatment_completion(&ra, &plan), 100);

        let t2 = ra.add_threat(Threat::new("Flood", "", "")).id.clone();
        ra.add_risk(&a, &t2, &v, RiskLevel::Low, RiskLevel::Low).unwrap();
        assert_eq!(treatment_completion(&ra, &plan), 50);

        assert_eq!(treatment_completion(&RiskAssessment::default(), &plan), 0);
    }

    #[test]
    fn test_soa_five_documented_is_5() {
        let store = IsmsStore::in_memory();
        let rows: Vec<ControlApplicability> = crate::controls::ANNEX_A
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mut row = ControlApplicability::blank(c.id);
                if i < 5 {
                    row.status = ApplicabilityStatus::Applicable;
                    row.justification = "Required".into();
                    row.responsible_party = "Security Team".into();
                }
                row
            })
            .collect();
        store.write(keys::SOA, &rows).unwrap();
        assert_eq!(step_completion(&store, StepId::Soa), 5);
    }

    #[test]
    fn test_overall() {
        let zeros = StepId::ALL.map(|id| StepProgress::new(id, 0)).to_vec();
        let report = ProgressReport::from_steps(zeros.clone());
        assert_eq!(report.overall, 0);
        assert_eq!(report.overall_status(), StepStatus::NotStarted);

        let mut one = zeros;
        one[0] = StepProgress::new(StepId::Scope, 100);
        let report = ProgressReport::from_steps(one);
        assert_eq!(report.overall, 8);
        assert_eq!(report.completed_count(), 1);
        assert_eq!(report.step(StepId::Scope).unwrap().status, StepStatus::Completed);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let store = IsmsStore::in_memory();
        full_scope().save(&store).unwrap();
        store.write_raw(keys::POLICY, r#"{"title": "ISP", "commitments": ["x"]}"#).unwrap();
        let before = store.raw(keys::POLICY).unwrap();

        let first = ProgressReport::compute(&store);
        let second = ProgressReport::compute(&store);
        assert_eq!(first, second);
        assert_eq!(store.raw(keys::POLICY).unwrap(), before);
        assert_eq!(first.step(StepId::Policy).unwrap().completion, 33);
    }

    #[test]
    fn test_step_id_parse() {
        assert_eq!("internal-audit".parse::<StepId>().unwrap(), StepId::InternalAudit);
        assert!("audit".parse::<StepId>().is_err());
        assert_eq!(StepId::Monitoring.key(), "isms-monitoring-data");
    }
}
