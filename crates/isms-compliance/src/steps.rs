//! Lifecycle Step Records
//!
//! Typed records for the ISMS steps after risk treatment and SOA, plus the
//! information security policy. Each record lives under its own key and is
//! scored by its own checklist (see [`crate::progress`]).

use crate::dates::optional_date;
use crate::progress::Checklist;
use chrono::NaiveDate;
use isms_common::{keys, IsmsStore, StorageResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Record persisted under a fixed step key
pub trait StepRecord: Checklist + Serialize + DeserializeOwned + Default {
    /// Storage key
    const KEY: &'static str;

    /// Stored record, or an empty one when absent or unreadable
    fn load(store: &IsmsStore) -> Self {
        store.load_or_default(Self::KEY)
    }

    /// Replace stored record
    fn save(&self, store: &IsmsStore) -> StorageResult<()> {
        store.write(Self::KEY, self)
    }
}

fn filled(s: &str) -> bool {
    !s.trim().is_empty()
}

/// True when `items` is non-empty and every item satisfies `pred`
fn all_non_empty<T>(items: &[T], pred: impl Fn(&T) -> bool) -> bool {
    !items.is_empty() && items.iter().all(pred)
}

/// Progress of a task or action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

// ============================================================================
// Policy
// ============================================================================

/// Information security policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolicyData {
    pub title: String,
    pub purpose: String,
    pub scope: String,
    pub commitments: Vec<String>,
    pub roles_and_responsibilities: String,
    pub approved_by: String,
    #[serde(with = "optional_date")]
    pub approval_date: Option<NaiveDate>,
    #[serde(with = "optional_date")]
    pub review_date: Option<NaiveDate>,
}

impl Checklist for PolicyData {
    fn checks(&self) -> Vec<bool> {
        vec![
            filled(&self.title),
            filled(&self.purpose),
            filled(&self.scope),
            self.commitments.iter().any(|c| filled(c)),
            filled(&self.roles_and_responsibilities),
            filled(&self.approved_by) && self.approval_date.is_some(),
        ]
    }
}

impl StepRecord for PolicyData {
    const KEY: &'static str = keys::POLICY;
}

// ============================================================================
// Objectives
// ============================================================================

/// Information security objective (clause 6.2)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Objective {
    pub description: String,
    /// Measurable target, e.g. "99.9% availability"
    pub target: String,
    pub owner: String,
    #[serde(with = "optional_date")]
    pub due_date: Option<NaiveDate>,
    pub status: WorkStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectivesData {
    pub objectives: Vec<Objective>,
}

impl Checklist for ObjectivesData {
    fn checks(&self) -> Vec<bool> {
        vec![
            !self.objectives.is_empty(),
            all_non_empty(&self.objectives, |o| filled(&o.target)),
            all_non_empty(&self.objectives, |o| filled(&o.owner)),
            all_non_empty(&self.objectives, |o| o.due_date.is_some()),
        ]
    }
}

impl StepRecord for ObjectivesData {
    const KEY: &'static str = keys::OBJECTIVES;
}

// ============================================================================
// Implementation
// ============================================================================

/// Implementation task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImplementationTask {
    pub title: String,
    pub control_id: String,
    pub owner: String,
    #[serde(with = "optional_date")]
    pub due_date: Option<NaiveDate>,
    pub status: WorkStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImplementationData {
    pub tasks: Vec<ImplementationTask>,
}

impl Checklist for ImplementationData {
    fn checks(&self) -> Vec<bool> {
        let done = |t: &ImplementationTask| t.status == WorkStatus::Completed;
        vec![
            !self.tasks.is_empty(),
            all_non_empty(&self.tasks, |t| filled(&t.owner)),
            self.tasks.iter().any(done),
            all_non_empty(&self.tasks, done),
        ]
    }
}

impl StepRecord for ImplementationData {
    const KEY: &'static str = keys::IMPLEMENTATION;
}

// ============================================================================
// Monitoring
// ============================================================================

/// Recorded measurement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Measurement {
    #[serde(with = "optional_date")]
    pub date: Option<NaiveDate>,
    pub value: String,
    pub notes: String,
}

/// Monitoring metric (clause 9.1)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metric {
    pub name: String,
    pub method: String,
    pub frequency: String,
    pub target: String,
    pub results: Vec<Measurement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitoringData {
    pub metrics: Vec<Metric>,
}

impl Checklist for MonitoringData {
    fn checks(&self) -> Vec<bool> {
        vec![
            !self.metrics.is_empty(),
            all_non_empty(&self.metrics, |m| filled(&m.method)),
            all_non_empty(&self.metrics, |m| filled(&m.frequency)),
            self.metrics.iter().any(|m| !m.results.is_empty()),
        ]
    }
}

impl StepRecord for MonitoringData {
    const KEY: &'static str = keys::MONITORING;
}

// ============================================================================
// Training
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrainingProgram {
    pub name: String,
    pub audience: String,
    pub frequency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrainingSession {
    pub topic: String,
    #[serde(with = "optional_date")]
    pub date: Option<NaiveDate>,
    pub attendees: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompetenceRecord {
    pub person: String,
    pub role: String,
    pub competence: String,
    pub evidence: String,
}

/// Awareness and competence (clauses 7.2, 7.3)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrainingData {
    pub programs: Vec<TrainingProgram>,
    pub awareness_topics: Vec<String>,
    pub sessions: Vec<TrainingSession>,
    pub competence_records: Vec<CompetenceRecord>,
}

impl Checklist for TrainingData {
    fn checks(&self) -> Vec<bool> {
        vec![
            !self.programs.is_empty(),
            !self.awareness_topics.is_empty(),
            !self.sessions.is_empty(),
            !self.competence_records.is_empty(),
        ]
    }
}

impl StepRecord for TrainingData {
    const KEY: &'static str = keys::TRAINING;
}

// ============================================================================
// Internal audit
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
}

/// Single audit of the program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Audit {
    pub title: String,
    pub area: String,
    #[serde(with = "optional_date")]
    pub planned_date: Option<NaiveDate>,
    pub status: AuditStatus,
    pub findings: Vec<String>,
    pub report: String,
}

impl Audit {
    fn has_outcome(&self) -> bool {
        self.status == AuditStatus::Completed && (!self.findings.is_empty() || filled(&self.report))
    }
}

/// Internal audit program (clause 9.2)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InternalAuditData {
    pub program_scope: String,
    pub criteria: String,
    pub auditors: Vec<String>,
    pub audits: Vec<Audit>,
}

impl Checklist for InternalAuditData {
    fn checks(&self) -> Vec<bool> {
        vec![
            filled(&self.program_scope),
            filled(&self.criteria),
            !self.auditors.is_empty(),
            !self.audits.is_empty(),
            self.audits.iter().any(Audit::has_outcome),
        ]
    }
}

impl StepRecord for InternalAuditData {
    const KEY: &'static str = keys::INTERNAL_AUDIT;
}

// ============================================================================
// Management review
// ============================================================================

/// Management review meeting (clause 9.3)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManagementReview {
    #[serde(with = "optional_date")]
    pub date: Option<NaiveDate>,
    pub attendees: Vec<String>,
    pub inputs: Vec<String>,
    pub decisions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManagementReviewData {
    pub reviews: Vec<ManagementReview>,
}

impl ManagementReviewData {
    /// Most recent review by date; undated reviews rank oldest, ties go to
    /// the later entry
    pub fn latest(&self) -> Option<&ManagementReview> {
        self.reviews.iter().enumerate().max_by_key(|(i, r)| (r.date, *i)).map(|(_, r)| r)
    }
}

impl Checklist for ManagementReviewData {
    fn checks(&self) -> Vec<bool> {
        let latest = self.latest();
        vec![
            latest.is_some(),
            latest.is_some_and(|r| !r.attendees.is_empty()),
            latest.is_some_and(|r| !r.inputs.is_empty()),
            latest.is_some_and(|r| !r.decisions.is_empty()),
        ]
    }
}

impl StepRecord for ManagementReviewData {
    const KEY: &'static str = keys::MANAGEMENT_REVIEW;
}

// ============================================================================
// Corrective actions
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

/// Nonconformity and its corrective action (clause 10.2)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorrectiveAction {
    pub nonconformity: String,
    pub root_cause: String,
    pub action: String,
    pub owner: String,
    #[serde(with = "optional_date")]
    pub due_date: Option<NaiveDate>,
    pub status: ActionStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorrectiveActionsData {
    pub actions: Vec<CorrectiveAction>,
}

impl Checklist for CorrectiveActionsData {
    fn checks(&self) -> Vec<bool> {
        vec![
            !self.actions.is_empty(),
            all_non_empty(&self.actions, |a| filled(&a.root_cause)),
            all_non_empty(&self.actions, |a| filled(&a.owner)),
            all_non_empty(&self.actions, |a| a.status == ActionStatus::Closed),
        ]
    }
}

impl StepRecord for CorrectiveActionsData {
    const KEY: &'static str = keys::CORRECTIVE_ACTIONS;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::checklist_percent;

    fn date(s: &str) -> Option<NaiveDate> {
        Some(crate::dates::parse(s).unwrap())
    }

    #[test]
    fn test_empty_records_score_zero() {
        assert_eq!(PolicyData::default().completion(), 0);
        assert_eq!(ObjectivesData::default().completion(), 0);
        assert_eq!(ImplementationData::default().completion(), 0);
        assert_eq!(MonitoringData::default().completion(), 0);
        assert_eq!(TrainingData::default().completion(), 0);
        assert_eq!(InternalAuditData::default().completion(), 0);
        assert_eq!(ManagementReviewData::default().completion(), 0);
        assert_eq!(CorrectiveActionsData::default().completion(), 0);
    }

    #[test]
    fn test_policy_approval_needs_date() {
        let mut policy = PolicyData {
            title: "Information Security Policy".into(),
            purpose: "Protect information".into(),
            scope: "All staff".into(),
            commitments: vec!["Continual improvement".into()],
            roles_and_responsibilities: "CISO owns the ISMS".into(),
            approved_by: "CEO".into(),
            ..PolicyData::default()
        };
        assert_eq!(checklist_percent(&policy.checks()), 83);

        policy.approval_date = date("2024-01-15");
        assert_eq!(policy.completion(), 100);
    }

    #[test]
    fn test_implementation_partial() {
        let data = ImplementationData {
            tasks: vec![
                ImplementationTask {
                    title: "Deploy MFA".into(),
                    owner: "IT".into(),
                    status: WorkStatus::Completed,
                    ..ImplementationTask::default()
                },
                ImplementationTask {
                    title: "Backup tests".into(),
                    owner: "IT".into(),
                    ..ImplementationTask::default()
                },
            ],
        };
        assert_eq!(data.completion(), 75);
    }

    #[test]
    fn test_internal_audit_requires_outcome() {
        let mut data = InternalAuditData {
            program_scope: "Whole ISMS".into(),
            criteria: "ISO 27001:2022".into(),
            auditors: vec!["J. Smith".into()],
            audits: vec![Audit {
                title: "Q1 audit".into(),
                status: AuditStatus::Completed,
                ..Audit::default()
            }],
        };
        assert_eq!(data.completion(), 80);

        data.audits[0].report = "No major findings".into();
        assert_eq!(data.completion(), 100);
    }

    #[test]
    fn test_management_review_uses_latest() {
        let data = ManagementReviewData {
            reviews: vec![
                ManagementReview {
                    date: date("2024-06-01"),
                    attendees: vec!["CEO".into()],
                    inputs: vec!["Audit results".into()],
                    decisions: vec!["Fund SIEM".into()],
                },
                ManagementReview {
                    date: date("2023-06-01"),
                    ..ManagementReview::default()
                },
            ],
        };
        assert_eq!(data.latest().unwrap().date, date("2024-06-01"));
        assert_eq!(data.completion(), 100);
    }

    #[test]
    fn test_corrective_actions_all_closed() {
        let mut data = CorrectiveActionsData {
            actions: vec![CorrectiveAction {
                nonconformity: "Unreviewed access rights".into(),
                root_cause: "No review schedule".into(),
                owner: "IT".into(),
                ..CorrectiveAction::default()
            }],
        };
        assert_eq!(data.completion(), 75);
        data.actions[0].status = ActionStatus::Closed;
        assert_eq!(data.completion(), 100);
    }

    #[test]
    fn test_load_and_save_under_step_key() {
        let store = IsmsStore::in_memory();
        let training = TrainingData {
            awareness_topics: vec!["Phishing".into()],
            ..TrainingData::default()
        };
        training.save(&store).unwrap();

        assert!(store.raw(keys::TRAINING).unwrap().unwrap().contains("awarenessTopics"));
        assert_eq!(TrainingData::load(&store), training);
        assert_eq!(TrainingData::load(&store).completion(), 25);
    }
}
