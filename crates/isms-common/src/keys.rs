//! Storage keys
//!
//! Each ISMS artifact is stored as one JSON value under a fixed key.

/// Scope definition
pub const SCOPE: &str = "isms-scope-data";
/// Information security policy
pub const POLICY: &str = "isms-policy-data";
/// Assets, threats, vulnerabilities and risks
pub const RISK_ASSESSMENT: &str = "isms-risk-assessment";
/// Risk treatments
pub const RISK_TREATMENTS: &str = "riskTreatments";
/// Statement of Applicability
pub const SOA: &str = "statementOfApplicability";
/// Legacy SOA location, read only when [`SOA`] is absent
pub const SOA_LEGACY: &str = "isms-soa-data";
/// Security objectives
pub const OBJECTIVES: &str = "isms-objectives-data";
/// Implementation plan
pub const IMPLEMENTATION: &str = "isms-implementation-data";
/// Monitoring and measurement
pub const MONITORING: &str = "isms-monitoring-data";
/// Awareness and training
pub const TRAINING: &str = "isms-training-data";
/// Internal audit procedure
pub const INTERNAL_AUDIT: &str = "isms-internal-audit-data";
/// Management review
pub const MANAGEMENT_REVIEW: &str = "isms-management-review-data";
/// Corrective actions
pub const CORRECTIVE_ACTIONS: &str = "isms-corrective-actions-data";
/// Named risk assessment snapshots
pub const SAVED_ASSESSMENTS: &str = "isms-saved-assessments";
/// Latest auto-saved model
pub const AUTO_SAVE: &str = "isms-auto-save";
