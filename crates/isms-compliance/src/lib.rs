//! ISMS Compliance Engine
//!
//! Documentation engine for an ISO 27001:2022 Information Security
//! Management System.
//!
//! # Artifacts
//!
//! - **Scope**: organization context, interested parties, boundaries
//! - **Risk Assessment**: assets, threats, vulnerabilities, rated risks
//! - **Risk Treatment**: strategy and Annex A controls per risk
//! - **Statement of Applicability**: applicability of all 93 Annex A controls
//! - **Lifecycle steps**: policy, objectives, implementation, monitoring,
//!   training, internal audit, management review, corrective actions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ISMS COMPLIANCE ENGINE                           │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌─────────────┐  │
//! │  │    Scope     │  │     Risk     │  │  Treatment   │  │     SOA     │  │
//! │  │   Wizard     │  │  Assessment  │  │     Plan     │  │ (Annex A)   │  │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘  └──────┬──────┘  │
//! │         │                 │                 │                 │         │
//! │  ┌──────▼─────────────────▼─────────────────▼─────────────────▼──────┐  │
//! │  │                     IsmsStore (typed JSON keys)                   │  │
//! │  └───────────────────────────────┬───────────────────────────────────┘  │
//! │                                  │ ChangeBus                            │
//! │  ┌──────────────┐  ┌─────────────▼──────┐  ┌──────────────┐             │
//! │  │  Snapshots   │  │     Dashboard      │  │  Reporting   │             │
//! │  │ (Save As)    │  │ (Step Completion)  │  │  (MD / CSV)  │             │
//! │  └──────────────┘  └────────────────────┘  └──────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]

pub mod assessment;
pub mod assets;
pub mod controls;
pub mod dashboard;
mod dates;
pub mod import;
pub mod progress;
pub mod reporting;
pub mod risk;
pub mod scope;
pub mod snapshots;
pub mod soa;
pub mod steps;
pub mod treatment;

use isms_common::StorageError;
use thiserror::Error;

pub use assessment::{RiskAssessment, RiskUpdate};
pub use assets::{Asset, AssetType, Threat, Vulnerability};
pub use dashboard::Dashboard;
pub use dates::parse as parse_date;
pub use import::ImportError;
pub use progress::{Checklist, ProgressReport, StepId, StepProgress, StepStatus};
pub use risk::{calculate_risk_level, Risk, RiskLevel};
pub use scope::{ScopeData, ScopeStage, ScopeWizard, ValidationError};
pub use snapshots::{SavedAssessment, Snapshots};
pub use soa::{ControlApplicability, ControlUpdate, StatementOfApplicability};
pub use steps::StepRecord;
pub use treatment::{Treatment, TreatmentPlan, TreatmentStrategy};

/// ISMS error types
#[derive(Debug, Error)]
pub enum IsmsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl IsmsError {
    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result type for ISMS operations
pub type IsmsResult<T> = Result<T, IsmsError>;
