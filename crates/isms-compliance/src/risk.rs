//! Risk Rating
//!
//! Likelihood and impact use the same five-point scale. The risk level of a
//! [`Risk`] is always derived from them through [`calculate_risk_level`]; it
//! has no setter and is recomputed when a stored risk is parsed.

use crate::dates::optional_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Five-point rating used for likelihood, impact and resulting level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    VeryLow = 1,
    Low = 2,
    Medium = 3,
    High = 4,
    VeryHigh = 5,
}

impl RiskLevel {
    /// All ratings, lowest first
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::VeryLow,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::VeryHigh,
    ];

    /// Numeric value 1-5
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Bucket a likelihood x impact score (1-25)
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=4 => Self::VeryLow,
            5..=8 => Self::Low,
            9..=12 => Self::Medium,
            13..=16 => Self::High,
            _ => Self::VeryHigh,
        }
    }

    /// Stored name (`very-low` ... `very-high`)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very-low",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very-high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VeryLow => write!(f, "Very Low"),
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::VeryHigh => write!(f, "Very High"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| format!("unknown rating '{}' (expected very-low, low, medium, high, very-high)", s))
    }
}

/// Likelihood x impact
pub fn risk_score(likelihood: RiskLevel, impact: RiskLevel) -> u8 {
    likelihood.value() * impact.value()
}

/// Risk level for a likelihood/impact pair
pub fn calculate_risk_level(likelihood: RiskLevel, impact: RiskLevel) -> RiskLevel {
    RiskLevel::from_score(risk_score(likelihood, impact))
}

/// Treatment decision recorded on the risk itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskTreatment {
    Accept,
    #[default]
    Mitigate,
    Transfer,
    Avoid,
}

impl std::fmt::Display for RiskTreatment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "Accept"),
            Self::Mitigate => write!(f, "Mitigate"),
            Self::Transfer => write!(f, "Transfer"),
            Self::Avoid => write!(f, "Avoid"),
        }
    }
}

/// Risk lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskStatus {
    #[default]
    Open,
    InProgress,
    Accepted,
    Closed,
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Accepted => write!(f, "Accepted"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

impl std::str::FromStr for RiskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in-progress" => Ok(Self::InProgress),
            "accepted" => Ok(Self::Accepted),
            "closed" => Ok(Self::Closed),
            _ => Err(format!("unknown risk status '{}'", s)),
        }
    }
}

/// Identified risk for one asset/threat/vulnerability combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RiskRecord")]
pub struct Risk {
    pub id: String,
    pub asset_id: String,
    pub threat_id: String,
    pub vulnerability_id: String,
    likelihood: RiskLevel,
    impact: RiskLevel,
    risk_level: RiskLevel,
    pub treatment: RiskTreatment,
    pub controls: Vec<String>,
    pub owner: String,
    #[serde(with = "optional_date")]
    pub review_date: Option<NaiveDate>,
    pub status: RiskStatus,
}

impl Risk {
    /// Create new open risk
    pub fn new(
        asset_id: &str,
        threat_id: &str,
        vulnerability_id: &str,
        likelihood: RiskLevel,
        impact: RiskLevel,
    ) -> Self {
        Self {
            id: format!("risk-{}", Uuid::new_v4().simple()),
            asset_id: asset_id.to_string(),
            threat_id: threat_id.to_string(),
            vulnerability_id: vulnerability_id.to_string(),
            likelihood,
            impact,
            risk_level: calculate_risk_level(likelihood, impact),
            treatment: RiskTreatment::default(),
            controls: Vec::new(),
            owner: String::new(),
            review_date: None,
            status: RiskStatus::Open,
        }
    }

    pub fn likelihood(&self) -> RiskLevel {
        self.likelihood
    }

    pub fn impact(&self) -> RiskLevel {
        self.impact
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn score(&self) -> u8 {
        risk_score(self.likelihood, self.impact)
    }

    /// Re-rate the risk
    pub fn assess(&mut self, likelihood: RiskLevel, impact: RiskLevel) {
        self.likelihood = likelihood;
        self.impact = impact;
        self.risk_level = calculate_risk_level(likelihood, impact);
    }

    pub fn set_likelihood(&mut self, likelihood: RiskLevel) {
        self.assess(likelihood, self.impact);
    }

    pub fn set_impact(&mut self, impact: RiskLevel) {
        self.assess(self.likelihood, impact);
    }
}

/// Stored shape of a risk; any stored `riskLevel` is ignored
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RiskRecord {
    id: String,
    asset_id: String,
    threat_id: String,
    vulnerability_id: String,
    likelihood: RiskLevel,
    impact: RiskLevel,
    #[serde(default)]
    treatment: RiskTreatment,
    #[serde(default)]
    controls: Vec<String>,
    #[serde(default)]
    owner: String,
    #[serde(default, with = "optional_date")]
    review_date: Option<NaiveDate>,
    #[serde(default)]
    status: RiskStatus,
}

impl From<RiskRecord> for Risk {
    fn from(r: RiskRecord) -> Self {
        Self {
            id: r.id,
            asset_id: r.asset_id,
            threat_id: r.threat_id,
            vulnerability_id: r.vulnerability_id,
            likelihood: r.likelihood,
            impact: r.impact,
            risk_level: calculate_risk_level(r.likelihood, r.impact),
            treatment: r.treatment,
            controls: r.controls,
            owner: r.owner,
            review_date: r.review_date,
            status: r.status,
        }
    }
}

/// Risk summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total: usize,
    pub very_high: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub very_low: usize,
}

impl RiskSummary {
    /// Count risks per level
    pub fn from_risks(risks: &[Risk]) -> Self {
        let mut summary = Self {
            total: risks.len(),
            ..Self::default()
        };
        for risk in risks {
            match risk.risk_level() {
                RiskLevel::VeryHigh => summary.very_high += 1,
                RiskLevel::High => summary.high += 1,
                RiskLevel::Medium => summary.medium += 1,
                RiskLevel::Low => summary.low += 1,
                RiskLevel::VeryLow => summary.very_low += 1,
            }
        }
        summary
    }
}
