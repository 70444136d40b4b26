//! Statement of Applicability
//!
//! One [`ControlApplicability`] row per Annex A control. A fresh SOA is
//! seeded from the mandatory controls and the current treatments; an existing
//! one is reconciled against treatments on every open, upgrading controls
//! newly selected in treatment to applicable. Reconciliation never
//! downgrades a control.

use crate::controls::{self, ANNEX_A, ANNEX_A_CONTROL_COUNT};
use crate::dates::optional_date;
use crate::treatment::TreatmentPlan;
use crate::{IsmsError, IsmsResult};
use chrono::NaiveDate;
use isms_common::{keys, IsmsStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Justification given to mandatory controls on seeding
pub const MANDATORY_JUSTIFICATION: &str = "Mandatory control for ISMS operation";
/// Justification given to controls selected in risk treatment
pub const TREATMENT_JUSTIFICATION: &str = "Selected in risk treatment";

/// Applicability status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicabilityStatus {
    Applicable,
    #[default]
    NotApplicable,
    PartiallyApplicable,
}

/// Implementation status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImplementationStatus {
    #[default]
    NotImplemented,
    Planned,
    PartiallyImplemented,
    Implemented,
}

impl std::str::FromStr for ApplicabilityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applicable" => Ok(Self::Applicable),
            "not-applicable" => Ok(Self::NotApplicable),
            "partially-applicable" => Ok(Self::PartiallyApplicable),
            _ => Err(format!("unknown applicability '{}'", s)),
        }
    }
}

impl std::str::FromStr for ImplementationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-implemented" => Ok(Self::NotImplemented),
            "planned" => Ok(Self::Planned),
            "partially-implemented" => Ok(Self::PartiallyImplemented),
            "implemented" => Ok(Self::Implemented),
            _ => Err(format!("unknown implementation status '{}'", s)),
        }
    }
}

impl std::fmt::Display for ApplicabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applicable => write!(f, "Applicable"),
            Self::NotApplicable => write!(f, "Not Applicable"),
            Self::PartiallyApplicable => write!(f, "Partially Applicable"),
        }
    }
}

impl std::fmt::Display for ImplementationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotImplemented => write!(f, "Not Implemented"),
            Self::Planned => write!(f, "Planned"),
            Self::PartiallyImplemented => write!(f, "Partially Implemented"),
            Self::Implemented => write!(f, "Implemented"),
        }
    }
}

/// SOA row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlApplicability {
    pub control_id: String,
    pub status: ApplicabilityStatus,
    pub implementation_status: ImplementationStatus,
    pub justification: String,
    pub implementation_description: String,
    pub responsible_party: String,
    #[serde(with = "optional_date")]
    pub target_date: Option<NaiveDate>,
    pub evidence: Vec<String>,
    pub notes: String,
}

impl ControlApplicability {
    /// Not-applicable row without justification
    pub fn blank(control_id: &str) -> Self {
        Self {
            control_id: control_id.to_string(),
            ..Self::default()
        }
    }

    /// Whether the row counts as documented: a justification, plus for
    /// applicable controls at least one implementation signal
    pub fn is_documented(&self) -> bool {
        if is_blank(&self.justification) {
            return false;
        }
        self.status == ApplicabilityStatus::NotApplicable || self.has_implementation_signal()
    }

    fn has_implementation_signal(&self) -> bool {
        self.implementation_status != ImplementationStatus::NotImplemented
            || !is_blank(&self.implementation_description)
            || !is_blank(&self.responsible_party)
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Partial SOA row update
#[derive(Debug, Clone, Default)]
pub struct ControlUpdate {
    pub status: Option<ApplicabilityStatus>,
    pub implementation_status: Option<ImplementationStatus>,
    pub justification: Option<String>,
    pub implementation_description: Option<String>,
    pub responsible_party: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub add_evidence: Vec<String>,
    pub notes: Option<String>,
}

/// Statement of Applicability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementOfApplicability {
    pub controls: Vec<ControlApplicability>,
}

impl StatementOfApplicability {
    /// Initial SOA for the given treatments
    pub fn seed(plan: &TreatmentPlan) -> Self {
        let treated = plan.referenced_controls();
        let controls = ANNEX_A
            .iter()
            .map(|c| {
                if controls::is_mandatory(c.id) {
                    ControlApplicability {
                        status: ApplicabilityStatus::Applicable,
                        justification: MANDATORY_JUSTIFICATION.into(),
                        ..ControlApplicability::blank(c.id)
                    }
                } else if treated.contains(c.id) {
                    ControlApplicability {
                        status: ApplicabilityStatus::Applicable,
                        implementation_status: ImplementationStatus::Planned,
                        justification: TREATMENT_JUSTIFICATION.into(),
                        ..ControlApplicability::blank(c.id)
                    }
                } else {
                    ControlApplicability::blank(c.id)
                }
            })
            .collect();
        Self { controls }
    }

    /// Bring an existing SOA in line with treatments; returns the number of
    /// rows added or changed
    pub fn reconcile(&mut self, plan: &TreatmentPlan) -> usize {
        let mut changed = 0;

        let present: HashSet<String> = self.controls.iter().map(|c| c.control_id.clone()).collect();
        for c in ANNEX_A.iter().filter(|c| !present.contains(c.id)) {
            self.controls.push(ControlApplicability::blank(c.id));
            changed += 1;
        }

        let treated: BTreeSet<&str> = plan.referenced_controls();
        for row in self.controls.iter_mut().filter(|r| treated.contains(r.control_id.as_str())) {
            let mut touched = false;
            if row.status == ApplicabilityStatus::NotApplicable {
                row.status = ApplicabilityStatus::Applicable;
                touched = true;
            }
            if is_blank(&row.justification) {
                row.justification = TREATMENT_JUSTIFICATION.into();
                touched = true;
            }
            changed += usize::from(touched);
        }

        self.sort_by_catalog();
        if changed > 0 {
            tracing::info!("Reconciled SOA with treatments: {} rows updated", changed);
        }
        changed
    }

    fn sort_by_catalog(&mut self) {
        let position = |id: &str| ANNEX_A.iter().position(|c| c.id == id).unwrap_or(usize::MAX);
        self.controls.sort_by_key(|r| position(&r.control_id));
    }

    /// Open the stored SOA, falling back to the legacy key, and persist it
    /// under the primary key when reconciled or migrated. Seeds only when
    /// neither key holds a value. A stored value that does not parse is
    /// reported as [`StorageError::Corrupt`](isms_common::StorageError) and
    /// left untouched.
    pub fn open(store: &IsmsStore) -> StorageResult<Self> {
        let plan = TreatmentPlan::load(store);
        let stored = match store.read::<Self>(keys::SOA)? {
            Some(soa) => Some((soa, false)),
            None => store.read::<Self>(keys::SOA_LEGACY)?.map(|soa| (soa, true)),
        };
        match stored {
            Some((mut soa, migrated)) => {
                if soa.reconcile(&plan) > 0 || migrated {
                    if migrated {
                        tracing::info!("Migrated SOA from legacy key {}", keys::SOA_LEGACY);
                    }
                    soa.save(store)?;
                }
                Ok(soa)
            }
            None => {
                let soa = Self::seed(&plan);
                tracing::info!("Seeded SOA with {} controls", soa.controls.len());
                soa.save(store)?;
                Ok(soa)
            }
        }
    }

    /// Stored SOA, read from the legacy key only when the primary key is
    /// absent; never seeds or writes
    pub fn load(store: &IsmsStore) -> Option<Self> {
        let key = match store.raw(keys::SOA) {
            Ok(Some(_)) => keys::SOA,
            _ => keys::SOA_LEGACY,
        };
        store.load(key)
    }

    pub fn save(&self, store: &IsmsStore) -> StorageResult<()> {
        store.write(keys::SOA, self)
    }

    pub fn get(&self, control_id: &str) -> Option<&ControlApplicability> {
        self.controls.iter().find(|c| c.control_id == control_id)
    }

    /// Apply update to one control
    pub fn update(&mut self, control_id: &str, update: ControlUpdate) -> IsmsResult<&ControlApplicability> {
        if !controls::is_known(control_id) {
            return Err(IsmsError::not_found("control", control_id));
        }
        let idx = match self.controls.iter().position(|c| c.control_id == control_id) {
            Some(idx) => idx,
            None => {
                self.controls.push(ControlApplicability::blank(control_id));
                self.controls.len() - 1
            }
        };

        let row = &mut self.controls[idx];
        if let Some(s) = update.status {
            row.status = s;
        }
        if let Some(s) = update.implementation_status {
            row.implementation_status = s;
        }
        if let Some(j) = update.justification {
            row.justification = j;
        }
        if let Some(d) = update.implementation_description {
            row.implementation_description = d;
        }
        if let Some(p) = update.responsible_party {
            row.responsible_party = p;
        }
        if let Some(d) = update.target_date {
            row.target_date = Some(d);
        }
        row.evidence.extend(update.add_evidence);
        if let Some(n) = update.notes {
            row.notes = n;
        }
        Ok(&self.controls[idx])
    }

    /// Distinct Annex A controls that are documented
    pub fn documented_count(&self) -> usize {
        self.controls
            .iter()
            .filter(|c| c.is_documented() && controls::is_known(&c.control_id))
            .map(|c| c.control_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Documented share of all Annex A controls, 0-100
    pub fn completion(&self) -> u8 {
        crate::progress::ratio_percent(self.documented_count(), ANNEX_A_CONTROL_COUNT)
    }

    /// Rows with a given status
    pub fn with_status(&self, status: ApplicabilityStatus) -> impl Iterator<Item = &ControlApplicability> {
        self.controls.iter().filter(move |c| c.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treatment::{Treatment, TreatmentStrategy};

    fn applicable(justification: &str) -> ControlApplicability {
        ControlApplicability {
            control_id: "A.5.7".into(),
            status: ApplicabilityStatus::Applicable,
            justification: justification.into(),
            ..ControlApplicability::default()
        }
    }

    fn plan_with(controls: &[&str]) -> TreatmentPlan {
        TreatmentPlan {
            treatments: vec![Treatment {
                risk_id: "r1".into(),
                selected_controls: controls.iter().map(|c| c.to_string()).collect(),
                strategy: TreatmentStrategy::Mitigate,
            }],
        }
    }

    #[test]
    fn test_documented_requires_signal_for_applicable() {
        let mut row = applicable("x");
        assert!(!row.is_documented());

        row.responsible_party = "Security Team".into();
        assert!(row.is_documented());
    }

    #[test]
    fn test_documented_signals() {
        let mut row = applicable("x");
        row.implementation_status = ImplementationStatus::Planned;
        assert!(row.is_documented());

        let mut row = applicable("x");
        row.implementation_description = "Quarterly threat briefings".into();
        assert!(row.is_documented());

        let mut row = applicable("x");
        row.status = ApplicabilityStatus::PartiallyApplicable;
        row.responsible_party = "   ".into();
        assert!(!row.is_documented());
    }

    #[test]
    fn test_not_applicable_needs_only_justification() {
        let mut row = ControlApplicability::blank("A.7.1");
        assert!(!row.is_documented());
        row.justification = "Fully remote organization, no premises".into();
        assert!(row.is_documented());
    }

    #[test]
    fn test_missing_justification_never_documented() {
        let mut row = applicable("");
        row.implementation_status = ImplementationStatus::Implemented;
        row.responsible_party = "IT".into();
        assert!(!row.is_documented());
    }

    #[test]
    fn test_seed() {
        let soa = StatementOfApplicability::seed(&plan_with(&["A.8.7", "A.5.1"]));
        assert_eq!(soa.controls.len(), ANNEX_A_CONTROL_COUNT);

        let mandatory = soa.get("A.5.1").unwrap();
        assert_eq!(mandatory.status, ApplicabilityStatus::Applicable);
        assert_eq!(mandatory.justification, MANDATORY_JUSTIFICATION);

        let treated = soa.get("A.8.7").unwrap();
        assert_eq!(treated.status, ApplicabilityStatus::Applicable);
        assert_eq!(treated.implementation_status, ImplementationStatus::Planned);
        assert_eq!(treated.justification, TREATMENT_JUSTIFICATION);

        let other = soa.get("A.7.4").unwrap();
        assert_eq!(other.status, ApplicabilityStatus::NotApplicable);
        assert!(other.justification.is_empty());
    }

    #[test]
    fn test_reconcile_upgrades_and_backfills_only() {
        let mut soa = StatementOfApplicability::seed(&TreatmentPlan::default());
        soa.update("A.8.7", ControlUpdate {
            justification: Some("Covered by EDR".into()),
            ..ControlUpdate::default()
        })
        .unwrap();
        soa.update("A.8.13", ControlUpdate {
            status: Some(ApplicabilityStatus::PartiallyApplicable),
            ..ControlUpdate::default()
        })
        .unwrap();

        let changed = soa.reconcile(&plan_with(&["A.8.7", "A.8.13", "A.8.24"]));
        assert_eq!(changed, 3);

        let edr = soa.get("A.8.7").unwrap();
        assert_eq!(edr.status, ApplicabilityStatus::Applicable);
        assert_eq!(edr.justification, "Covered by EDR");

        // Never downgraded
        let backup = soa.get("A.8.13").unwrap();
        assert_eq!(backup.status, ApplicabilityStatus::PartiallyApplicable);
        assert_eq!(backup.justification, TREATMENT_JUSTIFICATION);

        // Second pass is a no-op
        assert_eq!(soa.reconcile(&plan_with(&["A.8.7", "A.8.13", "A.8.24"])), 0);
    }

    #[test]
    fn test_reconcile_fills_missing_rows_in_catalog_order() {
        let mut soa = StatementOfApplicability {
            controls: vec![ControlApplicability::blank("A.8.34"), ControlApplicability::blank("A.5.1")],
        };
        assert_eq!(soa.reconcile(&TreatmentPlan::default()), ANNEX_A_CONTROL_COUNT - 2);
        assert_eq!(soa.controls.len(), ANNEX_A_CONTROL_COUNT);
        assert_eq!(soa.controls[0].control_id, "A.5.1");
        assert_eq!(soa.controls[ANNEX_A_CONTROL_COUNT - 1].control_id, "A.8.34");
    }

    #[test]
    fn test_open_seeds_then_reconciles() {
        let store = IsmsStore::in_memory();
        let soa = StatementOfApplicability::open(&store).unwrap();
        assert_eq!(soa.with_status(ApplicabilityStatus::Applicable).count(), controls::MANDATORY_CONTROLS.len());
        assert!(store.raw(keys::SOA).unwrap().is_some());

        plan_with(&["A.8.12"]).save(&store).unwrap();
        let soa = StatementOfApplicability::open(&store).unwrap();
        assert_eq!(soa.get("A.8.12").unwrap().status, ApplicabilityStatus::Applicable);
        assert_eq!(StatementOfApplicability::load(&store), Some(soa));
    }

    #[test]
    fn test_documented_count_ignores_unknown_and_duplicate_ids() {
        let mut a = applicable("x");
        a.responsible_party = "IT".into();
        let mut unknown = a.clone();
        unknown.control_id = "A.99.9".into();

        let soa = StatementOfApplicability { controls: vec![a.clone(), a, unknown] };
        assert_eq!(soa.documented_count(), 1);
    }

    #[test]
    fn test_update_rejects_unknown_control() {
        let mut soa = StatementOfApplicability::default();
        assert!(soa.update("A.1.1", ControlUpdate::default()).is_err());
        soa.update("A.5.3", ControlUpdate::default()).unwrap();
        assert_eq!(soa.controls.len(), 1);
    }

    #[test]
    fn test_legacy_key_fallback() {
        let store = IsmsStore::in_memory();
        let mut row = ControlApplicability::blank("A.7.1");
        row.justification = "No premises".into();
        store.write(keys::SOA_LEGACY, &vec![row]).unwrap();

        let soa = StatementOfApplicability::load(&store).unwrap();
        assert_eq!(soa.documented_count(), 1);
    }

    #[test]
    fn test_open_migrates_legacy_rows() {
        let store = IsmsStore::in_memory();
        let rows: Vec<ControlApplicability> = ANNEX_A
            .iter()
            .map(|c| {
                let mut row = ControlApplicability::blank(c.id);
                row.justification = "Outside the certified scope".into();
                row
            })
            .collect();
        store.write(keys::SOA_LEGACY, &rows).unwrap();
        assert_eq!(StatementOfApplicability::load(&store).unwrap().completion(), 100);

        let soa = StatementOfApplicability::open(&store).unwrap();
        assert_eq!(soa.completion(), 100);
        assert_eq!(soa.with_status(ApplicabilityStatus::Applicable).count(), 0);

        let migrated: StatementOfApplicability = store.read(keys::SOA).unwrap().unwrap();
        assert_eq!(migrated, soa);
        assert_eq!(StatementOfApplicability::load(&store).unwrap().completion(), 100);
    }

    #[test]
    fn test_open_keeps_unparseable_soa() {
        let store = IsmsStore::in_memory();
        let mut row = serde_json::to_value(applicable("Needed for logging")).unwrap();
        row["targetDate"] = serde_json::Value::from("Q3 2025");
        let raw = serde_json::to_string(&vec![row]).unwrap();
        store.write_raw(keys::SOA, &raw).unwrap();

        let err = StatementOfApplicability::open(&store).unwrap_err();
        assert!(err.is_corrupt());
        assert_eq!(store.raw(keys::SOA).unwrap().as_deref(), Some(raw.as_str()));
    }
}
