//! Risk Assessment
//!
//! Assets, threats, vulnerabilities and the risks linking them, persisted as
//! one value under [`keys::RISK_ASSESSMENT`]. Removing an entity removes
//! everything that references it.

use crate::assets::{self, Asset, Threat, Vulnerability};
use crate::risk::{Risk, RiskLevel, RiskStatus, RiskSummary, RiskTreatment};
use crate::{IsmsError, IsmsResult};
use chrono::NaiveDate;
use isms_common::{keys, IsmsStore, StorageResult};
use serde::{Deserialize, Serialize};

/// Risk assessment model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RiskAssessment {
    pub assets: Vec<Asset>,
    pub threats: Vec<Threat>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub risks: Vec<Risk>,
}

/// What a cascading removal took out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Removed {
    pub assets: usize,
    pub threats: usize,
    pub vulnerabilities: usize,
    pub risks: usize,
}

impl RiskAssessment {
    /// Load stored assessment; absent or unreadable data yields an empty one
    pub fn load(store: &IsmsStore) -> Self {
        store.load_or_default(keys::RISK_ASSESSMENT)
    }

    /// Persist whole assessment
    pub fn save(&self, store: &IsmsStore) -> StorageResult<()> {
        store.write(keys::RISK_ASSESSMENT, self)
    }

    // === Assets ===

    /// Add asset; an asset with the same name-derived id is kept as is
    pub fn add_asset(&mut self, asset: Asset) -> &Asset {
        let id = asset.id.clone();
        match self.assets.iter().position(|a| a.id == id) {
            Some(idx) => {
                tracing::debug!("Asset {} already present", id);
                &self.assets[idx]
            }
            None => {
                self.assets.push(asset);
                &self.assets[self.assets.len() - 1]
            }
        }
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Asset by id or (case-insensitive) name
    pub fn find_asset(&self, id_or_name: &str) -> Option<&Asset> {
        self.asset(id_or_name)
            .or_else(|| self.assets.iter().find(|a| a.name.eq_ignore_ascii_case(id_or_name)))
    }

    /// Remove asset with its vulnerabilities and risks
    pub fn remove_asset(&mut self, id: &str) -> IsmsResult<Removed> {
        let before = self.assets.len();
        self.assets.retain(|a| a.id != id);
        if self.assets.len() == before {
            return Err(IsmsError::not_found("asset", id));
        }

        let vulns_before = self.vulnerabilities.len();
        self.vulnerabilities.retain(|v| v.asset_id != id);
        let risks_before = self.risks.len();
        self.risks.retain(|r| r.asset_id != id);

        let removed = Removed {
            assets: 1,
            vulnerabilities: vulns_before - self.vulnerabilities.len(),
            risks: risks_before - self.risks.len(),
            ..Removed::default()
        };
        tracing::info!("Removed asset {} ({:?})", id, removed);
        Ok(removed)
    }

    // === Threats ===

    /// Add threat; idempotent by name-derived id
    pub fn add_threat(&mut self, threat: Threat) -> &Threat {
        let id = threat.id.clone();
        match self.threats.iter().position(|t| t.id == id) {
            Some(idx) => &self.threats[idx],
            None => {
                self.threats.push(threat);
                &self.threats[self.threats.len() - 1]
            }
        }
    }

    pub fn threat(&self, id: &str) -> Option<&Threat> {
        self.threats.iter().find(|t| t.id == id)
    }

    pub fn find_threat(&self, id_or_name: &str) -> Option<&Threat> {
        self.threat(id_or_name)
            .or_else(|| self.threats.iter().find(|t| t.name.eq_ignore_ascii_case(id_or_name)))
    }

    /// Remove threat, its risks, and its links from vulnerabilities
    pub fn remove_threat(&mut self, id: &str) -> IsmsResult<Removed> {
        let before = self.threats.len();
        self.threats.retain(|t| t.id != id);
        if self.threats.len() == before {
            return Err(IsmsError::not_found("threat", id));
        }

        for vuln in &mut self.vulnerabilities {
            vuln.threat_ids.retain(|t| t != id);
        }
        let risks_before = self.risks.len();
        self.risks.retain(|r| r.threat_id != id);

        Ok(Removed {
            threats: 1,
            risks: risks_before - self.risks.len(),
            ..Removed::default()
        })
    }

    // === Vulnerabilities ===

    /// Add vulnerability to an existing asset; idempotent by id
    pub fn add_vulnerability(&mut self, vulnerability: Vulnerability) -> IsmsResult<&Vulnerability> {
        if self.asset(&vulnerability.asset_id).is_none() {
            return Err(IsmsError::not_found("asset", &vulnerability.asset_id));
        }
        if let Some(missing) = vulnerability.threat_ids.iter().find(|t| self.threat(t).is_none()) {
            return Err(IsmsError::not_found("threat", missing));
        }

        match self.vulnerabilities.iter().position(|v| v.id == vulnerability.id) {
            Some(idx) => {
                // Merge threat links into the existing entry
                let existing = &mut self.vulnerabilities[idx];
                for t in vulnerability.threat_ids {
                    if !existing.threat_ids.contains(&t) {
                        existing.threat_ids.push(t);
                    }
                }
                Ok(&self.vulnerabilities[idx])
            }
            None => {
                self.vulnerabilities.push(vulnerability);
                Ok(&self.vulnerabilities[self.vulnerabilities.len() - 1])
            }
        }
    }

    pub fn vulnerability(&self, id: &str) -> Option<&Vulnerability> {
        self.vulnerabilities.iter().find(|v| v.id == id)
    }

    /// Vulnerabilities of one asset
    pub fn vulnerabilities_of(&self, asset_id: &str) -> Vec<&Vulnerability> {
        self.vulnerabilities.iter().filter(|v| v.asset_id == asset_id).collect()
    }

    /// Remove vulnerability and its risks
    pub fn remove_vulnerability(&mut self, id: &str) -> IsmsResult<Removed> {
        let before = self.vulnerabilities.len();
        self.vulnerabilities.retain(|v| v.id != id);
        if self.vulnerabilities.len() == before {
            return Err(IsmsError::not_found("vulnerability", id));
        }
        let risks_before = self.risks.len();
        self.risks.retain(|r| r.vulnerability_id != id);

        Ok(Removed {
            vulnerabilities: 1,
            risks: risks_before - self.risks.len(),
            ..Removed::default()
        })
    }

    /// Add catalog threats and vulnerabilities suggested for an asset
    pub fn apply_suggestions(&mut self, asset_id: &str) -> IsmsResult<usize> {
        let asset = self
            .asset(asset_id)
            .cloned()
            .ok_or_else(|| IsmsError::not_found("asset", asset_id))?;

        let mut added = 0;
        for threat in assets::suggest_threats(&asset) {
            let known_threat = self.threat(&threat.id).is_some();
            let threat = self.add_threat(threat).clone();
            added += usize::from(!known_threat);

            for vuln in assets::suggest_vulnerabilities(&asset, &threat) {
                let known_vuln = self.vulnerability(&vuln.id).is_some();
                self.add_vulnerability(vuln)?;
                added += usize::from(!known_vuln);
            }
        }
        Ok(added)
    }

    // === Risks ===

    /// Add risk for existing asset, threat and vulnerability
    pub fn add_risk(
        &mut self,
        asset_id: &str,
        threat_id: &str,
        vulnerability_id: &str,
        likelihood: RiskLevel,
        impact: RiskLevel,
    ) -> IsmsResult<&Risk> {
        if self.asset(asset_id).is_none() {
            return Err(IsmsError::not_found("asset", asset_id));
        }
        if self.threat(threat_id).is_none() {
            return Err(IsmsError::not_found("threat", threat_id));
        }
        match self.vulnerability(vulnerability_id) {
            None => return Err(IsmsError::not_found("vulnerability", vulnerability_id)),
            Some(v) if v.asset_id != asset_id => {
                return Err(IsmsError::InvalidInput(format!(
                    "vulnerability {} belongs to asset {}",
                    vulnerability_id, v.asset_id
                )))
            }
            Some(_) => {}
        }

        let risk = Risk::new(asset_id, threat_id, vulnerability_id, likelihood, impact);
        tracing::info!("Added risk {} ({})", risk.id, risk.risk_level());
        self.risks.push(risk);
        Ok(&self.risks[self.risks.len() - 1])
    }

    pub fn risk(&self, id: &str) -> Option<&Risk> {
        self.risks.iter().find(|r| r.id == id)
    }

    fn risk_mut(&mut self, id: &str) -> IsmsResult<&mut Risk> {
        self.risks
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| IsmsError::not_found("risk", id))
    }

    /// Apply field updates to a risk
    pub fn update_risk(&mut self, id: &str, update: RiskUpdate) -> IsmsResult<&Risk> {
        let risk = self.risk_mut(id)?;
        if let Some(l) = update.likelihood {
            risk.set_likelihood(l);
        }
        if let Some(i) = update.impact {
            risk.set_impact(i);
        }
        if let Some(t) = update.treatment {
            risk.treatment = t;
        }
        if let Some(o) = update.owner {
            risk.owner = o;
        }
        if let Some(d) = update.review_date {
            risk.review_date = Some(d);
        }
        if let Some(s) = update.status {
            risk.status = s;
        }
        if let Some(c) = update.controls {
            risk.controls = c;
        }
        Ok(&*risk)
    }

    pub fn remove_risk(&mut self, id: &str) -> IsmsResult<()> {
        let before = self.risks.len();
        self.risks.retain(|r| r.id != id);
        if self.risks.len() == before {
            return Err(IsmsError::not_found("risk", id));
        }
        Ok(())
    }

    /// Counts per risk level
    pub fn summary(&self) -> RiskSummary {
        RiskSummary::from_risks(&self.risks)
    }

    /// Referential checks: every vulnerability and risk points at existing
    /// entities
    pub fn dangling_references(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for v in &self.vulnerabilities {
            if self.asset(&v.asset_id).is_none() {
                problems.push(format!("vulnerability {} -> missing asset {}", v.id, v.asset_id));
            }
        }
        for r in &self.risks {
            if self.asset(&r.asset_id).is_none() {
                problems.push(format!("risk {} -> missing asset {}", r.id, r.asset_id));
            }
            if self.threat(&r.threat_id).is_none() {
                problems.push(format!("risk {} -> missing threat {}", r.id, r.threat_id));
            }
            if self.vulnerability(&r.vulnerability_id).is_none() {
                problems.push(format!("risk {} -> missing vulnerability {}", r.id, r.vulnerability_id));
            }
        }
        problems
    }
}

/// Partial risk update
#[derive(Debug, Clone, Default)]
pub struct RiskUpdate {
    pub likelihood: Option<RiskLevel>,
    pub impact: Option<RiskLevel>,
    pub treatment: Option<RiskTreatment>,
    pub owner: Option<String>,
    pub review_date: Option<NaiveDate>,
    pub status: Option<RiskStatus>,
    pub controls: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{predefined_asset, AssetType};
    use RiskLevel::*;

    fn seeded() -> (RiskAssessment, String, String, String) {
        let mut ra = RiskAssessment::default();
        let asset = ra.add_asset(Asset::new("Servers", AssetType::Physical)).id.clone();
        let threat = ra.add_threat(Threat::new("Power outage", "", "Environmental")).id.clone();
        let vuln = ra
            .add_vulnerability(Vulnerability::new(&asset, "No UPS", ""))
            .unwrap()
            .id
            .clone();
        (ra, asset, threat, vuln)
    }

    #[test]
    fn test_add_asset_is_idempotent_by_name() {
        let mut ra = RiskAssessment::default();
        let db = predefined_asset("Customer Database").unwrap();
        ra.add_asset(db.to_asset());
        ra.add_asset(db.to_asset());
        assert_eq!(ra.assets.len(), 1);
        assert!(ra.find_asset("customer database").is_some());
    }

    #[test]
    fn test_add_risk_derives_level() {
        let (mut ra, a, t, v) = seeded();
        let risk = ra.add_risk(&a, &t, &v, High, VeryHigh).unwrap();
        assert_eq!(risk.risk_level(), VeryHigh);
        assert_eq!(risk.status, RiskStatus::Open);
    }

    #[test]
    fn test_add_risk_rejects_unknown_references() {
        let (mut ra, a, t, _) = seeded();
        let err = ra.add_risk(&a, &t, "vuln-missing", Low, Low).unwrap_err();
        assert!(matches!(err, IsmsError::NotFound { kind: "vulnerability", .. }));

        let other = ra.add_asset(Asset::new("Laptops", AssetType::Physical)).id.clone();
        let foreign = ra
            .add_vulnerability(Vulnerability::new(&other, "No disk encryption", ""))
            .unwrap()
            .id
            .clone();
        assert!(matches!(
            ra.add_risk(&a, &t, &foreign, Low, Low),
            Err(IsmsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_remove_asset_cascades() {
        let (mut ra, a, t, v) = seeded();
        ra.add_risk(&a, &t, &v, Medium, Medium).unwrap();
        let keep = ra.add_asset(Asset::new("Laptops", AssetType::Physical)).id.clone();
        let keep_vuln = ra
            .add_vulnerability(Vulnerability::new(&keep, "No disk encryption", ""))
            .unwrap()
            .id
            .clone();
        ra.add_risk(&keep, &t, &keep_vuln, Low, Low).unwrap();

        let removed = ra.remove_asset(&a).unwrap();
        assert_eq!(removed, Removed { assets: 1, vulnerabilities: 1, risks: 1, threats: 0 });
        assert_eq!(ra.risks.len(), 1);
        assert_eq!(ra.risks[0].asset_id, keep);
        assert_eq!(ra.threats.len(), 1);
        assert!(ra.dangling_references().is_empty());

        assert!(ra.remove_asset(&a).is_err());
    }

    #[test]
    fn test_remove_threat_unlinks_vulnerabilities() {
        let (mut ra, a, t, _) = seeded();
        let mut linked = Vulnerability::new(&a, "Single feed", "");
        linked.threat_ids.push(t.clone());
        let linked = ra.add_vulnerability(linked).unwrap().id.clone();
        ra.add_risk(&a, &t, &linked, Low, Low).unwrap();

        let removed = ra.remove_threat(&t).unwrap();
        assert_eq!(removed.risks, 1);
        assert!(ra.vulnerability(&linked).unwrap().threat_ids.is_empty());
    }

    #[test]
    fn test_update_risk_recomputes_level() {
        let (mut ra, a, t, v) = seeded();
        let id = ra.add_risk(&a, &t, &v, VeryLow, VeryLow).unwrap().id.clone();

        let update = RiskUpdate {
            likelihood: Some(VeryHigh),
            impact: Some(High),
            owner: Some("Facilities".into()),
            ..RiskUpdate::default()
        };
        let risk = ra.update_risk(&id, update).unwrap();
        assert_eq!(risk.risk_level(), VeryHigh);
        assert_eq!(risk.owner, "Facilities");
    }

    #[test]
    fn test_apply_suggestions_adds_catalog_entries_once() {
        let mut ra = RiskAssessment::default();
        let id = ra.add_asset(predefined_asset("Laptops").unwrap().to_asset()).id.clone();

        let first = ra.apply_suggestions(&id).unwrap();
        assert!(first > 0);
        assert_eq!(ra.apply_suggestions(&id).unwrap(), 0);
        assert_eq!(ra.threats.len(), 2);
        assert!(ra.vulnerabilities_of(&id).len() >= 3);
    }

    #[test]
    fn test_save_and_load() {
        let store = IsmsStore::in_memory();
        let (mut ra, a, t, v) = seeded();
        ra.add_risk(&a, &t, &v, High, High).unwrap();
        ra.save(&store).unwrap();

        assert_eq!(RiskAssessment::load(&store), ra);

        store.write_raw(keys::RISK_ASSESSMENT, "{broken").unwrap();
        assert_eq!(RiskAssessment::load(&store), RiskAssessment::default());
    }
}
