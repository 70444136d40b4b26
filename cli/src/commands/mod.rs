//! CLI Commands

pub mod assets;
pub mod config;
pub mod dashboard;
pub mod risks;
pub mod scope;
pub mod snapshots;
pub mod soa;
pub mod steps;
pub mod transfer;
pub mod treatments;

use crate::config::Config;
use crate::output::OutputFormat;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use isms_common::IsmsStore;
use isms_compliance::RiskAssessment;

/// Shared state for a command run
pub struct Context {
    pub store: IsmsStore,
    pub format: OutputFormat,
    pub config: Config,
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    isms_compliance::parse_date(s).map_err(|e| anyhow!(e))
}

/// Resolve an asset id or name
pub(crate) fn asset_id(ra: &RiskAssessment, asset: &str) -> Result<String> {
    ra.find_asset(asset)
        .map(|a| a.id.clone())
        .ok_or_else(|| anyhow!("Asset not found: {}", asset))
}

/// Resolve a threat id or name
pub(crate) fn threat_id(ra: &RiskAssessment, threat: &str) -> Result<String> {
    ra.find_threat(threat)
        .map(|t| t.id.clone())
        .ok_or_else(|| anyhow!("Threat not found: {}", threat))
}

/// Resolve a vulnerability id, or a name scoped to `asset_id`
pub(crate) fn vulnerability_id(ra: &RiskAssessment, asset_id: &str, vuln: &str) -> Result<String> {
    if ra.vulnerability(vuln).is_some() {
        return Ok(vuln.to_string());
    }
    ra.vulnerabilities_of(asset_id)
        .into_iter()
        .find(|v| v.name.eq_ignore_ascii_case(vuln))
        .map(|v| v.id.clone())
        .ok_or_else(|| anyhow!("Vulnerability not found on asset {}: {}", asset_id, vuln))
}

#[cfg(test)]
mod tests {
    use super::*;
    use isms_compliance::assets::{Asset, AssetType, Vulnerability};

    #[test]
    fn test_resolves_names_and_ids() {
        let mut ra = RiskAssessment::default();
        let a = ra.add_asset(Asset::new("Laptops", AssetType::Physical)).id.clone();
        let v = ra.add_vulnerability(Vulnerability::new(&a, "No disk encryption", "")).unwrap().id.clone();

        assert_eq!(asset_id(&ra, "laptops").unwrap(), a);
        assert_eq!(asset_id(&ra, &a).unwrap(), a);
        assert_eq!(vulnerability_id(&ra, &a, "no disk encryption").unwrap(), v);
        assert!(vulnerability_id(&ra, "asset-other", "No disk encryption").is_err());
        assert!(threat_id(&ra, "Fire").is_err());
    }
}
