//! Asset, threat and vulnerability commands

use super::{asset_id, threat_id, Context};
use crate::output;
use crate::{AssetCommands, ThreatCommands, VulnCommands};
use anyhow::{anyhow, Result};
use isms_compliance::assets::{self, Asset, Threat, Vulnerability};
use isms_compliance::{RiskAssessment, TreatmentPlan};
use tabled::Tabled;

#[derive(Tabled)]
struct AssetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    asset_type: String,
    #[tabled(rename = "Classification")]
    classification: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Vulns")]
    vulnerabilities: usize,
}

#[derive(Tabled)]
struct ThreatRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
}

#[derive(Tabled)]
struct VulnRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Threats")]
    threats: String,
}

/// Save after a cascading removal, dropping treatments of removed risks
fn save_pruned(ra: &RiskAssessment, ctx: &Context) -> Result<()> {
    ra.save(&ctx.store)?;
    let mut plan = TreatmentPlan::load(&ctx.store);
    if plan.prune(ra) > 0 {
        plan.save(&ctx.store)?;
    }
    Ok(())
}

pub fn handle_assets(action: AssetCommands, ctx: &Context) -> Result<()> {
    let mut ra = RiskAssessment::load(&ctx.store);

    match action {
        AssetCommands::List => {
            let rows = ra.assets.iter().map(|a| AssetRow {
                id: a.id.clone(),
                name: a.name.clone(),
                asset_type: format!("{:?}", a.asset_type),
                classification: format!("{:?}", a.classification),
                value: format!("{:?}", a.value),
                owner: a.owner.clone(),
                vulnerabilities: ra.vulnerabilities_of(&a.id).len(),
            });
            return ctx.format.print(&ra.assets, rows);
        }
        AssetCommands::Catalog => {
            let catalog: Vec<Asset> = assets::PREDEFINED_ASSETS.iter().map(|p| p.to_asset()).collect();
            let rows = catalog.iter().map(|a| AssetRow {
                id: a.id.clone(),
                name: a.name.clone(),
                asset_type: format!("{:?}", a.asset_type),
                classification: format!("{:?}", a.classification),
                value: format!("{:?}", a.value),
                owner: String::new(),
                vulnerabilities: 0,
            });
            return ctx.format.print(&catalog, rows);
        }
        AssetCommands::Add { name, asset_type, description, owner, suggest } => {
            let mut asset = match (assets::predefined_asset(&name), asset_type) {
                (Some(p), None) => p.to_asset(),
                (_, t) => Asset::new(&name, t.unwrap_or_default()),
            };
            if let Some(d) = description {
                asset.description = d;
            }
            if let Some(o) = owner {
                asset.owner = o;
            }
            let id = asset.id.clone();
            let existed = ra.asset(&id).is_some();
            ra.add_asset(asset);
            let suggested = if suggest { ra.apply_suggestions(&id)? } else { 0 };
            ra.save(&ctx.store)?;

            if existed {
                println!("Asset {} already present", id);
            } else {
                output::ok(format!("Added asset {} ({})", name, id));
            }
            if suggest {
                println!("Added {} suggested threats and vulnerabilities", suggested);
            }
        }
        AssetCommands::Remove { asset } => {
            let id = asset_id(&ra, &asset)?;
            let removed = ra.remove_asset(&id)?;
            save_pruned(&ra, ctx)?;
            output::ok(format!(
                "Removed asset {} with {} vulnerabilities and {} risks",
                id, removed.vulnerabilities, removed.risks
            ));
        }
        AssetCommands::Suggest { asset } => {
            let id = asset_id(&ra, &asset)?;
            let added = ra.apply_suggestions(&id)?;
            ra.save(&ctx.store)?;
            output::ok(format!("Added {} suggested threats and vulnerabilities", added));
        }
    }
    Ok(())
}

pub fn handle_threats(action: ThreatCommands, ctx: &Context) -> Result<()> {
    let mut ra = RiskAssessment::load(&ctx.store);

    match action {
        ThreatCommands::List => {
            let rows = ra.threats.iter().map(|t| ThreatRow {
                id: t.id.clone(),
                name: t.name.clone(),
                category: t.category.clone(),
            });
            return ctx.format.print(&ra.threats, rows);
        }
        ThreatCommands::Add { name, description, category } => {
            let id = ra.add_threat(Threat::new(&name, &description, &category)).id.clone();
            ra.save(&ctx.store)?;
            output::ok(format!("Threat {} ({})", name, id));
        }
        ThreatCommands::Remove { threat } => {
            let id = threat_id(&ra, &threat)?;
            let removed = ra.remove_threat(&id)?;
            save_pruned(&ra, ctx)?;
            output::ok(format!("Removed threat {} and {} risks", id, removed.risks));
        }
    }
    Ok(())
}

pub fn handle_vulns(action: VulnCommands, ctx: &Context) -> Result<()> {
    let mut ra = RiskAssessment::load(&ctx.store);

    match action {
        VulnCommands::List { asset } => {
            let filter = asset.map(|a| asset_id(&ra, &a)).transpose()?;
            let vulns: Vec<&Vulnerability> = ra
                .vulnerabilities
                .iter()
                .filter(|v| filter.as_deref().map_or(true, |id| v.asset_id == id))
                .collect();
            let rows = vulns.iter().map(|v| VulnRow {
                id: v.id.clone(),
                name: v.name.clone(),
                asset: ra.asset(&v.asset_id).map(|a| a.name.clone()).unwrap_or_else(|| v.asset_id.clone()),
                threats: v
                    .threat_ids
                    .iter()
                    .map(|t| ra.threat(t).map(|t| t.name.as_str()).unwrap_or(t.as_str()))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
            return ctx.format.print(&vulns, rows);
        }
        VulnCommands::Add { asset, name, description, threats } => {
            let asset = asset_id(&ra, &asset)?;
            let mut vuln = Vulnerability::new(&asset, &name, &description);
            for threat in &threats {
                vuln.threat_ids.push(threat_id(&ra, threat)?);
            }
            let id = ra.add_vulnerability(vuln)?.id.clone();
            ra.save(&ctx.store)?;
            output::ok(format!("Vulnerability {} ({})", name, id));
        }
        VulnCommands::Remove { id } => {
            if ra.vulnerability(&id).is_none() {
                return Err(anyhow!("Vulnerability not found: {}", id));
            }
            let removed = ra.remove_vulnerability(&id)?;
            save_pruned(&ra, ctx)?;
            output::ok(format!("Removed vulnerability {} and {} risks", id, removed.risks));
        }
    }
    Ok(())
}
