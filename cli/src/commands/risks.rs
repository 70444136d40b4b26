//! Risk register commands

use super::{asset_id, parse_date, threat_id, vulnerability_id, Context};
use crate::output;
use crate::RiskCommands;
use anyhow::Result;
use colored::Colorize;
use isms_compliance::{Risk, RiskAssessment, RiskUpdate, TreatmentPlan};
use tabled::Tabled;

#[derive(Tabled)]
struct RiskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Threat")]
    threat: String,
    #[tabled(rename = "L")]
    likelihood: u8,
    #[tabled(rename = "I")]
    impact: u8,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Treated")]
    treated: String,
}

fn row(ra: &RiskAssessment, plan: &TreatmentPlan, risk: &Risk) -> RiskRow {
    RiskRow {
        id: risk.id.clone(),
        asset: ra.asset(&risk.asset_id).map_or(risk.asset_id.clone(), |a| a.name.clone()),
        threat: ra.threat(&risk.threat_id).map_or(risk.threat_id.clone(), |t| t.name.clone()),
        likelihood: risk.likelihood().value(),
        impact: risk.impact().value(),
        level: output::level(risk.risk_level()).to_string(),
        owner: risk.owner.clone(),
        treated: match plan.for_risk(&risk.id) {
            Some(t) => t.strategy.to_string(),
            None => "-".into(),
        },
    }
}

pub fn handle(action: RiskCommands, ctx: &Context) -> Result<()> {
    let mut ra = RiskAssessment::load(&ctx.store);

    match action {
        RiskCommands::List { level } => {
            let plan = TreatmentPlan::load(&ctx.store);
            let mut risks: Vec<&Risk> = ra
                .risks
                .iter()
                .filter(|r| level.map_or(true, |l| r.risk_level() == l))
                .collect();
            risks.sort_by(|a, b| b.score().cmp(&a.score()));
            let rows = risks.iter().map(|r| row(&ra, &plan, r));
            return ctx.format.print(&risks, rows);
        }
        RiskCommands::Summary => {
            let summary = ra.summary();
            if !ctx.format.is_table() {
                return ctx.format.print_value(&summary);
            }
            println!("{}", "Risk Summary".bold());
            println!("  Total:     {}", summary.total);
            println!("  Very High: {}", summary.very_high.to_string().red().bold());
            println!("  High:      {}", summary.high.to_string().red());
            println!("  Medium:    {}", summary.medium.to_string().yellow());
            println!("  Low:       {}", summary.low.to_string().green());
            println!("  Very Low:  {}", summary.very_low);
            return Ok(());
        }
        RiskCommands::Add {
            asset,
            threat,
            vulnerability,
            likelihood,
            impact,
            owner,
        } => {
            let asset = asset_id(&ra, &asset)?;
            let threat = threat_id(&ra, &threat)?;
            let vulnerability = vulnerability_id(&ra, &asset, &vulnerability)?;
            let risk = ra.add_risk(&asset, &threat, &vulnerability, likelihood, impact)?;
            let (id, level) = (risk.id.clone(), risk.risk_level());
            if let Some(owner) = owner {
                ra.update_risk(&id, RiskUpdate { owner: Some(owner), ..RiskUpdate::default() })?;
            }
            ra.save(&ctx.store)?;
            output::ok(format!("Added risk {} ({})", id, output::level(level)));
        }
        RiskCommands::Update {
            id,
            likelihood,
            impact,
            owner,
            status,
            review_date,
        } => {
            let update = RiskUpdate {
                likelihood,
                impact,
                owner,
                status,
                review_date: review_date.as_deref().map(parse_date).transpose()?,
                ..RiskUpdate::default()
            };
            let level = ra.update_risk(&id, update)?.risk_level();
            ra.save(&ctx.store)?;
            output::ok(format!("Updated risk {} ({})", id, output::level(level)));
        }
        RiskCommands::Remove { id } => {
            ra.remove_risk(&id)?;
            ra.save(&ctx.store)?;
            let mut plan = TreatmentPlan::load(&ctx.store);
            if plan.remove(&id) > 0 {
                plan.save(&ctx.store)?;
            }
            output::ok(format!("Removed risk {}", id));
        }
    }
    Ok(())
}
