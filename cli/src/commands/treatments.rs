//! Risk treatment commands

use super::Context;
use crate::output;
use crate::TreatmentCommands;
use anyhow::Result;
use isms_compliance::{RiskAssessment, Treatment, TreatmentPlan};
use tabled::Tabled;

#[derive(Tabled)]
struct TreatmentRow {
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "Controls")]
    controls: String,
}

pub fn handle(action: TreatmentCommands, ctx: &Context) -> Result<()> {
    let ra = RiskAssessment::load(&ctx.store);
    let mut plan = TreatmentPlan::load(&ctx.store);

    match action {
        TreatmentCommands::List => {
            let rows = plan.treatments.iter().map(|t| TreatmentRow {
                risk: t.risk_id.clone(),
                level: match ra.risk(&t.risk_id) {
                    Some(r) => output::level(r.risk_level()).to_string(),
                    None => "(deleted)".into(),
                },
                strategy: t.strategy.to_string(),
                controls: t.selected_controls.join(", "),
            });
            return ctx.format.print(&plan, rows);
        }
        TreatmentCommands::Set { risk, strategy, controls } => {
            let count = controls.len();
            plan.set(
                &ra,
                Treatment {
                    risk_id: risk.clone(),
                    selected_controls: controls,
                    strategy,
                },
            )?;
            plan.save(&ctx.store)?;
            output::ok(format!("{} {} with {} controls", strategy, risk, count));
        }
        TreatmentCommands::Remove { risk } => {
            let removed = plan.remove(&risk);
            if removed == 0 {
                println!("No treatment recorded for {}", risk);
                return Ok(());
            }
            plan.save(&ctx.store)?;
            output::ok(format!("Removed treatment of {}", risk));
        }
        TreatmentCommands::Prune => {
            let removed = plan.prune(&ra);
            if removed > 0 {
                plan.save(&ctx.store)?;
            }
            output::ok(format!("Pruned {} stale treatments", removed));
        }
    }
    Ok(())
}
