//! Snapshot commands

use super::Context;
use crate::output;
use crate::SnapshotCommands;
use anyhow::{anyhow, Result};
use isms_common::AutoSaveRecord;
use isms_compliance::{RiskAssessment, Snapshots};
use tabled::Tabled;

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Saved")]
    saved_at: String,
    #[tabled(rename = "Assets")]
    assets: usize,
    #[tabled(rename = "Risks")]
    risks: usize,
}

pub fn handle(action: SnapshotCommands, ctx: &Context) -> Result<()> {
    match action {
        SnapshotCommands::Save { name } => {
            let ra = RiskAssessment::load(&ctx.store);
            let saved = Snapshots::save_as(&ctx.store, &name, &ra)?;
            output::ok(format!("Saved snapshot '{}' ({})", saved.name, saved.id));
        }
        SnapshotCommands::Load { snapshot } => {
            let ra = Snapshots::restore(&ctx.store, &snapshot)?;
            output::ok(format!(
                "Restored '{}': {} assets, {} risks",
                snapshot,
                ra.assets.len(),
                ra.risks.len()
            ));
        }
        SnapshotCommands::List => {
            let index = Snapshots::load(&ctx.store);
            let list = index.list();
            let rows = list.iter().map(|s| SnapshotRow {
                id: s.id.clone(),
                name: s.name.clone(),
                saved_at: s.saved_at.format("%Y-%m-%d %H:%M").to_string(),
                assets: s.data.assets.len(),
                risks: s.data.risks.len(),
            });
            ctx.format.print(&list, rows)?;
        }
        SnapshotCommands::Delete { snapshot } => {
            let removed = Snapshots::delete(&ctx.store, &snapshot)?;
            output::ok(format!("Deleted snapshot '{}'", removed.name));
        }
        SnapshotCommands::Recover => {
            let record = AutoSaveRecord::latest(&ctx.store).ok_or_else(|| anyhow!("No auto-saved data"))?;
            ctx.store.write(&record.key, &record.data)?;
            output::ok(format!(
                "Recovered {} from auto-save of {}",
                record.key,
                record.saved_at.format("%Y-%m-%d %H:%M")
            ));
        }
    }
    Ok(())
}
