//! Statement of Applicability commands

use super::{parse_date, Context};
use crate::output;
use crate::SoaCommands;
use anyhow::{anyhow, Result};
use colored::Colorize;
use isms_compliance::controls;
use isms_compliance::{ControlApplicability, ControlUpdate, StatementOfApplicability};
use tabled::Tabled;

#[derive(Tabled)]
struct SoaRow {
    #[tabled(rename = "Control")]
    control: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Implementation")]
    implementation: String,
    #[tabled(rename = "Responsible")]
    responsible: String,
    #[tabled(rename = "Doc")]
    documented: &'static str,
}

impl From<&ControlApplicability> for SoaRow {
    fn from(c: &ControlApplicability) -> Self {
        Self {
            control: c.control_id.clone(),
            name: controls::find(&c.control_id).map_or("", |a| a.name).to_string(),
            status: c.status.to_string(),
            implementation: c.implementation_status.to_string(),
            responsible: c.responsible_party.clone(),
            documented: if c.is_documented() { "✓" } else { "" },
        }
    }
}

pub fn handle(action: SoaCommands, ctx: &Context) -> Result<()> {
    let mut soa = StatementOfApplicability::open(&ctx.store)?;

    match action {
        SoaCommands::Init => {
            output::ok(format!(
                "SOA has {} controls, {} documented ({}%)",
                soa.controls.len(),
                soa.documented_count(),
                soa.completion()
            ));
        }
        SoaCommands::List { status, undocumented } => {
            let rows: Vec<&ControlApplicability> = soa
                .controls
                .iter()
                .filter(|c| status.map_or(true, |s| c.status == s))
                .filter(|c| !undocumented || !c.is_documented())
                .collect();
            ctx.format.print(&rows, rows.iter().map(|c| SoaRow::from(*c)))?;
            if ctx.format.is_table() {
                println!("{} of {} controls documented", soa.documented_count(), controls::ANNEX_A_CONTROL_COUNT);
            }
        }
        SoaCommands::Show { control } => {
            let row = soa.get(&control).ok_or_else(|| anyhow!("Control not in SOA: {}", control))?;
            if !ctx.format.is_table() {
                return ctx.format.print_value(row);
            }
            let name = controls::find(&row.control_id).map_or("", |a| a.name);
            println!("{} {}", row.control_id.bold(), name);
            println!("  Status:         {}", row.status);
            println!("  Implementation: {}", row.implementation_status);
            println!("  Justification:  {}", row.justification);
            println!("  Description:    {}", row.implementation_description);
            println!("  Responsible:    {}", row.responsible_party);
            if let Some(d) = row.target_date {
                println!("  Target date:    {}", d);
            }
            for e in &row.evidence {
                println!("  Evidence:       {}", e);
            }
            if !row.notes.is_empty() {
                println!("  Notes:          {}", row.notes);
            }
            let documented = if row.is_documented() { "yes".green() } else { "no".red() };
            println!("  Documented:     {}", documented);
        }
        SoaCommands::Set {
            control,
            status,
            implementation,
            justification,
            description,
            responsible,
            target_date,
            evidence,
            notes,
        } => {
            let update = ControlUpdate {
                status,
                implementation_status: implementation,
                justification,
                implementation_description: description,
                responsible_party: responsible,
                target_date: target_date.as_deref().map(parse_date).transpose()?,
                add_evidence: evidence,
                notes,
            };
            let documented = soa.update(&control, update)?.is_documented();
            soa.save(&ctx.store)?;
            output::ok(format!(
                "Updated {}{} ({}% of controls documented)",
                control,
                if documented { "" } else { " (not yet documented)" },
                soa.completion()
            ));
        }
    }
    Ok(())
}
