//! Scope commands

use super::Context;
use crate::output::{self, OutputFormat};
use crate::ScopeCommands;
use anyhow::Result;
use colored::Colorize;
use isms_compliance::scope::{Exclusion, Interface, InterestedParty};
use isms_compliance::{Checklist, ScopeData, ScopeStage, ScopeWizard};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ScopeList {
    Process,
    Department,
    Location,
}

fn push_unique(list: &mut Vec<String>, value: String) -> bool {
    if list.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
        return false;
    }
    list.push(value);
    true
}

pub fn handle(action: ScopeCommands, ctx: &Context) -> Result<()> {
    let mut scope = ScopeData::load(&ctx.store);

    match action {
        ScopeCommands::Show => return show(&scope, ctx.format),
        ScopeCommands::Validate => return validate(scope),
        ScopeCommands::SetOrg { name, industry, size, description } => {
            let org = &mut scope.organization;
            if let Some(v) = name {
                org.name = v;
            }
            if let Some(v) = industry {
                org.industry = v;
            }
            if let Some(v) = size {
                org.size = v;
            }
            if let Some(v) = description {
                org.description = v;
            }
        }
        ScopeCommands::AddIssue { text, external } => {
            let list = if external { &mut scope.external_issues } else { &mut scope.internal_issues };
            if !push_unique(list, text) {
                println!("Issue already recorded");
                return Ok(());
            }
        }
        ScopeCommands::AddParty { name, requirements } => {
            scope.interested_parties.retain(|p| !p.name.eq_ignore_ascii_case(&name));
            scope.interested_parties.push(InterestedParty { name, requirements });
        }
        ScopeCommands::AddInterface { name, description, kind } => {
            scope.interfaces.retain(|i| !i.name.eq_ignore_ascii_case(&name));
            scope.interfaces.push(Interface { name, description, kind });
        }
        ScopeCommands::AddExclusion { item, justification } => {
            scope.exclusions.retain(|e| !e.item.eq_ignore_ascii_case(&item));
            scope.exclusions.push(Exclusion { item, justification });
        }
        ScopeCommands::Include { field, value } => {
            let doc = &mut scope.scope_document;
            let list = match field {
                ScopeList::Process => &mut doc.processes,
                ScopeList::Department => &mut doc.departments,
                ScopeList::Location => &mut doc.locations,
            };
            push_unique(list, value);
        }
    }

    scope.save(&ctx.store)?;
    output::ok(format!("Scope saved ({}% complete)", scope.completion()));
    Ok(())
}

fn show(scope: &ScopeData, format: OutputFormat) -> Result<()> {
    if !format.is_table() {
        return format.print_value(scope);
    }

    let org = &scope.organization;
    println!("{}", "Organization".bold());
    println!("  Name:     {}", org.name);
    println!("  Industry: {}", org.industry);
    println!("  Size:     {}", org.size);
    println!();
    println!("{}", "Stages".bold());
    for stage in ScopeStage::ALL {
        let missing = stage.missing_fields(scope);
        if missing.is_empty() {
            println!("  {} {}", "✓".green(), stage);
        } else {
            println!("  {} {} (missing {})", "✗".red(), stage, missing.join(", "));
        }
    }
    println!();
    println!("{}", "Statement".bold());
    println!("  {}", scope.statement());
    println!();
    println!("Completion: {}%", scope.completion());
    Ok(())
}

fn validate(scope: ScopeData) -> Result<()> {
    let mut wizard = ScopeWizard::new(scope);
    loop {
        let stage = wizard.stage();
        wizard.advance()?;
        output::ok(stage);
        if stage == ScopeStage::ScopeDocument {
            break;
        }
    }
    println!("Scope is complete.");
    Ok(())
}
