//! Import and export commands

use super::Context;
use crate::output;
use crate::ImportKind;
use anyhow::{Context as _, Result};
use isms_compliance::import::import_file;
use isms_compliance::reporting::{self, Document, ExportFormat};
use isms_compliance::{ProgressReport, RiskAssessment, ScopeData, StatementOfApplicability, TreatmentPlan};
use std::path::Path;

pub fn import(kind: ImportKind, file: &Path, ctx: &Context) -> Result<()> {
    let summary = match kind {
        ImportKind::Scope => {
            let scope: ScopeData = import_file(&ctx.store, file)?;
            format!("scope of '{}'", scope.organization.name)
        }
        ImportKind::RiskAssessment => {
            let ra: RiskAssessment = import_file(&ctx.store, file)?;
            format!("{} assets and {} risks", ra.assets.len(), ra.risks.len())
        }
        ImportKind::Treatments => {
            let plan: TreatmentPlan = import_file(&ctx.store, file)?;
            format!("{} treatments", plan.treatments.len())
        }
        ImportKind::Soa => {
            let soa: StatementOfApplicability = import_file(&ctx.store, file)?;
            format!("{} SOA rows", soa.controls.len())
        }
    };
    output::ok(format!("Imported {} from {}", summary, file.display()));
    Ok(())
}

/// Render `document`; the SOA is seeded when none is stored yet
fn render(document: Document, format: ExportFormat, ctx: &Context) -> Result<String> {
    Ok(match document {
        Document::RiskRegister => {
            let ra = RiskAssessment::load(&ctx.store);
            let plan = TreatmentPlan::load(&ctx.store);
            match format {
                ExportFormat::Markdown => reporting::risk_register_markdown(&ra, &plan),
                ExportFormat::Csv => reporting::risk_register_csv(&ra, &plan),
            }
        }
        Document::Soa => {
            let soa = StatementOfApplicability::open(&ctx.store)?;
            match format {
                ExportFormat::Markdown => reporting::soa_markdown(&soa),
                ExportFormat::Csv => reporting::soa_csv(&soa),
            }
        }
        Document::Progress => {
            let report = ProgressReport::compute(&ctx.store);
            match format {
                ExportFormat::Markdown => reporting::progress_markdown(&report),
                ExportFormat::Csv => reporting::progress_csv(&report),
            }
        }
    })
}

pub fn export(document: Document, format: ExportFormat, dest: Option<&Path>, ctx: &Context) -> Result<()> {
    let text = render(document, format, ctx)?;
    match dest {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("Cannot write {}", path.display()))?;
            output::ok(format!("Exported to {}", path.display()));
        }
        None => print!("{}", text),
    }
    Ok(())
}
