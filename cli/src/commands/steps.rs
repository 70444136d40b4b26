//! Lifecycle step record commands

use super::Context;
use crate::output;
use crate::StepCommands;
use anyhow::{bail, Context as _, Result};
use isms_compliance::progress::step_completion;
use isms_compliance::steps::{
    CorrectiveActionsData, ImplementationData, InternalAuditData, ManagementReviewData, MonitoringData,
    ObjectivesData, PolicyData, TrainingData,
};
use isms_compliance::{Checklist, RiskAssessment, ScopeData, StepId, StepRecord};
use serde::Serialize;
use std::path::Path;

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"))
}

/// Parse `text` as one step record and store it, returning its completion
fn store<T: StepRecord>(ctx: &Context, text: &str, yaml: bool) -> Result<u8> {
    let record: T = if yaml {
        serde_yaml::from_str(text).with_context(|| format!("Invalid {} record", T::KEY))?
    } else {
        serde_json::from_str(text).with_context(|| format!("Invalid {} record", T::KEY))?
    };
    record.save(&ctx.store)?;
    Ok(record.completion())
}

fn show<T: Serialize + Checklist>(ctx: &Context, record: &T) -> Result<()> {
    ctx.format.print_value(record)?;
    if ctx.format.is_table() {
        let checks = record.checks();
        let met = checks.iter().filter(|c| **c).count();
        println!("{}/{} checks met, {}% complete", met, checks.len(), record.completion());
    }
    Ok(())
}

pub fn handle(action: StepCommands, ctx: &Context) -> Result<()> {
    match action {
        StepCommands::Set { step, file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Cannot read {}", file.display()))?;
            let yaml = is_yaml(&file);
            let completion = match step {
                StepId::Policy => store::<PolicyData>(ctx, &text, yaml)?,
                StepId::Objectives => store::<ObjectivesData>(ctx, &text, yaml)?,
                StepId::Implementation => store::<ImplementationData>(ctx, &text, yaml)?,
                StepId::Monitoring => store::<MonitoringData>(ctx, &text, yaml)?,
                StepId::Training => store::<TrainingData>(ctx, &text, yaml)?,
                StepId::InternalAudit => store::<InternalAuditData>(ctx, &text, yaml)?,
                StepId::ManagementReview => store::<ManagementReviewData>(ctx, &text, yaml)?,
                StepId::CorrectiveActions => store::<CorrectiveActionsData>(ctx, &text, yaml)?,
                StepId::Scope | StepId::RiskAssessment | StepId::RiskTreatment | StepId::Soa => {
                    bail!("{} has dedicated commands; use `isms import` or `isms {}`", step.title(), command_for(step))
                }
            };
            output::ok(format!("{} saved ({}% complete)", step.title(), completion));
        }
        StepCommands::Show { step } => match step {
            StepId::Scope => show(ctx, &ScopeData::load(&ctx.store))?,
            StepId::RiskAssessment => show(ctx, &RiskAssessment::load(&ctx.store))?,
            StepId::Policy => show(ctx, &PolicyData::load(&ctx.store))?,
            StepId::Objectives => show(ctx, &ObjectivesData::load(&ctx.store))?,
            StepId::Implementation => show(ctx, &ImplementationData::load(&ctx.store))?,
            StepId::Monitoring => show(ctx, &MonitoringData::load(&ctx.store))?,
            StepId::Training => show(ctx, &TrainingData::load(&ctx.store))?,
            StepId::InternalAudit => show(ctx, &InternalAuditData::load(&ctx.store))?,
            StepId::ManagementReview => show(ctx, &ManagementReviewData::load(&ctx.store))?,
            StepId::CorrectiveActions => show(ctx, &CorrectiveActionsData::load(&ctx.store))?,
            StepId::RiskTreatment | StepId::Soa => {
                println!(
                    "{}: {}% complete (see `isms {}`)",
                    step.title(),
                    step_completion(&ctx.store, step),
                    command_for(step)
                );
            }
        },
    }
    Ok(())
}

fn command_for(step: StepId) -> &'static str {
    match step {
        StepId::Scope => "scope",
        StepId::RiskAssessment => "risks",
        StepId::RiskTreatment => "treatments",
        StepId::Soa => "soa",
        _ => "step",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_detection() {
        assert!(is_yaml(Path::new("policy.yaml")));
        assert!(is_yaml(Path::new("dir/review.yml")));
        assert!(!is_yaml(Path::new("policy.json")));
        assert!(!is_yaml(Path::new("policy")));
    }
}
