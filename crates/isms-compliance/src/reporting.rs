//! Report Export
//!
//! Markdown documents and CSV sheets for the risk register and the SOA.
//! All functions are pure formatting over the in-memory model.

use crate::assessment::RiskAssessment;
use crate::controls;
use crate::progress::ProgressReport;
use crate::soa::StatementOfApplicability;
use crate::treatment::TreatmentPlan;
use serde::{Deserialize, Serialize};

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Csv => "csv",
        }
    }
}

/// Exportable document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Document {
    RiskRegister,
    Soa,
    Progress,
}

impl std::str::FromStr for Document {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "risk-register" | "risks" => Ok(Self::RiskRegister),
            "soa" => Ok(Self::Soa),
            "progress" | "dashboard" => Ok(Self::Progress),
            _ => Err(format!("unknown document '{}' (expected risk-register, soa, progress)", s)),
        }
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(fields: &[&str]) -> String {
    let mut row = fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",");
    row.push('\n');
    row
}

fn md_cell(value: &str) -> String {
    let cell = value.replace('|', "\\|").replace('\n', " ");
    if cell.trim().is_empty() {
        "-".to_string()
    } else {
        cell
    }
}

struct RegisterRow<'a> {
    id: &'a str,
    asset: &'a str,
    threat: &'a str,
    vulnerability: &'a str,
    likelihood: String,
    impact: String,
    level: String,
    score: String,
    strategy: String,
    controls: String,
    owner: &'a str,
    review_date: String,
    status: String,
}

fn register_rows<'a>(assessment: &'a RiskAssessment, plan: &TreatmentPlan) -> Vec<RegisterRow<'a>> {
    let mut risks: Vec<_> = assessment.risks.iter().collect();
    risks.sort_by(|a, b| b.score().cmp(&a.score()).then_with(|| a.id.cmp(&b.id)));

    risks
        .into_iter()
        .map(|r| {
            let treatment = plan.for_risk(&r.id);
            let controls = match treatment {
                Some(t) if !t.selected_controls.is_empty() => t.selected_controls.join(" "),
                _ => r.controls.join(" "),
            };
            RegisterRow {
                id: &r.id,
                asset: assessment.asset(&r.asset_id).map(|a| a.name.as_str()).unwrap_or(&r.asset_id),
                threat: assessment.threat(&r.threat_id).map(|t| t.name.as_str()).unwrap_or(&r.threat_id),
                vulnerability: assessment
                    .vulnerability(&r.vulnerability_id)
                    .map(|v| v.name.as_str())
                    .unwrap_or(&r.vulnerability_id),
                likelihood: r.likelihood().to_string(),
                impact: r.impact().to_string(),
                level: r.risk_level().to_string(),
                score: r.score().to_string(),
                strategy: treatment
                    .map(|t| t.strategy.to_string())
                    .unwrap_or_else(|| r.treatment.to_string()),
                controls,
                owner: &r.owner,
                review_date: r.review_date.map(|d| d.to_string()).unwrap_or_default(),
                status: r.status.to_string(),
            }
        })
        .collect()
}

/// Risk register as CSV, highest score first
pub fn risk_register_csv(assessment: &RiskAssessment, plan: &TreatmentPlan) -> String {
    let mut csv = csv_row(&[
        "risk_id", "asset", "threat", "vulnerability", "likelihood", "impact", "risk_level", "score",
        "strategy", "controls", "owner", "review_date", "status",
    ]);
    for row in register_rows(assessment, plan) {
        csv.push_str(&csv_row(&[
            row.id,
            row.asset,
            row.threat,
            row.vulnerability,
            &row.likelihood,
            &row.impact,
            &row.level,
            &row.score,
            &row.strategy,
            &row.controls,
            row.owner,
            &row.review_date,
            &row.status,
        ]));
    }
    csv
}

/// Risk register as Markdown
pub fn risk_register_markdown(assessment: &RiskAssessment, plan: &TreatmentPlan) -> String {
    let summary = assessment.summary();
    let mut md = String::from("# Risk Register\n\n");
    md.push_str(&format!(
        "{} assets, {} threats, {} vulnerabilities, {} risks\n\n",
        assessment.assets.len(),
        assessment.threats.len(),
        assessment.vulnerabilities.len(),
        summary.total
    ));
    md.push_str("| Level | Count |\n|---|---|\n");
    for (label, count) in [
        ("Very High", summary.very_high),
        ("High", summary.high),
        ("Medium", summary.medium),
        ("Low", summary.low),
        ("Very Low", summary.very_low),
    ] {
        md.push_str(&format!("| {} | {} |\n", label, count));
    }

    md.push_str("\n## Risks\n\n");
    let rows = register_rows(assessment, plan);
    if rows.is_empty() {
        md.push_str("No risks identified.\n");
        return md;
    }
    md.push_str("| Asset | Threat | Vulnerability | Likelihood | Impact | Level | Strategy | Controls | Owner |\n");
    md.push_str("|---|---|---|---|---|---|---|---|---|\n");
    for row in rows {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | **{}** ({}) | {} | {} | {} |\n",
            md_cell(row.asset),
            md_cell(row.threat),
            md_cell(row.vulnerability),
            row.likelihood,
            row.impact,
            row.level,
            row.score,
            row.strategy,
            md_cell(&row.controls),
            md_cell(row.owner),
        ));
    }
    md
}

/// SOA as CSV in catalog order
pub fn soa_csv(soa: &StatementOfApplicability) -> String {
    let mut csv = csv_row(&[
        "control_id",
        "control_name",
        "theme",
        "status",
        "implementation_status",
        "justification",
        "implementation_description",
        "responsible_party",
        "target_date",
        "evidence",
        "notes",
        "documented",
    ]);
    for row in &soa.controls {
        let def = controls::find(&row.control_id);
        csv.push_str(&csv_row(&[
            &row.control_id,
            def.map(|c| c.name).unwrap_or(""),
            &def.map(|c| c.theme.to_string()).unwrap_or_default(),
            &row.status.to_string(),
            &row.implementation_status.to_string(),
            &row.justification,
            &row.implementation_description,
            &row.responsible_party,
            &row.target_date.map(|d| d.to_string()).unwrap_or_default(),
            &row.evidence.join("; "),
            &row.notes,
            if row.is_documented() { "yes" } else { "no" },
        ]));
    }
    csv
}

/// SOA as Markdown, grouped by theme
pub fn soa_markdown(soa: &StatementOfApplicability) -> String {
    let mut md = String::from("# Statement of Applicability\n\n");
    md.push_str(&format!(
        "ISO/IEC 27001:2022 Annex A. {} of {} controls documented ({}%).\n",
        soa.documented_count(),
        controls::ANNEX_A_CONTROL_COUNT,
        soa.completion()
    ));

    let mut current_theme = None;
    for row in &soa.controls {
        let Some(def) = controls::find(&row.control_id) else {
            continue;
        };
        if current_theme != Some(def.theme) {
            current_theme = Some(def.theme);
            md.push_str(&format!("\n## {} controls\n\n", def.theme));
            md.push_str("| Control | Name | Applicability | Implementation | Justification | Responsible |\n");
            md.push_str("|---|---|---|---|---|---|\n");
        }
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            row.control_id,
            def.name,
            row.status,
            row.implementation_status,
            md_cell(&row.justification),
            md_cell(&row.responsible_party),
        ));
    }
    md
}

/// Dashboard summary as Markdown
pub fn progress_markdown(report: &ProgressReport) -> String {
    let mut md = format!("# ISMS Progress\n\nOverall: {}% ({})\n\n", report.overall, report.overall_status());
    md.push_str("| Step | Completion | Status |\n|---|---|---|\n");
    for step in &report.steps {
        md.push_str(&format!("| {} | {}% | {} |\n", step.title, step.completion, step.status));
    }
    md
}

pub fn progress_csv(report: &ProgressReport) -> String {
    let mut csv = csv_row(&["step", "title", "completion", "status"]);
    for step in &report.steps {
        csv.push_str(&csv_row(&[
            step.id.as_str(),
            &step.title,
            &step.completion.to_string(),
            &step.status.to_string(),
        ]));
    }
    csv.push_str(&csv_row(&["overall", "Overall", &report.overall.to_string(), &report.overall_status().to_string()]));
    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Asset, AssetType, Threat, Vulnerability};
    use crate::assessment::RiskUpdate;
    use crate::risk::{RiskLevel, RiskStatus, RiskTreatment};
    use crate::soa::{ApplicabilityStatus, ControlUpdate};
    use crate::treatment::{Treatment, TreatmentStrategy};

    fn sample() -> (RiskAssessment, TreatmentPlan) {
        let mut ra = RiskAssessment::default();
        let a = ra.add_asset(Asset::new("Customer Database", AssetType::Information)).id.clone();
        let t = ra.add_threat(Threat::new("Data breach", "", "")).id.clone();
        let v = ra
            .add_vulnerability(Vulnerability::new(&a, "Weak access control, no MFA", ""))
            .unwrap()
            .id
            .clone();
        ra.add_risk(&a, &t, &v, RiskLevel::Low, RiskLevel::Low).unwrap();
        let high = ra.add_risk(&a, &t, &v, RiskLevel::VeryHigh, RiskLevel::High).unwrap().id.clone();

        let plan = TreatmentPlan {
            treatments: vec![Treatment {
                risk_id: high,
                selected_controls: vec!["A.5.15".into(), "A.8.5".into()],
                strategy: TreatmentStrategy::Mitigate,
            }],
        };
        (ra, plan)
    }

    #[test]
    fn test_register_uses_display_names() {
        let (mut ra, _) = sample();
        let low = ra.risks.iter().find(|r| r.score() == 1).unwrap().id.clone();
        let update = RiskUpdate {
            status: Some(RiskStatus::InProgress),
            treatment: Some(RiskTreatment::Transfer),
            ..RiskUpdate::default()
        };
        ra.update_risk(&low, update).unwrap();

        let csv = risk_register_csv(&ra, &TreatmentPlan::default());
        assert!(csv.contains(",In Progress"));
        assert!(!csv.contains("InProgress"));
        assert!(csv.contains(",Transfer,"));
        assert!(risk_register_markdown(&ra, &TreatmentPlan::default()).contains("| Transfer |"));
    }

    #[test]
    fn test_register_csv_sorted_and_quoted() {
        let (ra, plan) = sample();
        let csv = risk_register_csv(&ra, &plan);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("risk_id,asset,"));
        assert!(lines[1].contains(",Very High,High,Very High,20,Mitigate,"));
        assert!(lines[1].contains("\"Weak access control, no MFA\""));
        assert!(lines[1].contains("A.5.15 A.8.5"));
    }

    #[test]
    fn test_register_markdown() {
        let (ra, plan) = sample();
        let md = risk_register_markdown(&ra, &plan);
        assert!(md.starts_with("# Risk Register"));
        assert!(md.contains("| Very High | 1 |"));
        assert!(md.contains("| Customer Database |"));

        let empty = risk_register_markdown(&RiskAssessment::default(), &TreatmentPlan::default());
        assert!(empty.contains("No risks identified."));
    }

    #[test]
    fn test_soa_exports() {
        let mut soa = StatementOfApplicability::seed(&TreatmentPlan::default());
        soa.update("A.5.7", ControlUpdate {
            status: Some(ApplicabilityStatus::Applicable),
            justification: Some("Threat feeds, \"curated\"".into()),
            responsible_party: Some("Security Team".into()),
            ..ControlUpdate::default()
        })
        .unwrap();

        let csv = soa_csv(&soa);
        assert_eq!(csv.lines().count(), controls::ANNEX_A_CONTROL_COUNT + 1);
        assert!(csv.contains("A.5.7,Threat intelligence,Organizational,Applicable,Not Implemented,\"Threat feeds, \"\"curated\"\"\""));

        let md = soa_markdown(&soa);
        assert!(md.contains("## Organizational controls"));
        assert!(md.contains("## Technological controls"));
        assert!(md.contains("1 of 93 controls documented (1%)"));
    }
}
