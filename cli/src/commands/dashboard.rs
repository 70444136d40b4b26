//! Dashboard commands

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use colored::Colorize;
use isms_common::{keys, AutoSaver};
use isms_compliance::{Dashboard, ProgressReport, RiskAssessment};
use std::time::Duration;

fn render(report: &ProgressReport, format: OutputFormat) -> Result<()> {
    if !format.is_table() {
        return format.print_value(report);
    }

    println!("{}", "ISO 27001:2022 ISMS Progress".bold());
    println!();
    for (i, step) in report.steps.iter().enumerate() {
        println!(
            "{:>2}. {:<30} {} {:>3}%  {}",
            i + 1,
            step.title,
            output::progress_bar(step.completion, 20),
            step.completion,
            output::status(step.status)
        );
    }
    println!();
    println!(
        "Overall: {} {}%  ({}/{} steps completed)",
        output::progress_bar(report.overall, 20),
        report.overall.to_string().bold(),
        report.completed_count(),
        report.steps.len()
    );
    Ok(())
}

pub fn show(ctx: &Context) -> Result<()> {
    render(&ProgressReport::compute(&ctx.store), ctx.format)
}

/// Redraw the dashboard whenever the data file changes. Risk assessment
/// changes seen while watching are auto-saved as a recovery copy.
pub async fn watch(ctx: &Context, interval_secs: u64) -> Result<()> {
    let dashboard = Dashboard::attach(&ctx.store);
    render(&dashboard.report(), ctx.format)?;

    let saver = AutoSaver::new();
    let _backup = {
        let saver = saver.clone();
        let store = ctx.store.clone();
        ctx.store.bus().subscribe(move |event| {
            if event.key == keys::RISK_ASSESSMENT {
                if let Err(e) = saver.mark_dirty(keys::RISK_ASSESSMENT, &RiskAssessment::load(&store)) {
                    tracing::warn!("Cannot stage auto-save: {}", e);
                }
            }
        })
    };
    let autosave = saver.spawn(ctx.store.clone(), ctx.config.autosave_interval());

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    let mut seen = dashboard.recompute_count();
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = ctx.store.sync_external() {
                    tracing::warn!("Reload failed: {}", e);
                    continue;
                }
                let current = dashboard.recompute_count();
                if current != seen {
                    seen = current;
                    println!();
                    render(&dashboard.report(), ctx.format)?;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    autosave.stop();
    saver.flush(&ctx.store)?;
    Ok(())
}
