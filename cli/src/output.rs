//! Output formatting

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use isms_compliance::{RiskLevel, StepStatus};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Print `data` as JSON/YAML, or `rows` as a table
    pub fn print<T, R>(&self, data: &T, rows: impl IntoIterator<Item = R>) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
        R: Tabled,
    {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
            OutputFormat::Table => {
                let mut table = Table::new(rows);
                table.with(Style::rounded());
                println!("{}", table);
            }
        }
        Ok(())
    }

    /// Print a serializable value; tables fall back to pretty JSON
    pub fn print_value<T: Serialize + ?Sized>(&self, data: &T) -> anyhow::Result<()> {
        match self {
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
            OutputFormat::Json | OutputFormat::Table => println!("{}", serde_json::to_string_pretty(data)?),
        }
        Ok(())
    }

    pub fn is_table(&self) -> bool {
        matches!(self, OutputFormat::Table)
    }
}

pub fn status(status: StepStatus) -> ColoredString {
    match status {
        StepStatus::Completed => status.to_string().green(),
        StepStatus::InProgress => status.to_string().yellow(),
        StepStatus::NotStarted => status.to_string().dimmed(),
    }
}

pub fn level(level: RiskLevel) -> ColoredString {
    match level {
        RiskLevel::VeryHigh => level.to_string().red().bold(),
        RiskLevel::High => level.to_string().red(),
        RiskLevel::Medium => level.to_string().yellow(),
        RiskLevel::Low => level.to_string().green(),
        RiskLevel::VeryLow => level.to_string().dimmed(),
    }
}

/// `[#####.....]` style bar
pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = (percent.min(100) as usize * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

pub fn ok(message: impl std::fmt::Display) {
    println!("{} {}", "✓".green(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 10), "[..........]");
        assert_eq!(progress_bar(50, 10), "[#####.....]");
        assert_eq!(progress_bar(100, 4), "[####]");
        assert_eq!(progress_bar(8, 20), "[##..................]");
    }
}
