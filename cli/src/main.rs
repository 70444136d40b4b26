//! ISMS CLI
//!
//! Command-line front end for the ISO 27001:2022 ISMS toolkit. All records
//! live in one JSON data file.
//!
//! # Usage
//!
//! ```bash
//! isms scope set-org --name "Acme" --industry "Retail"
//! isms assets add "Customer Database" --suggest
//! isms risks add --asset "Customer Database" --threat "Data breach" \
//!     --vulnerability "Weak access control" --likelihood high --impact very-high
//! isms treatments set <risk-id> --controls A.5.15,A.8.5
//! isms soa set A.8.5 --responsible "IT" --justification "MFA rollout"
//! isms dashboard --format json
//! isms export soa --as csv -o soa.csv
//! ```

use clap::{Parser, Subcommand};
use isms_common::{FileStore, IsmsStore};
use isms_compliance::reporting::{Document, ExportFormat};
use isms_compliance::risk::{RiskLevel, RiskStatus};
use isms_compliance::scope::InterfaceKind;
use isms_compliance::soa::{ApplicabilityStatus, ImplementationStatus};
use isms_compliance::{AssetType, StepId, TreatmentStrategy};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "isms")]
#[command(version)]
#[command(about = "ISO 27001:2022 ISMS Toolkit", long_about = None)]
struct Cli {
    /// Data file holding every ISMS record
    #[arg(long, env = "ISMS_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show completion of every ISMS step
    Dashboard,
    /// Keep the dashboard on screen, refreshing when the data file changes
    Watch {
        /// Poll interval in seconds
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
    /// Define the ISMS scope
    Scope {
        #[command(subcommand)]
        action: ScopeCommands,
    },
    /// Manage information assets
    Assets {
        #[command(subcommand)]
        action: AssetCommands,
    },
    /// Manage threats
    Threats {
        #[command(subcommand)]
        action: ThreatCommands,
    },
    /// Manage vulnerabilities
    Vulns {
        #[command(subcommand)]
        action: VulnCommands,
    },
    /// Manage the risk register
    Risks {
        #[command(subcommand)]
        action: RiskCommands,
    },
    /// Manage risk treatments
    Treatments {
        #[command(subcommand)]
        action: TreatmentCommands,
    },
    /// Manage the Statement of Applicability
    Soa {
        #[command(subcommand)]
        action: SoaCommands,
    },
    /// Manage lifecycle step records
    Step {
        #[command(subcommand)]
        action: StepCommands,
    },
    /// Named copies of the risk assessment
    Snapshots {
        #[command(subcommand)]
        action: SnapshotCommands,
    },
    /// Replace a record from a JSON file
    Import {
        kind: ImportKind,
        file: PathBuf,
    },
    /// Export a report
    Export {
        document: Document,
        /// Report format
        #[arg(long = "as", value_enum, default_value = "markdown")]
        export_format: ExportArg,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ScopeCommands {
    /// Show scope, stage checks and scope statement
    Show,
    /// Set organization details
    SetOrg {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        industry: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Add an internal or external issue
    AddIssue {
        text: String,
        #[arg(long)]
        external: bool,
    },
    /// Add an interested party
    AddParty {
        name: String,
        #[arg(long, default_value = "")]
        requirements: String,
    },
    /// Add an interface
    AddInterface {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "internal")]
        kind: InterfaceKind,
    },
    /// Exclude an item from scope
    AddExclusion {
        item: String,
        #[arg(long)]
        justification: String,
    },
    /// Add a process, department or location to the scope document
    Include {
        #[arg(value_enum)]
        field: commands::scope::ScopeList,
        value: String,
    },
    /// Walk the scope wizard stages and report the first incomplete one
    Validate,
}

#[derive(Subcommand)]
enum AssetCommands {
    /// List assets
    List,
    /// Add an asset (predefined names fill in their defaults)
    Add {
        name: String,
        #[arg(long = "type")]
        asset_type: Option<AssetType>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        /// Also add catalog threats and vulnerabilities
        #[arg(long)]
        suggest: bool,
    },
    /// Remove an asset with its vulnerabilities and risks
    Remove { asset: String },
    /// Add catalog threats and vulnerabilities for an asset
    Suggest { asset: String },
    /// List predefined assets
    Catalog,
}

#[derive(Subcommand)]
enum ThreatCommands {
    /// List threats
    List,
    /// Add a threat
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        category: String,
    },
    /// Remove a threat and its risks
    Remove { threat: String },
}

#[derive(Subcommand)]
enum VulnCommands {
    /// List vulnerabilities
    List {
        #[arg(long)]
        asset: Option<String>,
    },
    /// Add a vulnerability to an asset
    Add {
        #[arg(long)]
        asset: String,
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Threats exploiting it (ids or names)
        #[arg(long, value_delimiter = ',')]
        threats: Vec<String>,
    },
    /// Remove a vulnerability and its risks
    Remove { id: String },
}

#[derive(Subcommand)]
enum RiskCommands {
    /// List risks, highest first
    List {
        #[arg(long)]
        level: Option<RiskLevel>,
    },
    /// Add a risk
    Add {
        #[arg(long)]
        asset: String,
        #[arg(long)]
        threat: String,
        #[arg(long)]
        vulnerability: String,
        #[arg(long)]
        likelihood: RiskLevel,
        #[arg(long)]
        impact: RiskLevel,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Update a risk
    Update {
        id: String,
        #[arg(long)]
        likelihood: Option<RiskLevel>,
        #[arg(long)]
        impact: Option<RiskLevel>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        status: Option<RiskStatus>,
        /// Review date (YYYY-MM-DD)
        #[arg(long)]
        review_date: Option<String>,
    },
    /// Remove a risk
    Remove { id: String },
    /// Risk counts per level
    Summary,
}

#[derive(Subcommand)]
enum TreatmentCommands {
    /// List treatments
    List,
    /// Set treatment for a risk
    Set {
        risk: String,
        #[arg(long, default_value = "mitigate")]
        strategy: TreatmentStrategy,
        /// Annex A controls, comma separated
        #[arg(long, value_delimiter = ',')]
        controls: Vec<String>,
    },
    /// Remove treatment of a risk
    Remove { risk: String },
    /// Drop treatments of deleted risks
    Prune,
}

#[derive(Subcommand)]
enum SoaCommands {
    /// Seed the SOA, or reconcile it with treatments
    Init,
    /// List SOA rows
    List {
        #[arg(long)]
        status: Option<ApplicabilityStatus>,
        /// Only rows not yet documented
        #[arg(long)]
        undocumented: bool,
    },
    /// Show one control
    Show { control: String },
    /// Update one control
    Set {
        control: String,
        #[arg(long)]
        status: Option<ApplicabilityStatus>,
        #[arg(long)]
        implementation: Option<ImplementationStatus>,
        #[arg(long)]
        justification: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        responsible: Option<String>,
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        target_date: Option<String>,
        #[arg(long)]
        evidence: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum StepCommands {
    /// Replace a lifecycle record from a JSON or YAML file
    Set { step: StepId, file: PathBuf },
    /// Show a stored lifecycle record and its checklist
    Show { step: StepId },
}

#[derive(Subcommand)]
enum SnapshotCommands {
    /// Save the risk assessment under a name
    Save { name: String },
    /// Restore a snapshot as the current risk assessment
    Load { snapshot: String },
    /// List snapshots
    List,
    /// Delete a snapshot
    Delete { snapshot: String },
    /// Restore the latest auto-saved model
    Recover,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ImportKind {
    Scope,
    RiskAssessment,
    Treatments,
    Soa,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ExportArg {
    Markdown,
    Csv,
}

impl From<ExportArg> for ExportFormat {
    fn from(arg: ExportArg) -> Self {
        match arg {
            ExportArg::Markdown => ExportFormat::Markdown,
            ExportArg::Csv => ExportFormat::Csv,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli { data_file, format, profile, command } = cli;
    let command = match command {
        Commands::Config { action } => return commands::config::handle(action, profile.as_deref()),
        other => other,
    };

    let config = config::Config::load(profile.as_deref())?;
    let format = match format {
        Some(f) => f,
        None => config.default_format()?,
    };
    let data_file = data_file.unwrap_or_else(|| config.data_file());
    let store = IsmsStore::new(Arc::new(FileStore::open(&data_file)?));
    tracing::debug!("Using data file {}", data_file.display());

    let ctx = commands::Context { store, format, config };

    match command {
        Commands::Dashboard => commands::dashboard::show(&ctx),
        Commands::Watch { interval } => commands::dashboard::watch(&ctx, interval).await,
        Commands::Scope { action } => commands::scope::handle(action, &ctx),
        Commands::Assets { action } => commands::assets::handle_assets(action, &ctx),
        Commands::Threats { action } => commands::assets::handle_threats(action, &ctx),
        Commands::Vulns { action } => commands::assets::handle_vulns(action, &ctx),
        Commands::Risks { action } => commands::risks::handle(action, &ctx),
        Commands::Treatments { action } => commands::treatments::handle(action, &ctx),
        Commands::Soa { action } => commands::soa::handle(action, &ctx),
        Commands::Step { action } => commands::steps::handle(action, &ctx),
        Commands::Snapshots { action } => commands::snapshots::handle(action, &ctx),
        Commands::Import { kind, file } => commands::transfer::import(kind, &file, &ctx),
        Commands::Export { document, export_format, output } => {
            commands::transfer::export(document, export_format.into(), output.as_deref(), &ctx)
        }
        Commands::Config { .. } => Ok(()),
    }
}
