//! propsight: compound property lookup with prediction fallback.
//! Entry point for the command-line binary.

mod config;
mod report;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use propsight_common::sandbox::SandboxClient;
use propsight_common::{EngineKind, InputKind, ResolverConfig};
use propsight_molecules::{
    AdmetServiceClient, Collaborators, DescriptorPredictor, PredictionEngine, PubChemClient,
    ResolutionOrchestrator, ResolutionOutcome, SmilesToolkit,
};

/// Used when `RUST_LOG` is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "propsight=debug,info";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    /// SMILES structure notation
    Smiles,
    /// Common or systematic compound name
    Name,
}

impl From<KindArg> for InputKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Smiles => InputKind::StructureNotation,
            KindArg::Name => InputKind::FreeTextName,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "propsight",
    version,
    about = "Look up compound properties in PubChem, predicting them when the compound is unknown"
)]
struct Cli {
    #[arg(help = "SMILES string or compound name")]
    input: String,

    #[arg(long, value_enum, default_value = "smiles", help = "How to interpret INPUT")]
    kind: KindArg,

    #[arg(long, help = "Print the outcome as JSON")]
    json: bool,

    #[arg(
        long,
        value_name = "PATH",
        help = "Configuration file (default: $PROPSIGHT_CONFIG, then ./propsight.toml)"
    )]
    config: Option<PathBuf>,
}

fn build_orchestrator(config: &ResolverConfig) -> anyhow::Result<ResolutionOrchestrator> {
    let mut http = SandboxClient::with_timeout(config.pubchem.timeout())?;
    http.allow_endpoint(&config.pubchem.base_url)?;
    let pubchem = Arc::new(PubChemClient::new(http, &config.pubchem));

    let predictor: Arc<dyn PredictionEngine> = match config.prediction.engine {
        EngineKind::Local => Arc::new(DescriptorPredictor::new()),
        EngineKind::Service => {
            let mut http = SandboxClient::with_timeout(config.prediction.timeout())?;
            http.allow_endpoint(&config.prediction.service_url)?;
            Arc::new(AdmetServiceClient::new(http, &config.prediction.service_url))
        }
    };
    info!(
        pubchem = %config.pubchem.base_url,
        engine = ?config.prediction.engine,
        "Collaborators wired"
    );

    Ok(ResolutionOrchestrator::new(
        Collaborators {
            toolkit: Arc::new(SmilesToolkit),
            names: pubchem.clone(),
            lookup: pubchem,
            predictor,
        },
        config,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::load(cli.config.as_deref())?;
    let orchestrator = build_orchestrator(&config.resolver)?;

    let outcome = orchestrator.run(&cli.input, cli.kind.into()).await;

    if cli.json || config.output.json {
        println!("{}", report::render_json(&outcome, config.output.pretty)?);
    } else {
        match &outcome {
            ResolutionOutcome::Done(compound) => print!("{}", report::render_text(compound)),
            ResolutionOutcome::Errored { error } => eprintln!("Error: {}", error),
        }
    }

    Ok(if outcome.is_done() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
