use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ksp_config::KspConfig;
use ksp_types::{Diagnostic, DocumentKey};
use ksp_validate::{Notice, RunSummary, ValidateSettings, ValidationService};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod serve;

#[derive(Parser, Debug)]
#[command(name = "ksp", version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.ksp/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate scripts with the configured compiler and print diagnostics
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print one JSON document instead of text
        #[arg(long)]
        json: bool,
    },
    /// Compile a script, printing the result or writing it to OUTPUT
    Compile {
        input: PathBuf,
        output: Option<PathBuf>,
    },
    /// List the declarations in a script
    Symbols {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Read JSON requests from stdin and write events to stdout
    Serve,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(env_filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<KspConfig> {
    let loaded = match path {
        Some(path) => {
            let loaded = KspConfig::load_from(path)?;
            if loaded.is_none() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            loaded
        }
        None => KspConfig::load()?,
    };
    Ok(loaded.unwrap_or_default())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Check { files, json } => check(&config, &files, json).await,
        Command::Compile { input, output } => {
            compile(&config, &input, output.as_deref()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Symbols { file, json } => {
            symbols(&file, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Serve => {
            serve::run(config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    documents: &'a [RunSummary],
    notices: &'a [Notice],
}

async fn check(config: &KspConfig, files: &[PathBuf], json: bool) -> Result<ExitCode> {
    // Files named on the command line are validated whatever the settings say.
    let settings = ValidateSettings {
        enabled: true,
        ..config.validate_settings()
    };
    let mut service = ValidationService::new(config.compiler_options(), settings);

    let keys: BTreeSet<DocumentKey> = files.iter().map(|f| DocumentKey::from_path(f)).collect();
    let scheduled = keys
        .iter()
        .filter(|key| service.validate(key, Duration::ZERO))
        .count();

    let mut summaries = Vec::with_capacity(scheduled);
    while summaries.len() < scheduled {
        let Some(summary) = service.next_run().await else {
            break;
        };
        summaries.push(summary);
    }
    summaries.sort_by(|a, b| a.document.cmp(&b.document));
    let notices = service.drain_notices();
    let status = service.snapshot().status_string();
    service.shutdown();

    let failed = summaries
        .iter()
        .flat_map(|s| &s.diagnostics)
        .any(|d| d.severity().is_error())
        || notices.iter().any(Notice::is_error);

    if json {
        let output = CheckOutput {
            documents: &summaries,
            notices: &notices,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for summary in &summaries {
            print_diagnostics(&summary.document.to_path(), &summary.diagnostics);
        }
        for notice in &notices {
            eprintln!("{}", notice.message);
        }
        if !status.is_empty() {
            eprintln!("{status}");
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_diagnostics(path: &Path, diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        println!("{}", diag.display_with_path(path));
    }
}

async fn compile(config: &KspConfig, input: &Path, output: Option<&Path>) -> Result<()> {
    let report = ksp_validate::compile(&config.compiler_options(), input, output, &[])
        .await
        .with_context(|| format!("failed to compile {}", input.display()))?;

    for diag in &report.diagnostics {
        eprintln!("{}", diag.display_with_path(input));
    }
    for notice in &report.notices {
        eprintln!("{}", notice.message);
    }
    report
        .check()
        .with_context(|| format!("failed to compile {}", input.display()))?;

    if let Some(text) = &report.text {
        print!("{text}");
    }
    Ok(())
}

fn symbols(file: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let symbols = ksp_syntax::collect(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&symbols)?);
        return Ok(());
    }
    for symbol in &symbols {
        println!(
            "{}:{}\t{}\t{}",
            symbol.line + 1,
            symbol.column + 1,
            symbol.source_name(),
            symbol.description
        );
    }
    Ok(())
}
