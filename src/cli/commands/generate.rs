//! Implementation of the `testforge generate` command.

use anyhow::{bail, Context, Result};
use clap::Args;
use console::style;
use comfy_table::Cell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::load_config;
use crate::cli::output::{list_table, output, render_list, truncate, CommandOutput};
use crate::cli::progress::TerminalProgress;
use crate::domain::models::{BulkReport, BulkStatus, Config, CutOutcome, CutReport};
use crate::domain::ports::{CodeGenerationOracle, CompileService, FileStoreProvider};
use crate::infrastructure::compiler::{ProcessCompiler, ProcessTestRunner};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::fs::LocalFileStoreProvider;
use crate::infrastructure::oracle::GeminiOracleClient;
use crate::infrastructure::source_index::{discover_cuts, FsSourceIndex};
use crate::services::{
    AggregationSynthesizer, CutPipeline, GenerationScheduler, ScenarioExtractor,
    ScenarioSynthesizer, SynthesisLimits,
};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Source files, directories or dotted package names
    #[arg(required = true, num_args = 1..)]
    pub targets: Vec<String>,

    /// Destination root for generated tests (overrides project.test_root)
    #[arg(short, long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Oracle generations allowed per scenario
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Concurrent oracle calls per round
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Execute the final test class after it compiles
    #[arg(long)]
    pub run_tests: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct GenerateOutput {
    pub report: BulkReport,
}

fn outcome_label(outcome: &CutOutcome) -> String {
    match outcome {
        CutOutcome::Generated => style("generated").green().to_string(),
        CutOutcome::BestEffort => style("best effort").yellow().to_string(),
        CutOutcome::Canceled => style("canceled").dim().to_string(),
        CutOutcome::Failed { kind, .. } => style(kind).red().to_string(),
    }
}

fn row(cut: &CutReport) -> Vec<Cell> {
    let detail = match &cut.outcome {
        CutOutcome::Failed { message, .. } => truncate(message, 60),
        _ => cut.final_artifact.clone().unwrap_or_default(),
    };
    vec![
        Cell::new(&cut.cut),
        Cell::new(outcome_label(&cut.outcome)),
        Cell::new(format!("{}/{}", cut.completed, cut.scenarios)),
        Cell::new(cut.abandoned),
        Cell::new(detail),
    ]
}

impl CommandOutput for GenerateOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["class", "outcome", "scenarios", "abandoned", "artifact"]);
        for cut in &self.report.cuts {
            table.add_row(row(cut));
        }

        let mut lines = vec![render_list("class", "classes", &table, self.report.cuts.len())];
        let summary = format!(
            "Generated tests for {} of {} classes",
            self.report.generated(),
            self.report.total
        );
        lines.push(String::new());
        match self.report.status {
            BulkStatus::Completed => lines.push(style(summary).bold().to_string()),
            BulkStatus::Canceled => lines.push(format!(
                "{} after {} of {} classes",
                style("Canceled").yellow().bold(),
                self.report.processed(),
                self.report.total
            )),
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.report).unwrap_or_default()
    }
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(config: &mut Config, args: &GenerateArgs) -> Result<()> {
    if let Some(dest) = &args.dest {
        config.project.test_root.clone_from(dest);
    }
    if let Some(max_attempts) = args.max_attempts {
        config.pipeline.max_attempts = max_attempts;
    }
    if let Some(concurrency) = args.concurrency {
        config.pipeline.max_concurrency = concurrency;
    }
    if args.run_tests {
        config.pipeline.run_tests = true;
    }
    ConfigLoader::validate(config).context("Invalid option")?;
    Ok(())
}

/// Refuse to start without the settings a run cannot do without.
pub fn ensure_configured(config: &Config) -> Result<()> {
    let mut missing = Vec::new();
    if config.oracle.resolved_api_key().is_none() {
        missing.push("oracle API key");
    }
    if config.oracle.model.trim().is_empty() {
        missing.push("oracle model");
    }
    if config.project.test_root.as_os_str().is_empty() {
        missing.push("destination directory");
    }
    if !missing.is_empty() {
        bail!(
            "please configure details in settings (missing: {})",
            missing.join(", ")
        );
    }
    Ok(())
}

/// Wire the per-CUT pipeline from configuration around a given oracle.
pub fn build_pipeline(config: &Config, oracle: Arc<dyn CodeGenerationOracle>) -> CutPipeline {
    let process_compiler = ProcessCompiler::new(config.compiler.clone());
    let classpath = process_compiler.classpath();
    let compiler: Arc<dyn CompileService> = Arc::new(process_compiler);

    let mut aggregator = AggregationSynthesizer::new(
        oracle.clone(),
        compiler.clone(),
        config.pipeline.aggregation_max_attempts,
    );
    if config.pipeline.run_tests {
        aggregator = aggregator.with_test_runner(Arc::new(ProcessTestRunner::new(
            config.test_runner.clone(),
            classpath,
        )));
    }

    CutPipeline::new(
        ScenarioExtractor::new(oracle.clone()),
        ScenarioSynthesizer::new(
            oracle,
            compiler,
            Arc::new(FsSourceIndex::new(config.project.source_roots.clone())),
            SynthesisLimits {
                max_attempts: config.pipeline.max_attempts,
                max_concurrency: config.pipeline.max_concurrency,
            },
        ),
        aggregator,
        config.pipeline.clone(),
    )
}

pub async fn execute(args: GenerateArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let mut config = load_config(config_path).context("Failed to load configuration")?;
    apply_overrides(&mut config, &args)?;
    ensure_configured(&config)?;

    let prompts = ConfigLoader::prompt_library(&config.prompts)?;
    let oracle: Arc<dyn CodeGenerationOracle> = Arc::new(
        GeminiOracleClient::new(&config.oracle, prompts).context("Failed to create oracle client")?,
    );

    let cuts = discover_cuts(&args.targets, &config.project.source_roots)
        .await
        .context("Failed to collect classes under test")?;
    if cuts.is_empty() {
        bail!("No classes under test found for {}", args.targets.join(", "));
    }
    info!(classes = cuts.len(), dest = %config.project.test_root.display(), "Classes collected");

    let stores: Arc<dyn FileStoreProvider> =
        Arc::new(LocalFileStoreProvider::new(config.project.test_root.clone()));
    let scheduler = Arc::new(GenerationScheduler::new(
        Arc::new(build_pipeline(&config, oracle)),
        stores,
    ));

    let progress = Arc::new(if json_mode {
        TerminalProgress::hidden()
    } else {
        TerminalProgress::new()
    });

    let signal_progress = progress.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            signal_progress.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    let job_progress = progress.clone();
    let job = tokio::spawn(async move { scheduler.run(&cuts, job_progress.as_ref()).await });
    let report = job.await.context("Test generation task failed")?;
    signal_task.abort();

    if report.status == BulkStatus::Canceled {
        progress.abandon("Canceled");
    }

    output(&GenerateOutput { report }, json_mode);
    Ok(())
}
