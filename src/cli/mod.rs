//! Command-line interface
//!
//! Drives the full wizard headlessly: dataset inspection, an interactive
//! training run with live epoch output, and artifact/code export.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::dataset::{DataSource, Dataset, PresetDataset};
use crate::error::FinsightError;
use crate::export;
use crate::training::{TaskKind, TrainerConfig};
use crate::workflow::{StepObserver, TrainingController, TrainingState, WorkflowContext};

/// Rows generated for preset datasets
const PRESET_ROWS: usize = 1_000;
/// Seed for preset generation
const PRESET_SEED: u64 = 42;

#[derive(Parser)]
#[command(name = "finsight")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Guided tabular-ML training engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show dataset statistics
    Info {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Target column for class-balance statistics
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Train a classifier with live progress
    Train {
        /// Input CSV file (mutually exclusive with --preset)
        #[arg(short, long, conflicts_with = "preset")]
        data: Option<PathBuf>,

        /// Bundled demo dataset
        #[arg(long)]
        preset: Option<PresetDataset>,

        /// Target column name (defaults to the preset's target)
        #[arg(short, long)]
        target: Option<String>,

        /// Prediction task
        #[arg(long, value_enum, default_value_t = TaskKind::CreditRisk)]
        task: TaskKind,

        /// Maximum training epochs
        #[arg(long, default_value = "30")]
        max_epochs: usize,

        /// Output model artifact (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate standalone training source for a run
    ExportCode {
        /// Input CSV file the generated program will load
        #[arg(short, long)]
        data: PathBuf,

        /// Target column name
        #[arg(short, long)]
        target: String,

        /// Prediction task
        #[arg(long, value_enum, default_value_t = TaskKind::CreditRisk)]
        task: TaskKind,

        /// Output .rs file
        #[arg(short, long)]
        output: PathBuf,
    },
}

struct LoggingObserver;

impl StepObserver for LoggingObserver {
    fn on_step_completed(&self, step: &str) {
        tracing::info!(step, "workflow step completed");
    }
}

pub fn cmd_info(data: &PathBuf, target: Option<&str>) -> anyhow::Result<()> {
    let dataset = Dataset::from_csv(data)?;
    let summary = dataset.summary(target)?;

    println!("rows:                {}", summary.n_rows);
    println!("rows dropped (null): {}", summary.rows_dropped);
    println!("categorical columns: {}", summary.n_categorical);
    for name in dataset.column_names() {
        println!("  {:<24} {:?}", name, dataset.column_kind(&name)?);
    }
    if let Some(ratio) = summary.class_ratio {
        println!("class ratio:         {:.3}", ratio);
        if summary.imbalanced {
            println!("dataset is imbalanced; fraud_detection runs will oversample");
        }
    }
    Ok(())
}

pub fn cmd_train(
    data: Option<&PathBuf>,
    preset: Option<PresetDataset>,
    target: Option<&str>,
    task: TaskKind,
    max_epochs: usize,
    output: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let (dataset, source, task, target) = match (data, preset) {
        (Some(path), None) => {
            let target = target.ok_or_else(|| {
                FinsightError::Configuration("--target is required with --data".to_string())
            })?;
            (
                Dataset::from_csv(path)?,
                Some(DataSource::Csv(path.clone())),
                task,
                target.to_string(),
            )
        }
        (None, Some(preset)) => (
            Dataset::from_preset(preset, PRESET_ROWS, PRESET_SEED)?,
            Some(DataSource::Preset(preset)),
            preset.task_kind(),
            target
                .map(|t| t.to_string())
                .unwrap_or_else(|| preset.target_column().to_string()),
        ),
        _ => {
            return Err(
                FinsightError::Configuration("pass either --data or --preset".to_string()).into(),
            )
        }
    };

    let mut ctx = WorkflowContext::new(task);
    ctx.set_dataset(dataset, source);
    ctx.select_target(&target)?;

    let config = TrainerConfig {
        max_epochs,
        ..Default::default()
    };
    let tick = config.epoch_delay;
    let mut controller =
        TrainingController::new(config).with_step_observer(Box::new(LoggingObserver));

    controller.start(&ctx)?;

    // Consumer-owned ticker: drain the channel on a fixed cadence
    loop {
        for epoch in controller.poll() {
            println!(
                "epoch {:>2}  loss {:.4}  acc {:.4}  val_loss {:.4}  val_acc {:.4}",
                epoch.epoch, epoch.loss, epoch.accuracy, epoch.val_loss, epoch.val_accuracy
            );
        }
        if !controller.is_running() {
            break;
        }
        std::thread::sleep(tick);
    }

    match controller.state() {
        TrainingState::Completed => {
            if let Some(metrics) = controller.final_metrics() {
                println!("precision {:.4}", metrics.precision);
                println!("recall    {:.4}", metrics.recall);
                println!("f1        {:.4}", metrics.f1);
                println!("roc_auc   {:.4}", metrics.roc_auc);
            }

            if let (Some(path), Some(model)) = (output, controller.model()) {
                let artifact = export::ModelArtifact::new(model.clone(), task, &target);
                export::save_model(&artifact, path)?;
                println!("model written to {}", path.display());
            }
        }
        TrainingState::Failed(reason) => {
            return Err(FinsightError::Training(reason.clone()).into());
        }
        state => println!("training ended in state {:?}", state),
    }

    Ok(())
}

pub fn cmd_export_code(
    data: &PathBuf,
    target: &str,
    task: TaskKind,
    output: &PathBuf,
) -> anyhow::Result<()> {
    let code = export::generate_training_code(&data.display().to_string(), target, task);
    std::fs::write(output, code)?;
    println!("training source written to {}", output.display());
    Ok(())
}
