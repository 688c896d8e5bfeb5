//! Training-code generation
//!
//! Produces standalone Rust source reproducing the training pipeline for
//! the current run, parameterized by the data path, target column and task.

use crate::training::TaskKind;

/// Render a self-contained `main.rs` that reruns the pipeline.
pub fn generate_training_code(file_path: &str, target_column: &str, task_kind: TaskKind) -> String {
    let task_variant = match task_kind {
        TaskKind::CreditRisk => "CreditRisk",
        TaskKind::FraudDetection => "FraudDetection",
    };

    format!(
        r#"//! Generated training pipeline
//!
//! Reproduces the interactive run: loads the dataset, prepares the split,
//! trains the incremental forest to completion and prints holdout metrics.

use finsight::dataset::Dataset;
use finsight::training::{{TaskKind, TrainerConfig}};
use finsight::workflow::{{TrainingController, WorkflowContext}};
use std::time::Duration;

fn main() -> anyhow::Result<()> {{
    let dataset = Dataset::from_csv({file_path:?})?;

    let mut ctx = WorkflowContext::new(TaskKind::{task_variant});
    ctx.set_dataset(dataset, None);
    ctx.select_target({target_column:?})?;

    let config = TrainerConfig::default();
    let tick = config.epoch_delay;
    let mut controller = TrainingController::new(config);
    controller.start(&ctx)?;

    for epoch in controller.wait_until_terminal(tick) {{
        println!(
            "epoch {{:>2}}  loss {{:.4}}  acc {{:.4}}  val_loss {{:.4}}  val_acc {{:.4}}",
            epoch.epoch, epoch.loss, epoch.accuracy, epoch.val_loss, epoch.val_accuracy
        );
    }}

    if let Some(metrics) = controller.final_metrics() {{
        println!("precision {{:.4}}", metrics.precision);
        println!("recall    {{:.4}}", metrics.recall);
        println!("f1        {{:.4}}", metrics.f1);
        println!("roc_auc   {{:.4}}", metrics.roc_auc);
    }}

    Ok(())
}}
"#,
        file_path = file_path,
        task_variant = task_variant,
        target_column = target_column,
    )
}
