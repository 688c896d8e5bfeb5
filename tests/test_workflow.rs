//! Integration test: workflow context, export and observers

use finsight::dataset::{Dataset, PresetDataset, TARGET_UNSET};
use finsight::error::FinsightError;
use finsight::export::{generate_training_code, load_model, save_model, ModelArtifact};
use finsight::preprocessing::prepare;
use finsight::training::{TaskKind, TrainerConfig};
use finsight::workflow::{StepObserver, TrainingController, TrainingState, WorkflowContext};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn preset_context() -> WorkflowContext {
    let dataset = Dataset::from_preset(PresetDataset::CreditRisk, 400, 42).unwrap();
    let mut ctx = WorkflowContext::new(TaskKind::CreditRisk);
    ctx.set_dataset(dataset, None);
    ctx.select_target("default").unwrap();
    ctx
}

fn fast_config() -> TrainerConfig {
    TrainerConfig {
        max_epochs: 4,
        batch_size: 128,
        epoch_delay: Duration::from_millis(1),
        ..Default::default()
    }
}

#[test]
fn test_unset_target_blocks_start_without_worker() {
    let mut ctx = preset_context();
    ctx.target_column = TARGET_UNSET.to_string();

    let mut controller = TrainingController::new(fast_config());
    let result = controller.start(&ctx);

    assert!(matches!(result, Err(FinsightError::Configuration(_))));
    assert_eq!(*controller.state(), TrainingState::Idle);
    assert!(controller.history().is_empty());
}

#[test]
fn test_step_observer_notified_on_completion() {
    struct Recorder(Arc<AtomicUsize>);
    impl StepObserver for Recorder {
        fn on_step_completed(&self, step: &str) {
            assert_eq!(step, "training");
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let notifications = Arc::new(AtomicUsize::new(0));
    let ctx = preset_context();
    let mut controller = TrainingController::new(fast_config())
        .with_step_observer(Box::new(Recorder(Arc::clone(&notifications))));

    controller.start(&ctx).unwrap();
    controller.wait_until_terminal(Duration::from_millis(2));

    assert_eq!(*controller.state(), TrainingState::Completed);
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
}

#[test]
fn test_evaluation_sink_receives_final_metrics() {
    let received = Arc::new(AtomicUsize::new(0));
    let received_clone = Arc::clone(&received);

    let ctx = preset_context();
    let mut controller =
        TrainingController::new(fast_config()).with_evaluation_sink(Box::new(move |metrics| {
            assert_eq!(metrics.y_test.len(), metrics.y_proba.len());
            received_clone.fetch_add(1, Ordering::SeqCst);
        }));

    controller.start(&ctx).unwrap();
    controller.wait_until_terminal(Duration::from_millis(2));
    controller.poll();

    assert_eq!(received.load(Ordering::SeqCst), 1);
}

#[test]
fn test_completed_model_exports_and_reloads() {
    let ctx = preset_context();
    let mut controller = TrainingController::new(fast_config());
    controller.start(&ctx).unwrap();
    controller.wait_until_terminal(Duration::from_millis(2));
    assert_eq!(*controller.state(), TrainingState::Completed);

    let model = controller.model().unwrap().clone();
    let split = prepare(
        ctx.dataset.as_ref().unwrap(),
        "default",
        TaskKind::CreditRisk,
        42,
    )
    .unwrap();
    let expected = model.predict(&split.x_test).unwrap();

    let artifact = ModelArtifact::new(model, TaskKind::CreditRisk, "default");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credit_model.json");
    save_model(&artifact, &path).unwrap();

    let restored = load_model(&path).unwrap();
    assert_eq!(restored.task_kind, TaskKind::CreditRisk);
    assert_eq!(restored.target_column, "default");
    assert_eq!(restored.model.predict(&split.x_test).unwrap(), expected);
}

#[test]
fn test_generated_code_reproduces_run_parameters() {
    let code = generate_training_code("portfolio.csv", "default", TaskKind::CreditRisk);

    assert!(code.contains("\"portfolio.csv\""));
    assert!(code.contains("\"default\""));
    assert!(code.contains("TaskKind::CreditRisk"));
    assert!(code.contains("TrainingController"));
    // Balanced braces in the rendered source
    let open = code.matches('{').count();
    let close = code.matches('}').count();
    assert_eq!(open, close);
}

#[test]
fn test_dataset_summary_drives_oversampling_hint() {
    let dataset = Dataset::from_preset(PresetDataset::FraudDetection, 1_000, 42).unwrap();
    let summary = dataset.summary(Some("is_fraud")).unwrap();

    assert!(summary.class_ratio.unwrap() < 0.3);
    assert!(summary.imbalanced);
}

#[test]
fn test_delete_column_then_train() {
    let mut dataset = Dataset::from_preset(PresetDataset::CreditRisk, 400, 42).unwrap();
    dataset.delete_column("purpose", Some("default")).unwrap();

    let mut ctx = WorkflowContext::new(TaskKind::CreditRisk);
    ctx.set_dataset(dataset, None);
    ctx.select_target("default").unwrap();

    let mut controller = TrainingController::new(fast_config());
    controller.start(&ctx).unwrap();
    controller.wait_until_terminal(Duration::from_millis(2));

    assert_eq!(*controller.state(), TrainingState::Completed);
}
