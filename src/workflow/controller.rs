//! Training lifecycle controller
//!
//! Owns the run state machine and the single live worker handle. The
//! controller is the only writer of [`TrainingState`]; the worker reports
//! back exclusively through the progress channel and completion slot,
//! which `poll` observes on the consumer's cadence.

use crate::error::{FinsightError, Result};
use crate::evaluation::FinalMetrics;
use crate::preprocessing;
use crate::progress::{CompletionSlot, ProgressChannel};
use crate::training::{
    spawn_trainer, EpochMetrics, IncrementalForest, TrainerConfig, TrainerHandle, WorkerOutcome,
};
use crate::workflow::WorkflowContext;
use std::sync::Arc;
use tracing::{debug, info};

/// Lifecycle state of the training frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingState {
    Idle,
    Running,
    Stopped,
    Completed,
    Failed(String),
}

impl TrainingState {
    pub fn is_running(&self) -> bool {
        matches!(self, TrainingState::Running)
    }
}

/// Receives workflow-step notifications (sidebar/navigation collaborator)
pub trait StepObserver {
    fn on_step_completed(&self, step: &str);
}

/// One-shot consumer of the final holdout metrics
pub type EvaluationSink = Box<dyn Fn(&FinalMetrics)>;

/// Coordinates start/stop of the one background training worker.
pub struct TrainingController {
    config: TrainerConfig,
    state: TrainingState,
    channel: Arc<ProgressChannel>,
    completion: Arc<CompletionSlot<WorkerOutcome>>,
    handle: Option<TrainerHandle>,
    history: Vec<EpochMetrics>,
    model: Option<IncrementalForest>,
    final_metrics: Option<FinalMetrics>,
    step_observer: Option<Box<dyn StepObserver>>,
    evaluation_sink: Option<EvaluationSink>,
}

impl TrainingController {
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            state: TrainingState::Idle,
            channel: Arc::new(ProgressChannel::new()),
            completion: Arc::new(CompletionSlot::new()),
            handle: None,
            history: Vec::new(),
            model: None,
            final_metrics: None,
            step_observer: None,
            evaluation_sink: None,
        }
    }

    pub fn with_step_observer(mut self, observer: Box<dyn StepObserver>) -> Self {
        self.step_observer = Some(observer);
        self
    }

    pub fn with_evaluation_sink(mut self, sink: EvaluationSink) -> Self {
        self.evaluation_sink = Some(sink);
        self
    }

    pub fn state(&self) -> &TrainingState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Epoch snapshots accumulated for the current run
    pub fn history(&self) -> &[EpochMetrics] {
        &self.history
    }

    /// The fitted model; present only after a Completed run
    pub fn model(&self) -> Option<&IncrementalForest> {
        self.model.as_ref()
    }

    /// Holdout metrics; present only after a Completed run
    pub fn final_metrics(&self) -> Option<&FinalMetrics> {
        self.final_metrics.as_ref()
    }

    /// Start if not running, stop if running.
    pub fn toggle_training(&mut self, ctx: &WorkflowContext) -> Result<()> {
        if self.is_running() {
            self.stop()
        } else {
            self.start(ctx)
        }
    }

    /// Validate the context, prepare the data and spawn the worker.
    ///
    /// Non-blocking: returns as soon as the worker is running. Fails with
    /// [`FinsightError::Configuration`] before any worker is spawned when
    /// the context is incomplete; the state is left unchanged in that case.
    pub fn start(&mut self, ctx: &WorkflowContext) -> Result<()> {
        if self.is_running() {
            return Err(FinsightError::InvalidState(
                "training is already running".to_string(),
            ));
        }

        let (dataset, target) = ctx.training_inputs()?;
        let split = preprocessing::prepare(dataset, target, ctx.task_kind, self.config.prepare_seed)?;

        // Fresh run: drop derived state of any previous run
        self.clear_run_state();

        let handle = spawn_trainer(
            split,
            ctx.task_kind,
            self.config.clone(),
            Arc::clone(&self.channel),
            Arc::clone(&self.completion),
        );
        self.handle = Some(handle);
        self.state = TrainingState::Running;
        info!(task = %ctx.task_kind, target, "training started");
        Ok(())
    }

    /// Request cooperative cancellation and block until the worker exits.
    ///
    /// Guaranteed: after this returns, no further epoch snapshots appear in
    /// the channel. Any partial model is discarded.
    pub fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(FinsightError::InvalidState(
                "training is not running".to_string(),
            ));
        }

        if let Some(handle) = self.handle.take() {
            handle.request_cancel();
            handle.join();
        }

        // Final drain; the worker can no longer publish
        self.history.extend(self.channel.drain());
        // Discard whatever outcome the worker managed to post
        let _ = self.completion.take();

        self.state = TrainingState::Stopped;
        info!(epochs = self.history.len(), "training stopped");
        Ok(())
    }

    /// Consumer-cadence tick: drain new snapshots into the history and
    /// perform the terminal transition once the worker has signalled.
    ///
    /// Returns the snapshots drained by this call so the caller can extend
    /// its live view incrementally.
    pub fn poll(&mut self) -> Vec<EpochMetrics> {
        let mut fresh = self.channel.drain();

        if self.is_running() {
            if let Some(outcome) = self.completion.take() {
                // Reap the finished worker thread
                if let Some(handle) = self.handle.take() {
                    handle.join();
                }
                // The worker may have published between the drain above and
                // posting its outcome
                fresh.extend(self.channel.drain());

                match outcome {
                    WorkerOutcome::Finished { model, metrics } => {
                        debug!(roc_auc = metrics.roc_auc, "training completed");
                        if let Some(sink) = &self.evaluation_sink {
                            sink(&metrics);
                        }
                        self.model = Some(model);
                        self.final_metrics = Some(metrics);
                        self.state = TrainingState::Completed;
                        if let Some(observer) = &self.step_observer {
                            observer.on_step_completed("training");
                        }
                    }
                    WorkerOutcome::Cancelled => {
                        self.state = TrainingState::Stopped;
                    }
                    WorkerOutcome::Failed(reason) => {
                        info!(reason = %reason, "training failed");
                        self.state = TrainingState::Failed(reason);
                    }
                }
            }
        }

        self.history.extend(fresh.iter().cloned());
        fresh
    }

    /// Clear all derived state back to Idle. Not allowed while Running.
    pub fn reset(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(FinsightError::InvalidState(
                "cannot reset while training is running".to_string(),
            ));
        }
        self.clear_run_state();
        self.state = TrainingState::Idle;
        Ok(())
    }

    fn clear_run_state(&mut self) {
        self.history.clear();
        self.model = None;
        self.final_metrics = None;
        let _ = self.channel.drain();
        let _ = self.completion.take();
    }

    /// Block until the current run reaches a terminal state, polling on the
    /// configured consumer cadence. Intended for headless embedding.
    pub fn wait_until_terminal(&mut self, tick: std::time::Duration) -> Vec<EpochMetrics> {
        let mut all = Vec::new();
        loop {
            all.extend(self.poll());
            if !self.is_running() {
                break;
            }
            std::thread::sleep(tick);
        }
        all
    }
}

impl Drop for TrainingController {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.request_cancel();
            handle.join();
        }
    }
}
