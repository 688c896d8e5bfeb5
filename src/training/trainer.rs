//! The incremental training worker
//!
//! Runs the epoch/batch loop on its own thread. The worker owns the model
//! and its metric accumulation; the only shared state is the cancellation
//! flag (read at epoch start and per batch) and the progress channel plus
//! completion slot it publishes into.

use crate::error::Result;
use crate::evaluation::{self, FinalMetrics};
use crate::preprocessing::PreparedSplit;
use crate::progress::{CompletionSlot, ProgressChannel};
use crate::training::config::{TaskKind, TrainerConfig};
use crate::training::forest::IncrementalForest;
use crate::training::metrics::{
    accuracy, proxy_log_loss, BatchMetrics, EarlyStopping, EpochAccumulator,
};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Terminal result posted by the worker as its last act
#[derive(Debug)]
pub enum WorkerOutcome {
    /// Loop ran to completion or early-stopped
    Finished {
        model: IncrementalForest,
        metrics: FinalMetrics,
    },
    /// Cooperative cancellation observed; partial model discarded
    Cancelled,
    /// Preparation or fitting failed; message surfaced verbatim
    Failed(String),
}

/// Handle to the one live worker
pub struct TrainerHandle {
    cancel: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl TrainerHandle {
    /// Request cooperative cancellation. Takes effect at the worker's next
    /// checkpoint, never mid-batch-fit.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Block until the worker has exited. After this returns no further
    /// snapshots can be published.
    pub fn join(mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .map_or(true, |h| h.is_finished())
    }
}

/// Spawn the training worker. Returns immediately.
pub fn spawn_trainer(
    split: PreparedSplit,
    task_kind: TaskKind,
    config: TrainerConfig,
    channel: Arc<ProgressChannel>,
    completion: Arc<CompletionSlot<WorkerOutcome>>,
) -> TrainerHandle {
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);

    let join_handle = thread::spawn(move || {
        let outcome = match train_loop(&split, task_kind, &config, &worker_cancel, &channel) {
            Ok(Some(model)) => match evaluation::evaluate(&model, &split.x_test, &split.y_test) {
                Ok(metrics) => WorkerOutcome::Finished { model, metrics },
                Err(e) => {
                    warn!(error = %e, "holdout evaluation failed");
                    WorkerOutcome::Failed(e.to_string())
                }
            },
            Ok(None) => WorkerOutcome::Cancelled,
            Err(e) => {
                warn!(error = %e, "training loop failed");
                WorkerOutcome::Failed(e.to_string())
            }
        };
        completion.post(outcome);
    });

    TrainerHandle {
        cancel,
        join_handle: Some(join_handle),
    }
}

/// The epoch/batch loop. Returns `Ok(None)` when cancellation was observed.
fn train_loop(
    split: &PreparedSplit,
    task_kind: TaskKind,
    config: &TrainerConfig,
    cancel: &AtomicBool,
    channel: &ProgressChannel,
) -> Result<Option<IncrementalForest>> {
    let mut forest = IncrementalForest::new(task_kind.forest_config());
    let mut early_stopping = EarlyStopping::new(config.improvement_threshold, config.patience);

    // Batch order is intentionally unseeded; run-to-run variance in batch
    // composition is expected.
    let mut rng = Xoshiro256PlusPlus::from_entropy();
    let n_train = split.x_train.nrows();
    let mut indices: Vec<usize> = (0..n_train).collect();

    for epoch in 0..config.max_epochs {
        if cancel.load(Ordering::SeqCst) {
            debug!(epoch, "cancellation observed at epoch start");
            return Ok(None);
        }

        indices.shuffle(&mut rng);
        let mut accumulator = EpochAccumulator::new();

        for batch in indices.chunks(config.batch_size) {
            if cancel.load(Ordering::SeqCst) {
                debug!(epoch, "cancellation observed mid-epoch");
                return Ok(None);
            }
            if batch.is_empty() {
                continue;
            }

            let batch_x = split.x_train.select(ndarray::Axis(0), batch);
            let batch_y = ndarray::Array1::from_iter(batch.iter().map(|&i| split.y_train[i]));

            forest.partial_fit(&batch_x, &batch_y)?;

            // Metrics reflect the model state after this batch's fit
            let train_pred = forest.predict(&batch_x)?;
            let val_pred = forest.predict(&split.x_test)?;

            accumulator.push(BatchMetrics {
                loss: proxy_log_loss(&batch_y, &train_pred),
                accuracy: accuracy(&batch_y, &train_pred),
                val_loss: proxy_log_loss(&split.y_test, &val_pred),
                val_accuracy: accuracy(&split.y_test, &val_pred),
            });
        }

        let Some(epoch_metrics) = accumulator.finish(epoch) else {
            continue;
        };
        let val_accuracy = epoch_metrics.val_accuracy;
        channel.publish(epoch_metrics);

        if early_stopping.observe(val_accuracy) {
            debug!(epoch, val_accuracy, "early stopping");
            break;
        }

        thread::sleep(config.epoch_delay);
    }

    Ok(Some(forest))
}
