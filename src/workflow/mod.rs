//! Workflow coordination
//!
//! The shared context the wizard stages pass between each other and the
//! controller that owns the training lifecycle.

mod context;
mod controller;

pub use context::WorkflowContext;
pub use controller::{EvaluationSink, StepObserver, TrainingController, TrainingState};
