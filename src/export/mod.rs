//! Artifact export
//!
//! Serializes a trained model to a JSON artifact with metadata, and
//! generates standalone training source reproducing the pipeline.

mod codegen;
mod serializer;

pub use codegen::generate_training_code;
pub use serializer::{load_model, save_model, ModelArtifact};
