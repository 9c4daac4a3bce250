//! ONNX Runtime and HuggingFace tokenizer backends for the estimator.
//!
//! Loads a pre-trained turn-end classifier once at startup and serves
//! forward passes through the `InferenceRunner` trait. Model download and
//! vocabulary sourcing are the surrounding application's concern.

mod tokenizer;

pub use tokenizer::HfTokenizerAdapter;

use endcue_turn::{EouError, InferenceRunner, ScoreVector, TokenSequence};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum OnnxEouError {
    #[error("failed to load model: {0}")]
    Model(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// ONNX Runtime-backed turn-end classifier session.
///
/// Initialized once; holds the session for the lifetime of the process. The
/// session is wrapped in a Mutex because ort v2 `session.run()` requires
/// `&mut self`.
#[derive(Debug)]
pub struct OnnxEouRunner {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxEouRunner {
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, OnnxEouError> {
        let session = Session::builder()
            .map_err(|e| OnnxEouError::Model(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| OnnxEouError::Model(e.to_string()))?
            .with_intra_threads(1)
            .map_err(|e| OnnxEouError::Model(e.to_string()))?
            .commit_from_file(model_path.as_ref())
            .map_err(|e| OnnxEouError::Model(e.to_string()))?;

        let input_name = session
            .inputs
            .iter()
            .find(|i| i.name == "input_ids")
            .map(|i| i.name.clone())
            .or_else(|| session.inputs.first().map(|i| i.name.clone()))
            .ok_or_else(|| OnnxEouError::Model("model has no inputs".to_string()))?;

        // Scalar-head exports name their output "prob"; logits exports "logits".
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name == "prob" || o.name == "logits")
            .map(|o| o.name.clone())
            .or_else(|| session.outputs.first().map(|o| o.name.clone()))
            .ok_or_else(|| OnnxEouError::Model("model has no outputs".to_string()))?;

        tracing::info!(
            input = %input_name,
            output = %output_name,
            "EOU model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    /// One forward pass at batch size 1.
    ///
    /// Returns the final position's score row, so both `[1]`-shaped heads and
    /// `[1, seq, vocab]` logits exports reduce to a single score vector.
    pub fn run_scores(&self, input: &TokenSequence) -> Result<ScoreVector, OnnxEouError> {
        let ids: Vec<i64> = input.ids().iter().map(|&id| i64::from(id)).collect();
        let len = ids.len();
        let tensor = Tensor::from_array(([1usize, len], ids))
            .map_err(|e| OnnxEouError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| OnnxEouError::Inference("session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| OnnxEouError::Inference(e.to_string()))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| OnnxEouError::Inference("missing model output".to_string()))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| OnnxEouError::Inference(e.to_string()))?;

        // The last axis is the class axis.
        let classes = shape.iter().last().copied().unwrap_or(1).max(1) as usize;
        if data.len() < classes {
            return Err(OnnxEouError::Inference("empty model output".to_string()));
        }
        Ok(data[data.len() - classes..].to_vec())
    }
}

impl InferenceRunner for OnnxEouRunner {
    fn name(&self) -> &'static str {
        "eou-onnx"
    }

    fn run(&self, input: &TokenSequence) -> endcue_turn::Result<ScoreVector> {
        self.run_scores(input)
            .map_err(|e| EouError::InferenceBackend(e.to_string()))
    }
}
