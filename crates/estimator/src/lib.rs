//! End-of-utterance probability estimation for voice-agent turn taking.
//!
//! Composes text normalization, chat-template rendering, tokenization, and a
//! single forward pass of a turn-end classifier into one `estimate` call.
//! The tokenizer and inference backends are injected as capabilities; see
//! the `endcue-onnx` crate for the ONNX Runtime implementations.

mod normalize;
mod render;
mod score;

pub use normalize::normalize_turn;
pub use render::ChatTemplate;
pub use score::{score_from_head, score_from_logits, softmax, ScoreMode};

pub use endcue_turn::{
    Conversation, ConversationTurn, EouError, EouResult, InferenceRunner, Role, ScoreVector,
    TokenSequence, TokenizerAdapter,
};

use std::sync::Arc;
use std::time::Instant;

/// Pipeline stage attached to estimation errors.
///
/// Normalization is pure and cannot fail, so it has no tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Render,
    Tokenize,
    Infer,
    Score,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Render => "render",
            Stage::Tokenize => "tokenize",
            Stage::Infer => "infer",
            Stage::Score => "score",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Estimation failure tagged with the pipeline stage that produced it.
///
/// The facade only catches to attach the stage, then returns; component
/// errors are never swallowed and no partial result is ever produced.
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct EstimateError {
    pub stage: Stage,
    #[source]
    pub source: EouError,
}

impl EstimateError {
    fn at(stage: Stage, source: EouError) -> Self {
        Self { stage, source }
    }
}

/// Tunables for one estimator instance.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Token budget for the rendered history; oldest content is dropped first.
    pub max_history_tokens: usize,
    /// Which output head the loaded model variant exposes.
    pub mode: ScoreMode,
    /// Probability at or above which a turn counts as complete.
    pub threshold: f32,
    pub template: ChatTemplate,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_history_tokens: 512,
            mode: ScoreMode::Head,
            threshold: 0.5,
            template: ChatTemplate::default(),
        }
    }
}

/// Scoring mode with the end-of-turn id already resolved.
#[derive(Debug, Clone, Copy)]
enum ResolvedMode {
    Head,
    Logits { end_token_id: u32 },
}

/// Streaming end-of-utterance estimator.
///
/// Holds the injected collaborators plus the end-of-turn token id resolved
/// once at construction. `estimate` calls share no mutable state, so one
/// estimator may serve concurrent calls for independent conversations.
pub struct EouEstimator {
    runner: Arc<dyn InferenceRunner>,
    tokenizer: Arc<dyn TokenizerAdapter>,
    config: EstimatorConfig,
    mode: ResolvedMode,
}

impl std::fmt::Debug for EouEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EouEstimator")
            .field("runner", &"<dyn InferenceRunner>")
            .field("tokenizer", &"<dyn TokenizerAdapter>")
            .field("config", &self.config)
            .field("mode", &self.mode)
            .finish()
    }
}

impl EouEstimator {
    pub fn new(
        runner: Arc<dyn InferenceRunner>,
        tokenizer: Arc<dyn TokenizerAdapter>,
        config: EstimatorConfig,
    ) -> Result<Self, EstimateError> {
        let mode = match config.mode {
            ScoreMode::Head => ResolvedMode::Head,
            ScoreMode::Logits => {
                let marker = config.template.end_marker();
                let end_token_id = resolve_end_token(tokenizer.as_ref(), marker)
                    .map_err(|e| EstimateError::at(Stage::Tokenize, e))?;
                tracing::debug!(end_token_id, marker, "end-of-turn token resolved");
                ResolvedMode::Logits { end_token_id }
            }
        };

        Ok(Self {
            runner,
            tokenizer,
            config,
            mode,
        })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate the probability that the last speaker has finished their turn.
    pub fn estimate(&self, conversation: &Conversation) -> Result<EouResult, EstimateError> {
        let normalized: Conversation = conversation.turns().iter().map(normalize_turn).collect();

        let text = self
            .config
            .template
            .render(&normalized)
            .map_err(|e| EstimateError::at(Stage::Render, e))?;

        let input = self
            .tokenizer
            .encode(&text, self.config.max_history_tokens)
            .map_err(|e| EstimateError::at(Stage::Tokenize, e))?;
        tracing::debug!(chars = text.len(), tokens = input.len(), "conversation rendered");

        let started = Instant::now();
        let scores = self
            .runner
            .run(&input)
            .map_err(|e| EstimateError::at(Stage::Infer, e))?;
        let inference_ms = started.elapsed().as_millis() as u64;

        let probability = match self.mode {
            ResolvedMode::Head => score_from_head(&scores),
            ResolvedMode::Logits { end_token_id } => score_from_logits(&scores, end_token_id),
        }
        .map_err(|e| EstimateError::at(Stage::Score, e))?;

        tracing::debug!(
            backend = self.runner.name(),
            probability,
            inference_ms,
            "eou estimated"
        );

        Ok(EouResult {
            probability,
            threshold: self.config.threshold,
            inference_ms,
        })
    }

    /// Estimate for a single unanswered user utterance.
    pub fn estimate_utterance(&self, text: &str) -> Result<EouResult, EstimateError> {
        let conversation = Conversation::from(vec![ConversationTurn::user(text)]);
        self.estimate(&conversation)
    }
}

/// Resolve the end-of-turn marker to a single vocabulary id.
///
/// Runs once at construction. A marker that does not map to exactly one token
/// is a configuration error, never a "take the last id" guess.
fn resolve_end_token(tokenizer: &dyn TokenizerAdapter, marker: &str) -> Result<u32, EouError> {
    if let Some(id) = tokenizer.token_to_id(marker) {
        return Ok(id);
    }
    // usize::MAX: probe without truncation so a multi-token encoding is seen.
    let ids = tokenizer.encode(marker, usize::MAX)?;
    match ids.ids() {
        [id] => Ok(*id),
        other => Err(EouError::AmbiguousEndToken {
            marker: marker.to_string(),
            got: other.len(),
        }),
    }
}
