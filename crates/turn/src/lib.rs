//! Domain types and collaborator contracts for end-of-utterance estimation.
//!
//! Stays dependency-light so any tokenizer or inference backend can implement
//! the adapter traits without pulling in the core pipeline.

mod conversation;
mod tokens;

pub use conversation::{Conversation, ConversationTurn, Role};
pub use tokens::TokenSequence;

use serde::{Deserialize, Serialize};

/// Raw class scores from one forward pass. Ephemeral; consumed immediately
/// by the scorer.
pub type ScoreVector = Vec<f32>;

#[derive(Debug, thiserror::Error)]
pub enum EouError {
    #[error("conversation has no turns")]
    EmptyConversation,
    /// Reserved for adapters that cannot truncate; adapters that truncate
    /// never return this.
    #[error("input of {got} tokens cannot fit the {budget}-token budget")]
    TokenBudgetExceeded { got: usize, budget: usize },
    #[error("model returned an empty score vector")]
    EmptyScoreVector,
    #[error("end token id {id} out of range for {classes} classes")]
    InvalidTokenIndex { id: u32, classes: usize },
    #[error("score vector contains a non-finite value")]
    NonFiniteScore,
    #[error("end-of-turn marker {marker:?} encodes to {got} tokens, expected exactly one")]
    AmbiguousEndToken { marker: String, got: usize },
    #[error("tokenizer failed: {0}")]
    Tokenizer(String),
    #[error("inference failed: {0}")]
    InferenceBackend(String),
}

pub type Result<T> = std::result::Result<T, EouError>;

/// Outcome of a single end-of-utterance estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EouResult {
    /// Probability in [0, 1] that the speaker's turn has ended.
    pub probability: f32,
    /// Decision threshold the estimator was configured with.
    pub threshold: f32,
    /// Wall-clock duration of the inference call only, not the whole pipeline.
    pub inference_ms: u64,
}

impl EouResult {
    pub fn is_complete(&self) -> bool {
        self.probability >= self.threshold
    }
}

/// Text-to-ids boundary over a concrete tokenizer backend.
///
/// Implementations must be deterministic for a given vocabulary version.
pub trait TokenizerAdapter: Send + Sync {
    /// Encode `text` into at most `max_tokens` ids, dropping the oldest ids
    /// when over budget. Never pads; inference runs at batch size 1.
    fn encode(&self, text: &str, max_tokens: usize) -> Result<TokenSequence>;

    fn decode(&self, ids: &[u32]) -> Result<String>;

    /// Id of a single vocabulary token, if the vocabulary has one.
    fn token_to_id(&self, token: &str) -> Option<u32>;
}

/// One forward pass of a pre-loaded turn-end classifier.
///
/// Treated as opaque and potentially slow; stateless over an immutable loaded
/// model, so a shared runner may serve concurrent estimations.
pub trait InferenceRunner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run the model over `input` and return its raw class scores.
    fn run(&self, input: &TokenSequence) -> Result<ScoreVector>;
}
