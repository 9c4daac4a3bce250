//! HuggingFace `tokenizers` adapter.

use endcue_turn::{EouError, Result, TokenSequence, TokenizerAdapter};
use std::path::Path;
use tokenizers::Tokenizer;

/// Adapter over a `tokenizer.json` vocabulary file.
///
/// Encodes without adding special tokens: the chat template already carries
/// every marker the model expects.
pub struct HfTokenizerAdapter {
    inner: Tokenizer,
}

impl HfTokenizerAdapter {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let inner =
            Tokenizer::from_file(path.as_ref()).map_err(|e| EouError::Tokenizer(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl TokenizerAdapter for HfTokenizerAdapter {
    fn encode(&self, text: &str, max_tokens: usize) -> Result<TokenSequence> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| EouError::Tokenizer(e.to_string()))?;
        Ok(TokenSequence::truncated(
            encoding.get_ids().to_vec(),
            max_tokens,
        ))
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner
            .decode(ids, false)
            .map_err(|e| EouError::Tokenizer(e.to_string()))
    }

    fn token_to_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }
}
