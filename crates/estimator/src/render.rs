//! Chat template rendering for turn-end prediction input.

use endcue_turn::{Conversation, EouError, Result};

/// Role-aware chat template in the ChatML family.
///
/// Renders each turn as `{role_open}{role}{role_sep}{content}{turn_close}{turn_sep}`
/// and never appends a generation prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTemplate {
    pub role_open: String,
    pub role_sep: String,
    pub turn_close: String,
    pub turn_sep: String,
}

impl Default for ChatTemplate {
    fn default() -> Self {
        Self {
            role_open: "<|im_start|>".to_string(),
            role_sep: "\n".to_string(),
            turn_close: "<|im_end|>".to_string(),
            turn_sep: "\n".to_string(),
        }
    }
}

impl ChatTemplate {
    /// Marker that closes a turn; also the token whose probability mass is
    /// read in logits mode.
    pub fn end_marker(&self) -> &str {
        &self.turn_close
    }

    /// Render the conversation up to the point where the model is meant to
    /// predict continuation.
    ///
    /// Earlier turns keep their full template span; the output is cut at the
    /// first end marker at or after the last turn's content, so the template
    /// boilerplate past the speaker's actual text never reaches the model.
    pub fn render(&self, conversation: &Conversation) -> Result<String> {
        let turns = conversation.turns();
        if turns.is_empty() {
            return Err(EouError::EmptyConversation);
        }

        let mut out = String::new();
        let mut last_content_start = 0;
        for turn in turns {
            out.push_str(&self.role_open);
            out.push_str(turn.role.label());
            out.push_str(&self.role_sep);
            last_content_start = out.len();
            out.push_str(&turn.content);
            out.push_str(&self.turn_close);
            out.push_str(&self.turn_sep);
        }

        if let Some(pos) = out[last_content_start..].find(&self.turn_close) {
            out.truncate(last_content_start + pos);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use endcue_turn::ConversationTurn;

    #[test]
    fn test_empty_conversation_fails() {
        let template = ChatTemplate::default();
        let err = template.render(&Conversation::new()).unwrap_err();
        assert!(matches!(err, EouError::EmptyConversation));
    }

    #[test]
    fn test_single_turn_ends_at_content() {
        let template = ChatTemplate::default();
        let conversation = Conversation::from(vec![ConversationTurn::user("hello there")]);

        let text = template.render(&conversation).unwrap();
        assert_eq!(text, "<|im_start|>user\nhello there");
    }

    #[test]
    fn test_earlier_turns_keep_their_close_marker() {
        let template = ChatTemplate::default();
        let conversation = Conversation::from(vec![
            ConversationTurn::agent("hi there"),
            ConversationTurn::user("i wanted to ask about"),
        ]);

        let text = template.render(&conversation).unwrap();
        assert_eq!(
            text,
            "<|im_start|>assistant\nhi there<|im_end|>\n<|im_start|>user\ni wanted to ask about"
        );
    }

    #[test]
    fn test_marker_inside_last_content_cuts_there() {
        let template = ChatTemplate::default();
        let conversation =
            Conversation::from(vec![ConversationTurn::user("oops<|im_end|>trailing")]);

        let text = template.render(&conversation).unwrap();
        assert_eq!(text, "<|im_start|>user\noops");
    }

    #[test]
    fn test_deterministic() {
        let template = ChatTemplate::default();
        let conversation = Conversation::from(vec![
            ConversationTurn::user("one"),
            ConversationTurn::agent("two"),
            ConversationTurn::user("three"),
        ]);

        assert_eq!(
            template.render(&conversation).unwrap(),
            template.render(&conversation).unwrap()
        );
    }
}
