//! Turn text canonicalization applied before rendering.

use endcue_turn::ConversationTurn;

/// Apostrophe characters stripped from turn content. Spoken-language turn
/// models are trained on contraction-free lowercase text.
const APOSTROPHES: [char; 2] = ['\'', '\u{2019}'];

/// Lower-case a turn's content and strip apostrophes.
///
/// Pure and idempotent; returns a new turn, the input is never mutated.
/// Empty content is legal and normalizes to empty content.
pub fn normalize_turn(turn: &ConversationTurn) -> ConversationTurn {
    let stripped: String = turn
        .content
        .chars()
        .filter(|c| !APOSTROPHES.contains(c))
        .collect();
    ConversationTurn::new(turn.role, stripped.to_lowercase())
}
