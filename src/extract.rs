use std::sync::LazyLock;

use regex::Regex;

use crate::pipeline::StageTranscript;

pub const UNPROCESSED_NOTICE: &str = "The query could not be processed.";

/// A decimal score with exactly three digits after the point, as the scorer
/// role is instructed to emit.
static SCORE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d{3})").expect("score pattern must compile"));

/// Recovers the entity from queries shaped like "... the score of <name>?".
/// Deliberately narrow; this is literal-format recovery, not language
/// parsing.
static ENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:of|for) ([^?]+)\?").expect("entity pattern must compile"));

/// Formats the user-facing answer from the pipeline transcripts.
///
/// Fallback order: when the final transcript's last message carries a
/// three-decimal score and the original query carries an entity name, the
/// canonical sentence is emitted from the extracted values, overriding
/// whatever the final stage actually said. When either match fails, the raw
/// final message passes through verbatim. When there is no final message at
/// all, a fixed notice is returned. Every path yields a printable string.
pub fn extract_answer(transcripts: &[StageTranscript], original_query: &str) -> String {
    let Some(last_message) = transcripts
        .last()
        .and_then(StageTranscript::last_message)
    else {
        return UNPROCESSED_NOTICE.to_string();
    };

    let score = SCORE_PATTERN
        .captures(&last_message.content)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str());
    let entity = ENTITY_PATTERN
        .captures(original_query)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str().trim());

    match (score, entity) {
        (Some(score), Some(entity)) => {
            format!("The average rating of {entity} is {score}.")
        }
        _ => last_message.content.clone(),
    }
}
