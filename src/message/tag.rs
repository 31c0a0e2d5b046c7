//! Whitespace tag appended to outgoing plaintext to advertise client support.

/// Thirteen trailing spaces.
pub const WHITESPACE_TAG: &str = "             ";

/// Longest body that still fits a single SMS once tagged.
const MAX_TAGGED_LENGTH: usize = 158;

/// A body is tagged when it ends with the tag right after a non-blank character.
pub fn is_tagged(message: &str) -> bool {
    message
        .strip_suffix(WHITESPACE_TAG)
        .and_then(|rest| rest.chars().last())
        .is_some_and(|c| !c.is_whitespace())
}

pub fn is_taggable(message: &str) -> bool {
    let trimmed = message.trim_end();
    !trimmed.is_empty() && trimmed.chars().count() + WHITESPACE_TAG.len() <= MAX_TAGGED_LENGTH
}

pub fn tag_message(message: &str) -> String {
    format!("{}{WHITESPACE_TAG}", message.trim_end())
}

/// Remove the tag; untagged bodies are returned unchanged.
pub fn strip_tag(message: &str) -> &str {
    if is_tagged(message) {
        &message[..message.len() - WHITESPACE_TAG.len()]
    } else {
        message
    }
}
