// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Titles and output filenames for converted conversations.
//!
//! A conversation is titled by the first line of its first user message.
//! The filename combines the asked date, the archive it came from, and a
//! sanitized copy of that title.

use crate::parser::{Message, Role};

/// Title used when the first user message carries no text.
pub const ATTACHMENTS_ONLY_TITLE: &str = "No text (attachments only)";

/// Longest title kept in a filename, in characters.
pub const MAX_TITLE_CHARS: usize = 80;

/// Characters that are not allowed in filenames on common filesystems.
const RESERVED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Picks the display title for a list of messages.
///
/// Returns the first line of the first user message. If there is no user
/// message, or the first one is only attachments, returns
/// [`ATTACHMENTS_ONLY_TITLE`]. Returns `None` when there are no messages at
/// all.
///
/// # Example
///
/// ```
/// use chatgpt2md::naming::derive_title;
/// use chatgpt2md::parser::{Message, Role};
///
/// let messages = [Message { role: Role::User, text: "Hello\nworld".into(), has_text: true }];
/// assert_eq!(derive_title(&messages).as_deref(), Some("Hello"));
/// ```
#[must_use]
pub fn derive_title(messages: &[Message]) -> Option<String> {
    if messages.is_empty() {
        return None;
    }

    let title = messages
        .iter()
        .find(|m| m.role == Role::User)
        .filter(|m| m.has_text)
        .map_or(ATTACHMENTS_ONLY_TITLE, |m| first_line(&m.text));

    Some(title.to_owned())
}

fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or_default().trim_end_matches('\r')
}

/// Makes a string safe to use as part of a filename.
///
/// Removes reserved characters, turns line breaks into spaces, truncates
/// to [`MAX_TITLE_CHARS`] characters and trims surrounding whitespace.
/// Applying it twice gives the same result as applying it once.
///
/// # Example
///
/// ```
/// use chatgpt2md::naming::sanitize;
///
/// assert_eq!(sanitize("What is <T>: a \"type\"?"), "What is T a type");
/// ```
#[must_use]
pub fn sanitize(text: &str) -> String {
    let cleaned: String = text
        .replace("\r\n", " ")
        .chars()
        .filter(|c| !RESERVED_CHARS.contains(c))
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(MAX_TITLE_CHARS)
        .collect();

    cleaned.trim().to_owned()
}

/// Builds the output filename `{date}_{source}_{title}.md`.
///
/// The source tag and title are both sanitized. An empty title becomes
/// `untitled`.
///
/// # Example
///
/// ```
/// use chatgpt2md::naming::file_name;
///
/// assert_eq!(
///     file_name("2023-11-14", "conversations", "Hello"),
///     "2023-11-14_conversations_Hello.md"
/// );
/// ```
#[must_use]
pub fn file_name(asked_date: &str, source_tag: &str, title: &str) -> String {
    let title = sanitize(title);
    let title = if title.is_empty() { "untitled" } else { &title };
    format!("{asked_date}_{}_{title}.md", sanitize(source_tag))
}
