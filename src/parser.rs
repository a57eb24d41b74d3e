// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! JSON parsing for ChatGPT conversation exports.
//!
//! The export format is not stable: older archives list messages flat, newer
//! ones store a `mapping` of nodes linked by `parent`/`children` ids. Rather
//! than binding to one schema, this module walks the whole JSON tree and
//! picks up every node that carries a `message`.
//!
//! # Format Overview
//!
//! An archive (`conversations.json`) is either an array of conversations or
//! an object keyed by conversation id. Somewhere inside each conversation are
//! message nodes shaped like:
//!
//! ```json
//! {
//!     "message": {
//!         "author": { "role": "user" },
//!         "content": { "parts": ["Hello"] }
//!     }
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use chatgpt2md::parser::{Role, parse_archive, walk};
//!
//! let json = r#"[{
//!     "create_time": 1700000000,
//!     "mapping": {
//!         "a": { "message": { "author": { "role": "user" },
//!                             "content": { "parts": ["Hello"] } } }
//!     }
//! }]"#;
//!
//! let conversations = parse_archive(json).unwrap();
//! let messages = walk(&conversations[0]);
//! assert_eq!(messages[0].role, Role::User);
//! assert_eq!(messages[0].text, "Hello");
//! ```

use serde_json::Value;
use snafu::prelude::*;

/// Text substituted for an image part; the image data itself is never copied.
pub const IMAGE_PLACEHOLDER: &str = "[Image attachment]";

/// Type tags that identify an image part.
const IMAGE_CONTENT_TYPES: &[&str] = &["image_asset_pointer", "image_url", "image", "input_image"];

/// Error type for archive loading failures.
#[derive(Debug, Snafu)]
pub enum ArchiveError {
    /// Failed to parse JSON content.
    #[snafu(display("failed to parse JSON: {source}"))]
    Json {
        /// The underlying JSON parsing error.
        source: serde_json::Error,
    },

    /// The top-level value is neither an object nor an array.
    #[snafu(display("expected an object or array of conversations, found {kind}"))]
    UnsupportedShape {
        /// The JSON type that was found instead.
        kind: &'static str,
    },
}

/// The speaker of an extracted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// A message typed by the person using ChatGPT.
    User,
    /// A reply produced by the model.
    Assistant,
}

impl Role {
    /// Maps an `author.role` value to a retained role.
    ///
    /// Only `user` and `assistant` are kept; `system`, `tool` and anything
    /// else return `None`.
    #[must_use]
    pub fn from_author(role: &str) -> Option<Self> {
        match role {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// A message pulled out of a conversation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Who wrote the message.
    pub role: Role,

    /// The joined, trimmed text of all content parts.
    ///
    /// May be empty when the node had no usable content.
    pub text: String,

    /// Whether at least one part contributed non-blank text.
    ///
    /// Messages made only of attachments have `has_text == false` even
    /// though `text` holds the image placeholder.
    pub has_text: bool,
}

/// Parses an archive into its list of conversations.
///
/// Objects are treated as `id → conversation` maps and yield their values
/// in document order. Arrays yield their elements. Null conversations are
/// dropped.
///
/// # Errors
///
/// Returns an error if the input is not valid JSON or if its top-level
/// value is a scalar.
///
/// # Example
///
/// ```
/// use chatgpt2md::parser::parse_archive;
///
/// let conversations = parse_archive(r#"{"c1": {}, "c2": {}}"#).unwrap();
/// assert_eq!(conversations.len(), 2);
///
/// assert!(parse_archive("42").is_err());
/// ```
pub fn parse_archive(json_str: &str) -> Result<Vec<Value>, ArchiveError> {
    let root: Value = serde_json::from_str(json_str).context(JsonSnafu)?;

    let conversations = match root {
        Value::Object(map) => map.into_values().collect(),
        Value::Array(items) => items,
        other => {
            return UnsupportedShapeSnafu {
                kind: kind_name(&other),
            }
            .fail();
        }
    };

    Ok(conversations.into_iter().filter(|c| !c.is_null()).collect())
}

/// Collects every user and assistant message found anywhere under `node`.
///
/// Messages are returned in depth-first traversal order, which follows
/// the document order of the JSON. Recursion does not stop at a message
/// node, so messages nested inside other messages are found as well.
#[must_use]
pub fn walk(node: &Value) -> Vec<Message> {
    let mut messages = Vec::new();
    walk_into(node, &mut messages);
    messages
}

fn walk_into(node: &Value, out: &mut Vec<Message>) {
    match node {
        Value::Object(map) => {
            if let Some(message) = map.get("message").filter(|m| !m.is_null())
                && let Some(extracted) = extract_message(message)
            {
                out.push(extracted);
            }

            for value in map.values().filter(|v| !v.is_null()) {
                walk_into(value, out);
            }
        }
        Value::Array(items) => {
            for item in items.iter().filter(|v| !v.is_null()) {
                walk_into(item, out);
            }
        }
        _ => {}
    }
}

/// Builds a [`Message`] from a `message` value, or `None` if the role is
/// not one we keep.
fn extract_message(message: &Value) -> Option<Message> {
    let role = Role::from_author(get_str(message, &["author", "role"]).unwrap_or_default())?;

    let parts = message
        .get("content")
        .filter(|c| c.is_object())
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);

    let joined = join_parts(parts);
    Some(Message {
        role,
        text: joined.text,
        has_text: joined.has_text,
    })
}

/// The result of flattening a `content.parts` array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinedParts {
    /// Parts joined by newlines and trimmed.
    pub text: String,
    /// Whether any part other than an image placeholder had visible text.
    pub has_text: bool,
}

/// Flattens content parts into a single string.
///
/// Each part becomes one line group:
/// - strings are used verbatim
/// - objects with a `text` field use that field
/// - image objects become [`IMAGE_PLACEHOLDER`]
/// - any other object is written as its JSON text
///
/// Null parts are dropped. The joined result is trimmed.
///
/// # Example
///
/// ```
/// use chatgpt2md::parser::join_parts;
/// use serde_json::json;
///
/// let parts = [json!("Look:"), json!({"content_type": "image_asset_pointer"})];
/// let joined = join_parts(&parts);
/// assert_eq!(joined.text, "Look:\n[Image attachment]");
/// assert!(joined.has_text);
/// ```
#[must_use]
pub fn join_parts(parts: &[Value]) -> JoinedParts {
    let mut has_text = false;
    let mut pieces = Vec::with_capacity(parts.len());

    for part in parts {
        let piece = match part {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Object(map) => {
                if let Some(text) = map.get("text") {
                    text.as_str().map_or_else(|| text.to_string(), str::to_owned)
                } else if is_image(part) {
                    pieces.push(IMAGE_PLACEHOLDER.to_owned());
                    continue;
                } else {
                    part.to_string()
                }
            }
            other => other.to_string(),
        };
        has_text |= !piece.trim().is_empty();
        pieces.push(piece);
    }

    JoinedParts {
        text: pieces.join("\n").trim().to_owned(),
        has_text,
    }
}

/// Returns `true` if the part is tagged as an image attachment.
fn is_image(part: &Value) -> bool {
    ["content_type", "type"]
        .into_iter()
        .filter_map(|key| get_str(part, &[key]))
        .any(|tag| IMAGE_CONTENT_TYPES.contains(&tag))
}

/// Navigates a JSON path and returns the string value at the end.
///
/// # Arguments
///
/// * `value` - The root JSON value to navigate from
/// * `path` - A sequence of keys to follow through the JSON structure
pub(crate) fn get_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    current.as_str()
}

const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
