// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Markdown rendering for extracted conversations.
//!
//! This module turns a [`Document`] into a Markdown file with a YAML
//! frontmatter block, so the output can be dropped straight into a notes
//! vault and queried by date or source.
//!
//! # Output Format
//!
//! The rendered Markdown includes:
//! - A `---` delimited frontmatter block with `source` and `asked_date`
//! - A top-level heading with the conversation title
//! - A blockquote showing the asked date
//! - `## 🧑 User` and `## 🤖 ChatGPT` sections for each message
//!
//! # Example
//!
//! ```
//! use chatgpt2md::parser::{Message, Role};
//! use chatgpt2md::renderer::{Document, render_document};
//! use chrono::NaiveDate;
//!
//! let messages = vec![
//!     Message { role: Role::User, text: "Hello!".into(), has_text: true },
//!     Message { role: Role::Assistant, text: "Hi there!".into(), has_text: true },
//! ];
//! let doc = Document {
//!     title: "Hello!",
//!     asked_date: NaiveDate::from_ymd_opt(2023, 11, 14),
//!     source_tag: "conversations",
//!     messages: &messages,
//! };
//!
//! let markdown = render_document(&doc).unwrap();
//! assert!(markdown.starts_with("---\n"));
//! assert!(markdown.contains("# Hello!"));
//! assert!(markdown.contains("Hi there!"));
//! ```

use crate::parser::{Message, Role};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fmt::Write;

/// Error type for rendering failures.
#[derive(Debug, Snafu)]
pub enum RenderError {
    /// The frontmatter could not be serialized.
    #[snafu(display("failed to serialize frontmatter: {source}"))]
    Frontmatter {
        /// The underlying YAML error.
        source: serde_yaml::Error,
    },
}

/// Everything needed to render one conversation.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    /// The heading title (first line of the first user message).
    pub title: &'a str,

    /// The date the conversation was started, if known.
    pub asked_date: Option<NaiveDate>,

    /// Name of the archive the conversation came from.
    pub source_tag: &'a str,

    /// The messages to render, in order.
    pub messages: &'a [Message],
}

/// The YAML header at the top of each file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Always `ChatGPT / {source_tag}`.
    pub source: String,

    /// `YYYY-MM-DD`, omitted when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asked_date: Option<String>,
}

impl Frontmatter {
    /// Builds the frontmatter for a document.
    #[must_use]
    pub fn for_document(doc: &Document<'_>) -> Self {
        Self {
            source: format!("ChatGPT / {}", doc.source_tag),
            asked_date: doc.asked_date.map(format_date),
        }
    }
}

/// Returns the heading label for a role.
#[must_use]
pub const fn role_heading(role: Role) -> &'static str {
    match role {
        Role::User => "🧑 User",
        Role::Assistant => "🤖 ChatGPT",
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Renders a conversation as Markdown.
///
/// # Errors
///
/// Returns an error if the frontmatter cannot be serialized as YAML. The
/// Markdown body is written into a `String` and cannot fail.
pub fn render_document(doc: &Document<'_>) -> Result<String, RenderError> {
    let yaml = serde_yaml::to_string(&Frontmatter::for_document(doc)).context(FrontmatterSnafu)?;

    let mut out = String::new();
    out.push_str("---\n");
    // serde_yaml 0.8 prefixed documents with a start marker; 0.9 does not
    out.push_str(yaml.strip_prefix("---\n").unwrap_or(&yaml));
    out.push_str("---\n\n");

    write_body(&mut out, doc);
    Ok(out)
}

fn write_body(out: &mut String, doc: &Document<'_>) {
    let _ = writeln!(out, "# {}\n", doc.title);

    if let Some(date) = doc.asked_date {
        let _ = writeln!(out, "> 🗓 Asked: {}\n", format_date(date));
    }

    for message in doc.messages {
        let _ = writeln!(out, "## {}", role_heading(message.role));
        let _ = writeln!(out, "{}\n", message.text);
    }
}

/// Splits the frontmatter block off a rendered document and parses it.
///
/// Returns `None` if the document does not start with a `---` block or the
/// block is not valid frontmatter.
#[must_use]
pub fn parse_frontmatter(markdown: &str) -> Option<Frontmatter> {
    let rest = markdown.strip_prefix("---\n")?;
    let end = rest.find("\n---\n")?;
    serde_yaml::from_str(&rest[..=end]).ok()
}
