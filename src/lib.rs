// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert ChatGPT conversation exports to Markdown.
//!
//! This crate turns the `conversations.json` archive from a ChatGPT data
//! export into one Markdown file per conversation, each with a YAML
//! frontmatter header and a date-stamped filename.
//!
//! # Overview
//!
//! For each archive, each conversation is:
//!
//! 1. Walked recursively to collect user and assistant messages
//! 2. Dated from its `create_time`
//! 3. Titled from its first user message
//! 4. Rendered as Markdown and written to `{date}_{archive}_{title}.md`
//!
//! # Example
//!
//! ```
//! use chatgpt2md::{naming, parser, renderer, timestamp};
//!
//! let json = r#"[{
//!     "create_time": 1700000000,
//!     "mapping": {
//!         "a": { "message": { "author": { "role": "user" },
//!                             "content": { "parts": ["Hello"] } } },
//!         "b": { "message": { "author": { "role": "assistant" },
//!                             "content": { "parts": ["Hi there!"] } } }
//!     }
//! }]"#;
//!
//! let conversations = parser::parse_archive(json).unwrap();
//! let conversation = &conversations[0];
//! let messages = parser::walk(conversation);
//! let title = naming::derive_title(&messages).unwrap();
//! let asked = timestamp::normalize(conversation.get("create_time"));
//!
//! let markdown = renderer::render_document(&renderer::Document {
//!     title: &title,
//!     asked_date: Some(asked.date),
//!     source_tag: "conversations",
//!     messages: &messages,
//! })
//! .unwrap();
//!
//! assert!(markdown.contains("# Hello"));
//! ```
//!
//! # Modules
//!
//! - [`parser`]: archive loading, the message tree walk and part joining
//! - [`timestamp`]: `create_time` normalization
//! - [`naming`]: titles, filename sanitization and output names
//! - [`renderer`]: Markdown and frontmatter generation
//! - [`convert`]: the end-to-end conversion run

#![deny(missing_docs)]

pub mod convert;
pub mod naming;
pub mod parser;
pub mod renderer;
pub mod timestamp;
