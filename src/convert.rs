// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! The conversion pipeline: find archives, split them into conversations,
//! and write one Markdown file per conversation.
//!
//! Every archive and every conversation is handled on its own. A broken
//! archive or a failed write is logged and counted, and the run carries on
//! with the next one.
//!
//! # Example
//!
//! ```no_run
//! use chatgpt2md::convert::{Options, run};
//!
//! let opts = Options {
//!     inputs: vec![".".into()],
//!     output_dir: "chatgpt_md".into(),
//!     dry_run: false,
//! };
//!
//! let summary = run(&opts, |_| {}).unwrap();
//! println!("{summary}");
//! ```

use crate::naming::{derive_title, file_name};
use crate::parser::{self, ArchiveError};
use crate::renderer::{self, Document, RenderError};
use crate::timestamp;
use serde_json::Value;
use snafu::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Archives with this exact file name hold account details, not chats.
pub const ACCOUNT_FILE_NAME: &str = "user.json";

/// Output directory used when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "chatgpt_md";

/// Error type for conversion failures.
#[derive(Debug, Snafu)]
pub enum Error {
    /// The output directory could not be created.
    #[snafu(display("failed to create output directory {}: {source}", path.display()))]
    CreateOutputDir {
        /// The directory that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An archive could not be read.
    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        /// The archive path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An archive could not be parsed.
    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFile {
        /// The archive path.
        path: PathBuf,
        /// The underlying parse error.
        source: ArchiveError,
    },

    /// A conversation could not be rendered.
    #[snafu(display("failed to render conversation: {source}"))]
    Render {
        /// The underlying rendering error.
        source: RenderError,
    },

    /// An output file could not be written.
    #[snafu(display("failed to write {}: {source}", path.display()))]
    WriteFile {
        /// The output path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Settings for a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Archive files or directories to search for archives.
    pub inputs: Vec<PathBuf>,

    /// Directory that receives the Markdown files.
    pub output_dir: PathBuf,

    /// Report what would be written without touching the filesystem.
    pub dry_run: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            inputs: vec![PathBuf::from(".")],
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            dry_run: false,
        }
    }
}

/// What happened to a single conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No user or assistant messages; nothing was written.
    Empty,
    /// The file was written.
    Written(PathBuf),
    /// The file would have been written (dry run).
    WouldWrite(PathBuf),
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Archives that were read and parsed.
    pub archives: usize,
    /// Archives skipped because they could not be read or parsed.
    pub skipped_archives: usize,
    /// Conversations attempted, including empty and failed ones.
    pub processed: usize,
    /// Files written (or, in a dry run, that would be written).
    pub written: usize,
    /// Conversations with no user or assistant messages.
    pub empty: usize,
    /// Conversations that could not be rendered or written.
    pub failed: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "✅ Converted {} conversations from {} archives ({} files written",
            self.processed, self.archives, self.written
        )?;
        if self.empty > 0 {
            write!(f, ", {} empty", self.empty)?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.skipped_archives > 0 {
            write!(f, ", {} archives skipped", self.skipped_archives)?;
        }
        f.write_str(")")
    }
}

/// Runs a full conversion.
///
/// `report` is called once per conversation with its [`Outcome`], in
/// processing order.
///
/// # Errors
///
/// Returns an error only if the output directory cannot be created.
/// Problems with individual archives or conversations are logged and
/// counted in the returned [`Summary`].
pub fn run(opts: &Options, mut report: impl FnMut(&Outcome)) -> Result<Summary, Error> {
    if !opts.dry_run {
        std::fs::create_dir_all(&opts.output_dir).context(CreateOutputDirSnafu {
            path: &opts.output_dir,
        })?;
    }

    let mut summary = Summary::default();
    let mut seen = HashSet::new();

    for archive in discover_archives(&opts.inputs, &opts.output_dir) {
        let conversations = match load_archive(&archive) {
            Ok(conversations) => conversations,
            Err(err) => {
                warn!("skipping archive: {err}");
                summary.skipped_archives += 1;
                continue;
            }
        };

        summary.archives += 1;
        let tag = source_tag(&archive);
        debug!(
            path = %archive.display(),
            conversations = conversations.len(),
            "converting archive"
        );

        for conversation in &conversations {
            summary.processed += 1;
            match convert_conversation(conversation, &tag, &opts.output_dir, opts.dry_run) {
                Ok(outcome) => {
                    match &outcome {
                        Outcome::Empty => summary.empty += 1,
                        Outcome::Written(path) | Outcome::WouldWrite(path) => {
                            summary.written += 1;
                            if !seen.insert(path.clone()) {
                                warn!(
                                    path = %path.display(),
                                    "filename collision, earlier conversation overwritten"
                                );
                            }
                        }
                    }
                    report(&outcome);
                }
                Err(err) => {
                    warn!(archive = %archive.display(), "skipping conversation: {err}");
                    summary.failed += 1;
                }
            }
        }
    }

    Ok(summary)
}

/// Collects archive files from the given inputs (files and directories).
///
/// Directories are searched recursively for `.json` files, in file name
/// order. Files named [`ACCOUNT_FILE_NAME`] and anything inside `exclude`
/// are left out.
#[must_use]
pub fn discover_archives(inputs: &[PathBuf], exclude: &Path) -> Vec<PathBuf> {
    let excluded = std::fs::canonicalize(exclude).ok();
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    !(e.file_type().is_dir()
                        && excluded.is_some()
                        && std::fs::canonicalize(e.path()).ok() == excluded)
                })
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                .filter(|e| !is_account_file(e.path()))
            {
                files.push(entry.path().to_path_buf());
            }
        } else if is_account_file(input) {
            debug!(path = %input.display(), "skipping account file");
        } else {
            files.push(input.clone());
        }
    }

    files
}

fn is_account_file(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == ACCOUNT_FILE_NAME)
}

/// Reads and parses one archive into its conversations.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON object or
/// array.
pub fn load_archive(path: &Path) -> Result<Vec<Value>, Error> {
    let json = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
    parser::parse_archive(&json).context(ParseFileSnafu { path })
}

/// Returns the tag naming an archive in output files: its file stem.
#[must_use]
pub fn source_tag(path: &Path) -> String {
    path.file_stem().map_or_else(
        || "archive".to_owned(),
        |stem| stem.to_string_lossy().into_owned(),
    )
}

/// Converts one conversation and writes it into `out_dir`.
///
/// Conversations without user or assistant messages produce no file. An
/// existing file with the same name is overwritten.
///
/// # Errors
///
/// Returns an error if rendering or writing the file fails.
pub fn convert_conversation(
    conversation: &Value,
    source_tag: &str,
    out_dir: &Path,
    dry_run: bool,
) -> Result<Outcome, Error> {
    let messages = parser::walk(conversation);
    let Some(title) = derive_title(&messages) else {
        return Ok(Outcome::Empty);
    };

    let asked = timestamp::normalize(conversation.get("create_time"));
    if asked.is_defaulted() {
        warn!(title = %title, origin = ?asked.origin, "using today's date {asked}");
    }

    let date = asked.to_string();
    let out_path = out_dir.join(file_name(&date, source_tag, &title));

    if dry_run {
        return Ok(Outcome::WouldWrite(out_path));
    }

    let markdown = renderer::render_document(&Document {
        title: &title,
        asked_date: Some(asked.date),
        source_tag,
        messages: &messages,
    })
    .context(RenderSnafu)?;

    std::fs::write(&out_path, markdown).context(WriteFileSnafu { path: &out_path })?;
    debug!(path = %out_path.display(), messages = messages.len(), "wrote conversation");

    Ok(Outcome::Written(out_path))
}
