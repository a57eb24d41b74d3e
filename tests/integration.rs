// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Integration tests for chatgpt2md conversion runs.

use chatgpt2md::convert::{self, Options, Outcome};
use chatgpt2md::renderer::parse_frontmatter;
use chatgpt2md::timestamp;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds a mapping-style conversation like the ones in a real export.
fn tree_conversation(create_time: &serde_json::Value, turns: &[(&str, &str)]) -> serde_json::Value {
    let mut mapping = serde_json::Map::new();
    mapping.insert(
        "root".into(),
        json!({ "message": null, "parent": null, "children": ["m0"] }),
    );
    for (i, (role, text)) in turns.iter().enumerate() {
        mapping.insert(
            format!("m{i}"),
            json!({
                "id": format!("m{i}"),
                "message": {
                    "author": { "role": role },
                    "content": { "content_type": "text", "parts": [text] }
                },
                "children": [format!("m{}", i + 1)]
            }),
        );
    }
    json!({ "title": "ignored", "create_time": create_time, "mapping": mapping })
}

fn write_archive(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn options(input: &Path, output: &Path) -> Options {
    Options {
        inputs: vec![input.to_path_buf()],
        output_dir: output.to_path_buf(),
        dry_run: false,
    }
}

fn expected_date(epoch: i64) -> String {
    timestamp::normalize(Some(&json!(epoch))).to_string()
}

fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Converts the canonical two-message conversation end to end.
#[test]
fn converts_basic_conversation() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let archive = json!({
        "conv-1": tree_conversation(
            &json!(1_700_000_000),
            &[("user", "Hello\nworld"), ("assistant", "Hi there")]
        )
    });
    write_archive(input.path(), "conversations.json", &archive);

    let summary = convert::run(&options(input.path(), output.path()), |_| {}).unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.written, 1);

    let date = expected_date(1_700_000_000);
    let name = format!("{date}_conversations_Hello.md");
    assert_eq!(output_files(output.path()), [name.clone()]);

    let markdown = fs::read_to_string(output.path().join(name)).unwrap();
    let fm = parse_frontmatter(&markdown).unwrap();
    assert_eq!(fm.source, "ChatGPT / conversations");
    assert_eq!(fm.asked_date.as_deref(), Some(date.as_str()));

    assert!(markdown.contains("# Hello\n"));
    assert!(markdown.contains(&format!("> 🗓 Asked: {date}")));
    let user = markdown.find("## 🧑 User\nHello\nworld\n").unwrap();
    let assistant = markdown.find("## 🤖 ChatGPT\nHi there\n").unwrap();
    assert!(user < assistant);
}

/// Conversations with only system/tool messages produce no file but still count.
#[test]
fn skips_conversations_without_user_or_assistant_messages() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let archive = json!([
        tree_conversation(&json!(1_700_000_000), &[("system", "setup"), ("tool", "result")]),
        tree_conversation(&json!(1_700_000_000), &[("user", "Kept")]),
    ]);
    write_archive(input.path(), "conversations.json", &archive);

    let mut outcomes = Vec::new();
    let summary =
        convert::run(&options(input.path(), output.path()), |o| outcomes.push(o.clone())).unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.empty, 1);
    assert_eq!(summary.written, 1);
    assert_eq!(outcomes[0], Outcome::Empty);
    assert_eq!(output_files(output.path()).len(), 1);
}

/// An image-only conversation gets the placeholder title and is still written.
#[test]
fn image_only_conversation_uses_placeholder_title() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let archive = json!([{
        "create_time": 1_700_000_000,
        "mapping": {
            "a": { "message": {
                "author": { "role": "user" },
                "content": {
                    "content_type": "multimodal_text",
                    "parts": [{ "content_type": "image_asset_pointer",
                                "asset_pointer": "file-service://file-123" }]
                }
            } }
        }
    }]);
    write_archive(input.path(), "images.json", &archive);

    convert::run(&options(input.path(), output.path()), |_| {}).unwrap();

    let date = expected_date(1_700_000_000);
    let name = format!("{date}_images_No text (attachments only).md");
    let markdown = fs::read_to_string(output.path().join(name)).unwrap();
    assert!(markdown.contains("# No text (attachments only)\n"));
    assert!(markdown.contains("## 🧑 User\n[Image attachment]\n"));
}

/// `user.json` holds account data and is never converted.
#[test]
fn never_processes_user_json() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let conv = json!([tree_conversation(&json!(1_700_000_000), &[("user", "From user file")])]);
    write_archive(input.path(), "user.json", &conv);

    let summary = convert::run(&options(input.path(), output.path()), |_| {}).unwrap();

    assert_eq!(summary.archives, 0);
    assert_eq!(summary.processed, 0);
    assert!(output_files(output.path()).is_empty());
}

/// Broken archives are skipped without affecting the others.
#[test]
fn skips_invalid_archives() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    fs::write(input.path().join("a-broken.json"), "{ not json").unwrap();
    fs::write(input.path().join("b-scalar.json"), "42").unwrap();
    write_archive(
        input.path(),
        "c-good.json",
        &json!([tree_conversation(&json!(1_700_000_000), &[("user", "Fine")])]),
    );

    let summary = convert::run(&options(input.path(), output.path()), |_| {}).unwrap();

    assert_eq!(summary.skipped_archives, 2);
    assert_eq!(summary.archives, 1);
    assert_eq!(summary.written, 1);
}

/// Two conversations with the same date, source and title share a file; the later wins.
#[test]
fn later_conversation_overwrites_same_filename() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let archive = json!([
        tree_conversation(&json!(1_700_000_000), &[("user", "Same"), ("assistant", "first")]),
        tree_conversation(&json!(1_700_000_100), &[("user", "Same"), ("assistant", "second")]),
    ]);
    write_archive(input.path(), "conversations.json", &archive);

    let summary = convert::run(&options(input.path(), output.path()), |_| {}).unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.written, 2);
    let files = output_files(output.path());
    assert_eq!(files.len(), 1);

    let markdown = fs::read_to_string(output.path().join(&files[0])).unwrap();
    assert!(markdown.contains("second"));
    assert!(!markdown.contains("first"));
}

/// Only the first user message's first line names the file, sanitized and truncated.
#[test]
fn sanitizes_long_titles_in_filenames() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let question = format!("Why does a/b: {}?\nDetails follow", "x".repeat(120));
    let archive = json!([tree_conversation(&json!(1_700_000_000), &[("user", question.as_str())])]);
    write_archive(input.path(), "conversations.json", &archive);

    convert::run(&options(input.path(), output.path()), |_| {}).unwrap();

    let files = output_files(output.path());
    let date = expected_date(1_700_000_000);
    let title = files[0]
        .strip_prefix(&format!("{date}_conversations_"))
        .and_then(|rest| rest.strip_suffix(".md"))
        .unwrap();
    assert_eq!(title.chars().count(), 80);
    assert!(title.starts_with("Why does ab "));

    // the heading keeps the unsanitized first line
    let markdown = fs::read_to_string(output.path().join(&files[0])).unwrap();
    assert!(markdown.contains(&format!("# Why does a/b: {}?\n", "x".repeat(120))));
}

/// Epoch and ISO-8601 create times for the same instant land on the same file date.
#[test]
fn epoch_and_iso_create_times_agree() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let archive = json!([
        tree_conversation(&json!(1_700_000_000), &[("user", "Epoch")]),
        tree_conversation(&json!("2023-11-14T22:13:20Z"), &[("user", "Iso")]),
    ]);
    write_archive(input.path(), "conversations.json", &archive);

    convert::run(&options(input.path(), output.path()), |_| {}).unwrap();

    let date = expected_date(1_700_000_000);
    assert_eq!(
        output_files(output.path()),
        [
            format!("{date}_conversations_Epoch.md"),
            format!("{date}_conversations_Iso.md"),
        ]
    );
}

/// Dry runs report the files they would write and leave the output alone.
#[test]
fn dry_run_writes_nothing() {
    let input = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let output = scratch.path().join("never-created");
    write_archive(
        input.path(),
        "conversations.json",
        &json!([tree_conversation(&json!(1_700_000_000), &[("user", "Hello")])]),
    );

    let mut planned = Vec::new();
    let opts = Options {
        dry_run: true,
        ..options(input.path(), &output)
    };
    let summary = convert::run(&opts, |o| planned.push(o.clone())).unwrap();

    assert_eq!(summary.written, 1);
    assert!(matches!(&planned[0], Outcome::WouldWrite(p) if p.starts_with(&output)));
    assert!(!output.exists());
}

/// A flat export (messages listed directly) converts like the tree format.
#[test]
fn converts_flat_message_list() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let archive = json!([{
        "create_time": "2024-03-01",
        "messages": [
            { "message": { "author": { "role": "user" }, "content": { "parts": ["Flat question"] } } },
            { "message": { "author": { "role": "assistant" }, "content": { "parts": [{ "text": "Flat answer" }] } } }
        ]
    }]);
    let path = write_archive(input.path(), "flat.json", &archive);

    let opts = Options {
        inputs: vec![path],
        ..options(input.path(), output.path())
    };
    convert::run(&opts, |_| {}).unwrap();

    let markdown =
        fs::read_to_string(output.path().join("2024-03-01_flat_Flat question.md")).unwrap();
    assert!(markdown.contains("Flat answer"));
}

/// A conversation that cannot be written does not stop the ones after it.
#[test]
fn failed_conversation_does_not_abort_the_rest() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let archive = json!([
        tree_conversation(&json!(1_700_000_000), &[("user", "Blocked"), ("assistant", "lost")]),
        tree_conversation(&json!(1_700_000_000), &[("user", "Open"), ("assistant", "kept")]),
    ]);
    write_archive(input.path(), "conversations.json", &archive);

    // a directory where the first file should go makes its write fail
    let date = expected_date(1_700_000_000);
    fs::create_dir(output.path().join(format!("{date}_conversations_Blocked.md"))).unwrap();

    let mut outcomes = Vec::new();
    let summary =
        convert::run(&options(input.path(), output.path()), |o| outcomes.push(o.clone())).unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.written, 1);

    let later = output.path().join(format!("{date}_conversations_Open.md"));
    assert_eq!(outcomes, [Outcome::Written(later.clone())]);
    assert!(fs::read_to_string(later).unwrap().contains("kept"));
}
