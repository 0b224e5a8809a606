//! Loading messages from `.eml` files, directories and JSON records.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mailcode_core::EmailMessage;
use mailcode_mime::Message;
use serde::Deserialize;
use tracing::{debug, warn};

/// A JSON document holding either one record or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonMessages {
    Many(Vec<EmailMessage>),
    One(EmailMessage),
}

/// Reads every message named by `paths`.
///
/// Each path is a directory (its `.eml` files, sorted by name), a `.json`
/// file of records, or a raw message. Messages that fail MIME decoding are
/// logged and skipped; unreadable files are errors.
pub fn load_messages(paths: &[PathBuf]) -> Result<Vec<EmailMessage>> {
    let mut messages = Vec::new();

    for path in paths {
        if path.is_dir() {
            for file in eml_files(path)? {
                messages.extend(read_eml(&file)?);
            }
        } else if has_extension(path, "json") {
            messages.extend(read_json(path)?);
        } else {
            messages.extend(read_eml(path)?);
        }
    }

    debug!(count = messages.len(), "loaded messages");
    Ok(messages)
}

fn eml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?;

    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", dir.display()))?
            .path();
        if path.is_file() && has_extension(&path, "eml") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

fn read_json(path: &Path) -> Result<Vec<EmailMessage>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed: JsonMessages = serde_json::from_str(&contents)
        .with_context(|| format!("invalid message records in {}", path.display()))?;

    Ok(match parsed {
        JsonMessages::Many(messages) => messages,
        JsonMessages::One(message) => vec![message],
    })
}

/// Reads one raw message. `None` when it cannot be decoded.
fn read_eml(path: &Path) -> Result<Option<EmailMessage>> {
    let raw = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let fallback_id = path.display().to_string();

    let email = Message::parse(&raw).and_then(|message| message.to_email(&fallback_id));
    match email {
        Ok(email) => Ok(Some(email)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping undecodable message");
            Ok(None)
        }
    }
}
