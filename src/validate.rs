//! Deserialize a merged table back into a typed object, tracking keys the
//! type does not consume.
//!
//! Unknown keys are not fatal: they come back as an [`EnvOverlayError::UnknownKeys`]
//! warning beside the deserialized value, each with its file path and
//! best-effort line number. Type mismatches are fatal.

use std::path::Path;

use serde::de::DeserializeOwned;
use toml::Table;

use crate::error::EnvOverlayError;

/// Deserialize `merged` into `C`, collecting every key `C` ignores.
///
/// `content` is the original file text, used only to locate unknown keys.
pub fn deserialize_tracking_unknown<C: DeserializeOwned>(
    merged: Table,
    content: &str,
    path: &Path,
) -> Result<(C, Option<EnvOverlayError>), EnvOverlayError> {
    let mut unknown_keys: Vec<String> = Vec::new();

    let value: C = serde_ignored::deserialize(toml::Value::Table(merged), |ignored_path| {
        unknown_keys.push(ignored_path.to_string());
    })
    .map_err(|e| EnvOverlayError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if unknown_keys.is_empty() {
        return Ok((value, None));
    }

    let errors: Vec<EnvOverlayError> = unknown_keys
        .into_iter()
        .map(|key| {
            let line = find_key_line(content, &key);
            EnvOverlayError::UnknownKey {
                key,
                path: path.to_path_buf(),
                line,
            }
        })
        .collect();

    Ok((value, Some(EnvOverlayError::UnknownKeys(errors))))
}

/// Find the 1-indexed line number for a key in TOML content.
///
/// For a dotted key like `"sec1.k1.typo"`, tracks the current `[section]`
/// header while scanning and only matches the leaf key inside that section.
/// Quoted header segments (`[sec1."k1"]`) are unquoted before comparison.
///
/// Best-effort: inline tables, dotted assignments and subsection names that
/// contain dots are not located. Returns 0 if the key cannot be found.
fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let leaf = segments.last().copied().unwrap_or(dotted_key);
    let expected_section = &segments[..segments.len().saturating_sub(1)];

    let mut current_section: Vec<String> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            current_section = header.split('.').map(unquote).collect();
            continue;
        }

        let in_right_section = expected_section.len() == current_section.len()
            && expected_section
                .iter()
                .zip(&current_section)
                .all(|(a, b)| *a == b);

        if !in_right_section {
            continue;
        }

        let after_key = trimmed
            .strip_prefix(leaf)
            .or_else(|| strip_quoted(trimmed, leaf));
        if let Some(after_key) = after_key
            && after_key.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}

fn unquote(segment: &str) -> String {
    let segment = segment.trim();
    segment
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| segment.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(segment)
        .to_string()
}

fn strip_quoted<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix('"')?;
    rest.strip_prefix(key)?.strip_prefix('"')
}
