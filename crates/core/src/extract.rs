//! Tolerant extraction of the `{"files": [...]}` payload from free-form
//! model output.
//!
//! Model responses arrive as prose, as a bare JSON document, or wrapped in
//! Markdown code fences. [`extract_json`] tries, in order:
//!
//! 1. the first fence labelled `json` (its result is final, no fallback);
//! 2. every fenced block in order, taking the first that parses as an object;
//! 3. the whole response text.

use std::fmt;

use serde_json::{Map, Value};

use crate::generation::UNKNOWN_FILENAME;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Which extraction strategy produced a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    LabelledBlock,
    WholeText,
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseStrategy::LabelledBlock => f.write_str("json code block"),
            ParseStrategy::WholeText => f.write_str("response text"),
        }
    }
}

/// Errors raised while turning a raw response into file specs.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON in {strategy}: {source}")]
    InvalidJson {
        strategy: ParseStrategy,
        source: serde_json::Error,
    },

    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("`files` must be an array, found {found}")]
    FilesNotArray { found: &'static str },

    #[error("entry {index} of `files` is not an object")]
    InvalidEntry { index: usize },
}

/// One document described by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub filename: Option<String>,
    pub content: String,
    pub file_type: Option<String>,
}

impl FileSpec {
    /// The filename, or [`UNKNOWN_FILENAME`] when the entry omitted it.
    pub fn filename(&self) -> &str {
        self.filename.as_deref().unwrap_or(UNKNOWN_FILENAME)
    }

    /// The declared file type, or `default` when absent or blank.
    pub fn file_type_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.file_type.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => default,
        }
    }
}

/// Extract the top-level JSON object from a raw model response.
pub fn extract_json(raw: &str) -> Result<Map<String, Value>, ParseError> {
    if let Some(start) = raw.find(JSON_FENCE) {
        let rest = &raw[start + JSON_FENCE.len()..];
        let body = rest.find(FENCE).map_or(rest, |end| &rest[..end]);
        return parse_object(body.trim(), ParseStrategy::LabelledBlock);
    }

    if raw.contains(FENCE) {
        let parsed = fenced_blocks(raw)
            .filter_map(|block| serde_json::from_str::<Value>(block).ok())
            .find_map(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            });
        if let Some(map) = parsed {
            return Ok(map);
        }
    }

    parse_object(raw.trim(), ParseStrategy::WholeText)
}

/// Read the `files` array out of an extracted payload.
///
/// A payload without a `files` key yields no files; callers treat that as a
/// successful, empty run.
pub fn parse_files_payload(payload: &Map<String, Value>) -> Result<Vec<FileSpec>, ParseError> {
    let entries = match payload.get("files") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(ParseError::FilesNotArray {
                found: kind_of(other),
            })
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| -> Result<FileSpec, ParseError> {
            let obj = entry
                .as_object()
                .ok_or(ParseError::InvalidEntry { index })?;
            Ok(FileSpec {
                filename: obj
                    .get("filename")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                content: match obj.get("content") {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                },
                file_type: obj
                    .get("file_type")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect()
}

fn parse_object(text: &str, strategy: ParseStrategy) -> Result<Map<String, Value>, ParseError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|source| ParseError::InvalidJson { strategy, source })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ParseError::NotAnObject {
            found: kind_of(&other),
        }),
    }
}

/// Contents of each fenced block, with any info string (`js`, `text`, ...)
/// on the opening line removed.
fn fenced_blocks(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(FENCE)
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, part)| block_body(part))
}

fn block_body(part: &str) -> &str {
    match part.split_once('\n') {
        Some((first, rest)) if is_info_string(first) => rest.trim(),
        _ => part.trim(),
    }
}

fn is_info_string(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && !line.starts_with('{')
        && !line.starts_with('[')
        && !line.contains(char::is_whitespace)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const ONE_FILE: &str =
        r#"{"files":[{"filename":"a.txt","content":"x","file_type":"txt"}]}"#;

    #[test]
    fn labelled_block_is_preferred() {
        let raw = format!("Here you go:\n```json\n{ONE_FILE}\n```\nGood luck!");
        let map = extract_json(&raw).unwrap();
        let files = parse_files_payload(&map).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename(), "a.txt");
        assert_eq!(files[0].content, "x");
    }

    #[test]
    fn labelled_block_without_closing_fence_reads_to_end() {
        let raw = format!("```json\n{ONE_FILE}\n");
        assert!(extract_json(&raw).is_ok());
    }

    #[test]
    fn broken_labelled_block_does_not_fall_back() {
        // A valid object sits in the second block, but the labelled block wins.
        let raw = format!("```json\n{{broken\n```\n\n```\n{ONE_FILE}\n```");
        assert_matches!(
            extract_json(&raw),
            Err(ParseError::InvalidJson {
                strategy: ParseStrategy::LabelledBlock,
                ..
            })
        );
    }

    #[test]
    fn first_parseable_unlabelled_block_wins() {
        let raw = format!(
            "```\nnot json\n```\nthen\n```\n{ONE_FILE}\n```\nand\n```\n{{\"files\": []}}\n```"
        );
        let map = extract_json(&raw).unwrap();
        assert_eq!(parse_files_payload(&map).unwrap().len(), 1);
    }

    #[test]
    fn other_info_strings_are_stripped() {
        let raw = format!("```javascript\n{ONE_FILE}\n```");
        let map = extract_json(&raw).unwrap();
        assert_eq!(parse_files_payload(&map).unwrap()[0].filename(), "a.txt");
    }

    #[test]
    fn blocks_that_parse_to_non_objects_are_skipped() {
        let raw = format!("```\n[1, 2]\n```\n```\n{ONE_FILE}\n```");
        assert!(extract_json(&raw).is_ok());
    }

    #[test]
    fn whole_text_is_the_last_resort() {
        let raw = format!("  \n{ONE_FILE}\n\n");
        assert!(extract_json(&raw).is_ok());
    }

    #[test]
    fn fences_that_never_parse_report_whole_text_error() {
        let raw = "```\nnope\n```";
        assert_matches!(
            extract_json(raw),
            Err(ParseError::InvalidJson {
                strategy: ParseStrategy::WholeText,
                ..
            })
        );
    }

    #[test]
    fn prose_is_rejected() {
        assert_matches!(
            extract_json("not json at all"),
            Err(ParseError::InvalidJson {
                strategy: ParseStrategy::WholeText,
                ..
            })
        );
    }

    #[test]
    fn non_object_root_is_rejected() {
        assert_matches!(
            extract_json("[1, 2, 3]"),
            Err(ParseError::NotAnObject { found: "an array" })
        );
    }

    #[test]
    fn missing_files_key_is_an_empty_run() {
        let map = extract_json(r#"{"documents": []}"#).unwrap();
        assert!(parse_files_payload(&map).unwrap().is_empty());
    }

    #[test]
    fn files_must_be_an_array() {
        let map = extract_json(r#"{"files": "pitch_deck.md"}"#).unwrap();
        assert_matches!(
            parse_files_payload(&map),
            Err(ParseError::FilesNotArray { found: "a string" })
        );
    }

    #[test]
    fn entries_must_be_objects() {
        let map = extract_json(r#"{"files": [{"filename": "a.md"}, 7]}"#).unwrap();
        assert_matches!(
            parse_files_payload(&map),
            Err(ParseError::InvalidEntry { index: 1 })
        );
    }

    #[test]
    fn missing_fields_get_defaults() {
        let map = extract_json(r#"{"files": [{}]}"#).unwrap();
        let files = parse_files_payload(&map).unwrap();
        assert_eq!(files[0].filename(), UNKNOWN_FILENAME);
        assert_eq!(files[0].content, "");
        assert_eq!(files[0].file_type_or("txt"), "txt");
    }

    #[test]
    fn structured_content_is_serialized() {
        let map = extract_json(r#"{"files": [{"filename": "f.json", "content": {"k": 1}}]}"#)
            .unwrap();
        let files = parse_files_payload(&map).unwrap();
        assert_eq!(files[0].content, r#"{"k":1}"#);
    }

    #[test]
    fn array_order_is_preserved() {
        let map = extract_json(
            r#"{"files": [{"filename": "b.md"}, {"filename": "a.md"}, {"filename": "c.md"}]}"#,
        )
        .unwrap();
        let names: Vec<_> = parse_files_payload(&map)
            .unwrap()
            .iter()
            .map(|f| f.filename().to_string())
            .collect();
        assert_eq!(names, ["b.md", "a.md", "c.md"]);
    }
}
