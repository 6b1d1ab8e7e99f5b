//! Properties mapper.
//!
//! Reads `key=value` documents:
//!
//! ```text
//! # comment
//! ! also a comment
//! database.host = localhost
//! database.port: 5432
//! servers[0].name = alpha
//! motd = first line \
//!        continued
//! ```
//!
//! Dotted and indexed keys are expanded into nested tables and arrays, so a
//! properties document merges with a JSON document of the same shape. All
//! leaf values are strings; accessors coerce them on read. A key that is not
//! a valid path (for example one containing spaces) is stored literally at
//! the top level. When two lines address the same key the later one wins.
//! Indices above `MAX_ARRAY_INDEX` are rejected as parse errors.

use crate::error::{ConfigError, ConfigErrors, SourceErrorKind};
use crate::mapper::Mapper;
use crate::path::{CompiledPath, Segment};
use crate::source::RawDocument;
use crate::value::Value;

/// Largest array index a key may address. Arrays are filled up to the index,
/// so an unbounded index would allocate without limit.
pub(crate) const MAX_ARRAY_INDEX: usize = 10_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct PropertiesMapper;

impl Mapper for PropertiesMapper {
    fn apply(&self, raw: &RawDocument) -> Result<Value, ConfigErrors> {
        let mut root = Value::table();

        for (line_no, line) in logical_lines(&raw.content) {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }

            let (raw_key, raw_value) = split_pair(trimmed);
            let parse_error = |message: String| {
                ConfigErrors::single(ConfigError::SourceError {
                    source_name: raw.origin.clone(),
                    kind: SourceErrorKind::ParseError {
                        message,
                        line: Some(line_no),
                        column: None,
                    },
                })
            };
            let key = unescape(raw_key).map_err(parse_error)?;
            let value = unescape(raw_value).map_err(parse_error)?;

            match CompiledPath::compile(&key) {
                Ok(path) if !path.is_root() => {
                    insert_value(&mut root, path.segments(), Value::String(value))
                        .map_err(parse_error)?
                }
                _ => {
                    if let Value::Table(table) = &mut root {
                        table.insert(key, Value::String(value));
                    }
                }
            }
        }

        Ok(root)
    }

    fn name(&self) -> &str {
        "properties"
    }
}

/// Escape a value so it reads back unchanged as a properties value.
pub(crate) fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, ch) in value.chars().enumerate() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '=' => out.push_str("\\="),
            ':' => out.push_str("\\:"),
            ' ' if i == 0 => out.push_str("\\ "),
            other => out.push(other),
        }
    }
    out
}

/// Join continuation lines, yielding each logical line with the 1-indexed
/// number of its first physical line.
fn logical_lines(content: &str) -> Vec<(u32, String)> {
    let mut lines = Vec::new();
    let mut current: Option<(u32, String)> = None;

    for (idx, physical) in content.lines().enumerate() {
        let line_no = idx as u32 + 1;
        let piece = match &current {
            Some(_) => physical.trim_start(),
            None => physical,
        };

        let continues = ends_with_continuation(piece);
        let piece = if continues {
            &piece[..piece.len() - 1]
        } else {
            piece
        };

        let (start, mut text) = current.take().unwrap_or((line_no, String::new()));
        text.push_str(piece);

        if continues {
            current = Some((start, text));
        } else {
            lines.push((start, text));
        }
    }

    if let Some(last) = current {
        lines.push(last);
    }
    lines
}

/// An odd number of trailing backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Split a logical line at the first unescaped `=`, `:` or whitespace.
fn split_pair(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches([' ', '\t']);
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest);
    (key, rest.trim_start_matches([' ', '\t']))
}

fn unescape(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('f') => out.push('\u{000c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("invalid unicode escape '\\u{}'", hex))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

/// Insert a value into a tree following path segments, creating tables and
/// arrays along the way. A scalar in the way is replaced.
fn insert_value(root: &mut Value, segments: &[Segment], value: Value) -> Result<(), String> {
    let Some((first, rest)) = segments.split_first() else {
        *root = value;
        return Ok(());
    };

    let empty_child = || match rest.first() {
        Some(Segment::Index(_)) => Value::Array(Vec::new()),
        _ => Value::table(),
    };

    match first {
        Segment::Key(key) => {
            if !root.is_table() {
                *root = Value::table();
            }
            match root {
                Value::Table(table) => {
                    let child = table.entry(key.clone()).or_insert_with(empty_child);
                    insert_value(child, rest, value)
                }
                _ => Ok(()),
            }
        }
        Segment::Index(index) => {
            let index = *index;
            if index > MAX_ARRAY_INDEX {
                return Err(format!(
                    "array index {} exceeds the maximum of {}",
                    index, MAX_ARRAY_INDEX
                ));
            }
            if !root.is_array() {
                *root = Value::Array(Vec::new());
            }
            match root {
                Value::Array(items) => {
                    if items.len() <= index {
                        items.resize(index + 1, Value::Null);
                    }
                    let child = &mut items[index];
                    if child.is_null() && !rest.is_empty() {
                        *child = empty_child();
                    }
                    insert_value(child, rest, value)
                }
                _ => Ok(()),
            }
        }
    }
}
