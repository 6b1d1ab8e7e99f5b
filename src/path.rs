//! Compiled path expressions.
//!
//! A `CompiledPath` addresses a node inside a document using dot/bracket
//! notation (`$.servers[0].host`, `$['servers'][0]['host']`, `servers.0`
//! is *not* an index). Paths are validated when compiled; query features
//! such as filters, scripts, wildcards, slices and recursive descent are
//! rejected up front so nothing downstream has to handle them.
//!
//! The canonical string form (`$['a']['b'][0]`) is what equality, hashing and
//! ordering use, so a path compiled from `a.b[0]` and one compiled from
//! `$['a']["b"][0]` are the same key in a map.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ConfigError, ConfigErrors};
use crate::value::Value;

/// One step of a compiled path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member name
    Key(String),
    /// Array position
    Index(usize),
}

/// A validated, canonicalized path expression.
#[derive(Debug, Clone)]
pub struct CompiledPath {
    segments: Vec<Segment>,
    canonical: String,
}

impl CompiledPath {
    /// Compile a path expression.
    ///
    /// # Errors
    ///
    /// Returns a `PathError` for empty input and for any unsupported or
    /// malformed segment.
    pub fn compile(expression: &str) -> Result<Self, ConfigErrors> {
        Parser::new(expression)
            .parse()
            .map(Self::from_segments)
            .map_err(ConfigErrors::single)
    }

    /// The document root (`$`).
    pub fn root() -> Self {
        Self::from_segments(Vec::new())
    }

    fn from_segments(segments: Vec<Segment>) -> Self {
        let mut canonical = String::from("$");
        for segment in &segments {
            push_canonical(&mut canonical, segment);
        }
        Self {
            segments,
            canonical,
        }
    }

    /// Extend this path by an object member.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let segment = Segment::Key(key.into());
        let mut canonical = self.canonical.clone();
        push_canonical(&mut canonical, &segment);
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self {
            segments,
            canonical,
        }
    }

    /// Extend this path by an array index.
    pub fn index(&self, index: usize) -> Self {
        let segment = Segment::Index(index);
        let mut canonical = self.canonical.clone();
        push_canonical(&mut canonical, &segment);
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self {
            segments,
            canonical,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Canonical bracket form, e.g. `$['a']['b'][0]`.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// The node this path addresses in `root`, if any.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        root.get_compiled(self)
    }
}

fn push_canonical(out: &mut String, segment: &Segment) {
    match segment {
        Segment::Key(key) => {
            out.push_str("['");
            for ch in key.chars() {
                if ch == '\'' || ch == '\\' {
                    out.push('\\');
                }
                out.push(ch);
            }
            out.push_str("']");
        }
        Segment::Index(index) => {
            out.push('[');
            out.push_str(&index.to_string());
            out.push(']');
        }
    }
}

impl PartialEq for CompiledPath {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for CompiledPath {}

impl Hash for CompiledPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for CompiledPath {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CompiledPath {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl fmt::Display for CompiledPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl FromStr for CompiledPath {
    type Err = ConfigErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl TryFrom<&str> for CompiledPath {
    type Error = ConfigErrors;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::compile(value)
    }
}

/// Characters allowed in an unquoted member name.
fn bare_name() -> &'static Regex {
    static BARE_NAME: OnceLock<Regex> = OnceLock::new();
    BARE_NAME.get_or_init(|| {
        Regex::new(r#"^[^.\[\]*'"()?,\s]+$"#).expect("bare name pattern is valid")
    })
}

struct Parser<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn error(&self, position: Option<usize>, message: impl Into<String>) -> ConfigError {
        ConfigError::PathError {
            path: self.input.to_string(),
            position,
            message: message.into(),
        }
    }

    fn parse(mut self) -> Result<Vec<Segment>, ConfigError> {
        if self.input.trim().is_empty() {
            return Err(self.error(None, "path is empty"));
        }

        let mut segments = Vec::new();

        match self.chars.peek().copied() {
            Some((_, '$')) => {
                self.chars.next();
            }
            Some((_, '[')) => {}
            Some((pos, '.')) => {
                return Err(self.error(Some(pos), "path must start with '$', a name or '['"));
            }
            Some((pos, _)) => segments.push(self.bare_segment(pos)?),
            None => return Err(self.error(None, "path is empty")),
        }

        while let Some((pos, ch)) = self.chars.next() {
            match ch {
                '.' => match self.chars.peek().copied() {
                    Some((_, '.')) => {
                        return Err(self.error(Some(pos), "recursive descent is not supported"))
                    }
                    Some((next, '*')) => {
                        return Err(self.error(Some(next), "wildcards are not supported"))
                    }
                    Some((next, _)) => segments.push(self.bare_segment(next)?),
                    None => return Err(self.error(Some(pos), "expected a name after '.'")),
                },
                '[' => segments.push(self.bracket_segment(pos)?),
                other => {
                    return Err(self.error(Some(pos), format!("unexpected character '{}'", other)))
                }
            }
        }

        Ok(segments)
    }

    fn bare_segment(&mut self, start: usize) -> Result<Segment, ConfigError> {
        let mut end = self.input.len();
        while let Some(&(pos, ch)) = self.chars.peek() {
            if ch == '.' || ch == '[' {
                end = pos;
                break;
            }
            self.chars.next();
        }

        let name = &self.input[start..end];
        if name.contains('*') {
            return Err(self.error(Some(start), "wildcards are not supported"));
        }
        if !bare_name().is_match(name) {
            return Err(self.error(
                Some(start),
                format!("'{}' is not a valid unquoted name; use ['...'] quoting", name),
            ));
        }
        Ok(Segment::Key(name.to_string()))
    }

    fn bracket_segment(&mut self, open: usize) -> Result<Segment, ConfigError> {
        let segment = match self.chars.peek().copied() {
            Some((_, quote @ ('\'' | '"'))) => {
                self.chars.next();
                Segment::Key(self.quoted(open, quote)?)
            }
            Some((pos, '?')) => {
                return Err(self.error(Some(pos), "filter expressions are not supported"))
            }
            Some((pos, '(')) => {
                return Err(self.error(Some(pos), "script expressions are not supported"))
            }
            Some((pos, '*')) => return Err(self.error(Some(pos), "wildcards are not supported")),
            Some((pos, _)) => Segment::Index(self.index(pos)?),
            None => return Err(self.error(Some(open), "unterminated '['")),
        };

        match self.chars.next() {
            Some((_, ']')) => Ok(segment),
            Some((pos, ',')) => Err(self.error(Some(pos), "unions are not supported")),
            Some((pos, other)) => {
                Err(self.error(Some(pos), format!("expected ']', found '{}'", other)))
            }
            None => Err(self.error(Some(open), "unterminated '['")),
        }
    }

    fn quoted(&mut self, open: usize, quote: char) -> Result<String, ConfigError> {
        let mut name = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, escaped)) => name.push(escaped),
                    None => return Err(self.error(Some(open), "unterminated quoted name")),
                },
                Some((_, ch)) if ch == quote => break,
                Some((_, ch)) => name.push(ch),
                None => return Err(self.error(Some(open), "unterminated quoted name")),
            }
        }
        if name.is_empty() {
            return Err(self.error(Some(open), "quoted name is empty"));
        }
        Ok(name)
    }

    fn index(&mut self, start: usize) -> Result<usize, ConfigError> {
        let mut end = start;
        while let Some(&(pos, ch)) = self.chars.peek() {
            if ch == ']' || ch == ',' {
                break;
            }
            end = pos + ch.len_utf8();
            self.chars.next();
        }

        let raw = self.input[start..end].trim();
        if raw.contains(':') {
            return Err(self.error(Some(start), "slices are not supported"));
        }
        if raw.starts_with('-') {
            return Err(self.error(Some(start), "negative indices are not supported"));
        }
        raw.parse::<usize>().map_err(|_| {
            self.error(
                Some(start),
                format!("expected an index or a quoted name, found '{}'", raw),
            )
        })
    }
}
