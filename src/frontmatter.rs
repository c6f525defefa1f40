//! Frontmatter extraction without executing anything.
//!
//! Two source kinds carry metadata:
//!
//! ## Markup header
//!
//! A delimited block at the very start of a `.md`/`.mdx` file. `---` fences
//! hold YAML, `+++` fences hold TOML:
//!
//! ```text
//! ---
//! title: "Getting started"
//! date: 2024-01-15
//! draft: false
//! ---
//! # Body starts here
//! ```
//!
//! A file without a well-formed leading block simply has no metadata. A
//! block that is present but does not parse is an [`ExtractError`].
//!
//! ## Script literal
//!
//! Script sources (`.tsx`, `.ts`, `.jsx`, `.js`) declare an object at the top
//! level:
//!
//! ```text
//! export const frontmatter = {
//!   title: "Interactive demo",
//!   tags: ["charts", `svg`],
//!   render: () => <Chart />,      // dropped, everything else survives
//! };
//! ```
//!
//! The object is captured by brace matching that understands strings (three
//! quote styles), line comments and block comments, then parsed by a tiny
//! evaluator that only knows literals, negated numbers, arrays, objects and
//! substitution-free templates. Any other expression evaluates to nothing
//! and its property is dropped; the rest of the object is kept.
//!
//! ## Normalization
//!
//! Only `title`, `description`, `link`, `date`, `draft` and `visibility` are
//! kept. Strings and numbers are accepted for the text fields, `draft` must
//! be a boolean, TOML datetimes become ISO-8601 strings.

use crate::types::Metadata;
use pulldown_cmark::{Event, Parser};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("frontmatter is not a key/value mapping")]
    NotAMapping,
    #[error("unterminated {0}")]
    Unterminated(&'static str),
    #[error("not a source file with frontmatter: {0}")]
    Unsupported(String),
}

/// How a file declares its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Markup,
    Script,
}

impl SourceKind {
    pub fn of_path(path: &str) -> Option<SourceKind> {
        let ext = crate::path::extension(path)?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "mdx" => Some(SourceKind::Markup),
            "tsx" | "ts" | "jsx" | "js" => Some(SourceKind::Script),
            _ => None,
        }
    }
}

/// Extract metadata from file contents. Never fails: anything that cannot
/// be read as frontmatter yields empty metadata.
pub fn extract_metadata(contents: &str, kind: SourceKind) -> Metadata {
    parse_metadata(contents, kind).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "frontmatter not extracted");
        Metadata::default()
    })
}

/// Strict form of [`extract_metadata`]: a missing header or declaration is
/// still `Ok(empty)`, but a malformed one is an error.
pub fn parse_metadata(contents: &str, kind: SourceKind) -> Result<Metadata, ExtractError> {
    let fields = match kind {
        SourceKind::Markup => parse_header(contents)?,
        SourceKind::Script => parse_script(contents)?,
    };
    Ok(fields.map(metadata_from).unwrap_or_default())
}

/// Read and extract one file.
pub fn extract_file(path: &Path) -> Result<Metadata, ExtractError> {
    let kind = path
        .to_str()
        .and_then(SourceKind::of_path)
        .ok_or_else(|| ExtractError::Unsupported(path.display().to_string()))?;
    let contents = std::fs::read_to_string(path)?;
    parse_metadata(&contents, kind)
}

/// Extract every markup and script file in `paths` (relative to `root`).
///
/// Files that fail to read or parse are logged and skipped; only non-empty
/// metadata is returned, keyed by the relative path as given.
pub fn extract_all<S: AsRef<str>>(root: &Path, paths: &[S]) -> HashMap<String, Metadata> {
    let mut out = HashMap::new();
    for relative in paths {
        let relative = relative.as_ref();
        if SourceKind::of_path(relative).is_none() {
            continue;
        }
        match extract_file(&root.join(relative)) {
            Ok(meta) if !meta.is_empty() => {
                out.insert(relative.to_string(), meta);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(path = relative, error = %e, "extraction skipped"),
        }
    }
    out
}

/// Content after the leading header block, or all of it when there is none.
pub fn body(contents: &str) -> &str {
    match split_header(contents) {
        Some((_, _, body)) => body,
        None => strip_bom(contents),
    }
}

/// Number of non-empty slides in a deck, split at thematic breaks.
pub fn count_slides(contents: &str) -> usize {
    let mut count = 0;
    let mut has_content = false;
    for event in Parser::new(body(contents)) {
        match event {
            Event::Rule => {
                if has_content {
                    count += 1;
                }
                has_content = false;
            }
            _ => has_content = true,
        }
    }
    if has_content {
        count += 1;
    }
    count
}

// ============================================================================
// Intermediate values
// ============================================================================

/// Loosely-typed value shared by the YAML, TOML and script readers.
#[derive(Debug, Clone, PartialEq)]
enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

fn metadata_from(fields: Vec<(String, Value)>) -> Metadata {
    let mut meta = Metadata::default();
    for (key, value) in fields {
        match key.as_str() {
            "title" => meta.title = text(value),
            "description" => meta.description = text(value),
            "link" => meta.link = text(value),
            "date" => meta.date = text(value),
            "visibility" => meta.visibility = text(value),
            "draft" => {
                meta.draft = match value {
                    Value::Bool(b) => Some(b),
                    _ => None,
                }
            }
            _ => {}
        }
    }
    meta
}

fn text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(format_number(n)),
        _ => None,
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn from_yaml(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Y;
    match value {
        Y::Null => Value::Null,
        Y::Bool(b) => Value::Bool(b),
        Y::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
        Y::String(s) => Value::String(s),
        Y::Sequence(items) => Value::Array(items.into_iter().map(from_yaml).collect()),
        Y::Mapping(map) => Value::Object(
            map.into_iter()
                .filter_map(|(k, v)| match k {
                    Y::String(k) => Some((k, from_yaml(v))),
                    _ => None,
                })
                .collect(),
        ),
        Y::Tagged(tagged) => from_yaml(tagged.value),
    }
}

fn from_toml(value: toml::Value) -> Value {
    use toml::Value as T;
    match value {
        T::String(s) => Value::String(s),
        T::Integer(i) => Value::Number(i as f64),
        T::Float(f) => Value::Number(f),
        T::Boolean(b) => Value::Bool(b),
        T::Datetime(dt) => Value::String(dt.to_string()),
        T::Array(items) => Value::Array(items.into_iter().map(from_toml).collect()),
        T::Table(table) => {
            Value::Object(table.into_iter().map(|(k, v)| (k, from_toml(v))).collect())
        }
    }
}

// ============================================================================
// Markup header
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fence {
    Yaml,
    Toml,
}

impl Fence {
    fn token(self) -> &'static str {
        match self {
            Fence::Yaml => "---",
            Fence::Toml => "+++",
        }
    }
}

fn strip_bom(contents: &str) -> &str {
    contents.strip_prefix('\u{feff}').unwrap_or(contents)
}

/// Split `(fence, header, body)` when the file opens with a closed fence.
fn split_header(contents: &str) -> Option<(Fence, &str, &str)> {
    let contents = strip_bom(contents);
    let mut lines = contents.split_inclusive('\n');
    let first = lines.next()?;
    let fence = match first.trim_end() {
        "---" => Fence::Yaml,
        "+++" => Fence::Toml,
        _ => return None,
    };
    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == fence.token() {
            return Some((fence, &contents[start..offset], &contents[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn parse_header(contents: &str) -> Result<Option<Vec<(String, Value)>>, ExtractError> {
    let Some((fence, header, _)) = split_header(contents) else {
        return Ok(None);
    };
    if header.trim().is_empty() {
        return Ok(None);
    }
    let value = match fence {
        Fence::Yaml => from_yaml(serde_yaml::from_str(header)?),
        Fence::Toml => from_toml(toml::Value::Table(toml::from_str(header)?)),
    };
    match value {
        Value::Object(fields) => Ok(Some(fields)),
        Value::Null => Ok(None),
        _ => Err(ExtractError::NotAMapping),
    }
}

// ============================================================================
// Script literal: locating the object
// ============================================================================

const DECLARATION_NAME: &str = "frontmatter";

fn parse_script(contents: &str) -> Result<Option<Vec<(String, Value)>>, ExtractError> {
    let Some(open) = find_declaration(contents) else {
        return Ok(None);
    };
    let close = matching_brace(contents.as_bytes(), open)?;
    let tokens = tokenize(&contents[open..=close])?;
    let mut parser = ObjectParser { tokens, pos: 0 };
    match parser.parse_value().eval() {
        Some(Value::Object(fields)) => Ok(Some(fields)),
        _ => Err(ExtractError::NotAMapping),
    }
}

/// Byte offset of the `{` that starts the first top-level declaration.
///
/// Top level means the declaration starts a line with no indentation,
/// optionally behind `export`, and that line does not begin inside a block
/// comment or a template literal.
fn find_declaration(src: &str) -> Option<usize> {
    let mut offset = 0;
    let mut carry = Carry::Code;
    for line in src.split_inclusive('\n') {
        if carry == Carry::Code
            && let Some(rest) = declaration_rest(line)
        {
            let after_name = offset + line.len() - rest.len();
            let eq = after_name + assignment(&src[after_name..])?;
            return src[eq..].find('{').map(|i| eq + i);
        }
        carry = scan_line(line.as_bytes(), carry);
        offset += line.len();
    }
    None
}

/// The only constructs that can span a line break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Carry {
    Code,
    BlockComment,
    Template,
}

/// State at the end of `line`, given the state at its start.
fn scan_line(line: &[u8], mut carry: Carry) -> Carry {
    let mut i = 0;
    while i < line.len() {
        match carry {
            Carry::BlockComment => {
                if line[i..].starts_with(b"*/") {
                    carry = Carry::Code;
                    i += 1;
                }
            }
            Carry::Template => match line[i] {
                b'\\' => i += 1,
                b'`' => carry = Carry::Code,
                _ => {}
            },
            Carry::Code => match line[i] {
                b'/' if line.get(i + 1) == Some(&b'/') => return Carry::Code,
                b'/' if line.get(i + 1) == Some(&b'*') => {
                    carry = Carry::BlockComment;
                    i += 1;
                }
                b'`' => carry = Carry::Template,
                // Plain strings end at the line break at the latest.
                quote @ (b'"' | b'\'') => i = skip_string(line, i, quote).unwrap_or(line.len()),
                _ => {}
            },
        }
        i += 1;
    }
    carry
}

fn keyword<'a>(s: &'a str, kw: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(kw)?;
    if rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

fn declaration_rest(line: &str) -> Option<&str> {
    let line = keyword(line, "export").unwrap_or(line);
    let rest = ["const", "let", "var"]
        .iter()
        .find_map(|kw| keyword(line, kw))?;
    let rest = rest.strip_prefix(DECLARATION_NAME)?;
    if rest.starts_with(is_ident_char) {
        return None;
    }
    Some(rest)
}

/// Offset just past the `=` of the declaration, skipping a type annotation.
fn assignment(src: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    (0..bytes.len())
        .find(|&i| bytes[i] == b'=' && !matches!(bytes.get(i + 1), Some(b'=' | b'>')))
        .map(|i| i + 1)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Index of the `}` closing the brace at `open`, ignoring braces inside
/// strings and comments.
fn matching_brace(bytes: &[u8], open: usize) -> Result<usize, ExtractError> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => i = skip_string(bytes, i, quote)?,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |p| i + p);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = bytes[i + 2..]
                    .windows(2)
                    .position(|w| w == b"*/")
                    .map(|p| i + 2 + p + 1)
                    .ok_or(ExtractError::Unterminated("block comment"))?;
            }
            _ => {}
        }
        i += 1;
    }
    Err(ExtractError::Unterminated("object literal"))
}

/// Index of the closing quote. Plain strings may not span lines.
fn skip_string(bytes: &[u8], start: usize, quote: u8) -> Result<usize, ExtractError> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'\n' if quote != b'`' => break,
            b if b == quote => return Ok(i),
            _ => {}
        }
        i += 1;
    }
    Err(ExtractError::Unterminated("string"))
}

// ============================================================================
// Script literal: tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open(char),
    Close(char),
    Colon,
    Comma,
    Minus,
    Spread,
    Str(String),
    Template { text: String, substitutions: bool },
    Number(f64),
    Ident(String),
    Other(char),
}

fn tokenize(src: &str) -> Result<Vec<Token>, ExtractError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                loop {
                    if i + 1 >= chars.len() {
                        return Err(ExtractError::Unterminated("block comment"));
                    }
                    if chars[i] == '*' && chars[i + 1] == '/' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            '{' | '[' | '(' => {
                tokens.push(Token::Open(c));
                i += 1;
            }
            '}' | ']' | ')' => {
                tokens.push(Token::Close(c));
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '.' if chars.get(i + 1) == Some(&'.') && chars.get(i + 2) == Some(&'.') => {
                tokens.push(Token::Spread);
                i += 3;
            }
            '"' | '\'' => {
                let (text, next) = lex_string(&chars, i)?;
                tokens.push(Token::Str(text));
                i = next;
            }
            '`' => {
                let (token, next) = lex_template(&chars, i)?;
                tokens.push(token);
                i = next;
            }
            c if c.is_ascii_digit()
                || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) =>
            {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || matches!(chars[i], '.' | '_'))
                {
                    // Exponent sign: 1e-5
                    if matches!(chars[i], 'e' | 'E')
                        && matches!(chars.get(i + 1), Some('-' | '+'))
                        && !chars[start..i].iter().any(|c| matches!(c, 'x' | 'X'))
                    {
                        i += 1;
                    }
                    i += 1;
                }
                let literal: String = chars[start..i].iter().filter(|c| **c != '_').collect();
                tokens.push(match parse_number(&literal) {
                    Some(n) => Token::Number(n),
                    None => Token::Other(c),
                });
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                tokens.push(Token::Other(other));
                i += 1;
            }
        }
    }
    Ok(tokens)
}

fn parse_number(literal: &str) -> Option<f64> {
    let lower = literal.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    if let Some(bin) = lower.strip_prefix("0b") {
        return i64::from_str_radix(bin, 2).ok().map(|n| n as f64);
    }
    if let Some(oct) = lower.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok().map(|n| n as f64);
    }
    lower.parse().ok()
}

/// Decode a quoted string starting at `start`. Returns the text and the
/// index after the closing quote.
fn lex_string(chars: &[char], start: usize) -> Result<(String, usize), ExtractError> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i = unescape(chars, i, &mut out),
            '\n' => break,
            c if c == quote => return Ok((out, i + 1)),
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Err(ExtractError::Unterminated("string"))
}

fn lex_template(chars: &[char], start: usize) -> Result<(Token, usize), ExtractError> {
    let mut text = String::new();
    let mut substitutions = false;
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i = unescape(chars, i, &mut text),
            '`' => return Ok((Token::Template { text, substitutions }, i + 1)),
            '$' if chars.get(i + 1) == Some(&'{') => {
                substitutions = true;
                let mut depth = 0;
                while i < chars.len() {
                    match chars[i] {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                i += 1;
            }
            c => {
                text.push(c);
                i += 1;
            }
        }
    }
    Err(ExtractError::Unterminated("template"))
}

/// Decode the escape sequence at `chars[i] == '\\'`, returning the index
/// after it.
fn unescape(chars: &[char], i: usize, out: &mut String) -> usize {
    let Some(&c) = chars.get(i + 1) else {
        return i + 1;
    };
    let hex = |from: usize, len: usize| -> Option<char> {
        let digits: String = chars.get(from..from + len)?.iter().collect();
        char::from_u32(u32::from_str_radix(&digits, 16).ok()?)
    };
    match c {
        'n' => out.push('\n'),
        't' => out.push('\t'),
        'r' => out.push('\r'),
        '0' => out.push('\0'),
        'b' => out.push('\u{8}'),
        'f' => out.push('\u{c}'),
        'v' => out.push('\u{b}'),
        // Line continuation
        '\n' => {}
        'x' => {
            if let Some(decoded) = hex(i + 2, 2) {
                out.push(decoded);
                return i + 4;
            }
            out.push('x');
        }
        'u' if chars.get(i + 2) == Some(&'{') => {
            if let Some(len) = chars[i + 3..].iter().position(|c| *c == '}')
                && let Some(decoded) = hex(i + 3, len)
            {
                out.push(decoded);
                return i + 4 + len;
            }
            out.push('u');
        }
        'u' => {
            if let Some(decoded) = hex(i + 2, 4) {
                out.push(decoded);
                return i + 6;
            }
            out.push('u');
        }
        other => out.push(other),
    }
    i + 2
}

// ============================================================================
// Script literal: evaluation
// ============================================================================

/// The whole supported grammar. Everything else is `Unsupported`.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Literal(Value),
    TemplateNoSubst(String),
    UnaryNegNumber(f64),
    Array(Vec<Node>),
    Object(Vec<(String, Node)>),
    Unsupported,
}

impl Node {
    fn eval(self) -> Option<Value> {
        match self {
            Node::Literal(value) => Some(value),
            Node::TemplateNoSubst(text) => Some(Value::String(text)),
            Node::UnaryNegNumber(n) => Some(Value::Number(-n)),
            Node::Array(items) => Some(Value::Array(
                items.into_iter().filter_map(Node::eval).collect(),
            )),
            Node::Object(properties) => Some(Value::Object(
                properties
                    .into_iter()
                    .filter_map(|(key, node)| node.eval().map(|value| (key, value)))
                    .collect(),
            )),
            Node::Unsupported => None,
        }
    }
}

struct ObjectParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ObjectParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    /// Parse one value; anything outside the grammar is skipped up to the
    /// next `,` or closing bracket and becomes `Unsupported`.
    fn parse_value(&mut self) -> Node {
        let start = self.pos;
        if let Some(node) = self.parse_primary()
            && self.at_value_end()
        {
            return node;
        }
        self.pos = start;
        self.skip_expression();
        Node::Unsupported
    }

    fn at_value_end(&self) -> bool {
        matches!(self.peek(), None | Some(Token::Comma | Token::Close(_)))
    }

    fn parse_primary(&mut self) -> Option<Node> {
        match self.next()? {
            Token::Str(s) => Some(Node::Literal(Value::String(s))),
            Token::Number(n) => Some(Node::Literal(Value::Number(n))),
            Token::Template {
                text,
                substitutions: false,
            } => Some(Node::TemplateNoSubst(text)),
            Token::Minus => match self.next()? {
                Token::Number(n) => Some(Node::UnaryNegNumber(n)),
                _ => None,
            },
            Token::Ident(ident) => match ident.as_str() {
                "true" => Some(Node::Literal(Value::Bool(true))),
                "false" => Some(Node::Literal(Value::Bool(false))),
                "null" => Some(Node::Literal(Value::Null)),
                _ => None,
            },
            Token::Open('[') => self.parse_array(),
            Token::Open('{') => self.parse_object(),
            _ => None,
        }
    }

    fn parse_array(&mut self) -> Option<Node> {
        let mut items = Vec::new();
        loop {
            match self.peek()? {
                Token::Close(']') => {
                    self.pos += 1;
                    return Some(Node::Array(items));
                }
                Token::Comma => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }
            items.push(self.parse_value());
            match self.next()? {
                Token::Comma => {}
                Token::Close(']') => return Some(Node::Array(items)),
                _ => return None,
            }
        }
    }

    fn parse_object(&mut self) -> Option<Node> {
        let mut properties = Vec::new();
        loop {
            let key = match self.peek()? {
                Token::Close('}') => {
                    self.pos += 1;
                    return Some(Node::Object(properties));
                }
                Token::Ident(key) | Token::Str(key) => Some(key.clone()),
                Token::Number(n) => Some(format_number(*n)),
                // Computed keys, spreads and anything stranger
                _ => None,
            };
            match key {
                Some(key) => {
                    self.pos += 1;
                    if self.peek() == Some(&Token::Colon) {
                        self.pos += 1;
                        properties.push((key, self.parse_value()));
                    } else {
                        // Shorthand, method or accessor
                        self.skip_expression();
                    }
                }
                None => self.skip_expression(),
            }
            match self.next()? {
                Token::Comma => {}
                Token::Close('}') => return Some(Node::Object(properties)),
                _ => return None,
            }
        }
    }

    /// Advance to the next `,` or closing bracket at the current depth.
    fn skip_expression(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token {
                Token::Open(_) => depth += 1,
                Token::Close(_) if depth == 0 => return,
                Token::Close(_) => depth -= 1,
                Token::Comma if depth == 0 => return,
                _ => {}
            }
            self.pos += 1;
        }
    }
}
