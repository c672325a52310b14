//! Tokenizer and tree builder for the tag dialect.
//!
//! Markdown is left untouched here: the parser only finds `{% ... %}` tag
//! headers, parses their attributes, and nests text and tags into a
//! [`Document`]. Tag headers inside fenced code blocks or inline code spans
//! are literal text. A backslash-escaped backtick does not open a code span.
//! Indented code blocks and fences nested in blockquotes or list items are
//! not tracked, so tag headers inside them are still parsed as tags. A tag
//! header must end on the line it starts on.

use std::ops::Range;

use serde_json::{Map, Number, Value};

use crate::ast::{Document, Node, TagNode};
use crate::error::{ContentError, Location, Result};

/// Parse raw markup into a tree rooted at a [`Document`].
pub fn parse(source: &str) -> Result<Document> {
    let tokens = Tokenizer::new(source).run()?;
    build_tree(source, tokens)
}

#[derive(Debug, PartialEq)]
enum Token {
    Text {
        range: Range<usize>,
        location: Location,
    },
    Open {
        name: String,
        attributes: Vec<(String, Value)>,
        self_closing: bool,
        location: Location,
    },
    Close {
        name: String,
        location: Location,
    },
}

/// An open code fence (```` ``` ```` or `~~~`).
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: u8,
    len: usize,
}

impl Fence {
    fn detect(line: &str) -> Option<Self> {
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > 3 {
            return None;
        }
        let marker = *trimmed.as_bytes().first()?;
        if marker != b'`' && marker != b'~' {
            return None;
        }
        let len = trimmed.bytes().take_while(|b| *b == marker).count();
        (len >= 3).then_some(Self { marker, len })
    }

    fn is_closed_by(&self, line: &str) -> bool {
        match Self::detect(line) {
            Some(close) => {
                let rest = &line.trim_start_matches(' ')[close.len..];
                close.marker == self.marker && close.len >= self.len && rest.trim().is_empty()
            }
            None => false,
        }
    }
}

struct Tokenizer<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    text_start: usize,
    text_location: Location,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            text_start: 0,
            text_location: Location::new(1, 1),
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut fence: Option<Fence> = None;
        let mut line_start = 0;
        let source = self.source;

        for (index, line) in source.split_inclusive('\n').enumerate() {
            match fence {
                Some(open) => {
                    if open.is_closed_by(line) {
                        fence = None;
                    }
                }
                None => match Fence::detect(line) {
                    Some(open) => fence = Some(open),
                    None => self.scan_line(line_start, line, index + 1)?,
                },
            }
            line_start += line.len();
        }

        if self.text_start < self.source.len() {
            self.tokens.push(Token::Text {
                range: self.text_start..self.source.len(),
                location: self.text_location,
            });
        }
        Ok(self.tokens)
    }

    fn scan_line(&mut self, line_start: usize, line: &'a str, line_no: usize) -> Result<()> {
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' if matches!(bytes.get(i + 1), Some(b'`' | b'\\')) => i += 2,
                b'`' => i = skip_code_span(bytes, i),
                b'{' if bytes.get(i + 1) == Some(&b'%') => {
                    let location = Location::new(line_no, line[..i].chars().count() + 1);
                    let (token, consumed) = Cursor::new(&line[i..], location).tag()?;

                    let start = line_start + i;
                    if self.text_start < start {
                        self.tokens.push(Token::Text {
                            range: self.text_start..start,
                            location: self.text_location,
                        });
                    }
                    self.tokens.push(token);

                    i += consumed;
                    self.text_start = line_start + i;
                    self.text_location = Location::new(line_no, line[..i].chars().count() + 1);
                }
                _ => i += 1,
            }
        }
        Ok(())
    }
}

/// Skip an inline code span starting at `start`. An unmatched backtick run
/// is skipped on its own.
fn skip_code_span(bytes: &[u8], start: usize) -> usize {
    let run = bytes[start..].iter().take_while(|b| **b == b'`').count();
    let mut i = start + run;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let close = bytes[i..].iter().take_while(|b| **b == b'`').count();
            if close == run {
                return i + close;
            }
            i += close;
        } else {
            i += 1;
        }
    }
    start + run
}

/// Cursor over a single tag header, starting at `{%`.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    origin: Location,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str, origin: Location) -> Self {
        Self {
            input,
            pos: 0,
            origin,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: &str) -> bool {
        if self.input[self.pos..].starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some('\n') | Some('\r'))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.pos += 1;
        }
    }

    fn location(&self) -> Location {
        Location::new(
            self.origin.line,
            self.origin.column + self.input[..self.pos].chars().count(),
        )
    }

    fn error(&self, message: impl Into<String>) -> ContentError {
        ContentError::parse(self.location(), message)
    }

    fn identifier(&mut self) -> Option<&'a str> {
        let rest = &self.input[self.pos..];
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return None,
        }
        let end = chars
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }

    /// Parse one tag header. Returns the token and the bytes consumed.
    fn tag(mut self) -> Result<(Token, usize)> {
        let location = self.origin;
        self.eat("{%");
        self.skip_whitespace();

        if self.eat("/") {
            self.skip_whitespace();
            let name = self
                .identifier()
                .ok_or_else(|| self.error("expected tag name after `/`"))?
                .to_string();
            self.skip_whitespace();
            if !self.eat("%}") {
                return Err(self.error(format!("expected `%}}` to close `{{% /{name}`")));
            }
            return Ok((Token::Close { name, location }, self.pos));
        }

        let name = self
            .identifier()
            .ok_or_else(|| self.error("expected tag name"))?
            .to_string();
        let mut attributes: Vec<(String, Value)> = Vec::new();

        loop {
            self.skip_whitespace();
            let self_closing = if self.eat("/%}") {
                true
            } else if self.eat("%}") {
                false
            } else if self.at_line_end() {
                return Err(ContentError::parse(
                    location,
                    format!("unterminated tag `{name}`; expected `%}}` on the same line"),
                ));
            } else {
                let key_location = self.location();
                let key = self
                    .identifier()
                    .ok_or_else(|| self.error("expected attribute name or `%}`"))?
                    .to_string();
                self.skip_whitespace();
                if !self.eat("=") {
                    return Err(self.error(format!("expected `=` after attribute `{key}`")));
                }
                self.skip_whitespace();
                let value = self.value()?;
                if attributes.iter().any(|(existing, _)| *existing == key) {
                    return Err(ContentError::parse(
                        key_location,
                        format!("duplicate attribute `{key}`"),
                    ));
                }
                attributes.push((key, value));
                continue;
            };

            let token = Token::Open {
                name,
                attributes,
                self_closing,
                location,
            };
            return Ok((token, self.pos));
        }
    }

    fn value(&mut self) -> Result<Value> {
        match self.peek() {
            Some('"') => self.string().map(Value::String),
            Some('[') => self.array(),
            Some('{') => self.object(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some('$') => Err(self.error("variables are not supported in attribute values")),
            Some(c) if c.is_ascii_alphabetic() => {
                let start = self.location();
                match self.identifier().unwrap_or_default() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    other => Err(ContentError::parse(
                        start,
                        format!("unsupported attribute value `{other}`"),
                    )),
                }
            }
            _ => Err(self.error("expected attribute value")),
        }
    }

    fn string(&mut self) -> Result<String> {
        let start = self.location();
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('\n') | None => break,
                        Some(other) => {
                            return Err(self.error(format!("invalid escape `\\{other}`")));
                        }
                    };
                    out.push(escaped);
                }
                Some('\n') | None => break,
                Some(c) => out.push(c),
            }
        }
        Err(ContentError::parse(start, "unterminated string"))
    }

    fn number(&mut self) -> Result<Value> {
        let location = self.location();
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let text = &self.input[start..self.pos];
        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::from(int));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| ContentError::parse(location, format!("invalid number `{text}`")))
    }

    fn array(&mut self) -> Result<Value> {
        let start = self.location();
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.eat("]") {
                return Ok(Value::Array(items));
            }
            if self.at_line_end() {
                return Err(ContentError::parse(start, "unterminated array"));
            }
            items.push(self.value()?);
            self.skip_whitespace();
            if self.eat(",") {
                continue;
            }
            if self.eat("]") {
                return Ok(Value::Array(items));
            }
            if self.at_line_end() {
                return Err(ContentError::parse(start, "unterminated array"));
            }
            return Err(self.error("expected `,` or `]` in array"));
        }
    }

    fn object(&mut self) -> Result<Value> {
        let start = self.location();
        self.bump();
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            if self.eat("}") {
                return Ok(Value::Object(map));
            }
            if self.at_line_end() {
                return Err(ContentError::parse(start, "unterminated object"));
            }
            let key = match self.peek() {
                Some('"') => self.string()?,
                _ => self
                    .identifier()
                    .ok_or_else(|| self.error("expected object key"))?
                    .to_string(),
            };
            self.skip_whitespace();
            if !self.eat(":") {
                return Err(self.error(format!("expected `:` after key `{key}`")));
            }
            self.skip_whitespace();
            let value = self.value()?;
            map.insert(key, value);
            self.skip_whitespace();
            if self.eat(",") {
                continue;
            }
            if self.eat("}") {
                return Ok(Value::Object(map));
            }
            if self.at_line_end() {
                return Err(ContentError::parse(start, "unterminated object"));
            }
            return Err(self.error("expected `,` or `}` in object"));
        }
    }
}

fn build_tree(source: &str, tokens: Vec<Token>) -> Result<Document> {
    let mut root: Vec<Node> = Vec::new();
    let mut open: Vec<TagNode> = Vec::new();

    for token in tokens {
        match token {
            Token::Text { range, location } => {
                let text = &source[range];
                if !text.is_empty() {
                    container(&mut root, &mut open).push(Node::Text {
                        source: text.to_string(),
                        location,
                    });
                }
            }
            Token::Open {
                name,
                attributes,
                self_closing,
                location,
            } => {
                let tag = TagNode {
                    name,
                    attributes,
                    children: Vec::new(),
                    location,
                };
                if self_closing {
                    container(&mut root, &mut open).push(Node::Tag(tag));
                } else {
                    open.push(tag);
                }
            }
            Token::Close { name, location } => match open.pop() {
                Some(tag) if tag.name == name => {
                    container(&mut root, &mut open).push(Node::Tag(tag));
                }
                Some(tag) => {
                    return Err(ContentError::parse(
                        location,
                        format!(
                            "unexpected `{{% /{name} %}}`; tag `{}` opened at {} is still open",
                            tag.name, tag.location
                        ),
                    ));
                }
                None => {
                    return Err(ContentError::parse(
                        location,
                        format!("`{{% /{name} %}}` has no matching opening tag"),
                    ));
                }
            },
        }
    }

    if let Some(tag) = open.pop() {
        return Err(ContentError::parse(
            tag.location,
            format!("tag `{}` is never closed", tag.name),
        ));
    }

    Ok(Document { children: root })
}

fn container<'a>(root: &'a mut Vec<Node>, open: &'a mut [TagNode]) -> &'a mut Vec<Node> {
    match open.last_mut() {
        Some(tag) => &mut tag.children,
        None => root,
    }
}
