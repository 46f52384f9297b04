//! Scanner implementation

use super::token::*;
use std::iter::Peekable;
use std::str::CharIndices;

// ============================================================================
// SCANNER
// ============================================================================

/// Walks C-like source and reports braces and initializer dots, skipping
/// comments, string literals and character literals (`'{'` is a valid glyph
/// token inside a name array and must not count as a brace).
pub struct Scanner<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    base: usize,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a scanner over the whole source.
    pub fn new(source: &'a str) -> Self {
        Self::starting_at(source, 0)
    }

    /// Create a scanner that begins at byte `offset` (must be a char boundary).
    pub fn starting_at(source: &'a str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        Self {
            source,
            chars: source[offset..].char_indices().peekable(),
            base: offset,
            pos: offset,
        }
    }

    /// Scan the remaining source into a vector of marks, ending with `Eof`.
    pub fn marks(&mut self) -> Vec<Mark> {
        let mut marks = Vec::new();
        loop {
            let mark = self.next_mark();
            let is_eof = mark.kind == MarkKind::Eof;
            marks.push(mark);
            if is_eof {
                break;
            }
        }
        marks
    }

    /// Get the next structural mark.
    pub fn next_mark(&mut self) -> Mark {
        loop {
            self.skip_trivia();

            let start = self.pos;

            let kind = match self.peek_char() {
                None => MarkKind::Eof,
                Some('{') => {
                    self.advance();
                    MarkKind::Open
                }
                Some('}') => {
                    self.advance();
                    MarkKind::Close
                }
                Some('.') => {
                    self.advance();
                    MarkKind::Dot
                }
                Some('\'') => {
                    self.skip_quoted('\'');
                    continue;
                }
                Some('"') => {
                    self.skip_quoted('"');
                    continue;
                }
                Some(_) => {
                    self.advance();
                    continue;
                }
            };

            return Mark {
                kind,
                span: Span { start, end: self.pos },
            };
        }
    }

    /// Skip a quoted literal. Stops at the closing quote or before a newline,
    /// so an unterminated literal never swallows the rest of the file.
    fn skip_quoted(&mut self, quote: char) {
        self.advance();
        loop {
            match self.peek_char() {
                None | Some('\n') => break,
                Some('\\') => {
                    self.advance();
                    if self.peek_char() != Some('\n') {
                        self.advance();
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') => {
                    self.advance();
                }
                Some('/') => {
                    let next = self.peek_next_char();
                    if next == Some('/') {
                        // Line comment
                        while let Some(c) = self.peek_char() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    } else if next == Some('*') {
                        // Block comment
                        self.advance(); // /
                        self.advance(); // *
                        loop {
                            match self.peek_char() {
                                None => break,
                                Some('*') if self.peek_next_char() == Some('/') => {
                                    self.advance();
                                    self.advance();
                                    break;
                                }
                                _ => {
                                    self.advance();
                                }
                            }
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    /// Byte offset of the next character that is neither whitespace nor comment.
    pub fn next_significant(mut self) -> usize {
        self.skip_trivia();
        self.pos
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.source[self.pos..].char_indices();
        iter.next();
        iter.next().map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((i, c)) = self.chars.next() {
            self.pos = self.base + i + c.len_utf8();
            Some(c)
        } else {
            None
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Mark;

    fn next(&mut self) -> Option<Mark> {
        let mark = self.next_mark();
        (mark.kind != MarkKind::Eof).then_some(mark)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Byte offset of the `}` matching the `{` at `open`, or `None` if `open` is
/// not an opening brace or the source ends first.
pub fn matching_close(source: &str, open: usize) -> Option<usize> {
    if source.as_bytes().get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    for mark in Scanner::starting_at(source, open) {
        match mark.kind {
            MarkKind::Open => depth += 1,
            MarkKind::Close => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(mark.span.start);
                }
            }
            _ => {}
        }
    }
    None
}

/// Byte offset of the first non-whitespace, non-comment character at or after `from`.
pub fn skip_trivia(source: &str, from: usize) -> usize {
    Scanner::starting_at(source, from).next_significant()
}

/// If a designated initializer `.key =` starts at `dot`, return the offset just
/// past the `=` and any trivia after it.
pub fn assignment_value_start(source: &str, dot: usize, key: &str) -> Option<usize> {
    let rest = source.get(dot..)?.strip_prefix('.')?.strip_prefix(key)?;
    if rest
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }
    let after_key = dot + 1 + key.len();
    let eq = skip_trivia(source, after_key);
    if source.as_bytes().get(eq) != Some(&b'=') {
        return None;
    }
    Some(skip_trivia(source, eq + 1))
}

/// Insert `block` (one or more complete lines) in front of the closing brace at
/// `close`, making sure the previous element is comma-terminated.
pub fn insert_before_close(source: &str, close: usize, block: &str) -> String {
    let line_start = source[..close].rfind('\n').map(|nl| nl + 1).unwrap_or(0);
    let close_on_own_line = source[line_start..close].trim().is_empty();
    let insert_at = if close_on_own_line { line_start } else { close };

    let before = &source[..insert_at];
    let last = before.trim_end();
    let needs_comma = !last.is_empty() && !last.ends_with(',') && !last.ends_with('{');

    let mut out = String::with_capacity(source.len() + block.len() + 2);
    out.push_str(last);
    if needs_comma {
        out.push(',');
    }
    if close_on_own_line {
        out.push_str(&before[last.len()..]);
    } else {
        out.push('\n');
    }
    out.push_str(block);
    if !block.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&source[insert_at..]);
    out
}

// ============================================================================
// TESTS
// ============================================================================
