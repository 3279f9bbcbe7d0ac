//! Scanner: single-pass finite-state tokenizer for C-family source bytes.
//!
//! The scanner is pulled one token at a time (`has_more_tokens` /
//! `next_token`, or as an `Iterator`). Each state has its own transition
//! function that looks at the byte under the cursor and either consumes it,
//! switches state, or completes a token. Whitespace and comments produce no
//! tokens; comments are counted. Unterminated literals and comments are
//! closed at the end of the buffer. A zero byte marks the end of the buffer.
//!
//! Operator runs use maximal munch against [`OPERATORS`]: a run keeps
//! growing while it is a prefix of some spelling, then the longest complete
//! spelling inside the run becomes the token and scanning resumes right
//! after it. A byte that starts no spelling at all becomes a one-byte token.

use crate::string_pool::StringPool;

/// Multi-character operator and punctuator spellings, digraphs included.
pub const OPERATORS: [&str; 57] = [
    "{", "}", "[", "]", "#", "##", "(", ")", "<:", ":>", "<%", "%>", "%:", "%:%:", ";", ":", "...",
    "?", "::", ".", ".*", "+", "-", "*", "/", "%", "^", "&", "|", "~", "!", "=", "<", ">", "+=",
    "-=", "*=", "/=", "%=", "^=", "&=", "|=", "<<", ">>", ">>=", "<<=", "==", "!=", "<=", ">=",
    "&&", "||", "++", "--", ",", "->*", "->",
];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TokenKind {
    Identifier,
    NumericLiteral,
    CharacterLiteral,
    StringLiteral,
    Operator,
}

/// A token's kind and its byte range `start..end` in the scanned buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'s>(&self, source: &'s [u8]) -> &'s [u8] {
        &source[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScanState {
    Normal,
    Identifier,
    NumericLiteral,
    CharacterLiteral,
    StringLiteral,
    LineComment,
    BlockComment,
    Operator,
}

/// C `isspace`: space, tab, newline, vertical tab, form feed, carriage return.
#[inline]
pub(crate) fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

#[inline]
fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[inline]
fn is_identifier_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[inline]
fn is_numeric_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.'
}

fn is_operator_prefix(run: &[u8]) -> bool {
    OPERATORS.iter().any(|op| op.as_bytes().starts_with(run))
}

fn is_operator(run: &[u8]) -> bool {
    OPERATORS.iter().any(|op| op.as_bytes() == run)
}

/// Length of the longest operator spelling that starts `run`, or 1.
fn longest_operator(run: &[u8]) -> usize {
    (2..=run.len())
        .rev()
        .find(|&n| is_operator(&run[..n]))
        .unwrap_or(1)
}

pub struct Scanner<'s> {
    source: &'s [u8],
    end: usize,
    pos: usize,
    state: ScanState,
    start: usize,
    escaped: bool,
    star: bool,
    comments: usize,
    peeked: Option<Token>,
}

impl<'s> Scanner<'s> {
    pub fn new(source: &'s [u8]) -> Self {
        let end = source.iter().position(|&b| b == 0).unwrap_or(source.len());
        Self {
            source,
            end,
            pos: 0,
            state: ScanState::Normal,
            start: 0,
            escaped: false,
            star: false,
            comments: 0,
            peeked: None,
        }
    }

    pub fn source(&self) -> &'s [u8] {
        self.source
    }

    /// Comments skipped so far.
    pub fn comments(&self) -> usize {
        self.comments
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn has_more_tokens(&mut self) -> bool {
        if self.peeked.is_none() {
            self.peeked = self.scan();
        }
        self.peeked.is_some()
    }

    pub fn next_token(&mut self) -> Option<Token> {
        self.peeked.take().or_else(|| self.scan())
    }

    /// Scan the next token and return its canonical handle from `pool`.
    pub fn intern_next<'p>(&mut self, pool: &'p mut StringPool) -> Option<&'p [u8]> {
        let token = self.next_token()?;
        Some(pool.intern(token.text(self.source)))
    }

    /// Intern every remaining token; returns how many were scanned.
    pub fn intern_all(&mut self, pool: &mut StringPool) -> usize {
        let mut count = 0;
        while let Some(token) = self.next_token() {
            pool.intern(token.text(self.source));
            count += 1;
        }
        count
    }

    fn scan(&mut self) -> Option<Token> {
        loop {
            if self.pos >= self.end {
                if self.state == ScanState::Normal {
                    return None;
                }
                if let Some(token) = self.close_at_end() {
                    return Some(token);
                }
                continue;
            }
            let b = self.source[self.pos];
            let emitted = match self.state {
                ScanState::Normal => self.normal(b),
                ScanState::Identifier => self.run(b, is_identifier_continue, TokenKind::Identifier),
                ScanState::NumericLiteral => {
                    self.run(b, is_numeric_continue, TokenKind::NumericLiteral)
                }
                ScanState::CharacterLiteral => self.literal(b, b'\'', TokenKind::CharacterLiteral),
                ScanState::StringLiteral => self.literal(b, b'"', TokenKind::StringLiteral),
                ScanState::LineComment => self.line_comment(b),
                ScanState::BlockComment => self.block_comment(b),
                ScanState::Operator => self.operator(b),
            };
            if emitted.is_some() {
                return emitted;
            }
        }
    }

    fn begin(&mut self, state: ScanState) {
        self.state = state;
        self.start = self.pos;
        self.pos += 1;
    }

    fn emit(&mut self, kind: TokenKind, end: usize) -> Option<Token> {
        self.state = ScanState::Normal;
        Some(Token {
            kind,
            start: self.start,
            end,
        })
    }

    fn normal(&mut self, b: u8) -> Option<Token> {
        let next = self.source[..self.end].get(self.pos + 1).copied();
        match (b, next) {
            _ if is_space(b) => self.pos += 1,
            (b'/', Some(b'/')) => self.enter_comment(ScanState::LineComment),
            (b'/', Some(b'*')) => self.enter_comment(ScanState::BlockComment),
            (b'\'', _) => self.enter_literal(ScanState::CharacterLiteral),
            (b'"', _) => self.enter_literal(ScanState::StringLiteral),
            _ if is_identifier_start(b) => self.begin(ScanState::Identifier),
            _ if b.is_ascii_digit() => self.begin(ScanState::NumericLiteral),
            _ => self.begin(ScanState::Operator),
        }
        None
    }

    fn enter_comment(&mut self, state: ScanState) {
        self.comments += 1;
        self.state = state;
        self.escaped = false;
        self.star = false;
        self.pos += 2;
    }

    fn enter_literal(&mut self, state: ScanState) {
        self.escaped = false;
        self.begin(state);
    }

    fn run(&mut self, b: u8, continues: fn(u8) -> bool, kind: TokenKind) -> Option<Token> {
        if continues(b) {
            self.pos += 1;
            return None;
        }
        self.emit(kind, self.pos)
    }

    fn literal(&mut self, b: u8, quote: u8, kind: TokenKind) -> Option<Token> {
        self.pos += 1;
        if self.escaped {
            self.escaped = false;
        } else if b == b'\\' {
            self.escaped = true;
        } else if b == quote {
            return self.emit(kind, self.pos);
        }
        None
    }

    fn line_comment(&mut self, b: u8) -> Option<Token> {
        self.pos += 1;
        match b {
            b'\n' if !self.escaped => self.state = ScanState::Normal,
            // A backslash before CRLF still continues the comment.
            b'\r' if self.escaped => {}
            b'\\' => self.escaped = !self.escaped,
            _ => self.escaped = false,
        }
        None
    }

    // Backslashes do not escape inside block comments: `\*/` closes one.
    fn block_comment(&mut self, b: u8) -> Option<Token> {
        self.pos += 1;
        if b == b'/' && self.star {
            self.state = ScanState::Normal;
        }
        self.star = b == b'*';
        None
    }

    fn operator(&mut self, b: u8) -> Option<Token> {
        let candidate = &self.source[self.start..=self.pos];
        if !is_space(b) && is_operator_prefix(candidate) {
            self.pos += 1;
            return None;
        }
        self.close_operator()
    }

    fn close_operator(&mut self) -> Option<Token> {
        let len = longest_operator(&self.source[self.start..self.pos]);
        self.pos = self.start + len;
        self.emit(TokenKind::Operator, self.pos)
    }

    /// End of buffer inside an open state: close whatever is pending.
    fn close_at_end(&mut self) -> Option<Token> {
        let end = self.end;
        match self.state {
            ScanState::Normal => None,
            ScanState::LineComment | ScanState::BlockComment => {
                self.state = ScanState::Normal;
                None
            }
            ScanState::Identifier => self.emit(TokenKind::Identifier, end),
            ScanState::NumericLiteral => self.emit(TokenKind::NumericLiteral, end),
            ScanState::CharacterLiteral => self.emit(TokenKind::CharacterLiteral, end),
            ScanState::StringLiteral => self.emit(TokenKind::StringLiteral, end),
            ScanState::Operator => self.close_operator(),
        }
    }
}

impl<'s> Iterator for Scanner<'s> {
    type Item = Token;
    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

impl<'s> std::iter::FusedIterator for Scanner<'s> {}

/// Scan `source` completely, returning the tokens and the comment count.
pub fn tokenize(source: &[u8]) -> (Vec<Token>, usize) {
    let mut scanner = Scanner::new(source);
    let tokens: Vec<Token> = scanner.by_ref().collect();
    (tokens, scanner.comments())
}
