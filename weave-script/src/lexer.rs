//! Tokenizer for dialogue scripts.
//!
//! The lexer runs in two modes. TEXT mode is active at the start of every
//! line and turns prose into [`TokKind::Sentence`] tokens; CODE mode is
//! entered after a knot, speaker, command or go-to marker and lexes
//! expression syntax until the end of the line.

use std::fmt;

use unicode_xid::UnicodeXID;

use crate::ast::Position;
use crate::error::{CompileError, ErrorKind, Result};

/// Source location of a token: line (1-based) and the tab indentation of
/// the line it was emitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub indent: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokKind {
    Eof,
    /// `@`
    Knot,
    /// `>`
    Speaker,
    /// `#` followed by a command keyword
    Hash,
    If,
    Else,
    /// `-` at the start of a line
    ChoiceMarker,
    /// `->`
    GoTo,

    Sentence(String),
    Ident(String),
    Str(String),
    Num(f64),
    Position(Position),

    Plus,
    Minus,
    Star,
    Slash,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    LParen,
    RParen,
    /// `::`
    Scope,
}

impl fmt::Display for TokKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokKind::Eof => f.write_str("end of file"),
            TokKind::Knot => f.write_str("'@'"),
            TokKind::Speaker => f.write_str("'>'"),
            TokKind::Hash => f.write_str("'#'"),
            TokKind::If => f.write_str("'#if'"),
            TokKind::Else => f.write_str("'#else'"),
            TokKind::ChoiceMarker => f.write_str("choice '-'"),
            TokKind::GoTo => f.write_str("'->'"),
            TokKind::Sentence(s) => write!(f, "text \"{}\"", s),
            TokKind::Ident(s) => write!(f, "identifier '{}'", s),
            TokKind::Str(s) => write!(f, "string \"{}\"", s),
            TokKind::Num(n) => write!(f, "number {}", n),
            TokKind::Position(p) => write!(f, "position '{}'", p),
            TokKind::Plus => f.write_str("'+'"),
            TokKind::Minus => f.write_str("'-'"),
            TokKind::Star => f.write_str("'*'"),
            TokKind::Slash => f.write_str("'/'"),
            TokKind::EqEq => f.write_str("'=='"),
            TokKind::NotEq => f.write_str("'!='"),
            TokKind::Lt => f.write_str("'<'"),
            TokKind::Le => f.write_str("'<='"),
            TokKind::Gt => f.write_str("'>'"),
            TokKind::Ge => f.write_str("'>='"),
            TokKind::And => f.write_str("'and'"),
            TokKind::Or => f.write_str("'or'"),
            TokKind::LParen => f.write_str("'('"),
            TokKind::RParen => f.write_str("')'"),
            TokKind::Scope => f.write_str("'::'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tok {
    pub tok: TokKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    Code,
}

pub struct Lexer<'a> {
    file: &'a str,
    src: &'a str,
    pos: usize,
    line: usize,
    indent: usize,
    line_start: bool,
    mode: Mode,
    /// Lines of the block comments still open, innermost last.
    comments: Vec<usize>,
    toks: Vec<Tok>,
}

impl<'a> Lexer<'a> {
    pub fn new(file: &'a str, src: &'a str) -> Self {
        Lexer {
            file,
            src,
            pos: 0,
            line: 1,
            indent: 0,
            line_start: true,
            mode: Mode::Text,
            comments: Vec::new(),
            toks: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, kind: ErrorKind) -> CompileError {
        CompileError::new(self.file, self.line, kind)
    }

    fn push(&mut self, tok: TokKind) {
        self.toks.push(Tok {
            tok,
            span: Span { line: self.line, indent: self.indent },
        });
    }

    fn newline(&mut self) {
        self.line += 1;
        self.indent = 0;
        self.line_start = true;
        self.mode = Mode::Text;
    }

    pub fn run(mut self) -> Result<Vec<Tok>> {
        while let Some(c) = self.peek() {
            match c {
                '\n' => {
                    self.advance();
                    self.newline();
                }
                '\r' => {
                    self.advance();
                }
                '\t' => {
                    if !self.line_start {
                        return Err(self.error(ErrorKind::MisplacedTab));
                    }
                    self.advance();
                    self.indent += 1;
                }
                ' ' => {
                    self.advance();
                    self.line_start = false;
                }
                '/' if self.peek_nth(1) == Some('/') => self.line_comment(),
                '/' if self.peek_nth(1) == Some('*') => self.block_comment()?,
                _ => {
                    self.line_start = false;
                    match self.mode {
                        Mode::Text => self.text_line()?,
                        Mode::Code => self.code_token()?,
                    }
                }
            }
        }
        self.indent = 0;
        self.push(TokKind::Eof);
        Ok(self.toks)
    }

    fn line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn block_comment(&mut self) -> Result<()> {
        self.comments.push(self.line);
        self.pos += 2;
        while !self.comments.is_empty() {
            match (self.peek(), self.peek_nth(1)) {
                (None, _) => {
                    let opened = self.comments.last().copied().unwrap_or(self.line);
                    return Err(CompileError::new(self.file, opened, ErrorKind::UnclosedComment));
                }
                (Some('/'), Some('*')) => {
                    self.comments.push(self.line);
                    self.pos += 2;
                }
                (Some('*'), Some('/')) => {
                    self.comments.pop();
                    self.pos += 2;
                }
                (Some('\n'), _) => {
                    self.advance();
                    self.newline();
                }
                _ => {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    /// Lexes the head of a logical line in TEXT mode.
    fn text_line(&mut self) -> Result<()> {
        let Some(c) = self.peek() else { return Ok(()) };
        match c {
            '@' => {
                self.advance();
                self.push(TokKind::Knot);
                self.mode = Mode::Code;
            }
            '>' => {
                self.advance();
                self.push(TokKind::Speaker);
                self.mode = Mode::Code;
            }
            '#' => {
                self.advance();
                let word = if self.peek().is_some_and(is_ident_start) {
                    Some(self.word())
                } else {
                    None
                };
                match word {
                    Some(w) if w == "if" => self.push(TokKind::If),
                    Some(w) if w == "else" => self.push(TokKind::Else),
                    Some(w) => {
                        self.push(TokKind::Hash);
                        self.push(TokKind::Ident(w));
                    }
                    None => self.push(TokKind::Hash),
                }
                self.mode = Mode::Code;
            }
            '-' => {
                self.advance();
                self.push(TokKind::ChoiceMarker);
                self.choice_text()?;
            }
            '\\' if matches!(self.peek_nth(1), Some('@' | '>' | '#' | '-')) => {
                self.advance();
                self.sentence()?;
            }
            _ => self.sentence()?,
        }
        Ok(())
    }

    fn sentence(&mut self) -> Result<()> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                '\n' => break,
                '\t' => return Err(self.error(ErrorKind::MisplacedTab)),
                _ => {
                    self.advance();
                }
            }
        }
        let text = self.src[start..self.pos].trim_end_matches(['\r', ' ']).to_string();
        self.push(TokKind::Sentence(text));
        Ok(())
    }

    /// Text of a choice line, up to an optional `->`.
    fn choice_text(&mut self) -> Result<()> {
        let start = self.pos;
        let mut arrow = false;
        while let Some(c) = self.peek() {
            match c {
                '\n' => break,
                '\t' => return Err(self.error(ErrorKind::MisplacedTab)),
                '-' if self.peek_nth(1) == Some('>') => {
                    arrow = true;
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
        let text = self.src[start..self.pos].trim_matches([' ', '\r']);
        if !text.is_empty() {
            let text = text.to_string();
            self.push(TokKind::Sentence(text));
        }
        if arrow {
            self.pos += 2;
            self.push(TokKind::GoTo);
            self.mode = Mode::Code;
        }
        Ok(())
    }

    fn code_token(&mut self) -> Result<()> {
        let Some(c) = self.peek() else { return Ok(()) };
        match c {
            '"' => {
                let s = self.string_literal()?;
                self.push(TokKind::Str(s));
            }
            c if c.is_ascii_digit() => {
                let n = self.number()?;
                self.push(TokKind::Num(n));
            }
            c if is_ident_start(c) => {
                let word = self.word();
                let tok = match word.as_str() {
                    "and" => TokKind::And,
                    "or" => TokKind::Or,
                    _ => match Position::from_keyword(&word) {
                        Some(p) => TokKind::Position(p),
                        None => TokKind::Ident(word),
                    },
                };
                self.push(tok);
            }
            _ => {
                let tok = self.operator(c)?;
                self.push(tok);
            }
        }
        Ok(())
    }

    fn operator(&mut self, c: char) -> Result<TokKind> {
        let next = self.peek_nth(1);
        let (tok, len) = match (c, next) {
            ('-', Some('>')) => (TokKind::GoTo, 2),
            ('=', Some('=')) => (TokKind::EqEq, 2),
            ('!', Some('=')) => (TokKind::NotEq, 2),
            ('<', Some('=')) => (TokKind::Le, 2),
            ('>', Some('=')) => (TokKind::Ge, 2),
            ('&', Some('&')) => (TokKind::And, 2),
            ('|', Some('|')) => (TokKind::Or, 2),
            (':', Some(':')) => (TokKind::Scope, 2),
            ('+', _) => (TokKind::Plus, 1),
            ('-', _) => (TokKind::Minus, 1),
            ('*', _) => (TokKind::Star, 1),
            ('/', _) => (TokKind::Slash, 1),
            ('<', _) => (TokKind::Lt, 1),
            ('>', _) => (TokKind::Gt, 1),
            ('(', _) => (TokKind::LParen, 1),
            (')', _) => (TokKind::RParen, 1),
            _ => return Err(self.error(ErrorKind::UnexpectedChar(c))),
        };
        self.pos += len;
        Ok(tok)
    }

    /// Identifier body: letters, digits, `_`, `-` and `'`. A `-` directly
    /// followed by `>` is left for the go-to marker.
    fn word(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let keep = match c {
                '-' => self.peek_nth(1) != Some('>'),
                '\'' | '_' => true,
                c => c.is_xid_continue(),
            };
            if !keep {
                break;
            }
            self.advance();
        }
        self.src[start..self.pos].to_string()
    }

    fn string_literal(&mut self) -> Result<String> {
        self.advance();
        let mut content = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => return Err(self.error(ErrorKind::UnterminatedString)),
                Some('\t') => return Err(self.error(ErrorKind::MisplacedTab)),
                Some('"') => return Ok(content),
                Some('\\') => match self.advance() {
                    Some(c @ ('"' | '\\')) => content.push(c),
                    Some('\n') | None => return Err(self.error(ErrorKind::UnterminatedString)),
                    Some(c) => return Err(self.error(ErrorKind::BadEscape(c))),
                },
                Some(c) => content.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<f64> {
        let start = self.pos;
        let mut dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !dot {
                dot = true;
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.src[start..self.pos];
        text.parse()
            .map_err(|_| self.error(ErrorKind::BadNumber(text.to_string())))
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_xid_start()
}

/// Convenience wrapper around [`Lexer::run`].
pub fn tokenize(file: &str, src: &str) -> Result<Vec<Tok>> {
    Lexer::new(file, src).run()
}
