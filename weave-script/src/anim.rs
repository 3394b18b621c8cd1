//! Animation definitions for background packs and characters.
//!
//! These files use their own small grammar, tokenized separately from
//! dialogue scripts: identifiers, strings, numbers and line breaks only.
//!
//! ```text
//! sheet "alice.png" 128 256
//! idle 0 4 8
//! happy 4 2 12
//! ```

use rustc_hash::FxHashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use unicode_xid::UnicodeXID;

use crate::error::{CompileError, ErrorKind, Result};

/// A sprite sheet and the named animations cut from it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnimationSet {
    pub sheet: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub animations: FxHashMap<String, Animation>,
}

impl AnimationSet {
    pub fn get(&self, name: &str) -> Option<&Animation> {
        self.animations.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Animation {
    pub first_frame: u32,
    pub frame_count: u32,
    pub fps: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimTok {
    Ident(String),
    Str(String),
    Num(f64),
    Newline,
    Eof,
}

/// Tokenizes an animation definition. Returns `(token, line)` pairs.
pub fn tokenize(file: &str, src: &str) -> Result<Vec<(AnimTok, usize)>> {
    let mut toks = Vec::new();
    let mut line = 1;
    let mut chars = src.char_indices().peekable();
    let err = |line, kind| CompileError::new(file, line, kind);

    while let Some(&(start, c)) = chars.peek() {
        match c {
            '\n' => {
                chars.next();
                toks.push((AnimTok::Newline, line));
                line += 1;
            }
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next().map(|(_, c)| c) {
                        None | Some('\n') => return Err(err(line, ErrorKind::UnterminatedString)),
                        Some('"') => break,
                        Some('\\') => match chars.next().map(|(_, c)| c) {
                            Some(c @ ('"' | '\\')) => s.push(c),
                            Some(c) => return Err(err(line, ErrorKind::BadEscape(c))),
                            None => return Err(err(line, ErrorKind::UnterminatedString)),
                        },
                        Some(c) => s.push(c),
                    }
                }
                toks.push((AnimTok::Str(s), line));
            }
            c if c.is_ascii_digit() => {
                let mut end = start;
                let mut dot = false;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || (d == '.' && !dot) {
                        dot |= d == '.';
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &src[start..end];
                let n = text
                    .parse()
                    .map_err(|_| err(line, ErrorKind::BadNumber(text.to_string())))?;
                toks.push((AnimTok::Num(n), line));
            }
            c if c == '_' || c.is_xid_start() => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_xid_continue() || matches!(d, '_' | '-' | '\'') {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                toks.push((AnimTok::Ident(src[start..end].to_string()), line));
            }
            c => return Err(err(line, ErrorKind::UnexpectedChar(c))),
        }
    }
    toks.push((AnimTok::Eof, line));
    Ok(toks)
}

struct AnimParser<'a> {
    file: &'a str,
    toks: &'a [(AnimTok, usize)],
    cursor: usize,
}

impl<'a> AnimParser<'a> {
    fn peek(&self) -> &AnimTok {
        self.toks.get(self.cursor).map(|(t, _)| t).unwrap_or(&AnimTok::Eof)
    }

    fn line(&self) -> usize {
        self.toks
            .get(self.cursor)
            .or(self.toks.last())
            .map(|(_, l)| *l)
            .unwrap_or(1)
    }

    fn bump(&mut self) -> &'a AnimTok {
        let tok = self.toks.get(self.cursor).map(|(t, _)| t).unwrap_or(&AnimTok::Eof);
        self.cursor += 1;
        tok
    }

    fn expected(&self, what: &str) -> CompileError {
        CompileError::new(
            self.file,
            self.line(),
            ErrorKind::Expected {
                expected: what.to_string(),
                found: format!("{:?}", self.peek()),
            },
        )
    }

    fn skip_newlines(&mut self) {
        while *self.peek() == AnimTok::Newline {
            self.bump();
        }
    }

    fn ident(&mut self) -> Result<String> {
        match self.peek() {
            AnimTok::Ident(s) => {
                let s = s.clone();
                self.bump();
                Ok(s)
            }
            _ => Err(self.expected("identifier")),
        }
    }

    fn string(&mut self) -> Result<String> {
        match self.peek() {
            AnimTok::Str(s) => {
                let s = s.clone();
                self.bump();
                Ok(s)
            }
            _ => Err(self.expected("string")),
        }
    }

    fn num(&mut self) -> Result<f64> {
        match *self.peek() {
            AnimTok::Num(n) => {
                self.bump();
                Ok(n)
            }
            _ => Err(self.expected("number")),
        }
    }

    fn count(&mut self) -> Result<u32> {
        let n = self.num()?;
        if n.fract() != 0.0 || n > u32::MAX as f64 {
            self.cursor -= 1;
            return Err(self.expected("whole number"));
        }
        Ok(n as u32)
    }

    fn end_of_line(&mut self) -> Result<()> {
        match self.peek() {
            AnimTok::Newline | AnimTok::Eof => Ok(()),
            _ => Err(self.expected("end of line")),
        }
    }

    fn parse(mut self) -> Result<AnimationSet> {
        self.skip_newlines();
        if *self.peek() != AnimTok::Ident("sheet".into()) {
            return Err(CompileError::new(self.file, self.line(), ErrorKind::MissingSheet));
        }
        self.bump();
        let sheet = self.string()?;
        let frame_width = self.count()?;
        let frame_height = self.count()?;
        self.end_of_line()?;

        let mut animations = FxHashMap::default();
        loop {
            self.skip_newlines();
            if *self.peek() == AnimTok::Eof {
                break;
            }
            let line = self.line();
            let name = self.ident()?;
            let first_frame = self.count()?;
            let frame_count = self.count()?;
            let fps = self.num()? as f32;
            self.end_of_line()?;
            if animations.contains_key(&name) {
                return Err(CompileError::new(self.file, line, ErrorKind::DuplicateAnimation(name)));
            }
            animations.insert(name, Animation { first_frame, frame_count, fps });
        }

        Ok(AnimationSet { sheet, frame_width, frame_height, animations })
    }
}

/// Lexes and parses one animation-definition file.
pub fn parse(file: &str, src: &str) -> Result<AnimationSet> {
    let toks = tokenize(file, src)?;
    AnimParser { file, toks: &toks, cursor: 0 }.parse()
}
