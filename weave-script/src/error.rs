//! Compile-time diagnostics.
//!
//! Every lexer, animation-definition and parser failure is reported as a
//! [`CompileError`]. Compilation is fail-fast: the first error aborts the
//! whole script.

use thiserror::Error;

/// A fatal error raised while compiling a script or one of the animation
/// definitions it references.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{file}:{line}: {kind}")]
pub struct CompileError {
    pub file: String,
    pub line: usize,
    pub kind: ErrorKind,
}

impl CompileError {
    pub fn new(file: impl Into<String>, line: usize, kind: ErrorKind) -> Self {
        Self { file: file.into(), line, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("source is not valid UTF-8")]
    InvalidEncoding,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("tabs are only allowed at the start of a line")]
    MisplacedTab,
    #[error("unclosed block comment")]
    UnclosedComment,
    #[error("unsupported escape sequence '\\{0}'")]
    BadEscape(char),
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("malformed number literal '{0}'")]
    BadNumber(String),

    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },
    #[error("malformed indentation: expected {expected} tab(s), found {found}")]
    BadIndent { expected: usize, found: usize },
    #[error("{0} must start on a new line")]
    NotOnFreshLine(&'static str),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("wrong arguments for {command}, usage: {usage}")]
    Usage { command: &'static str, usage: &'static str },
    #[error("knot '{0}' is already defined")]
    DuplicateKnot(String),
    #[error("knot headers must not be indented")]
    IndentedKnot,
    #[error("condition has no effect")]
    EmptyBranch,
    #[error("#else without a matching #if")]
    StrayElse,
    #[error("#else must stand alone on its line")]
    ElseNotAlone,
    #[error("a cue needs at least one line, choice or command")]
    EmptyCue,
    #[error("{0} cannot follow a choice in the same cue")]
    AfterChoice(&'static str),
    #[error("a condition cannot mix choices with text or commands")]
    MixedChoices,
    #[error("jump to unknown knot '{0}'")]
    UnknownKnot(String),

    #[error("cannot load {kind} '{name}': {reason}")]
    Asset { kind: &'static str, name: String, reason: String },
    #[error("animation definition must start with `sheet \"path\" width height`")]
    MissingSheet,
    #[error("animation '{0}' is defined twice")]
    DuplicateAnimation(String),
}

pub type Result<T> = std::result::Result<T, CompileError>;
