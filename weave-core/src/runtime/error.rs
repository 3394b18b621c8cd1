use thiserror::Error;

/// A fatal error raised while running a compiled dialog.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("cannot apply '{op}' to {lhs} and {rhs}")]
    TypeMismatch { op: &'static str, lhs: &'static str, rhs: &'static str },
    #[error("division by zero")]
    DivisionByZero,
    #[error("unknown background pack '{0}'")]
    UnknownBackgroundPack(String),
    #[error("unknown character '{0}'")]
    UnknownCharacter(String),
    #[error("'{owner}' has no animation '{name}'")]
    UnknownAnimation { owner: String, name: String },
    #[error("unknown knot '{0}'")]
    UnknownKnot(String),
}
