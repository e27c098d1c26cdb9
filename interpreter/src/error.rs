use beaver_core::{Error as CoreError, Token, Type};
use thiserror::Error;

use crate::limits::MAX_NESTING_DEPTH;

/// Diagnostics collected by the parser. They never stop parsing of the following statements.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    #[error("expected next token to be {expected}, got {got} instead")]
    UnexpectedToken {
        expected: Type,
        got: Type,

        // line is copied from the offending token, thiserror can't reach into nested fields
        line: usize,
    },

    #[error("no prefix parse function for {ty} found")]
    NoPrefixParseFn { ty: Type, line: usize },

    #[error("could not parse {literal:?} as integer")]
    InvalidInteger { literal: String, line: usize },

    #[error("expression nested too deeply, maximum depth is {}", MAX_NESTING_DEPTH)]
    NestingTooDeep { line: usize },
}

impl ParseError {
    pub(crate) fn unexpected_token(expected: Type, got: &Token) -> Self {
        ParseError::UnexpectedToken {
            expected,
            got: got.ty,
            line: got.line,
        }
    }

    pub(crate) fn no_prefix_parse_fn(token: &Token) -> Self {
        ParseError::NoPrefixParseFn {
            ty: token.ty,
            line: token.line,
        }
    }

    pub(crate) fn invalid_integer(token: &Token) -> Self {
        ParseError::InvalidInteger {
            literal: token.lexeme.clone(),
            line: token.line,
        }
    }

    pub(crate) fn nesting_too_deep(token: &Token) -> Self {
        ParseError::NestingTooDeep { line: token.line }
    }

    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { line, .. } => *line,
            ParseError::NoPrefixParseFn { line, .. } => *line,
            ParseError::InvalidInteger { line, .. } => *line,
            ParseError::NestingTooDeep { line } => *line,
        }
    }
}

/// Failures of the shell around the language, as opposed to errors of the language itself.
#[derive(Debug, Error)]
pub enum Error {
    #[error("[line {line}] scanner error: {}", .source)]
    ScannerError { line: usize, source: CoreError },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for Error {
    fn from(value: CoreError) -> Self {
        Error::ScannerError {
            line: value.line(),
            source: value,
        }
    }
}

pub type ShellResult<T> = Result<T, Error>;
