use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum Error {
    #[error("unterminated string")]
    UnterminatedString { line: usize },
}

impl Error {
    pub fn line(&self) -> usize {
        match self {
            Error::UnterminatedString { line } => *line,
        }
    }
}
