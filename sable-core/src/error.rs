use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, line: usize, col: usize },

    #[error("unterminated string")]
    UnterminatedString { line: usize, col: usize },

    #[error("unterminated block comment")]
    UnterminatedBlockComment { line: usize, col: usize },

    #[error("unknown escape sequence '\\{ch}'")]
    UnknownEscape { ch: char, line: usize, col: usize },
}

impl Error {
    pub fn line(&self) -> usize {
        match self {
            Error::UnexpectedCharacter { line, .. } => *line,
            Error::UnterminatedString { line, .. } => *line,
            Error::UnterminatedBlockComment { line, .. } => *line,
            Error::UnknownEscape { line, .. } => *line,
        }
    }

    pub fn col(&self) -> usize {
        match self {
            Error::UnexpectedCharacter { col, .. } => *col,
            Error::UnterminatedString { col, .. } => *col,
            Error::UnterminatedBlockComment { col, .. } => *col,
            Error::UnknownEscape { col, .. } => *col,
        }
    }
}
