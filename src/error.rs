use std::fmt;

use crate::{codegen::mangle, parser, token::Spanned};

/// Any failure of a translation run. No output is produced once one occurs.
#[derive(Debug)]
pub enum Error {
    /// Lexical and structural errors, both reported by the parser.
    Parse(Spanned<parser::Error>),
    Mangle(mangle::Error),
}

impl Error {
    /// Displays the error, resolving spans against `src` into line and
    /// column numbers.
    pub fn with_source<'a>(&'a self, src: &'a str) -> WithSource<'a> {
        WithSource { error: self, src }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(error) => write!(f, "{error:#}"),
            Error::Mangle(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

impl From<Spanned<parser::Error>> for Error {
    fn from(error: Spanned<parser::Error>) -> Self {
        Error::Parse(error)
    }
}

impl From<mangle::Error> for Error {
    fn from(error: mangle::Error) -> Self {
        Error::Mangle(error)
    }
}

pub struct WithSource<'a> {
    error: &'a Error,
    src: &'a str,
}

impl fmt::Display for WithSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error {
            Error::Parse(error) => error.located(self.src).fmt(f),
            other => other.fmt(f),
        }
    }
}
