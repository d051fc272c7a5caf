/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The code generator takes an AST and produces the binding source and the
/// companion script.
pub mod codegen;

pub mod ast;
pub mod error;
pub mod token;

pub mod util {
    pub mod fmt;
    pub mod indent;
    #[cfg(test)]
    pub(crate) mod test_utils;
}

pub use error::Error;

use codegen::{Module, Output};

/// Runs the whole pipeline over `src`, the contents of `module`'s header.
pub fn translate(src: &str, module: &Module) -> Result<Output, Error> {
    let mut tokens = Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY);
    let program = parser::parse_program(src, &mut tokens)?;
    Ok(codegen::generate(&program, module)?)
}
