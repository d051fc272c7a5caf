use std::{collections::HashSet, fmt, str::CharIndices};

use crate::token::{
    self, KeywordKind, Span, Spanned, SymbolKind, Token, TokenKind, TypeKind, VOCABULARY,
};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Lexes the provided string, producing the tokens into the provided buffer.
pub fn lex(src: &str, tokens: &mut Vec<Token>) -> Result<()> {
    Lexer::new(src, tokens).lex()
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex_in_new(src: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens)?;
    Ok(tokens)
}

/// Classifies accumulated character runs.
///
/// Holds the set of struct names declared so far and whether the next
/// identifier names a new struct. A fresh classifier is created for every
/// lexed input, so nothing leaks between runs.
#[derive(Debug, Default)]
pub struct Classifier {
    custom_types: HashSet<Box<str>>,
    expect_type_name: bool,
}

impl Classifier {
    pub fn new() -> Classifier {
        Classifier::default()
    }

    /// Returns the token kind for `word`, or `None` if it is not a valid token.
    pub fn classify(&mut self, word: &str) -> Option<TokenKind> {
        // The flag only applies to the word right after `struct`.
        let expect_type_name = std::mem::take(&mut self.expect_type_name);

        if let Some(&kind) = VOCABULARY.get(word) {
            if kind == TokenKind::Keyword(KeywordKind::Struct) {
                self.expect_type_name = true;
            }
            return Some(kind);
        }
        if self.custom_types.contains(word) {
            return Some(TokenKind::Type(TypeKind::Custom));
        }
        if !is_identifier(word) {
            return None;
        }
        if expect_type_name {
            self.custom_types.insert(Box::from(word));
            return Some(TokenKind::Type(TypeKind::Custom));
        }
        Some(TokenKind::Identifier)
    }
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mode {
    Normal,
    /// A `)` was just produced; a following `{` opens a function body.
    AfterRParen,
    /// An `include` keyword was just produced.
    IncludePath,
    /// Inside a function body. Nothing but the closing brace is produced.
    Body { depth: usize },
}

/// The header lexer
struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: CharIndices<'src>,
    /// Start of the pending (not yet classified) character run, if any.
    word_lo: Option<usize>,
    mode: Mode,
    classifier: Classifier,
    tokens: &'tok mut Vec<Token>,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    fn lex(mut self) -> Result<()> {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        while let Some((i, c)) = self.iter.next() {
            if let Mode::Body { depth } = self.mode {
                self.body(i, c, depth);
                continue;
            }
            if c.is_whitespace() {
                self.flush(i)?;
            } else if let Some(kind) = token::symbol(c) {
                self.flush(i)?;
                self.symbol(kind, Span::new_of_bounds(i..i + 1))?;
            } else if self.word_lo.is_none() {
                self.word_lo = Some(i);
            }
        }
        self.flush(self.src.len())
    }

    /// Brace bookkeeping for a skipped function body. Braces are counted
    /// naively, including those inside string or character literals.
    fn body(&mut self, i: usize, c: char, depth: usize) {
        match c {
            '{' => self.mode = Mode::Body { depth: depth + 1 },
            '}' if depth == 1 => {
                self.mode = Mode::Normal;
                let kind = TokenKind::Symbol(SymbolKind::RBrace);
                self.tokens.push(Token::new(kind, Span::new_of_bounds(i..i + 1)));
            }
            '}' => self.mode = Mode::Body { depth: depth - 1 },
            _ => (),
        }
    }

    /// Classifies the pending character run, if any, ending at `hi`.
    fn flush(&mut self, hi: usize) -> Result<()> {
        let Some(lo) = self.word_lo.take() else {
            return Ok(());
        };
        let span = Span::new_of_bounds(lo..hi);
        let word = span.substr(self.src);
        match self.classifier.classify(word) {
            Some(kind) => self.produce(kind, span),
            None => Err(span.wrap(Error::InvalidToken(Box::from(word)))),
        }
    }

    fn symbol(&mut self, kind: TokenKind, span: Span) -> Result<()> {
        use SymbolKind::*;
        match (self.mode, kind) {
            (Mode::IncludePath, TokenKind::Symbol(open @ (Lt | Quote))) => {
                self.mode = Mode::Normal;
                self.tokens.push(Token::new(kind, span));
                let close = if open == Lt { '>' } else { '"' };
                self.include_path(span, close, open)
            }
            _ => self.produce(kind, span),
        }
    }

    /// Reads the raw path text of an include directive as a single
    /// identifier, followed by its closing delimiter.
    fn include_path(&mut self, open_span: Span, close: char, kind: SymbolKind) -> Result<()> {
        let lo = open_span.hi();
        loop {
            match self.iter.next() {
                Some((i, c)) if c == close => {
                    if i == lo {
                        return Err(open_span.wrap(Error::EmptyIncludePath));
                    }
                    let path = Span::new_of_bounds(lo..i);
                    self.tokens.push(Token::new(TokenKind::Identifier, path));
                    let kind = if kind == SymbolKind::Lt { SymbolKind::Gt } else { kind };
                    let close_span = Span::new_of_bounds(i..i + 1);
                    self.tokens
                        .push(Token::new(TokenKind::Symbol(kind), close_span));
                    return Ok(());
                }
                Some((_, '\n')) | None => {
                    return Err(open_span.wrap(Error::UnclosedIncludePath));
                }
                Some(_) => (),
            }
        }
    }

    /// Produces a token, updating the lexer mode.
    fn produce(&mut self, kind: TokenKind, span: Span) -> Result<()> {
        match self.mode {
            Mode::AfterRParen if kind == TokenKind::Symbol(SymbolKind::LBrace) => {
                self.tokens.push(Token::new(kind, span));
                self.mode = Mode::Body { depth: 1 };
                return Ok(());
            }
            Mode::IncludePath => {
                return Err(span.wrap(Error::ExpectedIncludePath));
            }
            _ => (),
        }
        self.tokens.push(Token::new(kind, span));
        self.mode = match kind {
            TokenKind::Keyword(KeywordKind::Include) => Mode::IncludePath,
            TokenKind::Symbol(SymbolKind::RParen) => Mode::AfterRParen,
            _ => Mode::Normal,
        };
        Ok(())
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.char_indices(),
            word_lo: None,
            mode: Mode::Normal,
            classifier: Classifier::new(),
            tokens,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A character run that is neither part of the vocabulary nor an
    /// identifier.
    InvalidToken(Box<str>),
    /// `include` not followed by `<` or `"`.
    ExpectedIncludePath,
    UnclosedIncludePath,
    EmptyIncludePath,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidToken(text) => write!(f, "invalid token {text:?}"),
            Error::ExpectedIncludePath => write!(f, "expected include path after `include`"),
            Error::UnclosedIncludePath => write!(f, "unclosed include path"),
            Error::EmptyIncludePath => write!(f, "empty include path"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{ContainerKind, ModifierKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_demos_no_errors() {
        for input in [
            include_str!("../demos/rockets.h"),
            include_str!("../demos/school.h"),
            include_str!("../demos/launchpad.h"),
        ] {
            assert!(lex_in_new(input).is_ok());
        }
    }

    #[test]
    fn test_classifier_registers_struct_names() {
        let mut c = Classifier::new();
        assert_eq!(c.classify("Rocket"), Some(TokenKind::Identifier));
        assert_eq!(c.classify("Rocket"), Some(TokenKind::Identifier));

        assert_eq!(c.classify("struct"), Some(TokenKind::Keyword(KeywordKind::Struct)));
        assert_eq!(c.classify("Rocket"), Some(TokenKind::Type(TypeKind::Custom)));

        // Only the word right after `struct` is registered.
        assert_eq!(c.classify("fuel"), Some(TokenKind::Identifier));
        assert_eq!(c.classify("Rocket"), Some(TokenKind::Type(TypeKind::Custom)));
    }

    #[test]
    fn test_classifier_redeclared_struct_disarms() {
        let mut c = Classifier::new();
        c.classify("struct");
        c.classify("Rocket");
        c.classify("struct");
        assert_eq!(c.classify("Rocket"), Some(TokenKind::Type(TypeKind::Custom)));
        assert_eq!(c.classify("name"), Some(TokenKind::Identifier));
        assert_eq!(c.classify("name"), Some(TokenKind::Identifier));
    }

    #[test]
    fn test_classifier_vocabulary_and_invalid() {
        let mut c = Classifier::new();
        assert_eq!(c.classify("std::string"), Some(TokenKind::Type(TypeKind::String)));
        assert_eq!(
            c.classify("std::map"),
            Some(TokenKind::Container(ContainerKind::Map))
        );
        assert_eq!(
            c.classify("unsigned"),
            Some(TokenKind::Modifier(ModifierKind::Unsigned))
        );
        assert_eq!(c.classify("_private1"), Some(TokenKind::Identifier));
        assert_eq!(c.classify("1abc"), None);
        assert_eq!(c.classify("std::cout"), None);
        assert_eq!(c.classify("="), None);
    }

    #[test]
    fn tests_with_span() {
        use ContainerKind::*;
        use KeywordKind::*;
        use ModifierKind::*;
        use SymbolKind::*;
        use TokenKind::{Container as C, Identifier as Id, Keyword as K, Modifier as M};
        use TokenKind::{Symbol as S, Type as T};
        use TypeKind::*;
        let cases = cases!(match .. {
            "struct Rocket {\n  double speed;\n};" => [
                (K(Struct), 0..6),
                (T(Custom), 7..13),
                (S(LBrace), 14..15),
                (T(Double), 18..24),
                (Id, 25..30),
                (S(Semicolon), 30..31),
                (S(RBrace), 32..33),
                (S(Semicolon), 33..34),
            ],
            "char const* name;" => [
                (T(Char), 0..4),
                (M(Const), 5..10),
                (M(Pointer), 10..11),
                (Id, 12..16),
                (S(Semicolon), 16..17),
            ],
            "std::map<std::string, int>& m;" => [
                (C(Map), 0..8),
                (S(Lt), 8..9),
                (T(String), 9..20),
                (S(Comma), 20..21),
                (T(Int), 22..25),
                (S(Gt), 25..26),
                (M(Reference), 26..27),
                (Id, 28..29),
                (S(Semicolon), 29..30),
            ],
            "#include <vector>\n#include \"my/rockets.h\"\n" => [
                (S(Hash), 0..1),
                (K(Include), 1..8),
                (S(Lt), 9..10),
                (Id, 10..16),
                (S(Gt), 16..17),
                (S(Hash), 18..19),
                (K(Include), 19..26),
                (S(Quote), 27..28),
                (Id, 28..40),
                (S(Quote), 40..41),
            ],
            "inline void f(int a) { if (a) { g(); } }\nint x;" => [
                (K(Inline), 0..6),
                (T(Void), 7..11),
                (Id, 12..13),
                (S(LParen), 13..14),
                (T(Int), 14..17),
                (Id, 18..19),
                (S(RParen), 19..20),
                (S(LBrace), 21..22),
                (S(RBrace), 39..40),
                (T(Int), 41..44),
                (Id, 45..46),
                (S(Semicolon), 46..47),
            ],
            "void g();\n{}" => [
                (T(Void), 0..4),
                (Id, 5..6),
                (S(LParen), 6..7),
                (S(RParen), 7..8),
                (S(Semicolon), 8..9),
                (S(LBrace), 10..11),
                (S(RBrace), 11..12),
            ],
        });

        for (input, tokens) in cases {
            let lexed = lex_in_new(input).expect("failed to lex");
            assert_eq!(lexed, tokens.as_slice(), "input: {input:?}");
        }
    }

    #[test]
    fn test_unbalanced_body_braces_are_counted_naively() {
        // The `}` inside the string literal closes the body early, so the
        // real closing brace is lexed as a token of its own.
        let tokens = lex_in_new("void f() { g(\"}\"); }").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Type(TypeKind::Void),
                TokenKind::Identifier,
                TokenKind::Symbol(SymbolKind::LParen),
                TokenKind::Symbol(SymbolKind::RParen),
                TokenKind::Symbol(SymbolKind::LBrace),
                TokenKind::Symbol(SymbolKind::RBrace),
                TokenKind::Symbol(SymbolKind::Quote),
                TokenKind::Symbol(SymbolKind::RParen),
                TokenKind::Symbol(SymbolKind::Semicolon),
                TokenKind::Symbol(SymbolKind::RBrace),
            ]
        );
    }

    #[test]
    fn test_errors() {
        let cases: &[(&str, Spanned<Error>)] = &[
            (
                "int x = 5;",
                Span::new_of_bounds(6..7).wrap(Error::InvalidToken(Box::from("="))),
            ),
            (
                "std::size_t n;",
                Span::new_of_bounds(0..11).wrap(Error::InvalidToken(Box::from("std::size_t"))),
            ),
            (
                "#include vector",
                Span::new_of_bounds(9..15).wrap(Error::ExpectedIncludePath),
            ),
            (
                "#include <vector\nint x;",
                Span::new_of_bounds(9..10).wrap(Error::UnclosedIncludePath),
            ),
            (
                "#include \"\"",
                Span::new_of_bounds(9..10).wrap(Error::EmptyIncludePath),
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(lex_in_new(input).unwrap_err(), *expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_unclosed_body_is_not_a_lexical_error() {
        let tokens = lex_in_new("void f() {\n  g();\n").unwrap();
        assert_eq!(
            tokens.last().map(|t| t.kind),
            Some(TokenKind::Symbol(SymbolKind::LBrace))
        );
    }

    macro_rules! cases {
        (match .. {
            $($str:expr => [$(($kind:expr, $range:expr)),* $(,)?]),* $(,)?
        }) => {{
            &[$((
                $str,
                vec![
                    $(Token::new($kind, Span::new_of_bounds($range.start..$range.end))),*
                ],
            )),*]
        }};
    }
    use cases;
}
