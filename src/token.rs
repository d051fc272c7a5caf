use std::{fmt, ops::Range};

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    lo: usize,
    len: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            len: span.len,
            lo: span.lo,
        }
    }

    pub fn span(&self) -> Span {
        Span {
            len: self.len,
            lo: self.lo,
        }
    }

    /// Returns the source text this token was produced from.
    pub fn text<'src>(&self, src: &'src str) -> &'src str {
        self.span().substr(src)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.span())
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>) -> Span {
        debug_assert!(hi >= lo);
        Self::new_of_length(lo, u32::try_from(hi - lo).unwrap())
    }

    pub fn new_of_length(lo: usize, len: u32) -> Span {
        Span { len, lo }
    }

    pub fn hi(&self) -> usize {
        self.lo + self.len as usize
    }

    pub fn substr<'src>(&self, src: &'src str) -> &'src str {
        &src[self.lo..self.hi()]
    }

    /// Returns the 1-based line and column of the span start.
    pub fn line_col(&self, src: &str) -> (usize, usize) {
        let before = &src[..self.lo.min(src.len())];
        let line = before.matches('\n').count() + 1;
        let col = before.rfind('\n').map_or(before.len(), |nl| before.len() - nl - 1) + 1;
        (line, col)
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {})", self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = self.hi();
        write!(f, "{lo}..{hi}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

impl<T> Spanned<T> {
    /// Pairs this error with its source so that it can be displayed with a
    /// `line:column` prefix.
    pub fn located<'a>(&'a self, src: &'a str) -> Located<'a, T> {
        Located { spanned: self, src }
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "{}: ", self.span)?;
        }
        self.inner.fmt(f)
    }
}

pub struct Located<'a, T> {
    spanned: &'a Spanned<T>,
    src: &'a str,
}

impl<T: fmt::Display> fmt::Display for Located<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, col) = self.spanned.span.line_col(self.src);
        write!(f, "{line}:{col}: {}", self.spanned.inner)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Container(ContainerKind),
    Identifier,
    Keyword(KeywordKind),
    Modifier(ModifierKind),
    Symbol(SymbolKind),
    Type(TypeKind),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerKind {
    Vector,
    Map,
    Tuple,
}

impl ContainerKind {
    /// Spelling without namespace qualification, used for mangling.
    pub const fn bare_name(self) -> &'static str {
        match self {
            ContainerKind::Vector => "vector",
            ContainerKind::Map => "map",
            ContainerKind::Tuple => "tuple",
        }
    }

    pub const fn qualified_name(self) -> &'static str {
        match self {
            ContainerKind::Vector => "std::vector",
            ContainerKind::Map => "std::map",
            ContainerKind::Tuple => "std::tuple",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeywordKind {
    Struct,
    Inline,
    Include,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModifierKind {
    Const,
    /// `*`
    Pointer,
    /// `&`
    Reference,
    Unsigned,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    /// `"`
    Quote,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicolon,
    /// `#`
    Hash,
    /// `<`
    Lt,
    /// `>`
    Gt,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TypeKind {
    #[default]
    Int,
    Long,
    Short,
    Double,
    Float,
    Char,
    Void,
    String,
    /// A struct declared earlier in the same header.
    Custom,
}

impl TypeKind {
    /// Spelling without namespace qualification. Returns `None` for
    /// [`TypeKind::Custom`], whose spelling is the declared name.
    pub const fn bare_name(self) -> Option<&'static str> {
        let name = match self {
            TypeKind::Int => "int",
            TypeKind::Long => "long",
            TypeKind::Short => "short",
            TypeKind::Double => "double",
            TypeKind::Float => "float",
            TypeKind::Char => "char",
            TypeKind::Void => "void",
            TypeKind::String => "string",
            TypeKind::Custom => return None,
        };
        Some(name)
    }

    pub const fn qualified_name(self) -> Option<&'static str> {
        match self {
            TypeKind::String => Some("std::string"),
            other => other.bare_name(),
        }
    }
}

/// Maps a punctuation character to the token it produces on its own.
pub fn symbol(c: char) -> Option<TokenKind> {
    use SymbolKind::*;
    let kind = match c {
        '"' => Quote,
        ',' => Comma,
        '(' => LParen,
        ')' => RParen,
        '{' => LBrace,
        '}' => RBrace,
        ';' => Semicolon,
        '#' => Hash,
        '<' => Lt,
        '>' => Gt,
        '*' => return Some(TokenKind::Modifier(ModifierKind::Pointer)),
        '&' => return Some(TokenKind::Modifier(ModifierKind::Reference)),
        _ => return None,
    };
    Some(TokenKind::Symbol(kind))
}

pub static VOCABULARY: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "struct" => TokenKind::Keyword(KeywordKind::Struct),
    "inline" => TokenKind::Keyword(KeywordKind::Inline),
    "include" => TokenKind::Keyword(KeywordKind::Include),

    "const" => TokenKind::Modifier(ModifierKind::Const),
    "unsigned" => TokenKind::Modifier(ModifierKind::Unsigned),

    "int" => TokenKind::Type(TypeKind::Int),
    "long" => TokenKind::Type(TypeKind::Long),
    "short" => TokenKind::Type(TypeKind::Short),
    "double" => TokenKind::Type(TypeKind::Double),
    "float" => TokenKind::Type(TypeKind::Float),
    "char" => TokenKind::Type(TypeKind::Char),
    "void" => TokenKind::Type(TypeKind::Void),
    "string" => TokenKind::Type(TypeKind::String),
    "std::string" => TokenKind::Type(TypeKind::String),

    "vector" => TokenKind::Container(ContainerKind::Vector),
    "std::vector" => TokenKind::Container(ContainerKind::Vector),
    "map" => TokenKind::Container(ContainerKind::Map),
    "std::map" => TokenKind::Container(ContainerKind::Map),
    "tuple" => TokenKind::Container(ContainerKind::Tuple),
    "std::tuple" => TokenKind::Container(ContainerKind::Tuple),
};
