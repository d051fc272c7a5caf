use std::fmt;

use crate::{
    ast::{Function, Include, Node, Program, Struct, Type, Variable},
    lexer,
    token::{KeywordKind, ModifierKind, Span, Spanned, SymbolKind, Token, TokenKind, TypeKind},
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Lexes and parses the provided header. Tokens are written into `tokens`,
/// which must be empty, so that callers can inspect them afterwards.
pub fn parse_program(src: &str, tokens: &mut Vec<Token>) -> Result<Program> {
    assert!(tokens.is_empty());
    lexer::lex(src, tokens).map_err(|e| e.span.wrap(Error::Lexer(e.inner)))?;
    Parser::new(src, tokens).parse()
}

/// The grammatical construct currently open.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    Global,
    Preprocessor,
    StringLiteral,
    Variable,
    StructDecl,
    StructDef,
    FunctionDecl,
    FunctionDef,
    Template,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Global => "global",
            Scope::Preprocessor => "preprocessor",
            Scope::StringLiteral => "string_literal",
            Scope::Variable => "variable",
            Scope::StructDecl => "struct_decl",
            Scope::StructDef => "struct_def",
            Scope::FunctionDecl => "function_decl",
            Scope::FunctionDef => "function_def",
            Scope::Template => "template",
        })
    }
}

/// A node under construction.
#[derive(Debug, PartialEq)]
enum Building {
    Include(Include),
    Struct(Struct),
    /// Parameters are collected from the stack when the node is finalized;
    /// name and return type come from the node beneath it.
    Function,
    Variable(Variable),
}

impl Building {
    fn describe(&self) -> &'static str {
        match self {
            Building::Include(_) => "include",
            Building::Struct(_) => "struct",
            Building::Function => "function",
            Building::Variable(v) if v.is_container() => "container",
            Building::Variable(_) => "variable",
        }
    }

    /// Whether this is a container still waiting for its template arguments.
    fn is_open_container(&self) -> bool {
        matches!(
            self,
            Building::Variable(Variable { ty: Type::Container(c), .. }) if c.elements.is_empty()
        )
    }
}

/// Records `token` on the node on top of the construction stack.
///
/// Token and node kinds that have nothing to say to each other are no-ops.
fn update(node: &mut Building, token: TokenKind, text: &str) -> Result<(), Error> {
    match (node, token) {
        (Building::Variable(var), TokenKind::Identifier) => var.name = Box::from(text),
        (Building::Variable(Variable { ty: Type::Basic(ty), .. }), TokenKind::Type(kind)) => {
            ty.kind = kind;
            ty.custom_name = (kind == TypeKind::Custom).then(|| Box::from(text));
        }
        (Building::Variable(Variable { ty: Type::Basic(ty), .. }), TokenKind::Modifier(m)) => {
            match m {
                ModifierKind::Const => ty.is_const = true,
                ModifierKind::Pointer => ty.is_pointer = true,
                ModifierKind::Reference => ty.is_reference = true,
                ModifierKind::Unsigned => ty.is_unsigned = true,
            }
        }
        (Building::Variable(Variable { ty: Type::Container(ty), .. }), TokenKind::Modifier(m)) => {
            match m {
                ModifierKind::Const => ty.is_const = true,
                ModifierKind::Pointer => ty.is_pointer = true,
                ModifierKind::Reference => ty.is_reference = true,
                ModifierKind::Unsigned => return Err(Error::UnsignedContainer),
            }
        }
        (Building::Include(include), TokenKind::Identifier) => include.name = Box::from(text),
        (Building::Include(include), TokenKind::Symbol(SymbolKind::Lt)) => include.is_system = true,
        (Building::Struct(s), TokenKind::Type(TypeKind::Custom)) => s.name = Box::from(text),
        _ => (),
    }
    Ok(())
}

struct Parser<'src, 'tok> {
    src: &'src str,
    tokens: &'tok [Token],
    scopes: Vec<Scope>,
    nodes: Vec<Building>,
    /// The token being visited, for error reporting.
    current: Span,
    /// A function finalized by the previous token. It is moved into the
    /// program once the next token tells whether a body follows.
    pending: Option<Function>,
    after_signature: bool,
    program: Program,
}

impl Parser<'_, '_> {
    fn parse(mut self) -> Result<Program> {
        let tokens = self.tokens;
        for &token in tokens {
            self.current = token.span();
            self.after_signature = self.flush_pending(Some(token.kind));
            self.visit(token)?;
        }
        self.current = self.end_span();
        self.flush_pending(None);
        self.check_for_failure()?;
        Ok(self.program)
    }

    fn visit(&mut self, token: Token) -> Result<()> {
        match token.kind {
            TokenKind::Container(kind) => {
                self.enter(Scope::Variable);
                self.push(Building::Variable(Variable::container(kind)));
            }
            TokenKind::Keyword(KeywordKind::Struct) => {
                self.enter(Scope::StructDecl);
                self.push(Building::Struct(Struct::default()));
            }
            TokenKind::Modifier(_) => {
                let opens = [Scope::StructDef, Scope::FunctionDecl, Scope::Template, Scope::Global];
                if self.is_any(&opens) {
                    self.enter(Scope::Variable);
                    self.push(Building::Variable(Variable::basic()));
                }
            }
            TokenKind::Type(_) => {
                if !self.is_any(&[Scope::StructDecl, Scope::Variable]) {
                    self.enter(Scope::Variable);
                    self.push(Building::Variable(Variable::basic()));
                }
            }
            TokenKind::Symbol(symbol) => self.symbol(symbol)?,
            TokenKind::Identifier | TokenKind::Keyword(_) => (),
        }
        self.update_node(token)
    }

    fn symbol(&mut self, symbol: SymbolKind) -> Result<()> {
        match symbol {
            SymbolKind::Quote => {
                if self.is(Scope::Preprocessor) {
                    self.enter(Scope::StringLiteral);
                } else if self.is(Scope::StringLiteral) {
                    self.exit(Scope::StringLiteral)?;
                    if self.is(Scope::Preprocessor) {
                        self.exit(Scope::Preprocessor)?;
                        self.finalize_include()?;
                    }
                }
            }
            SymbolKind::Comma => self.exit(Scope::Variable)?,
            SymbolKind::LParen => {
                self.enter(Scope::FunctionDecl);
                self.push(Building::Function);
            }
            SymbolKind::RParen => {
                if self.is(Scope::Variable) {
                    self.exit(Scope::Variable)?;
                }
                self.exit(Scope::FunctionDecl)?;
                self.finalize_function()?;
            }
            SymbolKind::LBrace => {
                if self.is(Scope::StructDecl) {
                    self.enter(Scope::StructDef);
                } else if self.is(Scope::FunctionDecl)
                    || (self.after_signature && self.is(Scope::Variable))
                {
                    self.enter(Scope::FunctionDef);
                }
            }
            SymbolKind::RBrace => {
                if self.is(Scope::StructDef) {
                    self.exit(Scope::StructDef)?;
                    self.finalize_struct()?;
                } else if self.is(Scope::FunctionDef) {
                    self.exit(Scope::FunctionDef)?;
                    // A body ends its declaration; no `;` follows.
                    if self.is(Scope::Variable) {
                        self.exit(Scope::Variable)?;
                    }
                }
            }
            SymbolKind::Semicolon => match self.exit_current() {
                Scope::Variable if self.is(Scope::Global) && !self.nodes.is_empty() => {
                    self.finalize_global()?;
                }
                // A forward declaration, `struct Rocket;`.
                Scope::StructDecl if matches!(self.nodes.last(), Some(Building::Struct(_))) => {
                    self.nodes.pop();
                }
                _ => (),
            },
            SymbolKind::Hash => {
                self.enter(Scope::Preprocessor);
                self.push(Building::Include(Include::default()));
            }
            SymbolKind::Lt => {
                if !self.is(Scope::Preprocessor) {
                    self.enter(Scope::Template);
                }
            }
            SymbolKind::Gt => {
                if self.is(Scope::Preprocessor) {
                    self.exit(Scope::Preprocessor)?;
                    self.finalize_include()?;
                } else if self.is(Scope::Variable) {
                    self.exit(Scope::Variable)?;
                    self.exit(Scope::Template)?;
                    self.finalize_container()?;
                }
            }
        }
        Ok(())
    }

    fn update_node(&mut self, token: Token) -> Result<()> {
        let text = token.text(self.src);
        let span = self.current;
        match self.nodes.last_mut() {
            Some(node) => update(node, token.kind, text).map_err(|e| span.wrap(e)),
            None => Ok(()),
        }
    }

    /// Moves the pending function, if any, into the program. Returns whether
    /// there was one.
    fn flush_pending(&mut self, next: Option<TokenKind>) -> bool {
        let Some(mut function) = self.pending.take() else {
            return false;
        };
        function.is_defined = next == Some(TokenKind::Symbol(SymbolKind::LBrace));
        self.program.nodes.push(Node::Function(function));
        true
    }

    fn finalize_include(&mut self) -> Result<()> {
        match self.pop("include")? {
            Building::Include(include) if include.name.is_empty() => {
                Err(self.error(Error::MissingName { node: "include" }))
            }
            Building::Include(include) => {
                self.program.nodes.push(Node::Include(include));
                Ok(())
            }
            other => Err(self.unexpected("include", &other)),
        }
    }

    fn finalize_function(&mut self) -> Result<()> {
        let params = self.extract_members("function", |node| *node == Building::Function)?;
        self.pop("function")?;
        let signature = match self.nodes.pop() {
            Some(Building::Variable(signature)) => signature,
            Some(other) => return Err(self.unexpected("return type", &other)),
            None => return Err(self.error(Error::MissingReturnType)),
        };
        if signature.name.is_empty() {
            return Err(self.error(Error::MissingName { node: "function" }));
        }
        self.pending = Some(Function {
            name: signature.name,
            return_ty: signature.ty,
            params,
            is_defined: false,
        });
        Ok(())
    }

    fn finalize_struct(&mut self) -> Result<()> {
        let members = self.extract_members("struct", |node| matches!(node, Building::Struct(_)))?;
        let Building::Struct(mut s) = self.pop("struct")? else {
            unreachable!("extraction stops at a struct");
        };
        if s.name.is_empty() {
            return Err(self.error(Error::MissingName { node: "struct" }));
        }
        s.members = members;
        self.program.nodes.push(Node::Struct(s));
        Ok(())
    }

    /// Moves the template arguments into the container beneath them. The
    /// container itself stays on the stack; it is still waiting for a name.
    fn finalize_container(&mut self) -> Result<()> {
        let members = self.extract_members("container", Building::is_open_container)?;
        let mut elements = Vec::with_capacity(members.len());
        for member in members {
            match member.ty {
                Type::Basic(ty) => elements.push(ty),
                Type::Container(_) => return Err(self.error(Error::NestedTemplate)),
            }
        }
        if let Some(Building::Variable(Variable { ty: Type::Container(ty), .. })) =
            self.nodes.last_mut()
        {
            ty.elements = elements;
        }
        Ok(())
    }

    /// Scalar globals are dropped; container globals are kept.
    fn finalize_global(&mut self) -> Result<()> {
        match self.pop("variable")? {
            Building::Variable(var) if var.is_container() => {
                self.program.nodes.push(Node::Variable(var));
                Ok(())
            }
            Building::Variable(_) => Ok(()),
            other => Err(self.unexpected("variable", &other)),
        }
    }

    /// Pops variables off the stack until `is_owner` holds for the node on
    /// top. Returns them in declaration order.
    fn extract_members(
        &mut self,
        owner: &'static str,
        is_owner: impl Fn(&Building) -> bool,
    ) -> Result<Vec<Variable>> {
        let mut members = Vec::new();
        loop {
            match self.nodes.pop() {
                Some(node) if is_owner(&node) => {
                    self.nodes.push(node);
                    break;
                }
                Some(Building::Variable(member)) => members.push(member),
                Some(other) => return Err(self.unexpected("variable", &other)),
                None => return Err(self.error(Error::MissingNode { expected: owner })),
            }
        }
        members.reverse();
        Ok(members)
    }

    fn check_for_failure(&self) -> Result<()> {
        if let Some(&scope) = self.scopes.last().filter(|&&s| s != Scope::Global) {
            return Err(self.error(Error::UnclosedScope {
                scope,
                depth: self.scopes.len() - 1,
            }));
        }
        if !self.nodes.is_empty() {
            return Err(self.error(Error::UnfinishedNodes(self.nodes.len())));
        }
        Ok(())
    }
}

impl Parser<'_, '_> {
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok [Token]) -> Parser<'src, 'tok> {
        Parser {
            src,
            tokens,
            scopes: vec![Scope::Global],
            nodes: Vec::with_capacity(16),
            current: Span::new_of_length(src.len(), 0),
            pending: None,
            after_signature: false,
            program: Program::default(),
        }
    }

    fn end_span(&self) -> Span {
        Span::new_of_length(self.src.len(), 0)
    }

    fn current_scope(&self) -> Scope {
        // The global scope is never popped.
        self.scopes.last().copied().unwrap_or(Scope::Global)
    }

    fn is(&self, scope: Scope) -> bool {
        self.current_scope() == scope
    }

    fn is_any(&self, scopes: &[Scope]) -> bool {
        scopes.contains(&self.current_scope())
    }

    fn enter(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    fn exit(&mut self, expected: Scope) -> Result<()> {
        let actual = self.current_scope();
        if actual != expected || actual == Scope::Global {
            return Err(self.error(Error::ScopeMismatch { expected, actual }));
        }
        self.scopes.pop();
        Ok(())
    }

    /// Exits whatever scope is open and returns it. At global scope this is a
    /// no-op, so stray `;` such as the one in `using namespace std;` are
    /// accepted.
    fn exit_current(&mut self) -> Scope {
        let scope = self.current_scope();
        if scope != Scope::Global {
            self.scopes.pop();
        }
        scope
    }

    fn push(&mut self, node: Building) {
        self.nodes.push(node);
    }

    fn pop(&mut self, expected: &'static str) -> Result<Building> {
        self.nodes
            .pop()
            .ok_or_else(|| self.error(Error::MissingNode { expected }))
    }

    fn error(&self, error: Error) -> Spanned<Error> {
        self.current.wrap(error)
    }

    fn unexpected(&self, expected: &'static str, actual: &Building) -> Spanned<Error> {
        self.error(Error::UnexpectedNode {
            expected,
            actual: actual.describe(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Lexer(lexer::Error),
    ScopeMismatch {
        expected: Scope,
        actual: Scope,
    },
    UnexpectedNode {
        expected: &'static str,
        actual: &'static str,
    },
    MissingNode {
        expected: &'static str,
    },
    MissingReturnType,
    MissingName {
        node: &'static str,
    },
    NestedTemplate,
    UnsignedContainer,
    UnclosedScope {
        scope: Scope,
        depth: usize,
    },
    UnfinishedNodes(usize),
}

impl Error {
    pub fn is_lexical(&self) -> bool {
        matches!(self, Error::Lexer(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lexer(error) => error.fmt(f),
            Error::ScopeMismatch { expected, actual } => {
                write!(f, "expected scope {expected}, but got {actual}")
            }
            Error::UnexpectedNode { expected, actual } => {
                write!(f, "expected {expected} node, but got {actual}")
            }
            Error::MissingNode { expected } => write!(f, "missing {expected} node"),
            Error::MissingReturnType => write!(f, "function without return type"),
            Error::MissingName { node } => write!(f, "{node} without a name"),
            Error::NestedTemplate => write!(f, "nested templates are not supported"),
            Error::UnsignedContainer => write!(f, "containers can't be unsigned"),
            Error::UnclosedScope { scope, depth } => {
                write!(f, "unclosed {scope} scope ({depth} scopes still open)")
            }
            Error::UnfinishedNodes(count) => write!(f, "{count} unfinished declarations"),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    pub fn parse(src: &str) -> Program {
        super::parse_program(src, &mut Vec::with_capacity(256)).expect("failed to parse")
    }
}
