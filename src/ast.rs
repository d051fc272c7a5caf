// program ::= node*
// node ::= '#' include ('<' PATH '>' | '"' PATH '"')
//        | struct TYPE '{' (variable ';')* '}' ';'
//        | [inline] variable '(' [variable (',' variable)*] ')' (';' | BODY)
//        | [inline] variable ';'
// variable ::= type ID
// type ::= basic | container
// container ::= CONTAINER '<' basic (',' basic)* '>' modifier*
// basic ::= modifier* TYPE modifier*
// modifier ::= const | unsigned | '*' | '&'
//
// Bodies are never parsed; the lexer skips them.

use std::fmt;

use crate::token::{ContainerKind, TypeKind};

#[derive(Debug, PartialEq, Default)]
pub struct Program {
    /// Top level declarations, in source order.
    pub nodes: Vec<Node>,
}

impl Program {
    pub fn structs(&self) -> impl Iterator<Item = &Struct> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Struct(s) => Some(s),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Function(f) => Some(f),
            _ => None,
        })
    }

    /// Global variables. Only container globals are ever retained.
    pub fn globals(&self) -> impl Iterator<Item = &Variable> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Variable(v) => Some(v),
            _ => None,
        })
    }
}

#[derive(Debug, PartialEq)]
pub enum Node {
    Include(Include),
    Function(Function),
    Struct(Struct),
    Variable(Variable),
}

#[derive(Debug, PartialEq, Default)]
pub struct Include {
    pub name: Box<str>,
    /// `<header>` as opposed to `"header"`.
    pub is_system: bool,
}

#[derive(Debug, PartialEq)]
pub struct Function {
    pub name: Box<str>,
    pub return_ty: Type,
    pub params: Vec<Variable>,
    /// Whether the header provides a body for this function.
    pub is_defined: bool,
}

#[derive(Debug, PartialEq, Default)]
pub struct Struct {
    pub name: Box<str>,
    pub members: Vec<Variable>,
}

#[derive(Debug, PartialEq)]
pub struct Variable {
    pub name: Box<str>,
    pub ty: Type,
}

impl Variable {
    pub fn basic() -> Variable {
        Variable {
            name: Box::default(),
            ty: Type::Basic(BasicType::default()),
        }
    }

    pub fn container(kind: ContainerKind) -> Variable {
        Variable {
            name: Box::default(),
            ty: Type::Container(ContainerType::new(kind)),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self.ty, Type::Container(_))
    }
}

#[derive(Debug, PartialEq)]
pub enum Type {
    Basic(BasicType),
    Container(ContainerType),
}

impl Type {
    pub fn is_indirect(&self) -> bool {
        let (is_pointer, is_reference) = match self {
            Type::Basic(b) => (b.is_pointer, b.is_reference),
            Type::Container(c) => (c.is_pointer, c.is_reference),
        };
        is_pointer || is_reference
    }

    pub fn is_const(&self) -> bool {
        match self {
            Type::Basic(b) => b.is_const,
            Type::Container(c) => c.is_const,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct BasicType {
    /// Defaults to [`TypeKind::Int`], so that a lone `unsigned` means
    /// `unsigned int`.
    pub kind: TypeKind,
    pub is_const: bool,
    pub is_pointer: bool,
    pub is_reference: bool,
    pub is_unsigned: bool,
    /// Set iff `kind` is [`TypeKind::Custom`].
    pub custom_name: Option<Box<str>>,
}

impl BasicType {
    pub fn new(kind: TypeKind) -> BasicType {
        BasicType {
            kind,
            ..BasicType::default()
        }
    }

    pub fn custom(name: &str) -> BasicType {
        BasicType {
            kind: TypeKind::Custom,
            custom_name: Some(Box::from(name)),
            ..BasicType::default()
        }
    }

    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    fn name(&self, qualified: bool) -> &str {
        let builtin = if qualified {
            self.kind.qualified_name()
        } else {
            self.kind.bare_name()
        };
        builtin.or(self.custom_name()).unwrap_or_default()
    }

    /// Spelling without namespace qualification, with every modifier
    /// surrounded by its own separators: `unsigned int`, `char const *`.
    pub fn canonical(&self) -> String {
        let mut s = String::new();
        if self.is_unsigned {
            s.push_str("unsigned ");
        }
        s.push_str(self.name(false));
        if self.is_const {
            s.push_str(" const ");
        }
        if self.is_pointer {
            s.push('*');
        }
        if self.is_reference {
            s.push('&');
        }
        s
    }
}

/// C++ spelling: `unsigned int`, `char const*`, `std::string&`.
impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unsigned {
            f.write_str("unsigned ")?;
        }
        f.write_str(self.name(true))?;
        write_modifiers(f, self.is_const, self.is_pointer, self.is_reference)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ContainerType {
    pub kind: ContainerKind,
    pub is_const: bool,
    pub is_pointer: bool,
    pub is_reference: bool,
    /// Template arguments. Never nested containers.
    pub elements: Vec<BasicType>,
}

impl ContainerType {
    pub fn new(kind: ContainerKind) -> ContainerType {
        ContainerType {
            kind,
            is_const: false,
            is_pointer: false,
            is_reference: false,
            elements: Vec::new(),
        }
    }

    /// The container type without its own modifiers, e.g. the registered type
    /// of `std::vector<Rocket> const&` is `std::vector<Rocket>`.
    pub fn bare(&self) -> ContainerType {
        ContainerType {
            elements: self.elements.clone(),
            ..ContainerType::new(self.kind)
        }
    }

    /// Unqualified spelling of the container without its own modifiers:
    /// `map<string, Rocket>`. Two containers with the same canonical text
    /// share a single registration.
    pub fn canonical(&self) -> String {
        let elements: Vec<_> = self.elements.iter().map(BasicType::canonical).collect();
        format!("{}<{}>", self.kind.bare_name(), elements.join(", "))
    }

    pub fn custom_elements(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(BasicType::custom_name)
    }
}

/// C++ spelling: `std::map<std::string, Rocket> const&`.
impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<", self.kind.qualified_name())?;
        for (idx, element) in self.elements.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{element}")?;
        }
        f.write_str(">")?;
        write_modifiers(f, self.is_const, self.is_pointer, self.is_reference)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(b) => b.fmt(f),
            Type::Container(c) => c.fmt(f),
        }
    }
}

fn write_modifiers(
    f: &mut fmt::Formatter<'_>,
    is_const: bool,
    is_pointer: bool,
    is_reference: bool,
) -> fmt::Result {
    if is_const {
        f.write_str(" const")?;
    }
    if is_pointer {
        f.write_str("*")?;
    }
    if is_reference {
        f.write_str("&")?;
    }
    Ok(())
}
