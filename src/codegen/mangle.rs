//! Python-side names for container registrations.
//!
//! The name is derived from the canonical text of the container, e.g.
//! `map<string, Rocket>` becomes `map_stringRocket`. Names are not guaranteed
//! to be unique: a struct named `unsigned_int` and the builtin `unsigned int`
//! both mangle to `unsigned_int`.

use std::fmt;

/// Applied in order to every element spelling.
const SUBSTITUTIONS: [(&str, &str); 4] = [
    ("unsigned ", "unsigned_"),
    (" const ", "_const_"),
    ("*", "_ptr"),
    ("&", "_ref"),
];

/// Mangles the canonical text of a one or two element container.
pub fn mangle(canonical: &str) -> Result<String, Error> {
    let Some((container, first, second)) = decompose(canonical) else {
        return Err(Error::Undecomposable(Box::from(canonical)));
    };
    let mut name = format!("{container}_{}", mangle_element(first));
    if let Some(second) = second {
        name.push_str(&mangle_element(second));
    }
    Ok(name)
}

fn decompose(canonical: &str) -> Option<(&str, &str, Option<&str>)> {
    let (container, args) = canonical.strip_suffix('>')?.split_once('<')?;
    if container.is_empty() {
        return None;
    }
    let (first, second) = match args.split_once(',') {
        Some((_, rest)) if rest.contains(',') => return None,
        Some((first, second)) => (first, Some(second)),
        None => (args, None),
    };
    let is_blank = |s: &str| s.trim().is_empty();
    if is_blank(first) || second.is_some_and(is_blank) {
        return None;
    }
    Some((container, first, second))
}

fn mangle_element(element: &str) -> String {
    let mut mangled = element.to_owned();
    for (from, to) in SUBSTITUTIONS {
        mangled = mangled.replace(from, to);
    }
    mangled.retain(|c| !c.is_whitespace());
    mangled
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The canonical text is not of the form `container<t1>` or
    /// `container<t1, t2>`.
    Undecomposable(Box<str>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Undecomposable(canonical) => {
                write!(f, "can't derive a python name for container `{canonical}`")
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mangle() {
        let cases = [
            ("vector<Rocket>", "vector_Rocket"),
            ("vector<Rocket*>", "vector_Rocket_ptr"),
            ("vector<Rocket&>", "vector_Rocket_ref"),
            ("vector<unsigned int>", "vector_unsigned_int"),
            ("vector<char const *>", "vector_char_const__ptr"),
            ("map<string, Rocket>", "map_stringRocket"),
            ("map<int, unsigned long>", "map_intunsigned_long"),
        ];
        for (canonical, expected) in cases {
            assert_eq!(mangle(canonical).as_deref(), Ok(expected), "{canonical}");
        }
    }

    #[test]
    fn test_mangle_errors() {
        for canonical in ["tuple<int, int, int>", "vector<>", "vector", "<int>", "map<int, >"] {
            assert_eq!(
                mangle(canonical),
                Err(Error::Undecomposable(Box::from(canonical))),
                "{canonical}"
            );
        }
    }
}
