use std::collections::{BTreeMap, BTreeSet};

use crate::{
    ast::{ContainerType, Program, Type},
    token::ContainerKind,
};

/// What the registration pass needs to know about the containers used by a
/// program.
#[derive(Debug, Default, PartialEq)]
pub struct Discovery<'a> {
    /// Containers holding at least one struct, keyed by canonical text,
    /// without their own modifiers.
    pub containers: BTreeMap<String, ContainerType>,
    /// Struct names stored in some registered container. Each of them needs
    /// an `operator==` for the indexing suites to compile.
    pub equality_required: BTreeSet<&'a str>,
    /// Container families that need their indexing suite header.
    pub families: BTreeSet<ContainerKind>,
}

/// Walks struct members, function signatures and global variables.
pub fn discover(program: &Program) -> Discovery<'_> {
    let mut discovery = Discovery::default();
    for s in program.structs() {
        for member in &s.members {
            discovery.visit(&member.ty);
        }
    }
    for function in program.functions() {
        discovery.visit(&function.return_ty);
        for param in &function.params {
            discovery.visit(&param.ty);
        }
    }
    for global in program.globals() {
        discovery.visit(&global.ty);
    }
    discovery
}

impl<'a> Discovery<'a> {
    fn visit(&mut self, ty: &'a Type) {
        let Type::Container(container) = ty else {
            return;
        };
        // Boost.Python ships no indexing suite for tuples. Containers of
        // builtins only are left to Boost.Python's own converters.
        if container.kind == ContainerKind::Tuple || container.custom_elements().next().is_none() {
            return;
        }
        self.families.insert(container.kind);
        self.equality_required.extend(container.custom_elements());
        self.containers
            .entry(container.canonical())
            .or_insert_with(|| container.bare());
    }
}
