use std::{
    collections::HashSet,
    fmt::{self, Write},
    format_args as f,
};

use crate::{ast::Program, codegen::Module};

/// Generates a Python script that imports the compiled module and lists what
/// each struct exposes. Structs declared more than once get a single block.
pub fn generate(program: &Program, module: &Module) -> String {
    let Module { name: module, header } = module;
    let mut out = String::with_capacity(1024);
    emit(&mut out, f!("\
        \"\"\"\n\
        Generated by cppy from {header}.\n\
        Smoke test for the `{module}` extension module.\n\
        \"\"\"\n\
    "));

    let mut seen = HashSet::new();
    for s in program.structs().filter(|s| seen.insert(&s.name)) {
        let name = &s.name;
        emit(&mut out, f!("\
            \n\
            # {name}\n\
            import {module}\n\
            print({module}.{name})\n\
            print([name for name in dir({module}.{name}) if not name.startswith(\"_\")])\n\
        "));
    }
    out
}

fn emit(out: &mut String, f: fmt::Arguments<'_>) {
    out.write_fmt(f).expect("code emit should be infallible");
}
