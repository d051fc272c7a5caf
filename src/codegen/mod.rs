use std::{
    path::{Path, PathBuf},
    thread,
};

use crate::ast::Program;

pub mod binding;
pub mod discovery;
pub mod mangle;
pub mod script;

/// The Python extension module generated from a header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    /// Module name, as passed to `BOOST_PYTHON_MODULE` and imported by the
    /// script.
    pub name: String,
    /// Header file name, as included by the binding source.
    pub header: String,
}

impl Module {
    pub fn new(name: impl Into<String>, header: impl Into<String>) -> Module {
        Module {
            name: name.into(),
            header: header.into(),
        }
    }

    /// Derives the module from the header path: `dir/rockets.h` is module
    /// `rockets`, including `rockets.h`. Returns `None` if the file name is
    /// not valid UTF-8 or its stem is not a valid module name.
    pub fn from_path(path: &Path) -> Option<Module> {
        let header = path.file_name()?.to_str()?;
        let name = path.file_stem()?.to_str()?;
        is_module_name(name).then(|| Module::new(name, header))
    }

    /// Output paths of the binding source and the script, inside `dir`.
    pub fn output_paths(&self, dir: &Path) -> (PathBuf, PathBuf) {
        let binding = dir.join(format!("{}.cpp", self.name));
        let script = dir.join(format!("{}.py", self.name));
        (binding, script)
    }
}

fn is_module_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Both generated documents.
#[derive(Debug, PartialEq, Eq)]
pub struct Output {
    /// Boost.Python C++ source.
    pub binding: String,
    /// Python smoke test script.
    pub script: String,
}

/// Generates both documents, each on its own thread. Either both are
/// produced or none.
pub fn generate(program: &Program, module: &Module) -> Result<Output, mangle::Error> {
    thread::scope(|s| -> Result<Output, mangle::Error> {
        let binding = s.spawn(|| binding::generate(program, module));
        let script = s.spawn(|| script::generate(program, module));
        let script = script.join().unwrap_or_else(|e| std::panic::resume_unwind(e));
        let binding = binding.join().unwrap_or_else(|e| std::panic::resume_unwind(e))?;
        Ok(Output { binding, script })
    })
}
