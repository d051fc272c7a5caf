use std::{
    collections::HashSet,
    fmt::{self, Write},
    format_args as f,
};

use crate::{
    ast::{Function, Program, Struct},
    codegen::{
        discovery::{discover, Discovery},
        mangle::{self, mangle},
        Module,
    },
    token::ContainerKind,
    util::indent::IndentWriter,
};

const DEFAULT_CODE_CAPACITY: usize = 4 * 1024; // 4 KiB

/// Generates the Boost.Python binding source for `program`.
pub fn generate(program: &Program, module: &Module) -> Result<String, mangle::Error> {
    BindingGen::new(program, module).gen()
}

struct BindingGen<'a> {
    out: IndentWriter<String>,
    program: &'a Program,
    module: &'a Module,
}

impl<'a> BindingGen<'a> {
    fn new(program: &'a Program, module: &'a Module) -> BindingGen<'a> {
        BindingGen {
            out: IndentWriter::new(String::with_capacity(DEFAULT_CODE_CAPACITY)),
            program,
            module,
        }
    }

    fn gen(mut self) -> Result<String, mangle::Error> {
        let discovery = discover(self.program);
        self.gen_preamble(&discovery);
        self.gen_stubs(&discovery);
        self.gen_module(&discovery)?;
        Ok(self.out.into_inner())
    }

    fn gen_preamble(&mut self, discovery: &Discovery) {
        let module = self.module;
        let header = &module.header;
        self.emit(f!("\
            // Generated by cppy from {header}.\n\
            // Function stubs and equality operators may be edited by hand.\n\
            \n\
            #include <boost/python.hpp>\n\
        "));
        if discovery.families.contains(&ContainerKind::Map) {
            self.emit(f!("#include <boost/python/suite/indexing/map_indexing_suite.hpp>\n"));
        }
        if discovery.families.contains(&ContainerKind::Vector) {
            self.emit(f!("#include <boost/python/suite/indexing/vector_indexing_suite.hpp>\n"));
        }
        self.emit(f!("\n#include \"{header}\"\n\n"));
    }

    /// Skeletons for functions declared without a body, followed by one
    /// placeholder `operator==` per struct stored in a container.
    fn gen_stubs(&mut self, discovery: &Discovery) {
        let program = self.program;
        for function in program.functions().filter(|f| !f.is_defined) {
            self.gen_signature(function);
            self.gen_body(f!("// IMPLEMENTATION\n"));
        }
        for name in &discovery.equality_required {
            self.emit(f!("bool operator==({name} const& lhs, {name} const& rhs)"));
            self.gen_body(f!("// CHANGE IF NECESSARY\nreturn &lhs == &rhs;\n"));
        }
    }

    /// Emits ` { <body> }` with the body one level deeper, then a blank line.
    fn gen_body(&mut self, body: fmt::Arguments<'_>) {
        self.emit(f!(" {{\n"));
        self.out.indent();
        self.emit(body);
        self.out.unindent();
        self.emit(f!("}}\n\n"));
    }

    fn gen_signature(&mut self, function: &Function) {
        self.emit(f!("{} {}(", function.return_ty, function.name));
        for (idx, param) in function.params.iter().enumerate() {
            if idx > 0 {
                self.emit(f!(", "));
            }
            if param.name.is_empty() {
                self.emit(f!("{}", param.ty));
            } else {
                self.emit(f!("{} {}", param.ty, param.name));
            }
        }
        self.emit(f!(")"));
    }

    fn gen_module(&mut self, discovery: &Discovery) -> Result<(), mangle::Error> {
        let (program, module) = (self.program, self.module);
        self.emit(f!("BOOST_PYTHON_MODULE({}) {{\n", module.name));
        self.out.indent();
        self.emit(f!("using namespace boost::python;\n"));

        let mut seen = HashSet::new();
        for s in program.structs().filter(|s| seen.insert(&s.name)) {
            self.gen_struct(s);
        }

        let mut functions = program.functions().peekable();
        if functions.peek().is_some() {
            self.emit(f!("\n"));
        }
        for function in functions {
            self.gen_function(function);
        }

        for (canonical, container) in &discovery.containers {
            let name = mangle(canonical)?;
            let suite = match container.kind {
                ContainerKind::Map => "map_indexing_suite",
                _ => "vector_indexing_suite",
            };
            self.emit(f!("\nclass_<{container}>(\"{name}\")\n"));
            self.out.indent();
            self.emit(f!(".def({suite}<{container}>());\n"));
            self.out.unindent();
        }

        let mut globals = program.globals().peekable();
        if globals.peek().is_some() {
            self.emit(f!("\n"));
        }
        for global in globals {
            let name = &global.name;
            self.emit(f!("scope().attr(\"{name}\") = boost::ref({name});\n"));
        }

        self.out.unindent();
        self.emit(f!("}}\n"));
        Ok(())
    }

    fn gen_struct(&mut self, s: &Struct) {
        let name = &s.name;
        self.emit(f!("\nclass_<{name}>(\"{name}\")"));
        self.out.indent();
        for member in &s.members {
            let def = if member.ty.is_const() {
                "def_readonly"
            } else {
                "def_readwrite"
            };
            let member = &member.name;
            self.emit(f!("\n.{def}(\"{member}\", &{name}::{member})"));
        }
        self.out.unindent();
        self.emit(f!(";\n"));
    }

    fn gen_function(&mut self, function: &Function) {
        let name = &function.name;
        if function.return_ty.is_indirect() {
            self.emit(f!(
                "def(\"{name}\", {name}, return_value_policy<reference_existing_object>());\n"
            ));
        } else {
            self.emit(f!("def(\"{name}\", {name});\n"));
        }
    }
}

// Utility functions.
impl BindingGen<'_> {
    fn emit(&mut self, f: fmt::Arguments<'_>) {
        self.out
            .write_fmt(f)
            .expect("code emit should be infallible");
    }
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use binding;

        fn test_empty_header() {
            let program = "";
            let output_ok = r#"
                // Generated by cppy from demo.h.
                // Function stubs and equality operators may be edited by hand.

                #include <boost/python.hpp>

                #include "demo.h"

                BOOST_PYTHON_MODULE(demo) {
                    using namespace boost::python;
                }
            "#;
        }

        fn test_struct_members() {
            let program = "
                struct Rocket {
                    double max_speed;
                    std::string const name;
                    unsigned int stages;
                };
            ";
            let output_ok = r#"
                // Generated by cppy from demo.h.
                // Function stubs and equality operators may be edited by hand.

                #include <boost/python.hpp>

                #include "demo.h"

                BOOST_PYTHON_MODULE(demo) {
                    using namespace boost::python;

                    class_<Rocket>("Rocket")
                        .def_readwrite("max_speed", &Rocket::max_speed)
                        .def_readonly("name", &Rocket::name)
                        .def_readwrite("stages", &Rocket::stages);
                }
            "#;
        }

        fn test_functions_and_stubs() {
            let program = "
                struct Rocket { long price; };
                inline void launch(Rocket r, std::string& when);
                Rocket& find(char const* name);
                int count() { return 3; }
            ";
            let output_ok = r#"
                // Generated by cppy from demo.h.
                // Function stubs and equality operators may be edited by hand.

                #include <boost/python.hpp>

                #include "demo.h"

                void launch(Rocket r, std::string& when) {
                    // IMPLEMENTATION
                }

                Rocket& find(char const* name) {
                    // IMPLEMENTATION
                }

                BOOST_PYTHON_MODULE(demo) {
                    using namespace boost::python;

                    class_<Rocket>("Rocket")
                        .def_readwrite("price", &Rocket::price);

                    def("launch", launch);
                    def("find", find, return_value_policy<reference_existing_object>());
                    def("count", count);
                }
            "#;
        }

        fn test_containers() {
            let program = "
                struct Rocket { std::map<std::string, Rocket> stages; };
                std::vector<Rocket*> const& list_rockets(std::vector<int> ids);
                inline std::vector<Rocket*> fleet;
            ";
            let output_ok = r#"
                // Generated by cppy from demo.h.
                // Function stubs and equality operators may be edited by hand.

                #include <boost/python.hpp>
                #include <boost/python/suite/indexing/map_indexing_suite.hpp>
                #include <boost/python/suite/indexing/vector_indexing_suite.hpp>

                #include "demo.h"

                std::vector<Rocket*> const& list_rockets(std::vector<int> ids) {
                    // IMPLEMENTATION
                }

                bool operator==(Rocket const& lhs, Rocket const& rhs) {
                    // CHANGE IF NECESSARY
                    return &lhs == &rhs;
                }

                BOOST_PYTHON_MODULE(demo) {
                    using namespace boost::python;

                    class_<Rocket>("Rocket")
                        .def_readwrite("stages", &Rocket::stages);

                    def("list_rockets", list_rockets, return_value_policy<reference_existing_object>());

                    class_<std::map<std::string, Rocket>>("map_stringRocket")
                        .def(map_indexing_suite<std::map<std::string, Rocket>>());

                    class_<std::vector<Rocket*>>("vector_Rocket_ptr")
                        .def(vector_indexing_suite<std::vector<Rocket*>>());

                    scope().attr("fleet") = boost::ref(fleet);
                }
            "#;
        }

        fn test_builtin_containers_are_not_registered() {
            let program = "
                struct Student { std::map<int, double> grades; };
                inline std::vector<std::string> all_classes;
                std::vector<std::string> list_teachers();
            ";
            let output_ok = r#"
                // Generated by cppy from demo.h.
                // Function stubs and equality operators may be edited by hand.

                #include <boost/python.hpp>

                #include "demo.h"

                std::vector<std::string> list_teachers() {
                    // IMPLEMENTATION
                }

                BOOST_PYTHON_MODULE(demo) {
                    using namespace boost::python;

                    class_<Student>("Student")
                        .def_readwrite("grades", &Student::grades);

                    def("list_teachers", list_teachers);

                    scope().attr("all_classes") = boost::ref(all_classes);
                }
            "#;
        }

        fn test_map_as_member_and_return_type_registered_once() {
            let program = "
                struct Rocket { long price; };
                struct Hangar { std::map<std::string, Rocket> rockets; };
                std::map<std::string, Rocket> get_rockets();
            ";
            let output_ok = r#"
                // Generated by cppy from demo.h.
                // Function stubs and equality operators may be edited by hand.

                #include <boost/python.hpp>
                #include <boost/python/suite/indexing/map_indexing_suite.hpp>

                #include "demo.h"

                std::map<std::string, Rocket> get_rockets() {
                    // IMPLEMENTATION
                }

                bool operator==(Rocket const& lhs, Rocket const& rhs) {
                    // CHANGE IF NECESSARY
                    return &lhs == &rhs;
                }

                BOOST_PYTHON_MODULE(demo) {
                    using namespace boost::python;

                    class_<Rocket>("Rocket")
                        .def_readwrite("price", &Rocket::price);

                    class_<Hangar>("Hangar")
                        .def_readwrite("rockets", &Hangar::rockets);

                    def("get_rockets", get_rockets);

                    class_<std::map<std::string, Rocket>>("map_stringRocket")
                        .def(map_indexing_suite<std::map<std::string, Rocket>>());
                }
            "#;
        }

        fn test_repeated_struct_registered_once() {
            let program = "
                struct Rocket { long price; };
                struct Rocket { long price; };
            ";
            let output_ok = r#"
                // Generated by cppy from demo.h.
                // Function stubs and equality operators may be edited by hand.

                #include <boost/python.hpp>

                #include "demo.h"

                BOOST_PYTHON_MODULE(demo) {
                    using namespace boost::python;

                    class_<Rocket>("Rocket")
                        .def_readwrite("price", &Rocket::price);
                }
            "#;
        }

        fn test_error_unmangleable_container() {
            let program = "
                struct Rocket { long price; };
                std::map<int, Rocket, int> lookup();
            ";
            let expected_errors = &["can't derive a python name for container `map<int, Rocket, int>`"];
        }

        fn test_error_stops_generation() {
            let program = "struct Rocket {\n    long price;\n";
            let expected_errors = &["3:1: unclosed struct_def scope (2 scopes still open)"];
        }
    );
}
