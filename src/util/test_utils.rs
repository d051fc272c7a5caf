use crate::{
    codegen::{self, Module},
    parser,
    util::fmt::tree,
};

/// Each variant contains the input.
pub enum Test {
    Parser(&'static str),
    Binding(&'static str),
    Script(&'static str),
}

pub enum Assertion {
    /// The printed tree or generated document, compared with surrounding
    /// whitespace trimmed.
    Ok(&'static str),
    ExpectedErrors(&'static [&'static str]),
}

pub fn test_module() -> Module {
    Module::new("demo", "demo.h")
}

#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Vec<String>) {
    let tokens_buf = &mut Vec::with_capacity(1024);

    let input = match test {
        Test::Parser(input) => {
            return match parser::parse_program(input, tokens_buf) {
                Ok(program) => (tree::print_program_string(&program), vec![]),
                Err(error) => (String::new(), vec![error.located(input).to_string()]),
            };
        }
        Test::Binding(input) | Test::Script(input) => input,
    };
    match crate::translate(input, &test_module()) {
        Ok(codegen::Output { binding, script }) => match test {
            Test::Script(_) => (script, vec![]),
            _ => (binding, vec![]),
        },
        Err(error) => (String::new(), vec![error.with_source(input).to_string()]),
    }
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_output: &str,
    formatted_actual_errors: &[String],
) {
    match assertion {
        Assertion::Ok(expected) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            ::pretty_assertions::assert_eq!(formatted_actual_output.trim(), expected.trim());
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors)
        }
    }
}

/// Expands a list of `fn name() { let <kind> = <input>; <assertions> }`
/// items into tests. `use parser;` compares the printed tree, `use binding;`
/// and `use script;` compare the generated documents.
macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let program = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind), ::indoc::indoc! { $source });
                let (formatted_actual_output, formatted_actual_errors) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_output, &formatted_actual_errors);
                tree_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        tree_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::Ok(::indoc::indoc! { $expected })
    };
    (@@assertion, output_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::Ok(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };

    (@@get_test(parser), $source:expr) => {
        crate::util::test_utils::Test::Parser($source)
    };
    (@@get_test(binding), $source:expr) => {
        crate::util::test_utils::Test::Binding($source)
    };
    (@@get_test(script), $source:expr) => {
        crate::util::test_utils::Test::Script($source)
    };
}
pub(crate) use tree_tests;
