use std::io::Write;

use crate::ast::*;

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, program).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_program(w: &mut impl Write, program: &Program) -> std::io::Result<()> {
    for node in &program.nodes {
        print_node(w, 0, node)?;
    }
    Ok(())
}

fn print_node(w: &mut impl Write, i: usize, node: &Node) -> std::io::Result<()> {
    sp(w, i)?;
    match node {
        Node::Include(Include { name, is_system }) => {
            if *is_system {
                writeln!(w, "include <{name}>")?;
            } else {
                writeln!(w, "include {name:?}")?;
            }
        }
        Node::Struct(s) => {
            writeln!(w, "struct {}", s.name)?;
            for member in &s.members {
                print_variable(w, i + 1, "member", member)?;
            }
        }
        Node::Function(function) => {
            write!(w, "function {}", function.name)?;
            if function.is_defined {
                write!(w, " (defined)")?;
            }
            writeln!(w, " -> {}", function.return_ty)?;
            for param in &function.params {
                print_variable(w, i + 1, "param", param)?;
            }
        }
        Node::Variable(var) => {
            writeln!(w, "global {}: {}", var.name, var.ty)?;
        }
    }
    Ok(())
}

fn print_variable(w: &mut impl Write, i: usize, label: &str, var: &Variable) -> std::io::Result<()> {
    sp(w, i)?;
    writeln!(w, "{label} {}: {}", var.name, var.ty)
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
