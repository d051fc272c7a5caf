use std::{error::Error, fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use cppy::{
    codegen::{self, Module},
    lexer, parser,
    util::fmt::tree,
};

/// Generates a Boost.Python binding source and a Python smoke test script
/// from a C++ header.
#[derive(Debug, clap::Parser)]
#[clap(author, version, about)]
struct Args {
    /// Header to translate
    header: PathBuf,

    /// Directory for the generated files [default: the header's directory]
    #[clap(short, long)]
    out_dir: Option<PathBuf>,

    /// Print the token stream to stderr
    #[clap(long)]
    emit_tokens: bool,

    /// Print the parsed declarations to stderr
    #[clap(long)]
    emit_ast: bool,

    /// Enable verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let header = &args.header;
    let src = fs::read_to_string(header)
        .map_err(|e| format!("can't read {}: {e}", header.display()))?;
    let module = Module::from_path(header)
        .ok_or_else(|| format!("{} doesn't name a valid module", header.display()))?;

    let mut tokens = Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY);
    let parsed = parser::parse_program(&src, &mut tokens);
    if args.emit_tokens {
        for token in &tokens {
            eprintln!("{token:?} {:?}", token.text(&src));
        }
    }
    let program = parsed.map_err(|e| format!("{}:{}", header.display(), e.located(&src)))?;
    if args.verbose {
        eprintln!("parsed {} tokens into {} declarations", tokens.len(), program.nodes.len());
    }
    if args.emit_ast {
        eprint!("{}", tree::print_program_string(&program));
    }

    let output = codegen::generate(&program, &module)?;

    let out_dir = match &args.out_dir {
        Some(dir) => dir.clone(),
        None => header.parent().map(PathBuf::from).unwrap_or_default(),
    };
    let (binding_path, script_path) = module.output_paths(&out_dir);
    fs::write(&binding_path, output.binding)?;
    fs::write(&script_path, output.script)?;
    if args.verbose {
        eprintln!("wrote {}", binding_path.display());
        eprintln!("wrote {}", script_path.display());
    }
    Ok(())
}
