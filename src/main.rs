use std::io::{self, Read};
use std::process;

use clap::Parser as ArgParser;
use owo_colors::OwoColorize;

use coremu::interpreter::{Interpreter, InterpreterOptions};
use coremu::parser::{Cursor, Parser};
use coremu::types::{type_program, TypingContext};

/// Interpreter for the Core λμμ̃ sequent calculus.
///
/// Reads a program from standard input, typechecks it and runs it.
/// Results go to standard output, diagnostics to standard error.
#[derive(Debug, ArgParser)]
#[command(name = "coremu", version, about)]
struct Args {
    /// Print every reduction rule and intermediate statement
    #[arg(long)]
    trace: bool,
    /// Print definitions before running
    #[arg(long)]
    definitions: bool,
    /// Print inferred types with definitions and initial statements
    #[arg(long)]
    types: bool,
    /// Use μ/μ' spellings instead of mu/mu' in output
    #[arg(long)]
    unicode: bool,
    /// Suppress statement results
    #[arg(long)]
    quiet: bool,
}

fn report(name: &str, message: &str) {
    eprintln!("{}: {message}", name.red().bold());
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut source = String::new();
    io::stdin().read_to_string(&mut source)?;

    let mut ctx = TypingContext::with_builtins();
    let (mut program, n_vars, n_covars) = {
        let mut parser = Parser::new(&mut ctx);
        let mut cursor = Cursor::new(&source);
        match parser.parse_program(&mut cursor) {
            Ok(program) => (program, parser.n_vars(), parser.n_covars()),
            Err(error) => {
                report(error.name(), &error.to_string());
                process::exit(1);
            }
        }
    };

    if let Err(errors) = type_program(&mut program, &mut ctx) {
        report(errors.name(), &errors.to_string());
        process::exit(2);
    }

    let options = InterpreterOptions {
        print_definitions: args.definitions || args.trace,
        print_start: args.trace,
        print_intermediate: args.trace,
        print_results: !args.quiet,
        print_info: args.trace,
        print_types: args.types,
        unicode: args.unicode,
    };
    let mut interpreter = Interpreter::new(
        n_vars,
        n_covars,
        program,
        options,
        io::stdout(),
        Some(&ctx),
    );
    if let Err(error) = interpreter.run() {
        report(error.name(), &error.to_string());
        process::exit(3);
    }
    Ok(())
}
