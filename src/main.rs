use clap::{Parser, Subcommand};
use sol_lang::diagnostics::{emit_syntax_errors, report_io_error, report_runtime_error};
use sol_lang::language::{
    errors::{SyntaxError, SyntaxErrors},
    lexer,
    parser::parse,
    printer::print_program,
    source::SourceBuffer,
    token::TokenKind,
};
use sol_lang::runtime::{platform::StdPlatform, Interpreter};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "sol",
    version,
    about = "Sol language CLI",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan, parse, and interpret a Sol source file
    Run {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Dump the token stream and parse tree to stderr before running
        #[arg(long, default_value_t = false)]
        debug: bool,
    },
    /// Print the token stream of a Sol source file
    Scan {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the parse tree of a Sol source file
    PrintAst {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { file, debug } => run_file(&file, debug),
        Commands::Scan { file } => scan_file(&file),
        Commands::PrintAst { file } => print_ast_file(&file),
    }
}

fn load_source(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            report_io_error(path, &err);
            std::process::exit(1);
        }
    }
}

fn run_file(path: &Path, debug: bool) {
    let source = load_source(path);
    let program = match parse(&source) {
        Ok(program) => program,
        Err(errors) => {
            emit_syntax_errors(path, &source, &errors);
            std::process::exit(1);
        }
    };

    if debug {
        let buffer = SourceBuffer::new(source.clone());
        if let Ok(tokens) = lexer::lex(&source) {
            for line in token_listing(&tokens, &buffer) {
                eprintln!("{line}");
            }
        }
        eprint!("{}", print_program(&program));
    }

    let mut interpreter = Interpreter::new(program, StdPlatform);
    if let Err(err) = interpreter.interpret() {
        let buffer = SourceBuffer::new(source);
        report_runtime_error(&err, &buffer);
        std::process::exit(1);
    }
}

fn scan_file(path: &Path) {
    let source = load_source(path);
    match lexer::lex(&source) {
        Ok(tokens) => {
            let buffer = SourceBuffer::new(source);
            for line in token_listing(&tokens, &buffer) {
                println!("{line}");
            }
        }
        Err(errors) => {
            let errors = SyntaxErrors::new(
                errors
                    .into_iter()
                    .map(|err| SyntaxError::new(err.message, err.span))
                    .collect(),
            );
            emit_syntax_errors(path, &source, &errors);
            std::process::exit(1);
        }
    }
}

fn print_ast_file(path: &Path) {
    let source = load_source(path);
    match parse(&source) {
        Ok(program) => print!("{}", print_program(&program)),
        Err(errors) => {
            emit_syntax_errors(path, &source, &errors);
            std::process::exit(1);
        }
    }
}

/// One line per token as `[<line>, <col>] <kind>[: "<lexeme>"]`. The `Eof`
/// terminator is an implementation detail and is not listed.
fn token_listing(
    tokens: &[sol_lang::language::token::Token],
    buffer: &SourceBuffer,
) -> Vec<String> {
    tokens
        .iter()
        .filter(|token| token.kind != TokenKind::Eof)
        .map(|token| {
            let position = buffer.position(token.span.start);
            match token.kind.lexeme() {
                Some(lexeme) => format!(
                    "[{}, {}] {}: \"{}\"",
                    position.line,
                    position.column,
                    token.kind.name(),
                    lexeme
                ),
                None => format!(
                    "[{}, {}] {}",
                    position.line,
                    position.column,
                    token.kind.name()
                ),
            }
        })
        .collect()
}
