use crate::language::{errors::SyntaxErrors, source::SourceBuffer};
use crate::runtime::error::RuntimeError;
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic, Clone)]
#[error("{message}")]
pub struct SyntaxDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
}

pub fn emit_syntax_errors(path: &Path, source: &str, errors: &SyntaxErrors) {
    let src = NamedSource::new(path.display().to_string(), source.to_string());
    for err in &errors.errors {
        let diagnostic = SyntaxDiagnostic {
            src: src.clone(),
            span: err.to_source_span(),
            help: err.help.clone(),
            message: err.message.clone(),
        };
        eprintln!("{:?}", Report::new(diagnostic));
    }
}

pub fn report_runtime_error(error: &RuntimeError, buffer: &SourceBuffer) {
    eprintln!("Runtime error: {error}");
    if let Some(span) = error.span {
        let position = buffer.position(span.start);
        eprintln!("  at line {}, column {}:", position.line, position.column);
        for line in buffer.snippet(span.start).lines() {
            eprintln!("  {line}");
        }
    }
}

pub fn report_io_error(path: &Path, error: &std::io::Error) {
    eprintln!("Failed to access {}: {}", path.display(), error);
}
