use crate::language::span::Span;
use crate::runtime::value::TypeDesc;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// A dynamic failure, carrying the source span of the offending construct
/// where one is known so the CLI can point at it.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Option<Span>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind) -> Self {
        Self { kind, span: None }
    }

    pub fn with_span(kind: RuntimeErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: Some(span),
        }
    }
}

#[derive(Debug, Error)]
pub enum RuntimeErrorKind {
    #[error("Unknown symbol `{name}`")]
    UnknownSymbol { name: String },
    #[error("Unknown type `{name}`")]
    UnknownType { name: String },
    #[error("Duplicate declaration `{name}`")]
    DuplicateDeclaration { name: String },
    #[error("`{name}` is already bound in this scope")]
    Redeclaration { name: String },
    #[error("`{name}` is not a reassignable variable")]
    NotAssignable { name: String },
    #[error("Cannot assign {actual} to `{name}` of type {expected}")]
    AssignTypeMismatch {
        name: String,
        expected: TypeDesc,
        actual: TypeDesc,
    },
    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String },
    #[error("Function `{name}` expected {expected} arguments but received {received}")]
    ArityMismatch {
        name: String,
        expected: usize,
        received: usize,
    },
    #[error("Function `{function}` parameter `{param}` expects {expected} but received {actual}")]
    ParamTypeMismatch {
        function: String,
        param: String,
        expected: TypeDesc,
        actual: TypeDesc,
    },
    #[error("Function `{name}` declared return type {expected} but returned {actual}")]
    ReturnTypeMismatch {
        name: String,
        expected: TypeDesc,
        actual: TypeDesc,
    },
    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("Structure `{name}` has no field `{field}`")]
    UnknownField { name: String, field: String },
    #[error("Cast from {from_ty} to `{target}` is not implemented")]
    UnimplementedCast { target: String, from_ty: TypeDesc },
    #[error("`Nothing` cannot be compared")]
    NothingComparison,
    #[error("`{signal}` outside of a loop")]
    SignalEscapedLoop { signal: &'static str },
    #[error("Program has no `main` function")]
    MissingMain,
    #[error("Command `{command}` exited with status {status}")]
    ProcessFailed { command: String, status: i32 },
    #[error("Failed to run `{command}`: {message}")]
    ProcessError { command: String, message: String },
}
