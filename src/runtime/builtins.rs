use crate::language::span::Span;
use crate::runtime::{
    error::{RuntimeError, RuntimeErrorKind, RuntimeResult},
    platform::Platform,
    value::{TypeDesc, Value},
};

/// Built-in functions reserve their names in the global namespace; user
/// declarations cannot shadow them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinKind {
    Print,
    Run,
}

pub struct BuiltinDecl {
    pub name: &'static str,
    pub kind: BuiltinKind,
    pub params: Vec<(String, TypeDesc)>,
}

pub fn registry() -> Vec<BuiltinDecl> {
    vec![
        BuiltinDecl {
            name: "print",
            kind: BuiltinKind::Print,
            params: vec![("msg".to_string(), TypeDesc::String)],
        },
        BuiltinDecl {
            name: "run",
            kind: BuiltinKind::Run,
            params: vec![(
                "command".to_string(),
                TypeDesc::List(Box::new(TypeDesc::String)),
            )],
        },
    ]
}

/// `print(msg String)`: the payload plus a trailing newline, no quoting.
pub fn print(platform: &mut dyn Platform, message: &Value) -> RuntimeResult<Value> {
    match message {
        Value::String(text) => {
            platform.stdout_print(text);
            Ok(Value::Nothing)
        }
        other => Err(RuntimeError::new(RuntimeErrorKind::TypeMismatch {
            message: format!("`print` expects String, got {}", other.type_desc()),
        })),
    }
}

/// `run(command String[])`: spawn the command through the host platform,
/// streaming its output to the sinks; a nonzero exit is a runtime error.
pub fn run(platform: &mut dyn Platform, command: &Value, span: Span) -> RuntimeResult<Value> {
    let Value::List(list) = command else {
        return Err(RuntimeError::with_span(
            RuntimeErrorKind::TypeMismatch {
                message: format!("`run` expects String[], got {}", command.type_desc()),
            },
            span,
        ));
    };

    let mut parts = Vec::with_capacity(list.items.len());
    for item in &list.items {
        match item {
            Value::String(text) => parts.push(text.to_string()),
            other => {
                return Err(RuntimeError::with_span(
                    RuntimeErrorKind::TypeMismatch {
                        message: format!(
                            "`run` expects String[], got an element of type {}",
                            other.type_desc()
                        ),
                    },
                    span,
                ));
            }
        }
    }

    let display = parts.join(" ");
    match platform.run_process(&parts) {
        Ok(0) => Ok(Value::Nothing),
        Ok(status) => Err(RuntimeError::with_span(
            RuntimeErrorKind::ProcessFailed {
                command: display,
                status,
            },
            span,
        )),
        Err(message) => Err(RuntimeError::with_span(
            RuntimeErrorKind::ProcessError {
                command: display,
                message,
            },
            span,
        )),
    }
}
