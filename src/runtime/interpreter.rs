use crate::language::{
    ast::*,
    span::Span,
};
use crate::runtime::{
    builtins::{self, BuiltinDecl, BuiltinKind},
    environment::CallStack,
    error::{RuntimeError, RuntimeErrorKind, RuntimeResult},
    platform::Platform,
    value::{ListValue, StructValue, TypeDesc, Value},
};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// The tree-walking evaluator. Owns the declaration tables, the call
/// stack, and the host platform; `interpret` registers declarations and
/// runs `main`.
pub struct Interpreter<P: Platform> {
    program: Program,
    functions: HashMap<String, Rc<FunctionInfo>>,
    structures: HashMap<String, Rc<StructInfo>>,
    builtins: HashMap<&'static str, BuiltinDecl>,
    env: CallStack,
    platform: P,
}

struct FunctionInfo {
    decl: FunctionDecl,
    params: Vec<(String, TypeDesc)>,
    return_ty: TypeDesc,
}

struct StructInfo {
    fields: Vec<(String, TypeDesc)>,
}

/// What a block hands back to its enclosing construct: run to completion,
/// or an early exit that the right construct has to absorb.
enum FlowSignal {
    Break,
    Continue,
    Return(Value),
}

impl<P: Platform> Interpreter<P> {
    pub fn new(program: Program, platform: P) -> Self {
        Self {
            program,
            functions: HashMap::new(),
            structures: HashMap::new(),
            builtins: builtins::registry()
                .into_iter()
                .map(|decl| (decl.name, decl))
                .collect(),
            env: CallStack::new(),
            platform,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    #[cfg(test)]
    pub(crate) fn stack_depth(&self) -> usize {
        self.env.depth()
    }

    /// Register every top-level declaration, then call `main` with no
    /// arguments.
    pub fn interpret(&mut self) -> RuntimeResult<()> {
        self.register_declarations()?;
        let main = self
            .functions
            .get("main")
            .cloned()
            .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::MissingMain))?;
        if !main.params.is_empty() {
            return Err(RuntimeError::with_span(
                RuntimeErrorKind::ArityMismatch {
                    name: "main".to_string(),
                    expected: main.params.len(),
                    received: 0,
                },
                main.decl.span,
            ));
        }
        self.call_function(main, Vec::new(), None)?;
        Ok(())
    }

    /// Functions, structures, constants, and built-ins inhabit one flat
    /// namespace; collisions are load-time errors. Structure names are
    /// collected first so field and parameter types can reference any
    /// declared structure regardless of order.
    fn register_declarations(&mut self) -> RuntimeResult<()> {
        let decls = self.program.decls.clone();

        let mut names: HashSet<String> = HashSet::new();
        let mut struct_names: HashSet<String> = HashSet::new();
        for decl in &decls {
            let name = decl.name();
            if self.builtins.contains_key(name) || !names.insert(name.to_string()) {
                return Err(RuntimeError::with_span(
                    RuntimeErrorKind::DuplicateDeclaration {
                        name: name.to_string(),
                    },
                    decl.span(),
                ));
            }
            if let Decl::Structure(decl) = decl {
                struct_names.insert(decl.name.name.clone());
            }
        }

        for decl in &decls {
            match decl {
                Decl::Structure(decl) => {
                    let mut fields = Vec::with_capacity(decl.fields.len());
                    for field in &decl.fields {
                        fields.push((
                            field.name.name.clone(),
                            resolve_type_ref(&field.ty, &struct_names)?,
                        ));
                    }
                    self.structures
                        .insert(decl.name.name.clone(), Rc::new(StructInfo { fields }));
                }
                Decl::Function(decl) => {
                    let mut params = Vec::with_capacity(decl.params.len());
                    for param in &decl.params {
                        params.push((
                            param.name.name.clone(),
                            resolve_type_ref(&param.ty, &struct_names)?,
                        ));
                    }
                    let return_ty = match &decl.return_ty {
                        Some(ty) => resolve_type_ref(ty, &struct_names)?,
                        None => TypeDesc::Nothing,
                    };
                    self.functions.insert(
                        decl.name.name.clone(),
                        Rc::new(FunctionInfo {
                            decl: decl.clone(),
                            params,
                            return_ty,
                        }),
                    );
                }
                Decl::Const(_) => {}
            }
        }

        // Constant initializers run eagerly, in declaration order, in the
        // global frame.
        for decl in &decls {
            if let Decl::Const(decl) = decl {
                let value = self.eval_expression(&decl.value)?;
                self.env
                    .declare_const(&decl.name.name, value)
                    .map_err(|err| spanned(err, decl.span))?;
            }
        }
        Ok(())
    }

    fn call_named(
        &mut self,
        name: &str,
        args: Vec<Value>,
        call_span: Span,
    ) -> RuntimeResult<Value> {
        if let Some(builtin) = self.builtins.get(name) {
            let kind = builtin.kind;
            self.check_call_types(name, &builtin.params, &args, call_span)?;
            return self.call_builtin(kind, args, call_span);
        }
        let info = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| {
                RuntimeError::with_span(
                    RuntimeErrorKind::UnknownSymbol {
                        name: name.to_string(),
                    },
                    call_span,
                )
            })?;
        self.check_call_types(name, &info.params, &args, call_span)?;
        self.call_function(info, args, Some(call_span))
    }

    fn check_call_types(
        &self,
        name: &str,
        params: &[(String, TypeDesc)],
        args: &[Value],
        call_span: Span,
    ) -> RuntimeResult<()> {
        if params.len() != args.len() {
            return Err(RuntimeError::with_span(
                RuntimeErrorKind::ArityMismatch {
                    name: name.to_string(),
                    expected: params.len(),
                    received: args.len(),
                },
                call_span,
            ));
        }
        for ((param, expected), arg) in params.iter().zip(args.iter()) {
            let actual = arg.type_desc();
            if *expected != actual {
                return Err(RuntimeError::with_span(
                    RuntimeErrorKind::ParamTypeMismatch {
                        function: name.to_string(),
                        param: param.clone(),
                        expected: expected.clone(),
                        actual,
                    },
                    call_span,
                ));
            }
        }
        Ok(())
    }

    fn call_builtin(
        &mut self,
        kind: BuiltinKind,
        args: Vec<Value>,
        call_span: Span,
    ) -> RuntimeResult<Value> {
        match kind {
            BuiltinKind::Print => builtins::print(&mut self.platform, &args[0]),
            BuiltinKind::Run => builtins::run(&mut self.platform, &args[0], call_span),
        }
    }

    /// Push the call frame, bind arguments, run the body, absorb a
    /// `return`, validate the result against the declared return type.
    /// The frame is popped on every exit path.
    fn call_function(
        &mut self,
        info: Rc<FunctionInfo>,
        args: Vec<Value>,
        call_span: Option<Span>,
    ) -> RuntimeResult<Value> {
        self.env.push_frame();
        let result = self.run_function_body(&info, args);
        self.env.pop_frame();
        let value = result?;

        let actual = value.type_desc();
        if actual != info.return_ty {
            let kind = RuntimeErrorKind::ReturnTypeMismatch {
                name: info.decl.name.name.clone(),
                expected: info.return_ty.clone(),
                actual,
            };
            return Err(match call_span {
                Some(span) => RuntimeError::with_span(kind, span),
                None => RuntimeError::with_span(kind, info.decl.span),
            });
        }
        Ok(value)
    }

    fn run_function_body(
        &mut self,
        info: &FunctionInfo,
        args: Vec<Value>,
    ) -> RuntimeResult<Value> {
        for ((param, _), value) in info.params.iter().zip(args.into_iter()) {
            self.env.bind_arg(param, value)?;
        }
        match self.eval_statements(&info.decl.body.statements)? {
            Some(FlowSignal::Return(value)) => Ok(value),
            Some(FlowSignal::Break) => Err(RuntimeError::new(
                RuntimeErrorKind::SignalEscapedLoop { signal: "break" },
            )),
            Some(FlowSignal::Continue) => Err(RuntimeError::new(
                RuntimeErrorKind::SignalEscapedLoop { signal: "continue" },
            )),
            None => Ok(Value::Nothing),
        }
    }

    /// Run a `{ ... }` body in a fresh block scope, popped on every exit
    /// path so the stack stays balanced even when an error unwinds.
    fn eval_block(&mut self, block: &Block) -> RuntimeResult<Option<FlowSignal>> {
        self.env.push_frame();
        let result = self.eval_statements(&block.statements);
        self.env.pop_frame();
        result
    }

    fn eval_statements(&mut self, statements: &[Statement]) -> RuntimeResult<Option<FlowSignal>> {
        for statement in statements {
            if let Some(flow) = self.eval_statement(statement)? {
                return Ok(Some(flow));
            }
        }
        Ok(None)
    }

    fn eval_statement(&mut self, statement: &Statement) -> RuntimeResult<Option<FlowSignal>> {
        match statement {
            Statement::VarDecl(stmt) => {
                let value = self.eval_expression(&stmt.value)?;
                self.env
                    .declare_var(&stmt.name.name, value)
                    .map_err(|err| spanned(err, stmt.name.span))?;
                Ok(None)
            }
            Statement::Assign(stmt) => {
                let value = self.eval_expression(&stmt.value)?;
                self.env
                    .assign(&stmt.name.name, value)
                    .map_err(|err| spanned(err, stmt.name.span))?;
                Ok(None)
            }
            Statement::Expr(stmt) => {
                self.eval_expression(&stmt.expr)?;
                Ok(None)
            }
            Statement::Return(stmt) => {
                let value = match &stmt.value {
                    Some(expr) => self.eval_expression(expr)?,
                    None => Value::Nothing,
                };
                Ok(Some(FlowSignal::Return(value)))
            }
            Statement::Break(_) => Ok(Some(FlowSignal::Break)),
            Statement::Continue(_) => Ok(Some(FlowSignal::Continue)),
            Statement::If(stmt) => {
                if self.eval_condition(&stmt.condition)? {
                    return self.eval_block(&stmt.then_block);
                }
                for else_if in &stmt.else_ifs {
                    if self.eval_condition(&else_if.condition)? {
                        return self.eval_block(&else_if.block);
                    }
                }
                if let Some(else_block) = &stmt.else_block {
                    return self.eval_block(else_block);
                }
                Ok(None)
            }
            Statement::While(stmt) => {
                while self.eval_condition(&stmt.condition)? {
                    match self.eval_block(&stmt.body)? {
                        None => {}
                        Some(FlowSignal::Continue) => continue,
                        Some(FlowSignal::Break) => break,
                        Some(flow @ FlowSignal::Return(_)) => return Ok(Some(flow)),
                    }
                }
                Ok(None)
            }
            Statement::For(stmt) => {
                let iterable = self.eval_expression(&stmt.iterable)?;
                let Value::List(list) = iterable else {
                    return Err(RuntimeError::with_span(
                        RuntimeErrorKind::TypeMismatch {
                            message: format!(
                                "`for` requires a list, got {}",
                                iterable.type_desc()
                            ),
                        },
                        expr_span(&stmt.iterable),
                    ));
                };
                for (index, item) in list.items.iter().enumerate() {
                    self.env.push_frame();
                    let result = self
                        .env
                        .declare_var(&stmt.index.name, Value::Number(index as f64))
                        .and_then(|_| self.env.declare_var(&stmt.element.name, item.clone()))
                        .map_err(|err| spanned(err, stmt.span))
                        .and_then(|_| self.eval_statements(&stmt.body.statements));
                    self.env.pop_frame();
                    match result? {
                        None => {}
                        Some(FlowSignal::Continue) => continue,
                        Some(FlowSignal::Break) => break,
                        Some(flow @ FlowSignal::Return(_)) => return Ok(Some(flow)),
                    }
                }
                Ok(None)
            }
        }
    }

    fn eval_condition(&mut self, condition: &Expr) -> RuntimeResult<bool> {
        let value = self.eval_expression(condition)?;
        match value {
            Value::Boolean(flag) => Ok(flag),
            other => Err(RuntimeError::with_span(
                RuntimeErrorKind::TypeMismatch {
                    message: format!("condition must be Boolean, got {}", other.type_desc()),
                },
                expr_span(condition),
            )),
        }
    }

    fn eval_expression(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal(Literal::Number(value, _)) => Ok(Value::Number(*value)),
            Expr::Literal(Literal::String(value, _)) => Ok(Value::string(value)),
            Expr::Literal(Literal::Bool(value, _)) => Ok(Value::Boolean(*value)),
            Expr::Identifier(ident) => self.env.get(&ident.name).ok_or_else(|| {
                RuntimeError::with_span(
                    RuntimeErrorKind::UnknownSymbol {
                        name: ident.name.clone(),
                    },
                    ident.span,
                )
            }),
            Expr::TypeRef(ident) => Err(RuntimeError::with_span(
                RuntimeErrorKind::TypeMismatch {
                    message: format!("type `{}` cannot be used as a value", ident.name),
                },
                ident.span,
            )),
            Expr::Call { callee, args, span } => {
                let Expr::Identifier(name) = callee.as_ref() else {
                    return Err(RuntimeError::with_span(
                        RuntimeErrorKind::TypeMismatch {
                            message: "only named functions can be called".to_string(),
                        },
                        *span,
                    ));
                };
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expression(arg)?);
                }
                self.call_named(&name.name, values, *span)
            }
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => {
                let lhs = self.eval_expression(left)?;
                let rhs = self.eval_expression(right)?;
                self.eval_binary(*op, lhs, rhs, *span)
            }
            Expr::Unary { op, expr, span } => {
                let value = self.eval_expression(expr)?;
                match (op, value) {
                    (UnaryOp::Neg, Value::Number(v)) => Ok(Value::Number(-v)),
                    (UnaryOp::Not, Value::Boolean(v)) => Ok(Value::Boolean(!v)),
                    (op, value) => Err(RuntimeError::with_span(
                        RuntimeErrorKind::TypeMismatch {
                            message: format!(
                                "unary `{}` is not defined for {}",
                                op.symbol(),
                                value.type_desc()
                            ),
                        },
                        *span,
                    )),
                }
            }
            Expr::Cast { ty, expr, span } => {
                let value = self.eval_expression(expr)?;
                self.eval_cast(ty, value, *span)
            }
            Expr::Index {
                target,
                index,
                span,
            } => {
                let target_value = self.eval_expression(target)?;
                let index_value = self.eval_expression(index)?;
                let Value::List(list) = target_value else {
                    return Err(RuntimeError::with_span(
                        RuntimeErrorKind::TypeMismatch {
                            message: format!(
                                "only lists can be indexed, got {}",
                                target_value.type_desc()
                            ),
                        },
                        *span,
                    ));
                };
                let Value::Number(raw) = index_value else {
                    return Err(RuntimeError::with_span(
                        RuntimeErrorKind::TypeMismatch {
                            message: format!(
                                "list index must be Number, got {}",
                                index_value.type_desc()
                            ),
                        },
                        *span,
                    ));
                };
                let index = raw.floor() as i64;
                if index < 0 || index as usize >= list.items.len() {
                    return Err(RuntimeError::with_span(
                        RuntimeErrorKind::IndexOutOfRange {
                            index,
                            len: list.items.len(),
                        },
                        *span,
                    ));
                }
                Ok(list.items[index as usize].clone())
            }
            Expr::Field { base, field, span } => {
                let value = self.eval_expression(base)?;
                let Value::Structure(instance) = &value else {
                    return Err(RuntimeError::with_span(
                        RuntimeErrorKind::TypeMismatch {
                            message: format!(
                                "field access requires a structure, got {}",
                                value.type_desc()
                            ),
                        },
                        *span,
                    ));
                };
                instance
                    .get_field(&field.name)
                    .cloned()
                    .ok_or_else(|| {
                        RuntimeError::with_span(
                            RuntimeErrorKind::UnknownField {
                                name: instance.name.clone(),
                                field: field.name.clone(),
                            },
                            field.span,
                        )
                    })
            }
            Expr::ListLiteral { elem, items, span: _ } => {
                let elem_ty = self.resolve_type_name(&elem.name, elem.span)?;
                let mut values = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let value = self.eval_expression(item)?;
                    let actual = value.type_desc();
                    if actual != elem_ty {
                        return Err(RuntimeError::with_span(
                            RuntimeErrorKind::TypeMismatch {
                                message: format!(
                                    "list element {index} has type {actual}, expected {elem_ty}"
                                ),
                            },
                            expr_span(item),
                        ));
                    }
                    values.push(value);
                }
                Ok(Value::List(Rc::new(ListValue {
                    elem: elem_ty,
                    items: values,
                })))
            }
            Expr::StructLiteral { name, fields, span } => {
                self.eval_struct_literal(name, fields, *span)
            }
        }
    }

    /// Structure literals must supply exactly the declared fields, in
    /// declaration order, with matching value types. Field expressions are
    /// evaluated left-to-right before any checking so side effects run in
    /// source order.
    fn eval_struct_literal(
        &mut self,
        name: &Identifier,
        fields: &[StructLiteralField],
        span: Span,
    ) -> RuntimeResult<Value> {
        let info = self.structures.get(&name.name).cloned().ok_or_else(|| {
            RuntimeError::with_span(
                RuntimeErrorKind::UnknownType {
                    name: name.name.clone(),
                },
                name.span,
            )
        })?;

        let mut values = Vec::with_capacity(fields.len());
        for field in fields {
            values.push(self.eval_expression(&field.value)?);
        }

        if fields.len() != info.fields.len() {
            return Err(RuntimeError::with_span(
                RuntimeErrorKind::TypeMismatch {
                    message: format!(
                        "structure `{}` expects {} fields but the literal has {}",
                        name.name,
                        info.fields.len(),
                        fields.len()
                    ),
                },
                span,
            ));
        }

        let mut instance_fields = Vec::with_capacity(fields.len());
        for ((field, value), (declared_name, declared_ty)) in
            fields.iter().zip(values.into_iter()).zip(info.fields.iter())
        {
            if field.name.name != *declared_name {
                return Err(RuntimeError::with_span(
                    RuntimeErrorKind::TypeMismatch {
                        message: format!(
                            "structure `{}` literal field `{}` does not match declared field `{}`",
                            name.name, field.name.name, declared_name
                        ),
                    },
                    field.name.span,
                ));
            }
            let actual = value.type_desc();
            if actual != *declared_ty {
                return Err(RuntimeError::with_span(
                    RuntimeErrorKind::TypeMismatch {
                        message: format!(
                            "field `{}` of `{}` expects {declared_ty}, got {actual}",
                            declared_name, name.name
                        ),
                    },
                    field.span,
                ));
            }
            instance_fields.push((declared_name.clone(), value));
        }

        Ok(Value::Structure(Rc::new(StructValue {
            name: name.name.clone(),
            fields: instance_fields,
        })))
    }

    fn eval_cast(&mut self, ty: &Identifier, value: Value, span: Span) -> RuntimeResult<Value> {
        if ty.name != "String" {
            return Err(RuntimeError::with_span(
                RuntimeErrorKind::UnimplementedCast {
                    target: ty.name.clone(),
                    from_ty: value.type_desc(),
                },
                span,
            ));
        }
        match value {
            Value::String(_) => Ok(value),
            Value::Number(v) => Ok(Value::string(v.to_string())),
            other => Err(RuntimeError::with_span(
                RuntimeErrorKind::UnimplementedCast {
                    target: "String".to_string(),
                    from_ty: other.type_desc(),
                },
                span,
            )),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: Value,
        right: Value,
        span: Span,
    ) -> RuntimeResult<Value> {
        match op {
            BinaryOp::Eq => Ok(Value::Boolean(self.values_equal(&left, &right, span)?)),
            BinaryOp::NotEq => Ok(Value::Boolean(!self.values_equal(&left, &right, span)?)),
            _ => {
                let left_ty = left.type_desc();
                let right_ty = right.type_desc();
                if left_ty != right_ty {
                    return Err(RuntimeError::with_span(
                        RuntimeErrorKind::TypeMismatch {
                            message: format!(
                                "operands of `{}` must have the same type, got {left_ty} and {right_ty}",
                                op.symbol()
                            ),
                        },
                        span,
                    ));
                }
                match (op, left, right) {
                    (BinaryOp::Add, Value::Number(a), Value::Number(b)) => {
                        Ok(Value::Number(a + b))
                    }
                    (BinaryOp::Add, Value::String(a), Value::String(b)) => {
                        Ok(Value::string(format!("{a}{b}")))
                    }
                    (BinaryOp::Sub, Value::Number(a), Value::Number(b)) => {
                        Ok(Value::Number(a - b))
                    }
                    (BinaryOp::Mul, Value::Number(a), Value::Number(b)) => {
                        Ok(Value::Number(a * b))
                    }
                    // Division and remainder follow IEEE float semantics;
                    // dividing by zero is not trapped.
                    (BinaryOp::Div, Value::Number(a), Value::Number(b)) => {
                        Ok(Value::Number(a / b))
                    }
                    (BinaryOp::Rem, Value::Number(a), Value::Number(b)) => {
                        Ok(Value::Number(a % b))
                    }
                    (BinaryOp::Lt, Value::Number(a), Value::Number(b)) => {
                        Ok(Value::Boolean(a < b))
                    }
                    (BinaryOp::LtEq, Value::Number(a), Value::Number(b)) => {
                        Ok(Value::Boolean(a <= b))
                    }
                    (BinaryOp::Gt, Value::Number(a), Value::Number(b)) => {
                        Ok(Value::Boolean(a > b))
                    }
                    (BinaryOp::GtEq, Value::Number(a), Value::Number(b)) => {
                        Ok(Value::Boolean(a >= b))
                    }
                    (op, left, _) => Err(RuntimeError::with_span(
                        RuntimeErrorKind::TypeMismatch {
                            message: format!(
                                "operator `{}` is not defined for {}",
                                op.symbol(),
                                left.type_desc()
                            ),
                        },
                        span,
                    )),
                }
            }
        }
    }

    fn values_equal(&self, left: &Value, right: &Value, span: Span) -> RuntimeResult<bool> {
        if matches!(left, Value::Nothing) || matches!(right, Value::Nothing) {
            return Err(RuntimeError::with_span(
                RuntimeErrorKind::NothingComparison,
                span,
            ));
        }
        let left_ty = left.type_desc();
        let right_ty = right.type_desc();
        if left_ty != right_ty {
            return Err(RuntimeError::with_span(
                RuntimeErrorKind::TypeMismatch {
                    message: format!("cannot compare {left_ty} with {right_ty}"),
                },
                span,
            ));
        }
        match (left, right) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a == b),
            (Value::Number(a), Value::Number(b)) => Ok(a == b),
            (Value::String(a), Value::String(b)) => Ok(a == b),
            (Value::List(a), Value::List(b)) => {
                if a.items.len() != b.items.len() {
                    return Ok(false);
                }
                for (x, y) in a.items.iter().zip(b.items.iter()) {
                    if !self.values_equal(x, y, span)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Structure(a), Value::Structure(b)) => {
                for ((_, x), (_, y)) in a.fields.iter().zip(b.fields.iter()) {
                    if !self.values_equal(x, y, span)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => unreachable!("descriptor equality was checked above"),
        }
    }

    fn resolve_type_name(&self, name: &str, span: Span) -> RuntimeResult<TypeDesc> {
        match name {
            "Nothing" => Ok(TypeDesc::Nothing),
            "Boolean" => Ok(TypeDesc::Boolean),
            "Number" => Ok(TypeDesc::Number),
            "String" => Ok(TypeDesc::String),
            other if self.structures.contains_key(other) => {
                Ok(TypeDesc::Structure(other.to_string()))
            }
            other => Err(RuntimeError::with_span(
                RuntimeErrorKind::UnknownType {
                    name: other.to_string(),
                },
                span,
            )),
        }
    }
}

fn spanned(mut error: RuntimeError, span: Span) -> RuntimeError {
    if error.span.is_none() {
        error.span = Some(span);
    }
    error
}

fn resolve_type_ref(ty: &TypeRef, struct_names: &HashSet<String>) -> RuntimeResult<TypeDesc> {
    match &ty.kind {
        TypeRefKind::Name(name) => match name.as_str() {
            "Nothing" => Ok(TypeDesc::Nothing),
            "Boolean" => Ok(TypeDesc::Boolean),
            "Number" => Ok(TypeDesc::Number),
            "String" => Ok(TypeDesc::String),
            other if struct_names.contains(other) => Ok(TypeDesc::Structure(other.to_string())),
            other => Err(RuntimeError::with_span(
                RuntimeErrorKind::UnknownType {
                    name: other.to_string(),
                },
                ty.span,
            )),
        },
        TypeRefKind::List(inner) => Ok(TypeDesc::List(Box::new(resolve_type_ref(
            inner,
            struct_names,
        )?))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parser::parse;
    use crate::runtime::platform::BufferPlatform;

    fn interpret_source(source: &str) -> (Interpreter<BufferPlatform>, RuntimeResult<()>) {
        let program = parse(source).expect("parse failed");
        let mut interpreter = Interpreter::new(program, BufferPlatform::new());
        let result = interpreter.interpret();
        (interpreter, result)
    }

    fn run_ok(source: &str) -> Vec<String> {
        let (interpreter, result) = interpret_source(source);
        if let Err(err) = result {
            panic!("unexpected runtime error: {err}");
        }
        interpreter.platform().stdout.clone()
    }

    fn run_err(source: &str) -> RuntimeError {
        let (_, result) = interpret_source(source);
        result.expect_err("expected a runtime error")
    }

    #[test]
    fn hello_world() {
        assert_eq!(
            run_ok(r#"function main() { print("Hello, world!"); }"#),
            vec!["Hello, world!"]
        );
    }

    #[test]
    fn arithmetic_and_casts() {
        let output = run_ok(
            r#"
            function main() {
              print(String(1 + 2));
              print(String(2 * 3));
              print(String(7 / 2));
              print(String(7 % 2));
            }
            "#,
        );
        assert_eq!(output, vec!["3", "6", "3.5", "1"]);
    }

    #[test]
    fn comparisons() {
        let output = run_ok(
            r#"
            function main() {
              if 1 < 2 { print("reachable 1"); }
              if 2 <= 2 { print("reachable 2"); }
              if 3 > 2 { print("reachable 3"); }
              if 3 >= 3 { print("reachable 4"); }
            }
            "#,
        );
        assert_eq!(
            output,
            vec!["reachable 1", "reachable 2", "reachable 3", "reachable 4"]
        );
    }

    #[test]
    fn while_loop_counts() {
        let output = run_ok(
            r#"
            function main() {
              variable i = 0;
              while i < 3 { print(String(i)); i = i + 1; }
            }
            "#,
        );
        assert_eq!(output, vec!["0", "1", "2"]);
    }

    #[test]
    fn for_loop_max_reduction() {
        let output = run_ok(
            r#"
            function maxNumber(numbers Number[]) -> Number {
              variable max = 0;
              for i, n in numbers {
                if n > max { max = n; }
              }
              return max;
            }
            function main() {
              print("The biggest number is " + String(maxNumber(Number[1, 7, 3])));
            }
            "#,
        );
        assert_eq!(output, vec!["The biggest number is 7"]);
    }

    #[test]
    fn recursive_fibonacci() {
        let output = run_ok(
            r#"
            function fibonacci(n Number) -> Number {
              if n < 2 { return n; }
              return fibonacci(n - 1) + fibonacci(n - 2);
            }
            function main() { print(String(fibonacci(20))); }
            "#,
        );
        assert_eq!(output, vec!["6765"]);
    }

    #[test]
    fn structures_and_field_access() {
        let output = run_ok(
            r#"
            structure Student { name String; }
            structure Class { name String; students Student[]; }
            function main() {
              variable bob = Student{name: "Bob"};
              variable alice = Student{name: "Alice"};
              variable calculus = Class{name: "Calculus", students: Student[bob, alice]};
              print("Hello " + calculus.students[0].name + " and " + calculus.students[1].name + "!");
              print(bob.name + " is enrolled in " + calculus.name);
            }
            "#,
        );
        assert_eq!(
            output,
            vec!["Hello Bob and Alice!", "Bob is enrolled in Calculus"]
        );
    }

    #[test]
    fn early_return_suppresses_dead_code() {
        let output = run_ok(
            r#"
            function shout() { return; print("never"); }
            function main() { shout(); }
            "#,
        );
        assert!(output.is_empty());
    }

    #[test]
    fn return_type_mismatch_names_function_and_descriptors() {
        let err = run_err(
            r#"
            function bad() -> Nothing { return 42; }
            function main() { bad(); }
            "#,
        );
        match err.kind {
            RuntimeErrorKind::ReturnTypeMismatch {
                name,
                expected,
                actual,
            } => {
                assert_eq!(name, "bad");
                assert_eq!(expected, TypeDesc::Nothing);
                assert_eq!(actual, TypeDesc::Number);
            }
            other => panic!("expected return type mismatch, got {other}"),
        }
    }

    #[test]
    fn empty_program_errors_with_no_main() {
        let err = run_err("");
        assert!(matches!(err.kind, RuntimeErrorKind::MissingMain));
    }

    #[test]
    fn deep_else_if_chain_evaluates_correctly() {
        let mut source = String::from(
            "function main() { variable x = 63; if x == 0 { print(String(0)); }",
        );
        for i in 1..64 {
            source.push_str(&format!(" else if x == {i} {{ print(String(x)); }}"));
        }
        source.push_str(" else { print(\"none\"); } }");
        assert_eq!(run_ok(&source), vec!["63"]);
    }

    #[test]
    fn chained_division_pins_left_associativity() {
        assert_eq!(
            run_ok("function main() { print(String(6 / 3 / 2)); }"),
            vec!["1"]
        );
    }

    #[test]
    fn division_by_zero_follows_ieee_semantics() {
        assert_eq!(
            run_ok("function main() { print(String(1 / 0)); }"),
            vec!["inf"]
        );
    }

    #[test]
    fn remainder_keeps_the_dividend_sign() {
        assert_eq!(
            run_ok("function main() { print(String((0 - 7) % 2)); }"),
            vec!["-1"]
        );
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            run_ok(r#"function main() { print("foo" + "bar"); }"#),
            vec!["foobar"]
        );
    }

    #[test]
    fn arguments_evaluate_left_to_right() {
        let output = run_ok(
            r#"
            function side(x Number) -> Number { print(String(x)); return x; }
            function add(a Number, b Number) -> Number { return a + b; }
            function main() { print(String(add(side(1), side(2)))); }
            "#,
        );
        assert_eq!(output, vec!["1", "2", "3"]);
    }

    #[test]
    fn if_chain_runs_exactly_one_branch_and_stops_testing() {
        let output = run_ok(
            r#"
            function check(x Number, result Boolean) -> Boolean {
              print(String(x));
              return result;
            }
            function main() {
              if check(1, false) { print("a"); }
              else if check(2, true) { print("b"); }
              else if check(3, true) { print("c"); }
            }
            "#,
        );
        assert_eq!(output, vec!["1", "2", "b"]);
    }

    #[test]
    fn break_and_continue_inside_while() {
        let output = run_ok(
            r#"
            function main() {
              variable i = 0;
              while true {
                i = i + 1;
                if i == 2 { continue; }
                if i > 3 { break; }
                print(String(i));
              }
            }
            "#,
        );
        assert_eq!(output, vec!["1", "3"]);
    }

    #[test]
    fn break_and_continue_inside_for() {
        let output = run_ok(
            r#"
            function main() {
              for i, n in Number[10, 20, 30, 40] {
                if n == 20 { continue; }
                if n == 40 { break; }
                print(String(i) + ": " + String(n));
              }
            }
            "#,
        );
        assert_eq!(output, vec!["0: 10", "2: 30"]);
    }

    #[test]
    fn break_outside_a_loop_is_an_error() {
        let err = run_err("function main() { break; }");
        assert!(matches!(
            err.kind,
            RuntimeErrorKind::SignalEscapedLoop { signal: "break" }
        ));
    }

    #[test]
    fn comparing_nothing_is_an_error() {
        let err = run_err(
            r#"
            function noop() { }
            function main() {
              if noop() == noop() { print("?"); }
            }
            "#,
        );
        assert!(matches!(err.kind, RuntimeErrorKind::NothingComparison));
    }

    #[test]
    fn block_scoped_variables_are_released() {
        let output = run_ok(
            r#"
            function main() {
              if true { variable x = 1; }
              variable x = 2;
              print(String(x));
            }
            "#,
        );
        assert_eq!(output, vec!["2"]);
    }

    #[test]
    fn redeclaration_in_the_same_block_is_an_error() {
        let err = run_err("function main() { variable x = 1; variable x = 2; }");
        assert!(matches!(err.kind, RuntimeErrorKind::Redeclaration { .. }));
    }

    #[test]
    fn constants_resolve_inside_functions() {
        let output = run_ok(
            r#"
            constant limit = 2 + 1;
            function main() { print(String(limit)); }
            "#,
        );
        assert_eq!(output, vec!["3"]);
    }

    #[test]
    fn constants_cannot_be_reassigned() {
        let err = run_err(
            r#"
            constant limit = 3;
            function main() { limit = 4; }
            "#,
        );
        assert!(matches!(err.kind, RuntimeErrorKind::NotAssignable { .. }));
    }

    #[test]
    fn assignment_preserves_the_variable_type() {
        let err = run_err(r#"function main() { variable x = 1; x = "two"; }"#);
        assert!(matches!(
            err.kind,
            RuntimeErrorKind::AssignTypeMismatch { .. }
        ));
    }

    #[test]
    fn declarations_cannot_shadow_builtins() {
        let err = run_err("function print() { }");
        assert!(matches!(
            err.kind,
            RuntimeErrorKind::DuplicateDeclaration { .. }
        ));
    }

    #[test]
    fn duplicate_function_names_are_rejected_at_load() {
        let err = run_err("function f() { }\nfunction f() { }\nfunction main() { }");
        assert!(matches!(
            err.kind,
            RuntimeErrorKind::DuplicateDeclaration { .. }
        ));
    }

    #[test]
    fn index_out_of_range() {
        let err = run_err("function main() { Number[1, 2][2]; }");
        assert!(matches!(
            err.kind,
            RuntimeErrorKind::IndexOutOfRange { index: 2, len: 2 }
        ));

        let err = run_err("function main() { Number[1, 2][0 - 1]; }");
        assert!(matches!(
            err.kind,
            RuntimeErrorKind::IndexOutOfRange { index: -1, len: 2 }
        ));
    }

    #[test]
    fn subscript_floors_fractional_indexes() {
        assert_eq!(
            run_ok("function main() { print(String(Number[4, 5][3 / 2])); }"),
            vec!["5"]
        );
    }

    #[test]
    fn list_literal_elements_must_match_the_declared_type() {
        let err = run_err(r#"function main() { Number[1, "two"]; }"#);
        assert!(matches!(err.kind, RuntimeErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn struct_literal_fields_must_match_declaration_order() {
        let err = run_err(
            r#"
            structure Point { x Number; y Number; }
            function main() { Point{y: 1, x: 2}; }
            "#,
        );
        assert!(matches!(err.kind, RuntimeErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn struct_literal_field_types_are_checked() {
        let err = run_err(
            r#"
            structure Point { x Number; }
            function main() { Point{x: "one"}; }
            "#,
        );
        assert!(matches!(err.kind, RuntimeErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn missing_struct_field_is_an_error() {
        let err = run_err(
            r#"
            structure Point { x Number; y Number; }
            function main() { Point{x: 1}; }
            "#,
        );
        assert!(matches!(err.kind, RuntimeErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn unknown_field_access() {
        let err = run_err(
            r#"
            structure Point { x Number; }
            function main() { Point{x: 1}.z; }
            "#,
        );
        assert!(matches!(err.kind, RuntimeErrorKind::UnknownField { .. }));
    }

    #[test]
    fn parameter_type_mismatch_names_the_parameter() {
        let err = run_err(
            r#"
            function double(x Number) -> Number { return x * 2; }
            function main() { double("two"); }
            "#,
        );
        match err.kind {
            RuntimeErrorKind::ParamTypeMismatch {
                function, param, ..
            } => {
                assert_eq!(function, "double");
                assert_eq!(param, "x");
            }
            other => panic!("expected parameter type mismatch, got {other}"),
        }
    }

    #[test]
    fn arity_mismatch() {
        let err = run_err(
            r#"
            function pair(a Number, b Number) { }
            function main() { pair(1); }
            "#,
        );
        assert!(matches!(
            err.kind,
            RuntimeErrorKind::ArityMismatch {
                expected: 2,
                received: 1,
                ..
            }
        ));
    }

    #[test]
    fn unknown_symbols_report_their_span() {
        let err = run_err("function main() { print(String(missing)); }");
        assert!(matches!(err.kind, RuntimeErrorKind::UnknownSymbol { .. }));
        assert!(err.span.is_some());
    }

    #[test]
    fn casts_other_than_string_are_unimplemented() {
        let err = run_err(r#"function main() { Number("3"); }"#);
        assert!(matches!(
            err.kind,
            RuntimeErrorKind::UnimplementedCast { .. }
        ));

        let err = run_err("function main() { String(true); }");
        assert!(matches!(
            err.kind,
            RuntimeErrorKind::UnimplementedCast { .. }
        ));
    }

    #[test]
    fn string_to_string_cast_is_identity() {
        assert_eq!(
            run_ok(r#"function main() { print(String("same")); }"#),
            vec!["same"]
        );
    }

    #[test]
    fn list_equality_is_element_wise() {
        let output = run_ok(
            r#"
            function main() {
              if Number[1, 2] == Number[1, 2] { print("same"); }
              if Number[1, 2] != Number[1, 3] { print("different"); }
            }
            "#,
        );
        assert_eq!(output, vec!["same", "different"]);
    }

    #[test]
    fn structure_equality_is_field_wise() {
        let output = run_ok(
            r#"
            structure Point { x Number; y Number; }
            function main() {
              if Point{x: 1, y: 2} == Point{x: 1, y: 2} { print("same"); }
              if Point{x: 1, y: 2} != Point{x: 1, y: 3} { print("different"); }
            }
            "#,
        );
        assert_eq!(output, vec!["same", "different"]);
    }

    #[test]
    fn equality_across_types_is_an_error() {
        let err = run_err(r#"function main() { if 1 == "1" { } }"#);
        assert!(matches!(err.kind, RuntimeErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn type_names_cannot_be_read_as_values() {
        let err = run_err("function main() { variable x = Number; }");
        assert!(matches!(err.kind, RuntimeErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn run_is_unavailable_without_a_process_capability() {
        let err = run_err(r#"function main() { run(String["echo", "hi"]); }"#);
        assert!(matches!(err.kind, RuntimeErrorKind::ProcessError { .. }));
    }

    #[test]
    fn call_stack_is_balanced_after_errors() {
        let (interpreter, result) = interpret_source(
            r#"
            function inner() -> Number {
              while true {
                if true {
                  variable boom = Number[1][5];
                  return boom;
                }
              }
              return 0;
            }
            function main() { inner(); }
            "#,
        );
        assert!(result.is_err());
        assert_eq!(interpreter.stack_depth(), 1);
    }

    #[test]
    fn nested_function_calls_resolve_arguments_over_outer_frames() {
        let output = run_ok(
            r#"
            function describe(x Number) -> String { return String(x); }
            function outer(x Number) -> String { return describe(x + 1); }
            function main() { print(outer(1)); }
            "#,
        );
        assert_eq!(output, vec!["2"]);
    }
}

