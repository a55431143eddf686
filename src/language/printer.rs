use crate::language::ast::*;

/// Render a parse tree as an indented, parenthesized dump. Diagnostic
/// output only; the dump is not meant to be re-parsed.
pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::new();
    for decl in &program.decls {
        printer.decl(decl);
    }
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Const(decl) => {
                self.line(&format!(
                    "(constant {} {})",
                    decl.name.name,
                    expr_text(&decl.value)
                ));
            }
            Decl::Function(decl) => {
                let params = decl
                    .params
                    .iter()
                    .map(|param| format!("(param {} {})", param.name.name, type_text(&param.ty)))
                    .collect::<Vec<_>>()
                    .join(" ");
                let header = match &decl.return_ty {
                    Some(ty) => format!(
                        "(function {} ({}) -> {}",
                        decl.name.name,
                        params,
                        type_text(ty)
                    ),
                    None => format!("(function {} ({})", decl.name.name, params),
                };
                self.line(&header);
                self.block(&decl.body);
                self.line(")");
            }
            Decl::Structure(decl) => {
                let fields = decl
                    .fields
                    .iter()
                    .map(|field| format!("(field {} {})", field.name.name, type_text(&field.ty)))
                    .collect::<Vec<_>>()
                    .join(" ");
                self.line(&format!("(structure {} {})", decl.name.name, fields));
            }
        }
    }

    fn block(&mut self, block: &Block) {
        self.indent += 1;
        self.line("(block");
        self.indent += 1;
        for statement in &block.statements {
            self.statement(statement);
        }
        self.indent -= 1;
        self.line(")");
        self.indent -= 1;
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::VarDecl(stmt) => {
                self.line(&format!(
                    "(variable {} {})",
                    stmt.name.name,
                    expr_text(&stmt.value)
                ));
            }
            Statement::Assign(stmt) => {
                self.line(&format!(
                    "(assign {} {})",
                    stmt.name.name,
                    expr_text(&stmt.value)
                ));
            }
            Statement::Expr(stmt) => {
                self.line(&format!("(expr {})", expr_text(&stmt.expr)));
            }
            Statement::Return(stmt) => match &stmt.value {
                Some(value) => self.line(&format!("(return {})", expr_text(value))),
                None => self.line("(return)"),
            },
            Statement::Break(_) => self.line("(break)"),
            Statement::Continue(_) => self.line("(continue)"),
            Statement::If(stmt) => {
                self.line(&format!("(if {}", expr_text(&stmt.condition)));
                self.block(&stmt.then_block);
                for else_if in &stmt.else_ifs {
                    self.line(&format!("(else-if {}", expr_text(&else_if.condition)));
                    self.block(&else_if.block);
                    self.line(")");
                }
                if let Some(else_block) = &stmt.else_block {
                    self.line("(else");
                    self.block(else_block);
                    self.line(")");
                }
                self.line(")");
            }
            Statement::While(stmt) => {
                self.line(&format!("(while {}", expr_text(&stmt.condition)));
                self.block(&stmt.body);
                self.line(")");
            }
            Statement::For(stmt) => {
                self.line(&format!(
                    "(for {} {} {}",
                    stmt.index.name,
                    stmt.element.name,
                    expr_text(&stmt.iterable)
                ));
                self.block(&stmt.body);
                self.line(")");
            }
        }
    }
}

fn type_text(ty: &TypeRef) -> String {
    match &ty.kind {
        TypeRefKind::Name(name) => name.clone(),
        TypeRefKind::List(inner) => format!("{}[]", type_text(inner)),
    }
}

fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Literal(Literal::Number(value, _)) => format!("(number {value})"),
        Expr::Literal(Literal::String(value, _)) => format!("(string \"{value}\")"),
        Expr::Literal(Literal::Bool(value, _)) => format!("(boolean {value})"),
        Expr::ListLiteral { elem, items, .. } => {
            let mut text = format!("(list {}", elem.name);
            for item in items {
                text.push(' ');
                text.push_str(&expr_text(item));
            }
            text.push(')');
            text
        }
        Expr::StructLiteral { name, fields, .. } => {
            let mut text = format!("(structure-literal {}", name.name);
            for field in fields {
                text.push_str(&format!(
                    " (field {} {})",
                    field.name.name,
                    expr_text(&field.value)
                ));
            }
            text.push(')');
            text
        }
        Expr::Identifier(ident) => format!("(identifier {})", ident.name),
        Expr::TypeRef(ident) => format!("(type {})", ident.name),
        Expr::Call { callee, args, .. } => {
            let mut text = format!("(call {}", expr_text(callee));
            for arg in args {
                text.push(' ');
                text.push_str(&expr_text(arg));
            }
            text.push(')');
            text
        }
        Expr::Binary {
            op, left, right, ..
        } => format!(
            "(binary {} {} {})",
            op.symbol(),
            expr_text(left),
            expr_text(right)
        ),
        Expr::Unary { op, expr, .. } => {
            format!("(unary {} {})", op.symbol(), expr_text(expr))
        }
        Expr::Cast { ty, expr, .. } => format!("(cast {} {})", ty.name, expr_text(expr)),
        Expr::Index { target, index, .. } => {
            format!("(index {} {})", expr_text(target), expr_text(index))
        }
        Expr::Field { base, field, .. } => {
            format!("(field-access {} {})", expr_text(base), field.name)
        }
    }
}
