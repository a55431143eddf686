use crate::language::{
    ast::*,
    errors::{SyntaxError, SyntaxErrors},
    lexer::lex,
    span::Span,
    token::{Token, TokenKind},
};

/// Scan and parse a Sol source text into a [`Program`].
///
/// Parsing keeps going after a bad declaration (resynchronizing at the next
/// declaration keyword) so a single run reports every syntax error.
pub fn parse(source: &str) -> Result<Program, SyntaxErrors> {
    let tokens = match lex(source) {
        Ok(tokens) => tokens,
        Err(errors) => {
            let errs = errors
                .into_iter()
                .map(|err| SyntaxError::new(err.message, err.span))
                .collect();
            return Err(SyntaxErrors::new(errs));
        }
    };
    Parser::new(tokens).parse()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<SyntaxError>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<Program, SyntaxErrors> {
        let mut decls = Vec::new();

        while !self.is_eof() {
            match self.parse_decl() {
                Ok(decl) => decls.push(decl),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize_decl();
                }
            }
        }

        if self.errors.is_empty() {
            Ok(Program { decls })
        } else {
            Err(SyntaxErrors::new(self.errors))
        }
    }

    fn parse_decl(&mut self) -> Result<Decl, SyntaxError> {
        if self.matches(TokenKind::Constant) {
            return self.parse_const_decl().map(Decl::Const);
        }
        if self.matches(TokenKind::Function) {
            return self.parse_function_decl().map(Decl::Function);
        }
        if self.matches(TokenKind::Structure) {
            return self.parse_structure_decl().map(Decl::Structure);
        }
        Err(self.error_here("`constant`, `function`, or `structure`"))
    }

    fn parse_const_decl(&mut self) -> Result<ConstDecl, SyntaxError> {
        let start = self.previous_span_start();
        let name = self.expect_identifier("constant name")?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expression()?;
        let end = self.expect(TokenKind::Semi)?.span.end;
        Ok(ConstDecl {
            name,
            value,
            span: Span::new(start, end),
        })
    }

    fn parse_function_decl(&mut self) -> Result<FunctionDecl, SyntaxError> {
        let start = self.previous_span_start();
        let name = self.expect_identifier("function name")?;
        self.expect(TokenKind::LParen)?;
        let mut params: Vec<Param> = Vec::new();
        while !self.check(TokenKind::RParen) {
            let param_name = self.expect_identifier("parameter name")?;
            let ty = self.parse_type_ref()?;
            if params.iter().any(|param| param.name.name == param_name.name) {
                return Err(SyntaxError::new(
                    format!("Duplicate parameter `{}`", param_name.name),
                    param_name.span,
                ));
            }
            let span = param_name.span.union(ty.span);
            params.push(Param {
                name: param_name,
                ty,
                span,
            });
            if !self.matches(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;

        let return_ty = if self.matches(TokenKind::Arrow) {
            Some(self.parse_type_ref()?)
        } else {
            None
        };

        let body = self.parse_block()?;
        let end = body.span.end;
        Ok(FunctionDecl {
            name,
            params,
            return_ty,
            body,
            span: Span::new(start, end),
        })
    }

    fn parse_structure_decl(&mut self) -> Result<StructureDecl, SyntaxError> {
        let start = self.previous_span_start();
        let name = self.expect_type_name("structure name")?;
        self.expect(TokenKind::LBrace)?;
        let mut fields: Vec<FieldDef> = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            let field_name = self.expect_identifier("field name")?;
            let ty = self.parse_type_ref()?;
            let end = self.expect(TokenKind::Semi)?.span.end;
            if fields.iter().any(|field| field.name.name == field_name.name) {
                return Err(SyntaxError::new(
                    format!(
                        "Duplicate field `{}` in structure `{}`",
                        field_name.name, name.name
                    ),
                    field_name.span,
                ));
            }
            let span = field_name.span.union(Span::new(end, end));
            fields.push(FieldDef {
                name: field_name,
                ty,
                span,
            });
        }
        let end = self.expect(TokenKind::RBrace)?.span.end;
        Ok(StructureDecl {
            name,
            fields,
            span: Span::new(start, end),
        })
    }

    fn parse_type_ref(&mut self) -> Result<TypeRef, SyntaxError> {
        let name = self.expect_type_name("type")?;
        let mut ty = TypeRef {
            kind: TypeRefKind::Name(name.name),
            span: name.span,
        };
        while self.check(TokenKind::LBracket) {
            self.advance();
            let end = self.expect(TokenKind::RBracket)?.span.end;
            let span = ty.span.union(Span::new(end, end));
            ty = TypeRef {
                kind: TypeRefKind::List(Box::new(ty)),
                span,
            };
        }
        Ok(ty)
    }

    fn parse_block(&mut self) -> Result<Block, SyntaxError> {
        let start = self.expect(TokenKind::LBrace)?.span.start;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            statements.push(self.parse_statement()?);
        }
        let end = self.expect(TokenKind::RBrace)?.span.end;
        Ok(Block {
            statements,
            span: Span::new(start, end),
        })
    }

    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        if self.matches(TokenKind::If) {
            return self.parse_if_chain().map(Statement::If);
        }
        if self.matches(TokenKind::While) {
            return self.parse_while().map(Statement::While);
        }
        if self.matches(TokenKind::For) {
            return self.parse_for().map(Statement::For);
        }
        if self.matches(TokenKind::Break) {
            let span = self.statement_keyword_span()?;
            return Ok(Statement::Break(span));
        }
        if self.matches(TokenKind::Continue) {
            let span = self.statement_keyword_span()?;
            return Ok(Statement::Continue(span));
        }
        if self.matches(TokenKind::Return) {
            return self.parse_return().map(Statement::Return);
        }
        if self.matches(TokenKind::Variable) {
            return self.parse_var_decl().map(Statement::VarDecl);
        }
        // `name = ...` reassigns; any other expression-leading form is a bare
        // expression statement. Selected by two-token lookahead.
        if matches!(self.peek_kind(), Some(TokenKind::Identifier(_)))
            && self.peek_kind_n(1) == Some(TokenKind::Eq)
        {
            return self.parse_assign().map(Statement::Assign);
        }
        let expr = self.parse_expression()?;
        let start = expr_span(&expr).start;
        let end = self.expect(TokenKind::Semi)?.span.end;
        Ok(Statement::Expr(ExprStmt {
            expr,
            span: Span::new(start, end),
        }))
    }

    fn statement_keyword_span(&mut self) -> Result<Span, SyntaxError> {
        let start = self.previous_span_start();
        let end = self.expect(TokenKind::Semi)?.span.end;
        Ok(Span::new(start, end))
    }

    fn parse_return(&mut self) -> Result<ReturnStmt, SyntaxError> {
        let start = self.previous_span_start();
        if self.matches(TokenKind::Semi) {
            return Ok(ReturnStmt {
                value: None,
                span: Span::new(start, self.previous_span_end(start)),
            });
        }
        let value = self.parse_expression()?;
        let end = self.expect(TokenKind::Semi)?.span.end;
        Ok(ReturnStmt {
            value: Some(value),
            span: Span::new(start, end),
        })
    }

    fn parse_var_decl(&mut self) -> Result<VarDeclStmt, SyntaxError> {
        let start = self.previous_span_start();
        let name = self.expect_identifier("variable name")?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expression()?;
        let end = self.expect(TokenKind::Semi)?.span.end;
        Ok(VarDeclStmt {
            name,
            value,
            span: Span::new(start, end),
        })
    }

    fn parse_assign(&mut self) -> Result<AssignStmt, SyntaxError> {
        let name = self.expect_identifier("variable name")?;
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expression()?;
        let end = self.expect(TokenKind::Semi)?.span.end;
        let span = Span::new(name.span.start, end);
        Ok(AssignStmt { name, value, span })
    }

    fn parse_if_chain(&mut self) -> Result<IfStmt, SyntaxError> {
        let start = self.previous_span_start();
        let condition = self.parse_expression()?;
        let then_block = self.parse_block()?;
        let mut else_ifs = Vec::new();
        let mut else_block = None;
        let mut end = then_block.span.end;

        while self.matches(TokenKind::Else) {
            if self.matches(TokenKind::If) {
                let branch_start = self.previous_span_start();
                let branch_condition = self.parse_expression()?;
                let branch_block = self.parse_block()?;
                end = branch_block.span.end;
                else_ifs.push(ElseIf {
                    condition: branch_condition,
                    block: branch_block,
                    span: Span::new(branch_start, end),
                });
            } else {
                let block = self.parse_block()?;
                end = block.span.end;
                else_block = Some(block);
                break;
            }
        }

        Ok(IfStmt {
            condition,
            then_block,
            else_ifs,
            else_block,
            span: Span::new(start, end),
        })
    }

    fn parse_while(&mut self) -> Result<WhileStmt, SyntaxError> {
        let start = self.previous_span_start();
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        let end = body.span.end;
        Ok(WhileStmt {
            condition,
            body,
            span: Span::new(start, end),
        })
    }

    fn parse_for(&mut self) -> Result<ForStmt, SyntaxError> {
        let start = self.previous_span_start();
        let index = self.expect_identifier("index binding")?;
        self.expect(TokenKind::Comma)?;
        let element = self.expect_identifier("element binding")?;
        self.expect(TokenKind::In)?;
        let iterable = self.parse_expression()?;
        let body = self.parse_block()?;
        let end = body.span.end;
        Ok(ForStmt {
            index,
            element,
            iterable,
            body,
            span: Span::new(start, end),
        })
    }

    fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::EqEq) => BinaryOp::Eq,
                Some(TokenKind::BangEq) => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Lt) => BinaryOp::Lt,
                Some(TokenKind::LtEq) => BinaryOp::LtEq,
                Some(TokenKind::Gt) => BinaryOp::Gt,
                Some(TokenKind::GtEq) => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Bang) => Some(UnaryOp::Not),
            Some(TokenKind::Minus) => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span.start;
            let expr = self.parse_unary()?;
            let span = Span::new(start, expr_span(&expr).end);
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
                span,
            });
        }
        self.parse_call()
    }

    fn parse_call(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.matches(TokenKind::LParen) {
                let start = expr_span(&expr).start;
                let mut args = Vec::new();
                while !self.check(TokenKind::RParen) {
                    args.push(self.parse_expression()?);
                    if !self.matches(TokenKind::Comma) {
                        break;
                    }
                }
                let end = self.expect(TokenKind::RParen)?.span.end;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    span: Span::new(start, end),
                };
                continue;
            }
            if self.matches(TokenKind::LBracket) {
                let start = expr_span(&expr).start;
                let index = self.parse_expression()?;
                let end = self.expect(TokenKind::RBracket)?.span.end;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                    span: Span::new(start, end),
                };
                continue;
            }
            if self.matches(TokenKind::Dot) {
                let field = self.expect_identifier("field name after '.'")?;
                let span = expr_span(&expr).union(field.span);
                expr = Expr::Field {
                    base: Box::new(expr),
                    field,
                    span,
                };
                continue;
            }
            break;
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::Number(value)) => {
                let span = self.advance().span;
                Ok(Expr::Literal(Literal::Number(value, span)))
            }
            Some(TokenKind::String(value)) => {
                let span = self.advance().span;
                Ok(Expr::Literal(Literal::String(value, span)))
            }
            Some(TokenKind::True) => {
                let span = self.advance().span;
                Ok(Expr::Literal(Literal::Bool(true, span)))
            }
            Some(TokenKind::False) => {
                let span = self.advance().span;
                Ok(Expr::Literal(Literal::Bool(false, span)))
            }
            Some(TokenKind::LParen) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            Some(TokenKind::TypeName(_)) => self.parse_type_headed_expression(),
            Some(TokenKind::Identifier(_)) => {
                let ident = self.expect_identifier("identifier")?;
                Ok(Expr::Identifier(ident))
            }
            _ => Err(self.error_here("an expression")),
        }
    }

    /// A TYPE token heads four expression forms, told apart by the next
    /// token: `T[...]` list literal, `T(...)` cast, `T{...}` structure literal,
    /// bare `T` type reference.
    fn parse_type_headed_expression(&mut self) -> Result<Expr, SyntaxError> {
        let name = self.expect_type_name("type")?;
        if self.matches(TokenKind::LBracket) {
            let mut items = Vec::new();
            while !self.check(TokenKind::RBracket) {
                items.push(self.parse_expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
            let end = self.expect(TokenKind::RBracket)?.span.end;
            let span = Span::new(name.span.start, end);
            return Ok(Expr::ListLiteral {
                elem: name,
                items,
                span,
            });
        }
        if self.matches(TokenKind::LParen) {
            let expr = self.parse_expression()?;
            let end = self.expect(TokenKind::RParen)?.span.end;
            let span = Span::new(name.span.start, end);
            return Ok(Expr::Cast {
                ty: name,
                expr: Box::new(expr),
                span,
            });
        }
        if self.matches(TokenKind::LBrace) {
            let mut fields: Vec<StructLiteralField> = Vec::new();
            while !self.check(TokenKind::RBrace) {
                let field_name = self.expect_identifier("field name")?;
                self.expect(TokenKind::Colon)?;
                let value = self.parse_expression()?;
                if fields.iter().any(|field| field.name.name == field_name.name) {
                    return Err(SyntaxError::new(
                        format!("Duplicate field `{}` in structure literal", field_name.name),
                        field_name.span,
                    ));
                }
                let span = field_name.span.union(expr_span(&value));
                fields.push(StructLiteralField {
                    name: field_name,
                    value,
                    span,
                });
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
            let end = self.expect(TokenKind::RBrace)?.span.end;
            let span = Span::new(name.span.start, end);
            return Ok(Expr::StructLiteral {
                name,
                fields,
                span,
            });
        }
        Ok(Expr::TypeRef(name))
    }

    fn expect_identifier(&mut self, what: &str) -> Result<Identifier, SyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::Identifier(name)) => {
                let span = self.advance().span;
                Ok(Identifier { name, span })
            }
            _ => Err(self.error_here(what)),
        }
    }

    fn expect_type_name(&mut self, what: &str) -> Result<Identifier, SyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::TypeName(name)) => {
                let span = self.advance().span;
                Ok(Identifier { name, span })
            }
            _ => Err(self.error_here(what)),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token, SyntaxError> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            Err(self.error_here(&format!("`{}`", kind.name())))
        }
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        matches!(self.peek_kind(), Some(tk) if tk == kind)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind.clone())
    }

    fn peek_kind_n(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind.clone())
    }

    fn advance(&mut self) -> &Token {
        let token = self
            .tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("token stream is never empty"));
        self.pos = (self.pos + 1).min(self.tokens.len());
        token
    }

    fn is_eof(&self) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Eof) | None)
    }

    fn previous_span_start(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.start
        }
    }

    fn previous_span_end(&self, fallback: usize) -> usize {
        if self.pos == 0 {
            fallback
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn error_here(&self, expected: &str) -> SyntaxError {
        let current = self.tokens.get(self.pos).or_else(|| self.tokens.last());
        let span = current.map(|t| t.span).unwrap_or_else(|| Span::new(0, 0));
        let found = current
            .map(|t| t.kind.describe())
            .unwrap_or_else(|| "end of input".to_string());
        let error = SyntaxError::new(format!("Expected {expected}, found {found}"), span);
        if self.pos > 0 {
            let previous = &self.tokens[self.pos - 1];
            error.with_help(format!("previous token was {}", previous.kind.describe()))
        } else {
            error
        }
    }

    fn synchronize_decl(&mut self) {
        while !self.is_eof() {
            match self.peek_kind() {
                Some(TokenKind::Constant | TokenKind::Function | TokenKind::Structure) => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = expr_span(&left).union(expr_span(&right));
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span,
    }
}
