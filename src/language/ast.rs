use crate::language::span::Span;

/// Root of a parsed Sol program: a flat list of top-level declarations.
#[derive(Clone, Debug)]
pub struct Program {
    pub decls: Vec<Decl>,
}

#[derive(Clone, Debug)]
pub enum Decl {
    Const(ConstDecl),
    Function(FunctionDecl),
    Structure(StructureDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Const(decl) => &decl.name.name,
            Decl::Function(decl) => &decl.name.name,
            Decl::Structure(decl) => &decl.name.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Const(decl) => decl.span,
            Decl::Function(decl) => decl.span,
            Decl::Structure(decl) => decl.span,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConstDecl {
    pub name: Identifier,
    pub value: Expr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub name: Identifier,
    pub params: Vec<Param>,
    pub return_ty: Option<TypeRef>,
    pub body: Block,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: Identifier,
    pub ty: TypeRef,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct StructureDecl {
    pub name: Identifier,
    pub fields: Vec<FieldDef>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: Identifier,
    pub ty: TypeRef,
    pub span: Span,
}

/// A type expression: a bare name, or `T[]` for lists (nests).
#[derive(Clone, Debug, PartialEq)]
pub enum TypeRefKind {
    Name(String),
    List(Box<TypeRef>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeRef {
    pub kind: TypeRefKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Statement {
    VarDecl(VarDeclStmt),
    Assign(AssignStmt),
    Expr(ExprStmt),
    Return(ReturnStmt),
    Break(Span),
    Continue(Span),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::VarDecl(stmt) => stmt.span,
            Statement::Assign(stmt) => stmt.span,
            Statement::Expr(stmt) => stmt.span,
            Statement::Return(stmt) => stmt.span,
            Statement::Break(span) | Statement::Continue(span) => *span,
            Statement::If(stmt) => stmt.span,
            Statement::While(stmt) => stmt.span,
            Statement::For(stmt) => stmt.span,
        }
    }
}

#[derive(Clone, Debug)]
pub struct VarDeclStmt {
    pub name: Identifier,
    pub value: Expr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct AssignStmt {
    pub name: Identifier,
    pub value: Expr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

/// An `if` chain: the leading branch, any number of `else if` branches, and
/// an optional trailing `else`. Exactly one branch executes.
#[derive(Clone, Debug)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    pub else_ifs: Vec<ElseIf>,
    pub else_block: Option<Block>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct ElseIf {
    pub condition: Expr,
    pub block: Block,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
    pub span: Span,
}

/// `for index, element in iterable { ... }` iterates a list, binding the
/// zero-based index and the element each time around.
#[derive(Clone, Debug)]
pub struct ForStmt {
    pub index: Identifier,
    pub element: Identifier,
    pub iterable: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Expr {
    Literal(Literal),
    ListLiteral {
        elem: Identifier,
        items: Vec<Expr>,
        span: Span,
    },
    StructLiteral {
        name: Identifier,
        fields: Vec<StructLiteralField>,
        span: Span,
    },
    Identifier(Identifier),
    /// A bare type name in expression position. Legal grammar, but reading
    /// it as a value is a runtime error.
    TypeRef(Identifier),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        span: Span,
    },
    /// `Type(expr)`. Only `String(...)` is implemented at runtime.
    Cast {
        ty: Identifier,
        expr: Box<Expr>,
        span: Span,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Field {
        base: Box<Expr>,
        field: Identifier,
        span: Span,
    },
}

#[derive(Clone, Debug)]
pub struct StructLiteralField {
    pub name: Identifier,
    pub value: Expr,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum Literal {
    Number(f64, Span),
    String(String, Span),
    Bool(bool, Span),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

pub fn expr_span(expr: &Expr) -> Span {
    match expr {
        Expr::Literal(Literal::Number(_, span))
        | Expr::Literal(Literal::String(_, span))
        | Expr::Literal(Literal::Bool(_, span)) => *span,
        Expr::ListLiteral { span, .. } => *span,
        Expr::StructLiteral { span, .. } => *span,
        Expr::Identifier(ident) | Expr::TypeRef(ident) => ident.span,
        Expr::Call { span, .. } => *span,
        Expr::Binary { span, .. } => *span,
        Expr::Unary { span, .. } => *span,
        Expr::Cast { span, .. } => *span,
        Expr::Index { span, .. } => *span,
        Expr::Field { span, .. } => *span,
    }
}
