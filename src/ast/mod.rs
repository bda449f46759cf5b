//! Annotated AST consumed by the checker.
//!
//! The front-end (lexer/parser) lives outside this crate; it hands over a
//! `Program` whose types already carry uniform/varying qualifiers, lane
//! constraint literals and `go for` nodes.

pub mod build;

use crate::span::Spanned;

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub consts: Vec<Spanned<ConstDecl>>,
    pub functions: Vec<Spanned<Function>>,
}

/// `const NAME = <expr>`, usable as a lane constraint.
#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub name: Spanned<String>,
    pub value: Spanned<Expr>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    pub return_type: Option<Spanned<TypeExpr>>,
    pub body: Spanned<Block>,
    pub is_pub: bool,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Spanned<String>,
    pub ty: Spanned<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A uniform scalar, e.g. `int32`.
    Named(String),
    /// `varying T`, `varying[N] T` or `varying[] T`.
    Varying {
        elem: Box<Spanned<TypeExpr>>,
        lanes: Option<Spanned<ConstraintExpr>>,
    },
    Chan(Box<Spanned<TypeExpr>>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintExpr {
    Lit(i64),
    /// `varying[]`, same as a literal 0.
    Universal,
    /// A named constant, or anything else the front-end could not fold.
    Name(String),
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Let {
        name: Spanned<String>,
        ty: Option<Spanned<TypeExpr>>,
        value: Spanned<Expr>,
    },
    Assign {
        target: Spanned<String>,
        value: Spanned<Expr>,
    },
    If {
        condition: Spanned<Expr>,
        then_block: Spanned<Block>,
        else_block: Option<Spanned<Block>>,
    },
    Switch {
        scrutinee: Spanned<Expr>,
        cases: Vec<SwitchCase>,
        default: Option<Spanned<Block>>,
    },
    /// Narrow a universal `varying[]` value to a concrete lane count.
    TypeSwitch {
        binding: Spanned<String>,
        scrutinee: Spanned<Expr>,
        cases: Vec<TypeCase>,
        default: Option<Spanned<Block>>,
    },
    For {
        var: Spanned<String>,
        iterable: Spanned<Expr>,
        body: Spanned<Block>,
    },
    While {
        condition: Spanned<Expr>,
        body: Spanned<Block>,
    },
    GoFor {
        var: Spanned<String>,
        range: Spanned<Expr>,
        lanes: Option<Spanned<ConstraintExpr>>,
        body: Spanned<Block>,
    },
    Return(Option<Spanned<Expr>>),
    Break,
    Continue,
    Panic(Spanned<Expr>),
    Defer(Spanned<Expr>),
    Spawn(Spanned<Expr>),
    Send {
        chan: Spanned<Expr>,
        value: Spanned<Expr>,
    },
    Expr(Spanned<Expr>),
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub values: Vec<Spanned<Expr>>,
    pub body: Spanned<Block>,
}

#[derive(Debug, Clone)]
pub struct TypeCase {
    pub lanes: Spanned<ConstraintExpr>,
    pub body: Spanned<Block>,
}

#[derive(Debug, Clone)]
pub enum Expr {
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    Ident(String),
    BinOp {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },
    Cast {
        expr: Box<Spanned<Expr>>,
        target: Spanned<TypeExpr>,
    },
    Call {
        name: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    Range {
        start: Box<Spanned<Expr>>,
        end: Box<Spanned<Expr>>,
    },
    Recv {
        chan: Box<Spanned<Expr>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Neq | BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    pub fn is_bitwise(self) -> bool {
        matches!(self, BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr)
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl Expr {
    /// Callee name when this expression is a direct call.
    pub fn call_name(&self) -> Option<&str> {
        match self {
            Expr::Call { name, .. } => Some(&name.node),
            _ => None,
        }
    }
}
