//! Operator resolution.
//!
//! An operator expression is resolved like a call: user-declared operator
//! functions (free and member) compete with synthesized built-in candidates
//! in a single tournament.
//!
//! ## Operands
//!
//! - Unary operators take one operand.
//! - Postfix `++`/`--` take one operand; the dummy `int` argument is
//!   added here.
//! - `?:` takes the two branch operands. The condition is not part of the
//!   resolution.

mod builtin;

pub use builtin::builtin_candidates;

use sema_core::{CompilationError, Span, Type, TypeHash};

use crate::context::CompilationContext;
use crate::expr_info::ExprInfo;
use crate::overload::{OverloadMatch, OverloadRequest, resolve_call};

/// An overloadable (or built-in only) operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    PreIncrement,
    PostIncrement,
    PreDecrement,
    PostDecrement,
    /// Unary `*`.
    Deref,
    /// Unary `+`.
    Plus,
    /// Unary `-`.
    Negate,
    BitNot,
    Not,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    Assign,
    MulAssign,
    DivAssign,
    ModAssign,
    AddAssign,
    SubAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    XorAssign,
    OrAssign,
    Index,
    /// `->*`
    MemberPointer,
    Conditional,
    Comma,
    Arrow,
    /// Unary `&`.
    AddressOf,
}

impl OperatorKind {
    /// Source spelling, as used in `operator<symbol>`.
    pub const fn symbol(self) -> &'static str {
        use OperatorKind::*;
        match self {
            PreIncrement | PostIncrement => "++",
            PreDecrement | PostDecrement => "--",
            Deref | Mul => "*",
            Plus | Add => "+",
            Negate | Sub => "-",
            BitNot => "~",
            Not => "!",
            Div => "/",
            Mod => "%",
            Shl => "<<",
            Shr => ">>",
            Less => "<",
            Greater => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            Equal => "==",
            NotEqual => "!=",
            BitAnd | AddressOf => "&",
            BitXor => "^",
            BitOr => "|",
            And => "&&",
            Or => "||",
            Assign => "=",
            MulAssign => "*=",
            DivAssign => "/=",
            ModAssign => "%=",
            AddAssign => "+=",
            SubAssign => "-=",
            ShlAssign => "<<=",
            ShrAssign => ">>=",
            AndAssign => "&=",
            XorAssign => "^=",
            OrAssign => "|=",
            Index => "[]",
            MemberPointer => "->*",
            Conditional => "?:",
            Comma => ",",
            Arrow => "->",
        }
    }

    /// Name of the operator function.
    pub fn function_name(self) -> String {
        format!("operator{}", self.symbol())
    }

    /// Number of operands taking part in resolution, including the dummy
    /// `int` of the postfix forms.
    pub const fn arity(self) -> usize {
        use OperatorKind::*;
        match self {
            PreIncrement | PreDecrement | Deref | Plus | Negate | BitNot | Not | Arrow | AddressOf => 1,
            _ => 2,
        }
    }

    pub const fn is_postfix(self) -> bool {
        matches!(self, OperatorKind::PostIncrement | OperatorKind::PostDecrement)
    }
}

impl std::fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operator{}", self.symbol())
    }
}

/// Resolve an operator expression.
///
/// # Arguments
///
/// * `ctx` - Compilation context
/// * `op` - The operator
/// * `operands` - The operand expressions (see the module docs)
/// * `user_candidates` - Operator functions found by name lookup
/// * `span` - Source location for error reporting
///
/// # Returns
///
/// The selected operator function, user-declared or built-in.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn resolve_operator(
    ctx: &mut CompilationContext,
    op: OperatorKind,
    operands: &[ExprInfo],
    user_candidates: &[TypeHash],
    span: Span,
) -> Result<OverloadMatch, CompilationError> {
    let mut args = operands.to_vec();
    if op.is_postfix() {
        args.push(ExprInfo::rvalue(Type::int()));
    }
    if args.len() != op.arity() {
        return Err(CompilationError::WrongArgumentCount {
            name: op.function_name(),
            expected: op.arity(),
            got: args.len(),
            span,
        });
    }

    let mut candidates = user_candidates.to_vec();
    for hash in builtin_candidates(ctx, op, operands) {
        if !builtin::shadowed_by(ctx, hash, user_candidates) {
            candidates.push(hash);
        }
    }

    let req = OverloadRequest::new(op.function_name(), candidates, args).operator().at(span);
    resolve_call(ctx, &req)
}
