//! Built-in operator candidates.
//!
//! For an operator expression the built-in candidates are synthesized from
//! the operand types, plus the result types of the operands' conversion
//! functions. Each candidate is a [`FunctionEntry`] of kind `Builtin`,
//! registered once per signature and reused afterwards.
//!
//! `,`, `->` and unary `&` have no built-in candidates.

use rustc_hash::FxHashSet;
use sema_core::{FunctionEntry, MemberOwner, PrimitiveKind, Qualifiers, Type, TypeHash};
use tracing::trace;

use super::OperatorKind;
use crate::context::CompilationContext;
use crate::conversion::{arithmetic_promotion, collect_conversion_functions, integral_promotion, usual_arithmetic_conversion};
use crate::expr_info::ExprInfo;
use crate::template::complete_instance;

/// Synthesize the built-in candidates of `op` for `operands`.
///
/// # Returns
///
/// Hashes of the registered built-in functions, without duplicates.
pub fn builtin_candidates(ctx: &mut CompilationContext, op: OperatorKind, operands: &[ExprInfo]) -> Vec<TypeHash> {
    use OperatorKind::*;

    let mut set = BuiltinSet::new(op);
    let Some(first) = operands.first() else {
        return Vec::new();
    };
    if matches!(op, Comma | Arrow | AddressOf) {
        return Vec::new();
    }

    match op {
        Not => set.add(Type::bool(), vec![Type::bool()]),
        And | Or => set.add(Type::bool(), vec![Type::bool(), Type::bool()]),
        _ => {
            let binary = !op.is_postfix() && op.arity() == 2;
            let lefts = operand_types(ctx, first);
            let rights = match operands.get(1) {
                Some(second) if binary => operand_types(ctx, second).into_iter().map(Some).collect(),
                _ => vec![None],
            };
            for left in &lefts {
                for right in &rights {
                    synthesize(ctx, &mut set, op, left, right.as_ref());
                }
            }
        }
    }

    set.register(ctx)
}

/// Whether the built-in `builtin` has the same parameter list as a
/// non-template non-member user candidate of the same name.
pub(super) fn shadowed_by(ctx: &CompilationContext, builtin: TypeHash, user_candidates: &[TypeHash]) -> bool {
    let Some(builtin) = ctx.registry.get_function(builtin) else {
        return false;
    };
    user_candidates.iter().any(|&hash| {
        ctx.registry.get_function(hash).is_some_and(|user| {
            user.owner.is_none()
                && !user.is_template()
                && !user.is_template_instance()
                && user.name == builtin.name
                && user.same_params(builtin)
        })
    })
}

/// The operand's type and the types its conversion functions yield,
/// references stripped.
fn operand_types(ctx: &mut CompilationContext, operand: &ExprInfo) -> Vec<Type> {
    let ty = operand.value_type().clone();
    let mut types = vec![ty.clone()];
    if let Some(record) = ty.record_type().map(|r| r.hash) {
        complete_instance(ctx, record);
        for hash in collect_conversion_functions(ctx, record) {
            let Some(func) = ctx.registry.get_function(hash) else {
                continue;
            };
            let target = func.return_type.strip_reference().clone();
            if !types.contains(&target) {
                types.push(target);
            }
        }
    }
    types
}

/// Candidate signatures collected for one operator.
struct BuiltinSet {
    op: OperatorKind,
    entries: Vec<FunctionEntry>,
    seen: FxHashSet<TypeHash>,
}

impl BuiltinSet {
    fn new(op: OperatorKind) -> Self {
        Self {
            op,
            entries: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    fn add(&mut self, ret: Type, params: Vec<Type>) {
        let entry = FunctionEntry::builtin(self.op.symbol(), params, ret);
        if self.seen.insert(entry.func_hash) {
            self.entries.push(entry);
        }
    }

    fn register(self, ctx: &mut CompilationContext) -> Vec<TypeHash> {
        let mut hashes = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            let hash = entry.func_hash;
            if !ctx.registry.contains_function(hash) {
                trace!(builtin = %entry, "built-in operator registered");
                if ctx.registry.register_function(entry).is_err() {
                    continue;
                }
            }
            hashes.push(hash);
        }
        hashes
    }
}

fn synthesize(ctx: &CompilationContext, set: &mut BuiltinSet, op: OperatorKind, t0: &Type, t1: Option<&Type>) {
    use OperatorKind::*;
    match (op, t1) {
        (PreIncrement | PostIncrement, None) => increment(set, t0, true),
        (PreDecrement | PostDecrement, None) => increment(set, t0, false),
        (Deref, None) => {
            if let Some(pointee) = t0.pointee() {
                set.add(Type::reference_to(pointee.clone()), vec![t0.clone()]);
            }
        }
        (Plus, None) => {
            if t0.is_pointer() {
                set.add(t0.clone(), vec![t0.clone()]);
            }
            if let Some(t) = promoted(ctx, t0) {
                set.add(t.clone(), vec![t]);
            }
        }
        (Negate, None) => {
            if let Some(t) = promoted(ctx, t0) {
                set.add(t.clone(), vec![t]);
            }
        }
        (BitNot, None) => {
            if let Some(t) = integral_promotion(ctx, t0) {
                set.add(t.clone(), vec![t]);
            }
        }
        (Mul | Div, Some(t1)) => arithmetic(ctx, set, t0, t1),
        (Add, Some(t1)) => {
            if is_object_pointer(t0) {
                set.add(t0.clone(), vec![t0.clone(), ptrdiff()]);
            }
            if is_object_pointer(t1) {
                set.add(t1.clone(), vec![ptrdiff(), t1.clone()]);
            }
            arithmetic(ctx, set, t0, t1);
        }
        (Sub, Some(t1)) => {
            if is_object_pointer(t0) {
                set.add(t0.clone(), vec![t0.clone(), ptrdiff()]);
                set.add(ptrdiff(), vec![t0.clone(), t0.clone()]);
            }
            if is_object_pointer(t1) {
                set.add(ptrdiff(), vec![t1.clone(), t1.clone()]);
            }
            arithmetic(ctx, set, t0, t1);
        }
        (Less | Greater | LessEqual | GreaterEqual, Some(t1)) => {
            for t in [t0, t1] {
                if t.is_pointer() || t.is_enum() {
                    set.add(Type::bool(), vec![t.clone(), t.clone()]);
                }
            }
            comparison(ctx, set, t0, t1);
        }
        (Equal | NotEqual, Some(t1)) => {
            for t in [t0, t1] {
                if t.is_pointer() || t.is_enum() || t.is_member_pointer() {
                    set.add(Type::bool(), vec![t.clone(), t.clone()]);
                }
            }
            comparison(ctx, set, t0, t1);
        }
        (Mod | BitAnd | BitXor | BitOr, Some(t1)) => {
            if let (Some(l), Some(r)) = (integral_promotion(ctx, t0), integral_promotion(ctx, t1))
                && let Some(lr) = usual_arithmetic_conversion(ctx, &l, &r)
            {
                set.add(lr, vec![l, r]);
            }
        }
        (Shl | Shr, Some(t1)) => {
            if let (Some(l), Some(r)) = (integral_promotion(ctx, t0), integral_promotion(ctx, t1)) {
                set.add(l.clone(), vec![l, r]);
            }
        }
        (Assign, Some(t1)) => assignment(ctx, set, t0, t1),
        (MulAssign | DivAssign, Some(t1)) => {
            if !t0.is_const() && is_arithmetic(t0) {
                arithmetic_assignment(ctx, set, t0, t1);
            }
        }
        (AddAssign | SubAssign, Some(t1)) => {
            if t0.is_const() {
                return;
            }
            if is_object_pointer(t0) {
                let target = assignable(t0);
                set.add(target.clone(), vec![target, ptrdiff()]);
            }
            if is_arithmetic(t0) {
                arithmetic_assignment(ctx, set, t0, t1);
            }
        }
        (ModAssign | ShlAssign | ShrAssign | AndAssign | XorAssign | OrAssign, Some(t1)) => {
            if !t0.is_const()
                && is_integer(t0)
                && let Some(r) = integral_promotion(ctx, t1)
            {
                let target = assignable(t0);
                set.add(target.clone(), vec![target, r]);
            }
        }
        (Index, Some(t1)) => {
            for (ptr, index_first) in [(t0, false), (t1, true)] {
                if let Some(pointee) = ptr.pointee().filter(|p| is_object(p)) {
                    let result = Type::reference_to(pointee.clone());
                    let params = if index_first {
                        vec![ptrdiff(), ptr.clone()]
                    } else {
                        vec![ptr.clone(), ptrdiff()]
                    };
                    set.add(result, params);
                }
            }
        }
        (MemberPointer, Some(t1)) => member_pointer_access(ctx, set, t0, t1),
        (Conditional, Some(t1)) => {
            for t in [t0, t1] {
                if t.is_pointer() || t.is_member_pointer() {
                    set.add(t.clone(), vec![t.clone(), t.clone()]);
                }
            }
            arithmetic(ctx, set, t0, t1);
        }
        _ => {}
    }
}

/// `VQ T& op(VQ T&)` and `T op(VQ T&, int)` for arithmetic and object
/// pointer types. `--` excludes `bool`.
fn increment(set: &mut BuiltinSet, t0: &Type, increment: bool) {
    if t0.is_const() {
        return;
    }
    let arithmetic = is_arithmetic(t0) && (increment || !t0.is_bool());
    if arithmetic || is_object_pointer(t0) {
        let target = assignable(t0);
        set.add(target.clone(), vec![target.clone()]);
        set.add(t0.unqualified().clone(), vec![target, Type::int()]);
    }
}

/// `LR op(L, R)` over promoted arithmetic types.
fn arithmetic(ctx: &CompilationContext, set: &mut BuiltinSet, t0: &Type, t1: &Type) {
    if let (Some(l), Some(r)) = (promoted(ctx, t0), promoted(ctx, t1))
        && let Some(lr) = usual_arithmetic_conversion(ctx, &l, &r)
    {
        set.add(lr, vec![l, r]);
    }
}

/// `bool op(L, R)` over promoted arithmetic types.
fn comparison(ctx: &CompilationContext, set: &mut BuiltinSet, t0: &Type, t1: &Type) {
    if let (Some(l), Some(r)) = (promoted(ctx, t0), promoted(ctx, t1)) {
        set.add(Type::bool(), vec![l, r]);
    }
}

fn assignment(ctx: &CompilationContext, set: &mut BuiltinSet, t0: &Type, t1: &Type) {
    if t0.is_const() {
        return;
    }
    let target = assignable(t0);
    if t0.is_pointer() || t0.is_enum() || t0.is_member_pointer() {
        set.add(target.clone(), vec![target.clone(), t0.unqualified().clone()]);
    }
    if is_arithmetic(t0) {
        arithmetic_assignment(ctx, set, t0, t1);
    }
}

/// `VQ L& op(VQ L&, R)` with `R` a promoted arithmetic type.
fn arithmetic_assignment(ctx: &CompilationContext, set: &mut BuiltinSet, t0: &Type, t1: &Type) {
    if let Some(r) = promoted(ctx, t1) {
        let target = assignable(t0);
        set.add(target.clone(), vec![target, r]);
    }
}

/// `CV12 T& op->*(CV1 C1*, CV2 T C2::*)` where `C1` is `C2` or derived from it.
fn member_pointer_access(ctx: &CompilationContext, set: &mut BuiltinSet, t0: &Type, t1: &Type) {
    let Type::MemberPointer { owner, pointee } = t1.unqualified() else {
        return;
    };
    let Some(object) = t0.pointee() else {
        return;
    };
    let Some(class) = object.record_type() else {
        return;
    };
    let MemberOwner::Record(owner) = owner else {
        return;
    };
    let owner_ty = Type::Record(owner.clone());
    let object_ty = Type::Record(class.clone());
    if object_ty != owner_ty && !ctx.is_base_of(&owner_ty, &object_ty) {
        return;
    }
    let result = (**pointee).clone().qualified(object.qualifiers().cv());
    set.add(Type::reference_to(result), vec![t0.clone(), t1.clone()]);
}

// ==========================================================================
// Helpers
// ==========================================================================

/// `VQ T&`: keeps only a volatile qualifier of the operand.
fn assignable(ty: &Type) -> Type {
    let volatile = ty.qualifiers() & Qualifiers::VOLATILE;
    Type::reference_to(ty.unqualified().clone().qualified(volatile))
}

fn promoted(ctx: &CompilationContext, ty: &Type) -> Option<Type> {
    arithmetic_promotion(ctx, ty)
}

fn ptrdiff() -> Type {
    Type::prim(PrimitiveKind::PTRDIFF)
}

fn is_integer(ty: &Type) -> bool {
    ty.is_integral() || ty.is_enum()
}

fn is_arithmetic(ty: &Type) -> bool {
    ty.is_arithmetic() || ty.is_enum()
}

fn is_object(ty: &Type) -> bool {
    !ty.is_function() && !ty.is_void() && !ty.is_reference()
}

fn is_object_pointer(ty: &Type) -> bool {
    ty.pointee().is_some_and(is_object)
}
