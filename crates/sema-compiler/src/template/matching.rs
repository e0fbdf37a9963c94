//! Structural matching of a parameter pattern against an argument type.
//!
//! The same matcher serves three callers:
//!
//! - deduction from a function call ([`MatchMode::Call`])
//! - partial specialization patterns ([`MatchMode::Exact`])
//! - partial ordering of function templates ([`MatchMode::PartialOrdering`])
//!
//! Only parameters owned by the template being deduced are bound. Every
//! other template parameter occurring in either type is an opaque unique
//! type.

use std::mem::discriminant;

use sema_core::{
    ArrayDim, MemberOwner, ParamType, Qualifiers, TemplateArg, TemplateParam, TemplateParamId,
    TemplateParamKind, Type, TypeHash,
};

use super::substitution::{SubstitutionMap, dimension_value};
use crate::context::CompilationContext;

/// How strictly types have to agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Deduction from call arguments. Non-dependent parts are left to the
    /// conversion check.
    Call,
    /// Every part must agree exactly.
    Exact,
    /// Deduction of one template's parameters from another's parameter
    /// types. The other template's parameters only match parameters.
    PartialOrdering,
}

/// Result of matching one pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    /// A parameter was deduced to two different arguments.
    AmbiguousBinding(TemplateParamId),
    Mismatch,
}

impl MatchOutcome {
    pub fn is_matched(self) -> bool {
        self == MatchOutcome::Matched
    }
}

/// Match `param` against `arg`, binding the parameters of `params` in
/// `bindings`.
pub fn match_types(
    ctx: &CompilationContext,
    params: &[TemplateParam],
    param: &Type,
    arg: &Type,
    bindings: &mut SubstitutionMap,
    mode: MatchMode,
) -> MatchOutcome {
    Matcher::new(ctx, params, mode).match_types(param, arg, bindings)
}

/// Match two template argument lists element-wise, exactly.
pub fn match_args(
    ctx: &CompilationContext,
    params: &[TemplateParam],
    pattern: &[TemplateArg],
    args: &[TemplateArg],
    bindings: &mut SubstitutionMap,
    mode: MatchMode,
) -> MatchOutcome {
    Matcher::new(ctx, params, mode).match_args(pattern, args, bindings)
}

pub(crate) struct Matcher<'a> {
    ctx: &'a CompilationContext,
    params: &'a [TemplateParam],
    exact: bool,
    partial_ordering: bool,
}

impl<'a> Matcher<'a> {
    pub(crate) fn new(ctx: &'a CompilationContext, params: &'a [TemplateParam], mode: MatchMode) -> Self {
        Self {
            ctx,
            params,
            exact: mode == MatchMode::Exact,
            partial_ordering: mode == MatchMode::PartialOrdering,
        }
    }

    /// The same matcher requiring exact agreement.
    fn exactly(&self) -> Matcher<'a> {
        Matcher {
            exact: true,
            ..*self
        }
    }

    fn own(&self, p: &ParamType) -> Option<&'a TemplateParam> {
        self.params.iter().find(|decl| decl.id == p.id)
    }

    fn mentions_own(&self, ty: &Type) -> bool {
        match ty {
            Type::TemplateParam(p) => self.own(p).is_some(),
            Type::Pointer(inner) | Type::Reference(inner) | Type::Qualified(inner, _) => self.mentions_own(inner),
            Type::Array(elem, dim) => {
                matches!(dim, ArrayDim::Dependent(p) if self.own(p).is_some()) || self.mentions_own(elem)
            }
            Type::Function(f) => self.mentions_own(&f.ret) || f.params.iter().any(|p| self.mentions_own(p)),
            Type::MemberPointer { owner, pointee } => {
                matches!(owner, MemberOwner::Param(p) if self.own(p).is_some()) || self.mentions_own(pointee)
            }
            Type::Record(r) => r
                .instance_of
                .as_ref()
                .is_some_and(|inst| inst.args.iter().any(|a| self.arg_mentions_own(a))),
            Type::Primitive(_) | Type::Enum(_) | Type::Undefined => false,
        }
    }

    fn arg_mentions_own(&self, arg: &TemplateArg) -> bool {
        match arg {
            TemplateArg::Type(t) => self.mentions_own(t),
            TemplateArg::ValueParam(p) => self.own(p).is_some(),
            TemplateArg::Template(h) => self.own_template_param(*h).is_some(),
            TemplateArg::Value(_) => false,
        }
    }

    fn own_template_param(&self, placeholder: TypeHash) -> Option<&'a TemplateParam> {
        self.params.iter().find(|decl| {
            matches!(decl.kind, TemplateParamKind::Template(_))
                && decl.as_arg() == TemplateArg::Template(placeholder)
        })
    }

    fn bind(&self, bindings: &mut SubstitutionMap, id: TemplateParamId, arg: TemplateArg) -> MatchOutcome {
        if bindings.bind(id, arg) {
            MatchOutcome::Matched
        } else {
            MatchOutcome::AmbiguousBinding(id)
        }
    }

    /// Outcome for a pattern that cannot be taken apart any further.
    fn leaf(&self, param: &Type, arg: &Type) -> MatchOutcome {
        if self.exact && param != arg {
            return MatchOutcome::Mismatch;
        }
        if self.partial_ordering && arg.is_dependent() && !param.is_dependent() {
            return MatchOutcome::Mismatch;
        }
        MatchOutcome::Matched
    }

    pub(crate) fn match_types(&self, param: &Type, arg: &Type, bindings: &mut SubstitutionMap) -> MatchOutcome {
        if let Type::TemplateParam(p) = param {
            if let Some(decl) = self.own(p) {
                return self.match_param(decl, arg, bindings);
            }
        }
        if let Type::Qualified(inner, quals) = param {
            return self.match_qualified(inner, *quals, arg, bindings);
        }
        if !self.mentions_own(param) {
            return self.leaf(param, arg);
        }
        if discriminant(param) != discriminant(arg) {
            return MatchOutcome::Mismatch;
        }

        match (param, arg) {
            (Type::Pointer(p), Type::Pointer(a)) | (Type::Reference(p), Type::Reference(a)) => {
                self.match_types(p, a, bindings)
            }
            (Type::Array(pe, pd), Type::Array(ae, ad)) => {
                let outcome = self.match_dimension(pd, ad, bindings);
                if !outcome.is_matched() {
                    return outcome;
                }
                self.match_types(pe, ae, bindings)
            }
            (Type::Function(pf), Type::Function(af)) => {
                if pf.params.len() != af.params.len() {
                    return if self.exact { MatchOutcome::Mismatch } else { MatchOutcome::Matched };
                }
                // Each position is deduced on its own, then the results are joined.
                let nested = self.exactly();
                let mut scratch = SubstitutionMap::new();
                for (p, a) in pf.params.iter().zip(&af.params) {
                    match nested.match_types(p, a, &mut scratch) {
                        MatchOutcome::Matched => {}
                        MatchOutcome::Mismatch if !self.exact => return self.match_types(&pf.ret, &af.ret, bindings),
                        other => return other,
                    }
                }
                if let Err(id) = bindings.join(scratch) {
                    return MatchOutcome::AmbiguousBinding(id);
                }
                self.match_types(&pf.ret, &af.ret, bindings)
            }
            (
                Type::MemberPointer { owner: po, pointee: pp },
                Type::MemberPointer { owner: ao, pointee: ap },
            ) => {
                let outcome = self.match_owner(po, ao, bindings);
                if !outcome.is_matched() {
                    return outcome;
                }
                self.match_types(pp, ap, bindings)
            }
            (Type::Record(_), Type::Record(_)) => self.match_record(param, arg, bindings),
            _ => self.leaf(param, arg),
        }
    }

    fn match_param(&self, decl: &TemplateParam, arg: &Type, bindings: &mut SubstitutionMap) -> MatchOutcome {
        match &decl.kind {
            TemplateParamKind::Type => self.bind(bindings, decl.id, TemplateArg::Type(arg.clone())),
            TemplateParamKind::NonType(_) => match arg {
                Type::TemplateParam(p) => self.bind(bindings, decl.id, TemplateArg::ValueParam(p.clone())),
                _ => MatchOutcome::Matched,
            },
            TemplateParamKind::Template(_) => match arg.unqualified().record_type().and_then(|r| r.instance_of.as_ref()) {
                Some(inst) => self.bind(bindings, decl.id, TemplateArg::Template(inst.template)),
                None if self.exact => MatchOutcome::Mismatch,
                None => MatchOutcome::Matched,
            },
        }
    }

    fn match_qualified(
        &self,
        inner: &Type,
        quals: Qualifiers,
        arg: &Type,
        bindings: &mut SubstitutionMap,
    ) -> MatchOutcome {
        let is_param = matches!(inner, Type::TemplateParam(p) if self.own(p).is_some());
        let arg_quals = if is_param { arg.qualifiers_through_arrays() } else { arg.qualifiers() };

        if self.exact {
            if arg_quals.cv() != quals.cv() {
                return MatchOutcome::Mismatch;
            }
            return self.match_types(inner, &requalify(arg, Qualifiers::empty()), bindings);
        }

        if !is_param {
            // Only a parameter at least as qualified as the argument deduces.
            if !quals.is_equal_or_more_than(arg_quals) {
                return MatchOutcome::Matched;
            }
            return self.match_types(inner, arg.unqualified(), bindings);
        }

        if self.partial_ordering
            && matches!(arg.unqualified(), Type::TemplateParam(_))
            && !arg_quals.is_equal_or_more_than(quals)
        {
            return MatchOutcome::Mismatch;
        }

        // The qualifiers written on the parameter are consumed; the rest
        // stay with the deduced type.
        let remaining = arg_quals.difference(quals.cv());
        self.match_types(inner, &requalify(arg, remaining), bindings)
    }

    fn match_dimension(&self, param: &ArrayDim, arg: &ArrayDim, bindings: &mut SubstitutionMap) -> MatchOutcome {
        match param {
            ArrayDim::Dependent(p) => match self.own(p) {
                Some(decl) if !decl.is_type() => match arg {
                    ArrayDim::Fixed(n) => self.bind(bindings, decl.id, dimension_value(*n)),
                    ArrayDim::Dependent(q) => self.bind(bindings, decl.id, TemplateArg::ValueParam(q.clone())),
                    ArrayDim::Unknown if self.exact => MatchOutcome::Mismatch,
                    ArrayDim::Unknown => MatchOutcome::Matched,
                },
                _ if self.exact && param != arg => MatchOutcome::Mismatch,
                _ => MatchOutcome::Matched,
            },
            _ if self.exact && param != arg => MatchOutcome::Mismatch,
            _ => MatchOutcome::Matched,
        }
    }

    fn match_owner(&self, param: &MemberOwner, arg: &MemberOwner, bindings: &mut SubstitutionMap) -> MatchOutcome {
        match param {
            MemberOwner::Param(p) => match self.own(p) {
                Some(decl) if decl.is_type() => match arg {
                    MemberOwner::Record(r) => self.bind(bindings, decl.id, TemplateArg::Type(Type::Record(r.clone()))),
                    MemberOwner::Param(q) => self.bind(bindings, decl.id, TemplateArg::Type(Type::TemplateParam(q.clone()))),
                },
                _ => MatchOutcome::Matched,
            },
            MemberOwner::Record(_) if self.exact && param != arg => MatchOutcome::Mismatch,
            MemberOwner::Record(_) => MatchOutcome::Matched,
        }
    }

    /// A record instance pattern matches the argument class or, when
    /// deducing from a call, any of its base classes instantiated from the
    /// same template.
    fn match_record(&self, param: &Type, arg: &Type, bindings: &mut SubstitutionMap) -> MatchOutcome {
        let (Some(p), Some(a)) = (param.record_type(), arg.record_type()) else {
            return MatchOutcome::Mismatch;
        };
        let Some(pattern) = &p.instance_of else {
            return self.leaf(param, arg);
        };

        let mut instances = vec![a.clone()];
        if !self.exact && !self.partial_ordering {
            instances.extend(
                self.ctx
                    .registry
                    .all_bases(a.hash)
                    .into_iter()
                    .filter_map(|b| self.ctx.registry.get_record(b))
                    .map(|entry| entry.as_record_type()),
            );
        }

        let nested = self.exactly();
        let mut matched = false;
        for candidate in instances {
            let Some(inst) = &candidate.instance_of else {
                continue;
            };
            if inst.template != pattern.template || inst.args.len() != pattern.args.len() {
                continue;
            }
            let mut scratch = SubstitutionMap::new();
            match nested.match_args(&pattern.args, &inst.args, &mut scratch) {
                MatchOutcome::Matched => {
                    if let Err(id) = bindings.join(scratch) {
                        return MatchOutcome::AmbiguousBinding(id);
                    }
                    matched = true;
                }
                MatchOutcome::AmbiguousBinding(id) => return MatchOutcome::AmbiguousBinding(id),
                MatchOutcome::Mismatch => {}
            }
        }

        if matched { MatchOutcome::Matched } else { MatchOutcome::Mismatch }
    }

    pub(crate) fn match_args(
        &self,
        pattern: &[TemplateArg],
        args: &[TemplateArg],
        bindings: &mut SubstitutionMap,
    ) -> MatchOutcome {
        if pattern.len() != args.len() {
            return MatchOutcome::Mismatch;
        }
        for (p, a) in pattern.iter().zip(args) {
            let outcome = match (p, a) {
                (TemplateArg::Type(pt), TemplateArg::Type(at)) => self.match_types(pt, at, bindings),
                (TemplateArg::ValueParam(pp), _) if self.own(pp).is_some() => match a {
                    TemplateArg::Value(_) | TemplateArg::ValueParam(_) => self.bind(bindings, pp.id, a.clone()),
                    _ => MatchOutcome::Mismatch,
                },
                (TemplateArg::Template(h), TemplateArg::Template(_)) => match self.own_template_param(*h) {
                    Some(decl) => self.bind(bindings, decl.id, a.clone()),
                    None if p == a => MatchOutcome::Matched,
                    None => MatchOutcome::Mismatch,
                },
                _ if p == a => MatchOutcome::Matched,
                _ => MatchOutcome::Mismatch,
            };
            if !outcome.is_matched() {
                return outcome;
            }
        }
        MatchOutcome::Matched
    }
}

/// `ty` with the qualifiers of its (innermost array element) type replaced.
fn requalify(ty: &Type, quals: Qualifiers) -> Type {
    match ty.unqualified() {
        Type::Array(elem, dim) => Type::Array(Box::new(requalify(elem, quals)), dim.clone()),
        base => base.clone().qualified(quals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sema_core::{Config, RecordEntry, TemplateEntry};
    use sema_registry::SymbolRegistry;

    fn owner() -> TypeHash {
        TypeHash::from_template("f")
    }

    fn t() -> TemplateParam {
        TemplateParam::type_param(owner(), 0, "T")
    }

    fn run(param: &Type, arg: &Type, mode: MatchMode) -> (MatchOutcome, SubstitutionMap) {
        let ctx = CompilationContext::default();
        let params = [t()];
        let mut map = SubstitutionMap::new();
        let outcome = match_types(&ctx, &params, param, arg, &mut map, mode);
        (outcome, map)
    }

    fn bound(map: &SubstitutionMap) -> Option<Type> {
        map.get(t().id).and_then(|a| a.as_type()).cloned()
    }

    #[test]
    fn binds_through_pointers() {
        let (outcome, map) = run(
            &Type::pointer_to(t().as_type()),
            &Type::pointer_to(Type::int().with_const()),
            MatchMode::Call,
        );
        assert_eq!(outcome, MatchOutcome::Matched);
        assert_eq!(bound(&map), Some(Type::int().with_const()));
    }

    #[test]
    fn qualified_parameter_consumes_qualifiers() {
        let (outcome, map) = run(&t().as_type().with_const(), &Type::int().with_const(), MatchMode::Call);
        assert_eq!(outcome, MatchOutcome::Matched);
        assert_eq!(bound(&map), Some(Type::int()));

        // const T from plain int still deduces T = int
        let (outcome, map) = run(&t().as_type().with_const(), &Type::int(), MatchMode::Call);
        assert_eq!(outcome, MatchOutcome::Matched);
        assert_eq!(bound(&map), Some(Type::int()));

        let cv = Qualifiers::CONST | Qualifiers::VOLATILE;
        let (_, map) = run(&t().as_type().with_const(), &Type::int().qualified(cv), MatchMode::Call);
        assert_eq!(bound(&map), Some(Type::int().qualified(Qualifiers::VOLATILE)));
    }

    #[test]
    fn exact_mode_requires_equal_qualifiers() {
        let (outcome, _) = run(&t().as_type().with_const(), &Type::int(), MatchMode::Exact);
        assert_eq!(outcome, MatchOutcome::Mismatch);
        let (outcome, _) = run(&Type::pointer_to(t().as_type()), &Type::int(), MatchMode::Exact);
        assert_eq!(outcome, MatchOutcome::Mismatch);
    }

    #[test]
    fn conflicting_occurrences_are_ambiguous() {
        let f = Type::function(vec![t().as_type(), t().as_type()], Type::void(), false);
        let g = Type::function(vec![Type::int(), Type::double()], Type::void(), false);
        let (outcome, _) = run(&Type::pointer_to(f), &Type::pointer_to(g), MatchMode::Call);
        assert_eq!(outcome, MatchOutcome::AmbiguousBinding(t().id));
    }

    #[test]
    fn dependent_pattern_of_other_shape_mismatches() {
        let (outcome, _) = run(&Type::pointer_to(t().as_type()), &Type::int(), MatchMode::Call);
        assert_eq!(outcome, MatchOutcome::Mismatch);
        // non-dependent parts are left to the conversion check
        let (outcome, _) = run(&Type::double(), &Type::int(), MatchMode::Call);
        assert_eq!(outcome, MatchOutcome::Matched);
    }

    #[test]
    fn array_bound_binds_non_type_parameter() {
        let ctx = CompilationContext::default();
        let n = TemplateParam::non_type(owner(), 1, "N", Type::prim(sema_core::PrimitiveKind::ULong));
        let params = [t(), n.clone()];
        let pattern = Type::Array(Box::new(t().as_type()), ArrayDim::Dependent(n.as_param_type()));
        let mut map = SubstitutionMap::new();
        let outcome = match_types(
            &ctx,
            &params,
            &pattern,
            &Type::array_of(Type::double(), 8),
            &mut map,
            MatchMode::Call,
        );
        assert_eq!(outcome, MatchOutcome::Matched);
        assert_eq!(map.get(n.id), Some(&dimension_value(8)));
        assert_eq!(map.get(t().id), Some(&TemplateArg::Type(Type::double())));
    }

    #[test]
    fn record_pattern_searches_base_instances() {
        let mut registry = SymbolRegistry::new();
        let tpl = TemplateEntry::class(
            "Box",
            vec![TemplateParam::type_param(TypeHash::from_template("Box"), 0, "U")],
        );
        let box_int = tpl.instance_record(vec![Type::int().into()]);
        let inst = box_int.instance_of.as_deref().cloned().unwrap();
        registry
            .register_record(RecordEntry::instance("Box<int>", box_int.hash, inst))
            .unwrap();
        let derived = RecordEntry::class("Derived").with_base(box_int.hash);
        let derived_ty = derived.as_type();
        registry.register_record(derived).unwrap();
        let ctx = CompilationContext::new(registry, Config::default());

        // Box<T> pattern, in terms of the function template's T
        let pattern = Type::Record(super::super::substitution::instance_record_type(
            tpl.template_hash,
            "Box",
            vec![t().as_arg()],
        ));
        let params = [t()];
        let mut map = SubstitutionMap::new();
        let outcome = match_types(&ctx, &params, &pattern, &derived_ty, &mut map, MatchMode::Call);
        assert_eq!(outcome, MatchOutcome::Matched);
        assert_eq!(map.get(t().id), Some(&TemplateArg::Type(Type::int())));

        let mut map = SubstitutionMap::new();
        let outcome = match_types(&ctx, &params, &pattern, &derived_ty, &mut map, MatchMode::Exact);
        assert_eq!(outcome, MatchOutcome::Mismatch);
    }

    #[test]
    fn partial_ordering_treats_foreign_parameters_as_unique() {
        let other = TemplateParam::type_param(TypeHash::from_template("g"), 0, "U");
        // T* is matched by U*, but int is not matched by U
        let (outcome, map) = run(
            &Type::pointer_to(t().as_type()),
            &Type::pointer_to(other.as_type()),
            MatchMode::PartialOrdering,
        );
        assert_eq!(outcome, MatchOutcome::Matched);
        assert_eq!(bound(&map), Some(other.as_type()));

        let (outcome, _) = run(&Type::int(), &other.as_type(), MatchMode::PartialOrdering);
        assert_eq!(outcome, MatchOutcome::Mismatch);
    }
}
