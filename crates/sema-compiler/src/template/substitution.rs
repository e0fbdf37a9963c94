//! Type substitution for template instantiation.
//!
//! Provides the parameter environment of an instance and the functions
//! that rewrite types, arguments and signatures under it.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use sema_core::{
    ArrayDim, CompilationError, FunctionEntry, InstanceOf, MemberOwner, Param, RecordType, Span,
    TemplateArg, TemplateParam, TemplateParamId, Type, TypeHash, Value, format_args,
};

/// Map from template parameter to the argument bound to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstitutionMap {
    bindings: FxHashMap<TemplateParamId, TemplateArg>,
}

impl SubstitutionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, param: TemplateParamId) -> Option<&TemplateArg> {
        self.bindings.get(&param)
    }

    pub fn is_bound(&self, param: TemplateParamId) -> bool {
        self.bindings.contains_key(&param)
    }

    /// Bind `param` unless it is already bound. A repeated binding must
    /// agree with the first one; returns `false` on conflict.
    pub fn bind(&mut self, param: TemplateParamId, arg: TemplateArg) -> bool {
        match self.bindings.get(&param) {
            Some(existing) => *existing == arg,
            None => {
                self.bindings.insert(param, arg);
                true
            }
        }
    }

    /// Bind every entry of `other`. Returns the first conflicting parameter.
    pub fn join(&mut self, other: SubstitutionMap) -> Result<(), TemplateParamId> {
        let mut entries: Vec<_> = other.bindings.into_iter().collect();
        entries.sort_by_key(|(id, _)| *id);
        for (param, arg) in entries {
            if !self.bind(param, arg) {
                return Err(param);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TemplateParamId, &TemplateArg)> {
        self.bindings.iter()
    }

    /// The argument bound to a template template parameter occurring as
    /// `TemplateArg::Template(placeholder)`.
    fn template_binding(&self, placeholder: TypeHash) -> Option<&TemplateArg> {
        self.bindings.iter().find_map(|(id, arg)| {
            let hash = TypeHash::from_template_instance(id.owner, &[TypeHash(u64::from(id.index))]);
            (hash == placeholder).then_some(arg)
        })
    }
}

/// Build a substitution map from template parameters and arguments.
///
/// # Errors
/// Returns an error if the number of arguments doesn't match parameters.
pub fn build_substitution_map(
    template: &str,
    params: &[TemplateParam],
    args: &[TemplateArg],
    span: Span,
) -> Result<SubstitutionMap, CompilationError> {
    if args.len() > params.len() {
        return Err(CompilationError::TooManyTemplateArguments {
            template: template.to_string(),
            expected: params.len(),
            got: args.len(),
            span,
        });
    }
    if args.len() < params.len() {
        return Err(CompilationError::MissingDefaultArgument {
            template: template.to_string(),
            index: args.len() + 1,
            span,
        });
    }

    let mut map = SubstitutionMap::new();
    for (param, arg) in params.iter().zip(args) {
        map.bind(param.id, arg.clone());
    }
    Ok(map)
}

/// Substitute template parameters in a type.
///
/// Bound type parameters are replaced; qualifiers written around the
/// parameter are merged into the replacement. Dependent array bounds,
/// member pointer owners and the arguments of record instances are
/// rewritten as well.
pub fn substitute_type(ty: &Type, map: &SubstitutionMap) -> Type {
    if map.is_empty() || !ty.is_dependent() {
        return ty.clone();
    }
    match ty {
        Type::TemplateParam(p) => match map.get(p.id) {
            Some(TemplateArg::Type(replacement)) => replacement.clone(),
            _ => ty.clone(),
        },
        Type::Qualified(inner, quals) => substitute_type(inner, map).qualified(*quals),
        Type::Pointer(inner) => Type::pointer_to(substitute_type(inner, map)),
        Type::Reference(inner) => Type::reference_to(substitute_type(inner, map)),
        Type::Array(elem, dim) => {
            let dim = match dim {
                ArrayDim::Dependent(p) => match map.get(p.id) {
                    Some(TemplateArg::Value(v)) => match v.as_integer() {
                        Some(n) if n >= 0 => ArrayDim::Fixed(n as u64),
                        _ => ArrayDim::Unknown,
                    },
                    Some(TemplateArg::ValueParam(other)) => ArrayDim::Dependent(other.clone()),
                    _ => dim.clone(),
                },
                other => other.clone(),
            };
            Type::Array(Box::new(substitute_type(elem, map)), dim)
        }
        Type::Function(f) => Type::function(
            f.params.iter().map(|p| substitute_type(p, map)).collect(),
            substitute_type(&f.ret, map),
            f.variadic,
        ),
        Type::MemberPointer { owner, pointee } => {
            let owner = match owner {
                MemberOwner::Param(p) => match map.get(p.id) {
                    Some(TemplateArg::Type(t)) => match t.unqualified() {
                        Type::Record(r) => MemberOwner::Record(r.clone()),
                        Type::TemplateParam(q) => MemberOwner::Param(q.clone()),
                        _ => owner.clone(),
                    },
                    _ => owner.clone(),
                },
                MemberOwner::Record(r) => MemberOwner::Record(substitute_record(r, map)),
            };
            Type::member_pointer(owner, substitute_type(pointee, map))
        }
        Type::Record(r) => Type::Record(substitute_record(r, map)),
        Type::Primitive(_) | Type::Enum(_) | Type::Undefined => ty.clone(),
    }
}

/// Substitute the arguments of a record instance, re-hashing it.
pub fn substitute_record(record: &RecordType, map: &SubstitutionMap) -> RecordType {
    let Some(inst) = &record.instance_of else {
        return record.clone();
    };
    if !inst.args.iter().any(TemplateArg::is_dependent) {
        return record.clone();
    }
    let args: Vec<TemplateArg> = inst.args.iter().map(|a| substitute_arg(a, map)).collect();
    instance_record_type(inst.template, template_name(&record.name), args)
}

/// Record type of the instance of `template` (named `name`) for `args`.
pub(crate) fn instance_record_type(template: TypeHash, name: &str, args: Vec<TemplateArg>) -> RecordType {
    let hashes: Vec<TypeHash> = args.iter().map(TemplateArg::type_hash).collect();
    RecordType {
        hash: TypeHash::from_template_instance(template, &hashes),
        name: format!("{name}{}", format_args(&args)).into(),
        instance_of: Some(Rc::new(InstanceOf { template, args })),
    }
}

/// The template name part of a rendered template-id.
fn template_name(rendered: &str) -> &str {
    rendered.split('<').next().unwrap_or(rendered)
}

/// Substitute template parameters in a template argument.
pub fn substitute_arg(arg: &TemplateArg, map: &SubstitutionMap) -> TemplateArg {
    match arg {
        TemplateArg::Type(t) => TemplateArg::Type(substitute_type(t, map)),
        TemplateArg::ValueParam(p) => match map.get(p.id) {
            Some(bound @ (TemplateArg::Value(_) | TemplateArg::ValueParam(_))) => bound.clone(),
            _ => arg.clone(),
        },
        TemplateArg::Template(h) => match map.template_binding(*h) {
            Some(bound @ TemplateArg::Template(_)) => bound.clone(),
            _ => arg.clone(),
        },
        TemplateArg::Value(_) => arg.clone(),
    }
}

/// Substitute template parameters in function parameters.
pub fn substitute_params(params: &[Param], map: &SubstitutionMap) -> Vec<Param> {
    params
        .iter()
        .map(|p| Param {
            ty: substitute_type(&p.ty, map),
            default: p.default.clone(),
        })
        .collect()
}

/// Substitute a member or function signature. The identity is recomputed
/// from the rewritten owner and parameters.
pub fn substitute_function(function: &FunctionEntry, map: &SubstitutionMap) -> FunctionEntry {
    let mut result = function.clone();
    result.params = substitute_params(&function.params, map);
    result.return_type = substitute_type(&function.return_type, map);
    result.owner = function.owner.as_ref().map(|o| substitute_record(o, map));
    if result.is_constructor() {
        if let Some(owner) = &result.owner {
            result.name = owner.name.to_string();
        }
    }
    result.rehashed()
}

/// A non-type argument for an array bound.
pub(crate) fn dimension_value(n: u64) -> TemplateArg {
    TemplateArg::Value(Value::Unsigned(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sema_core::{PrimitiveKind, Qualifiers, TemplateEntry};

    fn box_template() -> TemplateEntry {
        let owner = TypeHash::from_template("Box");
        TemplateEntry::class("Box", vec![TemplateParam::type_param(owner, 0, "T")])
    }

    #[test]
    fn replaces_bound_parameters() {
        let tpl = box_template();
        let t = tpl.params[0].as_type();
        let map = build_substitution_map("Box", &tpl.params, &[TemplateArg::Type(Type::int())], Span::UNKNOWN).unwrap();

        assert_eq!(substitute_type(&t, &map), Type::int());
        assert_eq!(
            substitute_type(&Type::pointer_to(t.clone().with_const()), &map),
            Type::pointer_to(Type::int().with_const())
        );
        assert_eq!(
            substitute_type(&Type::reference_to(t), &map),
            Type::reference_to(Type::int())
        );
    }

    #[test]
    fn qualifiers_merge_into_replacement() {
        let tpl = box_template();
        let t = tpl.params[0].as_type();
        let map = build_substitution_map(
            "Box",
            &tpl.params,
            &[TemplateArg::Type(Type::int().qualified(Qualifiers::VOLATILE))],
            Span::UNKNOWN,
        )
        .unwrap();
        let result = substitute_type(&t.with_const(), &map);
        assert_eq!(result.qualifiers(), Qualifiers::CONST | Qualifiers::VOLATILE);
        assert_eq!(result.unqualified(), &Type::int());
    }

    #[test]
    fn references_collapse() {
        let tpl = box_template();
        let t = tpl.params[0].as_type();
        let map = build_substitution_map(
            "Box",
            &tpl.params,
            &[TemplateArg::Type(Type::reference_to(Type::int()))],
            Span::UNKNOWN,
        )
        .unwrap();
        assert_eq!(substitute_type(&Type::reference_to(t), &map), Type::reference_to(Type::int()));
    }

    #[test]
    fn record_instances_are_rehashed() {
        let tpl = box_template();
        let injected = Type::Record(tpl.injected_record());
        assert!(injected.is_dependent());

        let map = build_substitution_map("Box", &tpl.params, &[TemplateArg::Type(Type::int())], Span::UNKNOWN).unwrap();
        let concrete = substitute_type(&injected, &map);
        let expected = tpl.instance_record(vec![Type::int().into()]);

        assert!(!concrete.is_dependent());
        assert_eq!(concrete.record_type().map(|r| r.hash), Some(expected.hash));
        assert_eq!(concrete.to_string(), "Box<int>");
    }

    #[test]
    fn dependent_dimensions_become_fixed() {
        let owner = TypeHash::from_template("Array");
        let n = TemplateParam::non_type(owner, 0, "N", Type::prim(PrimitiveKind::ULong));
        let arr = Type::Array(Box::new(Type::int()), ArrayDim::Dependent(n.as_param_type()));
        let mut map = SubstitutionMap::new();
        map.bind(n.id, dimension_value(4));
        assert_eq!(substitute_type(&arr, &map), Type::array_of(Type::int(), 4));
    }

    #[test]
    fn member_pointer_owner_is_substituted() {
        let tpl = box_template();
        let mp = Type::member_pointer(MemberOwner::Param(tpl.params[0].as_param_type()), Type::int());
        let widget = Type::record(TypeHash::from_name("Widget"), "Widget");
        let mut map = SubstitutionMap::new();
        map.bind(tpl.params[0].id, widget.clone().into());
        let result = substitute_type(&mp, &map);
        assert!(!result.is_dependent());
        let owner = MemberOwner::Record(widget.record_type().cloned().unwrap());
        assert_eq!(result, Type::member_pointer(owner, Type::int()));
    }

    #[test]
    fn bind_keeps_first_and_join_reports_conflicts() {
        let id = TemplateParamId::new(TypeHash::from_template("Pair"), 0);
        let mut map = SubstitutionMap::new();
        assert!(map.bind(id, Type::int().into()));
        assert!(map.bind(id, Type::int().into()));
        assert!(!map.bind(id, Type::double().into()));
        assert_eq!(map.get(id), Some(&TemplateArg::Type(Type::int())));

        let mut other = SubstitutionMap::new();
        other.bind(id, Type::double().into());
        assert_eq!(map.join(other), Err(id));
    }

    #[test]
    fn arity_is_checked() {
        let tpl = box_template();
        let err = build_substitution_map("Box", &tpl.params, &[], Span::UNKNOWN).unwrap_err();
        assert!(matches!(err, CompilationError::MissingDefaultArgument { index: 1, .. }));
        let err = build_substitution_map(
            "Box",
            &tpl.params,
            &[TemplateArg::Type(Type::int()), TemplateArg::Type(Type::int())],
            Span::UNKNOWN,
        )
        .unwrap_err();
        assert!(matches!(err, CompilationError::TooManyTemplateArguments { expected: 1, got: 2, .. }));
    }
}
