//! Choosing between a class template and its partial specializations.

use sema_core::{CompilationError, PartialSpecialization, Span, TemplateArg, TemplateEntry, TypeHash};
use tracing::debug;

use super::matching::{MatchMode, Matcher};
use super::substitution::SubstitutionMap;
use crate::context::CompilationContext;

/// The entity an instance is built from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Chosen {
    Primary,
    /// A partial specialization with its own parameters bound.
    Specialization { hash: TypeHash, bindings: SubstitutionMap },
}

impl Chosen {
    pub(crate) fn hash(&self) -> Option<TypeHash> {
        match self {
            Chosen::Primary => None,
            Chosen::Specialization { hash, .. } => Some(*hash),
        }
    }
}

/// Pick the most specialized entity matching `args`.
pub(crate) fn choose_specialization(
    ctx: &CompilationContext,
    tpl: &TemplateEntry,
    args: &[TemplateArg],
    span: Span,
) -> Result<Chosen, CompilationError> {
    let mut matching: Vec<(&PartialSpecialization, SubstitutionMap)> = tpl
        .specializations
        .iter()
        .filter_map(|spec| pattern_bindings(ctx, spec, args).map(|map| (spec, map)))
        .collect();

    match matching.len() {
        0 => Ok(Chosen::Primary),
        1 => {
            let (spec, bindings) = matching.remove(0);
            debug!(template = %tpl.name, specialization = %spec.name, "partial specialization chosen");
            Ok(Chosen::Specialization {
                hash: spec.hash,
                bindings,
            })
        }
        _ => {
            let specs: Vec<&PartialSpecialization> = matching.iter().map(|(s, _)| *s).collect();
            match most_specialized(ctx, &specs) {
                Some(winner) => {
                    let (spec, bindings) = matching.swap_remove(winner);
                    debug!(template = %tpl.name, specialization = %spec.name, "most specialized partial specialization chosen");
                    Ok(Chosen::Specialization {
                        hash: spec.hash,
                        bindings,
                    })
                }
                None => Err(CompilationError::AmbiguousSpecialization {
                    name: tpl.display_instance(args),
                    candidates: specs.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", "),
                    span,
                }),
            }
        }
    }
}

/// Bindings of the specialization's parameters if its pattern matches
/// `args` and binds every one of them.
pub(crate) fn pattern_bindings(ctx: &CompilationContext, spec: &PartialSpecialization, args: &[TemplateArg]) -> Option<SubstitutionMap> {
    let mut map = SubstitutionMap::new();
    let matched = Matcher::new(ctx, &spec.params, MatchMode::Exact)
        .match_args(&spec.pattern, args, &mut map)
        .is_matched();
    (matched && spec.params.iter().all(|p| map.is_bound(p.id))).then_some(map)
}

/// Whether `a` is more specialized than `b`: the pattern of `a` is an
/// instance of the pattern of `b`, but not the other way round.
fn beats(ctx: &CompilationContext, a: &PartialSpecialization, b: &PartialSpecialization) -> bool {
    pattern_bindings(ctx, b, &a.pattern).is_some() && pattern_bindings(ctx, a, &b.pattern).is_none()
}

/// Index of the specialization beating all others, if there is one.
fn most_specialized(ctx: &CompilationContext, specs: &[&PartialSpecialization]) -> Option<usize> {
    let mut champion = 0;
    for challenger in 1..specs.len() {
        if beats(ctx, specs[challenger], specs[champion]) {
            champion = challenger;
        }
    }
    let unbeaten = (0..specs.len())
        .filter(|&i| i != champion)
        .all(|i| beats(ctx, specs[champion], specs[i]));
    unbeaten.then_some(champion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sema_core::{TemplateParam, Type};

    fn box_template() -> TemplateEntry {
        let owner = TypeHash::from_template("Box");
        TemplateEntry::class("Box", vec![TemplateParam::type_param(owner, 0, "T")])
    }

    fn pointer_spec() -> PartialSpecialization {
        let owner = PartialSpecialization::hash_for("Box", "<T*>");
        let u = TemplateParam::type_param(owner, 0, "T");
        let pattern = vec![TemplateArg::Type(Type::pointer_to(u.as_type()))];
        PartialSpecialization::new("Box", vec![u], pattern)
    }

    fn const_pointer_spec() -> PartialSpecialization {
        let owner = PartialSpecialization::hash_for("Box", "<const T*>");
        let u = TemplateParam::type_param(owner, 0, "T");
        let pattern = vec![TemplateArg::Type(Type::pointer_to(u.as_type().with_const()))];
        PartialSpecialization::new("Box", vec![u], pattern)
    }

    #[test]
    fn primary_when_nothing_matches() {
        let ctx = CompilationContext::default();
        let tpl = box_template().with_specialization(pointer_spec());
        let chosen = choose_specialization(&ctx, &tpl, &[TemplateArg::Type(Type::int())], Span::UNKNOWN).unwrap();
        assert_eq!(chosen, Chosen::Primary);
    }

    #[test]
    fn pointer_specialization_binds_pointee() {
        let ctx = CompilationContext::default();
        let spec = pointer_spec();
        let t = spec.params[0].id;
        let tpl = box_template().with_specialization(spec.clone());
        let args = [TemplateArg::Type(Type::pointer_to(Type::int()))];
        match choose_specialization(&ctx, &tpl, &args, Span::UNKNOWN).unwrap() {
            Chosen::Specialization { hash, bindings } => {
                assert_eq!(hash, spec.hash);
                assert_eq!(bindings.get(t), Some(&TemplateArg::Type(Type::int())));
            }
            Chosen::Primary => panic!("expected the pointer specialization"),
        }
    }

    #[test]
    fn more_specialized_pattern_wins() {
        let ctx = CompilationContext::default();
        let tpl = box_template()
            .with_specialization(pointer_spec())
            .with_specialization(const_pointer_spec());
        let args = [TemplateArg::Type(Type::pointer_to(Type::int().with_const()))];
        let chosen = choose_specialization(&ctx, &tpl, &args, Span::UNKNOWN).unwrap();
        assert_eq!(chosen.hash(), Some(const_pointer_spec().hash));
    }

    #[test]
    fn unordered_patterns_are_ambiguous() {
        let ctx = CompilationContext::default();
        let owner = TypeHash::from_template("Pair");
        let tpl = TemplateEntry::class(
            "Pair",
            vec![
                TemplateParam::type_param(owner, 0, "A"),
                TemplateParam::type_param(owner, 1, "B"),
            ],
        );
        // Pair<T, int> and Pair<int, T>
        let first = {
            let o = PartialSpecialization::hash_for("Pair", "<T, int>");
            let t = TemplateParam::type_param(o, 0, "T");
            PartialSpecialization::new("Pair", vec![t.clone()], vec![t.as_arg(), TemplateArg::Type(Type::int())])
        };
        let second = {
            let o = PartialSpecialization::hash_for("Pair", "<int, T>");
            let t = TemplateParam::type_param(o, 0, "T");
            PartialSpecialization::new("Pair", vec![t.clone()], vec![TemplateArg::Type(Type::int()), t.as_arg()])
        };
        let tpl = tpl.with_specialization(first).with_specialization(second);
        let args = [TemplateArg::Type(Type::int()), TemplateArg::Type(Type::int())];
        let err = choose_specialization(&ctx, &tpl, &args, Span::UNKNOWN).unwrap_err();
        assert!(matches!(err, CompilationError::AmbiguousSpecialization { .. }));
    }
}
