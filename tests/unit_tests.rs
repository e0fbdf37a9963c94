//! End-to-end tests for the resolution engine, driven through [`Sema`].
//!
//! Each section sets up a small symbol table the way a front end would and
//! checks the observable outcome of a query.

use std::cell::RefCell;
use std::rc::Rc;

use sema::sema_compiler::CompilationContext;
use sema::sema_core::FragmentId;
use sema::{
    Comparison, CompilationError, Config, ConversionFailure, ConversionKind, DefinitionRequest, ExprInfo,
    FragmentParser, FunctionEntry, InstanceRef, InstanceState, InstantiationRequest, OperatorKind, OverloadRequest,
    ParseOutcome, PartialSpecialization, PrimitiveKind, Rank, RecordEntry, Resolution, Sema, SubstitutionMap,
    TemplateArg, TemplateEntry, TemplateParam, Type, TypeHash, compare, instantiate, resolve,
};

fn record(sema: &mut Sema, entry: RecordEntry) -> Type {
    let ty = entry.as_type();
    sema.register_record(entry).unwrap();
    ty
}

fn int_ptr(levels: usize) -> Type {
    (0..levels).fold(Type::int(), |ty, _| Type::pointer_to(ty))
}

/// `template<class T> struct Nest : Nest<T*> {};`
fn nest_template() -> TemplateEntry {
    let owner = TypeHash::from_template("Nest");
    let t = TemplateParam::type_param(owner, 0, "T");
    let tpl = TemplateEntry::class("Nest", vec![t.clone()]);
    let base = Type::Record(tpl.instance_record(vec![TemplateArg::Type(Type::pointer_to(t.as_type()))]));
    tpl.with_base(base)
}

// =============================================================================
// Conversion laws
// =============================================================================

#[test]
fn identity_law() {
    let mut sema = Sema::new();
    let widget = record(&mut sema, RecordEntry::class("Widget"));
    for ty in [
        Type::int(),
        Type::prim(PrimitiveKind::UnsignedChar),
        Type::double(),
        Type::pointer_to(Type::double().with_const()),
        widget,
    ] {
        let seq = sema.convert(&ty, &ExprInfo::lvalue(ty.clone())).unwrap();
        assert_eq!(seq.rank(), Some(Rank::Exact), "{ty}");
        assert!(seq.is_exact_identity(), "{ty}");
    }
}

#[test]
fn qualification_is_monotonic() {
    let mut sema = Sema::new();
    let plain = Type::pointer_to(Type::int());
    let constant = Type::pointer_to(Type::int().with_const());

    let seq = sema.convert(&constant, &ExprInfo::lvalue(plain.clone())).unwrap();
    assert!(seq.kinds().contains(&ConversionKind::Qualification));
    assert_eq!(
        sema.convert(&plain, &ExprInfo::lvalue(constant)),
        Err(ConversionFailure::NoConversion)
    );
}

#[test]
fn compare_is_reflexive_and_antisymmetric() {
    let mut sema = Sema::new();
    let base = RecordEntry::class("Base");
    let base_hash = base.type_hash;
    let base_ty = record(&mut sema, base);
    let derived_ty = record(&mut sema, RecordEntry::class("Derived").with_base(base_hash));

    let sequences = [
        sema.convert(&Type::int(), &ExprInfo::lvalue(Type::int())).unwrap(),
        sema.convert(&Type::int(), &ExprInfo::rvalue(Type::prim(PrimitiveKind::Short))).unwrap(),
        sema.convert(&Type::double(), &ExprInfo::rvalue(Type::int())).unwrap(),
        sema.convert(&Type::reference_to(base_ty), &ExprInfo::lvalue(derived_ty.clone())).unwrap(),
        sema.convert(&Type::reference_to(derived_ty.clone()), &ExprInfo::lvalue(derived_ty)).unwrap(),
    ];
    let ctx = sema.context();
    for a in &sequences {
        assert_eq!(compare(ctx, a, a), Comparison::Indistinguishable);
        for b in &sequences {
            assert_eq!(compare(ctx, a, b), compare(ctx, b, a).reverse());
        }
    }
}

#[test]
fn ambiguous_user_defined_conversion() {
    // struct B; struct A { A(const B&); }; struct B { operator A(); };
    let mut sema = Sema::new();
    let a = RecordEntry::class("A");
    let b = RecordEntry::class("B");
    let (a_rec, b_rec) = (a.as_record_type(), b.as_record_type());
    let a_ty = record(&mut sema, a);
    let b_ty = record(&mut sema, b);
    sema.register_function(FunctionEntry::constructor(a_rec, vec![Type::reference_to(b_ty.clone().with_const())]))
        .unwrap();
    sema.register_function(FunctionEntry::conversion(b_rec, a_ty.clone()))
        .unwrap();

    match sema.convert(&a_ty, &ExprInfo::lvalue(b_ty)) {
        Err(ConversionFailure::Ambiguous { candidates }) => assert_eq!(candidates.len(), 2),
        other => panic!("expected an ambiguous conversion, got {other:?}"),
    }
}

// =============================================================================
// Overload resolution
// =============================================================================

#[test]
fn int_prefers_f_int_and_float_prefers_f_double() {
    let mut sema = Sema::new();
    let f_int = sema
        .register_function(FunctionEntry::free("f", vec![Type::int()], Type::void()))
        .unwrap();
    let f_double = sema
        .register_function(FunctionEntry::free("f", vec![Type::double()], Type::void()))
        .unwrap();

    let call = sema.resolve_call("f", vec![ExprInfo::rvalue(Type::int())]).unwrap();
    assert_eq!(call.func_hash, f_int);

    let call = sema
        .resolve_call("f", vec![ExprInfo::rvalue(Type::prim(PrimitiveKind::Float))])
        .unwrap();
    assert_eq!(call.func_hash, f_double);

    let err = sema
        .resolve_call("f", vec![ExprInfo::rvalue(Type::prim(PrimitiveKind::Long))])
        .unwrap_err();
    assert!(matches!(err, CompilationError::AmbiguousOverload { .. }));
}

#[test]
fn derived_argument_prefers_derived_reference() {
    let mut sema = Sema::new();
    let base = RecordEntry::class("Base");
    let base_hash = base.type_hash;
    let base_ty = record(&mut sema, base);
    let derived_ty = record(&mut sema, RecordEntry::class("Derived").with_base(base_hash));
    let f_base = sema
        .register_function(FunctionEntry::free("f", vec![Type::reference_to(base_ty.clone())], Type::void()))
        .unwrap();
    let f_derived = sema
        .register_function(FunctionEntry::free("f", vec![Type::reference_to(derived_ty.clone())], Type::void()))
        .unwrap();

    let call = sema.resolve_call("f", vec![ExprInfo::lvalue(derived_ty)]).unwrap();
    assert_eq!(call.func_hash, f_derived);
    let call = sema.resolve_call("f", vec![ExprInfo::lvalue(base_ty)]).unwrap();
    assert_eq!(call.func_hash, f_base);
}

#[test]
fn every_viable_candidate_converts_every_argument() {
    let mut sema = Sema::new();
    let mut candidates = vec![
        sema.register_function(FunctionEntry::free("g", vec![Type::int(), Type::int()], Type::void()))
            .unwrap(),
        sema.register_function(FunctionEntry::free("g", vec![Type::double(), Type::int()], Type::void()))
            .unwrap(),
        sema.register_function(FunctionEntry::free("g", vec![Type::int()], Type::void()).variadic())
            .unwrap(),
    ];
    candidates.push(
        sema.register_function(FunctionEntry::free("g", vec![Type::pointer_to(Type::int()), Type::int()], Type::void()))
            .unwrap(),
    );

    let args = vec![ExprInfo::rvalue(Type::prim(PrimitiveKind::Long)), ExprInfo::rvalue(Type::int())];
    let req = OverloadRequest::new("g", candidates, args.clone());
    let survivors = match resolve(sema.context_mut(), &req) {
        Resolution::Unique(c) => vec![c],
        Resolution::Ambiguous(cs) => cs,
        Resolution::NoMatch => Vec::new(),
    };
    assert!(!survivors.is_empty());
    for candidate in survivors {
        assert_eq!(candidate.argument_conversions().len(), args.len());
        assert!(!candidate.function.params[0].ty.is_pointer());
    }
}

#[test]
fn member_call_and_operators() {
    let mut sema = Sema::new();
    let counter = RecordEntry::class("Counter");
    let rec = counter.as_record_type();
    let ty = record(&mut sema, counter);
    let get = sema
        .register_function(FunctionEntry::method(rec.clone(), "get", vec![], Type::int()))
        .unwrap();
    let get_const = sema
        .register_function(FunctionEntry::method(rec.clone(), "get", vec![], Type::int()).const_method())
        .unwrap();
    let plus = sema
        .register_function(FunctionEntry::member_operator(rec, "+", vec![Type::int()], ty.clone()))
        .unwrap();

    let call = sema.resolve_method_call(ExprInfo::lvalue(ty.clone()), "get", vec![]).unwrap();
    assert_eq!(call.func_hash, get);
    let call = sema
        .resolve_method_call(ExprInfo::lvalue(ty.clone().with_const()), "get", vec![])
        .unwrap();
    assert_eq!(call.func_hash, get_const);

    let call = sema
        .resolve_operator(OperatorKind::Add, &[ExprInfo::lvalue(ty), ExprInfo::rvalue(Type::int())])
        .unwrap();
    assert_eq!(call.func_hash, plus);

    let call = sema
        .resolve_operator(
            OperatorKind::Less,
            &[ExprInfo::rvalue(Type::prim(PrimitiveKind::Char)), ExprInfo::rvalue(Type::double())],
        )
        .unwrap();
    assert_eq!(call.return_type, Type::bool());
    assert_eq!(call.param_types, vec![Type::int(), Type::double()]);
}

#[test]
fn function_template_competes_with_plain_function() {
    let mut sema = Sema::new();
    let owner = TypeHash::from_template("max");
    let t = TemplateParam::type_param(owner, 0, "T");
    let generic = sema
        .register_function(FunctionEntry::free("max", vec![t.as_type(), t.as_type()], t.as_type()).templated(owner))
        .unwrap();
    sema.register_template(TemplateEntry::function("max", vec![t], generic))
        .unwrap();
    let plain = sema
        .register_function(FunctionEntry::free("max", vec![Type::int(), Type::int()], Type::int()))
        .unwrap();

    let ints = vec![ExprInfo::rvalue(Type::int()), ExprInfo::rvalue(Type::int())];
    assert_eq!(sema.resolve_call("max", ints).unwrap().func_hash, plain);

    let doubles = vec![ExprInfo::rvalue(Type::double()), ExprInfo::rvalue(Type::double())];
    let call = sema.resolve_call("max", doubles).unwrap();
    assert_eq!(call.return_type, Type::double());
    let instance = sema.registry().get_function(call.func_hash).unwrap();
    assert_eq!(instance.name, "max<double>");

    // T deduced as both int and double: only the plain function remains
    let mixed = vec![ExprInfo::rvalue(Type::int()), ExprInfo::rvalue(Type::double())];
    assert_eq!(sema.resolve_call("max", mixed).unwrap().func_hash, plain);
}

// =============================================================================
// Templates
// =============================================================================

#[test]
fn pointer_partial_specialization_is_chosen() {
    let mut sema = Sema::new();
    let owner = TypeHash::from_template("Box");
    let primary = TemplateEntry::class("Box", vec![TemplateParam::type_param(owner, 0, "T")]);
    let spec_owner = PartialSpecialization::hash_for("Box", "<T*>");
    let u = TemplateParam::type_param(spec_owner, 0, "T");
    let spec = PartialSpecialization::new("Box", vec![u.clone()], vec![TemplateArg::Type(Type::pointer_to(u.as_type()))]);
    let spec_hash = spec.hash;
    sema.register_template(primary.with_specialization(spec)).unwrap();

    let inst = sema
        .instantiate_class("Box", vec![TemplateArg::Type(Type::pointer_to(Type::int()))])
        .unwrap();
    assert_eq!(inst.specialization, Some(spec_hash));
    assert_eq!(inst.state, InstanceState::Defined);
    assert!(sema.registry().record_by_name("Box<int*>").is_some());

    let inst = sema.instantiate_class("Box", vec![TemplateArg::Type(Type::int())]).unwrap();
    assert_eq!(inst.specialization, None);
}

#[test]
fn repeated_instantiation_hits_the_cache() {
    let mut sema = Sema::new();
    let owner = TypeHash::from_template("Box");
    sema.register_template(TemplateEntry::class("Box", vec![TemplateParam::type_param(owner, 0, "T")]))
        .unwrap();

    let first = sema.instantiate_class("Box", vec![TemplateArg::Type(Type::int())]).unwrap();
    let records = sema.registry().record_count();
    let second = sema.instantiate_class("Box", vec![TemplateArg::Type(Type::int())]).unwrap();
    assert_eq!(first, second);
    assert_eq!(sema.registry().record_count(), records);
    assert_eq!(sema.context().cache.instance_count(), 1);
}

#[test]
fn unbounded_base_chain_terminates() {
    let mut sema = Sema::new();
    sema.register_template(nest_template()).unwrap();

    let err = sema.instantiate_class("Nest", vec![TemplateArg::Type(Type::int())]).unwrap_err();
    assert!(matches!(err, CompilationError::MaxInstantiationDepthExceeded { max_depth: 17, .. }));
    assert_eq!(sema.context().depth(TypeHash::from_template("Nest")), 0);
    assert!(sema.registry().record_by_name("Nest<int>").is_none());
}

/// Front end whose definition of `Box<T>` mentions `Box<T>` again.
#[derive(Default)]
struct MentionsItself {
    seen: RefCell<Vec<InstanceRef>>,
}

impl FragmentParser for MentionsItself {
    fn parse_definition(&self, ctx: &mut CompilationContext, req: &DefinitionRequest) -> ParseOutcome<()> {
        match instantiate(ctx, req.template, &InstantiationRequest::new(req.args.clone())) {
            Ok(inner) => {
                self.seen.borrow_mut().push(inner);
                ParseOutcome::Parsed(())
            }
            Err(err) => ParseOutcome::Failed(err.to_string()),
        }
    }

    fn parse_default(&self, _ctx: &mut CompilationContext, _fragment: FragmentId, _subst: &SubstitutionMap) -> ParseOutcome<TemplateArg> {
        ParseOutcome::Delayed
    }
}

#[test]
fn template_mentioning_itself_terminates() {
    let parser = Rc::new(MentionsItself::default());
    let mut sema = Sema::new().with_parser(parser.clone());
    let owner = TypeHash::from_template("Box");
    sema.register_template(TemplateEntry::class("Box", vec![TemplateParam::type_param(owner, 0, "T")]))
        .unwrap();

    let outer = sema.instantiate_class("Box", vec![TemplateArg::Type(Type::int())]).unwrap();
    assert_eq!(outer.state, InstanceState::Defined);

    let seen = parser.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].hash, outer.hash);
    assert_eq!(seen[0].state, InstanceState::Pseudo);
    assert_eq!(sema.context().cache.instance_count(), 1);
    assert_eq!(sema.context().depth(owner), 0);
}

#[test]
fn nesting_depth_against_the_bound() {
    // Nest<int> needs 20 nested instances before reaching the explicitly
    // declared Nest<int********************>.
    let setup = |config: Config| {
        let mut sema = Sema::with_config(config);
        let tpl = nest_template();
        let leaf_args = vec![TemplateArg::Type(int_ptr(20))];
        let leaf = tpl.instance_record(leaf_args.clone());
        let entry = RecordEntry::instance(
            leaf.name.to_string(),
            leaf.hash,
            sema::sema_core::InstanceOf {
                template: tpl.template_hash,
                args: leaf_args,
            },
        );
        sema.register_template(tpl).unwrap();
        sema.register_record(entry).unwrap();
        sema
    };

    let mut bounded = setup(Config::default());
    let err = bounded
        .instantiate_class("Nest", vec![TemplateArg::Type(Type::int())])
        .unwrap_err();
    assert!(matches!(err, CompilationError::MaxInstantiationDepthExceeded { max_depth: 17, .. }));

    let mut relaxed = setup(Config::default().with_max_instantiation_depth(25));
    let inst = relaxed
        .instantiate_class("Nest", vec![TemplateArg::Type(Type::int())])
        .unwrap();
    assert!(inst.is_defined());
    let nest_int = relaxed.registry().get_record(inst.hash).unwrap();
    assert_eq!(nest_int.bases.len(), 1);
    assert!(relaxed.registry().is_base_of(
        relaxed.registry().record_by_name("Nest<int********************>").unwrap().type_hash,
        inst.hash,
    ));
}
