//! Template instantiation logic.
//!
//! An instance is first created as a pseudo-instance: a registered record
//! with substituted bases, or a registered function with the substituted
//! signature. Building the definition is then left to the
//! [`FragmentParser`](super::FragmentParser). A failed definition is rolled
//! back out of the registry and the cache.

use sema_core::{
    CompilationError, FragmentId, FunctionEntry, FunctionInstance, InstanceOf, ParamDefault, RecordEntry, RecordType,
    Span, TemplateArg, TemplateEntry, Type, TypeHash, arguments_of,
};
use tracing::debug;

use super::cache::{InstanceRef, InstanceState};
use super::deduction::{deduce, generic_function};
use super::specialization::{Chosen, choose_specialization, pattern_bindings};
use super::substitution::{SubstitutionMap, substitute_function, substitute_type};
use super::{DefinitionRequest, ParseOutcome};
use crate::context::CompilationContext;
use crate::expr_info::ExprInfo;

/// How an instance is requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstantiationRequest {
    /// Template arguments written at the point of use.
    pub explicit_args: Vec<TemplateArg>,
    /// Call arguments, for deducing a function template.
    pub call_args: Option<Vec<ExprInfo>>,
    pub point_of_use: Span,
    /// Only the declaration is needed; do not build the definition.
    pub declaration_only: bool,
}

impl InstantiationRequest {
    pub fn new(explicit_args: Vec<TemplateArg>) -> Self {
        Self {
            explicit_args,
            ..Self::default()
        }
    }

    pub fn with_call_args(mut self, args: Vec<ExprInfo>) -> Self {
        self.call_args = Some(args);
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.point_of_use = span;
        self
    }

    pub fn declaration_only(mut self) -> Self {
        self.declaration_only = true;
        self
    }
}

/// Instantiate a template.
///
/// Deduces the argument list, chooses the primary template or a partial
/// specialization, and returns the cached instance or creates a new one.
///
/// # Arguments
///
/// * `template` - Hash of the class or function template
/// * `req` - Arguments, point of use and whether a declaration suffices
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn instantiate(
    ctx: &mut CompilationContext,
    template: TypeHash,
    req: &InstantiationRequest,
) -> Result<InstanceRef, CompilationError> {
    let span = req.point_of_use;
    let tpl = ctx
        .registry
        .get_template(template)
        .cloned()
        .ok_or_else(|| CompilationError::NotATemplate {
            name: template.to_string(),
            span,
        })?;

    let deduced = deduce(ctx, template, &req.explicit_args, req.call_args.as_deref(), span)
        .map_err(|e| e.into_error(&tpl.name, span))?;
    let args = arguments_of(&deduced);

    if tpl.is_class() {
        instantiate_class(ctx, &tpl, args, req.declaration_only, span)
    } else {
        instantiate_function(ctx, &tpl, args, req.declaration_only, span)
    }
}

// ==========================================================================
// Class templates
// ==========================================================================

fn instantiate_class(
    ctx: &mut CompilationContext,
    tpl: &TemplateEntry,
    args: Vec<TemplateArg>,
    declaration_only: bool,
    span: Span,
) -> Result<InstanceRef, CompilationError> {
    // 1. Choose the entity
    let chosen = choose_specialization(ctx, tpl, &args, span)?;
    let entity = chosen.hash().unwrap_or(tpl.template_hash);

    // 2. Check the cache
    if let Some(existing) = ctx.cache.get_instance(tpl.template_hash, entity, &args).cloned() {
        debug!(instance = %tpl.display_instance(&args), state = ?existing.state, "template instance cache hit");
        if existing.is_defined() || declaration_only || ctx.cache.is_in_progress(existing.hash) {
            return Ok(existing);
        }
        return upgrade_class(ctx, tpl, existing, span);
    }

    // 3. A record registered up front is an explicit specialization
    let record = tpl.instance_record(args.clone());
    if ctx.registry.contains_record(record.hash) {
        let instance = InstanceRef {
            hash: record.hash,
            template: tpl.template_hash,
            specialization: chosen.hash(),
            args,
            state: InstanceState::Defined,
            delayed: false,
        };
        ctx.cache.cache_instance(instance.clone());
        return Ok(instance);
    }
    debug!(instance = %record.name, "template instance cache miss");

    // 4. Create within the depth bound
    if !ctx.enter_depth(tpl.template_hash) {
        debug!(template = %tpl.name, max_depth = ctx.config.max_instantiation_depth, "instantiation depth exceeded");
        return Err(CompilationError::MaxInstantiationDepthExceeded {
            template: record.name.to_string(),
            max_depth: ctx.config.max_instantiation_depth,
            span,
        });
    }
    let result = create_class(ctx, tpl, chosen, record, args, declaration_only, span);
    ctx.leave_depth(tpl.template_hash);
    result
}

fn create_class(
    ctx: &mut CompilationContext,
    tpl: &TemplateEntry,
    chosen: Chosen,
    record: RecordType,
    args: Vec<TemplateArg>,
    declaration_only: bool,
    span: Span,
) -> Result<InstanceRef, CompilationError> {
    let specialization = chosen.hash();
    let map = match chosen {
        Chosen::Primary => primary_bindings(tpl, &args),
        Chosen::Specialization { bindings, .. } => bindings,
    };
    let patterns = match specialization.and_then(|h| tpl.specialization(h)) {
        Some(spec) => &spec.bases,
        None => &tpl.bases,
    };

    // Bases are instantiated completely before the derived instance exists
    let mut entry = RecordEntry::instance(
        record.name.to_string(),
        record.hash,
        InstanceOf {
            template: tpl.template_hash,
            args: args.clone(),
        },
    );
    for pattern in patterns {
        let base = substitute_type(pattern, &map);
        let hash = base_instance(ctx, &base, &record, span)?;
        entry = entry.with_base(hash);
    }

    ctx.registry
        .register_record(entry)
        .map_err(|e| CompilationError::InstantiationFailed {
            name: record.name.to_string(),
            reason: e.to_string(),
            span,
        })?;

    let instance = InstanceRef {
        hash: record.hash,
        template: tpl.template_hash,
        specialization,
        args,
        state: InstanceState::Pseudo,
        delayed: false,
    };
    ctx.cache.cache_instance(instance.clone());
    debug!(instance = %record.name, "pseudo instance created");

    if declaration_only || !ctx.config.builds_definitions() {
        return Ok(instance);
    }
    define_class(ctx, tpl, instance, &map, span)
}

/// Resolve a substituted base type to a registered record, instantiating
/// it if it names a template instance.
fn base_instance(
    ctx: &mut CompilationContext,
    base: &Type,
    derived: &RecordType,
    span: Span,
) -> Result<TypeHash, CompilationError> {
    let failed = |reason: String| CompilationError::InstantiationFailed {
        name: derived.name.to_string(),
        reason,
        span,
    };
    let Some(record) = base.unqualified().record_type() else {
        return Err(failed(format!("base '{base}' is not a class")));
    };
    if ctx.registry.contains_record(record.hash) {
        return Ok(record.hash);
    }
    match &record.instance_of {
        Some(inst) => {
            let req = InstantiationRequest::new(inst.args.clone()).at(span);
            instantiate(ctx, inst.template, &req).map(|i| i.hash)
        }
        None => Err(failed(format!("unknown base class '{}'", record.name))),
    }
}

/// Build the definition of a class instance.
fn define_class(
    ctx: &mut CompilationContext,
    tpl: &TemplateEntry,
    instance: InstanceRef,
    map: &SubstitutionMap,
    span: Span,
) -> Result<InstanceRef, CompilationError> {
    let spec = instance.specialization.and_then(|h| tpl.specialization(h));
    let (defined, members, fragment) = match spec {
        Some(spec) => (spec.defined, &spec.members, spec.fragment),
        None => (tpl.defined, &tpl.members, tpl.fragment),
    };
    // A declared-only template leaves its instances incomplete
    if !defined || !ctx.cache.begin(instance.hash) {
        return Ok(instance);
    }

    let Some(record) = ctx.registry.get_record(instance.hash).map(RecordEntry::as_record_type) else {
        ctx.cache.finish(instance.hash);
        return Err(CompilationError::Internal {
            message: format!("instance {} is not registered", instance.hash),
        });
    };

    for member in members {
        let function = member_instance(member, map, &record);
        if ctx.registry.contains_function(function.func_hash) {
            continue;
        }
        if let Err(e) = ctx.registry.register_function(function) {
            roll_back(ctx, &instance);
            return Err(CompilationError::InstantiationFailed {
                name: record.name.to_string(),
                reason: e.to_string(),
                span,
            });
        }
    }

    let req = DefinitionRequest {
        template: tpl.template_hash,
        entity: instance.entity(),
        instance: instance.hash,
        args: instance.args.clone(),
        substitution: map.clone(),
        fragment,
        resolve_bodies: true,
        point_of_use: span,
    };
    let outcome = build_definition(ctx, &req);
    ctx.cache.finish(instance.hash);

    match outcome {
        ParseOutcome::Parsed(()) => {
            if let Some(entry) = ctx.registry.get_record_mut(instance.hash) {
                entry.defined = true;
            }
            ctx.cache.mark_defined(instance.hash);
            debug!(instance = %record.name, "instance defined");
            Ok(InstanceRef {
                state: InstanceState::Defined,
                ..instance
            })
        }
        ParseOutcome::Failed(reason) => {
            roll_back(ctx, &instance);
            Err(CompilationError::InstantiationFailed {
                name: record.name.to_string(),
                reason,
                span,
            })
        }
        ParseOutcome::Delayed => {
            debug!(instance = %record.name, "definition delayed");
            Ok(instance)
        }
    }
}

/// A member function pattern specialized for the instance `owner`.
fn member_instance(member: &FunctionEntry, map: &SubstitutionMap, owner: &RecordType) -> FunctionEntry {
    let mut function = substitute_function(member, map);
    function.owner = Some(owner.clone());
    if function.is_constructor() {
        function.name = owner.name.to_string();
        function.return_type = Type::Record(owner.clone());
    }
    function.rehashed()
}

/// Finish a pseudo class instance that is not yet being defined.
fn upgrade_class(
    ctx: &mut CompilationContext,
    tpl: &TemplateEntry,
    instance: InstanceRef,
    span: Span,
) -> Result<InstanceRef, CompilationError> {
    if !ctx.config.builds_definitions() {
        return Ok(instance);
    }
    let map = match instance.specialization {
        Some(hash) => tpl
            .specialization(hash)
            .and_then(|spec| pattern_bindings(ctx, spec, &instance.args))
            .ok_or_else(|| CompilationError::Internal {
                message: format!(
                    "cached instance {} no longer matches its specialization",
                    tpl.display_instance(&instance.args)
                ),
            })?,
        None => primary_bindings(tpl, &instance.args),
    };
    if !ctx.enter_depth(tpl.template_hash) {
        return Err(CompilationError::MaxInstantiationDepthExceeded {
            template: tpl.display_instance(&instance.args),
            max_depth: ctx.config.max_instantiation_depth,
            span,
        });
    }
    let result = define_class(ctx, tpl, instance, &map, span);
    ctx.leave_depth(tpl.template_hash);
    result
}

/// Complete a pseudo class instance whose definition is needed now, e.g.
/// to look up its constructors. Failures are reported to the diagnostics.
pub(crate) fn complete_instance(ctx: &mut CompilationContext, record: TypeHash) {
    let Some(instance) = ctx.cache.lookup(record).cloned() else {
        return;
    };
    if !instance.is_pseudo() || ctx.cache.is_in_progress(record) {
        return;
    }
    let Some(tpl) = ctx.registry.get_template(instance.template).cloned() else {
        return;
    };
    if !tpl.is_class() {
        return;
    }
    if let Err(err) = upgrade_class(ctx, &tpl, instance, Span::UNKNOWN) {
        debug!(error = %err, "completing instance failed");
        ctx.report(&err, &[]);
    }
}

// ==========================================================================
// Function templates
// ==========================================================================

fn instantiate_function(
    ctx: &mut CompilationContext,
    tpl: &TemplateEntry,
    args: Vec<TemplateArg>,
    declaration_only: bool,
    span: Span,
) -> Result<InstanceRef, CompilationError> {
    let template = tpl.template_hash;

    if let Some(mut existing) = ctx.cache.get_instance(template, template, &args).cloned() {
        debug!(instance = %tpl.display_instance(&args), state = ?existing.state, "template instance cache hit");
        if existing.delayed {
            existing.delayed = retry_defaults(ctx, tpl, &existing, span)?;
            ctx.cache.set_delayed(existing.hash, existing.delayed);
        }
        if existing.is_defined() || declaration_only || ctx.cache.is_in_progress(existing.hash) {
            return Ok(existing);
        }
        return upgrade_function(ctx, tpl, existing, span);
    }

    let hash = tpl.instance_hash(&args);
    if ctx.registry.contains_function(hash) {
        let instance = InstanceRef {
            hash,
            template,
            specialization: None,
            args,
            state: InstanceState::Defined,
            delayed: false,
        };
        ctx.cache.cache_instance(instance.clone());
        return Ok(instance);
    }
    debug!(instance = %tpl.display_instance(&args), "template instance cache miss");

    if !ctx.enter_depth(template) {
        debug!(template = %tpl.name, max_depth = ctx.config.max_instantiation_depth, "instantiation depth exceeded");
        return Err(CompilationError::MaxInstantiationDepthExceeded {
            template: tpl.display_instance(&args),
            max_depth: ctx.config.max_instantiation_depth,
            span,
        });
    }
    let result = create_function(ctx, tpl, args, declaration_only, span);
    ctx.leave_depth(template);
    result
}

fn create_function(
    ctx: &mut CompilationContext,
    tpl: &TemplateEntry,
    args: Vec<TemplateArg>,
    declaration_only: bool,
    span: Span,
) -> Result<InstanceRef, CompilationError> {
    let name = tpl.display_instance(&args);
    let generic = generic_function(ctx, tpl).ok_or_else(|| CompilationError::UnknownFunction {
        name: tpl.name.clone(),
        span,
    })?;
    let map = primary_bindings(tpl, &args);

    let mut function = substitute_function(&generic, &map);
    function.name = name.clone();
    function.template = None;
    function.instance_of = Some(FunctionInstance {
        template: tpl.template_hash,
        args: args.clone(),
    });
    function.defined = false;
    function.func_hash = tpl.instance_hash(&args);

    let delayed = parse_defaults(ctx, &function, &map, span)?;

    let hash = ctx
        .registry
        .register_function(function)
        .map_err(|e| CompilationError::InstantiationFailed {
            name: name.clone(),
            reason: e.to_string(),
            span,
        })?;
    let instance = InstanceRef {
        hash,
        template: tpl.template_hash,
        specialization: None,
        args,
        state: InstanceState::Pseudo,
        delayed,
    };
    ctx.cache.cache_instance(instance.clone());
    debug!(instance = %name, delayed, "pseudo instance created");

    if declaration_only || !ctx.config.builds_definitions() {
        return Ok(instance);
    }
    define_function(ctx, tpl, instance, &map, span)
}

/// Parse the default argument fragments of `function` with the instance's
/// bindings. Returns whether any of them is still delayed.
fn parse_defaults(
    ctx: &mut CompilationContext,
    function: &FunctionEntry,
    map: &SubstitutionMap,
    span: Span,
) -> Result<bool, CompilationError> {
    let fragments: Vec<FragmentId> = function
        .params
        .iter()
        .filter_map(|p| match p.default {
            Some(ParamDefault::Fragment(id)) => Some(id),
            _ => None,
        })
        .collect();
    let mut delayed = false;
    for fragment in fragments {
        let parser = ctx.parser();
        match parser.parse_default(ctx, fragment, map) {
            ParseOutcome::Parsed(_) => {}
            ParseOutcome::Delayed => delayed = true,
            ParseOutcome::Failed(reason) => {
                return Err(CompilationError::InstantiationFailed {
                    name: function.name.clone(),
                    reason,
                    span,
                });
            }
        }
    }
    Ok(delayed)
}

/// Give the delayed default arguments of a cached instance another try.
fn retry_defaults(
    ctx: &mut CompilationContext,
    tpl: &TemplateEntry,
    instance: &InstanceRef,
    span: Span,
) -> Result<bool, CompilationError> {
    let Some(function) = ctx.registry.get_function(instance.hash).cloned() else {
        return Ok(false);
    };
    let map = primary_bindings(tpl, &instance.args);
    let delayed = parse_defaults(ctx, &function, &map, span)?;
    if !delayed {
        debug!(instance = %function.name, "delayed default arguments parsed");
    }
    Ok(delayed)
}

fn define_function(
    ctx: &mut CompilationContext,
    tpl: &TemplateEntry,
    instance: InstanceRef,
    map: &SubstitutionMap,
    span: Span,
) -> Result<InstanceRef, CompilationError> {
    if !tpl.defined || !ctx.cache.begin(instance.hash) {
        return Ok(instance);
    }
    let req = DefinitionRequest {
        template: tpl.template_hash,
        entity: tpl.template_hash,
        instance: instance.hash,
        args: instance.args.clone(),
        substitution: map.clone(),
        fragment: tpl.fragment,
        resolve_bodies: ctx.config.instantiate_function_bodies,
        point_of_use: span,
    };
    let outcome = build_definition(ctx, &req);
    ctx.cache.finish(instance.hash);

    let name = tpl.display_instance(&instance.args);
    match outcome {
        ParseOutcome::Parsed(()) => {
            if let Some(function) = ctx.registry.get_function_mut(instance.hash) {
                function.defined = true;
            }
            ctx.cache.mark_defined(instance.hash);
            debug!(instance = %name, "instance defined");
            Ok(InstanceRef {
                state: InstanceState::Defined,
                ..instance
            })
        }
        ParseOutcome::Failed(reason) => {
            roll_back(ctx, &instance);
            Err(CompilationError::InstantiationFailed { name, reason, span })
        }
        ParseOutcome::Delayed => {
            debug!(instance = %name, "definition delayed");
            Ok(instance)
        }
    }
}

fn upgrade_function(
    ctx: &mut CompilationContext,
    tpl: &TemplateEntry,
    instance: InstanceRef,
    span: Span,
) -> Result<InstanceRef, CompilationError> {
    if !ctx.config.builds_definitions() {
        return Ok(instance);
    }
    let map = primary_bindings(tpl, &instance.args);
    if !ctx.enter_depth(tpl.template_hash) {
        return Err(CompilationError::MaxInstantiationDepthExceeded {
            template: tpl.display_instance(&instance.args),
            max_depth: ctx.config.max_instantiation_depth,
            span,
        });
    }
    let result = define_function(ctx, tpl, instance, &map, span);
    ctx.leave_depth(tpl.template_hash);
    result
}

/// Build the definition of the function instance `function` if it is
/// still a pseudo-instance. Used once overload resolution picked it.
pub(crate) fn complete_function_instance(
    ctx: &mut CompilationContext,
    function: TypeHash,
    span: Span,
) -> Result<(), CompilationError> {
    let Some(instance) = ctx.cache.lookup(function).cloned() else {
        return Ok(());
    };
    if !instance.is_pseudo() || ctx.cache.is_in_progress(function) {
        return Ok(());
    }
    let Some(tpl) = ctx.registry.get_template(instance.template).cloned() else {
        return Ok(());
    };
    upgrade_function(ctx, &tpl, instance, span).map(|_| ())
}

/// Deduce and declare the instance of a function template for a call.
///
/// Returns `None` when deduction or substitution fails; such a template
/// is simply not a candidate.
pub(crate) fn instantiate_candidate(
    ctx: &mut CompilationContext,
    template: TypeHash,
    explicit: &[TemplateArg],
    args: &[ExprInfo],
    span: Span,
) -> Option<InstanceRef> {
    let req = InstantiationRequest {
        explicit_args: explicit.to_vec(),
        call_args: Some(args.to_vec()),
        point_of_use: span,
        declaration_only: true,
    };
    match instantiate(ctx, template, &req) {
        Ok(instance) => Some(instance),
        Err(err) => {
            debug!(%template, error = %err, "template candidate dropped");
            None
        }
    }
}

// ==========================================================================
// Helpers
// ==========================================================================

/// Bindings of the primary template's parameters.
fn primary_bindings(tpl: &TemplateEntry, args: &[TemplateArg]) -> SubstitutionMap {
    let mut map = SubstitutionMap::new();
    for (param, arg) in tpl.params.iter().zip(args) {
        map.bind(param.id, arg.clone());
    }
    map
}

fn build_definition(ctx: &mut CompilationContext, req: &DefinitionRequest) -> ParseOutcome<()> {
    let parser = ctx.parser();
    parser.parse_definition(ctx, req)
}

/// Remove a failed instance from the registry and the cache.
fn roll_back(ctx: &mut CompilationContext, instance: &InstanceRef) {
    if ctx.registry.remove_record(instance.hash).is_none() {
        ctx.registry.remove_function(instance.hash);
    }
    ctx.cache.remove(instance.hash);
    debug!(instance = %instance.hash, "instance rolled back");
}
