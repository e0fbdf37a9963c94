//! Session type tying the registry, the instance cache and the fragment
//! parser together.
//!
//! # Example
//!
//! ```
//! use sema::{ExprInfo, FunctionEntry, Sema, Type};
//!
//! let mut sema = Sema::new();
//! sema.register_function(FunctionEntry::free("f", vec![Type::int()], Type::void())).unwrap();
//! sema.register_function(FunctionEntry::free("f", vec![Type::double()], Type::void())).unwrap();
//!
//! let call = sema.resolve_call("f", vec![ExprInfo::rvalue(Type::int())]).unwrap();
//! assert_eq!(call.param_types, vec![Type::int()]);
//! ```

use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use sema_compiler::{
    CompilationContext, ConversionFailure, ConversionSequence, ExprInfo, FragmentParser, InstanceRef,
    InstantiationRequest, OperatorKind, OverloadMatch, OverloadRequest, convert, instantiate, resolve_call,
    resolve_operator,
};
use sema_core::{
    CompilationError, Config, ConfigError, Diagnostics, EnumEntry, FunctionEntry, RecordEntry, RegistrationError, Span,
    TemplateArg, TemplateEntry, Type, TypeHash,
};
use sema_registry::SymbolRegistry;

/// A resolution session.
///
/// Owns the [`CompilationContext`] for its whole lifetime. Every query
/// borrows it exclusively, so a session is used from one thread at a time.
#[derive(Default)]
pub struct Sema {
    ctx: CompilationContext,
}

impl Sema {
    /// Create a session with the default configuration and no front end.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            ctx: CompilationContext::new(SymbolRegistry::new(), config),
        }
    }

    /// Create a session configured from command-line style options.
    ///
    /// # Errors
    ///
    /// Returns `SemaError::Config` for unknown options or bad values.
    pub fn from_args<I, S>(args: I) -> Result<Self, SemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::with_config(Config::from_args(args)?))
    }

    /// Attach the parser that builds instance definitions.
    pub fn with_parser(mut self, parser: Rc<dyn FragmentParser>) -> Self {
        self.ctx.set_parser(parser);
        self
    }

    // === Registration ===

    pub fn register_record(&mut self, entry: RecordEntry) -> Result<TypeHash, SemaError> {
        Ok(self.ctx.registry.register_record(entry)?)
    }

    pub fn register_enum(&mut self, entry: EnumEntry) -> Result<TypeHash, SemaError> {
        Ok(self.ctx.registry.register_enum(entry)?)
    }

    pub fn register_function(&mut self, entry: FunctionEntry) -> Result<TypeHash, SemaError> {
        Ok(self.ctx.registry.register_function(entry)?)
    }

    pub fn register_template(&mut self, entry: TemplateEntry) -> Result<TypeHash, SemaError> {
        Ok(self.ctx.registry.register_template(entry)?)
    }

    // === Queries ===

    /// Resolve a call of the free function overload set `name`.
    ///
    /// # Errors
    ///
    /// `UnknownFunction` if nothing is declared under `name`, otherwise the
    /// errors of [`resolve_call`].
    pub fn resolve_call(&mut self, name: &str, args: Vec<ExprInfo>) -> Result<OverloadMatch, CompilationError> {
        let candidates = self.ctx.registry.functions_named(name).to_vec();
        if candidates.is_empty() {
            debug!(name, "no declarations for call");
            return Err(CompilationError::UnknownFunction {
                name: name.to_string(),
                span: Span::UNKNOWN,
            });
        }
        let req = OverloadRequest::new(name, candidates, args);
        resolve_call(&mut self.ctx, &req)
    }

    /// Resolve `object.name(args)`.
    pub fn resolve_method_call(
        &mut self,
        object: ExprInfo,
        name: &str,
        args: Vec<ExprInfo>,
    ) -> Result<OverloadMatch, CompilationError> {
        let record = object.value_type().record_type().map(|r| r.hash);
        let candidates = record
            .map(|r| self.ctx.registry.lookup_member(r, name))
            .unwrap_or_default();
        if candidates.is_empty() {
            return Err(CompilationError::UnknownFunction {
                name: format!("{}::{name}", object.value_type()),
                span: object.span,
            });
        }
        let req = OverloadRequest::new(name, candidates, args).with_object(object);
        resolve_call(&mut self.ctx, &req)
    }

    /// Resolve an operator expression against the free operator functions,
    /// the member operators of the first operand and the built-ins.
    pub fn resolve_operator(&mut self, op: OperatorKind, operands: &[ExprInfo]) -> Result<OverloadMatch, CompilationError> {
        let name = op.function_name();
        let mut candidates = self.ctx.registry.functions_named(&name).to_vec();
        if let Some(record) = operands.first().and_then(|o| o.value_type().record_type()).map(|r| r.hash) {
            candidates.extend(self.ctx.registry.lookup_member(record, &name));
        }
        let span = operands.first().map(|o| o.span).unwrap_or(Span::UNKNOWN);
        resolve_operator(&mut self.ctx, op, operands, &candidates, span)
    }

    /// Implicit conversion sequence from `source` to `target`.
    pub fn convert(&mut self, target: &Type, source: &ExprInfo) -> Result<ConversionSequence, ConversionFailure> {
        convert(&mut self.ctx, target, source, true)
    }

    /// Instantiate the class template `name` with `args`.
    ///
    /// # Errors
    ///
    /// `NotATemplate` if `name` is not a registered template, otherwise the
    /// errors of [`instantiate`].
    pub fn instantiate_class(&mut self, name: &str, args: Vec<TemplateArg>) -> Result<InstanceRef, CompilationError> {
        let template = self
            .ctx
            .registry
            .template_by_name(name)
            .map(|t| t.template_hash)
            .ok_or_else(|| CompilationError::NotATemplate {
                name: name.to_string(),
                span: Span::UNKNOWN,
            })?;
        debug!(template = name, args = args.len(), "instantiating class template");
        instantiate(&mut self.ctx, template, &InstantiationRequest::new(args))
    }

    // === Accessors ===

    pub fn registry(&self) -> &SymbolRegistry {
        &self.ctx.registry
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.ctx.diagnostics
    }

    pub fn context(&self) -> &CompilationContext {
        &self.ctx
    }

    /// Direct access for the lower-level entry points.
    pub fn context_mut(&mut self) -> &mut CompilationContext {
        &mut self.ctx
    }
}

/// Errors of session setup and registration.
#[derive(Debug, Error)]
pub enum SemaError {
    #[error("registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Compilation(#[from] CompilationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_function() {
        let mut sema = Sema::new();
        let err = sema.resolve_call("missing", vec![]).unwrap_err();
        assert!(matches!(err, CompilationError::UnknownFunction { .. }));
    }

    #[test]
    fn options_are_parsed() {
        let sema = Sema::from_args(["--template-depth", "4", "--pseudo-instances"]).unwrap();
        assert_eq!(sema.context().config.max_instantiation_depth, 4);
        assert!(matches!(Sema::from_args(["--bogus"]), Err(SemaError::Config(_))));
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut sema = Sema::new();
        let f = FunctionEntry::free("f", vec![Type::int()], Type::void());
        sema.register_function(f.clone()).unwrap();
        assert!(matches!(sema.register_function(f), Err(SemaError::Registration(_))));
    }

    #[test]
    fn not_a_template() {
        let mut sema = Sema::new();
        let err = sema.instantiate_class("Nope", vec![]).unwrap_err();
        assert!(matches!(err, CompilationError::NotATemplate { .. }));
    }
}
