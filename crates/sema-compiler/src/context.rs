//! CompilationContext - unified context for resolution and instantiation.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use sema_core::{CompilationError, Config, Diagnostics, PrimitiveKind, Type, TypeHash};
use sema_registry::SymbolRegistry;

use crate::template::{FragmentParser, NullFragmentParser, TemplateInstanceCache};

/// Everything the engine reads and mutates during one compilation pass.
///
/// The context is the single owner of the instance cache and the depth
/// counters, so there is no hidden global state.
pub struct CompilationContext {
    /// Records, functions and templates, including registered instances.
    pub registry: SymbolRegistry,
    /// Known template instances.
    pub cache: TemplateInstanceCache,
    pub config: Config,
    pub diagnostics: Diagnostics,
    /// Nested instantiation depth, per template.
    depth: FxHashMap<TypeHash, u32>,
    parser: Rc<dyn FragmentParser>,
}

impl CompilationContext {
    pub fn new(registry: SymbolRegistry, config: Config) -> Self {
        Self {
            registry,
            cache: TemplateInstanceCache::new(),
            config,
            diagnostics: Diagnostics::new(),
            depth: FxHashMap::default(),
            parser: Rc::new(NullFragmentParser),
        }
    }

    /// Install the fragment parser used to build instance definitions.
    pub fn with_parser(mut self, parser: Rc<dyn FragmentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn set_parser(&mut self, parser: Rc<dyn FragmentParser>) {
        self.parser = parser;
    }

    /// A handle to the fragment parser. Callers clone it out so the parser
    /// can receive `&mut self`.
    pub fn parser(&self) -> Rc<dyn FragmentParser> {
        Rc::clone(&self.parser)
    }

    // ==========================================================================
    // Instantiation depth
    // ==========================================================================

    /// Enter one more nested instantiation of `template`.
    ///
    /// Returns `false`, leaving the counter untouched, when the configured
    /// bound would be exceeded.
    pub fn enter_depth(&mut self, template: TypeHash) -> bool {
        let max = self.config.max_instantiation_depth;
        let counter = self.depth.entry(template).or_insert(0);
        if *counter + 1 > max {
            return false;
        }
        *counter += 1;
        true
    }

    /// Leave a nested instantiation entered with [`enter_depth`](Self::enter_depth).
    pub fn leave_depth(&mut self, template: TypeHash) {
        if let Some(counter) = self.depth.get_mut(&template) {
            *counter = counter.saturating_sub(1);
            if *counter == 0 {
                self.depth.remove(&template);
            }
        }
    }

    /// Current nesting depth of `template`.
    pub fn depth(&self, template: TypeHash) -> u32 {
        self.depth.get(&template).copied().unwrap_or(0)
    }

    // ==========================================================================
    // Type queries
    // ==========================================================================

    /// Whether `base` is a proper base class of `derived`. Both must be records.
    pub fn is_base_of(&self, base: &Type, derived: &Type) -> bool {
        match (base.record_type(), derived.record_type()) {
            (Some(b), Some(d)) => self.registry.is_base_of(b.hash, d.hash),
            _ => false,
        }
    }

    /// Like [`is_base_of`](Self::is_base_of), but the base subobject must be
    /// reachable along exactly one path.
    pub fn is_unambiguous_base_of(&self, base: &Type, derived: &Type) -> bool {
        match (base.record_type(), derived.record_type()) {
            (Some(b), Some(d)) => self.registry.is_unambiguous_base_of(b.hash, d.hash),
            _ => false,
        }
    }

    /// Underlying type of an enumeration type; `int` for anything else.
    pub fn enum_underlying(&self, ty: &Type) -> PrimitiveKind {
        match ty.enumeration_type() {
            Some(e) => self.registry.enum_underlying(e.hash),
            None => PrimitiveKind::Int,
        }
    }

    /// Whether a record type is complete.
    pub fn is_complete(&self, ty: &Type) -> bool {
        ty.record_type()
            .is_some_and(|r| self.registry.is_complete(r.hash))
    }

    /// Push `error` into the diagnostic sink with one note per entry of `notes`.
    pub fn report(&mut self, error: &CompilationError, notes: &[String]) {
        self.diagnostics.report(error, notes);
    }
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self::new(SymbolRegistry::new(), Config::default())
    }
}
