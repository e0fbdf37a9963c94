//! SymbolRegistry - unified record, function and template storage.
//!
//! This module provides [`SymbolRegistry`], the symbol table consumed by the
//! resolution engine. It provides O(1) lookup by hash for records, enums,
//! functions and templates, plus the class hierarchy.
//!
//! # Storage Model
//!
//! - **Records/Enums**: stored by `TypeHash`, with a name index
//! - **Functions**: all callables (free, members, constructors, conversions,
//!   built-ins) stored in a single `functions` map. Records reference their
//!   members by hash.
//! - **Templates**: stored by template hash. Instances of class and function
//!   templates are registered as ordinary records and functions.
//!
//! # Thread Safety
//!
//! `SymbolRegistry` is **not thread-safe**. It is exclusively owned by the
//! compilation context for the duration of a run.
//!
//! # Example
//!
//! ```
//! use sema_registry::SymbolRegistry;
//! use sema_core::RecordEntry;
//!
//! let mut registry = SymbolRegistry::new();
//! let base = registry.register_record(RecordEntry::class("Base")).unwrap();
//! let derived = registry
//!     .register_record(RecordEntry::class("Derived").with_base(base))
//!     .unwrap();
//! assert!(registry.is_base_of(base, derived));
//! ```

use rustc_hash::FxHashMap;

use sema_core::{
    EnumEntry, FunctionEntry, FunctionKind, PrimitiveKind, RecordEntry, RegistrationError,
    TemplateEntry, Type, TypeHash,
};

use crate::class_graph::ClassGraph;

/// Symbol table for records, enums, functions and templates.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    records: FxHashMap<TypeHash, RecordEntry>,
    records_by_name: FxHashMap<String, TypeHash>,

    enums: FxHashMap<TypeHash, EnumEntry>,

    /// Every callable by hash.
    functions: FxHashMap<TypeHash, FunctionEntry>,
    /// Non-member overload sets by name, in registration order.
    functions_by_name: FxHashMap<String, Vec<TypeHash>>,

    templates: FxHashMap<TypeHash, TemplateEntry>,
    templates_by_name: FxHashMap<String, TypeHash>,

    hierarchy: ClassGraph,
}

impl SymbolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a record. Its bases must already be registered.
    pub fn register_record(&mut self, entry: RecordEntry) -> Result<TypeHash, RegistrationError> {
        let hash = entry.type_hash;
        if self.records.contains_key(&hash) {
            return Err(RegistrationError::Duplicate {
                kind: "record",
                name: entry.name,
            });
        }
        if entry.bases.iter().any(|b| !self.records.contains_key(b)) {
            return Err(RegistrationError::UnknownBase { record: entry.name });
        }

        self.hierarchy.ensure_node(hash);
        for &base in &entry.bases {
            if let Err(e) = self.hierarchy.add_base(hash, base, &entry.name) {
                self.hierarchy.remove(hash);
                return Err(e);
            }
        }

        self.records_by_name.insert(entry.name.clone(), hash);
        self.records.insert(hash, entry);
        Ok(hash)
    }

    pub fn register_enum(&mut self, entry: EnumEntry) -> Result<TypeHash, RegistrationError> {
        let hash = entry.type_hash;
        if self.enums.contains_key(&hash) {
            return Err(RegistrationError::Duplicate {
                kind: "enum",
                name: entry.name,
            });
        }
        self.enums.insert(hash, entry);
        Ok(hash)
    }

    /// Register a function.
    ///
    /// Members are linked into their owner's constructor, conversion or
    /// method list; non-member user functions join the overload set for
    /// their name. Built-in candidates are only reachable by hash.
    pub fn register_function(&mut self, entry: FunctionEntry) -> Result<TypeHash, RegistrationError> {
        let hash = entry.func_hash;
        if self.functions.contains_key(&hash) {
            return Err(RegistrationError::Duplicate {
                kind: "function",
                name: entry.to_string(),
            });
        }

        match &entry.owner {
            Some(owner) => {
                let record = self
                    .records
                    .get_mut(&owner.hash)
                    .ok_or_else(|| RegistrationError::UnknownOwner {
                        name: entry.name.clone(),
                    })?;
                match entry.kind {
                    FunctionKind::Constructor => record.constructors.push(hash),
                    FunctionKind::Conversion => record.conversions.push(hash),
                    _ => record.methods.push(hash),
                }
            }
            None if entry.kind != FunctionKind::Builtin => {
                self.functions_by_name
                    .entry(entry.name.clone())
                    .or_default()
                    .push(hash);
            }
            None => {}
        }

        self.functions.insert(hash, entry);
        Ok(hash)
    }

    pub fn register_template(&mut self, entry: TemplateEntry) -> Result<TypeHash, RegistrationError> {
        let hash = entry.template_hash;
        if self.templates.contains_key(&hash) {
            return Err(RegistrationError::Duplicate {
                kind: "template",
                name: entry.name,
            });
        }
        self.templates_by_name.insert(entry.name.clone(), hash);
        self.templates.insert(hash, entry);
        Ok(hash)
    }

    // ==========================================================================
    // Removal (instance rollback)
    // ==========================================================================

    /// Remove a record together with its member functions.
    pub fn remove_record(&mut self, hash: TypeHash) -> Option<RecordEntry> {
        let entry = self.records.remove(&hash)?;
        for member in entry
            .constructors
            .iter()
            .chain(&entry.conversions)
            .chain(&entry.methods)
        {
            self.functions.remove(member);
        }
        if self.records_by_name.get(&entry.name) == Some(&hash) {
            self.records_by_name.remove(&entry.name);
        }
        self.hierarchy.remove(hash);
        Some(entry)
    }

    /// Remove a function and unlink it from its owner or overload set.
    pub fn remove_function(&mut self, hash: TypeHash) -> Option<FunctionEntry> {
        let entry = self.functions.remove(&hash)?;
        match &entry.owner {
            Some(owner) => {
                if let Some(record) = self.records.get_mut(&owner.hash) {
                    record.constructors.retain(|h| *h != hash);
                    record.conversions.retain(|h| *h != hash);
                    record.methods.retain(|h| *h != hash);
                }
            }
            None => {
                if let Some(set) = self.functions_by_name.get_mut(&entry.name) {
                    set.retain(|h| *h != hash);
                }
            }
        }
        Some(entry)
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    pub fn get_record(&self, hash: TypeHash) -> Option<&RecordEntry> {
        self.records.get(&hash)
    }

    pub fn get_record_mut(&mut self, hash: TypeHash) -> Option<&mut RecordEntry> {
        self.records.get_mut(&hash)
    }

    pub fn record_by_name(&self, name: &str) -> Option<&RecordEntry> {
        self.records_by_name
            .get(name)
            .and_then(|h| self.records.get(h))
    }

    pub fn contains_record(&self, hash: TypeHash) -> bool {
        self.records.contains_key(&hash)
    }

    /// Whether the record is registered and complete.
    pub fn is_complete(&self, hash: TypeHash) -> bool {
        self.records.get(&hash).is_some_and(|r| r.defined)
    }

    pub fn get_enum(&self, hash: TypeHash) -> Option<&EnumEntry> {
        self.enums.get(&hash)
    }

    /// Underlying type of an enumeration; `int` for unregistered ones.
    pub fn enum_underlying(&self, hash: TypeHash) -> PrimitiveKind {
        self.enums
            .get(&hash)
            .map(|e| e.underlying)
            .unwrap_or(PrimitiveKind::Int)
    }

    pub fn get_function(&self, hash: TypeHash) -> Option<&FunctionEntry> {
        self.functions.get(&hash)
    }

    pub fn get_function_mut(&mut self, hash: TypeHash) -> Option<&mut FunctionEntry> {
        self.functions.get_mut(&hash)
    }

    pub fn contains_function(&self, hash: TypeHash) -> bool {
        self.functions.contains_key(&hash)
    }

    /// Non-member overload set for `name`.
    pub fn functions_named(&self, name: &str) -> &[TypeHash] {
        self.functions_by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get_template(&self, hash: TypeHash) -> Option<&TemplateEntry> {
        self.templates.get(&hash)
    }

    pub fn get_template_mut(&mut self, hash: TypeHash) -> Option<&mut TemplateEntry> {
        self.templates.get_mut(&hash)
    }

    pub fn template_by_name(&self, name: &str) -> Option<&TemplateEntry> {
        self.templates_by_name
            .get(name)
            .and_then(|h| self.templates.get(h))
    }

    // ==========================================================================
    // Members
    // ==========================================================================

    /// Constructors of a record.
    pub fn constructors_of(&self, record: TypeHash) -> Vec<TypeHash> {
        self.records
            .get(&record)
            .map(|r| r.constructors.clone())
            .unwrap_or_default()
    }

    /// Conversion functions declared directly in a record.
    pub fn conversions_of(&self, record: TypeHash) -> Vec<TypeHash> {
        self.records
            .get(&record)
            .map(|r| r.conversions.clone())
            .unwrap_or_default()
    }

    /// Member functions named `name`, found in `record` or, if it declares
    /// none, in the nearest bases that do.
    pub fn lookup_member(&self, record: TypeHash, name: &str) -> Vec<TypeHash> {
        let declared_in = |hash: TypeHash| -> Vec<TypeHash> {
            self.records
                .get(&hash)
                .map(|r| {
                    r.methods
                        .iter()
                        .copied()
                        .filter(|m| self.functions.get(m).is_some_and(|f| f.name == name))
                        .collect()
                })
                .unwrap_or_default()
        };

        let own = declared_in(record);
        if !own.is_empty() {
            return own;
        }
        let mut found = Vec::new();
        let mut frontier = self.direct_bases(record);
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for base in frontier {
                let members = declared_in(base);
                if members.is_empty() {
                    next.extend(self.direct_bases(base));
                } else {
                    found.extend(members);
                }
            }
            if !found.is_empty() {
                found.dedup();
                return found;
            }
            frontier = next;
        }
        found
    }

    // ==========================================================================
    // Hierarchy
    // ==========================================================================

    /// Direct bases in declaration order.
    pub fn direct_bases(&self, record: TypeHash) -> Vec<TypeHash> {
        self.records
            .get(&record)
            .map(|r| r.bases.clone())
            .unwrap_or_default()
    }

    /// All proper bases, nearest first.
    pub fn all_bases(&self, record: TypeHash) -> Vec<TypeHash> {
        self.hierarchy.all_bases(record)
    }

    /// Whether `base` is a proper base class of `derived`.
    pub fn is_base_of(&self, base: TypeHash, derived: TypeHash) -> bool {
        self.hierarchy.is_base_of(base, derived)
    }

    /// Whether `base` is a proper base class of `derived` reachable along
    /// exactly one path.
    pub fn is_unambiguous_base_of(&self, base: TypeHash, derived: TypeHash) -> bool {
        self.hierarchy.path_count(derived, base) == 1
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    /// The record as a type descriptor.
    pub fn record_type(&self, hash: TypeHash) -> Option<Type> {
        self.records.get(&hash).map(RecordEntry::as_type)
    }

    // ==========================================================================
    // Statistics
    // ==========================================================================

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }
}
