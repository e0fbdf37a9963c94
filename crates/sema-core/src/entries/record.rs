//! Record entry.
//!
//! This module provides `RecordEntry` for classes, structs and unions,
//! including template instances (like `Box<int*>`).

use std::rc::Rc;

use crate::types::{InstanceOf, RecordType};
use crate::{Type, TypeHash};

/// Class key of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordKind {
    #[default]
    Class,
    Struct,
    Union,
}

/// Symbol table entry for a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEntry {
    /// Rendered name (`Box<int*>` for instances).
    pub name: String,
    /// Identity.
    pub type_hash: TypeHash,
    pub kind: RecordKind,

    // === Inheritance ===
    /// Direct base classes, in declaration order.
    pub bases: Vec<TypeHash>,

    // === Members ===
    /// Constructors (function hashes).
    pub constructors: Vec<TypeHash>,
    /// Conversion functions declared in this record (function hashes).
    pub conversions: Vec<TypeHash>,
    /// Other member functions, including member operators.
    pub methods: Vec<TypeHash>,

    // === Template Info ===
    /// Template this record instantiates, with its arguments.
    pub instance_of: Option<Rc<InstanceOf>>,

    /// Whether the record is complete (defined, not just declared).
    pub defined: bool,
}

impl RecordEntry {
    /// Create a new, defined record.
    pub fn new(name: impl Into<String>, kind: RecordKind) -> Self {
        let name = name.into();
        Self {
            type_hash: TypeHash::from_name(&name),
            name,
            kind,
            bases: Vec::new(),
            constructors: Vec::new(),
            conversions: Vec::new(),
            methods: Vec::new(),
            instance_of: None,
            defined: true,
        }
    }

    /// Create a `class` record.
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, RecordKind::Class)
    }

    /// Create a template instance record named `name` with the given identity.
    pub fn instance(name: impl Into<String>, type_hash: TypeHash, instance_of: InstanceOf) -> Self {
        Self {
            type_hash,
            instance_of: Some(Rc::new(instance_of)),
            defined: false,
            ..Self::new(name, RecordKind::Class)
        }
    }

    // === Builder Methods ===

    /// Add a direct base class.
    pub fn with_base(mut self, base: TypeHash) -> Self {
        self.bases.push(base);
        self
    }

    /// Mark the record as only declared.
    pub fn declared_only(mut self) -> Self {
        self.defined = false;
        self
    }

    pub fn is_union(&self) -> bool {
        self.kind == RecordKind::Union
    }

    /// The record as a type descriptor.
    pub fn as_record_type(&self) -> RecordType {
        RecordType {
            hash: self.type_hash,
            name: self.name.as_str().into(),
            instance_of: self.instance_of.clone(),
        }
    }

    pub fn as_type(&self) -> Type {
        Type::Record(self.as_record_type())
    }
}
