//! Template entry.
//!
//! A `TemplateEntry` owns its parameter list, the patterns instances are
//! built from, and its partial specializations. Instances themselves live in
//! the compiler's instance cache and are registered as ordinary records and
//! functions.

use std::rc::Rc;

use crate::template_param::{format_args, FragmentId};
use crate::types::{InstanceOf, RecordType};
use crate::{FunctionEntry, TemplateArg, TemplateParam, Type, TypeHash};

/// Class or function template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Class,
    Function,
}

/// A partial specialization of a class template, e.g. `Box<T*>`.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSpecialization {
    /// Identity; owner of the specialization's own parameters.
    pub hash: TypeHash,
    /// Rendered template-id (`Box<T*>`).
    pub name: String,
    pub params: Vec<TemplateParam>,
    /// One argument per primary parameter, written in terms of `params`.
    pub pattern: Vec<TemplateArg>,
    /// Base-class patterns of the specialized record.
    pub bases: Vec<Type>,
    /// Member function patterns.
    pub members: Vec<FunctionEntry>,
    /// Stored body.
    pub fragment: Option<FragmentId>,
    pub defined: bool,
}

impl PartialSpecialization {
    /// Create a specialization of `template` named `template_name` with the
    /// given parameters and argument pattern.
    pub fn new(template_name: &str, params: Vec<TemplateParam>, pattern: Vec<TemplateArg>) -> Self {
        let name = format!("{template_name}{}", format_args(&pattern));
        Self {
            hash: TypeHash::from_template(&name),
            name,
            params,
            pattern,
            bases: Vec::new(),
            members: Vec::new(),
            fragment: None,
            defined: true,
        }
    }

    /// Identity a specialization created by [`new`](Self::new) will have.
    /// Parameters must be declared with this owner.
    pub fn hash_for(template_name: &str, pattern_display: &str) -> TypeHash {
        TypeHash::from_template(&format!("{template_name}{pattern_display}"))
    }

    pub fn with_base(mut self, base: Type) -> Self {
        self.bases.push(base);
        self
    }

    pub fn with_member(mut self, member: FunctionEntry) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_fragment(mut self, fragment: FragmentId) -> Self {
        self.fragment = Some(fragment);
        self
    }

    pub fn declared_only(mut self) -> Self {
        self.defined = false;
        self
    }
}

/// Symbol table entry for a class or function template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateEntry {
    pub name: String,
    pub template_hash: TypeHash,
    pub kind: TemplateKind,
    pub params: Vec<TemplateParam>,

    // === Class Templates ===
    /// Base-class patterns.
    pub bases: Vec<Type>,
    /// Member function patterns, owned by [`injected_record`](Self::injected_record).
    pub members: Vec<FunctionEntry>,
    pub specializations: Vec<PartialSpecialization>,

    // === Function Templates ===
    /// The generic signature, registered as a function with `template` set.
    pub function: Option<TypeHash>,

    /// Stored body, re-parsed for each instance.
    pub fragment: Option<FragmentId>,
    /// Whether the primary template is defined (not just declared).
    pub defined: bool,
}

impl TemplateEntry {
    fn new(name: String, kind: TemplateKind, params: Vec<TemplateParam>) -> Self {
        Self {
            template_hash: TypeHash::from_template(&name),
            name,
            kind,
            params,
            bases: Vec::new(),
            members: Vec::new(),
            specializations: Vec::new(),
            function: None,
            fragment: None,
            defined: true,
        }
    }

    /// A class template. Parameters must be owned by
    /// `TypeHash::from_template(name)`.
    pub fn class(name: impl Into<String>, params: Vec<TemplateParam>) -> Self {
        Self::new(name.into(), TemplateKind::Class, params)
    }

    /// A function template whose generic signature is `function`.
    pub fn function(name: impl Into<String>, params: Vec<TemplateParam>, function: TypeHash) -> Self {
        Self {
            function: Some(function),
            ..Self::new(name.into(), TemplateKind::Function, params)
        }
    }

    // === Builder Methods ===

    pub fn with_base(mut self, base: Type) -> Self {
        self.bases.push(base);
        self
    }

    pub fn with_member(mut self, member: FunctionEntry) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_specialization(mut self, spec: PartialSpecialization) -> Self {
        self.specializations.push(spec);
        self
    }

    pub fn with_fragment(mut self, fragment: FragmentId) -> Self {
        self.fragment = Some(fragment);
        self
    }

    pub fn declared_only(mut self) -> Self {
        self.defined = false;
        self
    }

    // === Queries ===

    pub fn is_class(&self) -> bool {
        self.kind == TemplateKind::Class
    }

    pub fn is_function(&self) -> bool {
        self.kind == TemplateKind::Function
    }

    /// Rendered template-id for an argument list.
    pub fn display_instance(&self, args: &[TemplateArg]) -> String {
        format!("{}{}", self.name, format_args(args))
    }

    /// Identity of the instance for `args`.
    pub fn instance_hash(&self, args: &[TemplateArg]) -> TypeHash {
        let hashes: Vec<TypeHash> = args.iter().map(TemplateArg::type_hash).collect();
        TypeHash::from_template_instance(self.template_hash, &hashes)
    }

    /// Record type of the instance for `args`.
    pub fn instance_record(&self, args: Vec<TemplateArg>) -> RecordType {
        RecordType {
            hash: self.instance_hash(&args),
            name: self.display_instance(&args).into(),
            instance_of: Some(Rc::new(InstanceOf {
                template: self.template_hash,
                args,
            })),
        }
    }

    /// The record named inside the template itself, e.g. `Box<T>`.
    pub fn injected_record(&self) -> RecordType {
        self.instance_record(self.params.iter().map(TemplateParam::as_arg).collect())
    }

    pub fn specialization(&self, hash: TypeHash) -> Option<&PartialSpecialization> {
        self.specializations.iter().find(|s| s.hash == hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_template_identity() {
        let hash = TypeHash::from_template("Box");
        let t = TemplateParam::type_param(hash, 0, "T");
        let tpl = TemplateEntry::class("Box", vec![t]);
        assert_eq!(tpl.template_hash, hash);
        assert!(tpl.is_class());

        let a = tpl.instance_record(vec![Type::int().into()]);
        let b = tpl.instance_record(vec![Type::int().into()]);
        assert_eq!(a, b);
        assert_eq!(&*a.name, "Box<int>");
        assert!(a.is_instance_of(hash));
        assert_ne!(a.hash, tpl.instance_hash(&[Type::double().into()]));
    }

    #[test]
    fn injected_record_is_dependent() {
        let hash = TypeHash::from_template("Box");
        let tpl = TemplateEntry::class("Box", vec![TemplateParam::type_param(hash, 0, "T")]);
        let injected = Type::Record(tpl.injected_record());
        assert!(injected.is_dependent());
        assert_eq!(injected.to_string(), "Box<T>");
    }

    #[test]
    fn partial_specialization_identity() {
        let owner = PartialSpecialization::hash_for("Box", "<T*>");
        let t = TemplateParam::type_param(owner, 0, "T");
        let spec = PartialSpecialization::new("Box", vec![t.clone()], vec![Type::pointer_to(t.as_type()).into()]);
        assert_eq!(spec.name, "Box<T*>");
        assert_eq!(spec.hash, owner);

        let tpl = TemplateEntry::class("Box", vec![TemplateParam::type_param(TypeHash::from_template("Box"), 0, "T")])
            .with_specialization(spec);
        assert!(tpl.specialization(owner).is_some());
    }
}
