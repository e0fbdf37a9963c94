//! Function entry for the registry.
//!
//! A `FunctionEntry` describes every callable the engine ranks: free
//! functions, member functions, constructors, conversion functions, user
//! operator functions and the synthesized built-in operator candidates.
//! Function templates are represented by a generic entry whose signature
//! mentions template parameters; their instances are ordinary entries with
//! `instance_of` set.

use std::fmt;

use crate::template_param::FragmentId;
use crate::types::RecordType;
use crate::{Qualifiers, TemplateArg, Type, TypeHash};

/// What kind of callable an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// Non-member function.
    Free,
    /// Member function, including member operator functions.
    Method,
    Constructor,
    /// `operator T()` conversion function.
    Conversion,
    /// Non-member operator function.
    Operator,
    /// Synthesized built-in operator candidate.
    Builtin,
}

/// Default argument of a function parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    /// An already analysed default expression.
    Expr,
    /// A stored fragment that is re-parsed for template instances.
    Fragment(FragmentId),
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: Type,
    pub default: Option<ParamDefault>,
}

impl Param {
    pub fn new(ty: Type) -> Self {
        Self { ty, default: None }
    }

    pub fn with_default(ty: Type, default: ParamDefault) -> Self {
        Self {
            ty,
            default: Some(default),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Template instance details carried by a function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInstance {
    /// The function template.
    pub template: TypeHash,
    /// Instantiation arguments, in template parameter order.
    pub args: Vec<TemplateArg>,
}

/// Registry entry for a function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionEntry {
    /// Unqualified name (`f`, `operator+`, `operator int`).
    pub name: String,
    /// Identity.
    pub func_hash: TypeHash,
    pub kind: FunctionKind,
    /// Owning record for members, constructors and conversion functions.
    pub owner: Option<RecordType>,
    pub params: Vec<Param>,
    pub return_type: Type,
    /// Trailing `...`.
    pub variadic: bool,
    pub is_static: bool,
    /// Explicit constructors and conversion functions never take part in
    /// implicit conversions.
    pub is_explicit: bool,
    /// cv-qualification of a member function's implicit object.
    pub cv: Qualifiers,
    /// Set on the generic signature of a function template.
    pub template: Option<TypeHash>,
    /// Set on instances of a function template.
    pub instance_of: Option<FunctionInstance>,
    /// Whether a body has been attached.
    pub defined: bool,
}

impl FunctionEntry {
    fn with_kind(kind: FunctionKind, name: String, owner: Option<RecordType>, params: Vec<Type>, return_type: Type) -> Self {
        let mut entry = Self {
            name,
            func_hash: TypeHash::EMPTY,
            kind,
            owner,
            params: params.into_iter().map(Param::new).collect(),
            return_type,
            variadic: false,
            is_static: false,
            is_explicit: false,
            cv: Qualifiers::empty(),
            template: None,
            instance_of: None,
            defined: true,
        };
        entry.func_hash = entry.compute_hash();
        entry
    }

    /// A non-member function.
    pub fn free(name: impl Into<String>, params: Vec<Type>, return_type: Type) -> Self {
        Self::with_kind(FunctionKind::Free, name.into(), None, params, return_type)
    }

    /// A non-member operator function; `op` is the operator token (`+`, `[]`).
    pub fn operator(op: &str, params: Vec<Type>, return_type: Type) -> Self {
        Self::with_kind(FunctionKind::Operator, format!("operator{op}"), None, params, return_type)
    }

    /// A member function of `owner`.
    pub fn method(owner: RecordType, name: impl Into<String>, params: Vec<Type>, return_type: Type) -> Self {
        Self::with_kind(FunctionKind::Method, name.into(), Some(owner), params, return_type)
    }

    /// A member operator function of `owner`.
    pub fn member_operator(owner: RecordType, op: &str, params: Vec<Type>, return_type: Type) -> Self {
        Self::method(owner, format!("operator{op}"), params, return_type)
    }

    /// A constructor of `owner`.
    pub fn constructor(owner: RecordType, params: Vec<Type>) -> Self {
        let name = owner.name.to_string();
        let ret = Type::Record(owner.clone());
        Self::with_kind(FunctionKind::Constructor, name, Some(owner), params, ret)
    }

    /// A conversion function `operator target()` of `owner`.
    pub fn conversion(owner: RecordType, target: Type) -> Self {
        Self::with_kind(
            FunctionKind::Conversion,
            format!("operator {target}"),
            Some(owner),
            Vec::new(),
            target,
        )
    }

    /// A synthesized built-in operator candidate.
    pub fn builtin(op: &str, params: Vec<Type>, return_type: Type) -> Self {
        Self::with_kind(FunctionKind::Builtin, format!("operator{op}"), None, params, return_type)
    }

    fn compute_hash(&self) -> TypeHash {
        let params: Vec<TypeHash> = self.params.iter().map(|p| p.ty.type_hash()).collect();
        let owner = self.owner.as_ref().map(|o| o.hash).unwrap_or(TypeHash::EMPTY);
        match self.kind {
            FunctionKind::Free | FunctionKind::Operator => TypeHash::from_function(&self.name, &params),
            FunctionKind::Method => TypeHash::from_method(owner, &self.name, &params, self.cv.cv_bits()),
            FunctionKind::Constructor => TypeHash::from_constructor(owner, &params),
            FunctionKind::Conversion => {
                TypeHash::from_conversion(owner, self.return_type.type_hash(), self.cv.cv_bits())
            }
            FunctionKind::Builtin => TypeHash::from_builtin(&self.name, &params),
        }
    }

    // === Builder Methods ===

    /// Qualify the implicit object parameter.
    pub fn with_cv(mut self, cv: Qualifiers) -> Self {
        self.cv = cv;
        self.func_hash = self.compute_hash();
        self
    }

    pub fn const_method(self) -> Self {
        self.with_cv(Qualifiers::CONST)
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn explicit(mut self) -> Self {
        self.is_explicit = true;
        self
    }

    /// Give the trailing `count` parameters an analysed default.
    pub fn with_defaults(mut self, count: usize) -> Self {
        let start = self.params.len().saturating_sub(count);
        for param in &mut self.params[start..] {
            param.default = Some(ParamDefault::Expr);
        }
        self
    }

    /// Set the default of parameter `index`.
    pub fn with_param_default(mut self, index: usize, default: ParamDefault) -> Self {
        if let Some(param) = self.params.get_mut(index) {
            param.default = Some(default);
        }
        self
    }

    /// Mark this entry as the generic signature of `template`.
    pub fn templated(mut self, template: TypeHash) -> Self {
        self.template = Some(template);
        self
    }

    /// Recompute the identity after the owner or parameters were rewritten.
    pub fn rehashed(mut self) -> Self {
        self.func_hash = self.compute_hash();
        self
    }

    // === Queries ===

    pub fn param_types(&self) -> impl Iterator<Item = &Type> {
        self.params.iter().map(|p| &p.ty)
    }

    /// Parameters that must be supplied explicitly.
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| !p.has_default()).count()
    }

    /// Member with an implicit object parameter.
    pub fn has_implicit_object(&self) -> bool {
        self.owner.is_some()
            && !self.is_static
            && matches!(self.kind, FunctionKind::Method | FunctionKind::Conversion)
    }

    /// Type of the implicit object parameter: `cv X&`.
    pub fn implicit_object_type(&self) -> Option<Type> {
        if !self.has_implicit_object() {
            return None;
        }
        self.owner
            .as_ref()
            .map(|owner| Type::reference_to(Type::Record(owner.clone()).qualified(self.cv)))
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == FunctionKind::Constructor
    }

    pub fn is_conversion(&self) -> bool {
        self.kind == FunctionKind::Conversion
    }

    pub fn is_builtin(&self) -> bool {
        self.kind == FunctionKind::Builtin
    }

    /// User or built-in operator function.
    pub fn is_operator(&self) -> bool {
        match self.kind {
            FunctionKind::Operator | FunctionKind::Builtin => true,
            FunctionKind::Method => self.name.starts_with("operator"),
            _ => false,
        }
    }

    pub fn is_template(&self) -> bool {
        self.template.is_some()
    }

    pub fn is_template_instance(&self) -> bool {
        self.instance_of.is_some()
    }

    /// The function's type, `ret(params)`.
    pub fn signature(&self) -> Type {
        Type::function(self.param_types().cloned().collect(), self.return_type.clone(), self.variadic)
    }

    /// Whether `other` has the same parameter list.
    pub fn same_params(&self, other: &FunctionEntry) -> bool {
        self.variadic == other.variadic
            && self.params.len() == other.params.len()
            && self.param_types().zip(other.param_types()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for FunctionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(owner) = &self.owner {
            write!(f, "{}::", owner.name)?;
        }
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", p.ty)?;
        }
        if self.variadic {
            f.write_str(if self.params.is_empty() { "..." } else { ", ..." })?;
        }
        f.write_str(")")?;
        if !self.cv.is_empty() {
            write!(f, " {}", self.cv)?;
        }
        Ok(())
    }
}
