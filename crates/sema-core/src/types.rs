//! Semantic type descriptors.
//!
//! [`Type`] is an immutable, value-like tagged union. Equality is structural;
//! records, enums and template parameters compare by identity hash only, so
//! two descriptors naming the same entity are equal even if one of them was
//! built without its template-instance details.
//!
//! Qualified types are kept in a normal form: a `Qualified` node never wraps
//! another `Qualified` node, never carries an empty qualifier set, and never
//! wraps a reference.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use xxhash_rust::xxh64::Xxh64;

use crate::template_param::TemplateArg;
use crate::type_hash::hash_constants;
use crate::{PrimitiveKind, Qualifiers, TypeHash};

/// Identity of a template parameter: the declaring template (or partial
/// specialization) plus the parameter's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateParamId {
    pub owner: TypeHash,
    pub index: u16,
}

impl TemplateParamId {
    pub const fn new(owner: TypeHash, index: u16) -> Self {
        Self { owner, index }
    }
}

/// A template parameter occurrence inside a type.
#[derive(Debug, Clone)]
pub struct ParamType {
    pub id: TemplateParamId,
    pub name: Rc<str>,
}

impl PartialEq for ParamType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ParamType {}

impl Hash for ParamType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// An enumeration type.
#[derive(Debug, Clone)]
pub struct EnumType {
    pub hash: TypeHash,
    pub name: Rc<str>,
}

impl PartialEq for EnumType {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for EnumType {}

impl Hash for EnumType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

/// Template instance details carried by a record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceOf {
    /// The class template this record instantiates.
    pub template: TypeHash,
    /// Instantiation arguments, in primary-template parameter order.
    pub args: Vec<TemplateArg>,
}

/// A class, struct or union type, possibly a template instance.
#[derive(Debug, Clone)]
pub struct RecordType {
    pub hash: TypeHash,
    pub name: Rc<str>,
    pub instance_of: Option<Rc<InstanceOf>>,
}

impl RecordType {
    pub fn new(hash: TypeHash, name: impl Into<Rc<str>>) -> Self {
        Self {
            hash,
            name: name.into(),
            instance_of: None,
        }
    }

    /// Whether this record is an instance of `template`.
    pub fn is_instance_of(&self, template: TypeHash) -> bool {
        self.instance_of
            .as_ref()
            .is_some_and(|inst| inst.template == template)
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for RecordType {}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

/// Array bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayDim {
    Fixed(u64),
    /// The bound is a non-type template parameter.
    Dependent(ParamType),
    Unknown,
}

/// Function signature type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Type,
    pub variadic: bool,
}

/// Owning class of a pointer-to-member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberOwner {
    Record(RecordType),
    Param(ParamType),
}

/// A semantic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Type {
    Primitive(PrimitiveKind),
    Enum(EnumType),
    Record(RecordType),
    Pointer(Box<Type>),
    /// Lvalue reference ("address" type).
    Reference(Box<Type>),
    Array(Box<Type>, ArrayDim),
    Function(Box<FunctionType>),
    MemberPointer {
        owner: MemberOwner,
        pointee: Box<Type>,
    },
    Qualified(Box<Type>, Qualifiers),
    TemplateParam(ParamType),
    /// Sentinel for "undefined/unknown type" after a reported failure.
    #[default]
    Undefined,
}

impl Type {
    pub const fn prim(kind: PrimitiveKind) -> Self {
        Type::Primitive(kind)
    }

    pub const fn int() -> Self {
        Type::Primitive(PrimitiveKind::Int)
    }

    pub const fn double() -> Self {
        Type::Primitive(PrimitiveKind::Double)
    }

    pub const fn bool() -> Self {
        Type::Primitive(PrimitiveKind::Bool)
    }

    pub const fn void() -> Self {
        Type::Primitive(PrimitiveKind::Void)
    }

    pub fn pointer_to(pointee: Type) -> Self {
        Type::Pointer(Box::new(pointee))
    }

    /// Reference to `referent`; references to references collapse.
    pub fn reference_to(referent: Type) -> Self {
        match referent {
            Type::Reference(_) => referent,
            other => Type::Reference(Box::new(other)),
        }
    }

    pub fn array_of(elem: Type, dim: u64) -> Self {
        Type::Array(Box::new(elem), ArrayDim::Fixed(dim))
    }

    pub fn function(params: Vec<Type>, ret: Type, variadic: bool) -> Self {
        Type::Function(Box::new(FunctionType {
            params,
            ret,
            variadic,
        }))
    }

    pub fn record(hash: TypeHash, name: impl Into<Rc<str>>) -> Self {
        Type::Record(RecordType::new(hash, name))
    }

    pub fn enumeration(hash: TypeHash, name: impl Into<Rc<str>>) -> Self {
        Type::Enum(EnumType {
            hash,
            name: name.into(),
        })
    }

    pub fn param(id: TemplateParamId, name: impl Into<Rc<str>>) -> Self {
        Type::TemplateParam(ParamType {
            id,
            name: name.into(),
        })
    }

    pub fn member_pointer(owner: MemberOwner, pointee: Type) -> Self {
        Type::MemberPointer {
            owner,
            pointee: Box::new(pointee),
        }
    }

    /// Add qualifiers, keeping the normal form.
    pub fn qualified(self, quals: Qualifiers) -> Type {
        if quals.is_empty() {
            return self;
        }
        match self {
            Type::Qualified(base, existing) => Type::Qualified(base, existing | quals),
            Type::Reference(_) | Type::Undefined => self,
            other => Type::Qualified(Box::new(other), quals),
        }
    }

    pub fn with_const(self) -> Type {
        self.qualified(Qualifiers::CONST)
    }

    /// Top-level qualifiers.
    pub fn qualifiers(&self) -> Qualifiers {
        match self {
            Type::Qualified(_, q) => *q,
            _ => Qualifiers::empty(),
        }
    }

    /// Qualifiers of the innermost element type of a (possibly nested) array,
    /// or the top-level qualifiers for anything else.
    pub fn qualifiers_through_arrays(&self) -> Qualifiers {
        match self.unqualified() {
            Type::Array(elem, _) => self.qualifiers() | elem.qualifiers_through_arrays(),
            _ => self.qualifiers(),
        }
    }

    /// The type with top-level qualifiers removed.
    pub fn unqualified(&self) -> &Type {
        match self {
            Type::Qualified(base, _) => &**base,
            other => other,
        }
    }

    /// The referenced type for references, `self` otherwise.
    pub fn strip_reference(&self) -> &Type {
        match self {
            Type::Reference(inner) => &**inner,
            other => other,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Reference(_))
    }

    pub fn is_const(&self) -> bool {
        self.qualifiers().contains(Qualifiers::CONST)
    }

    pub fn is_volatile(&self) -> bool {
        self.qualifiers().contains(Qualifiers::VOLATILE)
    }

    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self.unqualified() {
            Type::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_primitive(&self, kind: PrimitiveKind) -> bool {
        self.primitive() == Some(kind)
    }

    pub fn is_void(&self) -> bool {
        self.is_primitive(PrimitiveKind::Void)
    }

    pub fn is_bool(&self) -> bool {
        self.is_primitive(PrimitiveKind::Bool)
    }

    pub fn is_integral(&self) -> bool {
        self.primitive().is_some_and(PrimitiveKind::is_integral)
    }

    pub fn is_floating(&self) -> bool {
        self.primitive().is_some_and(PrimitiveKind::is_floating)
    }

    pub fn is_arithmetic(&self) -> bool {
        self.primitive().is_some_and(PrimitiveKind::is_arithmetic)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.unqualified(), Type::Enum(_))
    }

    pub fn enumeration_type(&self) -> Option<&EnumType> {
        match self.unqualified() {
            Type::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.unqualified(), Type::Pointer(_))
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self.unqualified() {
            Type::Pointer(inner) => Some(&**inner),
            _ => None,
        }
    }

    pub fn is_member_pointer(&self) -> bool {
        matches!(self.unqualified(), Type::MemberPointer { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.unqualified(), Type::Array(..))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.unqualified(), Type::Function(_))
    }

    pub fn function_type(&self) -> Option<&FunctionType> {
        match self.unqualified() {
            Type::Function(f) => Some(&**f),
            _ => None,
        }
    }

    pub fn record_type(&self) -> Option<&RecordType> {
        match self.unqualified() {
            Type::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_record(&self) -> bool {
        self.record_type().is_some()
    }

    pub fn template_param(&self) -> Option<&ParamType> {
        match self.unqualified() {
            Type::TemplateParam(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Type::Undefined)
    }

    /// Arithmetic, enumeration, pointer and pointer-to-member types.
    pub fn is_scalar(&self) -> bool {
        self.is_arithmetic() || self.is_enum() || self.is_pointer() || self.is_member_pointer()
    }

    /// Whether any template parameter occurs in this type.
    pub fn is_dependent(&self) -> bool {
        match self {
            Type::TemplateParam(_) => true,
            Type::Pointer(inner) | Type::Reference(inner) | Type::Qualified(inner, _) => {
                inner.is_dependent()
            }
            Type::Array(elem, dim) => {
                matches!(dim, ArrayDim::Dependent(_)) || elem.is_dependent()
            }
            Type::Function(f) => f.ret.is_dependent() || f.params.iter().any(Type::is_dependent),
            Type::MemberPointer { owner, pointee } => {
                matches!(owner, MemberOwner::Param(_)) || pointee.is_dependent()
            }
            Type::Record(r) => r
                .instance_of
                .as_ref()
                .is_some_and(|inst| inst.args.iter().any(TemplateArg::is_dependent)),
            Type::Primitive(_) | Type::Enum(_) | Type::Undefined => false,
        }
    }

    /// Stable identity hash of this type, used for signature and instance hashing.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            Type::Record(r) => r.hash,
            Type::Enum(e) => e.hash,
            other => {
                let mut hasher = Xxh64::new(0);
                other.hash(&mut hasher);
                TypeHash(hash_constants::TYPE ^ hasher.finish())
            }
        }
    }
}

impl From<PrimitiveKind> for Type {
    fn from(kind: PrimitiveKind) -> Self {
        Type::Primitive(kind)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "{p}"),
            Type::Enum(e) => f.write_str(&e.name),
            Type::Record(r) => f.write_str(&r.name),
            Type::Pointer(inner) => write!(f, "{inner}*"),
            Type::Reference(inner) => write!(f, "{inner}&"),
            Type::Array(elem, dim) => match dim {
                ArrayDim::Fixed(n) => write!(f, "{elem}[{n}]"),
                ArrayDim::Dependent(p) => write!(f, "{elem}[{p}]"),
                ArrayDim::Unknown => write!(f, "{elem}[]"),
            },
            Type::Function(func) => {
                write!(f, "{}(", func.ret)?;
                for (i, p) in func.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                if func.variadic {
                    f.write_str(if func.params.is_empty() { "..." } else { ", ..." })?;
                }
                f.write_str(")")
            }
            Type::MemberPointer { owner, pointee } => match owner {
                MemberOwner::Record(r) => write!(f, "{pointee} {}::*", r.name),
                MemberOwner::Param(p) => write!(f, "{pointee} {p}::*"),
            },
            Type::Qualified(base, quals) => write!(f, "{quals} {base}"),
            Type::TemplateParam(p) => write!(f, "{p}"),
            Type::Undefined => f.write_str("<undefined>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t_param() -> Type {
        Type::param(TemplateParamId::new(TypeHash::from_template("Box"), 0), "T")
    }

    #[test]
    fn qualified_is_normalised() {
        let t = Type::int().with_const().qualified(Qualifiers::VOLATILE);
        assert_eq!(
            t,
            Type::Qualified(
                Box::new(Type::int()),
                Qualifiers::CONST | Qualifiers::VOLATILE
            )
        );
        assert_eq!(Type::int().qualified(Qualifiers::empty()), Type::int());
    }

    #[test]
    fn references_are_never_qualified() {
        let r = Type::reference_to(Type::int());
        assert_eq!(r.clone().with_const(), r);
        assert_eq!(Type::reference_to(r.clone()), r);
    }

    #[test]
    fn unqualified_view() {
        let t = Type::double().with_const();
        assert_eq!(t.unqualified(), &Type::double());
        assert!(t.is_const());
        assert!(t.is_floating());
    }

    #[test]
    fn records_compare_by_identity() {
        let h = TypeHash::from_name("Base");
        let a = Type::record(h, "Base");
        let b = Type::record(h, "Base");
        assert_eq!(a, b);
        assert_eq!(a.type_hash(), h);
    }

    #[test]
    fn dependent_types() {
        assert!(t_param().is_dependent());
        assert!(Type::pointer_to(t_param().with_const()).is_dependent());
        assert!(!Type::pointer_to(Type::int()).is_dependent());
        assert!(Type::function(vec![t_param()], Type::void(), false).is_dependent());
    }

    #[test]
    fn structural_hash_is_stable() {
        let a = Type::pointer_to(Type::int().with_const());
        let b = Type::pointer_to(Type::int().with_const());
        assert_eq!(a.type_hash(), b.type_hash());
        assert_ne!(a.type_hash(), Type::pointer_to(Type::int()).type_hash());
    }

    #[test]
    fn scalar_classification() {
        assert!(Type::int().is_scalar());
        assert!(Type::pointer_to(Type::void()).is_scalar());
        assert!(!Type::record(TypeHash::from_name("S"), "S").is_scalar());
    }

    #[test]
    fn display() {
        let f = Type::function(vec![Type::int()], Type::void(), true);
        assert_eq!(f.to_string(), "void(int, ...)");
        assert_eq!(
            Type::pointer_to(Type::int().with_const()).to_string(),
            "const int*"
        );
    }
}
