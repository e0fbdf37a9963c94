//! Template parameters and arguments.
//!
//! A [`TemplateParam`] describes one entry of a template's parameter list.
//! A [`TemplateArg`] is what gets bound to it: a type, a constant value, or
//! another template.

use std::fmt;
use std::rc::Rc;

use crate::types::{ParamType, TemplateParamId};
use crate::{Type, TypeHash, Value};

/// Handle to a stored token range (default argument, body, declarator) that the
/// fragment parser can re-parse under a substitution environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentId(pub u32);

/// Kind of a template parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateParamKind {
    /// `class T` / `typename T`.
    Type,
    /// Non-type parameter of the given value type, e.g. `int N`.
    NonType(Type),
    /// Template template parameter with its own parameter list.
    Template(Vec<TemplateParam>),
}

/// Default argument of a template parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultArg {
    /// An already-resolved argument. It may mention earlier parameters of the
    /// same template, which are substituted at use.
    Arg(TemplateArg),
    /// A stored fragment evaluated by the fragment parser at the point of use.
    Fragment(FragmentId),
}

/// A template parameter declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParam {
    pub id: TemplateParamId,
    pub name: Rc<str>,
    pub kind: TemplateParamKind,
    pub default: Option<DefaultArg>,
}

impl TemplateParam {
    /// A type parameter `class name` at `index` of `owner`.
    pub fn type_param(owner: TypeHash, index: u16, name: &str) -> Self {
        Self {
            id: TemplateParamId::new(owner, index),
            name: name.into(),
            kind: TemplateParamKind::Type,
            default: None,
        }
    }

    /// A non-type parameter `value_type name`.
    pub fn non_type(owner: TypeHash, index: u16, name: &str, value_type: Type) -> Self {
        Self {
            id: TemplateParamId::new(owner, index),
            name: name.into(),
            kind: TemplateParamKind::NonType(value_type),
            default: None,
        }
    }

    /// A template template parameter.
    pub fn template_param(owner: TypeHash, index: u16, name: &str, params: Vec<TemplateParam>) -> Self {
        Self {
            id: TemplateParamId::new(owner, index),
            name: name.into(),
            kind: TemplateParamKind::Template(params),
            default: None,
        }
    }

    pub fn with_default(mut self, default: DefaultArg) -> Self {
        self.default = Some(default);
        self
    }

    /// The parameter as it occurs inside a type.
    pub fn as_param_type(&self) -> ParamType {
        ParamType {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Shorthand for `Type::TemplateParam` naming this parameter.
    pub fn as_type(&self) -> Type {
        Type::TemplateParam(self.as_param_type())
    }

    /// The parameter as it occurs in an argument list, e.g. the `T` of `Box<T>`.
    pub fn as_arg(&self) -> TemplateArg {
        match self.kind {
            TemplateParamKind::Type => TemplateArg::Type(self.as_type()),
            TemplateParamKind::NonType(_) => TemplateArg::ValueParam(self.as_param_type()),
            TemplateParamKind::Template(_) => TemplateArg::Template(TypeHash::from_template_instance(
                self.id.owner,
                &[TypeHash(u64::from(self.id.index))],
            )),
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self.kind, TemplateParamKind::Type)
    }

    /// Whether `arg` has the right kind for this parameter.
    pub fn accepts(&self, arg: &TemplateArg) -> bool {
        matches!(
            (&self.kind, arg),
            (TemplateParamKind::Type, TemplateArg::Type(_))
                | (TemplateParamKind::NonType(_), TemplateArg::Value(_))
                | (TemplateParamKind::NonType(_), TemplateArg::ValueParam(_))
                | (TemplateParamKind::Template(_), TemplateArg::Template(_))
        )
    }
}

/// An argument bound to a template parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateArg {
    Type(Type),
    Value(Value),
    /// Occurrence of a non-type parameter where a value is expected.
    ValueParam(ParamType),
    Template(TypeHash),
}

impl TemplateArg {
    /// Whether a template parameter occurs in this argument.
    pub fn is_dependent(&self) -> bool {
        match self {
            TemplateArg::Type(t) => t.is_dependent(),
            TemplateArg::ValueParam(_) => true,
            TemplateArg::Value(_) | TemplateArg::Template(_) => false,
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            TemplateArg::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            TemplateArg::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Identity hash, used when hashing template instances.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            TemplateArg::Type(t) => t.type_hash(),
            TemplateArg::Value(v) => match v.as_integer() {
                Some(i) => TypeHash::from_name(&format!("#value:{i}")),
                None => TypeHash::from_name(&format!("#value:{v}")),
            },
            TemplateArg::ValueParam(p) => TypeHash::from_template_instance(
                p.id.owner,
                &[TypeHash(u64::from(p.id.index))],
            ),
            TemplateArg::Template(h) => *h,
        }
    }
}

impl From<Type> for TemplateArg {
    fn from(t: Type) -> Self {
        TemplateArg::Type(t)
    }
}

impl From<Value> for TemplateArg {
    fn from(v: Value) -> Self {
        TemplateArg::Value(v)
    }
}

impl fmt::Display for TemplateArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateArg::Type(t) => write!(f, "{t}"),
            TemplateArg::Value(v) => write!(f, "{v}"),
            TemplateArg::ValueParam(p) => write!(f, "{p}"),
            TemplateArg::Template(h) => write!(f, "template {h}"),
        }
    }
}

/// Render an argument list as `<a, b>`.
pub fn format_args(args: &[TemplateArg]) -> String {
    let inner: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("<{}>", inner.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_kinds_accept_matching_args() {
        let owner = TypeHash::from_template("Array");
        let t = TemplateParam::type_param(owner, 0, "T");
        let n = TemplateParam::non_type(owner, 1, "N", Type::int());

        assert!(t.accepts(&TemplateArg::Type(Type::int())));
        assert!(!t.accepts(&TemplateArg::Value(Value::Signed(3))));
        assert!(n.accepts(&TemplateArg::Value(Value::Signed(3))));
        assert!(!n.accepts(&TemplateArg::Type(Type::int())));
    }

    #[test]
    fn value_args_hash_by_number() {
        let a = TemplateArg::Value(Value::Signed(4));
        let b = TemplateArg::Value(Value::Unsigned(4));
        assert_eq!(a, b);
        assert_eq!(a.type_hash(), b.type_hash());
    }

    #[test]
    fn dependent_args() {
        let owner = TypeHash::from_template("Box");
        let t = TemplateParam::type_param(owner, 0, "T");
        assert!(TemplateArg::Type(Type::pointer_to(t.as_type())).is_dependent());
        assert!(!TemplateArg::Value(Value::Signed(1)).is_dependent());
        let n = TemplateParam::non_type(owner, 1, "N", Type::int());
        assert!(TemplateArg::ValueParam(n.as_param_type()).is_dependent());
        assert!(n.accepts(&TemplateArg::ValueParam(n.as_param_type())));
    }

    #[test]
    fn formatting() {
        let args = vec![
            TemplateArg::Type(Type::pointer_to(Type::int())),
            TemplateArg::Value(Value::Signed(3)),
        ];
        assert_eq!(format_args(&args), "<int*, 3>");
    }
}
