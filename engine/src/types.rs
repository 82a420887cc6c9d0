//! Type descriptors.
//!
//! A [`TypeDesc`] is the static shape of a value: what the engine compares
//! when deciding whether two fields have the identical type, and what it
//! uses to allocate zero-valued working copies.

use crate::value::{IndirectValue, MapValue, RecordValue, Scalar, SeqValue, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Identity of a record type, used to key rename directives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeIdentity {
    /// Short type name (`TwoIntsB`)
    pub name: String,
    /// Module-qualified type name (`my_crate::models::TwoIntsB`)
    pub qualified_name: String,
}

impl TypeIdentity {
    /// Create a new type identity.
    pub fn new(name: impl Into<String>, qualified_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
        }
    }

    /// Identity for a type with no enclosing module.
    pub fn local(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            qualified_name: name.clone(),
            name,
        }
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name)
    }
}

/// Primitive types. Widths are distinct types; there is no numeric coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Char,
    String,
}

impl ScalarKind {
    /// The default value of this primitive.
    pub fn zero(self) -> Scalar {
        match self {
            ScalarKind::Bool => Scalar::Bool(false),
            ScalarKind::I8 => Scalar::I8(0),
            ScalarKind::I16 => Scalar::I16(0),
            ScalarKind::I32 => Scalar::I32(0),
            ScalarKind::I64 => Scalar::I64(0),
            ScalarKind::Isize => Scalar::Isize(0),
            ScalarKind::U8 => Scalar::U8(0),
            ScalarKind::U16 => Scalar::U16(0),
            ScalarKind::U32 => Scalar::U32(0),
            ScalarKind::U64 => Scalar::U64(0),
            ScalarKind::Usize => Scalar::Usize(0),
            ScalarKind::F32 => Scalar::F32(0.0),
            ScalarKind::F64 => Scalar::F64(0.0),
            ScalarKind::Char => Scalar::Char('\0'),
            ScalarKind::String => Scalar::String(String::new()),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::Isize => "isize",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::Usize => "usize",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Char => "char",
            ScalarKind::String => "String",
        };
        f.write_str(name)
    }
}

/// A rename directive: on records of type `other`, this field is called `name`.
///
/// `other` is matched against the qualified name first, then the short name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameDirective {
    pub other: String,
    pub name: String,
}

/// Declaration of a field in a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Declared field name
    pub name: String,
    /// Declared field type
    pub ty: TypeDesc,
    /// Whether the engine may write this field
    pub settable: bool,
    /// Rename directives keyed by other-type name
    pub renames: Vec<RenameDirective>,
}

impl FieldDecl {
    /// Create a settable field with no rename directives.
    pub fn new(name: impl Into<String>, ty: TypeDesc) -> Self {
        Self {
            name: name.into(),
            ty,
            settable: true,
            renames: Vec::new(),
        }
    }

    /// Mark the field as not settable.
    pub fn readonly(mut self) -> Self {
        self.settable = false;
        self
    }

    /// Add a rename directive for the given other type.
    pub fn rename(mut self, other: impl Into<String>, name: impl Into<String>) -> Self {
        self.renames.push(RenameDirective {
            other: other.into(),
            name: name.into(),
        });
        self
    }
}

type FieldBuilder = Box<dyn Fn() -> Vec<FieldDecl> + Send + Sync>;

struct RecordTypeInner {
    identity: TypeIdentity,
    build: Option<FieldBuilder>,
    fields: OnceLock<Arc<[FieldDecl]>>,
}

/// A record (struct) type: identity plus declared fields.
///
/// Field declarations are built on first use, so a type may refer to itself
/// through an indirection or a sequence without the descriptor recursing.
/// Two record types are the same type iff their qualified names match.
#[derive(Clone)]
pub struct RecordType(Arc<RecordTypeInner>);

impl RecordType {
    /// Create a record type whose fields are produced lazily by `build`.
    pub fn new<F>(identity: TypeIdentity, build: F) -> Self
    where
        F: Fn() -> Vec<FieldDecl> + Send + Sync + 'static,
    {
        Self(Arc::new(RecordTypeInner {
            identity,
            build: Some(Box::new(build)),
            fields: OnceLock::new(),
        }))
    }

    /// Create a record type from an already known field list.
    pub fn with_fields(identity: TypeIdentity, fields: Vec<FieldDecl>) -> Self {
        Self(Arc::new(RecordTypeInner {
            identity,
            build: None,
            fields: OnceLock::from(Arc::from(fields)),
        }))
    }

    pub fn identity(&self) -> &TypeIdentity {
        &self.0.identity
    }

    pub fn name(&self) -> &str {
        &self.0.identity.name
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> Arc<[FieldDecl]> {
        self.0
            .fields
            .get_or_init(|| match &self.0.build {
                Some(build) => Arc::from(build()),
                None => Arc::from(Vec::new()),
            })
            .clone()
    }

    /// A record of this type with every field zero-valued.
    pub fn zero_value(&self) -> RecordValue {
        let values = self.fields().iter().map(|f| f.ty.zero_value()).collect();
        RecordValue::new(self.clone(), values)
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || self.0.identity.qualified_name == other.0.identity.qualified_name
    }
}

impl Eq for RecordType {}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordType")
            .field(&self.0.identity.qualified_name)
            .finish()
    }
}

/// The shape of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDesc {
    Scalar(ScalarKind),
    Record(RecordType),
    /// Homogeneous ordered sequence
    Seq(Box<TypeDesc>),
    /// Optional / pointer-like cell
    Indirect(Box<TypeDesc>),
    /// Keyed container. Only copied on an exact type match.
    Map(Box<TypeDesc>, Box<TypeDesc>),
}

impl TypeDesc {
    pub fn seq(elem: TypeDesc) -> Self {
        TypeDesc::Seq(Box::new(elem))
    }

    pub fn indirect(inner: TypeDesc) -> Self {
        TypeDesc::Indirect(Box::new(inner))
    }

    pub fn map(key: TypeDesc, value: TypeDesc) -> Self {
        TypeDesc::Map(Box::new(key), Box::new(value))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, TypeDesc::Record(_))
    }

    pub fn is_seq(&self) -> bool {
        matches!(self, TypeDesc::Seq(_))
    }

    pub fn is_indirect(&self) -> bool {
        matches!(self, TypeDesc::Indirect(_))
    }

    /// Allocate the zero value of this type.
    ///
    /// Sequences and maps start empty and indirections start absent, so this
    /// terminates for self-referential records.
    pub fn zero_value(&self) -> Value {
        match self {
            TypeDesc::Scalar(kind) => Value::Scalar(kind.zero()),
            TypeDesc::Record(ty) => Value::Record(ty.zero_value()),
            TypeDesc::Seq(elem) => Value::Seq(SeqValue::empty((**elem).clone())),
            TypeDesc::Indirect(inner) => Value::Indirect(IndirectValue::none((**inner).clone())),
            TypeDesc::Map(key, value) => {
                Value::Map(MapValue::empty((**key).clone(), (**value).clone()))
            }
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Scalar(kind) => write!(f, "{kind}"),
            TypeDesc::Record(ty) => f.write_str(ty.name()),
            TypeDesc::Seq(elem) => write!(f, "Vec<{elem}>"),
            TypeDesc::Indirect(inner) => write!(f, "Option<{inner}>"),
            TypeDesc::Map(key, value) => write!(f, "Map<{key}, {value}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_ints(name: &str) -> RecordType {
        RecordType::with_fields(
            TypeIdentity::new(name, format!("models::{name}")),
            vec![
                FieldDecl::new("First", TypeDesc::Scalar(ScalarKind::I64)),
                FieldDecl::new("Second", TypeDesc::Scalar(ScalarKind::I64)),
            ],
        )
    }

    #[test]
    fn records_compare_by_qualified_name() {
        assert_eq!(two_ints("TwoIntsA"), two_ints("TwoIntsA"));
        assert_ne!(two_ints("TwoIntsA"), two_ints("TwoIntsB"));

        let relocated = RecordType::with_fields(TypeIdentity::new("TwoIntsA", "other::TwoIntsA"), vec![]);
        assert_ne!(two_ints("TwoIntsA"), relocated);
    }

    #[test]
    fn structural_types_compare_by_shape() {
        let a = TypeDesc::seq(TypeDesc::Scalar(ScalarKind::String));
        let b = TypeDesc::seq(TypeDesc::Scalar(ScalarKind::String));
        assert_eq!(a, b);
        assert_ne!(a, TypeDesc::seq(TypeDesc::Scalar(ScalarKind::I64)));
        assert_ne!(
            TypeDesc::Scalar(ScalarKind::I32),
            TypeDesc::Scalar(ScalarKind::I64)
        );
    }

    #[test]
    fn lazy_fields_allow_self_reference() {
        fn node() -> RecordType {
            RecordType::new(TypeIdentity::local("Node"), || {
                vec![
                    FieldDecl::new("value", TypeDesc::Scalar(ScalarKind::I64)),
                    FieldDecl::new("next", TypeDesc::indirect(TypeDesc::Record(node()))),
                ]
            })
        }

        let zero = node().zero_value();
        assert_eq!(zero.values().len(), 2);
        assert!(matches!(&zero.values()[1], Value::Indirect(cell) if cell.value.is_none()));
    }

    #[test]
    fn zero_values() {
        assert_eq!(
            TypeDesc::Scalar(ScalarKind::String).zero_value(),
            Value::Scalar(Scalar::String(String::new()))
        );

        let zero = TypeDesc::Record(two_ints("TwoIntsA")).zero_value();
        let Value::Record(record) = zero else {
            panic!("expected a record");
        };
        assert_eq!(record.get("First"), Some(&Value::Scalar(Scalar::I64(0))));
    }

    #[test]
    fn type_display() {
        let ty = TypeDesc::seq(TypeDesc::indirect(TypeDesc::Record(two_ints("TwoIntsA"))));
        assert_eq!(ty.to_string(), "Vec<Option<TwoIntsA>>");
        assert_eq!(
            TypeDesc::map(
                TypeDesc::Scalar(ScalarKind::String),
                TypeDesc::Scalar(ScalarKind::U8)
            )
            .to_string(),
            "Map<String, u8>"
        );
    }

    #[test]
    fn field_decl_builders() {
        let decl = FieldDecl::new("Second", TypeDesc::Scalar(ScalarKind::I64))
            .rename("TwoIntsB", "SecondB")
            .readonly();
        assert!(!decl.settable);
        assert_eq!(decl.renames[0].other, "TwoIntsB");
        assert_eq!(decl.renames[0].name, "SecondB");
    }
}
