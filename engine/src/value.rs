//! Dynamic values.
//!
//! The engine never touches user structs directly: [`Reflect`](crate::Reflect)
//! lowers them into a [`Value`] tree, the strategies rewrite the target tree,
//! and the result is lifted back. Every node carries enough type information
//! (element type of an empty sequence, inner type of an absent indirection)
//! to allocate zero-valued replacements.

use crate::error::{Error, Result};
use crate::types::{FieldDecl, RecordType, ScalarKind, TypeDesc, TypeIdentity};
use std::sync::Arc;

/// A primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::I8(_) => ScalarKind::I8,
            Scalar::I16(_) => ScalarKind::I16,
            Scalar::I32(_) => ScalarKind::I32,
            Scalar::I64(_) => ScalarKind::I64,
            Scalar::Isize(_) => ScalarKind::Isize,
            Scalar::U8(_) => ScalarKind::U8,
            Scalar::U16(_) => ScalarKind::U16,
            Scalar::U32(_) => ScalarKind::U32,
            Scalar::U64(_) => ScalarKind::U64,
            Scalar::Usize(_) => ScalarKind::Usize,
            Scalar::F32(_) => ScalarKind::F32,
            Scalar::F64(_) => ScalarKind::F64,
            Scalar::Char(_) => ScalarKind::Char,
            Scalar::String(_) => ScalarKind::String,
        }
    }
}

/// A record instance: its type, declared fields, and positional values.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    ty: RecordType,
    decls: Arc<[FieldDecl]>,
    values: Vec<Value>,
}

impl RecordValue {
    /// Create a record from values given in field declaration order.
    ///
    /// The value count is not checked here. The engine rejects a record that
    /// does not hold one value per declared field; use
    /// [`RecordValue::try_new`] to fail at construction instead.
    pub fn new(ty: RecordType, values: Vec<Value>) -> Self {
        let decls = ty.fields();
        Self { ty, decls, values }
    }

    /// Create a record, failing unless there is one value per declared field.
    pub fn try_new(ty: RecordType, values: Vec<Value>) -> Result<Self> {
        let record = Self::new(ty, values);
        record.check_shape()?;
        Ok(record)
    }

    /// Fails with [`Error::FieldCount`] unless every declared field has a value.
    pub fn check_shape(&self) -> Result<()> {
        if self.decls.len() == self.values.len() {
            return Ok(());
        }
        Err(Error::FieldCount {
            record: self.identity().to_string(),
            expected: self.decls.len(),
            got: self.values.len(),
        })
    }

    pub fn record_type(&self) -> &RecordType {
        &self.ty
    }

    pub fn identity(&self) -> &TypeIdentity {
        self.ty.identity()
    }

    pub fn decls(&self) -> &[FieldDecl] {
        &self.decls
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }

    /// Iterate `(declaration, value)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDecl, &Value)> {
        self.decls.iter().zip(self.values.iter())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.decls.iter().position(|d| d.name == name)
    }

    /// Value of the field with the given declared name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.position(name).and_then(|i| self.values.get(i))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.position(name).and_then(|i| self.values.get_mut(i))
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// A homogeneous sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SeqValue {
    pub elem: TypeDesc,
    pub items: Vec<Value>,
}

impl SeqValue {
    pub fn new(elem: TypeDesc, items: Vec<Value>) -> Self {
        Self { elem, items }
    }

    pub fn empty(elem: TypeDesc) -> Self {
        Self::new(elem, Vec::new())
    }
}

/// An optional / pointer-like cell.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectValue {
    pub inner: TypeDesc,
    pub value: Option<Box<Value>>,
}

impl IndirectValue {
    pub fn some(inner: TypeDesc, value: Value) -> Self {
        Self {
            inner,
            value: Some(Box::new(value)),
        }
    }

    pub fn none(inner: TypeDesc) -> Self {
        Self { inner, value: None }
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// A keyed container.
#[derive(Debug, Clone, PartialEq)]
pub struct MapValue {
    pub key: TypeDesc,
    pub value: TypeDesc,
    pub entries: Vec<(Value, Value)>,
}

impl MapValue {
    pub fn empty(key: TypeDesc, value: TypeDesc) -> Self {
        Self {
            key,
            value,
            entries: Vec::new(),
        }
    }
}

/// A dynamic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Record(RecordValue),
    Seq(SeqValue),
    Indirect(IndirectValue),
    Map(MapValue),
}

impl Value {
    /// The runtime type of this value.
    pub fn type_desc(&self) -> TypeDesc {
        match self {
            Value::Scalar(s) => TypeDesc::Scalar(s.kind()),
            Value::Record(r) => TypeDesc::Record(r.ty.clone()),
            Value::Seq(s) => TypeDesc::seq(s.elem.clone()),
            Value::Indirect(i) => TypeDesc::indirect(i.inner.clone()),
            Value::Map(m) => TypeDesc::map(m.key.clone(), m.value.clone()),
        }
    }

    /// Whether `self` and `other` have the identical type.
    pub fn same_type(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a.kind() == b.kind(),
            (Value::Record(a), Value::Record(b)) => a.ty == b.ty,
            (Value::Seq(a), Value::Seq(b)) => a.elem == b.elem,
            (Value::Indirect(a), Value::Indirect(b)) => a.inner == b.inner,
            (Value::Map(a), Value::Map(b)) => a.key == b.key && a.value == b.value,
            _ => false,
        }
    }

    /// Whether this value has the type `ty`.
    pub fn is_of(&self, ty: &TypeDesc) -> bool {
        match (self, ty) {
            (Value::Scalar(s), TypeDesc::Scalar(kind)) => s.kind() == *kind,
            (Value::Record(r), TypeDesc::Record(rt)) => r.ty == *rt,
            (Value::Seq(s), TypeDesc::Seq(elem)) => s.elem == **elem,
            (Value::Indirect(i), TypeDesc::Indirect(inner)) => i.inner == **inner,
            (Value::Map(m), TypeDesc::Map(key, value)) => m.key == **key && m.value == **value,
            _ => false,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut RecordValue> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}
