//! Describing Rust types to the engine.
//!
//! [`Reflect`] lowers a value into the dynamic [`Value`] tree and lifts it
//! back. Records normally get their implementation from `#[derive(Reflect)]`;
//! primitives and the standard containers are covered here.

use crate::error::{Error, Result};
use crate::types::{RecordType, ScalarKind, TypeDesc};
use crate::value::{IndirectValue, MapValue, RecordValue, Scalar, SeqValue, Value};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// A type the engine can read from and write into.
pub trait Reflect: Sized {
    /// Static shape of the type.
    fn type_desc() -> TypeDesc;

    /// Lower `self` into a dynamic value.
    fn to_value(&self) -> Value;

    /// Lift a dynamic value of this type back into `Self`.
    fn from_value(value: Value) -> Result<Self>;
}

/// A [`Reflect`] type that is a record (struct with named fields).
pub trait ReflectRecord: Reflect {
    fn record_type() -> RecordType;
}

fn mismatch<T: Reflect>(value: &Value) -> Error {
    Error::TypeMismatch {
        expected: T::type_desc().to_string(),
        got: value.type_desc().to_string(),
    }
}

/// Reads named fields out of a record value. Used by derived `from_value`.
#[derive(Debug)]
pub struct RecordReader {
    fields: HashMap<String, Value>,
}

impl RecordReader {
    pub fn new(record: RecordValue) -> Self {
        let names: Vec<String> = record.decls().iter().map(|d| d.name.clone()).collect();
        let fields = names.into_iter().zip(record.into_values()).collect();
        Self { fields }
    }

    /// Take the named field and lift it into `T`.
    pub fn take<T: Reflect>(&mut self, name: &str) -> Result<T> {
        let value = self
            .fields
            .remove(name)
            .ok_or_else(|| Error::MissingField(name.to_string()))?;
        T::from_value(value).map_err(|e| e.at(name))
    }
}

/// Unwrap `value` as a record of type `T`.
pub fn expect_record<T: ReflectRecord>(value: Value) -> Result<RecordReader> {
    match value {
        Value::Record(record) if *record.record_type() == T::record_type() => {
            Ok(RecordReader::new(record))
        }
        other => Err(mismatch::<T>(&other)),
    }
}

macro_rules! reflect_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn type_desc() -> TypeDesc {
                    TypeDesc::Scalar(ScalarKind::$variant)
                }

                fn to_value(&self) -> Value {
                    Value::Scalar(Scalar::$variant(Clone::clone(self)))
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Scalar(Scalar::$variant(v)) => Ok(v),
                        other => Err(mismatch::<Self>(&other)),
                    }
                }
            }
        )*
    };
}

reflect_scalar! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::seq(T::type_desc())
    }

    fn to_value(&self) -> Value {
        Value::Seq(SeqValue::new(
            T::type_desc(),
            self.iter().map(Reflect::to_value).collect(),
        ))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Seq(seq) if seq.elem == T::type_desc() => seq
                .items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_value(item).map_err(|e| e.at_index(i)))
                .collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::indirect(T::type_desc())
    }

    fn to_value(&self) -> Value {
        let cell = match self {
            Some(inner) => IndirectValue::some(T::type_desc(), inner.to_value()),
            None => IndirectValue::none(T::type_desc()),
        };
        Value::Indirect(cell)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Indirect(cell) if cell.inner == T::type_desc() => {
                cell.value.map(|inner| T::from_value(*inner)).transpose()
            }
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

/// `Box<T>` has the shape of `T`; `Option<Box<T>>` is an indirection to `T`.
impl<T: Reflect> Reflect for Box<T> {
    fn type_desc() -> TypeDesc {
        T::type_desc()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: Value) -> Result<Self> {
        T::from_value(value).map(Box::new)
    }
}

fn map_entries<'a, K, V, I>(entries: I) -> Value
where
    K: Reflect + 'a,
    V: Reflect + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    let mut map = MapValue::empty(K::type_desc(), V::type_desc());
    map.entries = entries.map(|(k, v)| (k.to_value(), v.to_value())).collect();
    Value::Map(map)
}

fn lift_entries<K: Reflect, V: Reflect, C>(value: Value, expected: TypeDesc) -> Result<C>
where
    C: FromIterator<(K, V)>,
{
    match value {
        Value::Map(map) if map.key == K::type_desc() && map.value == V::type_desc() => map
            .entries
            .into_iter()
            .map(|(k, v)| Ok::<_, Error>((K::from_value(k)?, V::from_value(v)?)))
            .collect(),
        other => Err(Error::TypeMismatch {
            expected: expected.to_string(),
            got: other.type_desc().to_string(),
        }),
    }
}

impl<K: Reflect + Eq + Hash, V: Reflect> Reflect for HashMap<K, V> {
    fn type_desc() -> TypeDesc {
        TypeDesc::map(K::type_desc(), V::type_desc())
    }

    fn to_value(&self) -> Value {
        map_entries(self.iter())
    }

    fn from_value(value: Value) -> Result<Self> {
        lift_entries(value, Self::type_desc())
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn type_desc() -> TypeDesc {
        TypeDesc::map(K::type_desc(), V::type_desc())
    }

    fn to_value(&self) -> Value {
        map_entries(self.iter())
    }

    fn from_value(value: Value) -> Result<Self> {
        lift_entries(value, Self::type_desc())
    }
}
