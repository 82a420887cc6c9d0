//! The marshal entry points.
//!
//! A [`Marshaller`] bundles the options, the rename source and the custom
//! hooks. [`marshal`], [`marshal_strict`] and [`marshal_value`] are shortcuts
//! over a default one.

use crate::apply::Context;
use crate::config::MarshalConfig;
use crate::custom::{Custom, HookRegistry};
use crate::error::{Error, Result};
use crate::reflect::ReflectRecord;
use crate::resolve::{DeclaredRenames, RenameLookup};
use crate::value::{IndirectValue, Value};
use crate::Reflect;

/// Converts values of one record type into another.
///
/// ```
/// use recast_engine::{Marshaller, Reflect};
///
/// #[derive(Debug, Default, Reflect)]
/// struct TwoIntsA {
///     first: i64,
///     #[recast(rename(TwoIntsB = "second_b"))]
///     second: i64,
/// }
///
/// #[derive(Debug, Default, Reflect)]
/// struct TwoIntsB {
///     second_b: i64,
///     first: i64,
/// }
///
/// let mut out = TwoIntsB::default();
/// Marshaller::strict()
///     .marshal(&TwoIntsA { first: 10, second: 20 }, &mut out)
///     .unwrap();
/// assert_eq!((out.first, out.second_b), (10, 20));
/// ```
pub struct Marshaller {
    config: MarshalConfig,
    lookup: Box<dyn RenameLookup>,
    hooks: HookRegistry,
}

impl Default for Marshaller {
    fn default() -> Self {
        Self::new(MarshalConfig::default())
    }
}

impl std::fmt::Debug for Marshaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marshaller")
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl Marshaller {
    pub fn new(config: MarshalConfig) -> Self {
        Self {
            config,
            lookup: Box::new(DeclaredRenames),
            hooks: HookRegistry::new(),
        }
    }

    /// Default options with strict mode on.
    pub fn strict() -> Self {
        Self::new(MarshalConfig::strict())
    }

    /// Replace the source of rename directives.
    pub fn with_lookup(mut self, lookup: impl RenameLookup + 'static) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    /// Register the [`Custom`] conversion between `A` and `B`, both ways.
    pub fn with_custom<A, B>(mut self) -> Self
    where
        A: Custom<B> + 'static,
        B: ReflectRecord + 'static,
    {
        self.hooks.register::<A, B>();
        self
    }

    pub fn config(&self) -> &MarshalConfig {
        &self.config
    }

    /// Marshal `source` into the value `target` refers to.
    ///
    /// `target` stands for a reference: it must be a present
    /// [`Value::Indirect`]. An indirect `source` is dereferenced first. When
    /// both sides are records, each source field is applied to its
    /// corresponding target field; otherwise the values are applied as a
    /// whole.
    ///
    /// On failure, writes made before the failing field are kept.
    pub fn marshal_value(&self, source: &Value, target: &mut Value) -> Result<()> {
        let Value::Indirect(reference) = target else {
            return Err(Error::TargetNotReference);
        };
        let Some(target) = reference.value.as_deref_mut() else {
            return Err(Error::NilTarget);
        };

        let mut source = source;
        while let Value::Indirect(IndirectValue {
            value: Some(inner), ..
        }) = source
        {
            source = &**inner;
        }

        let cx = Context {
            config: &self.config,
            lookup: self.lookup.as_ref(),
            hooks: &self.hooks,
        };

        tracing::debug!(
            from = %source.type_desc(),
            to = %target.type_desc(),
            strict = self.config.strict,
            "marshal"
        );

        match (source, target) {
            (Value::Record(src), Value::Record(dst)) => cx.marshal_record(src, dst, 0),
            (source, target) => cx.apply(source, target, 0),
        }
    }

    /// Marshal `source` into `target`.
    ///
    /// On failure, `target` holds every write made before the failing field.
    pub fn marshal<S: Reflect, T: Reflect>(&self, source: &S, target: &mut T) -> Result<()> {
        let mut reference = Value::Indirect(IndirectValue::some(T::type_desc(), target.to_value()));
        let outcome = self.marshal_value(&source.to_value(), &mut reference);

        let written = match reference {
            Value::Indirect(IndirectValue {
                value: Some(inner), ..
            }) => T::from_value(*inner).map(|value| *target = value),
            _ => Ok(()),
        };
        outcome.and(written)
    }
}

/// Marshal `source` into `target` with default options.
///
/// Source fields without a counterpart and unsettable target fields are
/// skipped.
pub fn marshal<S: Reflect, T: Reflect>(source: &S, target: &mut T) -> Result<()> {
    Marshaller::default().marshal(source, target)
}

/// Like [`marshal`], but every source field must land on a settable target
/// field.
pub fn marshal_strict<S: Reflect, T: Reflect>(source: &S, target: &mut T) -> Result<()> {
    Marshaller::strict().marshal(source, target)
}

/// Dynamic form of [`marshal`]; see [`Marshaller::marshal_value`].
pub fn marshal_value(source: &Value, target: &mut Value) -> Result<()> {
    Marshaller::default().marshal_value(source, target)
}
