//! Custom conversion hooks.
//!
//! A record type can refine what automatic field matching produced for a
//! specific counterpart type. Hooks run after the structural pass over each
//! record pair, top level and nested alike, and see the target as it stands
//! after that pass.

use crate::error::Result;
use crate::reflect::ReflectRecord;
use crate::value::{RecordValue, Value};
use crate::Reflect;
use std::collections::HashMap;

/// Hand-written conversion between `Self` and `Other`.
///
/// Register with [`Marshaller::with_custom`](crate::Marshaller::with_custom).
///
/// ```
/// use recast_engine::{Custom, Marshaller, Reflect, Result};
///
/// #[derive(Debug, Default, Reflect)]
/// struct Celsius {
///     degrees: f64,
/// }
///
/// #[derive(Debug, Default, Reflect)]
/// struct Fahrenheit {
///     degrees: f64,
/// }
///
/// impl Custom<Fahrenheit> for Celsius {
///     fn convert_to(&self, target: &mut Fahrenheit) -> Result<()> {
///         target.degrees = self.degrees * 9.0 / 5.0 + 32.0;
///         Ok(())
///     }
/// }
///
/// let marshaller = Marshaller::default().with_custom::<Celsius, Fahrenheit>();
/// let mut out = Fahrenheit::default();
/// marshaller.marshal(&Celsius { degrees: 100.0 }, &mut out).unwrap();
/// assert_eq!(out.degrees, 212.0);
/// ```
pub trait Custom<Other: ReflectRecord>: ReflectRecord {
    /// Refine `target` after `self` was marshalled into it.
    fn convert_to(&self, target: &mut Other) -> Result<()> {
        let _ = target;
        Ok(())
    }

    /// Refine `self` after `source` was marshalled into it.
    fn convert_from(&mut self, source: &Other) -> Result<()> {
        let _ = source;
        Ok(())
    }
}

type Hook = Box<dyn Fn(&RecordValue, &mut RecordValue) -> Result<()> + Send + Sync>;

/// Hooks keyed by (source, target) qualified type names.
#[derive(Default)]
pub struct HookRegistry {
    hooks: HashMap<(String, String), Vec<Hook>>,
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("pairs", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `A::convert_to` for `A -> B` and `A::convert_from` for `B -> A`.
    pub fn register<A, B>(&mut self)
    where
        A: Custom<B> + 'static,
        B: ReflectRecord + 'static,
    {
        let a = A::record_type().identity().qualified_name.clone();
        let b = B::record_type().identity().qualified_name.clone();

        self.insert(
            a.clone(),
            b.clone(),
            Box::new(|source: &RecordValue, target: &mut RecordValue| {
                let this = A::from_value(Value::Record(source.clone()))?;
                let mut other = B::from_value(Value::Record(target.clone()))?;
                this.convert_to(&mut other)?;
                write_back(other, target)
            }),
        );
        self.insert(
            b,
            a,
            Box::new(|source: &RecordValue, target: &mut RecordValue| {
                let other = B::from_value(Value::Record(source.clone()))?;
                let mut this = A::from_value(Value::Record(target.clone()))?;
                this.convert_from(&other)?;
                write_back(this, target)
            }),
        );
    }

    fn insert(&mut self, source: String, target: String, hook: Hook) {
        self.hooks.entry((source, target)).or_default().push(hook);
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook registered for this record pair, in registration order.
    pub fn run(&self, source: &RecordValue, target: &mut RecordValue) -> Result<()> {
        if self.hooks.is_empty() {
            return Ok(());
        }
        let key = (
            source.identity().qualified_name.clone(),
            target.identity().qualified_name.clone(),
        );
        let Some(hooks) = self.hooks.get(&key) else {
            return Ok(());
        };
        for hook in hooks {
            tracing::debug!(from = %key.0, to = %key.1, "running custom conversion");
            hook(source, target)?;
        }
        Ok(())
    }
}

fn write_back<T: Reflect>(value: T, target: &mut RecordValue) -> Result<()> {
    if let Value::Record(record) = value.to_value() {
        *target = record;
    }
    Ok(())
}
