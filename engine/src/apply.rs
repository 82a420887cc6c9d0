//! The value applier.
//!
//! Transferring one value onto another walks a fixed, ordered chain of
//! strategies. The first strategy to claim the pair decides the outcome; if
//! none does, the types are incompatible.
//!
//! # Order
//!
//! 1. [`Strategy::Sequence`]: either side is a sequence. Comes first because
//!    two sequences may be type-identical (bulk append) or differ in element
//!    type (element-by-element conversion).
//! 2. [`Strategy::ExactType`]: identical types, value copy.
//! 3. [`Strategy::NestedRecord`]: two different record types, converted by a
//!    nested field-matching pass.
//! 4. [`Strategy::Indirection`]: dereference an optional source, or box a
//!    direct source into an optional target.
//!
//! Sequence elements are converted with the chain minus the sequence step.
//!
//! # Depth
//!
//! Only nested record passes and sequence elements count towards
//! [`MarshalConfig::max_depth`]. Dereferencing and boxing stay at the level
//! of the field they work on.
//!
//! # Ownership
//!
//! The value tree owns all of its data, so an exact-type match always copies.
//! A target never shares storage with the source, whatever the field kind.

use crate::config::{MarshalConfig, NestedWrites, NilSource};
use crate::custom::HookRegistry;
use crate::error::{Error, Result};
use crate::resolve::{resolve, RenameLookup};
use crate::types::TypeDesc;
use crate::value::{RecordValue, Value};

/// A conversion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sequence,
    ExactType,
    NestedRecord,
    Indirection,
}

/// Chain for field values.
pub const CHAIN: [Strategy; 4] = [
    Strategy::Sequence,
    Strategy::ExactType,
    Strategy::NestedRecord,
    Strategy::Indirection,
];

/// Chain for sequence elements.
pub const ELEMENT_CHAIN: [Strategy; 3] = [
    Strategy::ExactType,
    Strategy::NestedRecord,
    Strategy::Indirection,
];

/// Whether a strategy took responsibility for a value pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Applied,
    Declined,
}

/// Everything a single marshal call reads while recursing.
pub(crate) struct Context<'a> {
    pub(crate) config: &'a MarshalConfig,
    pub(crate) lookup: &'a dyn RenameLookup,
    pub(crate) hooks: &'a HookRegistry,
}

impl Context<'_> {
    /// Apply `source` onto `target` with the full chain.
    pub(crate) fn apply(&self, source: &Value, target: &mut Value, depth: usize) -> Result<()> {
        self.apply_chain(&CHAIN, source, target, depth)
    }

    fn apply_chain(
        &self,
        chain: &[Strategy],
        source: &Value,
        target: &mut Value,
        depth: usize,
    ) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(Error::TooDeep {
                limit: self.config.max_depth,
            });
        }

        for &strategy in chain {
            if self.run(strategy, source, target, depth)? == Claim::Applied {
                tracing::trace!(?strategy, depth, "strategy applied");
                return Ok(());
            }
        }

        Err(Error::TypesIncompatible {
            from: source.type_desc().to_string(),
            to: target.type_desc().to_string(),
        })
    }

    fn run(
        &self,
        strategy: Strategy,
        source: &Value,
        target: &mut Value,
        depth: usize,
    ) -> Result<Claim> {
        match strategy {
            Strategy::Sequence => self.apply_sequence(source, target, depth),
            Strategy::ExactType => Ok(apply_exact(source, target)),
            Strategy::NestedRecord => self.apply_nested(source, target, depth),
            Strategy::Indirection => self.apply_indirection(source, target, depth),
        }
    }

    fn apply_sequence(&self, source: &Value, target: &mut Value, depth: usize) -> Result<Claim> {
        match (source, target) {
            (Value::Seq(src), Value::Seq(dst)) => {
                if src.elem == dst.elem {
                    dst.items.extend(src.items.iter().cloned());
                    return Ok(Claim::Applied);
                }

                dst.items.reserve(src.items.len());
                for (index, item) in src.items.iter().enumerate() {
                    let mut element = dst.elem.zero_value();
                    self.apply_chain(&ELEMENT_CHAIN, item, &mut element, depth + 1)
                        .map_err(|e| e.at_index(index))?;
                    dst.items.push(element);
                }
                Ok(Claim::Applied)
            }
            (Value::Seq(_), _) => Err(Error::SequenceToNonSequence),
            (_, Value::Seq(_)) => Err(Error::NonSequenceToSequence),
            _ => Ok(Claim::Declined),
        }
    }

    fn apply_nested(&self, source: &Value, target: &mut Value, depth: usize) -> Result<Claim> {
        let (Value::Record(src), Value::Record(dst)) = (source, target) else {
            return Ok(Claim::Declined);
        };

        let mut working = dst.clone();
        let outcome = self.marshal_record(src, &mut working, depth + 1);
        if outcome.is_ok() || self.config.nested_writes == NestedWrites::Keep {
            *dst = working;
        }
        outcome.map(|()| Claim::Applied)
    }

    fn apply_indirection(&self, source: &Value, target: &mut Value, depth: usize) -> Result<Claim> {
        if let Value::Indirect(src) = source {
            return match src.value.as_deref() {
                Some(inner) => self
                    .apply_chain(&CHAIN, inner, target, depth)
                    .map(|()| Claim::Applied),
                None => self.apply_absent(&src.inner, target),
            };
        }

        let Value::Indirect(dst) = target else {
            return Ok(Claim::Declined);
        };

        if source.is_of(&dst.inner) {
            dst.value = Some(Box::new(source.clone()));
            return Ok(Claim::Applied);
        }

        if matches!(source, Value::Record(_)) && dst.inner.is_record() {
            let mut working = dst.inner.zero_value();
            self.apply_chain(&CHAIN, source, &mut working, depth)?;
            dst.value = Some(Box::new(working));
            return Ok(Claim::Applied);
        }

        Ok(Claim::Declined)
    }

    /// An absent source still has to be convertible to the target by type.
    fn apply_absent(&self, inner: &TypeDesc, target: &mut Value) -> Result<Claim> {
        let target_ty = target.type_desc();
        if !convertible(&CHAIN, inner, &target_ty) {
            return Err(Error::TypesIncompatible {
                from: inner.to_string(),
                to: target_ty.to_string(),
            });
        }

        match self.config.nil_source {
            NilSource::Skip => {
                tracing::debug!(ty = %target_ty, "absent source value skipped");
                Ok(Claim::Applied)
            }
            NilSource::Clear => {
                *target = target_ty.zero_value();
                Ok(Claim::Applied)
            }
            NilSource::Error => Err(Error::NilSource),
        }
    }

    /// Field-matching pass between two records.
    ///
    /// Writes land directly in `target`; a failure leaves the fields applied
    /// before it in place.
    pub(crate) fn marshal_record(
        &self,
        source: &RecordValue,
        target: &mut RecordValue,
        depth: usize,
    ) -> Result<()> {
        source.check_shape()?;
        target.check_shape()?;

        let collisions = self.config.rename_collision;
        let source_fields = resolve(source, target.identity(), self.lookup, collisions)?;
        let target_fields = resolve(target, source.identity(), self.lookup, collisions)?;

        for (name, source_index) in source_fields.iter() {
            let Some(target_index) = target_fields.get(name) else {
                if self.config.strict {
                    return Err(Error::Unmapped.at(name));
                }
                tracing::debug!(field = name, record = %target.identity(), "no counterpart, skipped");
                continue;
            };

            if !target.decls()[target_index].settable {
                if self.config.strict {
                    return Err(Error::NotSettable.at(name));
                }
                tracing::debug!(field = name, record = %target.identity(), "target not settable, skipped");
                continue;
            }

            let value = &source.values()[source_index];
            let slot = &mut target.values_mut()[target_index];
            self.apply(value, slot, depth).map_err(|e| e.at(name))?;
        }

        self.hooks.run(source, target)
    }
}

/// Whether a value of type `from` could be applied to a `to` by `chain`.
///
/// Mirrors the strategies on types alone. Record pairs count as convertible;
/// their fields are only checked once there is a value to convert.
fn convertible(chain: &[Strategy], from: &TypeDesc, to: &TypeDesc) -> bool {
    for &strategy in chain {
        match strategy {
            Strategy::Sequence => match (from, to) {
                (TypeDesc::Seq(a), TypeDesc::Seq(b)) => {
                    return a == b || convertible(&ELEMENT_CHAIN, a, b)
                }
                (TypeDesc::Seq(_), _) | (_, TypeDesc::Seq(_)) => return false,
                _ => {}
            },
            Strategy::ExactType if from == to => return true,
            Strategy::ExactType => {}
            Strategy::NestedRecord if from.is_record() && to.is_record() => return true,
            Strategy::NestedRecord => {}
            Strategy::Indirection => {
                if let TypeDesc::Indirect(inner) = from {
                    return convertible(&CHAIN, inner, to);
                }
                if let TypeDesc::Indirect(inner) = to {
                    return **inner == *from || (from.is_record() && inner.is_record());
                }
            }
        }
    }
    false
}

fn apply_exact(source: &Value, target: &mut Value) -> Claim {
    if !source.same_type(target) {
        return Claim::Declined;
    }
    target.clone_from(source);
    Claim::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::DeclaredRenames;
    use crate::types::ScalarKind;
    use crate::value::{IndirectValue, Scalar};
    use crate::Reflect;

    #[derive(Debug, Clone, Default, PartialEq, Reflect)]
    struct TwoIntsA {
        first: i64,
        #[recast(rename(TwoIntsB = "second_b"))]
        second: i64,
    }

    #[derive(Debug, Clone, Default, PartialEq, Reflect)]
    struct TwoIntsB {
        second_b: i64,
        first: i64,
    }

    #[derive(Debug, Clone, Default, PartialEq, Reflect)]
    struct StringFirst {
        first: String,
    }

    fn with_context<R>(config: MarshalConfig, f: impl FnOnce(&Context<'_>) -> R) -> R {
        let hooks = HookRegistry::new();
        let cx = Context {
            config: &config,
            lookup: &DeclaredRenames,
            hooks: &hooks,
        };
        f(&cx)
    }

    fn apply(source: &Value, target: &mut Value) -> Result<()> {
        with_context(MarshalConfig::default(), |cx| cx.apply(source, target, 0))
    }

    fn string(s: &str) -> Value {
        Value::Scalar(Scalar::String(s.into()))
    }

    #[test]
    fn chain_order() {
        assert_eq!(CHAIN[0], Strategy::Sequence);
        assert_eq!(&CHAIN[1..], &ELEMENT_CHAIN[..]);
    }

    #[test]
    fn exact_type_copies() {
        let mut target = string("");
        apply(&string("match"), &mut target).unwrap();
        assert_eq!(target, string("match"));
    }

    #[test]
    fn scalar_mismatch_is_incompatible() {
        let mut target = string("");
        let err = apply(&100i64.to_value(), &mut target).unwrap_err();
        assert_eq!(
            err,
            Error::TypesIncompatible {
                from: "i64".into(),
                to: "String".into()
            }
        );
        assert_eq!(err.to_string(), "types incompatible");
    }

    #[test]
    fn identical_sequences_append() {
        let source = vec!["c".to_string()].to_value();
        let mut target = vec!["a".to_string(), "b".to_string()].to_value();
        apply(&source, &mut target).unwrap();
        assert_eq!(
            <Vec<String>>::from_value(target).unwrap(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn sequence_elements_convert() {
        let source = vec![TwoIntsA {
            first: 10,
            second: 20,
        }]
        .to_value();
        let mut target = <Vec<TwoIntsB>>::type_desc().zero_value();
        apply(&source, &mut target).unwrap();
        assert_eq!(
            <Vec<TwoIntsB>>::from_value(target).unwrap(),
            vec![TwoIntsB {
                second_b: 20,
                first: 10
            }]
        );
    }

    #[test]
    fn sequence_mismatch_is_directional() {
        let mut scalar = string("");
        let err = apply(&vec![1i64].to_value(), &mut scalar).unwrap_err();
        assert_eq!(err, Error::SequenceToNonSequence);

        let mut seq = <Vec<i64>>::type_desc().zero_value();
        let err = apply(&1i64.to_value(), &mut seq).unwrap_err();
        assert_eq!(err, Error::NonSequenceToSequence);
    }

    #[test]
    fn element_failure_aborts_with_index() {
        let source = vec![
            StringFirst {
                first: "x".into(),
            },
            StringFirst {
                first: "y".into(),
            },
        ]
        .to_value();
        let mut target = <Vec<TwoIntsB>>::type_desc().zero_value();
        let err = apply(&source, &mut target).unwrap_err();
        assert_eq!(err.to_string(), "[0]: first: types incompatible");
    }

    #[test]
    fn elements_do_not_nest_sequence_strategy() {
        let source = vec![vec![1i64]].to_value();
        let mut target = <Vec<Vec<i32>>>::type_desc().zero_value();
        let err = apply(&source, &mut target).unwrap_err();
        assert_eq!(err.path(), vec!["[0]"]);
        assert!(matches!(err.cause(), Error::TypesIncompatible { .. }));
    }

    #[test]
    fn nested_record_by_name_and_directive() {
        let source = TwoIntsA {
            first: 1,
            second: 2,
        }
        .to_value();
        let mut target = TwoIntsB::default().to_value();
        apply(&source, &mut target).unwrap();
        assert_eq!(
            TwoIntsB::from_value(target).unwrap(),
            TwoIntsB {
                second_b: 2,
                first: 1
            }
        );
    }

    #[test]
    fn nested_partial_write_kept_or_discarded() {
        #[derive(Debug, Default, PartialEq, Reflect)]
        struct Mixed {
            second_b: i64,
            first: String,
        }
        let source = Mixed {
            second_b: 5,
            first: "bad".into(),
        }
        .to_value();

        let mut kept = TwoIntsB::default().to_value();
        assert!(apply(&source, &mut kept).is_err());
        assert_eq!(TwoIntsB::from_value(kept).unwrap().second_b, 5);

        let mut discarded = TwoIntsB::default().to_value();
        let config = MarshalConfig::default().with_nested_writes(NestedWrites::Discard);
        let err = with_context(config, |cx| cx.apply(&source, &mut discarded, 0)).unwrap_err();
        assert_eq!(err.to_string(), "first: types incompatible");
        assert_eq!(TwoIntsB::from_value(discarded).unwrap(), TwoIntsB::default());
    }

    #[test]
    fn indirect_source_dereferenced() {
        let mut target = string("");
        apply(&Some("match".to_string()).to_value(), &mut target).unwrap();
        assert_eq!(target, string("match"));
    }

    #[test]
    fn direct_source_boxed() {
        let mut target = <Option<String>>::type_desc().zero_value();
        apply(&string("match"), &mut target).unwrap();
        assert_eq!(
            <Option<String>>::from_value(target).unwrap(),
            Some("match".to_string())
        );
    }

    #[test]
    fn record_into_indirect_other_record() {
        let source = TwoIntsA {
            first: 10,
            second: 20,
        }
        .to_value();
        let mut target = <Option<TwoIntsB>>::type_desc().zero_value();
        apply(&source, &mut target).unwrap();
        assert_eq!(
            <Option<TwoIntsB>>::from_value(target).unwrap(),
            Some(TwoIntsB {
                second_b: 20,
                first: 10
            })
        );
    }

    #[test]
    fn indirect_to_indirect_other_record() {
        let source = Some(TwoIntsA {
            first: 10,
            second: 20,
        })
        .to_value();
        let mut target = <Option<TwoIntsB>>::type_desc().zero_value();
        apply(&source, &mut target).unwrap();
        assert_eq!(
            <Option<TwoIntsB>>::from_value(target).unwrap().map(|b| b.second_b),
            Some(20)
        );
    }

    #[test]
    fn scalar_into_indirect_other_scalar_fails() {
        let mut target = <Option<i64>>::type_desc().zero_value();
        let err = apply(&string("match"), &mut target).unwrap_err();
        assert!(matches!(err, Error::TypesIncompatible { .. }));
    }

    #[test]
    fn absent_source_policies() {
        let absent = Value::Indirect(IndirectValue::none(TypeDesc::Scalar(ScalarKind::String)));

        let mut skipped = string("keep");
        apply(&absent, &mut skipped).unwrap();
        assert_eq!(skipped, string("keep"));

        let mut cleared = string("keep");
        let config = MarshalConfig::default().with_nil_source(NilSource::Clear);
        with_context(config, |cx| cx.apply(&absent, &mut cleared, 0)).unwrap();
        assert_eq!(cleared, string(""));

        let mut failed = string("keep");
        let config = MarshalConfig::default().with_nil_source(NilSource::Error);
        let err = with_context(config, |cx| cx.apply(&absent, &mut failed, 0)).unwrap_err();
        assert_eq!(err, Error::NilSource);
    }

    #[test]
    fn maps_only_copy_exactly() {
        use std::collections::BTreeMap;

        let mut m = BTreeMap::new();
        m.insert("k".to_string(), 1i64);

        let mut same = <BTreeMap<String, i64>>::type_desc().zero_value();
        apply(&m.to_value(), &mut same).unwrap();
        assert_eq!(<BTreeMap<String, i64>>::from_value(same).unwrap(), m);

        let mut other = <BTreeMap<String, i32>>::type_desc().zero_value();
        let err = apply(&m.to_value(), &mut other).unwrap_err();
        assert!(matches!(err, Error::TypesIncompatible { .. }));
    }

    #[derive(Debug, Clone, Default, PartialEq, Reflect)]
    struct Link {
        next: Option<Box<Link>>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Reflect)]
    struct OtherLink {
        next: Option<Box<OtherLink>>,
    }

    fn links(len: usize) -> Value {
        let mut link = Link { next: None };
        for _ in 1..len {
            link = Link {
                next: Some(Box::new(link)),
            };
        }
        link.to_value()
    }

    #[test]
    fn depth_counts_record_levels() {
        let config = MarshalConfig::default().with_max_depth(3);

        let mut target = OtherLink::default().to_value();
        with_context(config.clone(), |cx| cx.apply(&links(3), &mut target, 0)).unwrap();

        let mut target = OtherLink::default().to_value();
        let err = with_context(config, |cx| cx.apply(&links(4), &mut target, 0)).unwrap_err();
        assert_eq!(err.cause(), &Error::TooDeep { limit: 3 });
        assert_eq!(err.path(), vec!["next"; 4]);
    }

    #[test]
    fn indirection_does_not_count_towards_depth() {
        let mut source = 7i64.to_value();
        let mut source_ty = TypeDesc::Scalar(ScalarKind::I64);
        for _ in 0..5 {
            source = Value::Indirect(IndirectValue::some(source_ty.clone(), source));
            source_ty = TypeDesc::indirect(source_ty);
        }

        let mut target = 0i64.to_value();
        let config = MarshalConfig::default().with_max_depth(1);
        with_context(config, |cx| cx.apply(&source, &mut target, 0)).unwrap();
        assert_eq!(target, 7i64.to_value());
    }

    #[test]
    fn absent_source_checked_by_type() {
        let absent = <Option<String>>::type_desc().zero_value();

        for policy in [NilSource::Skip, NilSource::Clear, NilSource::Error] {
            let mut target = 5i64.to_value();
            let config = MarshalConfig::default().with_nil_source(policy);
            let err = with_context(config, |cx| cx.apply(&absent, &mut target, 0)).unwrap_err();
            assert_eq!(
                err,
                Error::TypesIncompatible {
                    from: "String".into(),
                    to: "i64".into()
                }
            );
            assert_eq!(target, 5i64.to_value());
        }
    }

    #[test]
    fn absent_record_into_optional_other_record() {
        let absent = <Option<TwoIntsA>>::type_desc().zero_value();
        let mut target = Some(TwoIntsB::default()).to_value();
        let config = MarshalConfig::default().with_nil_source(NilSource::Clear);
        with_context(config, |cx| cx.apply(&absent, &mut target, 0)).unwrap();
        assert_eq!(<Option<TwoIntsB>>::from_value(target).unwrap(), None);
    }

    #[test]
    fn type_level_convertibility() {
        let string = TypeDesc::Scalar(ScalarKind::String);
        let int = TypeDesc::Scalar(ScalarKind::I64);
        let a = TwoIntsA::type_desc();
        let b = TwoIntsB::type_desc();

        assert!(convertible(&CHAIN, &string, &string));
        assert!(!convertible(&CHAIN, &string, &int));
        assert!(convertible(&CHAIN, &a, &b));
        assert!(convertible(&CHAIN, &a, &TypeDesc::indirect(b.clone())));
        assert!(convertible(&CHAIN, &TypeDesc::indirect(string.clone()), &string));
        assert!(!convertible(&CHAIN, &string, &TypeDesc::indirect(int.clone())));
        assert!(convertible(&CHAIN, &TypeDesc::seq(a.clone()), &TypeDesc::seq(b)));
        assert!(!convertible(&CHAIN, &TypeDesc::seq(string.clone()), &string));
        assert!(!convertible(
            &CHAIN,
            &TypeDesc::indirect(TypeDesc::seq(int.clone())),
            &TypeDesc::seq(int)
        ));
        assert!(!convertible(
            &CHAIN,
            &TypeDesc::seq(TypeDesc::seq(a.clone())),
            &TypeDesc::seq(TypeDesc::seq(TwoIntsB::type_desc()))
        ));
    }
}
