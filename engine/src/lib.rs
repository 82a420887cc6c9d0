//! # Recast Engine
//!
//! Struct-to-struct conversion by field name.
//!
//! This crate copies the contents of one record type into another, matching
//! fields by name. Fields can be renamed per counterpart type, nested records
//! are converted recursively, and sequences are converted element by element.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine only rewrites values
//! - **Deterministic**: same inputs, same writes, same errors
//! - **Reflection by derive**: types describe themselves through [`Reflect`]
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A record is a struct with named fields deriving [`Reflect`]. Two records
//! are the same type only if their module-qualified names match.
//!
//! ### Field Resolution
//!
//! Before fields are matched, both records are resolved against each other:
//! each field gets the name its rename directive gives it for the other type,
//! or keeps its declared name. See [`resolve`].
//!
//! ### Strategies
//!
//! Each matched pair of values is applied through a fixed chain of
//! [`Strategy`]s:
//! - [`Strategy::Sequence`] - bulk append or element-wise conversion
//! - [`Strategy::ExactType`] - value copy
//! - [`Strategy::NestedRecord`] - recursive field matching
//! - [`Strategy::Indirection`] - dereference or box
//!
//! Failures carry the path of field names down to the cause:
//! `SubStruct: First: types incompatible`.
//!
//! ## Quick Start
//!
//! ```rust
//! use recast_engine::{marshal, marshal_strict, Reflect};
//!
//! #[derive(Debug, Default, Reflect)]
//! struct Tagged {
//!     match_string: String,
//!     #[recast(rename(Untagged = "mapped"))]
//!     name: String,
//!     unmatched: String,
//! }
//!
//! #[derive(Debug, Default, Reflect)]
//! struct Untagged {
//!     match_string: String,
//!     mapped: String,
//! }
//!
//! let source = Tagged {
//!     match_string: "match".into(),
//!     name: "renamed".into(),
//!     unmatched: "dropped".into(),
//! };
//!
//! // 1. Lenient: unmatched fields are skipped
//! let mut out = Untagged::default();
//! marshal(&source, &mut out).unwrap();
//! assert_eq!(out.match_string, "match");
//! assert_eq!(out.mapped, "renamed");
//!
//! // 2. Strict: every source field must land somewhere
//! let err = marshal_strict(&source, &mut Untagged::default()).unwrap_err();
//! assert_eq!(err.to_string(), "unmatched: no corresponding target field");
//! ```
//!
//! ## Configuration
//!
//! [`MarshalConfig`] holds the options and deserializes from JSON, so a
//! [`Marshaller`] can be set up from a config file together with a
//! [`RenameTable`].

extern crate self as recast_engine;

pub mod apply;
pub mod config;
pub mod custom;
pub mod error;
pub mod marshal;
pub mod reflect;
pub mod resolve;
pub mod types;
pub mod value;

// Re-export main types at crate root
pub use apply::{Strategy, CHAIN, ELEMENT_CHAIN};
pub use config::{MarshalConfig, NestedWrites, NilSource, RenameCollision, DEFAULT_MAX_DEPTH};
pub use custom::{Custom, HookRegistry};
pub use error::{Error, Result};
pub use marshal::{marshal, marshal_strict, marshal_value, Marshaller};
pub use recast_derive::Reflect;
pub use reflect::{Reflect, ReflectRecord};
pub use resolve::{
    resolve, Correspondence, DeclaredRenames, Fallback, RenameEntry, RenameLookup, RenameTable,
};
pub use types::{FieldDecl, RecordType, RenameDirective, ScalarKind, TypeDesc, TypeIdentity};
pub use value::{IndirectValue, MapValue, RecordValue, Scalar, SeqValue, Value};
