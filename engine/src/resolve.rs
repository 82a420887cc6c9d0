//! Field resolution.
//!
//! Resolving a record against the type on the other side produces a
//! [`Correspondence`]: resolved name to field position. A field's resolved
//! name is the rename directive for the other type if there is one, and its
//! declared name otherwise. Resolution is a flat scan of the record's own
//! declared fields and never recurses.

use crate::config::RenameCollision;
use crate::error::{Error, Result};
use crate::types::{FieldDecl, TypeIdentity};
use crate::value::RecordValue;
use serde::{Deserialize, Serialize};

/// Source of rename directives.
pub trait RenameLookup: Send + Sync {
    /// The name `field` of record type `owner` goes by on records of type `other`.
    fn rename_for(
        &self,
        owner: &TypeIdentity,
        field: &FieldDecl,
        other: &TypeIdentity,
    ) -> Option<String>;
}

/// Directives declared on the field itself (`#[recast(rename(...))]`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredRenames;

impl RenameLookup for DeclaredRenames {
    fn rename_for(
        &self,
        _owner: &TypeIdentity,
        field: &FieldDecl,
        other: &TypeIdentity,
    ) -> Option<String> {
        let by_key = |key: &str| field.renames.iter().find(|d| d.other == key);
        by_key(&other.qualified_name)
            .or_else(|| by_key(&other.name))
            .map(|d| d.name.clone())
    }
}

/// One entry of a [`RenameTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameEntry {
    /// Record owning the field (short or qualified name)
    pub record: String,
    /// Declared field name
    pub field: String,
    /// Other-side record (short or qualified name)
    pub other: String,
    /// Field name on the other side
    pub name: String,
}

/// Rename directives kept outside the types, e.g. loaded from configuration.
///
/// ```
/// use recast_engine::RenameTable;
///
/// let table = RenameTable::from_json(
///     r#"{"entries": [{"record": "TwoIntsA", "field": "second", "other": "TwoIntsB", "name": "second_b"}]}"#,
/// )
/// .unwrap();
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTable {
    #[serde(default)]
    entries: Vec<RenameEntry>,
}

impl RenameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Add an entry.
    pub fn insert(
        &mut self,
        record: impl Into<String>,
        field: impl Into<String>,
        other: impl Into<String>,
        name: impl Into<String>,
    ) -> &mut Self {
        self.entries.push(RenameEntry {
            record: record.into(),
            field: field.into(),
            other: other.into(),
            name: name.into(),
        });
        self
    }

    /// Builder-style method to add an entry.
    pub fn with(
        mut self,
        record: impl Into<String>,
        field: impl Into<String>,
        other: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.insert(record, field, other, name);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consult this table first, then the declared directives.
    pub fn or_declared(self) -> Fallback<RenameTable, DeclaredRenames> {
        Fallback::new(self, DeclaredRenames)
    }
}

impl RenameLookup for RenameTable {
    fn rename_for(
        &self,
        owner: &TypeIdentity,
        field: &FieldDecl,
        other: &TypeIdentity,
    ) -> Option<String> {
        let matches_owner =
            |e: &RenameEntry| e.record == owner.qualified_name || e.record == owner.name;
        let by_key = |key: &str| {
            self.entries
                .iter()
                .find(|e| matches_owner(e) && e.field == field.name && e.other == key)
        };
        by_key(&other.qualified_name)
            .or_else(|| by_key(&other.name))
            .map(|e| e.name.clone())
    }
}

/// Two lookups layered: `primary` wins, `fallback` fills the gaps.
#[derive(Debug, Clone, Default)]
pub struct Fallback<A, B> {
    primary: A,
    fallback: B,
}

impl<A, B> Fallback<A, B> {
    pub fn new(primary: A, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

impl<A: RenameLookup, B: RenameLookup> RenameLookup for Fallback<A, B> {
    fn rename_for(
        &self,
        owner: &TypeIdentity,
        field: &FieldDecl,
        other: &TypeIdentity,
    ) -> Option<String> {
        self.primary
            .rename_for(owner, field, other)
            .or_else(|| self.fallback.rename_for(owner, field, other))
    }
}

/// Resolved name to field position, for one record against one other type.
///
/// Iteration follows the declaration order of the winning fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correspondence {
    entries: Vec<(String, usize)>,
}

impl Correspondence {
    /// Position of the field resolved to `name`.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, index)| *index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(n, i)| (n.as_str(), *i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve the fields of `record` against the record type `other`.
pub fn resolve(
    record: &RecordValue,
    other: &TypeIdentity,
    lookup: &dyn RenameLookup,
    collisions: RenameCollision,
) -> Result<Correspondence> {
    let owner = record.identity();
    let mut entries: Vec<(String, usize)> = Vec::with_capacity(record.decls().len());

    for (index, decl) in record.decls().iter().enumerate() {
        let name = match lookup.rename_for(owner, decl, other) {
            Some(renamed) => {
                tracing::trace!(
                    record = %owner,
                    field = %decl.name,
                    other = %other,
                    resolved = %renamed,
                    "rename directive applied"
                );
                renamed
            }
            None => decl.name.clone(),
        };

        match entries.iter().position(|(n, _)| *n == name) {
            None => entries.push((name, index)),
            Some(existing) => match collisions {
                RenameCollision::LastWins => {
                    tracing::debug!(record = %owner, field = %name, "rename collision, later field wins");
                    entries.remove(existing);
                    entries.push((name, index));
                }
                RenameCollision::FirstWins => {
                    tracing::debug!(record = %owner, field = %name, "rename collision, earlier field wins");
                }
                RenameCollision::Error => return Err(Error::RenameCollision(name)),
            },
        }
    }

    Ok(Correspondence { entries })
}
