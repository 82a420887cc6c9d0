//! Marshalling options.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default bound on nested record levels and sequence elements.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// What to do when the source side of an indirection is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NilSource {
    /// Leave the target untouched (default)
    #[default]
    Skip,
    /// Reset the target to its zero value
    Clear,
    /// Fail with `nil source value`
    Error,
}

/// Which field wins when two fields of one record resolve to the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenameCollision {
    /// The later-declared field wins (default)
    #[default]
    LastWins,
    /// The earlier-declared field wins
    FirstWins,
    /// Fail with `rename collision`
    Error,
}

/// What happens to a nested record target when its conversion fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NestedWrites {
    /// Fields converted before the failure stay written (default)
    #[default]
    Keep,
    /// The target keeps its previous value
    Discard,
}

/// Options for a [`Marshaller`](crate::Marshaller).
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarshalConfig {
    /// Fail on source fields that are unmapped or land on unsettable fields
    pub strict: bool,
    /// Bound on nested record levels and sequence elements
    pub max_depth: usize,
    pub nil_source: NilSource,
    pub rename_collision: RenameCollision,
    pub nested_writes: NestedWrites,
}

impl Default for MarshalConfig {
    fn default() -> Self {
        Self {
            strict: false,
            max_depth: DEFAULT_MAX_DEPTH,
            nil_source: NilSource::default(),
            rename_collision: RenameCollision::default(),
            nested_writes: NestedWrites::default(),
        }
    }
}

impl MarshalConfig {
    /// Default options with strict mode on.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Parse options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::Config("maxDepth must be at least 1".into()));
        }
        Ok(())
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_nil_source(mut self, nil_source: NilSource) -> Self {
        self.nil_source = nil_source;
        self
    }

    pub fn with_rename_collision(mut self, rename_collision: RenameCollision) -> Self {
        self.rename_collision = rename_collision;
        self
    }

    pub fn with_nested_writes(mut self, nested_writes: NestedWrites) -> Self {
        self.nested_writes = nested_writes;
        self
    }
}
