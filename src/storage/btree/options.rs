use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{IndexError, Result};

/// Default number of pairs per leaf.
pub const DEFAULT_LEAF_CAPACITY: usize = 128;
/// Default number of separators per interior node.
pub const DEFAULT_INTERIOR_CAPACITY: usize = 128;

/// Configuration knobs for the B+ tree.
///
/// Capacities are fixed per node at allocation time; every leaf gets `leaf_capacity`
/// and every interior node (including a freshly grown root) gets `interior_capacity`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BPlusTreeOptions {
    /// Maximum pairs per leaf node.
    pub leaf_capacity: usize,
    /// Maximum separator pairs per interior node. A root grown by a split uses this
    /// capacity too.
    pub interior_capacity: usize,
}

impl Default for BPlusTreeOptions {
    fn default() -> Self {
        Self {
            leaf_capacity: DEFAULT_LEAF_CAPACITY,
            interior_capacity: DEFAULT_INTERIOR_CAPACITY,
        }
    }
}

impl BPlusTreeOptions {
    /// Options with the given leaf capacity and the default interior capacity.
    pub fn with_leaf_capacity(leaf_capacity: usize) -> Self {
        Self {
            leaf_capacity,
            ..Self::default()
        }
    }

    /// Checks that both halves of a split keep at least one pair, so every interior node
    /// keeps a separator.
    pub fn validate(&self) -> Result<()> {
        if self.leaf_capacity < 2 {
            return Err(IndexError::InvalidArgument(
                "leaf capacity must be at least 2",
            ));
        }
        if self.interior_capacity < 2 {
            return Err(IndexError::InvalidArgument(
                "interior capacity must be at least 2",
            ));
        }
        Ok(())
    }

    /// Parses options from TOML text. Missing fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self =
            toml::from_str(text).map_err(|err| IndexError::Config(err.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Renders the options as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|err| IndexError::Config(err.to_string()))
    }
}
