//! Pipeline and filter definitions.

use serde::{Deserialize, Serialize};

use crate::Result;

/// A named build/deploy pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline name, taken from the block label.
    pub name: String,
    /// Path/branch filter. Always present, empty when not declared.
    pub filter: Filter,
    /// Stage definitions in declaration order.
    pub stages: Vec<StageDefinition>,
}

impl Pipeline {
    /// Create an empty pipeline, rejecting blank names.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        crate::validate_name("pipeline", &name)?;
        Ok(Self {
            name,
            ..Self::default()
        })
    }

    /// Look up a stage definition by name.
    pub fn stage(&self, name: &str) -> Option<&StageDefinition> {
        self.stages.iter().find(|s| s.name == name)
    }
}

/// Include/exclude rule set. Patterns are stored verbatim and never
/// compiled here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub include: FilterRule,
    pub exclude: FilterRule,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// One side of a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    /// Path glob patterns.
    pub paths: Vec<String>,
    /// Branch glob patterns.
    pub branches: Vec<String>,
}

impl FilterRule {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.branches.is_empty()
    }
}

/// Ordering metadata for a stage inside a pipeline.
///
/// `depends_on` entries are plain names and are not checked against the
/// stages of the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub name: String,
    pub depends_on: Vec<String>,
    pub namespaces: Vec<String>,
}
