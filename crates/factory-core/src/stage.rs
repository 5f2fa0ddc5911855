//! Stage and run block definitions.

use serde::{Deserialize, Serialize};

use crate::Result;

/// A named unit of work made of run blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Stage name, taken from the block label.
    pub name: String,
    /// Run blocks in source order.
    pub run_blocks: Vec<RunBlock>,
}

impl Stage {
    /// Create an empty stage, rejecting blank names.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        crate::validate_name("stage", &name)?;
        Ok(Self {
            name,
            run_blocks: Vec::new(),
        })
    }

    /// Look up a run block by label.
    pub fn run_block(&self, name: &str) -> Option<&RunBlock> {
        self.run_blocks.iter().find(|r| r.name == name)
    }
}

/// One step of a stage.
///
/// Commands are fully resolved strings. `commands` and `file` may both be
/// set; nothing here enforces exclusivity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunBlock {
    pub name: String,
    pub commands: Vec<String>,
    /// Script path, empty when not declared.
    pub file: String,
}

impl RunBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_file(&self) -> bool {
        !self.file.is_empty()
    }
}
