//! Top-level decoding of one configuration file.

use factory_core::{Pipeline, Stage};
use hcl::Body;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::pipeline::decode_pipeline_block;
use crate::schema::{self, BlockHeaderSchema, BodySchema};
use crate::stage::decode_stage_block;
use crate::value::to_display_string;
use crate::variables::{Scope, Variables, decode_variables_block};
use crate::{ConfigError, Diagnostic, Diagnostics, Subject};

static FILE_SCHEMA: BodySchema = BodySchema {
    attributes: &[],
    blocks: &[
        BlockHeaderSchema {
            kind: "pipeline",
            labels: &["name"],
        },
        BlockHeaderSchema {
            kind: "variables",
            labels: &[],
        },
        BlockHeaderSchema {
            kind: "stage",
            labels: &["name"],
        },
    ],
};

/// One decoded configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct File {
    pub pipelines: Vec<Pipeline>,
    pub stages: Vec<Stage>,
    pub variables: Variables,
}

impl File {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipeline(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Evaluation context for the global scope (`None`) or a stage.
    pub fn eval_context(&self, stage: Option<&str>) -> hcl::eval::Context<'static> {
        self.variables.effective_context(stage)
    }
}

/// Decode a parsed file body.
///
/// Top-level blocks are visited in source order. A `variables` block only
/// affects the blocks that come after it. Decoding never stops early; the
/// returned file holds whatever could be decoded and the diagnostics hold
/// every problem found, in visiting order.
pub fn decode_file(body: &Body) -> (File, Diagnostics) {
    let root = Subject::root();
    let (content, mut diags) = schema::content(body, &FILE_SCHEMA, &root);

    let mut file = File::new();
    let mut pipeline_names = HashSet::new();
    let mut stage_names = HashSet::new();

    for block in content.blocks {
        let kind = block.identifier();
        match kind {
            "pipeline" => {
                debug!(kind = %kind, name = %schema::first_label(block), "Decoding block");
                let (pipeline, pipeline_diags) = decode_pipeline_block(block, &root);
                diags.extend(pipeline_diags);
                if !pipeline_names.insert(pipeline.name.clone()) {
                    diags.push(duplicate("pipeline", &pipeline.name, &root.block(block)));
                }
                file.pipelines.push(pipeline);
            }
            "variables" => {
                debug!(kind = %kind, "Decoding block");
                diags.extend(decode_variables_block(
                    block,
                    &mut file.variables,
                    Scope::Global,
                    &root,
                ));
            }
            "stage" => {
                debug!(kind = %kind, name = %schema::first_label(block), "Decoding block");
                let (stage, stage_diags) = decode_stage_block(block, &mut file.variables, &root);
                diags.extend(stage_diags);
                if !stage_names.insert(stage.name.clone()) {
                    diags.push(duplicate("stage", &stage.name, &root.block(block)));
                }
                file.stages.push(stage);
            }
            _ => debug!(kind = %kind, "Ignoring block"),
        }
    }

    (file, diags)
}

fn duplicate(kind: &str, name: &str, subject: &Subject) -> Diagnostic {
    let err = ConfigError::Duplicate(format!(
        "{} {:?} is already declared in this file",
        kind, name
    ));
    Diagnostic::from_error(format!("Duplicate {}", kind), &err).with_subject(subject)
}

fn indent(level: usize) -> String {
    "  ".repeat(level)
}

fn write_list(
    f: &mut fmt::Formatter<'_>,
    level: usize,
    label: &str,
    items: &[String],
) -> fmt::Result {
    if items.is_empty() {
        return writeln!(f, "{}{}: []", indent(level), label);
    }
    writeln!(f, "{}{}: [", indent(level), label)?;
    for item in items {
        writeln!(f, "{}{}", indent(level + 1), item)?;
    }
    writeln!(f, "{}]", indent(level))
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File {{")?;

        writeln!(f, "{}Pipelines: [", indent(1))?;
        for pipeline in &self.pipelines {
            writeln!(f, "{}{}: {{", indent(2), pipeline.name)?;
            writeln!(f, "{}Filter: {{", indent(3))?;
            for (label, rule) in [
                ("Include", &pipeline.filter.include),
                ("Exclude", &pipeline.filter.exclude),
            ] {
                writeln!(f, "{}{}: {{", indent(4), label)?;
                write_list(f, 5, "Paths", &rule.paths)?;
                write_list(f, 5, "Branches", &rule.branches)?;
                writeln!(f, "{}}}", indent(4))?;
            }
            writeln!(f, "{}}}", indent(3))?;
            writeln!(f, "{}Stage Definitions: [", indent(3))?;
            for definition in &pipeline.stages {
                writeln!(f, "{}{}", indent(4), definition.name)?;
                write_list(f, 5, "Depends On", &definition.depends_on)?;
                write_list(f, 5, "Namespaces", &definition.namespaces)?;
            }
            writeln!(f, "{}]", indent(3))?;
            writeln!(f, "{}}}", indent(2))?;
        }
        writeln!(f, "{}]", indent(1))?;

        writeln!(f, "{}Global Variables: [", indent(1))?;
        for (name, value) in self.variables.global_variables() {
            writeln!(f, "{}{} = {}", indent(2), name, to_display_string(value))?;
        }
        writeln!(f, "{}]", indent(1))?;

        writeln!(f, "{}Stage Variables: [", indent(1))?;
        for (stage, vars) in self.variables.stage_variables() {
            writeln!(f, "{}{}: [", indent(2), stage)?;
            for (name, value) in vars {
                writeln!(f, "{}{} = {}", indent(3), name, to_display_string(value))?;
            }
            writeln!(f, "{}]", indent(2))?;
        }
        writeln!(f, "{}]", indent(1))?;

        writeln!(f, "{}Stages: [", indent(1))?;
        for stage in &self.stages {
            writeln!(f, "{}{}: [", indent(2), stage.name)?;
            for run in &stage.run_blocks {
                writeln!(f, "{}{}: {{", indent(3), run.name)?;
                for command in &run.commands {
                    writeln!(f, "{}command: {}", indent(4), command)?;
                }
                if run.has_file() {
                    writeln!(f, "{}file: {}", indent(4), run.file)?;
                }
                writeln!(f, "{}}}", indent(3))?;
            }
            writeln!(f, "{}]", indent(2))?;
        }
        writeln!(f, "{}]", indent(1))?;

        writeln!(f, "}}")
    }
}
