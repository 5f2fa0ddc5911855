//! `stage` and `run` block decoding.

use factory_core::{RunBlock, Stage};
use hcl::eval::Evaluate;
use hcl::{Attribute, Block};
use tracing::debug;

use crate::schema::{self, AttributeSchema, BlockHeaderSchema, BodySchema};
use crate::value;
use crate::variables::{Scope, Variables, decode_variables_block};
use crate::{ConfigError, Diagnostic, Diagnostics, Subject};

static STAGE_SCHEMA: BodySchema = BodySchema {
    attributes: &[],
    blocks: &[
        BlockHeaderSchema {
            kind: "variables",
            labels: &[],
        },
        BlockHeaderSchema {
            kind: "run",
            labels: &["name"],
        },
    ],
};

static RUN_SCHEMA: BodySchema = BodySchema {
    attributes: &[
        AttributeSchema {
            name: "command",
            required: false,
        },
        AttributeSchema {
            name: "file",
            required: false,
        },
    ],
    blocks: &[],
};

/// Decode a labeled `stage` block.
///
/// Nested `variables` and `run` blocks are handled strictly in source
/// order: a `variables` block updates the stage scope of `variables`
/// immediately, and a `run` block resolves against whatever has been
/// declared above it.
pub fn decode_stage_block(
    block: &Block,
    variables: &mut Variables,
    parent: &Subject,
) -> (Stage, Diagnostics) {
    let subject = parent.block(block);
    let name = schema::first_label(block);
    let (content, mut diags) = schema::content(block.body(), &STAGE_SCHEMA, &subject);

    let mut stage = match Stage::new(name) {
        Ok(stage) => stage,
        Err(err) => {
            diags.push(
                Diagnostic::from_error("Invalid stage name", &ConfigError::from(err))
                    .with_subject(&subject),
            );
            Stage {
                name: name.to_string(),
                ..Stage::default()
            }
        }
    };

    for inner in content.blocks {
        match inner.identifier() {
            "variables" => {
                debug!(stage = %name, "Decoding stage variables");
                diags.extend(decode_variables_block(
                    inner,
                    variables,
                    Scope::Stage(name),
                    &subject,
                ));
            }
            "run" => {
                let (run, run_diags) = decode_run_block(inner, variables, name, &subject);
                diags.extend(run_diags);
                stage.run_blocks.push(run);
            }
            _ => {}
        }
    }

    (stage, diags)
}

/// Decode a labeled `run` block, resolving `command` and `file` against
/// the effective variables of `stage_name` at this point of the decode.
pub fn decode_run_block(
    block: &Block,
    variables: &Variables,
    stage_name: &str,
    parent: &Subject,
) -> (RunBlock, Diagnostics) {
    let subject = parent.block(block);
    let (content, mut diags) = schema::content(block.body(), &RUN_SCHEMA, &subject);

    let mut run = RunBlock::new(schema::first_label(block));
    debug!(stage = %stage_name, run = %run.name, "Decoding run block");

    if let Some(attr) = content.attribute("command") {
        match resolve_string(attr, variables, stage_name) {
            Ok(command) => run.commands.push(command),
            Err(err) => diags.push(
                Diagnostic::from_error("Invalid command", &err)
                    .with_subject(&subject.child(attr.key())),
            ),
        }
    }

    if let Some(attr) = content.attribute("file") {
        match resolve_string(attr, variables, stage_name) {
            Ok(file) => run.file = file,
            Err(err) => diags.push(
                Diagnostic::from_error("Invalid file", &err)
                    .with_subject(&subject.child(attr.key())),
            ),
        }
    }

    (run, diags)
}

fn resolve_string(
    attr: &Attribute,
    variables: &Variables,
    stage_name: &str,
) -> Result<String, ConfigError> {
    let ctx = variables.effective_context(Some(stage_name));
    let resolved = attr.expr().evaluate(&ctx)?;
    value::expect_string(&resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcl::Value;

    fn decode(src: &str, variables: &mut Variables) -> (Stage, Diagnostics) {
        let body = hcl::parse(src).unwrap();
        let block = body.blocks().next().unwrap();
        decode_stage_block(block, variables, &Subject::root())
    }

    #[test]
    fn test_decode_stage_block() {
        let mut variables = Variables::new();
        let (stage, diags) = decode(
            r#"
            stage "stage1" {
                variables {
                    foo = "bar"
                }
                run "Install Docker" {
                    command = "apt-get install docker"
                }
                run "Push Docker Image" {
                    file = "push.sh"
                }
            }
        "#,
            &mut variables,
        );

        assert!(!diags.has_errors(), "{}", diags);
        assert_eq!(stage.name, "stage1");
        assert_eq!(
            variables.stage("stage1").unwrap().get("foo"),
            Some(&Value::from("bar"))
        );
        assert_eq!(stage.run_blocks.len(), 2);

        let install = &stage.run_blocks[0];
        assert_eq!(install.name, "Install Docker");
        assert_eq!(install.commands, vec!["apt-get install docker"]);
        assert_eq!(install.file, "");

        let push = &stage.run_blocks[1];
        assert_eq!(push.name, "Push Docker Image");
        assert!(push.commands.is_empty());
        assert_eq!(push.file, "push.sh");
    }

    #[test]
    fn test_run_blocks_see_variables_in_source_order() {
        let mut variables = Variables::new();
        let (stage, diags) = decode(
            r#"
            stage "s1" {
                variables {
                    x = "1"
                }
                run "first" {
                    command = "echo ${var.x}"
                }
                variables {
                    x = "2"
                }
                run "second" {
                    command = "echo ${var.x}"
                }
            }
        "#,
            &mut variables,
        );

        assert!(!diags.has_errors(), "{}", diags);
        assert_eq!(stage.run_blocks[0].commands, vec!["echo 1"]);
        assert_eq!(stage.run_blocks[1].commands, vec!["echo 2"]);
    }

    #[test]
    fn test_stage_variables_override_global() {
        let mut variables = Variables::new();
        variables.insert_global("env", Value::from("staging"));
        variables.insert_global("app", Value::from("api"));

        let (stage, diags) = decode(
            r#"
            stage "deploy" {
                variables {
                    env = "production"
                }
                run "ship" {
                    command = "deploy ${var.app} to ${var.env}"
                    file    = "scripts/${var.env}.sh"
                }
            }
        "#,
            &mut variables,
        );

        assert!(!diags.has_errors(), "{}", diags);
        let run = &stage.run_blocks[0];
        assert_eq!(run.commands, vec!["deploy api to production"]);
        assert_eq!(run.file, "scripts/production.sh");
        assert_eq!(
            variables.global_variables().get("env"),
            Some(&Value::from("staging"))
        );
    }

    #[test]
    fn test_run_block_errors_are_collected() {
        let mut variables = Variables::new();
        let (stage, diags) = decode(
            r#"
            stage "broken" {
                run "undefined" {
                    command = "echo ${var.missing}"
                }
                run "number" {
                    command = 42
                    file    = ["a.sh"]
                }
                run "fine" {
                    command = "true"
                }
            }
        "#,
            &mut variables,
        );

        let summaries: Vec<&str> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Invalid command", "Invalid command", "Invalid file"]);
        assert_eq!(
            diags[1].subject.as_ref().unwrap().to_string(),
            "stage \"broken\" > run \"number\" > command"
        );
        assert_eq!(stage.run_blocks.len(), 3);
        assert!(stage.run_blocks[0].commands.is_empty());
        assert_eq!(stage.run_blocks[2].commands, vec!["true"]);
    }

    #[test]
    fn test_stage_scopes_are_isolated() {
        let mut variables = Variables::new();
        decode(
            r#"
            stage "a" {
                variables {
                    only_a = "yes"
                }
            }
        "#,
            &mut variables,
        );
        let (_, diags) = decode(
            r#"
            stage "b" {
                run "peek" {
                    command = "${var.only_a}"
                }
            }
        "#,
            &mut variables,
        );

        assert!(diags.has_errors());
    }

    #[test]
    fn test_run_rejects_unknown_arguments() {
        let mut variables = Variables::new();
        let (_, diags) = decode(
            r#"
            stage "s" {
                run "r" {
                    commands = "typo"
                }
            }
        "#,
            &mut variables,
        );

        assert_eq!(diags[0].summary, "Unsupported argument");
    }
}
