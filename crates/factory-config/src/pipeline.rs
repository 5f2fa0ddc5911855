//! `pipeline` block decoding.

use factory_core::{Pipeline, StageDefinition};
use hcl::eval::{Context, Evaluate};
use hcl::{Attribute, Block, Map, Value};
use tracing::debug;

use crate::filter::decode_filter_block;
use crate::schema::{self, AttributeSchema, BlockHeaderSchema, BodySchema};
use crate::value;
use crate::{ConfigError, Diagnostic, Diagnostics, Subject};

static PIPELINE_SCHEMA: BodySchema = BodySchema {
    attributes: &[AttributeSchema {
        name: "stages",
        required: true,
    }],
    blocks: &[BlockHeaderSchema {
        kind: "filter",
        labels: &[],
    }],
};

const STAGE_DEFINITION_KEYS: &[&str] = &["name", "depends_on", "namespaces"];
const UNSUPPORTED_KEY: &str = "stage definition";

/// Decode a labeled `pipeline` block.
///
/// ```hcl
/// pipeline "release" {
///   filter {
///     include { branches = ["main"] }
///   }
///   stages = [
///     { name = "build" },
///     { name = "deploy", depends_on = ["build"], namespaces = ["prod"] },
///   ]
/// }
/// ```
pub fn decode_pipeline_block(block: &Block, parent: &Subject) -> (Pipeline, Diagnostics) {
    let subject = parent.block(block);
    let name = schema::first_label(block);
    let (content, mut diags) = schema::content(block.body(), &PIPELINE_SCHEMA, &subject);

    let mut pipeline = match Pipeline::new(name) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            diags.push(
                Diagnostic::from_error("Invalid pipeline name", &ConfigError::from(err))
                    .with_subject(&subject),
            );
            Pipeline {
                name: name.to_string(),
                ..Pipeline::default()
            }
        }
    };

    let mut seen_filter = false;
    for &inner in &content.blocks {
        match inner.identifier() {
            "filter" if seen_filter => diags.push(
                Diagnostic::error(
                    "Duplicate filter block",
                    "A pipeline may contain at most one filter block.",
                )
                .with_subject(&subject.block(inner)),
            ),
            "filter" => {
                debug!(pipeline = %pipeline.name, "Decoding filter block");
                seen_filter = true;
                let (filter, filter_diags) = decode_filter_block(inner, &subject);
                diags.extend(filter_diags);
                pipeline.filter = filter;
            }
            _ => {}
        }
    }

    if let Some(attr) = content.attribute("stages") {
        let (stages, stage_diags) = decode_stage_definitions(attr, &subject);
        diags.extend(stage_diags);
        pipeline.stages = stages;
    }

    (pipeline, diags)
}

/// Evaluate the `stages` attribute with no variables in scope. Malformed
/// records are reported and skipped.
fn decode_stage_definitions(
    attr: &Attribute,
    parent: &Subject,
) -> (Vec<StageDefinition>, Diagnostics) {
    let subject = parent.child(attr.key());
    let mut diags = Diagnostics::new();

    let evaluated = match attr.expr().evaluate(&Context::new()) {
        Ok(evaluated) => evaluated,
        Err(err) => {
            diags.push(
                Diagnostic::error("Invalid stages expression", err.to_string())
                    .with_subject(&subject),
            );
            return (Vec::new(), diags);
        }
    };

    let records = match value::expect_list(&evaluated) {
        Ok(records) => records,
        Err(err) => {
            diags.push(
                Diagnostic::from_error("Invalid stages value", &err).with_subject(&subject),
            );
            return (Vec::new(), diags);
        }
    };

    let mut definitions = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let record_subject = subject.child(format!("[{}]", index));
        match decode_stage_definition(record) {
            Ok(definition) => definitions.push(definition),
            Err(err) => {
                let summary = match err {
                    ConfigError::InvalidValue { ref field, .. } if field == UNSUPPORTED_KEY => {
                        "Unsupported stage definition attribute"
                    }
                    _ => "Invalid stage definition",
                };
                diags.push(Diagnostic::from_error(summary, &err).with_subject(&record_subject));
            }
        }
    }

    (definitions, diags)
}

fn decode_stage_definition(record: &Value) -> Result<StageDefinition, ConfigError> {
    let fields = value::expect_object(record)?;

    if let Some(unknown) = fields
        .keys()
        .find(|k| !STAGE_DEFINITION_KEYS.contains(&k.as_str()))
    {
        return Err(ConfigError::InvalidValue {
            field: UNSUPPORTED_KEY.to_string(),
            message: format!("unsupported stage definition attribute {:?}", unknown),
        });
    }

    let name = fields
        .get("name")
        .ok_or_else(|| ConfigError::MissingField("stage definition name".to_string()))?;
    let name = value::expect_string(name).map_err(|err| field_error("name", err))?;
    factory_core::validate_name("stage", &name)?;

    Ok(StageDefinition {
        name,
        depends_on: optional_string_list(fields, "depends_on")?,
        namespaces: optional_string_list(fields, "namespaces")?,
    })
}

fn optional_string_list(
    fields: &Map<String, Value>,
    key: &str,
) -> Result<Vec<String>, ConfigError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list) => value::expect_string_list(list).map_err(|err| field_error(key, err)),
    }
}

fn field_error(field: &str, err: ConfigError) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(src: &str) -> (Pipeline, Diagnostics) {
        let body = hcl::parse(src).unwrap();
        let block = body.blocks().next().unwrap();
        decode_pipeline_block(block, &Subject::root())
    }

    #[test]
    fn test_decode_pipeline_block() {
        let (pipeline, diags) = decode(
            r#"
            pipeline "test" {
                filter {
                    include {
                        paths    = ["hi/*"]
                        branches = ["bye/*"]
                    }
                    exclude {
                        paths    = ["bar/*"]
                        branches = ["foo/*"]
                    }
                }
                stages = [
                    { name = "stage1" },
                    {
                        name       = "stage2",
                        depends_on = ["stage1"],
                        namespaces = ["nm1"]
                    }
                ]
            }
        "#,
        );

        assert!(!diags.has_errors(), "{}", diags);
        assert_eq!(pipeline.name, "test");
        assert_eq!(pipeline.filter.include.paths, vec!["hi/*"]);
        assert_eq!(pipeline.filter.exclude.branches, vec!["foo/*"]);
        assert_eq!(pipeline.stages.len(), 2);
        assert_eq!(pipeline.stages[0].name, "stage1");
        assert!(pipeline.stages[0].depends_on.is_empty());
        assert!(pipeline.stages[0].namespaces.is_empty());
        assert_eq!(pipeline.stages[1].name, "stage2");
        assert_eq!(pipeline.stages[1].depends_on, vec!["stage1"]);
        assert_eq!(pipeline.stages[1].namespaces, vec!["nm1"]);
    }

    #[test]
    fn test_missing_filter_is_empty() {
        let (pipeline, diags) = decode(
            r#"
            pipeline "bare" {
                stages = []
            }
        "#,
        );

        assert!(diags.is_empty());
        assert!(pipeline.filter.is_empty());
        assert!(pipeline.stages.is_empty());
    }

    #[test]
    fn test_missing_stages_is_an_error() {
        let (pipeline, diags) = decode(
            r#"
            pipeline "nostages" {
                filter {}
            }
        "#,
        );

        assert!(diags.has_errors());
        assert_eq!(diags[0].summary, "Missing required argument");
        assert_eq!(pipeline.name, "nostages");
    }

    #[test]
    fn test_dependencies_are_not_checked() {
        let (pipeline, diags) = decode(
            r#"
            pipeline "loose" {
                stages = [{ name = "deploy", depends_on = ["does-not-exist"] }]
            }
        "#,
        );

        assert!(diags.is_empty());
        assert_eq!(pipeline.stages[0].depends_on, vec!["does-not-exist"]);
    }

    #[test]
    fn test_invalid_stage_definitions_are_skipped() {
        let (pipeline, diags) = decode(
            r#"
            pipeline "bad" {
                stages = [
                    { depends_on = ["a"] },
                    { name = "ok" },
                    { name = "typo", dependson = ["ok"] },
                    { name = "numbers", namespaces = [1] },
                    "plain",
                ]
            }
        "#,
        );

        assert_eq!(pipeline.stages.len(), 1);
        assert_eq!(pipeline.stages[0].name, "ok");
        assert_eq!(diags.errors().count(), 4);
        let subjects: Vec<String> = diags
            .iter()
            .map(|d| d.subject.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(
            subjects,
            vec![
                "pipeline \"bad\" > stages > [0]",
                "pipeline \"bad\" > stages > [2]",
                "pipeline \"bad\" > stages > [3]",
                "pipeline \"bad\" > stages > [4]",
            ]
        );
        let summaries: Vec<&str> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec![
                "Invalid stage definition",
                "Unsupported stage definition attribute",
                "Invalid stage definition",
                "Invalid stage definition",
            ]
        );
        assert!(diags[1].detail.contains("dependson"));
    }

    #[test]
    fn test_blank_pipeline_name() {
        let (pipeline, diags) = decode(
            r#"
            pipeline "" {
                stages = []
            }
        "#,
        );

        assert_eq!(diags[0].summary, "Invalid pipeline name");
        assert_eq!(pipeline.name, "");
    }
}
