//! `filter` block decoding.

use factory_core::{Filter, FilterRule};
use hcl::eval::{Context, Evaluate};
use hcl::{Attribute, Block};
use tracing::debug;

use crate::schema::{self, AttributeSchema, BlockHeaderSchema, BodySchema};
use crate::value;
use crate::{Diagnostic, Diagnostics, Subject};

static FILTER_SCHEMA: BodySchema = BodySchema {
    attributes: &[],
    blocks: &[
        BlockHeaderSchema {
            kind: "include",
            labels: &[],
        },
        BlockHeaderSchema {
            kind: "exclude",
            labels: &[],
        },
    ],
};

static RULE_SCHEMA: BodySchema = BodySchema {
    attributes: &[
        AttributeSchema {
            name: "paths",
            required: false,
        },
        AttributeSchema {
            name: "branches",
            required: false,
        },
    ],
    blocks: &[],
};

/// Decode a `filter` block. Missing `include`/`exclude` blocks leave the
/// corresponding rule empty.
pub fn decode_filter_block(block: &Block, parent: &Subject) -> (Filter, Diagnostics) {
    let subject = parent.block(block);
    let (content, mut diags) = schema::content(block.body(), &FILTER_SCHEMA, &subject);

    let mut filter = Filter::default();
    let mut seen_include = false;
    let mut seen_exclude = false;

    for inner in content.blocks {
        let seen = match inner.identifier() {
            "include" => &mut seen_include,
            "exclude" => &mut seen_exclude,
            _ => continue,
        };
        if *seen {
            diags.push(
                Diagnostic::error(
                    format!("Duplicate {} block", inner.identifier()),
                    format!(
                        "A filter may contain at most one {} block.",
                        inner.identifier()
                    ),
                )
                .with_subject(&subject.block(inner)),
            );
            continue;
        }
        *seen = true;

        debug!(kind = %inner.identifier(), "Decoding filter rule");
        let (rule, rule_diags) = decode_rule_block(inner, &subject);
        diags.extend(rule_diags);
        if inner.identifier() == "include" {
            filter.include = rule;
        } else {
            filter.exclude = rule;
        }
    }

    (filter, diags)
}

fn decode_rule_block(block: &Block, parent: &Subject) -> (FilterRule, Diagnostics) {
    let subject = parent.block(block);
    let (content, mut diags) = schema::content(block.body(), &RULE_SCHEMA, &subject);

    let mut rule = FilterRule::default();
    if let Some(attr) = content.attribute("paths") {
        let (paths, d) = decode_patterns(attr, &subject);
        diags.extend(d);
        rule.paths = paths;
    }
    if let Some(attr) = content.attribute("branches") {
        let (branches, d) = decode_patterns(attr, &subject);
        diags.extend(d);
        rule.branches = branches;
    }

    (rule, diags)
}

/// Evaluate a pattern list with no variables in scope. Every non-string
/// element gets its own diagnostic, and any failure empties the list.
fn decode_patterns(attr: &Attribute, parent: &Subject) -> (Vec<String>, Diagnostics) {
    let subject = parent.child(attr.key());
    let mut diags = Diagnostics::new();

    let evaluated = match attr.expr().evaluate(&Context::new()) {
        Ok(evaluated) => evaluated,
        Err(err) => {
            diags.push(
                Diagnostic::error("Invalid filter expression", err.to_string())
                    .with_subject(&subject),
            );
            return (Vec::new(), diags);
        }
    };

    let items = match value::expect_list(&evaluated) {
        Ok(items) => items,
        Err(err) => {
            diags.push(
                Diagnostic::from_error("Value of paths or branches must be a list", &err)
                    .with_subject(&subject),
            );
            return (Vec::new(), diags);
        }
    };

    let mut patterns = Vec::with_capacity(items.len());
    for item in items {
        match value::expect_string(item) {
            Ok(pattern) => patterns.push(pattern),
            Err(_) => diags.push(
                Diagnostic::error(
                    "Value within paths or branches must be of string type",
                    "Invalid type for branch or path",
                )
                .with_subject(&subject),
            ),
        }
    }

    if diags.has_errors() {
        patterns.clear();
    }
    (patterns, diags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(src: &str) -> (Filter, Diagnostics) {
        let body = hcl::parse(src).unwrap();
        let block = body.blocks().next().unwrap();
        decode_filter_block(block, &Subject::root())
    }

    #[test]
    fn test_decode_filter_block() {
        let (filter, diags) = decode(
            r#"
            filter {
                include {
                    paths    = ["hi/*", "there/**"]
                    branches = ["bye/*"]
                }
                exclude {
                    paths    = ["bar/*"]
                    branches = ["foo/*"]
                }
            }
        "#,
        );

        assert!(!diags.has_errors(), "{}", diags);
        assert_eq!(filter.include.paths, vec!["hi/*", "there/**"]);
        assert_eq!(filter.include.branches, vec!["bye/*"]);
        assert_eq!(filter.exclude.paths, vec!["bar/*"]);
        assert_eq!(filter.exclude.branches, vec!["foo/*"]);
    }

    #[test]
    fn test_missing_rules_are_empty() {
        let (filter, diags) = decode(
            r#"
            filter {
                include {
                    branches = ["main"]
                }
            }
        "#,
        );

        assert!(diags.is_empty());
        assert!(filter.include.paths.is_empty());
        assert_eq!(filter.include.branches, vec!["main"]);
        assert!(filter.exclude.is_empty());
    }

    #[test]
    fn test_non_string_patterns_report_each_value() {
        let (filter, diags) = decode(
            r#"
            filter {
                include {
                    paths    = [123]
                    branches = [123]
                }
                exclude {
                    paths    = [123, "ok", true]
                    branches = [123]
                }
            }
        "#,
        );

        assert_eq!(diags.errors().count(), 5);
        for diag in &diags {
            assert_eq!(
                diag.summary,
                "Value within paths or branches must be of string type"
            );
            assert_eq!(diag.detail, "Invalid type for branch or path");
        }
        assert!(filter.include.is_empty());
        assert!(filter.exclude.is_empty());
        assert_eq!(
            diags[2].subject.as_ref().unwrap().to_string(),
            "filter > exclude > paths"
        );
    }

    #[test]
    fn test_filter_ignores_variables() {
        let (filter, diags) = decode(
            r#"
            filter {
                include {
                    paths = [var.dir]
                }
            }
        "#,
        );

        assert!(diags.has_errors());
        assert_eq!(diags[0].summary, "Invalid filter expression");
        assert!(filter.include.paths.is_empty());
    }

    #[test]
    fn test_duplicate_include_is_reported() {
        let (filter, diags) = decode(
            r#"
            filter {
                include { paths = ["a"] }
                include { paths = ["b"] }
            }
        "#,
        );

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Duplicate include block");
        assert_eq!(filter.include.paths, vec!["a"]);
    }
}
