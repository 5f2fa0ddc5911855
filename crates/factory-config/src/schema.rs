//! Schema-constrained extraction of attributes and blocks from an HCL body.

use hcl::{Attribute, Block, Body};
use std::collections::HashMap;

use crate::{Diagnostic, Diagnostics, Subject};

#[derive(Debug, Clone, Copy)]
pub struct AttributeSchema {
    pub name: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct BlockHeaderSchema {
    pub kind: &'static str,
    /// Names of the labels the block must carry, in order.
    pub labels: &'static [&'static str],
}

/// The attributes and block types accepted inside one body.
#[derive(Debug, Clone, Copy)]
pub struct BodySchema {
    pub attributes: &'static [AttributeSchema],
    pub blocks: &'static [BlockHeaderSchema],
}

/// Result of [`content`]: attributes by name and blocks in source order.
#[derive(Debug, Default)]
pub struct BodyContent<'a> {
    pub attributes: HashMap<&'a str, &'a Attribute>,
    pub blocks: Vec<&'a Block>,
}

impl<'a> BodyContent<'a> {
    pub fn attribute(&self, name: &str) -> Option<&'a Attribute> {
        self.attributes.get(name).copied()
    }
}

/// Extract the parts of `body` described by `schema`.
///
/// Unknown attributes and blocks, blocks with the wrong number of labels,
/// repeated attributes and missing required attributes are reported as
/// error diagnostics. Offending items are left out of the content.
pub fn content<'a>(
    body: &'a Body,
    schema: &BodySchema,
    subject: &Subject,
) -> (BodyContent<'a>, Diagnostics) {
    let mut content = BodyContent::default();
    let mut diags = Diagnostics::new();

    for attr in body.attributes() {
        let name = attr.key();
        if !schema.attributes.iter().any(|a| a.name == name) {
            diags.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named {:?} is not expected here.", name),
                )
                .with_subject(&subject.child(name)),
            );
            continue;
        }
        if content.attributes.contains_key(name) {
            diags.push(duplicate_argument(name, subject));
            continue;
        }
        content.attributes.insert(name, attr);
    }

    for required in schema.attributes.iter().filter(|a| a.required) {
        if !content.attributes.contains_key(required.name) {
            diags.push(
                Diagnostic::error(
                    "Missing required argument",
                    format!(
                        "The argument {:?} is required, but no definition was found.",
                        required.name
                    ),
                )
                .with_subject(subject),
            );
        }
    }

    for block in body.blocks() {
        let kind = block.identifier();
        let Some(header) = schema.blocks.iter().find(|b| b.kind == kind) else {
            diags.push(
                Diagnostic::error(
                    "Unsupported block type",
                    format!("Blocks of type {:?} are not expected here.", kind),
                )
                .with_subject(&subject.block(block)),
            );
            continue;
        };

        let found = block.labels().len();
        let expected = header.labels.len();
        if found < expected {
            diags.push(
                Diagnostic::error(
                    format!("Missing {} for {}", header.labels[found], kind),
                    format!(
                        "All {} blocks must have {} labels ({}).",
                        kind,
                        expected,
                        header.labels.join(", ")
                    ),
                )
                .with_subject(&subject.block(block)),
            );
            continue;
        }
        if found > expected {
            let detail = if expected == 0 {
                format!("No labels are expected for {} blocks.", kind)
            } else {
                format!(
                    "Only {} labels ({}) are expected for {} blocks.",
                    expected,
                    header.labels.join(", "),
                    kind
                )
            };
            diags.push(
                Diagnostic::error(format!("Extraneous label for {}", kind), detail)
                    .with_subject(&subject.block(block)),
            );
            continue;
        }

        content.blocks.push(block);
    }

    (content, diags)
}

/// Extract every attribute of `body` in source order, for bodies whose
/// attribute names are user-defined. Nested blocks are not allowed.
pub fn just_attributes<'a>(
    body: &'a Body,
    subject: &Subject,
) -> (Vec<&'a Attribute>, Diagnostics) {
    let mut attributes: Vec<&Attribute> = Vec::new();
    let mut diags = Diagnostics::new();

    for attr in body.attributes() {
        if attributes.iter().any(|a| a.key() == attr.key()) {
            diags.push(duplicate_argument(attr.key(), subject));
            continue;
        }
        attributes.push(attr);
    }

    for block in body.blocks() {
        diags.push(
            Diagnostic::error(
                "Unexpected block",
                format!(
                    "Blocks are not allowed here; found a {:?} block.",
                    block.identifier()
                ),
            )
            .with_subject(&subject.block(block)),
        );
    }

    (attributes, diags)
}

/// First label of a block whose header was checked by [`content`].
pub(crate) fn first_label(block: &Block) -> &str {
    block.labels().first().map(|l| l.as_str()).unwrap_or_default()
}

fn duplicate_argument(name: &str, subject: &Subject) -> Diagnostic {
    Diagnostic::error(
        "Duplicate argument",
        format!(
            "The argument {:?} was already set. Each argument may be set only once.",
            name
        ),
    )
    .with_subject(&subject.child(name))
}
