//! Submission payloads
//!
//! [`ChangeSetBuilder`] turns a draft into the smallest payload the server
//! needs: changed scalars (or all of them when creating), staged files and
//! explicit deletion markers.

use super::attachment::{DeletionMarker, LocalFile};
use super::draft::{Draft, DraftValue};
use super::field::{FieldDefault, FieldKind, FieldSpec, FieldValue};
use super::record::Record;
use super::schema::FormSchema;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// A deletion marker that does not trace back to a stored file.
///
/// Only reachable through a bug in attachment bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("deletion marker on `{field}` references `{url}`, which was never stored")]
pub struct IntegrityViolation {
    pub field: String,
    pub url: String,
}

/// Computed payload for one submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Wire name to value
    pub scalar_fields: BTreeMap<String, FieldValue>,
    /// Wire name to staged files, in pick order
    pub new_files: BTreeMap<String, Vec<LocalFile>>,
    /// File wire name to the companion field carrying one description per file
    pub description_fields: BTreeMap<String, String>,
    /// `<wire name>ToDelete` to marker
    pub deletion_markers: BTreeMap<String, DeletionMarker>,
}

/// One multipart part, in send order
#[derive(Debug, Clone, PartialEq)]
pub enum WirePart {
    Text { name: String, value: String },
    File { name: String, file: LocalFile },
}

impl WirePart {
    fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        WirePart::Text {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl ChangeSet {
    /// Multipart layout: scalars, then files (each followed by its
    /// description when the field carries them), then deletion markers.
    pub fn to_parts(&self) -> Vec<WirePart> {
        let mut parts: Vec<WirePart> = self
            .scalar_fields
            .iter()
            .map(|(name, value)| WirePart::text(name, value.to_wire_string()))
            .collect();

        for (name, files) in &self.new_files {
            let descriptions = self.description_fields.get(name);
            for file in files {
                parts.push(WirePart::File {
                    name: name.clone(),
                    file: file.clone(),
                });
                if let Some(descriptions) = descriptions {
                    parts.push(WirePart::text(descriptions, file.description.clone()));
                }
            }
        }

        for (name, marker) in &self.deletion_markers {
            match marker {
                DeletionMarker::Flag => parts.push(WirePart::text(name, "true")),
                DeletionMarker::Urls(urls) => {
                    let name = format!("{name}[]");
                    parts.extend(urls.iter().map(|url| WirePart::text(&name, url)));
                }
            }
        }
        parts
    }

    /// JSON body for endpoints that take no files
    pub fn to_json(&self) -> Value {
        let body: Map<String, Value> = self
            .scalar_fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Value::Object(body)
    }
}

/// Builds a [`ChangeSet`] for a schema, against an optional stored record
pub struct ChangeSetBuilder<'a> {
    schema: &'a FormSchema,
    original: Option<&'a Record>,
}

impl<'a> ChangeSetBuilder<'a> {
    pub fn new(schema: &'a FormSchema, original: Option<&'a Record>) -> Self {
        Self { schema, original }
    }

    pub fn build(&self, draft: &Draft) -> Result<ChangeSet, IntegrityViolation> {
        let mut changes = ChangeSet::default();

        for spec in self.schema.fields() {
            match draft.get(spec.name) {
                Some(DraftValue::Scalar(value)) => {
                    if self.includes_scalar(spec, value) {
                        changes
                            .scalar_fields
                            .insert(spec.wire_name.to_string(), value.clone());
                    }
                }
                Some(DraftValue::Attachment(slot)) => {
                    if let Some(url) = slot.integrity_breach() {
                        tracing::error!(
                            "Deletion marker on {} points outside stored files: {url}",
                            spec.name
                        );
                        return Err(IntegrityViolation {
                            field: spec.name.to_string(),
                            url: url.to_string(),
                        });
                    }

                    let staged: Vec<LocalFile> =
                        slot.staged_files().into_iter().cloned().collect();
                    if !staged.is_empty() {
                        if let FieldKind::MultiFile {
                            descriptions: Some(descriptions),
                        } = spec.kind
                        {
                            changes
                                .description_fields
                                .insert(spec.wire_name.to_string(), descriptions.to_string());
                        }
                        changes.new_files.insert(spec.wire_name.to_string(), staged);
                    }

                    // A new record has nothing stored to delete.
                    if self.original.is_some() {
                        if let Some(marker) = slot.deletion_marker() {
                            changes
                                .deletion_markers
                                .insert(format!("{}ToDelete", spec.wire_name), marker);
                        }
                    }
                }
                None => {}
            }
        }

        tracing::debug!(
            "Change set for {}: {} fields, {} file fields, {} deletions",
            self.schema.kind,
            changes.scalar_fields.len(),
            changes.new_files.len(),
            changes.deletion_markers.len()
        );
        Ok(changes)
    }

    fn includes_scalar(&self, spec: &FieldSpec, value: &FieldValue) -> bool {
        if spec.always_resend && !value.is_empty() {
            return true;
        }
        let Some(original) = self.original else {
            return !spec.always_resend;
        };
        if spec.create_only {
            return match spec.default {
                FieldDefault::Literal(default) => {
                    !value.is_empty() && value.as_text() != default
                }
                _ => !value.is_empty(),
            };
        }
        match spec.scalar_from_record(&original.fields) {
            Some(stored) => stored != *value,
            None => !value.is_empty(),
        }
    }
}
