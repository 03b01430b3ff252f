//! Draft store: the single source of truth for one edit session

use super::attachment::{AttachmentError, AttachmentSlot, LocalFile, RemovedAttachment};
use super::field::{FieldKind, FieldSpec, FieldValue};
use super::record::Record;
use super::schema::{FormContext, FormSchema};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Current value of one draft field
#[derive(Debug, Clone, PartialEq)]
pub enum DraftValue {
    Scalar(FieldValue),
    Attachment(AttachmentSlot),
}

impl DraftValue {
    pub fn is_empty(&self) -> bool {
        match self {
            DraftValue::Scalar(value) => value.is_empty(),
            DraftValue::Attachment(slot) => slot.is_empty(),
        }
    }
}

/// Field name to current value, for every field of the schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    values: BTreeMap<&'static str, DraftValue>,
}

impl Draft {
    pub fn get(&self, name: &str) -> Option<&DraftValue> {
        self.values.get(name)
    }

    pub fn scalar(&self, name: &str) -> Option<&FieldValue> {
        match self.values.get(name)? {
            DraftValue::Scalar(value) => Some(value),
            DraftValue::Attachment(_) => None,
        }
    }

    /// Text of a scalar field; empty when absent or not text
    pub fn text(&self, name: &str) -> &str {
        self.scalar(name).map(FieldValue::as_text).unwrap_or_default()
    }

    pub fn slot(&self, name: &str) -> Option<&AttachmentSlot> {
        match self.values.get(name)? {
            DraftValue::Attachment(slot) => Some(slot),
            DraftValue::Scalar(_) => None,
        }
    }

    /// Unknown fields count as empty
    pub fn is_field_empty(&self, name: &str) -> bool {
        self.values.get(name).map_or(true, DraftValue::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("field `{0}` does not accept this kind of value")]
    KindMismatch(&'static str),
    #[error("field `{0}` is not a file field")]
    NotAttachment(&'static str),
    #[error("field `{0}` is not a list field")]
    NotList(&'static str),
    #[error("entry for `{field}` is missing `{key}`")]
    IncompleteListItem {
        field: &'static str,
        key: &'static str,
    },
    #[error("no entry {index} in `{field}`")]
    ListIndex { field: &'static str, index: usize },
    #[error("attachment `{field}`: {source}")]
    Attachment {
        field: &'static str,
        #[source]
        source: AttachmentError,
    },
}

/// Holds the in-progress draft of one entity
#[derive(Debug, Clone)]
pub struct DraftStore {
    schema: Arc<FormSchema>,
    context: FormContext,
    draft: Draft,
}

impl DraftStore {
    /// Draft with every field at its schema default
    pub fn init_empty(schema: Arc<FormSchema>, context: FormContext) -> Self {
        let values = schema
            .fields()
            .iter()
            .map(|spec| (spec.name, spec.initial_value(&context)))
            .collect();
        Self {
            schema,
            context,
            draft: Draft { values },
        }
    }

    /// Draft pre-filled from a stored record.
    ///
    /// Fields the record lacks fall back to defaults; stored files become
    /// the `existing` side of their slots. Derived fields are recomputed
    /// from their source when the source resolves.
    pub fn init_from_record(
        schema: Arc<FormSchema>,
        context: FormContext,
        record: &Record,
    ) -> Self {
        let values = schema
            .fields()
            .iter()
            .map(|spec| {
                let value = spec
                    .value_from_record(&record.fields)
                    .unwrap_or_else(|| spec.initial_value(&context));
                (spec.name, value)
            })
            .collect();
        let mut store = Self {
            schema,
            context,
            draft: Draft { values },
        };
        let sources: Vec<&'static str> = store
            .schema
            .derived_rules()
            .iter()
            .map(|rule| rule.source)
            .collect();
        for source in sources {
            store.recompute_from(source);
        }
        tracing::debug!(
            "Draft for {} {} initialized from record",
            store.schema.kind,
            record.id
        );
        store
    }

    pub fn schema(&self) -> &Arc<FormSchema> {
        &self.schema
    }

    pub fn context(&self) -> &FormContext {
        &self.context
    }

    /// Current draft, for rendering, validation and diffing
    pub fn snapshot(&self) -> &Draft {
        &self.draft
    }

    fn spec(&self, name: &str) -> Result<FieldSpec, DraftError> {
        self.schema
            .field(name)
            .cloned()
            .ok_or_else(|| DraftError::UnknownField(name.to_string()))
    }

    /// Set a scalar field, then recompute any field derived from it
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), DraftError> {
        let spec = self.spec(name)?;
        match (&spec.kind, &value) {
            (kind, _) if kind.is_attachment() => return Err(DraftError::NotAttachment(spec.name)),
            (FieldKind::List { .. }, FieldValue::List(_)) => {}
            (FieldKind::List { .. }, _) | (_, FieldValue::List(_)) => {
                return Err(DraftError::KindMismatch(spec.name))
            }
            _ => {}
        }
        self.draft
            .values
            .insert(spec.name, DraftValue::Scalar(value));
        self.recompute_from(spec.name);
        Ok(())
    }

    fn recompute_from(&mut self, source: &str) {
        let value = self.draft.text(source).to_string();
        if value.is_empty() {
            return;
        }
        let updates: Vec<(&'static str, String)> = self
            .schema
            .derived_from(source)
            .filter_map(|rule| (rule.compute)(&value, &self.context).map(|v| (rule.target, v)))
            .collect();
        for (target, derived) in updates {
            tracing::debug!("Derived {target} from {source}");
            self.draft
                .values
                .insert(target, DraftValue::Scalar(FieldValue::Text(derived)));
        }
    }

    fn slot_mut(&mut self, name: &str) -> Result<(&'static str, &mut AttachmentSlot), DraftError> {
        let spec = self.spec(name)?;
        match self.draft.values.get_mut(spec.name) {
            Some(DraftValue::Attachment(slot)) => Ok((spec.name, slot)),
            _ => Err(DraftError::NotAttachment(spec.name)),
        }
    }

    pub fn set_single_file(&mut self, name: &str, file: LocalFile) -> Result<(), DraftError> {
        let (field, slot) = self.slot_mut(name)?;
        slot.set_single(file)
            .map_err(|source| DraftError::Attachment { field, source })
    }

    pub fn add_files(
        &mut self,
        name: &str,
        files: impl IntoIterator<Item = LocalFile>,
    ) -> Result<(), DraftError> {
        let (field, slot) = self.slot_mut(name)?;
        slot.add_many(files)
            .map_err(|source| DraftError::Attachment { field, source })
    }

    /// Stage a file on either kind of slot
    pub fn stage_file(&mut self, name: &str, file: LocalFile) -> Result<(), DraftError> {
        let (field, slot) = self.slot_mut(name)?;
        let result = if slot.is_multi() {
            slot.add_many([file])
        } else {
            slot.set_single(file)
        };
        result.map_err(|source| DraftError::Attachment { field, source })
    }

    pub fn remove_attachment(
        &mut self,
        name: &str,
        index: usize,
    ) -> Result<RemovedAttachment, DraftError> {
        let (field, slot) = self.slot_mut(name)?;
        let removed = slot
            .remove_at(index)
            .map_err(|source| DraftError::Attachment { field, source })?;
        if let RemovedAttachment::Existing(remote) = &removed {
            tracing::debug!("Marked {} for deletion on {field}", remote.url);
        }
        Ok(removed)
    }

    pub fn describe_attachment(
        &mut self,
        name: &str,
        index: usize,
        description: impl Into<String>,
    ) -> Result<(), DraftError> {
        let (field, slot) = self.slot_mut(name)?;
        slot.set_description(index, description)
            .map_err(|source| DraftError::Attachment { field, source })
    }

    /// Append an entry to a structured list field.
    ///
    /// Missing keys are filled with empty strings; the field's required keys
    /// must be non-empty.
    pub fn push_list_item(
        &mut self,
        name: &str,
        mut item: Map<String, Value>,
    ) -> Result<(), DraftError> {
        let spec = self.spec(name)?;
        let FieldKind::List { keys, required } = spec.kind else {
            return Err(DraftError::NotList(spec.name));
        };
        if let Some(key) = required.iter().copied().find(|key| {
            item.get(*key)
                .and_then(Value::as_str)
                .map_or(true, |v| v.trim().is_empty())
        }) {
            return Err(DraftError::IncompleteListItem {
                field: spec.name,
                key,
            });
        }
        for key in keys {
            item.entry(key.to_string())
                .or_insert_with(|| Value::String(String::new()));
        }
        let mut items = self
            .draft
            .scalar(spec.name)
            .and_then(FieldValue::as_list)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();
        items.push(Value::Object(item));
        self.set_field(spec.name, FieldValue::List(items))
    }

    pub fn remove_list_item(&mut self, name: &str, index: usize) -> Result<Value, DraftError> {
        let spec = self.spec(name)?;
        if !matches!(spec.kind, FieldKind::List { .. }) {
            return Err(DraftError::NotList(spec.name));
        }
        let mut items = self
            .draft
            .scalar(spec.name)
            .and_then(FieldValue::as_list)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();
        if index >= items.len() {
            return Err(DraftError::ListIndex {
                field: spec.name,
                index,
            });
        }
        let removed = items.remove(index);
        self.set_field(spec.name, FieldValue::List(items))?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::forms::attachment::{DeletionMarker, RemoteRef};
    use crate::state::forms::schema::{EntityKind, ParcelSummary};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn address(id: &str, context: &FormContext) -> Option<String> {
        context.parcel(id).map(|p| format!("{}, {}", p.ville, p.adresse))
    }

    fn schema() -> Arc<FormSchema> {
        Arc::new(
            FormSchema::builder(EntityKind::Title, "Titre")
                .step("Titre")
                .field(FieldSpec::date("dateEmission", "Date d'émission").default_today())
                .field(FieldSpec::select("typeTitre", "Type", &["foncier", "bail"]))
                .step("Parcelle")
                .field(FieldSpec::relation("parcelId", "Parcelle"))
                .field(FieldSpec::text("adresseParcelle", "Adresse"))
                .derive("parcelId", "adresseParcelle", address)
                .step("Historique")
                .field(FieldSpec::list(
                    "historiqueTransactions",
                    "Historique",
                    &["date", "nature", "details"],
                    &["date", "nature"],
                ))
                .step("Documents")
                .field(FieldSpec::single_file("copieTitre", "Copie du titre"))
                .field(FieldSpec::multi_file("autresDocuments", "Autres documents"))
                .build(),
        )
    }

    fn context() -> FormContext {
        FormContext::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).with_parcels(vec![
            ParcelSummary {
                id: "p1".into(),
                ville: "Dakar".into(),
                adresse: "Rue 12".into(),
            },
        ])
    }

    mod init {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_empty_uses_schema_defaults() {
            let store = DraftStore::init_empty(schema(), context());
            let draft = store.snapshot();
            assert_eq!(draft.text("dateEmission"), "2024-06-01");
            assert_eq!(draft.text("typeTitre"), "foncier");
            assert!(draft.slot("copieTitre").unwrap().is_empty());
            assert_eq!(
                draft.scalar("historiqueTransactions"),
                Some(&FieldValue::List(vec![]))
            );
        }

        #[test]
        fn test_from_record_maps_fields_and_files() {
            let record = Record::from_value(json!({
                "_id": "t1",
                "dateEmission": "2021-02-03T10:00:00Z",
                "copieTitre": "https://x/copie.pdf",
                "autresDocuments": ["https://x/a.pdf", "https://x/b.pdf"]
            }))
            .unwrap();
            let store = DraftStore::init_from_record(schema(), context(), &record);
            let draft = store.snapshot();

            assert_eq!(draft.text("dateEmission"), "2021-02-03");
            assert_eq!(draft.text("typeTitre"), "foncier");
            let single = draft.slot("copieTitre").unwrap();
            assert_eq!(single.len(), 1);
            assert!(single.deletion_marker().is_none());
            assert_eq!(draft.slot("autresDocuments").unwrap().len(), 2);
        }

        #[test]
        fn test_from_record_recomputes_derived_field() {
            let record = Record::from_value(json!({
                "_id": "t1",
                "parcelId": {"_id": "p1"},
                "adresseParcelle": "ancienne adresse"
            }))
            .unwrap();
            let store = DraftStore::init_from_record(schema(), context(), &record);
            assert_eq!(store.snapshot().text("adresseParcelle"), "Dakar, Rue 12");
        }

        #[test]
        fn test_unknown_relation_keeps_stored_value() {
            let record = Record::from_value(json!({
                "_id": "t1",
                "parcelId": "gone",
                "adresseParcelle": "ancienne adresse"
            }))
            .unwrap();
            let store = DraftStore::init_from_record(schema(), context(), &record);
            assert_eq!(store.snapshot().text("adresseParcelle"), "ancienne adresse");
        }
    }

    mod mutation {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_set_field_runs_derived_rule() {
            let mut store = DraftStore::init_empty(schema(), context());
            store.set_field("parcelId", FieldValue::text("p1")).unwrap();
            assert_eq!(store.snapshot().text("adresseParcelle"), "Dakar, Rue 12");
        }

        #[test]
        fn test_set_field_rejects_unknown_and_files() {
            let mut store = DraftStore::init_empty(schema(), context());
            assert_eq!(
                store.set_field("nope", FieldValue::text("x")),
                Err(DraftError::UnknownField("nope".into()))
            );
            assert_eq!(
                store.set_field("copieTitre", FieldValue::text("x")),
                Err(DraftError::NotAttachment("copieTitre"))
            );
            assert_eq!(
                store.set_field("typeTitre", FieldValue::List(vec![])),
                Err(DraftError::KindMismatch("typeTitre"))
            );
        }

        #[test]
        fn test_snapshot_is_stable_without_mutation() {
            let store = DraftStore::init_empty(schema(), context());
            assert_eq!(store.snapshot().clone(), store.snapshot().clone());
        }

        #[test]
        fn test_remove_existing_attachment_through_store() {
            let record = Record::from_value(json!({
                "_id": "t1",
                "autresDocuments": ["https://x/a.pdf"]
            }))
            .unwrap();
            let mut store = DraftStore::init_from_record(schema(), context(), &record);
            let removed = store.remove_attachment("autresDocuments", 0).unwrap();
            assert_eq!(removed, RemovedAttachment::Existing(RemoteRef::new("https://x/a.pdf")));
            assert_eq!(
                store.snapshot().slot("autresDocuments").unwrap().deletion_marker(),
                Some(DeletionMarker::Urls(vec!["https://x/a.pdf".into()]))
            );
        }

        #[test]
        fn test_stage_file_on_single_and_multi() {
            let mut store = DraftStore::init_empty(schema(), context());
            store.stage_file("copieTitre", LocalFile::new("/tmp/a.pdf")).unwrap();
            store.stage_file("autresDocuments", LocalFile::new("/tmp/b.pdf")).unwrap();
            store.stage_file("autresDocuments", LocalFile::new("/tmp/c.pdf")).unwrap();
            assert_eq!(store.snapshot().slot("copieTitre").unwrap().len(), 1);
            assert_eq!(store.snapshot().slot("autresDocuments").unwrap().len(), 2);
        }
    }

    mod lists {
        use super::*;
        use pretty_assertions::assert_eq;

        fn entry(date: &str, nature: &str) -> Map<String, Value> {
            let mut map = Map::new();
            map.insert("date".into(), json!(date));
            map.insert("nature".into(), json!(nature));
            map
        }

        #[test]
        fn test_push_fills_missing_keys() {
            let mut store = DraftStore::init_empty(schema(), context());
            store
                .push_list_item("historiqueTransactions", entry("2020-01-01", "vente"))
                .unwrap();
            assert_eq!(
                store.snapshot().scalar("historiqueTransactions"),
                Some(&FieldValue::List(vec![json!({
                    "date": "2020-01-01",
                    "nature": "vente",
                    "details": ""
                })]))
            );
        }

        #[test]
        fn test_push_requires_keys() {
            let mut store = DraftStore::init_empty(schema(), context());
            assert_eq!(
                store.push_list_item("historiqueTransactions", entry("2020-01-01", " ")),
                Err(DraftError::IncompleteListItem {
                    field: "historiqueTransactions",
                    key: "nature"
                })
            );
        }

        #[test]
        fn test_remove_list_item() {
            let mut store = DraftStore::init_empty(schema(), context());
            store
                .push_list_item("historiqueTransactions", entry("2020-01-01", "vente"))
                .unwrap();
            store
                .push_list_item("historiqueTransactions", entry("2021-01-01", "donation"))
                .unwrap();
            let removed = store.remove_list_item("historiqueTransactions", 0).unwrap();
            assert_eq!(removed["nature"], "vente");
            assert_eq!(
                store.remove_list_item("historiqueTransactions", 5),
                Err(DraftError::ListIndex {
                    field: "historiqueTransactions",
                    index: 5
                })
            );
        }
    }
}
