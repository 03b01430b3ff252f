//! Form field value objects and field specifications

use super::attachment::{AttachmentSlot, RemoteRef};
use super::draft::{Draft, DraftValue};
use super::schema::FormContext;
use serde_json::{Map, Value};

/// Scalar value held by a draft field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text, number, date and select input all travel as text
    Text(String),
    /// Structured list (array of JSON objects), always compared as a whole
    List(Vec<Value>),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Get the text value (empty for list fields)
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::List(_) => "",
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            FieldValue::List(items) => Some(items),
            FieldValue::Text(_) => None,
        }
    }

    /// Blank text or an empty list
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    /// Form-encoded representation; lists are sent as a JSON document
    pub fn to_wire_string(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => Value::Array(items.clone()).to_string(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::List(items) => Value::Array(items.clone()),
        }
    }
}

/// Kind of input a field accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Multiline,
    Number,
    Date,
    /// Fixed option list; the first option is the default
    Select(&'static [&'static str]),
    /// Id of a parcel from the form context catalogue
    Relation,
    /// List of objects with the given keys; `required` keys must be filled
    /// before an item can be appended
    List {
        keys: &'static [&'static str],
        required: &'static [&'static str],
    },
    SingleFile,
    /// Multi-file field; `descriptions` names the companion wire field that
    /// carries one description per uploaded file
    MultiFile { descriptions: Option<&'static str> },
}

impl FieldKind {
    pub fn is_attachment(&self) -> bool {
        matches!(self, FieldKind::SingleFile | FieldKind::MultiFile { .. })
    }
}

/// Initial value used when creating, or when a record lacks the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldDefault {
    #[default]
    Blank,
    Literal(&'static str),
    Today,
}

/// Predicate deciding whether a field is shown for the current draft
pub type Visibility = fn(&Draft) -> bool;

/// Static description of one form field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub wire_name: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,
    /// Bypass the diff and resend whenever non-empty
    pub always_resend: bool,
    /// Only sent when creating a record
    pub create_only: bool,
    pub visible_when: Option<Visibility>,
}

impl FieldSpec {
    fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            wire_name: name,
            kind,
            default: FieldDefault::Blank,
            always_resend: false,
            create_only: false,
            visible_when: None,
        }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn multiline(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Multiline)
    }

    pub fn number(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Number)
    }

    pub fn date(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Date)
    }

    pub fn select(
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self::new(name, label, FieldKind::Select(options))
    }

    pub fn relation(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Relation)
    }

    pub fn list(
        name: &'static str,
        label: &'static str,
        keys: &'static [&'static str],
        required: &'static [&'static str],
    ) -> Self {
        Self::new(name, label, FieldKind::List { keys, required })
    }

    pub fn single_file(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::SingleFile)
    }

    pub fn multi_file(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::MultiFile { descriptions: None })
    }

    pub fn described_files(
        name: &'static str,
        label: &'static str,
        descriptions: &'static str,
    ) -> Self {
        Self::new(
            name,
            label,
            FieldKind::MultiFile {
                descriptions: Some(descriptions),
            },
        )
    }

    pub fn default_value(mut self, value: &'static str) -> Self {
        self.default = FieldDefault::Literal(value);
        self
    }

    pub fn default_today(mut self) -> Self {
        self.default = FieldDefault::Today;
        self
    }

    pub fn always_resend(mut self) -> Self {
        self.always_resend = true;
        self
    }

    pub fn create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    pub fn visible_when(mut self, predicate: Visibility) -> Self {
        self.visible_when = Some(predicate);
        self
    }

    pub fn is_visible(&self, draft: &Draft) -> bool {
        self.visible_when.map_or(true, |visible| visible(draft))
    }

    /// Value for a fresh draft
    pub fn initial_value(&self, context: &FormContext) -> DraftValue {
        match &self.kind {
            FieldKind::SingleFile => DraftValue::Attachment(AttachmentSlot::single(None)),
            FieldKind::MultiFile { .. } => {
                DraftValue::Attachment(AttachmentSlot::multi(Vec::new()))
            }
            FieldKind::List { .. } => DraftValue::Scalar(FieldValue::List(Vec::new())),
            kind => {
                let text = match (self.default, kind) {
                    (FieldDefault::Literal(value), _) => value.to_string(),
                    (FieldDefault::Today, _) => context.today.format("%Y-%m-%d").to_string(),
                    (FieldDefault::Blank, FieldKind::Select(options)) => {
                        options.first().copied().unwrap_or_default().to_string()
                    }
                    (FieldDefault::Blank, _) => String::new(),
                };
                DraftValue::Scalar(FieldValue::Text(text))
            }
        }
    }

    /// Value for an edit draft, read from the stored record.
    ///
    /// `None` when the record lacks a usable value for this field.
    pub fn value_from_record(&self, record: &Map<String, Value>) -> Option<DraftValue> {
        let raw = record.get(self.name).filter(|v| !v.is_null())?;
        match &self.kind {
            FieldKind::SingleFile => RemoteRef::from_value(raw)
                .map(|existing| DraftValue::Attachment(AttachmentSlot::single(Some(existing)))),
            FieldKind::MultiFile { .. } => {
                let existing = match raw {
                    Value::Array(items) => items.iter().filter_map(RemoteRef::from_value).collect(),
                    other => RemoteRef::from_value(other).into_iter().collect(),
                };
                Some(DraftValue::Attachment(AttachmentSlot::multi(existing)))
            }
            _ => self.scalar_from_record(record).map(DraftValue::Scalar),
        }
    }

    /// Scalar projection of a stored record value, normalized the way the
    /// form holds it. Used both to pre-fill and as the diff baseline.
    pub fn scalar_from_record(&self, record: &Map<String, Value>) -> Option<FieldValue> {
        let raw = record.get(self.name).filter(|v| !v.is_null())?;
        match &self.kind {
            FieldKind::SingleFile | FieldKind::MultiFile { .. } => None,
            FieldKind::List { .. } => list_from_value(raw).map(FieldValue::List),
            FieldKind::Date => scalar_text(raw).map(|text| {
                let day = text.split('T').next().unwrap_or_default();
                FieldValue::Text(day.to_string())
            }),
            FieldKind::Relation => match raw {
                Value::Object(map) => map
                    .get("_id")
                    .or_else(|| map.get("id"))
                    .and_then(Value::as_str)
                    .map(FieldValue::text),
                other => scalar_text(other).map(FieldValue::Text),
            },
            _ => scalar_text(raw).map(FieldValue::Text),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Structured lists arrive as an array, a JSON-encoded string, or an array
/// holding one JSON-encoded string.
fn list_from_value(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => match items.as_slice() {
            [Value::String(encoded)] => list_from_value(&serde_json::from_str(encoded).ok()?),
            _ => Some(items.clone()),
        },
        Value::String(encoded) if encoded.trim().is_empty() => Some(Vec::new()),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded).ok()? {
            Value::Array(items) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn context() -> FormContext {
        FormContext::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
    }

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("record must be an object"),
        }
    }

    mod field_value {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_default_is_empty_text() {
            assert_eq!(FieldValue::default(), FieldValue::Text(String::new()));
            assert!(FieldValue::default().is_empty());
        }

        #[test]
        fn test_whitespace_counts_as_empty() {
            assert!(FieldValue::text("   ").is_empty());
            assert!(!FieldValue::text("Dakar").is_empty());
        }

        #[test]
        fn test_list_wire_string_is_json() {
            let value = FieldValue::List(vec![json!({"date": "2020-01-01", "nature": "vente"})]);
            assert_eq!(
                value.to_wire_string(),
                r#"[{"date":"2020-01-01","nature":"vente"}]"#
            );
        }
    }

    mod initial_values {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_select_defaults_to_first_option() {
            let spec = FieldSpec::select("statut", "Statut", &["en cours", "termine"]);
            assert_eq!(
                spec.initial_value(&context()),
                DraftValue::Scalar(FieldValue::text("en cours"))
            );
        }

        #[test]
        fn test_literal_default_wins_over_first_option() {
            let spec =
                FieldSpec::select("typeTitre", "Type", &["", "foncier"]).default_value("foncier");
            assert_eq!(
                spec.initial_value(&context()),
                DraftValue::Scalar(FieldValue::text("foncier"))
            );
        }

        #[test]
        fn test_date_defaults_to_today() {
            let spec = FieldSpec::date("dateEmission", "Date").default_today();
            assert_eq!(
                spec.initial_value(&context()),
                DraftValue::Scalar(FieldValue::text("2024-03-15"))
            );
        }

        #[test]
        fn test_file_fields_start_empty() {
            let spec = FieldSpec::multi_file("autresDocuments", "Autres documents");
            match spec.initial_value(&context()) {
                DraftValue::Attachment(slot) => assert!(slot.is_empty() && slot.is_multi()),
                other => panic!("expected attachment, got {other:?}"),
            }
        }
    }

    mod record_projection {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_number_becomes_text() {
            let spec = FieldSpec::number("superficie", "Superficie");
            let rec = record(json!({"superficie": 120}));
            assert_eq!(spec.scalar_from_record(&rec), Some(FieldValue::text("120")));
        }

        #[test]
        fn test_date_keeps_day_part() {
            let spec = FieldSpec::date("dateEmission", "Date");
            let rec = record(json!({"dateEmission": "2023-05-02T00:00:00.000Z"}));
            assert_eq!(spec.scalar_from_record(&rec), Some(FieldValue::text("2023-05-02")));
        }

        #[test]
        fn test_relation_accepts_populated_object() {
            let spec = FieldSpec::relation("parcelId", "Parcelle");
            let rec = record(json!({"parcelId": {"_id": "p1", "ville": "Thiès"}}));
            assert_eq!(spec.scalar_from_record(&rec), Some(FieldValue::text("p1")));
        }

        #[test]
        fn test_list_from_encoded_single_element_array() {
            let spec =
                FieldSpec::list("historiqueTransactions", "Historique", &["date"], &["date"]);
            let rec = record(json!({
                "historiqueTransactions": ["[{\"date\":\"2019-01-01\"}]"]
            }));
            assert_eq!(
                spec.scalar_from_record(&rec),
                Some(FieldValue::List(vec![json!({"date": "2019-01-01"})]))
            );
        }

        #[test]
        fn test_missing_and_null_values_are_absent() {
            let spec = FieldSpec::text("ville", "Ville");
            assert!(spec.scalar_from_record(&record(json!({}))).is_none());
            assert!(spec.scalar_from_record(&record(json!({"ville": null}))).is_none());
        }

        #[test]
        fn test_multi_file_reads_mixed_shapes() {
            let spec = FieldSpec::described_files("photos", "Photos", "photoDescriptions");
            let rec = record(json!({
                "photos": ["https://x/a.jpg", {"file": "https://x/b.jpg", "description": "Nord"}]
            }));
            match spec.value_from_record(&rec) {
                Some(DraftValue::Attachment(slot)) => {
                    let combined = slot.combined();
                    assert_eq!(combined.len(), 2);
                    assert_eq!(combined[1].description(), "Nord");
                }
                other => panic!("expected attachment, got {other:?}"),
            }
        }
    }
}
