//! Per-entity form schemas
//!
//! A schema is the static table a form host hands to the generic draft
//! engine: the fields, how they are grouped into steps, what gates each
//! step, which fields derive from others, and how the payload is encoded.

use super::field::{FieldKind, FieldSpec};
use super::validation::{CustomRule, RequiredField, StepDefinition};
use crate::api::FALLBACK_MESSAGE;
use chrono::{Local, NaiveDate};
use serde_json::{Map, Value};
use std::fmt;

/// Entities edited through a wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum EntityKind {
    #[default]
    Parcel,
    Title,
    Transaction,
    Report,
    User,
    /// Registration request filed by a citizen; only its status is edited
    Request,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Parcel,
        EntityKind::Title,
        EntityKind::Transaction,
        EntityKind::Report,
        EntityKind::User,
        EntityKind::Request,
    ];

    /// Plural label used in navigation
    pub fn label(&self) -> &'static str {
        match self {
            Self::Parcel => "Parcelles",
            Self::Title => "Titres fonciers",
            Self::Transaction => "Transactions",
            Self::Report => "Rapports",
            Self::User => "Utilisateurs",
            Self::Request => "Demandes",
        }
    }

    /// Key used for route configuration
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Parcel => "parcels",
            Self::Title => "titles",
            Self::Transaction => "transactions",
            Self::Report => "reports",
            Self::User => "users",
            Self::Request => "requests",
        }
    }

    /// Requests are filed by citizens, never from the console
    pub fn can_create(&self) -> bool {
        !matches!(self, Self::Request)
    }

    pub fn can_delete(&self) -> bool {
        !matches!(self, Self::Request)
    }

    pub fn next(&self) -> Self {
        let index = Self::ALL.iter().position(|k| k == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        let index = Self::ALL.iter().position(|k| k == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// How a change set travels to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireEncoding {
    #[default]
    Multipart,
    Json,
}

/// The parcel facts other forms derive display fields from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelSummary {
    pub id: String,
    pub ville: String,
    pub adresse: String,
}

impl ParcelSummary {
    pub fn from_record(fields: &Map<String, Value>) -> Option<Self> {
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let id = fields
            .get("_id")
            .or_else(|| fields.get("id"))
            .and_then(Value::as_str)?
            .to_string();
        Some(Self {
            id,
            ville: text("ville"),
            adresse: text("adresse"),
        })
    }
}

/// Explicit context handed to a form session
#[derive(Debug, Clone, PartialEq)]
pub struct FormContext {
    pub today: NaiveDate,
    pub parcels: Vec<ParcelSummary>,
}

impl FormContext {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            parcels: Vec::new(),
        }
    }

    /// Context dated with the local calendar day
    pub fn current() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn with_parcels(mut self, parcels: Vec<ParcelSummary>) -> Self {
        self.parcels = parcels;
        self
    }

    pub fn parcel(&self, id: &str) -> Option<&ParcelSummary> {
        self.parcels.iter().find(|p| p.id == id)
    }
}

/// Recomputes a dependent field from a source value.
///
/// Returning `None` leaves the target untouched.
pub type DeriveFn = fn(&str, &FormContext) -> Option<String>;

#[derive(Debug, Clone)]
pub struct DerivedRule {
    pub source: &'static str,
    pub target: &'static str,
    pub compute: DeriveFn,
}

/// Static form description for one entity kind
#[derive(Debug, Clone)]
pub struct FormSchema {
    pub kind: EntityKind,
    pub title: &'static str,
    pub encoding: WireEncoding,
    /// Shown when a failed submit carries no server message
    pub failure_message: &'static str,
    fields: Vec<FieldSpec>,
    steps: Vec<StepDefinition>,
    derived: Vec<DerivedRule>,
}

impl FormSchema {
    pub fn builder(kind: EntityKind, title: &'static str) -> FormSchemaBuilder {
        FormSchemaBuilder {
            schema: FormSchema {
                kind,
                title,
                encoding: WireEncoding::default(),
                failure_message: FALLBACK_MESSAGE,
                fields: Vec::new(),
                steps: Vec::new(),
                derived: Vec::new(),
            },
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Step by 1-based index
    pub fn step(&self, index: usize) -> Option<&StepDefinition> {
        index.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    pub fn derived_from(&self, source: &str) -> impl Iterator<Item = &DerivedRule> + '_ {
        let source = source.to_string();
        self.derived.iter().filter(move |rule| rule.source == source)
    }

    pub fn derived_rules(&self) -> &[DerivedRule] {
        &self.derived
    }
}

/// Builder for [`FormSchema`]; fields and rules attach to the latest step
pub struct FormSchemaBuilder {
    schema: FormSchema,
}

impl FormSchemaBuilder {
    pub fn encoding(mut self, encoding: WireEncoding) -> Self {
        self.schema.encoding = encoding;
        self
    }

    pub fn failure_message(mut self, message: &'static str) -> Self {
        self.schema.failure_message = message;
        self
    }

    /// Open a new step
    pub fn step(mut self, title: &'static str) -> Self {
        let index = self.schema.steps.len() + 1;
        self.schema.steps.push(StepDefinition {
            index,
            title,
            fields: Vec::new(),
            required_fields: Vec::new(),
            custom_rule: None,
        });
        self
    }

    fn current_step(&mut self) -> &mut StepDefinition {
        if self.schema.steps.is_empty() {
            self.schema.steps.push(StepDefinition {
                index: 1,
                title: self.schema.title,
                fields: Vec::new(),
                required_fields: Vec::new(),
                custom_rule: None,
            });
        }
        let last = self.schema.steps.len() - 1;
        &mut self.schema.steps[last]
    }

    /// Add a field laid out on the current step
    pub fn field(mut self, spec: FieldSpec) -> Self {
        let name = spec.name;
        self.schema.fields.push(spec);
        self.current_step().fields.push(name);
        self
    }

    /// Require a field on the current step with the stock message
    pub fn required(self, field: &'static str) -> Self {
        let label = self
            .schema
            .field(field)
            .map(|f| f.label)
            .unwrap_or(field);
        let message = match self.schema.field(field).map(|f| &f.kind) {
            Some(FieldKind::Relation) => format!("Veuillez sélectionner « {label} »."),
            _ => format!("Veuillez remplir le champ « {label} »."),
        };
        self.required_with(field, message)
    }

    /// Require a field on the current step with a specific message
    pub fn required_with(mut self, field: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        self.current_step()
            .required_fields
            .push(RequiredField { field, message });
        self
    }

    pub fn rule(mut self, rule: CustomRule) -> Self {
        self.current_step().custom_rule = Some(rule);
        self
    }

    pub fn derive(mut self, source: &'static str, target: &'static str, compute: DeriveFn) -> Self {
        self.schema.derived.push(DerivedRule {
            source,
            target,
            compute,
        });
        self
    }

    pub fn build(self) -> FormSchema {
        self.schema
    }
}
