//! Form hosts: one schema per entity, plus list labels

mod parcel;
mod report;
mod request;
mod title;
mod transaction;
mod user;

use crate::state::{EntityKind, FormContext, FormSchema, Record};
use std::sync::Arc;

/// The form schema a wizard for `kind` runs on
pub fn schema_for(kind: EntityKind) -> Arc<FormSchema> {
    Arc::new(match kind {
        EntityKind::Parcel => parcel::schema(),
        EntityKind::Title => title::schema(),
        EntityKind::Transaction => transaction::schema(),
        EntityKind::Report => report::schema(),
        EntityKind::User => user::schema(),
        EntityKind::Request => request::schema(),
    })
}

/// One-line summary of a record for the list screen
pub fn record_label(kind: EntityKind, record: &Record) -> String {
    let label = match kind {
        EntityKind::Parcel => parcel::label(record),
        EntityKind::Title => title::label(record),
        EntityKind::Transaction => transaction::label(record),
        EntityKind::Report => report::label(record),
        EntityKind::User => user::label(record),
        EntityKind::Request => request::label(record),
    };
    if label.trim().is_empty() {
        record.id.clone()
    } else {
        label
    }
}

/// Message shown once a record is saved
pub fn saved_message(kind: EntityKind, created: bool) -> &'static str {
    match (kind, created) {
        (EntityKind::Parcel, _) => "Parcelle enregistrée avec succès",
        (EntityKind::Title, _) => "Titre de propriété enregistré avec succès",
        (EntityKind::Transaction, _) => "Transaction enregistrée avec succès",
        (EntityKind::Report, _) => "Rapport enregistré avec succès",
        (EntityKind::User, true) => "Utilisateur ajouté avec succès",
        (EntityKind::User, false) => "Utilisateur mis à jour avec succès",
        (EntityKind::Request, _) => "Statut de la demande mis à jour",
    }
}

/// `"<ville>, <adresse>"` of the selected parcel
pub(crate) fn parcel_address(id: &str, context: &FormContext) -> Option<String> {
    context
        .parcel(id)
        .map(|parcel| format!("{}, {}", parcel.ville, parcel.adresse))
}

/// Join the non-empty parts of a label
pub(crate) fn join_label<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" · ")
}
