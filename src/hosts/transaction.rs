//! Transaction form

use super::{join_label, parcel_address};
use crate::state::{Draft, EntityKind, FieldSpec, FormSchema, Record, ValidationResult};

const TYPES: &[&str] = &["vente", "achat", "transfert", "hypotheque", "donation", "echange"];
const STATUTS: &[&str] = &["en cours", "termine", "annule", "suspendu"];

fn parties_complete(draft: &Draft) -> Option<ValidationResult> {
    ["acheteurNom", "acheteurContact", "vendeurNom", "vendeurContact"]
        .iter()
        .any(|field| draft.is_field_empty(field))
        .then(|| ValidationResult::failed("Veuillez remplir tout les champs obligatoires."))
}

pub(super) fn schema() -> FormSchema {
    FormSchema::builder(EntityKind::Transaction, "Transaction")
        .step("Informations sur la transaction")
        .field(FieldSpec::select("type", "Type de transaction", TYPES))
        .field(FieldSpec::date("dateTransaction", "Date de la transaction").default_today())
        .field(FieldSpec::number("montant", "Montant (FCFA)"))
        .required_with("montant", "Veuillez remplir le montant.")
        .field(FieldSpec::select("statut", "Statut", STATUTS))
        .step("Parties impliquées")
        .field(FieldSpec::text("acheteurNom", "Nom de l'acheteur"))
        .field(FieldSpec::text("acheteurAdresse", "Adresse de l'acheteur"))
        .field(FieldSpec::text("acheteurContact", "Contact de l'acheteur"))
        .field(FieldSpec::text("vendeurNom", "Nom du vendeur"))
        .field(FieldSpec::text("vendeurAdresse", "Adresse du vendeur"))
        .field(FieldSpec::text("vendeurContact", "Contact du vendeur"))
        .field(FieldSpec::text("proprietairePrecedent", "Propriétaire précédent"))
        .field(FieldSpec::text("nouveauProprietaire", "Nouveau propriétaire"))
        .rule(parties_complete)
        .step("Parcelle")
        .field(FieldSpec::relation("parcelId", "Parcelle concernée"))
        .field(FieldSpec::text("adresseParcelle", "Adresse de la parcelle"))
        .field(FieldSpec::multiline("descriptionParcelle", "Description"))
        .derive("parcelId", "adresseParcelle", parcel_address)
        .step("Documents")
        .field(FieldSpec::single_file("contratVente", "Contrat de vente"))
        .field(FieldSpec::single_file("acteNotarie", "Acte notarié"))
        .field(FieldSpec::multi_file("autresDocuments", "Autres documents"))
        .build()
}

pub(super) fn label(record: &Record) -> String {
    let amount = match record.fields.get("montant") {
        Some(serde_json::Value::Number(n)) => format!("{n} FCFA"),
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => format!("{s} FCFA"),
        _ => String::new(),
    };
    let parties = match (record.text("vendeurNom"), record.text("acheteurNom")) {
        ("", "") => String::new(),
        (seller, buyer) => format!("{seller} → {buyer}"),
    };
    join_label([
        record.text("type"),
        parties.as_str(),
        amount.as_str(),
        record.text("statut"),
    ])
}
