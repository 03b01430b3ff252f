//! Parcel form

use super::join_label;
use crate::state::{Draft, EntityKind, FieldSpec, FormSchema, Record, ValidationResult};

const TYPES_SOL: &[&str] = &["", "agricole", "forestier", "urbain", "autre"];
const TOPOGRAPHIES: &[&str] = &["", "plat", "pente", "vallonné"];
const USAGES: &[&str] = &["", "agricole", "residentiel", "commercial", "industriel"];

fn owner_complete(draft: &Draft) -> Option<ValidationResult> {
    ["proprietaireNom", "proprietaireAdresse", "proprietaireContact"]
        .iter()
        .any(|field| draft.is_field_empty(field))
        .then(|| ValidationResult::failed("Veuillez remplir tous les champs du propriétaire."))
}

pub(super) fn schema() -> FormSchema {
    FormSchema::builder(EntityKind::Parcel, "Parcelle")
        .step("Informations générales")
        .field(FieldSpec::text("adresse", "Adresse"))
        .field(FieldSpec::text("rue", "Rue"))
        .field(FieldSpec::text("numero", "Numéro"))
        .field(FieldSpec::text("ville", "Ville"))
        .field(FieldSpec::text("codePostal", "Code postal"))
        .field(FieldSpec::number("superficie", "Superficie (m²)"))
        .required_with("superficie", "Veuillez remplir la superficie.")
        .step("Caractéristiques")
        .field(FieldSpec::select("typeSol", "Type de sol", TYPES_SOL))
        .field(FieldSpec::select("topographie", "Topographie", TOPOGRAPHIES))
        .field(FieldSpec::select("usageActuel", "Usage actuel", USAGES))
        .step("Limites")
        .field(FieldSpec::text("coordonnees", "Coordonnées"))
        .required_with("coordonnees", "Veuillez remplir les coordonnées.")
        .field(FieldSpec::single_file("planParcelle", "Plan de la parcelle"))
        .field(FieldSpec::multiline("pointsBornage", "Points de bornage"))
        .step("Propriétaires et droits")
        .field(FieldSpec::text("proprietaireNom", "Nom du propriétaire"))
        .field(FieldSpec::text("proprietaireAdresse", "Adresse du propriétaire"))
        .field(FieldSpec::text("proprietaireContact", "Contact du propriétaire"))
        .rule(owner_complete)
        .field(FieldSpec::multiline("droitsFonciers", "Droits fonciers"))
        .field(FieldSpec::multiline("servitudes", "Servitudes"))
        .field(FieldSpec::multiline("hypothèques", "Hypothèques"))
        .step("Documents")
        .field(FieldSpec::single_file("titrePropriete", "Titre de propriété"))
        .field(FieldSpec::single_file("planCadastral", "Plan cadastral"))
        .field(FieldSpec::multi_file("autresDocuments", "Autres documents"))
        .build()
}

pub(super) fn label(record: &Record) -> String {
    let surface = match record.fields.get("superficie") {
        Some(serde_json::Value::Number(n)) => format!("{n} m²"),
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => format!("{s} m²"),
        _ => String::new(),
    };
    join_label([record.text("ville"), record.text("adresse"), surface.as_str()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FieldValue, FormContext, WizardController};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::Arc;

    fn wizard() -> WizardController {
        WizardController::create(
            Arc::new(schema()),
            FormContext::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        )
    }

    #[test]
    fn test_superficie_gates_first_step() {
        let mut wizard = wizard();
        let result = wizard.next();
        assert_eq!(result.message.as_deref(), Some("Veuillez remplir la superficie."));
        assert_eq!(wizard.step(), 1);
    }

    #[test]
    fn test_owner_fields_checked_together() {
        let mut wizard = wizard();
        let draft = wizard.edit_draft().unwrap();
        draft.set_field("superficie", FieldValue::text("120")).unwrap();
        draft.set_field("coordonnees", FieldValue::text("14.7,-17.4")).unwrap();
        draft.set_field("proprietaireNom", FieldValue::text("Diop")).unwrap();
        assert!(wizard.next().ok);
        assert!(wizard.next().ok);
        assert!(wizard.next().ok);
        let result = wizard.next();
        assert_eq!(
            result.message.as_deref(),
            Some("Veuillez remplir tous les champs du propriétaire.")
        );
        assert_eq!(wizard.step(), 4);
    }

    #[test]
    fn test_label() {
        let record =
            Record::from_value(json!({
            "_id": "p1",
            "ville": "Dakar",
            "adresse": "Rue 12",
            "superficie": 120
        }))
                .unwrap();
        assert_eq!(label(&record), "Dakar · Rue 12 · 120 m²");
    }
}
