//! Site inspection report form

use super::join_label;
use crate::state::{Draft, EntityKind, FieldSpec, FormSchema, Record};

const OBJETS: &[&str] = &["constatation", "bornage", "evaluation", "litige", "autre"];
const URGENCES: &[&str] = &["faible", "moyenne", "élevée", "critique"];

fn objet_is(draft: &Draft, objet: &str) -> bool {
    draft.text("objetDescente") == objet
}

fn for_constatation(draft: &Draft) -> bool {
    objet_is(draft, "constatation")
}

fn for_bornage(draft: &Draft) -> bool {
    objet_is(draft, "bornage")
}

fn for_evaluation(draft: &Draft) -> bool {
    objet_is(draft, "evaluation")
}

fn for_litige(draft: &Draft) -> bool {
    objet_is(draft, "litige")
}

pub(super) fn schema() -> FormSchema {
    FormSchema::builder(EntityKind::Report, "Rapport de descente")
        .step("Informations générales")
        .field(FieldSpec::date("dateDescente", "Date de descente"))
        .required_with("dateDescente", "La date de descente est obligatoire")
        .field(FieldSpec::text("heureDebut", "Heure de début"))
        .field(FieldSpec::text("heureFin", "Heure de fin"))
        .field(FieldSpec::text("lieuExact", "Lieu exact"))
        .field(FieldSpec::text("coordonneesGPS", "Coordonnées GPS"))
        .field(FieldSpec::text("referenceDossier", "Référence du dossier"))
        .field(FieldSpec::select("objetDescente", "Objet de la descente", OBJETS))
        .field(FieldSpec::text("conditionsMeteo", "Conditions météo").default_value("clair"))
        .step("Description du terrain")
        .field(FieldSpec::text("superficie", "Superficie"))
        .field(FieldSpec::multiline("limitesBornes", "Limites et bornes"))
        .field(FieldSpec::multiline("topographie", "Topographie"))
        .field(FieldSpec::multiline("occupationSol", "Occupation du sol"))
        .field(FieldSpec::multiline("infrastructures", "Infrastructures"))
        .field(FieldSpec::multiline("servitudes", "Servitudes"))
        .field(FieldSpec::multiline("observations", "Observations"))
        .step("Constatations")
        .field(
            FieldSpec::multiline("occupationParties", "Occupation par les parties")
                .visible_when(for_constatation),
        )
        .field(
            FieldSpec::multiline("constructions", "Constructions")
                .visible_when(for_constatation),
        )
        .field(
            FieldSpec::multiline("tracesActivites", "Traces d'activités")
                .visible_when(for_constatation),
        )
        .field(
            FieldSpec::multiline("respectPlans", "Respect des plans")
                .visible_when(for_constatation),
        )
        .field(
            FieldSpec::multiline("difficultesBornage", "Difficultés de bornage")
                .visible_when(for_bornage),
        )
        .field(
            FieldSpec::multiline("accordParties", "Accord des parties")
                .visible_when(for_bornage),
        )
        .field(
            FieldSpec::multiline("positionBornes", "Position des bornes")
                .visible_when(for_bornage),
        )
        .field(
            FieldSpec::multiline("elementsEvaluation", "Éléments d'évaluation")
                .visible_when(for_evaluation),
        )
        .field(
            FieldSpec::multiline("comparaisonBiens", "Comparaison avec des biens similaires")
                .visible_when(for_evaluation),
        )
        .field(
            FieldSpec::multiline("pointsDesaccord", "Points de désaccord")
                .visible_when(for_litige),
        )
        .field(
            FieldSpec::multiline("preuvesObservées", "Preuves observées")
                .visible_when(for_litige),
        )
        .step("Déclarations")
        .field(
            FieldSpec::list(
                "declarations",
                "Déclarations des personnes présentes",
                &["nom", "prenom", "qualite", "declaration"],
                &["nom", "declaration"],
            )
            .always_resend(),
        )
        .step("Pièces jointes")
        .field(FieldSpec::described_files("documents", "Documents", "documentDescriptions"))
        .field(FieldSpec::described_files("photos", "Photos", "photoDescriptions"))
        .step("Recommandations")
        .field(FieldSpec::multiline("recommandations", "Recommandations"))
        .field(FieldSpec::select("urgence", "Urgence", URGENCES).default_value("moyenne"))
        .field(FieldSpec::text("partiesResponsables", "Parties responsables"))
        .field(FieldSpec::date("dateEcheance", "Date d'échéance"))
        .step("Prévisualisation")
        .build()
}

pub(super) fn label(record: &Record) -> String {
    let date = record.text("dateDescente").split('T').next().unwrap_or_default();
    join_label([
        date,
        record.text("objetDescente"),
        record.text("lieuExact"),
        record.text("referenceDossier"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        ChangeSetBuilder, DraftError, DraftStore, FieldValue, FormContext, LocalFile, WirePart,
    };
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map};
    use std::sync::Arc;

    fn store() -> DraftStore {
        DraftStore::init_empty(
            Arc::new(schema()),
            FormContext::new(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()),
        )
    }

    #[test]
    fn test_defaults() {
        let store = store();
        assert_eq!(store.snapshot().text("objetDescente"), "constatation");
        assert_eq!(store.snapshot().text("conditionsMeteo"), "clair");
        assert_eq!(store.snapshot().text("urgence"), "moyenne");
        assert_eq!(store.snapshot().text("dateDescente"), "");
    }

    #[test]
    fn test_observation_fields_follow_objet() {
        let mut store = store();
        let schema = store.schema().clone();
        let visible = |store: &DraftStore| -> Vec<&'static str> {
            schema
                .step(3)
                .unwrap()
                .fields
                .iter()
                .filter(|name| {
                    schema
                        .field(name)
                        .map_or(false, |spec| spec.is_visible(store.snapshot()))
                })
                .copied()
                .collect()
        };
        assert_eq!(
            visible(&store),
            vec!["occupationParties", "constructions", "tracesActivites", "respectPlans"]
        );
        store.set_field("objetDescente", FieldValue::text("litige")).unwrap();
        assert_eq!(visible(&store), vec!["pointsDesaccord", "preuvesObservées"]);
        store.set_field("objetDescente", FieldValue::text("autre")).unwrap();
        assert!(visible(&store).is_empty());
    }

    #[test]
    fn test_declaration_needs_name_and_statement() {
        let mut store = store();
        let mut entry = Map::new();
        entry.insert("nom".into(), json!("Sow"));
        assert_eq!(
            store.push_list_item("declarations", entry.clone()),
            Err(DraftError::IncompleteListItem {
                field: "declarations",
                key: "declaration"
            })
        );
        entry.insert("declaration".into(), json!("Je confirme la limite nord."));
        store.push_list_item("declarations", entry).unwrap();
        assert!(!store.snapshot().is_field_empty("declarations"));
    }

    #[test]
    fn test_photo_descriptions_travel_with_files() {
        let mut store = store();
        store
            .add_files(
                "photos",
                [
                    LocalFile::new("/tmp/nord.jpg"),
                    LocalFile::new("/tmp/sud.jpg"),
                ],
            )
            .unwrap();
        store.describe_attachment("photos", 1, "Borne sud").unwrap();

        let schema = store.schema().clone();
        let changes = ChangeSetBuilder::new(&schema, None)
            .build(store.snapshot())
            .unwrap();
        let tail: Vec<(String, String)> = changes
            .to_parts()
            .into_iter()
            .filter_map(|part| match part {
                WirePart::File { name, file } => Some((name, file.name)),
                WirePart::Text { name, value } if name == "photoDescriptions" => {
                    Some((name, value))
                }
                WirePart::Text { .. } => None,
            })
            .collect();
        assert_eq!(
            tail,
            vec![
                ("photos".to_string(), "nord.jpg".to_string()),
                ("photoDescriptions".to_string(), String::new()),
                ("photos".to_string(), "sud.jpg".to_string()),
                ("photoDescriptions".to_string(), "Borne sud".to_string()),
            ]
        );
    }

    #[test]
    fn test_removal_is_scoped_to_one_slot() {
        let record = Record::from_value(json!({
            "_id": "r1",
            "documents": ["https://x/shared.pdf"],
            "photos": ["https://x/shared.pdf"]
        }))
        .unwrap();
        let schema = Arc::new(schema());
        let mut store = DraftStore::init_from_record(
            schema.clone(),
            FormContext::new(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()),
            &record,
        );
        store.remove_attachment("documents", 0).unwrap();
        assert_eq!(store.snapshot().slot("photos").unwrap().len(), 1);

        let changes = ChangeSetBuilder::new(&schema, Some(&record))
            .build(store.snapshot())
            .unwrap();
        assert!(changes.deletion_markers.contains_key("documentsToDelete"));
        assert!(!changes.deletion_markers.contains_key("photosToDelete"));
    }

    #[test]
    fn test_label() {
        let record = Record::from_value(json!({
            "_id": "r1",
            "dateDescente": "2024-03-01T00:00:00.000Z",
            "objetDescente": "bornage",
            "lieuExact": "Keur Massar"
        }))
        .unwrap();
        assert_eq!(label(&record), "2024-03-01 · bornage · Keur Massar");
    }
}
