//! Property title form

use super::{join_label, parcel_address};
use crate::state::{EntityKind, FieldSpec, FormSchema, Record};

const TYPES_TITRE: &[&str] = &["foncier", "immobilier", "communautaire", "concession", "autre"];

pub(super) fn schema() -> FormSchema {
    FormSchema::builder(EntityKind::Title, "Titre de propriété")
        .step("Informations sur le titre")
        .field(FieldSpec::text("numeroTitre", "Numéro du titre"))
        .field(FieldSpec::date("dateEmission", "Date d'émission").default_today())
        .field(
            FieldSpec::select("typeTitre", "Type de titre", TYPES_TITRE).default_value("foncier"),
        )
        .step("Propriétaire")
        .field(FieldSpec::text("proprietaireNom", "Nom"))
        .required_with("proprietaireNom", "Veuillez remplir le nom du propriétaire.")
        .field(FieldSpec::text("proprietairePrenom", "Prénom"))
        .required_with("proprietairePrenom", "Veuillez remplir le prénom du propriétaire.")
        .field(FieldSpec::text("proprietaireAdresse", "Adresse"))
        .required_with("proprietaireAdresse", "Veuillez remplir l'adresse du propriétaire.")
        .field(FieldSpec::text("proprietaireContact", "Contact"))
        .required_with("proprietaireContact", "Veuillez remplir le contact du propriétaire.")
        .field(FieldSpec::text("proprietaireEmail", "Email"))
        .step("Parcelle")
        .field(FieldSpec::relation("parcelId", "Parcelle associée"))
        .required_with("parcelId", "Veuillez sélectionner la parcelle associée.")
        .field(FieldSpec::text("adresseParcelle", "Adresse de la parcelle"))
        .required_with("adresseParcelle", "Veuillez remplir l'adresse de la parcelle.")
        .field(FieldSpec::multiline("descriptionParcelle", "Description"))
        .derive("parcelId", "adresseParcelle", parcel_address)
        .step("Droits et restrictions")
        .field(FieldSpec::multiline("droitsPropriete", "Droits de propriété"))
        .field(FieldSpec::multiline("restrictions", "Restrictions"))
        .field(FieldSpec::multiline("servitudes", "Servitudes"))
        .field(FieldSpec::multiline("hypothèques", "Hypothèques"))
        .step("Historique des transactions")
        .field(
            FieldSpec::list(
                "historiqueTransactions",
                "Historique des transactions",
                &["date", "nature", "details"],
                &["date", "nature"],
            )
            .always_resend(),
        )
        .step("Documents")
        .field(FieldSpec::single_file("copieTitre", "Copie du titre de propriété"))
        .field(FieldSpec::single_file("actesNotaries", "Actes notariés"))
        .field(FieldSpec::multi_file("autresDocuments", "Autres documents"))
        .build()
}

pub(super) fn label(record: &Record) -> String {
    let owner = join_label([record.text("proprietairePrenom"), record.text("proprietaireNom")]);
    join_label([record.text("numeroTitre"), owner.as_str(), record.text("typeTitre")])
}
