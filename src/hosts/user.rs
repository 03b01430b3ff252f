//! User account form (JSON body, single step)

use super::join_label;
use crate::state::{EntityKind, FieldSpec, FormSchema, Record, WireEncoding};

const ROLES: &[&str] = &["", "admin", "agent_foncier", "citoyen"];

pub(super) fn schema() -> FormSchema {
    FormSchema::builder(EntityKind::User, "Utilisateur")
        .encoding(WireEncoding::Json)
        .failure_message("Erreur lors de l'ajout")
        .field(FieldSpec::text("firstName", "Prénom"))
        .required("firstName")
        .field(FieldSpec::text("lastName", "Nom"))
        .required("lastName")
        .field(FieldSpec::text("email", "Email"))
        .required("email")
        .field(FieldSpec::text("phoneNumber", "Téléphone"))
        .required("phoneNumber")
        .field(FieldSpec::select("role", "Rôle", ROLES))
        .required_with("role", "Veuillez sélectionner un rôle.")
        .field(
            FieldSpec::text("password", "Mot de passe initial")
                .default_value("password")
                .create_only(),
        )
        .build()
}

pub(super) fn label(record: &Record) -> String {
    let name = join_label([record.text("firstName"), record.text("lastName")]);
    join_label([name.as_str(), record.text("email"), record.text("role")])
}
