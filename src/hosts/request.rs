//! Registration request status form (JSON body, single step)

use super::join_label;
use crate::state::{EntityKind, FieldSpec, FormSchema, Record, WireEncoding};
use serde_json::Value;

const STATUSES: &[&str] = &["pending", "in_progress", "completed", "rejected"];

pub(super) fn schema() -> FormSchema {
    FormSchema::builder(EntityKind::Request, "Demande d'immatriculation")
        .encoding(WireEncoding::Json)
        .step("Statut")
        // The endpoint expects the status on every update
        .field(FieldSpec::select("status", "Statut", STATUSES).always_resend())
        .build()
}

fn status_label(status: &str) -> &str {
    match status {
        "pending" => "En attente",
        "in_progress" => "En cours",
        "completed" => "Approuvée",
        "rejected" => "Rejetée",
        other => other,
    }
}

pub(super) fn label(record: &Record) -> String {
    let citizen = |key: &str| {
        record
            .fields
            .get("citizen")
            .and_then(|citizen| citizen.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
    };
    let name = join_label([citizen("firstName"), citizen("lastName")]);
    join_label([
        record.text("requestNumber"),
        name.as_str(),
        status_label(record.text("status")),
    ])
}
