//! Entity records mirrored from the backend and the traits that let the
//! generic list, form and API code work over all of them.

pub mod appointment;
pub mod billing;
pub mod de;
pub mod inventory;
pub mod medical;
pub mod order;
pub mod patient;
pub mod user;
pub mod visit;

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::validation::{FormMode, FormSchema, FormValues};

pub use appointment::{Appointment, AppointmentStatus};
pub use billing::{BillingCalculation, Invoice, InvoiceRequest, InvoiceStatus};
pub use inventory::{InventoryItem, InventoryType, StockAdjustment, StockOperation, StockStatus};
pub use medical::{MedicalRecordEntry, NewMedicalRecord};
pub use order::Order;
pub use patient::{EmergencyContact, Gender, InsurancePolicy, Patient};
pub use user::{Role, RoleNaming, User};
pub use visit::PatientVisit;

/// Which key addresses an entity in single-item endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    /// National identity number: `/{path}/cedula/{key}`.
    Cedula,
    /// Surrogate id: `/{path}/id/{key}`.
    Id,
}

/// A backend collection.
pub trait Resource: Clone + Debug + DeserializeOwned + Send + Sync + 'static {
    /// Collection path below the base URL, e.g. `/patients`.
    const PATH: &'static str;
    /// Singular noun for messages ("patient").
    const NOUN: &'static str;
    const KEY: KeyKind;

    /// Value of the addressing key; empty when the backend did not send one.
    fn key(&self) -> String;

    /// Displayed fields matched by the search box.
    fn search_fields(&self) -> Vec<&str>;

    fn columns() -> &'static [&'static str];

    fn cells(&self) -> Vec<String>;

    /// Value compared against the secondary filter, if the entity has one.
    fn facet(&self) -> Option<&'static str> {
        None
    }

    /// `(value, label)` choices for the secondary filter.
    fn facets() -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Key/value lines for the detail view.
    fn details(&self) -> Vec<(&'static str, String)> {
        Self::columns()
            .iter()
            .copied()
            .zip(self.cells())
            .collect()
    }

    fn find_path(key: &str) -> String {
        match Self::KEY {
            KeyKind::Cedula => format!("{}/cedula/{key}", Self::PATH),
            KeyKind::Id => format!("{}/id/{key}", Self::PATH),
        }
    }

    fn update_path(key: &str) -> String {
        format!("{}/{key}", Self::PATH)
    }

    fn delete_path(key: &str) -> String {
        match Self::KEY {
            KeyKind::Cedula => format!("{}/cedula/{key}", Self::PATH),
            KeyKind::Id => format!("{}/{key}", Self::PATH),
        }
    }
}

/// A resource with a create/edit form.
pub trait Editable: Resource {
    fn schema() -> FormSchema;

    /// Form values populated from this entity. Secret fields stay blank.
    fn to_form(&self) -> FormValues;

    /// Request body for POST (create) or PUT (edit).
    fn payload(values: &FormValues, mode: FormMode, naming: RoleNaming) -> Value;
}

/// Yes/No cell text.
pub(crate) fn yes_no(b: bool) -> String {
    if b { "Yes".to_string() } else { "No".to_string() }
}

/// Normalize a form date to the backend's `DD/MM/YYYY`; unparsable input is
/// passed through unchanged so the backend can reject it.
pub(crate) fn wire_date(input: &str) -> String {
    match crate::validation::parse_date(input) {
        Some(d) => d.format("%d/%m/%Y").to_string(),
        None => input.trim().to_string(),
    }
}

/// Backend date (either layout) into the form's `YYYY-MM-DD`.
pub(crate) fn form_date(wire: &str) -> String {
    match crate::validation::parse_date(wire) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => wire.to_string(),
    }
}

/// Form date-time into ISO `YYYY-MM-DDTHH:MM:SS`.
pub(crate) fn wire_date_time(input: &str) -> String {
    match crate::validation::parse_date_time(input) {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        None => input.trim().to_string(),
    }
}
