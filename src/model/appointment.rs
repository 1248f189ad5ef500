use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Editable, KeyKind, Resource, RoleNaming, de, wire_date_time};
use crate::validation::{FieldKind, FieldSpec, FormMode, FormSchema, FormValues, Rule, normalize_cedula};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(rename = "PROGRAMADA", alias = "SCHEDULED")]
    Scheduled,
    #[serde(rename = "CONFIRMADA", alias = "CONFIRMED")]
    Confirmed,
    #[serde(rename = "EN_CURSO", alias = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETADA", alias = "COMPLETED")]
    Completed,
    #[serde(rename = "CANCELADA", alias = "CANCELLED")]
    Cancelled,
    #[serde(rename = "NO_ASISTIO", alias = "NO_SHOW")]
    NoShow,
}

impl AppointmentStatus {
    pub fn label(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::InProgress => "In progress",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::NoShow => "No show",
        }
    }

    /// Completed, cancelled and no-show appointments cannot be cancelled again.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled | AppointmentStatus::Confirmed | AppointmentStatus::InProgress
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub patient_cedula: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub patient_name: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub doctor_cedula: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub doctor_name: String,
    #[serde(default, deserialize_with = "de::nullable_string", alias = "dateTime")]
    pub appointment_date_time: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub reason: String,
    #[serde(default, deserialize_with = "de::lenient_enum")]
    pub status: Option<AppointmentStatus>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub notes: String,
}

impl Appointment {
    pub fn status_label(&self) -> &'static str {
        self.status.map(AppointmentStatus::label).unwrap_or("-")
    }

    pub fn can_cancel(&self) -> bool {
        self.status.is_none_or(AppointmentStatus::is_open)
    }

    fn patient(&self) -> &str {
        if self.patient_name.is_empty() { self.patient_cedula.as_str() } else { self.patient_name.as_str() }
    }

    fn doctor(&self) -> &str {
        if self.doctor_name.is_empty() { self.doctor_cedula.as_str() } else { self.doctor_name.as_str() }
    }
}

impl Resource for Appointment {
    const PATH: &'static str = "/appointments";
    const NOUN: &'static str = "appointment";
    const KEY: KeyKind = KeyKind::Id;

    fn key(&self) -> String {
        self.id.clone().unwrap_or_default()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient(),
            self.patient_cedula.as_str(),
            self.doctor(),
            self.reason.as_str(),
            self.status_label(),
        ]
    }

    fn columns() -> &'static [&'static str] {
        &["Date/time", "Patient", "Doctor", "Reason", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.appointment_date_time.replace('T', " "),
            self.patient().to_string(),
            self.doctor().to_string(),
            self.reason.clone(),
            self.status_label().to_string(),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Id", self.key()),
            ("Date/time", self.appointment_date_time.replace('T', " ")),
            ("Patient", self.patient().to_string()),
            ("Patient cedula", self.patient_cedula.clone()),
            ("Doctor", self.doctor().to_string()),
            ("Doctor cedula", self.doctor_cedula.clone()),
            ("Reason", self.reason.clone()),
            ("Status", self.status_label().to_string()),
            ("Notes", self.notes.clone()),
        ]
    }
}

impl Editable for Appointment {
    fn schema() -> FormSchema {
        FormSchema::new(vec![
            FieldSpec::new("patientCedula", "Patient national ID", FieldKind::Text)
                .required()
                .rule(Rule::Cedula)
                .external_key(),
            FieldSpec::new("doctorCedula", "Doctor national ID", FieldKind::Text)
                .required()
                .rule(Rule::Cedula)
                .external_key(),
            FieldSpec::new("appointmentDateTime", "Date/time", FieldKind::DateTime)
                .required()
                .rule(Rule::DateTime)
                .external_key(),
            FieldSpec::new("reason", "Reason", FieldKind::Text)
                .required()
                .rule(Rule::MaxLen(200)),
            FieldSpec::new("notes", "Notes", FieldKind::Text).rule(Rule::MaxLen(500)),
        ])
    }

    fn to_form(&self) -> FormValues {
        FormValues::blank(&Self::schema())
            .with_text("patientCedula", &self.patient_cedula)
            .with_text("doctorCedula", &self.doctor_cedula)
            .with_text("appointmentDateTime", self.appointment_date_time.replace('T', " "))
            .with_text("reason", &self.reason)
            .with_text("notes", &self.notes)
    }

    fn payload(values: &FormValues, mode: FormMode, _naming: RoleNaming) -> Value {
        let text = |k: &str| values.text(k).trim().to_string();
        match mode {
            FormMode::Create => json!({
                "patientCedula": normalize_cedula(values.text("patientCedula"))
                    .unwrap_or_else(|| text("patientCedula")),
                "doctorCedula": normalize_cedula(values.text("doctorCedula"))
                    .unwrap_or_else(|| text("doctorCedula")),
                "appointmentDateTime": wire_date_time(values.text("appointmentDateTime")),
                "reason": text("reason"),
                "notes": text("notes"),
            }),
            FormMode::Edit => json!({
                "reason": text("reason"),
                "notes": text("notes"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accepts_both_spellings() {
        let a: Appointment = serde_json::from_str(r#"{"id":1,"status":"CANCELLED"}"#).unwrap();
        assert_eq!(a.status, Some(AppointmentStatus::Cancelled));
        assert!(!a.can_cancel());
        let a: Appointment = serde_json::from_str(r#"{"id":"2","status":"PROGRAMADA"}"#).unwrap();
        assert_eq!(a.status, Some(AppointmentStatus::Scheduled));
        assert!(a.can_cancel());
        assert_eq!(a.key(), "2");
    }

    #[test]
    fn edit_payload_only_carries_mutable_fields() {
        let values = FormValues::blank(&Appointment::schema())
            .with_text("patientCedula", "12345678")
            .with_text("reason", "Checkup");
        let body = Appointment::payload(&values, FormMode::Edit, RoleNaming::English);
        assert_eq!(body, json!({"reason": "Checkup", "notes": ""}));
    }

    #[test]
    fn create_payload_normalizes_date_time() {
        let values = FormValues::blank(&Appointment::schema())
            .with_text("patientCedula", "12345678")
            .with_text("doctorCedula", "87654321")
            .with_text("appointmentDateTime", "2025-03-01 09:30")
            .with_text("reason", "Checkup");
        assert!(Appointment::schema().validate(&values, FormMode::Create).is_empty());
        let body = Appointment::payload(&values, FormMode::Create, RoleNaming::English);
        assert_eq!(body["appointmentDateTime"], "2025-03-01T09:30:00");
    }
}
