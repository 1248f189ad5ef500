use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{KeyKind, Resource, de};
use crate::error::FieldErrors;
use crate::validation::{FieldKind, FieldSpec, FormMode, FormSchema, FormValues, Rule, normalize_cedula, parse_date};

/// One consultation in a patient's medical history.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecordEntry {
    #[serde(default, deserialize_with = "de::nullable_string", alias = "recordDate", alias = "consultationDate")]
    pub date: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub doctor_cedula: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub consultation_reason: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub symptoms: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub diagnosis: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub observations: String,
}

/// Decode `GET /medical-records/patient/{cedula}`.
///
/// The backend answers `{patientCedula, records: {date: entry}}`; a bare
/// array or single entry is accepted too. Newest first.
pub fn parse_history(value: Value) -> Result<Vec<MedicalRecordEntry>, serde_json::Error> {
    let mut entries = match value {
        Value::Null => Vec::new(),
        Value::Array(_) => serde_json::from_value::<Vec<MedicalRecordEntry>>(value)?,
        Value::Object(mut map) if map.contains_key("records") => {
            let records = match map.remove("records") {
                Some(Value::Object(records)) => records,
                _ => serde_json::Map::new(),
            };
            let mut out = Vec::with_capacity(records.len());
            for (date, raw) in records {
                let mut entry: MedicalRecordEntry = serde_json::from_value(raw)?;
                if entry.date.is_empty() {
                    entry.date = date;
                }
                out.push(entry);
            }
            out
        }
        other => vec![serde_json::from_value::<MedicalRecordEntry>(other)?],
    };
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(entries)
}

impl Resource for MedicalRecordEntry {
    const PATH: &'static str = "/medical-records";
    const NOUN: &'static str = "medical record";
    const KEY: KeyKind = KeyKind::Id;

    fn key(&self) -> String {
        self.date.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.consultation_reason.as_str(),
            self.diagnosis.as_str(),
            self.symptoms.as_str(),
        ]
    }

    fn columns() -> &'static [&'static str] {
        &["Date", "Doctor", "Reason", "Diagnosis"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.doctor_cedula.clone(),
            self.consultation_reason.clone(),
            self.diagnosis.clone(),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Date", self.date.clone()),
            ("Doctor", self.doctor_cedula.clone()),
            ("Reason", self.consultation_reason.clone()),
            ("Symptoms", self.symptoms.clone()),
            ("Diagnosis", self.diagnosis.clone()),
            ("Observations", self.observations.clone()),
        ]
    }
}

/// Body of `POST /medical-records`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedicalRecord {
    pub patient_cedula: String,
    pub doctor_cedula: String,
    pub consultation_reason: String,
    pub consultation_date: String,
    pub symptoms: String,
    pub diagnosis: String,
    pub observations: String,
}

impl NewMedicalRecord {
    pub fn schema() -> FormSchema {
        FormSchema::new(vec![
            FieldSpec::new("consultationDate", "Consultation date", FieldKind::Date)
                .required()
                .rule(Rule::Date),
            FieldSpec::new("doctorCedula", "Doctor national ID", FieldKind::Text)
                .required()
                .rule(Rule::Cedula),
            FieldSpec::new("consultationReason", "Reason", FieldKind::Text)
                .required()
                .rule(Rule::MaxLen(200)),
            FieldSpec::new("symptoms", "Symptoms", FieldKind::Text).rule(Rule::MaxLen(1000)),
            FieldSpec::new("diagnosis", "Diagnosis", FieldKind::Text).rule(Rule::MaxLen(1000)),
            FieldSpec::new("observations", "Observations", FieldKind::Text).rule(Rule::MaxLen(1000)),
        ])
    }

    /// Blank form with today's date and the signed-in doctor prefilled.
    pub fn blank_form(today: NaiveDate, doctor_cedula: &str) -> FormValues {
        FormValues::blank(&Self::schema())
            .with_text("consultationDate", today.format("%Y-%m-%d").to_string())
            .with_text("doctorCedula", doctor_cedula)
    }

    pub fn from_form(values: &FormValues, patient_cedula: &str) -> Result<Self, FieldErrors> {
        let errors = Self::schema().validate(values, FormMode::Create);
        if !errors.is_empty() {
            return Err(errors);
        }
        let text = |k: &str| values.text(k).trim().to_string();
        Ok(Self {
            patient_cedula: patient_cedula.to_string(),
            doctor_cedula: normalize_cedula(values.text("doctorCedula")).unwrap_or_default(),
            consultation_reason: text("consultationReason"),
            consultation_date: parse_date(values.text("consultationDate"))
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            symptoms: text("symptoms"),
            diagnosis: text("diagnosis"),
            observations: text("observations"),
        })
    }
}
