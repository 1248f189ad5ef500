use serde::Deserialize;

use super::{KeyKind, Resource, de, yes_no};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub blood_pressure: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub temperature: Option<String>,
    #[serde(default)]
    pub pulse: Option<u32>,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub oxygen_level: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NurseRecord {
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub administered_medications: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub performed_procedures: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub observations: String,
}

/// Nurse visit with vital signs. Read-only on this client.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientVisit {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub patient_cedula: String,
    #[serde(default, deserialize_with = "de::nullable_string", alias = "visitDate")]
    pub visit_date_time: String,
    #[serde(default)]
    pub vital_signs: Option<VitalSigns>,
    #[serde(default)]
    pub nurse_record: Option<NurseRecord>,
    #[serde(default)]
    pub completed: bool,
}

impl PatientVisit {
    fn vitals_summary(&self) -> String {
        match &self.vital_signs {
            Some(v) => format!(
                "BP {} T {} P {}",
                if v.blood_pressure.is_empty() { "-" } else { v.blood_pressure.as_str() },
                v.temperature.as_deref().unwrap_or("-"),
                v.pulse.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            ),
            None => "-".to_string(),
        }
    }
}

impl Resource for PatientVisit {
    const PATH: &'static str = "/patient-visits";
    const NOUN: &'static str = "patient visit";
    const KEY: KeyKind = KeyKind::Id;

    fn key(&self) -> String {
        self.id.clone().unwrap_or_default()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.patient_cedula.as_str(), self.visit_date_time.as_str()]
    }

    fn columns() -> &'static [&'static str] {
        &["Date/time", "Patient", "Vital signs", "Completed"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.visit_date_time.replace('T', " "),
            self.patient_cedula.clone(),
            self.vitals_summary(),
            yes_no(self.completed),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("Id", self.key()),
            ("Date/time", self.visit_date_time.replace('T', " ")),
            ("Patient", self.patient_cedula.clone()),
            ("Vital signs", self.vitals_summary()),
        ];
        if let Some(v) = &self.vital_signs {
            lines.push(("Oxygen level", v.oxygen_level.clone().unwrap_or_default()));
        }
        if let Some(n) = &self.nurse_record {
            lines.push(("Medications", n.administered_medications.clone()));
            lines.push(("Procedures", n.performed_procedures.clone()));
            lines.push(("Observations", n.observations.clone()));
        }
        lines.push(("Completed", yes_no(self.completed)));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_summary_tolerates_missing_vitals() {
        let v: PatientVisit = serde_json::from_str(
            r#"{"id": 3, "patientCedula": "1", "visitDateTime": "2025-01-01T08:00:00",
                "vitalSigns": {"bloodPressure": "120/80", "temperature": 36.5, "pulse": 70}}"#,
        )
        .unwrap();
        assert_eq!(v.cells()[2], "BP 120/80 T 36.5 P 70");
        let v: PatientVisit = serde_json::from_str(r#"{"patientCedula": "1"}"#).unwrap();
        assert_eq!(v.cells()[2], "-");
    }
}
