use serde::{Deserialize, Serialize};

use super::{KeyKind, Resource, de};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "CREADA", alias = "CREATED")]
    Created,
    #[serde(rename = "EN_PROCESO", alias = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETADA", alias = "COMPLETED")]
    Completed,
    #[serde(rename = "CANCELADA", alias = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Created => "Created",
            OrderStatus::InProgress => "In progress",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationLine {
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub medication_name: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub dosage: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub treatment_duration: String,
    #[serde(default, deserialize_with = "de::amount")]
    pub cost: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureLine {
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub procedure_name: String,
    #[serde(default, deserialize_with = "de::count")]
    pub number_of_times: u32,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub frequency: String,
    #[serde(default, deserialize_with = "de::amount")]
    pub cost: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticAidLine {
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub diagnostic_aid_name: String,
    #[serde(default, deserialize_with = "de::count")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "de::amount")]
    pub cost: f64,
}

/// Clinical order issued by a doctor. Read-only on this client.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, deserialize_with = "de::string_or_number", alias = "id")]
    pub order_number: Option<String>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub patient_cedula: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub doctor_cedula: String,
    #[serde(default, deserialize_with = "de::nullable_string", alias = "orderDate")]
    pub creation_date: String,
    #[serde(default, deserialize_with = "de::lenient_enum")]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub medications: Vec<MedicationLine>,
    #[serde(default)]
    pub procedures: Vec<ProcedureLine>,
    #[serde(default)]
    pub diagnostic_aids: Vec<DiagnosticAidLine>,
}

impl Order {
    pub fn status_label(&self) -> &'static str {
        self.status.map(OrderStatus::label).unwrap_or("-")
    }

    pub fn item_count(&self) -> usize {
        self.medications.len() + self.procedures.len() + self.diagnostic_aids.len()
    }

    pub fn total_cost(&self) -> f64 {
        self.medications.iter().map(|m| m.cost).sum::<f64>()
            + self.procedures.iter().map(|p| p.cost).sum::<f64>()
            + self.diagnostic_aids.iter().map(|d| d.cost).sum::<f64>()
    }
}

impl Resource for Order {
    const PATH: &'static str = "/orders";
    const NOUN: &'static str = "order";
    const KEY: KeyKind = KeyKind::Id;

    fn key(&self) -> String {
        self.order_number.clone().unwrap_or_default()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.order_number.as_deref().unwrap_or(""),
            self.patient_cedula.as_str(),
            self.doctor_cedula.as_str(),
        ]
    }

    fn columns() -> &'static [&'static str] {
        &["Order", "Date", "Patient", "Doctor", "Items", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.key(),
            self.creation_date.clone(),
            self.patient_cedula.clone(),
            self.doctor_cedula.clone(),
            self.item_count().to_string(),
            self.status_label().to_string(),
        ]
    }

    fn find_path(key: &str) -> String {
        format!("{}/number/{key}", Self::PATH)
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("Order", self.key()),
            ("Date", self.creation_date.clone()),
            ("Patient", self.patient_cedula.clone()),
            ("Doctor", self.doctor_cedula.clone()),
            ("Status", self.status_label().to_string()),
        ];
        for m in &self.medications {
            lines.push((
                "Medication",
                format!("{} {} ({})", m.medication_name, m.dosage, m.treatment_duration),
            ));
        }
        for p in &self.procedures {
            lines.push((
                "Procedure",
                format!("{} x{} {}", p.procedure_name, p.number_of_times, p.frequency),
            ));
        }
        for d in &self.diagnostic_aids {
            lines.push(("Diagnostic aid", format!("{} x{}", d.diagnostic_aid_name, d.quantity)));
        }
        lines.push(("Total cost", format!("${:.2}", self.total_cost())));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_lines_and_costs() {
        let o: Order = serde_json::from_str(
            r#"{"orderNumber": 101, "patientCedula": "1", "status": "EN_PROCESO",
                "medications": [{"medicationName": "Amoxicillin", "cost": "12.5"}],
                "procedures": [{"procedureName": "X-ray", "numberOfTimes": 1, "cost": 30}]}"#,
        )
        .unwrap();
        assert_eq!(o.key(), "101");
        assert_eq!(o.item_count(), 2);
        assert_eq!(o.total_cost(), 42.5);
        assert_eq!(o.status_label(), "In progress");
        assert_eq!(Order::find_path("101"), "/orders/number/101");
    }
}
