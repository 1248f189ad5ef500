use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{KeyKind, Resource, de};
use crate::error::FieldErrors;
use crate::validation::{FieldKind, FieldSpec, FormMode, FormSchema, FormValues, Rule, normalize_cedula, parse_date};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[serde(alias = "PENDIENTE")]
    Pending,
    #[serde(alias = "PAGADA")]
    Paid,
    #[serde(alias = "VENCIDA")]
    Overdue,
    #[serde(alias = "CANCELADA")]
    Cancelled,
}

pub const INVOICE_STATUS_CHOICES: &[(&str, &str)] = &[
    ("PENDING", "Pending"),
    ("PAID", "Paid"),
    ("OVERDUE", "Overdue"),
    ("CANCELLED", "Cancelled"),
];

impl InvoiceStatus {
    pub fn wire_name(self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(default, deserialize_with = "de::string_or_number", alias = "id")]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub patient_name: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub patient_cedula: String,
    #[serde(default, deserialize_with = "de::amount", alias = "total")]
    pub total_amount: f64,
    #[serde(default, deserialize_with = "de::lenient_enum")]
    pub status: Option<InvoiceStatus>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub billing_date: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub due_date: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub notes: String,
}

impl Invoice {
    pub fn status_label(&self) -> &'static str {
        self.status.map(InvoiceStatus::label).unwrap_or("-")
    }

    pub fn is_pending(&self) -> bool {
        self.status == Some(InvoiceStatus::Pending)
    }
}

/// Sum of the amounts of pending invoices.
pub fn pending_total<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> f64 {
    invoices
        .into_iter()
        .filter(|i| i.is_pending())
        .map(|i| i.total_amount)
        .sum()
}

impl Resource for Invoice {
    const PATH: &'static str = "/billing/invoices";
    const NOUN: &'static str = "invoice";
    const KEY: KeyKind = KeyKind::Id;

    fn key(&self) -> String {
        self.invoice_number.clone().unwrap_or_default()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.patient_name.as_str(),
            self.invoice_number.as_deref().unwrap_or(""),
        ]
    }

    fn columns() -> &'static [&'static str] {
        &["Invoice", "Patient", "Cedula", "Date", "Total", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.key(),
            self.patient_name.clone(),
            self.patient_cedula.clone(),
            self.billing_date.clone(),
            format!("${:.2}", self.total_amount),
            self.status_label().to_string(),
        ]
    }

    fn facet(&self) -> Option<&'static str> {
        self.status.map(InvoiceStatus::wire_name)
    }

    fn facets() -> &'static [(&'static str, &'static str)] {
        INVOICE_STATUS_CHOICES
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Invoice", self.key()),
            ("Patient", self.patient_name.clone()),
            ("Cedula", self.patient_cedula.clone()),
            ("Billing date", self.billing_date.clone()),
            ("Due date", self.due_date.clone()),
            ("Total", format!("${:.2}", self.total_amount)),
            ("Status", self.status_label().to_string()),
            ("Notes", self.notes.clone()),
        ]
    }
}

/// Result of `GET /billing/calculate/{cedula}`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingCalculation {
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub patient_cedula: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub patient_name: String,
    #[serde(default, deserialize_with = "de::amount", alias = "totalCost")]
    pub subtotal: f64,
    #[serde(default, deserialize_with = "de::amount", alias = "copaymentAmount")]
    pub copayment: f64,
    #[serde(default, deserialize_with = "de::amount", alias = "insuranceCoverageAmount")]
    pub insurance_coverage: f64,
    #[serde(default, deserialize_with = "de::amount")]
    pub total: f64,
    #[serde(default, alias = "copaymentLimitExceeded")]
    pub has_exceeded_annual_limit: bool,
    #[serde(default, deserialize_with = "de::nullable_string", alias = "copaymentLimitMessage")]
    pub message: String,
}

impl BillingCalculation {
    /// Amount the patient owes; falls back to the copayment when the
    /// backend sends no explicit total.
    pub fn amount_due(&self) -> f64 {
        if self.total > 0.0 { self.total } else { self.copayment }
    }

    pub fn lines(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("Patient", self.patient_cedula.clone()),
            ("Subtotal", format!("${:.2}", self.subtotal)),
            ("Insurance coverage", format!("${:.2}", self.insurance_coverage)),
            ("Copayment", format!("${:.2}", self.copayment)),
            ("Total due", format!("${:.2}", self.amount_due())),
            (
                "Annual limit exceeded",
                if self.has_exceeded_annual_limit { "Yes" } else { "No" }.to_string(),
            ),
        ];
        if !self.patient_name.is_empty() {
            lines.insert(0, ("Name", self.patient_name.clone()));
        }
        if !self.message.is_empty() {
            lines.push(("Note", self.message.clone()));
        }
        lines
    }
}

/// Body of `POST /billing/generate`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub patient_cedula: String,
    pub billing_date: String,
    pub notes: String,
    pub include_medical_records: bool,
    pub include_medications: bool,
    pub include_procedures: bool,
    pub include_diagnostic_aids: bool,
}

impl InvoiceRequest {
    pub fn schema() -> FormSchema {
        FormSchema::new(vec![
            FieldSpec::new("patientCedula", "Patient national ID", FieldKind::Text)
                .required()
                .rule(Rule::Cedula),
            FieldSpec::new("billingDate", "Billing date", FieldKind::Date).rule(Rule::Date),
            FieldSpec::new("notes", "Notes", FieldKind::Text).rule(Rule::MaxLen(500)),
            FieldSpec::new("includeMedicalRecords", "Include consultations", FieldKind::Flag),
            FieldSpec::new("includeMedications", "Include medications", FieldKind::Flag),
            FieldSpec::new("includeProcedures", "Include procedures", FieldKind::Flag),
            FieldSpec::new("includeDiagnosticAids", "Include diagnostic aids", FieldKind::Flag),
        ])
    }

    pub fn blank_form(today: NaiveDate) -> FormValues {
        FormValues::blank(&Self::schema())
            .with_text("billingDate", today.format("%Y-%m-%d").to_string())
            .with_flag("includeMedicalRecords", true)
            .with_flag("includeMedications", true)
            .with_flag("includeProcedures", true)
            .with_flag("includeDiagnosticAids", true)
    }

    /// Blank billing date means `today`.
    pub fn from_form(values: &FormValues, today: NaiveDate) -> Result<Self, FieldErrors> {
        let errors = Self::schema().validate(values, FormMode::Create);
        if !errors.is_empty() {
            return Err(errors);
        }
        let date = parse_date(values.text("billingDate")).unwrap_or(today);
        Ok(Self {
            patient_cedula: normalize_cedula(values.text("patientCedula")).unwrap_or_default(),
            billing_date: date.format("%Y-%m-%d").to_string(),
            notes: values.text("notes").trim().to_string(),
            include_medical_records: values.flag("includeMedicalRecords"),
            include_medications: values.flag("includeMedications"),
            include_procedures: values.flag("includeProcedures"),
            include_diagnostic_aids: values.flag("includeDiagnosticAids"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(status: InvoiceStatus, amount: f64) -> Invoice {
        Invoice {
            invoice_number: Some("F-1".into()),
            status: Some(status),
            total_amount: amount,
            ..Invoice::default()
        }
    }

    #[test]
    fn pending_total_only_counts_pending() {
        let list = vec![
            invoice(InvoiceStatus::Pending, 100.0),
            invoice(InvoiceStatus::Paid, 50.0),
            invoice(InvoiceStatus::Pending, 25.5),
        ];
        assert_eq!(pending_total(&list), 125.5);
    }

    #[test]
    fn calculation_accepts_both_field_sets() {
        let c: BillingCalculation = serde_json::from_str(
            r#"{"patientCedula":"1","subtotal":200,"copayment":50000,"insuranceCoverage":150,"total":50,"hasExceededAnnualLimit":false}"#,
        )
        .unwrap();
        assert_eq!(c.amount_due(), 50.0);
        let c: BillingCalculation = serde_json::from_str(
            r#"{"totalCost":"300.00","copaymentAmount":"50000","insuranceCoverageAmount":"0","copaymentLimitExceeded":true}"#,
        )
        .unwrap();
        assert_eq!(c.subtotal, 300.0);
        assert_eq!(c.amount_due(), 50000.0);
        assert!(c.has_exceeded_annual_limit);
    }

    #[test]
    fn invoice_request_defaults_date_and_normalizes_cedula() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        let values = InvoiceRequest::blank_form(today)
            .with_text("patientCedula", "1.234.567-8")
            .with_text("billingDate", "");
        let req = InvoiceRequest::from_form(&values, today).unwrap();
        assert_eq!(req.patient_cedula, "12345678");
        assert_eq!(req.billing_date, "2025-05-06");
        assert!(req.include_procedures);
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["includeDiagnosticAids"], true);
    }

    #[test]
    fn invoice_request_rejects_bad_cedula() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        let values = InvoiceRequest::blank_form(today).with_text("patientCedula", "12");
        let errors = InvoiceRequest::from_form(&values, today).unwrap_err();
        assert!(errors.contains_key("patientCedula"));
    }
}
