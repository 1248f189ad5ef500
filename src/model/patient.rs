use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{Editable, KeyKind, Resource, RoleNaming, de, form_date, wire_date, yes_no};
use crate::validation::{
    FieldKind, FieldSpec, FormMode, FormSchema, FormValues, Rule, normalize_cedula, normalize_phone,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "MASCULINO", alias = "MALE")]
    Male,
    #[serde(rename = "FEMENINO", alias = "FEMALE")]
    Female,
    #[serde(rename = "OTRO", alias = "OTHER")]
    Other,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            Gender::Male => "MASCULINO",
            Gender::Female => "FEMENINO",
            Gender::Other => "OTRO",
        }
    }
}

pub const GENDER_CHOICES: &[(&str, &str)] = &[
    ("MASCULINO", "Male"),
    ("FEMENINO", "Female"),
    ("OTRO", "Other"),
];

pub const RELATIONSHIP_CHOICES: &[(&str, &str)] = &[
    ("PADRE", "Father"),
    ("MADRE", "Mother"),
    ("HIJO", "Son"),
    ("HIJA", "Daughter"),
    ("HERMANO", "Brother"),
    ("HERMANA", "Sister"),
    ("ESPOSO", "Husband"),
    ("ESPOSA", "Wife"),
    ("PAREJA", "Partner"),
    ("AMIGO", "Friend"),
    ("AMIGA", "Friend (f)"),
    ("TIO", "Uncle"),
    ("TIA", "Aunt"),
    ("ABUELO", "Grandfather"),
    ("ABUELA", "Grandmother"),
    ("OTRO", "Other"),
];

pub const POLICY_STATUS_CHOICES: &[(&str, &str)] = &[
    ("ACTIVA", "Active"),
    ("INACTIVA", "Inactive"),
    ("VENCIDA", "Expired"),
    ("CANCELADA", "Cancelled"),
];

fn choice_label(choices: &[(&'static str, &'static str)], value: &str) -> String {
    choices
        .iter()
        .find(|(v, _)| v.eq_ignore_ascii_case(value))
        .map(|(_, l)| l.to_string())
        .unwrap_or_else(|| value.to_string())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    #[serde(default, deserialize_with = "de::nullable_string", alias = "fullName")]
    pub name: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub relationship: String,
    #[serde(default, deserialize_with = "de::nullable_string", alias = "phone")]
    pub phone_number: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsurancePolicy {
    #[serde(default, deserialize_with = "de::nullable_string", alias = "insuranceCompany")]
    pub company_name: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub policy_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, alias = "isActive")]
    pub active: bool,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub expiration_date: String,
}

impl InsurancePolicy {
    pub fn is_active(&self) -> bool {
        self.active
            || self
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("ACTIVA") || s.eq_ignore_ascii_case("ACTIVE"))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default, deserialize_with = "de::string_or_number", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub cedula: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub username: String,
    #[serde(default, deserialize_with = "de::nullable_string", alias = "name")]
    pub full_name: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub birth_date: String,
    #[serde(default, deserialize_with = "de::lenient_enum")]
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub address: String,
    #[serde(default, deserialize_with = "de::nullable_string", alias = "phone")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub insurance_policy: Option<InsurancePolicy>,
}

impl Patient {
    pub fn gender_label(&self) -> &'static str {
        self.gender.map(Gender::label).unwrap_or("-")
    }

    pub fn has_active_insurance(&self) -> bool {
        self.insurance_policy.as_ref().is_some_and(InsurancePolicy::is_active)
    }
}

impl Resource for Patient {
    const PATH: &'static str = "/patients";
    const NOUN: &'static str = "patient";
    const KEY: KeyKind = KeyKind::Cedula;

    fn key(&self) -> String {
        self.cedula.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.full_name.as_str(), self.cedula.as_str(), self.email.as_str()]
    }

    fn columns() -> &'static [&'static str] {
        &["Cedula", "Full name", "Gender", "Phone", "E-mail", "Insurance"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.cedula.clone(),
            self.full_name.clone(),
            self.gender_label().to_string(),
            self.phone_number.clone(),
            self.email.clone(),
            self.insurance_policy
                .as_ref()
                .map(|p| p.company_name.clone())
                .unwrap_or_else(|| "-".to_string()),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        let mut lines = vec![
            ("Cedula", self.cedula.clone()),
            ("Username", self.username.clone()),
            ("Full name", self.full_name.clone()),
            ("Birth date", self.birth_date.clone()),
            ("Age", self.age.map(|a| a.to_string()).unwrap_or_default()),
            ("Gender", self.gender_label().to_string()),
            ("Address", self.address.clone()),
            ("Phone", self.phone_number.clone()),
            ("E-mail", self.email.clone()),
        ];
        match &self.emergency_contact {
            Some(c) => {
                lines.push(("Emergency contact", c.name.clone()));
                lines.push(("Relationship", choice_label(RELATIONSHIP_CHOICES, &c.relationship)));
                lines.push(("Contact phone", c.phone_number.clone()));
            }
            None => lines.push(("Emergency contact", "-".to_string())),
        }
        match &self.insurance_policy {
            Some(p) => {
                lines.push(("Insurance", p.company_name.clone()));
                lines.push(("Policy number", p.policy_number.clone()));
                lines.push(("Policy active", yes_no(p.is_active())));
                lines.push(("Policy expires", p.expiration_date.clone()));
            }
            None => lines.push(("Insurance", "-".to_string())),
        }
        lines
    }
}

impl Editable for Patient {
    fn schema() -> FormSchema {
        FormSchema::new(vec![
            FieldSpec::new("cedula", "National ID", FieldKind::Text)
                .required()
                .rule(Rule::Cedula)
                .external_key(),
            FieldSpec::new("username", "Username", FieldKind::Text)
                .required()
                .rule(Rule::MinLen(3))
                .rule(Rule::MaxLen(15))
                .rule(Rule::Alphanumeric)
                .external_key(),
            FieldSpec::new("password", "Password", FieldKind::Secret)
                .required()
                .rule(Rule::StrongPassword)
                .optional_on_edit(),
            FieldSpec::new("confirmPassword", "Confirm password", FieldKind::Secret)
                .required()
                .rule(Rule::Matches("password"))
                .optional_on_edit(),
            FieldSpec::new("fullName", "Full name", FieldKind::Text)
                .required()
                .rule(Rule::MaxLen(100)),
            FieldSpec::new("birthDate", "Birth date", FieldKind::Date)
                .required()
                .rule(Rule::Date),
            FieldSpec::new("gender", "Gender", FieldKind::Choice(GENDER_CHOICES)).required(),
            FieldSpec::new("address", "Address", FieldKind::Text)
                .required()
                .rule(Rule::MaxLen(30)),
            FieldSpec::new("phoneNumber", "Phone", FieldKind::Text)
                .required()
                .rule(Rule::Phone),
            FieldSpec::new("email", "E-mail", FieldKind::Text)
                .required()
                .rule(Rule::Email),
            FieldSpec::new("emergencyName", "Contact name", FieldKind::Text)
                .required()
                .rule(Rule::MaxLen(100))
                .in_group("emergencyContact"),
            FieldSpec::new(
                "emergencyRelationship",
                "Relationship",
                FieldKind::Choice(RELATIONSHIP_CHOICES),
            )
            .required()
            .in_group("emergencyContact"),
            FieldSpec::new("emergencyPhone", "Contact phone", FieldKind::Text)
                .required()
                .rule(Rule::Phone)
                .in_group("emergencyContact"),
            FieldSpec::new("insuranceCompany", "Insurance company", FieldKind::Text)
                .required()
                .in_group("insurancePolicy"),
            FieldSpec::new("insurancePolicyNumber", "Policy number", FieldKind::Text)
                .required()
                .in_group("insurancePolicy"),
            FieldSpec::new(
                "insuranceStatus",
                "Policy status",
                FieldKind::Choice(POLICY_STATUS_CHOICES),
            )
            .required()
            .in_group("insurancePolicy"),
            FieldSpec::new("insuranceExpiration", "Policy expires", FieldKind::Date)
                .required()
                .rule(Rule::Date)
                .in_group("insurancePolicy"),
        ])
    }

    fn to_form(&self) -> FormValues {
        let mut values = FormValues::blank(&Self::schema())
            .with_text("cedula", &self.cedula)
            .with_text("username", &self.username)
            .with_text("fullName", &self.full_name)
            .with_text("birthDate", form_date(&self.birth_date))
            .with_text("gender", self.gender.map(Gender::wire_name).unwrap_or(""))
            .with_text("address", &self.address)
            .with_text("phoneNumber", &self.phone_number)
            .with_text("email", &self.email);
        if let Some(c) = &self.emergency_contact {
            values.set_text("emergencyName", &c.name);
            values.set_text("emergencyRelationship", c.relationship.to_ascii_uppercase());
            values.set_text("emergencyPhone", &c.phone_number);
        }
        if let Some(p) = &self.insurance_policy {
            values.set_text("insuranceCompany", &p.company_name);
            values.set_text("insurancePolicyNumber", &p.policy_number);
            let status = match p.status.as_deref() {
                Some(s) if !s.is_empty() => s.to_ascii_uppercase(),
                _ if p.active => "ACTIVA".to_string(),
                _ => "INACTIVA".to_string(),
            };
            values.set_text("insuranceStatus", status);
            values.set_text("insuranceExpiration", form_date(&p.expiration_date));
        }
        values
    }

    fn payload(values: &FormValues, mode: FormMode, _naming: RoleNaming) -> Value {
        let schema = Self::schema();
        let text = |k: &str| values.text(k).trim().to_string();
        let mut body = Map::new();
        body.insert(
            "cedula".into(),
            json!(normalize_cedula(values.text("cedula")).unwrap_or_else(|| text("cedula"))),
        );
        if mode == FormMode::Create {
            body.insert("username".into(), json!(text("username")));
        }
        if mode == FormMode::Create || !values.text("password").is_empty() {
            body.insert("password".into(), json!(values.text("password")));
        }
        body.insert("fullName".into(), json!(text("fullName")));
        body.insert("birthDate".into(), json!(wire_date(values.text("birthDate"))));
        body.insert("gender".into(), json!(text("gender")));
        body.insert("address".into(), json!(text("address")));
        body.insert(
            "phoneNumber".into(),
            json!(normalize_phone(values.text("phoneNumber")).unwrap_or_else(|| text("phoneNumber"))),
        );
        body.insert("email".into(), json!(text("email")));
        if schema.group_filled("emergencyContact", values) {
            body.insert(
                "emergencyContact".into(),
                json!({
                    "name": text("emergencyName"),
                    "relationship": text("emergencyRelationship"),
                    "phoneNumber": normalize_phone(values.text("emergencyPhone"))
                        .unwrap_or_else(|| text("emergencyPhone")),
                }),
            );
        }
        if schema.group_filled("insurancePolicy", values) {
            let status = text("insuranceStatus");
            body.insert(
                "insurancePolicy".into(),
                json!({
                    "companyName": text("insuranceCompany"),
                    "policyNumber": text("insurancePolicyNumber"),
                    "active": status == "ACTIVA",
                    "status": status,
                    "expirationDate": wire_date(values.text("insuranceExpiration")),
                }),
            );
        }
        Value::Object(body)
    }
}
