use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{Editable, KeyKind, Resource, de, form_date, wire_date, yes_no};
use crate::validation::{FieldKind, FieldSpec, FormMode, FormSchema, FormValues, Rule, normalize_cedula, normalize_phone};

/// Staff roles. Both the English and the Spanish backend spellings are
/// accepted on input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[serde(alias = "RECURSOS_HUMANOS")]
    HumanResources,
    #[serde(alias = "PERSONAL_ADMINISTRATIVO")]
    AdministrativeStaff,
    #[serde(alias = "MEDICO")]
    Doctor,
    #[serde(alias = "ENFERMERA")]
    Nurse,
    #[serde(alias = "SOPORTE_INFORMACION", alias = "SUPPORT_STAFF")]
    InformationSupport,
}

/// Spelling used for role names in outgoing payloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoleNaming {
    #[default]
    English,
    Spanish,
}

impl RoleNaming {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Some(Self::English),
            "spanish" | "es" => Some(Self::Spanish),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Spanish => "spanish",
        }
    }
}

pub const ROLE_CHOICES: &[(&str, &str)] = &[
    ("HUMAN_RESOURCES", "Human resources"),
    ("ADMINISTRATIVE_STAFF", "Administrative staff"),
    ("DOCTOR", "Doctor"),
    ("NURSE", "Nurse"),
    ("INFORMATION_SUPPORT", "Information support"),
];

impl Role {
    pub const ALL: [Role; 5] = [
        Role::HumanResources,
        Role::AdministrativeStaff,
        Role::Doctor,
        Role::Nurse,
        Role::InformationSupport,
    ];

    /// Parse either spelling, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(Value::String(s.trim().to_ascii_uppercase())).ok()
    }

    pub fn wire_name(self, naming: RoleNaming) -> &'static str {
        match (self, naming) {
            (Role::HumanResources, RoleNaming::English) => "HUMAN_RESOURCES",
            (Role::AdministrativeStaff, RoleNaming::English) => "ADMINISTRATIVE_STAFF",
            (Role::Doctor, RoleNaming::English) => "DOCTOR",
            (Role::Nurse, RoleNaming::English) => "NURSE",
            (Role::InformationSupport, RoleNaming::English) => "INFORMATION_SUPPORT",
            (Role::HumanResources, RoleNaming::Spanish) => "RECURSOS_HUMANOS",
            (Role::AdministrativeStaff, RoleNaming::Spanish) => "PERSONAL_ADMINISTRATIVO",
            (Role::Doctor, RoleNaming::Spanish) => "MEDICO",
            (Role::Nurse, RoleNaming::Spanish) => "ENFERMERA",
            (Role::InformationSupport, RoleNaming::Spanish) => "SOPORTE_INFORMACION",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::HumanResources => "Human resources",
            Role::AdministrativeStaff => "Administrative staff",
            Role::Doctor => "Doctor",
            Role::Nurse => "Nurse",
            Role::InformationSupport => "Information support",
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
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
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub address: String,
    #[serde(default, deserialize_with = "de::nullable_string", alias = "phone")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub email: String,
    #[serde(default, deserialize_with = "de::lenient_enum")]
    pub role: Option<Role>,
    #[serde(default = "default_true", alias = "isActive")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

impl User {
    pub fn role_label(&self) -> &'static str {
        self.role.map(Role::label).unwrap_or("Unknown")
    }
}

impl Resource for User {
    const PATH: &'static str = "/users";
    const NOUN: &'static str = "user";
    const KEY: KeyKind = KeyKind::Cedula;

    fn key(&self) -> String {
        self.cedula.clone()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.full_name.as_str(),
            self.cedula.as_str(),
            self.username.as_str(),
            self.role_label(),
        ]
    }

    fn columns() -> &'static [&'static str] {
        &["Cedula", "Username", "Full name", "Role", "E-mail", "Active"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.cedula.clone(),
            self.username.clone(),
            self.full_name.clone(),
            self.role_label().to_string(),
            self.email.clone(),
            yes_no(self.active),
        ]
    }

    fn facet(&self) -> Option<&'static str> {
        self.role.map(|r| r.wire_name(RoleNaming::English))
    }

    fn facets() -> &'static [(&'static str, &'static str)] {
        ROLE_CHOICES
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Cedula", self.cedula.clone()),
            ("Username", self.username.clone()),
            ("Full name", self.full_name.clone()),
            ("Birth date", self.birth_date.clone()),
            ("Age", self.age.map(|a| a.to_string()).unwrap_or_default()),
            ("Address", self.address.clone()),
            ("Phone", self.phone_number.clone()),
            ("E-mail", self.email.clone()),
            ("Role", self.role_label().to_string()),
            ("Active", yes_no(self.active)),
        ]
    }
}

impl Editable for User {
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
            FieldSpec::new("address", "Address", FieldKind::Text)
                .required()
                .rule(Rule::MaxLen(30)),
            FieldSpec::new("phoneNumber", "Phone", FieldKind::Text)
                .required()
                .rule(Rule::Phone),
            FieldSpec::new("email", "E-mail", FieldKind::Text)
                .required()
                .rule(Rule::Email),
            FieldSpec::new("role", "Role", FieldKind::Choice(ROLE_CHOICES)).required(),
        ])
    }

    fn to_form(&self) -> FormValues {
        FormValues::blank(&Self::schema())
            .with_text("cedula", &self.cedula)
            .with_text("username", &self.username)
            .with_text("fullName", &self.full_name)
            .with_text("birthDate", form_date(&self.birth_date))
            .with_text("address", &self.address)
            .with_text("phoneNumber", &self.phone_number)
            .with_text("email", &self.email)
            .with_text("role", self.facet().unwrap_or(""))
    }

    fn payload(values: &FormValues, mode: FormMode, naming: RoleNaming) -> Value {
        let text = |k: &str| values.text(k).trim().to_string();
        let role = Role::parse(values.text("role"))
            .map(|r| r.wire_name(naming).to_string())
            .unwrap_or_default();
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
        body.insert("address".into(), json!(text("address")));
        body.insert(
            "phoneNumber".into(),
            json!(normalize_phone(values.text("phoneNumber")).unwrap_or_else(|| text("phoneNumber"))),
        );
        body.insert("email".into(), json!(text("email")));
        body.insert("role".into(), json!(role));
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_role_spellings_decode() {
        let u: User = serde_json::from_str(r#"{"cedula":"1","role":"MEDICO","isActive":false}"#).unwrap();
        assert_eq!(u.role, Some(Role::Doctor));
        assert!(!u.active);
        let u: User = serde_json::from_str(r#"{"cedula":"1","role":"DOCTOR"}"#).unwrap();
        assert_eq!(u.role, Some(Role::Doctor));
        assert!(u.active);
        let u: User = serde_json::from_str(r#"{"cedula":"1","role":"JANITOR"}"#).unwrap();
        assert_eq!(u.role, None);
        assert_eq!(Role::parse("support_staff"), Some(Role::InformationSupport));
    }

    #[test]
    fn payload_uses_configured_role_dialect() {
        let values = FormValues::blank(&User::schema())
            .with_text("cedula", "1.234.567-8")
            .with_text("role", "HUMAN_RESOURCES")
            .with_text("birthDate", "1990-04-01")
            .with_text("phoneNumber", "300 123 4567");
        let body = User::payload(&values, FormMode::Create, RoleNaming::Spanish);
        assert_eq!(body["role"], "RECURSOS_HUMANOS");
        assert_eq!(body["cedula"], "12345678");
        assert_eq!(body["birthDate"], "01/04/1990");
        assert_eq!(body["phoneNumber"], "3001234567");

        let body = User::payload(&values, FormMode::Create, RoleNaming::English);
        assert_eq!(body["role"], "HUMAN_RESOURCES");
    }

    #[test]
    fn edit_payload_omits_blank_password_and_username() {
        let values = FormValues::blank(&User::schema()).with_text("cedula", "12345678");
        let body = User::payload(&values, FormMode::Edit, RoleNaming::English);
        assert!(body.get("password").is_none());
        assert!(body.get("username").is_none());
        assert_eq!(body["cedula"], "12345678");
    }
}
