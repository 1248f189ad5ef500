//! Declarative form validation shared by every entity form.
//!
//! A [`FormSchema`] lists the fields of a form, each with a [`FieldKind`]
//! (how it is edited) and a list of [`Rule`]s. [`FormSchema::validate`]
//! walks the schema against a set of [`FormValues`] and returns the first
//! failing message per field. Evaluation is pure: no I/O, no clock.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::FieldErrors;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("alnum regex"));
static CEDULA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8,10}$").expect("cedula regex"));
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{10}$").expect("phone regex"));

/// Characters accepted as the "special" class of a strong password.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Whether a form edits a new entity or an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// How a field is edited and rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Masked input (passwords).
    Secret,
    /// `YYYY-MM-DD` or `DD/MM/YYYY`.
    Date,
    /// `YYYY-MM-DDTHH:MM[:SS]` or `YYYY-MM-DD HH:MM`.
    DateTime,
    Number,
    Flag,
    /// Closed set of `(wire value, label)` pairs; the empty string means unset.
    Choice(&'static [(&'static str, &'static str)]),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    Required,
    MinLen(usize),
    MaxLen(usize),
    /// National identity number: 8-10 digits, separators ` .-` ignored.
    Cedula,
    /// Exactly 10 digits, separators ` -().+` ignored.
    Phone,
    Email,
    Alphanumeric,
    /// >= 8 chars with upper, lower, digit and one of [`PASSWORD_SPECIALS`].
    StrongPassword,
    /// Value must equal the named field's value.
    Matches(&'static str),
    NonNegativeInt,
    PositiveInt,
    NonNegativeNumber,
    Date,
    DateTime,
}

#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rules: Vec<Rule>,
    /// Nested value-object group; a group is validated only when one of its
    /// fields has content, and then as a whole.
    pub group: Option<&'static str>,
    /// External key: editable on create, read-only on edit.
    pub key: bool,
    /// Cleared on edit and only validated when filled in.
    pub optional_on_edit: bool,
}

impl FieldSpec {
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            rules: Vec::new(),
            group: None,
            key: false,
            optional_on_edit: false,
        }
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn required(self) -> Self {
        self.rule(Rule::Required)
    }

    pub fn in_group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }

    pub fn external_key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn optional_on_edit(mut self) -> Self {
        self.optional_on_edit = true;
        self
    }

    pub fn is_read_only(&self, mode: FormMode) -> bool {
        self.key && mode == FormMode::Edit
    }
}

/// Current value of a single form field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

/// The editable state of a form, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormValues {
    values: BTreeMap<&'static str, FieldValue>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank defaults for every field of `schema`: empty text, unchecked flags.
    pub fn blank(schema: &FormSchema) -> Self {
        let mut values = Self::new();
        for f in &schema.fields {
            match f.kind {
                FieldKind::Flag => values.set_flag(f.name, false),
                _ => values.set_text(f.name, ""),
            }
        }
        values
    }

    pub fn with_text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.set_text(name, value);
        self
    }

    pub fn with_flag(mut self, name: &'static str, value: bool) -> Self {
        self.set_flag(name, value);
        self
    }

    pub fn set_text(&mut self, name: &'static str, value: impl Into<String>) {
        self.values.insert(name, FieldValue::Text(value.into()));
    }

    pub fn set_flag(&mut self, name: &'static str, value: bool) {
        self.values.insert(name, FieldValue::Flag(value));
    }

    /// Text content of a field; flags and missing fields read as "".
    pub fn text(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(FieldValue::Text(s)) => s.as_str(),
            _ => "",
        }
    }

    /// Trimmed text, `None` when blank.
    pub fn opt_text(&self, name: &str) -> Option<String> {
        let t = self.text(name).trim();
        if t.is_empty() { None } else { Some(t.to_string()) }
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(FieldValue::Flag(true)))
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FormSchema {
    pub fields: Vec<FieldSpec>,
}

impl FormSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// True when any text field of `group` has content.
    pub fn group_filled(&self, group: &str, values: &FormValues) -> bool {
        self.fields
            .iter()
            .filter(|f| f.group == Some(group))
            .any(|f| !values.text(f.name).trim().is_empty())
    }

    /// Validate `values` and return field -> message for every failing field.
    pub fn validate(&self, values: &FormValues, mode: FormMode) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for field in &self.fields {
            // keys of an existing entity are shown but not editable
            if field.is_read_only(mode) {
                continue;
            }
            if let Some(group) = field.group {
                if !self.group_filled(group, values) {
                    continue;
                }
            }
            let value = values.text(field.name);
            let blank = value.trim().is_empty();
            let relaxed = field.optional_on_edit && mode == FormMode::Edit && blank;
            for rule in &field.rules {
                if relaxed && !matches!(rule, Rule::Matches(_)) {
                    continue;
                }
                if let Some(msg) = check_rule(field, rule, value, values) {
                    errors.insert(field.name.to_string(), msg);
                    break;
                }
            }
        }
        errors
    }
}

fn check_rule(field: &FieldSpec, rule: &Rule, value: &str, all: &FormValues) -> Option<String> {
    let v = value.trim();
    // Format rules leave blank values to `Required`.
    let skip_blank = !matches!(rule, Rule::Required | Rule::Matches(_));
    if skip_blank && v.is_empty() {
        return None;
    }
    let ok = match rule {
        Rule::Required => match field.kind {
            FieldKind::Flag => true,
            _ => !v.is_empty(),
        },
        Rule::MinLen(n) => v.chars().count() >= *n,
        Rule::MaxLen(n) => v.chars().count() <= *n,
        Rule::Cedula => is_valid_cedula(v),
        Rule::Phone => is_valid_phone(v),
        Rule::Email => EMAIL_RE.is_match(v),
        Rule::Alphanumeric => ALNUM_RE.is_match(v),
        Rule::StrongPassword => is_strong_password(value),
        Rule::Matches(other) => value == all.text(other),
        Rule::NonNegativeInt => v.parse::<u32>().is_ok(),
        Rule::PositiveInt => v.parse::<u32>().is_ok_and(|n| n > 0),
        Rule::NonNegativeNumber => v.parse::<f64>().map(|n| n.is_finite() && n >= 0.0).unwrap_or(false),
        Rule::Date => parse_date(v).is_some(),
        Rule::DateTime => parse_date_time(v).is_some(),
    };
    if ok { None } else { Some(rule_message(field, rule)) }
}

fn rule_message(field: &FieldSpec, rule: &Rule) -> String {
    match rule {
        Rule::Required => format!("{} is required", field.label),
        Rule::MinLen(n) => format!("{} must be at least {n} characters", field.label),
        Rule::MaxLen(n) => format!("{} must not exceed {n} characters", field.label),
        Rule::Cedula => "Invalid national ID (8-10 digits)".to_string(),
        Rule::Phone => "Phone must have 10 digits".to_string(),
        Rule::Email => "Invalid e-mail address".to_string(),
        Rule::Alphanumeric => format!("{} must contain only letters and numbers", field.label),
        Rule::StrongPassword => format!(
            "Password must be at least 8 characters and include upper case, lower case, a digit and one of {PASSWORD_SPECIALS}"
        ),
        Rule::Matches(_) => "Passwords do not match".to_string(),
        Rule::NonNegativeInt => format!("{} must be a whole number >= 0", field.label),
        Rule::PositiveInt => format!("{} must be a whole number > 0", field.label),
        Rule::NonNegativeNumber => format!("{} must be a number >= 0", field.label),
        Rule::Date => format!("{} must be a date (YYYY-MM-DD)", field.label),
        Rule::DateTime => format!("{} must be a date and time (YYYY-MM-DD HH:MM)", field.label),
    }
}

fn digits_with_separators(s: &str, separators: &str) -> Option<String> {
    if s.chars().all(|c| c.is_ascii_digit() || separators.contains(c)) {
        Some(s.chars().filter(|c| c.is_ascii_digit()).collect())
    } else {
        None
    }
}

/// Digits of a national ID with separators removed, if the input is well-formed.
pub fn normalize_cedula(s: &str) -> Option<String> {
    digits_with_separators(s.trim(), " .-").filter(|d| CEDULA_RE.is_match(d))
}

pub fn is_valid_cedula(s: &str) -> bool {
    normalize_cedula(s).is_some()
}

pub fn normalize_phone(s: &str) -> Option<String> {
    digits_with_separators(s.trim(), " -().+").filter(|d| PHONE_RE.is_match(d))
}

pub fn is_valid_phone(s: &str) -> bool {
    normalize_phone(s).is_some()
}

pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s.trim())
}

pub fn is_strong_password(s: &str) -> bool {
    s.chars().count() >= 8
        && s.chars().any(|c| c.is_ascii_lowercase())
        && s.chars().any(|c| c.is_ascii_uppercase())
        && s.chars().any(|c| c.is_ascii_digit())
        && s.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

/// Accepts `YYYY-MM-DD` and `DD/MM/YYYY`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
}

pub fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
