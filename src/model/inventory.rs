use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{Editable, KeyKind, Resource, RoleNaming, de, form_date, yes_no};
use crate::error::FieldErrors;
use crate::validation::{FieldKind, FieldSpec, FormMode, FormSchema, FormValues, Rule, parse_date};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryType {
    #[serde(alias = "MEDICATION")]
    Medicamento,
    #[serde(alias = "PROCEDURE")]
    Procedimiento,
    #[serde(alias = "DIAGNOSTIC_AID")]
    AyudaDiagnostica,
    #[serde(alias = "SUPPLY")]
    Suministro,
    #[serde(alias = "EQUIPMENT")]
    Equipo,
    Material,
}

pub const INVENTORY_TYPE_CHOICES: &[(&str, &str)] = &[
    ("MEDICAMENTO", "Medication"),
    ("PROCEDIMIENTO", "Procedure"),
    ("AYUDA_DIAGNOSTICA", "Diagnostic aid"),
    ("SUMINISTRO", "Medical supply"),
    ("EQUIPO", "Medical equipment"),
    ("MATERIAL", "Material"),
];

impl InventoryType {
    pub fn wire_name(self) -> &'static str {
        match self {
            InventoryType::Medicamento => "MEDICAMENTO",
            InventoryType::Procedimiento => "PROCEDIMIENTO",
            InventoryType::AyudaDiagnostica => "AYUDA_DIAGNOSTICA",
            InventoryType::Suministro => "SUMINISTRO",
            InventoryType::Equipo => "EQUIPO",
            InventoryType::Material => "MATERIAL",
        }
    }

    pub fn label(self) -> &'static str {
        INVENTORY_TYPE_CHOICES
            .iter()
            .find(|(v, _)| *v == self.wire_name())
            .map(|(_, l)| *l)
            .unwrap_or("-")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockStatus {
    OutOfStock,
    Low,
    Available,
}

impl StockStatus {
    pub fn label(self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "Out of stock",
            StockStatus::Low => "Low stock",
            StockStatus::Available => "Available",
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(default, deserialize_with = "de::string_or_number", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "de::lenient_enum")]
    pub item_type: Option<InventoryType>,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub description: String,
    #[serde(default, deserialize_with = "de::count", alias = "currentStock")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "de::count")]
    pub minimum_stock: u32,
    #[serde(default, deserialize_with = "de::amount", alias = "cost")]
    pub unit_cost: f64,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub supplier: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub location: String,
    #[serde(default, deserialize_with = "de::nullable_string")]
    pub expiration_date: String,
    #[serde(default, alias = "controlledSubstance")]
    pub is_controlled_substance: bool,
    #[serde(default = "default_true", alias = "active")]
    pub is_active: bool,
}

impl InventoryItem {
    pub fn stock_status(&self) -> StockStatus {
        if self.quantity == 0 {
            StockStatus::OutOfStock
        } else if self.quantity <= self.minimum_stock {
            StockStatus::Low
        } else {
            StockStatus::Available
        }
    }

    /// At or below the minimum, including out of stock.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.minimum_stock
    }

    pub fn type_label(&self) -> &'static str {
        self.item_type.map(InventoryType::label).unwrap_or("-")
    }

    /// Full-object update body for a stock adjustment.
    pub fn adjusted(&self, adjustment: &StockAdjustment, at: DateTime<Utc>) -> Value {
        let mut body = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        body.insert("quantity".into(), json!(adjustment.apply(self.quantity)));
        body.insert("lastAdjustmentReason".into(), json!(adjustment.reason));
        body.insert(
            "lastAdjustmentDate".into(),
            json!(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        Value::Object(body)
    }
}

impl Resource for InventoryItem {
    const PATH: &'static str = "/inventory";
    const NOUN: &'static str = "inventory item";
    const KEY: KeyKind = KeyKind::Id;

    fn key(&self) -> String {
        self.id.clone().unwrap_or_default()
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.description.as_str()]
    }

    fn columns() -> &'static [&'static str] {
        &["Name", "Type", "Quantity", "Minimum", "Unit cost", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.type_label().to_string(),
            self.quantity.to_string(),
            self.minimum_stock.to_string(),
            format!("${:.2}", self.unit_cost),
            self.stock_status().label().to_string(),
        ]
    }

    fn facet(&self) -> Option<&'static str> {
        self.item_type.map(InventoryType::wire_name)
    }

    fn facets() -> &'static [(&'static str, &'static str)] {
        INVENTORY_TYPE_CHOICES
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Id", self.key()),
            ("Name", self.name.clone()),
            ("Type", self.type_label().to_string()),
            ("Description", self.description.clone()),
            ("Quantity", self.quantity.to_string()),
            ("Minimum stock", self.minimum_stock.to_string()),
            ("Unit cost", format!("${:.2}", self.unit_cost)),
            ("Supplier", self.supplier.clone()),
            ("Location", self.location.clone()),
            ("Expires", self.expiration_date.clone()),
            ("Controlled", yes_no(self.is_controlled_substance)),
            ("Active", yes_no(self.is_active)),
            ("Stock status", self.stock_status().label().to_string()),
        ]
    }
}

impl Editable for InventoryItem {
    fn schema() -> FormSchema {
        FormSchema::new(vec![
            FieldSpec::new("name", "Name", FieldKind::Text)
                .required()
                .rule(Rule::MaxLen(100)),
            FieldSpec::new("type", "Type", FieldKind::Choice(INVENTORY_TYPE_CHOICES)).required(),
            FieldSpec::new("description", "Description", FieldKind::Text).rule(Rule::MaxLen(200)),
            FieldSpec::new("quantity", "Quantity", FieldKind::Number)
                .required()
                .rule(Rule::NonNegativeInt),
            FieldSpec::new("minimumStock", "Minimum stock", FieldKind::Number)
                .required()
                .rule(Rule::NonNegativeInt),
            FieldSpec::new("unitCost", "Unit cost", FieldKind::Number)
                .required()
                .rule(Rule::NonNegativeNumber),
            FieldSpec::new("expirationDate", "Expiration date", FieldKind::Date).rule(Rule::Date),
            FieldSpec::new("supplier", "Supplier", FieldKind::Text).rule(Rule::MaxLen(100)),
            FieldSpec::new("location", "Location", FieldKind::Text).rule(Rule::MaxLen(50)),
            FieldSpec::new("isControlledSubstance", "Controlled substance", FieldKind::Flag),
            FieldSpec::new("isActive", "Active", FieldKind::Flag),
        ])
    }

    fn to_form(&self) -> FormValues {
        FormValues::blank(&Self::schema())
            .with_text("name", &self.name)
            .with_text("type", self.facet().unwrap_or(""))
            .with_text("description", &self.description)
            .with_text("quantity", self.quantity.to_string())
            .with_text("minimumStock", self.minimum_stock.to_string())
            .with_text("unitCost", format!("{}", self.unit_cost))
            .with_text("expirationDate", form_date(&self.expiration_date))
            .with_text("supplier", &self.supplier)
            .with_text("location", &self.location)
            .with_flag("isControlledSubstance", self.is_controlled_substance)
            .with_flag("isActive", self.is_active)
    }

    fn payload(values: &FormValues, _mode: FormMode, _naming: RoleNaming) -> Value {
        let text = |k: &str| values.text(k).trim().to_string();
        let expiration = parse_date(values.text("expirationDate"))
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null);
        json!({
            "name": text("name"),
            "type": text("type"),
            "description": text("description"),
            "quantity": text("quantity").parse::<u32>().unwrap_or(0),
            "minimumStock": text("minimumStock").parse::<u32>().unwrap_or(0),
            "unitCost": text("unitCost").parse::<f64>().unwrap_or(0.0),
            "supplier": text("supplier"),
            "location": text("location"),
            "expirationDate": expiration,
            "isControlledSubstance": values.flag("isControlledSubstance"),
            "isActive": values.flag("isActive"),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockOperation {
    Add,
    /// Floored at zero.
    Subtract,
    Set,
}

pub const STOCK_OPERATION_CHOICES: &[(&str, &str)] = &[
    ("add", "Add stock"),
    ("subtract", "Subtract stock"),
    ("set", "Set exact quantity"),
];

impl StockOperation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(Self::Add),
            "subtract" => Some(Self::Subtract),
            "set" => Some(Self::Set),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockAdjustment {
    pub operation: StockOperation,
    pub amount: u32,
    pub reason: String,
}

impl StockAdjustment {
    pub fn schema() -> FormSchema {
        FormSchema::new(vec![
            FieldSpec::new("operation", "Adjustment", FieldKind::Choice(STOCK_OPERATION_CHOICES))
                .required(),
            FieldSpec::new("amount", "Quantity", FieldKind::Number)
                .required()
                .rule(Rule::PositiveInt),
            FieldSpec::new("reason", "Reason", FieldKind::Text)
                .required()
                .rule(Rule::MaxLen(200)),
        ])
    }

    pub fn blank_form() -> FormValues {
        FormValues::blank(&Self::schema())
            .with_text("operation", "add")
            .with_text("amount", "1")
    }

    pub fn from_form(values: &FormValues) -> Result<Self, FieldErrors> {
        let errors = Self::schema().validate(values, FormMode::Create);
        if !errors.is_empty() {
            return Err(errors);
        }
        let Some(operation) = StockOperation::parse(values.text("operation")) else {
            return Err(FieldErrors::from([(
                "operation".to_string(),
                "Invalid adjustment type".to_string(),
            )]));
        };
        Ok(Self {
            operation,
            amount: values.text("amount").trim().parse::<u32>().unwrap_or(0),
            reason: values.text("reason").trim().to_string(),
        })
    }

    pub fn apply(&self, current: u32) -> u32 {
        match self.operation {
            StockOperation::Add => current.saturating_add(self.amount),
            StockOperation::Subtract => current.saturating_sub(self.amount),
            StockOperation::Set => self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(quantity: u32, minimum: u32) -> InventoryItem {
        InventoryItem {
            id: Some("i1".into()),
            name: "Gauze".into(),
            quantity,
            minimum_stock: minimum,
            ..InventoryItem::default()
        }
    }

    #[test]
    fn stock_status_thresholds() {
        assert_eq!(item(0, 5).stock_status(), StockStatus::OutOfStock);
        assert_eq!(item(5, 5).stock_status(), StockStatus::Low);
        assert_eq!(item(6, 5).stock_status(), StockStatus::Available);
        assert!(item(0, 0).is_low_stock());
    }

    #[test]
    fn decodes_alternate_field_names() {
        let i: InventoryItem = serde_json::from_str(
            r#"{"id": 4, "name": "Ibuprofen", "type": "MEDICATION", "currentStock": 12, "minimumStock": 3, "cost": "1500.50"}"#,
        )
        .unwrap();
        assert_eq!(i.key(), "4");
        assert_eq!(i.item_type, Some(InventoryType::Medicamento));
        assert_eq!(i.quantity, 12);
        assert_eq!(i.unit_cost, 1500.5);
        assert!(i.is_active);
    }

    #[test]
    fn subtract_is_floored_at_zero() {
        let adj = StockAdjustment {
            operation: StockOperation::Subtract,
            amount: 10,
            reason: "expired".into(),
        };
        assert_eq!(adj.apply(4), 0);
        let adj = StockAdjustment { operation: StockOperation::Add, ..adj };
        assert_eq!(adj.apply(4), 14);
        let adj = StockAdjustment { operation: StockOperation::Set, ..adj };
        assert_eq!(adj.apply(4), 10);
    }

    #[test]
    fn adjustment_requires_reason_and_positive_amount() {
        let values = StockAdjustment::blank_form().with_text("amount", "0");
        let errors = StockAdjustment::from_form(&values).unwrap_err();
        assert!(errors.contains_key("amount"));
        assert!(errors.contains_key("reason"));

        let values = StockAdjustment::blank_form()
            .with_text("operation", "subtract")
            .with_text("amount", "3")
            .with_text("reason", "broken");
        let adj = StockAdjustment::from_form(&values).unwrap();
        assert_eq!(adj.operation, StockOperation::Subtract);
        assert_eq!(adj.amount, 3);
    }

    #[test]
    fn adjusted_body_carries_full_item() {
        let adj = StockAdjustment {
            operation: StockOperation::Add,
            amount: 2,
            reason: "restock".into(),
        };
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let body = item(3, 1).adjusted(&adj, at);
        assert_eq!(body["name"], "Gauze");
        assert_eq!(body["quantity"], 5);
        assert_eq!(body["lastAdjustmentReason"], "restock");
        assert_eq!(body["lastAdjustmentDate"], "2025-01-02T03:04:05.000Z");
    }

    #[test]
    fn form_round_trip_keeps_flags() {
        let mut i = item(3, 1);
        i.item_type = Some(InventoryType::Equipo);
        i.is_controlled_substance = true;
        let values = i.to_form();
        assert!(InventoryItem::schema().validate(&values, FormMode::Edit).is_empty());
        let body = InventoryItem::payload(&values, FormMode::Edit, RoleNaming::English);
        assert_eq!(body["type"], "EQUIPO");
        assert_eq!(body["isControlledSubstance"], true);
        assert_eq!(body["expirationDate"], Value::Null);
    }
}
