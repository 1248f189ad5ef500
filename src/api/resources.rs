//! Typed endpoints on top of [`ApiClient`].

use chrono::Utc;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::info;

use super::ApiClient;
use crate::error::ApiError;
use crate::model::de::unwrap_list;
use crate::model::medical::parse_history;
use crate::model::{
    BillingCalculation, InventoryItem, InvoiceRequest, MedicalRecordEntry, NewMedicalRecord, Resource,
    StockAdjustment, User,
};

/// Body of `POST /auth/login`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}

impl ApiClient {
    /// `GET /{resource}`.
    pub async fn list<T: Resource>(&self) -> Result<Vec<T>, ApiError> {
        let value = self.get(T::PATH).await?;
        let items: Vec<T> = match unwrap_list(value) {
            Value::Null => Vec::new(),
            other => decode(other)?,
        };
        info!(noun = T::NOUN, count = items.len(), "list loaded");
        Ok(items)
    }

    /// `GET /{resource}/cedula/{key}` or `/id/{key}`.
    pub async fn find<T: Resource>(&self, key: &str) -> Result<T, ApiError> {
        decode(self.get(&T::find_path(key)).await?)
    }

    /// `POST /{resource}`; returns whatever the backend echoes back.
    pub async fn create<T: Resource>(&self, body: &Value) -> Result<Value, ApiError> {
        let created = self.post(T::PATH, body).await?;
        info!(noun = T::NOUN, "created");
        Ok(created)
    }

    /// `PUT /{resource}/{key}`.
    pub async fn update<T: Resource>(&self, key: &str, body: &Value) -> Result<Value, ApiError> {
        let updated = self.put(&T::update_path(key), Some(body)).await?;
        info!(noun = T::NOUN, key, "updated");
        Ok(updated)
    }

    pub async fn remove<T: Resource>(&self, key: &str) -> Result<(), ApiError> {
        self.delete(&T::delete_path(key)).await?;
        info!(noun = T::NOUN, key, "deleted");
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = json!({ "username": username, "password": password });
        decode(self.post("/auth/login", &body).await?)
    }

    pub async fn health(&self) -> Result<Value, ApiError> {
        self.get("/public/health").await
    }

    pub async fn api_info(&self) -> Result<Value, ApiError> {
        self.get("/public/info").await
    }

    /// `PUT /users/{cedula}/activate` or `/deactivate`.
    pub async fn set_user_active(&self, cedula: &str, active: bool) -> Result<(), ApiError> {
        let action = if active { "activate" } else { "deactivate" };
        self.put(&format!("{}/{cedula}/{action}", User::PATH), None).await?;
        info!(cedula, action, "user status changed");
        Ok(())
    }

    pub async fn cancel_appointment(&self, id: &str) -> Result<(), ApiError> {
        self.put(&format!("/appointments/{id}/cancel"), None).await?;
        info!(id, "appointment cancelled");
        Ok(())
    }

    pub async fn calculate_billing(&self, cedula: &str) -> Result<BillingCalculation, ApiError> {
        decode(self.get(&format!("/billing/calculate/{cedula}")).await?)
    }

    pub async fn generate_invoice(&self, request: &InvoiceRequest) -> Result<Value, ApiError> {
        let body = serde_json::to_value(request)?;
        let invoice = self.post("/billing/generate", &body).await?;
        info!(cedula = %request.patient_cedula, "invoice generated");
        Ok(invoice)
    }

    /// A patient's history, newest first.
    pub async fn medical_records_for(&self, cedula: &str) -> Result<Vec<MedicalRecordEntry>, ApiError> {
        let value = self
            .get(&format!("{}/patient/{cedula}", MedicalRecordEntry::PATH))
            .await?;
        Ok(parse_history(value)?)
    }

    pub async fn create_medical_record(&self, record: &NewMedicalRecord) -> Result<Value, ApiError> {
        let body = serde_json::to_value(record)?;
        let created = self.post(MedicalRecordEntry::PATH, &body).await?;
        info!(cedula = %record.patient_cedula, "medical record created");
        Ok(created)
    }

    /// Stock changes are a full-object `PUT` of the item with the new quantity.
    pub async fn adjust_stock(&self, item: &InventoryItem, adjustment: &StockAdjustment) -> Result<Value, ApiError> {
        let body = item.adjusted(adjustment, Utc::now());
        self.update::<InventoryItem>(&item.key(), &body).await
    }
}
