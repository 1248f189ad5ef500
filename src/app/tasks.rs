//! Background requests and the events they send back to the UI thread.
//!
//! Every network call runs on the tokio runtime and reports exactly one
//! [`ApiEvent`] over a std channel that the event loop drains each tick.
//! Events carry the session epoch they were started in, so results that
//! arrive after a logout are dropped.

use std::future::Future;
use std::sync::mpsc::Sender;

use serde_json::Value;
use tokio::runtime::Handle;
use tracing::error;

use crate::error::{ApiError, AuthError};
use crate::model::{
    Appointment, BillingCalculation, InventoryItem, Invoice, MedicalRecordEntry, Order, Patient, PatientVisit, User,
};
use crate::nav::View;
use crate::session::Session;

/// Which list a load result belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    Users,
    Patients,
    Inventory,
    Invoices,
    Appointments,
    Orders,
    Visits,
    MedicalRecords,
}

#[derive(Debug)]
pub enum ListPayload {
    Users(Vec<User>),
    Patients(Vec<Patient>),
    Inventory(Vec<InventoryItem>),
    Invoices(Vec<Invoice>),
    Appointments(Vec<Appointment>),
    Orders(Vec<Order>),
    Visits(Vec<PatientVisit>),
    MedicalRecords(Vec<MedicalRecordEntry>),
}

#[derive(Debug)]
pub enum ApiEvent {
    LoginFinished(Result<Session, AuthError>),
    ListLoaded {
        kind: ListKind,
        tag: u64,
        result: Result<ListPayload, ApiError>,
    },
    /// Create/edit form of `view` answered.
    FormSaved {
        view: View,
        result: Result<Value, ApiError>,
    },
    /// A one-shot action (delete, toggle, dialog submit) answered.
    ActionDone {
        success: String,
        reload: Option<View>,
        result: Result<(), ApiError>,
    },
    BillingCalculated(Result<BillingCalculation, ApiError>),
    Maintenance {
        health: Result<Value, ApiError>,
        info: Result<Value, ApiError>,
    },
    /// The task panicked or was cancelled.
    TaskFailed(String),
}

#[derive(Debug)]
pub struct Envelope {
    pub epoch: u64,
    pub event: ApiEvent,
}

/// Run `fut` on the runtime and deliver its event. A panic inside the task
/// is delivered as [`ApiEvent::TaskFailed`].
pub fn spawn<F>(handle: &Handle, tx: &Sender<Envelope>, epoch: u64, fut: F)
where
    F: Future<Output = ApiEvent> + Send + 'static,
{
    let tx = tx.clone();
    let task = handle.spawn(fut);
    handle.spawn(async move {
        let event = match task.await {
            Ok(event) => event,
            Err(err) => {
                error!(%err, "background task failed");
                ApiEvent::TaskFailed(err.to_string())
            }
        };
        // the receiver is gone only when the UI is shutting down
        let _ = tx.send(Envelope { epoch, event });
    });
}
