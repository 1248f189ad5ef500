//! Operations triggered from the keyboard and the handling of their results.
//!
//! Everything that talks to the backend goes through [`AppState::spawn`];
//! the matching `apply_*` method runs on the UI thread once the event is
//! drained.

use std::future::Future;
use std::time::Instant;

use chrono::{Local, Utc};
use serde_json::Value;
use tracing::{info, warn};

use super::tasks::{ApiEvent, ListKind, ListPayload};
use super::{AppState, DialogKind, MaintenanceStatus, ModalState, PendingAction, Screen};
use crate::api::ApiClient;
use crate::auth::validate_credentials;
use crate::error::{ApiError, FieldErrors, friendly_message};
use crate::form::{FormController, FormEditor, SubmitOutcome, SubmitRequest, capitalize};
use crate::list::{ListController, LoadOutcome};
use crate::model::{
    Appointment, BillingCalculation, Editable, InventoryItem, InvoiceRequest, NewMedicalRecord, Patient, Resource,
    StockAdjustment, User,
};
use crate::nav::{self, Navigator, View};
use crate::notify::NotificationSink;
use crate::session::Session;
use crate::validation::{FieldKind, FieldSpec, FormMode, FormSchema, FormValues, Rule, normalize_cedula};

/// Single national-ID prompt used by the lookup dialogs.
pub fn cedula_prompt_schema() -> FormSchema {
    FormSchema::new(vec![
        FieldSpec::new("cedula", "Patient national ID", FieldKind::Text)
            .required()
            .rule(Rule::Cedula),
    ])
}

fn fetch_list<T, F>(api: ApiClient, kind: ListKind, tag: u64, wrap: F) -> impl Future<Output = ApiEvent> + Send + 'static
where
    T: Resource,
    F: FnOnce(Vec<T>) -> ListPayload + Send + 'static,
{
    async move {
        let result = api.list::<T>().await.map(wrap);
        ApiEvent::ListLoaded { kind, tag, result }
    }
}

fn save_form<T: Editable>(api: ApiClient, view: View, request: SubmitRequest) -> impl Future<Output = ApiEvent> + Send + 'static {
    async move {
        let result = request.send::<T>(&api).await;
        ApiEvent::FormSaved { view, result }
    }
}

fn delete_entity<T: Resource>(api: ApiClient, view: View, key: String) -> impl Future<Output = ApiEvent> + Send + 'static {
    async move {
        let result = api.remove::<T>(&key).await;
        ApiEvent::ActionDone {
            success: format!("{} deleted successfully", capitalize(T::NOUN)),
            reload: Some(view),
            result,
        }
    }
}

fn open_entity<T: Editable>(form: &mut FormController<T>, list: &ListController<T>, edit: bool) -> bool {
    if !edit {
        form.open(None);
        return true;
    }
    match list.selected_item() {
        Some(item) => {
            form.open(Some(item));
            true
        }
        None => false,
    }
}

/// Flatten a JSON object into display lines.
pub fn value_lines(value: &Value) -> Vec<(String, String)> {
    let scalar = |v: &Value| match v {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    };
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), scalar(v))).collect(),
        Value::Null => Vec::new(),
        other => vec![("response".to_string(), scalar(other))],
    }
}

fn noun_for(view: View) -> &'static str {
    match view {
        View::Users => User::NOUN,
        View::Patients => Patient::NOUN,
        View::Inventory => InventoryItem::NOUN,
        View::Appointments => Appointment::NOUN,
        other => other.title(),
    }
}

impl AppState {
    // ---- session ----

    pub fn submit_login(&mut self) {
        if self.login.busy {
            return;
        }
        let username = self.login.username.trim().to_string();
        let password = self.login.password.clone();
        if let Err(err) = validate_credentials(&username, &password) {
            self.login.error = Some(err.user_message());
            return;
        }
        self.login.error = None;
        self.login.busy = true;
        let auth = self.auth.clone();
        self.spawn(async move { ApiEvent::LoginFinished(auth.login(&username, &password).await) });
    }

    /// Resume a persisted session if its token is still valid.
    pub fn restore_session(&mut self) -> bool {
        match self.auth.restore(Utc::now()) {
            Some(session) => self.start_session(session),
            None => false,
        }
    }

    pub fn start_session(&mut self, session: Session) -> bool {
        let Some(role) = session.current_user.role else {
            warn!(username = %session.current_user.username, "user has no known role");
            self.auth.forget();
            self.login.busy = false;
            self.login.error = Some("Your account has no role assigned. Contact the administrator.".to_string());
            return false;
        };
        let name = if session.current_user.full_name.is_empty() {
            session.current_user.username.clone()
        } else {
            session.current_user.full_name.clone()
        };
        let navigator = Navigator::for_role(role);
        let landing = navigator.active();
        self.navigator = Some(navigator);
        self.session = Some(session);
        self.login = Default::default();
        self.screen = Screen::Dashboard;
        self.notifications.success(&format!("Welcome, {name} ({})", role.label()));
        info!(role = role.label(), "session started");
        self.reload(landing);
        true
    }

    pub fn logout(&mut self) {
        self.auth.logout();
        self.end_session();
        self.notifications.info("Logged out");
    }

    /// Back to the login screen with nothing of the old session left.
    fn end_session(&mut self) {
        self.epoch += 1;
        self.session = None;
        self.navigator = None;
        self.lists.reset();
        self.forms.close_all();
        self.modal = None;
        self.input_mode = super::InputMode::Normal;
        self.search_query.clear();
        self.debouncer.cancel();
        self.medical_patient = None;
        self.maintenance = MaintenanceStatus::default();
        self.login = Default::default();
        self.screen = Screen::Login;
    }

    /// Drop the session on a 401. Returns true when that happened.
    fn handle_unauthorized(&mut self, err: &ApiError) -> bool {
        if !self.auth.handle_api_error(err) {
            return false;
        }
        self.end_session();
        self.notifications.warning("Your session has expired. Please log in again.");
        true
    }

    fn report_error(&mut self, err: &ApiError) {
        if self.handle_unauthorized(err) {
            return;
        }
        warn!(%err, "request failed");
        self.notifications.error(&err.user_message());
    }

    // ---- navigation ----

    pub fn select_view(&mut self, view: View) {
        let Some(nav) = self.navigator.as_mut() else { return };
        if nav.select(view).is_some() {
            self.after_view_change(view);
        }
    }

    pub fn next_view(&mut self) {
        if let Some(view) = self.navigator.as_mut().map(Navigator::next) {
            self.after_view_change(view);
        }
    }

    pub fn prev_view(&mut self) {
        if let Some(view) = self.navigator.as_mut().map(Navigator::prev) {
            self.after_view_change(view);
        }
    }

    fn after_view_change(&mut self, view: View) {
        self.debouncer.cancel();
        self.search_query = self
            .lists
            .for_view(view)
            .map(|l| l.search_term().to_string())
            .unwrap_or_default();
        self.reload(view);
    }

    pub fn can_write(&self, view: View) -> bool {
        self.role().is_some_and(|r| nav::can_write(r, view))
    }

    fn require_write(&mut self, view: View) -> bool {
        if self.can_write(view) {
            return true;
        }
        self.notifications.warning("You do not have permission for this action");
        false
    }

    // ---- loading ----

    /// Fetch whatever `view` shows.
    pub fn reload(&mut self, view: View) {
        match view {
            View::Users => self.load_list(ListKind::Users),
            View::Patients => self.load_list(ListKind::Patients),
            View::Inventory => self.load_list(ListKind::Inventory),
            View::Billing => self.load_list(ListKind::Invoices),
            View::Appointments => self.load_list(ListKind::Appointments),
            View::Orders => self.load_list(ListKind::Orders),
            View::Visits => self.load_list(ListKind::Visits),
            View::MedicalRecords => match self.medical_patient {
                Some(_) => self.load_list(ListKind::MedicalRecords),
                None => self.open_dialog(DialogKind::PatientLookup),
            },
            View::Reports => {
                self.load_list(ListKind::Users);
                self.load_list(ListKind::Patients);
            }
            View::Maintenance => {
                let api = self.api.clone();
                self.maintenance.checked = false;
                self.spawn(async move {
                    let health = api.health().await;
                    let info = api.api_info().await;
                    ApiEvent::Maintenance { health, info }
                });
            }
        }
    }

    pub fn reload_active(&mut self) {
        if let Some(view) = self.active_view() {
            self.reload(view);
        }
    }

    pub fn load_list(&mut self, kind: ListKind) {
        let api = self.api.clone();
        match kind {
            ListKind::Users => {
                let tag = self.lists.users.begin_load();
                self.spawn(fetch_list(api, kind, tag, ListPayload::Users));
            }
            ListKind::Patients => {
                let tag = self.lists.patients.begin_load();
                self.spawn(fetch_list(api, kind, tag, ListPayload::Patients));
            }
            ListKind::Inventory => {
                let tag = self.lists.inventory.begin_load();
                self.spawn(fetch_list(api, kind, tag, ListPayload::Inventory));
            }
            ListKind::Invoices => {
                let tag = self.lists.invoices.begin_load();
                self.spawn(fetch_list(api, kind, tag, ListPayload::Invoices));
            }
            ListKind::Appointments => {
                let tag = self.lists.appointments.begin_load();
                self.spawn(fetch_list(api, kind, tag, ListPayload::Appointments));
            }
            ListKind::Orders => {
                let tag = self.lists.orders.begin_load();
                self.spawn(fetch_list(api, kind, tag, ListPayload::Orders));
            }
            ListKind::Visits => {
                let tag = self.lists.visits.begin_load();
                self.spawn(fetch_list(api, kind, tag, ListPayload::Visits));
            }
            ListKind::MedicalRecords => {
                let Some(cedula) = self.medical_patient.clone() else { return };
                let tag = self.lists.medical.begin_load();
                self.spawn(async move {
                    let result = api.medical_records_for(&cedula).await.map(ListPayload::MedicalRecords);
                    ApiEvent::ListLoaded { kind, tag, result }
                });
            }
        }
    }

    fn apply_list(&mut self, kind: ListKind, tag: u64, result: Result<ListPayload, ApiError>) {
        let payload = match result {
            Ok(payload) => payload,
            Err(err) => {
                if self.handle_unauthorized(&err) {
                    return;
                }
                let message = err.user_message();
                let lists = &mut self.lists;
                let outcome = match kind {
                    ListKind::Users => lists.users.finish_load(tag, Err(message.clone())),
                    ListKind::Patients => lists.patients.finish_load(tag, Err(message.clone())),
                    ListKind::Inventory => lists.inventory.finish_load(tag, Err(message.clone())),
                    ListKind::Invoices => lists.invoices.finish_load(tag, Err(message.clone())),
                    ListKind::Appointments => lists.appointments.finish_load(tag, Err(message.clone())),
                    ListKind::Orders => lists.orders.finish_load(tag, Err(message.clone())),
                    ListKind::Visits => lists.visits.finish_load(tag, Err(message.clone())),
                    ListKind::MedicalRecords => lists.medical.finish_load(tag, Err(message.clone())),
                };
                if outcome == LoadOutcome::Applied {
                    warn!(?kind, %err, "list load failed");
                    self.notifications.error(&message);
                }
                return;
            }
        };
        let lists = &mut self.lists;
        let (count, outcome) = match payload {
            ListPayload::Users(items) => (items.len(), lists.users.finish_load(tag, Ok(items))),
            ListPayload::Patients(items) => (items.len(), lists.patients.finish_load(tag, Ok(items))),
            ListPayload::Inventory(items) => (items.len(), lists.inventory.finish_load(tag, Ok(items))),
            ListPayload::Invoices(items) => (items.len(), lists.invoices.finish_load(tag, Ok(items))),
            ListPayload::Appointments(items) => (items.len(), lists.appointments.finish_load(tag, Ok(items))),
            ListPayload::Orders(items) => (items.len(), lists.orders.finish_load(tag, Ok(items))),
            ListPayload::Visits(items) => (items.len(), lists.visits.finish_load(tag, Ok(items))),
            ListPayload::MedicalRecords(items) => (items.len(), lists.medical.finish_load(tag, Ok(items))),
        };
        if outcome == LoadOutcome::Applied {
            info!(?kind, count, "list loaded");
        }
    }

    // ---- search ----

    /// Push the search box into the active list.
    pub fn apply_search(&mut self) {
        let term = self.search_query.clone();
        if let Some(list) = self.active_list() {
            list.set_search_term(&term);
        }
    }

    // ---- entity forms ----

    /// Open the create (`edit == false`) or edit form of the active view.
    pub fn open_form(&mut self, edit: bool) {
        let Some(view) = self.active_view() else { return };
        match view {
            View::MedicalRecords if !edit => {
                self.new_medical_record();
                return;
            }
            View::Billing if !edit => {
                self.open_generate_invoice();
                return;
            }
            View::Users | View::Patients | View::Inventory | View::Appointments => {}
            _ => {
                if !edit {
                    self.notifications.info("Records in this view are read-only");
                }
                return;
            }
        }
        if !self.require_write(view) {
            return;
        }
        let opened = match view {
            View::Users => open_entity(&mut self.forms.users, &self.lists.users, edit),
            View::Patients => open_entity(&mut self.forms.patients, &self.lists.patients, edit),
            View::Inventory => open_entity(&mut self.forms.inventory, &self.lists.inventory, edit),
            View::Appointments => open_entity(&mut self.forms.appointments, &self.lists.appointments, edit),
            _ => false,
        };
        if opened {
            self.open_modal(ModalState::EntityForm(view));
        } else {
            self.notifications.info("Select a record first");
        }
    }

    pub fn form_title(&self, view: View) -> String {
        match view {
            View::Users => self.forms.users.title(),
            View::Patients => self.forms.patients.title(),
            View::Inventory => self.forms.inventory.title(),
            View::Appointments => self.forms.appointments.title(),
            other => other.title().to_string(),
        }
    }

    pub fn form_is_submitting(&self, view: View) -> bool {
        match view {
            View::Users => self.forms.users.is_submitting(),
            View::Patients => self.forms.patients.is_submitting(),
            View::Inventory => self.forms.inventory.is_submitting(),
            View::Appointments => self.forms.appointments.is_submitting(),
            _ => false,
        }
    }

    /// Status line under the form: `(text, is_error)`.
    pub fn form_footer(&self, view: View) -> Option<(String, bool)> {
        if self.form_is_submitting(view) {
            return Some(("Saving…".to_string(), false));
        }
        let error = match view {
            View::Users => self.forms.users.submit_error(),
            View::Patients => self.forms.patients.submit_error(),
            View::Inventory => self.forms.inventory.submit_error(),
            View::Appointments => self.forms.appointments.submit_error(),
            _ => None,
        };
        error.map(|e| (e.to_string(), true))
    }

    /// Validate the open form and send it. Invalid forms never reach the network.
    pub fn submit_form(&mut self, view: View) {
        if self.form_is_submitting(view) {
            return;
        }
        let naming = self.config.role_names;
        let api = self.api.clone();
        let prepared = match view {
            View::Users => self
                .forms
                .users
                .prepare_submit(naming)
                .map(|req| self.spawn(save_form::<User>(api, view, req))),
            View::Patients => self
                .forms
                .patients
                .prepare_submit(naming)
                .map(|req| self.spawn(save_form::<Patient>(api, view, req))),
            View::Inventory => self
                .forms
                .inventory
                .prepare_submit(naming)
                .map(|req| self.spawn(save_form::<InventoryItem>(api, view, req))),
            View::Appointments => self
                .forms
                .appointments
                .prepare_submit(naming)
                .map(|req| self.spawn(save_form::<Appointment>(api, view, req))),
            _ => return,
        };
        if let Err(errors) = prepared {
            self.report_invalid(&errors);
        }
    }

    fn report_invalid(&mut self, errors: &FieldErrors) {
        match errors.get("form") {
            Some(message) => self.notifications.error(message),
            None => self
                .notifications
                .warning(&format!("{} field(s) need attention", errors.len())),
        };
    }

    fn apply_form_saved(&mut self, view: View, result: Result<Value, ApiError>) {
        if let Err(err) = &result {
            if self.handle_unauthorized(err) {
                return;
            }
            warn!(?view, %err, "save failed");
        }
        let sink = &mut self.notifications;
        let outcome = match view {
            View::Users => self.forms.users.finish_submit(result, sink),
            View::Patients => self.forms.patients.finish_submit(result, sink),
            View::Inventory => self.forms.inventory.finish_submit(result, sink),
            View::Appointments => self.forms.appointments.finish_submit(result, sink),
            _ => return,
        };
        if outcome == SubmitOutcome::Saved {
            if let Some(ModalState::EntityForm(open)) = self.modal {
                if open == view {
                    self.close_modal();
                }
            }
            self.reload(view);
        }
    }

    // ---- confirmed actions ----

    pub fn request_delete(&mut self) {
        let Some(view) = self.active_view() else { return };
        if view == View::Appointments {
            self.request_cancel_appointment();
            return;
        }
        if !matches!(view, View::Users | View::Patients | View::Inventory) {
            self.notifications.info("Records in this view cannot be deleted");
            return;
        }
        if !self.require_write(view) {
            return;
        }
        let Some(key) = self.lists.for_view(view).and_then(|l| l.selected_key()) else {
            self.notifications.info("Select a record first");
            return;
        };
        if key.is_empty() {
            self.notifications.warning("This record has no identifier and cannot be deleted");
            return;
        }
        let label = format!("{} {key}", noun_for(view));
        self.open_modal(ModalState::Confirm {
            action: PendingAction::Delete { view, key, label },
            yes: false,
        });
    }

    pub fn request_toggle_active(&mut self) {
        if self.active_view() != Some(View::Users) || !self.require_write(View::Users) {
            return;
        }
        let Some(user) = self.lists.users.selected_item() else {
            self.notifications.info("Select a user first");
            return;
        };
        let action = PendingAction::SetUserActive {
            cedula: user.cedula.clone(),
            active: !user.active,
            label: user.username.clone(),
        };
        self.open_modal(ModalState::Confirm { action, yes: false });
    }

    pub fn request_cancel_appointment(&mut self) {
        if self.active_view() != Some(View::Appointments) || !self.require_write(View::Appointments) {
            return;
        }
        let Some(appt) = self.lists.appointments.selected_item() else {
            self.notifications.info("Select an appointment first");
            return;
        };
        if !appt.can_cancel() {
            self.notifications.warning("Only open appointments can be cancelled");
            return;
        }
        let Some(id) = appt.id.clone() else {
            self.notifications.warning("This appointment has no identifier");
            return;
        };
        let label = format!("of {} on {}", appt.patient_name, appt.appointment_date_time);
        self.open_modal(ModalState::Confirm {
            action: PendingAction::CancelAppointment { id, label },
            yes: false,
        });
    }

    pub fn request_logout(&mut self) {
        self.open_modal(ModalState::Confirm {
            action: PendingAction::Logout,
            yes: false,
        });
    }

    /// Run an action the user said yes to.
    pub fn perform(&mut self, action: PendingAction) {
        let api = self.api.clone();
        match action {
            PendingAction::Delete { view, key, .. } => match view {
                View::Users => self.spawn(delete_entity::<User>(api, view, key)),
                View::Patients => self.spawn(delete_entity::<Patient>(api, view, key)),
                View::Inventory => self.spawn(delete_entity::<InventoryItem>(api, view, key)),
                _ => {}
            },
            PendingAction::SetUserActive { cedula, active, .. } => self.spawn(async move {
                let result = api.set_user_active(&cedula, active).await;
                let verb = if active { "activated" } else { "deactivated" };
                ApiEvent::ActionDone {
                    success: format!("User {verb} successfully"),
                    reload: Some(View::Users),
                    result,
                }
            }),
            PendingAction::CancelAppointment { id, .. } => self.spawn(async move {
                let result = api.cancel_appointment(&id).await;
                ApiEvent::ActionDone {
                    success: "Appointment cancelled successfully".to_string(),
                    reload: Some(View::Appointments),
                    result,
                }
            }),
            PendingAction::Logout => self.logout(),
        }
    }

    fn apply_action_done(&mut self, success: String, reload: Option<View>, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                info!(%success, "action completed");
                self.notifications.success(&success);
                if let Some(view) = reload {
                    self.reload(view);
                }
            }
            Err(err) => self.report_error(&err),
        }
    }

    // ---- dialogs ----

    pub fn open_dialog(&mut self, kind: DialogKind) {
        let today = Local::now().date_naive();
        let (schema, values) = match &kind {
            DialogKind::PatientLookup => {
                let schema = cedula_prompt_schema();
                let values = FormValues::blank(&schema)
                    .with_text("cedula", self.medical_patient.clone().unwrap_or_default());
                (schema, values)
            }
            DialogKind::BillingLookup => {
                let schema = cedula_prompt_schema();
                let values = FormValues::blank(&schema);
                (schema, values)
            }
            DialogKind::NewMedicalRecord { .. } => {
                let doctor = self
                    .session
                    .as_ref()
                    .map(|s| s.current_user.cedula.clone())
                    .unwrap_or_default();
                (NewMedicalRecord::schema(), NewMedicalRecord::blank_form(today, &doctor))
            }
            DialogKind::GenerateInvoice => (InvoiceRequest::schema(), InvoiceRequest::blank_form(today)),
            DialogKind::StockAdjust { .. } => (StockAdjustment::schema(), StockAdjustment::blank_form()),
        };
        let editor = FormEditor::new(schema, values, FormMode::Create);
        self.open_modal(ModalState::Dialog { kind, editor });
    }

    pub fn select_patient(&mut self) {
        if self.active_view() == Some(View::MedicalRecords) {
            self.open_dialog(DialogKind::PatientLookup);
        }
    }

    fn new_medical_record(&mut self) {
        if !self.require_write(View::MedicalRecords) {
            return;
        }
        match self.medical_patient.clone() {
            Some(patient_cedula) => self.open_dialog(DialogKind::NewMedicalRecord { patient_cedula }),
            None => self.open_dialog(DialogKind::PatientLookup),
        }
    }

    pub fn open_stock_adjust(&mut self) {
        if self.active_view() != Some(View::Inventory) || !self.require_write(View::Inventory) {
            return;
        }
        match self.lists.inventory.selected_item().cloned() {
            Some(item) => self.open_dialog(DialogKind::StockAdjust { item: Box::new(item) }),
            None => {
                self.notifications.info("Select an item first");
            }
        }
    }

    pub fn open_billing_lookup(&mut self) {
        if self.active_view() == Some(View::Billing) && self.require_write(View::Billing) {
            self.open_dialog(DialogKind::BillingLookup);
        }
    }

    pub fn open_generate_invoice(&mut self) {
        if self.active_view() == Some(View::Billing) && self.require_write(View::Billing) {
            self.open_dialog(DialogKind::GenerateInvoice);
        }
    }

    /// Validate the open dialog and start its request.
    pub fn submit_dialog(&mut self) {
        let Some(ModalState::Dialog { kind, editor }) = self.modal.as_ref() else { return };
        let kind = kind.clone();
        let values = editor.values().clone();
        let api = self.api.clone();
        let today = Local::now().date_naive();
        let result: Result<(), FieldErrors> = match kind {
            DialogKind::PatientLookup => self.lookup_cedula(&values).map(|cedula| {
                self.medical_patient = Some(cedula);
                self.lists.medical.reset();
                self.load_list(ListKind::MedicalRecords);
            }),
            DialogKind::BillingLookup => self.lookup_cedula(&values).map(|cedula| {
                self.spawn(async move { ApiEvent::BillingCalculated(api.calculate_billing(&cedula).await) });
            }),
            DialogKind::NewMedicalRecord { patient_cedula } => NewMedicalRecord::from_form(&values, &patient_cedula)
                .map(|record| {
                    self.spawn(async move {
                        let result = api.create_medical_record(&record).await.map(|_| ());
                        ApiEvent::ActionDone {
                            success: "Medical record created successfully".to_string(),
                            reload: Some(View::MedicalRecords),
                            result,
                        }
                    })
                }),
            DialogKind::GenerateInvoice => InvoiceRequest::from_form(&values, today).map(|request| {
                self.spawn(async move {
                    let result = api.generate_invoice(&request).await.map(|_| ());
                    ApiEvent::ActionDone {
                        success: "Invoice generated successfully".to_string(),
                        reload: Some(View::Billing),
                        result,
                    }
                })
            }),
            DialogKind::StockAdjust { item } => StockAdjustment::from_form(&values).map(|adjustment| {
                self.spawn(async move {
                    let result = api.adjust_stock(&item, &adjustment).await.map(|_| ());
                    ApiEvent::ActionDone {
                        success: "Stock updated successfully".to_string(),
                        reload: Some(View::Inventory),
                        result,
                    }
                })
            }),
        };
        match result {
            Ok(()) => self.close_modal(),
            Err(errors) => {
                if let Some(ModalState::Dialog { editor, .. }) = self.modal.as_mut() {
                    editor.set_errors(errors);
                }
            }
        }
    }

    fn lookup_cedula(&self, values: &FormValues) -> Result<String, FieldErrors> {
        let errors = cedula_prompt_schema().validate(values, FormMode::Create);
        if !errors.is_empty() {
            return Err(errors);
        }
        normalize_cedula(values.text("cedula"))
            .ok_or_else(|| FieldErrors::from([("cedula".to_string(), "Invalid national ID".to_string())]))
    }

    fn apply_billing(&mut self, result: Result<BillingCalculation, ApiError>) {
        match result {
            Ok(calc) => {
                let title = if calc.patient_name.is_empty() {
                    format!("Billing for {}", calc.patient_cedula)
                } else {
                    format!("Billing for {}", calc.patient_name)
                };
                let lines = calc
                    .lines()
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect();
                self.open_modal(ModalState::Details { title, lines, scroll: 0 });
            }
            Err(err) => self.report_error(&err),
        }
    }

    fn apply_maintenance(&mut self, health: Result<Value, ApiError>, info: Result<Value, ApiError>) {
        let mut status = MaintenanceStatus {
            checked: true,
            ..Default::default()
        };
        match health {
            Ok(value) => {
                let down = value
                    .get("status")
                    .and_then(Value::as_str)
                    .is_some_and(|s| !s.eq_ignore_ascii_case("up") && !s.eq_ignore_ascii_case("ok"));
                status.healthy = Some(!down);
                status.health_lines = value_lines(&value);
            }
            Err(err) => {
                warn!(%err, "health check failed");
                status.healthy = Some(false);
                status.health_lines = vec![("error".to_string(), err.user_message())];
            }
        }
        match info {
            Ok(value) => status.info_lines = value_lines(&value),
            Err(err) => status.info_lines = vec![("error".to_string(), err.user_message())],
        }
        self.maintenance = status;
    }

    // ---- details ----

    pub fn show_details(&mut self) {
        let Some(view) = self.active_view() else { return };
        let Some(details) = self.lists.for_view(view).and_then(|l| l.selected_details()) else {
            return;
        };
        let lines = details.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        self.open_modal(ModalState::Details {
            title: format!("{} details", capitalize(noun_for(view))),
            lines,
            scroll: 0,
        });
    }

    // ---- event pump ----

    pub fn handle_event(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::LoginFinished(Ok(session)) => {
                self.start_session(session);
            }
            ApiEvent::LoginFinished(Err(err)) => {
                warn!(%err, "login failed");
                self.login.busy = false;
                self.login.error = Some(err.user_message());
            }
            ApiEvent::ListLoaded { kind, tag, result } => self.apply_list(kind, tag, result),
            ApiEvent::FormSaved { view, result } => self.apply_form_saved(view, result),
            ApiEvent::ActionDone { success, reload, result } => self.apply_action_done(success, reload, result),
            ApiEvent::BillingCalculated(result) => self.apply_billing(result),
            ApiEvent::Maintenance { health, info } => self.apply_maintenance(health, info),
            ApiEvent::TaskFailed(raw) => {
                let message = friendly_message(&raw);
                self.login.busy = false;
                self.forms.abort_submits(&message);
                self.notifications.error(&message);
            }
        }
    }

    /// Periodic work: finished requests, the search debounce, expired toasts.
    pub fn tick(&mut self, now: Instant) {
        for event in self.drain_events() {
            self.handle_event(event);
        }
        if self.debouncer.fire(now) {
            self.apply_search();
        }
        self.notifications.prune(now);
    }
}
