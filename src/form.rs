//! Modal form state.
//!
//! [`FormEditor`] is the field-level editing state of any schema-driven
//! dialog: focus, text input, flag toggles, choice cycling and the last
//! validation result. [`FormController`] binds an editor to an entity type
//! and decides between create and update on submit.

use serde_json::Value;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::error::{ApiError, FieldErrors};
use crate::model::{Editable, RoleNaming};
use crate::notify::NotificationSink;
use crate::validation::{FieldKind, FieldSpec, FormMode, FormSchema, FormValues};

const MASK: char = '•';

#[derive(Clone, Debug)]
pub struct FormEditor {
    schema: FormSchema,
    values: FormValues,
    mode: FormMode,
    focus: usize,
    errors: FieldErrors,
}

impl FormEditor {
    pub fn new(schema: FormSchema, values: FormValues, mode: FormMode) -> Self {
        let mut editor = Self {
            schema,
            values,
            mode,
            focus: 0,
            errors: FieldErrors::new(),
        };
        if editor.focused_field().is_some_and(|f| f.is_read_only(mode)) {
            editor.focus_next();
        }
        editor
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error_for(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused_field(&self) -> Option<&FieldSpec> {
        self.schema.fields.get(self.focus)
    }

    /// Run the schema rules; the result is kept for rendering.
    pub fn validate(&mut self) -> bool {
        self.errors = self.schema.validate(&self.values, self.mode);
        self.errors.is_empty()
    }

    pub fn set_errors(&mut self, errors: FieldErrors) {
        self.errors = errors;
    }

    /// Set a field by name. Unknown names are ignored.
    pub fn set_text(&mut self, name: &str, value: &str) {
        if let Some(f) = self.schema.field(name) {
            let key = f.name;
            self.values.set_text(key, value);
            self.errors.remove(key);
        }
    }

    pub fn set_flag(&mut self, name: &str, value: bool) {
        if let Some(f) = self.schema.field(name) {
            let key = f.name;
            self.values.set_flag(key, value);
        }
    }

    pub fn focus_next(&mut self) {
        self.move_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.move_focus(self.schema.fields.len().saturating_sub(1));
    }

    fn move_focus(&mut self, step: usize) {
        let len = self.schema.fields.len();
        if len == 0 {
            return;
        }
        let mut idx = self.focus;
        for _ in 0..len {
            idx = (idx + step) % len;
            if !self.schema.fields[idx].is_read_only(self.mode) {
                self.focus = idx;
                return;
            }
        }
    }

    /// Type a character into the focused field. Space toggles flags.
    pub fn input_char(&mut self, c: char) {
        let Some(field) = self.focused_field() else { return };
        if field.is_read_only(self.mode) {
            return;
        }
        let (name, kind) = (field.name, field.kind);
        match kind {
            FieldKind::Flag => {
                if c == ' ' {
                    self.toggle_flag();
                }
            }
            FieldKind::Choice(_) => {
                if c == ' ' {
                    self.cycle_choice(true);
                }
            }
            _ => {
                let mut s = self.values.text(name).to_string();
                s.push(c);
                self.values.set_text(name, s);
                self.errors.remove(name);
            }
        }
    }

    pub fn backspace(&mut self) {
        let Some(field) = self.focused_field() else { return };
        if field.is_read_only(self.mode) || !is_textual(field.kind) {
            return;
        }
        let name = field.name;
        let mut s = self.values.text(name).to_string();
        s.pop();
        self.values.set_text(name, s);
    }

    pub fn toggle_flag(&mut self) {
        let Some(field) = self.focused_field() else { return };
        if field.kind != FieldKind::Flag || field.is_read_only(self.mode) {
            return;
        }
        let name = field.name;
        let current = self.values.flag(name);
        self.values.set_flag(name, !current);
    }

    /// Step the focused choice field through its options.
    pub fn cycle_choice(&mut self, forward: bool) {
        let Some(field) = self.focused_field() else { return };
        let FieldKind::Choice(options) = field.kind else { return };
        if options.is_empty() || field.is_read_only(self.mode) {
            return;
        }
        let name = field.name;
        let current = self.values.text(name);
        let next = match options.iter().position(|(v, _)| v.eq_ignore_ascii_case(current)) {
            None if forward => 0,
            None => options.len() - 1,
            Some(i) if forward => (i + 1) % options.len(),
            Some(i) => (i + options.len() - 1) % options.len(),
        };
        self.values.set_text(name, options[next].0);
        self.errors.remove(name);
    }

    /// Text shown for a field: secrets masked, choices by label, flags as a box.
    pub fn display_value(&self, field: &FieldSpec) -> String {
        match field.kind {
            FieldKind::Secret => MASK.to_string().repeat(self.values.text(field.name).chars().count()),
            FieldKind::Flag => if self.values.flag(field.name) { "[x]" } else { "[ ]" }.to_string(),
            FieldKind::Choice(options) => {
                let v = self.values.text(field.name);
                options
                    .iter()
                    .find(|(value, _)| value.eq_ignore_ascii_case(v))
                    .map(|(_, label)| label.to_string())
                    .unwrap_or_else(|| v.to_string())
            }
            _ => self.values.text(field.name).to_string(),
        }
    }
}

fn is_textual(kind: FieldKind) -> bool {
    matches!(
        kind,
        FieldKind::Text | FieldKind::Secret | FieldKind::Date | FieldKind::DateTime | FieldKind::Number
    )
}

/// What a valid form submits.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitRequest {
    Create { body: Value },
    Update { key: String, body: Value },
}

impl SubmitRequest {
    /// Exactly one `POST` or `PUT`.
    pub async fn send<T: Editable>(&self, api: &ApiClient) -> Result<Value, ApiError> {
        match self {
            SubmitRequest::Create { body } => api.create::<T>(body).await,
            SubmitRequest::Update { key, body } => api.update::<T>(key, body).await,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid,
    /// Saved and closed; the owning list should reload.
    Saved,
    /// The backend refused; the form stays open with the message.
    Failed,
}

/// Create/edit modal for one entity type.
#[derive(Clone, Debug)]
pub struct FormController<T: Editable> {
    editor: Option<FormEditor>,
    original: Option<T>,
    submit_error: Option<String>,
    submitting: bool,
}

impl<T: Editable> Default for FormController<T> {
    fn default() -> Self {
        Self {
            editor: None,
            original: None,
            submit_error: None,
            submitting: false,
        }
    }
}

impl<T: Editable> FormController<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank form for `None`; the entity's values (passwords cleared) otherwise.
    pub fn open(&mut self, entity: Option<&T>) {
        let (values, mode) = match entity {
            Some(e) => (e.to_form(), FormMode::Edit),
            None => (FormValues::blank(&T::schema()), FormMode::Create),
        };
        self.editor = Some(FormEditor::new(T::schema(), values, mode));
        self.original = entity.cloned();
        self.submit_error = None;
        self.submitting = false;
        debug!(noun = T::NOUN, ?mode, "form opened");
    }

    /// Discard all transient state.
    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn is_open(&self) -> bool {
        self.editor.is_some()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn mode(&self) -> Option<FormMode> {
        self.editor.as_ref().map(FormEditor::mode)
    }

    pub fn editor(&self) -> Option<&FormEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut FormEditor> {
        self.editor.as_mut()
    }

    pub fn original(&self) -> Option<&T> {
        self.original.as_ref()
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn title(&self) -> String {
        match self.mode() {
            Some(FormMode::Edit) => format!("Edit {}", T::NOUN),
            _ => format!("New {}", T::NOUN),
        }
    }

    /// Validate and build the request. Errors are kept on the editor.
    pub fn prepare_submit(&mut self, naming: RoleNaming) -> Result<SubmitRequest, FieldErrors> {
        let Some(editor) = self.editor.as_mut() else {
            return Err(FieldErrors::from([("form".to_string(), "The form is not open".to_string())]));
        };
        if !editor.validate() {
            return Err(editor.errors().clone());
        }
        let body = T::payload(editor.values(), editor.mode(), naming);
        let request = match &self.original {
            Some(original) => SubmitRequest::Update {
                key: original.key(),
                body,
            },
            None => SubmitRequest::Create { body },
        };
        self.submitting = true;
        self.submit_error = None;
        Ok(request)
    }

    /// Apply the backend's answer to a prepared request.
    pub fn finish_submit(&mut self, result: Result<Value, ApiError>, sink: &mut dyn NotificationSink) -> SubmitOutcome {
        self.submitting = false;
        match result {
            Ok(_) => {
                let verb = if self.original.is_some() { "updated" } else { "created" };
                sink.success(&format!("{} {verb} successfully", capitalize(T::NOUN)));
                info!(noun = T::NOUN, verb, "form saved");
                self.close();
                SubmitOutcome::Saved
            }
            Err(err) => {
                let message = err.user_message();
                sink.error(&message);
                self.submit_error = Some(message);
                SubmitOutcome::Failed
            }
        }
    }

    /// The request never answered (its task died). Unlocks the form and
    /// keeps it open.
    pub fn abort_submit(&mut self, message: &str) {
        if self.submitting {
            self.submitting = false;
            self.submit_error = Some(message.to_string());
        }
    }

    /// Validate, send, and apply the result in one step.
    pub async fn submit(
        &mut self,
        api: &ApiClient,
        sink: &mut dyn NotificationSink,
        naming: RoleNaming,
    ) -> SubmitOutcome {
        let request = match self.prepare_submit(naming) {
            Ok(r) => r,
            Err(errors) => {
                debug!(noun = T::NOUN, fields = errors.len(), "form invalid, not submitting");
                return SubmitOutcome::Invalid;
            }
        };
        let result = request.send::<T>(api).await;
        self.finish_submit(result, sink)
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InventoryItem, Patient, User};
    use crate::notify::{NotificationCenter, Severity};

    fn valid_patient_form(form: &mut FormController<Patient>) {
        let ed = form.editor_mut().unwrap();
        ed.set_text("cedula", "12345678");
        ed.set_text("username", "anaruiz");
        ed.set_text("password", "Secret1!");
        ed.set_text("confirmPassword", "Secret1!");
        ed.set_text("fullName", "Ana Ruiz");
        ed.set_text("birthDate", "1990-04-01");
        ed.set_text("gender", "FEMENINO");
        ed.set_text("address", "Calle 1");
        ed.set_text("phoneNumber", "3001234567");
        ed.set_text("email", "ana@mail.co");
    }

    #[test]
    fn open_blank_is_create_mode() {
        let mut form: FormController<Patient> = FormController::new();
        assert!(!form.is_open());
        form.open(None);
        assert_eq!(form.mode(), Some(FormMode::Create));
        assert_eq!(form.editor().unwrap().values().text("cedula"), "");
        assert_eq!(form.title(), "New patient");
    }

    #[test]
    fn edit_clears_passwords_and_locks_keys() {
        let user = User {
            cedula: "12345678".into(),
            username: "ana".into(),
            full_name: "Ana".into(),
            ..User::default()
        };
        let mut form: FormController<User> = FormController::new();
        form.open(Some(&user));
        let ed = form.editor_mut().unwrap();
        assert_eq!(ed.mode(), FormMode::Edit);
        assert_eq!(ed.values().text("password"), "");
        assert!(!ed.focused_field().unwrap().is_read_only(FormMode::Edit));
        let before = ed.values().text("cedula").to_string();
        for _ in 0..ed.schema().fields.len() {
            ed.input_char('9');
            ed.focus_next();
        }
        assert_eq!(ed.values().text("cedula"), before);
    }

    #[test]
    fn invalid_form_yields_errors_and_no_request() {
        let mut form: FormController<Patient> = FormController::new();
        form.open(None);
        valid_patient_form(&mut form);
        form.editor_mut().unwrap().set_text("cedula", "12ab");
        let errors = form.prepare_submit(RoleNaming::English).unwrap_err();
        assert!(errors.contains_key("cedula"));
        assert!(!form.is_submitting());
        assert!(form.editor().unwrap().error_for("cedula").is_some());
    }

    #[test]
    fn create_vs_update_follows_open_argument() {
        let mut form: FormController<Patient> = FormController::new();
        form.open(None);
        valid_patient_form(&mut form);
        let req = form.prepare_submit(RoleNaming::English).unwrap();
        assert!(matches!(req, SubmitRequest::Create { .. }));

        let existing = Patient {
            cedula: "87654321".into(),
            full_name: "Bob".into(),
            ..Patient::default()
        };
        form.open(Some(&existing));
        valid_patient_form(&mut form);
        match form.prepare_submit(RoleNaming::English) {
            Ok(SubmitRequest::Update { key, .. }) => assert_eq!(key, "87654321"),
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn failure_keeps_form_open_and_success_closes() {
        let mut sink = NotificationCenter::default();
        let mut form: FormController<Patient> = FormController::new();
        form.open(None);
        valid_patient_form(&mut form);
        form.prepare_submit(RoleNaming::English).unwrap();
        let out = form.finish_submit(Err(ApiError::from_status(409, Some("Cedula exists".into()))), &mut sink);
        assert_eq!(out, SubmitOutcome::Failed);
        assert!(form.is_open());
        assert_eq!(form.submit_error(), Some("Cedula exists"));

        form.prepare_submit(RoleNaming::English).unwrap();
        let out = form.finish_submit(Ok(Value::Null), &mut sink);
        assert_eq!(out, SubmitOutcome::Saved);
        assert!(!form.is_open());
        assert!(form.submit_error().is_none());
        let last = sink.visible().last().unwrap();
        assert_eq!(last.severity, Severity::Success);
        assert_eq!(last.message, "Patient created successfully");
    }

    #[test]
    fn close_clears_transient_state() {
        let mut form: FormController<InventoryItem> = FormController::new();
        form.open(None);
        form.editor_mut().unwrap().input_char('x');
        form.close();
        assert!(!form.is_open());
        assert!(form.original().is_none());
        form.open(None);
        assert_eq!(form.editor().unwrap().values().text("name"), "");
    }

    #[test]
    fn choice_and_flag_editing() {
        let mut form: FormController<InventoryItem> = FormController::new();
        form.open(None);
        let ed = form.editor_mut().unwrap();
        while ed.focused_field().map(|f| f.name) != Some("type") {
            ed.focus_next();
        }
        ed.cycle_choice(true);
        let first = ed.values().text("type").to_string();
        assert!(!first.is_empty());
        ed.cycle_choice(false);
        ed.cycle_choice(true);
        assert_eq!(ed.values().text("type"), first);

        while ed.focused_field().map(|f| f.kind) != Some(FieldKind::Flag) {
            ed.focus_next();
        }
        let name = ed.focused_field().unwrap().name;
        ed.input_char(' ');
        assert!(ed.values().flag(name));
    }

    #[test]
    fn secrets_are_masked() {
        let mut form: FormController<User> = FormController::new();
        form.open(None);
        let ed = form.editor_mut().unwrap();
        ed.set_text("password", "Abc1!xyz");
        let spec = ed.schema().field("password").unwrap().clone();
        assert_eq!(ed.display_value(&spec), "••••••••");
    }
}
