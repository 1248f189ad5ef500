//! Application state types and entry glue.
//!
//! [`AppState`] owns every controller (lists, forms, notifications, the
//! sidebar) plus the API client and the channel that background requests
//! report back on. The event loop lives in [`update`]; the operations that
//! start requests live in [`actions`].

pub mod actions;
pub mod keymap;
pub mod tasks;
pub mod update;

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use ratatui::style::Color;
use tokio::runtime::Handle;

use crate::api::ApiClient;
use crate::auth::AuthService;
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::form::{FormController, FormEditor};
use crate::list::{ListController, ListNav};
use crate::model::{
    Appointment, InventoryItem, Invoice, MedicalRecordEntry, Order, Patient, PatientVisit, Role, User,
};
use crate::nav::{Navigator, View};
use crate::notify::NotificationCenter;
use crate::session::Session;

use keymap::Keymap;
use tasks::{ApiEvent, Envelope};

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
}

impl Theme {
    /// Catppuccin Mocha theme defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            success: Color::Rgb(0xa6, 0xe3, 0xa1),      // green
            error: Color::Rgb(0xf3, 0x8b, 0xa8),        // red
            warning: Color::Rgb(0xfa, 0xb3, 0x87),      // peach
            info: Color::Rgb(0x89, 0xb4, 0xfa),         // blue
        }
    }

    /// Load theme from a simple key=value file. Unknown or missing keys fall back to `mocha`.
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut theme = Self::mocha();
        for (key, val) in crate::config::conf_entries(contents) {
            let Some(color) = Self::parse_color(val) else { continue };
            match key {
                "text" => theme.text = color,
                "muted" => theme.muted = color,
                "title" => theme.title = color,
                "border" => theme.border = color,
                "header_bg" => theme.header_bg = color,
                "header_fg" => theme.header_fg = color,
                "status_bg" => theme.status_bg = color,
                "status_fg" => theme.status_fg = color,
                "highlight_fg" => theme.highlight_fg = color,
                "highlight_bg" => theme.highlight_bg = color,
                "success" => theme.success = color,
                "error" => theme.error = color,
                "warning" => theme.warning = color,
                "info" => theme.info = color,
                _ => {}
            }
        }
        theme
    }

    /// Parse a color from hex ("#RRGGBB" or "RRGGBB") or "reset".
    fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# clinic-tui theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n\n");

        fn color_to_str(c: Color) -> String {
            match c {
                Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
                _ => "reset".to_string(),
            }
        }

        for (k, v) in [
            ("text", self.text),
            ("muted", self.muted),
            ("title", self.title),
            ("border", self.border),
            ("header_bg", self.header_bg),
            ("header_fg", self.header_fg),
            ("status_bg", self.status_bg),
            ("status_fg", self.status_fg),
            ("highlight_fg", self.highlight_fg),
            ("highlight_bg", self.highlight_bg),
            ("success", self.success),
            ("error", self.error),
            ("warning", self.warning),
            ("info", self.info),
        ] {
            let _ = writeln!(&mut buf, "{} = {}", k, color_to_str(v));
        }
        std::fs::write(path, buf)
    }

    /// Load `path`, else the copy in the user config directory, else write `mocha` to `path`.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        if let Some(existing) = crate::config::config_file_read_path("theme.conf") {
            return Self::from_file(&existing).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        let _ = t.write_file(path);
        t
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::mocha()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
}

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

#[derive(Clone, Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// 0 = username, 1 = password.
    pub focus: usize,
    pub error: Option<String>,
    pub busy: bool,
}

/// Schema-driven dialogs that are not entity create/edit forms.
#[derive(Clone, Debug)]
pub enum DialogKind {
    /// Medical records: whose history to show.
    PatientLookup,
    NewMedicalRecord { patient_cedula: String },
    BillingLookup,
    GenerateInvoice,
    StockAdjust { item: Box<InventoryItem> },
}

impl DialogKind {
    pub fn title(&self) -> String {
        match self {
            DialogKind::PatientLookup => "Medical history: patient".to_string(),
            DialogKind::NewMedicalRecord { patient_cedula } => format!("New medical record for {patient_cedula}"),
            DialogKind::BillingLookup => "Billing calculation".to_string(),
            DialogKind::GenerateInvoice => "Generate invoice".to_string(),
            DialogKind::StockAdjust { item } => format!("Adjust stock: {} (current {})", item.name, item.quantity),
        }
    }
}

/// Actions that need a yes/no confirmation first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingAction {
    Delete { view: View, key: String, label: String },
    SetUserActive { cedula: String, active: bool, label: String },
    CancelAppointment { id: String, label: String },
    Logout,
}

impl PendingAction {
    pub fn prompt(&self) -> String {
        match self {
            PendingAction::Delete { label, .. } => format!("Delete {label}? This cannot be undone."),
            PendingAction::SetUserActive { active: true, label, .. } => format!("Activate {label}?"),
            PendingAction::SetUserActive { active: false, label, .. } => format!("Deactivate {label}?"),
            PendingAction::CancelAppointment { label, .. } => format!("Cancel the appointment {label}?"),
            PendingAction::Logout => "Log out?".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum ModalState {
    /// Create/edit form of the view's entity.
    EntityForm(View),
    Dialog { kind: DialogKind, editor: FormEditor },
    Confirm { action: PendingAction, yes: bool },
    Details { title: String, lines: Vec<(String, String)>, scroll: u16 },
    Help { scroll: u16 },
}

#[derive(Clone, Debug, Default)]
pub struct Lists {
    pub users: ListController<User>,
    pub patients: ListController<Patient>,
    pub inventory: ListController<InventoryItem>,
    pub invoices: ListController<Invoice>,
    pub appointments: ListController<Appointment>,
    pub orders: ListController<Order>,
    pub visits: ListController<PatientVisit>,
    pub medical: ListController<MedicalRecordEntry>,
}

impl Lists {
    pub fn new(page_size: usize) -> Self {
        Self {
            users: ListController::new(page_size),
            patients: ListController::new(page_size),
            inventory: ListController::new(page_size),
            invoices: ListController::new(page_size),
            appointments: ListController::new(page_size),
            orders: ListController::new(page_size),
            visits: ListController::new(page_size),
            medical: ListController::new(page_size),
        }
    }

    /// The list shown by `view`, if it has one.
    pub fn for_view(&mut self, view: View) -> Option<&mut dyn ListNav> {
        match view {
            View::Users => Some(&mut self.users),
            View::Patients => Some(&mut self.patients),
            View::Inventory => Some(&mut self.inventory),
            View::Billing => Some(&mut self.invoices),
            View::Appointments => Some(&mut self.appointments),
            View::Orders => Some(&mut self.orders),
            View::Visits => Some(&mut self.visits),
            View::MedicalRecords => Some(&mut self.medical),
            View::Reports | View::Maintenance => None,
        }
    }

    pub fn reset(&mut self) {
        self.users.reset();
        self.patients.reset();
        self.inventory.reset();
        self.invoices.reset();
        self.appointments.reset();
        self.orders.reset();
        self.visits.reset();
        self.medical.reset();
    }
}

#[derive(Clone, Debug, Default)]
pub struct Forms {
    pub users: FormController<User>,
    pub patients: FormController<Patient>,
    pub inventory: FormController<InventoryItem>,
    pub appointments: FormController<Appointment>,
}

impl Forms {
    pub fn editor(&self, view: View) -> Option<&FormEditor> {
        match view {
            View::Users => self.users.editor(),
            View::Patients => self.patients.editor(),
            View::Inventory => self.inventory.editor(),
            View::Appointments => self.appointments.editor(),
            _ => None,
        }
    }

    pub fn editor_mut(&mut self, view: View) -> Option<&mut FormEditor> {
        match view {
            View::Users => self.users.editor_mut(),
            View::Patients => self.patients.editor_mut(),
            View::Inventory => self.inventory.editor_mut(),
            View::Appointments => self.appointments.editor_mut(),
            _ => None,
        }
    }

    /// Unlock every form still waiting for a save.
    pub fn abort_submits(&mut self, message: &str) {
        self.users.abort_submit(message);
        self.patients.abort_submit(message);
        self.inventory.abort_submit(message);
        self.appointments.abort_submit(message);
    }

    pub fn close_all(&mut self) {
        self.users.close();
        self.patients.close();
        self.inventory.close();
        self.appointments.close();
    }
}

/// Result of the maintenance screen's checks.
#[derive(Clone, Debug, Default)]
pub struct MaintenanceStatus {
    pub checked: bool,
    pub healthy: Option<bool>,
    pub health_lines: Vec<(String, String)>,
    pub info_lines: Vec<(String, String)>,
}

pub struct AppState {
    pub started_at: Instant,
    pub config: Config,
    pub theme: Theme,
    pub keymap: Keymap,
    pub api: ApiClient,
    pub auth: AuthService,
    pub runtime: Handle,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub login: LoginForm,
    pub session: Option<Session>,
    pub navigator: Option<Navigator>,
    pub lists: Lists,
    pub forms: Forms,
    pub modal: Option<ModalState>,
    pub notifications: NotificationCenter,
    pub search_query: String,
    pub debouncer: Debouncer,
    pub medical_patient: Option<String>,
    pub maintenance: MaintenanceStatus,
    pub show_keybinds: bool,
    pub should_quit: bool,
    /// Bumped on logout; events from an older epoch are dropped.
    pub epoch: u64,
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
}

impl AppState {
    pub fn new(config: Config, theme: Theme, keymap: Keymap, auth: AuthService, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            started_at: Instant::now(),
            theme,
            keymap,
            api: auth.api().clone(),
            auth,
            runtime,
            screen: Screen::Login,
            input_mode: InputMode::Normal,
            login: LoginForm::default(),
            session: None,
            navigator: None,
            lists: Lists::new(config.page_size),
            forms: Forms::default(),
            modal: None,
            notifications: NotificationCenter::new(config.notification_durations()),
            search_query: String::new(),
            debouncer: Debouncer::new(config.debounce()),
            medical_patient: None,
            maintenance: MaintenanceStatus::default(),
            show_keybinds: false,
            should_quit: false,
            epoch: 0,
            config,
            tx,
            rx,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.session.as_ref().and_then(|s| s.current_user.role)
    }

    pub fn active_view(&self) -> Option<View> {
        self.navigator.as_ref().map(Navigator::active)
    }

    /// The list of the active view.
    pub fn active_list(&mut self) -> Option<&mut dyn ListNav> {
        let view = self.active_view()?;
        self.lists.for_view(view)
    }

    /// Run `fut` in the background; its event comes back through [`Self::drain_events`].
    pub fn spawn<F>(&self, fut: F)
    where
        F: std::future::Future<Output = ApiEvent> + Send + 'static,
    {
        tasks::spawn(&self.runtime, &self.tx, self.epoch, fut);
    }

    /// Events that finished since the last call, minus those from an older epoch.
    pub fn drain_events(&mut self) -> Vec<ApiEvent> {
        let epoch = self.epoch;
        self.rx
            .try_iter()
            .filter(|env| {
                let current = env.epoch == epoch;
                if !current {
                    tracing::debug!(event_epoch = env.epoch, epoch, "dropping event from a previous session");
                }
                current
            })
            .map(|env| env.event)
            .collect()
    }

    /// Block until one event arrives or `timeout` passes. Used by tests that
    /// drive the state without a terminal.
    pub fn wait_event(&mut self, timeout: std::time::Duration) -> Option<ApiEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.checked_duration_since(Instant::now())?;
            let env = self.rx.recv_timeout(left).ok()?;
            if env.epoch == self.epoch {
                return Some(env.event);
            }
        }
    }

    pub fn close_modal(&mut self) {
        if let Some(ModalState::EntityForm(_)) = self.modal {
            self.forms.close_all();
        }
        self.modal = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn open_modal(&mut self, modal: ModalState) {
        self.modal = Some(modal);
        self.input_mode = InputMode::Modal;
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_file_overrides_known_keys() {
        let t = Theme::parse("text = #010203\nerror = ff0000\nborder = reset\nbogus = #000000\ntitle = nothex");
        assert_eq!(t.text, Color::Rgb(1, 2, 3));
        assert_eq!(t.error, Color::Rgb(255, 0, 0));
        assert_eq!(t.border, Color::Reset);
        assert_eq!(t.title, Theme::mocha().title);
    }

    #[test]
    fn theme_written_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme.conf");
        let t = Theme::load_or_init(&path);
        assert!(path.exists());
        assert_eq!(Theme::from_file(&path), Some(t));
    }

    #[test]
    fn pending_action_prompts() {
        let a = PendingAction::SetUserActive {
            cedula: "1".into(),
            active: false,
            label: "ana".into(),
        };
        assert_eq!(a.prompt(), "Deactivate ana?");
        assert!(PendingAction::Logout.prompt().contains("Log out"));
    }
}
