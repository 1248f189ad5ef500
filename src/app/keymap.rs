//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Bindings are `(modifiers, code) -> action`. The file format is
//! `<Action> = <KeySpec>`, one per line; user lines override the defaults.

use std::collections::HashMap;
use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Semantic keyboard actions available in the list screens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Quit,
    /// Open the help overlay.
    OpenHelp,
    StartSearch,
    /// Create a record in the current view.
    NewRecord,
    EditSelection,
    DeleteSelection,
    /// Show the selected record.
    EnterAction,
    NextView,
    PrevView,
    MoveUp,
    MoveDown,
    PrevPage,
    NextPage,
    Reload,
    CycleFilter,
    ToggleKeybindsPane,
    /// Users: activate/deactivate.
    ToggleActive,
    /// Appointments: cancel.
    CancelSelection,
    /// Inventory: stock adjustment.
    AdjustStock,
    /// Billing: calculation for a patient.
    CalculateBilling,
    /// Billing: generate an invoice.
    GenerateInvoice,
    /// Medical records: choose the patient.
    SelectPatient,
    Logout,
    Ignore,
}

const ACTIONS: &[(KeyAction, &str)] = &[
    (KeyAction::Quit, "Quit"),
    (KeyAction::OpenHelp, "OpenHelp"),
    (KeyAction::StartSearch, "StartSearch"),
    (KeyAction::NewRecord, "NewRecord"),
    (KeyAction::EditSelection, "EditSelection"),
    (KeyAction::DeleteSelection, "DeleteSelection"),
    (KeyAction::EnterAction, "EnterAction"),
    (KeyAction::NextView, "NextView"),
    (KeyAction::PrevView, "PrevView"),
    (KeyAction::MoveUp, "MoveUp"),
    (KeyAction::MoveDown, "MoveDown"),
    (KeyAction::PrevPage, "PrevPage"),
    (KeyAction::NextPage, "NextPage"),
    (KeyAction::Reload, "Reload"),
    (KeyAction::CycleFilter, "CycleFilter"),
    (KeyAction::ToggleKeybindsPane, "ToggleKeybindsPane"),
    (KeyAction::ToggleActive, "ToggleActive"),
    (KeyAction::CancelSelection, "CancelSelection"),
    (KeyAction::AdjustStock, "AdjustStock"),
    (KeyAction::CalculateBilling, "CalculateBilling"),
    (KeyAction::GenerateInvoice, "GenerateInvoice"),
    (KeyAction::SelectPatient, "SelectPatient"),
    (KeyAction::Logout, "Logout"),
    (KeyAction::Ignore, "Ignore"),
];

#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    /// Arrow keys plus vim-style `hjkl`, single letters for view actions.
    pub fn new_defaults() -> Self {
        let bindings = DEFAULT_BINDINGS
            .iter()
            .chain(SHIFT_VARIANTS)
            .map(|(mods, code, action)| ((*mods, *code), *action))
            .collect();
        Self { bindings }
    }

    /// Load `path`, else the copy in the user config directory, else write
    /// the defaults to `path`.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        if let Some(existing) = crate::config::config_file_read_path("keybinds.conf") {
            return Self::from_file(&existing).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(err) = km.write_file(path) {
            tracing::warn!(path = %path.display(), %err, "could not write default keybindings");
        }
        km
    }

    /// Defaults overridden by the file's bindings. `None` if unreadable.
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for (lhs, rhs) in crate::config::conf_entries(contents) {
            if let (Some(action), Some(key)) = (parse_action(lhs), parse_key(rhs)) {
                map.bindings.insert(key, action);
            }
        }
        map
    }

    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# clinic-tui keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+q, Enter, Esc, Tab, BackTab, Up, Down, Left, Right, PageUp, PageDown, Delete, /\n");
        let names: Vec<&str> = ACTIONS.iter().map(|(_, n)| *n).collect();
        let _ = writeln!(&mut buf, "# Actions: {}\n", names.join(", "));
        for (mods, code, action) in DEFAULT_BINDINGS {
            let _ = writeln!(&mut buf, "{} = {}", format_action(*action), Self::format_key(*mods, *code));
        }
        std::fs::write(path, buf)
    }

    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    pub fn all_bindings(&self) -> Vec<((KeyModifiers, KeyCode), KeyAction)> {
        self.bindings.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// Keys bound to `action`, formatted and sorted.
    pub fn keys_for(&self, action: KeyAction) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|((m, c), _)| Self::format_key(*m, *c))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// "Ctrl+q", "BackTab", "/".
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        let code = match code {
            KeyCode::Tab if mods.contains(KeyModifiers::SHIFT) => KeyCode::BackTab,
            other => other,
        };
        let base = match code {
            KeyCode::F(n) => format!("F{n}"),
            KeyCode::Char(c) => c.to_string(),
            other => NAMED_KEYS
                .iter()
                .find(|(_, named)| *named == other)
                .map(|(name, _)| name.to_string())
                .unwrap_or_else(|| format!("{other:?}")),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{base}")
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

const DEFAULT_BINDINGS: &[(KeyModifiers, KeyCode, KeyAction)] = &[
    (KeyModifiers::NONE, KeyCode::Char('q'), KeyAction::Quit),
    (KeyModifiers::NONE, KeyCode::Esc, KeyAction::Ignore),
    (KeyModifiers::NONE, KeyCode::Char('?'), KeyAction::OpenHelp),
    (KeyModifiers::NONE, KeyCode::Char('/'), KeyAction::StartSearch),
    (KeyModifiers::NONE, KeyCode::Char('n'), KeyAction::NewRecord),
    (KeyModifiers::NONE, KeyCode::Char('e'), KeyAction::EditSelection),
    (KeyModifiers::NONE, KeyCode::Delete, KeyAction::DeleteSelection),
    (KeyModifiers::NONE, KeyCode::Char('d'), KeyAction::DeleteSelection),
    (KeyModifiers::NONE, KeyCode::Enter, KeyAction::EnterAction),
    (KeyModifiers::NONE, KeyCode::Tab, KeyAction::NextView),
    (KeyModifiers::NONE, KeyCode::BackTab, KeyAction::PrevView),
    (KeyModifiers::NONE, KeyCode::Up, KeyAction::MoveUp),
    (KeyModifiers::NONE, KeyCode::Down, KeyAction::MoveDown),
    (KeyModifiers::NONE, KeyCode::Char('k'), KeyAction::MoveUp),
    (KeyModifiers::NONE, KeyCode::Char('j'), KeyAction::MoveDown),
    (KeyModifiers::NONE, KeyCode::Left, KeyAction::PrevPage),
    (KeyModifiers::NONE, KeyCode::Right, KeyAction::NextPage),
    (KeyModifiers::NONE, KeyCode::Char('h'), KeyAction::PrevPage),
    (KeyModifiers::NONE, KeyCode::Char('l'), KeyAction::NextPage),
    (KeyModifiers::NONE, KeyCode::PageUp, KeyAction::PrevPage),
    (KeyModifiers::NONE, KeyCode::PageDown, KeyAction::NextPage),
    (KeyModifiers::NONE, KeyCode::Char('r'), KeyAction::Reload),
    (KeyModifiers::NONE, KeyCode::Char('f'), KeyAction::CycleFilter),
    (KeyModifiers::NONE, KeyCode::Char('K'), KeyAction::ToggleKeybindsPane),
    (KeyModifiers::NONE, KeyCode::Char('a'), KeyAction::ToggleActive),
    (KeyModifiers::NONE, KeyCode::Char('x'), KeyAction::CancelSelection),
    (KeyModifiers::NONE, KeyCode::Char('s'), KeyAction::AdjustStock),
    (KeyModifiers::NONE, KeyCode::Char('c'), KeyAction::CalculateBilling),
    (KeyModifiers::NONE, KeyCode::Char('g'), KeyAction::GenerateInvoice),
    (KeyModifiers::NONE, KeyCode::Char('p'), KeyAction::SelectPatient),
    (KeyModifiers::CONTROL, KeyCode::Char('o'), KeyAction::Logout),
];

// terminals disagree on how Shift+Tab and Shift+letter are reported
const SHIFT_VARIANTS: &[(KeyModifiers, KeyCode, KeyAction)] = &[
    (KeyModifiers::SHIFT, KeyCode::BackTab, KeyAction::PrevView),
    (KeyModifiers::SHIFT, KeyCode::Tab, KeyAction::PrevView),
    (KeyModifiers::SHIFT, KeyCode::Char('K'), KeyAction::ToggleKeybindsPane),
    (KeyModifiers::SHIFT, KeyCode::Char('k'), KeyAction::ToggleKeybindsPane),
];

/// Spellings used in `keybinds.conf` for non-character keys.
const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("Enter", KeyCode::Enter),
    ("Esc", KeyCode::Esc),
    ("Delete", KeyCode::Delete),
    ("Backspace", KeyCode::Backspace),
    ("Tab", KeyCode::Tab),
    ("BackTab", KeyCode::BackTab),
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
    ("PageUp", KeyCode::PageUp),
    ("PageDown", KeyCode::PageDown),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
];

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    let spec = spec.trim();
    let (mods, rest) = spec
        .strip_prefix("Ctrl+")
        .map_or((KeyModifiers::NONE, spec), |after| (KeyModifiers::CONTROL, after));
    if let Some((_, code)) = NAMED_KEYS.iter().find(|(name, _)| *name == rest) {
        return Some((mods, *code));
    }
    if rest == "Escape" {
        return Some((mods, KeyCode::Esc));
    }
    if let Some(n) = rest.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
        return Some((mods, KeyCode::F(n)));
    }
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some((mods, KeyCode::Char(c))),
        _ => None,
    }
}

fn parse_action(s: &str) -> Option<KeyAction> {
    let s = s.trim();
    ACTIONS.iter().find(|(_, name)| *name == s).map(|(a, _)| *a)
}

pub fn format_action(a: KeyAction) -> &'static str {
    ACTIONS
        .iter()
        .find(|(action, _)| *action == a)
        .map(|(_, name)| *name)
        .unwrap_or("Ignore")
}
