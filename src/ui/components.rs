//! Shared UI components (status bar, toasts, modal helpers).
//!
//! Contains small building blocks reused by every view.
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::{KeyAction, Keymap};
use crate::app::{AppState, InputMode, PendingAction, Theme};
use crate::list::LoadState;
use crate::notify::Severity;
use std::collections::{BTreeMap, BTreeSet};

/// Render the bottom status bar with mode, page and filter of the active list.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &mut AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let user = app
        .session
        .as_ref()
        .map(|s| {
            let role = s.current_user.role.map(|r| r.label()).unwrap_or("-");
            format!("{} ({role})", s.current_user.username)
        })
        .unwrap_or_default();
    let list_info = match app.active_list() {
        Some(list) => {
            let filter = list
                .facet_label()
                .map(|l| format!("  filter:[{l}]"))
                .unwrap_or_default();
            let search = if list.search_term().is_empty() {
                String::new()
            } else {
                format!("  search:\"{}\"", list.search_term())
            };
            let loading = if *list.state() == LoadState::Loading { "  loading…" } else { "" };
            format!(
                "  page {}/{}  showing {} of {}{filter}{search}{loading}",
                list.page(),
                list.total_pages(),
                list.filtered_len(),
                list.total()
            )
        }
        None => String::new(),
    };
    let msg = format!("mode: {mode}  {user}{list_info}  ?: help");
    let p = Paragraph::new(msg).style(Style::default().fg(app.theme.status_fg).bg(app.theme.status_bg));
    f.render_widget(p, area);
}

fn severity_color(theme: &Theme, severity: Severity) -> Color {
    match severity {
        Severity::Success => theme.success,
        Severity::Error => theme.error,
        Severity::Warning => theme.warning,
        Severity::Info => theme.info,
    }
}

/// Stack the newest notifications in the top-right corner.
pub fn render_toasts(f: &mut Frame, area: Rect, app: &AppState) {
    let max_visible = (area.height.saturating_sub(2) / 3).clamp(1, 4) as usize;
    let width = 48u16.min(area.width.saturating_sub(2));
    let mut y = area.y + 1;
    for n in app.notifications.latest(max_visible).iter().rev() {
        if y + 3 > area.y + area.height {
            break;
        }
        let rect = Rect {
            x: area.x + area.width.saturating_sub(width + 1),
            y,
            width,
            height: 3,
        };
        let color = severity_color(&app.theme, n.severity);
        let p = Paragraph::new(Line::from(vec![
            Span::styled(format!("{} ", n.severity.icon()), Style::default().fg(color)),
            Span::styled(n.message.clone(), Style::default().fg(app.theme.text)),
        ]))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
        y += 3;
    }
}

/// Render the right-side keybinds viewer with grouped sections.
pub fn render_keybinds_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .title("Keybindings")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);

    let mut general: BTreeMap<&'static str, BTreeSet<String>> = BTreeMap::new();
    let mut navigation: BTreeMap<&'static str, BTreeSet<String>> = BTreeMap::new();
    let mut records: BTreeMap<&'static str, BTreeSet<String>> = BTreeMap::new();

    for ((mods, code), action) in app.keymap.all_bindings().into_iter() {
        let key = match code {
            crossterm::event::KeyCode::BackTab => "Shift+Tab".to_string(),
            _ => Keymap::format_key(mods, code),
        };

        let (section, label) = match action {
            KeyAction::Quit => (&mut general, "Quit"),
            KeyAction::StartSearch => (&mut general, "Search"),
            KeyAction::Reload => (&mut general, "Reload"),
            KeyAction::CycleFilter => (&mut general, "Cycle filter"),
            KeyAction::Logout => (&mut general, "Log out"),
            KeyAction::OpenHelp => (&mut general, "Help"),
            KeyAction::ToggleKeybindsPane => (&mut general, "Toggle keybindings"),

            KeyAction::MoveUp => (&mut navigation, "Move up"),
            KeyAction::MoveDown => (&mut navigation, "Move down"),
            KeyAction::PrevPage => (&mut navigation, "Previous page"),
            KeyAction::NextPage => (&mut navigation, "Next page"),
            KeyAction::NextView => (&mut navigation, "Next section"),
            KeyAction::PrevView => (&mut navigation, "Previous section"),

            KeyAction::NewRecord => (&mut records, "New"),
            KeyAction::EditSelection => (&mut records, "Edit"),
            KeyAction::DeleteSelection => (&mut records, "Delete"),
            KeyAction::EnterAction => (&mut records, "Details"),
            KeyAction::ToggleActive => (&mut records, "Activate / deactivate user"),
            KeyAction::CancelSelection => (&mut records, "Cancel appointment"),
            KeyAction::AdjustStock => (&mut records, "Adjust stock"),
            KeyAction::CalculateBilling => (&mut records, "Billing calculation"),
            KeyAction::GenerateInvoice => (&mut records, "Generate invoice"),
            KeyAction::SelectPatient => (&mut records, "Choose patient"),

            KeyAction::Ignore => continue,
        };
        section.entry(label).or_default().insert(key);
    }

    let total_w = inner.width as usize;
    let sep = " │ ";
    let sep_w = sep.chars().count();

    let max_label = general
        .keys()
        .chain(navigation.keys())
        .chain(records.keys())
        .map(|k| k.len())
        .max()
        .unwrap_or(0)
        .max("Cancel / Close".len());
    let col1_w = std::cmp::min(max_label, total_w.saturating_sub(sep_w + 8));

    let push_row = |label: &str, value: &str| -> Line<'static> {
        let lbl: String = label.chars().take(col1_w).collect();
        let left = format!("  {:>width$}{}", lbl, sep, width = col1_w);
        Line::from(vec![
            Span::raw(left),
            Span::styled(value.to_string(), Style::default().add_modifier(Modifier::ITALIC)),
        ])
    };

    let mut lines: Vec<Line> = Vec::new();
    for (title, section) in [("General:", &general), ("Navigation:", &navigation), ("Records:", &records)] {
        if !lines.is_empty() {
            lines.push(Line::raw(""));
        }
        lines.push(Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))));
        for (label, keys) in section.iter() {
            let joined = keys.iter().cloned().collect::<Vec<_>>().join(", ");
            lines.push(push_row(label, &joined));
        }
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled("Forms:", Style::default().add_modifier(Modifier::BOLD))));
    for (label, value) in [
        ("Next / previous field", "Tab, Shift+Tab"),
        ("Toggle / cycle choice", "Space, Left, Right"),
        ("Confirm / Apply", "Enter"),
        ("Cancel / Close", "Esc"),
    ] {
        lines.push(push_row(label, value));
    }

    let p = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(block, area);
    f.render_widget(p, inner);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Yes/No prompt for a pending action.
pub fn render_confirm_modal(f: &mut Frame, area: Rect, theme: &Theme, action: &PendingAction, yes: bool) {
    let width = 56u16.min(area.width.saturating_sub(4)).max(30);
    let rect = centered_rect(width, 7, area);
    let choice = |label: &'static str, active: bool| {
        if active {
            Span::styled(
                format!("[ {label} ]"),
                Style::default().fg(theme.highlight_fg).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(format!("  {label}  "))
        }
    };
    let lines = vec![
        Line::raw(action.prompt()),
        Line::raw(""),
        Line::from(vec![choice("Yes", yes), Span::raw("   "), choice("No", !yes)]),
    ];
    let title = match action {
        PendingAction::Delete { .. } => "Confirm delete",
        _ => "Confirm",
    };
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.warning)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Key/value lines in a scrollable modal (record details, billing results).
pub fn render_details_modal(f: &mut Frame, area: Rect, theme: &Theme, title: &str, lines: &[(String, String)], scroll: u16) {
    let width = 72u16.min(area.width.saturating_sub(4)).max(40);
    let height = (lines.len() as u16 + 4).min(area.height.saturating_sub(4)).max(6);
    let rect = centered_rect(width, height, area);
    let label_w = lines.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let body: Vec<Line> = lines
        .iter()
        .map(|(k, v)| {
            Line::from(vec![
                Span::styled(format!("{k:>label_w$}: "), Style::default().fg(theme.muted)),
                Span::styled(v.clone(), Style::default().fg(theme.text)),
            ])
        })
        .collect();
    let p = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Render the help modal with important usage information and key tips.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = 80u16.min(area.width.saturating_sub(4)).max(60);
    let height = 24u16.min(area.height.saturating_sub(4)).max(14);
    let rect = centered_rect(width, height, area);

    let keys = |action: KeyAction| {
        let k = app.keymap.keys_for(action);
        if k.is_empty() { "unbound".to_string() } else { k.join(" / ") }
    };
    let tip = |label: &str, value: String| {
        Line::from(vec![
            Span::raw(format!("{label}: ")),
            Span::styled(value, Style::default().add_modifier(Modifier::ITALIC)),
        ])
    };

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled("Help", Style::default().add_modifier(Modifier::BOLD))),
        Line::raw(""),
        tip("Switch section", keys(KeyAction::NextView)),
        tip("Move", "Arrow keys / h j k l".to_string()),
        tip("Page", format!("{} / {}", keys(KeyAction::PrevPage), keys(KeyAction::NextPage))),
        tip("Search", format!("{} to start; results follow as you type; Enter keeps, Esc clears", keys(KeyAction::StartSearch))),
        tip("Cycle filter", keys(KeyAction::CycleFilter)),
        tip("Reload", keys(KeyAction::Reload)),
        tip("Keybindings panel", keys(KeyAction::ToggleKeybindsPane)),
        tip("Log out", keys(KeyAction::Logout)),
        tip("Quit", keys(KeyAction::Quit)),
        Line::raw(""),
        Line::from(Span::styled("Records", Style::default().add_modifier(Modifier::BOLD))),
        tip("Details", keys(KeyAction::EnterAction)),
        tip("New / edit / delete", format!(
            "{} / {} / {}",
            keys(KeyAction::NewRecord),
            keys(KeyAction::EditSelection),
            keys(KeyAction::DeleteSelection)
        )),
        tip("Users: activate or deactivate", keys(KeyAction::ToggleActive)),
        tip("Appointments: cancel", keys(KeyAction::CancelSelection)),
        tip("Inventory: adjust stock", keys(KeyAction::AdjustStock)),
        tip("Billing: calculate / invoice", format!(
            "{} / {}",
            keys(KeyAction::CalculateBilling),
            keys(KeyAction::GenerateInvoice)
        )),
        tip("Medical records: choose patient", keys(KeyAction::SelectPatient)),
        Line::raw(""),
        Line::raw("New, edit and delete are only offered where your role allows them."),
        tip("Close help", "Esc / Enter".to_string()),
    ];
    if let Some(nav) = app.navigator.as_ref() {
        lines.insert(2, tip("Sections", nav.entries().iter().map(|e| e.label).collect::<Vec<_>>().join(", ")));
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
