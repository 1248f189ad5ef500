pub mod components;
pub mod form;
pub mod login;
pub mod table;
pub mod views;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode, ModalState, Screen};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let area = f.area();
    if app.screen == Screen::Login {
        login::render_login(f, area, app);
        components::render_toasts(f, area, app);
        return;
    }

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(area);
    let mut columns = vec![Constraint::Length(24), Constraint::Min(20)];
    if app.show_keybinds {
        columns.push(Constraint::Length(48));
    }
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(columns)
        .split(root[1]);

    render_header(f, root[0], app);
    render_sidebar(f, body[0], app);
    if let Some(view) = app.active_view() {
        views::render_view(f, body[1], app, view);
    }
    if app.show_keybinds {
        components::render_keybinds_panel(f, body[2], app);
    }
    components::render_status_bar(f, root[2], app);

    if app.modal.is_some() {
        render_modal(f, area, app);
    }
    components::render_toasts(f, area, app);
}

fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let who = app
        .session
        .as_ref()
        .map(|s| {
            if s.current_user.full_name.is_empty() {
                s.current_user.username.clone()
            } else {
                s.current_user.full_name.clone()
            }
        })
        .unwrap_or_else(|| "unknown".to_string());
    let section = app.active_view().map(|v| v.title()).unwrap_or("");
    let prompt = match app.input_mode {
        InputMode::Search => format!("  Search: {}_", app.search_query),
        _ => String::new(),
    };
    let p = Paragraph::new(format!("{section} ({who}){prompt}"))
        .block(
            Block::default()
                .title("clinic-tui")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, area);
}

fn render_sidebar(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(nav) = app.navigator.as_ref() else { return };
    let lines: Vec<Line> = nav
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let text = format!(" {} {}", entry.icon, entry.label);
            if nav.is_active(i) {
                Line::from(Span::styled(
                    text,
                    Style::default()
                        .fg(app.theme.highlight_fg)
                        .bg(app.theme.highlight_bg)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(text, Style::default().fg(app.theme.text)))
            }
        })
        .collect();
    let role = app.role().map(|r| r.label()).unwrap_or("");
    let p = Paragraph::new(lines).block(
        Block::default()
            .title(role)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(p, area);
}

fn render_modal(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(state) = app.modal.as_ref() else { return };
    let theme = &app.theme;
    match state {
        ModalState::EntityForm(view) => {
            let view = *view;
            let Some(editor) = app.forms.editor(view) else { return };
            let footer = app.form_footer(view);
            let title = app.form_title(view);
            form::render_form_modal(f, area, theme, &title, editor, footer.as_ref().map(|(t, e)| (t.as_str(), *e)));
        }
        ModalState::Dialog { kind, editor } => {
            form::render_form_modal(f, area, theme, &kind.title(), editor, None);
        }
        ModalState::Confirm { action, yes } => components::render_confirm_modal(f, area, theme, action, *yes),
        ModalState::Details { title, lines, scroll } => {
            components::render_details_modal(f, area, theme, title, lines, *scroll)
        }
        ModalState::Help { scroll } => components::render_help_modal(f, area, app, *scroll),
    }
}
