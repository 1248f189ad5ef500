use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::AppState;

use super::components::centered_rect;

pub fn render_login(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let login = &app.login;
    let rect = centered_rect(56u16.min(area.width), 13, area);

    let field = |label: &str, value: String, focused: bool| {
        let style = if focused {
            Style::default().fg(theme.highlight_fg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text)
        };
        let cursor = if focused { "_" } else { "" };
        Line::from(vec![
            Span::raw(if focused { "▶ " } else { "  " }),
            Span::styled(format!("{label:<10}"), Style::default().fg(theme.muted)),
            Span::styled(format!("{value}{cursor}"), style),
        ])
    };

    let mut lines = vec![
        Line::from(Span::styled(
            "Clinic management",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(app.api.base_url().to_string(), Style::default().fg(theme.muted))),
        Line::raw(""),
        field("Username", login.username.clone(), login.focus == 0),
        field("Password", "•".repeat(login.password.chars().count()), login.focus == 1),
        Line::raw(""),
    ];
    if login.busy {
        lines.push(Line::from(Span::styled("Signing in…", Style::default().fg(theme.info))));
    } else if let Some(err) = &login.error {
        lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(theme.error))));
    } else {
        lines.push(Line::raw(""));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Tab: switch field  Enter: sign in  Esc: quit",
        Style::default().fg(theme.muted),
    )));

    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Sign in")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
