use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::Theme;
use crate::form::FormEditor;
use crate::validation::{FieldKind, Rule};

use super::components::centered_rect;

/// Render a form modal: one line per field, inline errors below the field.
pub fn render_form_modal(
    f: &mut Frame,
    area: Rect,
    theme: &Theme,
    title: &str,
    editor: &FormEditor,
    footer: Option<(&str, bool)>,
) {
    let fields = &editor.schema().fields;
    let label_w = fields.iter().map(|s| s.label.chars().count() + 2).max().unwrap_or(10);

    let mut lines: Vec<Line> = Vec::new();
    let mut focus_line = 0usize;
    let mut group: Option<&str> = None;
    for (idx, spec) in fields.iter().enumerate() {
        if spec.group != group {
            group = spec.group;
            if let Some(g) = group {
                lines.push(Line::from(Span::styled(
                    group_title(g),
                    Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
                )));
            }
        }
        let focused = idx == editor.focus();
        if focused {
            focus_line = lines.len();
        }
        let read_only = spec.is_read_only(editor.mode());
        let required = spec.rules.contains(&Rule::Required) && !read_only;
        let label = format!("{}{}", spec.label, if required { " *" } else { "" });
        let marker = if focused { "▶ " } else { "  " };
        let value_style = if read_only {
            Style::default().fg(theme.muted)
        } else if focused {
            Style::default().fg(theme.highlight_fg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text)
        };
        let mut value = editor.display_value(spec);
        if focused && !matches!(spec.kind, FieldKind::Flag | FieldKind::Choice(_)) && !read_only {
            value.push('_');
        }
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{label:<label_w$}"), Style::default().fg(theme.muted)),
            Span::styled(value, value_style),
        ]));
        if let Some(err) = editor.error_for(spec.name) {
            lines.push(Line::from(Span::styled(
                format!("  {:label_w$}{err}", ""),
                Style::default().fg(theme.error),
            )));
        }
    }

    if let Some(err) = editor.error_for("form") {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(err.to_string(), Style::default().fg(theme.error))));
    }
    lines.push(Line::raw(""));
    match footer {
        Some((text, true)) => lines.push(Line::from(Span::styled(text.to_string(), Style::default().fg(theme.error)))),
        Some((text, false)) => lines.push(Line::from(Span::styled(text.to_string(), Style::default().fg(theme.muted)))),
        None => lines.push(Line::from(Span::styled(
            "Tab/Shift+Tab: field  Space/←/→: toggle or choose  Enter: save  Esc: cancel",
            Style::default().fg(theme.muted),
        ))),
    }

    let width = 84u16.min(area.width.saturating_sub(4)).max(40);
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2)).max(6);
    let rect = centered_rect(width, height, area);
    let inner_h = height.saturating_sub(2) as usize;
    let scroll = focus_line.saturating_sub(inner_h.saturating_sub(3)) as u16;

    let p = Paragraph::new(lines)
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

fn group_title(group: &str) -> String {
    match group {
        "emergencyContact" => "Emergency contact".to_string(),
        "insurancePolicy" => "Insurance policy".to_string(),
        other => other.to_string(),
    }
}
