//! Content area of each sidebar section.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::{AppState, Theme};
use crate::model::billing::pending_total;
use crate::model::{Gender, Role};
use crate::nav::View;

use super::table::render_list;

/// One-line counter strip above a list.
fn counters(theme: &Theme, items: &[(&str, String)]) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for (label, value) in items {
        spans.push(Span::styled(format!("{label}: "), Style::default().fg(theme.muted)));
        spans.push(Span::styled(
            value.clone(),
            Style::default().fg(theme.highlight_fg).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw("   "));
    }
    Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    )
}

fn split_counters(area: Rect) -> (Rect, Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)].as_ref())
        .split(area);
    (parts[0], parts[1])
}

pub fn render_view(f: &mut Frame, area: Rect, app: &AppState, view: View) {
    let theme = &app.theme;
    let lists = &app.lists;
    match view {
        View::Users => {
            let (top, body) = split_counters(area);
            let mut items = vec![
                ("Total", lists.users.total().to_string()),
                ("Active", lists.users.count_where(|u| u.active).to_string()),
            ];
            for role in Role::ALL {
                items.push((role.label(), lists.users.count_where(|u| u.role == Some(role)).to_string()));
            }
            f.render_widget(counters(theme, &items), top);
            render_list(f, body, theme, "Users", &lists.users);
        }
        View::Patients => {
            let (top, body) = split_counters(area);
            let items = [
                ("Total", lists.patients.total().to_string()),
                ("Insured", lists.patients.count_where(|p| p.has_active_insurance()).to_string()),
                ("Male", lists.patients.count_where(|p| p.gender == Some(Gender::Male)).to_string()),
                ("Female", lists.patients.count_where(|p| p.gender == Some(Gender::Female)).to_string()),
                ("Other", lists.patients.count_where(|p| p.gender == Some(Gender::Other)).to_string()),
            ];
            f.render_widget(counters(theme, &items), top);
            render_list(f, body, theme, "Patients", &lists.patients);
        }
        View::Inventory => {
            let (top, body) = split_counters(area);
            let items = [
                ("Total Items", lists.inventory.total().to_string()),
                ("Low stock", lists.inventory.count_where(|i| i.is_low_stock()).to_string()),
                ("Controlled", lists.inventory.count_where(|i| i.is_controlled_substance).to_string()),
            ];
            f.render_widget(counters(theme, &items), top);
            render_list(f, body, theme, "Inventory", &lists.inventory);
        }
        View::Billing => {
            let (top, body) = split_counters(area);
            let items = [
                ("Invoices", lists.invoices.total().to_string()),
                ("Pending", lists.invoices.count_where(|i| i.is_pending()).to_string()),
                ("Pending amount", format!("{:.2}", pending_total(lists.invoices.items()))),
            ];
            f.render_widget(counters(theme, &items), top);
            render_list(f, body, theme, "Invoices", &lists.invoices);
        }
        View::Appointments => {
            let (top, body) = split_counters(area);
            let items = [
                ("Total", lists.appointments.total().to_string()),
                ("Open", lists.appointments.count_where(|a| a.can_cancel()).to_string()),
            ];
            f.render_widget(counters(theme, &items), top);
            render_list(f, body, theme, "Appointments", &lists.appointments);
        }
        View::MedicalRecords => {
            let (top, body) = split_counters(area);
            let patient = app.medical_patient.clone().unwrap_or_else(|| "none (press p)".to_string());
            let items = [
                ("Patient", patient),
                ("Entries", lists.medical.total().to_string()),
            ];
            f.render_widget(counters(theme, &items), top);
            render_list(f, body, theme, "Medical history", &lists.medical);
        }
        View::Orders => render_list(f, area, theme, "Orders", &lists.orders),
        View::Visits => render_list(f, area, theme, "Patient visits", &lists.visits),
        View::Reports => render_reports(f, area, app),
        View::Maintenance => render_maintenance(f, area, app),
    }
}

fn section<'a>(theme: &Theme, title: &'a str) -> Line<'a> {
    Line::from(Span::styled(
        title,
        Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
    ))
}

fn kv(theme: &Theme, key: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {key:<24}"), Style::default().fg(theme.muted)),
        Span::styled(value, Style::default().fg(theme.text)),
    ])
}

fn render_reports(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let users = &app.lists.users;
    let patients = &app.lists.patients;

    let mut lines = vec![
        section(theme, "Users"),
        kv(theme, "Total", users.total().to_string()),
        kv(theme, "Active", users.count_where(|u| u.active).to_string()),
        kv(theme, "Inactive", users.count_where(|u| !u.active).to_string()),
    ];
    for role in Role::ALL {
        lines.push(kv(theme, role.label(), users.count_where(|u| u.role == Some(role)).to_string()));
    }
    lines.push(Line::raw(""));
    lines.push(section(theme, "Patients"));
    lines.push(kv(theme, "Total", patients.total().to_string()));
    lines.push(kv(
        theme,
        "With active insurance",
        patients.count_where(|p| p.has_active_insurance()).to_string(),
    ));
    for gender in [Gender::Male, Gender::Female, Gender::Other] {
        lines.push(kv(
            theme,
            gender.label(),
            patients.count_where(|p| p.gender == Some(gender)).to_string(),
        ));
    }

    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Reports")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(p, area);
}

fn render_maintenance(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let status = &app.maintenance;
    let mut lines = Vec::new();
    if !status.checked {
        lines.push(Line::from(Span::styled("Checking backend…", Style::default().fg(theme.muted))));
    } else {
        let (label, color) = match status.healthy {
            Some(true) => ("Backend is healthy", theme.success),
            Some(false) => ("Backend is not healthy", theme.error),
            None => ("Unknown", theme.muted),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::raw(""));
        lines.push(section(theme, "Health"));
        for (k, v) in &status.health_lines {
            lines.push(kv(theme, k, v.clone()));
        }
        lines.push(Line::raw(""));
        lines.push(section(theme, "API information"));
        for (k, v) in &status.info_lines {
            lines.push(kv(theme, k, v.clone()));
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled("r: check again", Style::default().fg(theme.muted))));

    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(format!("Maintenance ({})", app.api.base_url()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(p, area);
}
