use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

use crate::app::Theme;
use crate::list::{ListController, LoadState};
use crate::model::Resource;

/// Current page of `list` as a table, or the loading/empty/error state.
pub fn render_list<T: Resource>(f: &mut Frame, area: Rect, theme: &Theme, title: &str, list: &ListController<T>) {
    let block = Block::default()
        .title(format!("{title} ({}/{})", list.filtered_len(), list.total()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));

    let page = list.page_items();
    if page.is_empty() {
        let (text, color) = match list.state() {
            LoadState::Idle | LoadState::Loading => ("Loading…".to_string(), theme.muted),
            LoadState::Failed(msg) if list.total() == 0 => (format!("Could not load data: {msg}"), theme.error),
            _ if !list.search_term().is_empty() || list.facet().is_some() => {
                ("No records match the current search.".to_string(), theme.muted)
            }
            _ => ("No records found.".to_string(), theme.muted),
        };
        let p = Paragraph::new(text)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let columns = T::columns();
    let rows = page.iter().map(|item| Row::new(item.cells().into_iter().map(Cell::from)));
    let widths = column_widths(columns.len());
    let header = Row::new(columns.iter().copied()).style(Style::default().fg(theme.title).add_modifier(Modifier::BOLD));

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .style(Style::default().fg(theme.text))
        .row_highlight_style(
            Style::default()
                .fg(theme.highlight_fg)
                .bg(theme.highlight_bg)
                .add_modifier(Modifier::BOLD),
        )
        .column_spacing(1);

    let mut state = TableState::default();
    state.select(Some(list.selected_index()));
    f.render_stateful_widget(table, area, &mut state);
}

fn column_widths(n: usize) -> Vec<Constraint> {
    if n == 0 {
        return Vec::new();
    }
    let share = (100 / n) as u16;
    (0..n).map(|_| Constraint::Percentage(share)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_split_evenly() {
        assert_eq!(column_widths(4), vec![Constraint::Percentage(25); 4]);
        assert!(column_widths(0).is_empty());
    }
}
